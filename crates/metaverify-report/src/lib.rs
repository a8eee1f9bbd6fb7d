//! TeamCity service-message reporting for metaverify.
//!
//! Emits one `##teamcity[...]` line per event on a shared sink and brackets
//! units of work with [`Suite`] and [`Test`] scopes that always report their
//! closing event, even on early return or panic.
//!
//! # Example
//!
//! ```
//! use metaverify_report::{Reporter, SharedBuffer, Suite};
//!
//! let buffer = SharedBuffer::default();
//! let reporter = Reporter::new(buffer.clone());
//!
//! let suite = Suite::start(&reporter, "missing_metafiles")?;
//! let mut test = suite.test("assets/logo.png")?;
//! test.fail("No .metafile", "Metafile assets/logo.png.meta not found.")?;
//! test.finish()?;
//! suite.finish()?;
//!
//! assert_eq!(buffer.lines().len(), 5);
//! # Ok::<(), std::io::Error>(())
//! ```

pub mod message;
pub mod reporter;
pub mod scope;

pub use message::{escape_value, unescape_value, Event, ParseError, ServiceMessage, MARKER};
pub use reporter::{Reporter, SharedBuffer};
pub use scope::{Suite, Test};
