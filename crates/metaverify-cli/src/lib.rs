//! metaverify library.
//!
//! Collects assets and `.meta` sidecar files under a directory tree, checks
//! that they correspond one to one, and reports every asset and metafile as a
//! TeamCity test.

pub mod checks;
pub mod collect;
pub mod commands;
pub mod config;
pub mod logging;
