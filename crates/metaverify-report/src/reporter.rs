//! Shared output sink for service messages.

use std::fmt;
use std::io::{self, Write};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use crate::message::{ParseError, ServiceMessage};

/// Cloneable handle to the stream service messages are written to.
///
/// Every clone writes to the same sink. A message is written and flushed as one
/// line while the sink lock is held, so lines emitted from different threads
/// never interleave.
#[derive(Clone)]
pub struct Reporter {
    sink: Arc<Mutex<Box<dyn Write + Send>>>,
}

impl Reporter {
    pub fn new<W>(writer: W) -> Self
    where
        W: Write + Send + 'static,
    {
        Self {
            sink: Arc::new(Mutex::new(Box::new(writer))),
        }
    }

    /// Reporter writing to the process's standard output.
    pub fn stdout() -> Self {
        Self::new(io::stdout())
    }

    /// Writes `message` as a single line and flushes the sink.
    pub fn emit(&self, message: &ServiceMessage) -> io::Result<()> {
        let line = format!("{message}\n");
        let mut sink = self.sink.lock().unwrap_or_else(PoisonError::into_inner);
        sink.write_all(line.as_bytes())?;
        sink.flush()
    }
}

impl fmt::Debug for Reporter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Reporter").finish_non_exhaustive()
    }
}

/// In-memory sink that can be handed to a [`Reporter`] and read back later.
#[derive(Debug, Clone, Default)]
pub struct SharedBuffer {
    bytes: Arc<Mutex<Vec<u8>>>,
}

impl SharedBuffer {
    fn lock(&self) -> MutexGuard<'_, Vec<u8>> {
        self.bytes.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Everything written so far, decoded lossily as UTF-8.
    pub fn contents(&self) -> String {
        String::from_utf8_lossy(&self.lock()).into_owned()
    }

    pub fn lines(&self) -> Vec<String> {
        self.contents().lines().map(str::to_owned).collect()
    }

    /// Parses every line written so far.
    pub fn messages(&self) -> Result<Vec<ServiceMessage>, ParseError> {
        self.contents().lines().map(ServiceMessage::parse).collect()
    }
}

impl Write for SharedBuffer {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.lock().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::message::Event;
    use pretty_assertions::assert_eq;
    use std::thread;

    #[test]
    fn test_emit_writes_one_line_per_message() {
        let buffer = SharedBuffer::default();
        let reporter = Reporter::new(buffer.clone());

        reporter
            .emit(&ServiceMessage::new(Event::TestSuiteStarted).with_property("name", "s"))
            .unwrap();
        reporter
            .emit(&ServiceMessage::new(Event::TestSuiteFinished).with_property("name", "s"))
            .unwrap();

        assert_eq!(
            buffer.lines(),
            vec![
                "##teamcity[testSuiteStarted name='s']".to_string(),
                "##teamcity[testSuiteFinished name='s']".to_string(),
            ]
        );
    }

    #[test]
    fn test_concurrent_emit_keeps_lines_whole() {
        let buffer = SharedBuffer::default();
        let reporter = Reporter::new(buffer.clone());

        let handles: Vec<_> = (0..8)
            .map(|worker| {
                let reporter = reporter.clone();
                thread::spawn(move || {
                    for i in 0..50 {
                        let msg = ServiceMessage::new(Event::TestStarted)
                            .with_property("name", format!("worker-{worker}/item-{i}"))
                            .with_property("captureStandardOutput", "false");
                        reporter.emit(&msg).unwrap();
                    }
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }

        let messages = buffer.messages().unwrap();
        assert_eq!(messages.len(), 8 * 50);
        assert!(messages.iter().all(|m| m.event() == Event::TestStarted));
    }

    #[test]
    fn test_reporter_debug_does_not_expose_sink() {
        let reporter = Reporter::new(SharedBuffer::default());
        assert_eq!(format!("{reporter:?}"), "Reporter { .. }");
    }
}
