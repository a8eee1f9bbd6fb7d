//! Suite and test scopes.
//!
//! A scope reports its start event when it is created and its finish event
//! exactly once: from `finish` on the normal path, or from `Drop` when the
//! scope is left early (a `?`, an early `return`, or a panic unwinding
//! through it).

use std::io;
use std::time::{Duration, Instant};

use crate::message::{Event, ServiceMessage};
use crate::reporter::Reporter;

/// A named group of tests.
#[derive(Debug)]
pub struct Suite {
    reporter: Reporter,
    name: String,
    finished: bool,
}

impl Suite {
    /// Reports `testSuiteStarted` and opens the suite.
    pub fn start(reporter: &Reporter, name: impl Into<String>) -> io::Result<Self> {
        let name = name.into();
        reporter.emit(&ServiceMessage::new(Event::TestSuiteStarted).with_property("name", &name))?;
        Ok(Self {
            reporter: reporter.clone(),
            name,
            finished: false,
        })
    }

    /// Runs `body` inside a suite and closes it afterwards.
    ///
    /// An error from `body` takes precedence over an error reporting the
    /// suite's end.
    pub fn run<T, E, F>(reporter: &Reporter, name: impl Into<String>, body: F) -> Result<T, E>
    where
        F: FnOnce(&Suite) -> Result<T, E>,
        E: From<io::Error>,
    {
        let suite = Suite::start(reporter, name)?;
        let result = body(&suite);
        let finished = suite.finish();
        let value = result?;
        finished?;
        Ok(value)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Opens a test reporting to the same sink as this suite.
    pub fn test(&self, name: impl Into<String>) -> io::Result<Test> {
        Test::start(&self.reporter, name)
    }

    /// Reports `testSuiteFinished`.
    pub fn finish(mut self) -> io::Result<()> {
        self.finished = true;
        self.emit_finished()
    }

    fn emit_finished(&self) -> io::Result<()> {
        self.reporter.emit(
            &ServiceMessage::new(Event::TestSuiteFinished).with_property("name", &self.name),
        )
    }
}

impl Drop for Suite {
    fn drop(&mut self) {
        if self.finished {
            return;
        }
        self.finished = true;
        if let Err(err) = self.emit_finished() {
            tracing::warn!(suite = %self.name, error = %err, "failed to report suite end");
        }
    }
}

/// A single reported check.
///
/// The start time is taken when the test is opened, so `duration` always
/// measures this test alone.
#[derive(Debug)]
pub struct Test {
    reporter: Reporter,
    name: String,
    started_at: Instant,
    failures: usize,
    finished: bool,
}

impl Test {
    /// Reports `testStarted` and starts the timer.
    pub fn start(reporter: &Reporter, name: impl Into<String>) -> io::Result<Self> {
        let name = name.into();
        reporter.emit(
            &ServiceMessage::new(Event::TestStarted)
                .with_property("name", &name)
                .with_property("captureStandardOutput", "false"),
        )?;
        Ok(Self {
            reporter: reporter.clone(),
            name,
            started_at: Instant::now(),
            failures: 0,
            finished: false,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Reports a failure. May be called any number of times.
    pub fn fail(&mut self, message: &str, details: &str) -> io::Result<()> {
        self.failures += 1;
        self.reporter.emit(
            &ServiceMessage::new(Event::TestFailed)
                .with_property("name", &self.name)
                .with_property("message", message)
                .with_property("details", details),
        )
    }

    /// Reports the test as ignored.
    pub fn ignore(&self, comment: &str) -> io::Result<()> {
        self.reporter.emit(
            &ServiceMessage::new(Event::TestIgnored)
                .with_property("name", &self.name)
                .with_property("message", comment),
        )
    }

    /// Number of failures reported so far.
    pub fn failure_count(&self) -> usize {
        self.failures
    }

    pub fn elapsed(&self) -> Duration {
        self.started_at.elapsed()
    }

    /// Reports `testFinished` with the elapsed time in milliseconds.
    pub fn finish(mut self) -> io::Result<()> {
        self.finished = true;
        self.emit_finished()
    }

    fn emit_finished(&self) -> io::Result<()> {
        self.reporter.emit(
            &ServiceMessage::new(Event::TestFinished)
                .with_property("name", &self.name)
                .with_property("duration", self.elapsed().as_millis().to_string()),
        )
    }
}

impl Drop for Test {
    fn drop(&mut self) {
        if self.finished {
            return;
        }
        self.finished = true;
        if let Err(err) = self.emit_finished() {
            tracing::warn!(test = %self.name, error = %err, "failed to report test end");
        }
    }
}
