//! Host implementations that need the `std` feature

use std::io::Write;

use super::{ConsoleLevel, ConsoleProvider};

/// Console output on the process streams: `log`, `info` and `debug` go to
/// stdout, `warn` and `error` to stderr.
///
/// Write failures (a closed pipe, for instance) are ignored.
#[derive(Debug, Clone, Copy, Default)]
pub struct StdConsoleProvider;

impl StdConsoleProvider {
    pub fn new() -> Self {
        Self
    }
}

impl ConsoleProvider for StdConsoleProvider {
    fn write(&self, level: ConsoleLevel, message: &str) {
        let _ = match level {
            ConsoleLevel::Log | ConsoleLevel::Info | ConsoleLevel::Debug => {
                writeln!(std::io::stdout().lock(), "{message}")
            }
            ConsoleLevel::Warn | ConsoleLevel::Error => writeln!(std::io::stderr().lock(), "{message}"),
        };
    }
}
