// ABOUTME: Test support utilities.
// ABOUTME: Recording sink, in-memory FTP transfer, fake management API, and a fake FTP server.

use appdeploy::output::LogSink;
use parking_lot::Mutex;
use std::sync::Once;

// Each test binary only uses some of these modules, so allow dead_code.
#[allow(dead_code)]
pub mod fake_cloud;
#[allow(dead_code)]
pub mod ftp_server;
#[allow(dead_code)]
pub mod mock_transfer;

static TRACING_INIT: Once = Once::new();

/// Initialize tracing for tests. Safe to call multiple times.
#[allow(dead_code)]
pub fn init_tracing() {
    TRACING_INIT.call_once(|| {
        use tracing_subscriber::EnvFilter;
        let filter = EnvFilter::from_default_env()
            .add_directive("appdeploy=debug".parse().unwrap());
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_test_writer()
            .try_init()
            .ok();
    });
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Line {
    Status(String),
    Error(String),
}

/// Sink that keeps every line for assertions.
#[derive(Debug, Default)]
pub struct RecordingSink {
    lines: Mutex<Vec<Line>>,
}

#[allow(dead_code)]
impl RecordingSink {
    pub fn lines(&self) -> Vec<Line> {
        self.lines.lock().clone()
    }

    pub fn statuses(&self) -> Vec<String> {
        self.lines
            .lock()
            .iter()
            .filter_map(|l| match l {
                Line::Status(s) => Some(s.clone()),
                Line::Error(_) => None,
            })
            .collect()
    }

    pub fn errors(&self) -> Vec<String> {
        self.lines
            .lock()
            .iter()
            .filter_map(|l| match l {
                Line::Error(s) => Some(s.clone()),
                Line::Status(_) => None,
            })
            .collect()
    }
}

impl LogSink for RecordingSink {
    fn status(&self, line: &str) {
        self.lines.lock().push(Line::Status(line.to_string()));
    }

    fn error(&self, line: &str) {
        self.lines.lock().push(Line::Error(line.to_string()));
    }
}
