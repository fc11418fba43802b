//! In-memory log sink for unit tests.

use std::io::{self, Write};
use std::sync::{Arc, Mutex};

use serde_json::Value;

#[derive(Clone, Default)]
pub(crate) struct Capture(Arc<Mutex<Vec<u8>>>);

impl Capture {
    pub(crate) fn is_empty(&self) -> bool {
        self.0.lock().map(|buf| buf.is_empty()).unwrap_or(true)
    }

    /// Every line written so far, parsed as JSON.
    pub(crate) fn entries(&self) -> Vec<Value> {
        let buf = self.0.lock().map(|buf| buf.clone()).unwrap_or_default();
        String::from_utf8_lossy(&buf)
            .lines()
            .map(|line| serde_json::from_str(line).expect("log line is not JSON"))
            .collect()
    }
}

impl Write for Capture {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0
            .lock()
            .map_err(|_| io::Error::other("capture poisoned"))?
            .extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}
