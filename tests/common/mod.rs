//! Shared helpers for integration tests.

use std::io::{self, Write};
use std::sync::{Arc, Mutex};

use bytes::Bytes;
use http_body_util::Full;
use reqlog::{Level, Logger, Request};
use serde_json::Value;

/// Log sink that keeps every line in memory.
#[derive(Clone, Default)]
pub struct Capture(Arc<Mutex<Vec<u8>>>);

impl Capture {
    pub fn logger(&self, level: Level) -> Logger {
        Logger::new(level, self.clone())
    }

    pub fn entries(&self) -> Vec<Value> {
        let buf = self.0.lock().expect("capture lock").clone();
        String::from_utf8(buf)
            .expect("log output is UTF-8")
            .lines()
            .map(|line| serde_json::from_str(line).expect("log line is JSON"))
            .collect()
    }
}

impl Write for Capture {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.lock().expect("capture lock").extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

pub fn request(method: &str, uri: &str, body: &'static [u8]) -> Request {
    Request::new(
        http::Request::builder()
            .method(method)
            .uri(uri)
            .header("user-agent", "integration-test")
            .body(Full::new(Bytes::from_static(body)))
            .expect("valid request"),
    )
    .with_remote_addr("127.0.0.1:50000".parse().expect("valid addr"))
}
