//! Write-through response recorder.

use std::io;

use http::{HeaderMap, StatusCode};

use crate::response::ResponseWriter;

/// Wraps a [`ResponseWriter`] and remembers the status and the last body
/// chunk that went through it.
///
/// Every call is forwarded unchanged; the recorder only observes. The
/// captured body is the payload of the most recent `write`, not the
/// concatenation of all of them.
#[derive(Debug)]
pub struct Recorder<W> {
    inner: W,
    status: StatusCode,
    body: Option<Vec<u8>>,
    header_written: bool,
}

impl<W: ResponseWriter> Recorder<W> {
    pub fn new(inner: W) -> Self {
        Self {
            inner,
            status: StatusCode::OK,
            body: None,
            header_written: false,
        }
    }

    /// Last status written, `200 OK` if none was.
    pub fn status(&self) -> StatusCode { self.status }

    /// Payload of the most recent `write`, if any.
    pub fn body(&self) -> Option<&[u8]> { self.body.as_deref() }

    pub fn get_ref(&self) -> &W { &self.inner }

    pub fn into_inner(self) -> W { self.inner }
}

impl<W: ResponseWriter> ResponseWriter for Recorder<W> {
    fn headers(&self) -> &HeaderMap {
        self.inner.headers()
    }

    fn headers_mut(&mut self) -> &mut HeaderMap {
        self.inner.headers_mut()
    }

    fn write_header(&mut self, status: StatusCode) {
        self.inner.write_header(status);
        self.status = status;
        self.header_written = true;
    }

    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        if !self.header_written {
            self.write_header(StatusCode::OK);
        }
        self.body = Some(buf.to_vec());
        self.inner.write(buf)
    }
}

#[cfg(test)]
mod tests {
    use http::HeaderValue;

    use super::*;
    use crate::response::Response;

    struct BrokenPipe(HeaderMap);

    impl ResponseWriter for BrokenPipe {
        fn headers(&self) -> &HeaderMap { &self.0 }
        fn headers_mut(&mut self) -> &mut HeaderMap { &mut self.0 }
        fn write_header(&mut self, _status: StatusCode) {}
        fn write(&mut self, _buf: &[u8]) -> io::Result<usize> {
            Err(io::Error::new(io::ErrorKind::BrokenPipe, "client went away"))
        }
    }

    #[test]
    fn starts_at_200_with_no_body() {
        let rec = Recorder::new(Response::default());
        assert_eq!(rec.status(), StatusCode::OK);
        assert!(rec.body().is_none());
    }

    #[test]
    fn write_without_header_commits_200() {
        let mut rec = Recorder::new(Response::status(StatusCode::IM_A_TEAPOT));
        rec.write(b"hi").expect("in-memory write");
        assert_eq!(rec.status(), StatusCode::OK);
        assert_eq!(rec.get_ref().status_code(), StatusCode::OK);
    }

    #[test]
    fn explicit_status_is_kept() {
        let mut rec = Recorder::new(Response::default());
        rec.write_header(StatusCode::NOT_FOUND);
        rec.write(b"missing").expect("in-memory write");
        assert_eq!(rec.status(), StatusCode::NOT_FOUND);
        assert_eq!(rec.get_ref().status_code(), StatusCode::NOT_FOUND);
    }

    #[test]
    fn only_last_write_is_captured_but_all_are_delivered() {
        let mut rec = Recorder::new(Response::default());
        rec.write(b"first").expect("in-memory write");
        rec.write(b"second").expect("in-memory write");
        assert_eq!(rec.body(), Some(&b"second"[..]));
        assert_eq!(rec.into_inner().body(), b"firstsecond");
    }

    #[test]
    fn headers_are_the_sinks_own() {
        let mut rec = Recorder::new(Response::default());
        rec.headers_mut()
            .insert("request-id", HeaderValue::from_static("abc"));
        let sink = rec.into_inner();
        assert_eq!(sink.headers()["request-id"], "abc");
    }

    #[test]
    fn sink_errors_are_returned_verbatim() {
        let mut rec = Recorder::new(BrokenPipe(HeaderMap::new()));
        let err = rec.write(b"data").expect_err("sink fails");
        assert_eq!(err.kind(), io::ErrorKind::BrokenPipe);
        assert_eq!(rec.body(), Some(&b"data"[..]));
    }
}
