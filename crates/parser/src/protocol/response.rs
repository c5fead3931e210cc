//! A parsed HTTP response.

use bytes::BytesMut;
use http::Version;

use crate::protocol::message::version_str;
use crate::protocol::{Headers, status};

/// An HTTP response built by a [`ResponseAssembler`](crate::assembler::ResponseAssembler).
///
/// Everything read from the head is available once `headers-complete` fired,
/// `body` and `content_length` are final after `message-complete`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Response {
    pub(crate) status_code: Option<u16>,
    pub(crate) headers: Headers,
    pub(crate) protocol_version: Option<Version>,
    pub(crate) keep_alive: bool,
    pub(crate) chunked_encoding: bool,
    pub(crate) content_length: u64,
    pub(crate) body: BytesMut,
}

impl Response {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn status_code(&self) -> Option<u16> {
        self.status_code
    }

    pub fn headers(&self) -> &Headers {
        &self.headers
    }

    pub fn headers_mut(&mut self) -> &mut Headers {
        &mut self.headers
    }

    pub fn protocol_version(&self) -> Option<Version> {
        self.protocol_version
    }

    pub fn keep_alive(&self) -> bool {
        self.keep_alive
    }

    pub fn chunked_encoding(&self) -> bool {
        self.chunked_encoding
    }

    /// Number of body bytes actually read, not the `Content-Length` header.
    pub fn content_length(&self) -> u64 {
        self.content_length
    }

    pub fn body(&self) -> &[u8] {
        &self.body
    }

    pub fn into_body(self) -> BytesMut {
        self.body
    }

    /// The first line of the response: `HTTP-Version Status-Code Reason-Phrase CRLF`.
    ///
    /// An unknown status code renders with an empty reason phrase.
    pub fn status_line(&self) -> String {
        let version = self.protocol_version.map_or("", version_str);
        let code = self.status_code.unwrap_or_default();
        let reason = status::reason_for(code).unwrap_or_default();
        format!("HTTP/{version} {code} {reason}\r\n")
    }

    pub(crate) fn append_body(&mut self, data: &[u8]) {
        self.body.extend_from_slice(data);
        self.content_length += data.len() as u64;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_line_with_known_code() {
        let response = Response { status_code: Some(200), protocol_version: Some(Version::HTTP_11), ..Response::new() };
        assert_eq!(response.status_line(), "HTTP/1.1 200 OK\r\n");
    }

    #[test]
    fn status_line_with_unknown_code() {
        let response = Response { status_code: Some(299), protocol_version: Some(Version::HTTP_10), ..Response::new() };
        assert_eq!(response.status_line(), "HTTP/1.0 299 \r\n");
    }

    #[test]
    fn append_counts_bytes() {
        let mut response = Response::new();
        response.append_body(b"hel");
        response.append_body(b"lo");
        assert_eq!(response.body(), b"hello");
        assert_eq!(response.content_length(), 5);
    }
}
