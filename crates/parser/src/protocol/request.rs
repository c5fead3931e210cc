//! A parsed HTTP request.

use bytes::BytesMut;
use http::{Method, Version};

use crate::protocol::Headers;

/// An HTTP request built by a [`RequestAssembler`](crate::assembler::RequestAssembler).
///
/// The URI pieces are kept exactly as they appeared on the request line:
/// `uri` is the request target without its fragment, `path`, `query_string`
/// and `fragment` are its components.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Request {
    pub(crate) method: Option<Method>,
    pub(crate) uri: String,
    pub(crate) path: String,
    pub(crate) query_string: String,
    pub(crate) fragment: String,
    pub(crate) headers: Headers,
    pub(crate) protocol_version: Option<Version>,
    pub(crate) keep_alive: bool,
    pub(crate) chunked_encoding: bool,
    pub(crate) content_length: u64,
    pub(crate) body: BytesMut,
}

impl Request {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn method(&self) -> Option<&Method> {
        self.method.as_ref()
    }

    pub fn uri(&self) -> &str {
        &self.uri
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn query_string(&self) -> &str {
        &self.query_string
    }

    pub fn fragment(&self) -> &str {
        &self.fragment
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

    pub(crate) fn append_body(&mut self, data: &[u8]) {
        self.body.extend_from_slice(data);
        self.content_length += data.len() as u64;
    }
}
