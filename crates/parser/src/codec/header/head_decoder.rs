//! Decoder for the start line and header block of a request or response.
//!
//! The head is parsed with `httparse` once it is complete, then split off the
//! source buffer. Header names and values, as well as the request target, are
//! handed out as `Bytes` slices of that frozen head: no copies are made.
//!
//! # Limits
//!
//! - Maximum number of header lines: 96
//! - Maximum head size: 80KB
//!
//! Request lines are checked for a known method as soon as the method token is
//! available, so garbage is rejected without waiting for a full line.

use bytes::{Bytes, BytesMut};
use http::{Method, Version};
use httparse::{Error, Status};
use memchr::memchr;
use tokio_util::codec::Decoder;
use tracing::trace;

use crate::codec::error::DecodeError;
use crate::ensure;
use crate::protocol::{MessageKind, PayloadSize, method, status};

/// Maximum number of headers allowed in a message head
const MAX_HEADER_NUM: usize = 96;

/// Maximum size in bytes allowed for the entire head
const MAX_HEADER_BYTES: usize = 80 * 1024;

/// A fully decoded message head.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedHead {
    pub method: Option<Method>,
    pub status_code: Option<u16>,
    /// The raw request target, requests only.
    pub target: Option<Bytes>,
    pub version: Version,
    /// Header lines in wire order, names keep their casing.
    pub fields: Vec<(Bytes, Bytes)>,
    pub content_length: Option<u64>,
    pub keep_alive: bool,
}

/// Decoder for message heads implementing the [`Decoder`] trait.
///
/// Yields the [`ParsedHead`] together with the [`PayloadSize`] that frames the
/// body following it.
#[derive(Debug, Clone, Copy)]
pub struct HeadDecoder {
    kind: MessageKind,
}

impl HeadDecoder {
    pub fn new(kind: MessageKind) -> Self {
        Self { kind }
    }
}

impl Decoder for HeadDecoder {
    type Item = (ParsedHead, PayloadSize);
    type Error = DecodeError;

    /// Attempts to decode a message head from the provided bytes buffer.
    ///
    /// # Returns
    ///
    /// - `Ok(Some((head, payload_size)))` if a complete head was parsed and split off `src`
    /// - `Ok(None)` if more data is needed
    /// - `Err(DecodeError)` if the head is malformed or exceeds the limits
    fn decode(&mut self, src: &mut BytesMut) -> Result<Option<Self::Item>, Self::Error> {
        let head = match self.kind {
            MessageKind::Request => decode_request(src)?,
            MessageKind::Response => decode_response(src)?,
        };

        let Some(mut head) = head else {
            return Ok(None);
        };

        let payload_size = parse_payload(self.kind, &head)?;
        head.content_length = content_length(&head.fields)?;
        head.keep_alive = keep_alive(head.version, &head.fields, payload_size);
        trace!(?payload_size, keep_alive = head.keep_alive, "decoded message head");

        Ok(Some((head, payload_size)))
    }
}

fn decode_request(src: &mut BytesMut) -> Result<Option<ParsedHead>, DecodeError> {
    check_method(src)?;

    let mut headers = [httparse::EMPTY_HEADER; MAX_HEADER_NUM];
    let mut req = httparse::Request::new(&mut headers);

    let body_offset = match req.parse(src).map_err(from_httparse)? {
        Status::Complete(body_offset) => body_offset,
        Status::Partial => {
            ensure!(src.len() <= MAX_HEADER_BYTES, DecodeError::too_large_header(src.len(), MAX_HEADER_BYTES));
            return Ok(None);
        }
    };
    trace!(head_size = body_offset, "parsed request head");
    ensure!(body_offset <= MAX_HEADER_BYTES, DecodeError::too_large_header(body_offset, MAX_HEADER_BYTES));

    let method = req.method.and_then(method::to_method).ok_or(DecodeError::InvalidMethod)?;
    let target = req.path.map(|path| span(src, path.as_bytes())).ok_or(DecodeError::InvalidUri)?;
    let version = to_version(req.version)?;

    let indices = HeaderIndex::record(src, req.headers);
    let head_bytes = src.split_to(body_offset).freeze();

    Ok(Some(ParsedHead {
        method: Some(method),
        status_code: None,
        target: Some(head_bytes.slice(target.0..target.1)),
        version,
        fields: HeaderIndex::slice(&head_bytes, &indices),
        content_length: None,
        keep_alive: false,
    }))
}

fn decode_response(src: &mut BytesMut) -> Result<Option<ParsedHead>, DecodeError> {
    let mut headers = [httparse::EMPTY_HEADER; MAX_HEADER_NUM];
    let mut res = httparse::Response::new(&mut headers);

    let body_offset = match res.parse(src).map_err(from_httparse)? {
        Status::Complete(body_offset) => body_offset,
        Status::Partial => {
            ensure!(src.len() <= MAX_HEADER_BYTES, DecodeError::too_large_header(src.len(), MAX_HEADER_BYTES));
            return Ok(None);
        }
    };
    trace!(head_size = body_offset, "parsed response head");
    ensure!(body_offset <= MAX_HEADER_BYTES, DecodeError::too_large_header(body_offset, MAX_HEADER_BYTES));

    let status_code = res.code.ok_or(DecodeError::InvalidStatus)?;
    let version = to_version(res.version)?;

    let indices = HeaderIndex::record(src, res.headers);
    let head_bytes = src.split_to(body_offset).freeze();

    Ok(Some(ParsedHead {
        method: None,
        status_code: Some(status_code),
        target: None,
        version,
        fields: HeaderIndex::slice(&head_bytes, &indices),
        content_length: None,
        keep_alive: false,
    }))
}

/// Rejects a request line whose method token cannot become a known method.
fn check_method(src: &[u8]) -> Result<(), DecodeError> {
    match memchr(b' ', src) {
        Some(end) => ensure!(method::is_known(&src[..end]), DecodeError::InvalidMethod),
        None => ensure!(method::is_known_prefix(src), DecodeError::InvalidMethod),
    }
    Ok(())
}

fn to_version(version: Option<u8>) -> Result<Version, DecodeError> {
    match version {
        Some(0) => Ok(Version::HTTP_10),
        Some(1) => Ok(Version::HTTP_11),
        // HTTP/2 and HTTP/3 don't use this framing
        v => Err(DecodeError::InvalidVersion(v)),
    }
}

fn from_httparse(e: Error) -> DecodeError {
    match e {
        Error::TooManyHeaders => DecodeError::too_many_headers(MAX_HEADER_NUM),
        Error::Version => DecodeError::InvalidVersion(None),
        Error::Status => DecodeError::InvalidStatus,
        e => DecodeError::invalid_header(e.to_string()),
    }
}

/// Start and end of `part` inside `bytes`, `part` must point into `bytes`.
fn span(bytes: &[u8], part: &[u8]) -> (usize, usize) {
    let start = part.as_ptr() as usize - bytes.as_ptr() as usize;
    (start, start + part.len())
}

/// Stores the byte range positions of a header's name and value within the frozen head.
#[derive(Clone, Copy)]
struct HeaderIndex {
    name: (usize, usize),
    value: (usize, usize),
}

impl HeaderIndex {
    /// Records the byte positions of header names and values from the parsed headers.
    fn record(bytes: &[u8], headers: &[httparse::Header<'_>]) -> Vec<HeaderIndex> {
        headers
            .iter()
            .map(|header| HeaderIndex { name: span(bytes, header.name.as_bytes()), value: span(bytes, header.value) })
            .collect()
    }

    fn slice(head: &Bytes, indices: &[HeaderIndex]) -> Vec<(Bytes, Bytes)> {
        indices.iter().map(|index| (head.slice(index.name.0..index.name.1), head.slice(index.value.0..index.value.1))).collect()
    }
}

/// Determines how the body following `head` is framed, see
/// [RFC 9112 section 6.3](https://www.rfc-editor.org/rfc/rfc9112.html#name-message-body-length).
///
/// # Errors
///
/// Returns `DecodeError` if:
/// - Both Content-Length and Transfer-Encoding headers are present
/// - Content-Length value is invalid
fn parse_payload(kind: MessageKind, head: &ParsedHead) -> Result<PayloadSize, DecodeError> {
    if head.status_code.is_some_and(status::has_no_body) {
        return Ok(PayloadSize::Empty);
    }

    let te_value = header_values(&head.fields, "transfer-encoding").last();
    let cl_value = content_length(&head.fields)?;

    match (te_value, cl_value) {
        (Some(_), Some(_)) => {
            Err(DecodeError::invalid_content_length("transfer_encoding and content_length both present in headers"))
        }
        (Some(te), None) if is_chunked(te) => Ok(PayloadSize::Chunked),
        (Some(_), None) if kind == MessageKind::Request => {
            Err(DecodeError::invalid_header("request transfer_encoding must end with chunked"))
        }
        (None, Some(length)) => Ok(PayloadSize::Length(length)),
        _ => match kind {
            MessageKind::Request => Ok(PayloadSize::Empty),
            MessageKind::Response => Ok(PayloadSize::UntilEof),
        },
    }
}

fn header_values<'a>(fields: &'a [(Bytes, Bytes)], name: &'a str) -> impl Iterator<Item = &'a [u8]> + 'a {
    fields.iter().filter(move |(n, _)| n.eq_ignore_ascii_case(name.as_bytes())).map(|(_, v)| &v[..])
}

/// The declared content length; repeated headers must agree.
fn content_length(fields: &[(Bytes, Bytes)]) -> Result<Option<u64>, DecodeError> {
    let mut length = None;
    for value in header_values(fields, "content-length") {
        let cl_str = std::str::from_utf8(value).map_err(|_| DecodeError::invalid_content_length("value can't to_str"))?;
        let parsed = cl_str
            .trim()
            .parse::<u64>()
            .map_err(|_| DecodeError::invalid_content_length(format!("value {cl_str} is not u64")))?;

        match length {
            Some(previous) if previous != parsed => {
                return Err(DecodeError::invalid_content_length(format!("conflicting values {previous} and {parsed}")));
            }
            _ => length = Some(parsed),
        }
    }
    Ok(length)
}

/// Checks if a Transfer-Encoding value ends with the chunked coding.
///
/// According to RFC 7230, chunked must be the last encoding if present.
fn is_chunked(value: &[u8]) -> bool {
    const CHUNKED: &[u8] = b"chunked";
    value.rsplit(|b| *b == b',').next().is_some_and(|last| last.trim_ascii().eq_ignore_ascii_case(CHUNKED))
}

fn has_token(fields: &[(Bytes, Bytes)], name: &str, token: &[u8]) -> bool {
    header_values(fields, name).flat_map(|value| value.split(|b| *b == b',')).any(|t| t.trim_ascii().eq_ignore_ascii_case(token))
}

/// HTTP/1.1 connections persist unless closed, HTTP/1.0 ones only on request.
/// A body that ends with the connection never allows reuse.
fn keep_alive(version: Version, fields: &[(Bytes, Bytes)], payload_size: PayloadSize) -> bool {
    if payload_size.is_until_eof() {
        return false;
    }
    if version == Version::HTTP_11 {
        !has_token(fields, "connection", b"close")
    } else {
        has_token(fields, "connection", b"keep-alive")
    }
}
