//! The HTTP/1.x recognizer shipped with the crate.
//!
//! [`H1Recognizer`] buffers input until a message head is complete, decodes it
//! with [`HeadDecoder`] and then streams the body through a
//! [`PayloadDecoder`]. Between messages it goes back to waiting for a head, so
//! pipelined messages in one chunk are recognized back to back.

use bytes::{Buf, Bytes, BytesMut};
use memchr::{memchr, memmem};
use tokio_util::codec::Decoder;
use tracing::{debug, trace};

use crate::codec::body::PayloadDecoder;
use crate::codec::error::DecodeError;
use crate::codec::header::{HeadDecoder, ParsedHead};
use crate::codec::token::{Head, Recognizer, Token, UriPart};
use crate::protocol::{MessageKind, PayloadItem, PayloadSize};

#[derive(Debug)]
enum State {
    /// Between messages.
    Idle,
    /// Inside a head, `MessageStart` already emitted.
    Head,
    Body(PayloadDecoder),
    Failed,
}

/// Recognizes a stream of HTTP/1.0 and HTTP/1.1 requests or responses.
#[derive(Debug)]
pub struct H1Recognizer {
    kind: MessageKind,
    head_decoder: HeadDecoder,
    buf: BytesMut,
    /// Bytes of the stream already taken out of `buf`.
    consumed: u64,
    state: State,
}

impl H1Recognizer {
    pub fn new(kind: MessageKind) -> Self {
        Self { kind, head_decoder: HeadDecoder::new(kind), buf: BytesMut::new(), consumed: 0, state: State::Idle }
    }

    pub fn request() -> Self {
        Self::new(MessageKind::Request)
    }

    pub fn response() -> Self {
        Self::new(MessageKind::Response)
    }

    /// Runs one state transition, returns whether another one may follow.
    fn step(&mut self, tokens: &mut Vec<Token>) -> Result<bool, DecodeError> {
        match &mut self.state {
            State::Idle => {
                let blank = self.buf.iter().take_while(|b| matches!(b, b'\r' | b'\n')).count();
                self.buf.advance(blank);
                if self.buf.is_empty() {
                    return Ok(false);
                }
                tokens.push(Token::MessageStart);
                self.state = State::Head;
                Ok(true)
            }
            State::Head => {
                let Some((head, payload_size)) = self.head_decoder.decode(&mut self.buf)? else {
                    return Ok(false);
                };
                self.push_head(head, payload_size, tokens);
                if payload_size.is_empty() {
                    tokens.push(Token::MessageComplete);
                    self.state = State::Idle;
                } else {
                    self.state = State::Body(PayloadDecoder::from(payload_size));
                }
                Ok(true)
            }
            State::Body(payload_decoder) => match payload_decoder.decode(&mut self.buf)? {
                Some(PayloadItem::Chunk(bytes)) => {
                    if !bytes.is_empty() {
                        tokens.push(Token::Body(bytes));
                    }
                    Ok(true)
                }
                Some(PayloadItem::Eof) => {
                    trace!("message body finished");
                    tokens.push(Token::MessageComplete);
                    self.state = State::Idle;
                    Ok(true)
                }
                None => Ok(false),
            },
            State::Failed => Ok(false),
        }
    }

    fn push_head(&self, head: ParsedHead, payload_size: PayloadSize, tokens: &mut Vec<Token>) {
        debug!(
            kind = ?self.kind,
            method = ?head.method,
            status = ?head.status_code,
            version = ?head.version,
            ?payload_size,
            "recognized message head"
        );

        if let Some(target) = &head.target {
            push_target(target, tokens);
        }

        for (name, value) in head.fields {
            tokens.push(Token::HeaderField(name));
            tokens.push(Token::HeaderValue(value));
        }

        tokens.push(Token::HeadersComplete(Head {
            method: head.method,
            status_code: head.status_code,
            version: head.version,
            keep_alive: head.keep_alive,
            chunked: payload_size.is_chunked(),
            content_length: head.content_length,
        }));
    }

    fn fail(&mut self, position: u64, e: &DecodeError, tokens: &mut Vec<Token>) {
        debug!(position, cause = %e, "rejecting input");
        tokens.push(Token::error(position, e));
        self.buf.clear();
        self.state = State::Failed;
    }
}

/// Splits a request target into its components.
///
/// Origin-form targets start with the path, absolute-form targets carry it
/// after the authority, authority-form targets have none.
fn push_target(target: &Bytes, tokens: &mut Vec<Token>) {
    let uri_end = memchr(b'#', target).unwrap_or(target.len());
    let query_start = memchr(b'?', &target[..uri_end]);
    let path_end = query_start.unwrap_or(uri_end);

    let path_start = if target.starts_with(b"/") || &target[..] == b"*" {
        Some(0)
    } else {
        memmem::find(&target[..path_end], b"://").and_then(|scheme_end| {
            let authority_start = scheme_end + 3;
            memchr(b'/', &target[authority_start..path_end]).map(|offset| authority_start + offset)
        })
    };

    if let Some(path_start) = path_start {
        tokens.push(Token::Uri(UriPart::Path, target.slice(path_start..path_end)));
    }
    if let Some(query_start) = query_start
        && query_start + 1 < uri_end
    {
        tokens.push(Token::Uri(UriPart::QueryString, target.slice(query_start + 1..uri_end)));
    }
    tokens.push(Token::Uri(UriPart::Uri, target.slice(..uri_end)));
    if uri_end + 1 < target.len() {
        tokens.push(Token::Uri(UriPart::Fragment, target.slice(uri_end + 1..)));
    }
}

impl Recognizer for H1Recognizer {
    fn kind(&self) -> MessageKind {
        self.kind
    }

    fn recognize(&mut self, input: &[u8], tokens: &mut Vec<Token>) {
        if matches!(self.state, State::Failed) {
            return;
        }
        self.buf.extend_from_slice(input);

        loop {
            let before = self.buf.len();
            let step = self.step(tokens);
            let taken = (before - self.buf.len()) as u64;
            self.consumed += taken;

            match step {
                Ok(true) => {}
                Ok(false) => return,
                Err(e) => {
                    // body decoders have already taken the offending byte
                    let position = self.consumed - taken.min(1);
                    self.fail(position, &e, tokens);
                    return;
                }
            }
        }
    }

    fn finish(&mut self, tokens: &mut Vec<Token>) {
        let result = match &mut self.state {
            State::Idle | State::Failed => return,
            State::Head => Err(DecodeError::unexpected_eof("message head is incomplete")),
            State::Body(payload_decoder) => payload_decoder.decode_eof(&mut self.buf),
        };

        match result {
            Ok(Some(PayloadItem::Chunk(bytes))) => {
                tokens.push(Token::Body(bytes));
                tokens.push(Token::MessageComplete);
                self.state = State::Idle;
            }
            Ok(Some(PayloadItem::Eof)) => {
                trace!("body delimited by end of input finished");
                tokens.push(Token::MessageComplete);
                self.state = State::Idle;
            }
            Ok(None) => {}
            Err(e) => self.fail(self.consumed, &e, tokens),
        }
    }

    fn reset(&mut self) {
        self.buf.clear();
        self.consumed = 0;
        self.state = State::Idle;
    }
}
