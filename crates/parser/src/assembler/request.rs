use std::cell::RefCell;
use std::rc::Rc;

use bytes::BytesMut;
use tracing::trace;

use crate::assembler::HeaderAccumulator;
use crate::parser::{Event, EventReceiver, Parser};
use crate::protocol::{CallbackResult, Request};

/// Builds a [`Request`] from the events of a request parser.
///
/// URI components are appended fragment by fragment. Like
/// [`ResponseAssembler`](crate::assembler::ResponseAssembler) it unbinds the
/// parser once the message is complete.
#[derive(Debug, Default)]
pub struct RequestAssembler {
    request: Request,
    headers: HeaderAccumulator,
    target: RawTarget,
    complete: bool,
}

/// Request target bytes as received, a fragment may end inside a character.
#[derive(Debug, Default)]
struct RawTarget {
    path: BytesMut,
    query_string: BytesMut,
    fragment: BytesMut,
    uri: BytesMut,
}

impl RequestAssembler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates an assembler and binds it to `parser`.
    pub fn attach(parser: &mut Parser) -> Rc<RefCell<Self>> {
        let assembler = Rc::new(RefCell::new(Self::new()));
        parser.bind_to(&assembler);
        assembler
    }

    pub fn request(&self) -> &Request {
        &self.request
    }

    pub fn is_complete(&self) -> bool {
        self.complete
    }

    /// The finished request, `None` while the message is incomplete.
    pub fn into_request(self) -> Option<Request> {
        self.complete.then_some(self.request)
    }
}

fn append(raw: &mut BytesMut, text: &mut String, data: &[u8]) {
    raw.extend_from_slice(data);
    *text = String::from_utf8_lossy(&raw[..]).into_owned();
}

impl EventReceiver for RequestAssembler {
    fn handles(&self, event: Event) -> bool {
        event != Event::Error
    }

    fn on_message_begin(&mut self, _parser: &mut Parser) -> CallbackResult {
        self.request = Request::new();
        self.headers = HeaderAccumulator::new();
        self.target = RawTarget::default();
        self.complete = false;
        Ok(())
    }

    fn on_header_field(&mut self, _parser: &mut Parser, data: &[u8]) -> CallbackResult {
        self.headers.on_field(data);
        Ok(())
    }

    fn on_header_value(&mut self, _parser: &mut Parser, data: &[u8]) -> CallbackResult {
        self.headers.on_value(data)?;
        Ok(())
    }

    fn on_headers_complete(&mut self, parser: &mut Parser) -> CallbackResult {
        self.request.headers = self.headers.finish()?;
        self.request.method = parser.method().cloned();
        self.request.protocol_version = parser.http_version();
        self.request.keep_alive = parser.keep_alive();
        self.request.chunked_encoding = parser.chunked_encoding();
        Ok(())
    }

    fn on_body(&mut self, _parser: &mut Parser, data: &[u8]) -> CallbackResult {
        self.request.append_body(data);
        Ok(())
    }

    fn on_message_complete(&mut self, parser: &mut Parser) -> CallbackResult {
        trace!(method = ?self.request.method, uri = %self.request.uri, "request assembled");
        self.complete = true;
        parser.unbind_all();
        Ok(())
    }

    fn on_path(&mut self, _parser: &mut Parser, data: &[u8]) -> CallbackResult {
        append(&mut self.target.path, &mut self.request.path, data);
        Ok(())
    }

    fn on_query_string(&mut self, _parser: &mut Parser, data: &[u8]) -> CallbackResult {
        append(&mut self.target.query_string, &mut self.request.query_string, data);
        Ok(())
    }

    fn on_fragment(&mut self, _parser: &mut Parser, data: &[u8]) -> CallbackResult {
        append(&mut self.target.fragment, &mut self.request.fragment, data);
        Ok(())
    }

    fn on_uri(&mut self, _parser: &mut Parser, data: &[u8]) -> CallbackResult {
        append(&mut self.target.uri, &mut self.request.uri, data);
        Ok(())
    }
}
