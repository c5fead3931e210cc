use std::cell::RefCell;
use std::rc::Rc;

use tracing::trace;

use crate::assembler::HeaderAccumulator;
use crate::parser::{Event, EventReceiver, Parser};
use crate::protocol::{CallbackResult, Response};

/// Builds a [`Response`] from the events of a response parser.
///
/// The assembler is one-shot: once `message-complete` fired it unbinds every
/// handler of the parser that drove it.
///
/// ```
/// use micro_http_parser::assembler::ResponseAssembler;
/// use micro_http_parser::parser::Parser;
///
/// let mut parser = Parser::response();
/// let assembler = ResponseAssembler::attach(&mut parser);
/// parser.parse("HTTP/1.1 200 OK\r\nContent-Length: 5\r\n\r\nhello").unwrap();
///
/// let assembler = assembler.borrow();
/// assert!(assembler.is_complete());
/// assert_eq!(assembler.response().status_code(), Some(200));
/// assert_eq!(assembler.response().body(), b"hello");
/// ```
#[derive(Debug, Default)]
pub struct ResponseAssembler {
    response: Response,
    headers: HeaderAccumulator,
    complete: bool,
}

impl ResponseAssembler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates an assembler and binds it to `parser`.
    pub fn attach(parser: &mut Parser) -> Rc<RefCell<Self>> {
        let assembler = Rc::new(RefCell::new(Self::new()));
        parser.bind_to(&assembler);
        assembler
    }

    /// The response built so far.
    pub fn response(&self) -> &Response {
        &self.response
    }

    pub fn is_complete(&self) -> bool {
        self.complete
    }

    /// The finished response, `None` while the message is incomplete.
    pub fn into_response(self) -> Option<Response> {
        self.complete.then_some(self.response)
    }
}

impl EventReceiver for ResponseAssembler {
    fn handles(&self, event: Event) -> bool {
        matches!(
            event,
            Event::MessageBegin
                | Event::HeaderField
                | Event::HeaderValue
                | Event::HeadersComplete
                | Event::Body
                | Event::MessageComplete
        )
    }

    fn on_message_begin(&mut self, _parser: &mut Parser) -> CallbackResult {
        self.response = Response::new();
        self.headers = HeaderAccumulator::new();
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
        self.response.headers = self.headers.finish()?;
        self.response.status_code = parser.status_code();
        self.response.protocol_version = parser.http_version();
        self.response.keep_alive = parser.keep_alive();
        self.response.chunked_encoding = parser.chunked_encoding();
        Ok(())
    }

    fn on_body(&mut self, _parser: &mut Parser, data: &[u8]) -> CallbackResult {
        self.response.append_body(data);
        Ok(())
    }

    fn on_message_complete(&mut self, parser: &mut Parser) -> CallbackResult {
        trace!(status = ?self.response.status_code, body = self.response.content_length, "response assembled");
        self.complete = true;
        parser.unbind_all();
        Ok(())
    }
}
