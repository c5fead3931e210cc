//! The callback driven tokenizer.
//!
//! A [`Parser`] hands every chunk it is fed to its [`Recognizer`] and reports
//! the resulting tokens as events, in order, to the handlers bound to it.
//! Data events report fragments: a header name, a header value, a piece of
//! the request target or of the body may arrive in several calls, and
//! handlers are expected to append.
//!
//! # Example
//!
//! ```
//! use std::cell::RefCell;
//! use std::rc::Rc;
//! use micro_http_parser::parser::Parser;
//!
//! let body = Rc::new(RefCell::new(Vec::new()));
//! let sink = Rc::clone(&body);
//!
//! let mut parser = Parser::response();
//! parser.on_body(move |_, data| {
//!     sink.borrow_mut().extend_from_slice(data);
//!     Ok(())
//! });
//!
//! parser.feed(b"HTTP/1.1 200 OK\r\nContent-Length: 5\r\n\r\nhel").unwrap();
//! assert_eq!(parser.status_code(), Some(200));
//! parser.feed(b"lo").unwrap();
//!
//! assert_eq!(&body.borrow()[..], b"hello");
//! ```
//!
//! # Failures
//!
//! - A handler returning `Err` stops dispatching the current chunk. The error
//!   is kept as [`Parser::callback_exception`]. If an [`Event::Error`] handler
//!   is bound it receives the whole chunk and `feed` succeeds, otherwise `feed`
//!   returns [`ParseError::Callback`].
//! - Input the recognizer rejects makes `feed` return [`ParseError::Protocol`].
//!
//! Either way the parser is terminal afterwards: every further `feed` returns
//! [`ParseError::Terminated`] until [`Parser::reset`] is called.

mod callbacks;
mod config;
mod session;

pub use callbacks::{DataHandler, Event, EventReceiver, NotifyHandler};
pub use config::{ChunkSize, DEFAULT_CHUNK_SIZE, ParserConfig};

use std::cell::RefCell;
use std::fmt;
use std::io::{ErrorKind, Read};
use std::rc::Rc;
use std::sync::Arc;

use http::{Method, Version};
use tokio::io::{AsyncRead, AsyncReadExt};
use tracing::{debug, trace, warn};

use crate::codec::{H1Recognizer, Recognizer, Token};
use crate::protocol::{CallbackError, CallbackException, CallbackResult, MessageKind, ParseError};
use callbacks::{Callbacks, Handler};
use session::Session;

/// An incremental HTTP/1.x parser reporting what it recognizes through callbacks.
///
/// A parser reads either requests or responses, decided at construction. It
/// is reusable across messages: the per-message state is cleared at every
/// message boundary while bound handlers stay in place.
pub struct Parser {
    recognizer: Box<dyn Recognizer>,
    callbacks: Callbacks,
    session: Session,
    config: ParserConfig,
    tokens: Vec<Token>,
    callback_exception: Option<CallbackException>,
    internal_error: bool,
    terminal: bool,
    in_feed: bool,
}

impl Parser {
    /// A parser for requests.
    pub fn request() -> Self {
        Self::with_recognizer(H1Recognizer::request())
    }

    /// A parser for responses.
    pub fn response() -> Self {
        Self::with_recognizer(H1Recognizer::response())
    }

    pub fn with_config(kind: MessageKind, config: ParserConfig) -> Self {
        let mut parser = Self::with_recognizer(H1Recognizer::new(kind));
        parser.config = config;
        parser
    }

    /// A parser driven by any recognizer honouring the token contract.
    pub fn with_recognizer<R: Recognizer + 'static>(recognizer: R) -> Self {
        Self {
            recognizer: Box::new(recognizer),
            callbacks: Callbacks::new(),
            session: Session::default(),
            config: ParserConfig::default(),
            tokens: Vec::new(),
            callback_exception: None,
            internal_error: false,
            terminal: false,
            in_feed: false,
        }
    }

    pub fn kind(&self) -> MessageKind {
        self.recognizer.kind()
    }

    /// Feeds one chunk of input, dispatching every event it completes.
    ///
    /// # Errors
    ///
    /// - [`ParseError::Protocol`] if the input is not valid HTTP/1.x
    /// - [`ParseError::Callback`] if a handler failed and no error handler is bound
    /// - [`ParseError::Terminated`] if the parser has failed before
    /// - [`ParseError::Reentrant`] if called from one of this parser's handlers
    pub fn feed(&mut self, chunk: &[u8]) -> Result<(), ParseError> {
        self.run(chunk, |recognizer, tokens| recognizer.recognize(chunk, tokens))
    }

    /// Signals that no more input follows.
    ///
    /// A response body delimited by the end of the connection is completed.
    /// Between messages this does nothing.
    ///
    /// # Errors
    ///
    /// [`ParseError::Protocol`] if the input ends inside any other message, and
    /// the same usage errors as [`feed`](Parser::feed).
    pub fn finish(&mut self) -> Result<(), ParseError> {
        self.run(&[], |recognizer, tokens| recognizer.finish(tokens))
    }

    /// Feeds a complete input at once.
    ///
    /// # Errors
    ///
    /// As [`feed`](Parser::feed).
    pub fn parse<I: AsRef<[u8]>>(&mut self, input: I) -> Result<(), ParseError> {
        self.feed(input.as_ref())
    }

    /// Feeds everything `reader` yields in chunks of the configured size, then
    /// calls [`finish`](Parser::finish).
    ///
    /// # Errors
    ///
    /// [`ParseError::Io`] if reading fails, otherwise as [`feed`](Parser::feed).
    pub fn parse_reader<R: Read>(&mut self, reader: R) -> Result<(), ParseError> {
        let chunk_size = self.chunk_size();
        self.parse_reader_with_chunk_size(reader, chunk_size)
    }

    /// As [`parse_reader`](Parser::parse_reader) with an explicit chunk size.
    ///
    /// # Errors
    ///
    /// As [`parse_reader`](Parser::parse_reader).
    pub fn parse_reader_with_chunk_size<R: Read>(&mut self, mut reader: R, chunk_size: ChunkSize) -> Result<(), ParseError> {
        let mut buf = vec![0; chunk_size.get()];
        loop {
            match reader.read(&mut buf) {
                Ok(0) => break,
                Ok(n) => {
                    trace!(read = n, "read chunk");
                    self.feed(&buf[..n])?;
                }
                Err(e) if e.kind() == ErrorKind::Interrupted => {}
                Err(e) => return Err(ParseError::io(e)),
            }
        }
        self.finish()
    }

    /// As [`parse_reader`](Parser::parse_reader) for an asynchronous source.
    ///
    /// # Errors
    ///
    /// As [`parse_reader`](Parser::parse_reader).
    pub async fn parse_async_reader<R: AsyncRead + Unpin>(&mut self, mut reader: R) -> Result<(), ParseError> {
        let mut buf = vec![0; self.chunk_size().get()];
        loop {
            let n = reader.read(&mut buf).await?;
            if n == 0 {
                break;
            }
            trace!(read = n, "read chunk");
            self.feed(&buf[..n])?;
        }
        self.finish()
    }

    /// Binds `receiver` with [`bind_to`](Parser::bind_to), then parses
    /// `reader`, with `chunk_size` if given.
    ///
    /// # Errors
    ///
    /// As [`parse_reader`](Parser::parse_reader).
    pub fn bind_and_parse<T, R>(
        &mut self,
        receiver: &Rc<RefCell<T>>,
        reader: R,
        chunk_size: Option<ChunkSize>,
    ) -> Result<(), ParseError>
    where
        T: EventReceiver + 'static,
        R: Read,
    {
        self.bind_to(receiver);
        let chunk_size = chunk_size.unwrap_or_else(|| self.chunk_size());
        self.parse_reader_with_chunk_size(reader, chunk_size)
    }

    /// Returns the parser to its freshly constructed state. Handlers and
    /// configuration are kept.
    pub fn reset(&mut self) {
        debug!("reset parser");
        self.recognizer.reset();
        self.session.clear();
        self.callback_exception = None;
        self.internal_error = false;
        self.terminal = false;
    }

    pub fn config(&self) -> &ParserConfig {
        &self.config
    }

    /// The chunk size of the streaming helpers: the override if one is
    /// configured, the process wide default otherwise.
    pub fn chunk_size(&self) -> ChunkSize {
        self.config.effective_chunk_size()
    }

    pub fn set_chunk_size(&mut self, chunk_size: ChunkSize) {
        self.config = self.config.chunk_size(chunk_size);
    }

    /// Request method of the current message.
    pub fn method(&self) -> Option<&Method> {
        self.session.method.as_ref()
    }

    /// Status code of the current message.
    pub fn status_code(&self) -> Option<u16> {
        self.session.status_code
    }

    pub fn http_version(&self) -> Option<Version> {
        self.session.version
    }

    /// Whether the connection may carry another message after this one.
    pub fn keep_alive(&self) -> bool {
        self.session.keep_alive
    }

    pub fn chunked_encoding(&self) -> bool {
        self.session.chunked
    }

    /// The declared `Content-Length` of the current message.
    pub fn content_length(&self) -> Option<u64> {
        self.session.content_length
    }

    /// The error returned by the handler that failed, if one did.
    pub fn callback_exception(&self) -> Option<&CallbackException> {
        self.callback_exception.as_ref()
    }

    /// True once the input has been rejected.
    pub fn is_internal_parser_error(&self) -> bool {
        self.internal_error
    }

    /// True once the input has been rejected or a handler has failed.
    pub fn has_error(&self) -> bool {
        self.internal_error || self.callback_exception.is_some()
    }

    /// True when the parser refuses further input until reset.
    pub fn is_terminated(&self) -> bool {
        self.terminal
    }

    pub fn on_message_begin<F>(&mut self, handler: F)
    where
        F: FnMut(&mut Parser) -> CallbackResult + 'static,
    {
        self.callbacks.set(Event::MessageBegin, Handler::Notify(Box::new(handler)));
    }

    pub fn on_header_field<F>(&mut self, handler: F)
    where
        F: FnMut(&mut Parser, &[u8]) -> CallbackResult + 'static,
    {
        self.callbacks.set(Event::HeaderField, Handler::Data(Box::new(handler)));
    }

    pub fn on_header_value<F>(&mut self, handler: F)
    where
        F: FnMut(&mut Parser, &[u8]) -> CallbackResult + 'static,
    {
        self.callbacks.set(Event::HeaderValue, Handler::Data(Box::new(handler)));
    }

    pub fn on_headers_complete<F>(&mut self, handler: F)
    where
        F: FnMut(&mut Parser) -> CallbackResult + 'static,
    {
        self.callbacks.set(Event::HeadersComplete, Handler::Notify(Box::new(handler)));
    }

    pub fn on_body<F>(&mut self, handler: F)
    where
        F: FnMut(&mut Parser, &[u8]) -> CallbackResult + 'static,
    {
        self.callbacks.set(Event::Body, Handler::Data(Box::new(handler)));
    }

    pub fn on_message_complete<F>(&mut self, handler: F)
    where
        F: FnMut(&mut Parser) -> CallbackResult + 'static,
    {
        self.callbacks.set(Event::MessageComplete, Handler::Notify(Box::new(handler)));
    }

    /// The handler receives the whole chunk being fed when another handler fails.
    pub fn on_error<F>(&mut self, handler: F)
    where
        F: FnMut(&mut Parser, &[u8]) -> CallbackResult + 'static,
    {
        self.callbacks.set(Event::Error, Handler::Data(Box::new(handler)));
    }

    pub fn on_path<F>(&mut self, handler: F)
    where
        F: FnMut(&mut Parser, &[u8]) -> CallbackResult + 'static,
    {
        self.callbacks.set(Event::Path, Handler::Data(Box::new(handler)));
    }

    pub fn on_query_string<F>(&mut self, handler: F)
    where
        F: FnMut(&mut Parser, &[u8]) -> CallbackResult + 'static,
    {
        self.callbacks.set(Event::QueryString, Handler::Data(Box::new(handler)));
    }

    pub fn on_fragment<F>(&mut self, handler: F)
    where
        F: FnMut(&mut Parser, &[u8]) -> CallbackResult + 'static,
    {
        self.callbacks.set(Event::Fragment, Handler::Data(Box::new(handler)));
    }

    pub fn on_uri<F>(&mut self, handler: F)
    where
        F: FnMut(&mut Parser, &[u8]) -> CallbackResult + 'static,
    {
        self.callbacks.set(Event::Uri, Handler::Data(Box::new(handler)));
    }

    /// The events [`bind_to`](Parser::bind_to) considers for this parser.
    pub fn bindable_events(&self) -> Vec<Event> {
        match self.kind() {
            MessageKind::Request => Event::CORE.into_iter().chain(Event::REQUEST_URI).collect(),
            MessageKind::Response => Event::CORE.to_vec(),
        }
    }

    /// Binds every event `receiver` handles to the matching receiver method.
    ///
    /// Events the receiver does not handle keep their current handler.
    pub fn bind_to<T: EventReceiver + 'static>(&mut self, receiver: &Rc<RefCell<T>>) {
        for event in self.bindable_events() {
            if !receiver.borrow().handles(event) {
                continue;
            }
            trace!(%event, "bind receiver");

            let receiver = Rc::clone(receiver);
            let handler = match event {
                Event::MessageBegin => notify(receiver, T::on_message_begin),
                Event::HeaderField => data(receiver, T::on_header_field),
                Event::HeaderValue => data(receiver, T::on_header_value),
                Event::HeadersComplete => notify(receiver, T::on_headers_complete),
                Event::Body => data(receiver, T::on_body),
                Event::MessageComplete => notify(receiver, T::on_message_complete),
                Event::Error => data(receiver, T::on_error),
                Event::Path => data(receiver, T::on_path),
                Event::QueryString => data(receiver, T::on_query_string),
                Event::Fragment => data(receiver, T::on_fragment),
                Event::Uri => data(receiver, T::on_uri),
            };
            self.callbacks.set(event, handler);
        }
    }

    pub fn unbind(&mut self, event: Event) {
        self.callbacks.unset(event);
    }

    /// Removes every handler. Takes effect immediately, also when called from
    /// a running handler.
    pub fn unbind_all(&mut self) {
        self.callbacks.clear();
    }

    pub fn is_bound(&self, event: Event) -> bool {
        self.callbacks.is_bound(event)
    }

    fn run<F>(&mut self, chunk: &[u8], recognize: F) -> Result<(), ParseError>
    where
        F: FnOnce(&mut dyn Recognizer, &mut Vec<Token>),
    {
        if self.in_feed {
            return Err(ParseError::Reentrant);
        }
        if self.terminal {
            return Err(ParseError::Terminated);
        }

        let mut tokens = std::mem::take(&mut self.tokens);
        recognize(self.recognizer.as_mut(), &mut tokens);
        trace!(len = chunk.len(), tokens = tokens.len(), "recognized chunk");

        self.in_feed = true;
        let mut result = Ok(());
        for token in tokens.drain(..) {
            result = self.dispatch(token);
            if result.is_err() {
                break;
            }
        }
        if let Err(ParseError::Callback { source }) = result {
            result = self.callback_failed(source, chunk);
        }
        self.in_feed = false;

        tokens.clear();
        self.tokens = tokens;
        result
    }

    fn dispatch(&mut self, token: Token) -> Result<(), ParseError> {
        match token {
            Token::MessageStart => {
                self.session.clear();
                self.fire(Event::MessageBegin, &[])
            }
            Token::Uri(part, bytes) => self.fire(Event::from(part), &bytes),
            Token::HeaderField(bytes) => self.fire(Event::HeaderField, &bytes),
            Token::HeaderValue(bytes) => self.fire(Event::HeaderValue, &bytes),
            Token::HeadersComplete(head) => {
                self.session.apply(head);
                self.fire(Event::HeadersComplete, &[])
            }
            Token::Body(bytes) => self.fire(Event::Body, &bytes),
            Token::MessageComplete => {
                let result = self.fire(Event::MessageComplete, &[]);
                self.session.clear();
                result
            }
            Token::Error { position, reason } => {
                warn!(position, %reason, "input rejected");
                self.internal_error = true;
                self.terminal = true;
                Err(ParseError::Protocol { position, reason })
            }
        }
    }

    fn fire(&mut self, event: Event, data: &[u8]) -> Result<(), ParseError> {
        let Some((mut handler, version)) = self.callbacks.take(event) else {
            return Ok(());
        };

        let result = handler.call(self, data);
        self.callbacks.restore(event, handler, version);

        result.map_err(|e| self.capture(event, e))
    }

    fn capture(&mut self, event: Event, e: CallbackError) -> ParseError {
        let source: CallbackException = Arc::from(e);
        debug!(%event, cause = %source, "callback failed");
        self.callback_exception = Some(Arc::clone(&source));
        self.terminal = true;
        ParseError::callback(source)
    }

    /// Hands the chunk to the error handler if there is one.
    fn callback_failed(&mut self, source: CallbackException, chunk: &[u8]) -> Result<(), ParseError> {
        if !self.callbacks.is_bound(Event::Error) {
            return Err(ParseError::callback(source));
        }
        self.fire(Event::Error, chunk)
    }
}

fn notify<T: EventReceiver + 'static>(
    receiver: Rc<RefCell<T>>,
    method: fn(&mut T, &mut Parser) -> CallbackResult,
) -> Handler {
    Handler::Notify(Box::new(move |parser: &mut Parser| method(&mut *receiver.try_borrow_mut()?, parser)))
}

fn data<T: EventReceiver + 'static>(
    receiver: Rc<RefCell<T>>,
    method: fn(&mut T, &mut Parser, &[u8]) -> CallbackResult,
) -> Handler {
    Handler::Data(Box::new(move |parser: &mut Parser, bytes: &[u8]| method(&mut *receiver.try_borrow_mut()?, parser, bytes)))
}

impl fmt::Debug for Parser {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Parser")
            .field("kind", &self.kind())
            .field("callbacks", &self.callbacks)
            .field("session", &self.session)
            .field("config", &self.config)
            .field("has_error", &self.has_error())
            .field("terminal", &self.terminal)
            .finish_non_exhaustive()
    }
}
