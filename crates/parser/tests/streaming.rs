use std::cell::{Cell, RefCell};
use std::io::{self, Cursor, ErrorKind, Read};
use std::rc::Rc;

use bytes::Bytes;
use http::{Method, Version};
use micro_http_parser::assembler::{RequestAssembler, ResponseAssembler};
use micro_http_parser::codec::{Head, Recognizer, Token, UriPart};
use micro_http_parser::parser::{ChunkSize, DEFAULT_CHUNK_SIZE, Parser, ParserConfig};
use micro_http_parser::protocol::{MessageKind, ParseError};

const CHUNKED_RESPONSE: &str = "HTTP/1.1 200 OK\r\nTransfer-Encoding: chunked\r\n\r\n\
                                4\r\nWiki\r\n5\r\npedia\r\n0\r\n\r\n";

const POST: &str = "POST /upload?kind=text HTTP/1.1\r\nHost: example.com\r\nContent-Length: 11\r\n\r\nhello world";

fn init_tracing() {
    let _ = tracing_subscriber::fmt().with_test_writer().try_init();
}

/// Records the size of every read buffer it is handed.
struct SizeRecorder {
    inner: Cursor<Vec<u8>>,
    buffer_sizes: Rc<RefCell<Vec<usize>>>,
}

impl Read for SizeRecorder {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        self.buffer_sizes.borrow_mut().push(buf.len());
        self.inner.read(buf)
    }
}

/// Yields `Interrupted` once before every successful read.
struct Flaky {
    inner: Cursor<Vec<u8>>,
    interrupted: bool,
}

impl Read for Flaky {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        self.interrupted = !self.interrupted;
        if self.interrupted {
            return Err(ErrorKind::Interrupted.into());
        }
        self.inner.read(buf)
    }
}

struct Broken;

impl Read for Broken {
    fn read(&mut self, _buf: &mut [u8]) -> io::Result<usize> {
        Err(io::Error::new(ErrorKind::ConnectionReset, "peer went away"))
    }
}

/// Replays a fixed token sequence on the first call.
struct Scripted {
    tokens: Vec<Token>,
}

impl Recognizer for Scripted {
    fn kind(&self) -> MessageKind {
        MessageKind::Request
    }

    fn recognize(&mut self, _input: &[u8], tokens: &mut Vec<Token>) {
        tokens.append(&mut self.tokens);
    }

    fn finish(&mut self, _tokens: &mut Vec<Token>) {}

    fn reset(&mut self) {
        self.tokens.clear();
    }
}

#[test]
fn reads_a_chunked_response_from_a_reader() {
    init_tracing();
    let mut parser = Parser::response();
    let assembler = ResponseAssembler::attach(&mut parser);

    parser.parse_reader(Cursor::new(CHUNKED_RESPONSE)).unwrap();

    let assembler = assembler.borrow();
    assert!(assembler.is_complete());
    assert_eq!(assembler.response().body(), b"Wikipedia");
    assert!(assembler.response().chunked_encoding());
}

#[test]
fn reads_with_an_explicit_chunk_size() {
    let sizes = Rc::new(RefCell::new(Vec::new()));
    let recorder = SizeRecorder { inner: Cursor::new(POST.as_bytes().to_vec()), buffer_sizes: Rc::clone(&sizes) };

    let mut parser = Parser::request();
    let assembler = RequestAssembler::attach(&mut parser);
    parser.parse_reader_with_chunk_size(recorder, ChunkSize::new(5).unwrap()).unwrap();

    assert!(sizes.borrow().iter().all(|size| *size == 5));
    let assembler = assembler.borrow();
    assert_eq!(assembler.request().body(), b"hello world");
    assert_eq!(assembler.request().query_string(), "kind=text");
}

#[test]
fn parser_override_wins_over_global_default() {
    let sizes = Rc::new(RefCell::new(Vec::new()));
    let recorder = SizeRecorder { inner: Cursor::new(POST.as_bytes().to_vec()), buffer_sizes: Rc::clone(&sizes) };

    let config = ParserConfig::new().chunk_size(ChunkSize::new(7).unwrap());
    let mut parser = Parser::with_config(MessageKind::Request, config);
    parser.parse_reader(recorder).unwrap();

    assert_eq!(sizes.borrow()[0], 7);
    assert_eq!(parser.chunk_size().get(), 7);
}

// The only test touching the process wide default.
#[test]
fn global_default_applies_to_existing_parsers() {
    let parser = Parser::request();
    assert_eq!(ChunkSize::global_default().get(), DEFAULT_CHUNK_SIZE);

    ChunkSize::set_global_default(ChunkSize::new(1024).unwrap());
    assert_eq!(parser.chunk_size().get(), 1024);
    assert_eq!(Parser::response().chunk_size().get(), 1024);

    ChunkSize::set_global_default(ChunkSize::DEFAULT);
    assert_eq!(parser.chunk_size().get(), DEFAULT_CHUNK_SIZE);
}

#[test]
fn bind_and_parse_fills_the_receiver() {
    let mut parser = Parser::request();
    let assembler = Rc::new(RefCell::new(RequestAssembler::new()));

    parser.bind_and_parse(&assembler, Cursor::new(POST), ChunkSize::new(3).ok()).unwrap();

    let assembler = assembler.borrow();
    let request = assembler.request();
    assert!(assembler.is_complete());
    assert_eq!(request.method(), Some(&Method::POST));
    assert_eq!(request.path(), "/upload");
    assert_eq!(request.headers().get("host").unwrap(), "example.com");
    assert_eq!(request.content_length(), 11);
}

#[tokio::test]
async fn reads_from_an_async_source() {
    let mut parser = Parser::response();
    parser.set_chunk_size(ChunkSize::new(4).unwrap());
    let assembler = ResponseAssembler::attach(&mut parser);

    parser.parse_async_reader(CHUNKED_RESPONSE.as_bytes()).await.unwrap();

    let assembler = assembler.borrow();
    assert!(assembler.is_complete());
    assert_eq!(assembler.response().body(), b"Wikipedia");
    assert_eq!(assembler.response().protocol_version(), Some(Version::HTTP_11));
}

#[tokio::test]
async fn async_source_ending_mid_body() {
    let mut parser = Parser::response();
    let truncated = &CHUNKED_RESPONSE.as_bytes()[..CHUNKED_RESPONSE.len() - 8];

    let e = parser.parse_async_reader(truncated).await.unwrap_err();
    assert!(e.is_internal_parser_error());
}

#[test]
fn interrupted_reads_are_retried() {
    let mut parser = Parser::request();
    let assembler = RequestAssembler::attach(&mut parser);

    parser.parse_reader(Flaky { inner: Cursor::new(POST.as_bytes().to_vec()), interrupted: false }).unwrap();

    assert!(assembler.borrow().is_complete());
}

#[test]
fn read_errors_are_reported() {
    let mut parser = Parser::request();

    let e = parser.parse_reader(Broken).unwrap_err();
    let ParseError::Io { source } = e else { panic!("expected an io error, got {e:?}") };
    assert_eq!(source.kind(), ErrorKind::ConnectionReset);
    assert!(!parser.has_error());
}

#[test]
fn end_of_input_inside_a_head() {
    let mut parser = Parser::request();
    parser.feed(b"GET / HTTP/1.1\r\nHost: exa").unwrap();

    let e = parser.finish().unwrap_err();
    assert!(matches!(e, ParseError::Protocol { .. }));
    assert!(matches!(parser.feed(b"mple.com\r\n\r\n"), Err(ParseError::Terminated)));

    parser.reset();
    parser.parse("GET / HTTP/1.1\r\n\r\n").unwrap();
    assert!(!parser.has_error());
}

#[test]
fn finish_between_messages_is_quiet() {
    let completed = Rc::new(Cell::new(0));
    let sink = Rc::clone(&completed);

    let mut parser = Parser::request();
    parser.on_message_complete(move |_| {
        sink.set(sink.get() + 1);
        Ok(())
    });
    parser.parse("GET / HTTP/1.1\r\n\r\n").unwrap();
    parser.finish().unwrap();

    assert_eq!(completed.get(), 1);
}

#[test]
fn fragments_from_any_recognizer_are_joined() {
    let head = Head {
        method: Some(Method::PUT),
        status_code: None,
        version: Version::HTTP_11,
        keep_alive: true,
        chunked: false,
        content_length: Some(3),
    };
    let recognizer = Scripted {
        tokens: vec![
            Token::MessageStart,
            Token::Uri(UriPart::Path, Bytes::from_static(b"/do")),
            Token::Uri(UriPart::Path, Bytes::from_static(b"cs")),
            Token::HeaderField(Bytes::from_static(b"Con")),
            Token::HeaderField(Bytes::from_static(b"tent-Type")),
            Token::HeaderValue(Bytes::from_static(b"text/")),
            Token::HeaderValue(Bytes::from_static(b"plain")),
            Token::HeadersComplete(head),
            Token::Body(Bytes::from_static(b"ab")),
            Token::Body(Bytes::from_static(b"c")),
            Token::MessageComplete,
        ],
    };

    let mut parser = Parser::with_recognizer(recognizer);
    let assembler = RequestAssembler::attach(&mut parser);
    parser.feed(b"ignored").unwrap();

    let assembler = assembler.borrow();
    let request = assembler.request();
    assert!(assembler.is_complete());
    assert_eq!(request.method(), Some(&Method::PUT));
    assert_eq!(request.path(), "/docs");
    assert_eq!(request.headers().len(), 1);
    assert_eq!(request.headers().get("content-type").unwrap(), "text/plain");
    assert_eq!(request.body(), b"abc");
}

#[test]
fn characters_split_across_target_fragments() {
    let head = Head {
        method: Some(Method::GET),
        status_code: None,
        version: Version::HTTP_11,
        keep_alive: true,
        chunked: false,
        content_length: None,
    };
    let recognizer = Scripted {
        tokens: vec![
            Token::MessageStart,
            Token::Uri(UriPart::Path, Bytes::from_static(b"/caf\xC3")),
            Token::Uri(UriPart::Path, Bytes::from_static(b"\xA9")),
            Token::Uri(UriPart::QueryString, Bytes::from_static(b"q=\xE2\x82")),
            Token::Uri(UriPart::QueryString, Bytes::from_static(b"\xAC")),
            Token::Uri(UriPart::Uri, Bytes::from_static(b"/caf\xC3")),
            Token::Uri(UriPart::Uri, Bytes::from_static(b"\xA9?q=\xE2\x82\xAC")),
            Token::HeaderField(Bytes::from_static(b"X-Name")),
            Token::HeaderValue(Bytes::from_static(b"\xC3")),
            Token::HeaderValue(Bytes::from_static(b"\xA9")),
            Token::HeadersComplete(head),
            Token::MessageComplete,
        ],
    };

    let mut parser = Parser::with_recognizer(recognizer);
    let assembler = RequestAssembler::attach(&mut parser);
    parser.feed(b"ignored").unwrap();

    let assembler = assembler.borrow();
    let request = assembler.request();
    assert_eq!(request.path(), "/caf\u{e9}");
    assert_eq!(request.query_string(), "q=\u{20ac}");
    assert_eq!(request.uri(), "/caf\u{e9}?q=\u{20ac}");
    assert_eq!(request.headers().get("x-name").unwrap(), "\u{e9}");
}

#[test]
fn scripted_errors_surface_as_protocol_errors() {
    let recognizer = Scripted { tokens: vec![Token::MessageStart, Token::error(3, "bogus")] };
    let mut parser = Parser::with_recognizer(recognizer);

    let e = parser.feed(b"xyz").unwrap_err();
    let ParseError::Protocol { position, reason } = e else { panic!("expected a protocol error, got {e:?}") };
    assert_eq!(position, 3);
    assert_eq!(reason, "bogus");
    assert!(parser.is_internal_parser_error());
}

#[test]
fn feeding_from_a_handler_is_rejected() {
    let nested = Rc::new(RefCell::new(None));
    let sink = Rc::clone(&nested);

    let mut parser = Parser::request();
    parser.on_message_begin(move |parser| {
        *sink.borrow_mut() = Some(parser.feed(b"GET / HTTP/1.1\r\n\r\n"));
        Ok(())
    });
    parser.parse("GET / HTTP/1.1\r\n\r\n").unwrap();

    assert!(matches!(*nested.borrow(), Some(Err(ParseError::Reentrant))));
    assert!(!parser.has_error());
}
