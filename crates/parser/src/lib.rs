//! An incremental, callback driven HTTP/1.x message tokenizer.
//!
//! Bytes can be fed as one complete buffer or as a sequence of arbitrarily
//! sized chunks; events are reported as soon as the input allows, so a message
//! never has to be buffered as a whole before acting on it.
//!
//! # Features
//!
//! - Requests and responses, HTTP/1.0 and HTTP/1.1
//! - Chunked, `Content-Length` and close-delimited bodies
//! - Pipelined and keep-alive messages on one parser
//! - Single-slot event handlers, bulk binding through [`parser::EventReceiver`]
//! - Ready-made [`assembler`]s building [`protocol::Request`] and [`protocol::Response`]
//! - Streaming from [`std::io::Read`] and `tokio::io::AsyncRead` sources
//!
//! # Example
//!
//! ```
//! use micro_http_parser::assembler::RequestAssembler;
//! use micro_http_parser::parser::Parser;
//!
//! let mut parser = Parser::request();
//! let assembler = RequestAssembler::attach(&mut parser);
//!
//! for chunk in ["GET /forums/1?page=1#posts HTTP/1.1\r\n", "Host: exa", "mple.com\r\n\r\n"] {
//!     parser.feed(chunk.as_bytes()).unwrap();
//! }
//!
//! let assembler = assembler.borrow();
//! let request = assembler.request();
//! assert_eq!(request.path(), "/forums/1");
//! assert_eq!(request.query_string(), "page=1");
//! assert_eq!(request.fragment(), "posts");
//! assert_eq!(request.uri(), "/forums/1?page=1");
//! assert_eq!(request.headers().get("host").unwrap(), "example.com");
//! ```
//!
//! # Architecture
//!
//! - [`codec`]: the [`Recognizer`](codec::Recognizer) token contract and the
//!   built-in [`H1Recognizer`](codec::H1Recognizer)
//! - [`parser`]: the [`Parser`](parser::Parser) driver, event registry and configuration
//! - [`assembler`]: receivers turning events into messages
//! - [`protocol`]: messages, headers, status and method tables, errors
//!
//! # Limitations
//!
//! - HTTP/1.x only
//! - Maximum head size: 80KB
//! - Maximum number of headers: 96

pub mod assembler;
pub mod codec;
pub mod parser;
pub mod protocol;

mod utils;
pub(crate) use utils::ensure;
