//! Protocol level types shared by the recognizer, the parser and the assemblers.
//!
//! - **Messages** ([`Request`], [`Response`]): what the assemblers build
//! - **Headers** ([`Headers`]): case-insensitive, multi-valued header store
//! - **Status codes** ([`status`]): reason phrases, categories, body-less codes
//! - **Methods** ([`method`]): request methods accepted on a request line
//! - **Payload framing** ([`PayloadSize`], [`PayloadItem`]): body framing and decoder output
//! - **Errors** ([`ParseError`] and friends)

mod message;
pub use message::MessageKind;
pub use message::PayloadItem;
pub use message::PayloadSize;
pub use message::version_str;

mod headers;
pub use headers::HeaderValue;
pub use headers::Headers;

mod request;
pub use request::Request;

mod response;
pub use response::Response;

mod error;
pub use error::AssemblyError;
pub use error::CallbackError;
pub use error::CallbackException;
pub use error::CallbackResult;
pub use error::ConfigError;
pub use error::HeadersError;
pub use error::ParseError;

pub mod method;
pub mod status;
