//! Message assemblers.
//!
//! An assembler is an [`EventReceiver`](crate::parser::EventReceiver) that
//! turns the events of one message into a [`Request`](crate::protocol::Request)
//! or [`Response`](crate::protocol::Response). Header fragments are joined by
//! the [`HeaderAccumulator`].

mod header_accumulator;
mod request;
mod response;

pub use header_accumulator::HeaderAccumulator;
pub use request::RequestAssembler;
pub use response::ResponseAssembler;
