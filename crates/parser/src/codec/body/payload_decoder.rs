//! A single decoder over the body framings a message head can select:
//! - Content-Length based payloads
//! - Chunked transfer coding
//! - Messages with no body
//! - Response bodies delimited by the end of the input

use crate::codec::body::chunked_decoder::ChunkedDecoder;
use crate::codec::body::length_decoder::LengthDecoder;
use crate::codec::error::DecodeError;
use crate::protocol::{PayloadItem, PayloadSize};
use bytes::BytesMut;
use tokio_util::codec::Decoder;

/// Decodes the body of one message, delegating to the decoder for its framing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PayloadDecoder {
    kind: Kind,
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Kind {
    Length(LengthDecoder),
    Chunked(ChunkedDecoder),
    NoBody,
    /// Everything up to the end of the input
    UntilEof,
}

impl PayloadDecoder {
    pub fn empty() -> Self {
        Self { kind: Kind::NoBody }
    }

    pub fn chunked() -> Self {
        Self { kind: Kind::Chunked(ChunkedDecoder::new()) }
    }

    pub fn fix_length(size: u64) -> Self {
        Self { kind: Kind::Length(LengthDecoder::new(size)) }
    }

    pub fn until_eof() -> Self {
        Self { kind: Kind::UntilEof }
    }

    pub fn is_chunked(&self) -> bool {
        matches!(self.kind, Kind::Chunked(_))
    }

    pub fn is_until_eof(&self) -> bool {
        matches!(self.kind, Kind::UntilEof)
    }
}

impl From<PayloadSize> for PayloadDecoder {
    fn from(payload_size: PayloadSize) -> Self {
        match payload_size {
            PayloadSize::Length(size) => PayloadDecoder::fix_length(size),
            PayloadSize::Chunked => PayloadDecoder::chunked(),
            PayloadSize::UntilEof => PayloadDecoder::until_eof(),
            PayloadSize::Empty => PayloadDecoder::empty(),
        }
    }
}

impl Decoder for PayloadDecoder {
    type Item = PayloadItem;
    type Error = DecodeError;

    fn decode(&mut self, src: &mut BytesMut) -> Result<Option<Self::Item>, Self::Error> {
        match &mut self.kind {
            Kind::Length(length_decoder) => length_decoder.decode(src),
            Kind::Chunked(chunked_decoder) => chunked_decoder.decode(src),
            Kind::NoBody => Ok(Some(PayloadItem::Eof)),
            Kind::UntilEof if src.is_empty() => Ok(None),
            Kind::UntilEof => Ok(Some(PayloadItem::Chunk(src.split().freeze()))),
        }
    }

    /// Only an EOF-delimited body may end with the input, every other framing
    /// must already have seen its end.
    fn decode_eof(&mut self, src: &mut BytesMut) -> Result<Option<Self::Item>, Self::Error> {
        match self.decode(src)? {
            Some(item) => Ok(Some(item)),
            None if self.is_until_eof() => Ok(Some(PayloadItem::Eof)),
            None => Err(DecodeError::unexpected_eof("message body is incomplete")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn from_payload_size() {
        assert!(PayloadDecoder::from(PayloadSize::Chunked).is_chunked());
        assert!(PayloadDecoder::from(PayloadSize::UntilEof).is_until_eof());
        assert_eq!(PayloadDecoder::from(PayloadSize::Empty), PayloadDecoder::empty());
        assert_eq!(PayloadDecoder::from(PayloadSize::Length(3)), PayloadDecoder::fix_length(3));
    }

    #[test]
    fn no_body_is_immediately_eof() {
        let mut buffer = BytesMut::from(&b"GET / HTTP/1.1\r\n"[..]);
        let item = PayloadDecoder::empty().decode(&mut buffer).unwrap().unwrap();
        assert!(item.is_eof());
        assert_eq!(buffer.len(), 16);
    }

    #[test]
    fn until_eof_takes_everything() {
        let mut decoder = PayloadDecoder::until_eof();

        let mut buffer = BytesMut::from(&b"hello"[..]);
        let item = decoder.decode(&mut buffer).unwrap().unwrap();
        assert_eq!(&item.as_bytes().unwrap()[..], b"hello");
        assert!(buffer.is_empty());

        assert!(decoder.decode(&mut buffer).unwrap().is_none());
        assert!(decoder.decode_eof(&mut buffer).unwrap().unwrap().is_eof());
    }

    #[test]
    fn eof_inside_framed_body_is_an_error() {
        let mut buffer = BytesMut::from(&b"hel"[..]);
        let mut decoder = PayloadDecoder::fix_length(5);

        assert!(decoder.decode(&mut buffer).unwrap().unwrap().is_chunk());
        assert!(matches!(decoder.decode_eof(&mut buffer), Err(DecodeError::UnexpectedEof { .. })));
    }
}
