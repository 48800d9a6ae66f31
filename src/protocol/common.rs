//! Stream types and on-wire framing for protocol messages
//!
//! # On-Wire Framing
//!
//! Every structured message is sent in two parts:
//!
//! * A 4-byte big-endian length header
//! * The message itself, encoded as a UTF-8 JSON document of exactly that length
//!
//! File payloads are **not** framed. Once a handshake has authorised a transfer, the agreed
//! number of raw bytes follows directly on the stream. For this reason the readers here never
//! consume more than one frame's worth of bytes.
// (c) 2026 fxp authors

use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};
use tokio::net::tcp::{OwnedReadHalf, OwnedWriteHalf};

use crate::error::FramingError;

/////////////////////////////////////////////////////////////////////////////////////////////
// STREAM TYPEDEFS

/// Marker trait for streams used for sending data
pub trait SendingStream: AsyncWrite + Send + Unpin {}
impl SendingStream for OwnedWriteHalf {}

#[cfg(test)]
impl SendingStream for tokio_test::io::Mock {}

/// Marker trait for streams used for receiving data
pub trait ReceivingStream: AsyncRead + Send + Unpin {}
impl ReceivingStream for OwnedReadHalf {}

#[cfg(test)]
impl ReceivingStream for tokio_test::io::Mock {}

/// Syntactic sugar helper type: the two halves of one connection
#[derive(Debug)]
pub struct SendReceivePair<S: SendingStream, R: ReceivingStream> {
    /// outbound data
    pub send: S,
    /// inbound data
    pub recv: R,
}

impl<S: SendingStream, R: ReceivingStream> From<(S, R)> for SendReceivePair<S, R> {
    fn from(value: (S, R)) -> Self {
        Self {
            send: value.0,
            recv: value.1,
        }
    }
}

/// A TCP connection split into owned halves
pub type TcpStreamPair = SendReceivePair<OwnedWriteHalf, OwnedReadHalf>;

impl From<tokio::net::TcpStream> for TcpStreamPair {
    fn from(stream: tokio::net::TcpStream) -> Self {
        let (recv, send) = stream.into_split();
        Self { send, recv }
    }
}

/////////////////////////////////////////////////////////////////////////////////////////////
// WIRE MESSAGE FRAMING

/// Framing header used on the wire for protocol messages
#[derive(PartialEq, Eq, Debug, Default, Clone, Copy)]
pub struct MessageHeader {
    /// Size of the document that follows the header
    pub size: u32,
}

impl MessageHeader {
    /// The on-wire size of the header itself. Fixed; any change would be a protocol break.
    pub const SIZE: usize = 4;

    /// Wire encoding (big-endian)
    #[must_use]
    pub fn to_bytes(self) -> [u8; Self::SIZE] {
        self.size.to_be_bytes()
    }

    /// Decodes a header from its wire encoding
    #[must_use]
    pub fn from_bytes(bytes: [u8; Self::SIZE]) -> Self {
        Self {
            size: u32::from_be_bytes(bytes),
        }
    }
}

/// Provides framed I/O for all structs taking part in our protocol.
///
/// N.B. Message structs are not expected to override the provided implementations.
pub trait ProtocolMessage
where
    Self: serde::Serialize + serde::de::DeserializeOwned + Sync,
{
    /// Absolute limit on the wire encoding of this type.
    ///
    /// The readers reject any frame announcing a longer document without reading its body,
    /// which bounds memory consumption in the face of a buggy or hostile peer.
    const WIRE_ENCODING_LIMIT: u32 = 1_048_576;

    /// Checks a size against this type's [`WIRE_ENCODING_LIMIT`](Self::WIRE_ENCODING_LIMIT).
    fn check_size(size: usize) -> Result<(), FramingError> {
        if size == 0 {
            return Err(FramingError::Empty);
        }
        if size > Self::WIRE_ENCODING_LIMIT as usize {
            return Err(FramingError::TooLarge {
                size,
                limit: Self::WIRE_ENCODING_LIMIT,
            });
        }
        Ok(())
    }

    /// Encodes this struct as a JSON document (without framing)
    fn to_vec(&self) -> Result<Vec<u8>, FramingError> {
        serde_json::to_vec(self).map_err(FramingError::Encode)
    }

    /// Decodes this struct from a JSON document (without framing)
    fn from_slice(slice: &[u8]) -> Result<Self, FramingError> {
        serde_json::from_slice(slice).map_err(FramingError::Decode)
    }

    /// Encodes this struct with its framing header, ready to go on the wire in one write
    fn to_framed_vec(&self) -> Result<Vec<u8>, FramingError> {
        let body = self.to_vec()?;
        Self::check_size(body.len())?;
        #[allow(clippy::cast_possible_truncation)] // already checked
        let header = MessageHeader {
            size: body.len() as u32,
        };
        let mut out = Vec::with_capacity(MessageHeader::SIZE + body.len());
        out.extend_from_slice(&header.to_bytes());
        out.extend_from_slice(&body);
        Ok(out)
    }

    /// Deserializes this struct from an arbitrary reader by reading a [`MessageHeader`], then the document.
    fn from_reader_framed<R>(reader: &mut R) -> Result<Self, FramingError>
    where
        R: std::io::Read,
    {
        let mut hdr = [0u8; MessageHeader::SIZE];
        reader.read_exact(&mut hdr).map_err(FramingError::from_read)?;
        let header = MessageHeader::from_bytes(hdr);
        Self::check_size(header.size as usize)?;
        let mut body = vec![0u8; header.size as usize];
        reader
            .read_exact(&mut body)
            .map_err(FramingError::from_read)?;
        Self::from_slice(&body)
    }

    /// Deserializes this struct from an async reader by reading a [`MessageHeader`], then the document.
    ///
    /// Exactly `4 + size` bytes are consumed from the reader.
    fn from_reader_async_framed<R>(
        reader: &mut R,
    ) -> impl std::future::Future<Output = Result<Self, FramingError>> + Send
    where
        R: AsyncRead + Unpin + Send,
    {
        async move {
            let mut hdr = [0u8; MessageHeader::SIZE];
            let _ = reader
                .read_exact(&mut hdr)
                .await
                .map_err(FramingError::from_read)?;
            let header = MessageHeader::from_bytes(hdr);
            Self::check_size(header.size as usize)?;
            let mut body = vec![0u8; header.size as usize];
            let _ = reader
                .read_exact(&mut body)
                .await
                .map_err(FramingError::from_read)?;
            Self::from_slice(&body)
        }
    }

    /// Serializes this struct into an arbitrary writer as a single framed write
    fn to_writer_framed<W>(&self, writer: &mut W) -> Result<(), FramingError>
    where
        W: std::io::Write,
    {
        Ok(writer.write_all(&self.to_framed_vec()?)?)
    }

    /// Serializes this struct into an async writer as a single framed write, then flushes
    fn to_writer_async_framed<W>(
        &self,
        writer: &mut W,
    ) -> impl std::future::Future<Output = Result<(), FramingError>> + Send
    where
        W: AsyncWrite + Unpin + Send,
    {
        let framed = self.to_framed_vec();
        async move {
            let framed = framed?;
            writer.write_all(&framed).await?;
            writer.flush().await?;
            Ok(())
        }
    }
}

/////////////////////////////////////////////////////////////////////////////////////////////

#[cfg(test)]
mod tests {
    use super::{MessageHeader, ProtocolMessage};
    use crate::error::FramingError;
    use pretty_assertions::assert_eq;
    use serde::{Deserialize, Serialize};
    use std::io::Cursor;
    use tokio::io::AsyncReadExt as _;

    #[derive(Debug, PartialEq, Serialize, Deserialize)]
    struct TestMessage {
        data: Vec<u8>,
    }

    impl ProtocolMessage for TestMessage {
        const WIRE_ENCODING_LIMIT: u32 = 32;
    }

    #[test]
    fn header_is_big_endian() {
        let h = MessageHeader { size: 0x0102_0304 };
        assert_eq!(h.to_bytes(), [1, 2, 3, 4]);
        assert_eq!(MessageHeader::from_bytes([0, 0, 1, 0]).size, 256);
    }

    #[test]
    fn sync_framed_roundtrip() {
        let msg = TestMessage {
            data: vec![1, 2, 3],
        };
        let mut buf = Vec::new();
        msg.to_writer_framed(&mut buf).unwrap();
        assert_eq!(&buf[0..4], &[0, 0, 0, 16]); // {"data":[1,2,3]}
        let decoded = TestMessage::from_reader_framed(&mut Cursor::new(buf)).unwrap();
        assert_eq!(msg, decoded);
    }

    #[tokio::test]
    async fn frame_split_across_reads() {
        let msg = TestMessage { data: vec![9, 8] };
        let buf = msg.to_framed_vec().unwrap();
        let mut mock = tokio_test::io::Builder::new()
            .read(&buf[0..2])
            .read(&buf[2..5])
            .read(&buf[5..])
            .build();
        let decoded = TestMessage::from_reader_async_framed(&mut mock)
            .await
            .unwrap();
        assert_eq!(msg, decoded);
    }

    #[tokio::test]
    async fn trailing_payload_is_left_on_stream() {
        let msg = TestMessage { data: vec![7] };
        let mut buf = msg.to_framed_vec().unwrap();
        buf.extend_from_slice(b"hello");
        // everything arrives in one read
        let mut mock = tokio_test::io::Builder::new().read(&buf).build();
        let decoded = TestMessage::from_reader_async_framed(&mut mock)
            .await
            .unwrap();
        assert_eq!(msg, decoded);
        let mut rest = [0u8; 5];
        let _ = mock.read_exact(&mut rest).await.unwrap();
        assert_eq!(&rest, b"hello");
    }

    #[test]
    fn deserialize_limit() {
        let mut buf = MessageHeader { size: 33 }.to_bytes().to_vec();
        buf.extend_from_slice(&[b' '; 33]);
        let e = TestMessage::from_reader_framed(&mut Cursor::new(buf)).unwrap_err();
        assert!(matches!(e, FramingError::TooLarge { size: 33, .. }));
    }

    #[test]
    fn serialize_limit() {
        let msg = TestMessage {
            data: vec![0u8; TestMessage::WIRE_ENCODING_LIMIT as usize],
        };
        let mut buf = Vec::new();
        let _ = msg
            .to_writer_framed(&mut buf)
            .expect_err("an error was expected");
        assert!(buf.is_empty());
    }

    #[test]
    fn deserialize_junk_over_long() {
        // Edge cases above 2^31, to trap any signedness issues
        for testcase in &[1u32 << 31, u32::MAX] {
            let buf = MessageHeader { size: *testcase }.to_bytes();
            let _ = TestMessage::from_reader_framed(&mut Cursor::new(buf))
                .expect_err("an error was expected");
        }
    }

    #[test]
    fn deserialize_zero_length() {
        let buf = MessageHeader { size: 0 }.to_bytes();
        let e = TestMessage::from_reader_framed(&mut Cursor::new(buf)).unwrap_err();
        assert!(matches!(e, FramingError::Empty));
    }

    #[test]
    fn deserialize_insufficient_data() {
        let mut buf = MessageHeader { size: 10 }.to_bytes().to_vec();
        buf.extend_from_slice(b"{\"da");
        let e = TestMessage::from_reader_framed(&mut Cursor::new(buf)).unwrap_err();
        assert!(matches!(e, FramingError::PeerClosed));
    }

    #[test]
    fn deserialize_not_json() {
        let body = b"not json";
        #[allow(clippy::cast_possible_truncation)]
        let mut buf = MessageHeader {
            size: body.len() as u32,
        }
        .to_bytes()
        .to_vec();
        buf.extend_from_slice(body);
        let e = TestMessage::from_reader_framed(&mut Cursor::new(buf)).unwrap_err();
        assert!(matches!(e, FramingError::Decode(_)));
    }

    #[tokio::test]
    async fn eof_before_header() {
        let mut mock = tokio_test::io::Builder::new().read(&[0, 0]).build();
        let e = TestMessage::from_reader_async_framed(&mut mock)
            .await
            .unwrap_err();
        assert!(matches!(e, FramingError::PeerClosed));
    }
}
