//! Error taxonomy for the file exchange protocol
// (c) 2026 fxp authors

use std::io;

use thiserror::Error;

/// The byte stream could not be turned into a message, or a message could not be written.
#[derive(Debug, Error)]
pub enum FramingError {
    /// The peer closed the connection before a complete frame arrived
    #[error("connection closed by peer while reading a message")]
    PeerClosed,
    /// A frame header announced a zero-length document
    #[error("received an empty message frame")]
    Empty,
    /// A frame exceeded the encoding limit for its message type
    #[error("message frame of {size} bytes exceeds the limit of {limit} bytes")]
    TooLarge {
        /// Announced (or encoded) size
        size: usize,
        /// Applicable limit
        limit: u32,
    },
    /// The frame body was not a well-formed document
    #[error("undecodable message: {0}")]
    Decode(#[source] serde_json::Error),
    /// The message could not be encoded
    #[error("unable to encode message: {0}")]
    Encode(#[source] serde_json::Error),
    /// Socket I/O failed while sending or receiving a frame
    #[error("I/O error on connection: {0}")]
    Io(#[from] io::Error),
}

impl FramingError {
    /// Converts a read error, recognising EOF as the peer having closed the connection
    pub(crate) fn from_read(e: io::Error) -> Self {
        if e.kind() == io::ErrorKind::UnexpectedEof {
            Self::PeerClosed
        } else {
            Self::Io(e)
        }
    }
}

/// A message was decoded but is malformed or arrived out of sequence.
#[derive(Debug, Error, PartialEq, Eq, Clone)]
pub enum ProtocolError {
    /// A mandatory field for this kind of message was absent
    #[error("{kind} message is missing the `{field}` field")]
    MissingField {
        /// Message kind being decoded
        kind: &'static str,
        /// Absent field name
        field: &'static str,
    },
    /// The message carried neither a `type` nor a `status_code`, or both
    #[error("message is neither a request nor a response")]
    Ambiguous,
    /// The `type` field held a value we do not know
    #[error("unknown request type `{0}`")]
    UnknownType(String),
    /// The `status_code` field held a value we do not know
    #[error("unknown status code `{0}`")]
    UnknownStatus(String),
    /// A message arrived that is not valid at this point of the handshake
    #[error("unexpected message: expected {expected}, got {got}")]
    Unexpected {
        /// What this step of the handshake accepts
        expected: &'static str,
        /// What was received instead
        got: String,
    },
    /// A local request failed validation before anything was sent
    #[error("{0}")]
    InvalidRequest(String),
}

/// Something went wrong with a local file.
#[derive(Debug, Error)]
pub enum FilesystemError {
    /// The named file does not exist
    #[error("file not found: {0}")]
    NotFound(String),
    /// The named file already exists and may not be overwritten
    #[error("file already exists: {0}")]
    AlreadyExists(String),
    /// The named path is a directory
    #[error("{0} is a directory")]
    IsADirectory(String),
    /// The source file ended before its advertised length was reached
    #[error("{name} ended after {sent} of {expected} bytes")]
    SourceTruncated {
        /// File being sent
        name: String,
        /// Bytes read before EOF
        sent: u64,
        /// Advertised content length
        expected: u64,
    },
    /// Writing to the destination failed
    #[error("failed writing {name}: {source}")]
    Write {
        /// Destination file
        name: String,
        /// Underlying error
        #[source]
        source: io::Error,
    },
    /// Any other I/O failure on a named file
    #[error("{name}: {source}")]
    Io {
        /// File concerned
        name: String,
        /// Underlying error
        #[source]
        source: io::Error,
    },
}

impl FilesystemError {
    /// Classifies an I/O error encountered while operating on `name`
    pub(crate) fn classify(name: &str, e: io::Error) -> Self {
        match e.kind() {
            io::ErrorKind::NotFound => Self::NotFound(name.to_owned()),
            io::ErrorKind::AlreadyExists => Self::AlreadyExists(name.to_owned()),
            _ => Self::Io {
                name: name.to_owned(),
                source: e,
            },
        }
    }
}

/// The connection failed during a transfer.
#[derive(Debug, Error)]
pub enum TransportError {
    /// The peer closed the connection before all payload bytes arrived
    #[error("connection closed unexpectedly after {received} of {expected} bytes")]
    ClosedEarly {
        /// Bytes received so far
        received: u64,
        /// Agreed content length
        expected: u64,
    },
    /// No data arrived within the configured timeout
    #[error("timed out waiting for the peer")]
    TimedOut,
    /// Socket I/O failed during payload transfer
    #[error("connection error: {0}")]
    Io(#[from] io::Error),
}

/// The peer answered with DENY. The display form is the peer's reason, verbatim.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("{reason}")]
pub struct Rejected {
    /// Human-readable reason supplied by the peer
    pub reason: String,
}

impl Rejected {
    pub(crate) fn new(reason: impl Into<String>) -> Self {
        Self {
            reason: reason.into(),
        }
    }
}
