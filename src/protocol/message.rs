//! Message model: requests, responses and their JSON representation
// (c) 2026 fxp authors

use serde::{Deserialize, Serialize};
use tokio::io::{AsyncRead, AsyncWrite};

use super::common::ProtocolMessage;
use crate::error::ProtocolError;

/// Kinds of request an Initiator may make
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, strum::Display, strum::EnumString, strum::IntoStaticStr,
)]
#[strum(serialize_all = "lowercase")]
pub enum RequestKind {
    /// Upload a file (also used by a Responder to describe a file it is about to push)
    Put,
    /// Download a file
    Get,
    /// List the serving directory
    List,
}

/// Response status codes. These are exact strings on the wire.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, strum::Display, strum::EnumString, strum::IntoStaticStr,
)]
pub enum StatusCode {
    /// The request (or step) is accepted
    #[strum(serialize = "000")]
    Allow,
    /// The request (or step) is refused
    #[strum(serialize = "100")]
    Deny,
}

/// The loose on-wire shape of every message.
///
/// Every field is optional here; [`Message`] is the validated form.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawMessage {
    /// Request kind, present on requests only
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,
    /// Subject file name
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub filename: Option<String>,
    /// Size of the subject file in bytes
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content_length: Option<i64>,
    /// Response status, present on responses only
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status_code: Option<String>,
    /// Human-readable commentary
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    /// Directory listing
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub files: Option<Vec<String>>,
}

impl ProtocolMessage for RawMessage {
    const WIRE_ENCODING_LIMIT: u32 = 4 * 1024 * 1024;
}

/// Arguments of a GET request
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GetRequest {
    /// Requested file, relative to the serving directory
    pub filename: String,
}

/// Arguments of a PUT message
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PutRequest {
    /// Name of the file being offered
    pub filename: String,
    /// Exact size of the file.
    /// Signed, as it comes off the wire unchecked; receivers validate it.
    pub content_length: i64,
}

/// An ALLOW response
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Allow {
    /// Commentary
    pub message: String,
    /// Only present in a listing response
    pub files: Option<Vec<String>>,
}

/// A DENY response
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Deny {
    /// The reason for refusal
    pub message: String,
}

/// A validated protocol message
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Message {
    /// Request to download a file
    Get(GetRequest),
    /// Request to upload a file, or a description of a file about to be pushed
    Put(PutRequest),
    /// Request for a directory listing
    List,
    /// Positive response
    Allow(Allow),
    /// Negative response
    Deny(Deny),
}

impl Message {
    /// Constructs a plain ALLOW message
    pub fn allow(message: impl Into<String>) -> Self {
        Self::Allow(Allow {
            message: message.into(),
            files: None,
        })
    }

    /// Constructs a DENY message
    pub fn deny(message: impl Into<String>) -> Self {
        Self::Deny(Deny {
            message: message.into(),
        })
    }

    /// Constructs a PUT message
    pub fn put(filename: impl Into<String>, content_length: i64) -> Self {
        Self::Put(PutRequest {
            filename: filename.into(),
            content_length,
        })
    }

    /// Constructs a GET message
    pub fn get(filename: impl Into<String>) -> Self {
        Self::Get(GetRequest {
            filename: filename.into(),
        })
    }

    /// Is this a response (ALLOW or DENY)?
    #[must_use]
    pub fn is_response(&self) -> bool {
        matches!(self, Self::Allow(_) | Self::Deny(_))
    }

    /// Sends this message as one frame
    pub async fn send<W>(&self, send: &mut W) -> Result<(), crate::error::FramingError>
    where
        W: AsyncWrite + Unpin + Send,
    {
        RawMessage::from(self.clone())
            .to_writer_async_framed(send)
            .await
    }

    /// Reads exactly one frame and validates it.
    ///
    /// Errors are either a [`FramingError`](crate::error::FramingError) or a [`ProtocolError`].
    pub async fn receive<R>(recv: &mut R) -> anyhow::Result<Self>
    where
        R: AsyncRead + Unpin + Send,
    {
        let raw = RawMessage::from_reader_async_framed(recv).await?;
        Ok(Self::try_from(raw)?)
    }
}

impl std::fmt::Display for Message {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Message::Get(g) => write!(f, "get {}", g.filename),
            Message::Put(p) => write!(f, "put {} ({} bytes)", p.filename, p.content_length),
            Message::List => write!(f, "list"),
            Message::Allow(a) => write!(f, "ALLOW ({})", a.message),
            Message::Deny(d) => write!(f, "DENY ({})", d.message),
        }
    }
}

impl From<Message> for RawMessage {
    fn from(msg: Message) -> Self {
        match msg {
            Message::Get(g) => RawMessage {
                kind: Some(RequestKind::Get.to_string()),
                filename: Some(g.filename),
                ..Default::default()
            },
            Message::Put(p) => RawMessage {
                kind: Some(RequestKind::Put.to_string()),
                filename: Some(p.filename),
                content_length: Some(p.content_length),
                ..Default::default()
            },
            Message::List => RawMessage {
                kind: Some(RequestKind::List.to_string()),
                ..Default::default()
            },
            Message::Allow(a) => RawMessage {
                status_code: Some(StatusCode::Allow.to_string()),
                message: Some(a.message),
                files: a.files,
                ..Default::default()
            },
            Message::Deny(d) => RawMessage {
                status_code: Some(StatusCode::Deny.to_string()),
                message: Some(d.message),
                ..Default::default()
            },
        }
    }
}

impl TryFrom<RawMessage> for Message {
    type Error = ProtocolError;

    fn try_from(raw: RawMessage) -> Result<Self, Self::Error> {
        match (raw.kind, raw.status_code) {
            (Some(kind), None) => {
                let kind: RequestKind = kind
                    .parse()
                    .map_err(|_| ProtocolError::UnknownType(kind.clone()))?;
                let missing = |field| ProtocolError::MissingField {
                    kind: kind.into(),
                    field,
                };
                Ok(match kind {
                    RequestKind::Get => Message::Get(GetRequest {
                        filename: raw.filename.ok_or_else(|| missing("filename"))?,
                    }),
                    RequestKind::Put => Message::Put(PutRequest {
                        filename: raw.filename.ok_or_else(|| missing("filename"))?,
                        content_length: raw
                            .content_length
                            .ok_or_else(|| missing("content_length"))?,
                    }),
                    RequestKind::List => Message::List,
                })
            }
            (None, Some(code)) => {
                let status: StatusCode = code
                    .parse()
                    .map_err(|_| ProtocolError::UnknownStatus(code.clone()))?;
                Ok(match status {
                    StatusCode::Allow => Message::Allow(Allow {
                        message: raw.message.unwrap_or_default(),
                        files: raw.files,
                    }),
                    StatusCode::Deny => Message::Deny(Deny {
                        message: raw.message.ok_or(ProtocolError::MissingField {
                            kind: "deny",
                            field: "message",
                        })?,
                    }),
                })
            }
            _ => Err(ProtocolError::Ambiguous),
        }
    }
}
