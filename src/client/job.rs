//! Job specifications for the client
// (c) 2026 fxp authors

use std::path::Path;

use crate::error::ProtocolError;

/// The operations a client may request
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum, strum::Display, strum::EnumString,
)]
#[strum(serialize_all = "lowercase")]
pub enum Operation {
    /// Upload a local file
    Put,
    /// Download a remote file
    Get,
    /// List the files on the server
    List,
}

/// Details of a single client operation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JobSpec {
    /// What to do
    pub operation: Operation,
    /// For PUT, the local file to upload. For GET, the remote file to download.
    pub filename: Option<String>,
    /// For GET, where to save the file.
    /// If not given, the final component of the remote filename is used in the current directory.
    pub destination: Option<String>,
}

impl JobSpec {
    /// Constructor, checking that the filename is present where required
    pub fn new(
        operation: Operation,
        filename: Option<String>,
        destination: Option<String>,
    ) -> Result<Self, ProtocolError> {
        match operation {
            Operation::Put | Operation::Get if filename.as_deref().unwrap_or("").is_empty() => {
                Err(ProtocolError::InvalidRequest(format!(
                    "{operation} requires a filename"
                )))
            }
            _ => Ok(Self {
                operation,
                filename,
                destination,
            }),
        }
    }

    /// Convenience constructor for an upload
    #[must_use]
    pub fn put(local: impl Into<String>) -> Self {
        Self {
            operation: Operation::Put,
            filename: Some(local.into()),
            destination: None,
        }
    }

    /// Convenience constructor for a download
    #[must_use]
    pub fn get(remote: impl Into<String>, destination: Option<String>) -> Self {
        Self {
            operation: Operation::Get,
            filename: Some(remote.into()),
            destination,
        }
    }

    /// Convenience constructor for a listing
    #[must_use]
    pub fn list() -> Self {
        Self {
            operation: Operation::List,
            filename: None,
            destination: None,
        }
    }

    /// The filename argument, or an empty string
    #[must_use]
    pub fn filename(&self) -> &str {
        self.filename.as_deref().unwrap_or_default()
    }

    /// Where a downloaded file should be written.
    ///
    /// This is the explicit destination if there is one; otherwise the final component of the
    /// requested name.
    pub fn local_destination(&self) -> Result<String, ProtocolError> {
        if let Some(d) = &self.destination {
            return Ok(d.clone());
        }
        Path::new(self.filename())
            .file_name()
            .and_then(|f| f.to_str())
            .map(ToOwned::to_owned)
            .ok_or_else(|| ProtocolError::InvalidRequest("invalid filename".into()))
    }

    /// A short name for progress displays
    #[must_use]
    pub fn display_filename(&self) -> String {
        Path::new(self.filename())
            .file_name()
            .map_or_else(|| self.filename().to_owned(), |f| f.to_string_lossy().to_string())
    }
}

impl std::fmt::Display for JobSpec {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.filename {
            Some(name) => write!(f, "{} {name}", self.operation),
            None => write!(f, "{}", self.operation),
        }
    }
}
