//! Payload transfer engine
// (c) 2026 fxp authors

use std::cmp::min;
use std::collections::HashSet;
use std::future::Future;
use std::path::{Path, PathBuf};
use std::sync::{LazyLock, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use anyhow::Result;
use indicatif::ProgressBar;
use tokio::fs::File;
use tokio::io::{AsyncRead, AsyncReadExt as _, AsyncWriteExt as _};
use tracing::{debug, trace, warn};

use crate::error::{FilesystemError, TransportError};
use crate::protocol::common::{ReceivingStream, SendingStream};
use crate::util::io::{self, with_timeout};

/// Which way the payload flows, from this side's point of view
#[derive(Debug, Clone, Copy, PartialEq, Eq, strum::Display)]
pub enum TransferRole {
    /// We are sending the file
    Sender,
    /// We are receiving the file
    Receiver,
}

/// Tracks the progress of one file payload across a connection.
///
/// `bytes_transferred` never exceeds `content_length`.
#[derive(Debug)]
pub struct TransferSession {
    role: TransferRole,
    filename: String,
    content_length: u64,
    bytes_transferred: u64,
    progress: Option<ProgressBar>,
}

impl TransferSession {
    /// Constructor
    #[must_use]
    pub fn new(role: TransferRole, filename: impl Into<String>, content_length: u64) -> Self {
        Self {
            role,
            filename: filename.into(),
            content_length,
            bytes_transferred: 0,
            progress: None,
        }
    }

    /// Attaches a progress bar, which is advanced as bytes move
    #[must_use]
    pub fn with_progress(mut self, bar: ProgressBar) -> Self {
        bar.set_length(self.content_length);
        self.progress = Some(bar);
        self
    }

    /// Accessor
    #[must_use]
    pub fn role(&self) -> TransferRole {
        self.role
    }

    /// Accessor
    #[must_use]
    pub fn filename(&self) -> &str {
        &self.filename
    }

    /// The agreed payload size
    #[must_use]
    pub fn content_length(&self) -> u64 {
        self.content_length
    }

    /// Payload bytes moved so far
    #[must_use]
    pub fn bytes_transferred(&self) -> u64 {
        self.bytes_transferred
    }

    /// Payload bytes still to move
    #[must_use]
    pub fn remaining(&self) -> u64 {
        self.content_length - self.bytes_transferred
    }

    /// Has the whole payload moved?
    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.bytes_transferred == self.content_length
    }

    fn next_chunk(&self, chunk_size: usize) -> usize {
        // If remaining() does not fit in usize it is certainly larger than chunk_size
        usize::try_from(self.remaining()).map_or(chunk_size, |r| min(chunk_size, r))
    }

    fn advance(&mut self, n: usize) {
        let n = n as u64;
        debug_assert!(n <= self.remaining());
        self.bytes_transferred += n;
        if let Some(bar) = &self.progress {
            bar.inc(n);
        }
    }

    fn finish(&self) {
        if let Some(bar) = &self.progress {
            bar.finish_and_clear();
        }
    }

    /// Streams exactly `content_length` bytes from `source` to the connection, in chunks of at most `chunk_size`.
    ///
    /// There is no acknowledgement per chunk.
    /// If the source runs dry early, the result is a [`FilesystemError::SourceTruncated`].
    pub async fn send_payload<F, W>(
        &mut self,
        source: &mut F,
        send: &mut W,
        chunk_size: usize,
    ) -> Result<u64>
    where
        F: AsyncRead + Unpin + Send,
        W: SendingStream,
    {
        debug_assert_eq!(self.role, TransferRole::Sender);
        trace!("sending {} bytes of {}", self.content_length, self.filename);
        let mut buf = vec![0u8; chunk_size];
        while !self.is_complete() {
            let want = self.next_chunk(chunk_size);
            let n = source
                .read(&mut buf[..want])
                .await
                .map_err(|e| FilesystemError::classify(&self.filename, e))?;
            if n == 0 {
                return Err(FilesystemError::SourceTruncated {
                    name: self.filename.clone(),
                    sent: self.bytes_transferred,
                    expected: self.content_length,
                }
                .into());
            }
            send.write_all(&buf[..n])
                .await
                .map_err(TransportError::from)?;
            self.advance(n);
        }
        send.flush().await.map_err(TransportError::from)?;
        self.finish();
        Ok(self.bytes_transferred)
    }

    /// Receives exactly `content_length` bytes from the connection into `dest`.
    ///
    /// Each socket read asks for at most `min(chunk_size, remaining)` bytes, so nothing beyond the
    /// payload is consumed. If the connection closes early the result is a
    /// [`TransportError::ClosedEarly`]; the caller's [`PartialFile`] then removes what was written.
    pub(crate) async fn receive_payload<R>(
        &mut self,
        recv: &mut R,
        dest: &mut PartialFile,
        chunk_size: usize,
        timeout: Option<Duration>,
    ) -> Result<u64>
    where
        R: ReceivingStream,
    {
        debug_assert_eq!(self.role, TransferRole::Receiver);
        trace!("receiving {} bytes of {}", self.content_length, self.filename);
        let mut buf = vec![0u8; chunk_size];
        while !self.is_complete() {
            let want = self.next_chunk(chunk_size);
            let n = with_timeout(timeout, async {
                recv.read(&mut buf[..want]).await.map_err(TransportError::from)
            })
            .await?;
            if n == 0 {
                return Err(TransportError::ClosedEarly {
                    received: self.bytes_transferred,
                    expected: self.content_length,
                }
                .into());
            }
            dest.write_all(&buf[..n]).await?;
            self.advance(n);
        }
        self.finish();
        Ok(self.bytes_transferred)
    }
}

/// Destinations currently held by a [`PartialFile`] in this process
static RECEIVING: LazyLock<Mutex<HashSet<PathBuf>>> = LazyLock::new(Mutex::default);

fn receiving() -> MutexGuard<'static, HashSet<PathBuf>> {
    RECEIVING.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Is a transfer into `path` still in progress?
///
/// A file which has been opened and is not (or no longer) being received was complete when its
/// receiver committed it.
pub(crate) fn is_receiving(path: &Path) -> bool {
    receiving().contains(path)
}

/// A destination file which is removed on drop unless committed.
///
/// Every receive path holds its destination in one of these, so any failure leaves no partial file behind.
/// While it exists, [`is_receiving`] reports its path.
#[derive(Debug)]
pub(crate) struct PartialFile {
    path: PathBuf,
    name: String,
    file: Option<File>,
}

impl PartialFile {
    /// Atomically creates a new destination.
    ///
    /// Fails with [`std::io::ErrorKind::AlreadyExists`] if anything exists at `path`, or another
    /// transfer in this process is writing to it.
    pub(crate) async fn create_exclusive(path: &Path) -> std::io::Result<Self> {
        Self::claim(path, io::create_exclusive(path)).await
    }

    /// Creates or truncates a destination.
    ///
    /// Fails with [`std::io::ErrorKind::AlreadyExists`] if another transfer in this process is
    /// writing to `path`.
    pub(crate) async fn create_truncate(path: &Path) -> std::io::Result<Self> {
        Self::claim(path, io::create_truncate(path)).await
    }

    /// Registers `path` as in progress, then creates it.
    ///
    /// The claim comes first, so anybody who can open the new file also sees the claim.
    async fn claim<F>(path: &Path, create: F) -> std::io::Result<Self>
    where
        F: Future<Output = std::io::Result<File>>,
    {
        if !receiving().insert(path.to_owned()) {
            return Err(std::io::Error::new(
                std::io::ErrorKind::AlreadyExists,
                "another transfer is writing this file",
            ));
        }
        match create.await {
            Ok(file) => Ok(Self {
                path: path.to_owned(),
                name: path.to_string_lossy().to_string(),
                file: Some(file),
            }),
            Err(e) => {
                let _ = receiving().remove(path);
                Err(e)
            }
        }
    }

    fn file(&mut self) -> Result<&mut File, FilesystemError> {
        self.file.as_mut().ok_or_else(|| FilesystemError::Write {
            name: self.name.clone(),
            source: std::io::Error::other("file already closed"),
        })
    }

    /// Appends data
    pub(crate) async fn write_all(&mut self, buf: &[u8]) -> Result<(), FilesystemError> {
        let name = self.name.clone();
        self.file()?
            .write_all(buf)
            .await
            .map_err(|source| FilesystemError::Write { name, source })
    }

    /// Flushes the file to storage and disarms the guard
    pub(crate) async fn commit(mut self) -> Result<(), FilesystemError> {
        let name = self.name.clone();
        let mut file = self.file.take().ok_or_else(|| FilesystemError::Write {
            name: name.clone(),
            source: std::io::Error::other("file already closed"),
        })?;
        let result = async {
            file.flush().await?;
            file.sync_all().await
        }
        .await;
        if let Err(source) = result {
            // The guard is still armed; put the handle back so drop closes then removes it.
            self.file = Some(file);
            return Err(FilesystemError::Write { name, source });
        }
        debug!("committed {name}");
        Ok(())
    }
}

impl Drop for PartialFile {
    fn drop(&mut self) {
        if let Some(file) = self.file.take() {
            drop(file);
            match std::fs::remove_file(&self.path) {
                Ok(()) => debug!("removed partial file {}", self.name),
                Err(e) => warn!("could not remove partial file {}: {e}", self.name),
            }
        }
        let _ = receiving().remove(&self.path);
    }
}
