//! File and socket I/O helpers
// (c) 2026 fxp authors

use std::future::Future;
use std::path::Path;
use std::time::Duration;

use tokio::fs::{File, OpenOptions};

use crate::error::TransportError;

/// Default size of a single read or write during payload transfer
pub const DEFAULT_CHUNK_SIZE: usize = 1024;

/// Opens a file for reading, returning the handle and its metadata.
///
/// Directories open successfully on some platforms; check the metadata.
pub(crate) async fn open_file(path: &Path) -> std::io::Result<(File, std::fs::Metadata)> {
    let file = File::open(path).await?;
    let meta = file.metadata().await?;
    Ok((file, meta))
}

/// Atomically creates a new file for writing.
///
/// Fails with [`std::io::ErrorKind::AlreadyExists`] if anything exists at `path`.
pub(crate) async fn create_exclusive(path: &Path) -> std::io::Result<File> {
    OpenOptions::new()
        .write(true)
        .create_new(true)
        .open(path)
        .await
}

/// Creates or truncates a file for writing
pub(crate) async fn create_truncate(path: &Path) -> std::io::Result<File> {
    OpenOptions::new()
        .write(true)
        .create(true)
        .truncate(true)
        .open(path)
        .await
}

/// Runs a socket operation, optionally bounded by a time limit
pub(crate) async fn with_timeout<F, T, E>(limit: Option<Duration>, fut: F) -> anyhow::Result<T>
where
    F: Future<Output = Result<T, E>>,
    E: Into<anyhow::Error>,
{
    match limit {
        None => fut.await.map_err(Into::into),
        Some(limit) => match tokio::time::timeout(limit, fut).await {
            Ok(r) => r.map_err(Into::into),
            Err(_) => Err(TransportError::TimedOut.into()),
        },
    }
}

/// Converts a configured timeout in seconds (0 meaning none) to a time limit
#[must_use]
pub fn timeout_from_secs(secs: u64) -> Option<Duration> {
    (secs > 0).then(|| Duration::from_secs(secs))
}
