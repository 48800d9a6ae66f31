//! PUT command (upload)
// (c) 2026 fxp authors

use anyhow::Result;
use async_trait::async_trait;
use std::path::Path;
use tracing::{debug, info, trace, warn};

use super::common::{
    check_content_length, check_filename, expect_allow, progress_bar_for, send_allow, send_deny,
    send_message, APPROVAL_ACKNOWLEDGED, CANNOT_OVERWRITE, TRANSFER_COMPLETE, UPLOAD_APPROVED,
};
use super::transfer::{PartialFile, TransferRole, TransferSession};
use super::{CommandStats, SessionCommandImpl};

use crate::client::JobSpec;
use crate::config::Configuration;
use crate::error::{FilesystemError, ProtocolError};
use crate::protocol::common::{ReceivingStream, SendReceivePair, SendingStream};
use crate::protocol::{Message, PutRequest};
use crate::util::io::open_file;

pub(crate) struct Put<S: SendingStream, R: ReceivingStream> {
    stream: SendReceivePair<S, R>,
    args: Option<PutRequest>,
}

/// Boxing constructor
impl<S: SendingStream + 'static, R: ReceivingStream + 'static> Put<S, R> {
    pub(crate) fn boxed(
        stream: SendReceivePair<S, R>,
        args: Option<PutRequest>,
    ) -> Box<dyn SessionCommandImpl> {
        Box::new(Self { stream, args })
    }
}

#[async_trait]
impl<S: SendingStream, R: ReceivingStream> SessionCommandImpl for Put<S, R> {
    async fn send(
        &mut self,
        job: &JobSpec,
        display: indicatif::MultiProgress,
        config: &Configuration,
        quiet: bool,
    ) -> Result<CommandStats> {
        let src_filename = job.filename();
        let path = Path::new(src_filename);
        let (mut file, meta) = open_file(path)
            .await
            .map_err(|e| FilesystemError::classify(src_filename, e))?;
        if meta.is_dir() {
            return Err(FilesystemError::IsADirectory(src_filename.to_owned()).into());
        }
        let payload_len = meta.len();
        if payload_len == 0 {
            return Err(ProtocolError::InvalidRequest(format!(
                "{src_filename} is empty; nothing to upload"
            ))
            .into());
        }
        let content_length = i64::try_from(payload_len)
            .map_err(|_| ProtocolError::InvalidRequest(format!("{src_filename} is too large")))?;
        // The filename in the protocol is the file part only of src_filename
        let protocol_filename = path
            .file_name()
            .and_then(|f| f.to_str())
            .ok_or_else(|| {
                ProtocolError::InvalidRequest(format!("invalid filename {src_filename}"))
            })?;
        let timeout = config.read_timeout();

        trace!("sending request");
        send_message(
            &mut self.stream.send,
            Message::put(protocol_filename, content_length),
        )
        .await?;

        trace!("await approval");
        let _ = expect_allow(&mut self.stream.recv, timeout).await?;
        send_allow(&mut self.stream.send, APPROVAL_ACKNOWLEDGED).await?;

        let progress_bar = progress_bar_for(&display, job, payload_len, quiet)?;
        let mut session = TransferSession::new(TransferRole::Sender, protocol_filename, payload_len)
            .with_progress(progress_bar);
        trace!("send payload");
        let sent = session
            .send_payload(&mut file, &mut self.stream.send, config.chunk_size)
            .await?;

        trace!("await completion");
        let _ = expect_allow(&mut self.stream.recv, timeout)
            .await
            .inspect_err(|e| warn!("upload of {protocol_filename} was not confirmed: {e}"))?;
        trace!("complete");
        Ok(CommandStats {
            payload_bytes: sent,
            listing: None,
        })
    }

    async fn handle(&mut self, config: &Configuration) -> Result<()> {
        let Some(ref args) = self.args else {
            anyhow::bail!("PUT handler called without args");
        };
        let stream = &mut self.stream;
        trace!("begin");

        // Checks in order: size, then name, then existence.
        let content_length = match check_content_length(args.content_length) {
            Ok(n) => n,
            Err(reason) => {
                info!("refusing upload: {reason} ({})", args.content_length);
                return send_deny(&mut stream.send, reason).await;
            }
        };
        if let Some(reason) = check_filename(&args.filename, config.max_filename_length) {
            info!("refusing upload: {reason}");
            return send_deny(&mut stream.send, reason).await;
        }

        let path = config.directory.join(&args.filename);
        let mut dest = match PartialFile::create_exclusive(&path).await {
            Ok(f) => f,
            Err(e) if e.kind() == std::io::ErrorKind::AlreadyExists => {
                info!("refusing upload: {CANNOT_OVERWRITE}");
                return send_deny(&mut stream.send, CANNOT_OVERWRITE).await;
            }
            Err(e) => {
                warn!("could not create {}: {e}", args.filename);
                return send_deny(&mut stream.send, &e.to_string()).await;
            }
        };
        // From here on, any early return removes the file.

        send_allow(&mut stream.send, UPLOAD_APPROVED).await?;
        let timeout = config.read_timeout();
        let _ = expect_allow(&mut stream.recv, timeout).await?;

        trace!("receiving file payload");
        let mut session =
            TransferSession::new(TransferRole::Receiver, &args.filename, content_length);
        if let Err(e) = session
            .receive_payload(&mut stream.recv, &mut dest, config.chunk_size, timeout)
            .await
        {
            if let Some(fe) = e.downcast_ref::<FilesystemError>() {
                warn!("failed to write {}: {fe}", args.filename);
                // best effort; the transfer has failed whatever happens here
                let _ = send_deny(&mut stream.send, &fe.to_string()).await;
            }
            return Err(e);
        }

        if let Err(e) = dest.commit().await {
            let _ = send_deny(&mut stream.send, &e.to_string()).await;
            return Err(e.into());
        }
        send_allow(&mut stream.send, TRANSFER_COMPLETE).await?;
        debug!("received {} ({content_length} bytes)", args.filename);
        Ok(())
    }
}
