//! GET command (download)
// (c) 2026 fxp authors

use anyhow::Result;
use async_trait::async_trait;
use std::path::Path;
use tracing::{debug, info, trace, warn};

use super::common::{
    check_filename, expect_allow, expect_offer, progress_bar_for, send_allow, send_deny,
    send_message, APPROVAL_ACKNOWLEDGED, DOES_NOT_EXIST, INFO_RECEIVED, IS_A_DIRECTORY,
    TRANSFER_COMPLETE, UPLOAD_IN_PROGRESS,
};
use super::transfer::{is_receiving, PartialFile, TransferRole, TransferSession};
use super::{CommandStats, SessionCommandImpl};

use crate::client::JobSpec;
use crate::config::Configuration;
use crate::error::{FilesystemError, ProtocolError, Rejected};
use crate::protocol::common::{ReceivingStream, SendReceivePair, SendingStream};
use crate::protocol::{GetRequest, Message};
use crate::util::io::open_file;

pub(crate) struct Get<S: SendingStream, R: ReceivingStream> {
    stream: SendReceivePair<S, R>,
    args: Option<GetRequest>,
}

/// Boxing constructor
impl<S: SendingStream + 'static, R: ReceivingStream + 'static> Get<S, R> {
    pub(crate) fn boxed(
        stream: SendReceivePair<S, R>,
        args: Option<GetRequest>,
    ) -> Box<dyn SessionCommandImpl> {
        Box::new(Self { stream, args })
    }
}

#[async_trait]
impl<S: SendingStream, R: ReceivingStream> SessionCommandImpl for Get<S, R> {
    async fn send(
        &mut self,
        job: &JobSpec,
        display: indicatif::MultiProgress,
        config: &Configuration,
        quiet: bool,
    ) -> Result<CommandStats> {
        let filename = job.filename();
        let dest = job.local_destination()?;
        let timeout = config.read_timeout();

        trace!("send request");
        send_message(&mut self.stream.send, Message::get(filename)).await?;

        trace!("await file information");
        let offer = expect_offer(&mut self.stream.recv, timeout).await?;
        let Ok(content_length) = u64::try_from(offer.content_length) else {
            return Err(ProtocolError::Unexpected {
                expected: "a non-negative content length",
                got: offer.content_length.to_string(),
            }
            .into());
        };
        // Any other size is taken on trust.
        debug!("server offers {} ({content_length} bytes)", offer.filename);

        let path = Path::new(&dest);
        let mut partial = match PartialFile::create_truncate(path).await {
            Ok(f) => f,
            Err(e) => {
                let e = FilesystemError::classify(&dest, e);
                // best effort; we are failing anyway
                let _ = send_deny(&mut self.stream.send, &e.to_string()).await;
                return Err(e.into());
            }
        };

        send_allow(&mut self.stream.send, INFO_RECEIVED).await?;
        trace!("await approval");
        let _ = expect_allow(&mut self.stream.recv, timeout).await?;

        let progress_bar = progress_bar_for(&display, job, content_length, quiet)?;
        let mut session = TransferSession::new(TransferRole::Receiver, filename, content_length)
            .with_progress(progress_bar);
        trace!("payload");
        let received = session
            .receive_payload(
                &mut self.stream.recv,
                &mut partial,
                config.chunk_size,
                timeout,
            )
            .await?;
        partial.commit().await?;

        send_allow(&mut self.stream.send, TRANSFER_COMPLETE).await?;
        trace!("complete");
        Ok(CommandStats {
            payload_bytes: received,
            listing: None,
        })
    }

    async fn handle(&mut self, config: &Configuration) -> Result<()> {
        let Some(ref args) = self.args else {
            anyhow::bail!("GET handler called without args");
        };
        let stream = &mut self.stream;
        trace!("begin");

        if let Some(reason) = check_filename(&args.filename, config.max_filename_length) {
            info!("refusing download: {reason}");
            return send_deny(&mut stream.send, reason).await;
        }
        let path = config.directory.join(&args.filename);
        let (mut file, meta) = match open_file(&path).await {
            Ok(res) => res,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                info!("refusing download: {DOES_NOT_EXIST}");
                return send_deny(&mut stream.send, DOES_NOT_EXIST).await;
            }
            Err(e) => {
                warn!("could not open {}: {e}", args.filename);
                return send_deny(&mut stream.send, &e.to_string()).await;
            }
        };
        if meta.is_dir() {
            info!("refusing download: {IS_A_DIRECTORY}");
            return send_deny(&mut stream.send, IS_A_DIRECTORY).await;
        }
        // Checked after opening: an upload claims its name before the file exists.
        if is_receiving(&path) {
            info!("refusing download: {UPLOAD_IN_PROGRESS}");
            return send_deny(&mut stream.send, UPLOAD_IN_PROGRESS).await;
        }
        let size = meta.len();
        let content_length = i64::try_from(size)?;

        trace!("offering file");
        send_message(
            &mut stream.send,
            Message::put(args.filename.as_str(), content_length),
        )
        .await?;
        let timeout = config.read_timeout();
        match expect_allow(&mut stream.recv, timeout).await {
            Ok(_) => (),
            Err(e) if e.is::<Rejected>() => {
                info!("client declined {}: {e}", args.filename);
                return Ok(());
            }
            Err(e) => return Err(e),
        }
        send_allow(&mut stream.send, APPROVAL_ACKNOWLEDGED).await?;

        trace!("sending file payload");
        let mut session = TransferSession::new(TransferRole::Sender, &args.filename, size);
        let _ = session
            .send_payload(&mut file, &mut stream.send, config.chunk_size)
            .await?;

        trace!("await completion");
        let _ = expect_allow(&mut stream.recv, timeout)
            .await
            .inspect_err(|e| warn!("download of {} was not confirmed: {e}", args.filename))?;
        debug!("sent {} ({size} bytes)", args.filename);
        Ok(())
    }
}

#[cfg(test)]
mod test {
    use anyhow::{bail, Result};
    use pretty_assertions::assert_eq;
    use tokio::io::{AsyncReadExt as _, AsyncWriteExt as _};

    use crate::{
        client::JobSpec,
        error::{ProtocolError, Rejected, TransportError},
        protocol::Message,
        session::{test::*, transfer::PartialFile, CommandStats, Get},
        util::test_protocol::test_plumbing,
    };

    /// Run a GET of `remote` into `local`, return the results from sender & receiver.
    async fn test_get_main(
        tray: &Tray,
        remote: &str,
        local: &str,
    ) -> Result<(Result<CommandStats>, Result<()>)> {
        let (pipe1, mut pipe2) = test_plumbing();
        let spec = JobSpec::get(remote, Some(tray.local_path(local)));
        let config = tray.config();
        let mut sender = Get::boxed(pipe1, None);
        let mut sender_fut = sender.send_test(&spec, Some(&config));

        let result = read_from_plumbing(&mut pipe2.recv, &mut sender_fut).await;
        let Message::Get(args) = result.expect_left("sender should not have completed early")?
        else {
            bail!("expected Get message")
        };

        let mut handler = Get::boxed(pipe2, Some(args));
        let (r1, r2) = tokio::join!(sender_fut, handler.handle(&config));
        Ok((r1, r2))
    }

    #[tokio::test]
    async fn get_success() -> Result<()> {
        let tray = Tray::new();
        tray.create_served("data.bin", "hello, world");
        let (r1, r2) = test_get_main(&tray, "data.bin", "copy").await?;
        assert_eq!(r1?.payload_bytes, 12);
        r2?;
        assert_eq!(tray.read_local("copy"), "hello, world");
        Ok(())
    }

    #[tokio::test]
    async fn get_empty_file() -> Result<()> {
        let tray = Tray::new();
        tray.create_served("empty", "");
        let (r1, r2) = test_get_main(&tray, "empty", "empty").await?;
        assert_eq!(r1?.payload_bytes, 0);
        r2?;
        assert_eq!(tray.read_local("empty"), "");
        Ok(())
    }

    #[tokio::test]
    async fn get_many_chunks() -> Result<()> {
        let tray = Tray::new();
        let contents = "fxp".repeat(2000);
        tray.create_served("big", &contents);
        let (r1, r2) = test_get_main(&tray, "big", "big").await?;
        assert_eq!(r1?.payload_bytes, 6000);
        r2?;
        assert_eq!(tray.read_local("big"), contents);
        Ok(())
    }

    #[tokio::test]
    async fn file_not_found() -> Result<()> {
        let tray = Tray::new();
        let (r1, r2) = test_get_main(&tray, "absent", "absent").await?;
        let e = r1.unwrap_err();
        assert_eq!(e.to_string(), "remote file does not exist");
        assert!(e.downcast_ref::<Rejected>().is_some());
        r2?;
        assert!(!tray.local_exists("absent"));
        Ok(())
    }

    #[tokio::test]
    async fn directory_refused() -> Result<()> {
        let tray = Tray::new();
        tray.make_served_dir("subdir");
        let (r1, r2) = test_get_main(&tray, "subdir", "subdir").await?;
        assert_eq!(r1.unwrap_err().to_string(), "remote file is a directory");
        r2?;
        assert!(!tray.local_exists("subdir"));
        Ok(())
    }

    #[tokio::test]
    async fn traversal_refused() -> Result<()> {
        let tray = Tray::new();
        let reply = run_handler(&tray.config(), Message::get("../secret"), &[]).await?;
        assert_eq!(reply, vec![Message::deny("invalid filename")]);
        Ok(())
    }

    #[tokio::test]
    async fn upload_in_progress_refused() -> Result<()> {
        let tray = Tray::new();
        let mut upload = PartialFile::create_exclusive(&tray.served_path("x")).await?;
        upload.write_all(b"par").await?;
        let reply = run_handler(&tray.config(), Message::get("x"), &[]).await?;
        assert_eq!(reply, vec![Message::deny("remote file is still being uploaded")]);
        upload.write_all(b"tial").await?;
        upload.commit().await?;

        let (r1, r2) = test_get_main(&tray, "x", "x").await?;
        assert_eq!(r1?.payload_bytes, 7);
        r2?;
        assert_eq!(tray.read_local("x"), "partial");
        Ok(())
    }

    #[tokio::test]
    async fn exact_wire_sequence() -> Result<()> {
        let tray = Tray::new();
        tray.create_served("x.txt", "hello");
        let (bytes, result) = run_handler_raw(
            &tray.config(),
            Message::get("x.txt"),
            &[
                WireItem::Msg(Message::allow("File info received. Continue to send file.")),
                WireItem::Msg(Message::allow("File transfer complete")),
            ],
        )
        .await;
        result?;
        let mut rest = bytes.as_slice();
        assert_eq!(Message::receive(&mut rest).await?, Message::put("x.txt", 5));
        assert_eq!(
            Message::receive(&mut rest).await?,
            Message::allow("File approval acknowledged. Sending file...")
        );
        let mut payload = Vec::new();
        let _ = rest.read_to_end(&mut payload).await?;
        assert_eq!(payload, b"hello");
        Ok(())
    }

    #[tokio::test]
    async fn client_declines_offer() -> Result<()> {
        let tray = Tray::new();
        tray.create_served("x.txt", "hello");
        let reply = run_handler(
            &tray.config(),
            Message::get("x.txt"),
            &[WireItem::Msg(Message::deny("no space"))],
        )
        .await?;
        assert_eq!(reply, vec![Message::put("x.txt", 5)]);
        Ok(())
    }

    #[tokio::test]
    async fn completion_not_confirmed() {
        let tray = Tray::new();
        tray.create_served("x.txt", "hello");
        let (_, result) = run_handler_raw(
            &tray.config(),
            Message::get("x.txt"),
            &[WireItem::Msg(Message::allow("ok"))],
        )
        .await;
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn negative_offer_is_a_protocol_error() -> Result<()> {
        let tray = Tray::new();
        let (pipe1, mut pipe2) = test_plumbing();
        let spec = JobSpec::get("f", Some(tray.local_path("f")));
        let mut sender = Get::boxed(pipe1, None);
        let server = async move {
            let _ = Message::receive(&mut pipe2.recv).await.unwrap();
            Message::put("f", -1).send(&mut pipe2.send).await.unwrap();
            let mut rest = Vec::new();
            let _ = pipe2.recv.read_to_end(&mut rest).await;
            rest
        };
        let client = async move {
            let r = sender.send_test(&spec, None).await;
            // hang up, so the server side sees EOF
            drop(sender);
            r
        };
        let (r1, rest) = tokio::join!(client, server);
        assert!(matches!(
            r1.unwrap_err().downcast_ref::<ProtocolError>(),
            Some(ProtocolError::Unexpected { .. })
        ));
        // nothing further was sent, and nothing was created
        assert!(rest.is_empty());
        assert!(!tray.local_exists("f"));
        Ok(())
    }

    #[tokio::test]
    async fn server_denies_after_info_ack() -> Result<()> {
        let tray = Tray::new();
        let (pipe1, mut pipe2) = test_plumbing();
        let spec = JobSpec::get("f", Some(tray.local_path("f")));
        let mut sender = Get::boxed(pipe1, None);
        let server = async move {
            let _ = Message::receive(&mut pipe2.recv).await.unwrap();
            Message::put("f", 3).send(&mut pipe2.send).await.unwrap();
            let ack = Message::receive(&mut pipe2.recv).await.unwrap();
            Message::deny("changed my mind")
                .send(&mut pipe2.send)
                .await
                .unwrap();
            ack
        };
        let (r1, ack) = tokio::join!(sender.send_test(&spec, None), server);
        assert_eq!(
            ack,
            Message::allow("File info received. Continue to send file.")
        );
        assert_eq!(r1.unwrap_err().to_string(), "changed my mind");
        assert!(!tray.local_exists("f"));
        Ok(())
    }

    #[tokio::test]
    async fn server_stalls_mid_payload() -> Result<()> {
        let tray = Tray::new();
        let config = crate::config::Configuration {
            timeout: 1,
            ..tray.config()
        };
        let (pipe1, mut pipe2) = test_plumbing();
        let spec = JobSpec::get("f", Some(tray.local_path("f")));
        let mut sender = Get::boxed(pipe1, None);
        let server = async move {
            let _ = Message::receive(&mut pipe2.recv).await?;
            Message::put("f", 10).send(&mut pipe2.send).await?;
            let _ = Message::receive(&mut pipe2.recv).await?;
            Message::allow("go").send(&mut pipe2.send).await?;
            pipe2.send.write_all(b"0123").await?;
            // keep the connection open, so only the time limit ends the transfer
            anyhow::Ok(pipe2)
        };
        let (r1, pipe2) = tokio::join!(sender.send_test(&spec, Some(&config)), server);
        let _pipe2 = pipe2?;
        let e = r1.unwrap_err();
        assert!(matches!(
            e.downcast_ref::<TransportError>(),
            Some(TransportError::TimedOut)
        ));
        assert!(!tray.local_exists("f"));
        Ok(())
    }
}
