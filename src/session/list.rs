//! LIST command (served directory listing)
// (c) 2026 fxp authors

use anyhow::Result;
use async_trait::async_trait;
use tracing::{debug, error, trace};
use walkdir::WalkDir;

use super::common::{receive_message, send_deny, send_message, FILE_LISTING};
use super::transfer::is_receiving;
use super::{CommandStats, SessionCommandImpl};

use crate::client::JobSpec;
use crate::config::Configuration;
use crate::error::{ProtocolError, Rejected};
use crate::protocol::common::{ReceivingStream, SendReceivePair, SendingStream};
use crate::protocol::{Allow, Message};

pub(crate) struct List<S: SendingStream, R: ReceivingStream> {
    stream: SendReceivePair<S, R>,
}

/// Boxing constructor
impl<S: SendingStream + 'static, R: ReceivingStream + 'static> List<S, R> {
    pub(crate) fn boxed(stream: SendReceivePair<S, R>) -> Box<dyn SessionCommandImpl> {
        Box::new(Self { stream })
    }
}

/// Names of the entries directly inside `dir`, in name order.
///
/// Files still being uploaded are left out.
fn read_listing(dir: &std::path::Path) -> Result<Vec<String>, walkdir::Error> {
    WalkDir::new(dir)
        .min_depth(1)
        .max_depth(1)
        .sort_by_file_name()
        .into_iter()
        .filter(|e| e.as_ref().map_or(true, |e| !is_receiving(e.path())))
        .map(|e| e.map(|e| e.file_name().to_string_lossy().to_string()))
        .collect()
}

#[async_trait]
impl<S: SendingStream, R: ReceivingStream> SessionCommandImpl for List<S, R> {
    async fn send(
        &mut self,
        _job: &JobSpec,
        _display: indicatif::MultiProgress,
        config: &Configuration,
        _quiet: bool,
    ) -> Result<CommandStats> {
        // This is a trivial operation, we do not bother with a progress bar.
        trace!("sending command");
        send_message(&mut self.stream.send, Message::List).await?;

        trace!("await response");
        match receive_message(&mut self.stream.recv, config.read_timeout()).await? {
            Message::Allow(a) => {
                let files = a.files.unwrap_or_default();
                debug!("{} entries listed", files.len());
                Ok(CommandStats {
                    payload_bytes: 0,
                    listing: Some(files),
                })
            }
            Message::Deny(d) => {
                error!("List failed: {}", d.message);
                Err(Rejected::new(d.message).into())
            }
            other => Err(ProtocolError::Unexpected {
                expected: "file listing or DENY",
                got: other.to_string(),
            }
            .into()),
        }
    }

    async fn handle(&mut self, config: &Configuration) -> Result<()> {
        let stream = &mut self.stream;
        let dir = config.directory.clone();
        let listing = tokio::task::spawn_blocking(move || read_listing(&dir)).await?;
        let files = match listing {
            Ok(v) => v,
            Err(e) => {
                error!("could not list {}: {e}", config.directory.display());
                return send_deny(&mut stream.send, &e.to_string()).await;
            }
        };
        send_message(
            &mut stream.send,
            Message::Allow(Allow {
                message: FILE_LISTING.into(),
                files: Some(files),
            }),
        )
        .await
    }
}

#[cfg(test)]
mod test {
    use anyhow::Result;
    use pretty_assertions::assert_eq;

    use crate::{
        client::JobSpec,
        config::Configuration,
        error::{ProtocolError, Rejected},
        protocol::{Allow, Message},
        session::{test::*, transfer::PartialFile, List},
        util::test_protocol::test_plumbing,
    };

    #[tokio::test]
    async fn listing_wire_format() -> Result<()> {
        let tray = Tray::new();
        tray.create_served("b.bin", "bb");
        tray.create_served("a.txt", "a");
        let reply = run_handler(&tray.config(), Message::List, &[]).await?;
        assert_eq!(
            reply,
            vec![Message::Allow(Allow {
                message: "File listing".into(),
                files: Some(vec!["a.txt".into(), "b.bin".into()]),
            })]
        );
        Ok(())
    }

    #[tokio::test]
    async fn empty_directory() -> Result<()> {
        let tray = Tray::new();
        let reply = run_handler(&tray.config(), Message::List, &[]).await?;
        assert_eq!(
            reply,
            vec![Message::Allow(Allow {
                message: "File listing".into(),
                files: Some(vec![]),
            })]
        );
        Ok(())
    }

    #[tokio::test]
    async fn subdirectories_are_listed_not_descended() -> Result<()> {
        let tray = Tray::new();
        tray.make_served_dir("sub");
        std::fs::write(tray.served_path("sub").join("inner"), "x")?;
        let reply = run_handler(&tray.config(), Message::List, &[]).await?;
        let Message::Allow(a) = &reply[0] else {
            panic!("expected ALLOW, got {reply:?}");
        };
        assert_eq!(a.files, Some(vec!["sub".to_string()]));
        Ok(())
    }

    #[tokio::test]
    async fn uploads_in_progress_are_hidden() -> Result<()> {
        let tray = Tray::new();
        tray.create_served("done", "1");
        let upload = PartialFile::create_exclusive(&tray.served_path("pending")).await?;
        let reply = run_handler(&tray.config(), Message::List, &[]).await?;
        let Message::Allow(a) = &reply[0] else {
            panic!("expected ALLOW, got {reply:?}");
        };
        assert_eq!(a.files, Some(vec!["done".to_string()]));

        upload.commit().await?;
        let reply = run_handler(&tray.config(), Message::List, &[]).await?;
        let Message::Allow(a) = &reply[0] else {
            panic!("expected ALLOW, got {reply:?}");
        };
        assert_eq!(a.files, Some(vec!["done".to_string(), "pending".to_string()]));
        Ok(())
    }

    #[tokio::test]
    async fn unreadable_directory_is_denied() -> Result<()> {
        let tray = Tray::new();
        let config = Configuration {
            directory: tray.served_path("does-not-exist"),
            ..tray.config()
        };
        let reply = run_handler(&config, Message::List, &[]).await?;
        assert!(matches!(reply.as_slice(), [Message::Deny(_)]));
        Ok(())
    }

    #[tokio::test]
    async fn client_and_server() -> Result<()> {
        let tray = Tray::new();
        tray.create_served("one", "1");
        let config = tray.config();
        let (pipe1, mut pipe2) = test_plumbing();
        let mut sender = List::boxed(pipe1);
        let server = async {
            let msg = Message::receive(&mut pipe2.recv).await.unwrap();
            assert_eq!(msg, Message::List);
            List::boxed(pipe2).handle(&config).await
        };
        let spec = JobSpec::list();
        let (r1, r2) = tokio::join!(sender.send_test(&spec, None), server);
        assert_eq!(r1?.listing, Some(vec!["one".to_string()]));
        r2?;
        Ok(())
    }

    /// Runs the client side against a server which sends `reply`
    async fn client_against(reply: Message) -> Result<crate::session::CommandStats> {
        let (pipe1, mut pipe2) = test_plumbing();
        let mut sender = List::boxed(pipe1);
        let server = async {
            let _ = Message::receive(&mut pipe2.recv).await.unwrap();
            reply.send(&mut pipe2.send).await.unwrap();
        };
        let spec = JobSpec::list();
        let (r1, ()) = tokio::join!(sender.send_test(&spec, None), server);
        r1
    }

    #[tokio::test]
    async fn missing_files_is_empty() -> Result<()> {
        let stats = client_against(Message::allow("File listing")).await?;
        assert_eq!(stats.listing, Some(vec![]));
        Ok(())
    }

    #[tokio::test]
    async fn denial() {
        let e = client_against(Message::deny("cannot read directory"))
            .await
            .unwrap_err();
        assert_eq!(e.to_string(), "cannot read directory");
        assert!(e.downcast_ref::<Rejected>().is_some());
    }

    #[tokio::test]
    async fn wrong_reply() {
        let e = client_against(Message::List).await.unwrap_err();
        assert!(matches!(
            e.downcast_ref::<ProtocolError>(),
            Some(ProtocolError::Unexpected { .. })
        ));
    }
}
