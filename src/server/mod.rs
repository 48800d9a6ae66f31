//! Responder (server-side) event loop
// (c) 2026 fxp authors

use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Context as _;
use tokio::net::{TcpListener, ToSocketAddrs};
use tokio::task::JoinSet;
use tracing::{debug, error, info, trace, trace_span, warn, Instrument as _};

use crate::config::Configuration;
use crate::protocol::common::TcpStreamPair;

mod stream;
use stream::handle_stream;

/// A listening socket together with the configuration it serves.
///
/// Lifecycle: [`bind`](Server::bind), then [`serve_until`](Server::serve_until), which stops
/// accepting when its shutdown future completes and drains in-flight connections before returning.
#[derive(Debug)]
pub struct Server {
    listener: TcpListener,
    config: Arc<Configuration>,
}

impl Server {
    /// Binds the listening socket.
    ///
    /// The serving directory must exist.
    pub async fn bind<A: ToSocketAddrs>(addr: A, config: Configuration) -> anyhow::Result<Self> {
        let config = config.validate()?;
        anyhow::ensure!(
            config.directory.is_dir(),
            "serving directory {} does not exist or is not a directory",
            config.directory.display()
        );
        let listener = TcpListener::bind(addr)
            .await
            .context("failed to bind listening socket")?;
        Ok(Self {
            listener,
            config: Arc::new(config),
        })
    }

    /// The address we are actually listening on
    pub fn local_addr(&self) -> anyhow::Result<SocketAddr> {
        Ok(self.listener.local_addr()?)
    }

    /// Accepts and serves connections until `shutdown` completes.
    ///
    /// Each connection is handled in its own task and carries exactly one request.
    pub async fn serve_until<F>(self, shutdown: F) -> anyhow::Result<()>
    where
        F: Future<Output = ()>,
    {
        let mut tasks = JoinSet::new();
        tokio::pin!(shutdown);
        info!(
            "serving {} on {}",
            self.config.directory.display(),
            self.local_addr()?
        );

        loop {
            tokio::select! {
                () = &mut shutdown => {
                    debug!("shutdown requested");
                    break;
                }
                accepted = self.listener.accept() => {
                    let (socket, peer) = match accepted {
                        Ok(a) => a,
                        Err(e) => {
                            // Typically transient (e.g. out of file descriptors), so keep going
                            warn!("accept failed: {e}");
                            continue;
                        }
                    };
                    trace!("connection from {peer}");
                    let config = self.config.clone();
                    let span = trace_span!("CONN", %peer);
                    let _ = tasks.spawn(
                        async move {
                            let stream = TcpStreamPair::from(socket);
                            if let Err(e) = handle_stream(stream, &config).await {
                                error!("connection failed: {e}");
                            }
                            trace!("connection completed");
                        }
                        .instrument(span),
                    );
                }
            }
            // reap finished connections
            while let Some(res) = tasks.try_join_next() {
                if let Err(e) = res {
                    error!("connection task failed: {e}");
                }
            }
        }

        // Graceful closedown. Wait for in-flight connections to finish.
        drop(self.listener);
        trace!("waiting for {} connection(s) to finish", tasks.len());
        let _ = tasks.join_all().await;
        trace!("finished");
        Ok(())
    }
}

/// Server event loop; serves until interrupted
pub async fn server_main(config: Configuration) -> anyhow::Result<()> {
    let server = Server::bind(("0.0.0.0", config.port), config).await?;
    server
        .serve_until(async {
            if let Err(e) = tokio::signal::ctrl_c().await {
                error!("unable to listen for interrupt: {e}");
                std::future::pending::<()>().await;
            }
        })
        .await
}

#[cfg(test)]
mod test {
    use super::Server;
    use crate::config::Configuration;
    use crate::protocol::Message;
    use pretty_assertions::assert_eq;
    use std::time::Duration;
    use tokio::net::TcpStream;

    fn config_for(dir: &tempfile::TempDir) -> Configuration {
        Configuration {
            directory: dir.path().to_owned(),
            ..Configuration::system_default().clone()
        }
    }

    #[tokio::test]
    async fn serves_then_shuts_down() -> anyhow::Result<()> {
        let dir = tempfile::tempdir()?;
        std::fs::write(dir.path().join("f"), "x")?;
        let server = Server::bind("127.0.0.1:0", config_for(&dir)).await?;
        let addr = server.local_addr()?;
        let (stop_tx, stop_rx) = tokio::sync::oneshot::channel::<()>();
        let task = tokio::spawn(server.serve_until(async {
            let _ = stop_rx.await;
        }));

        let mut conn = TcpStream::connect(addr).await?;
        Message::List.send(&mut conn).await?;
        let Message::Allow(a) = Message::receive(&mut conn).await? else {
            panic!("expected ALLOW");
        };
        assert_eq!(a.files, Some(vec!["f".to_string()]));

        stop_tx.send(()).unwrap();
        task.await??;
        assert!(TcpStream::connect(addr).await.is_err());
        Ok(())
    }

    #[tokio::test]
    async fn idle_connection_does_not_block_shutdown() -> anyhow::Result<()> {
        let dir = tempfile::tempdir()?;
        let config = Configuration {
            timeout: 1,
            ..config_for(&dir)
        };
        let server = Server::bind("127.0.0.1:0", config).await?;
        let addr = server.local_addr()?;
        let (stop_tx, stop_rx) = tokio::sync::oneshot::channel::<()>();
        let task = tokio::spawn(server.serve_until(async {
            let _ = stop_rx.await;
        }));

        // connects, then says nothing
        let _idle = TcpStream::connect(addr).await?;
        tokio::time::sleep(Duration::from_millis(100)).await;
        stop_tx.send(()).unwrap();
        tokio::time::timeout(Duration::from_secs(5), task)
            .await
            .expect("shutdown should drain once the idle connection times out")??;
        Ok(())
    }

    #[tokio::test]
    async fn missing_directory() {
        let dir = tempfile::tempdir().unwrap();
        let config = Configuration {
            directory: dir.path().join("nope"),
            ..Configuration::system_default().clone()
        };
        let e = Server::bind("127.0.0.1:0", config).await.unwrap_err();
        assert!(e.to_string().contains("serving directory"));
    }

    #[tokio::test]
    async fn invalid_configuration() {
        let dir = tempfile::tempdir().unwrap();
        let config = Configuration {
            chunk_size: 0,
            ..config_for(&dir)
        };
        assert!(Server::bind("127.0.0.1:0", config).await.is_err());
    }
}
