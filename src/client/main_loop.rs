//! Main client mode event loop
// (c) 2026 fxp authors

use std::time::{Duration, Instant};

use anyhow::{Context as _, Result};
use human_repr::{HumanCount as _, HumanDuration as _, HumanThroughput as _};
use indicatif::MultiProgress;
use tokio::net::{TcpStream, ToSocketAddrs};
use tracing::{debug, error, info, trace_span, Instrument as _};

use super::job::{JobSpec, Operation};
use super::Parameters;
use crate::config::Configuration;
use crate::protocol::common::TcpStreamPair;
use crate::session::{self, CommandStats};
use crate::util::io::with_timeout;

/// Connects to a server and performs a single operation.
///
/// `display` hosts the progress bar, if any.
///
/// # Errors
/// A refusal by the server is a [`Rejected`](crate::error::Rejected) error whose display form is the
/// server's reason.
pub async fn run_job<A: ToSocketAddrs>(
    addr: A,
    job: &JobSpec,
    config: &Configuration,
    display: MultiProgress,
    quiet: bool,
) -> Result<CommandStats> {
    let socket = with_timeout(config.read_timeout(), TcpStream::connect(addr))
        .await
        .context("failed to connect to server")?;
    debug!("connected to {}", socket.peer_addr()?);
    let sp = TcpStreamPair::from(socket);

    let mut imp = match job.operation {
        Operation::Put => session::Put::boxed(sp, None),
        Operation::Get => session::Get::boxed(sp, None),
        Operation::List => session::List::boxed(sp),
    };
    let span = match job.operation {
        Operation::Put => trace_span!("PUT", filename = job.filename()),
        Operation::Get => trace_span!("GET", filename = job.filename()),
        Operation::List => trace_span!("LIST"),
    };
    imp.send(job, display, config, quiet).instrument(span).await
    // The connection closes on drop.
}

/// Main client mode event loop
///
/// # Return value
/// `true` if the requested operation succeeded.
///
// Caution: As we are using ProgressBar, anything to be printed to console should use display.println() !
#[allow(clippy::module_name_repetitions)]
pub async fn client_main(
    config: &Configuration,
    display: MultiProgress,
    parameters: Parameters,
) -> Result<bool> {
    let job = JobSpec::try_from(&parameters)?;
    let (host, port) = parameters.remote()?;

    let span = trace_span!("CLIENT");
    let start = Instant::now();
    let result = run_job((host, port), &job, config, display.clone(), parameters.quiet)
        .instrument(span)
        .await;
    let elapsed = start.elapsed();
    display.clear()?;

    match result {
        Ok(stats) => {
            if let Some(listing) = &stats.listing {
                for name in listing {
                    println!("{name}");
                }
            } else if !parameters.quiet {
                info!("{}", transfer_summary(&job, &stats, elapsed));
            }
            Ok(true)
        }
        Err(e) => {
            error!("{job}: {e}");
            Ok(false)
        }
    }
}

/// One-line human-readable report of a completed transfer
fn transfer_summary(job: &JobSpec, stats: &CommandStats, elapsed: Duration) -> String {
    let size = stats.payload_bytes.human_count_bytes();
    let secs = elapsed.as_secs_f64();
    #[allow(clippy::cast_precision_loss)]
    let rate = if secs > 0.0 {
        (stats.payload_bytes as f64 / secs).human_throughput_bytes().to_string()
    } else {
        "unknown".to_string()
    };
    format!(
        "{job}: transferred {size} in {}; average {rate}",
        elapsed.human_duration()
    )
}
