//! Session protocol command senders and handlers
// (c) 2026 fxp authors

mod common;
pub(crate) use common::{receive_message, send_deny, MALFORMED_REQUEST};

mod get;
mod list;
mod put;
mod transfer;


pub(crate) use {get::Get, list::List, put::Put};
pub use transfer::{TransferRole, TransferSession};

use anyhow::Result;
use async_trait::async_trait;
use indicatif::MultiProgress;

use crate::{client::JobSpec, config::Configuration};

/// Outcome of a successful client-side command
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CommandStats {
    /// Number of payload bytes moved
    pub payload_bytes: u64,
    /// Directory listing, for LIST
    pub listing: Option<Vec<String>>,
}

/// Common structure for session protocol commands
#[async_trait]
pub(crate) trait SessionCommandImpl: Send {
    /// Client side implementation, takes care of sending the command and all its
    /// traffic. Does not return until completion (or error).
    async fn send(
        &mut self,
        job: &JobSpec,
        display: MultiProgress,
        config: &Configuration,
        quiet: bool,
    ) -> Result<CommandStats>;

    /// Server side implementation, takes care of handling the command and all its
    /// traffic. Does not return until completion (or error).
    ///
    /// Refusing a request is a normal outcome, not an error.
    /// If the command has arguments, the object constructor is expected to set them up.
    async fn handle(&mut self, config: &Configuration) -> Result<()>;

    #[cfg(test)]
    /// Syntactic sugar for unit tests.
    /// This is a wrapper to send() with some fixed arguments common to testing.
    async fn send_test(
        &mut self,
        job: &JobSpec,
        config: Option<&Configuration>,
    ) -> Result<CommandStats> {
        let config = config.unwrap_or_else(|| Configuration::system_default());
        self.send(
            job,
            MultiProgress::with_draw_target(indicatif::ProgressDrawTarget::hidden()),
            config,
            true,
        )
        .await
    }
}
