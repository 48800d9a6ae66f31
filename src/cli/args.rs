//! Command line arguments
// (c) 2026 fxp authors

use std::ffi::OsString;

use clap::{error::ErrorKind, CommandFactory as _, Parser};

use crate::{
    client::Parameters,
    config::{Configuration_Optional, Manager},
};

/// File exchange over TCP: serve a directory, or put, get or list files on a server.
#[derive(Debug, Parser, Clone)]
#[command(
    author,
    version,
    about,
    long_about = None,
    after_help = "EXAMPLES:\n  fxp --server -C /srv/files\n  fxp localhost 9000 put ./report.pdf\n  fxp localhost 9000 get report.pdf\n  fxp localhost 9000 list",
    infer_long_args(true),
    styles(super::styles::CLAP_STYLES),
)]
pub(crate) struct CliArgs {
    // MODE SELECTION ======================================================================
    /// Operates in server mode, serving the configured directory until interrupted
    #[arg(
        long,
        help_heading("Modes"),
        conflicts_with_all(["show_config", "config_files"]),
        display_order(0)
    )]
    pub server: bool,

    /// Outputs the configuration, then exits
    #[arg(long, help_heading("Configuration"), conflicts_with("config_files"))]
    pub show_config: bool,

    /// Outputs the paths to configuration file(s), then exits
    #[arg(long, help_heading("Configuration"))]
    pub config_files: bool,

    // CONFIGURABLE OPTIONS ================================================================
    #[command(flatten)]
    /// The set of options which may be set in a config file or via command-line.
    pub config: Configuration_Optional,

    // CLIENT-SIDE NON-CONFIGURABLE OPTIONS ================================================
    #[command(flatten)]
    /// The set of options which may only be provided via command-line.
    pub client_params: Parameters,
}

/// What the program has been asked to do
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum MainMode {
    Server,
    Client,
    ShowConfig,
    ShowConfigFiles,
}

impl From<&CliArgs> for MainMode {
    fn from(args: &CliArgs) -> Self {
        if args.server {
            MainMode::Server
        } else if args.show_config {
            MainMode::ShowConfig
        } else if args.config_files {
            MainMode::ShowConfigFiles
        } else {
            MainMode::Client
        }
    }
}

impl CliArgs {
    /// Parses arguments, checking that client mode has what it needs
    pub(crate) fn custom_parse<I, T>(args: I) -> Result<Self, clap::Error>
    where
        I: IntoIterator<Item = T>,
        T: Into<OsString> + Clone,
    {
        let args = CliArgs::try_parse_from(args)?;
        if MainMode::from(&args) == MainMode::Client {
            let p = &args.client_params;
            if p.host.is_none() || p.port.is_none() || p.operation.is_none() {
                return Err(CliArgs::command().error(
                    ErrorKind::MissingRequiredArgument,
                    "HOST, PORT and OPERATION are required in client mode (or use --server)",
                ));
            }
        }
        Ok(args)
    }
}

impl TryFrom<&CliArgs> for Manager {
    type Error = anyhow::Error;

    fn try_from(value: &CliArgs) -> Result<Self, Self::Error> {
        let mut mgr = Manager::standard();
        mgr.merge_provider(value.config.clone());
        Ok(mgr)
    }
}
