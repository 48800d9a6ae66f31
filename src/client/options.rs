//! Options specific to client mode
// (c) 2026 fxp authors

use super::job::{JobSpec, Operation};
use clap::Parser;

#[derive(Debug, Parser, Clone, Default)]
/// Client-side options which may be provided on the command line, but are not persistent configuration options.
pub struct Parameters {
    /// Enable detailed debug output
    ///
    /// This has the same effect as setting `RUST_LOG=fxp=debug` in the environment.
    /// If present, `RUST_LOG` overrides this option.
    #[arg(short, long, action, help_heading("Debug"), display_order(0))]
    pub debug: bool,

    /// Log to a file
    ///
    /// By default the log receives everything printed to stderr.
    /// To override this behaviour, set the environment variable `RUST_LOG_FILE_DETAIL` (same semantics as `RUST_LOG`).
    #[arg(
        short('l'),
        long,
        action,
        value_name("FILE"),
        help_heading("Output"),
        next_line_help(true),
        display_order(0)
    )]
    pub log_file: Option<String>,

    /// Quiet mode
    ///
    /// Switches off progress display; reports only errors
    #[arg(short, long, action, conflicts_with("debug"), help_heading("Output"))]
    pub quiet: bool,

    // JOB SPECIFICATION ===================================================================
    // (POSITIONAL ARGUMENTS!)
    /// The server to connect to
    #[arg(value_name = "HOST")]
    pub host: Option<String>,

    /// The server's port
    #[arg(id = "remote_port", value_name = "PORT")]
    pub port: Option<u16>,

    /// What to do
    #[arg(value_name = "OPERATION", ignore_case = true)]
    pub operation: Option<Operation>,

    /// For put, the local file to upload. For get, the remote file to download.
    #[arg(value_name = "FILENAME")]
    pub filename: Option<String>,

    /// For get, where to save the file [default: the remote file name, in the current directory]
    #[arg(value_name = "DESTINATION")]
    pub destination: Option<String>,
}

impl TryFrom<&Parameters> for JobSpec {
    type Error = anyhow::Error;

    fn try_from(args: &Parameters) -> Result<Self, Self::Error> {
        let operation = args
            .operation
            .ok_or_else(|| anyhow::anyhow!("HOST, PORT and OPERATION are required"))?;
        if args.destination.is_some() && operation != Operation::Get {
            anyhow::bail!("a destination may only be given with get");
        }
        Ok(JobSpec::new(
            operation,
            args.filename.clone(),
            args.destination.clone(),
        )?)
    }
}

impl Parameters {
    /// The server address, as a `(host, port)` pair
    pub(crate) fn remote(&self) -> anyhow::Result<(&str, u16)> {
        match (&self.host, self.port) {
            (Some(h), Some(p)) => Ok((h.as_str(), p)),
            _ => anyhow::bail!("HOST, PORT and OPERATION are required"),
        }
    }
}
