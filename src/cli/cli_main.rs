//! Main CLI for fxp
// (c) 2026 fxp authors

use std::ffi::OsString;
use std::process::ExitCode;

use super::args::{CliArgs, MainMode};
use crate::{
    cli::styles::{configure_colours, error, use_colours, RESET},
    client::{client_main, Parameters, MAX_UPDATE_FPS},
    config::{Configuration, Manager},
    server::server_main,
    util::{setup_tracing, trace_level, ConsoleTraceType},
};

use anstream::{eprintln, println};
use anyhow::{Context as _, Result};
use indicatif::{MultiProgress, ProgressDrawTarget};
use tracing::error_span;

/// Main CLI entrypoint
///
/// Call this from `main`, passing the arguments to use.
/// Normally you will call `cli(std::env::args_os())` but you can pass in alternate arguments for CLI testing.
#[must_use]
pub fn cli<I, T>(args: I) -> ExitCode
where
    I: IntoIterator<Item = T>,
    T: Into<OsString> + Clone,
{
    #[allow(clippy::match_bool)]
    cli_inner(args)
        .inspect_err(|e| {
            if crate::util::tracing_is_initialised() {
                tracing::error!("{e:#}");
            } else {
                eprintln!("{ERROR}Error:{RESET} {e:#}", ERROR = error());
            }
        })
        .map_or(ExitCode::FAILURE, |success| match success {
            true => ExitCode::SUCCESS,
            false => ExitCode::FAILURE,
        })
}

/// Inner CLI logic
///
/// # Return
/// true indicates success. false indicates a failure which has already been reported.
fn cli_inner<I, T>(args: I) -> Result<bool>
where
    I: IntoIterator<Item = T>,
    T: Into<OsString> + Clone,
{
    configure_colours();
    let Some(args) = parse_args(args)? else {
        return Ok(true); // help/version shown; exit
    };
    let mode = MainMode::from(&args);

    // Now fold the arguments in with the CLI config (which may fail)
    let config_manager = Manager::try_from(&args)?;
    handle_mode(mode, &config_manager, args.client_params)
}

fn parse_args<I, T>(args: I) -> Result<Option<CliArgs>>
where
    I: IntoIterator<Item = T>,
    T: Into<OsString> + Clone,
{
    use clap::error::ErrorKind::{DisplayHelp, DisplayVersion};
    match CliArgs::custom_parse(args) {
        Ok(args) => Ok(Some(args)),
        Err(e) if matches!(e.kind(), DisplayHelp | DisplayVersion) => {
            let message = e.render();
            if use_colours() {
                println!("{}", message.ansi());
            } else {
                println!("{message}");
            }
            Ok(None)
        }
        Err(e) => Err(e.into()),
    }
}

// MODE HANDLERS ///////////////////////////////////////////////////////////

#[tokio::main]
async fn handle_mode(
    mode: MainMode,
    config_manager: &Manager,
    client_params: Parameters,
) -> Result<bool> {
    match mode {
        MainMode::ShowConfigFiles => {
            for f in Manager::config_files() {
                println!("{f}");
            }
            Ok(true)
        }
        MainMode::ShowConfig => {
            println!("{}", show_config_data(config_manager));
            let _ = final_config(config_manager)?;
            Ok(true)
        }
        MainMode::Server => run_server(config_manager, &client_params).await,
        MainMode::Client => run_client(config_manager, client_params).await,
    }
}

fn final_config(config_manager: &Manager) -> Result<Configuration> {
    config_manager.get::<Configuration>()?.validate()
}

fn show_config_data(config_manager: &Manager) -> String {
    format!(
        "Configuration:\n{}",
        config_manager.to_display_adapter::<Configuration>()
    )
}

async fn run_server(config_manager: &Manager, params: &Parameters) -> Result<bool> {
    let config = final_config(config_manager)?;
    setup_tracing(
        trace_level(params.debug, params.quiet),
        ConsoleTraceType::Standard,
        params.log_file.as_ref(),
        config.time_format,
    )?;
    let _span = error_span!("SERVER").entered();
    server_main(config).await.context("server failed")?;
    Ok(true)
}

async fn run_client(config_manager: &Manager, params: Parameters) -> Result<bool> {
    let config = final_config(config_manager)?;
    let progress =
        MultiProgress::with_draw_target(ProgressDrawTarget::stderr_with_hz(MAX_UPDATE_FPS));
    let console = if params.quiet {
        ConsoleTraceType::Standard
    } else {
        ConsoleTraceType::Indicatif(progress.clone())
    };
    setup_tracing(
        trace_level(params.debug, params.quiet),
        console,
        params.log_file.as_ref(),
        config.time_format,
    )?;
    // this mode may return false
    client_main(&config, progress, params).await
}

#[cfg(test)]
mod tests {
    use super::show_config_data;
    use crate::config::{Configuration_Optional, Manager};
    use assertables::assert_contains;

    #[test]
    fn show_config() {
        let mut mgr = Manager::without_files();
        mgr.merge_provider(Configuration_Optional {
            chunk_size: Some(8192),
            ..Default::default()
        });
        let s = show_config_data(&mgr);
        assert_contains!(s, "chunk_size");
        assert_contains!(s, "8192");
        assert_contains!(s, "command line");
    }

    #[test]
    fn help_is_not_an_error() {
        assert!(super::parse_args(["fxp", "--help"]).unwrap().is_none());
        assert!(super::parse_args(["fxp", "--version"]).unwrap().is_none());
    }

    #[test]
    fn bad_arguments_fail() {
        assert!(super::parse_args(["fxp", "--no-such-option"]).is_err());
        assert!(super::parse_args(["fxp", "host", "9000", "fetch"]).is_err());
    }

    #[test]
    fn final_config_is_validated() {
        let mut mgr = Manager::without_files();
        mgr.merge_provider(Configuration_Optional {
            chunk_size: Some(0),
            ..Default::default()
        });
        assert!(super::final_config(&mgr).is_err());
    }
}
