//! Log output setup
// (c) 2026 fxp authors

use std::fs::File;
use std::io::Write;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use anyhow::Context as _;
use indicatif::MultiProgress;
use serde::{de, Deserialize, Serialize};
use strum::VariantNames as _;
use tracing_subscriber::{
    fmt::{
        format::Writer,
        time::{ChronoLocal, ChronoUtc, FormatTime},
        MakeWriter,
    },
    prelude::*,
    EnvFilter, Layer, Registry,
};

use crate::cli::styles::maybe_strip_color;

static TRACING_INITIALIZED: AtomicBool = AtomicBool::new(false);

/// Filter for console output; also used for the log file unless [`FILE_FILTER_VAR`] is set
const CONSOLE_FILTER_VAR: &str = "RUST_LOG";
/// Filter for log file output
const FILE_FILTER_VAR: &str = "RUST_LOG_FILE_DETAIL";

type BoxedLayer = Box<dyn Layer<Registry> + Send + Sync>;

/// Computes the trace level from the verbosity switches
#[must_use]
pub fn trace_level(debug: bool, quiet: bool) -> &'static str {
    match (debug, quiet) {
        (true, _) => "debug",
        (false, true) => "error",
        (false, false) => "info",
    }
}

/// Selects the format of time stamps in output messages
#[derive(
    Copy,
    Clone,
    Debug,
    Default,
    Eq,
    PartialEq,
    strum::Display,
    strum::EnumString,
    strum::VariantNames,
    clap::ValueEnum,
    Serialize,
)]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
#[serde(rename_all = "kebab-case")]
pub enum TimeFormat {
    /// Local time, as "year-month-day HH:MM:SS"
    #[default]
    Local,
    /// UTC time, as "year-month-day HH:MM:SS"
    Utc,
    /// Local time, in the format described in [RFC 3339](https://datatracker.ietf.org/doc/html/rfc3339).
    Rfc3339,
}

impl<'de> Deserialize<'de> for TimeFormat {
    fn deserialize<D>(deserializer: D) -> std::result::Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        s.parse()
            .map_err(|_| de::Error::unknown_variant(&s, TimeFormat::VARIANTS))
    }
}

/// Timestamp writer for a [`TimeFormat`]
enum Timer {
    Local(ChronoLocal),
    Utc(ChronoUtc),
}

impl From<TimeFormat> for Timer {
    fn from(format: TimeFormat) -> Self {
        match format {
            TimeFormat::Local => Timer::Local(ChronoLocal::new("%Y-%m-%d %H:%M:%SL".into())),
            TimeFormat::Utc => Timer::Utc(ChronoUtc::new("%Y-%m-%d %H:%M:%SZ".into())),
            TimeFormat::Rfc3339 => Timer::Local(ChronoLocal::rfc_3339()),
        }
    }
}

impl FormatTime for Timer {
    fn format_time(&self, w: &mut Writer<'_>) -> std::fmt::Result {
        match self {
            Timer::Local(t) => t.format_time(w),
            Timer::Utc(t) => t.format_time(w),
        }
    }
}

/// Reads a filter from `var`, falling back to our own events at `trace_level`.
///
/// # Returns
/// The filter, and whether it came from the environment.
fn filter_from(var: &str, trace_level: &str) -> anyhow::Result<(EnvFilter, bool)> {
    match std::env::var(var) {
        Ok(directives) => {
            let filter = EnvFilter::try_new(&directives)
                .with_context(|| format!("{var} (set in environment) was not understood"))?;
            Ok((filter, true))
        }
        Err(_) => Ok((EnvFilter::try_new(format!("fxp={trace_level}"))?, false)),
    }
}

fn layer_for<W>(
    writer: W,
    filter: (EnvFilter, bool),
    time_format: TimeFormat,
    ansi: bool,
) -> BoxedLayer
where
    W: for<'writer> MakeWriter<'writer> + Send + Sync + 'static,
{
    let (filter, from_env) = filter;
    tracing_subscriber::fmt::layer()
        .compact()
        // Other crates only log when the user asked for them, so name the source then
        .with_target(from_env)
        .with_ansi(ansi)
        .with_timer(Timer::from(time_format))
        .with_writer(writer)
        .with_filter(filter)
        .boxed()
}

/// Where console trace output goes
#[derive(Debug)]
pub enum ConsoleTraceType {
    /// Trace directly to stderr
    Standard,
    /// Trace via Indicatif, so progress bars are not disturbed
    Indicatif(MultiProgress),
}

/// Sets up tracing to the console, and optionally to a file.
///
/// By default we log only our own events, at the given trace level.
/// `RUST_LOG` overrides this; `RUST_LOG_FILE_DETAIL` overrides it for the log file alone.
///
/// This only takes effect once per process; later calls are ignored.
/// If it fails, tracing is not set up, so the caller must report the error some other way.
pub fn setup(
    trace_level: &str,
    display: ConsoleTraceType,
    log_file: Option<&String>,
    time_format: TimeFormat,
) -> anyhow::Result<()> {
    if TRACING_INITIALIZED.swap(true, Ordering::Relaxed) {
        tracing::warn!("tracing::setup called a second time (ignoring)");
        return Ok(());
    }
    let layers = build_layers(
        trace_level,
        display,
        log_file,
        time_format,
        crate::cli::styles::use_colours(),
    )
    .inspect_err(|_| TRACING_INITIALIZED.store(false, Ordering::Relaxed))?;
    tracing_subscriber::registry().with(layers).init();
    Ok(())
}

fn build_layers(
    trace_level: &str,
    display: ConsoleTraceType,
    log_file: Option<&String>,
    time_format: TimeFormat,
    ansi: bool,
) -> anyhow::Result<Vec<BoxedLayer>> {
    let console_filter = filter_from(CONSOLE_FILTER_VAR, trace_level)?;
    let mut layers = vec![match display {
        ConsoleTraceType::Standard => layer_for(std::io::stderr, console_filter, time_format, ansi),
        ConsoleTraceType::Indicatif(mp) => {
            layer_for(ProgressWriter::wrap(mp), console_filter, time_format, ansi)
        }
    }];

    if let Some(filename) = log_file {
        let file = File::create(filename)
            .with_context(|| format!("failed to open log file {filename}"))?;
        let filter = if std::env::var(FILE_FILTER_VAR).is_ok() {
            filter_from(FILE_FILTER_VAR, trace_level)?
        } else {
            filter_from(CONSOLE_FILTER_VAR, trace_level)?
        };
        layers.push(layer_for(Arc::new(file), filter, time_format, false));
    }
    Ok(layers)
}

/// Returns whether tracing has been initialized
#[must_use]
pub fn is_initialized() -> bool {
    TRACING_INITIALIZED.load(Ordering::Relaxed)
}

/// Routes log lines through a [`MultiProgress`] so they do not tear its progress bars
struct ProgressWriter(MultiProgress);

impl ProgressWriter {
    fn wrap(display: MultiProgress) -> Mutex<Self> {
        Mutex::new(Self(display))
    }
}

impl Write for ProgressWriter {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        let line = String::from_utf8_lossy(buf);
        let line = maybe_strip_color(&line);
        // println on a hidden MultiProgress is a no-op
        if self.0.is_hidden() {
            eprint!("{line}");
        } else {
            self.0.println(line.trim_end())?;
        }
        Ok(buf.len())
    }

    fn flush(&mut self) -> std::io::Result<()> {
        Ok(())
    }
}
