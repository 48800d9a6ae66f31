//! Configuration structure
// (c) 2026 fxp authors

use std::path::PathBuf;
use std::sync::LazyLock;
use std::time::Duration;

use anyhow::Result;
use figment::{providers::Serialized, Metadata, Provider};
use human_repr::HumanDuration as _;
use serde::{Deserialize, Serialize};
use struct_field_names_as_array::FieldNamesAsSlice;

use crate::util::{timeout_from_secs, TimeFormat, DEFAULT_CHUNK_SIZE};

/// Default port the server listens on
pub const DEFAULT_PORT: u16 = 9000;

/// Largest permitted transfer chunk, in bytes. Each transfer allocates a buffer of this size.
pub const MAX_CHUNK_SIZE: usize = 16 * 1024 * 1024;

/// Default maximum length of a file name, in bytes
pub const DEFAULT_MAX_FILENAME_LENGTH: usize = 255;

/// The set of configurable options supported by fxp.
///
/// In configuration files, field names are given in snake case (`chunk_size`).
/// As environment variables they are prefixed `FXP_` (`FXP_CHUNK_SIZE`).
/// On the command line they are kebab case (`--chunk-size`).
///
/// There is no `default()`; the hard-wired defaults are [`Configuration::system_default()`].
///
/// [More details about the configuration mechanism](crate::config).
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize, FieldNamesAsSlice)]
pub struct Configuration {
    /// The port the server listens on
    pub port: u16,

    /// The directory the server serves files from and saves uploads to
    pub directory: PathBuf,

    /// The longest file name (in bytes) the server will accept
    pub max_filename_length: usize,

    /// The size of a single read or write during payload transfer, in bytes (at most 16 MiB)
    pub chunk_size: usize,

    /// How long to wait for the peer on any single read, in seconds. 0 means wait forever.
    pub timeout: u64,

    /// The format of timestamps in log messages
    pub time_format: TimeFormat,
}

static SYSTEM_DEFAULT_CONFIG: LazyLock<Configuration> = LazyLock::new(|| Configuration {
    port: DEFAULT_PORT,
    directory: PathBuf::from("."),
    max_filename_length: DEFAULT_MAX_FILENAME_LENGTH,
    chunk_size: DEFAULT_CHUNK_SIZE,
    timeout: 0,
    time_format: TimeFormat::Local,
});

impl Configuration {
    /// Hard-wired configuration defaults
    #[must_use]
    pub fn system_default() -> &'static Self {
        &SYSTEM_DEFAULT_CONFIG
    }

    /// Per-read time limit, if any
    #[must_use]
    pub fn read_timeout(&self) -> Option<Duration> {
        timeout_from_secs(self.timeout)
    }

    /// Checks the configuration for values which cannot work
    pub fn validate(self) -> Result<Self> {
        if self.chunk_size == 0 {
            anyhow::bail!("chunk_size must be at least 1");
        }
        if self.chunk_size > MAX_CHUNK_SIZE {
            anyhow::bail!("chunk_size must be at most {MAX_CHUNK_SIZE}");
        }
        if self.max_filename_length == 0 {
            anyhow::bail!("max_filename_length must be at least 1");
        }
        if let Some(t) = self.read_timeout() {
            tracing::debug!("read timeout is {}", t.human_duration());
        }
        Ok(self)
    }
}

/// The same fields as [`Configuration`], all optional.
///
/// This is what the command line produces. Wherever the user does not provide a value,
/// values read from lower priority sources (environment, configuration files, system defaults) obtain.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, clap::Args)]
#[allow(non_camel_case_types)]
pub struct Configuration_Optional {
    /// The port the server listens on [default: 9000]
    #[arg(short, long, help_heading("Server"), value_name("PORT"))]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub port: Option<u16>,

    /// The directory to serve files from [default: .]
    #[arg(short('C'), long, help_heading("Server"), value_name("DIR"))]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub directory: Option<PathBuf>,

    /// The longest file name (in bytes) the server will accept [default: 255]
    #[arg(long, help_heading("Server"), value_name("BYTES"))]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_filename_length: Option<usize>,

    /// Size of a single read or write during payload transfer [default: 1024]
    #[arg(long, help_heading("Tuning"), value_name("BYTES"))]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub chunk_size: Option<usize>,

    /// How long to wait for the peer on any single read, in seconds; 0 waits forever [default: 0]
    #[arg(long, help_heading("Tuning"), value_name("SECONDS"))]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timeout: Option<u64>,

    /// Specifies the time format to use when printing messages [default: local]
    #[arg(short = 'T', long, value_name("FORMAT"), help_heading("Output"))]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub time_format: Option<TimeFormat>,
}

impl Configuration_Optional {
    const META_NAME: &str = "command line";
}

impl Provider for Configuration_Optional {
    fn metadata(&self) -> Metadata {
        Metadata::named(Self::META_NAME)
    }

    fn data(
        &self,
    ) -> std::result::Result<
        figment::value::Map<figment::Profile, figment::value::Dict>,
        figment::Error,
    > {
        Serialized::defaults(self).data()
    }
}
