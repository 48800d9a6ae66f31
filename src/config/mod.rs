// (c) 2026 fxp authors
//! # 📖 Configuration management
//!
//! fxp obtains run-time configuration from the following sources, lowest priority first:
//! 1. Hard-wired defaults
//! 2. The user's configuration file
//!    * On Linux, this is `~/.config/fxp/fxp.toml`
//!    * On macOS, this is `~/Library/Application Support/fxp/fxp.toml`
//!    * On Windows, this is `%AppData%\Roaming\fxp\fxp.toml`
//! 3. `fxp.toml` in the current working directory
//! 4. Environment variables prefixed `FXP_`, for example `FXP_PORT=9100`
//! 5. Command-line options
//!
//! Each option may appear in multiple places; the highest priority source wins.
//!
//! Run `fxp --config-files` for a list of which files we read,
//! and `fxp --show-config` to see the merged result and where each value came from.
//!
//! ## File format
//!
//! Configuration files are [TOML](https://toml.io/). The supported fields are those of [Configuration].
//!
//! ## Example
//!
//! ```toml
//! # Serve from a dedicated directory on a non-default port
//! port = 9100
//! directory = "/srv/exchange"
//! # Give up on peers that go quiet for a minute
//! timeout = 60
//! time_format = "utc"
//! ```

mod structure;
pub use structure::{
    Configuration, Configuration_Optional, DEFAULT_MAX_FILENAME_LENGTH, DEFAULT_PORT,
    MAX_CHUNK_SIZE,
};

mod sysdefault;
use sysdefault::SystemDefault;

mod errors;
pub use errors::ConfigFileError;

mod manager;
pub use manager::Manager;

mod prettyprint;
pub use prettyprint::DisplayAdapter;

pub(crate) const BASE_CONFIG_FILENAME: &str = "fxp.toml";
pub(crate) const CONFIG_DIR_NAME: &str = "fxp";
