//! Configuration file wrangling
// (c) 2026 fxp authors

use super::{errors::ConfigFileError, SystemDefault, BASE_CONFIG_FILENAME, CONFIG_DIR_NAME};

use figment::{
    providers::{Env, Format as _, Toml},
    Figment, Provider,
};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// Environment variable prefix for configuration settings
pub(crate) const ENV_PREFIX: &str = "FXP_";

/// Processes and merges all possible configuration sources.
///
/// Configuration file locations are platform-dependent.
/// To see what applies on the current platform, run `fxp --config-files`.
#[derive(Debug)]
pub struct Manager {
    /// Configuration data
    pub(super) data: Figment,
}

impl Manager {
    fn new(apply_config_files: bool, apply_env: bool) -> Self {
        let mut new1 = Self {
            data: Figment::new(),
        };
        if apply_config_files {
            // N.B. This may leave data in a fused-error state, if a config file isn't parseable.
            new1.add_config("user", user_config_path().as_deref());
            new1.add_config("working directory", Some(&local_config_path()));
        }
        if apply_env {
            new1.merge_provider(Env::prefixed(ENV_PREFIX));
        }
        new1
    }

    /// General constructor for production use
    ///
    /// Initialises this structure, reading the config files appropriate to the platform,
    /// the current user and the working directory, then the environment.
    #[must_use]
    pub fn standard() -> Self {
        let mut new1 = Self::new(true, true);
        new1.apply_system_default();
        new1
    }

    /// Testing/internal constructor, does not read files or apply environment; DOES apply system default.
    #[must_use]
    pub fn without_files() -> Self {
        let mut new1 = Self::new(false, false);
        new1.apply_system_default();
        new1
    }

    /// Testing constructor, does not read files, apply environment, or apply system default
    #[cfg(test)]
    #[must_use]
    pub(crate) fn without_default() -> Self {
        Self::new(false, false)
    }

    fn add_config(&mut self, what: &str, path: Option<&Path>) {
        let Some(path) = path else {
            warn!("could not determine {what} configuration file path");
            return;
        };
        if !path.exists() {
            debug!("{what} configuration file {path:?} not present");
            return;
        }
        self.merge_toml_file(path);
    }

    /// Returns the list of configuration files we would read, lowest priority first.
    #[must_use]
    pub fn config_files() -> Vec<String> {
        user_config_path()
            .into_iter()
            .chain(std::iter::once(local_config_path()))
            .map(|p| p.as_os_str().to_string_lossy().to_string())
            .collect()
    }

    /// Merges in a data set, which is some sort of [figment::Provider](https://docs.rs/figment/latest/figment/trait.Provider.html).
    /// This uses figment's `merge` operation, which prefers to _replace_ existing items.
    pub fn merge_provider<T>(&mut self, provider: T)
    where
        T: Provider,
    {
        let f = std::mem::take(&mut self.data);
        self.data = f.merge(provider); // in the error case, this leaves the provider in a fused state
    }

    /// Merges in a TOML configuration file
    pub fn merge_toml_file<F>(&mut self, file: F)
    where
        F: AsRef<Path>,
    {
        self.merge_provider(Toml::file_exact(file.as_ref()));
    }

    /// Applies the system default settings, at a lower priority than everything else
    pub fn apply_system_default(&mut self) {
        let f = std::mem::take(&mut self.data);
        self.data = f.join(SystemDefault {});
    }

    /// Attempts to extract a particular struct from the data.
    ///
    /// Within fxp, `T` is usually [`Configuration`](super::Configuration), but it isn't intrinsically required to be.
    pub fn get<'de, T>(&self) -> Result<T, ConfigFileError>
    where
        T: Deserialize<'de>,
    {
        self.data.extract_lossy::<T>().map_err(ConfigFileError::from)
    }
}

fn user_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join(CONFIG_DIR_NAME).join(BASE_CONFIG_FILENAME))
}

fn local_config_path() -> PathBuf {
    PathBuf::from(BASE_CONFIG_FILENAME)
}
