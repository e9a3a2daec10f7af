//! Layered application settings.
//!
//! Settings are merged with figment, later layers winning:
//!
//! 1. built-in defaults
//! 2. TOML file: `--config PATH`, else `config.toml` in the platform config dir
//! 3. environment variables prefixed `DUPFIND_` (e.g. `DUPFIND_IO_THREADS=8`)
//! 4. command-line flags
//!
//! ```toml
//! io_threads = 8
//! prehash = true
//! skip_hidden = true
//! min_size = 1
//! ignore_patterns = ["*.tmp", "node_modules/"]
//! ```

use std::path::{Path, PathBuf};

use directories::ProjectDirs;
use figment::providers::{Env, Format, Serialized, Toml};
use figment::Figment;
use serde::{Deserialize, Serialize};

use crate::cli::Cli;
use crate::duplicates::FinderConfig;
use crate::scanner::WalkerConfig;

/// Prefix of environment variables read into [`Settings`].
pub const ENV_PREFIX: &str = "DUPFIND_";

/// Name of the config file inside the platform config directory.
pub const CONFIG_FILE_NAME: &str = "config.toml";

/// Errors raised while loading settings.
#[derive(thiserror::Error, Debug)]
pub enum ConfigError {
    /// An explicitly requested config file does not exist.
    #[error("Config file not found: {0}")]
    NotFound(PathBuf),

    /// A layer could not be parsed or has a value of the wrong type.
    #[error("Invalid configuration: {0}")]
    Invalid(#[from] Box<figment::Error>),

    /// `min_size` is larger than `max_size`.
    #[error("min_size ({min}) is larger than max_size ({max})")]
    InvalidSizeRange {
        /// Configured minimum
        min: u64,
        /// Configured maximum
        max: u64,
    },

    /// Settings could not be rendered as TOML.
    #[error("Failed to serialize configuration: {0}")]
    Serialize(#[from] toml::ser::Error),
}

/// Effective settings for one run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Threads used to compare size buckets in parallel
    pub io_threads: usize,
    /// Run the prehash stage before byte comparison
    pub prehash: bool,
    /// Follow symbolic links while walking
    pub follow_symlinks: bool,
    /// Skip hidden files and directories
    pub skip_hidden: bool,
    /// Ignore files smaller than this many bytes
    pub min_size: Option<u64>,
    /// Ignore files larger than this many bytes
    pub max_size: Option<u64>,
    /// Gitignore-style patterns to skip
    pub ignore_patterns: Vec<String>,
    /// Fail on the first unreadable entry
    pub strict: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            io_threads: 4,
            prehash: true,
            follow_symlinks: false,
            skip_hidden: false,
            min_size: None,
            max_size: None,
            ignore_patterns: Vec::new(),
            strict: false,
        }
    }
}

impl Settings {
    /// Load defaults, the config file and the environment.
    ///
    /// `explicit` must exist when given; the platform default file is optional.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] if a layer is malformed or the size range is empty.
    pub fn load(explicit: Option<&Path>) -> Result<Self, ConfigError> {
        Self::load_with_env(explicit, ENV_PREFIX)
    }

    /// Like [`Settings::load`] with a custom environment prefix.
    ///
    /// # Errors
    ///
    /// See [`Settings::load`].
    pub fn load_with_env(explicit: Option<&Path>, env_prefix: &str) -> Result<Self, ConfigError> {
        let file = match explicit {
            Some(path) if !path.is_file() => return Err(ConfigError::NotFound(path.to_path_buf())),
            Some(path) => Some(path.to_path_buf()),
            None => default_config_path(),
        };

        let mut figment = Figment::from(Serialized::defaults(Settings::default()));
        if let Some(ref path) = file {
            log::debug!("Reading configuration from {}", path.display());
            figment = figment.merge(Toml::file(path));
        }
        figment = figment.merge(Env::prefixed(env_prefix));

        let settings: Settings = figment.extract().map_err(Box::new)?;
        settings.validate()?;
        Ok(settings)
    }

    /// Apply command-line flags on top of the loaded settings.
    ///
    /// Boolean flags can only switch a setting on (or, for `--no-prehash`,
    /// off); absent flags leave the lower layers untouched.
    #[must_use]
    pub fn with_cli_overrides(mut self, cli: &Cli) -> Self {
        if let Some(threads) = cli.io_threads {
            self.io_threads = threads;
        }
        if cli.no_prehash {
            self.prehash = false;
        }
        self.follow_symlinks |= cli.follow_symlinks;
        self.skip_hidden |= cli.skip_hidden;
        self.strict |= cli.strict;
        if cli.min_size.is_some() {
            self.min_size = cli.min_size;
        }
        if cli.max_size.is_some() {
            self.max_size = cli.max_size;
        }
        self.ignore_patterns
            .extend(cli.ignore_patterns.iter().cloned());
        self
    }

    /// Check cross-field constraints.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidSizeRange`] if `min_size > max_size`.
    pub fn validate(&self) -> Result<(), ConfigError> {
        match (self.min_size, self.max_size) {
            (Some(min), Some(max)) if min > max => Err(ConfigError::InvalidSizeRange { min, max }),
            _ => Ok(()),
        }
    }

    /// Render the settings as a TOML document.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Serialize`] if rendering fails.
    pub fn to_toml(&self) -> Result<String, ConfigError> {
        Ok(toml::to_string_pretty(self)?)
    }

    /// Walker options derived from these settings.
    #[must_use]
    pub fn walker_config(&self) -> WalkerConfig {
        WalkerConfig {
            follow_symlinks: self.follow_symlinks,
            skip_hidden: self.skip_hidden,
            min_size: self.min_size,
            max_size: self.max_size,
            ignore_patterns: self.ignore_patterns.clone(),
        }
    }

    /// Finder options derived from these settings.
    #[must_use]
    pub fn finder_config(&self) -> FinderConfig {
        FinderConfig::default()
            .with_io_threads(self.io_threads)
            .with_prehash(self.prehash)
            .with_strict(self.strict)
            .with_walker_config(self.walker_config())
    }
}

/// Platform-specific location of the config file, if one can be determined.
#[must_use]
pub fn default_config_path() -> Option<PathBuf> {
    ProjectDirs::from("com", "dupfind", "dupfind")
        .map(|dirs| dirs.config_dir().join(CONFIG_FILE_NAME))
}
