use config::{Config as ConfigBuilder, ConfigError, File};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::num::NonZeroUsize;
use std::path::{Path, PathBuf};

use crate::filters::FileKind;

/// Engine configuration shared by every search a [`Scout`](crate::Scout) runs.
///
/// # Configuration Locations
///
/// The configuration can be loaded from multiple locations in order of precedence:
/// 1. Custom config file specified via `--config` flag
/// 2. Local `.officescout.yaml` in the current directory
/// 3. Global `$HOME/.config/officescout/config.yaml`
///
/// # Configuration Format
///
/// ```yaml
/// # Simultaneous file operations during the process pass
/// concurrency: 5
///
/// # Entries kept per content cache (workbooks and document text)
/// cache_capacity: 1000
///
/// # Document kinds searched by default
/// file_types: ["excel", "word"]
///
/// case_sensitive: false
/// cache_enabled: true
///
/// # Drop legacy .doc match windows that look like field codes or markup
/// markup_filter: true
///
/// # Log level (trace, debug, info, warn, error)
/// log_level: "warn"
/// ```
///
/// Command-line flags take precedence over file values, see [`ScoutConfig::merge_with_cli`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScoutConfig {
    /// Number of worker threads used by the process pass
    #[serde(default = "default_concurrency")]
    pub concurrency: NonZeroUsize,

    /// Maximum entries per content cache
    #[serde(default = "default_cache_capacity")]
    pub cache_capacity: NonZeroUsize,

    /// Document kinds included when the caller does not say otherwise
    #[serde(default = "default_file_types")]
    pub file_types: BTreeSet<FileKind>,

    #[serde(default)]
    pub case_sensitive: bool,

    #[serde(default = "default_true")]
    pub cache_enabled: bool,

    /// Whether legacy Word match windows pass through the markup policy
    #[serde(default = "default_true")]
    pub markup_filter: bool,

    /// Log level (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

pub const DEFAULT_CONCURRENCY: usize = 5;
pub const DEFAULT_CACHE_CAPACITY: usize = 1000;

fn default_concurrency() -> NonZeroUsize {
    NonZeroUsize::new(DEFAULT_CONCURRENCY).unwrap_or(NonZeroUsize::MIN)
}

fn default_cache_capacity() -> NonZeroUsize {
    NonZeroUsize::new(DEFAULT_CACHE_CAPACITY).unwrap_or(NonZeroUsize::MIN)
}

fn default_file_types() -> BTreeSet<FileKind> {
    FileKind::ALL.into_iter().collect()
}

fn default_true() -> bool {
    true
}

fn default_log_level() -> String {
    "warn".to_string()
}

impl Default for ScoutConfig {
    fn default() -> Self {
        Self {
            concurrency: default_concurrency(),
            cache_capacity: default_cache_capacity(),
            file_types: default_file_types(),
            case_sensitive: false,
            cache_enabled: true,
            markup_filter: true,
            log_level: default_log_level(),
        }
    }
}

/// Values given on the command line; `None` leaves the file value alone
#[derive(Debug, Clone, Default)]
pub struct ConfigOverrides {
    pub concurrency: Option<NonZeroUsize>,
    pub cache_capacity: Option<NonZeroUsize>,
    pub file_types: Option<BTreeSet<FileKind>>,
    pub case_sensitive: Option<bool>,
    pub cache_enabled: Option<bool>,
    pub markup_filter: Option<bool>,
    pub log_level: Option<String>,
}

impl ScoutConfig {
    /// Loads configuration from the default locations plus an explicit file.
    ///
    /// The explicit file must exist; the default locations are optional.
    pub fn load_from(config_path: Option<&Path>) -> Result<Self, ConfigError> {
        let mut builder = ConfigBuilder::builder();

        let defaults = [
            dirs::config_dir().map(|p| p.join("officescout/config.yaml")),
            Some(PathBuf::from(".officescout.yaml")),
        ];
        for path in defaults.iter().flatten() {
            if path.exists() {
                builder = builder.add_source(File::from(path.as_path()));
            }
        }

        if let Some(path) = config_path {
            builder = builder.add_source(File::from(path).required(true));
        }

        builder.build()?.try_deserialize()
    }

    /// Merges CLI arguments with configuration file values
    pub fn merge_with_cli(mut self, cli: ConfigOverrides) -> Self {
        if let Some(concurrency) = cli.concurrency {
            self.concurrency = concurrency;
        }
        if let Some(capacity) = cli.cache_capacity {
            self.cache_capacity = capacity;
        }
        if let Some(file_types) = cli.file_types {
            self.file_types = file_types;
        }
        if let Some(case_sensitive) = cli.case_sensitive {
            self.case_sensitive = case_sensitive;
        }
        if let Some(cache_enabled) = cli.cache_enabled {
            self.cache_enabled = cache_enabled;
        }
        if let Some(markup_filter) = cli.markup_filter {
            self.markup_filter = markup_filter;
        }
        if let Some(log_level) = cli.log_level {
            self.log_level = log_level;
        }
        self
    }
}

/// Parameters of a single search run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchOptions {
    pub root_directory: PathBuf,
    /// Trimmed, non-empty keywords in the order the user gave them
    pub keywords: Vec<String>,
    pub case_sensitive: bool,
    pub file_types: BTreeSet<FileKind>,
    pub cache_enabled: bool,
}

impl SearchOptions {
    /// Creates options for `root` with keywords parsed from a comma-separated list
    pub fn new(root_directory: impl Into<PathBuf>, keywords: &str) -> Self {
        Self {
            root_directory: root_directory.into(),
            keywords: Self::parse_keywords(keywords),
            case_sensitive: false,
            file_types: default_file_types(),
            cache_enabled: true,
        }
    }

    /// Options seeded from the engine configuration defaults
    pub fn from_config(
        config: &ScoutConfig,
        root_directory: impl Into<PathBuf>,
        keywords: &str,
    ) -> Self {
        Self {
            root_directory: root_directory.into(),
            keywords: Self::parse_keywords(keywords),
            case_sensitive: config.case_sensitive,
            file_types: config.file_types.clone(),
            cache_enabled: config.cache_enabled,
        }
    }

    /// Splits on commas, trims, and drops empty entries
    pub fn parse_keywords(input: &str) -> Vec<String> {
        input
            .split(',')
            .map(str::trim)
            .filter(|k| !k.is_empty())
            .map(str::to_string)
            .collect()
    }

    pub fn case_sensitive(mut self, yes: bool) -> Self {
        self.case_sensitive = yes;
        self
    }

    pub fn file_types(mut self, kinds: impl IntoIterator<Item = FileKind>) -> Self {
        self.file_types = kinds.into_iter().collect();
        self
    }

    pub fn cache_enabled(mut self, yes: bool) -> Self {
        self.cache_enabled = yes;
        self
    }

    pub fn includes(&self, kind: FileKind) -> bool {
        self.file_types.contains(&kind)
    }
}
