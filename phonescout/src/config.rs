use config::{Config as ConfigBuilder, ConfigError, File};
use serde::{Deserialize, Serialize};
use std::num::NonZeroUsize;
use std::path::{Path, PathBuf};

use crate::errors::{ExtractError, ExtractResult};
use crate::extract::chunker::{DEFAULT_BLOCK_SIZE, MAX_BLOCK_SIZE};

/// What to do when a worker fails on a block
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ErrorPolicy {
    /// Cancel pending work and fail the run
    #[default]
    Abort,
    /// Log a warning, count the block as skipped, and keep going
    Skip,
}

/// How the result set is serialized
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// One number per line
    #[default]
    Lines,
    /// A JSON array of strings
    Json,
}

impl std::str::FromStr for OutputFormat {
    type Err = ExtractError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "lines" => Ok(Self::Lines),
            "json" => Ok(Self::Json),
            other => Err(ExtractError::config_error(format!(
                "Unknown output format: {other}"
            ))),
        }
    }
}

/// Configuration for an extraction run.
///
/// # Configuration Locations
///
/// Values are layered from, in increasing precedence:
/// 1. Global `$CONFIG_DIR/phonescout/config.yaml`
/// 2. Local `.phonescout.yaml` in the current directory
/// 3. A config file passed with `--config`
///
/// Command-line flags are applied last through [`ExtractConfig::merge_with_cli`].
///
/// # Configuration Format
///
/// ```yaml
/// # Worker threads (default: CPU cores)
/// worker_count: 4
///
/// # Target block size in bytes (default: 4 MiB)
/// block_size: 4194304
///
/// # abort | skip
/// error_policy: "abort"
///
/// # lines | json
/// output_format: "lines"
///
/// # Log level (trace, debug, info, warn, error)
/// log_level: "info"
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExtractConfig {
    /// Text file to scan
    #[serde(default)]
    pub input_path: PathBuf,

    /// Where to write results; standard output when absent
    #[serde(default)]
    pub output_path: Option<PathBuf>,

    /// Number of worker threads
    /// Defaults to number of CPU cores if not specified
    #[serde(default = "default_worker_count")]
    pub worker_count: NonZeroUsize,

    /// Target size of a block in bytes
    #[serde(default = "default_block_size")]
    pub block_size: usize,

    #[serde(default)]
    pub error_policy: ErrorPolicy,

    #[serde(default)]
    pub output_format: OutputFormat,

    /// Only report counts, do not emit the numbers
    #[serde(default)]
    pub stats_only: bool,

    /// Draw a progress bar on stderr while reading
    #[serde(default)]
    pub show_progress: bool,

    /// Log level (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

fn default_worker_count() -> NonZeroUsize {
    NonZeroUsize::new(num_cpus::get()).unwrap_or(NonZeroUsize::MIN)
}

fn default_block_size() -> usize {
    DEFAULT_BLOCK_SIZE
}

fn default_log_level() -> String {
    "warn".to_string()
}

impl Default for ExtractConfig {
    fn default() -> Self {
        Self {
            input_path: PathBuf::new(),
            output_path: None,
            worker_count: default_worker_count(),
            block_size: default_block_size(),
            error_policy: ErrorPolicy::default(),
            output_format: OutputFormat::default(),
            stats_only: false,
            show_progress: false,
            log_level: default_log_level(),
        }
    }
}

/// Values given on the command line; `None` leaves the file value in place
#[derive(Debug, Clone, Default)]
pub struct ConfigOverrides {
    pub input_path: Option<PathBuf>,
    pub output_path: Option<PathBuf>,
    pub worker_count: Option<NonZeroUsize>,
    pub block_size: Option<usize>,
    pub error_policy: Option<ErrorPolicy>,
    pub output_format: Option<OutputFormat>,
    pub stats_only: bool,
    pub show_progress: bool,
    pub log_level: Option<String>,
}

impl ExtractConfig {
    /// Creates a default configuration for `input_path`
    pub fn new(input_path: impl Into<PathBuf>) -> Self {
        Self {
            input_path: input_path.into(),
            ..Self::default()
        }
    }

    /// Loads configuration from the default locations
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_from(None)
    }

    /// Loads configuration, layering `config_path` over the default locations
    pub fn load_from(config_path: Option<&Path>) -> Result<Self, ConfigError> {
        let mut builder = ConfigBuilder::builder();

        let default_files = [
            dirs::config_dir().map(|p| p.join("phonescout/config.yaml")),
            Some(PathBuf::from(".phonescout.yaml")),
        ];

        for path in default_files.iter().flatten() {
            if path.exists() {
                builder = builder.add_source(File::from(path.as_path()));
            }
        }

        // An explicitly requested file must exist
        if let Some(path) = config_path {
            builder = builder.add_source(File::from(path).required(true));
        }

        builder.build()?.try_deserialize()
    }

    /// Merges CLI arguments with configuration file values
    pub fn merge_with_cli(mut self, cli: ConfigOverrides) -> Self {
        // CLI values take precedence over config file values
        if let Some(input_path) = cli.input_path {
            self.input_path = input_path;
        }
        if cli.output_path.is_some() {
            self.output_path = cli.output_path;
        }
        if let Some(worker_count) = cli.worker_count {
            self.worker_count = worker_count;
        }
        if let Some(block_size) = cli.block_size {
            self.block_size = block_size;
        }
        if let Some(policy) = cli.error_policy {
            self.error_policy = policy;
        }
        if let Some(format) = cli.output_format {
            self.output_format = format;
        }
        if cli.stats_only {
            self.stats_only = true;
        }
        if cli.show_progress {
            self.show_progress = true;
        }
        if let Some(level) = cli.log_level {
            self.log_level = level;
        }
        self
    }

    /// Rejects settings the pipeline cannot run with
    pub fn validate(&self) -> ExtractResult<()> {
        if self.input_path.as_os_str().is_empty() {
            return Err(ExtractError::config_error("input path is required"));
        }
        if self.block_size == 0 {
            return Err(ExtractError::config_error(
                "block_size must be greater than zero",
            ));
        }
        if self.block_size > MAX_BLOCK_SIZE {
            return Err(ExtractError::config_error(format!(
                "block_size must not exceed {MAX_BLOCK_SIZE} bytes"
            )));
        }
        Ok(())
    }
}
