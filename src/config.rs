//! Configuration for the chunked transform-and-load pipeline.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::thread;

/// Main configuration for a pipeline run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Input configuration
    pub input: InputConfig,

    /// Output configuration
    pub output: OutputConfig,

    /// Processing configuration
    #[serde(default)]
    pub processing: ProcessingConfig,
}

/// Input data configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InputConfig {
    /// Path to the delimited-record source file
    pub source: PathBuf,

    /// Path to the schema template database (exactly one table)
    pub template: PathBuf,

    /// Whether the source's first record is a header naming the fields
    #[serde(default = "default_true")]
    pub has_header: bool,
}

/// Output configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OutputConfig {
    /// Directory for chunk files, per-chunk stores and the final store.
    /// Created if absent.
    pub dir: PathBuf,
}

impl OutputConfig {
    /// Path of the final consolidated store.
    pub fn final_store_path(&self) -> PathBuf {
        self.dir.join("output.db")
    }
}

/// Processing configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProcessingConfig {
    /// Maximum data rows per chunk
    #[serde(default = "default_max_rows")]
    pub max_rows: u64,

    /// Number of concurrent chunk workers (default: available parallelism)
    #[serde(default = "default_concurrency")]
    pub concurrency: usize,

    /// Number of Tokio worker threads (default: num CPUs)
    #[serde(default)]
    pub worker_threads: Option<usize>,
}

impl Default for ProcessingConfig {
    fn default() -> Self {
        Self {
            max_rows: default_max_rows(),
            concurrency: default_concurrency(),
            worker_threads: None,
        }
    }
}

impl Config {
    /// Load configuration from a YAML or JSON file.
    /// Format is auto-detected from file extension (.yaml, .yml, or .json).
    pub fn from_file(path: &PathBuf) -> anyhow::Result<Self> {
        let contents = std::fs::read_to_string(path)?;
        let ext = path.extension().and_then(|e| e.to_str()).unwrap_or("");

        let config: Config = match ext {
            "yaml" | "yml" => serde_yaml::from_str(&contents)?,
            "json" => serde_json::from_str(&contents)?,
            _ => {
                // Try YAML first (it's a superset of JSON)
                serde_yaml::from_str(&contents)?
            }
        };
        Ok(config)
    }

    /// Load configuration from a YAML string.
    pub fn from_yaml(yaml: &str) -> anyhow::Result<Self> {
        let config: Config = serde_yaml::from_str(yaml)?;
        Ok(config)
    }

    /// Serialize configuration to YAML.
    pub fn to_yaml(&self) -> anyhow::Result<String> {
        Ok(serde_yaml::to_string(self)?)
    }

    /// Validate the configuration.
    ///
    /// Existence of the source and template files is checked by the driver
    /// at run time; this validates the values themselves.
    pub fn validate(&self) -> anyhow::Result<()> {
        if self.processing.max_rows == 0 {
            anyhow::bail!("max_rows must be > 0");
        }
        if self.processing.concurrency == 0 {
            anyhow::bail!("concurrency must be > 0");
        }
        if self.input.source.as_os_str().is_empty() {
            anyhow::bail!("input.source must be set");
        }
        if self.input.template.as_os_str().is_empty() {
            anyhow::bail!("input.template must be set");
        }
        if self.output.dir.as_os_str().is_empty() {
            anyhow::bail!("output.dir must be set");
        }
        Ok(())
    }
}

// Default value functions for serde
fn default_true() -> bool {
    true
}
fn default_max_rows() -> u64 {
    100_000
}
fn default_concurrency() -> usize {
    thread::available_parallelism().map(|n| n.get()).unwrap_or(1)
}
