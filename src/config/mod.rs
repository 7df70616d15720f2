//! Configuration management.
//!
//! Settings come from an optional TOML file and `CITATION_GRAPH_` prefixed
//! environment variables, with `__` separating nested keys:
//!
//! ```toml
//! [fetch]
//! base_url = "http://export.arxiv.org/e-print"
//! max_attempts = 3
//! default_retry_after_secs = 30
//! timeout_secs = 120
//!
//! [workspace]
//! root = "./sources"
//! keep_files = false
//!
//! [extraction]
//! extensions = ["bbl", "tex"]
//! marker = "\\bibitem"
//! policy = "prefer-doi"
//! arxiv_pattern = "loose"
//! dedup = false
//!
//! [batch]
//! fail_fast = false
//! ```
//!
//! ```bash
//! export CITATION_GRAPH_FETCH__MAX_ATTEMPTS=5
//! export CITATION_GRAPH_EXTRACTION__POLICY=reject-ambiguous
//! ```

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::extract::{ArxivPattern, ReconcilePolicy};
use crate::sources::DEFAULT_EPRINT_URL;

/// Prefix for environment overrides
pub const ENV_PREFIX: &str = "CITATION_GRAPH";

/// File name looked up in the working directory
pub const CONFIG_FILE_NAME: &str = "citation-graph.toml";

/// Application configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Config {
    /// Download settings
    #[serde(default)]
    pub fetch: FetchConfig,

    /// Where payloads are unpacked
    #[serde(default)]
    pub workspace: WorkspaceConfig,

    /// Bibliography parsing settings
    #[serde(default)]
    pub extraction: ExtractionConfig,

    /// Batch behavior
    #[serde(default)]
    pub batch: BatchConfig,
}

/// Download configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FetchConfig {
    /// Endpoint the identifier is appended to
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Total requests per paper, the first one included
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,

    /// Wait after a 503 without a Retry-After header
    #[serde(default = "default_retry_after")]
    pub default_retry_after_secs: u64,

    /// Per-request timeout
    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,

    /// Custom User-Agent (defaults to crate name and version)
    #[serde(default)]
    pub user_agent: Option<String>,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            max_attempts: default_max_attempts(),
            default_retry_after_secs: default_retry_after(),
            timeout_secs: default_timeout(),
            user_agent: None,
        }
    }
}

fn default_base_url() -> String {
    DEFAULT_EPRINT_URL.to_string()
}

fn default_max_attempts() -> u32 {
    3
}

fn default_retry_after() -> u64 {
    30
}

fn default_timeout() -> u64 {
    120
}

/// Working area configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkspaceConfig {
    /// Directory holding one folder and one archive file per paper
    #[serde(default = "default_workspace_root")]
    pub root: PathBuf,

    /// Leave extracted files on disk after processing
    #[serde(default)]
    pub keep_files: bool,
}

impl Default for WorkspaceConfig {
    fn default() -> Self {
        Self {
            root: default_workspace_root(),
            keep_files: false,
        }
    }
}

fn default_workspace_root() -> PathBuf {
    PathBuf::from("./sources")
}

/// Bibliography parsing configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExtractionConfig {
    /// File extensions considered, without the dot
    #[serde(default = "default_extensions")]
    pub extensions: Vec<String>,

    /// Token that starts each bibliography entry
    #[serde(default = "default_marker")]
    pub marker: String,

    /// How one identifier is chosen per entry
    #[serde(default)]
    pub policy: ReconcilePolicy,

    /// Precision of the preprint identifier pattern
    #[serde(default)]
    pub arxiv_pattern: ArxivPattern,

    /// Drop repeated citations within one paper
    #[serde(default)]
    pub dedup: bool,
}

impl Default for ExtractionConfig {
    fn default() -> Self {
        Self {
            extensions: default_extensions(),
            marker: default_marker(),
            policy: ReconcilePolicy::default(),
            arxiv_pattern: ArxivPattern::default(),
            dedup: false,
        }
    }
}

fn default_extensions() -> Vec<String> {
    vec!["bbl".to_string(), "tex".to_string()]
}

fn default_marker() -> String {
    r"\bibitem".to_string()
}

/// Batch configuration
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatchConfig {
    /// Abort the whole run on the first fetch or archive error
    #[serde(default)]
    pub fail_fast: bool,
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error(transparent)]
    Load(#[from] config::ConfigError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialize error: {0}")]
    Serialize(#[from] toml::ser::Error),

    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

impl Config {
    /// Check values that deserialize fine but cannot work
    pub fn validate(&self) -> Result<(), ConfigError> {
        let url = url::Url::parse(&self.fetch.base_url)
            .map_err(|e| ConfigError::Invalid(format!("fetch.base_url: {}", e)))?;
        if !matches!(url.scheme(), "http" | "https") {
            return Err(ConfigError::Invalid(format!(
                "fetch.base_url: unsupported scheme {}",
                url.scheme()
            )));
        }
        if self.fetch.max_attempts == 0 {
            return Err(ConfigError::Invalid(
                "fetch.max_attempts must be at least 1".to_string(),
            ));
        }
        if self.extraction.marker.is_empty() {
            return Err(ConfigError::Invalid(
                "extraction.marker must not be empty".to_string(),
            ));
        }
        if self.extraction.extensions.is_empty() {
            return Err(ConfigError::Invalid(
                "extraction.extensions must not be empty".to_string(),
            ));
        }
        Ok(())
    }

    /// Write the configuration as TOML
    pub fn save(&self, path: &Path) -> Result<(), ConfigError> {
        let content = toml::to_string_pretty(self)?;
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, content)?;
        Ok(())
    }
}

/// Load configuration from a file, with environment overrides
pub fn load_config(path: &Path) -> Result<Config, ConfigError> {
    let settings = config::Config::builder()
        .add_source(config::File::from(path))
        .add_source(environment())
        .build()?;

    let config: Config = settings.try_deserialize()?;
    config.validate()?;
    Ok(config)
}

/// Get the configuration from defaults and environment variables only
pub fn get_config() -> Result<Config, ConfigError> {
    let settings = config::Config::builder().add_source(environment()).build()?;
    let config: Config = settings.try_deserialize()?;
    config.validate()?;
    Ok(config)
}

fn environment() -> config::Environment {
    config::Environment::with_prefix(ENV_PREFIX)
        .prefix_separator("_")
        .separator("__")
        .list_separator(",")
        .with_list_parse_key("extraction.extensions")
        .try_parsing(true)
}

/// Look for a config file in the working directory, then the user config dir
pub fn find_config_file() -> Option<PathBuf> {
    let local = PathBuf::from(CONFIG_FILE_NAME);
    if local.is_file() {
        return Some(local);
    }

    dirs::config_dir()
        .map(|dir| dir.join("citation-graph").join("config.toml"))
        .filter(|path| path.is_file())
}

/// Default location for `config init`
pub fn default_config_path() -> PathBuf {
    dirs::config_dir()
        .map(|dir| dir.join("citation-graph").join("config.toml"))
        .unwrap_or_else(|| PathBuf::from(CONFIG_FILE_NAME))
}
