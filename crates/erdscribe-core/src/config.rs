//! Configuration schema (erdscribe.toml)

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Default aggregate character budget per extraction batch
pub const DEFAULT_CHUNK_CHARS: usize = 120_000;

/// SQL dialect used by the DDL renderer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DialectConfig {
    /// PostgreSQL
    Postgres,

    /// MySQL / MariaDB
    Mysql,

    /// Generic ANSI SQL
    Ansi,
}

impl Default for DialectConfig {
    fn default() -> Self {
        Self::Ansi
    }
}

impl std::str::FromStr for DialectConfig {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "postgres" | "postgresql" => Ok(Self::Postgres),
            "mysql" | "mariadb" => Ok(Self::Mysql),
            "ansi" => Ok(Self::Ansi),
            other => Err(ConfigError::ParseError(format!(
                "unknown dialect '{}', expected 'ansi', 'postgres' or 'mysql'",
                other
            ))),
        }
    }
}

/// Which front-end populates the schema
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExtractionMode {
    /// Deterministic annotation parser
    Static,

    /// Chunked extraction through the external oracle
    Oracle,
}

impl Default for ExtractionMode {
    fn default() -> Self {
        Self::Static
    }
}

impl std::str::FromStr for ExtractionMode {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "static" => Ok(Self::Static),
            "oracle" | "ai" => Ok(Self::Oracle),
            other => Err(ConfigError::ParseError(format!(
                "unknown extraction mode '{}', expected 'static' or 'oracle'",
                other
            ))),
        }
    }
}

/// Batch partitioning settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChunkingConfig {
    /// Maximum aggregate characters of source text per batch
    #[serde(default = "default_max_chars")]
    pub max_chars: usize,
}

fn default_max_chars() -> usize {
    DEFAULT_CHUNK_CHARS
}

impl Default for ChunkingConfig {
    fn default() -> Self {
        Self {
            max_chars: DEFAULT_CHUNK_CHARS,
        }
    }
}

/// Extraction oracle connection settings (Azure OpenAI chat completions)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OracleConfig {
    /// Resource endpoint, e.g. `https://my-resource.openai.azure.com`
    #[serde(default)]
    pub endpoint: Option<String>,

    /// API key
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,

    /// Deployment (model) name
    #[serde(default)]
    pub deployment: Option<String>,

    /// API version query parameter
    #[serde(default = "default_api_version")]
    pub api_version: String,

    /// Maximum number of batches in flight
    #[serde(default = "default_max_concurrency")]
    pub max_concurrency: usize,

    /// Per-batch timeout in seconds
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

fn default_api_version() -> String {
    "2024-06-01".to_string()
}

fn default_max_concurrency() -> usize {
    4
}

fn default_timeout_secs() -> u64 {
    120
}

impl Default for OracleConfig {
    fn default() -> Self {
        Self {
            endpoint: None,
            api_key: None,
            deployment: None,
            api_version: default_api_version(),
            max_concurrency: default_max_concurrency(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

impl OracleConfig {
    /// Whether endpoint, key and deployment are all present
    pub fn is_complete(&self) -> bool {
        [&self.endpoint, &self.api_key, &self.deployment]
            .iter()
            .all(|v| v.as_deref().is_some_and(|s| !s.trim().is_empty()))
    }
}

/// Artifact locations
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OutputConfig {
    /// Output directory
    #[serde(default = "default_output_dir")]
    pub dir: PathBuf,

    /// DBML file name
    #[serde(default = "default_dbml_file")]
    pub dbml_file: String,

    /// Markdown summary file name
    #[serde(default = "default_summary_file")]
    pub summary_file: String,

    /// SQL DDL file name (not written when absent)
    #[serde(default)]
    pub ddl_file: Option<String>,
}

fn default_output_dir() -> PathBuf {
    PathBuf::from("out/erd")
}

fn default_dbml_file() -> String {
    "database.dbml".to_string()
}

fn default_summary_file() -> String {
    "erd_summary.md".to_string()
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            dir: default_output_dir(),
            dbml_file: default_dbml_file(),
            summary_file: default_summary_file(),
            ddl_file: None,
        }
    }
}

/// Candidate file discovery settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScanConfig {
    /// Directories searched first, relative to the repository root
    #[serde(default = "default_prefer_dirs")]
    pub prefer_dirs: Vec<String>,

    /// Also accept files carrying only a table annotation
    #[serde(default)]
    pub include_table_only: bool,
}

fn default_prefer_dirs() -> Vec<String> {
    ["models", "model", "entity", "entities", "domain"]
        .iter()
        .map(|s| s.to_string())
        .collect()
}

impl Default for ScanConfig {
    fn default() -> Self {
        Self {
            prefer_dirs: default_prefer_dirs(),
            include_table_only: false,
        }
    }
}

/// Main configuration structure
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Config {
    /// Extraction front-end
    #[serde(default)]
    pub mode: ExtractionMode,

    /// SQL dialect for DDL output
    #[serde(default)]
    pub dialect: DialectConfig,

    /// Batch partitioning
    #[serde(default)]
    pub chunking: ChunkingConfig,

    /// Extraction oracle
    #[serde(default)]
    pub oracle: OracleConfig,

    /// Candidate discovery
    #[serde(default)]
    pub scan: ScanConfig,

    /// Artifact locations
    #[serde(default)]
    pub output: OutputConfig,

    /// Project root path (for resolving relative paths)
    #[serde(skip)]
    pub project_root: PathBuf,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            mode: ExtractionMode::default(),
            dialect: DialectConfig::default(),
            chunking: ChunkingConfig::default(),
            oracle: OracleConfig::default(),
            scan: ScanConfig::default(),
            output: OutputConfig::default(),
            project_root: std::env::current_dir().unwrap_or_default(),
        }
    }
}

impl Config {
    /// Load config from TOML file
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)
            .map_err(|e| ConfigError::IoError(e.to_string()))?;

        let mut config: Config = toml::from_str(&contents)
            .map_err(|e| ConfigError::ParseError(e.to_string()))?;

        // Set project root to parent of config file
        if let Some(parent) = path.parent() {
            config.project_root = parent.to_path_buf();
        }

        Ok(config)
    }

    /// Load config from TOML string
    pub fn from_toml(toml: &str) -> Result<Self, ConfigError> {
        toml::from_str(toml)
            .map_err(|e| ConfigError::ParseError(e.to_string()))
    }

    /// Save config to TOML file
    pub fn save_to_file(&self, path: &Path) -> Result<(), ConfigError> {
        let toml = toml::to_string_pretty(self)
            .map_err(|e| ConfigError::SerializeError(e.to_string()))?;

        std::fs::write(path, toml)
            .map_err(|e| ConfigError::IoError(e.to_string()))?;

        Ok(())
    }

    /// Overlay settings from the process environment
    pub fn apply_env(&mut self) -> Result<(), ConfigError> {
        self.apply_overrides(|key| std::env::var(key).ok())
    }

    /// Overlay settings from a key lookup
    ///
    /// Recognized keys: `AZURE_OPENAI_ENDPOINT`, `AZURE_OPENAI_API_KEY`,
    /// `AZURE_OPENAI_DEPLOYMENT`, `OPENAI_API_VERSION`, `ERD_OUTPUT_DIR`,
    /// `ERD_MODE`, `ERD_CHUNK_CHARS`. Empty values are ignored.
    pub fn apply_overrides<F>(&mut self, lookup: F) -> Result<(), ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        if let Some(v) = get("AZURE_OPENAI_ENDPOINT") {
            self.oracle.endpoint = Some(v);
        }
        if let Some(v) = get("AZURE_OPENAI_API_KEY") {
            self.oracle.api_key = Some(v);
        }
        if let Some(v) = get("AZURE_OPENAI_DEPLOYMENT") {
            self.oracle.deployment = Some(v);
        }
        if let Some(v) = get("OPENAI_API_VERSION") {
            self.oracle.api_version = v;
        }
        if let Some(v) = get("ERD_OUTPUT_DIR") {
            self.output.dir = PathBuf::from(v);
        }
        if let Some(v) = get("ERD_MODE") {
            self.mode = v.parse()?;
        }
        if let Some(v) = get("ERD_CHUNK_CHARS") {
            self.chunking.max_chars = v
                .parse()
                .map_err(|e| ConfigError::ParseError(format!("ERD_CHUNK_CHARS: {}", e)))?;
        }

        Ok(())
    }
}

/// Config error types
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    IoError(String),

    #[error("Parse error: {0}")]
    ParseError(String),

    #[error("Serialize error: {0}")]
    SerializeError(String),
}
