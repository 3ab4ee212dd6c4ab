//! Application configuration for Rolodex.
//!
//! User config lives at `~/.rolodex/rolodex.toml`.
//! CLI flags override config file values, which override defaults.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::bias::BiasTables;
use crate::error::{Result, RolodexError};

/// Default configuration file name.
const CONFIG_FILE_NAME: &str = "rolodex.toml";

/// Default config directory name under the user's home.
const CONFIG_DIR_NAME: &str = ".rolodex";

// ---------------------------------------------------------------------------
// Config structs (matching rolodex.toml schema)
// ---------------------------------------------------------------------------

/// Top-level application config, deserialized from TOML.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    /// Scarce selection thresholds.
    #[serde(default)]
    pub selection: SelectionConfig,

    /// Optional overrides for the classification tables.
    #[serde(default)]
    pub bias: BiasConfig,

    /// Enrichment source connection settings.
    #[serde(default)]
    pub source: SourceConfig,

    /// System-of-record settings.
    #[serde(default)]
    pub record: RecordConfig,

    /// Batch run settings.
    #[serde(default)]
    pub run: RunConfig,
}

impl AppConfig {
    /// Check every section for values the pipeline cannot work with.
    pub fn validate(&self) -> Result<()> {
        self.selection.validate()?;
        self.bias.tables()?;
        url::Url::parse(&self.source.base_url).map_err(|e| {
            RolodexError::config(format!("invalid source.base_url '{}': {e}", self.source.base_url))
        })?;
        if self.run.concurrency == 0 {
            return Err(RolodexError::config("run.concurrency must be at least 1"));
        }
        Ok(())
    }
}

/// `[selection]` section: thresholds of the two-stage cut.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SelectionConfig {
    /// Ranked lists at least this long get the proportional cut.
    #[serde(default = "default_first_cut_threshold")]
    pub first_cut_threshold: usize,

    /// Numerator of the fraction kept by the proportional cut.
    #[serde(default = "default_keep_numerator")]
    pub keep_numerator: usize,

    /// Denominator of the fraction kept by the proportional cut.
    #[serde(default = "default_keep_denominator")]
    pub keep_denominator: usize,

    /// Absolute upper bound on selected contacts per account.
    #[serde(default = "default_hard_cap")]
    pub hard_cap: usize,
}

impl Default for SelectionConfig {
    fn default() -> Self {
        Self {
            first_cut_threshold: default_first_cut_threshold(),
            keep_numerator: default_keep_numerator(),
            keep_denominator: default_keep_denominator(),
            hard_cap: default_hard_cap(),
        }
    }
}

impl SelectionConfig {
    pub fn validate(&self) -> Result<()> {
        if self.keep_denominator == 0 {
            return Err(RolodexError::config("selection.keep_denominator must be positive"));
        }
        if self.keep_numerator == 0 {
            return Err(RolodexError::config("selection.keep_numerator must be positive"));
        }
        if self.keep_numerator > self.keep_denominator {
            return Err(RolodexError::config(
                "selection.keep_numerator must not exceed selection.keep_denominator",
            ));
        }
        if self.hard_cap == 0 {
            return Err(RolodexError::config("selection.hard_cap must be positive"));
        }
        Ok(())
    }
}

fn default_first_cut_threshold() -> usize {
    45
}
fn default_keep_numerator() -> usize {
    1
}
fn default_keep_denominator() -> usize {
    3
}
fn default_hard_cap() -> usize {
    60
}

/// `[bias]` section. Absent lists fall back to the built-in tables.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BiasConfig {
    /// Ordered title groups; group index is the rating.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title_groups: Option<Vec<Vec<String>>>,

    /// Ordered function tokens; token index is the priority.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub functions: Option<Vec<String>>,
}

impl BiasConfig {
    /// Resolve the effective tables.
    pub fn tables(&self) -> Result<BiasTables> {
        let defaults = BiasTables::default();
        if self.title_groups.is_none() && self.functions.is_none() {
            return Ok(defaults);
        }
        BiasTables::new(
            self.title_groups
                .clone()
                .unwrap_or_else(|| defaults.title_groups().to_vec()),
            self.functions
                .clone()
                .unwrap_or_else(|| defaults.functions().to_vec()),
        )
    }
}

/// `[source]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SourceConfig {
    /// Base URL of the provider API.
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Name of the env var holding the partner key (never store the key itself).
    #[serde(default = "default_partner_key_env")]
    pub partner_key_env: String,

    /// Name of the env var holding the session token.
    #[serde(default = "default_auth_token_env")]
    pub auth_token_env: String,

    /// Per-request timeout in seconds.
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for SourceConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            partner_key_env: default_partner_key_env(),
            auth_token_env: default_auth_token_env(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

fn default_base_url() -> String {
    "https://papi.discoverydb.com/papi".into()
}
fn default_partner_key_env() -> String {
    "ROLODEX_SOURCE_KEY".into()
}
fn default_auth_token_env() -> String {
    "ROLODEX_SOURCE_TOKEN".into()
}
fn default_timeout_secs() -> u64 {
    30
}

/// `[record]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecordConfig {
    /// Path of the local system-of-record database.
    #[serde(default = "default_database_path")]
    pub database_path: String,

    /// Owner assigned to new contacts when the account has none.
    #[serde(default)]
    pub default_owner: String,
}

impl Default for RecordConfig {
    fn default() -> Self {
        Self {
            database_path: default_database_path(),
            default_owner: String::new(),
        }
    }
}

fn default_database_path() -> String {
    "~/.rolodex/records.db".into()
}

/// `[run]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunConfig {
    /// Accounts enriched at the same time.
    #[serde(default = "default_concurrency")]
    pub concurrency: usize,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            concurrency: default_concurrency(),
        }
    }
}

fn default_concurrency() -> usize {
    4
}

// ---------------------------------------------------------------------------
// Credentials
// ---------------------------------------------------------------------------

/// Enrichment source credentials resolved from the environment.
#[derive(Clone)]
pub struct SourceCredentials {
    pub partner_key: String,
    pub auth_token: String,
}

impl std::fmt::Debug for SourceCredentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SourceCredentials")
            .field("partner_key", &"<redacted>")
            .field("auth_token", &"<redacted>")
            .finish()
    }
}

/// Read the source credentials from the env vars named in config.
pub fn load_source_credentials(config: &SourceConfig) -> Result<SourceCredentials> {
    Ok(SourceCredentials {
        partner_key: required_env(&config.partner_key_env)?,
        auth_token: required_env(&config.auth_token_env)?,
    })
}

fn required_env(var_name: &str) -> Result<String> {
    match std::env::var(var_name) {
        Ok(val) if !val.is_empty() => Ok(val),
        _ => Err(RolodexError::config(format!(
            "enrichment source credential not found. Set the {var_name} environment variable."
        ))),
    }
}

// ---------------------------------------------------------------------------
// Config loading
// ---------------------------------------------------------------------------

/// Get the path to the config directory (`~/.rolodex/`).
pub fn config_dir() -> Result<PathBuf> {
    let home =
        dirs::home_dir().ok_or_else(|| RolodexError::config("could not determine home directory"))?;
    Ok(home.join(CONFIG_DIR_NAME))
}

/// Get the path to the config file (`~/.rolodex/rolodex.toml`).
pub fn config_file_path() -> Result<PathBuf> {
    Ok(config_dir()?.join(CONFIG_FILE_NAME))
}

/// Load the application config from disk. Returns defaults if the file does not exist.
pub fn load_config() -> Result<AppConfig> {
    let path = config_file_path()?;

    if !path.exists() {
        tracing::debug!(?path, "config file not found, using defaults");
        return Ok(AppConfig::default());
    }

    load_config_from(&path)
}

/// Load and validate the application config from a specific file path.
pub fn load_config_from(path: &Path) -> Result<AppConfig> {
    let content = std::fs::read_to_string(path).map_err(|e| RolodexError::io(path, e))?;

    let config: AppConfig = toml::from_str(&content)
        .map_err(|e| RolodexError::config(format!("failed to parse {}: {e}", path.display())))?;
    config.validate()?;
    Ok(config)
}

/// Create the config directory and write a default config file.
/// Returns the path to the created file.
pub fn init_config() -> Result<PathBuf> {
    let dir = config_dir()?;
    std::fs::create_dir_all(&dir).map_err(|e| RolodexError::io(&dir, e))?;

    let path = dir.join(CONFIG_FILE_NAME);
    let config = AppConfig::default();
    let content =
        toml::to_string_pretty(&config).map_err(|e| RolodexError::config(e.to_string()))?;

    std::fs::write(&path, content).map_err(|e| RolodexError::io(&path, e))?;
    tracing::info!(?path, "created default config file");

    Ok(path)
}

/// Expand a leading `~/` to the user's home directory.
pub fn expand_home(path: &str) -> Result<PathBuf> {
    match path.strip_prefix("~/") {
        Some(rest) => {
            let home = dirs::home_dir()
                .ok_or_else(|| RolodexError::config("could not determine home directory"))?;
            Ok(home.join(rest))
        }
        None => Ok(PathBuf::from(path)),
    }
}
