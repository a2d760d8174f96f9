use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

use crate::error::{GitReleaseError, Result};

/// Represents the complete configuration for git-release.
///
/// All process-wide state (manifest location, lock refresh command, tag
/// naming, committer identity) lives here and is passed into components
/// explicitly instead of being looked up from the environment.
#[derive(Debug, Deserialize, Serialize, Clone, Default)]
pub struct Config {
    #[serde(default)]
    pub release: ReleaseConfig,

    #[serde(default)]
    pub changelog: ChangelogConfig,

    #[serde(default)]
    pub identity: IdentityConfig,
}

/// Returns the default manifest path.
fn default_manifest() -> String {
    "Cargo.toml".to_string()
}

/// Returns the default lock artifact path.
fn default_lock() -> Option<String> {
    Some("Cargo.lock".to_string())
}

/// Returns the default build-tool command used to regenerate the lock artifact.
fn default_lock_command() -> Vec<String> {
    vec![
        "cargo".to_string(),
        "check".to_string(),
        "--quiet".to_string(),
    ]
}

/// Returns the default release tag pattern.
fn default_tag_pattern() -> String {
    "v{version}".to_string()
}

/// Configuration for the version bump and tagging flow.
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct ReleaseConfig {
    #[serde(default = "default_manifest")]
    pub manifest: String,

    #[serde(default = "default_lock")]
    pub lock: Option<String>,

    #[serde(default = "default_lock_command")]
    pub lock_command: Vec<String>,

    #[serde(default = "default_tag_pattern")]
    pub tag_pattern: String,
}

impl Default for ReleaseConfig {
    fn default() -> Self {
        ReleaseConfig {
            manifest: default_manifest(),
            lock: default_lock(),
            lock_command: default_lock_command(),
            tag_pattern: default_tag_pattern(),
        }
    }
}

/// Returns the default source file extension used for per-file diff blocks.
fn default_source_extension() -> String {
    "rs".to_string()
}

/// Returns the default keywords that place a commit in the Features section.
fn default_feature_keywords() -> Vec<String> {
    vec!["feat".to_string(), "add".to_string(), "new".to_string()]
}

/// Returns the default keywords that place a commit in the Fixes section.
fn default_fix_keywords() -> Vec<String> {
    vec!["fix".to_string(), "bug".to_string(), "error".to_string()]
}

/// Returns the default keywords that place a commit in the Performance section.
fn default_performance_keywords() -> Vec<String> {
    vec![
        "perf".to_string(),
        "speed".to_string(),
        "optimize".to_string(),
    ]
}

/// Configuration for changelog generation.
///
/// The keyword lists drive the categorization heuristics; matching is
/// case-insensitive substring containment against the commit subject.
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct ChangelogConfig {
    #[serde(default = "default_source_extension")]
    pub source_extension: String,

    #[serde(default = "default_feature_keywords")]
    pub feature_keywords: Vec<String>,

    #[serde(default = "default_fix_keywords")]
    pub fix_keywords: Vec<String>,

    #[serde(default = "default_performance_keywords")]
    pub performance_keywords: Vec<String>,
}

impl Default for ChangelogConfig {
    fn default() -> Self {
        ChangelogConfig {
            source_extension: default_source_extension(),
            feature_keywords: default_feature_keywords(),
            fix_keywords: default_fix_keywords(),
            performance_keywords: default_performance_keywords(),
        }
    }
}

/// Optional committer identity override.
///
/// When both fields are set they are used for the bump commit and annotated
/// tags; otherwise the repository's own signature configuration applies.
#[derive(Debug, Deserialize, Serialize, Clone, Default, PartialEq)]
pub struct IdentityConfig {
    #[serde(default)]
    pub name: Option<String>,

    #[serde(default)]
    pub email: Option<String>,
}

/// Loads configuration from file or returns defaults.
///
/// Attempts to load configuration in the following order:
/// 1. Custom path provided as parameter
/// 2. `gitrelease.toml` in current directory
/// 3. `.gitrelease.toml` in the user config directory
/// 4. Default configuration if no file found
///
/// # Arguments
/// * `config_path` - Optional path to custom configuration file
///
/// # Returns
/// * `Ok(Config)` - Loaded or default configuration
/// * `Err` - If a file exists but cannot be read or parsed
pub fn load_config(config_path: Option<&str>) -> Result<Config> {
    let config_str = if let Some(path) = config_path {
        fs::read_to_string(path)?
    } else if Path::new("./gitrelease.toml").exists() {
        fs::read_to_string("./gitrelease.toml")?
    } else if let Some(config_dir) = dirs::config_dir() {
        let config_path = config_dir.join(".gitrelease.toml");
        if config_path.exists() {
            fs::read_to_string(config_path)?
        } else {
            return Ok(Config::default());
        }
    } else {
        return Ok(Config::default());
    };

    let config: Config =
        toml::from_str(&config_str).map_err(|e| GitReleaseError::config(e.to_string()))?;
    Ok(config)
}
