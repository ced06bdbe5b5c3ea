//! Configuration file handling.
//!
//! This module handles loading and merging configuration from
//! `.arrmap.toml` files.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Root configuration structure.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Record source settings.
    #[serde(default)]
    pub source: SourceConfig,

    /// Fingerprint / change-detection settings.
    #[serde(default)]
    pub fingerprint: FingerprintConfig,

    /// Map rendering settings.
    #[serde(default)]
    pub map: MapConfig,

    /// Access gate settings.
    #[serde(default)]
    pub gate: GateConfig,

    /// Git publish settings.
    #[serde(default)]
    pub publish: PublishConfig,
}

/// Record source settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SourceConfig {
    /// Endpoint returning a JSON array of row objects.
    #[serde(default)]
    pub url: String,

    /// Request timeout in seconds.
    #[serde(default = "default_timeout")]
    pub timeout_seconds: u64,

    /// Optional bearer token for authenticated endpoints.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_token: Option<String>,
}

impl Default for SourceConfig {
    fn default() -> Self {
        Self {
            url: String::new(),
            timeout_seconds: default_timeout(),
            api_token: None,
        }
    }
}

fn default_timeout() -> u64 {
    30
}

/// Fingerprint store settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FingerprintConfig {
    /// Path of the single-line text file holding the last-seen digest.
    #[serde(default = "default_fingerprint_path")]
    pub path: String,
}

impl Default for FingerprintConfig {
    fn default() -> Self {
        Self {
            path: default_fingerprint_path(),
        }
    }
}

fn default_fingerprint_path() -> String {
    ".arrmap_fingerprint".to_string()
}

/// Map rendering settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MapConfig {
    /// Output artifact path.
    #[serde(default = "default_output")]
    pub output: String,

    /// Initial map center latitude.
    #[serde(default = "default_center_lat")]
    pub center_lat: f64,

    /// Initial map center longitude.
    #[serde(default = "default_center_lon")]
    pub center_lon: f64,

    /// Initial zoom level.
    #[serde(default = "default_zoom")]
    pub zoom: u8,

    /// Minimum zoom level.
    #[serde(default = "default_zoom")]
    pub min_zoom: u8,

    /// Maximum zoom level.
    #[serde(default = "default_max_zoom")]
    pub max_zoom: u8,

    /// Title of the tier legend panel.
    #[serde(default = "default_tier_title")]
    pub tier_legend_title: String,

    /// Title of the region panel.
    #[serde(default = "default_region_title")]
    pub region_panel_title: String,
}

impl Default for MapConfig {
    fn default() -> Self {
        Self {
            output: default_output(),
            center_lat: default_center_lat(),
            center_lon: default_center_lon(),
            zoom: default_zoom(),
            min_zoom: default_zoom(),
            max_zoom: default_max_zoom(),
            tier_legend_title: default_tier_title(),
            region_panel_title: default_region_title(),
        }
    }
}

fn default_output() -> String {
    "index.html".to_string()
}

fn default_center_lat() -> f64 {
    37.0902
}

fn default_center_lon() -> f64 {
    -95.7129
}

fn default_zoom() -> u8 {
    5
}

fn default_max_zoom() -> u8 {
    10
}

fn default_tier_title() -> String {
    "ARR Breakdown by Tier".to_string()
}

fn default_region_title() -> String {
    "ARR by U.S. Region".to_string()
}

/// Access gate settings.
///
/// The gate is obfuscation only: both the check and the target digest
/// ship inside the published document, visible to any viewer. It keeps
/// casual visitors out, nothing more.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GateConfig {
    /// Whether to inject the gate script at all.
    #[serde(default = "default_true")]
    pub enabled: bool,

    /// Hex SHA-256 digest of the shared access secret.
    #[serde(default = "default_gate_digest")]
    pub digest: String,

    /// Endpoint the Update Map button POSTs to.
    #[serde(default = "default_trigger_path")]
    pub trigger_path: String,
}

impl Default for GateConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            digest: default_gate_digest(),
            trigger_path: default_trigger_path(),
        }
    }
}

fn default_true() -> bool {
    true
}

fn default_gate_digest() -> String {
    // SHA-256 of the deployment's shared secret; replace per deployment.
    "5c86dc9f9cdb39dd68c5f7f112406f8ce987972afab08d5605d862bbb3609cd4".to_string()
}

fn default_trigger_path() -> String {
    "/api/trigger".to_string()
}

/// Git publish settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PublishConfig {
    /// Whether to commit and push the artifact.
    #[serde(default = "default_true")]
    pub enabled: bool,

    /// Working directory of the repository to publish from.
    #[serde(default = "default_repo_dir")]
    pub repo_dir: String,

    /// Remote name to push to.
    #[serde(default = "default_remote")]
    pub remote: String,

    /// Branch to commit and push.
    #[serde(default = "default_branch")]
    pub branch: String,

    /// Commit message for artifact updates.
    #[serde(default = "default_commit_message")]
    pub commit_message: String,
}

impl Default for PublishConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            repo_dir: default_repo_dir(),
            remote: default_remote(),
            branch: default_branch(),
            commit_message: default_commit_message(),
        }
    }
}

fn default_repo_dir() -> String {
    ".".to_string()
}

fn default_remote() -> String {
    "origin".to_string()
}

fn default_branch() -> String {
    "main".to_string()
}

fn default_commit_message() -> String {
    "Auto update from record source".to_string()
}

impl Config {
    /// Load configuration from a file path.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let config: Config = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

        Ok(config)
    }

    /// Try to load configuration from the default location.
    ///
    /// Returns `Ok(None)` if the file doesn't exist, `Err` if it exists but can't be parsed.
    pub fn load_default() -> Result<Option<Self>> {
        let default_path = Path::new(".arrmap.toml");

        if default_path.exists() {
            Ok(Some(Self::load(default_path)?))
        } else {
            Ok(None)
        }
    }

    /// Merge this configuration with CLI arguments.
    ///
    /// CLI arguments take precedence over config file settings.
    /// This method only overrides config when CLI provides explicit values.
    pub fn merge_with_args(&mut self, args: &crate::cli::Args) {
        if let Some(ref url) = args.source {
            self.source.url = url.clone();
        }
        if let Some(ref output) = args.output {
            self.map.output = output.display().to_string();
        }
        if let Some(ref path) = args.fingerprint_file {
            self.fingerprint.path = path.display().to_string();
        }
        if let Some(timeout) = args.timeout {
            self.source.timeout_seconds = timeout;
        }
        if let Some(ref remote) = args.remote {
            self.publish.remote = remote.clone();
        }
        if let Some(ref branch) = args.branch {
            self.publish.branch = branch.clone();
        }

        // Flags always override
        if args.no_publish {
            self.publish.enabled = false;
        }
        if args.no_gate {
            self.gate.enabled = false;
        }
    }

    /// Generate a default configuration file content.
    pub fn default_toml() -> String {
        let config = Config::default();
        toml::to_string_pretty(&config).unwrap_or_else(|_| String::new())
    }
}
