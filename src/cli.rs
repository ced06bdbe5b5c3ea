//! Command-line interface argument parsing.
//!
//! This module handles all CLI argument parsing using clap,
//! including validation and default values.

use clap::Parser;
use std::path::PathBuf;

/// ARRMap - render and publish a gated ARR map from a tabular record source
///
/// Fetches location/revenue rows from a remote endpoint, skips the run when
/// nothing changed, renders a self-contained interactive map, injects a
/// client-side access gate, and pushes the result to a git remote.
///
/// Examples:
///   arrmap --source https://sheets.example.com/v1/heatmap-master
///   arrmap --source https://sheets.example.com/v1/heatmap-master --dry-run
///   arrmap --force --no-publish --output preview.html
///   arrmap --init-config
#[derive(Parser, Debug, Clone)]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Args {
    /// Record source endpoint URL
    ///
    /// Must return a JSON array of row objects. Can also be set via the
    /// ARRMAP_SOURCE_URL env var or the [source] section of .arrmap.toml.
    #[arg(short, long, value_name = "URL", env = "ARRMAP_SOURCE_URL")]
    pub source: Option<String>,

    /// Output file path for the rendered map
    #[arg(short, long, value_name = "FILE")]
    pub output: Option<PathBuf>,

    /// Path to configuration file
    ///
    /// If not specified, looks for .arrmap.toml in the current directory
    #[arg(short, long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Path of the fingerprint file used for change detection
    #[arg(long, value_name = "FILE")]
    pub fingerprint_file: Option<PathBuf>,

    /// Request timeout in seconds for the source fetch
    #[arg(long, value_name = "SECS")]
    pub timeout: Option<u64>,

    /// Git remote to push the artifact to
    #[arg(long, value_name = "REMOTE")]
    pub remote: Option<String>,

    /// Branch to commit and push
    #[arg(short, long, value_name = "BRANCH")]
    pub branch: Option<String>,

    /// Rebuild and publish even if the source data is unchanged
    #[arg(short, long)]
    pub force: bool,

    /// Fetch and summarize without writing or publishing anything
    ///
    /// Prints the normalization report and both breakdowns, leaves the
    /// fingerprint file untouched, and exits.
    #[arg(long)]
    pub dry_run: bool,

    /// Render the artifact but skip the git commit/push step
    #[arg(long)]
    pub no_publish: bool,

    /// Skip injecting the client-side access gate
    #[arg(long)]
    pub no_gate: bool,

    /// Enable verbose logging output
    #[arg(short, long)]
    pub verbose: bool,

    /// Run in quiet mode (minimal output)
    #[arg(short, long)]
    pub quiet: bool,

    /// Generate a default .arrmap.toml configuration file
    #[arg(long)]
    pub init_config: bool,
}

impl Args {
    /// Parse command-line arguments.
    pub fn parse_args() -> Self {
        Self::parse()
    }

    /// Validate the parsed arguments.
    pub fn validate(&self) -> Result<(), String> {
        // Skip validation for --init-config
        if self.init_config {
            return Ok(());
        }

        // Validate source URL format when given on the command line.
        // The URL may also come from the config file, so absence here is
        // fine; an empty merged URL is rejected later.
        if let Some(ref source) = self.source {
            if !source.starts_with("http://") && !source.starts_with("https://") {
                return Err("Source URL must start with 'http://' or 'https://'".to_string());
            }
        }

        // Validate timeout if provided
        if let Some(timeout) = self.timeout {
            if timeout == 0 {
                return Err("Timeout must be at least 1 second".to_string());
            }
        }

        // Check for conflicting options
        if self.verbose && self.quiet {
            return Err("Cannot use both --verbose and --quiet".to_string());
        }

        if self.force && self.dry_run {
            return Err("--force has no effect with --dry-run".to_string());
        }

        Ok(())
    }

    /// Returns the log level based on verbosity settings.
    pub fn log_level(&self) -> tracing::Level {
        if self.quiet {
            tracing::Level::ERROR
        } else if self.verbose {
            tracing::Level::DEBUG
        } else {
            tracing::Level::INFO
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn make_args() -> Args {
        Args {
            source: Some("https://sheets.example.com/v1/records".to_string()),
            output: None,
            config: None,
            fingerprint_file: None,
            timeout: None,
            remote: None,
            branch: None,
            force: false,
            dry_run: false,
            no_publish: false,
            no_gate: false,
            verbose: false,
            quiet: false,
            init_config: false,
        }
    }

    #[test]
    fn test_validation_ok() {
        let args = make_args();
        assert!(args.validate().is_ok());
    }

    #[test]
    fn test_validation_invalid_url() {
        let mut args = make_args();
        args.source = Some("ftp://example.com/records".to_string());
        assert!(args.validate().is_err());
    }

    #[test]
    fn test_validation_missing_url_is_ok() {
        // The config file may supply the URL instead.
        let mut args = make_args();
        args.source = None;
        assert!(args.validate().is_ok());
    }

    #[test]
    fn test_validation_conflicting_options() {
        let mut args = make_args();
        args.verbose = true;
        args.quiet = true;
        assert!(args.validate().is_err());
    }

    #[test]
    fn test_validation_force_with_dry_run() {
        let mut args = make_args();
        args.force = true;
        args.dry_run = true;
        assert!(args.validate().is_err());
    }

    #[test]
    fn test_validation_zero_timeout() {
        let mut args = make_args();
        args.timeout = Some(0);
        assert!(args.validate().is_err());
    }

    #[test]
    fn test_log_level() {
        let mut args = make_args();
        assert_eq!(args.log_level(), tracing::Level::INFO);

        args.verbose = true;
        assert_eq!(args.log_level(), tracing::Level::DEBUG);

        args.verbose = false;
        args.quiet = true;
        assert_eq!(args.log_level(), tracing::Level::ERROR);
    }
}
