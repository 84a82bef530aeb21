//! Errors raised while loading configuration and asset snapshots.
//!
//! Nothing in the render path returns these: ineligible assets and malformed attributes are
//! dropped silently, and emission failures are logged and swallowed.

use std::path::PathBuf;

use thiserror::Error;

/// Errors that can occur while loading the push configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
  /// Failed to read the configuration file from disk.
  #[error("failed to read {}: {source}", path.display())]
  Io {
    /// Path that caused the error.
    path: PathBuf,
    /// Source I/O error.
    source: std::io::Error,
  },
  /// Failed to parse the JSON configuration file.
  #[error("failed to parse {}: {source}", path.display())]
  Parse {
    /// Path that caused the error.
    path: PathBuf,
    /// Source parse error.
    source: serde_json::Error,
  },
  /// The configured site URL is not an absolute URL with a host.
  #[error("invalid site url `{url}`")]
  SiteUrl {
    /// Offending value.
    url: String,
  },
  /// An allowed host pattern could not be compiled.
  #[error("invalid allowed host pattern `{pattern}`: {source}")]
  HostPattern {
    /// Offending pattern.
    pattern: String,
    /// Source regex error.
    source: regex::Error,
  },
}

/// Errors that can occur while loading an asset snapshot.
#[derive(Debug, Error)]
pub enum SnapshotError {
  /// Failed to read the snapshot file from disk.
  #[error("failed to read {}: {source}", path.display())]
  Io {
    /// Path that caused the error.
    path: PathBuf,
    /// Source I/O error.
    source: std::io::Error,
  },
  /// Failed to parse the snapshot JSON.
  #[error("failed to parse {}: {source}", path.display())]
  Parse {
    /// Path that caused the error.
    path: PathBuf,
    /// Source parse error.
    source: serde_json::Error,
  },
}
