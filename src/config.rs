//! Site configuration loader for preload hint generation.

use std::fs;
use std::path::Path;

use serde::Deserialize;

use crate::error::ConfigError;
use crate::hosts::{HostAllowList, HostAllowance};
use crate::resources::{Normalizer, SiteOrigin};

const DEFAULT_CONFIG_FILE: &str = "h2push.config.json";

/// Version appended to assets registered without an explicit one.
pub const DEFAULT_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Discoverable configuration describing the site and how hints are emitted.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct PushConfig {
  /// Canonical URL of the site; assets on its host are pushed with relative hrefs.
  pub site_url: String,
  /// Whether requests are served over TLS. Derived from `site_url` when missing.
  pub secure: Option<bool>,
  /// Version appended to assets registered without an explicit one.
  pub default_version: String,
  /// Extra hosts whose assets may be pushed, `*.example.com` matches subdomains.
  pub allowed_hosts: Vec<String>,
  /// Emit `<link>` tags even when headers could still be sent.
  pub prefer_link_tags: bool,
}

impl Default for PushConfig {
  fn default() -> Self {
    Self {
      site_url: "http://localhost".into(),
      secure: None,
      default_version: DEFAULT_VERSION.into(),
      allowed_hosts: Vec::new(),
      prefer_link_tags: false,
    }
  }
}

impl PushConfig {
  /// Attempt to load configuration from the provided directory.
  ///
  /// When the configuration file does not exist or fails to parse we fallback to default
  /// values so rendering can continue without hints for foreign hosts.
  pub fn discover(dir: &Path) -> Self {
    let candidate = dir.join(DEFAULT_CONFIG_FILE);
    match Self::load_from_path(&candidate) {
      Ok(config) => config,
      Err(err) => {
        tracing::debug!(error = %err, "using default push configuration");
        Self::default()
      }
    }
  }

  /// Read configuration from a specific JSON file.
  pub fn load_from_path(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
    let path = path.as_ref();
    let content = fs::read_to_string(path).map_err(|err| ConfigError::Io {
      path: path.to_path_buf(),
      source: err,
    })?;

    serde_json::from_str(&content).map_err(|err| ConfigError::Parse {
      path: path.to_path_buf(),
      source: err,
    })
  }

  /// Validate the configuration into settings used during a render pass.
  pub fn settings(&self) -> Result<PushSettings, ConfigError> {
    let site = SiteOrigin::parse(&self.site_url)?;
    let secure = self.secure.unwrap_or_else(|| site.is_secure());
    let default_version = if self.default_version.trim().is_empty() {
      DEFAULT_VERSION.to_string()
    } else {
      self.default_version.trim().to_string()
    };

    Ok(PushSettings {
      site,
      secure,
      default_version,
      allow_list: HostAllowList::from_patterns(&self.allowed_hosts)?,
      prefer_link_tags: self.prefer_link_tags,
    })
  }
}

/// Validated configuration for a render pass.
#[derive(Debug, Clone)]
pub struct PushSettings {
  /// Origin of the site.
  pub site: SiteOrigin,
  /// Whether the current request is served over TLS.
  pub secure: bool,
  /// Fallback asset version.
  pub default_version: String,
  /// Extra hosts allowed for preloading.
  pub allow_list: HostAllowList,
  /// Emit `<link>` tags even when headers could still be sent.
  pub prefer_link_tags: bool,
}

impl PushSettings {
  /// Settings for `site` with every other option at its default.
  pub fn for_site(site_url: &str) -> Result<Self, ConfigError> {
    PushConfig {
      site_url: site_url.to_string(),
      ..PushConfig::default()
    }
    .settings()
  }

  /// Normalizer bound to these settings and the given allowance.
  pub fn normalizer<'a>(&'a self, allowance: &'a dyn HostAllowance) -> Normalizer<'a> {
    Normalizer::new(&self.site, allowance)
      .secure(self.secure)
      .default_version(&self.default_version)
  }
}
