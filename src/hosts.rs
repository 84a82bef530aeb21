//! Host allow-list deciding which cross-origin assets may still be preloaded.

use std::collections::BTreeSet;

use regex::Regex;

use crate::error::ConfigError;

/// Decides whether an asset served from `host` is eligible for a preload hint.
///
/// `is_same_origin` is the verdict of the built-in origin comparison. Implementations usually
/// return it unchanged unless they want to allow additional hosts.
pub trait HostAllowance {
  /// Returns `true` when assets from `host` may be pushed.
  fn is_allowed(&self, is_same_origin: bool, host: &str) -> bool;
}

impl<F> HostAllowance for F
where
  F: Fn(bool, &str) -> bool,
{
  fn is_allowed(&self, is_same_origin: bool, host: &str) -> bool {
    self(is_same_origin, host)
  }
}

/// Default policy: only the site's own host is allowed.
#[derive(Debug, Clone, Copy, Default)]
pub struct SameOriginOnly;

impl HostAllowance for SameOriginOnly {
  fn is_allowed(&self, is_same_origin: bool, _host: &str) -> bool {
    is_same_origin
  }
}

/// Allow-list of extra hosts, supporting a leading `*.` wildcard for subdomains.
#[derive(Debug, Clone, Default)]
pub struct HostAllowList {
  exact: BTreeSet<String>,
  patterns: Vec<Regex>,
}

impl HostAllowList {
  /// Compile host patterns such as `cdn.example.com` or `*.static.example.com`.
  pub fn from_patterns(
    patterns: impl IntoIterator<Item = impl AsRef<str>>,
  ) -> Result<Self, ConfigError> {
    let mut list = Self::default();
    for pattern in normalise_hosts(patterns) {
      if pattern.contains('*') {
        let compiled = Regex::new(&wildcard_to_regex(&pattern)).map_err(|source| {
          ConfigError::HostPattern {
            pattern: pattern.clone(),
            source,
          }
        })?;
        list.patterns.push(compiled);
      } else {
        list.exact.insert(pattern);
      }
    }
    Ok(list)
  }

  /// Returns true when no extra hosts are configured.
  pub fn is_empty(&self) -> bool {
    self.exact.is_empty() && self.patterns.is_empty()
  }

  fn matches(&self, host: &str) -> bool {
    let host = host.to_ascii_lowercase();
    self.exact.contains(&host) || self.patterns.iter().any(|pattern| pattern.is_match(&host))
  }
}

impl HostAllowance for HostAllowList {
  fn is_allowed(&self, is_same_origin: bool, host: &str) -> bool {
    is_same_origin || self.matches(host)
  }
}

fn normalise_hosts(values: impl IntoIterator<Item = impl AsRef<str>>) -> BTreeSet<String> {
  values
    .into_iter()
    .map(|value| value.as_ref().trim().trim_end_matches('.').to_ascii_lowercase())
    .filter(|value| !value.is_empty())
    .collect()
}

fn wildcard_to_regex(pattern: &str) -> String {
  let body = pattern
    .split('*')
    .map(regex::escape)
    .collect::<Vec<_>>()
    .join("[^.]+(?:\\.[^.]+)*");
  format!("^{body}$")
}
