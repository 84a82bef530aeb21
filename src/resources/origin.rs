use url::Url;

use crate::error::ConfigError;

/// Canonical origin of the site the page is rendered for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SiteOrigin {
  url: Url,
}

impl SiteOrigin {
  /// Parse the site URL. Any path component is ignored; only scheme, host and port matter.
  pub fn parse(site_url: &str) -> Result<Self, ConfigError> {
    let invalid = || ConfigError::SiteUrl {
      url: site_url.to_string(),
    };

    let mut url = Url::parse(site_url.trim()).map_err(|_| invalid())?;
    if url.host_str().is_none_or(str::is_empty) {
      return Err(invalid());
    }

    url.set_path("/");
    url.set_query(None);
    url.set_fragment(None);
    Ok(Self { url })
  }

  /// Host name of the site, lower-cased.
  pub fn host(&self) -> &str {
    self.url.host_str().unwrap_or_default()
  }

  /// Whether the site itself is served over TLS.
  pub fn is_secure(&self) -> bool {
    self.url.scheme() == "https"
  }

  /// Whether `candidate` is served from this site's host, whatever its scheme or port.
  pub fn is_same_host(&self, candidate: &Url) -> bool {
    candidate
      .host_str()
      .is_some_and(|host| host.eq_ignore_ascii_case(self.host()))
  }

  /// Whether `candidate` shares scheme, host and port with the site, so that a root-relative
  /// reference to it resolves to the same resource.
  pub fn is_same_origin(&self, candidate: &Url) -> bool {
    self.is_same_host(candidate)
      && candidate.scheme() == self.url.scheme()
      && candidate.port_or_known_default() == self.url.port_or_known_default()
  }

  /// Resolve a root-relative path against the site.
  pub fn resolve(&self, path: &str) -> Option<Url> {
    self.url.join(path).ok()
  }
}
