use std::borrow::Cow;

use percent_encoding::{AsciiSet, CONTROLS, utf8_percent_encode};
use url::{Position, Url};

use crate::hosts::HostAllowance;
use crate::models::AssetDescriptor;
use crate::resources::SiteOrigin;

/// Query parameter carrying the asset version.
pub const VERSION_QUERY_ARG: &str = "ver";

/// Eligibility checks and URL shaping for a single render pass.
pub struct Normalizer<'a> {
  site: &'a SiteOrigin,
  allowance: &'a dyn HostAllowance,
  secure: bool,
  default_version: &'a str,
}

impl<'a> Normalizer<'a> {
  /// Create a normalizer for `site`. The request counts as secured when the site is served
  /// over TLS, and the crate version is used as default asset version.
  pub fn new(site: &'a SiteOrigin, allowance: &'a dyn HostAllowance) -> Self {
    Self {
      site,
      allowance,
      secure: site.is_secure(),
      default_version: crate::config::DEFAULT_VERSION,
    }
  }

  /// Whether the current request is served over TLS.
  pub fn secure(mut self, secure: bool) -> Self {
    self.secure = secure;
    self
  }

  /// Version appended to assets registered without an explicit one.
  pub fn default_version(mut self, default_version: &'a str) -> Self {
    self.default_version = default_version;
    self
  }

  /// Shape the source of `descriptor` into the href of a preload hint.
  ///
  /// Returns `None` when the asset is not eligible: conditional, without source, unparsable
  /// or hosted on a host the allowance rejects.
  pub fn normalize(&self, descriptor: &AssetDescriptor) -> Option<String> {
    if descriptor.conditional {
      tracing::debug!(handle = %descriptor.handle, "skipping conditional asset");
      return None;
    }

    let src = descriptor.src.trim();
    if src.is_empty() {
      tracing::debug!(handle = %descriptor.handle, "skipping asset without source");
      return None;
    }

    let src = complete_protocol(src, self.secure);
    let (mut url, relative) = if src.starts_with('/') {
      (self.site.resolve(&src)?, true)
    } else {
      if !has_authority(&src) {
        tracing::debug!(handle = %descriptor.handle, src = %src, "skipping source without host");
        return None;
      }

      let url = match Url::parse(&src) {
        Ok(url) => url,
        Err(err) => {
          tracing::debug!(handle = %descriptor.handle, src = %src, error = %err, "skipping unparsable source");
          return None;
        }
      };

      if !self.site.is_same_host(&url) {
        let host = url.host_str().unwrap_or_default();
        if !self.allowance.is_allowed(false, host) {
          tracing::debug!(handle = %descriptor.handle, host, "skipping asset from foreign host");
          return None;
        }
      }
      let relative = self.site.is_same_origin(&url);
      (url, relative)
    };

    if let Some(version) = descriptor.version.resolve(self.default_version) {
      set_query_arg(&mut url, VERSION_QUERY_ARG, version);
    }

    Some(if relative {
      url[Position::BeforePath..].to_string()
    } else {
      url.to_string()
    })
  }
}

/// Give scheme-relative and scheme-less sources the scheme of the current request.
fn complete_protocol(src: &str, secure: bool) -> Cow<'_, str> {
  if src.starts_with("//") || (!src.contains(':') && !src.starts_with('/')) {
    let scheme = if secure { "https:" } else { "http:" };
    Cow::Owned(format!("{scheme}{src}"))
  } else {
    Cow::Borrowed(src)
  }
}

/// Whether an absolute source names its host explicitly (`scheme://host/...`).
///
/// `https:example.test/a.js` is a path, not a host, even though URL parsers are lenient with
/// special schemes.
fn has_authority(src: &str) -> bool {
  src
    .split_once(':')
    .is_some_and(|(_, rest)| rest.starts_with("//"))
}

/// Bytes escaped in a query value; `&`, `=`, `+` and `#` would change the query structure.
const QUERY_VALUE: &AsciiSet = &CONTROLS
  .add(b' ')
  .add(b'"')
  .add(b'#')
  .add(b'&')
  .add(b'+')
  .add(b'<')
  .add(b'=')
  .add(b'>');

/// Set `key` in the query string, replacing any previous value. Other pairs are kept verbatim.
fn set_query_arg(url: &mut Url, key: &str, value: &str) {
  let mut query = url
    .query()
    .unwrap_or_default()
    .split('&')
    .filter(|pair| !pair.is_empty() && pair.split('=').next() != Some(key))
    .collect::<Vec<_>>()
    .join("&");

  if !query.is_empty() {
    query.push('&');
  }
  query.push_str(key);
  query.push('=');
  query.extend(utf8_percent_encode(value, QUERY_VALUE));
  url.set_query(Some(&query));
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::hosts::SameOriginOnly;
  use crate::models::{AssetKind, AssetVersion};

  fn site() -> SiteOrigin {
    SiteOrigin::parse("https://example.test").unwrap()
  }

  fn script(src: &str, version: AssetVersion) -> AssetDescriptor {
    AssetDescriptor::new(AssetKind::Script, "my-script", src).with_version(version)
  }

  fn v1() -> AssetVersion {
    AssetVersion::Explicit("1.0".into())
  }

  #[test]
  fn relativizes_absolute_same_origin_sources() {
    let site = site();
    let normalizer = Normalizer::new(&site, &SameOriginOnly);
    let href = normalizer.normalize(&script("https://example.test/script.js", v1()));
    assert_eq!(href.as_deref(), Some("/script.js?ver=1.0"));
  }

  #[test]
  fn root_relative_sources_skip_host_check() {
    let site = site();
    let deny_all = |_: bool, _: &str| false;
    let normalizer = Normalizer::new(&site, &deny_all);
    let href = normalizer.normalize(&script("/style.css", v1()));
    assert_eq!(href.as_deref(), Some("/style.css?ver=1.0"));
  }

  #[test]
  fn scheme_relative_sources_get_default_version() {
    let site = site();
    let normalizer = Normalizer::new(&site, &SameOriginOnly).default_version("6.4.2");
    let href = normalizer.normalize(&script("//example.test/script.js", AssetVersion::Default));
    assert_eq!(href.as_deref(), Some("/script.js?ver=6.4.2"));
  }

  #[test]
  fn scheme_relative_sources_follow_request_scheme() {
    let site = SiteOrigin::parse("http://example.test").unwrap();
    let normalizer = Normalizer::new(&site, &SameOriginOnly).secure(false);
    let href = normalizer.normalize(&script("//example.test/a.js", v1()));
    assert_eq!(href.as_deref(), Some("/a.js?ver=1.0"));
  }

  #[test]
  fn unversioned_sources_keep_their_url() {
    let site = site();
    let normalizer = Normalizer::new(&site, &SameOriginOnly);
    let href = normalizer.normalize(&script("/style.css", AssetVersion::Unversioned));
    assert_eq!(href.as_deref(), Some("/style.css"));
  }

  #[test]
  fn version_merges_with_existing_query() {
    let site = site();
    let normalizer = Normalizer::new(&site, &SameOriginOnly);

    let appended = normalizer.normalize(&script("/a.js?lang=de", v1()));
    assert_eq!(appended.as_deref(), Some("/a.js?lang=de&ver=1.0"));

    let replaced = normalizer.normalize(&script("/a.js?ver=0.9&lang=de", v1()));
    assert_eq!(replaced.as_deref(), Some("/a.js?lang=de&ver=1.0"));
  }

  #[test]
  fn skips_conditional_and_empty_sources() {
    let site = site();
    let normalizer = Normalizer::new(&site, &SameOriginOnly);
    assert_eq!(normalizer.normalize(&script("/a.js", v1()).conditional()), None);
    assert_eq!(normalizer.normalize(&script("", v1())), None);
    assert_eq!(normalizer.normalize(&script("   ", v1())), None);
  }

  #[test]
  fn foreign_hosts_need_an_allowance() {
    let site = site();
    let descriptor = script("https://external.test/script.js", AssetVersion::Unversioned);

    let denied = Normalizer::new(&site, &SameOriginOnly).normalize(&descriptor);
    assert_eq!(denied, None);

    let allow = |allowed: bool, host: &str| allowed || host == "external.test";
    let allowed = Normalizer::new(&site, &allow).normalize(&descriptor);
    assert_eq!(allowed.as_deref(), Some("https://external.test/script.js"));
  }

  #[test]
  fn scheme_less_relative_sources_are_skipped() {
    let site = site();
    let allow_all = |_: bool, _: &str| true;
    let normalizer = Normalizer::new(&site, &allow_all);
    assert_eq!(normalizer.normalize(&script("example.test/a.js", v1())), None);
    assert_eq!(normalizer.normalize(&script("assets/a.js", v1())), None);
    assert_eq!(normalizer.normalize(&script("https:example.test/a.js", v1())), None);
  }

  #[test]
  fn other_ports_on_the_site_host_stay_absolute() {
    let site = site();
    let normalizer = Normalizer::new(&site, &SameOriginOnly);
    let href = normalizer.normalize(&script("https://example.test:8443/a.js", v1()));
    assert_eq!(href.as_deref(), Some("https://example.test:8443/a.js?ver=1.0"));
  }

  #[test]
  fn other_schemes_on_the_site_host_stay_absolute() {
    let site = site();
    let normalizer = Normalizer::new(&site, &SameOriginOnly);
    let href = normalizer.normalize(&script("http://example.test/a.js", v1()));
    assert_eq!(href.as_deref(), Some("http://example.test/a.js?ver=1.0"));
  }

  #[test]
  fn version_replacement_keeps_other_pairs_verbatim() {
    let site = site();
    let normalizer = Normalizer::new(&site, &SameOriginOnly);
    let beta = AssetVersion::Explicit("1.0 beta".into());

    let href = normalizer.normalize(&script("/a.js?ver=0.9&flag&q=a%20b", beta.clone()));
    assert_eq!(href.as_deref(), Some("/a.js?flag&q=a%20b&ver=1.0%20beta"));

    let href = normalizer.normalize(&script("/a.js", beta));
    assert_eq!(href.as_deref(), Some("/a.js?ver=1.0%20beta"));
  }

  #[test]
  fn completes_missing_protocols() {
    assert_eq!(complete_protocol("//cdn.test/a.js", true), "https://cdn.test/a.js");
    assert_eq!(complete_protocol("cdn.test/a.js", false), "http:cdn.test/a.js");
    assert_eq!(complete_protocol("/a.js", true), "/a.js");
    assert_eq!(complete_protocol("https://cdn.test/a.js", false), "https://cdn.test/a.js");
  }
}
