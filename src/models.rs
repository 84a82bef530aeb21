//! Data structures shared by the collector, the normalizer and the formatter.

use std::fmt;

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use url::Url;

/// Kind of asset registered with the host page.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum AssetKind {
  /// JavaScript resource.
  Script,
  /// Stylesheet resource.
  Style,
}

impl AssetKind {
  /// Value used for the `as` attribute of a preload hint.
  pub fn as_str(self) -> &'static str {
    match self {
      Self::Script => "script",
      Self::Style => "style",
    }
  }
}

impl fmt::Display for AssetKind {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(self.as_str())
  }
}

/// Version attached to a registered asset.
///
/// In snapshot JSON a missing `ver` field means [`AssetVersion::Default`], an explicit `null`
/// means [`AssetVersion::Unversioned`] and a string is kept as [`AssetVersion::Explicit`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub enum AssetVersion {
  /// Never append a `ver` query parameter.
  Unversioned,
  /// Append the fallback default version.
  #[default]
  Default,
  /// Append this version, unless it is falsy.
  Explicit(String),
}

impl AssetVersion {
  /// Resolve the value of the `ver` parameter, if one should be appended.
  pub fn resolve<'a>(&'a self, default_version: &'a str) -> Option<&'a str> {
    match self {
      Self::Unversioned => None,
      Self::Default => Some(default_version),
      Self::Explicit(value) if is_falsy(value) => Some(default_version),
      Self::Explicit(value) => Some(value.as_str()),
    }
  }
}

fn is_falsy(value: &str) -> bool {
  value.is_empty() || value == "0"
}

impl<'de> Deserialize<'de> for AssetVersion {
  fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
    let value = Option::<String>::deserialize(deserializer)?;
    Ok(match value {
      Some(value) => Self::Explicit(value),
      None => Self::Unversioned,
    })
  }
}

/// Registered asset as reported by the host registry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssetDescriptor {
  /// Unique identifier the asset was registered under.
  pub handle: String,
  /// Source URL: absolute, root-relative, scheme-relative or empty.
  pub src: String,
  /// Version used for cache busting.
  pub version: AssetVersion,
  /// Asset is wrapped in conditional markup and must never be pushed.
  pub conditional: bool,
  /// Whether the asset is a script or a stylesheet.
  pub kind: AssetKind,
}

impl AssetDescriptor {
  /// Describe an unconditional asset using the default version.
  pub fn new(kind: AssetKind, handle: impl Into<String>, src: impl Into<String>) -> Self {
    Self {
      handle: handle.into(),
      src: src.into(),
      version: AssetVersion::Default,
      conditional: false,
      kind,
    }
  }

  /// Replace the version of the descriptor.
  pub fn with_version(mut self, version: AssetVersion) -> Self {
    self.version = version;
    self
  }

  /// Mark the descriptor as conditional.
  pub fn conditional(mut self) -> Self {
    self.conditional = true;
    self
  }
}

/// Key of a preload attribute.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AttributeKey {
  /// `key=value` attribute.
  Named(String),
  /// Bare flag; the attribute value is the flag itself.
  Positional,
}

/// Single attribute attached to a [`PushResource`].
#[derive(Debug, Clone, PartialEq)]
pub struct Attribute {
  /// Attribute name, or [`AttributeKey::Positional`] for bare flags.
  pub key: AttributeKey,
  /// Attribute value. Only scalars are ever serialized.
  pub value: Value,
}

impl Attribute {
  /// Named attribute.
  pub fn named(key: impl Into<String>, value: impl Into<Value>) -> Self {
    Self {
      key: AttributeKey::Named(key.into()),
      value: value.into(),
    }
  }

  /// Positional flag such as `nopush`.
  pub fn flag(value: impl Into<Value>) -> Self {
    Self {
      key: AttributeKey::Positional,
      value: value.into(),
    }
  }

  /// Name of the attribute when it is named.
  pub fn name(&self) -> Option<&str> {
    match &self.key {
      AttributeKey::Named(name) => Some(name),
      AttributeKey::Positional => None,
    }
  }
}

/// Script or stylesheet selected for a preload hint.
///
/// Built fresh for every render pass and discarded once formatted.
#[derive(Debug, Clone, PartialEq)]
pub struct PushResource {
  href: String,
  kind: AssetKind,
  attributes: Vec<Attribute>,
}

impl PushResource {
  /// Build a resource, rejecting empty hrefs and non-HTTP schemes.
  pub fn new(href: impl Into<String>, kind: AssetKind) -> Option<Self> {
    let href = href.into();
    let trimmed = href.trim();
    if trimmed.is_empty() || !has_fetchable_scheme(trimmed) {
      return None;
    }

    Some(Self {
      href: trimmed.to_string(),
      kind,
      attributes: Vec::new(),
    })
  }

  /// Append an extra attribute, keeping insertion order.
  pub fn with_attribute(mut self, attribute: Attribute) -> Self {
    self.attributes.push(attribute);
    self
  }

  /// Final serialized URL.
  pub fn href(&self) -> &str {
    &self.href
  }

  /// Kind used for the `as` attribute.
  pub fn kind(&self) -> AssetKind {
    self.kind
  }

  /// Extra attributes in insertion order.
  pub fn attributes(&self) -> &[Attribute] {
    &self.attributes
  }

  /// Full attribute list: `href`, `as`, then the extra attributes.
  ///
  /// A named extra attribute replaces an earlier attribute with the same name in place.
  pub fn attribute_set(&self) -> Vec<Attribute> {
    let mut set = Vec::with_capacity(self.attributes.len() + 2);
    set.push(Attribute::named("href", self.href.as_str()));
    set.push(Attribute::named("as", self.kind.as_str()));

    for attribute in &self.attributes {
      let existing = attribute
        .name()
        .and_then(|name| set.iter().position(|entry| entry.name() == Some(name)));
      match existing {
        Some(index) => set[index] = attribute.clone(),
        None => set.push(attribute.clone()),
      }
    }
    set
  }
}

fn has_fetchable_scheme(href: &str) -> bool {
  if href.starts_with('/') {
    return true;
  }

  match Url::parse(href) {
    Ok(url) => matches!(url.scheme(), "http" | "https"),
    // Relative references without a scheme resolve against the page.
    Err(url::ParseError::RelativeUrlWithoutBase) => true,
    Err(_) => false,
  }
}
