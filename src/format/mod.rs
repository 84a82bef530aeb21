//! Serialization of push resources into `Link` headers and `<link>` tags.
//!
//! Formatting is pure: every function takes a resource and returns a string. Attributes with
//! non-scalar values or names outside the allowed set are dropped, never reported.

mod escape;
mod header;
mod tag;

use serde_json::Value;

use crate::models::{Attribute, AttributeKey};

pub use escape::{escape_attr, escape_header_value, escape_url, escape_url_attr};
pub use header::{HEADER_ATTRIBUTES, format_link_header};
pub use tag::{TAG_ATTRIBUTES, format_link_tag};

/// Attribute reduced to what the formatters emit.
#[derive(Debug, Clone, PartialEq, Eq)]
enum Rendered<'a> {
  /// `key=value` pair; the value is not escaped yet.
  Pair(&'a str, String),
  /// Bare flag.
  Flag(String),
}

/// Keep the attributes whose name is in `allowed`, plus positional flags, and reduce their
/// scalar values to strings.
fn render_attributes<'a>(attributes: &'a [Attribute], allowed: &[&str]) -> Vec<Rendered<'a>> {
  attributes
    .iter()
    .filter_map(|attribute| match &attribute.key {
      AttributeKey::Named(name) if allowed.contains(&name.as_str()) => match &attribute.value {
        Value::String(value) => Some(Rendered::Pair(name, value.clone())),
        Value::Number(value) => Some(Rendered::Pair(name, value.to_string())),
        Value::Bool(true) => Some(Rendered::Flag(name.clone())),
        _ => None,
      },
      AttributeKey::Named(_) => None,
      AttributeKey::Positional => match &attribute.value {
        Value::String(flag) if !flag.trim().is_empty() => Some(Rendered::Flag(flag.trim().to_string())),
        _ => None,
      },
    })
    .collect()
}
