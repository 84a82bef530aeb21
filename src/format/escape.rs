use std::borrow::Cow;
use std::sync::OnceLock;

use percent_encoding::{AsciiSet, CONTROLS, utf8_percent_encode};
use regex::Regex;

/// Characters that may never appear raw in an emitted URL. `%` is kept so existing escapes
/// survive untouched.
const URL_UNSAFE: &AsciiSet = &CONTROLS
  .add(b' ')
  .add(b'"')
  .add(b'<')
  .add(b'>')
  .add(b'\\')
  .add(b'^')
  .add(b'`')
  .add(b'{')
  .add(b'}');

fn entity_pattern() -> &'static Regex {
  static PATTERN: OnceLock<Regex> = OnceLock::new();
  PATTERN.get_or_init(|| {
    Regex::new(r"&(?:[A-Za-z][A-Za-z0-9]*|#[0-9]+|#[xX][0-9A-Fa-f]+);").expect("invalid entity regex")
  })
}

/// Escape a URL for use outside of markup, such as inside a `Link` header.
pub fn escape_url(url: &str) -> String {
  utf8_percent_encode(url.trim(), URL_UNSAFE).to_string()
}

/// Escape a URL for use inside a single- or double-quoted HTML attribute.
pub fn escape_url_attr(url: &str) -> String {
  escape_url(url).replace('&', "&#038;").replace('\'', "&#039;")
}

/// Escape an arbitrary value for use inside an HTML attribute.
///
/// Character references that are already present are not encoded a second time.
pub fn escape_attr(value: &str) -> String {
  let mut escaped = String::with_capacity(value.len());
  let mut last = 0;

  for entity in entity_pattern().find_iter(value) {
    escaped.push_str(&escape_markup(&value[last..entity.start()]));
    escaped.push_str(entity.as_str());
    last = entity.end();
  }
  escaped.push_str(&escape_markup(&value[last..]));
  escaped
}

fn escape_markup(value: &str) -> Cow<'_, str> {
  if !value.contains(['&', '<', '>', '"', '\'']) {
    return Cow::Borrowed(value);
  }

  let mut escaped = String::with_capacity(value.len() + 8);
  for ch in value.chars() {
    match ch {
      '&' => escaped.push_str("&amp;"),
      '<' => escaped.push_str("&lt;"),
      '>' => escaped.push_str("&gt;"),
      '"' => escaped.push_str("&quot;"),
      '\'' => escaped.push_str("&#039;"),
      _ => escaped.push(ch),
    }
  }
  Cow::Owned(escaped)
}

/// Escape a value for a quoted-string `Link` header parameter.
pub fn escape_header_value(value: &str) -> String {
  let mut escaped = String::with_capacity(value.len());
  for ch in value.chars().filter(|ch| !ch.is_control()) {
    if ch == '"' || ch == '\\' {
      escaped.push('\\');
    }
    escaped.push(ch);
  }
  escaped
}

/// Whether `value` is a valid header token and can be emitted as a bare flag.
pub fn is_header_token(value: &str) -> bool {
  !value.is_empty()
    && value
      .bytes()
      .all(|byte| byte.is_ascii_alphanumeric() || b"!#$%&'*+-.^_`|~".contains(&byte))
}

/// Whether `value` can stand as a bare attribute name inside a tag.
pub fn is_attribute_name(value: &str) -> bool {
  !value.is_empty()
    && !value
      .chars()
      .any(|ch| ch.is_whitespace() || ch.is_control() || matches!(ch, '"' | '\'' | '<' | '>' | '/' | '='))
}
