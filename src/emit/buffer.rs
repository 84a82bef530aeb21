use std::io::{self, Write};
use std::sync::OnceLock;

use regex::Regex;

/// Captured head markup, written downstream exactly once.
///
/// The capture is released either explicitly with [`HeadBuffer::release`] or, on any other exit
/// path, when the buffer is dropped.
pub struct HeadBuffer<W: Write> {
  captured: String,
  sink: Option<W>,
}

impl<W: Write> HeadBuffer<W> {
  /// Start capturing output destined for `sink`.
  pub fn new(sink: W) -> Self {
    Self {
      captured: String::new(),
      sink: Some(sink),
    }
  }

  /// Append rendered markup to the capture.
  pub fn push_str(&mut self, markup: &str) {
    self.captured.push_str(markup);
  }

  /// Insert preload hints into the capture.
  ///
  /// Hints go right after the first character-encoding declaration so that it stays within the
  /// first bytes of the document; without one they are prepended.
  pub fn insert_hints(&mut self, markup: &str) {
    let at = charset_pattern()
      .find(&self.captured)
      .map_or(0, |charset| charset.end());
    self.captured.insert_str(at, markup);
  }

  /// Markup captured so far.
  pub fn captured(&self) -> &str {
    &self.captured
  }

  /// Write the capture downstream and hand back the sink.
  pub fn release(mut self) -> io::Result<W> {
    match self.sink.take() {
      Some(mut sink) => {
        write_all(&mut sink, &self.captured)?;
        Ok(sink)
      }
      None => Err(io::Error::other("head buffer already released")),
    }
  }
}

impl<W: Write> Drop for HeadBuffer<W> {
  fn drop(&mut self) {
    if let Some(mut sink) = self.sink.take() {
      if let Err(err) = write_all(&mut sink, &self.captured) {
        tracing::warn!(error = %err, "failed to release captured head output");
      }
    }
  }
}

fn charset_pattern() -> &'static Regex {
  static PATTERN: OnceLock<Regex> = OnceLock::new();
  PATTERN.get_or_init(|| {
    Regex::new(r#"(?i)<meta\s+(?:charset\s*=|http-equiv\s*=\s*["']?content-type)[^>]*>[ \t]*(?:\r?\n)?"#)
      .expect("invalid charset regex")
  })
}

fn write_all<W: Write>(sink: &mut W, captured: &str) -> io::Result<()> {
  sink.write_all(captured.as_bytes())?;
  sink.flush()
}
