use std::io;

/// Response side of the host server that preload headers are sent through.
pub trait Transport {
  /// Whether response bytes have already been committed, making header changes impossible.
  fn headers_sent(&self) -> bool;
  /// Add a raw header line. `Link` headers are repeatable; earlier ones are never replaced.
  fn send_header(&mut self, line: &str) -> io::Result<()>;
}

/// In-memory transport collecting header lines until the response is committed.
#[derive(Debug, Clone, Default)]
pub struct HeaderList {
  lines: Vec<String>,
  committed: bool,
}

impl HeaderList {
  /// Transport whose response has already started streaming.
  pub fn committed() -> Self {
    Self {
      lines: Vec::new(),
      committed: true,
    }
  }

  /// Mark the response as committed.
  pub fn commit(&mut self) {
    self.committed = true;
  }

  /// Header lines sent so far.
  pub fn lines(&self) -> &[String] {
    &self.lines
  }
}

impl Transport for HeaderList {
  fn headers_sent(&self) -> bool {
    self.committed
  }

  fn send_header(&mut self, line: &str) -> io::Result<()> {
    if self.committed {
      return Err(io::Error::other("headers already sent"));
    }
    self.lines.push(line.to_string());
    Ok(())
  }
}
