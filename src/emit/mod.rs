//! Render-pass driver deciding whether hints go out as headers or as markup.
//!
//! The emitter moves through `Idle → Buffering → Collecting → Emitted`. Hints are strictly
//! best-effort: a missing buffer, a committed response or a failing transport degrade the
//! output but never abort rendering.

mod buffer;
mod hooks;
mod transport;

use std::io::Write;
use std::mem;

use crate::config::PushSettings;
use crate::format::{format_link_header, format_link_tag};
use crate::hosts::HostAllowance;
use crate::models::PushResource;
use crate::registry::AssetRegistry;
use crate::resources::collect;

pub use buffer::HeadBuffer;
pub use hooks::PushHooks;
pub use transport::{HeaderList, Transport};

/// How preload hints are delivered for a render pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EmissionMode {
  /// One `Link` response header per resource.
  Header,
  /// One `<link rel='preload'>` tag per resource, inserted into the head markup.
  Tag,
}

/// Summary of what an emission produced.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct EmitReport {
  /// Number of `Link` headers sent.
  pub headers: usize,
  /// Number of `<link>` tags written into the head markup.
  pub tags: usize,
}

impl EmitReport {
  /// Returns true when nothing was emitted.
  pub fn is_empty(&self) -> bool {
    self.headers == 0 && self.tags == 0
  }
}

enum State<W: Write> {
  Idle,
  Buffering(HeadBuffer<W>),
  Collecting {
    buffer: HeadBuffer<W>,
    resources: Vec<PushResource>,
    mode: EmissionMode,
  },
  Emitted,
}

/// Drives one render pass from head capture to emitted hints.
pub struct PushEmitter<'h, W: Write> {
  settings: &'h PushSettings,
  hooks: PushHooks<'h>,
  state: State<W>,
}

impl<'h, W: Write> PushEmitter<'h, W> {
  /// Create an idle emitter.
  pub fn new(settings: &'h PushSettings, hooks: PushHooks<'h>) -> Self {
    Self {
      settings,
      hooks,
      state: State::Idle,
    }
  }

  /// Start capturing head output destined for `sink`.
  ///
  /// Ignored unless the emitter is idle.
  pub fn start_buffering(&mut self, sink: W) {
    if matches!(self.state, State::Idle) {
      self.state = State::Buffering(HeadBuffer::new(sink));
    } else {
      tracing::debug!("head buffering already started");
    }
  }

  /// Append rendered head markup to the capture. Returns false when nothing is capturing.
  pub fn capture(&mut self, markup: &str) -> bool {
    match &mut self.state {
      State::Buffering(buffer) | State::Collecting { buffer, .. } => {
        buffer.push_str(markup);
        true
      }
      State::Idle | State::Emitted => false,
    }
  }

  /// Mode decided by [`PushEmitter::collect`], if collection happened.
  pub fn mode(&self) -> Option<EmissionMode> {
    match &self.state {
      State::Collecting { mode, .. } => Some(*mode),
      _ => None,
    }
  }

  /// Resources gathered by [`PushEmitter::collect`].
  pub fn resources(&self) -> &[PushResource] {
    match &self.state {
      State::Collecting { resources, .. } => resources,
      _ => &[],
    }
  }

  /// Gather resources from `registry` and decide the emission mode.
  ///
  /// Runs once per pass and only while head buffering is active; later calls keep the first
  /// result.
  pub fn collect<R, T>(&mut self, registry: &R, transport: &T)
  where
    R: AssetRegistry + ?Sized,
    T: Transport + ?Sized,
  {
    let buffer = match mem::replace(&mut self.state, State::Emitted) {
      State::Buffering(buffer) => buffer,
      other => {
        match other {
          State::Idle => tracing::debug!("head buffering never started; nothing to collect"),
          State::Collecting { .. } => tracing::debug!("resources already collected for this pass"),
          _ => tracing::debug!("preload hints already emitted for this pass"),
        }
        self.state = other;
        return;
      }
    };

    let allowance: &dyn HostAllowance = match self.hooks.allowance() {
      Some(allowance) => allowance,
      None => &self.settings.allow_list,
    };
    let normalizer = self.settings.normalizer(allowance);
    let resources = self.hooks.filter(collect(registry, &normalizer));
    let mode = self.decide_mode(transport);
    tracing::debug!(count = resources.len(), ?mode, "push resources ready");

    self.state = State::Collecting {
      buffer,
      resources,
      mode,
    };
  }

  fn decide_mode<T: Transport + ?Sized>(&self, transport: &T) -> EmissionMode {
    let committed = transport.headers_sent();
    let default_as_header = !committed && !self.settings.prefer_link_tags;
    if !committed && self.hooks.prefer_headers(default_as_header) {
      EmissionMode::Header
    } else {
      EmissionMode::Tag
    }
  }

  /// Emit the collected hints and release the captured head output downstream.
  ///
  /// Without an active buffer nothing is emitted. Resources whose header could not be sent
  /// fall back to tags, placed after the captured charset declaration if there is one.
  pub fn emit<T>(&mut self, transport: &mut T) -> EmitReport
  where
    T: Transport + ?Sized,
  {
    let mut report = EmitReport::default();
    let (mut buffer, resources, mode) = match mem::replace(&mut self.state, State::Emitted) {
      State::Collecting {
        buffer,
        resources,
        mode,
      } => (buffer, resources, mode),
      State::Buffering(buffer) => {
        tracing::debug!("no resources collected; releasing head output unchanged");
        release(buffer);
        return report;
      }
      State::Idle | State::Emitted => {
        tracing::debug!("head buffering never started; skipping preload hints");
        return report;
      }
    };

    let mut pending = resources.as_slice();
    if mode == EmissionMode::Header {
      if transport.headers_sent() {
        tracing::debug!("response committed before emission; falling back to tags");
      }
      while let Some((resource, rest)) = pending.split_first() {
        if transport.headers_sent() {
          break;
        }
        if let Err(err) = transport.send_header(&format_link_header(resource)) {
          tracing::warn!(error = %err, href = resource.href(), "failed to send preload header");
          break;
        }
        report.headers += 1;
        pending = rest;
      }
    }

    if !pending.is_empty() {
      let tags: String = pending.iter().map(format_link_tag).collect();
      buffer.insert_hints(&tags);
      report.tags = pending.len();
    }

    release(buffer);
    tracing::debug!(headers = report.headers, tags = report.tags, "preload hints emitted");
    report
  }
}

fn release<W: Write>(buffer: HeadBuffer<W>) {
  if let Err(err) = buffer.release() {
    tracing::warn!(error = %err, "failed to release captured head output");
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::models::{AssetDescriptor, AssetKind, AssetVersion};
  use crate::registry::AssetSnapshot;

  fn settings() -> PushSettings {
    PushSettings::for_site("https://example.test").unwrap()
  }

  fn snapshot() -> AssetSnapshot {
    let mut snapshot = AssetSnapshot::default();
    snapshot
      .enqueue(
        AssetDescriptor::new(AssetKind::Style, "theme", "/theme.css")
          .with_version(AssetVersion::Unversioned),
      )
      .enqueue(
        AssetDescriptor::new(AssetKind::Script, "app", "/app.js")
          .with_version(AssetVersion::Explicit("1.0".into())),
      );
    snapshot
  }

  #[test]
  fn sends_headers_before_commit() {
    let settings = settings();
    let mut out = Vec::new();
    let mut transport = HeaderList::default();

    let mut emitter = PushEmitter::new(&settings, PushHooks::default());
    emitter.start_buffering(&mut out);
    emitter.capture("<title>Home</title>\n");
    emitter.collect(&snapshot(), &transport);
    assert_eq!(emitter.mode(), Some(EmissionMode::Header));

    let report = emitter.emit(&mut transport);
    drop(emitter);

    assert_eq!(report, EmitReport { headers: 2, tags: 0 });
    assert_eq!(transport.lines(), [
      r#"Link: </theme.css>; rel=preload; as="style""#.to_string(),
      r#"Link: </app.js?ver=1.0>; rel=preload; as="script""#.to_string(),
    ]);
    assert_eq!(String::from_utf8(out).unwrap(), "<title>Home</title>\n");
  }

  #[test]
  fn writes_tags_once_response_is_committed() {
    let settings = settings();
    let mut out = Vec::new();
    let mut transport = HeaderList::committed();

    let mut emitter = PushEmitter::new(&settings, PushHooks::default().mode_override(|_| true));
    emitter.start_buffering(&mut out);
    emitter.capture("<title>Home</title>\n");
    emitter.collect(&snapshot(), &transport);
    assert_eq!(emitter.mode(), Some(EmissionMode::Tag));

    let report = emitter.emit(&mut transport);
    drop(emitter);

    assert_eq!(report, EmitReport { headers: 0, tags: 2 });
    assert!(transport.lines().is_empty());
    assert_eq!(
      String::from_utf8(out).unwrap(),
      "<link rel='preload' href='/theme.css' as='style' />\n\
       <link rel='preload' href='/app.js?ver=1.0' as='script' />\n\
       <title>Home</title>\n"
    );
  }

  #[test]
  fn tags_follow_the_charset_declaration() {
    let settings = settings();
    let mut out = Vec::new();
    let mut transport = HeaderList::committed();

    let mut emitter = PushEmitter::new(&settings, PushHooks::default());
    emitter.start_buffering(&mut out);
    emitter.capture("<meta charset='utf-8'>\n<title>Home</title>\n");
    emitter.collect(&snapshot(), &transport);
    emitter.emit(&mut transport);
    drop(emitter);

    assert_eq!(
      String::from_utf8(out).unwrap(),
      "<meta charset='utf-8'>\n\
       <link rel='preload' href='/theme.css' as='style' />\n\
       <link rel='preload' href='/app.js?ver=1.0' as='script' />\n\
       <title>Home</title>\n"
    );
  }

  #[test]
  fn second_collect_keeps_the_first_result() {
    let settings = settings();
    let mut emitter = PushEmitter::new(&settings, PushHooks::default());
    emitter.start_buffering(Vec::new());
    emitter.collect(&snapshot(), &HeaderList::default());

    emitter.collect(&AssetSnapshot::default(), &HeaderList::committed());
    assert_eq!(emitter.mode(), Some(EmissionMode::Header));
    assert_eq!(emitter.resources().len(), 2);
  }

  #[test]
  fn override_can_downgrade_to_tags() {
    let settings = settings();
    let transport = HeaderList::default();
    let mut emitter = PushEmitter::new(&settings, PushHooks::default().mode_override(|_| false));
    emitter.start_buffering(Vec::new());
    emitter.collect(&snapshot(), &transport);
    assert_eq!(emitter.mode(), Some(EmissionMode::Tag));
  }

  #[test]
  fn preferring_tags_changes_the_default_passed_to_the_override() {
    let mut settings = settings();
    settings.prefer_link_tags = true;
    let transport = HeaderList::default();

    let mut emitter = PushEmitter::new(&settings, PushHooks::default());
    emitter.start_buffering(Vec::new());
    emitter.collect(&snapshot(), &transport);
    assert_eq!(emitter.mode(), Some(EmissionMode::Tag));

    let mut emitter = PushEmitter::new(&settings, PushHooks::default().mode_override(|_| true));
    emitter.start_buffering(Vec::new());
    emitter.collect(&snapshot(), &transport);
    assert_eq!(emitter.mode(), Some(EmissionMode::Header));
  }

  #[test]
  fn falls_back_to_tags_when_commit_happens_after_collection() {
    let settings = settings();
    let mut out = Vec::new();
    let mut transport = HeaderList::default();

    let mut emitter = PushEmitter::new(&settings, PushHooks::default());
    emitter.start_buffering(&mut out);
    emitter.collect(&snapshot(), &transport);
    transport.commit();

    let report = emitter.emit(&mut transport);
    drop(emitter);

    assert_eq!(report, EmitReport { headers: 0, tags: 2 });
    assert!(String::from_utf8(out).unwrap().starts_with("<link rel='preload' href='/theme.css'"));
  }

  #[test]
  fn emits_nothing_without_buffering() {
    let settings = settings();
    let mut transport = HeaderList::default();
    let mut emitter: PushEmitter<'_, Vec<u8>> = PushEmitter::new(&settings, PushHooks::default());

    emitter.collect(&snapshot(), &transport);
    assert!(!emitter.capture("<title>x</title>"));
    assert_eq!(emitter.mode(), None);

    let report = emitter.emit(&mut transport);
    assert!(report.is_empty());
    assert!(transport.lines().is_empty());
  }

  #[test]
  fn post_filter_and_allowance_hooks_shape_resources() {
    let settings = settings();
    let mut snapshot = snapshot();
    snapshot.enqueue(
      AssetDescriptor::new(AssetKind::Script, "cdn", "https://cdn.test/lib.js")
        .with_version(AssetVersion::Unversioned),
    );
    let transport = HeaderList::default();

    let hooks = PushHooks::default()
      .allow_hosts(|allowed: bool, host: &str| allowed || host == "cdn.test")
      .post_filter(|resources| {
        resources
          .into_iter()
          .filter(|resource| resource.kind() == AssetKind::Script)
          .collect()
      });
    let mut emitter = PushEmitter::new(&settings, hooks);
    emitter.start_buffering(Vec::new());
    emitter.collect(&snapshot, &transport);

    let hrefs: Vec<&str> = emitter.resources().iter().map(PushResource::href).collect();
    assert_eq!(hrefs, vec!["/app.js?ver=1.0", "https://cdn.test/lib.js"]);
  }

  #[test]
  fn dropping_mid_pass_still_releases_head_output() {
    let settings = settings();
    let mut out = Vec::new();
    {
      let mut emitter = PushEmitter::new(&settings, PushHooks::default());
      emitter.start_buffering(&mut out);
      emitter.capture("<title>Home</title>");
      emitter.collect(&snapshot(), &HeaderList::default());
    }
    assert_eq!(out, b"<title>Home</title>");
  }
}
