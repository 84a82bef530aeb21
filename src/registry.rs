//! Read-only view of the scripts and styles enqueued for a render pass.

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use serde::Deserialize;

use crate::error::SnapshotError;
use crate::models::{AssetDescriptor, AssetKind, AssetVersion};

/// Host registry of enqueued assets.
///
/// Handle lists are already dependency-resolved and de-duplicated by the host; consumers never
/// reorder them.
pub trait AssetRegistry {
  /// Resolved stylesheet handles in output order.
  fn list_styles(&self) -> Vec<String>;
  /// Resolved script handles in output order.
  fn list_scripts(&self) -> Vec<String>;
  /// Descriptor registered for `handle` in the registry of `kind`.
  fn lookup(&self, kind: AssetKind, handle: &str) -> Option<AssetDescriptor>;
}

/// Registration details of a single asset inside a snapshot.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RegisteredAsset {
  /// Source URL of the asset.
  #[serde(default)]
  pub src: String,
  /// Version, see [`AssetVersion`] for the JSON encoding.
  #[serde(default, rename = "ver")]
  pub version: AssetVersion,
  /// Asset is wrapped in conditional markup.
  #[serde(default)]
  pub conditional: bool,
}

/// Resolved queue and registrations for one asset kind.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AssetQueue {
  /// Handles in resolved output order.
  #[serde(default)]
  pub order: Vec<String>,
  /// Registered assets keyed by handle.
  #[serde(default)]
  pub registered: BTreeMap<String, RegisteredAsset>,
}

/// Snapshot of the host registries taken at the start of a render pass.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AssetSnapshot {
  /// Stylesheet queue.
  #[serde(default)]
  pub styles: AssetQueue,
  /// Script queue.
  #[serde(default)]
  pub scripts: AssetQueue,
}

impl AssetSnapshot {
  /// Load a snapshot from a JSON file.
  pub fn load_from_path(path: impl AsRef<Path>) -> Result<Self, SnapshotError> {
    let path = path.as_ref();
    let contents = fs::read_to_string(path).map_err(|err| SnapshotError::Io {
      path: path.to_path_buf(),
      source: err,
    })?;

    serde_json::from_str(&contents).map_err(|err| SnapshotError::Parse {
      path: path.to_path_buf(),
      source: err,
    })
  }

  /// Register and enqueue a descriptor at the end of its kind's queue.
  pub fn enqueue(&mut self, descriptor: AssetDescriptor) -> &mut Self {
    let queue = self.queue_mut(descriptor.kind);
    if !queue.order.contains(&descriptor.handle) {
      queue.order.push(descriptor.handle.clone());
    }
    queue.registered.insert(
      descriptor.handle,
      RegisteredAsset {
        src: descriptor.src,
        version: descriptor.version,
        conditional: descriptor.conditional,
      },
    );
    self
  }

  fn queue(&self, kind: AssetKind) -> &AssetQueue {
    match kind {
      AssetKind::Script => &self.scripts,
      AssetKind::Style => &self.styles,
    }
  }

  fn queue_mut(&mut self, kind: AssetKind) -> &mut AssetQueue {
    match kind {
      AssetKind::Script => &mut self.scripts,
      AssetKind::Style => &mut self.styles,
    }
  }
}

impl AssetRegistry for AssetSnapshot {
  fn list_styles(&self) -> Vec<String> {
    self.styles.order.clone()
  }

  fn list_scripts(&self) -> Vec<String> {
    self.scripts.order.clone()
  }

  fn lookup(&self, kind: AssetKind, handle: &str) -> Option<AssetDescriptor> {
    let asset = self.queue(kind).registered.get(handle)?;
    Some(AssetDescriptor {
      handle: handle.to_string(),
      src: asset.src.clone(),
      version: asset.version.clone(),
      conditional: asset.conditional,
      kind,
    })
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use tempfile::tempdir;

  #[test]
  fn enqueue_keeps_order_per_kind() {
    let mut snapshot = AssetSnapshot::default();
    snapshot
      .enqueue(AssetDescriptor::new(AssetKind::Script, "b", "/b.js"))
      .enqueue(AssetDescriptor::new(AssetKind::Style, "main", "/main.css"))
      .enqueue(AssetDescriptor::new(AssetKind::Script, "a", "/a.js"));

    assert_eq!(snapshot.list_scripts(), vec!["b".to_string(), "a".to_string()]);
    assert_eq!(snapshot.list_styles(), vec!["main".to_string()]);
  }

  #[test]
  fn lookup_is_scoped_to_kind() {
    let mut snapshot = AssetSnapshot::default();
    snapshot
      .enqueue(AssetDescriptor::new(AssetKind::Script, "shared", "/shared.js"))
      .enqueue(AssetDescriptor::new(AssetKind::Style, "shared", "/shared.css"));

    let script = snapshot.lookup(AssetKind::Script, "shared").unwrap();
    let style = snapshot.lookup(AssetKind::Style, "shared").unwrap();
    assert_eq!(script.src, "/shared.js");
    assert_eq!(style.src, "/shared.css");
    assert!(snapshot.lookup(AssetKind::Script, "missing").is_none());
  }

  #[test]
  fn load_from_path_reads_snapshot() {
    let temp = tempdir().expect("failed to create temp dir");
    let path = temp.path().join("assets.json");
    std::fs::write(
      &path,
      r#"{
        "styles": {"order": ["theme"], "registered": {"theme": {"src": "/theme.css", "ver": null}}},
        "scripts": {"order": ["ie"], "registered": {"ie": {"src": "/ie.js", "conditional": true}}}
      }"#,
    )
    .expect("failed to write snapshot");

    let snapshot = AssetSnapshot::load_from_path(&path).expect("snapshot should load");
    let theme = snapshot.lookup(AssetKind::Style, "theme").unwrap();
    let ie = snapshot.lookup(AssetKind::Script, "ie").unwrap();

    assert_eq!(theme.version, AssetVersion::Unversioned);
    assert!(ie.conditional);
    assert_eq!(ie.version, AssetVersion::Default);
  }

  #[test]
  fn load_from_path_reports_missing_file() {
    let temp = tempdir().expect("failed to create temp dir");
    let err = AssetSnapshot::load_from_path(temp.path().join("missing.json")).unwrap_err();
    assert!(matches!(err, SnapshotError::Io { .. }));
  }
}
