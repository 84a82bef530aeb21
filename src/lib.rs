#![doc = include_str!("../README.md")]
#![warn(missing_docs)]

pub mod config;
pub mod emit;
pub mod error;
pub mod format;
pub mod hosts;
pub mod logging;
pub mod models;
pub mod registry;
pub mod resources;

pub use config::{PushConfig, PushSettings};
pub use emit::{EmissionMode, EmitReport, HeadBuffer, HeaderList, PushEmitter, PushHooks, Transport};
pub use error::{ConfigError, SnapshotError};
pub use format::{format_link_header, format_link_tag};
pub use hosts::{HostAllowList, HostAllowance, SameOriginOnly};
pub use models::{AssetDescriptor, AssetKind, AssetVersion, Attribute, AttributeKey, PushResource};
pub use registry::{AssetRegistry, AssetSnapshot};
pub use resources::{Normalizer, SiteOrigin, collect};
