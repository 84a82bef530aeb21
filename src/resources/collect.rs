use crate::models::{AssetKind, PushResource};
use crate::registry::AssetRegistry;
use crate::resources::Normalizer;

/// Gather the stylesheets, then the scripts, that are eligible for a preload hint.
///
/// The registry order is kept as-is. Handles without a registered descriptor and ineligible
/// sources are skipped without error.
pub fn collect<R>(registry: &R, normalizer: &Normalizer<'_>) -> Vec<PushResource>
where
  R: AssetRegistry + ?Sized,
{
  let styles = registry
    .list_styles()
    .into_iter()
    .map(|handle| (AssetKind::Style, handle));
  let scripts = registry
    .list_scripts()
    .into_iter()
    .map(|handle| (AssetKind::Script, handle));

  let resources: Vec<PushResource> = styles
    .chain(scripts)
    .filter_map(|(kind, handle)| {
      let Some(descriptor) = registry.lookup(kind, &handle) else {
        tracing::debug!(%kind, %handle, "skipping unregistered handle");
        return None;
      };

      let href = normalizer.normalize(&descriptor)?;
      PushResource::new(href, kind)
    })
    .collect();

  tracing::debug!(count = resources.len(), "collected push resources");
  resources
}
