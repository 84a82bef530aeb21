use crate::hosts::HostAllowance;
use crate::models::PushResource;

type PostFilter<'h> = Box<dyn Fn(Vec<PushResource>) -> Vec<PushResource> + 'h>;
type ModeOverride<'h> = Box<dyn Fn(bool) -> bool + 'h>;

/// Extension points consulted during a render pass. Every hook is optional.
#[derive(Default)]
pub struct PushHooks<'h> {
  allowance: Option<Box<dyn HostAllowance + 'h>>,
  post_filter: Option<PostFilter<'h>>,
  mode_override: Option<ModeOverride<'h>>,
}

impl<'h> PushHooks<'h> {
  /// Decide which foreign hosts may be pushed, replacing the configured allow-list.
  pub fn allow_hosts(mut self, allowance: impl HostAllowance + 'h) -> Self {
    self.allowance = Some(Box::new(allowance));
    self
  }

  /// Add, remove or reorder resources after collection and before formatting.
  pub fn post_filter(
    mut self,
    filter: impl Fn(Vec<PushResource>) -> Vec<PushResource> + 'h,
  ) -> Self {
    self.post_filter = Some(Box::new(filter));
    self
  }

  /// Receive the default "send as headers" decision and return the preferred one.
  pub fn mode_override(mut self, decide: impl Fn(bool) -> bool + 'h) -> Self {
    self.mode_override = Some(Box::new(decide));
    self
  }

  pub(crate) fn allowance(&self) -> Option<&(dyn HostAllowance + 'h)> {
    self.allowance.as_deref()
  }

  pub(crate) fn filter(&self, resources: Vec<PushResource>) -> Vec<PushResource> {
    match &self.post_filter {
      Some(filter) => filter(resources),
      None => resources,
    }
  }

  pub(crate) fn prefer_headers(&self, default_as_header: bool) -> bool {
    match &self.mode_override {
      Some(decide) => decide(default_as_header),
      None => default_as_header,
    }
  }
}

impl std::fmt::Debug for PushHooks<'_> {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    f.debug_struct("PushHooks")
      .field("allowance", &self.allowance.is_some())
      .field("post_filter", &self.post_filter.is_some())
      .field("mode_override", &self.mode_override.is_some())
      .finish()
  }
}
