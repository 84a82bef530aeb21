use crate::format::escape::{escape_header_value, escape_url, is_header_token};
use crate::format::{Rendered, render_attributes};
use crate::models::PushResource;

/// Attribute names carried as `Link` header parameters.
pub const HEADER_ATTRIBUTES: [&str; 4] = ["as", "crossorigin", "type", "nopush"];

/// Format a full `Link` response header line for `resource`.
///
/// ```
/// use h2push::{AssetKind, PushResource, format::format_link_header};
///
/// let resource = PushResource::new("/a.js", AssetKind::Script).unwrap();
/// assert_eq!(format_link_header(&resource), r#"Link: </a.js>; rel=preload; as="script""#);
/// ```
pub fn format_link_header(resource: &PushResource) -> String {
  let attributes = resource.attribute_set();
  let params: Vec<String> = render_attributes(&attributes, &HEADER_ATTRIBUTES)
    .into_iter()
    .filter_map(|attribute| match attribute {
      Rendered::Pair(key, value) => Some(format!("{key}=\"{}\"", escape_header_value(&value))),
      Rendered::Flag(flag) => is_header_token(&flag).then_some(flag),
    })
    .collect();

  let mut header = format!("Link: <{}>; rel=preload", escape_url(resource.href()));
  if !params.is_empty() {
    header.push_str("; ");
    header.push_str(&params.join("; "));
  }
  header
}
