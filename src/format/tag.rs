use crate::format::escape::{escape_attr, escape_url_attr, is_attribute_name};
use crate::format::{Rendered, render_attributes};
use crate::models::PushResource;

/// Attribute names carried on a `<link rel='preload'>` tag.
pub const TAG_ATTRIBUTES: [&str; 4] = ["href", "as", "crossorigin", "type"];

/// Format a `<link rel='preload'>` tag for `resource`, terminated by a newline.
pub fn format_link_tag(resource: &PushResource) -> String {
  let attributes = resource.attribute_set();
  let rendered: Vec<String> = render_attributes(&attributes, &TAG_ATTRIBUTES)
    .into_iter()
    .filter_map(|attribute| match attribute {
      Rendered::Pair("href", value) => Some(format!("href='{}'", escape_url_attr(&value))),
      Rendered::Pair(key, value) => Some(format!("{key}='{}'", escape_attr(&value))),
      Rendered::Flag(flag) => is_attribute_name(&flag).then(|| escape_attr(&flag)),
    })
    .collect();

  format!("<link rel='preload' {} />\n", rendered.join(" "))
}
