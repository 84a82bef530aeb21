//! Selection of the scripts and stylesheets that receive a preload hint.
//!
//! Collection walks the registry snapshot while normalization decides eligibility and shapes
//! each source into its final href. Both are pure and can be tested independently.

mod collect;
mod normalize;
mod origin;

pub use collect::collect;
pub use normalize::{Normalizer, VERSION_QUERY_ARG};
pub use origin::SiteOrigin;
