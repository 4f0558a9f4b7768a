//! blender-collect
//!
//! Assembly of two backend answers into one: boosted record interleaving,
//! facet merging in the primary vocabulary, and error aggregation.
#![deny(warnings)]
#![deny(dead_code)]
#![deny(unused_variables)]
#![deny(unused_imports)]

pub mod errors;
pub mod facets;
pub mod interleave;

pub use errors::{collect_errors, collect_failures};
pub use facets::{merge_facets, FacetAccumulator};
pub use interleave::{interleave, is_primary_at_offset};
