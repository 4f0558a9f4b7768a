//! blender-params
//!
//! Translation of unified search requests into per-backend parameters, plus
//! Lucene helpers for escaping filter values and repairing rejected queries.
#![deny(warnings)]
#![deny(dead_code)]
#![deny(unused_variables)]
#![deny(unused_imports)]

pub mod lucene;
pub mod translate;

pub use lucene::{lucene_escape, LuceneQueryRepair};
pub use translate::ParameterTranslator;
