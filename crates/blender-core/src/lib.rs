//! Shared vocabulary of the search blender: request and result types, the
//! backend traits, the validated vocabulary map and the settings loader.
//!
//! Configuration uses Figment to merge `blender.toml` + `blender.<env>.toml`
//! + `BLENDER_*` env vars.
#![deny(warnings)]
#![deny(dead_code)]
#![deny(unused_variables)]
#![deny(unused_imports)]

pub mod config;
pub mod error;
pub mod hierarchy;
pub mod settings;
pub mod traits;
pub mod types;
pub mod vocabulary;

pub use error::{BackendError, Error, Result};
pub use settings::{AdaptiveBlockSize, BackendInfo, BackendsConfig, BlendConfig, BlenderSettings};
pub use traits::{PrimaryBackend, QueryRepair, SecondaryBackend};
pub use types::*;
pub use vocabulary::{FacetKind, FacetMapping, KeyMap, MappingsConfig, UnmappedPolicy, VocabularyMap};
