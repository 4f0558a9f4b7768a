//! Field and value correspondence between the primary and secondary backends.
//!
//! Deserialized as [`MappingsConfig`] and validated once into a read-only
//! [`VocabularyMap`]. Value maps are keyed by the secondary value and point at
//! the primary value it stands for.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

use crate::error::{Error, Result};
use crate::hierarchy;
use crate::types::BLENDER_BACKEND_FIELD;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FacetKind {
    #[default]
    Plain,
    Boolean,
    Hierarchical,
}

/// What happens to secondary facet values with no entry in the value map.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UnmappedPolicy {
    #[default]
    Keep,
    Drop,
}

/// A mapping value as written in configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum MappedValue {
    Flag(bool),
    Number(i64),
    Text(String),
}

impl MappedValue {
    fn into_string(self) -> String {
        match self {
            Self::Flag(b) => b.to_string(),
            Self::Number(n) => n.to_string(),
            Self::Text(s) => s,
        }
    }
}

/// `ignore = true` or `ignore = ["value", ...]`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum IgnoreConfig {
    All(bool),
    Values(Vec<String>),
}

impl Default for IgnoreConfig {
    fn default() -> Self {
        Self::All(false)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FacetMappingConfig {
    /// Secondary field name.
    pub field: String,
    #[serde(default)]
    pub kind: FacetKind,
    #[serde(default)]
    pub values: BTreeMap<String, MappedValue>,
    #[serde(default)]
    pub ignore: IgnoreConfig,
    #[serde(default)]
    pub default_value: Option<MappedValue>,
    #[serde(default)]
    pub unmapped: UnmappedPolicy,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MappingsConfig {
    /// Keyed by primary field name.
    #[serde(default)]
    pub facets: BTreeMap<String, FacetMappingConfig>,
    /// Primary handler key → secondary handler key.
    #[serde(default)]
    pub handlers: BTreeMap<String, String>,
    /// Primary sort key → secondary sort key.
    #[serde(default)]
    pub sorts: BTreeMap<String, String>,
}

/// Loose boolean reading of a facet or filter value.
pub fn coerce_bool(value: &str) -> bool {
    let v = value.trim();
    !(v.is_empty()
        || v == "0"
        || v.eq_ignore_ascii_case("false")
        || v.eq_ignore_ascii_case("no")
        || v.eq_ignore_ascii_case("off"))
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum IgnoreRule {
    Nothing,
    All,
    Values(BTreeSet<String>),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FacetMapping {
    secondary_field: String,
    kind: FacetKind,
    values: BTreeMap<String, String>,
    ignore: IgnoreRule,
    default_value: Option<String>,
    unmapped: UnmappedPolicy,
}

impl FacetMapping {
    fn from_config(primary_field: &str, cfg: FacetMappingConfig) -> Result<Self> {
        let secondary_field = cfg.field.trim().to_string();
        if secondary_field.is_empty() {
            return Err(Error::InvalidConfig(format!(
                "facet '{primary_field}' has an empty secondary field name"
            )));
        }
        if secondary_field == BLENDER_BACKEND_FIELD {
            return Err(Error::InvalidConfig(format!(
                "facet '{primary_field}' maps to reserved field '{BLENDER_BACKEND_FIELD}'"
            )));
        }

        let mut values = BTreeMap::new();
        for (secondary, primary) in cfg.values {
            let mut primary = primary.into_string();
            match cfg.kind {
                FacetKind::Boolean if !primary.is_empty() => {
                    primary = coerce_bool(&primary).to_string();
                }
                FacetKind::Hierarchical if !primary.is_empty() => {
                    if !hierarchy::is_hierarchical(&primary) {
                        return Err(Error::InvalidConfig(format!(
                            "facet '{primary_field}': value '{primary}' for '{secondary}' is not of the form N/.../"
                        )));
                    }
                }
                _ => {}
            }
            values.insert(secondary, primary);
        }

        let ignore = match cfg.ignore {
            IgnoreConfig::All(true) => IgnoreRule::All,
            IgnoreConfig::All(false) => IgnoreRule::Nothing,
            IgnoreConfig::Values(v) if v.is_empty() => IgnoreRule::Nothing,
            IgnoreConfig::Values(v) => IgnoreRule::Values(v.into_iter().collect()),
        };

        Ok(Self {
            secondary_field,
            kind: cfg.kind,
            values,
            ignore,
            default_value: cfg.default_value.map(MappedValue::into_string),
            unmapped: cfg.unmapped,
        })
    }

    pub fn secondary_field(&self) -> &str {
        &self.secondary_field
    }

    pub fn kind(&self) -> FacetKind {
        self.kind
    }

    pub fn unmapped(&self) -> UnmappedPolicy {
        self.unmapped
    }

    pub fn default_value(&self) -> Option<&str> {
        self.default_value.as_deref()
    }

    /// Whether a filter with this primary value stays off the secondary.
    pub fn ignores(&self, primary_value: &str) -> bool {
        match &self.ignore {
            IgnoreRule::Nothing => false,
            IgnoreRule::All => true,
            IgnoreRule::Values(values) => values.contains(primary_value),
        }
    }

    /// Secondary values standing for `primary_value`.
    ///
    /// An empty value map is the identity. Otherwise an empty vector means no
    /// entry matched.
    pub fn to_secondary(&self, primary_value: &str) -> Vec<String> {
        if self.values.is_empty() {
            return vec![primary_value.to_string()];
        }
        match self.kind {
            FacetKind::Plain => self
                .values
                .iter()
                .filter(|(_, p)| p.as_str() == primary_value)
                .map(|(s, _)| s.clone())
                .collect(),
            FacetKind::Boolean => {
                let wanted = coerce_bool(primary_value);
                self.values
                    .iter()
                    .filter(|(_, p)| !p.is_empty() && coerce_bool(p) == wanted)
                    .map(|(s, _)| s.clone())
                    .collect()
            }
            FacetKind::Hierarchical => {
                let wanted = hierarchy::to_hierarchical(primary_value);
                let lower = hierarchy::descendants_of(&wanted, self.values.values().map(String::as_str));
                self.values
                    .iter()
                    .filter(|(_, p)| **p == wanted || lower.contains(&p.as_str()))
                    .map(|(s, _)| s.clone())
                    .collect()
            }
        }
    }

    /// Primary value for a secondary facet value, if the map has one.
    pub fn to_primary(&self, secondary_value: &str) -> Option<&str> {
        self.values.get(secondary_value).map(String::as_str)
    }
}

/// Primary key ↔ secondary key for handlers and sort orders.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct KeyMap {
    forward: BTreeMap<String, String>,
    reverse: BTreeMap<String, String>,
}

impl KeyMap {
    fn from_config(kind: &str, entries: BTreeMap<String, String>) -> Result<Self> {
        let mut reverse = BTreeMap::new();
        for (primary, secondary) in &entries {
            if let Some(previous) = reverse.insert(secondary.clone(), primary.clone()) {
                return Err(Error::InvalidConfig(format!(
                    "{kind} '{previous}' and '{primary}' both map to '{secondary}'"
                )));
            }
        }
        Ok(Self { forward: entries, reverse })
    }

    /// Secondary key for a primary key; unknown keys pass through.
    pub fn to_secondary<'a>(&'a self, primary: &'a str) -> &'a str {
        self.forward.get(primary).map_or(primary, String::as_str)
    }

    pub fn to_primary<'a>(&'a self, secondary: &'a str) -> &'a str {
        self.reverse.get(secondary).map_or(secondary, String::as_str)
    }

    pub fn is_empty(&self) -> bool {
        self.forward.is_empty()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct VocabularyMap {
    facets: BTreeMap<String, FacetMapping>,
    handlers: KeyMap,
    sorts: KeyMap,
}

impl VocabularyMap {
    pub fn from_config(cfg: MappingsConfig) -> Result<Self> {
        let mut facets = BTreeMap::new();
        for (primary_field, mapping) in cfg.facets {
            if primary_field == BLENDER_BACKEND_FIELD {
                return Err(Error::InvalidConfig(format!(
                    "'{BLENDER_BACKEND_FIELD}' is reserved and cannot be mapped"
                )));
            }
            let mapping = FacetMapping::from_config(&primary_field, mapping)?;
            facets.insert(primary_field, mapping);
        }
        Ok(Self {
            facets,
            handlers: KeyMap::from_config("handler", cfg.handlers)?,
            sorts: KeyMap::from_config("sort", cfg.sorts)?,
        })
    }

    pub fn facet(&self, primary_field: &str) -> Option<&FacetMapping> {
        self.facets.get(primary_field)
    }

    /// Mapped facets as `(primary field, mapping)`.
    pub fn facets(&self) -> impl Iterator<Item = (&str, &FacetMapping)> {
        self.facets.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn handlers(&self) -> &KeyMap {
        &self.handlers
    }

    pub fn sorts(&self) -> &KeyMap {
        &self.sorts
    }
}

impl TryFrom<MappingsConfig> for VocabularyMap {
    type Error = Error;

    fn try_from(cfg: MappingsConfig) -> Result<Self> {
        Self::from_config(cfg)
    }
}
