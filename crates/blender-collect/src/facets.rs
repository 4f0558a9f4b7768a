use std::collections::HashMap;

use blender_core::hierarchy;
use blender_core::{BackendOutcome, BackendsConfig, FacetFields, FacetKind, FacetMapping, UnmappedPolicy, VocabularyMap, BLENDER_BACKEND_FIELD};

/// Sums counts per facet value, remembering first-seen order.
#[derive(Debug, Default)]
pub struct FacetAccumulator {
    entries: Vec<(String, u64)>,
    positions: HashMap<String, usize>,
}

impl FacetAccumulator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, value: &str, count: u64) {
        match self.positions.get(value) {
            Some(&i) => self.entries[i].1 += count,
            None => {
                self.positions.insert(value.to_string(), self.entries.len());
                self.entries.push((value.to_string(), count));
            }
        }
    }

    /// Entries by count, highest first; equal counts keep first-seen order.
    pub fn into_sorted(self) -> Vec<(String, u64)> {
        let mut entries = self.entries;
        entries.sort_by(|a, b| b.1.cmp(&a.1));
        entries
    }
}

impl From<Vec<(String, u64)>> for FacetAccumulator {
    fn from(values: Vec<(String, u64)>) -> Self {
        let mut acc = Self::new();
        for (value, count) in values {
            acc.add(&value, count);
        }
        acc
    }
}

/// Merge both backends' facets into the primary vocabulary and append the
/// per-backend `blender_backend` totals.
pub fn merge_facets(
    primary: &BackendOutcome,
    secondary: &BackendOutcome,
    vocabulary: &VocabularyMap,
    backends: &BackendsConfig,
) -> FacetFields {
    let mut merged = primary.result().map(|r| r.facets.clone()).unwrap_or_default();

    if let Some(result) = secondary.result() {
        for (field, mapping) in vocabulary.facets() {
            let values = match result.facets.get(mapping.secondary_field()) {
                Some(values) if !values.is_empty() => values,
                _ => continue,
            };
            tracing::trace!(field, secondary_field = mapping.secondary_field(), values = values.len(), "merging facet");
            let mut acc = FacetAccumulator::from(merged.remove(field).unwrap_or_default());
            for (value, count) in values {
                let Some(value) = to_primary_value(mapping, value) else {
                    continue;
                };
                acc.add(&value, *count);
                if mapping.kind() == FacetKind::Hierarchical {
                    for ancestor in hierarchy::ancestors(&value).iter().rev() {
                        acc.add(ancestor, *count);
                    }
                }
            }
            merged.insert(field.to_string(), acc.into_sorted());
        }
    }

    merged.insert(
        BLENDER_BACKEND_FIELD.to_string(),
        vec![
            (backends.primary.id.clone(), primary.total()),
            (backends.secondary.id.clone(), secondary.total()),
        ],
    );
    merged
}

fn to_primary_value(mapping: &FacetMapping, value: &str) -> Option<String> {
    let translated = match mapping.to_primary(value) {
        Some("") => return None,
        Some(mapped) => mapped.to_string(),
        None if mapping.kind() == FacetKind::Boolean => return None,
        None if mapping.unmapped() == UnmappedPolicy::Drop => return None,
        None => value.to_string(),
    };
    if mapping.kind() == FacetKind::Hierarchical {
        Some(hierarchy::to_hierarchical(&translated))
    } else {
        Some(translated)
    }
}
