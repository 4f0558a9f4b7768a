use std::sync::Arc;
use tracing::{debug, warn};

use blender_core::{
    BackendParams, BackendSelection, BackendsConfig, BlenderSettings, FacetMapping, Filter, FilterOperator, Result,
    SearchRequest, TranslatedParams, TranslationPolicy, VocabularyMap, BLENDER_BACKEND_FIELD,
};

/// Turns one unified request into a primary and a secondary parameter set.
pub struct ParameterTranslator {
    vocabulary: Arc<VocabularyMap>,
    backends: BackendsConfig,
    policy: TranslationPolicy,
    exclude_on_unsupported: bool,
}

impl ParameterTranslator {
    pub fn new(vocabulary: Arc<VocabularyMap>, backends: BackendsConfig, policy: TranslationPolicy) -> Self {
        Self { vocabulary, backends, policy, exclude_on_unsupported: false }
    }

    pub fn from_settings(settings: &BlenderSettings, policy: TranslationPolicy) -> Self {
        Self::new(Arc::clone(&settings.vocabulary), settings.backends.clone(), policy)
            .with_exclude_on_unsupported(settings.blending.exclude_on_unsupported_filters)
    }

    /// Disable the secondary for requests carrying filters it cannot express.
    pub fn with_exclude_on_unsupported(mut self, exclude: bool) -> Self {
        self.exclude_on_unsupported = exclude;
        self
    }

    pub fn translate(&self, request: &SearchRequest) -> Result<TranslatedParams> {
        let parsed = request
            .filters
            .iter()
            .map(|raw| raw.parse::<Filter>())
            .collect::<Result<Vec<_>>>()?;
        let (pseudo, filters): (Vec<Filter>, Vec<Filter>) =
            parsed.into_iter().partition(|f| f.field == BLENDER_BACKEND_FIELD);

        let mut selection = self.select_backends(&pseudo);
        let mut secondary_filters = Vec::new();
        let mut unsupported = Vec::new();

        for filter in &filters {
            match self.vocabulary.facet(&filter.field) {
                Some(mapping) => secondary_filters.extend(self.secondary_filters(filter, mapping)),
                None => {
                    warn!(field = %filter.field, "filter has no secondary equivalent; applied to primary only");
                    unsupported.push(filter.clone());
                }
            }
        }

        for (_, mapping) in self.vocabulary.facets() {
            let Some(default) = mapping.default_value() else {
                continue;
            };
            if !secondary_filters.iter().any(|f: &Filter| f.field == mapping.secondary_field()) {
                secondary_filters.push(Filter::new(mapping.secondary_field(), self.policy.escape_value(default)));
            }
        }

        if self.exclude_on_unsupported && !unsupported.is_empty() {
            debug!(count = unsupported.len(), "secondary excluded because of unsupported filters");
            selection.secondary = false;
        }

        let handlers = self.vocabulary.handlers();
        let sorts = self.vocabulary.sorts();
        let secondary = BackendParams {
            query: request.query.clone(),
            handler: request.handler.as_deref().map(|h| handlers.to_secondary(h).to_string()),
            sort: request.sort.as_deref().map(|s| sorts.to_secondary(s).to_string()),
            filters: secondary_filters,
        };
        let primary = BackendParams {
            query: request.query.clone(),
            handler: request.handler.clone(),
            sort: request.sort.clone(),
            filters,
        };

        debug!(
            primary_filters = primary.filters.len(),
            secondary_filters = secondary.filters.len(),
            unsupported = unsupported.len(),
            "translated request"
        );
        Ok(TranslatedParams { primary, secondary, selection, unsupported_filters: unsupported })
    }

    fn secondary_filters(&self, filter: &Filter, mapping: &FacetMapping) -> Vec<Filter> {
        if mapping.ignores(&filter.value) {
            return Vec::new();
        }
        let mut values = mapping.to_secondary(&filter.value);
        if values.is_empty() {
            values.push(filter.value.clone());
        }

        let operator = match filter.operator {
            FilterOperator::Not if !self.policy.supports_negation => FilterOperator::And,
            other => other,
        };
        let operator = match operator {
            FilterOperator::And if values.len() > 1 => FilterOperator::Or,
            other => other,
        };

        values
            .into_iter()
            .map(|value| {
                Filter::new(mapping.secondary_field(), self.policy.escape_value(&value)).with_operator(operator)
            })
            .collect()
    }

    /// Positive pseudo-filters restrict the set; negated ones remove from it.
    fn select_backends(&self, pseudo: &[Filter]) -> BackendSelection {
        let mut restricted: Option<BackendSelection> = None;
        for filter in pseudo.iter().filter(|f| !f.is_negated()) {
            match self.backends.slot_for_id(&filter.value) {
                Some(slot) => restricted.get_or_insert_with(BackendSelection::none).set(slot, true),
                None => warn!(backend = %filter.value, "invalid {BLENDER_BACKEND_FIELD} filter: backend not enabled"),
            }
        }

        let mut selection = restricted.unwrap_or_default();
        for filter in pseudo.iter().filter(|f| f.is_negated()) {
            match self.backends.slot_for_id(&filter.value) {
                Some(slot) => selection.set(slot, false),
                None => warn!(backend = %filter.value, "invalid {BLENDER_BACKEND_FIELD} filter: backend not enabled"),
            }
        }
        selection
    }
}
