//! blender-engine
//!
//! `BlendOrchestrator` runs one blended search end to end: translate the
//! request, query both backends concurrently, then interleave records, merge
//! facets and aggregate errors into a single `BlendedResult`.
#![deny(warnings)]
#![deny(dead_code)]
#![deny(unused_variables)]
#![deny(unused_imports)]

use futures::future::join;
use tracing::{debug, info, instrument, warn};

use blender_collect::{collect_errors, collect_failures, interleave, merge_facets};
use blender_core::{
    BackendError, BackendOutcome, BackendParams, BlendedResult, BlenderSettings, PrimaryBackend, QueryRepair, Result,
    SearchRequest, SecondaryBackend, TranslatedParams,
};
use blender_params::{LuceneQueryRepair, ParameterTranslator};

pub struct BlendOrchestrator<P, S>
where
    P: PrimaryBackend,
    S: SecondaryBackend,
{
    primary: P,
    secondary: S,
    translator: ParameterTranslator,
    settings: BlenderSettings,
    repair: Box<dyn QueryRepair>,
}

impl<P, S> BlendOrchestrator<P, S>
where
    P: PrimaryBackend,
    S: SecondaryBackend,
{
    /// Uses Lucene query repair for primary retries.
    pub fn new(primary: P, secondary: S, settings: BlenderSettings) -> Self {
        let translator = ParameterTranslator::from_settings(&settings, secondary.policy());
        Self { primary, secondary, translator, settings, repair: Box::new(LuceneQueryRepair::new()) }
    }

    pub fn with_query_repair(mut self, repair: Box<dyn QueryRepair>) -> Self {
        self.repair = repair;
        self
    }

    /// Run one blended search.
    ///
    /// Only a malformed request is an error; backend failures are reported in
    /// the result.
    #[instrument(skip_all, fields(offset = request.offset, limit = request.limit))]
    pub async fn execute(&self, request: &SearchRequest) -> Result<BlendedResult> {
        let translated = self.translator.translate(request)?;
        let window = request.window_end();

        let (primary, secondary) =
            join(self.run_primary(&translated, window), self.run_secondary(&translated, window)).await;

        Ok(self.assemble(request, translated, primary, secondary))
    }

    async fn run_primary(&self, translated: &TranslatedParams, window: usize) -> BackendOutcome {
        if !translated.selection.primary {
            debug!("primary backend disabled for this request");
            return BackendOutcome::Disabled;
        }
        match self.primary.search(&translated.primary, 0, window).await {
            Ok(result) => BackendOutcome::Succeeded(result),
            Err(err) if err.is_unparseable_query() => self.retry_primary(translated, err, window).await,
            Err(err) => {
                warn!(error = %err, "primary backend failed");
                BackendOutcome::Failed(err)
            }
        }
    }

    /// One more attempt with a repaired query. A second failure is final and
    /// recorded as `Unavailable`.
    async fn retry_primary(&self, translated: &TranslatedParams, err: BackendError, window: usize) -> BackendOutcome {
        let original = &translated.primary.query;
        let repaired = match self.repair.repair(original) {
            Some(repaired) if &repaired != original => repaired,
            _ => {
                warn!(error = %err, "primary rejected the query and it could not be repaired");
                return BackendOutcome::Failed(err);
            }
        };
        info!("primary rejected the query; retrying once with a repaired query");
        debug!(original = %original, repaired = %repaired, "query repair");

        let params = BackendParams { query: repaired, ..translated.primary.clone() };
        match self.primary.search(&params, 0, window).await {
            Ok(result) => BackendOutcome::Succeeded(result),
            Err(retry_err) => {
                warn!(error = %retry_err, "primary backend failed after query repair");
                let message = match retry_err {
                    BackendError::Unavailable(message) | BackendError::UnparseableQuery(message) => message,
                };
                BackendOutcome::Failed(BackendError::Unavailable(message))
            }
        }
    }

    async fn run_secondary(&self, translated: &TranslatedParams, window: usize) -> BackendOutcome {
        if !translated.selection.secondary {
            debug!("secondary backend disabled for this request");
            return BackendOutcome::Disabled;
        }
        match self.secondary.search(&translated.secondary, 0, window).await {
            Ok(result) => BackendOutcome::Succeeded(result),
            Err(err) => {
                warn!(error = %err, "secondary backend failed");
                BackendOutcome::Failed(err)
            }
        }
    }

    fn assemble(
        &self,
        request: &SearchRequest,
        translated: TranslatedParams,
        primary: BackendOutcome,
        secondary: BackendOutcome,
    ) -> BlendedResult {
        let total = primary.total() + secondary.total();
        let blending = &self.settings.blending;
        let blending = blending.with_block_size(blending.block_size_for(total));
        debug!(
            primary_total = primary.total(),
            secondary_total = secondary.total(),
            block_size = blending.block_size,
            "assembling blended result"
        );

        let backends = &self.settings.backends;
        let records = interleave(
            primary.result(),
            secondary.result(),
            request.offset,
            request.limit,
            &blending,
            backends,
        );
        let facets = merge_facets(&primary, &secondary, &self.settings.vocabulary, backends);
        let errors = collect_errors(&primary, &secondary, backends);
        let failures = collect_failures(&primary, &secondary);

        BlendedResult {
            total,
            records,
            facets,
            errors,
            failures,
            unsupported_filters: translated.unsupported_filters,
        }
    }
}
