use async_trait::async_trait;
use std::sync::Arc;

use crate::error::BackendError;
use crate::types::{BackendResult, PrimaryParams, SecondaryParams, TranslationPolicy};

/// The authoritative backend; its vocabulary is canonical.
///
/// Called with offset 0 and a limit covering the whole blended window.
#[async_trait]
pub trait PrimaryBackend: Send + Sync {
    async fn search(
        &self,
        params: &PrimaryParams,
        offset: usize,
        limit: usize,
    ) -> Result<BackendResult, BackendError>;
}

/// A backend with its own field names and values.
#[async_trait]
pub trait SecondaryBackend: Send + Sync {
    async fn search(
        &self,
        params: &SecondaryParams,
        offset: usize,
        limit: usize,
    ) -> Result<BackendResult, BackendError>;

    fn policy(&self) -> TranslationPolicy {
        TranslationPolicy::default()
    }
}

/// Rewrites a query string the primary rejected into one it may accept.
///
/// Returns `None` when there is nothing different left to try.
pub trait QueryRepair: Send + Sync {
    fn repair(&self, query: &str) -> Option<String>;
}

#[async_trait]
impl<T: PrimaryBackend + ?Sized> PrimaryBackend for Arc<T> {
    async fn search(
        &self,
        params: &PrimaryParams,
        offset: usize,
        limit: usize,
    ) -> Result<BackendResult, BackendError> {
        (**self).search(params, offset, limit).await
    }
}

#[async_trait]
impl<T: SecondaryBackend + ?Sized> SecondaryBackend for Arc<T> {
    async fn search(
        &self,
        params: &SecondaryParams,
        offset: usize,
        limit: usize,
    ) -> Result<BackendResult, BackendError> {
        (**self).search(params, offset, limit).await
    }

    fn policy(&self) -> TranslationPolicy {
        (**self).policy()
    }
}
