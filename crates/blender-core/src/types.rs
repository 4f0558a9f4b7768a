//! Domain types shared by the translator, the collectors and the orchestrator.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use crate::error::{BackendError, Error};

/// Facet field name → ordered `(value, count)` pairs.
pub type FacetFields = BTreeMap<String, Vec<(String, u64)>>;

/// Synthetic facet carrying per-backend totals; also the pseudo-filter field
/// used to restrict a search to a subset of the backends.
pub const BLENDER_BACKEND_FIELD: &str = "blender_backend";

/// Message key of the tag added when only part of a blend could be built.
pub const PARTIAL_FAILURE: &str = "search_backend_partial_failure";

/// Token replaced by the failed backends' display names.
pub const SOURCES_TOKEN: &str = "%%sources%%";

/// One of the two blended backends.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BackendSlot {
    Primary,
    Secondary,
}

impl BackendSlot {
    pub fn other(self) -> Self {
        match self {
            Self::Primary => Self::Secondary,
            Self::Secondary => Self::Primary,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Primary => "primary",
            Self::Secondary => "secondary",
        }
    }
}

impl fmt::Display for BackendSlot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Boolean operator carried by a filter's prefix.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FilterOperator {
    /// No prefix.
    #[default]
    And,
    /// `~` prefix: OR-ed with the other `~` filters on the same field.
    Or,
    /// `-` prefix: negated.
    Not,
}

impl FilterOperator {
    pub fn prefix(self) -> &'static str {
        match self {
            Self::And => "",
            Self::Or => "~",
            Self::Not => "-",
        }
    }
}

/// A parsed `[-|~]field:value` filter.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Filter {
    pub field: String,
    pub value: String,
    #[serde(default)]
    pub operator: FilterOperator,
}

impl Filter {
    pub fn new(field: impl Into<String>, value: impl Into<String>) -> Self {
        Self { field: field.into(), value: value.into(), operator: FilterOperator::And }
    }

    pub fn with_operator(mut self, operator: FilterOperator) -> Self {
        self.operator = operator;
        self
    }

    pub fn is_negated(&self) -> bool {
        self.operator == FilterOperator::Not
    }
}

impl FromStr for Filter {
    type Err = Error;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        let (operator, rest) = match raw.chars().next() {
            Some('-') => (FilterOperator::Not, &raw[1..]),
            Some('~') => (FilterOperator::Or, &raw[1..]),
            _ => (FilterOperator::And, raw),
        };
        let Some((field, value)) = rest.split_once(':') else {
            return Err(Error::MalformedFilter(format!("missing ':' separator in '{raw}'")));
        };
        let field = field.trim();
        if field.is_empty() {
            return Err(Error::MalformedFilter(format!("empty field name in '{raw}'")));
        }
        Ok(Self { field: field.to_string(), value: unquote(value), operator })
    }
}

impl fmt::Display for Filter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let escaped = self.value.replace('\\', "\\\\").replace('"', "\\\"");
        write!(f, "{}{}:\"{}\"", self.operator.prefix(), self.field, escaped)
    }
}

fn unquote(value: &str) -> String {
    let inner = match value.strip_prefix('"').and_then(|v| v.strip_suffix('"')) {
        Some(inner) => inner,
        None => return value.to_string(),
    };
    let mut out = String::with_capacity(inner.len());
    let mut chars = inner.chars();
    while let Some(c) = chars.next() {
        if c == '\\' {
            if let Some(next) = chars.next() {
                out.push(next);
                continue;
            }
        }
        out.push(c);
    }
    out
}

/// The unified request as received from the presentation layer.
///
/// Filters stay raw here; the translator parses them and rejects malformed
/// ones before any backend is called.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchRequest {
    pub query: String,
    #[serde(default)]
    pub filters: Vec<String>,
    #[serde(default)]
    pub sort: Option<String>,
    #[serde(default)]
    pub handler: Option<String>,
    #[serde(default)]
    pub offset: usize,
    #[serde(default = "default_limit")]
    pub limit: usize,
}

fn default_limit() -> usize {
    20
}

impl SearchRequest {
    pub fn new(query: impl Into<String>) -> Self {
        Self {
            query: query.into(),
            filters: Vec::new(),
            sort: None,
            handler: None,
            offset: 0,
            limit: default_limit(),
        }
    }

    pub fn with_filter(mut self, filter: impl Into<String>) -> Self {
        self.filters.push(filter.into());
        self
    }

    pub fn with_sort(mut self, sort: impl Into<String>) -> Self {
        self.sort = Some(sort.into());
        self
    }

    pub fn with_handler(mut self, handler: impl Into<String>) -> Self {
        self.handler = Some(handler.into());
        self
    }

    pub fn with_page(mut self, offset: usize, limit: usize) -> Self {
        self.offset = offset;
        self.limit = limit;
        self
    }

    /// Copy of this request with a different query string.
    pub fn with_query(&self, query: impl Into<String>) -> Self {
        Self { query: query.into(), ..self.clone() }
    }

    /// Number of blended positions needed to serve the requested window.
    pub fn window_end(&self) -> usize {
        self.offset.saturating_add(self.limit)
    }
}

/// Parameters handed to one backend, already in that backend's vocabulary.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BackendParams {
    pub query: String,
    pub handler: Option<String>,
    pub sort: Option<String>,
    pub filters: Vec<Filter>,
}

impl BackendParams {
    pub fn has_filter_on(&self, field: &str) -> bool {
        self.filters.iter().any(|f| f.field == field)
    }
}

pub type PrimaryParams = BackendParams;
pub type SecondaryParams = BackendParams;

/// Which backends a request should reach.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BackendSelection {
    pub primary: bool,
    pub secondary: bool,
}

impl Default for BackendSelection {
    fn default() -> Self {
        Self { primary: true, secondary: true }
    }
}

impl BackendSelection {
    pub fn only(slot: BackendSlot) -> Self {
        Self { primary: slot == BackendSlot::Primary, secondary: slot == BackendSlot::Secondary }
    }

    pub fn none() -> Self {
        Self { primary: false, secondary: false }
    }

    pub fn is_enabled(&self, slot: BackendSlot) -> bool {
        match slot {
            BackendSlot::Primary => self.primary,
            BackendSlot::Secondary => self.secondary,
        }
    }

    pub fn set(&mut self, slot: BackendSlot, enabled: bool) {
        match slot {
            BackendSlot::Primary => self.primary = enabled,
            BackendSlot::Secondary => self.secondary = enabled,
        }
    }
}

/// Output of the parameter translator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TranslatedParams {
    pub primary: BackendParams,
    pub secondary: BackendParams,
    pub selection: BackendSelection,
    /// Filters with no secondary equivalent; applied to the primary only.
    pub unsupported_filters: Vec<Filter>,
}

/// Per-backend translation capabilities.
#[derive(Debug, Clone, Copy)]
pub struct TranslationPolicy {
    /// Whether `-field:value` filters may be forwarded as negations.
    pub supports_negation: bool,
    /// Applied to every translated filter value before emission.
    pub escape: Option<fn(&str) -> String>,
}

impl Default for TranslationPolicy {
    fn default() -> Self {
        Self { supports_negation: true, escape: None }
    }
}

impl TranslationPolicy {
    pub fn escape_value(&self, value: &str) -> String {
        match self.escape {
            Some(escape) => escape(value),
            None => value.to_string(),
        }
    }
}

/// A record as returned by a backend; opaque to the blender beyond its id.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Record {
    pub id: String,
    #[serde(default)]
    pub fields: serde_json::Value,
}

impl Record {
    pub fn new(id: impl Into<String>) -> Self {
        Self { id: id.into(), fields: serde_json::Value::Null }
    }

    pub fn with_fields(mut self, fields: serde_json::Value) -> Self {
        self.fields = fields;
        self
    }
}

/// A blended record: a fresh copy of the backend record plus attribution.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaggedRecord {
    pub source: BackendSlot,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    pub record: Record,
}

/// Raw answer of one backend call.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BackendResult {
    pub total: u64,
    #[serde(default)]
    pub records: Vec<Record>,
    #[serde(default)]
    pub facets: FacetFields,
    #[serde(default)]
    pub errors: Vec<String>,
}

impl BackendResult {
    pub fn new(total: u64) -> Self {
        Self { total, ..Self::default() }
    }

    pub fn with_records(mut self, records: Vec<Record>) -> Self {
        self.records = records;
        self
    }

    pub fn with_facet<V: Into<String>>(
        mut self,
        field: impl Into<String>,
        values: impl IntoIterator<Item = (V, u64)>,
    ) -> Self {
        let values = values.into_iter().map(|(v, c)| (v.into(), c)).collect();
        self.facets.insert(field.into(), values);
        self
    }

    pub fn with_error(mut self, error: impl Into<String>) -> Self {
        self.errors.push(error.into());
        self
    }
}

/// What happened to one backend during a blend.
#[derive(Debug, Clone, PartialEq)]
pub enum BackendOutcome {
    /// Excluded by the request (pseudo-filter or unsupported filters); not called.
    Disabled,
    Failed(BackendError),
    Succeeded(BackendResult),
}

impl BackendOutcome {
    pub fn result(&self) -> Option<&BackendResult> {
        match self {
            Self::Succeeded(result) => Some(result),
            _ => None,
        }
    }

    pub fn error(&self) -> Option<&BackendError> {
        match self {
            Self::Failed(error) => Some(error),
            _ => None,
        }
    }

    pub fn is_failed(&self) -> bool {
        matches!(self, Self::Failed(_))
    }

    pub fn total(&self) -> u64 {
        self.result().map_or(0, |r| r.total)
    }
}

impl From<std::result::Result<BackendResult, BackendError>> for BackendOutcome {
    fn from(value: std::result::Result<BackendResult, BackendError>) -> Self {
        match value {
            Ok(result) => Self::Succeeded(result),
            Err(error) => Self::Failed(error),
        }
    }
}

/// A user-facing warning attached to a blended result.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorTag {
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub tokens: BTreeMap<String, String>,
}

impl ErrorTag {
    pub fn new(message: impl Into<String>) -> Self {
        Self { message: message.into(), details: None, tokens: BTreeMap::new() }
    }

    pub fn with_details(mut self, details: impl Into<String>) -> Self {
        self.details = Some(details.into());
        self
    }

    pub fn with_token(mut self, token: impl Into<String>, value: impl Into<String>) -> Self {
        self.tokens.insert(token.into(), value.into());
        self
    }

    pub fn is_partial_failure(&self) -> bool {
        self.message == PARTIAL_FAILURE
    }
}

/// A backend call that failed outright.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BackendFailure {
    pub backend: BackendSlot,
    pub error: BackendError,
}

/// The single response produced by one blend.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BlendedResult {
    pub total: u64,
    pub records: Vec<TaggedRecord>,
    pub facets: FacetFields,
    pub errors: Vec<ErrorTag>,
    pub failures: Vec<BackendFailure>,
    pub unsupported_filters: Vec<Filter>,
}

impl BlendedResult {
    pub fn is_partial(&self) -> bool {
        self.errors.iter().any(ErrorTag::is_partial_failure)
    }

    /// Both backends were called and both failed.
    pub fn is_total_failure(&self) -> bool {
        self.failures.len() == 2
    }

    pub fn facet(&self, field: &str) -> Option<&[(String, u64)]> {
        self.facets.get(field).map(Vec::as_slice)
    }
}
