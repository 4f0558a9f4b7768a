use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use crate::error::{Error, Result};
use crate::types::BackendSlot;
use crate::vocabulary::VocabularyMap;

/// `"from-to:size"`: use `size` as the block size when the combined total
/// lies within `from..=to`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct AdaptiveBlockSize {
    pub from: u64,
    pub to: u64,
    pub size: usize,
}

impl AdaptiveBlockSize {
    pub fn matches(&self, total: u64) -> bool {
        (self.from..=self.to).contains(&total)
    }
}

impl FromStr for AdaptiveBlockSize {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let invalid = || Error::InvalidConfig(format!("adaptive block size '{s}' is not of the form from-to:size"));
        let (range, size) = s.split_once(':').ok_or_else(invalid)?;
        let (from, to) = range.split_once('-').ok_or_else(invalid)?;
        let rule = Self {
            from: from.trim().parse().map_err(|_| invalid())?,
            to: to.trim().parse().map_err(|_| invalid())?,
            size: size.trim().parse().map_err(|_| invalid())?,
        };
        if rule.size == 0 || rule.from > rule.to {
            return Err(invalid());
        }
        Ok(rule)
    }
}

impl TryFrom<String> for AdaptiveBlockSize {
    type Error = Error;

    fn try_from(value: String) -> Result<Self> {
        value.parse()
    }
}

impl From<AdaptiveBlockSize> for String {
    fn from(value: AdaptiveBlockSize) -> Self {
        value.to_string()
    }
}

impl fmt::Display for AdaptiveBlockSize {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}:{}", self.from, self.to, self.size)
    }
}

/// Interleaving parameters.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BlendConfig {
    pub block_size: usize,
    /// 1-based slot where boosted secondary records start.
    pub boost_position: usize,
    pub boost_count: usize,
    pub adaptive_block_sizes: Vec<AdaptiveBlockSize>,
    /// Skip the secondary entirely when any filter has no secondary equivalent.
    pub exclude_on_unsupported_filters: bool,
}

impl Default for BlendConfig {
    fn default() -> Self {
        Self {
            block_size: 10,
            boost_position: 1,
            boost_count: 0,
            adaptive_block_sizes: Vec::new(),
            exclude_on_unsupported_filters: false,
        }
    }
}

impl BlendConfig {
    pub fn new(block_size: usize, boost_position: usize, boost_count: usize) -> Self {
        Self { block_size, boost_position, boost_count, ..Self::default() }
    }

    pub fn validate(&self) -> Result<()> {
        if self.block_size == 0 {
            return Err(Error::InvalidConfig("block_size must be greater than 0".into()));
        }
        if self.boost_position == 0 {
            return Err(Error::InvalidConfig("boost_position is 1-based and must be at least 1".into()));
        }
        Ok(())
    }

    /// Block size for a blend whose backends found `total` records together.
    pub fn block_size_for(&self, total: u64) -> usize {
        self.adaptive_block_sizes
            .iter()
            .find(|rule| rule.matches(total))
            .map_or(self.block_size, |rule| rule.size)
    }

    pub fn with_block_size(&self, block_size: usize) -> Self {
        Self { block_size, ..self.clone() }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BackendInfo {
    pub id: String,
    #[serde(default)]
    pub label: Option<String>,
}

impl BackendInfo {
    pub fn new(id: impl Into<String>) -> Self {
        Self { id: id.into(), label: None }
    }

    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }

    /// Label when set, id otherwise.
    pub fn display_name(&self) -> &str {
        self.label.as_deref().unwrap_or(&self.id)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BackendsConfig {
    pub primary: BackendInfo,
    pub secondary: BackendInfo,
}

impl Default for BackendsConfig {
    fn default() -> Self {
        Self {
            primary: BackendInfo::new(BackendSlot::Primary.as_str()),
            secondary: BackendInfo::new(BackendSlot::Secondary.as_str()),
        }
    }
}

impl BackendsConfig {
    pub fn info(&self, slot: BackendSlot) -> &BackendInfo {
        match slot {
            BackendSlot::Primary => &self.primary,
            BackendSlot::Secondary => &self.secondary,
        }
    }

    pub fn slot_for_id(&self, id: &str) -> Option<BackendSlot> {
        [BackendSlot::Primary, BackendSlot::Secondary]
            .into_iter()
            .find(|slot| self.info(*slot).id == id)
    }

    pub fn validate(&self) -> Result<()> {
        if self.primary.id.trim().is_empty() || self.secondary.id.trim().is_empty() {
            return Err(Error::InvalidConfig("backend ids must not be empty".into()));
        }
        if self.primary.id == self.secondary.id {
            return Err(Error::InvalidConfig(format!(
                "primary and secondary backends share the id '{}'",
                self.primary.id
            )));
        }
        Ok(())
    }
}

/// Everything the engine needs, validated.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BlenderSettings {
    pub blending: BlendConfig,
    pub backends: BackendsConfig,
    /// Shared read-only by every request.
    pub vocabulary: Arc<VocabularyMap>,
}

impl BlenderSettings {
    pub fn new(blending: BlendConfig, backends: BackendsConfig, vocabulary: VocabularyMap) -> Result<Self> {
        blending.validate()?;
        backends.validate()?;
        Ok(Self { blending, backends, vocabulary: Arc::new(vocabulary) })
    }
}
