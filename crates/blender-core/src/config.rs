use figment::{
    providers::{Env, Format, Toml},
    Figment,
};
use serde::Deserialize;
use std::env;
use std::path::{Path, PathBuf};

use crate::settings::{BackendsConfig, BlendConfig, BlenderSettings};
use crate::vocabulary::{MappingsConfig, VocabularyMap};

#[derive(Debug, Default, Deserialize)]
struct RawSettings {
    #[serde(default)]
    blending: BlendConfig,
    #[serde(default)]
    backends: BackendsConfig,
    #[serde(default)]
    mappings: MappingsConfig,
}

pub struct Config {
    figment: Figment,
    base_dir: PathBuf,
}

impl Config {
    /// Load from the working directory, picking the overlay from `RUST_ENV`.
    pub fn load() -> anyhow::Result<Self> {
        let env_name = env::var("RUST_ENV").unwrap_or_else(|_| "dev".to_string());
        Self::load_for_env(Path::new("."), &env_name)
    }

    /// `blender.toml`, then `blender.<env>.toml`, then `BLENDER_*` variables.
    pub fn load_for_env(dir: &Path, env_name: &str) -> anyhow::Result<Self> {
        let overlay = match env_name {
            "dev" | "development" => Some("blender.dev.toml"),
            "prod" | "production" => Some("blender.prod.toml"),
            "test" | "testing" => Some("blender.test.toml"),
            _ => None,
        };
        tracing::debug!(env = env_name, dir = %dir.display(), "loading blender configuration");

        let mut figment = Figment::new().merge(Toml::file(dir.join("blender.toml")));
        if let Some(overlay) = overlay {
            figment = figment.merge(Toml::file(dir.join(overlay)));
        }
        figment = figment.merge(Env::prefixed("BLENDER_").split("__"));

        Ok(Self::from_figment(figment, dir))
    }

    pub fn from_figment(figment: Figment, base_dir: impl Into<PathBuf>) -> Self {
        Self { figment, base_dir: base_dir.into() }
    }

    pub fn get<T>(&self, key: &str) -> anyhow::Result<T>
    where
        T: serde::de::DeserializeOwned,
    {
        self.figment
            .extract_inner(key)
            .map_err(|e| anyhow::anyhow!("Failed to get '{}': {}", key, e))
    }

    /// Extract and validate everything the engine needs.
    ///
    /// The vocabulary comes from `blending.mappings_file` when set, otherwise
    /// from the `[mappings]` table.
    pub fn settings(&self) -> anyhow::Result<BlenderSettings> {
        let raw: RawSettings = self
            .figment
            .extract()
            .map_err(|e| anyhow::anyhow!("Failed to read blender settings: {}", e))?;

        let mappings = match self.mappings_file()? {
            Some(path) => load_mappings(&path)?,
            None => raw.mappings,
        };
        let vocabulary = VocabularyMap::from_config(mappings)?;
        Ok(BlenderSettings::new(raw.blending, raw.backends, vocabulary)?)
    }

    fn mappings_file(&self) -> anyhow::Result<Option<PathBuf>> {
        const KEY: &str = "blending.mappings_file";
        if !self.figment.contains(KEY) {
            return Ok(None);
        }
        let path: Option<String> = self.get(KEY)?;
        Ok(path.map(|p| resolve_with_base(&self.base_dir, p)))
    }
}

fn load_mappings(path: &Path) -> anyhow::Result<MappingsConfig> {
    if !path.is_file() {
        anyhow::bail!("Mappings file not found: {}", path.display());
    }
    Figment::from(Toml::file(path))
        .extract()
        .map_err(|e| anyhow::anyhow!("Failed to read mappings from {}: {}", path.display(), e))
}

/// Expand a user-provided path string:
/// - Expands leading '~' to the user's home directory
/// - Expands ${VAR} and $VAR environment variables
pub fn expand_path<S: AsRef<str>>(input: S) -> PathBuf {
    let s = input.as_ref();
    let expanded_env = shellexpand::env(s).unwrap_or(std::borrow::Cow::Borrowed(s));
    let expanded = shellexpand::tilde(&expanded_env);
    PathBuf::from(expanded.as_ref())
}

/// Resolve a possibly relative path against `base` after expansion.
pub fn resolve_with_base<S: AsRef<str>>(base: &Path, p: S) -> PathBuf {
    let p = expand_path(p);
    if p.is_absolute() { p } else { base.join(p) }
}
