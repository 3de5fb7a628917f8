//! Generator configuration

use crate::error::{Error, Result};
use crate::hooks::{NoopSchemaGeneratorHooks, SchemaGeneratorHooks};
use crate::introspect::TypeId;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;
use std::sync::Arc;

pub const DEFAULT_INPUT_SUFFIX: &str = "Input";

/// Names of the root operation types.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TopLevelNames {
    pub query: String,
    pub mutation: String,
    pub subscription: String,
}

impl Default for TopLevelNames {
    fn default() -> Self {
        Self {
            query: "Query".to_string(),
            mutation: "Mutation".to_string(),
            subscription: "Subscription".to_string(),
        }
    }
}

impl TopLevelNames {
    pub fn is_default(&self) -> bool {
        *self == Self::default()
    }
}

/// An object whose functions become fields of a root operation type.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TopLevelObject {
    pub type_id: TypeId,
}

impl TopLevelObject {
    pub fn new(type_id: impl Into<TypeId>) -> Self {
        Self {
            type_id: type_id.into(),
        }
    }
}

/// Serializable part of [`SchemaGeneratorConfig`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GeneratorSettings {
    pub supported_packages: Vec<String>,
    #[serde(default)]
    pub top_level_names: TopLevelNames,
    #[serde(default = "default_input_suffix")]
    pub input_suffix: String,
}

fn default_input_suffix() -> String {
    DEFAULT_INPUT_SUFFIX.to_string()
}

/// Configuration for one or more generation runs.
///
/// The configuration holds no per-run state and can be shared; every run
/// creates its own type cache.
#[derive(Clone)]
pub struct SchemaGeneratorConfig {
    supported_packages: Vec<String>,
    top_level_names: TopLevelNames,
    input_suffix: String,
    hooks: Arc<dyn SchemaGeneratorHooks>,
}

impl SchemaGeneratorConfig {
    /// Create a configuration accepting types under the given packages.
    pub fn new<I, S>(supported_packages: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            supported_packages: supported_packages.into_iter().map(Into::into).collect(),
            top_level_names: TopLevelNames::default(),
            input_suffix: default_input_suffix(),
            hooks: Arc::new(NoopSchemaGeneratorHooks),
        }
    }

    pub fn from_settings(settings: GeneratorSettings) -> Self {
        Self::new(settings.supported_packages)
            .with_top_level_names(settings.top_level_names)
            .with_input_suffix(settings.input_suffix)
    }

    pub fn from_json_str(json: &str) -> Result<Self> {
        let settings: GeneratorSettings = serde_json::from_str(json)?;
        Ok(Self::from_settings(settings))
    }

    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self> {
        let data = std::fs::read_to_string(path).map_err(Error::Io)?;
        Self::from_json_str(&data)
    }

    pub fn with_hooks(mut self, hooks: impl SchemaGeneratorHooks + 'static) -> Self {
        self.hooks = Arc::new(hooks);
        self
    }

    pub fn with_shared_hooks(mut self, hooks: Arc<dyn SchemaGeneratorHooks>) -> Self {
        self.hooks = hooks;
        self
    }

    pub fn with_top_level_names(mut self, names: TopLevelNames) -> Self {
        self.top_level_names = names;
        self
    }

    pub fn with_input_suffix(mut self, suffix: impl Into<String>) -> Self {
        self.input_suffix = suffix.into();
        self
    }

    pub fn supported_packages(&self) -> &[String] {
        &self.supported_packages
    }

    pub fn top_level_names(&self) -> &TopLevelNames {
        &self.top_level_names
    }

    pub fn input_suffix(&self) -> &str {
        &self.input_suffix
    }

    pub fn hooks(&self) -> &dyn SchemaGeneratorHooks {
        self.hooks.as_ref()
    }
}

impl fmt::Debug for SchemaGeneratorConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SchemaGeneratorConfig")
            .field("supported_packages", &self.supported_packages)
            .field("top_level_names", &self.top_level_names)
            .field("input_suffix", &self.input_suffix)
            .finish_non_exhaustive()
    }
}
