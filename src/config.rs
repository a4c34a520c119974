use crate::icon::{IconAlias, IconRegistration, IconSetRegistration, RegistrationError};
use crate::theme::{AnimationDefinition, ThemeDefinition};
use serde::Deserialize;
use std::collections::BTreeMap;
use std::path::Path;

/// A declarative batch of registrations.
///
/// Applying a config only ever adds to a registry; `default_variant` is the one field that
/// overwrites, and only when it is set.
/// The JSON form mirrors the field names in camelCase:
///
/// ```json
/// {
///   "defaultVariant": "outlined",
///   "icons": [{ "name": "gear", "variant": "outlined", "source": { "url": "/icons/outlined/gear.svg" } }],
///   "iconSets": [{ "namespace": "nav", "source": { "url": "/icons/nav.svg" } }],
///   "aliases": [{ "alias": "settings", "target": "gear" }],
///   "themes": { "primary": { "cssVariable": "--brand" } },
///   "animations": { "spin": { "className": "spin" } }
/// }
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct IconConfig {
    pub default_variant: Option<String>,
    pub icons: Vec<IconRegistration>,
    pub icon_sets: Vec<IconSetRegistration>,
    pub aliases: Vec<IconAlias>,
    pub themes: BTreeMap<String, ThemeDefinition>,
    pub animations: BTreeMap<String, AnimationDefinition>,
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("could not read icon configuration")]
    Io(#[from] std::io::Error),
    #[error("invalid icon configuration")]
    Json(#[from] serde_json::Error),
    #[error("icon configuration was rejected")]
    Registration(#[from] RegistrationError),
}

impl IconConfig {
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn from_path(path: &Path) -> Result<Self, ConfigError> {
        let bytes = std::fs::read(path)?;
        Ok(serde_json::from_slice(&bytes)?)
    }

    /// Appends `other` to this config, with the same add-only semantics as applying both in order.
    pub fn merge(mut self, other: IconConfig) -> Self {
        if other.default_variant.is_some() {
            self.default_variant = other.default_variant;
        }

        self.icons.extend(other.icons);
        self.icon_sets.extend(other.icon_sets);
        self.aliases.extend(other.aliases);
        self.themes.extend(other.themes);
        self.animations.extend(other.animations);
        self
    }
}
