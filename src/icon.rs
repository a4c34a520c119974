use serde::Deserialize;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RegistrationError {
    #[error("icon name cannot be empty")]
    EmptyName,
    #[error("icon set namespace cannot be empty")]
    EmptyNamespace,
    #[error("unsupported icon source: exactly one of `svgText` or a non-empty `url` is required")]
    UnsupportedSource,
    #[error("`{value}` contains the reserved character {character:?}")]
    ReservedCharacter { value: String, character: char },
}

/// Where the markup of an icon (or icon set) comes from.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(try_from = "SourceFields")]
pub enum IconSource {
    /// Literal markup, available immediately.
    SvgText(String),
    /// Fetched through the registry's transport on first use, then cached.
    Url(String),
}

impl IconSource {
    pub fn svg(text: impl Into<String>) -> Self {
        IconSource::SvgText(text.into())
    }

    pub fn url(url: impl Into<String>) -> Self {
        IconSource::Url(url.into())
    }

    /// Builds a source from loosely shaped input, where exactly one field must be present.
    pub fn from_fields(
        svg_text: Option<String>,
        url: Option<String>,
    ) -> Result<Self, RegistrationError> {
        match (svg_text, url) {
            (Some(text), None) => Ok(IconSource::SvgText(text)),
            (None, Some(url)) => IconSource::Url(url).validated(),
            _ => Err(RegistrationError::UnsupportedSource),
        }
    }

    pub(crate) fn validated(self) -> Result<Self, RegistrationError> {
        match &self {
            IconSource::Url(url) if url.trim().is_empty() => {
                Err(RegistrationError::UnsupportedSource)
            }
            _ => Ok(self),
        }
    }
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
struct SourceFields {
    svg_text: Option<String>,
    url: Option<String>,
}

impl TryFrom<SourceFields> for IconSource {
    type Error = RegistrationError;

    fn try_from(fields: SourceFields) -> Result<Self, Self::Error> {
        IconSource::from_fields(fields.svg_text, fields.url)
    }
}

/// Optional qualifiers for [crate::IconRegistry::register_icon].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IconOptions {
    pub variant: Option<String>,
    pub aliases: Vec<String>,
}

impl IconOptions {
    pub fn variant(mut self, variant: impl Into<String>) -> Self {
        self.variant = Some(variant.into());
        self
    }

    /// Adds an alias, scoped to the same variant as the icon.
    pub fn alias(mut self, alias: impl Into<String>) -> Self {
        self.aliases.push(alias.into());
        self
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IconRegistration {
    pub name: String,
    pub source: IconSource,
    #[serde(default)]
    pub variant: Option<String>,
    #[serde(default)]
    pub aliases: Vec<String>,
}

impl IconRegistration {
    pub fn new(name: impl Into<String>, source: IconSource) -> Self {
        Self {
            name: name.into(),
            source,
            variant: None,
            aliases: Vec::new(),
        }
    }

    pub fn with_variant(mut self, variant: impl Into<String>) -> Self {
        self.variant = Some(variant.into());
        self
    }

    pub fn options(&self) -> IconOptions {
        IconOptions {
            variant: self.variant.clone(),
            aliases: self.aliases.clone(),
        }
    }
}

/// A sprite sheet whose elements are addressed as `namespace:id`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IconSetRegistration {
    pub namespace: String,
    #[serde(default)]
    pub variant: Option<String>,
    pub source: IconSource,
}

impl IconSetRegistration {
    pub fn new(namespace: impl Into<String>, source: IconSource) -> Self {
        Self {
            namespace: namespace.into(),
            variant: None,
            source,
        }
    }

    pub fn with_variant(mut self, variant: impl Into<String>) -> Self {
        self.variant = Some(variant.into());
        self
    }
}

/// A one-way rewrite from `alias` to `target`, both without a variant.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct IconAlias {
    pub alias: String,
    pub target: String,
}

impl IconAlias {
    pub fn new(alias: impl Into<String>, target: impl Into<String>) -> Self {
        Self {
            alias: alias.into(),
            target: target.into(),
        }
    }
}
