use crate::icon::RegistrationError;
use std::fmt;

/// Separates a name from its variant (or a namespace from an icon id) in user-facing requests,
/// e.g. `"gear:outlined"` or `"nav:home"`.
pub const QUALIFIER_SEPARATOR: char = ':';

/// Separates name and variant inside a canonical key.
/// Must never equal [QUALIFIER_SEPARATOR], or a serialized key could pass for a qualified request.
const KEY_SEPARATOR: char = '\u{1f}';

/// Canonical key for an `(name, variant)` or `(namespace, variant)` pair.
///
/// Both parts are trimmed; an empty variant is the same as no variant.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct IconKey(String);

impl IconKey {
    pub fn icon(name: &str, variant: Option<&str>) -> Result<Self, RegistrationError> {
        let name = name.trim();
        if name.is_empty() {
            return Err(RegistrationError::EmptyName);
        }

        Self::serialize(name, variant)
    }

    pub fn icon_set(namespace: &str, variant: Option<&str>) -> Result<Self, RegistrationError> {
        let namespace = namespace.trim();
        if namespace.is_empty() {
            return Err(RegistrationError::EmptyNamespace);
        }

        // a namespace containing the qualifier could never be routed to
        reject_char(namespace, QUALIFIER_SEPARATOR)?;
        Self::serialize(namespace, variant)
    }

    fn serialize(name: &str, variant: Option<&str>) -> Result<Self, RegistrationError> {
        reject_char(name, KEY_SEPARATOR)?;

        match normalize_variant(variant) {
            Some(variant) => {
                reject_char(variant, KEY_SEPARATOR)?;
                Ok(IconKey(format!("{name}{KEY_SEPARATOR}{variant}")))
            }
            None => Ok(IconKey(name.to_owned())),
        }
    }

    /// The name (or namespace) half of the key.
    pub fn name(&self) -> &str {
        self.split().0
    }

    pub fn variant(&self) -> Option<&str> {
        self.split().1
    }

    fn split(&self) -> (&str, Option<&str>) {
        match self.0.split_once(KEY_SEPARATOR) {
            Some((name, variant)) => (name, Some(variant)),
            None => (&self.0, None),
        }
    }
}

impl fmt::Display for IconKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.split() {
            (name, Some(variant)) => write!(f, "`{name}` (variant `{variant}`)"),
            (name, None) => write!(f, "`{name}`"),
        }
    }
}

/// Trims a variant, mapping empty to `None`.
pub fn normalize_variant(variant: Option<&str>) -> Option<&str> {
    variant.map(str::trim).filter(|v| !v.is_empty())
}

fn reject_char(value: &str, character: char) -> Result<(), RegistrationError> {
    if value.contains(character) {
        return Err(RegistrationError::ReservedCharacter {
            value: value.to_owned(),
            character,
        });
    }

    Ok(())
}

/// Where a resolution request should be routed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Request<'a> {
    Icon {
        name: &'a str,
        variant: Option<&'a str>,
    },
    IconSet {
        namespace: &'a str,
        id: &'a str,
        variant: Option<&'a str>,
    },
}

/// Splits a possibly qualified request string.
///
/// `"first:second"` becomes an icon-set lookup if `first` is a known namespace, and is otherwise
/// read as `name:variant`, where the explicit `variant` argument takes precedence.
/// Only the first separator splits: `"a:b:c"` is `a` and `b:c`.
pub fn route<'a>(
    name: &'a str,
    variant: Option<&'a str>,
    is_namespace: impl Fn(&str) -> bool,
) -> Request<'a> {
    let name = name.trim();
    let variant = normalize_variant(variant);

    let Some((first, second)) = name.split_once(QUALIFIER_SEPARATOR) else {
        return Request::Icon { name, variant };
    };
    let (first, second) = (first.trim(), second.trim());

    if is_namespace(first) {
        return Request::IconSet {
            namespace: first,
            id: second,
            variant,
        };
    }

    Request::Icon {
        name: first,
        variant: variant.or(normalize_variant(Some(second))),
    }
}
