use crate::cache::{FetchCache, SheetSlot};
use crate::config::IconConfig;
use crate::element::Element;
use crate::fetch::{DefaultUrlPolicy, FetchError, FileTransport, Transport, UrlPolicy};
use crate::icon::{
    IconAlias, IconOptions, IconRegistration, IconSetRegistration, IconSource, RegistrationError,
};
use crate::key::{self, IconKey, Request, normalize_variant};
use crate::parse::{MalformedSource, SVG_NAMESPACE};
use crate::theme::{AnimationDefinition, ThemeDefinition};
use futures::FutureExt;
use futures::future::{self, LocalBoxFuture};
use std::cell::RefCell;
use std::collections::{HashMap, HashSet};
use std::rc::Rc;

/// View box given to an icon-set member when neither it nor its sheet declares one.
pub const DEFAULT_VIEW_BOX: &str = "0 0 24 24";

/// The result of [IconRegistry::resolve]: a fresh element nobody else holds.
pub type IconFuture = LocalBoxFuture<'static, Result<Element, IconError>>;

/// Why a resolution failed. Every waiter on a shared fetch receives the same error.
#[derive(Debug, Clone, thiserror::Error)]
pub enum IconError {
    #[error("icon `{name}`{} is not registered", describe_variant(.variant))]
    NotFound {
        name: String,
        variant: Option<String>,
    },
    #[error("icon namespace `{namespace}`{} is not registered", describe_variant(.variant))]
    NamespaceNotFound {
        namespace: String,
        variant: Option<String>,
    },
    #[error("icon `{id}` could not be found in namespace `{namespace}`")]
    SetMemberNotFound { namespace: String, id: String },
    #[error(transparent)]
    MalformedSource(#[from] MalformedSource),
    #[error("`{url}` is not a safe resource url")]
    UnsafeSource { url: String },
    #[error(transparent)]
    Fetch(#[from] FetchError),
}

fn describe_variant(variant: &Option<String>) -> String {
    match variant {
        Some(variant) => format!(" (variant `{variant}`)"),
        None => String::new(),
    }
}

/// The catalogue of icons, icon sets, aliases, themes and animations for one application.
///
/// `IconRegistry` is a cheap handle: clones share the same state, so construct one at the
/// composition root and pass clones to whatever needs icons.
/// All registration calls are synchronous and never fetch anything; fetching happens on the first
/// [resolve](IconRegistry::resolve) of a URL-backed icon.
///
/// # Consistency
///
/// A resolution acts on the state it sees when it is called, plus whatever it sees when a fetch
/// completes. Re-registering a key evicts its cached element but does not cancel or redirect a
/// fetch already in flight for it: requests for the key keep joining that fetch until it settles,
/// and its result is cached when it does, even over an element cached in the meantime.
#[derive(Clone)]
pub struct IconRegistry {
    state: Rc<RefCell<RegistryState>>,
    cache: FetchCache,
    transport: Rc<dyn Transport>,
    policy: Rc<dyn UrlPolicy>,
}

#[derive(Default)]
struct RegistryState {
    icons: HashMap<IconKey, IconSource>,
    icon_sets: HashMap<IconKey, Vec<Rc<SheetSlot>>>,
    namespaces: HashSet<String>,
    aliases: HashMap<IconKey, IconKey>,
    themes: HashMap<String, ThemeDefinition>,
    animations: HashMap<String, AnimationDefinition>,
    default_variant: Option<String>,
}

impl IconRegistry {
    pub fn new(transport: impl Transport + 'static) -> Self {
        Self::with_url_policy(transport, DefaultUrlPolicy)
    }

    pub fn with_url_policy(
        transport: impl Transport + 'static,
        policy: impl UrlPolicy + 'static,
    ) -> Self {
        let transport: Rc<dyn Transport> = Rc::new(transport);
        let policy: Rc<dyn UrlPolicy> = Rc::new(policy);

        Self {
            state: Rc::default(),
            cache: FetchCache::new(Rc::clone(&transport), Rc::clone(&policy)),
            transport,
            policy,
        }
    }

    /// Creates a registry and applies each config in order.
    pub fn with_configs<'a, I>(
        transport: impl Transport + 'static,
        configs: I,
    ) -> Result<Self, RegistrationError>
    where
        I: IntoIterator<Item = &'a IconConfig>,
    {
        let registry = Self::new(transport);
        for config in configs {
            registry.apply_config(config)?;
        }

        Ok(registry)
    }

    /// Adds everything in `config` to the registry.
    ///
    /// Stops at the first invalid registration; entries applied before it stay registered.
    pub fn apply_config(&self, config: &IconConfig) -> Result<(), RegistrationError> {
        if let Some(variant) = normalize_variant(config.default_variant.as_deref()) {
            self.set_default_variant(Some(variant));
        }

        for icon in &config.icons {
            self.register(icon)?;
        }
        for set in &config.icon_sets {
            self.register_icon_set(set.clone())?;
        }
        for alias in &config.aliases {
            self.register_alias(alias)?;
        }

        self.register_themes(config.themes.clone());
        self.register_animations(config.animations.clone());

        Ok(())
    }

    pub fn register(&self, registration: &IconRegistration) -> Result<(), RegistrationError> {
        self.register_icon(
            &registration.name,
            registration.source.clone(),
            registration.options(),
        )
    }

    /// Registers (or replaces) the icon `(name, options.variant)`.
    ///
    /// Replacing an icon evicts its cached element, so the next resolution sees the new source.
    /// Elements already handed out are unaffected.
    /// Aliases are registered at the same variant as the icon.
    pub fn register_icon(
        &self,
        name: &str,
        source: IconSource,
        options: IconOptions,
    ) -> Result<(), RegistrationError> {
        let source = source.validated()?;
        let variant = options.variant.as_deref();
        let key = IconKey::icon(name, variant)?;
        let alias_keys = options
            .aliases
            .iter()
            .map(|alias| IconKey::icon(alias, variant))
            .collect::<Result<Vec<_>, _>>()?;

        {
            let mut state = self.state.borrow_mut();
            state.icons.insert(key.clone(), source);
            for alias_key in alias_keys {
                state.aliases.insert(alias_key, key.clone());
            }
        }

        self.cache.invalidate(&key);

        #[cfg(feature = "log")]
        log::trace!("registered icon {key}");

        Ok(())
    }

    /// Adds a sprite sheet to `namespace`. Sheets sharing a namespace and variant are searched in
    /// the order they were registered.
    pub fn register_icon_set(&self, set: IconSetRegistration) -> Result<(), RegistrationError> {
        let source = set.source.validated()?;
        let key = IconKey::icon_set(&set.namespace, set.variant.as_deref())?;
        let namespace = key.name().to_owned();

        let mut state = self.state.borrow_mut();
        state
            .icon_sets
            .entry(key)
            .or_default()
            .push(SheetSlot::new(source));
        state.namespaces.insert(namespace);

        Ok(())
    }

    pub fn register_alias(&self, alias: &IconAlias) -> Result<(), RegistrationError> {
        let alias_key = IconKey::icon(&alias.alias, None)?;
        let target_key = IconKey::icon(&alias.target, None)?;

        self.state
            .borrow_mut()
            .aliases
            .insert(alias_key, target_key);

        Ok(())
    }

    pub fn register_theme(&self, name: impl Into<String>, definition: ThemeDefinition) {
        self.state
            .borrow_mut()
            .themes
            .insert(name.into(), definition);
    }

    pub fn register_themes<I>(&self, themes: I)
    where
        I: IntoIterator<Item = (String, ThemeDefinition)>,
    {
        self.state.borrow_mut().themes.extend(themes);
    }

    pub fn register_animation(&self, name: impl Into<String>, definition: AnimationDefinition) {
        self.state
            .borrow_mut()
            .animations
            .insert(name.into(), definition);
    }

    pub fn register_animations<I>(&self, animations: I)
    where
        I: IntoIterator<Item = (String, AnimationDefinition)>,
    {
        self.state.borrow_mut().animations.extend(animations);
    }

    /// Sets the variant tried when a lookup without a variant finds nothing.
    /// `None` (or a blank string) clears it.
    pub fn set_default_variant(&self, variant: Option<&str>) {
        self.state.borrow_mut().default_variant = normalize_variant(variant).map(str::to_owned);
    }

    pub fn default_variant(&self) -> Option<String> {
        self.state.borrow().default_variant.clone()
    }

    pub fn get_theme(&self, name: &str) -> Option<ThemeDefinition> {
        self.state.borrow().themes.get(name).cloned()
    }

    pub fn get_animation(&self, name: &str) -> Option<AnimationDefinition> {
        self.state.borrow().animations.get(name).cloned()
    }

    pub fn is_namespace(&self, namespace: &str) -> bool {
        self.state.borrow().namespaces.contains(namespace.trim())
    }

    /// Whether a parsed element is cached for exactly this key. Aliases are not followed.
    pub fn is_cached(&self, name: &str, variant: Option<&str>) -> bool {
        IconKey::icon(name, variant).is_ok_and(|key| self.cache.is_cached(&key))
    }

    /// Whether a fetch is in flight for exactly this key. Aliases are not followed.
    pub fn is_pending(&self, name: &str, variant: Option<&str>) -> bool {
        IconKey::icon(name, variant).is_ok_and(|key| self.cache.is_pending(&key))
    }

    /// Resolves an icon to a fresh element.
    ///
    /// `name` may be qualified: `"nav:home"` looks up `home` in the icon set `nav` if such a
    /// namespace is registered, and otherwise means icon `nav` at variant `home` (unless
    /// `variant` is given, which always wins).
    ///
    /// Every lookup decision is made before this returns. A fetch for a URL-backed icon starts
    /// right away; icon-set sheets are fetched when the returned future is first polled, and only
    /// as far down the namespace's sheet list as the lookup needs to go.
    /// Failures, including unknown names, arrive through the future.
    pub fn resolve(&self, name: &str, variant: Option<&str>) -> IconFuture {
        let request = {
            let state = self.state.borrow();
            key::route(name, variant, |ns| state.namespaces.contains(ns))
        };

        match request {
            Request::Icon { name, variant } => self.load_icon(name, variant),
            Request::IconSet {
                namespace,
                id,
                variant,
            } => self.load_from_set(namespace, id, variant),
        }
    }

    fn load_icon(&self, name: &str, variant: Option<&str>) -> IconFuture {
        let not_found = || IconError::NotFound {
            name: name.to_owned(),
            variant: variant.map(str::to_owned),
        };

        let Ok(key) = IconKey::icon(name, variant) else {
            return future::ready(Err(not_found())).boxed_local();
        };

        let (resolved, source, default_variant) = {
            let state = self.state.borrow();
            // one level of indirection only: an alias target is never itself looked up as an alias
            let resolved = state.aliases.get(&key).cloned().unwrap_or(key);
            let source = state.icons.get(&resolved).cloned();

            (resolved, source, state.default_variant.clone())
        };

        if let Some(element) = self.cache.cached(&resolved) {
            return future::ready(Ok(element)).boxed_local();
        }

        if let Some(source) = source {
            return self.cache.materialize(resolved, &source);
        }

        if let (None, Some(default)) = (variant, default_variant) {
            #[cfg(feature = "log")]
            log::trace!("icon `{name}` not found, retrying with default variant `{default}`");

            return self.load_icon(name, Some(default.as_str()));
        }

        future::ready(Err(not_found())).boxed_local()
    }

    fn load_from_set(&self, namespace: &str, id: &str, variant: Option<&str>) -> IconFuture {
        let not_found = || IconError::NamespaceNotFound {
            namespace: namespace.to_owned(),
            variant: variant.map(str::to_owned),
        };

        let Ok(key) = IconKey::icon_set(namespace, variant) else {
            return future::ready(Err(not_found())).boxed_local();
        };

        // snapshot, so registering sheets while this lookup runs cannot disturb it
        let (slots, default_variant) = {
            let state = self.state.borrow();
            let slots = state.icon_sets.get(&key).cloned().unwrap_or_default();

            (slots, state.default_variant.clone())
        };

        if slots.is_empty() {
            if let (None, Some(default)) = (variant, default_variant) {
                return self.load_from_set(namespace, id, Some(default.as_str()));
            }

            return future::ready(Err(not_found())).boxed_local();
        }

        let transport = Rc::clone(&self.transport);
        let policy = Rc::clone(&self.policy);
        let namespace = namespace.to_owned();
        let id = id.to_owned();

        async move {
            for slot in slots {
                let sheet = slot
                    .materialize(transport.as_ref(), policy.as_ref())
                    .await?;

                if let Some(member) = sheet.find_by_id(&id) {
                    return Ok(wrap_member(&sheet, member));
                }
            }

            Err(IconError::SetMemberNotFound { namespace, id })
        }
        .boxed_local()
    }
}

impl Default for IconRegistry {
    /// A registry that loads URL sources from the local filesystem.
    fn default() -> Self {
        Self::new(FileTransport::new())
    }
}

/// Builds a standalone `<svg>` around a deep clone of a sprite sheet member.
fn wrap_member(sheet: &Element, member: &Element) -> Element {
    let view_box = member
        .attribute("viewBox")
        .or_else(|| sheet.attribute("viewBox"))
        .unwrap_or(DEFAULT_VIEW_BOX);

    let mut root = Element::new("svg");
    root.set_attribute("xmlns", SVG_NAMESPACE);

    // prefixed attributes in the member still need their declarations
    for (name, value) in sheet.attributes() {
        if name.starts_with("xmlns:") {
            root.set_attribute(name, value);
        }
    }

    root.set_attribute("viewBox", view_box);
    root.push_child(member.clone());
    root
}
