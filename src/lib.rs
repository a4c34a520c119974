//! A registry for SVG icons: register them once, resolve them anywhere, fetch each only once.
//!
//! `icon_registry` keeps a catalogue of icons (literal markup or URLs), sprite sheets, aliases,
//! themes and animations, and hands out parsed SVG element trees on request.
//! Every resolution returns a fresh deep clone, so callers can mutate what they get freely.
//!
//! # Quick start
//!
//! ```
//! use futures::executor::block_on;
//! use icon_registry::{IconOptions, IconRegistry, IconSource};
//!
//! let icons = IconRegistry::default();
//! icons.set_default_variant(Some("outlined"));
//! icons
//!     .register_icon(
//!         "gear",
//!         IconSource::svg(r#"<svg viewBox="0 0 24 24"><circle r="8"/></svg>"#),
//!         IconOptions::default().variant("outlined").alias("settings"),
//!     )
//!     .unwrap();
//!
//! let gear = block_on(icons.resolve("settings:outlined", None)).unwrap();
//! assert_eq!(gear.attribute("viewBox"), Some("0 0 24 24"));
//! ```
//!
//! # High level design
//!
//! Resolving an icon goes through a handful of stages, each living in its own module:
//!
//! 1.  *Routing*: a request like `"nav:home"` is split into an icon-set lookup (if `nav` is a
//!     registered namespace) or a `name:variant` pair. Names and variants are then folded into a
//!     canonical [IconKey], whose internal separator can never be confused with the `:` used in
//!     requests. See [key].
//!
//! 2.  *Lookup*: the [IconRegistry] follows at most one alias, checks the element cache, then the
//!     registration, and finally retries with the default variant if the request had none.
//!
//! 3.  *Materializing*: literal markup is parsed on the spot. URL sources go through a
//!     [Transport] after a [UrlPolicy] check, and concurrent requests for the same key share one
//!     fetch. Parsed elements are cached; failures are not. See [FetchCache].
//!
//! 4.  *Parsing*: markup becomes a detached [Element] tree, sanitized on the way in. Anything
//!     that is not a single `<svg>` root is rejected. See [parse()].
//!
//! Everything runs on a single thread. Registration never blocks and may happen at any time,
//! even from inside a transport or a resolution's continuation.
//!
//! Bulk registration is available through [IconConfig], which also reads JSON manifests, and
//! [SearchDirectories], which turns `<dir>/<variant>/<name>.svg` trees into a config.

mod cache;
pub mod config;
mod element;
mod fetch;
mod icon;
pub mod key;
mod parse;
mod registry;
mod search_dir;
pub mod theme;

pub use cache::FetchCache;
pub use config::{ConfigError, IconConfig};
pub use element::{Element, Node};
pub use fetch::{DefaultUrlPolicy, FetchError, FileTransport, Transport, UrlPolicy};
pub use icon::*;
pub use key::IconKey;
pub use parse::{MAX_NESTING_DEPTH, MalformedSource, SVG_NAMESPACE, parse};
pub use registry::{DEFAULT_VIEW_BOX, IconError, IconFuture, IconRegistry};
pub use search_dir::*;
pub use theme::{AnimationDefinition, ThemeDefinition};
