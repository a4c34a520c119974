use crate::element::Element;
use crate::fetch::{Transport, UrlPolicy, fetch_element};
use crate::icon::IconSource;
use crate::key::IconKey;
use crate::parse::parse;
use crate::registry::{IconError, IconFuture};
use futures::FutureExt;
use futures::future::{self, LocalBoxFuture, Shared};
use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::{Rc, Weak};

type Materialized = Result<Rc<Element>, IconError>;
type Pending = Shared<LocalBoxFuture<'static, Materialized>>;

/// Parsed elements keyed by canonical key, plus the fetches currently in flight.
///
/// Only parsed elements are ever cached. Failures are not, so the next request for a key that
/// failed starts over.
#[derive(Clone)]
pub struct FetchCache {
    state: Rc<RefCell<CacheState>>,
    transport: Rc<dyn Transport>,
    policy: Rc<dyn UrlPolicy>,
}

#[derive(Default)]
struct CacheState {
    elements: HashMap<IconKey, Rc<Element>>,
    in_flight: HashMap<IconKey, Pending>,
}

impl FetchCache {
    pub fn new(transport: Rc<dyn Transport>, policy: Rc<dyn UrlPolicy>) -> Self {
        Self {
            state: Rc::default(),
            transport,
            policy,
        }
    }

    /// A fresh clone of the element cached under `key`, if any.
    pub fn cached(&self, key: &IconKey) -> Option<Element> {
        let state = self.state.borrow();
        state.elements.get(key).map(|element| Element::clone(element))
    }

    pub fn is_cached(&self, key: &IconKey) -> bool {
        self.state.borrow().elements.contains_key(key)
    }

    pub fn is_pending(&self, key: &IconKey) -> bool {
        self.state.borrow().in_flight.contains_key(key)
    }

    /// Drops the parsed element for `key`. A fetch in flight for `key` is left alone.
    pub fn invalidate(&self, key: &IconKey) {
        let _removed = self.state.borrow_mut().elements.remove(key);

        #[cfg(feature = "log")]
        if _removed.is_some() {
            log::debug!("invalidated cached icon {key}");
        }
    }

    /// Turns `source` into a parsed element cached under `key` and resolves to a clone of it.
    ///
    /// Concurrent calls for a URL-backed key share a single fetch. Every waiter gets its own
    /// clone of the one result, or the same error.
    pub fn materialize(&self, key: IconKey, source: &IconSource) -> IconFuture {
        if let Some(element) = self.cached(&key) {
            return future::ready(Ok(element)).boxed_local();
        }

        match source {
            IconSource::SvgText(text) => {
                let result = parse(text).map(|element| {
                    let cloned = element.clone();
                    self.state
                        .borrow_mut()
                        .elements
                        .insert(key, Rc::new(element));
                    cloned
                });

                future::ready(result.map_err(IconError::from)).boxed_local()
            }
            IconSource::Url(url) => {
                let joined = self.state.borrow().in_flight.get(&key).cloned();
                if let Some(pending) = joined {
                    return detach(pending);
                }

                let fetch =
                    match fetch_element(self.transport.as_ref(), self.policy.as_ref(), url) {
                        Ok(fetch) => fetch,
                        Err(e) => return future::ready(Err(e)).boxed_local(),
                    };

                let state = Rc::downgrade(&self.state);
                let settled_key = key.clone();
                let pending = settle(fetch, state, settled_key).boxed_local().shared();

                self.state
                    .borrow_mut()
                    .in_flight
                    .insert(key, pending.clone());

                detach(pending)
            }
        }
    }
}

async fn settle(
    fetch: LocalBoxFuture<'static, Result<Element, IconError>>,
    state: Weak<RefCell<CacheState>>,
    key: IconKey,
) -> Materialized {
    let outcome = fetch.await.map(Rc::new);

    if let Some(state) = state.upgrade() {
        let mut state = state.borrow_mut();
        state.in_flight.remove(&key);

        // whichever fetch finishes last owns the cache entry, even if the registration changed
        if let Ok(element) = &outcome {
            state.elements.insert(key, Rc::clone(element));
        }
    }

    outcome
}

fn detach(pending: Pending) -> IconFuture {
    pending
        .map(|outcome| outcome.map(|element| Element::clone(&element)))
        .boxed_local()
}

/// The materialized form of one icon-set registration.
///
/// A sheet is parsed or fetched at most once (barring failures) and kept on the slot itself.
pub struct SheetSlot {
    source: IconSource,
    state: RefCell<SheetState>,
}

#[derive(Default)]
struct SheetState {
    parsed: Option<Rc<Element>>,
    pending: Option<Pending>,
}

impl SheetSlot {
    pub fn new(source: IconSource) -> Rc<Self> {
        Rc::new(Self {
            source,
            state: RefCell::default(),
        })
    }

    pub fn materialize(
        self: &Rc<Self>,
        transport: &dyn Transport,
        policy: &dyn UrlPolicy,
    ) -> LocalBoxFuture<'static, Materialized> {
        if let Some(parsed) = self.state.borrow().parsed.clone() {
            return future::ready(Ok(parsed)).boxed_local();
        }

        match &self.source {
            IconSource::SvgText(text) => {
                let result = parse(text).map(Rc::new).map_err(IconError::from);
                if let Ok(parsed) = &result {
                    self.state.borrow_mut().parsed = Some(Rc::clone(parsed));
                }

                future::ready(result).boxed_local()
            }
            IconSource::Url(url) => {
                let joined = self.state.borrow().pending.clone();
                if let Some(pending) = joined {
                    return pending.boxed_local();
                }

                let fetch = match fetch_element(transport, policy, url) {
                    Ok(fetch) => fetch,
                    Err(e) => return future::ready(Err(e)).boxed_local(),
                };

                #[cfg(feature = "log")]
                log::debug!("loading icon set from {url:?}");

                let slot = Rc::downgrade(self);
                let pending = async move {
                    let outcome = fetch.await.map(Rc::new);

                    if let Some(slot) = slot.upgrade() {
                        let mut state = slot.state.borrow_mut();
                        state.pending = None;
                        if let Ok(parsed) = &outcome {
                            state.parsed = Some(Rc::clone(parsed));
                        }
                    }

                    outcome
                }
                .boxed_local()
                .shared();

                self.state.borrow_mut().pending = Some(pending.clone());
                pending.boxed_local()
            }
        }
    }
}
