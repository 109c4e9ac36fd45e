use std::cell::RefCell;
use std::rc::Rc;

use indexmap::IndexMap;
use log::{trace, warn};
use vdom_core::{Document, EventHandler, HashMap, HashSet, ListenerId, NodeId};

use crate::delegation;

/// Handlers registered for one `(element, event type)` pair.
///
/// Membership is by identity, so registering the same handler twice keeps a
/// single entry.
#[derive(Clone, Debug, Default)]
pub(crate) struct HandlerSet {
    handlers: Vec<EventHandler>,
}

impl HandlerSet {
    fn insert(&mut self, handler: EventHandler) -> bool {
        if self.handlers.iter().any(|existing| existing.ptr_eq(&handler)) {
            return false;
        }
        self.handlers.push(handler);
        true
    }

    fn remove(&mut self, handler: &EventHandler) -> bool {
        let before = self.handlers.len();
        self.handlers.retain(|existing| !existing.ptr_eq(handler));
        self.handlers.len() != before
    }

    pub(crate) fn len(&self) -> usize {
        self.handlers.len()
    }

    pub(crate) fn is_empty(&self) -> bool {
        self.handlers.is_empty()
    }

    pub(crate) fn snapshot(&self) -> Vec<EventHandler> {
        self.handlers.clone()
    }
}

pub(crate) type TypeMap = IndexMap<String, HandlerSet>;

#[derive(Default)]
pub(crate) struct RegistryState {
    /// Document every id below belongs to, set by the first call that names one.
    document: Option<Document>,
    pub(crate) store: HashMap<NodeId, TypeMap>,
    /// Delegated listeners this registry attached, per root and event type.
    pub(crate) roots: IndexMap<NodeId, IndexMap<String, ListenerId>>,
}

impl RegistryState {
    pub(crate) fn handlers(&self, element: NodeId, event_type: &str) -> Option<Vec<EventHandler>> {
        self.store
            .get(&element)
            .and_then(|types| types.get(event_type))
            .map(HandlerSet::snapshot)
    }

    /// Sorted union of every registered event type.
    pub(crate) fn event_types(&self) -> Vec<String> {
        let unique: HashSet<&str> = self
            .store
            .values()
            .flat_map(|type_map| type_map.keys().map(String::as_str))
            .collect();
        let mut types: Vec<String> = unique.into_iter().map(str::to_owned).collect();
        types.sort_unstable();
        types
    }
}

/// Registration counts for one element, as reported by [`EventRegistry::event_info`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct EventInfo {
    pub element: NodeId,
    /// Tag name, or `"unknown"` when the element is no longer in the document.
    pub tag: String,
    pub events: Vec<(String, usize)>,
}

/// Maps live elements to their application handlers and keeps one delegated
/// listener per event type on every root it has been attached to.
///
/// Clones share state. Node ids only mean something within one document, so
/// a registry binds to the first document it is used with and ignores calls
/// naming any other one until [`EventRegistry::dispose`] releases it.
#[derive(Clone, Default)]
pub struct EventRegistry {
    pub(crate) state: Rc<RefCell<RegistryState>>,
}

impl std::fmt::Debug for EventRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let state = self.state.borrow();
        f.debug_struct("EventRegistry")
            .field("elements", &state.store.len())
            .field("roots", &state.roots.keys().collect::<Vec<_>>())
            .finish()
    }
}

impl EventRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn ptr_eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.state, &other.state)
    }

    /// The document this registry is bound to, if any.
    pub fn document(&self) -> Option<Document> {
        self.state.borrow().document.clone()
    }

    /// Whether calls naming `document` would be honoured.
    pub fn accepts(&self, document: &Document) -> bool {
        self.state
            .borrow()
            .document
            .as_ref()
            .map_or(true, |bound| bound.ptr_eq(document))
    }

    /// Binds to `document` on first use; false when bound to another one.
    fn bind(&self, document: &Document, operation: &str) -> bool {
        let mut state = self.state.borrow_mut();
        match &state.document {
            Some(bound) if bound.ptr_eq(document) => true,
            Some(_) => {
                warn!("ignoring {operation}: registry is bound to a different document");
                false
            }
            None => {
                state.document = Some(document.clone());
                true
            }
        }
    }

    pub fn register(
        &self,
        document: &Document,
        element: NodeId,
        event_type: &str,
        handler: EventHandler,
    ) {
        if !self.bind(document, "register") {
            return;
        }
        if !document.is_element(element) {
            warn!("ignoring {event_type} handler for node {element}: not a live element");
            return;
        }
        let inserted = self
            .state
            .borrow_mut()
            .store
            .entry(element)
            .or_default()
            .entry(event_type.to_owned())
            .or_default()
            .insert(handler);
        if inserted {
            self.refresh(document);
        }
    }

    pub fn unregister(
        &self,
        document: &Document,
        element: NodeId,
        event_type: &str,
        handler: &EventHandler,
    ) {
        if !self.bind(document, "unregister") {
            return;
        }
        let removed = {
            let mut state = self.state.borrow_mut();
            let Some(types) = state.store.get_mut(&element) else {
                return;
            };
            let removed = match types.get_mut(event_type) {
                Some(set) => {
                    let removed = set.remove(handler);
                    if set.is_empty() {
                        types.shift_remove(event_type);
                    }
                    removed
                }
                None => false,
            };
            if types.is_empty() {
                state.store.remove(&element);
            }
            removed
        };
        if removed {
            self.refresh(document);
        }
    }

    /// Drops every registration of `element`.
    pub fn unregister_all(&self, document: &Document, element: NodeId) {
        if !self.bind(document, "unregister_all") {
            return;
        }
        let removed = self.state.borrow_mut().store.remove(&element).is_some();
        if removed {
            self.refresh(document);
        }
    }

    /// Drops the registrations of `root` and every live node below it, then
    /// refreshes delegation once.
    pub fn unregister_subtree(&self, document: &Document, root: NodeId) {
        if !self.bind(document, "unregister_subtree") {
            return;
        }
        let nodes = document.descendants(root);
        let removed = {
            let mut state = self.state.borrow_mut();
            nodes
                .iter()
                .filter(|&&node| state.store.remove(&node).is_some())
                .count()
        };
        if removed > 0 {
            trace!("dropped registrations of {removed} nodes under {root}");
            self.refresh(document);
        }
    }

    /// Makes `root` carry exactly one delegated listener per registered event type.
    ///
    /// Calling it again with unchanged registrations leaves the document untouched.
    pub fn attach_delegation(&self, document: &Document, root: NodeId) {
        if !self.bind(document, "attach_delegation") {
            return;
        }
        if !document.is_element(root) {
            warn!("cannot delegate events to node {root}: not a live element");
            return;
        }
        delegation::sync_root(self, document, root);
    }

    /// Removes every delegated listener, forgets all registrations and roots,
    /// and releases the document binding.
    pub fn dispose(&self, document: &Document) {
        if !self.bind(document, "dispose") {
            return;
        }
        let roots = {
            let mut state = self.state.borrow_mut();
            state.store.clear();
            state.document = None;
            std::mem::take(&mut state.roots)
        };
        for (root, listeners) in roots {
            for (_, listener) in listeners {
                if let Err(err) = document.remove_event_listener(root, listener) {
                    trace!("listener {listener} on {root} already gone: {err}");
                }
            }
        }
    }

    /// Re-syncs every remembered root, forgetting roots that left the document.
    fn refresh(&self, document: &Document) {
        let roots: Vec<NodeId> = self.state.borrow().roots.keys().copied().collect();
        for root in roots {
            if document.is_element(root) {
                delegation::sync_root(self, document, root);
            } else {
                trace!("forgetting released delegation root {root}");
                self.state.borrow_mut().roots.shift_remove(&root);
            }
        }
    }

    /// One entry per registered element with per-type handler counts.
    pub fn event_info(&self, document: &Document) -> Vec<EventInfo> {
        if !self.accepts(document) {
            warn!("ignoring event_info: registry is bound to a different document");
            return Vec::new();
        }
        let state = self.state.borrow();
        let mut info: Vec<EventInfo> = state
            .store
            .iter()
            .map(|(&element, types)| EventInfo {
                element,
                tag: document
                    .tag_name(element)
                    .unwrap_or_else(|| "unknown".to_owned()),
                events: types
                    .iter()
                    .map(|(event_type, set)| (event_type.clone(), set.len()))
                    .collect(),
            })
            .collect();
        info.sort_by_key(|entry| entry.element);
        info
    }

    pub fn handler_count(&self, element: NodeId, event_type: &str) -> usize {
        self.state
            .borrow()
            .store
            .get(&element)
            .and_then(|types| types.get(event_type))
            .map_or(0, HandlerSet::len)
    }

    pub fn event_types(&self, element: NodeId) -> Vec<String> {
        self.state
            .borrow()
            .store
            .get(&element)
            .map(|types| types.keys().cloned().collect())
            .unwrap_or_default()
    }

    /// Whether `element` has at least one registered handler.
    pub fn contains(&self, element: NodeId) -> bool {
        self.state.borrow().store.contains_key(&element)
    }

    pub fn is_empty(&self) -> bool {
        self.state.borrow().store.is_empty()
    }

    /// Number of elements with registrations.
    pub fn len(&self) -> usize {
        self.state.borrow().store.len()
    }

    /// Event types currently delegated on `root`.
    pub fn delegated_types(&self, root: NodeId) -> Vec<String> {
        self.state
            .borrow()
            .roots
            .get(&root)
            .map(|listeners| listeners.keys().cloned().collect())
            .unwrap_or_default()
    }

    pub fn roots(&self) -> Vec<NodeId> {
        self.state.borrow().roots.keys().copied().collect()
    }
}

#[cfg(test)]
#[path = "tests/registry_tests.rs"]
mod tests;
