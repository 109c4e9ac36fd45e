//! Root-level listeners that route events to registered handlers.

use std::cell::RefCell;
use std::rc::{Rc, Weak};

use indexmap::IndexMap;
use log::{debug, error, trace};
use vdom_core::{Document, Event, Listener, NodeId};

use crate::registry::{EventRegistry, RegistryState};

/// Brings the listeners on `root` in line with the registered event types.
///
/// Listeners for types that are still wanted and still attached are kept;
/// the rest are removed and missing types get a fresh listener.
pub(crate) fn sync_root(registry: &EventRegistry, document: &Document, root: NodeId) {
    let (wanted, previous) = {
        let state = registry.state.borrow();
        (
            state.event_types(),
            state.roots.get(&root).cloned().unwrap_or_default(),
        )
    };

    let mut attached = IndexMap::with_capacity(wanted.len());
    for event_type in &wanted {
        let existing = previous
            .get(event_type)
            .copied()
            .filter(|&listener| document.has_event_listener(root, listener));
        let listener = match existing {
            Some(listener) => listener,
            None => {
                let callback = delegated_listener(Rc::downgrade(&registry.state), root);
                match document.add_event_listener(root, event_type, callback) {
                    Ok(listener) => listener,
                    Err(err) => {
                        error!("failed to attach {event_type} listener to {root}: {err}");
                        continue;
                    }
                }
            }
        };
        attached.insert(event_type.clone(), listener);
    }

    let mut removed = 0;
    for (event_type, listener) in &previous {
        if attached.get(event_type) != Some(listener) {
            if let Err(err) = document.remove_event_listener(root, *listener) {
                trace!("stale {event_type} listener on {root}: {err}");
            }
            removed += 1;
        }
    }
    let added = attached
        .iter()
        .filter(|(event_type, listener)| previous.get(*event_type) != Some(*listener))
        .count();
    if added + removed > 0 {
        debug!("delegation on {root}: +{added} -{removed} listeners, types {wanted:?}");
    }

    registry.state.borrow_mut().roots.insert(root, attached);
}

fn delegated_listener(state: Weak<RefCell<RegistryState>>, root: NodeId) -> Listener {
    Rc::new(move |document: &Document, event: &Event| {
        if let Some(state) = state.upgrade() {
            deliver(&state, document, root, event);
        }
    })
}

/// Walks from the event target up to `root` (exclusive), invoking the
/// handlers registered on each node for the event's type.
///
/// When another delegation root sits between the target and `root`, nodes
/// below it are left to that root's own listener and the walk starts at the
/// nested root. Each handler list is copied before it runs, so handlers may
/// register, unregister or re-render freely. A failing handler is logged and
/// the walk continues.
fn deliver(state: &RefCell<RegistryState>, document: &Document, root: NodeId, event: &Event) {
    let start = walk_start(state, document, root, event.target());
    let mut current = Some(start);
    while let Some(node) = current {
        if node == root {
            break;
        }
        let handlers = state.borrow().handlers(node, event.event_type());
        if let Some(handlers) = handlers {
            event.set_current_target(Some(node));
            for handler in handlers {
                if let Err(err) = handler.call(event) {
                    error!("{} handler on node {node} failed: {err:#}", event.event_type());
                }
            }
            if event.is_propagation_stopped() {
                break;
            }
        }
        current = document.parent(node);
    }
    event.set_current_target(Some(root));
}

/// Outermost delegation root strictly between `target` and `root`, or `target`.
fn walk_start(
    state: &RefCell<RegistryState>,
    document: &Document,
    root: NodeId,
    target: NodeId,
) -> NodeId {
    let state = state.borrow();
    let mut start = target;
    let mut current = Some(target);
    while let Some(node) = current {
        if node == root {
            break;
        }
        if state.roots.contains_key(&node) {
            start = node;
        }
        current = document.parent(node);
    }
    start
}
