use std::cell::Cell;
use std::fmt;
use std::rc::Rc;

use crate::NodeId;

/// An event travelling through the live document.
///
/// Every event bubbles: it is delivered to the target first and then to each
/// ancestor in turn. The flags use interior mutability so listeners and
/// handlers can share one `&Event` during a dispatch.
#[derive(Debug)]
pub struct Event {
    event_type: String,
    target: NodeId,
    current_target: Cell<Option<NodeId>>,
    propagation_stopped: Cell<bool>,
    default_prevented: Cell<bool>,
}

impl Event {
    pub fn new(event_type: impl Into<String>, target: NodeId) -> Self {
        Self {
            event_type: event_type.into(),
            target,
            current_target: Cell::new(None),
            propagation_stopped: Cell::new(false),
            default_prevented: Cell::new(false),
        }
    }

    pub fn event_type(&self) -> &str {
        &self.event_type
    }

    /// The node the event was originally dispatched at.
    pub fn target(&self) -> NodeId {
        self.target
    }

    /// The node whose handlers are currently running, if a dispatch is in progress.
    pub fn current_target(&self) -> Option<NodeId> {
        self.current_target.get()
    }

    /// Used by dispatchers while walking the propagation path.
    pub fn set_current_target(&self, node: Option<NodeId>) {
        self.current_target.set(node);
    }

    /// Stops the event from reaching further ancestors. Handlers registered on
    /// the current node still run.
    pub fn stop_propagation(&self) {
        self.propagation_stopped.set(true);
    }

    pub fn is_propagation_stopped(&self) -> bool {
        self.propagation_stopped.get()
    }

    pub fn prevent_default(&self) {
        self.default_prevented.set(true);
    }

    pub fn is_default_prevented(&self) -> bool {
        self.default_prevented.get()
    }
}

type HandlerFn = dyn Fn(&Event) -> anyhow::Result<()>;

/// An application event handler.
///
/// Handlers compare by identity: two clones of the same handler are equal,
/// two handlers built from identical closures are not.
#[derive(Clone)]
pub struct EventHandler {
    callback: Rc<HandlerFn>,
}

impl EventHandler {
    pub fn new(callback: impl Fn(&Event) + 'static) -> Self {
        Self::fallible(move |event| {
            callback(event);
            Ok(())
        })
    }

    /// Builds a handler that may fail. Failures are reported by the
    /// dispatcher and never interrupt the surrounding dispatch.
    pub fn fallible(callback: impl Fn(&Event) -> anyhow::Result<()> + 'static) -> Self {
        Self {
            callback: Rc::new(callback),
        }
    }

    pub fn call(&self, event: &Event) -> anyhow::Result<()> {
        (self.callback)(event)
    }

    pub fn ptr_eq(&self, other: &Self) -> bool {
        // Compare data pointers only; vtable pointers may differ across codegen units.
        std::ptr::eq(
            Rc::as_ptr(&self.callback) as *const (),
            Rc::as_ptr(&other.callback) as *const (),
        )
    }
}

impl PartialEq for EventHandler {
    fn eq(&self, other: &Self) -> bool {
        self.ptr_eq(other)
    }
}

impl Eq for EventHandler {}

impl fmt::Debug for EventHandler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "EventHandler({:p})", Rc::as_ptr(&self.callback) as *const ())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clones_share_identity() {
        let handler = EventHandler::new(|_| {});
        let clone = handler.clone();
        assert_eq!(handler, clone);
    }

    #[test]
    fn identical_closures_are_distinct() {
        let a = EventHandler::new(|_| {});
        let b = EventHandler::new(|_| {});
        assert_ne!(a, b);
    }

    #[test]
    fn fallible_handler_reports_failure() {
        let handler = EventHandler::fallible(|_| Err(anyhow::anyhow!("boom")));
        let event = Event::new("click", 0);
        let err = handler.call(&event).unwrap_err();
        assert_eq!(err.to_string(), "boom");
    }

    #[test]
    fn event_flags_start_cleared() {
        let event = Event::new("input", 3);
        assert_eq!(event.event_type(), "input");
        assert_eq!(event.target(), 3);
        assert_eq!(event.current_target(), None);
        assert!(!event.is_propagation_stopped());
        event.stop_propagation();
        event.prevent_default();
        assert!(event.is_propagation_stopped());
        assert!(event.is_default_prevented());
    }
}
