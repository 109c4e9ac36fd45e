//! Event registration and delegation for the vdom renderer.
//!
//! Handlers are never attached to the elements they belong to. The
//! [`EventRegistry`] records them per element and installs a single listener
//! per event type on each delegation root; that listener replays bubbling
//! from the event target up to the root.

mod delegation;
mod registry;

pub use registry::{EventInfo, EventRegistry};

/// Common event type names.
pub mod types {
    pub const CLICK: &str = "click";
    pub const SUBMIT: &str = "submit";
    pub const CHANGE: &str = "change";
    pub const INPUT: &str = "input";
    pub const FOCUS: &str = "focus";
    pub const BLUR: &str = "blur";
    pub const KEYDOWN: &str = "keydown";
    pub const KEYUP: &str = "keyup";
    pub const MOUSEENTER: &str = "mouseenter";
    pub const MOUSELEAVE: &str = "mouseleave";
}
