#![doc = r"Core types for the vdom renderer: virtual nodes, events and the in-memory live document."]

pub mod collections;
pub mod dom;
pub mod event;
pub mod vnode;

pub use collections::map::{HashMap, HashSet};
pub use dom::{
    BoolProperty, Document, Listener, ListenerId, Mutation, NodeError, NodeType,
};
pub use event::{Event, EventHandler};
pub use vnode::{
    format_number, h, Component, ComponentNode, ElementNode, PropValue, Props, Style, VNode,
};

/// Identifier of a node in a [`Document`].
pub type NodeId = usize;

/// Builds a [`Props`] map from `key => value` pairs.
#[macro_export]
macro_rules! props {
    () => {
        $crate::Props::new()
    };
    ($($key:expr => $value:expr),+ $(,)?) => {{
        let mut props = $crate::Props::new();
        $(props.insert(::std::string::String::from($key), $crate::PropValue::from($value));)+
        props
    }};
}
