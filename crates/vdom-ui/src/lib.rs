//! Positional virtual DOM reconciler and render entry point.

pub mod attributes;
pub mod construct;
mod error;
pub mod normalize;
pub mod reconcile;
mod render;

pub use attributes::sync_attributes;
pub use construct::construct;
pub use error::RenderError;
pub use normalize::normalize;
pub use reconcile::reconcile;
pub use render::{render, RenderOptions, Renderer};

pub use vdom_core::{
    h, props, Component, Document, Event, EventHandler, Mutation, NodeId, PropValue, Props,
    VNode,
};
pub use vdom_events::EventRegistry;

/// Document and registry a render pass works against.
#[derive(Clone, Copy)]
pub struct RenderContext<'a> {
    pub document: &'a Document,
    pub registry: &'a EventRegistry,
}

impl<'a> RenderContext<'a> {
    pub fn new(document: &'a Document, registry: &'a EventRegistry) -> Self {
        Self { document, registry }
    }
}
