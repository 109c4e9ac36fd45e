//! Testing utilities and harness for the vdom renderer.

use std::cell::Cell;
use std::rc::Rc;

use vdom_core::{Document, Event, EventHandler, Mutation, NodeError, NodeId, NodeType, VNode};
use vdom_events::EventRegistry;
use vdom_ui::{RenderError, RenderOptions, Renderer};

/// Routes `log` output through `env_logger` in test mode. Safe to call repeatedly.
pub fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

/// Fresh document, registry and `<div id="root">` container for one test.
///
/// The mutation journal is on from the start; call [`DomTestRule::take_mutations`]
/// after a render to inspect exactly what it changed.
pub struct DomTestRule {
    renderer: Renderer,
    container: NodeId,
}

impl Default for DomTestRule {
    fn default() -> Self {
        Self::new()
    }
}

impl DomTestRule {
    pub fn new() -> Self {
        Self::with_options(RenderOptions::default())
    }

    pub fn with_options(options: RenderOptions) -> Self {
        init_logging();
        let document = Document::new();
        let container = document.create_element("div");
        let _ = document.set_attribute(container, "id", "root");
        let renderer = Renderer::with_options(document, options.record_mutations(true));
        Self {
            renderer,
            container,
        }
    }

    pub fn render(&self, tree: &VNode) -> Result<(), RenderError> {
        self.renderer.render(tree, self.container)
    }

    /// Renders and returns the mutations that render produced.
    pub fn render_and_collect(&self, tree: &VNode) -> Result<Vec<Mutation>, RenderError> {
        self.take_mutations();
        self.render(tree)?;
        Ok(self.take_mutations())
    }

    pub fn unmount(&self) -> Result<(), RenderError> {
        self.renderer.unmount(self.container)
    }

    pub fn renderer(&self) -> &Renderer {
        &self.renderer
    }

    pub fn document(&self) -> &Document {
        self.renderer.document()
    }

    pub fn registry(&self) -> &EventRegistry {
        self.renderer.registry()
    }

    pub fn container(&self) -> NodeId {
        self.container
    }

    /// The live node built for the root of the rendered tree.
    pub fn root(&self) -> Option<NodeId> {
        self.document().child_at(self.container, 0)
    }

    /// Follows child indices starting at the container, e.g. `&[0, 2]`.
    pub fn node_at(&self, path: &[usize]) -> Option<NodeId> {
        path.iter().try_fold(self.container, |node, &index| {
            self.document().child_at(node, index)
        })
    }

    pub fn dispatch(&self, target: NodeId, event_type: &str) -> Result<Event, NodeError> {
        self.document().dispatch_event(target, event_type)
    }

    pub fn click(&self, target: NodeId) -> Result<Event, NodeError> {
        self.dispatch(target, "click")
    }

    pub fn take_mutations(&self) -> Vec<Mutation> {
        self.document().take_mutations()
    }

    /// Inner HTML of the container.
    pub fn html(&self) -> String {
        self.document().inner_html(self.container)
    }

    pub fn dump_tree(&self) -> String {
        self.document().dump_tree(self.container)
    }

    /// First element under the container whose `id` attribute is `id`.
    pub fn find_by_id(&self, id: &str) -> Option<NodeId> {
        self.elements()
            .find(|&node| self.document().attribute(node, "id").as_deref() == Some(id))
    }

    pub fn find_by_tag(&self, tag: &str) -> Vec<NodeId> {
        let tag = tag.to_ascii_lowercase();
        self.elements()
            .filter(|&node| self.document().tag_name(node).as_deref() == Some(tag.as_str()))
            .collect()
    }

    /// First text node under the container whose content equals `text`.
    pub fn find_text(&self, text: &str) -> Option<NodeId> {
        self.document()
            .descendants(self.container)
            .into_iter()
            .find(|&node| self.document().text(node).as_deref() == Some(text))
    }

    fn elements(&self) -> impl Iterator<Item = NodeId> + '_ {
        self.document()
            .descendants(self.container)
            .into_iter()
            .skip(1)
            .filter(move |&node| self.document().node_type(node) == Some(NodeType::Element))
    }
}

/// Counts how often the handlers it hands out run.
#[derive(Clone, Debug, Default)]
pub struct CallCounter {
    calls: Rc<Cell<usize>>,
}

impl CallCounter {
    pub fn new() -> Self {
        Self::default()
    }

    /// A new handler that bumps this counter. Each call returns a distinct handler.
    pub fn handler(&self) -> EventHandler {
        let calls = Rc::clone(&self.calls);
        EventHandler::new(move |_| calls.set(calls.get() + 1))
    }

    pub fn count(&self) -> usize {
        self.calls.get()
    }

    pub fn reset(&self) {
        self.calls.set(0);
    }
}
