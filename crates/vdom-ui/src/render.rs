use std::rc::Rc;

use log::{debug, trace, warn};
use vdom_core::{Document, NodeError, NodeId, VNode};
use vdom_events::EventRegistry;

use crate::construct::construct;
use crate::normalize::normalize;
use crate::reconcile::reconcile;
use crate::{RenderContext, RenderError};

/// Knobs for a [`Renderer`].
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct RenderOptions {
    /// Log the container's live tree at `debug` level after every render.
    pub debug_tree: bool,
    /// Turn on the document's mutation journal when the renderer is created.
    pub record_mutations: bool,
}

impl RenderOptions {
    pub fn debug_tree(mut self, enabled: bool) -> Self {
        self.debug_tree = enabled;
        self
    }

    pub fn record_mutations(mut self, enabled: bool) -> Self {
        self.record_mutations = enabled;
        self
    }
}

/// Renders virtual trees into containers of one document.
///
/// Each container remembers the last tree rendered into it; the next render
/// reconciles against that tree instead of rebuilding.
#[derive(Clone, Debug)]
pub struct Renderer {
    document: Document,
    registry: EventRegistry,
    options: RenderOptions,
}

impl Renderer {
    pub fn new(document: Document) -> Self {
        Self::with_options(document, RenderOptions::default())
    }

    pub fn with_options(document: Document, options: RenderOptions) -> Self {
        if options.record_mutations {
            document.set_journal_enabled(true);
        }
        Self {
            document,
            registry: EventRegistry::new(),
            options,
        }
    }

    /// Replaces the registry, e.g. to share one between renderers of the same
    /// document. A registry already bound to another document ignores every
    /// call this renderer makes.
    pub fn with_registry(mut self, registry: EventRegistry) -> Self {
        if !registry.accepts(&self.document) {
            warn!("registry is bound to a different document; its handlers will not be wired");
        }
        self.registry = registry;
        self
    }

    pub fn document(&self) -> &Document {
        &self.document
    }

    pub fn registry(&self) -> &EventRegistry {
        &self.registry
    }

    pub fn options(&self) -> RenderOptions {
        self.options
    }

    fn context(&self) -> RenderContext<'_> {
        RenderContext::new(&self.document, &self.registry)
    }

    pub fn render(&self, input: &VNode, container: NodeId) -> Result<(), RenderError> {
        render_into(self.context(), input, container)?;
        if self.options.debug_tree {
            debug!(
                "rendered into {container}:\n{}",
                self.document.dump_tree(container)
            );
        }
        Ok(())
    }

    /// Removes everything rendered into `container` and forgets its tree.
    pub fn unmount(&self, container: NodeId) -> Result<(), RenderError> {
        let ctx = self.context();
        ensure_container(ctx.document, container)?;
        clear_container(ctx, container)?;
        self.document.set_rendered_tree(container, None)?;
        self.registry.attach_delegation(&self.document, container);
        Ok(())
    }

    /// Detaches every delegated listener and drops all registrations.
    pub fn dispose(&self) {
        self.registry.dispose(&self.document);
    }
}

/// Renders `input` into `container`, constructing on the first call and
/// reconciling against the previously rendered tree afterwards.
pub fn render(
    document: &Document,
    registry: &EventRegistry,
    input: &VNode,
    container: NodeId,
) -> Result<(), RenderError> {
    render_into(RenderContext::new(document, registry), input, container)
}

fn render_into(
    ctx: RenderContext<'_>,
    input: &VNode,
    container: NodeId,
) -> Result<(), RenderError> {
    let document = ctx.document;
    ensure_container(document, container)?;
    let tree = normalize(input);

    match document.rendered_tree(container) {
        None => {
            trace!("first render into {container}");
            clear_container(ctx, container)?;
            let root = construct(ctx, &tree)?;
            document.append_child(container, root)?;
        }
        Some(_) if document.child_count(container) == 0 => {
            trace!("container {container} was emptied; rebuilding");
            let root = construct(ctx, &tree)?;
            document.append_child(container, root)?;
        }
        Some(previous) => {
            trace!("reconciling {container}");
            reconcile(ctx, container, Some(&tree), Some(previous.as_ref()), 0)?;
        }
    }

    document.set_rendered_tree(container, Some(Rc::new(tree)))?;
    ctx.registry.attach_delegation(document, container);
    Ok(())
}

fn ensure_container(document: &Document, container: NodeId) -> Result<(), NodeError> {
    if !document.contains(container) {
        return Err(NodeError::Missing { id: container });
    }
    if !document.is_element(container) {
        return Err(NodeError::TypeMismatch {
            id: container,
            expected: "element",
        });
    }
    Ok(())
}

fn clear_container(ctx: RenderContext<'_>, container: NodeId) -> Result<(), RenderError> {
    for child in ctx.document.children(container).into_iter().rev() {
        ctx.registry.unregister_subtree(ctx.document, child);
        ctx.document.release(child)?;
    }
    Ok(())
}

#[cfg(test)]
#[path = "tests/render_tests.rs"]
mod tests;
