use vdom_core::{NodeId, VNode};

use crate::attributes::sync_attributes;
use crate::{RenderContext, RenderError};

/// Builds a detached live subtree for a normalized node.
///
/// Element props go through [`sync_attributes`], so event props end up in the
/// registry rather than on the element.
pub fn construct(ctx: RenderContext<'_>, node: &VNode) -> Result<NodeId, RenderError> {
    let document = ctx.document;
    match node {
        VNode::Empty => Ok(document.create_text("")),
        VNode::Text(text) => Ok(document.create_text(text)),
        VNode::Component(component) => Err(RenderError::UnresolvedComponent {
            name: component.component.name(),
        }),
        VNode::Fragment(items) => {
            let fragment = document.create_fragment();
            append_children(ctx, fragment, items)?;
            Ok(fragment)
        }
        VNode::Element(element) => {
            let id = document.create_element(&element.tag);
            sync_attributes(ctx, id, Some(&element.props), None)?;
            append_children(ctx, id, &element.children)?;
            Ok(id)
        }
    }
}

fn append_children(
    ctx: RenderContext<'_>,
    parent: NodeId,
    children: &[VNode],
) -> Result<(), RenderError> {
    for child in children {
        let id = construct(ctx, child)?;
        ctx.document.append_child(parent, id)?;
    }
    Ok(())
}
