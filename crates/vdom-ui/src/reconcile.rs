//! Positional diff/patch between two normalized trees.

use log::{trace, warn};
use vdom_core::{NodeId, VNode};

use crate::attributes::sync_attributes;
use crate::construct::construct;
use crate::{RenderContext, RenderError};

/// Moves the live child of `parent` at `index` from `old` to `new`.
///
/// Children are matched by position only. A live node is reused when both
/// sides are text, or both are elements with the same tag, or both are
/// fragments; anything else is replaced in place. Every discarded subtree has
/// its registrations dropped before it leaves the document.
pub fn reconcile(
    ctx: RenderContext<'_>,
    parent: NodeId,
    new: Option<&VNode>,
    old: Option<&VNode>,
    index: usize,
) -> Result<(), RenderError> {
    for node in new.into_iter().chain(old) {
        if let VNode::Component(component) = node {
            return Err(RenderError::UnresolvedComponent {
                name: component.component.name(),
            });
        }
    }

    match (new, old) {
        (None, None) => Ok(()),
        (None, Some(old)) => remove_at(ctx, parent, old, index),
        (Some(new), None) => {
            let id = construct(ctx, new)?;
            ctx.document.append_child(parent, id)?;
            Ok(())
        }
        (Some(new), Some(old)) => match (text_of(new), text_of(old)) {
            (Some(new_text), Some(old_text)) => {
                update_text(ctx, parent, new_text, old_text, index)
            }
            (None, None) if same_kind(new, old) => patch(ctx, parent, new, old, index),
            _ => replace_at(ctx, parent, new, old, index),
        },
    }
}

fn text_of(node: &VNode) -> Option<&str> {
    match node {
        VNode::Text(text) => Some(text),
        VNode::Empty => Some(""),
        _ => None,
    }
}

fn same_kind(new: &VNode, old: &VNode) -> bool {
    match (new, old) {
        (VNode::Element(new), VNode::Element(old)) => new.tag == old.tag,
        (VNode::Fragment(_), VNode::Fragment(_)) => true,
        _ => false,
    }
}

fn remove_at(
    ctx: RenderContext<'_>,
    parent: NodeId,
    old: &VNode,
    index: usize,
) -> Result<(), RenderError> {
    let Some(live) = ctx.document.child_at(parent, index) else {
        warn!("no live node at {parent}[{index}] to remove");
        return Ok(());
    };
    if !old.is_text() {
        ctx.registry.unregister_subtree(ctx.document, live);
    }
    ctx.document.release(live)?;
    Ok(())
}

fn update_text(
    ctx: RenderContext<'_>,
    parent: NodeId,
    new: &str,
    old: &str,
    index: usize,
) -> Result<(), RenderError> {
    if new == old {
        return Ok(());
    }
    match ctx.document.child_at(parent, index) {
        Some(live) if ctx.document.is_text(live) => ctx.document.set_text(live, new)?,
        _ => warn!("expected a text node at {parent}[{index}]; update skipped"),
    }
    Ok(())
}

fn replace_at(
    ctx: RenderContext<'_>,
    parent: NodeId,
    new: &VNode,
    old: &VNode,
    index: usize,
) -> Result<(), RenderError> {
    let live = ctx.document.child_at(parent, index);
    if let Some(live) = live {
        if !old.is_text() {
            ctx.registry.unregister_subtree(ctx.document, live);
        }
    }

    let fresh = construct(ctx, new)?;
    match live {
        Some(live) => {
            ctx.document.replace_child(parent, fresh, live)?;
            ctx.document.release(live)?;
        }
        None => {
            warn!("no live node at {parent}[{index}] to replace; appending");
            ctx.document.append_child(parent, fresh)?;
        }
    }
    Ok(())
}

fn patch(
    ctx: RenderContext<'_>,
    parent: NodeId,
    new: &VNode,
    old: &VNode,
    index: usize,
) -> Result<(), RenderError> {
    let Some(live) = ctx.document.child_at(parent, index) else {
        warn!("no live node at {parent}[{index}] to patch");
        return Ok(());
    };
    let (new_children, old_children) = match (new, old) {
        (VNode::Element(new), VNode::Element(old)) => {
            sync_attributes(ctx, live, Some(&new.props), Some(&old.props))?;
            (new.children.as_slice(), old.children.as_slice())
        }
        (VNode::Fragment(new), VNode::Fragment(old)) => (new.as_slice(), old.as_slice()),
        _ => return Ok(()),
    };
    reconcile_children(ctx, live, new_children, old_children)
}

/// Reconciles two child lists position by position.
///
/// Surplus old children are removed from the highest index down so earlier
/// indices stay valid; extra new children are appended in order.
pub fn reconcile_children(
    ctx: RenderContext<'_>,
    parent: NodeId,
    new: &[VNode],
    old: &[VNode],
) -> Result<(), RenderError> {
    let common = new.len().min(old.len());
    for index in 0..common {
        reconcile(ctx, parent, Some(&new[index]), Some(&old[index]), index)?;
    }
    if old.len() > new.len() {
        trace!("removing {} children of {parent}", old.len() - new.len());
        for index in (new.len()..old.len()).rev() {
            reconcile(ctx, parent, None, Some(&old[index]), index)?;
        }
    } else {
        for (index, child) in new.iter().enumerate().skip(old.len()) {
            reconcile(ctx, parent, Some(child), None, index)?;
        }
    }
    Ok(())
}

#[cfg(test)]
#[path = "tests/reconcile_tests.rs"]
mod tests;
