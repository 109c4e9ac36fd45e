//! Applies the difference between two props objects to one live element.

use log::warn;
use vdom_core::{BoolProperty, NodeId, PropValue, Props};

use crate::{RenderContext, RenderError};

const CHILDREN_KEY: &str = "children";
const CLASS_NAME_KEY: &str = "className";
const STYLE_KEY: &str = "style";
const EVENT_PREFIX: &str = "on";

/// Event name bound by a prop key, e.g. `onClick` -> `click`.
pub fn event_name(key: &str) -> Option<String> {
    let lowered = key.to_ascii_lowercase();
    lowered
        .strip_prefix(EVENT_PREFIX)
        .filter(|name| !name.is_empty())
        .map(str::to_owned)
}

/// Brings `element` from the state described by `old` to the one described by `new`.
///
/// Keys present in `new` are applied (identical handlers are left alone),
/// then keys only present in `old` are cleaned up. `children` is ignored.
pub fn sync_attributes(
    ctx: RenderContext<'_>,
    element: NodeId,
    new: Option<&Props>,
    old: Option<&Props>,
) -> Result<(), RenderError> {
    if let Some(new) = new {
        for (key, value) in new {
            if key == CHILDREN_KEY {
                continue;
            }
            apply_prop(ctx, element, key, value, old.and_then(|old| old.get(key)))?;
        }
    }

    if let Some(old) = old {
        for (key, value) in old {
            if key == CHILDREN_KEY || new.is_some_and(|new| new.contains_key(key)) {
                continue;
            }
            remove_prop(ctx, element, key, value)?;
        }
    }
    Ok(())
}

fn apply_prop(
    ctx: RenderContext<'_>,
    element: NodeId,
    key: &str,
    value: &PropValue,
    old_value: Option<&PropValue>,
) -> Result<(), RenderError> {
    let document = ctx.document;
    let event = event_name(key);
    let previous_handler = old_value.and_then(PropValue::as_handler);

    if let (Some(event), Some(handler)) = (event.as_deref(), value.as_handler()) {
        match previous_handler {
            Some(previous) if previous.ptr_eq(handler) => {}
            Some(previous) => {
                ctx.registry
                    .register(document, element, event, handler.clone());
                ctx.registry.unregister(document, element, event, previous);
            }
            None => ctx
                .registry
                .register(document, element, event, handler.clone()),
        }
        return Ok(());
    }

    // Event key that no longer carries a handler.
    if let (Some(event), Some(previous)) = (event.as_deref(), previous_handler) {
        ctx.registry.unregister(document, element, event, previous);
    }

    if key == CLASS_NAME_KEY {
        document.set_class_name(element, &value.to_attribute_value().unwrap_or_default())?;
        return Ok(());
    }

    if let (STYLE_KEY, PropValue::Style(style)) = (key, value) {
        for (property, declaration) in style {
            document.set_style_property(element, property, declaration)?;
        }
        return Ok(());
    }

    if let Some(property) = BoolProperty::from_key(key) {
        let enabled = value.is_truthy();
        document.set_property(element, property, enabled)?;
        if property.reflects_attribute() && enabled {
            document.set_attribute(element, property.attribute_name(), "")?;
        } else {
            document.remove_attribute(element, property.attribute_name())?;
        }
        return Ok(());
    }

    match value.to_attribute_value() {
        Some(text) => document.set_attribute(element, key, &text)?,
        None if matches!(value, PropValue::Null) => {}
        None => warn!("prop `{key}` on node {element} has no attribute form; skipped"),
    }
    Ok(())
}

fn remove_prop(
    ctx: RenderContext<'_>,
    element: NodeId,
    key: &str,
    old_value: &PropValue,
) -> Result<(), RenderError> {
    let document = ctx.document;

    if let (Some(event), Some(handler)) = (event_name(key), old_value.as_handler()) {
        ctx.registry.unregister(document, element, &event, handler);
        return Ok(());
    }

    if key == CLASS_NAME_KEY {
        document.remove_attribute(element, "class")?;
    } else if let Some(property) = BoolProperty::from_key(key) {
        document.set_property(element, property, false)?;
        document.remove_attribute(element, property.attribute_name())?;
    } else {
        document.remove_attribute(element, key)?;
    }
    Ok(())
}

#[cfg(test)]
#[path = "tests/attributes_tests.rs"]
mod tests;
