use vdom_core::{ElementNode, VNode};

/// Resolves components and produces a tree the reconciler can consume.
///
/// The result holds no component or empty nodes (a lone empty root becomes
/// the empty text), and every child list is free of empty text and nested
/// fragments.
pub fn normalize(node: &VNode) -> VNode {
    match node {
        VNode::Empty => VNode::Text(String::new()),
        VNode::Text(text) => VNode::Text(text.clone()),
        VNode::Component(component) => normalize(&component.render()),
        VNode::Element(element) => VNode::Element(ElementNode {
            tag: element.tag.clone(),
            props: element.props.clone(),
            children: normalize_children(&element.children),
        }),
        VNode::Fragment(items) => VNode::Fragment(normalize_children(items)),
    }
}

fn normalize_children(children: &[VNode]) -> Vec<VNode> {
    let mut out = Vec::with_capacity(children.len());
    for child in children {
        push_normalized(&mut out, normalize(child));
    }
    out
}

fn push_normalized(out: &mut Vec<VNode>, node: VNode) {
    match node {
        VNode::Text(text) if text.is_empty() => {}
        VNode::Fragment(items) => out.extend(items),
        other => out.push(other),
    }
}

/// Whether `node` already satisfies the invariants [`normalize`] establishes.
pub fn is_normalized(node: &VNode) -> bool {
    fn child_ok(child: &VNode) -> bool {
        match child {
            VNode::Text(text) => !text.is_empty(),
            VNode::Fragment(_) | VNode::Empty | VNode::Component(_) => false,
            element => is_normalized(element),
        }
    }
    match node {
        VNode::Text(_) => true,
        VNode::Empty | VNode::Component(_) => false,
        VNode::Element(element) => element.children.iter().all(child_ok),
        VNode::Fragment(items) => items.iter().all(child_ok),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use vdom_core::{props, Component, Props};

    fn badge(props: &Props, children: &[VNode]) -> VNode {
        let label = props
            .get("label")
            .and_then(|value| value.to_attribute_value())
            .unwrap_or_default();
        VNode::element("span")
            .class("badge")
            .child(label)
            .children(children.iter().cloned())
            .into()
    }

    #[test]
    fn empty_root_becomes_empty_text() {
        assert_eq!(normalize(&VNode::Empty), VNode::text(""));
    }

    #[test]
    fn components_resolve_recursively() {
        let inner = Component::new("badge", badge);
        let outer = Component::new("wrapper", move |props: &Props, _: &[VNode]| {
            VNode::component(inner.clone(), props.clone(), vec![VNode::text("!")])
        });
        let tree = VNode::component(outer, props! { "label" => "new" }, Vec::new());

        let normalized = normalize(&tree);
        let span = normalized.as_element().unwrap();
        assert_eq!(span.tag, "span");
        assert_eq!(span.children, vec![VNode::text("new"), VNode::text("!")]);
        assert!(is_normalized(&normalized));
    }

    #[test]
    fn nested_fragments_are_spliced_and_empty_text_dropped() {
        let tree: VNode = VNode::element("ul")
            .child(VNode::text(""))
            .child(VNode::Fragment(vec![
                VNode::element("li").into(),
                VNode::Fragment(vec![VNode::element("li").into()]),
            ]))
            .into();
        let normalized = normalize(&tree);
        let ul = normalized.as_element().unwrap();
        assert_eq!(ul.children.len(), 2);
        assert!(ul.children.iter().all(|child| child.as_element().is_some()));
    }

    #[test]
    fn component_returning_fragment_splices_into_parent() {
        let pair = Component::new("pair", |_: &Props, _: &[VNode]| {
            VNode::fragment([VNode::text("a"), VNode::text("b")])
        });
        let tree: VNode = VNode::element("p")
            .child(VNode::component(pair, Props::new(), Vec::new()))
            .into();
        let normalized = normalize(&tree);
        assert_eq!(
            normalized.as_element().unwrap().children,
            vec![VNode::text("a"), VNode::text("b")]
        );
    }

    #[test]
    fn top_level_fragment_is_kept() {
        let tree = VNode::fragment([VNode::text("x"), VNode::element("hr").into()]);
        assert!(matches!(normalize(&tree), VNode::Fragment(items) if items.len() == 2));
    }
}
