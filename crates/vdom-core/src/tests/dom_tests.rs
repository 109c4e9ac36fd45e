use super::*;
use std::cell::{Cell, RefCell};

fn counting_listener(counter: &Rc<Cell<usize>>) -> Listener {
    let counter = Rc::clone(counter);
    Rc::new(move |_: &Document, _: &Event| counter.set(counter.get() + 1))
}

#[test]
fn append_and_query_children() {
    let doc = Document::new();
    let root = doc.create_element("DIV");
    let a = doc.create_text("a");
    let b = doc.create_element("span");
    doc.append_child(root, a).unwrap();
    doc.append_child(root, b).unwrap();

    assert_eq!(doc.tag_name(root).as_deref(), Some("div"));
    assert_eq!(doc.children(root), vec![a, b]);
    assert_eq!(doc.child_at(root, 1), Some(b));
    assert_eq!(doc.parent(b), Some(root));
    assert_eq!(doc.node_type(a), Some(NodeType::Text));
}

#[test]
fn append_moves_node_from_previous_parent() {
    let doc = Document::new();
    let first = doc.create_element("div");
    let second = doc.create_element("div");
    let child = doc.create_text("x");
    doc.append_child(first, child).unwrap();
    doc.append_child(second, child).unwrap();

    assert_eq!(doc.child_count(first), 0);
    assert_eq!(doc.children(second), vec![child]);
}

#[test]
fn append_rejects_cycles_and_text_parents() {
    let doc = Document::new();
    let outer = doc.create_element("div");
    let inner = doc.create_element("div");
    doc.append_child(outer, inner).unwrap();

    assert_eq!(
        doc.append_child(inner, outer),
        Err(NodeError::HierarchyRequest {
            parent: inner,
            child: outer
        })
    );
    let text = doc.create_text("t");
    assert!(matches!(
        doc.append_child(text, inner),
        Err(NodeError::TypeMismatch { .. })
    ));
}

#[test]
fn replace_child_keeps_position() {
    let doc = Document::new();
    let root = doc.create_element("ul");
    let items: Vec<_> = (0..3).map(|_| doc.create_element("li")).collect();
    for &item in &items {
        doc.append_child(root, item).unwrap();
    }
    let fresh = doc.create_element("p");
    doc.replace_child(root, fresh, items[1]).unwrap();

    assert_eq!(doc.children(root), vec![items[0], fresh, items[2]]);
    assert_eq!(doc.parent(items[1]), None);
}

#[test]
fn remove_child_requires_parent_relation() {
    let doc = Document::new();
    let root = doc.create_element("div");
    let stray = doc.create_text("s");
    assert_eq!(
        doc.remove_child(root, stray),
        Err(NodeError::NotAChild {
            parent: root,
            child: stray
        })
    );
}

#[test]
fn release_frees_whole_subtree() {
    let doc = Document::new();
    let root = doc.create_element("div");
    let section = doc.create_element("section");
    let text = doc.create_text("deep");
    doc.append_child(root, section).unwrap();
    doc.append_child(section, text).unwrap();

    doc.release(section).unwrap();
    assert!(doc.contains(root));
    assert!(!doc.contains(section));
    assert!(!doc.contains(text));
    assert_eq!(doc.child_count(root), 0);
    assert_eq!(doc.text(text), None);
}

#[test]
fn attributes_are_lowercased_and_ordered() {
    let doc = Document::new();
    let el = doc.create_element("input");
    doc.set_attribute(el, "ID", "name").unwrap();
    doc.set_attribute(el, "data-x", "1").unwrap();
    doc.set_class_name(el, "big").unwrap();

    assert_eq!(doc.attribute(el, "id").as_deref(), Some("name"));
    assert_eq!(doc.class_name(el), "big");
    assert_eq!(
        doc.attributes(el),
        vec![
            ("id".to_owned(), "name".to_owned()),
            ("data-x".to_owned(), "1".to_owned()),
            ("class".to_owned(), "big".to_owned()),
        ]
    );
    doc.remove_attribute(el, "data-x").unwrap();
    assert!(!doc.has_attribute(el, "data-x"));
}

#[test]
fn style_attribute_round_trips_through_declarations() {
    let doc = Document::new();
    let el = doc.create_element("div");
    doc.set_style_property(el, "backgroundColor", "red").unwrap();
    doc.set_style_property(el, "width", "10px").unwrap();

    assert_eq!(doc.style_property(el, "background-color").as_deref(), Some("red"));
    assert_eq!(
        doc.attribute(el, "style").as_deref(),
        Some("background-color: red; width: 10px;")
    );

    doc.set_attribute(el, "style", "color: blue").unwrap();
    assert_eq!(doc.style_property(el, "width"), None);
    assert_eq!(doc.style_property(el, "color").as_deref(), Some("blue"));

    doc.remove_attribute(el, "style").unwrap();
    assert_eq!(doc.attribute(el, "style"), None);
}

#[test]
fn boolean_properties_are_separate_from_attributes() {
    let doc = Document::new();
    let el = doc.create_element("input");
    assert_eq!(doc.property(el, BoolProperty::Checked), Some(false));
    doc.set_property(el, BoolProperty::Checked, true).unwrap();
    assert_eq!(doc.property(el, BoolProperty::Checked), Some(true));
    assert!(!doc.has_attribute(el, "checked"));

    let text = doc.create_text("t");
    assert_eq!(doc.property(text, BoolProperty::Checked), None);
    assert_eq!(BoolProperty::from_key("readOnly"), Some(BoolProperty::ReadOnly));
    assert_eq!(BoolProperty::ReadOnly.attribute_name(), "readonly");
    assert!(!BoolProperty::Selected.reflects_attribute());
}

#[test]
fn dispatch_bubbles_from_target_to_root() {
    let doc = Document::new();
    let root = doc.create_element("div");
    let button = doc.create_element("button");
    doc.append_child(root, button).unwrap();

    let seen = Rc::new(RefCell::new(Vec::new()));
    for node in [root, button] {
        let seen = Rc::clone(&seen);
        doc.add_event_listener(
            node,
            "click",
            Rc::new(move |_: &Document, event: &Event| {
                seen.borrow_mut().push(event.current_target());
            }),
        )
        .unwrap();
    }

    let event = doc.dispatch_event(button, "click").unwrap();
    assert_eq!(*seen.borrow(), vec![Some(button), Some(root)]);
    assert_eq!(event.current_target(), None);
}

#[test]
fn stop_propagation_halts_bubbling() {
    let doc = Document::new();
    let root = doc.create_element("div");
    let child = doc.create_element("span");
    doc.append_child(root, child).unwrap();

    let outer = Rc::new(Cell::new(0));
    doc.add_event_listener(root, "click", counting_listener(&outer))
        .unwrap();
    doc.add_event_listener(child, "click", Rc::new(|_: &Document, event: &Event| event.stop_propagation()))
        .unwrap();

    doc.dispatch_event(child, "click").unwrap();
    assert_eq!(outer.get(), 0);
}

#[test]
fn listener_removed_during_dispatch_is_skipped() {
    let doc = Document::new();
    let el = doc.create_element("div");
    let calls = Rc::new(Cell::new(0));
    let second_id = Rc::new(Cell::new(0));

    let remover = {
        let second_id = Rc::clone(&second_id);
        Rc::new(move |doc: &Document, event: &Event| {
            let node = event.current_target().unwrap();
            doc.remove_event_listener(node, second_id.get()).unwrap();
        })
    };
    doc.add_event_listener(el, "click", remover).unwrap();
    second_id.set(
        doc.add_event_listener(el, "click", counting_listener(&calls))
            .unwrap(),
    );

    doc.dispatch_event(el, "click").unwrap();
    assert_eq!(calls.get(), 0);
    assert_eq!(doc.listener_count(el), 1);
}

#[test]
fn listeners_only_see_their_event_type() {
    let doc = Document::new();
    let el = doc.create_element("div");
    let calls = Rc::new(Cell::new(0));
    doc.add_event_listener(el, "input", counting_listener(&calls))
        .unwrap();
    doc.dispatch_event(el, "click").unwrap();
    assert_eq!(calls.get(), 0);
    assert_eq!(doc.listener_types(el), vec!["input".to_owned()]);
}

#[test]
fn journal_records_only_effective_changes() {
    let doc = Document::new();
    let el = doc.create_element("div");
    doc.set_journal_enabled(true);

    doc.set_attribute(el, "id", "a").unwrap();
    doc.set_attribute(el, "id", "a").unwrap();
    doc.remove_attribute(el, "missing").unwrap();
    doc.set_property(el, BoolProperty::Disabled, false).unwrap();

    assert_eq!(
        doc.take_mutations(),
        vec![Mutation::SetAttribute {
            node: el,
            name: "id".to_owned(),
            value: "a".to_owned()
        }]
    );
    assert!(doc.take_mutations().is_empty());
}

#[test]
fn html_and_dump_describe_tree() {
    let doc = Document::new();
    let root = doc.create_element("div");
    let p = doc.create_element("p");
    let text = doc.create_text("a < b");
    doc.set_attribute(p, "id", "x").unwrap();
    doc.append_child(root, p).unwrap();
    doc.append_child(p, text).unwrap();

    assert_eq!(doc.to_html(root), "<div><p id=\"x\">a &lt; b</p></div>");
    assert_eq!(doc.inner_html(root), "<p id=\"x\">a &lt; b</p>");
    let dump = doc.dump_tree(root);
    assert!(dump.contains("<p id=\"x\">"));
    assert!(dump.contains("\"a < b\""));
}

#[test]
fn fragments_serialize_as_their_children() {
    let doc = Document::new();
    let root = doc.create_element("div");
    let fragment = doc.create_fragment();
    let a = doc.create_text("a");
    let b = doc.create_text("b");
    doc.append_child(fragment, a).unwrap();
    doc.append_child(fragment, b).unwrap();
    doc.append_child(root, fragment).unwrap();

    assert_eq!(doc.to_html(root), "<div>ab</div>");
    assert_eq!(doc.text_content(root), "ab");
}

#[test]
fn stale_ids_report_missing() {
    let doc = Document::new();
    let el = doc.create_element("div");
    doc.release(el).unwrap();
    assert_eq!(doc.set_text(el, "x"), Err(NodeError::Missing { id: el }));
    assert!(doc.is_empty());
}

#[test]
fn released_slots_are_reused_under_fresh_ids() {
    let doc = Document::new();
    let root = doc.create_element("div");
    let first = doc.create_element("p");
    doc.append_child(root, first).unwrap();
    doc.release(first).unwrap();

    let second = doc.create_element("span");
    assert_ne!(first, second);
    assert_eq!(doc.capacity(), 2);
    assert_eq!(doc.len(), 2);
    assert!(!doc.contains(first));
    assert_eq!(doc.tag_name(second).as_deref(), Some("span"));
    assert_eq!(
        doc.set_attribute(first, "id", "x"),
        Err(NodeError::Missing { id: first })
    );
}
