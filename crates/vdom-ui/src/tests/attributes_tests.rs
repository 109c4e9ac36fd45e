use super::*;
use vdom_core::{props, Document, EventHandler, Mutation, Style};
use vdom_events::EventRegistry;

struct Fixture {
    document: Document,
    registry: EventRegistry,
    element: NodeId,
}

impl Fixture {
    fn new(tag: &str) -> Self {
        let document = Document::new();
        let element = document.create_element(tag);
        Self {
            document,
            registry: EventRegistry::new(),
            element,
        }
    }

    fn sync(&self, new: Option<&Props>, old: Option<&Props>) {
        let ctx = RenderContext::new(&self.document, &self.registry);
        sync_attributes(ctx, self.element, new, old).unwrap();
    }
}

#[test]
fn event_names_strip_prefix_and_lowercase() {
    assert_eq!(event_name("onClick").as_deref(), Some("click"));
    assert_eq!(event_name("onMouseEnter").as_deref(), Some("mouseenter"));
    assert_eq!(event_name("on"), None);
    assert_eq!(event_name("title"), None);
}

#[test]
fn generic_attributes_are_stringified() {
    let f = Fixture::new("input");
    let props = props! {
        "id" => "name",
        "tabIndex" => 3,
        "aria-hidden" => true,
        "placeholder" => PropValue::Null,
    };
    f.sync(Some(&props), None);

    assert_eq!(f.document.attribute(f.element, "id").as_deref(), Some("name"));
    assert_eq!(f.document.attribute(f.element, "tabindex").as_deref(), Some("3"));
    assert_eq!(
        f.document.attribute(f.element, "aria-hidden").as_deref(),
        Some("true")
    );
    assert!(!f.document.has_attribute(f.element, "placeholder"));
}

#[test]
fn class_name_overwrites_and_cleans_up() {
    let f = Fixture::new("div");
    let first = props! { "className" => "a b" };
    f.sync(Some(&first), None);
    assert_eq!(f.document.class_name(f.element), "a b");

    let second = props! { "className" => "c" };
    f.sync(Some(&second), Some(&first));
    assert_eq!(f.document.class_name(f.element), "c");

    f.sync(Some(&Props::new()), Some(&second));
    assert!(!f.document.has_attribute(f.element, "class"));
}

#[test]
fn style_objects_merge_per_property() {
    let f = Fixture::new("div");
    let mut first = Style::new();
    first.insert("color".into(), "red".into());
    first.insert("fontSize".into(), "12px".into());
    let first = props! { "style" => first };
    f.sync(Some(&first), None);

    let mut second = Style::new();
    second.insert("color".into(), "blue".into());
    let second = props! { "style" => second };
    f.sync(Some(&second), Some(&first));

    assert_eq!(f.document.style_property(f.element, "color").as_deref(), Some("blue"));
    assert_eq!(
        f.document.style_property(f.element, "font-size").as_deref(),
        Some("12px")
    );

    f.sync(None, Some(&second));
    assert_eq!(f.document.attribute(f.element, "style"), None);
}

#[test]
fn boolean_props_round_trip() {
    let f = Fixture::new("input");
    let on = props! {
        "checked" => true,
        "disabled" => true,
        "selected" => true,
        "readOnly" => true,
    };
    f.sync(Some(&on), None);
    for property in BoolProperty::ALL {
        assert_eq!(f.document.property(f.element, property), Some(true));
    }
    assert_eq!(f.document.attribute(f.element, "disabled").as_deref(), Some(""));
    assert_eq!(f.document.attribute(f.element, "readonly").as_deref(), Some(""));
    assert!(!f.document.has_attribute(f.element, "checked"));
    assert!(!f.document.has_attribute(f.element, "selected"));

    let off = props! {
        "checked" => false,
        "disabled" => 0,
        "selected" => "",
        "readOnly" => PropValue::Null,
    };
    f.sync(Some(&off), Some(&on));
    for property in BoolProperty::ALL {
        assert_eq!(f.document.property(f.element, property), Some(false));
    }
    assert!(!f.document.has_attribute(f.element, "disabled"));
    assert!(!f.document.has_attribute(f.element, "readonly"));

    f.sync(Some(&on), Some(&off));
    f.sync(None, Some(&on));
    for property in BoolProperty::ALL {
        assert_eq!(f.document.property(f.element, property), Some(false));
    }
    assert!(f.document.attributes(f.element).is_empty());
}

#[test]
fn handlers_register_once_and_swap_by_identity() {
    let f = Fixture::new("button");
    let first = EventHandler::new(|_| {});
    let props_a = props! { "onClick" => first.clone() };
    f.sync(Some(&props_a), None);
    f.sync(Some(&props_a), Some(&props_a));
    assert_eq!(f.registry.handler_count(f.element, "click"), 1);

    let second = EventHandler::new(|_| {});
    let props_b = props! { "onClick" => second };
    f.sync(Some(&props_b), Some(&props_a));
    assert_eq!(f.registry.handler_count(f.element, "click"), 1);

    f.sync(Some(&Props::new()), Some(&props_b));
    assert!(!f.registry.contains(f.element));
}

#[test]
fn event_key_losing_its_handler_unregisters() {
    let f = Fixture::new("button");
    let with_handler = props! { "onClick" => EventHandler::new(|_| {}) };
    f.sync(Some(&with_handler), None);

    let without = props! { "onClick" => PropValue::Null };
    f.sync(Some(&without), Some(&with_handler));
    assert!(f.registry.is_empty());
    assert!(!f.document.has_attribute(f.element, "onclick"));
}

#[test]
fn children_key_is_ignored() {
    let f = Fixture::new("div");
    let props = props! { "children" => "text", "title" => "t" };
    f.sync(Some(&props), None);
    assert_eq!(
        f.document.attributes(f.element),
        vec![("title".to_owned(), "t".to_owned())]
    );
}

#[test]
fn unchanged_props_produce_no_mutations() {
    let f = Fixture::new("input");
    let props = props! {
        "id" => "a",
        "className" => "field",
        "disabled" => true,
        "onInput" => EventHandler::new(|_| {}),
    };
    f.sync(Some(&props), None);

    f.document.set_journal_enabled(true);
    f.sync(Some(&props), Some(&props));
    assert_eq!(f.document.take_mutations(), Vec::<Mutation>::new());
}

#[test]
fn removed_generic_attribute_is_dropped() {
    let f = Fixture::new("a");
    let old = props! { "href" => "/x", "title" => "x" };
    let new = props! { "href" => "/x" };
    f.sync(Some(&old), None);
    f.sync(Some(&new), Some(&old));
    assert!(!f.document.has_attribute(f.element, "title"));
    assert_eq!(f.document.attribute(f.element, "href").as_deref(), Some("/x"));
}
