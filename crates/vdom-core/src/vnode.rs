//! Virtual node model.
//!
//! A [`VNode`] is an immutable description of desired structure. Trees built
//! with the helpers here may still contain [`VNode::Empty`] and
//! [`VNode::Component`] nodes; the renderer normalizes them away before any
//! live node is touched.

use std::fmt;
use std::rc::Rc;

use indexmap::IndexMap;

use crate::event::EventHandler;

/// Ordered property bag attached to an element.
pub type Props = IndexMap<String, PropValue>;

/// Inline style declarations, property name to value.
pub type Style = IndexMap<String, String>;

#[derive(Clone, Debug, PartialEq)]
pub enum PropValue {
    Null,
    Bool(bool),
    Number(f64),
    Str(String),
    Style(Style),
    Handler(EventHandler),
}

impl PropValue {
    /// Truthiness used by boolean properties such as `disabled`.
    pub fn is_truthy(&self) -> bool {
        match self {
            PropValue::Null => false,
            PropValue::Bool(value) => *value,
            PropValue::Number(value) => *value != 0.0 && !value.is_nan(),
            PropValue::Str(value) => !value.is_empty(),
            PropValue::Style(_) | PropValue::Handler(_) => true,
        }
    }

    /// String form written into a DOM attribute, if the value has one.
    pub fn to_attribute_value(&self) -> Option<String> {
        match self {
            PropValue::Bool(value) => Some(value.to_string()),
            PropValue::Number(value) => Some(format_number(*value)),
            PropValue::Str(value) => Some(value.clone()),
            PropValue::Null | PropValue::Style(_) | PropValue::Handler(_) => None,
        }
    }

    pub fn as_handler(&self) -> Option<&EventHandler> {
        match self {
            PropValue::Handler(handler) => Some(handler),
            _ => None,
        }
    }
}

impl From<&str> for PropValue {
    fn from(value: &str) -> Self {
        PropValue::Str(value.to_owned())
    }
}

impl From<String> for PropValue {
    fn from(value: String) -> Self {
        PropValue::Str(value)
    }
}

impl From<bool> for PropValue {
    fn from(value: bool) -> Self {
        PropValue::Bool(value)
    }
}

impl From<f64> for PropValue {
    fn from(value: f64) -> Self {
        PropValue::Number(value)
    }
}

impl From<i32> for PropValue {
    fn from(value: i32) -> Self {
        PropValue::Number(f64::from(value))
    }
}

impl From<Style> for PropValue {
    fn from(value: Style) -> Self {
        PropValue::Style(value)
    }
}

impl From<EventHandler> for PropValue {
    fn from(value: EventHandler) -> Self {
        PropValue::Handler(value)
    }
}

impl<T: Into<PropValue>> From<Option<T>> for PropValue {
    fn from(value: Option<T>) -> Self {
        value.map_or(PropValue::Null, Into::into)
    }
}

/// Formats a number the way a browser stringifies it for attributes and text.
pub fn format_number(value: f64) -> String {
    if value.is_nan() {
        "NaN".to_owned()
    } else if value.is_infinite() {
        let sign = if value > 0.0 { "" } else { "-" };
        format!("{sign}Infinity")
    } else if value.fract() == 0.0 && value.abs() < 1e15 {
        format!("{}", value as i64)
    } else {
        format!("{value}")
    }
}

type RenderFn = dyn Fn(&Props, &[VNode]) -> VNode;

/// A function component. Equality is identity of the render function.
#[derive(Clone)]
pub struct Component {
    name: &'static str,
    render: Rc<RenderFn>,
}

impl Component {
    pub fn new(name: &'static str, render: impl Fn(&Props, &[VNode]) -> VNode + 'static) -> Self {
        Self {
            name,
            render: Rc::new(render),
        }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn render(&self, props: &Props, children: &[VNode]) -> VNode {
        (self.render)(props, children)
    }
}

impl PartialEq for Component {
    fn eq(&self, other: &Self) -> bool {
        std::ptr::eq(
            Rc::as_ptr(&self.render) as *const (),
            Rc::as_ptr(&other.render) as *const (),
        )
    }
}

impl fmt::Debug for Component {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Component").field("name", &self.name).finish()
    }
}

#[derive(Clone, Debug, PartialEq)]
pub enum VNode {
    Empty,
    Text(String),
    Element(ElementNode),
    Fragment(Vec<VNode>),
    Component(ComponentNode),
}

impl VNode {
    pub fn text(value: impl Into<String>) -> Self {
        VNode::Text(value.into())
    }

    pub fn element(tag: impl Into<String>) -> ElementNode {
        ElementNode::new(tag)
    }

    pub fn fragment(children: impl IntoIterator<Item = VNode>) -> Self {
        let mut items = Vec::new();
        for child in children {
            push_child(&mut items, child);
        }
        VNode::Fragment(items)
    }

    pub fn component(component: Component, props: Props, children: Vec<VNode>) -> Self {
        let mut flattened = Vec::with_capacity(children.len());
        for child in children {
            push_child(&mut flattened, child);
        }
        VNode::Component(ComponentNode {
            component,
            props,
            children: flattened,
        })
    }

    pub fn is_text(&self) -> bool {
        matches!(self, VNode::Text(_) | VNode::Empty)
    }

    pub fn as_element(&self) -> Option<&ElementNode> {
        match self {
            VNode::Element(element) => Some(element),
            _ => None,
        }
    }
}

/// Appends `child`, dropping empty nodes and splicing fragments in place.
fn push_child(children: &mut Vec<VNode>, child: VNode) {
    match child {
        VNode::Empty => {}
        VNode::Fragment(items) => {
            for item in items {
                push_child(children, item);
            }
        }
        other => children.push(other),
    }
}

/// Builds an element node from a tag, props and children.
pub fn h(tag: impl Into<String>, props: Props, children: impl IntoIterator<Item = VNode>) -> VNode {
    let mut element = ElementNode::new(tag);
    element.props = props;
    element.children(children).into()
}

#[derive(Clone, Debug, PartialEq)]
pub struct ElementNode {
    pub tag: String,
    pub props: Props,
    pub children: Vec<VNode>,
}

impl ElementNode {
    pub fn new(tag: impl Into<String>) -> Self {
        Self {
            tag: tag.into(),
            props: Props::new(),
            children: Vec::new(),
        }
    }

    pub fn prop(mut self, key: impl Into<String>, value: impl Into<PropValue>) -> Self {
        self.props.insert(key.into(), value.into());
        self
    }

    /// Binds `handler` under the `on<Event>` key, e.g. `on("click", ..)` stores `onClick`.
    pub fn on(self, event: &str, handler: EventHandler) -> Self {
        let mut chars = event.chars();
        let key = match chars.next() {
            Some(first) => format!("on{}{}", first.to_ascii_uppercase(), chars.as_str()),
            None => "on".to_owned(),
        };
        self.prop(key, handler)
    }

    pub fn class(self, class_name: impl Into<String>) -> Self {
        self.prop("className", class_name.into())
    }

    pub fn style<K, V>(self, declarations: impl IntoIterator<Item = (K, V)>) -> Self
    where
        K: Into<String>,
        V: Into<String>,
    {
        let style: Style = declarations
            .into_iter()
            .map(|(key, value)| (key.into(), value.into()))
            .collect();
        self.prop("style", style)
    }

    pub fn child(mut self, child: impl Into<VNode>) -> Self {
        push_child(&mut self.children, child.into());
        self
    }

    pub fn children(mut self, children: impl IntoIterator<Item = VNode>) -> Self {
        for child in children {
            push_child(&mut self.children, child);
        }
        self
    }
}

/// An unresolved function component awaiting normalization.
#[derive(Clone, Debug, PartialEq)]
pub struct ComponentNode {
    pub component: Component,
    pub props: Props,
    pub children: Vec<VNode>,
}

impl ComponentNode {
    pub fn render(&self) -> VNode {
        self.component.render(&self.props, &self.children)
    }
}

impl From<ElementNode> for VNode {
    fn from(value: ElementNode) -> Self {
        VNode::Element(value)
    }
}

impl From<ComponentNode> for VNode {
    fn from(value: ComponentNode) -> Self {
        VNode::Component(value)
    }
}

impl From<&str> for VNode {
    fn from(value: &str) -> Self {
        VNode::Text(value.to_owned())
    }
}

impl From<String> for VNode {
    fn from(value: String) -> Self {
        VNode::Text(value)
    }
}

impl From<&String> for VNode {
    fn from(value: &String) -> Self {
        VNode::Text(value.clone())
    }
}

/// Booleans render nothing, which keeps `cond && node` style expressions usable.
impl From<bool> for VNode {
    fn from(_: bool) -> Self {
        VNode::Empty
    }
}

impl From<()> for VNode {
    fn from(_: ()) -> Self {
        VNode::Empty
    }
}

impl From<f64> for VNode {
    fn from(value: f64) -> Self {
        VNode::Text(format_number(value))
    }
}

macro_rules! impl_vnode_from_integer {
    ($($ty:ty),*) => {
        $(
            impl From<$ty> for VNode {
                fn from(value: $ty) -> Self {
                    VNode::Text(value.to_string())
                }
            }
        )*
    };
}

impl_vnode_from_integer!(i32, i64, u32, u64, usize);

impl<T: Into<VNode>> From<Option<T>> for VNode {
    fn from(value: Option<T>) -> Self {
        value.map_or(VNode::Empty, Into::into)
    }
}

impl From<Vec<VNode>> for VNode {
    fn from(value: Vec<VNode>) -> Self {
        VNode::fragment(value)
    }
}
