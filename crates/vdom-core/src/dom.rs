//! In-memory live document.
//!
//! [`Document`] is a cheap, clonable handle to an arena of nodes. Freed slots
//! are recycled; a node id carries the slot index in its low half and the
//! slot's generation in its high half, so a stale id can only ever resolve to
//! [`NodeError::Missing`].
//!
//! No borrow of the arena is held while listeners run, which lets a listener
//! mutate the document (or re-render into it) during a dispatch.

use std::cell::RefCell;
use std::fmt::{self, Write as _};
use std::rc::Rc;

use indexmap::IndexMap;

use crate::event::Event;
use crate::vnode::VNode;
use crate::NodeId;

pub type ListenerId = u64;

/// Physical listener attached to a node.
pub type Listener = Rc<dyn Fn(&Document, &Event)>;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NodeError {
    Missing { id: NodeId },
    TypeMismatch { id: NodeId, expected: &'static str },
    NotAChild { parent: NodeId, child: NodeId },
    HierarchyRequest { parent: NodeId, child: NodeId },
}

impl fmt::Display for NodeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NodeError::Missing { id } => write!(f, "node {id} missing"),
            NodeError::TypeMismatch { id, expected } => {
                write!(f, "node {id} type mismatch; expected {expected}")
            }
            NodeError::NotAChild { parent, child } => {
                write!(f, "node {child} is not a child of node {parent}")
            }
            NodeError::HierarchyRequest { parent, child } => {
                write!(f, "node {child} cannot be inserted under node {parent}")
            }
        }
    }
}

impl std::error::Error for NodeError {}

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum NodeType {
    Text,
    Element,
    Fragment,
}

/// Element properties that live outside the attribute map.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum BoolProperty {
    Checked,
    Disabled,
    Selected,
    ReadOnly,
}

impl BoolProperty {
    pub const ALL: [BoolProperty; 4] = [
        BoolProperty::Checked,
        BoolProperty::Disabled,
        BoolProperty::Selected,
        BoolProperty::ReadOnly,
    ];

    /// Maps a prop key such as `readOnly` to its property.
    pub fn from_key(key: &str) -> Option<Self> {
        match key {
            "checked" => Some(BoolProperty::Checked),
            "disabled" => Some(BoolProperty::Disabled),
            "selected" => Some(BoolProperty::Selected),
            "readOnly" => Some(BoolProperty::ReadOnly),
            _ => None,
        }
    }

    pub fn key(self) -> &'static str {
        match self {
            BoolProperty::Checked => "checked",
            BoolProperty::Disabled => "disabled",
            BoolProperty::Selected => "selected",
            BoolProperty::ReadOnly => "readOnly",
        }
    }

    pub fn attribute_name(self) -> &'static str {
        match self {
            BoolProperty::Checked => "checked",
            BoolProperty::Disabled => "disabled",
            BoolProperty::Selected => "selected",
            BoolProperty::ReadOnly => "readonly",
        }
    }

    /// `disabled` and `readOnly` mirror into their attribute; `checked` and
    /// `selected` are property-only.
    pub fn reflects_attribute(self) -> bool {
        matches!(self, BoolProperty::Disabled | BoolProperty::ReadOnly)
    }

    fn index(self) -> usize {
        match self {
            BoolProperty::Checked => 0,
            BoolProperty::Disabled => 1,
            BoolProperty::Selected => 2,
            BoolProperty::ReadOnly => 3,
        }
    }
}

/// A recorded change to the live tree.
///
/// Only effective changes are journaled: writing an attribute with the value
/// it already has records nothing. Listener changes are not tree mutations
/// and are never journaled.
#[derive(Clone, Debug, PartialEq)]
pub enum Mutation {
    AppendChild {
        parent: NodeId,
        child: NodeId,
    },
    ReplaceChild {
        parent: NodeId,
        index: usize,
        old: NodeId,
        new: NodeId,
    },
    RemoveChild {
        parent: NodeId,
        index: usize,
        child: NodeId,
    },
    SetText {
        node: NodeId,
        text: String,
    },
    SetAttribute {
        node: NodeId,
        name: String,
        value: String,
    },
    RemoveAttribute {
        node: NodeId,
        name: String,
    },
    SetStyle {
        node: NodeId,
        property: String,
        value: String,
    },
    SetProperty {
        node: NodeId,
        property: BoolProperty,
        value: bool,
    },
}

#[derive(Default)]
struct ElementData {
    tag: String,
    attributes: IndexMap<String, String>,
    style: IndexMap<String, String>,
    properties: [bool; 4],
    rendered: Option<Rc<VNode>>,
}

enum NodeData {
    Text(String),
    Element(ElementData),
    Fragment,
}

struct ListenerEntry {
    id: ListenerId,
    event_type: String,
    callback: Listener,
}

struct NodeSlot {
    data: NodeData,
    parent: Option<NodeId>,
    children: Vec<NodeId>,
    listeners: Vec<ListenerEntry>,
}

impl NodeSlot {
    fn new(data: NodeData) -> Self {
        Self {
            data,
            parent: None,
            children: Vec::new(),
            listeners: Vec::new(),
        }
    }
}

const INDEX_BITS: u32 = usize::BITS / 2;
const INDEX_MASK: usize = (1 << INDEX_BITS) - 1;
const GENERATION_MASK: usize = usize::MAX >> INDEX_BITS;

fn split_id(id: NodeId) -> (usize, usize) {
    (id & INDEX_MASK, id >> INDEX_BITS)
}

fn join_id(index: usize, generation: usize) -> NodeId {
    (generation << INDEX_BITS) | index
}

#[derive(Default)]
struct ArenaEntry {
    generation: usize,
    slot: Option<Box<NodeSlot>>,
}

#[derive(Default)]
struct DocumentInner {
    nodes: Vec<ArenaEntry>,
    /// Indices of vacant entries, reused before the arena grows.
    free: Vec<usize>,
    next_listener: ListenerId,
    journal: Option<Vec<Mutation>>,
}

impl DocumentInner {
    fn insert(&mut self, data: NodeData) -> NodeId {
        let slot = Some(Box::new(NodeSlot::new(data)));
        if let Some(index) = self.free.pop() {
            let entry = &mut self.nodes[index];
            entry.slot = slot;
            return join_id(index, entry.generation);
        }
        let index = self.nodes.len();
        self.nodes.push(ArenaEntry {
            generation: 0,
            slot,
        });
        join_id(index, 0)
    }

    /// Frees the slot behind `id` and bumps its generation.
    fn free(&mut self, id: NodeId) {
        let (index, generation) = split_id(id);
        let Some(entry) = self.nodes.get_mut(index) else {
            return;
        };
        if entry.generation != generation || entry.slot.take().is_none() {
            return;
        }
        entry.generation = entry.generation.wrapping_add(1) & GENERATION_MASK;
        self.free.push(index);
    }

    fn slot(&self, id: NodeId) -> Result<&NodeSlot, NodeError> {
        let (index, generation) = split_id(id);
        self.nodes
            .get(index)
            .filter(|entry| entry.generation == generation)
            .and_then(|entry| entry.slot.as_deref())
            .ok_or(NodeError::Missing { id })
    }

    fn slot_mut(&mut self, id: NodeId) -> Result<&mut NodeSlot, NodeError> {
        let (index, generation) = split_id(id);
        self.nodes
            .get_mut(index)
            .filter(|entry| entry.generation == generation)
            .and_then(|entry| entry.slot.as_deref_mut())
            .ok_or(NodeError::Missing { id })
    }

    fn element(&self, id: NodeId) -> Result<&ElementData, NodeError> {
        match &self.slot(id)?.data {
            NodeData::Element(element) => Ok(element),
            _ => Err(NodeError::TypeMismatch {
                id,
                expected: "element",
            }),
        }
    }

    fn element_mut(&mut self, id: NodeId) -> Result<&mut ElementData, NodeError> {
        match &mut self.slot_mut(id)?.data {
            NodeData::Element(element) => Ok(element),
            _ => Err(NodeError::TypeMismatch {
                id,
                expected: "element",
            }),
        }
    }

    fn record(&mut self, mutation: Mutation) {
        if let Some(journal) = self.journal.as_mut() {
            journal.push(mutation);
        }
    }

    fn is_inclusive_ancestor(&self, ancestor: NodeId, node: NodeId) -> bool {
        let mut current = Some(node);
        while let Some(id) = current {
            if id == ancestor {
                return true;
            }
            current = self.slot(id).ok().and_then(|slot| slot.parent);
        }
        false
    }

    fn detach(&mut self, child: NodeId) -> Result<Option<(NodeId, usize)>, NodeError> {
        let Some(parent) = self.slot(child)?.parent else {
            return Ok(None);
        };
        let siblings = &mut self.slot_mut(parent)?.children;
        let index = siblings
            .iter()
            .position(|&id| id == child)
            .ok_or(NodeError::NotAChild { parent, child })?;
        siblings.remove(index);
        self.slot_mut(child)?.parent = None;
        Ok(Some((parent, index)))
    }

    fn ensure_container(&self, id: NodeId) -> Result<(), NodeError> {
        match self.slot(id)?.data {
            NodeData::Text(_) => Err(NodeError::TypeMismatch {
                id,
                expected: "element or fragment",
            }),
            _ => Ok(()),
        }
    }
}

/// Handle to an in-memory document. Clones share the same arena.
#[derive(Clone, Default)]
pub struct Document {
    inner: Rc<RefCell<DocumentInner>>,
}

impl fmt::Debug for Document {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Document")
            .field("live_nodes", &self.len())
            .finish()
    }
}

impl Document {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn ptr_eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.inner, &other.inner)
    }

    /// Number of live nodes, attached or not.
    pub fn len(&self) -> usize {
        let inner = self.inner.borrow();
        inner.nodes.len() - inner.free.len()
    }

    /// Number of slots the arena holds, vacant ones included.
    pub fn capacity(&self) -> usize {
        self.inner.borrow().nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn create_element(&self, tag: &str) -> NodeId {
        self.inner.borrow_mut().insert(NodeData::Element(ElementData {
            tag: tag.to_ascii_lowercase(),
            ..ElementData::default()
        }))
    }

    pub fn create_text(&self, text: &str) -> NodeId {
        self.inner
            .borrow_mut()
            .insert(NodeData::Text(text.to_owned()))
    }

    pub fn create_fragment(&self) -> NodeId {
        self.inner.borrow_mut().insert(NodeData::Fragment)
    }

    pub fn contains(&self, id: NodeId) -> bool {
        self.inner.borrow().slot(id).is_ok()
    }

    pub fn node_type(&self, id: NodeId) -> Option<NodeType> {
        let inner = self.inner.borrow();
        let slot = inner.slot(id).ok()?;
        Some(match slot.data {
            NodeData::Text(_) => NodeType::Text,
            NodeData::Element(_) => NodeType::Element,
            NodeData::Fragment => NodeType::Fragment,
        })
    }

    pub fn is_element(&self, id: NodeId) -> bool {
        self.node_type(id) == Some(NodeType::Element)
    }

    pub fn is_text(&self, id: NodeId) -> bool {
        self.node_type(id) == Some(NodeType::Text)
    }

    pub fn tag_name(&self, id: NodeId) -> Option<String> {
        self.inner
            .borrow()
            .element(id)
            .ok()
            .map(|element| element.tag.clone())
    }

    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.inner.borrow().slot(id).ok().and_then(|slot| slot.parent)
    }

    pub fn children(&self, id: NodeId) -> Vec<NodeId> {
        self.inner
            .borrow()
            .slot(id)
            .map(|slot| slot.children.clone())
            .unwrap_or_default()
    }

    pub fn child_at(&self, id: NodeId, index: usize) -> Option<NodeId> {
        self.inner
            .borrow()
            .slot(id)
            .ok()
            .and_then(|slot| slot.children.get(index).copied())
    }

    pub fn child_count(&self, id: NodeId) -> usize {
        self.inner
            .borrow()
            .slot(id)
            .map(|slot| slot.children.len())
            .unwrap_or(0)
    }

    /// Pre-order list of `root` and all of its descendants.
    pub fn descendants(&self, root: NodeId) -> Vec<NodeId> {
        let inner = self.inner.borrow();
        let mut out = Vec::new();
        let mut stack = vec![root];
        while let Some(id) = stack.pop() {
            let Ok(slot) = inner.slot(id) else {
                continue;
            };
            out.push(id);
            stack.extend(slot.children.iter().rev().copied());
        }
        out
    }

    /// Appends `child` to `parent`, detaching it from any previous parent first.
    pub fn append_child(&self, parent: NodeId, child: NodeId) -> Result<(), NodeError> {
        let mut inner = self.inner.borrow_mut();
        inner.ensure_container(parent)?;
        inner.slot(child)?;
        if inner.is_inclusive_ancestor(child, parent) {
            return Err(NodeError::HierarchyRequest { parent, child });
        }
        inner.detach(child)?;
        inner.slot_mut(parent)?.children.push(child);
        inner.slot_mut(child)?.parent = Some(parent);
        inner.record(Mutation::AppendChild { parent, child });
        Ok(())
    }

    /// Puts `new_child` in the position currently held by `old_child`.
    pub fn replace_child(
        &self,
        parent: NodeId,
        new_child: NodeId,
        old_child: NodeId,
    ) -> Result<(), NodeError> {
        let mut inner = self.inner.borrow_mut();
        inner.ensure_container(parent)?;
        inner.slot(new_child)?;
        if inner.is_inclusive_ancestor(new_child, parent) {
            return Err(NodeError::HierarchyRequest {
                parent,
                child: new_child,
            });
        }
        if inner.slot(old_child)?.parent != Some(parent) {
            return Err(NodeError::NotAChild {
                parent,
                child: old_child,
            });
        }
        inner.detach(new_child)?;
        let index = inner
            .slot(parent)?
            .children
            .iter()
            .position(|&id| id == old_child)
            .ok_or(NodeError::NotAChild {
                parent,
                child: old_child,
            })?;
        inner.slot_mut(parent)?.children[index] = new_child;
        inner.slot_mut(old_child)?.parent = None;
        inner.slot_mut(new_child)?.parent = Some(parent);
        inner.record(Mutation::ReplaceChild {
            parent,
            index,
            old: old_child,
            new: new_child,
        });
        Ok(())
    }

    pub fn remove_child(&self, parent: NodeId, child: NodeId) -> Result<(), NodeError> {
        let mut inner = self.inner.borrow_mut();
        if inner.slot(child)?.parent != Some(parent) {
            return Err(NodeError::NotAChild { parent, child });
        }
        if let Some((parent, index)) = inner.detach(child)? {
            inner.record(Mutation::RemoveChild {
                parent,
                index,
                child,
            });
        }
        Ok(())
    }

    /// Detaches `id` and frees it together with its whole subtree.
    ///
    /// Any persisted render state and listeners on the freed nodes are dropped.
    pub fn release(&self, id: NodeId) -> Result<(), NodeError> {
        let doomed = self.descendants(id);
        let mut inner = self.inner.borrow_mut();
        inner.slot(id)?;
        if let Some((parent, index)) = inner.detach(id)? {
            inner.record(Mutation::RemoveChild {
                parent,
                index,
                child: id,
            });
        }
        for node in doomed {
            inner.free(node);
        }
        Ok(())
    }

    pub fn text(&self, id: NodeId) -> Option<String> {
        match &self.inner.borrow().slot(id).ok()?.data {
            NodeData::Text(text) => Some(text.clone()),
            _ => None,
        }
    }

    pub fn set_text(&self, id: NodeId, value: &str) -> Result<(), NodeError> {
        let mut inner = self.inner.borrow_mut();
        let NodeData::Text(text) = &mut inner.slot_mut(id)?.data else {
            return Err(NodeError::TypeMismatch { id, expected: "text" });
        };
        if text == value {
            return Ok(());
        }
        value.clone_into(text);
        inner.record(Mutation::SetText {
            node: id,
            text: value.to_owned(),
        });
        Ok(())
    }

    /// Concatenated text of `id` and its descendants.
    pub fn text_content(&self, id: NodeId) -> String {
        let inner = self.inner.borrow();
        let mut out = String::new();
        for node in self.descendants(id) {
            if let Ok(NodeSlot {
                data: NodeData::Text(text),
                ..
            }) = inner.slot(node)
            {
                out.push_str(text);
            }
        }
        out
    }

    pub fn attribute(&self, id: NodeId, name: &str) -> Option<String> {
        let inner = self.inner.borrow();
        let element = inner.element(id).ok()?;
        let name = name.to_ascii_lowercase();
        if name == "style" {
            return (!element.style.is_empty()).then(|| serialize_style(&element.style));
        }
        element.attributes.get(&name).cloned()
    }

    pub fn has_attribute(&self, id: NodeId, name: &str) -> bool {
        self.attribute(id, name).is_some()
    }

    /// Attributes in insertion order; a non-empty inline style is reported as `style`.
    pub fn attributes(&self, id: NodeId) -> Vec<(String, String)> {
        let inner = self.inner.borrow();
        let Ok(element) = inner.element(id) else {
            return Vec::new();
        };
        let mut out: Vec<(String, String)> = element
            .attributes
            .iter()
            .map(|(name, value)| (name.clone(), value.clone()))
            .collect();
        if !element.style.is_empty() {
            out.push(("style".to_owned(), serialize_style(&element.style)));
        }
        out
    }

    /// Sets an attribute. Names are ASCII-lowercased; writing `style` replaces
    /// the inline style with the parsed declarations.
    pub fn set_attribute(&self, id: NodeId, name: &str, value: &str) -> Result<(), NodeError> {
        let name = name.to_ascii_lowercase();
        if name == "style" {
            return self.replace_style(id, value);
        }
        let mut inner = self.inner.borrow_mut();
        let element = inner.element_mut(id)?;
        if element.attributes.get(&name).map(String::as_str) == Some(value) {
            return Ok(());
        }
        element.attributes.insert(name.clone(), value.to_owned());
        inner.record(Mutation::SetAttribute {
            node: id,
            name,
            value: value.to_owned(),
        });
        Ok(())
    }

    pub fn remove_attribute(&self, id: NodeId, name: &str) -> Result<(), NodeError> {
        let name = name.to_ascii_lowercase();
        let mut inner = self.inner.borrow_mut();
        let element = inner.element_mut(id)?;
        let removed = if name == "style" {
            let had_style = !element.style.is_empty();
            element.style.clear();
            had_style
        } else {
            element.attributes.shift_remove(&name).is_some()
        };
        if removed {
            inner.record(Mutation::RemoveAttribute { node: id, name });
        }
        Ok(())
    }

    pub fn class_name(&self, id: NodeId) -> String {
        self.attribute(id, "class").unwrap_or_default()
    }

    pub fn set_class_name(&self, id: NodeId, class_name: &str) -> Result<(), NodeError> {
        self.set_attribute(id, "class", class_name)
    }

    pub fn style_property(&self, id: NodeId, property: &str) -> Option<String> {
        self.inner
            .borrow()
            .element(id)
            .ok()?
            .style
            .get(&css_property_name(property))
            .cloned()
    }

    /// Sets one inline style declaration. `camelCase` names are converted to
    /// their `kebab-case` form; an empty value removes the declaration.
    pub fn set_style_property(
        &self,
        id: NodeId,
        property: &str,
        value: &str,
    ) -> Result<(), NodeError> {
        let property = css_property_name(property);
        let mut inner = self.inner.borrow_mut();
        let element = inner.element_mut(id)?;
        if value.is_empty() {
            if element.style.shift_remove(&property).is_some() {
                inner.record(Mutation::SetStyle {
                    node: id,
                    property,
                    value: String::new(),
                });
            }
            return Ok(());
        }
        if element.style.get(&property).map(String::as_str) == Some(value) {
            return Ok(());
        }
        element.style.insert(property.clone(), value.to_owned());
        inner.record(Mutation::SetStyle {
            node: id,
            property,
            value: value.to_owned(),
        });
        Ok(())
    }

    fn replace_style(&self, id: NodeId, text: &str) -> Result<(), NodeError> {
        let parsed = parse_style(text);
        let mut inner = self.inner.borrow_mut();
        let element = inner.element_mut(id)?;
        if element.style == parsed {
            return Ok(());
        }
        let value = serialize_style(&parsed);
        element.style = parsed;
        inner.record(Mutation::SetAttribute {
            node: id,
            name: "style".to_owned(),
            value,
        });
        Ok(())
    }

    pub fn property(&self, id: NodeId, property: BoolProperty) -> Option<bool> {
        self.inner
            .borrow()
            .element(id)
            .ok()
            .map(|element| element.properties[property.index()])
    }

    pub fn set_property(
        &self,
        id: NodeId,
        property: BoolProperty,
        value: bool,
    ) -> Result<(), NodeError> {
        let mut inner = self.inner.borrow_mut();
        let slot = &mut inner.element_mut(id)?.properties[property.index()];
        if *slot == value {
            return Ok(());
        }
        *slot = value;
        inner.record(Mutation::SetProperty {
            node: id,
            property,
            value,
        });
        Ok(())
    }

    pub fn rendered_tree(&self, container: NodeId) -> Option<Rc<VNode>> {
        self.inner
            .borrow()
            .element(container)
            .ok()
            .and_then(|element| element.rendered.clone())
    }

    pub fn set_rendered_tree(
        &self,
        container: NodeId,
        tree: Option<Rc<VNode>>,
    ) -> Result<(), NodeError> {
        self.inner.borrow_mut().element_mut(container)?.rendered = tree;
        Ok(())
    }

    pub fn add_event_listener(
        &self,
        id: NodeId,
        event_type: &str,
        listener: Listener,
    ) -> Result<ListenerId, NodeError> {
        let mut inner = self.inner.borrow_mut();
        inner.slot(id)?;
        inner.next_listener += 1;
        let listener_id = inner.next_listener;
        inner.slot_mut(id)?.listeners.push(ListenerEntry {
            id: listener_id,
            event_type: event_type.to_owned(),
            callback: listener,
        });
        Ok(listener_id)
    }

    /// Returns `false` when no listener with `listener` id was attached to `id`.
    pub fn remove_event_listener(&self, id: NodeId, listener: ListenerId) -> Result<bool, NodeError> {
        let mut inner = self.inner.borrow_mut();
        let listeners = &mut inner.slot_mut(id)?.listeners;
        let before = listeners.len();
        listeners.retain(|entry| entry.id != listener);
        Ok(listeners.len() != before)
    }

    pub fn listener_count(&self, id: NodeId) -> usize {
        self.inner
            .borrow()
            .slot(id)
            .map(|slot| slot.listeners.len())
            .unwrap_or(0)
    }

    /// Event types of the listeners attached to `id`, in attachment order.
    pub fn listener_types(&self, id: NodeId) -> Vec<String> {
        self.inner
            .borrow()
            .slot(id)
            .map(|slot| {
                slot.listeners
                    .iter()
                    .map(|entry| entry.event_type.clone())
                    .collect()
            })
            .unwrap_or_default()
    }

    pub fn has_event_listener(&self, id: NodeId, listener: ListenerId) -> bool {
        self.inner
            .borrow()
            .slot(id)
            .map(|slot| slot.listeners.iter().any(|entry| entry.id == listener))
            .unwrap_or(false)
    }

    /// Creates an event of `event_type` at `target`, dispatches it and returns it.
    pub fn dispatch_event(&self, target: NodeId, event_type: &str) -> Result<Event, NodeError> {
        let event = Event::new(event_type, target);
        self.dispatch(&event)?;
        Ok(event)
    }

    /// Delivers `event` to its target and then to every ancestor.
    ///
    /// The propagation path and each node's listener list are snapshotted
    /// before any listener runs. A listener removed mid-dispatch is skipped.
    pub fn dispatch(&self, event: &Event) -> Result<(), NodeError> {
        let path = {
            let inner = self.inner.borrow();
            inner.slot(event.target())?;
            let mut path = Vec::new();
            let mut current = Some(event.target());
            while let Some(id) = current {
                path.push(id);
                current = inner.slot(id).ok().and_then(|slot| slot.parent);
            }
            path
        };

        for node in path {
            let listeners: Vec<(ListenerId, Listener)> = {
                let inner = self.inner.borrow();
                let Ok(slot) = inner.slot(node) else {
                    continue;
                };
                slot.listeners
                    .iter()
                    .filter(|entry| entry.event_type == event.event_type())
                    .map(|entry| (entry.id, entry.callback.clone()))
                    .collect()
            };
            if !listeners.is_empty() {
                event.set_current_target(Some(node));
                for (id, listener) in listeners {
                    if self.has_event_listener(node, id) {
                        listener(self, event);
                    }
                }
            }
            if event.is_propagation_stopped() {
                break;
            }
        }
        event.set_current_target(None);
        Ok(())
    }

    /// Starts or stops journaling. Enabling clears any previous journal.
    pub fn set_journal_enabled(&self, enabled: bool) {
        self.inner.borrow_mut().journal = enabled.then(Vec::new);
    }

    pub fn is_journal_enabled(&self) -> bool {
        self.inner.borrow().journal.is_some()
    }

    /// Drains the mutations recorded since the last call.
    pub fn take_mutations(&self) -> Vec<Mutation> {
        self.inner
            .borrow_mut()
            .journal
            .as_mut()
            .map(std::mem::take)
            .unwrap_or_default()
    }

    pub fn dump_tree(&self, root: NodeId) -> String {
        let mut output = String::new();
        self.dump_node(&mut output, root, 0);
        output
    }

    fn dump_node(&self, output: &mut String, id: NodeId, depth: usize) {
        let indent = "  ".repeat(depth);
        let line = {
            let inner = self.inner.borrow();
            match inner.slot(id) {
                Ok(slot) => match &slot.data {
                    NodeData::Text(text) => format!("{indent}[{id}] {text:?}"),
                    NodeData::Fragment => format!("{indent}[{id}] #fragment"),
                    NodeData::Element(element) => {
                        let mut line = format!("{indent}[{id}] <{}", element.tag);
                        write_attributes(&mut line, element);
                        line.push('>');
                        if !slot.listeners.is_empty() {
                            let _ = write!(line, " ({} listeners)", slot.listeners.len());
                        }
                        line
                    }
                },
                Err(_) => format!("{indent}[{id}] (missing)"),
            }
        };
        output.push_str(&line);
        output.push('\n');
        for child in self.children(id) {
            self.dump_node(output, child, depth + 1);
        }
    }

    /// Serializes `id` and its subtree as HTML. Fragments contribute only their children.
    pub fn to_html(&self, id: NodeId) -> String {
        let mut output = String::new();
        self.write_html(&mut output, id);
        output
    }

    /// Serializes the children of `id` as HTML.
    pub fn inner_html(&self, id: NodeId) -> String {
        let mut output = String::new();
        for child in self.children(id) {
            self.write_html(&mut output, child);
        }
        output
    }

    fn write_html(&self, output: &mut String, id: NodeId) {
        let close = {
            let inner = self.inner.borrow();
            let Ok(slot) = inner.slot(id) else {
                return;
            };
            match &slot.data {
                NodeData::Text(text) => {
                    output.push_str(&escape_html(text));
                    return;
                }
                NodeData::Fragment => None,
                NodeData::Element(element) => {
                    output.push('<');
                    output.push_str(&element.tag);
                    write_attributes(output, element);
                    output.push('>');
                    (!is_void_element(&element.tag)).then(|| element.tag.clone())
                }
            }
        };
        for child in self.children(id) {
            self.write_html(output, child);
        }
        if let Some(tag) = close {
            let _ = write!(output, "</{tag}>");
        }
    }
}

fn write_attributes(output: &mut String, element: &ElementData) {
    for (name, value) in &element.attributes {
        if value.is_empty() {
            let _ = write!(output, " {name}");
        } else {
            let _ = write!(output, " {name}=\"{}\"", escape_html(value));
        }
    }
    if !element.style.is_empty() {
        let _ = write!(
            output,
            " style=\"{}\"",
            escape_html(&serialize_style(&element.style))
        );
    }
}

fn is_void_element(tag: &str) -> bool {
    matches!(
        tag,
        "area" | "br" | "col" | "embed" | "hr" | "img" | "input" | "link" | "meta" | "source"
            | "track" | "wbr"
    )
}

fn escape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for ch in text.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            other => out.push(other),
        }
    }
    out
}

/// `backgroundColor` -> `background-color`; names already containing a dash are kept.
fn css_property_name(property: &str) -> String {
    if property.contains('-') {
        return property.to_owned();
    }
    let mut out = String::with_capacity(property.len() + 4);
    for ch in property.chars() {
        if ch.is_ascii_uppercase() {
            out.push('-');
            out.push(ch.to_ascii_lowercase());
        } else {
            out.push(ch);
        }
    }
    out
}

fn parse_style(text: &str) -> IndexMap<String, String> {
    text.split(';')
        .filter_map(|declaration| {
            let (name, value) = declaration.split_once(':')?;
            let (name, value) = (name.trim(), value.trim());
            (!name.is_empty() && !value.is_empty())
                .then(|| (css_property_name(name), value.to_owned()))
        })
        .collect()
}

fn serialize_style(style: &IndexMap<String, String>) -> String {
    style
        .iter()
        .map(|(name, value)| format!("{name}: {value};"))
        .collect::<Vec<_>>()
        .join(" ")
}

#[cfg(test)]
#[path = "tests/dom_tests.rs"]
mod tests;
