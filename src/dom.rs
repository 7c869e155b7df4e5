use std::collections::BTreeMap;

/// Handle to a node inside a [`Dom`] arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(u32);

impl NodeId {
    fn index(self) -> usize {
        self.0 as usize
    }
}

/// The two kinds of nodes that survive preprocessing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum NodeType {
    Element,
    Text,
}

impl NodeType {
    /// The DOM-compatible integer code (`1` for elements, `3` for text).
    pub fn dom_code(self) -> u8 {
        match self {
            Self::Element => 1,
            Self::Text => 3,
        }
    }
}

/// Payload of a node: an element with a tag name and an ordered attribute
/// map, or a text node with its contents.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NodeData {
    Element {
        name: String,
        attrs: BTreeMap<String, String>,
    },
    Text(String),
}

impl NodeData {
    pub fn node_type(&self) -> NodeType {
        match self {
            Self::Element { .. } => NodeType::Element,
            Self::Text(_) => NodeType::Text,
        }
    }
}

#[derive(Debug, Clone)]
struct NodeEntry {
    data: NodeData,
    parent: Option<NodeId>,
    children: Vec<NodeId>,
}

/// A document tree.
///
/// All nodes live in a single arena and are addressed by [`NodeId`], so
/// structural edits are index manipulations and never invalidate handles.
/// Detached nodes stay in the arena with no parent; traversal always starts
/// from the root, so they are simply unreachable.
#[derive(Debug, Clone)]
pub struct Dom {
    nodes: Vec<NodeEntry>,
    root: NodeId,
}

impl Dom {
    /// Creates a document whose root is an empty element with the given tag.
    pub fn with_root(name: &str) -> Self {
        let mut dom = Self {
            nodes: Vec::new(),
            root: NodeId(0),
        };
        let root = dom.create_element(name, BTreeMap::new());
        dom.root = root;
        dom
    }

    /// The document element.
    pub fn root(&self) -> NodeId {
        self.root
    }

    fn entry(&self, node: NodeId) -> &NodeEntry {
        &self.nodes[node.index()]
    }

    fn entry_mut(&mut self, node: NodeId) -> &mut NodeEntry {
        &mut self.nodes[node.index()]
    }

    fn create_node(&mut self, data: NodeData) -> NodeId {
        let id = NodeId(u32::try_from(self.nodes.len()).expect("arena overflow"));
        self.nodes.push(NodeEntry {
            data,
            parent: None,
            children: Vec::new(),
        });
        id
    }

    /// Allocates a detached element node.
    pub fn create_element(&mut self, name: &str, attrs: BTreeMap<String, String>) -> NodeId {
        self.create_node(NodeData::Element {
            name: name.to_owned(),
            attrs,
        })
    }

    /// Allocates a detached text node.
    pub fn create_text(&mut self, value: &str) -> NodeId {
        self.create_node(NodeData::Text(value.to_owned()))
    }

    /// Allocates a detached node with the given payload.
    pub fn create(&mut self, data: NodeData) -> NodeId {
        self.create_node(data)
    }

    pub fn data(&self, node: NodeId) -> &NodeData {
        &self.entry(node).data
    }

    pub fn node_type(&self, node: NodeId) -> NodeType {
        self.data(node).node_type()
    }

    pub fn is_text(&self, node: NodeId) -> bool {
        self.node_type(node) == NodeType::Text
    }

    pub fn is_element(&self, node: NodeId) -> bool {
        self.node_type(node) == NodeType::Element
    }

    /// The tag name, for element nodes.
    pub fn name(&self, node: NodeId) -> Option<&str> {
        match self.data(node) {
            NodeData::Element { name, .. } => Some(name),
            NodeData::Text(_) => None,
        }
    }

    /// Whether the node is an element with the given tag name.
    pub fn is_element_named(&self, node: NodeId, name: &str) -> bool {
        self.name(node) == Some(name)
    }

    /// The contents, for text nodes.
    pub fn text_value(&self, node: NodeId) -> Option<&str> {
        match self.data(node) {
            NodeData::Text(value) => Some(value),
            NodeData::Element { .. } => None,
        }
    }

    /// The attribute map, for element nodes.
    pub fn attributes(&self, node: NodeId) -> Option<&BTreeMap<String, String>> {
        match self.data(node) {
            NodeData::Element { attrs, .. } => Some(attrs),
            NodeData::Text(_) => None,
        }
    }

    /// Sets an attribute on an element node.
    pub fn set_attribute(&mut self, node: NodeId, name: &str, value: &str) {
        if let NodeData::Element { attrs, .. } = &mut self.entry_mut(node).data {
            attrs.insert(name.to_owned(), value.to_owned());
        }
    }

    /// Replaces the contents of a text node.
    pub fn set_text_value(&mut self, node: NodeId, value: &str) {
        if let NodeData::Text(text) = &mut self.entry_mut(node).data {
            value.clone_into(text);
        }
    }

    /// Changes the tag name of an element node.
    pub fn rename_element(&mut self, node: NodeId, new_name: &str) {
        if let NodeData::Element { name, .. } = &mut self.entry_mut(node).data {
            new_name.clone_into(name);
        }
    }

    pub fn parent(&self, node: NodeId) -> Option<NodeId> {
        self.entry(node).parent
    }

    pub fn children(&self, node: NodeId) -> &[NodeId] {
        &self.entry(node).children
    }

    /// The child at the given index, or `None` if it does not exist.
    pub fn child(&self, node: NodeId, index: usize) -> Option<NodeId> {
        self.entry(node).children.get(index).copied()
    }

    /// The position of a node in its parent's child list.
    pub fn index_in_parent(&self, node: NodeId) -> Option<usize> {
        let parent = self.parent(node)?;
        self.children(parent).iter().position(|&c| c == node)
    }

    pub fn prev_sibling(&self, node: NodeId) -> Option<NodeId> {
        let index = self.index_in_parent(node)?;
        if index == 0 {
            None
        } else {
            self.child(self.parent(node)?, index - 1)
        }
    }

    pub fn next_sibling(&self, node: NodeId) -> Option<NodeId> {
        let index = self.index_in_parent(node)?;
        self.child(self.parent(node)?, index + 1)
    }

    /// Iterate over the node and its ancestors, up to the root.
    pub fn ancestors(&self, node: NodeId) -> Ancestors<'_> {
        Ancestors {
            dom: self,
            cursor: Some(node),
        }
    }

    /// All nodes of the subtree in document order, starting with the node
    /// itself. Returns a snapshot so the tree can be edited while iterating.
    pub fn descendants(&self, node: NodeId) -> Vec<NodeId> {
        let mut result = Vec::new();
        let mut worklist = vec![node];
        while let Some(current) = worklist.pop() {
            result.push(current);
            worklist.extend(self.children(current).iter().rev());
        }
        result
    }

    /// All elements with the given tag name, in document order.
    pub fn elements_by_tag(&self, tag: &str) -> Vec<NodeId> {
        self.descendants(self.root)
            .into_iter()
            .filter(|&n| self.is_element_named(n, tag))
            .collect()
    }

    /// The number of nodes reachable from the root.
    pub fn size(&self) -> usize {
        self.descendants(self.root).len()
    }

    /// Resolves a location (a path of child indices starting at the root)
    /// against the current state of the tree.
    pub fn resolve_location(&self, location: &[usize]) -> Option<NodeId> {
        let mut node = self.root;
        for &index in location {
            node = self.child(node, index)?;
        }
        Some(node)
    }

    /// Removes a node from its parent. The node keeps its own subtree.
    pub fn detach(&mut self, node: NodeId) {
        if let Some(parent) = self.entry(node).parent {
            let index = self
                .index_in_parent(node)
                .expect("node not found under its own parent");
            self.entry_mut(parent).children.remove(index);
            self.entry_mut(node).parent = None;
        }
    }

    /// Attaches a detached node under `parent` at the given child index.
    pub fn insert_child(&mut self, parent: NodeId, index: usize, node: NodeId) {
        debug_assert!(self.entry(node).parent.is_none(), "node already attached");
        let children = &mut self.entry_mut(parent).children;
        let index = index.min(children.len());
        children.insert(index, node);
        self.entry_mut(node).parent = Some(parent);
    }

    /// Attaches a detached node as the last child of `parent`.
    pub fn append_child(&mut self, parent: NodeId, node: NodeId) {
        debug_assert!(self.entry(node).parent.is_none(), "node already attached");
        self.entry_mut(parent).children.push(node);
        self.entry_mut(node).parent = Some(parent);
    }

    /// Inserts `node` before `next_sibling` under `parent`, or appends it
    /// when no next sibling is given.
    pub fn insert_before(&mut self, parent: NodeId, node: NodeId, next_sibling: Option<NodeId>) {
        match next_sibling {
            Some(next) => {
                let index = self
                    .children(parent)
                    .iter()
                    .position(|&c| c == next)
                    .expect("next sibling is not a child of the given parent");
                self.insert_child(parent, index, node);
            }
            None => self.append_child(parent, node),
        }
    }

    /// Wraps a fresh element with the given tag around a node, taking its
    /// place in the parent's child list.
    pub fn wrap(&mut self, node: NodeId, tag: &str) -> NodeId {
        let wrapper = self.create_element(tag, BTreeMap::new());
        if let Some(parent) = self.parent(node) {
            let index = self
                .index_in_parent(node)
                .expect("node not found under its own parent");
            self.entry_mut(parent).children[index] = wrapper;
            self.entry_mut(wrapper).parent = Some(parent);
        }
        self.entry_mut(node).parent = Some(wrapper);
        self.entry_mut(wrapper).children.push(node);
        wrapper
    }

    /// Wraps a fresh element with the given tag around the contents of a
    /// node.
    pub fn wrap_inner(&mut self, node: NodeId, tag: &str) {
        let children = self.entry(node).children.clone();
        let wrapper = self.create_element(tag, BTreeMap::new());
        for &child in &children {
            self.entry_mut(child).parent = Some(wrapper);
        }
        self.entry_mut(wrapper).children = children;
        self.entry_mut(node).children.clear();
        self.append_child(node, wrapper);
    }

    /// Removes a node, replacing it with its children.
    pub fn unwrap(&mut self, node: NodeId) {
        let parent = self.parent(node).expect("cannot unwrap the document root");
        let index = self
            .index_in_parent(node)
            .expect("node not found under its own parent");
        let children = std::mem::take(&mut self.entry_mut(node).children);
        for &child in &children {
            self.entry_mut(child).parent = Some(parent);
        }
        self.entry_mut(node).parent = None;
        self.entry_mut(parent).children.splice(index..=index, children);
    }

    /// All text contained in the subtree, in document order, space-joined.
    pub fn tree_text(&self, node: NodeId) -> String {
        let texts: Vec<&str> = self
            .descendants(node)
            .into_iter()
            .filter_map(|n| self.text_value(n))
            .collect();
        texts.join(" ")
    }

    /// Merges adjacent text siblings and drops empty text nodes, in the
    /// whole document.
    pub fn normalize(&mut self) {
        let elements: Vec<NodeId> = self
            .descendants(self.root)
            .into_iter()
            .filter(|&n| self.is_element(n))
            .collect();
        for element in elements {
            let children = self.entry(element).children.clone();
            let mut kept: Vec<NodeId> = Vec::with_capacity(children.len());
            for child in children {
                let NodeData::Text(value) = self.data(child) else {
                    kept.push(child);
                    continue;
                };
                if value.is_empty() {
                    self.entry_mut(child).parent = None;
                    continue;
                }
                if let Some(&previous) = kept.last()
                    && self.is_text(previous)
                {
                    let value = value.clone();
                    self.entry_mut(child).parent = None;
                    if let NodeData::Text(target) = &mut self.entry_mut(previous).data {
                        target.push_str(&value);
                    }
                    continue;
                }
                kept.push(child);
            }
            self.entry_mut(element).children = kept;
        }
    }
}

/// Iterator over a node and its ancestors. An explicit cursor loop, so it
/// terminates at the document root even for deep trees.
pub struct Ancestors<'a> {
    dom: &'a Dom,
    cursor: Option<NodeId>,
}

impl Iterator for Ancestors<'_> {
    type Item = NodeId;

    fn next(&mut self) -> Option<NodeId> {
        let current = self.cursor?;
        self.cursor = self.dom.parent(current);
        Some(current)
    }
}
