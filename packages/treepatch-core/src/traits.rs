use std::cell::RefCell;
use std::collections::BTreeMap;
use std::fmt;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Materialization backend: the primitives the reconciler sequences against a live tree.
///
/// Methods take `&self` because removal callbacks may run after a pass has returned; backends
/// that mutate in-process state use interior mutability. None of the primitives can fail from
/// the reconciler's point of view.
pub trait Backend {
    /// Handle to a native node. Cloning must yield another handle to the *same* node.
    type Node: Clone + PartialEq + fmt::Debug + 'static;

    fn create_element(&self, tag: &str) -> Self::Node;
    fn create_element_ns(&self, namespace: &str, tag: &str) -> Self::Node;
    fn create_text_node(&self, text: &str) -> Self::Node;

    fn set_id(&self, elm: &Self::Node, id: &str);
    fn set_class_list(&self, elm: &Self::Node, classes: &[&str]);
    fn set_attribute(&self, elm: &Self::Node, name: &str, value: &str);
    fn remove_attribute(&self, elm: &Self::Node, name: &str);
    fn toggle_class(&self, elm: &Self::Node, class: &str, enabled: bool);

    fn append_child(&self, parent: &Self::Node, child: &Self::Node);
    /// Insert `child` before `reference`, or at the end when `reference` is `None`. A child that
    /// is already attached somewhere is moved.
    fn insert_before(&self, parent: &Self::Node, child: &Self::Node, reference: Option<&Self::Node>);
    fn remove_child(&self, parent: &Self::Node, child: &Self::Node);
    /// Replace all content of `node` with `text`. An empty string leaves an element empty.
    fn set_text_content(&self, node: &Self::Node, text: &str);

    fn parent_node(&self, node: &Self::Node) -> Option<Self::Node>;
    fn next_sibling(&self, node: &Self::Node) -> Option<Self::Node>;
    fn tag_name(&self, elm: &Self::Node) -> String;
}

/// Handle into a [`MemoryDocument`].
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash, Ord, PartialOrd)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct MemoryNodeId(pub usize);

/// Counters for the structural primitives a [`MemoryDocument`] has executed.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct MutationStats {
    pub elements_created: u64,
    pub text_nodes_created: u64,
    /// Insertions of nodes that had no parent yet.
    pub inserts: u64,
    /// Insertions of nodes that were already attached.
    pub moves: u64,
    pub removals: u64,
    pub text_writes: u64,
}

impl MutationStats {
    pub fn created(&self) -> u64 {
        self.elements_created + self.text_nodes_created
    }
}

#[derive(Clone, Debug)]
enum MemoryNodeKind {
    Element { tag: String, ns: Option<String> },
    Text(String),
}

#[derive(Clone, Debug)]
struct MemoryNode {
    kind: MemoryNodeKind,
    id: Option<String>,
    classes: Vec<String>,
    attrs: BTreeMap<String, String>,
    parent: Option<MemoryNodeId>,
    children: Vec<MemoryNodeId>,
}

impl MemoryNode {
    fn new(kind: MemoryNodeKind) -> Self {
        Self {
            kind,
            id: None,
            classes: Vec::new(),
            attrs: BTreeMap::new(),
            parent: None,
            children: Vec::new(),
        }
    }
}

/// Serializable view of a [`MemoryDocument`] subtree.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct MemoryNodeExport {
    pub node: MemoryNodeId,
    pub tag: Option<String>,
    pub ns: Option<String>,
    pub id: Option<String>,
    pub classes: Vec<String>,
    pub attrs: BTreeMap<String, String>,
    pub text: Option<String>,
    pub children: Vec<MemoryNodeExport>,
}

/// In-memory arena-backed document for prototyping and tests.
///
/// Nodes are never freed; detached nodes simply lose their parent link.
#[derive(Default)]
pub struct MemoryDocument {
    nodes: RefCell<Vec<MemoryNode>>,
    stats: RefCell<MutationStats>,
}

impl MemoryDocument {
    pub fn new() -> Self {
        Self::default()
    }

    fn push(&self, node: MemoryNode) -> MemoryNodeId {
        let mut nodes = self.nodes.borrow_mut();
        nodes.push(node);
        MemoryNodeId(nodes.len() - 1)
    }

    fn detach(nodes: &mut [MemoryNode], child: MemoryNodeId) {
        if let Some(parent) = nodes[child.0].parent.take() {
            nodes[parent.0].children.retain(|c| *c != child);
        }
    }

    pub fn stats(&self) -> MutationStats {
        self.stats.borrow().clone()
    }

    pub fn reset_stats(&self) {
        *self.stats.borrow_mut() = MutationStats::default();
    }

    pub fn len(&self) -> usize {
        self.nodes.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.borrow().is_empty()
    }

    pub fn children_of(&self, node: MemoryNodeId) -> Vec<MemoryNodeId> {
        self.nodes.borrow()[node.0].children.clone()
    }

    /// Tag of an element, `None` for text nodes.
    pub fn tag(&self, node: MemoryNodeId) -> Option<String> {
        match &self.nodes.borrow()[node.0].kind {
            MemoryNodeKind::Element { tag, .. } => Some(tag.clone()),
            MemoryNodeKind::Text(_) => None,
        }
    }

    pub fn namespace(&self, node: MemoryNodeId) -> Option<String> {
        match &self.nodes.borrow()[node.0].kind {
            MemoryNodeKind::Element { ns, .. } => ns.clone(),
            MemoryNodeKind::Text(_) => None,
        }
    }

    pub fn dom_id(&self, node: MemoryNodeId) -> Option<String> {
        self.nodes.borrow()[node.0].id.clone()
    }

    pub fn classes(&self, node: MemoryNodeId) -> Vec<String> {
        self.nodes.borrow()[node.0].classes.clone()
    }

    pub fn attribute(&self, node: MemoryNodeId, name: &str) -> Option<String> {
        self.nodes.borrow()[node.0].attrs.get(name).cloned()
    }

    /// Concatenated text of the subtree, like the DOM's `textContent`.
    pub fn text_content(&self, node: MemoryNodeId) -> String {
        let nodes = self.nodes.borrow();
        let mut out = String::new();
        Self::collect_text(&nodes, node, &mut out);
        out
    }

    fn collect_text(nodes: &[MemoryNode], node: MemoryNodeId, out: &mut String) {
        match &nodes[node.0].kind {
            MemoryNodeKind::Text(text) => out.push_str(text),
            MemoryNodeKind::Element { .. } => {
                for child in &nodes[node.0].children {
                    Self::collect_text(nodes, *child, out);
                }
            }
        }
    }

    /// Compact markup rendering of a subtree, for assertions.
    pub fn render(&self, node: MemoryNodeId) -> String {
        let nodes = self.nodes.borrow();
        let mut out = String::new();
        Self::render_into(&nodes, node, &mut out);
        out
    }

    fn render_into(nodes: &[MemoryNode], node: MemoryNodeId, out: &mut String) {
        let n = &nodes[node.0];
        match &n.kind {
            MemoryNodeKind::Text(text) => out.push_str(text),
            MemoryNodeKind::Element { tag, .. } => {
                out.push('<');
                out.push_str(tag);
                if let Some(id) = &n.id {
                    out.push_str(&format!(" id=\"{id}\""));
                }
                if !n.classes.is_empty() {
                    out.push_str(&format!(" class=\"{}\"", n.classes.join(" ")));
                }
                for (name, value) in &n.attrs {
                    out.push_str(&format!(" {name}=\"{value}\""));
                }
                out.push('>');
                for child in &n.children {
                    Self::render_into(nodes, *child, out);
                }
                out.push_str(&format!("</{tag}>"));
            }
        }
    }

    pub fn export(&self, node: MemoryNodeId) -> MemoryNodeExport {
        let nodes = self.nodes.borrow();
        Self::export_from(&nodes, node)
    }

    fn export_from(nodes: &[MemoryNode], node: MemoryNodeId) -> MemoryNodeExport {
        let n = &nodes[node.0];
        let (tag, ns, text) = match &n.kind {
            MemoryNodeKind::Element { tag, ns } => (Some(tag.clone()), ns.clone(), None),
            MemoryNodeKind::Text(text) => (None, None, Some(text.clone())),
        };
        MemoryNodeExport {
            node,
            tag,
            ns,
            id: n.id.clone(),
            classes: n.classes.clone(),
            attrs: n.attrs.clone(),
            text,
            children: n.children.iter().map(|c| Self::export_from(nodes, *c)).collect(),
        }
    }
}

impl Backend for MemoryDocument {
    type Node = MemoryNodeId;

    fn create_element(&self, tag: &str) -> MemoryNodeId {
        self.stats.borrow_mut().elements_created += 1;
        self.push(MemoryNode::new(MemoryNodeKind::Element {
            tag: tag.to_owned(),
            ns: None,
        }))
    }

    fn create_element_ns(&self, namespace: &str, tag: &str) -> MemoryNodeId {
        self.stats.borrow_mut().elements_created += 1;
        self.push(MemoryNode::new(MemoryNodeKind::Element {
            tag: tag.to_owned(),
            ns: Some(namespace.to_owned()),
        }))
    }

    fn create_text_node(&self, text: &str) -> MemoryNodeId {
        self.stats.borrow_mut().text_nodes_created += 1;
        self.push(MemoryNode::new(MemoryNodeKind::Text(text.to_owned())))
    }

    fn set_id(&self, elm: &MemoryNodeId, id: &str) {
        self.nodes.borrow_mut()[elm.0].id = Some(id.to_owned());
    }

    fn set_class_list(&self, elm: &MemoryNodeId, classes: &[&str]) {
        self.nodes.borrow_mut()[elm.0].classes = classes.iter().map(|c| (*c).to_owned()).collect();
    }

    fn set_attribute(&self, elm: &MemoryNodeId, name: &str, value: &str) {
        self.nodes.borrow_mut()[elm.0]
            .attrs
            .insert(name.to_owned(), value.to_owned());
    }

    fn remove_attribute(&self, elm: &MemoryNodeId, name: &str) {
        self.nodes.borrow_mut()[elm.0].attrs.remove(name);
    }

    fn toggle_class(&self, elm: &MemoryNodeId, class: &str, enabled: bool) {
        let mut nodes = self.nodes.borrow_mut();
        let classes = &mut nodes[elm.0].classes;
        let present = classes.iter().any(|c| c == class);
        if enabled && !present {
            classes.push(class.to_owned());
        } else if !enabled && present {
            classes.retain(|c| c != class);
        }
    }

    fn append_child(&self, parent: &MemoryNodeId, child: &MemoryNodeId) {
        self.insert_before(parent, child, None);
    }

    fn insert_before(
        &self,
        parent: &MemoryNodeId,
        child: &MemoryNodeId,
        reference: Option<&MemoryNodeId>,
    ) {
        // Inserting a node before itself means "before its current next sibling".
        let reference = match reference {
            Some(r) if r == child => self.next_sibling(child),
            other => other.copied(),
        };
        let mut nodes = self.nodes.borrow_mut();
        let moved = nodes[child.0].parent.is_some();
        Self::detach(&mut nodes, *child);
        let siblings = &mut nodes[parent.0].children;
        let index = reference
            .and_then(|r| siblings.iter().position(|c| *c == r))
            .unwrap_or(siblings.len());
        siblings.insert(index, *child);
        nodes[child.0].parent = Some(*parent);

        let mut stats = self.stats.borrow_mut();
        if moved {
            stats.moves += 1;
        } else {
            stats.inserts += 1;
        }
    }

    fn remove_child(&self, parent: &MemoryNodeId, child: &MemoryNodeId) {
        let mut nodes = self.nodes.borrow_mut();
        if nodes[child.0].parent != Some(*parent) {
            tracing::warn!(?parent, ?child, "remove_child: node is not a child of parent");
            return;
        }
        Self::detach(&mut nodes, *child);
        self.stats.borrow_mut().removals += 1;
    }

    fn set_text_content(&self, node: &MemoryNodeId, text: &str) {
        self.stats.borrow_mut().text_writes += 1;
        let mut nodes = self.nodes.borrow_mut();
        if let MemoryNodeKind::Text(existing) = &mut nodes[node.0].kind {
            *existing = text.to_owned();
            return;
        }
        for child in std::mem::take(&mut nodes[node.0].children) {
            nodes[child.0].parent = None;
        }
        if !text.is_empty() {
            let mut text_node = MemoryNode::new(MemoryNodeKind::Text(text.to_owned()));
            text_node.parent = Some(*node);
            nodes.push(text_node);
            let id = MemoryNodeId(nodes.len() - 1);
            nodes[node.0].children.push(id);
        }
    }

    fn parent_node(&self, node: &MemoryNodeId) -> Option<MemoryNodeId> {
        self.nodes.borrow()[node.0].parent
    }

    fn next_sibling(&self, node: &MemoryNodeId) -> Option<MemoryNodeId> {
        let nodes = self.nodes.borrow();
        let parent = nodes[node.0].parent?;
        let siblings = &nodes[parent.0].children;
        let index = siblings.iter().position(|c| c == node)?;
        siblings.get(index + 1).copied()
    }

    fn tag_name(&self, elm: &MemoryNodeId) -> String {
        self.tag(*elm).unwrap_or_default()
    }
}
