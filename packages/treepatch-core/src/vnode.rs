use std::any::Any;
use std::cell::{OnceCell, RefCell};
use std::collections::BTreeMap;
use std::fmt;
use std::rc::Rc;

use crate::error::{Error, Result};
use crate::hooks::NodeHooks;
use crate::key::Key;

/// Shared, immutable child list. Two lists are "identical" when they are the same allocation.
pub type Children<N> = Rc<[VNode<N>]>;

/// One node of a tree description.
///
/// A `VNode` is a cheap handle: cloning it yields the *same* node, which is what the patcher's
/// idempotence fast path checks for. The native reference is filled in once, either by
/// materialization or by adopting the native node of the old node it was matched against.
pub struct VNode<N> {
    inner: Rc<Inner<N>>,
}

struct Inner<N> {
    kind: VNodeKind<N>,
    elm: OnceCell<N>,
    redirect: RefCell<Option<VNode<N>>>,
}

pub enum VNodeKind<N> {
    Text(String),
    Element(Element<N>),
}

pub struct Element<N> {
    pub sel: String,
    pub data: NodeData<N>,
    pub content: Content<N>,
}

/// Element content. Text and children are mutually exclusive by construction.
pub enum Content<N> {
    Empty,
    Text(String),
    Children(Children<N>),
}

/// Module-specific configuration carried by an element.
pub struct NodeData<N> {
    pub key: Option<Key>,
    /// Namespace URI for non-default markup dialects (e.g. SVG).
    pub ns: Option<String>,
    pub attrs: BTreeMap<String, String>,
    pub class: BTreeMap<String, bool>,
    pub hook: NodeHooks<N>,
    /// Opaque slot for state owned by a single module or helper.
    pub payload: Option<Rc<dyn Any>>,
}

impl<N> NodeData<N> {
    pub fn new() -> Self {
        Self {
            key: None,
            ns: None,
            attrs: BTreeMap::new(),
            class: BTreeMap::new(),
            hook: NodeHooks::new(),
            payload: None,
        }
    }
}

impl<N> Default for NodeData<N> {
    fn default() -> Self {
        Self::new()
    }
}

impl<N> Clone for NodeData<N> {
    fn clone(&self) -> Self {
        Self {
            key: self.key.clone(),
            ns: self.ns.clone(),
            attrs: self.attrs.clone(),
            class: self.class.clone(),
            hook: self.hook.clone(),
            payload: self.payload.clone(),
        }
    }
}

impl<N> fmt::Debug for NodeData<N> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NodeData")
            .field("key", &self.key)
            .field("ns", &self.ns)
            .field("attrs", &self.attrs)
            .field("class", &self.class)
            .field("hook", &self.hook)
            .field("payload", &self.payload.is_some())
            .finish()
    }
}

impl<N> VNode<N> {
    fn from_kind(kind: VNodeKind<N>) -> Self {
        Self {
            inner: Rc::new(Inner {
                kind,
                elm: OnceCell::new(),
                redirect: RefCell::new(None),
            }),
        }
    }

    /// A text node.
    pub fn text(text: impl Into<String>) -> Self {
        Self::from_kind(VNodeKind::Text(text.into()))
    }

    /// Start building an element from a `tag#id.class` selector.
    pub fn element(sel: impl Into<String>) -> ElementBuilder<N> {
        ElementBuilder::new(sel)
    }

    /// The empty predecessor handed to `create` hooks.
    pub(crate) fn placeholder() -> Self {
        Self::from_kind(VNodeKind::Element(Element {
            sel: String::new(),
            data: NodeData::new(),
            content: Content::Children(Rc::from(Vec::new())),
        }))
    }

    /// An empty description standing in for an already materialized, parentless element.
    pub(crate) fn empty_at(tag: String, elm: N) -> Self {
        let node = Self::from_kind(VNodeKind::Element(Element {
            sel: tag,
            data: NodeData::new(),
            content: Content::Children(Rc::from(Vec::new())),
        }));
        let _ = node.inner.elm.set(elm);
        node
    }

    pub fn kind(&self) -> &VNodeKind<N> {
        &self.inner.kind
    }

    pub fn is_text(&self) -> bool {
        matches!(self.inner.kind, VNodeKind::Text(_))
    }

    pub fn as_element(&self) -> Option<&Element<N>> {
        match &self.inner.kind {
            VNodeKind::Element(el) => Some(el),
            VNodeKind::Text(_) => None,
        }
    }

    /// Selector; `None` for text nodes.
    pub fn sel(&self) -> Option<&str> {
        self.as_element().map(|el| el.sel.as_str())
    }

    pub fn data(&self) -> Option<&NodeData<N>> {
        self.as_element().map(|el| &el.data)
    }

    pub fn key(&self) -> Option<&Key> {
        self.data().and_then(|d| d.key.as_ref())
    }

    pub fn hooks(&self) -> Option<&NodeHooks<N>> {
        self.data().map(|d| &d.hook)
    }

    pub fn children(&self) -> Option<&Children<N>> {
        match self.as_element().map(|el| &el.content) {
            Some(Content::Children(children)) => Some(children),
            _ => None,
        }
    }

    /// Text content: the string of a text node, or an element's inline text.
    pub fn text_content(&self) -> Option<&str> {
        match &self.inner.kind {
            VNodeKind::Text(text) => Some(text),
            VNodeKind::Element(Element {
                content: Content::Text(text),
                ..
            }) => Some(text),
            VNodeKind::Element(_) => None,
        }
    }

    /// Native node this description is bound to, once materialized.
    pub fn elm(&self) -> Option<&N> {
        self.inner.elm.get()
    }

    /// Whether both handles point at the exact same node.
    pub fn ptr_eq(&self, other: &VNode<N>) -> bool {
        Rc::ptr_eq(&self.inner, &other.inner)
    }

    /// The identity predicate: equal keys (both absent counts) and equal selectors.
    pub fn same_node(&self, other: &VNode<N>) -> bool {
        self.key() == other.key() && self.sel() == other.sel()
    }

    /// Description to use in place of this node, if a hook installed one.
    pub fn redirect(&self) -> Option<VNode<N>> {
        self.inner.redirect.borrow().clone()
    }

    /// Install a substitute description. Intended for `init` and `prepatch` hooks.
    pub fn set_redirect(&self, target: VNode<N>) {
        *self.inner.redirect.borrow_mut() = Some(target);
    }

    pub(crate) fn describe(&self) -> String {
        match (self.sel(), self.key()) {
            (None, _) => "#text".to_owned(),
            (Some(sel), None) => sel.to_owned(),
            (Some(sel), Some(key)) => format!("{sel}[key={key}]"),
        }
    }
}

impl<N: PartialEq> VNode<N> {
    /// Record the native node. A node is never rebound to a different native node.
    pub(crate) fn bind(&self, elm: N) -> Result<()> {
        match self.inner.elm.get() {
            Some(existing) if *existing == elm => Ok(()),
            Some(_) => Err(Error::InconsistentState(format!(
                "{} is already bound to a different native node",
                self.describe()
            ))),
            None => {
                let _ = self.inner.elm.set(elm);
                Ok(())
            }
        }
    }
}

impl<N> Clone for VNode<N> {
    fn clone(&self) -> Self {
        Self {
            inner: Rc::clone(&self.inner),
        }
    }
}

impl<N: fmt::Debug> fmt::Debug for VNode<N> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.inner.kind {
            VNodeKind::Text(text) => f
                .debug_struct("Text")
                .field("text", text)
                .field("elm", &self.inner.elm.get())
                .finish(),
            VNodeKind::Element(el) => {
                let mut s = f.debug_struct("Element");
                s.field("sel", &el.sel).field("key", &el.data.key);
                if !el.data.hook.is_empty() {
                    s.field("hook", &el.data.hook);
                }
                match &el.content {
                    Content::Empty => {}
                    Content::Text(text) => {
                        s.field("text", text);
                    }
                    Content::Children(children) => {
                        s.field("children", children);
                    }
                }
                s.field("elm", &self.inner.elm.get()).finish()
            }
        }
    }
}

/// Builder for element nodes. Of `text` and `children`, whichever is set last wins.
pub struct ElementBuilder<N> {
    sel: String,
    data: NodeData<N>,
    content: Content<N>,
}

impl<N> ElementBuilder<N> {
    pub fn new(sel: impl Into<String>) -> Self {
        Self {
            sel: sel.into(),
            data: NodeData::new(),
            content: Content::Empty,
        }
    }

    pub fn key(mut self, key: impl Into<Key>) -> Self {
        self.data.key = Some(key.into());
        self
    }

    pub fn ns(mut self, ns: impl Into<String>) -> Self {
        self.data.ns = Some(ns.into());
        self
    }

    pub fn attr(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.data.attrs.insert(name.into(), value.into());
        self
    }

    pub fn class(mut self, name: impl Into<String>, enabled: bool) -> Self {
        self.data.class.insert(name.into(), enabled);
        self
    }

    pub fn hooks(mut self, hooks: NodeHooks<N>) -> Self {
        self.data.hook = hooks;
        self
    }

    pub fn payload(mut self, payload: Rc<dyn Any>) -> Self {
        self.data.payload = Some(payload);
        self
    }

    pub fn data(mut self, data: NodeData<N>) -> Self {
        self.data = data;
        self
    }

    pub fn text(mut self, text: impl Into<String>) -> Self {
        self.content = Content::Text(text.into());
        self
    }

    pub fn children(mut self, children: impl IntoIterator<Item = VNode<N>>) -> Self {
        self.content = Content::Children(children.into_iter().collect());
        self
    }

    /// Reuse an existing child list allocation; patching skips identical lists outright.
    pub fn shared_children(mut self, children: Children<N>) -> Self {
        self.content = Content::Children(children);
        self
    }

    pub fn build(self) -> VNode<N> {
        VNode::from_kind(VNodeKind::Element(Element {
            sel: self.sel,
            data: self.data,
            content: self.content,
        }))
    }
}

impl<N> From<ElementBuilder<N>> for VNode<N> {
    fn from(builder: ElementBuilder<N>) -> Self {
        builder.build()
    }
}
