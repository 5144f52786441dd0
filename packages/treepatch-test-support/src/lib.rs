//! Shared helpers for treepatch tests: hook recorders, keyed list builders, and a conformance
//! suite that any [`Backend`] able to expose its child lists can run.

use std::cell::RefCell;
use std::rc::Rc;

use treepatch_core::{
    Backend, MemoryDocument, MemoryNodeId, Module, NodeHooks, Patcher, RemoveCallback, Root, VNode,
};

/// Shared, append-only log of hook invocations.
#[derive(Clone, Default)]
pub struct HookLog {
    entries: Rc<RefCell<Vec<String>>>,
}

impl HookLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&self, entry: impl Into<String>) {
        self.entries.borrow_mut().push(entry.into());
    }

    pub fn entries(&self) -> Vec<String> {
        self.entries.borrow().clone()
    }

    /// Entries that start with `prefix`, in order.
    pub fn filtered(&self, prefix: &str) -> Vec<String> {
        self.entries
            .borrow()
            .iter()
            .filter(|e| e.starts_with(prefix))
            .cloned()
            .collect()
    }

    pub fn clear(&self) {
        self.entries.borrow_mut().clear();
    }
}

/// Short human label for a node: its key, else its selector, else `#text`.
pub fn label<N>(vnode: &VNode<N>) -> String {
    match (vnode.key(), vnode.sel()) {
        (Some(key), _) => key.to_string(),
        (None, Some(sel)) => sel.to_owned(),
        (None, None) => "#text".to_owned(),
    }
}

/// A module recording every global hook as `"<name>:<hook>[:<label>]"`.
pub fn recording_module<N: 'static>(name: &'static str, log: &HookLog) -> Module<N> {
    let (pre, create, update, destroy, remove, post) = (
        log.clone(),
        log.clone(),
        log.clone(),
        log.clone(),
        log.clone(),
        log.clone(),
    );
    Module::new(name)
        .on_pre(move || pre.push(format!("{name}:pre")))
        .on_create(move |_, node| create.push(format!("{name}:create:{}", label(node))))
        .on_update(move |_, node| update.push(format!("{name}:update:{}", label(node))))
        .on_destroy(move |node| destroy.push(format!("{name}:destroy:{}", label(node))))
        .on_remove(move |node, done| {
            remove.push(format!("{name}:remove:{}", label(node)));
            done.call();
        })
        .on_post(move || post.push(format!("{name}:post")))
}

/// Per-node hooks recording `"<hook>:<label>"`. `remove` completes immediately.
pub fn recording_hooks<N: 'static>(log: &HookLog) -> NodeHooks<N> {
    let (create, insert, prepatch, update, postpatch, destroy, remove) = (
        log.clone(),
        log.clone(),
        log.clone(),
        log.clone(),
        log.clone(),
        log.clone(),
        log.clone(),
    );
    NodeHooks::new()
        .on_create(move |_, node| create.push(format!("create:{}", label(node))))
        .on_insert(move |node| insert.push(format!("insert:{}", label(node))))
        .on_prepatch(move |_, node| prepatch.push(format!("prepatch:{}", label(node))))
        .on_update(move |_, node| update.push(format!("update:{}", label(node))))
        .on_postpatch(move |_, node| postpatch.push(format!("postpatch:{}", label(node))))
        .on_destroy(move |node| destroy.push(format!("destroy:{}", label(node))))
        .on_remove(move |node, done| {
            remove.push(format!("remove:{}", label(node)));
            done.call();
        })
}

/// Holds back `done` callbacks so a test can decide when removals complete.
#[derive(Clone, Default)]
pub struct DeferredRemovals {
    pending: Rc<RefCell<Vec<RemoveCallback>>>,
}

impl DeferredRemovals {
    pub fn new() -> Self {
        Self::default()
    }

    /// Per-node hooks whose `remove` parks its callback here.
    pub fn hooks<N: 'static>(&self) -> NodeHooks<N> {
        let pending = Rc::clone(&self.pending);
        NodeHooks::new().on_remove(move |_, done| pending.borrow_mut().push(done))
    }

    /// A module whose `remove` parks its callback here.
    pub fn module<N: 'static>(&self, name: &'static str) -> Module<N> {
        let pending = Rc::clone(&self.pending);
        Module::new(name).on_remove(move |_, done| pending.borrow_mut().push(done))
    }

    pub fn len(&self) -> usize {
        self.pending.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.pending.borrow().is_empty()
    }

    /// Complete the oldest parked removal. Returns `false` when nothing was pending.
    pub fn release_next(&self) -> bool {
        let next = {
            let mut pending = self.pending.borrow_mut();
            if pending.is_empty() {
                None
            } else {
                Some(pending.remove(0))
            }
        };
        match next {
            Some(done) => {
                done.call();
                true
            }
            None => false,
        }
    }

    /// Complete every parked removal.
    pub fn release(&self) {
        let pending = std::mem::take(&mut *self.pending.borrow_mut());
        for done in pending {
            done.call();
        }
    }
}

/// `<li>` keyed by `key` whose text is the key itself.
pub fn item<N>(key: &str) -> VNode<N> {
    VNode::element("li").key(key).text(key).build()
}

/// `<ul>` holding one [`item`] per key.
pub fn keyed_list<N>(keys: &[&str]) -> VNode<N> {
    VNode::element("ul")
        .children(keys.iter().map(|k| item(k)))
        .build()
}

/// Read access a backend must offer to run the conformance suite.
pub trait Inspect: Backend {
    fn child_nodes(&self, node: &Self::Node) -> Vec<Self::Node>;
    fn text_of(&self, node: &Self::Node) -> String;
}

impl Inspect for MemoryDocument {
    fn child_nodes(&self, node: &MemoryNodeId) -> Vec<MemoryNodeId> {
        self.children_of(*node)
    }

    fn text_of(&self, node: &MemoryNodeId) -> String {
        self.text_content(*node)
    }
}

/// Text of each child of `node`, in document order.
pub fn child_texts<B: Inspect>(backend: &B, node: &B::Node) -> Vec<String> {
    backend
        .child_nodes(node)
        .iter()
        .map(|c| backend.text_of(c))
        .collect()
}

fn mount<B: Inspect + 'static>(patcher: &Patcher<B>, tree: VNode<B::Node>) -> VNode<B::Node> {
    let backend = patcher.backend();
    let container = backend.create_element("main");
    let host = backend.create_element("div");
    backend.append_child(&container, &host);
    patcher
        .patch(Root::Native(host), tree)
        .expect("initial patch")
}

fn check_sequence<B: Inspect + 'static>(backend: Rc<B>, from: &[&str], to: &[&str]) {
    let patcher = Patcher::init(Rc::clone(&backend), Vec::new());
    let prev = mount(&patcher, keyed_list(from));
    let ul = prev.elm().cloned().expect("mounted list");
    let before: Vec<_> = backend.child_nodes(&ul);

    let next = patcher
        .patch(prev, keyed_list(to))
        .expect("reconcile list");
    let ul_after = next.elm().cloned().expect("patched list");
    assert_eq!(ul_after, ul, "list element must be reused");
    assert_eq!(
        child_texts(&*backend, &ul),
        to.iter().map(|s| s.to_string()).collect::<Vec<_>>(),
        "{from:?} -> {to:?}"
    );

    // Every key present on both sides keeps its native node.
    let after = backend.child_nodes(&ul);
    for (i, key) in to.iter().enumerate() {
        if let Some(j) = from.iter().position(|k| k == key) {
            assert_eq!(after[i], before[j], "native node for key {key} was replaced");
        }
    }
}

/// Run the reconciliation conformance scenarios against backends produced by `make`.
pub fn run_conformance<B: Inspect + 'static>(make: impl Fn() -> Rc<B>) {
    let cases: &[(&[&str], &[&str])] = &[
        (&["a", "b"], &["a", "b", "c"]),
        (&["a", "b"], &["x", "a", "b"]),
        (&["a", "b", "c", "d"], &["d", "b", "c", "a"]),
        (&["a", "b", "c", "d", "e"], &["e", "d", "c", "b", "a"]),
        (&["a", "b", "c"], &["a", "c"]),
        (&["a", "b", "c"], &[]),
        (&[], &["a", "b"]),
        (&["a", "b", "c", "d"], &["b", "x", "d", "a", "y"]),
        (&["a", "b", "c", "d", "e", "f"], &["c", "f", "a", "e", "b", "d"]),
    ];
    for (from, to) in cases {
        check_sequence(make(), from, to);
    }
}
