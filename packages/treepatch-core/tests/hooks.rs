use std::cell::RefCell;
use std::rc::{Rc, Weak};

use treepatch_core::{
    thunk, Backend, Error, MemoryDocument, MemoryNodeId, Module, PatchConfig, Patcher, Root,
    VNode,
};
use treepatch_test_support::{
    item, keyed_list, recording_hooks, recording_module, DeferredRemovals, HookLog,
};

type Node = VNode<MemoryNodeId>;

fn hooked(sel: &str, key: &str, log: &HookLog, children: Vec<Node>) -> Node {
    VNode::element(sel)
        .key(key)
        .hooks(recording_hooks(log))
        .children(children)
        .build()
}

#[test]
fn pass_hooks_wrap_create_and_insert() {
    let doc = Rc::new(MemoryDocument::new());
    let log = HookLog::new();
    let patcher = Patcher::init(Rc::clone(&doc), vec![recording_module("m", &log)]);
    let root = doc.create_element("div");

    patcher
        .patch(Root::Native(root), VNode::element("div").children([hooked("p", "p", &log, vec![])]).build())
        .unwrap();

    assert_eq!(
        log.entries(),
        vec![
            "m:pre",
            "m:update:div",
            "m:create:p",
            "create:p",
            "insert:p",
            "m:post",
        ]
    );
}

#[test]
fn create_hooks_complete_before_any_insert_hook() {
    let doc = Rc::new(MemoryDocument::new());
    let log = HookLog::new();
    let patcher = Patcher::init(Rc::clone(&doc), Vec::new());
    let root = doc.create_element("div");

    let tree = hooked(
        "section",
        "root",
        &log,
        vec![
            hooked("div", "s1", &log, vec![hooked("b", "b1", &log, vec![])]),
            hooked("div", "s2", &log, vec![]),
        ],
    );
    patcher
        .patch(Root::Native(root), VNode::element("div").children([tree]).build())
        .unwrap();

    // A node's create hooks run once its content exists, so descendants report first.
    assert_eq!(
        log.filtered("create:"),
        vec!["create:b1", "create:s1", "create:s2", "create:root"]
    );
    // Insert hooks follow materialization order: parents before children.
    assert_eq!(
        log.filtered("insert:"),
        vec!["insert:root", "insert:s1", "insert:b1", "insert:s2"]
    );
    let entries = log.entries();
    let last_create = entries.iter().rposition(|e| e.starts_with("create:")).unwrap();
    let first_insert = entries.iter().position(|e| e.starts_with("insert:")).unwrap();
    assert!(last_create < first_insert);
}

#[test]
fn patch_hooks_fire_in_order() {
    let doc = Rc::new(MemoryDocument::new());
    let log = HookLog::new();
    let patcher = Patcher::init(Rc::clone(&doc), vec![recording_module("m", &log)]);
    let root = doc.create_element("p");

    let first = VNode::element("p")
        .key("r")
        .hooks(recording_hooks(&log))
        .text("a")
        .build();
    let prev = patcher.patch(Root::Native(root), first).unwrap();
    log.clear();

    let second = VNode::element("p")
        .key("r")
        .hooks(recording_hooks(&log))
        .text("b")
        .build();
    patcher.patch(prev, second).unwrap();

    assert_eq!(
        log.entries(),
        vec![
            "m:pre",
            "prepatch:r",
            "m:update:r",
            "update:r",
            "postpatch:r",
            "m:post",
        ]
    );
    assert_eq!(doc.render(root), "<p>b</p>");
}

#[test]
fn destroy_cascade_precedes_remove() {
    let doc = Rc::new(MemoryDocument::new());
    let log = HookLog::new();
    let patcher = Patcher::init(Rc::clone(&doc), vec![recording_module("m", &log)]);
    let root = doc.create_element("ul");

    let doomed = hooked("li", "a", &log, vec![hooked("span", "x", &log, vec![])]);
    let prev = patcher
        .patch(
            Root::Native(root),
            VNode::element("ul").children([doomed, item("b")]).build(),
        )
        .unwrap();
    log.clear();

    patcher
        .patch(prev, VNode::element("ul").children([item("b")]).build())
        .unwrap();

    let teardown: Vec<String> = log
        .entries()
        .into_iter()
        .filter(|e| e.contains("destroy") || e.contains("remove"))
        .collect();
    assert_eq!(
        teardown,
        vec![
            "destroy:a",
            "m:destroy:a",
            "destroy:x",
            "m:destroy:x",
            "m:remove:a",
            "remove:a",
        ]
    );
    assert_eq!(doc.render(root), "<ul><li>b</li></ul>");
}

#[test]
fn deferred_node_removal_keeps_node_attached_until_released() {
    let doc = Rc::new(MemoryDocument::new());
    let deferred = DeferredRemovals::new();
    let patcher = Patcher::init(Rc::clone(&doc), Vec::new());
    let root = doc.create_element("ul");

    let fading = VNode::element("li")
        .key("a")
        .hooks(deferred.hooks())
        .text("a")
        .build();
    let prev = patcher
        .patch(
            Root::Native(root),
            VNode::element("ul").children([fading, item("b")]).build(),
        )
        .unwrap();

    patcher.patch(prev, keyed_list(&["b"])).unwrap();

    assert_eq!(deferred.len(), 1);
    assert_eq!(doc.render(root), "<ul><li>a</li><li>b</li></ul>");

    deferred.release();
    assert_eq!(doc.render(root), "<ul><li>b</li></ul>");
}

#[test]
fn removal_waits_for_every_listener() {
    let doc = Rc::new(MemoryDocument::new());
    let deferred = DeferredRemovals::new();
    let patcher = Patcher::init(Rc::clone(&doc), vec![deferred.module("fade")]);
    let root = doc.create_element("ul");

    let fading = VNode::element("li")
        .key("a")
        .hooks(deferred.hooks())
        .text("a")
        .build();
    let prev = patcher
        .patch(
            Root::Native(root),
            VNode::element("ul").children([fading, item("b")]).build(),
        )
        .unwrap();
    let a = doc.children_of(root)[0];

    patcher.patch(prev, keyed_list(&["b"])).unwrap();
    assert_eq!(deferred.len(), 2);

    assert!(deferred.release_next());
    assert_eq!(doc.parent_node(&a), Some(root));

    assert!(deferred.release_next());
    assert_eq!(doc.parent_node(&a), None);
    assert!(!deferred.release_next());
}

#[test]
fn module_removal_without_node_hook_is_gated() {
    let doc = Rc::new(MemoryDocument::new());
    let deferred = DeferredRemovals::new();
    let patcher = Patcher::init(Rc::clone(&doc), vec![deferred.module("fade")]);
    let root = doc.create_element("ul");

    let prev = patcher
        .patch(Root::Native(root), keyed_list(&["a", "b"]))
        .unwrap();
    let a = doc.children_of(root)[0];

    patcher.patch(prev, keyed_list(&["b"])).unwrap();
    assert_eq!(doc.parent_node(&a), Some(root));

    deferred.release();
    assert_eq!(doc.parent_node(&a), None);
}

#[test]
fn discarded_text_children_detach_without_hooks() {
    let doc = Rc::new(MemoryDocument::new());
    let log = HookLog::new();
    let deferred = DeferredRemovals::new();
    let patcher = Patcher::init(
        Rc::clone(&doc),
        vec![recording_module("m", &log), deferred.module("fade")],
    );
    let root = doc.create_element("ul");

    let prev = patcher
        .patch(
            Root::Native(root),
            VNode::element("ul")
                .children([VNode::text("t"), hooked("li", "a", &log, vec![])])
                .build(),
        )
        .unwrap();
    let text = doc.children_of(root)[0];
    log.clear();

    patcher
        .patch(
            prev,
            VNode::element("ul")
                .children([hooked("li", "a", &log, vec![])])
                .build(),
        )
        .unwrap();

    assert_eq!(doc.parent_node(&text), None);
    assert!(deferred.is_empty());
    assert!(
        !log.entries()
            .iter()
            .any(|e| e.contains("#text") && (e.contains("destroy") || e.contains("remove"))),
        "{:?}",
        log.entries()
    );
    assert_eq!(doc.render(root), "<ul><li></li></ul>");
}

#[test]
fn reentrant_patch_is_rejected() {
    let doc = Rc::new(MemoryDocument::new());
    let slot: Rc<RefCell<Weak<Patcher<MemoryDocument>>>> = Rc::new(RefCell::new(Weak::new()));
    let outcome: Rc<RefCell<Option<Result<Node, Error>>>> = Rc::new(RefCell::new(None));

    let module = {
        let slot = Rc::clone(&slot);
        let outcome = Rc::clone(&outcome);
        let doc = Rc::clone(&doc);
        Module::new("reenter").on_pre(move || {
            if let Some(patcher) = slot.borrow().upgrade() {
                let inner = doc.create_element("div");
                let result = patcher.patch(Root::Native(inner), VNode::element("div").build());
                *outcome.borrow_mut() = Some(result);
            }
        })
    };
    let patcher = Rc::new(Patcher::init(Rc::clone(&doc), vec![module]));
    *slot.borrow_mut() = Rc::downgrade(&patcher);

    let root = doc.create_element("div");
    let tree = patcher
        .patch(Root::Native(root), VNode::element("div").text("ok").build())
        .unwrap();

    assert!(matches!(*outcome.borrow(), Some(Err(Error::Reentrant))));
    assert_eq!(doc.render(root), "<div>ok</div>");

    // The guard is released once the outer pass finishes.
    *slot.borrow_mut() = Weak::new();
    patcher
        .patch(tree, VNode::element("div").text("again").build())
        .unwrap();
    assert_eq!(doc.render(root), "<div>again</div>");
}

fn nested(depth: usize) -> Node {
    let mut node = VNode::element("div").build();
    for _ in 0..depth {
        node = VNode::element("div").children([node]).build();
    }
    node
}

#[test]
fn depth_limit_fails_predictably() {
    let doc = Rc::new(MemoryDocument::new());
    let patcher = Patcher::with_config(
        Rc::clone(&doc),
        Vec::new(),
        PatchConfig::default().with_max_depth(2),
    );

    let ok_root = doc.create_element("div");
    patcher.patch(Root::Native(ok_root), nested(2)).unwrap();

    let deep_root = doc.create_element("div");
    let err = patcher
        .patch(Root::Native(deep_root), nested(3))
        .unwrap_err();
    assert_eq!(err, Error::DepthLimitExceeded { limit: 2 });

    let again = doc.create_element("div");
    patcher.patch(Root::Native(again), nested(1)).unwrap();
}

fn memo_chain(args: u32) -> Node {
    let memo = thunk(
        "p",
        None,
        |n: &u32| {
            VNode::element("p")
                .children([VNode::element("b").text(n.to_string()).build()])
                .build()
        },
        args,
    );
    VNode::element("div").children([memo]).build()
}

#[test]
fn redirects_count_as_a_level_when_patching_too() {
    let doc = Rc::new(MemoryDocument::new());
    let strict = Patcher::with_config(
        Rc::clone(&doc),
        Vec::new(),
        PatchConfig::default().with_max_depth(2),
    );
    let lenient = Patcher::init(Rc::clone(&doc), Vec::new());

    let fresh = doc.create_element("div");
    let err = strict.patch(Root::Native(fresh), memo_chain(1)).unwrap_err();
    assert_eq!(err, Error::DepthLimitExceeded { limit: 2 });

    let root = doc.create_element("div");
    let prev = lenient.patch(Root::Native(root), memo_chain(1)).unwrap();
    let err = strict.patch(prev, memo_chain(2)).unwrap_err();
    assert_eq!(err, Error::DepthLimitExceeded { limit: 2 });
}
