//! Reference modules that keep element attributes and class toggles in sync with descriptions.

use std::rc::Rc;

use crate::hooks::Module;
use crate::traits::Backend;
use crate::vnode::VNode;

fn sync_attributes<B: Backend>(backend: &B, old: &VNode<B::Node>, new: &VNode<B::Node>) {
    let (Some(elm), Some(data)) = (new.elm(), new.data()) else {
        return;
    };
    let old_attrs = old.data().map(|d| &d.attrs);
    for (name, value) in &data.attrs {
        if old_attrs.and_then(|attrs| attrs.get(name)) != Some(value) {
            backend.set_attribute(elm, name, value);
        }
    }
    for name in old_attrs.into_iter().flat_map(|attrs| attrs.keys()) {
        if !data.attrs.contains_key(name) {
            backend.remove_attribute(elm, name);
        }
    }
}

fn sync_classes<B: Backend>(backend: &B, old: &VNode<B::Node>, new: &VNode<B::Node>) {
    let (Some(elm), Some(data)) = (new.elm(), new.data()) else {
        return;
    };
    let old_class = old.data().map(|d| &d.class);
    for (name, &enabled) in &data.class {
        if old_class.and_then(|class| class.get(name)) != Some(&enabled) {
            backend.toggle_class(elm, name, enabled);
        }
    }
    for name in old_class.into_iter().flat_map(|class| class.keys()) {
        if !data.class.contains_key(name) {
            backend.toggle_class(elm, name, false);
        }
    }
}

/// Applies `attrs` on create and diffs them on update.
pub fn attributes<B: Backend + 'static>(backend: Rc<B>) -> Module<B::Node> {
    let on_update = Rc::clone(&backend);
    Module::new("attributes")
        .on_create(move |old, new| sync_attributes(&*backend, old, new))
        .on_update(move |old, new| sync_attributes(&*on_update, old, new))
}

/// Applies `class` toggles on create and diffs them on update.
pub fn class<B: Backend + 'static>(backend: Rc<B>) -> Module<B::Node> {
    let on_update = Rc::clone(&backend);
    Module::new("class")
        .on_create(move |old, new| sync_classes(&*backend, old, new))
        .on_update(move |old, new| sync_classes(&*on_update, old, new))
}
