use std::cell::Cell;
use std::rc::Rc;

use crate::hooks::RemoveCallback;
use crate::patch::Pass;
use crate::traits::Backend;
use crate::vnode::VNode;

/// Countdown that detaches `elm` from whatever parent it has once `listeners` calls arrived.
fn remove_callback<B: Backend + 'static>(
    backend: Rc<B>,
    elm: B::Node,
    listeners: usize,
) -> RemoveCallback {
    let remaining = Cell::new(listeners);
    RemoveCallback::new(move || {
        let left = remaining.get();
        if left == 0 {
            tracing::warn!(?elm, "remove callback called more often than there were listeners");
            return;
        }
        remaining.set(left - 1);
        if left == 1 {
            if let Some(parent) = backend.parent_node(&elm) {
                tracing::trace!(?elm, "detaching removed node");
                backend.remove_child(&parent, &elm);
            }
        }
    })
}

impl<B: Backend + 'static> Pass<'_, B> {
    /// Discard `vnodes`: destroy cascade first, then the gated detach.
    pub(crate) fn remove_vnodes<'v>(&mut self, vnodes: impl IntoIterator<Item = &'v VNode<B::Node>>) {
        for vnode in vnodes {
            let Some(elm) = vnode.elm().cloned() else {
                tracing::warn!(node = %vnode.describe(), "skipping removal of unmaterialized node");
                continue;
            };

            if vnode.is_text() {
                if let Some(parent) = self.backend.parent_node(&elm) {
                    self.backend.remove_child(&parent, &elm);
                }
                continue;
            }

            self.invoke_destroy_hook(vnode);
            tracing::trace!(node = %vnode.describe(), "removing node");
            let done = remove_callback(
                Rc::clone(self.backend),
                elm,
                self.hooks.remove_listeners() + 1,
            );
            for remove in &self.hooks.remove {
                remove(vnode, done.clone());
            }
            match vnode.hooks().and_then(|h| h.remove.as_ref()) {
                Some(remove) => remove(vnode, done),
                None => done.call(),
            }
        }
    }

    /// Pre-order destroy notifications over a discarded subtree. Text nodes are skipped.
    fn invoke_destroy_hook(&self, vnode: &VNode<B::Node>) {
        let Some(data) = vnode.data() else {
            return;
        };
        if let Some(destroy) = &data.hook.destroy {
            destroy(vnode);
        }
        for destroy in &self.hooks.destroy {
            destroy(vnode);
        }
        if let Some(target) = vnode.redirect() {
            self.invoke_destroy_hook(&target);
        } else if let Some(children) = vnode.children() {
            for child in children.iter() {
                self.invoke_destroy_hook(child);
            }
        }
    }
}
