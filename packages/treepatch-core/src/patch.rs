use std::cell::Cell;
use std::rc::Rc;

use crate::config::PatchConfig;
use crate::error::{Error, Result};
use crate::hooks::{HookRegistry, Module};
use crate::traits::Backend;
use crate::vnode::VNode;

/// What a pass starts from: a native root adopted for the first time, or the tree returned by
/// the previous [`Patcher::patch`].
#[derive(Debug)]
pub enum Root<N> {
    Native(N),
    Tree(VNode<N>),
}

impl<N> From<VNode<N>> for Root<N> {
    fn from(vnode: VNode<N>) -> Self {
        Root::Tree(vnode)
    }
}

/// The reconciliation entry point, closed over an immutable hook table.
pub struct Patcher<B: Backend> {
    backend: Rc<B>,
    hooks: HookRegistry<B::Node>,
    config: PatchConfig,
    placeholder: VNode<B::Node>,
    in_pass: Cell<bool>,
}

impl<B: Backend + 'static> Patcher<B> {
    /// Build the hook table from `modules` (order preserved) and return the patch function.
    pub fn init(backend: Rc<B>, modules: impl IntoIterator<Item = Module<B::Node>>) -> Self {
        Self::with_config(backend, modules, PatchConfig::default())
    }

    pub fn with_config(
        backend: Rc<B>,
        modules: impl IntoIterator<Item = Module<B::Node>>,
        config: PatchConfig,
    ) -> Self {
        let hooks = HookRegistry::new(modules);
        tracing::debug!(?hooks, max_depth = config.max_depth, "patcher initialized");
        Self {
            backend,
            hooks,
            config,
            placeholder: VNode::placeholder(),
            in_pass: Cell::new(false),
        }
    }

    pub fn backend(&self) -> &Rc<B> {
        &self.backend
    }

    pub fn config(&self) -> &PatchConfig {
        &self.config
    }

    /// Run one full reconciliation pass and return `next`, to be passed as `previous` next time.
    ///
    /// Calling this from inside a hook while a pass is running fails with [`Error::Reentrant`].
    /// If a pass fails part way, mutations already applied stay applied and queued `insert`
    /// hooks and `post` hooks are not run.
    pub fn patch(
        &self,
        previous: impl Into<Root<B::Node>>,
        next: VNode<B::Node>,
    ) -> Result<VNode<B::Node>> {
        if self.in_pass.replace(true) {
            return Err(Error::Reentrant);
        }
        let _guard = PassGuard(&self.in_pass);
        let span = tracing::debug_span!("patch", next = %next.describe());
        let _enter = span.enter();

        for pre in &self.hooks.pre {
            pre();
        }

        let mut pass = Pass {
            backend: &self.backend,
            hooks: &self.hooks,
            config: &self.config,
            placeholder: &self.placeholder,
            inserted: Vec::new(),
        };
        match previous.into() {
            Root::Native(elm) => match self.backend.parent_node(&elm) {
                Some(parent) => {
                    let new_elm = pass.create_elm(&next, 0)?;
                    self.backend.insert_before(&parent, &new_elm, Some(&elm));
                    self.backend.remove_child(&parent, &elm);
                }
                None => {
                    let old = VNode::empty_at(self.backend.tag_name(&elm), elm);
                    pass.patch_vnode(&old, &next, 0)?;
                }
            },
            Root::Tree(old) if old.same_node(&next) => pass.patch_vnode(&old, &next, 0)?,
            Root::Tree(old) => pass.replace_root(&old, &next)?,
        }

        let inserted = pass.inserted;
        tracing::debug!(inserted = inserted.len(), "structural pass complete");
        for vnode in &inserted {
            if let Some(insert) = vnode.hooks().and_then(|h| h.insert.as_ref()) {
                insert(vnode);
            }
        }

        for post in &self.hooks.post {
            post();
        }
        Ok(next)
    }
}

struct PassGuard<'a>(&'a Cell<bool>);

impl Drop for PassGuard<'_> {
    fn drop(&mut self) {
        self.0.set(false);
    }
}

/// State scoped to a single pass: the shared collaborators plus the deferred insert queue.
pub(crate) struct Pass<'p, B: Backend> {
    pub(crate) backend: &'p Rc<B>,
    pub(crate) hooks: &'p HookRegistry<B::Node>,
    pub(crate) config: &'p PatchConfig,
    pub(crate) placeholder: &'p VNode<B::Node>,
    /// Nodes with a per-node `insert` hook, in materialization order.
    pub(crate) inserted: Vec<VNode<B::Node>>,
}

/// The native node of a description that must already be materialized.
pub(crate) fn native<N: Clone>(vnode: &VNode<N>) -> Result<N> {
    vnode.elm().cloned().ok_or_else(|| {
        Error::InconsistentState(format!("{} was never materialized", vnode.describe()))
    })
}

impl<B: Backend + 'static> Pass<'_, B> {
    pub(crate) fn enter(&self, depth: usize) -> Result<()> {
        if depth > self.config.max_depth {
            return Err(Error::DepthLimitExceeded {
                limit: self.config.max_depth,
            });
        }
        Ok(())
    }

    /// Reconcile two descriptions of the same logical node.
    pub(crate) fn patch_vnode(
        &mut self,
        old: &VNode<B::Node>,
        new: &VNode<B::Node>,
        depth: usize,
    ) -> Result<()> {
        self.enter(depth)?;
        if let Some(prepatch) = new.hooks().and_then(|h| h.prepatch.as_ref()) {
            prepatch(old, new);
        }

        let old = old.redirect().unwrap_or_else(|| old.clone());
        let vnode = new.redirect().unwrap_or_else(|| new.clone());
        // A redirect is one level deeper, as in `create_elm`.
        let depth = if vnode.ptr_eq(new) { depth } else { depth + 1 };
        self.enter(depth)?;

        let elm = native(&old)?;
        vnode.bind(elm.clone())?;
        if !vnode.ptr_eq(new) {
            new.bind(elm.clone())?;
        }

        if old.ptr_eq(&vnode) {
            return Ok(());
        }

        if let Some(data) = vnode.data() {
            for update in &self.hooks.update {
                update(&old, &vnode);
            }
            if let Some(update) = &data.hook.update {
                update(&old, &vnode);
            }
        }

        self.patch_content(&elm, &old, &vnode, depth)?;

        if let Some(postpatch) = new.hooks().and_then(|h| h.postpatch.as_ref()) {
            postpatch(&old, &vnode);
        }
        Ok(())
    }

    fn patch_content(
        &mut self,
        elm: &B::Node,
        old: &VNode<B::Node>,
        vnode: &VNode<B::Node>,
        depth: usize,
    ) -> Result<()> {
        match vnode.text_content() {
            None => match (old.children(), vnode.children()) {
                (Some(old_ch), Some(ch)) => {
                    if !Rc::ptr_eq(old_ch, ch) {
                        self.update_children(elm, old_ch, ch, depth + 1)?;
                    }
                }
                (None, Some(ch)) => {
                    if old.text_content().is_some() {
                        self.backend.set_text_content(elm, "");
                    }
                    self.add_vnodes(elm, None, ch, depth + 1)?;
                }
                (Some(old_ch), None) => self.remove_vnodes(old_ch.iter()),
                (None, None) => {
                    if old.text_content().is_some() {
                        self.backend.set_text_content(elm, "");
                    }
                }
            },
            Some(text) => {
                if old.text_content() != Some(text) {
                    if let Some(old_ch) = old.children() {
                        self.remove_vnodes(old_ch.iter());
                    }
                    self.backend.set_text_content(elm, text);
                }
            }
        }
        Ok(())
    }

    /// Swap in `next` for a previous tree it cannot be patched into.
    fn replace_root(&mut self, old: &VNode<B::Node>, next: &VNode<B::Node>) -> Result<()> {
        let old_elm = native(old)?;
        let new_elm = self.create_elm(next, 0)?;
        tracing::debug!(old = %old.describe(), next = %next.describe(), "replacing root");
        if let Some(parent) = self.backend.parent_node(&old_elm) {
            self.backend.insert_before(&parent, &new_elm, Some(&old_elm));
        }
        self.remove_vnodes(std::iter::once(old));
        Ok(())
    }
}
