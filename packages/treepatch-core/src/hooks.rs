use std::fmt;
use std::rc::Rc;

use crate::vnode::VNode;

/// Per-node `init`: runs before materialization and may return a substitute description.
pub type InitHook<N> = Rc<dyn Fn(&VNode<N>) -> Option<VNode<N>>>;
/// `create(empty_placeholder, node)`.
pub type CreateHook<N> = Rc<dyn Fn(&VNode<N>, &VNode<N>)>;
/// `insert(node)`, `destroy(node)`.
pub type NodeHook<N> = Rc<dyn Fn(&VNode<N>)>;
/// `prepatch`, `update` and `postpatch`: `(old, new)`.
pub type PatchHook<N> = Rc<dyn Fn(&VNode<N>, &VNode<N>)>;
/// `remove(node, done)`: the hook must eventually call `done` exactly once.
pub type RemoveHook<N> = Rc<dyn Fn(&VNode<N>, RemoveCallback)>;
/// `pre()` / `post()`.
pub type PassHook = Rc<dyn Fn()>;

/// Countdown handle passed to `remove` hooks.
///
/// Every interested party holds a clone; the native node is detached from its parent once all of
/// them have called [`RemoveCallback::call`].
#[derive(Clone)]
pub struct RemoveCallback {
    done: Rc<dyn Fn()>,
}

impl RemoveCallback {
    pub fn new(done: impl Fn() + 'static) -> Self {
        Self {
            done: Rc::new(done),
        }
    }

    pub fn call(&self) {
        (self.done)();
    }
}

impl fmt::Debug for RemoveCallback {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("RemoveCallback")
    }
}

/// Hooks attached to a single node through its data payload.
pub struct NodeHooks<N> {
    pub init: Option<InitHook<N>>,
    pub create: Option<CreateHook<N>>,
    pub insert: Option<NodeHook<N>>,
    pub prepatch: Option<PatchHook<N>>,
    pub update: Option<PatchHook<N>>,
    pub postpatch: Option<PatchHook<N>>,
    pub destroy: Option<NodeHook<N>>,
    pub remove: Option<RemoveHook<N>>,
}

impl<N> NodeHooks<N> {
    pub fn new() -> Self {
        Self {
            init: None,
            create: None,
            insert: None,
            prepatch: None,
            update: None,
            postpatch: None,
            destroy: None,
            remove: None,
        }
    }

    pub fn on_init(mut self, f: impl Fn(&VNode<N>) -> Option<VNode<N>> + 'static) -> Self {
        self.init = Some(Rc::new(f));
        self
    }

    pub fn on_create(mut self, f: impl Fn(&VNode<N>, &VNode<N>) + 'static) -> Self {
        self.create = Some(Rc::new(f));
        self
    }

    pub fn on_insert(mut self, f: impl Fn(&VNode<N>) + 'static) -> Self {
        self.insert = Some(Rc::new(f));
        self
    }

    pub fn on_prepatch(mut self, f: impl Fn(&VNode<N>, &VNode<N>) + 'static) -> Self {
        self.prepatch = Some(Rc::new(f));
        self
    }

    pub fn on_update(mut self, f: impl Fn(&VNode<N>, &VNode<N>) + 'static) -> Self {
        self.update = Some(Rc::new(f));
        self
    }

    pub fn on_postpatch(mut self, f: impl Fn(&VNode<N>, &VNode<N>) + 'static) -> Self {
        self.postpatch = Some(Rc::new(f));
        self
    }

    pub fn on_destroy(mut self, f: impl Fn(&VNode<N>) + 'static) -> Self {
        self.destroy = Some(Rc::new(f));
        self
    }

    pub fn on_remove(mut self, f: impl Fn(&VNode<N>, RemoveCallback) + 'static) -> Self {
        self.remove = Some(Rc::new(f));
        self
    }

    pub fn is_empty(&self) -> bool {
        self.init.is_none()
            && self.create.is_none()
            && self.insert.is_none()
            && self.prepatch.is_none()
            && self.update.is_none()
            && self.postpatch.is_none()
            && self.destroy.is_none()
            && self.remove.is_none()
    }
}

impl<N> Default for NodeHooks<N> {
    fn default() -> Self {
        Self::new()
    }
}

impl<N> Clone for NodeHooks<N> {
    fn clone(&self) -> Self {
        Self {
            init: self.init.clone(),
            create: self.create.clone(),
            insert: self.insert.clone(),
            prepatch: self.prepatch.clone(),
            update: self.update.clone(),
            postpatch: self.postpatch.clone(),
            destroy: self.destroy.clone(),
            remove: self.remove.clone(),
        }
    }
}

impl<N> fmt::Debug for NodeHooks<N> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NodeHooks")
            .field("init", &self.init.is_some())
            .field("create", &self.create.is_some())
            .field("insert", &self.insert.is_some())
            .field("prepatch", &self.prepatch.is_some())
            .field("update", &self.update.is_some())
            .field("postpatch", &self.postpatch.is_some())
            .field("destroy", &self.destroy.is_some())
            .field("remove", &self.remove.is_some())
            .finish()
    }
}

/// A module: a named bundle of optional global hooks applied to every element.
pub struct Module<N> {
    name: &'static str,
    pre: Option<PassHook>,
    create: Option<CreateHook<N>>,
    update: Option<PatchHook<N>>,
    destroy: Option<NodeHook<N>>,
    remove: Option<RemoveHook<N>>,
    post: Option<PassHook>,
}

impl<N> Module<N> {
    pub fn new(name: &'static str) -> Self {
        Self {
            name,
            pre: None,
            create: None,
            update: None,
            destroy: None,
            remove: None,
            post: None,
        }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn on_pre(mut self, f: impl Fn() + 'static) -> Self {
        self.pre = Some(Rc::new(f));
        self
    }

    pub fn on_create(mut self, f: impl Fn(&VNode<N>, &VNode<N>) + 'static) -> Self {
        self.create = Some(Rc::new(f));
        self
    }

    pub fn on_update(mut self, f: impl Fn(&VNode<N>, &VNode<N>) + 'static) -> Self {
        self.update = Some(Rc::new(f));
        self
    }

    pub fn on_destroy(mut self, f: impl Fn(&VNode<N>) + 'static) -> Self {
        self.destroy = Some(Rc::new(f));
        self
    }

    pub fn on_remove(mut self, f: impl Fn(&VNode<N>, RemoveCallback) + 'static) -> Self {
        self.remove = Some(Rc::new(f));
        self
    }

    pub fn on_post(mut self, f: impl Fn() + 'static) -> Self {
        self.post = Some(Rc::new(f));
        self
    }
}

impl<N> fmt::Debug for Module<N> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Module").field("name", &self.name).finish_non_exhaustive()
    }
}

/// Per-hook call lists, built once from an ordered module list.
///
/// Each list keeps module order and only contains modules that define that hook.
pub struct HookRegistry<N> {
    pub(crate) pre: Vec<PassHook>,
    pub(crate) create: Vec<CreateHook<N>>,
    pub(crate) update: Vec<PatchHook<N>>,
    pub(crate) destroy: Vec<NodeHook<N>>,
    pub(crate) remove: Vec<RemoveHook<N>>,
    pub(crate) post: Vec<PassHook>,
}

impl<N> HookRegistry<N> {
    pub fn new(modules: impl IntoIterator<Item = Module<N>>) -> Self {
        let mut registry = Self {
            pre: Vec::new(),
            create: Vec::new(),
            update: Vec::new(),
            destroy: Vec::new(),
            remove: Vec::new(),
            post: Vec::new(),
        };
        for module in modules {
            tracing::trace!(module = module.name(), "registering module");
            registry.pre.extend(module.pre);
            registry.create.extend(module.create);
            registry.update.extend(module.update);
            registry.destroy.extend(module.destroy);
            registry.remove.extend(module.remove);
            registry.post.extend(module.post);
        }
        registry
    }

    /// Number of modules listening for `remove`; seeds each removal countdown.
    pub fn remove_listeners(&self) -> usize {
        self.remove.len()
    }
}

impl<N> fmt::Debug for HookRegistry<N> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HookRegistry")
            .field("pre", &self.pre.len())
            .field("create", &self.create.len())
            .field("update", &self.update.len())
            .field("destroy", &self.destroy.len())
            .field("remove", &self.remove.len())
            .field("post", &self.post.len())
            .finish()
    }
}
