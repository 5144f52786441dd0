use crate::error::Result;
use crate::patch::Pass;
use crate::selector;
use crate::traits::Backend;
use crate::vnode::{Content, Element, VNode, VNodeKind};

impl<B: Backend + 'static> Pass<'_, B> {
    /// Materialize `vnode` and its subtree, returning the new (still detached) native node.
    pub(crate) fn create_elm(&mut self, vnode: &VNode<B::Node>, depth: usize) -> Result<B::Node> {
        self.enter(depth)?;
        if let Some(init) = vnode.hooks().and_then(|h| h.init.as_ref()) {
            if let Some(substitute) = init(vnode) {
                vnode.set_redirect(substitute);
            }
        }

        if let Some(target) = vnode.redirect() {
            let elm = self.create_elm(&target, depth + 1)?;
            vnode.bind(elm.clone())?;
            return Ok(elm);
        }

        match vnode.kind() {
            VNodeKind::Text(text) => {
                let elm = self.backend.create_text_node(text);
                vnode.bind(elm.clone())?;
                Ok(elm)
            }
            VNodeKind::Element(el) => self.create_element(vnode, el, depth),
        }
    }

    fn create_element(
        &mut self,
        vnode: &VNode<B::Node>,
        el: &Element<B::Node>,
        depth: usize,
    ) -> Result<B::Node> {
        let sel = selector::parse(&el.sel);
        let elm = match &el.data.ns {
            Some(ns) => self.backend.create_element_ns(ns, sel.tag),
            None => self.backend.create_element(sel.tag),
        };
        vnode.bind(elm.clone())?;
        if let Some(id) = sel.id {
            self.backend.set_id(&elm, id);
        }
        if !sel.classes.is_empty() {
            self.backend.set_class_list(&elm, &sel.classes);
        }

        // Queued before descending so insert hooks later fire parents first.
        if el.data.hook.insert.is_some() {
            self.inserted.push(vnode.clone());
        }

        match &el.content {
            Content::Children(children) => {
                for child in children.iter() {
                    let child_elm = self.create_elm(child, depth + 1)?;
                    self.backend.append_child(&elm, &child_elm);
                }
            }
            Content::Text(text) => {
                let text_elm = self.backend.create_text_node(text);
                self.backend.append_child(&elm, &text_elm);
            }
            Content::Empty => {}
        }

        for create in &self.hooks.create {
            create(self.placeholder, vnode);
        }
        if let Some(create) = &el.data.hook.create {
            create(self.placeholder, vnode);
        }
        Ok(elm)
    }

    /// Materialize `vnodes` and insert each before `before` (or at the end of `parent`).
    pub(crate) fn add_vnodes(
        &mut self,
        parent: &B::Node,
        before: Option<&B::Node>,
        vnodes: &[VNode<B::Node>],
        depth: usize,
    ) -> Result<()> {
        for vnode in vnodes {
            let elm = self.create_elm(vnode, depth)?;
            tracing::trace!(node = %vnode.describe(), "inserting new node");
            self.backend.insert_before(parent, &elm, before);
        }
        Ok(())
    }
}
