use std::collections::HashMap;

use crate::error::Result;
use crate::key::Key;
use crate::patch::{native, Pass};
use crate::traits::Backend;
use crate::vnode::VNode;

/// Key -> index for the keyed entries of `old[start..end]`.
fn key_index<N>(old: &[VNode<N>], start: usize, end: usize) -> HashMap<&Key, usize> {
    old[start..end]
        .iter()
        .enumerate()
        .filter_map(|(offset, vnode)| vnode.key().map(|key| (key, start + offset)))
        .collect()
}

impl<B: Backend + 'static> Pass<'_, B> {
    /// Keyed, order-preserving reconciliation of two child lists under `parent`.
    ///
    /// Cursors are half-open: `old[old_start..old_end]` and `new[new_start..new_end]` are the
    /// ranges still to be matched. Old slots relocated through the key index are marked in
    /// `consumed` instead of being removed from the list.
    pub(crate) fn update_children(
        &mut self,
        parent: &B::Node,
        old: &[VNode<B::Node>],
        new: &[VNode<B::Node>],
        depth: usize,
    ) -> Result<()> {
        let mut consumed = vec![false; old.len()];
        let (mut old_start, mut old_end) = (0, old.len());
        let (mut new_start, mut new_end) = (0, new.len());
        let mut keyed: Option<HashMap<&Key, usize>> = None;

        while old_start < old_end && new_start < new_end {
            if consumed[old_start] {
                old_start += 1;
            } else if consumed[old_end - 1] {
                old_end -= 1;
            } else if old[old_start].same_node(&new[new_start]) {
                self.patch_vnode(&old[old_start], &new[new_start], depth)?;
                old_start += 1;
                new_start += 1;
            } else if old[old_end - 1].same_node(&new[new_end - 1]) {
                self.patch_vnode(&old[old_end - 1], &new[new_end - 1], depth)?;
                old_end -= 1;
                new_end -= 1;
            } else if old[old_start].same_node(&new[new_end - 1]) {
                // Moved right: goes after the current old end.
                let moved = &old[old_start];
                self.patch_vnode(moved, &new[new_end - 1], depth)?;
                let elm = native(moved)?;
                let after = self.backend.next_sibling(&native(&old[old_end - 1])?);
                tracing::trace!(node = %moved.describe(), "moving node right");
                self.backend.insert_before(parent, &elm, after.as_ref());
                old_start += 1;
                new_end -= 1;
            } else if old[old_end - 1].same_node(&new[new_start]) {
                // Moved left: goes before the current old start.
                let moved = &old[old_end - 1];
                self.patch_vnode(moved, &new[new_start], depth)?;
                let elm = native(moved)?;
                let before = native(&old[old_start])?;
                tracing::trace!(node = %moved.describe(), "moving node left");
                self.backend.insert_before(parent, &elm, Some(&before));
                old_end -= 1;
                new_start += 1;
            } else {
                let index = keyed.get_or_insert_with(|| key_index(old, old_start, old_end));
                let candidate = new[new_start].key().and_then(|key| index.get(key)).copied();
                let before = native(&old[old_start])?;
                match candidate {
                    Some(idx)
                        if (old_start..old_end).contains(&idx)
                            && !consumed[idx]
                            && old[idx].sel() == new[new_start].sel() =>
                    {
                        let moved = &old[idx];
                        self.patch_vnode(moved, &new[new_start], depth)?;
                        consumed[idx] = true;
                        let elm = native(moved)?;
                        tracing::trace!(node = %moved.describe(), "moving keyed node");
                        self.backend.insert_before(parent, &elm, Some(&before));
                    }
                    candidate => {
                        if let Some(idx) = candidate {
                            if consumed[idx] || !(old_start..old_end).contains(&idx) {
                                tracing::warn!(
                                    node = %new[new_start].describe(),
                                    "key already matched in this list; materializing a new node"
                                );
                            }
                        }
                        let elm = self.create_elm(&new[new_start], depth)?;
                        tracing::trace!(node = %new[new_start].describe(), "inserting new node");
                        self.backend.insert_before(parent, &elm, Some(&before));
                    }
                }
                new_start += 1;
            }
        }

        if old_start >= old_end {
            let before = match new.get(new_end) {
                Some(anchor) => Some(native(anchor)?),
                None => None,
            };
            self.add_vnodes(parent, before.as_ref(), &new[new_start..new_end], depth)?;
        } else if new_start >= new_end {
            let remaining = old[old_start..old_end]
                .iter()
                .zip(&consumed[old_start..old_end])
                .filter(|(_, consumed)| !**consumed)
                .map(|(vnode, _)| vnode);
            self.remove_vnodes(remaining);
        }
        Ok(())
    }
}
