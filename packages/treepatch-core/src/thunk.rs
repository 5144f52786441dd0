use std::rc::Rc;

use crate::hooks::NodeHooks;
use crate::key::Key;
use crate::vnode::VNode;

struct ThunkState<N, A> {
    args: A,
    render: Rc<dyn Fn(&A) -> VNode<N>>,
}

fn thunk_state<N: 'static, A: 'static>(vnode: &VNode<N>) -> Option<Rc<ThunkState<N, A>>> {
    let payload = vnode.data()?.payload.as_ref()?;
    Rc::clone(payload).downcast::<ThunkState<N, A>>().ok()
}

/// A memoised subtree: `render(&args)` only runs again when `args` changed since the last pass.
///
/// The returned node is a placeholder whose `init`/`prepatch` hooks install the rendered tree as
/// its redirect. `render` must return an element whose selector is `sel`, so the placeholder
/// and the rendered tree agree on identity.
pub fn thunk<N, A, F>(sel: impl Into<String>, key: Option<Key>, render: F, args: A) -> VNode<N>
where
    N: 'static,
    A: PartialEq + 'static,
    F: Fn(&A) -> VNode<N> + 'static,
{
    let sel = sel.into();
    let state = Rc::new(ThunkState {
        args,
        render: Rc::new(render),
    });

    let hooks = NodeHooks::new()
        .on_init({
            let state = Rc::clone(&state);
            move |_| Some((state.render)(&state.args))
        })
        .on_prepatch({
            let state = Rc::clone(&state);
            let sel = sel.clone();
            move |old, new| {
                let unchanged = thunk_state::<N, A>(old).is_some_and(|prev| prev.args == state.args);
                let inner = match old.redirect() {
                    Some(previous) if unchanged => previous,
                    _ => (state.render)(&state.args),
                };
                if inner.sel() != Some(sel.as_str()) {
                    tracing::warn!(expected = %sel, "thunk rendered a node with a different selector");
                }
                new.set_redirect(inner);
            }
        });

    let mut builder = VNode::element(sel).hooks(hooks).payload(state);
    if let Some(key) = key {
        builder = builder.key(key);
    }
    builder.build()
}
