#![forbid(unsafe_code)]
//! Core of a keyed tree reconciler: diff a previous tree description against the next one and
//! apply the minimal structural mutations to a materialized tree, calling lifecycle hooks along
//! the way. The crate never touches a concrete tree itself; it sequences calls against any host
//! that implements [`Backend`].

mod children;
mod create;
mod remove;

pub mod config;
pub mod error;
pub mod hooks;
pub mod key;
pub mod modules;
pub mod patch;
pub mod selector;
pub mod thunk;
pub mod traits;
pub mod vnode;

pub use config::{PatchConfig, DEFAULT_MAX_DEPTH};
pub use error::{Error, Result};
pub use hooks::{HookRegistry, Module, NodeHooks, RemoveCallback};
pub use key::Key;
pub use patch::{Patcher, Root};
pub use thunk::thunk;
pub use traits::{Backend, MemoryDocument, MemoryNodeExport, MemoryNodeId, MutationStats};
pub use vnode::{Children, Content, Element, ElementBuilder, NodeData, VNode, VNodeKind};
