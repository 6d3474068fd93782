#![forbid(unsafe_code)]

mod changeset;
mod collection;
mod hooks;
mod store;

pub use changeset::Changeset;
pub use collection::{CommitReceipt, VersionedGraphCollection};
pub use hooks::{CommitContext, Hook, HookError, HookPhase, HookRegistry, HookResult};
pub use store::*;
