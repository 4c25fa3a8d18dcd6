//! The native hook engine, consumed as an external capability.
//!
//! The engine redirects execution of a member and, on every call, runs the
//! attached callbacks around the original body. Snare never patches code
//! itself; the dispatch bridge adapts author callbacks into the
//! [`NativeCallback`] shape defined here.
//!
//! # Execution contract
//!
//! For one invocation with callbacks ordered by descending priority (ties
//! in attach order):
//!
//! 1. `before` runs for each callback until one forces a result
//!    ([`CallFrame::is_returned_early`]).
//! 2. The original body runs unless a result was forced.
//! 3. `after` runs for every callback, in the same order.

use crate::{error::AttachError, frame::CallFrame, member::ResolvedMember};
use std::sync::Arc;

/// Engine-assigned identifier of one attached callback.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NativeHandle(pub u64);

/// The callback shape the engine invokes.
pub trait NativeCallback: Send + Sync + 'static {
    /// Called before the original body.
    fn before(&self, frame: &mut CallFrame);

    /// Called after the original body or a forced result.
    fn after(&self, frame: &mut CallFrame);
}

/// An engine able to intercept members.
#[diagnostic::on_unimplemented(
    message = "`{Self}` is not a native hook engine",
    label = "missing `NativeHookEngine` implementation",
    note = "Implement `attach` and `detach` to let the bridge hook members through `{Self}`."
)]
pub trait NativeHookEngine: Send + Sync + 'static {
    /// Intercept calls to `member`, invoking `callback` at `priority`.
    fn attach(
        &self,
        member: &ResolvedMember,
        priority: i32,
        callback: Arc<dyn NativeCallback>,
    ) -> Result<NativeHandle, AttachError>;

    /// Remove a callback. Unknown handles are ignored.
    fn detach(&self, handle: NativeHandle);

    /// Engine name reported to status checks.
    fn name(&self) -> &str {
        "unknown"
    }

    /// Engine version reported to status checks, `-1` when unknown.
    fn version(&self) -> i32 {
        -1
    }
}
