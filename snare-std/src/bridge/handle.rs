//! Handles to attached hooks.

use snare_core::{NativeHandle, NativeHookEngine, ResolvedMember};
use std::{
    fmt,
    sync::{
        Arc,
        atomic::{AtomicBool, Ordering},
    },
};

/// One callback attached to one member.
///
/// Clones share state: unhooking through any clone detaches the callback
/// once.
#[derive(Clone)]
pub struct HookHandle {
    member: ResolvedMember,
    native: NativeHandle,
    engine: Arc<dyn NativeHookEngine>,
    active: Arc<AtomicBool>,
}

impl HookHandle {
    pub(crate) fn new(
        member: ResolvedMember,
        native: NativeHandle,
        engine: Arc<dyn NativeHookEngine>,
    ) -> Self {
        Self {
            member,
            native,
            engine,
            active: Arc::new(AtomicBool::new(true)),
        }
    }

    /// The hooked member.
    pub fn member(&self) -> &ResolvedMember {
        &self.member
    }

    /// Engine-assigned handle.
    pub fn native(&self) -> NativeHandle {
        self.native
    }

    /// Whether the callback is still attached.
    pub fn is_active(&self) -> bool {
        self.active.load(Ordering::Acquire)
    }

    /// Detach the callback. Returns `false` if it was already detached.
    pub fn unhook(&self) -> bool {
        if self.active.swap(false, Ordering::AcqRel) {
            self.engine.detach(self.native);
            tracing::debug!(member = %self.member, handle = self.native.0, "unhooked");
            true
        } else {
            false
        }
    }
}

impl fmt::Debug for HookHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HookHandle")
            .field("member", &self.member.to_string())
            .field("native", &self.native)
            .field("active", &self.is_active())
            .finish()
    }
}

/// Handles produced by a batch hooking operation.
///
/// Members the engine refused are absent.
#[derive(Debug, Clone, Default)]
pub struct HookSet {
    handles: Vec<HookHandle>,
}

impl HookSet {
    /// Number of attached callbacks.
    pub fn len(&self) -> usize {
        self.handles.len()
    }

    /// Whether nothing was attached.
    pub fn is_empty(&self) -> bool {
        self.handles.is_empty()
    }

    /// Iterate over the handles.
    pub fn iter(&self) -> std::slice::Iter<'_, HookHandle> {
        self.handles.iter()
    }

    /// The hooked members, in attach order.
    pub fn members(&self) -> Vec<&ResolvedMember> {
        self.handles.iter().map(HookHandle::member).collect()
    }

    /// Detach every callback, returning how many were still attached.
    pub fn unhook_all(&self) -> usize {
        self.handles.iter().filter(|h| h.unhook()).count()
    }
}

impl FromIterator<HookHandle> for HookSet {
    fn from_iter<I: IntoIterator<Item = HookHandle>>(iter: I) -> Self {
        Self {
            handles: iter.into_iter().collect(),
        }
    }
}

impl IntoIterator for HookSet {
    type Item = HookHandle;
    type IntoIter = std::vec::IntoIter<HookHandle>;

    fn into_iter(self) -> Self::IntoIter {
        self.handles.into_iter()
    }
}

impl<'a> IntoIterator for &'a HookSet {
    type Item = &'a HookHandle;
    type IntoIter = std::slice::Iter<'a, HookHandle>;

    fn into_iter(self) -> Self::IntoIter {
        self.handles.iter()
    }
}
