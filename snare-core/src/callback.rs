//! Author hook callbacks.
//!
//! A callback is one tagged variant carrying its priority:
//!
//! - [`HookMode::Before`] runs before the original body, highest priority
//!   first, and may rewrite arguments or force a result.
//! - [`HookMode::After`] runs after the original (or forced) result,
//!   highest priority first, and may overwrite it.
//! - [`HookMode::Replace`] substitutes the original body. At most one
//!   Replace callback runs per invocation: the highest priority one, ties
//!   going to the earliest registration.

use crate::{
    error::BoxError,
    frame::{CallFrame, Value},
};
use std::{fmt, sync::Arc};

/// Hook priorities. Higher values are observed first.
pub struct Priority;

impl Priority {
    /// Default priority.
    pub const DEFAULT: i32 = 50;
    /// Observe as late as possible.
    pub const LOWEST: i32 = -10000;
    /// Observe as early as possible.
    pub const HIGHEST: i32 = 10000;
}

/// Callback run before or after the original body.
pub type FrameFn = Arc<dyn Fn(&mut CallFrame) -> Result<(), BoxError> + Send + Sync>;

/// Callback producing a replacement result.
pub type ReplaceFn = Arc<dyn Fn(&mut CallFrame) -> Result<Value, BoxError> + Send + Sync>;

/// What a callback does and when it runs.
#[derive(Clone)]
pub enum HookMode {
    /// Runs before the original body.
    Before(FrameFn),
    /// Runs after the original body.
    After(FrameFn),
    /// Replaces the original body.
    Replace(ReplaceFn),
}

impl HookMode {
    /// Short stage label used in logs.
    pub fn label(&self) -> &'static str {
        match self {
            HookMode::Before(_) => "before",
            HookMode::After(_) => "after",
            HookMode::Replace(_) => "replace",
        }
    }
}

impl fmt::Debug for HookMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// A prioritized author callback.
#[derive(Clone, Debug)]
pub struct HookCallback {
    priority: i32,
    mode: HookMode,
}

impl HookCallback {
    /// Run `f` before the original body.
    pub fn before(
        f: impl Fn(&mut CallFrame) -> Result<(), BoxError> + Send + Sync + 'static,
    ) -> Self {
        Self::new(HookMode::Before(Arc::new(f)))
    }

    /// Run `f` after the original body.
    pub fn after(
        f: impl Fn(&mut CallFrame) -> Result<(), BoxError> + Send + Sync + 'static,
    ) -> Self {
        Self::new(HookMode::After(Arc::new(f)))
    }

    /// Replace the original body with `f`.
    pub fn replace(
        f: impl Fn(&mut CallFrame) -> Result<Value, BoxError> + Send + Sync + 'static,
    ) -> Self {
        Self::new(HookMode::Replace(Arc::new(f)))
    }

    /// Replace the original body with a constant result.
    pub fn replace_with(value: impl Into<Value>) -> Self {
        let value = value.into();
        Self::replace(move |_| Ok(value.clone()))
    }

    fn new(mode: HookMode) -> Self {
        Self {
            priority: Priority::DEFAULT,
            mode,
        }
    }

    /// Set the priority.
    pub fn with_priority(mut self, priority: i32) -> Self {
        self.priority = priority;
        self
    }

    /// Priority of this callback.
    pub fn priority(&self) -> i32 {
        self.priority
    }

    /// Mode of this callback.
    pub fn mode(&self) -> &HookMode {
        &self.mode
    }
}
