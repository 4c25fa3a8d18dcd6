//! Failure records for faults that must not unwind into the host.

use crate::{
    error::{AttachError, HookError},
    member::ResolvedMember,
};
use std::fmt;

/// Where a failure happened.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Stage {
    /// The author load callback.
    Load,
    /// Attaching a callback through the engine.
    Attach,
    /// A Before callback.
    Before,
    /// An After callback.
    After,
    /// A Replace callback.
    Replace,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Stage::Load => "load",
            Stage::Attach => "attach",
            Stage::Before => "before",
            Stage::After => "after",
            Stage::Replace => "replace",
        })
    }
}

/// What went wrong.
#[derive(Debug)]
pub enum FailureCause {
    /// The engine refused to attach.
    Attach(AttachError),
    /// A callback failed or panicked.
    Callback(HookError),
}

impl fmt::Display for FailureCause {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FailureCause::Attach(e) => e.fmt(f),
            FailureCause::Callback(e) => e.fmt(f),
        }
    }
}

/// A caught failure with enough context to be logged.
#[derive(Debug)]
pub struct HookFailure {
    /// Stage that failed.
    pub stage: Stage,
    /// The member involved, if any.
    pub member: Option<ResolvedMember>,
    /// The process identity involved, if known.
    pub identity: Option<String>,
    /// Underlying error.
    pub cause: FailureCause,
}

impl fmt::Display for HookFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} failed", self.stage)?;
        if let Some(member) = &self.member {
            write!(f, " for {member}")?;
        }
        if let Some(identity) = &self.identity {
            write!(f, " in {identity}")?;
        }
        write!(f, ": {}", self.cause)
    }
}

/// Receives failures caught at the adaptation boundary.
pub trait FailureReporter: Send + Sync + 'static {
    /// Record a failure. Must not panic.
    fn report(&self, failure: HookFailure);
}
