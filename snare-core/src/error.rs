//! Error types for Snare.
//!
//! This module provides a structured error hierarchy using `thiserror`:
//!
//! - [`SnareError`] - Top-level error type for all Snare operations
//! - [`ConfigError`] - Self-contradictory member rules, raised at build time
//! - [`ResolveError`] - A resolution result that the caller required to be unique
//! - [`AttachError`] - The native engine refused to attach a callback
//! - [`HookError`] - Failures raised by author callbacks
//!
//! "Nothing matched" is not an error: the resolution engine reports it as
//! [`MatchResult::NotFound`](crate::MatchResult::NotFound). [`ResolveError`]
//! only appears when a caller explicitly asks for a single member.

use crate::member::MemberKind;
use thiserror::Error;

/// A boxed error type for dynamic error handling.
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Top-level error type for all Snare operations.
#[derive(Error, Debug)]
pub enum SnareError {
    /// A member rule could not be built.
    #[error("rule configuration error: {0}")]
    Config(#[from] ConfigError),

    /// A resolution did not yield the expected member(s).
    #[error("resolution error: {0}")]
    Resolve(#[from] ResolveError),

    /// A hook could not be attached.
    #[error("attach error: {0}")]
    Attach(#[from] AttachError),

    /// An author callback failed.
    #[error("hook error: {0}")]
    Hook(#[from] HookError),

    /// A custom error occurred.
    #[error(transparent)]
    Custom(BoxError),
}

/// A member rule that no candidate could ever satisfy.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    /// `param()` was called with an empty list.
    #[error("parameter type list is empty, use empty_param() for members without parameters")]
    EmptyParamList,

    /// A parameter count range whose lower bound exceeds the upper bound.
    #[error("parameter count range {lo}..={hi} is inverted")]
    InvertedRange {
        /// Lower bound.
        lo: usize,
        /// Upper bound.
        hi: usize,
    },

    /// A criterion was supplied for a member kind it does not apply to.
    #[error("{criterion} does not apply to {kind} rules")]
    CriterionNotApplicable {
        /// The kind of the rule being built.
        kind: MemberKind,
        /// Human readable criterion name.
        criterion: &'static str,
    },
}

/// A resolution result rejected by a caller that required a specific shape.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ResolveError {
    /// No candidate satisfied the rule.
    #[error("no {kind} matching the rule was found in {target}")]
    NotFound {
        /// Requested member kind.
        kind: MemberKind,
        /// Type the query started from.
        target: String,
    },

    /// More than one candidate satisfied a rule that required exactly one.
    #[error("{count} members of {target} match the rule, expected exactly one")]
    Ambiguous {
        /// Type the query started from.
        target: String,
        /// Number of matching candidates.
        count: usize,
    },
}

/// The native hook engine refused an attach or detach request.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AttachError {
    /// The engine refused to intercept the member.
    #[error("engine refused to hook {member}: {reason}")]
    Refused {
        /// Descriptor of the member.
        member: String,
        /// Reason reported by the engine.
        reason: String,
    },

    /// The member cannot be intercepted at all (abstract, removed, ...).
    #[error("{member} cannot be hooked")]
    Unhookable {
        /// Descriptor of the member.
        member: String,
    },
}

/// Errors raised by author hook callbacks.
#[derive(Error, Debug)]
pub enum HookError {
    /// The callback panicked during execution.
    #[error("callback panicked: {0}")]
    Panic(String),

    /// The callback returned an error.
    #[error(transparent)]
    Custom(BoxError),
}

impl HookError {
    /// Build a [`HookError::Panic`] from a caught panic payload.
    pub fn from_panic(payload: Box<dyn std::any::Any + Send>) -> Self {
        let message = if let Some(s) = payload.downcast_ref::<&str>() {
            (*s).to_string()
        } else if let Some(s) = payload.downcast_ref::<String>() {
            s.clone()
        } else {
            "non-string panic payload".to_string()
        };
        HookError::Panic(message)
    }
}

// Convenience conversions
impl From<BoxError> for SnareError {
    fn from(err: BoxError) -> Self {
        SnareError::Custom(err)
    }
}

impl From<BoxError> for HookError {
    fn from(err: BoxError) -> Self {
        HookError::Custom(err)
    }
}
