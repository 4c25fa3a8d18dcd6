//! # snare-core
//!
//! Core types for the Snare member hooking framework.
//!
//! This crate has minimal dependencies and holds everything that does not
//! need process-wide state: the data model, the type matcher, member rules
//! and the resolution engine, plus the traits through which Snare talks to
//! its collaborators.
//!
//! # Layers
//!
//! ## Type Matcher ([`TypeSpec`], [`matches`])
//!
//! Compares a concrete type with a specification that may be exact, a name
//! to resolve, or a wildcard ([`TypeSpec::Vague`]).
//!
//! ## Rules ([`ConstructorRules`], [`MethodRules`], [`FieldRules`])
//!
//! Fluent builders over [`RuleData`]. Validation happens once, at
//! [`build`](RuleBuilder::build); the resulting [`MemberRules`] is
//! immutable and reusable across types and scopes.
//!
//! ## Resolution ([`MemberResolver`])
//!
//! Plans a rule against a [`ClassScope`] and scans declared members,
//! optionally walking superclasses, producing a [`MatchResult`].
//!
//! ## Collaborators
//!
//! - [`ClassScope`] - the reflective type system of the target process
//! - [`NativeHookEngine`] / [`NativeCallback`] - the interception engine
//! - [`FailureReporter`] - where caught callback and attach faults go
//!
//! # Error Types
//!
//! - [`SnareError`] - Top-level error type
//! - [`ConfigError`] - Self-contradictory rules
//! - [`ResolveError`] - A result rejected by [`MatchResult::single`]
//! - [`AttachError`] / [`HookError`] - Runtime faults

#![deny(clippy::wildcard_imports)]
#![warn(missing_docs)]

mod callback;
mod engine;
mod error;
mod frame;
mod member;
mod report;
mod resolve;
mod rules;
mod scope;
mod types;

// Re-exports
pub use callback::{FrameFn, HookCallback, HookMode, Priority, ReplaceFn};
pub use engine::{NativeCallback, NativeHandle, NativeHookEngine};
pub use error::{AttachError, BoxError, ConfigError, HookError, ResolveError, SnareError};
pub use frame::{CallFrame, FrameSnapshot, ObjectRef, Value};
pub use member::{MemberId, MemberKind, Modifiers, ResolvedMember};
pub use report::{FailureCause, FailureReporter, HookFailure, Stage};
pub use resolve::{MatchResult, MemberResolver, QueryMode};
pub use rules::{
    ConstructorRules, CountPredicate, CountSpec, FieldRules, MemberRules, MethodRules,
    ModifierPredicate, NamePredicate, NameSpec, ParamSpec, RuleBuilder, RuleData, TypesPredicate,
};
pub use scope::{ClassScope, SharedScope};
pub use types::{TypeRef, TypeSpec, matches};
