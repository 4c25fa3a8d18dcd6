//! # snare - Member Hooking Framework
//!
//! `snare` lets a module author describe constructors, methods and fields
//! of a target process by declarative rules, resolve them against the
//! process's reflective type system, and attach Before/After/Replace
//! callbacks through a native interception engine.
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use snare::prelude::*;
//!
//! let bridge = HookBridge::install(HookBridge::new(engine));
//! bridge.on_load(|param| {
//!     let Some(foo) = param.find_type("com.example.Foo") else {
//!         return Ok(());
//!     };
//!     let rules = MethodRules::new().name("greet").param(["java.lang.String"]).build()?;
//!     let greet = param.resolve(&foo, &rules, QueryMode::First, true);
//!     param.hook_resolved(greet, HookCallback::before(|frame| {
//!         frame.set_arg(0, "hooked");
//!         Ok(())
//!     }));
//!     Ok(())
//! });
//! ```

#![deny(clippy::wildcard_imports)]
#![warn(missing_docs)]

pub use snare_core::{
    // Errors
    AttachError,
    BoxError,
    // Frames
    CallFrame,
    // Collaborators
    ClassScope,
    ConfigError,
    // Rules
    ConstructorRules,
    CountPredicate,
    CountSpec,
    FailureCause,
    FailureReporter,
    FieldRules,
    FrameFn,
    FrameSnapshot,
    // Callbacks
    HookCallback,
    HookError,
    HookFailure,
    HookMode,
    // Resolution
    MatchResult,
    // Members
    MemberId,
    MemberKind,
    MemberResolver,
    MemberRules,
    MethodRules,
    ModifierPredicate,
    Modifiers,
    NamePredicate,
    NameSpec,
    NativeCallback,
    NativeHandle,
    NativeHookEngine,
    ObjectRef,
    ParamSpec,
    Priority,
    QueryMode,
    ReplaceFn,
    ResolveError,
    ResolvedMember,
    RuleBuilder,
    RuleData,
    SharedScope,
    SnareError,
    Stage,
    // Types
    TypeRef,
    TypeSpec,
    TypesPredicate,
    Value,
    matches,
};

// Bridge
pub use snare_std::bridge::{
    AppInfo, BridgeConfig, ContextRegistry, DispatchOutcome, FRAMEWORK_IDENTITY, HookBridge,
    HookHandle, HookSet, LoadCallback, LoadDeduplicator, LoadKind, LoadNotification, LoadParam,
    ProcessContext, ResourceHandle, StatusMethods,
};

/// Failure reporting.
pub mod reporting {
    pub use snare_std::reporting::TracingReporter;
}

/// Testing utilities.
pub mod testing {
    #![allow(clippy::wildcard_imports)]
    pub use snare_std::testing::*;
}

/// Prelude module - common imports for Snare.
///
/// # Usage
///
/// ```rust,ignore
/// use snare::prelude::*;
/// ```
pub mod prelude {
    pub use crate::{
        // Errors
        BoxError,
        // Bridge
        BridgeConfig,
        CallFrame,
        ClassScope,
        // Rules
        ConstructorRules,
        FieldRules,
        // Callbacks
        HookBridge,
        HookCallback,
        HookSet,
        LoadKind,
        LoadNotification,
        LoadParam,
        MatchResult,
        MethodRules,
        Modifiers,
        Priority,
        QueryMode,
        SnareError,
        TypeRef,
        TypeSpec,
        Value,
    };
}
