//! # Hook Dispatch Bridge
//!
//! Sits between the host's load notifications, the author's entry
//! callback and the native hook engine.
//!
//! On every notification the bridge:
//!
//! 1. normalises the identity (no identity means the host's own base scope,
//!    mapped to [`BridgeConfig::framework_identity`]),
//! 2. drops identities listed in [`BridgeConfig::ignored_identities`],
//! 3. records the (identity, kind) pair in the [`LoadDeduplicator`],
//! 4. creates or updates the [`ProcessContext`] of the identity,
//! 5. on the first occurrence of the pair only, runs the author callback
//!    synchronously with a [`LoadParam`].
//!
//! Inside the callback the author resolves members with
//! [`MemberRules`] and attaches [`HookCallback`]s, which the bridge
//! adapts into the engine's [`NativeCallback`](snare_core::NativeCallback)
//! shape.
//!
//! ```rust,ignore
//! let bridge = HookBridge::new(engine);
//! bridge.on_load(|param| {
//!     let activity = param.find_type("android.app.Activity").ok_or("no activity")?;
//!     param.hook_all_named(&activity, "onResume", HookCallback::after(|frame| {
//!         tracing::info!(member = %frame.member(), "resumed");
//!         Ok(())
//!     }));
//!     Ok(())
//! });
//! bridge.dispatch(LoadNotification::package("app.example").with_scope(scope));
//! ```

mod adapter;
mod context;
mod dedup;
mod handle;
mod status;

pub use context::{
    AppInfo, ContextRegistry, LoadKind, LoadNotification, ProcessContext, ResourceHandle,
};
pub use dedup::LoadDeduplicator;
pub use handle::{HookHandle, HookSet};
pub use status::StatusMethods;

use crate::reporting::TracingReporter;
use adapter::CallbackAdapter;
use parking_lot::RwLock;
use snare_core::{
    BoxError, ClassScope, FailureCause, FailureReporter, HookCallback, HookError, HookFailure,
    MatchResult, MemberKind, MemberRules, NativeHookEngine, QueryMode, ResolveError,
    ResolvedMember, SharedScope, Stage, TypeRef,
};
use std::{
    fmt,
    panic::{self, AssertUnwindSafe},
    sync::{
        Arc, OnceLock,
        atomic::{AtomicBool, Ordering},
    },
};

/// Identity used for notifications from the host's base scope.
pub const FRAMEWORK_IDENTITY: &str = "android";

/// The author's entry callback.
pub type LoadCallback = Arc<dyn Fn(&LoadParam<'_>) -> Result<(), BoxError> + Send + Sync>;

/// Bridge settings.
#[derive(Clone)]
pub struct BridgeConfig {
    /// Identity substituted for notifications without one.
    pub framework_identity: String,
    /// Identities whose notifications are dropped.
    pub ignored_identities: Vec<String>,
    /// Scope given to contexts whose notification carries none.
    pub base_scope: Option<SharedScope>,
}

impl Default for BridgeConfig {
    fn default() -> Self {
        Self::new()
    }
}

impl BridgeConfig {
    /// Default settings.
    pub fn new() -> Self {
        Self {
            framework_identity: FRAMEWORK_IDENTITY.to_string(),
            ignored_identities: Vec::new(),
            base_scope: None,
        }
    }

    /// Set the framework identity.
    pub fn with_framework_identity(mut self, identity: impl Into<String>) -> Self {
        self.framework_identity = identity.into();
        self
    }

    /// Drop notifications for `identity`.
    pub fn with_ignored_identity(mut self, identity: impl Into<String>) -> Self {
        self.ignored_identities.push(identity.into());
        self
    }

    /// Set the fallback scope.
    pub fn with_base_scope(mut self, scope: SharedScope) -> Self {
        self.base_scope = Some(scope);
        self
    }

    fn is_ignored(&self, identity: &str) -> bool {
        self.ignored_identities.iter().any(|i| i == identity)
    }
}

impl fmt::Debug for BridgeConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BridgeConfig")
            .field("framework_identity", &self.framework_identity)
            .field("ignored_identities", &self.ignored_identities)
            .field("base_scope", &self.base_scope.as_ref().map(|_| ".."))
            .finish()
    }
}

/// What [`HookBridge::dispatch`] did with a notification.
#[derive(Debug, Clone)]
pub enum DispatchOutcome {
    /// First occurrence: the context was created or updated and the
    /// author callback ran.
    Dispatched(Arc<ProcessContext>),
    /// Repeated occurrence: the context was updated, the callback skipped.
    Duplicate(Arc<ProcessContext>),
    /// The identity is ignored.
    Ignored,
}

impl DispatchOutcome {
    /// The context involved, if any.
    pub fn context(&self) -> Option<&Arc<ProcessContext>> {
        match self {
            DispatchOutcome::Dispatched(ctx) | DispatchOutcome::Duplicate(ctx) => Some(ctx),
            DispatchOutcome::Ignored => None,
        }
    }

    /// Whether the author callback ran.
    pub fn is_dispatched(&self) -> bool {
        matches!(self, DispatchOutcome::Dispatched(_))
    }
}

/// Everything the author callback gets for one notification.
pub struct LoadParam<'a> {
    bridge: &'a HookBridge,
    context: Arc<ProcessContext>,
    kind: LoadKind,
}

impl<'a> LoadParam<'a> {
    /// The notification kind being dispatched.
    pub fn kind(&self) -> LoadKind {
        self.kind
    }

    /// The process context. Stays the same instance across notifications.
    pub fn context(&self) -> &Arc<ProcessContext> {
        &self.context
    }

    /// Normalised process identity.
    pub fn identity(&self) -> &str {
        self.context.identity()
    }

    /// The bridge dispatching this notification.
    pub fn bridge(&self) -> &'a HookBridge {
        self.bridge
    }

    /// Resolve a type name in the target process.
    pub fn find_type(&self, name: &str) -> Option<TypeRef> {
        self.context.find_type(name)
    }

    /// Resolve `rules` against `target` in the target process.
    pub fn resolve(
        &self,
        target: &TypeRef,
        rules: &MemberRules,
        mode: QueryMode,
        include_superclasses: bool,
    ) -> MatchResult {
        self.context.resolve(target, rules, mode, include_superclasses)
    }

    /// Resolve `rules` to exactly one member of `target`.
    pub fn resolve_one(
        &self,
        target: &TypeRef,
        rules: &MemberRules,
        include_superclasses: bool,
    ) -> Result<ResolvedMember, ResolveError> {
        self.resolve(target, rules, QueryMode::Unique, include_superclasses)
            .single(rules.kind(), target)
    }

    /// Hook one member.
    pub fn hook_member(&self, member: &ResolvedMember, callback: HookCallback) -> Option<HookHandle> {
        self.bridge.attach(member, callback, Some(self.identity()))
    }

    /// Hook every member carried by a resolution result.
    pub fn hook_resolved(&self, result: MatchResult, callback: HookCallback) -> HookSet {
        self.bridge
            .attach_all(result.into_vec(), callback, Some(self.identity()))
    }

    /// Hook every overload of method `name` declared on `ty`.
    pub fn hook_all_named(&self, ty: &TypeRef, name: &str, callback: HookCallback) -> HookSet {
        match self.context.scope() {
            Some(scope) => self.bridge.attach_all(
                declared_named(scope.as_ref(), ty, name),
                callback,
                Some(self.identity()),
            ),
            None => HookSet::default(),
        }
    }

    /// Hook every constructor declared on `ty`.
    pub fn hook_all_constructors(&self, ty: &TypeRef, callback: HookCallback) -> HookSet {
        match self.context.scope() {
            Some(scope) => self.bridge.attach_all(
                scope.declared_members(ty, MemberKind::Constructor),
                callback,
                Some(self.identity()),
            ),
            None => HookSet::default(),
        }
    }
}

fn declared_named(scope: &dyn ClassScope, ty: &TypeRef, name: &str) -> Vec<ResolvedMember> {
    scope
        .declared_members(ty, MemberKind::Method)
        .into_iter()
        .filter(|m| m.name() == name)
        .collect()
}

static GLOBAL: OnceLock<HookBridge> = OnceLock::new();

/// The dispatch bridge.
///
/// Safe to call from any thread. No lock is held while an author callback
/// runs, so callbacks may re-enter the bridge.
pub struct HookBridge {
    config: BridgeConfig,
    engine: Arc<dyn NativeHookEngine>,
    reporter: RwLock<Arc<dyn FailureReporter>>,
    contexts: ContextRegistry,
    loaded: LoadDeduplicator,
    on_load: RwLock<Option<LoadCallback>>,
    initialized: AtomicBool,
}

impl HookBridge {
    /// Create a bridge over `engine` with default settings.
    pub fn new(engine: Arc<dyn NativeHookEngine>) -> Self {
        Self::with_config(engine, BridgeConfig::default())
    }

    /// Create a bridge over `engine` with `config`.
    pub fn with_config(engine: Arc<dyn NativeHookEngine>, config: BridgeConfig) -> Self {
        Self {
            config,
            engine,
            reporter: RwLock::new(Arc::new(TracingReporter)),
            contexts: ContextRegistry::new(),
            loaded: LoadDeduplicator::new(),
            on_load: RwLock::new(None),
            initialized: AtomicBool::new(false),
        }
    }

    /// Replace the failure reporter (default: [`TracingReporter`]).
    pub fn with_reporter(self, reporter: impl FailureReporter) -> Self {
        self.set_reporter(Arc::new(reporter));
        self
    }

    /// Replace the failure reporter.
    ///
    /// Only callbacks attached afterwards use the new reporter.
    pub fn set_reporter(&self, reporter: Arc<dyn FailureReporter>) {
        *self.reporter.write() = reporter;
    }

    /// Install `bridge` as the process-wide instance.
    ///
    /// The first installed bridge wins; later calls return it unchanged.
    pub fn install(bridge: HookBridge) -> &'static HookBridge {
        let mut fresh = false;
        let installed = GLOBAL.get_or_init(|| {
            fresh = true;
            bridge
        });
        if !fresh {
            tracing::warn!("a hook bridge is already installed, keeping the existing one");
        }
        installed
    }

    /// The process-wide instance, if one was installed.
    pub fn global() -> Option<&'static HookBridge> {
        GLOBAL.get()
    }

    /// Forget all contexts, dispatch records and the entry callback.
    pub fn reset(&self) {
        self.contexts.clear();
        self.loaded.clear();
        *self.on_load.write() = None;
        self.initialized.store(false, Ordering::Release);
    }

    /// Settings.
    pub fn config(&self) -> &BridgeConfig {
        &self.config
    }

    /// The native engine.
    pub fn engine(&self) -> &Arc<dyn NativeHookEngine> {
        &self.engine
    }

    /// Registered process contexts.
    pub fn contexts(&self) -> &ContextRegistry {
        &self.contexts
    }

    /// Dispatch records.
    pub fn loaded(&self) -> &LoadDeduplicator {
        &self.loaded
    }

    /// Context of `identity`, if it was ever notified.
    pub fn context(&self, identity: &str) -> Option<Arc<ProcessContext>> {
        self.contexts.get(identity)
    }

    /// Set the author entry callback, replacing any previous one.
    pub fn on_load(
        &self,
        callback: impl Fn(&LoadParam<'_>) -> Result<(), BoxError> + Send + Sync + 'static,
    ) {
        *self.on_load.write() = Some(Arc::new(callback));
    }

    /// Record that the host finished initialising the module.
    pub fn mark_initialized(&self) {
        self.initialized.store(true, Ordering::Release);
    }

    /// Whether an entry callback is registered and the host has not yet
    /// finished initialising.
    pub fn is_entry_ready(&self) -> bool {
        !self.initialized.load(Ordering::Acquire) && self.on_load.read().is_some()
    }

    /// Handle one host notification.
    pub fn dispatch(&self, notification: LoadNotification) -> DispatchOutcome {
        let identity = notification
            .identity
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .unwrap_or(self.config.framework_identity.as_str())
            .to_string();
        let kind = notification.kind;

        if self.config.is_ignored(&identity) {
            tracing::debug!(identity = %identity, kind = %kind, "ignoring notification");
            return DispatchOutcome::Ignored;
        }

        let first = self.loaded.first_time(&identity, kind);
        let context = self
            .contexts
            .assign(&identity, &notification, self.config.base_scope.as_ref());
        if !first {
            tracing::debug!(identity = %identity, kind = %kind, "duplicate notification, context merged");
            return DispatchOutcome::Duplicate(context);
        }

        tracing::info!(identity = %identity, kind = %kind, "process loaded");
        self.run_entry(&context, kind);
        DispatchOutcome::Dispatched(context)
    }

    fn run_entry(&self, context: &Arc<ProcessContext>, kind: LoadKind) {
        let Some(callback) = self.on_load.read().clone() else {
            tracing::debug!(identity = %context.identity(), "no entry callback registered");
            return;
        };
        let param = LoadParam {
            bridge: self,
            context: context.clone(),
            kind,
        };
        let error = match panic::catch_unwind(AssertUnwindSafe(|| callback(&param))) {
            Ok(Ok(())) => return,
            Ok(Err(e)) => HookError::Custom(e),
            Err(payload) => HookError::from_panic(payload),
        };
        self.report(HookFailure {
            stage: Stage::Load,
            member: None,
            identity: Some(context.identity().to_string()),
            cause: FailureCause::Callback(error),
        });
    }

    /// Hook one member.
    ///
    /// Returns `None` if the engine refused; the refusal is reported.
    pub fn hook_member(&self, member: &ResolvedMember, callback: HookCallback) -> Option<HookHandle> {
        self.attach(member, callback, None)
    }

    /// Hook every overload of method `name` declared on `ty`.
    pub fn hook_all_named(
        &self,
        scope: &dyn ClassScope,
        ty: &TypeRef,
        name: &str,
        callback: HookCallback,
    ) -> HookSet {
        self.attach_all(declared_named(scope, ty, name), callback, None)
    }

    /// Hook every constructor declared on `ty`.
    pub fn hook_all_constructors(
        &self,
        scope: &dyn ClassScope,
        ty: &TypeRef,
        callback: HookCallback,
    ) -> HookSet {
        self.attach_all(
            scope.declared_members(ty, MemberKind::Constructor),
            callback,
            None,
        )
    }

    /// Hook every member carried by a resolution result.
    pub fn hook_resolved(&self, result: MatchResult, callback: HookCallback) -> HookSet {
        self.attach_all(result.into_vec(), callback, None)
    }

    fn attach_all(
        &self,
        members: Vec<ResolvedMember>,
        callback: HookCallback,
        identity: Option<&str>,
    ) -> HookSet {
        members
            .iter()
            .filter_map(|member| self.attach(member, callback.clone(), identity))
            .collect()
    }

    fn attach(
        &self,
        member: &ResolvedMember,
        callback: HookCallback,
        identity: Option<&str>,
    ) -> Option<HookHandle> {
        let priority = callback.priority();
        let mode = callback.mode().label();
        let adapter = CallbackAdapter::new(
            callback,
            member.clone(),
            identity.map(str::to_string),
            self.reporter.read().clone(),
        );
        match self.engine.attach(member, priority, Arc::new(adapter)) {
            Ok(native) => {
                tracing::debug!(member = %member, priority, mode, handle = native.0, "hooked");
                Some(HookHandle::new(member.clone(), native, self.engine.clone()))
            }
            Err(e) => {
                self.report(HookFailure {
                    stage: Stage::Attach,
                    member: Some(member.clone()),
                    identity: identity.map(str::to_string),
                    cause: FailureCause::Attach(e),
                });
                None
            }
        }
    }

    fn report(&self, failure: HookFailure) {
        let reporter = self.reporter.read().clone();
        reporter.report(failure);
    }
}

impl fmt::Debug for HookBridge {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HookBridge")
            .field("config", &self.config)
            .field("engine", &self.engine.name())
            .field("contexts", &self.contexts.len())
            .field("loaded", &self.loaded.len())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{ClassBuilder, InMemoryScope, RecordingReporter, SoftwareEngine};
    use snare_core::{ConstructorRules, Modifiers, Value};
    use std::sync::atomic::AtomicUsize;

    fn bridge() -> (HookBridge, Arc<SoftwareEngine>, RecordingReporter) {
        let engine = Arc::new(SoftwareEngine::new());
        let reporter = RecordingReporter::new();
        let bridge = HookBridge::new(engine.clone()).with_reporter(reporter.clone());
        (bridge, engine, reporter)
    }

    #[test]
    fn missing_identity_maps_to_framework() {
        let (bridge, _, _) = bridge();
        let outcome = bridge.dispatch(LoadNotification::zygote());
        let ctx = outcome.context().unwrap();
        assert_eq!(ctx.identity(), FRAMEWORK_IDENTITY);

        let blank = bridge.dispatch(LoadNotification::package("   "));
        assert_eq!(blank.context().unwrap().identity(), FRAMEWORK_IDENTITY);
        assert!(bridge.context("app.example").is_none());
    }

    #[test]
    fn ignored_identities_are_dropped() {
        let engine = Arc::new(SoftwareEngine::new());
        let config = BridgeConfig::new().with_ignored_identity("vendor.catcher");
        let bridge = HookBridge::with_config(engine, config);
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = calls.clone();
        bridge.on_load(move |_| {
            counter.fetch_add(1, Ordering::SeqCst);
            Ok(())
        });

        assert!(matches!(
            bridge.dispatch(LoadNotification::package("vendor.catcher")),
            DispatchOutcome::Ignored
        ));
        assert_eq!(calls.load(Ordering::SeqCst), 0);
        assert!(bridge.loaded().is_empty());
    }

    #[test]
    fn entry_failures_are_reported_not_propagated() {
        let (bridge, _, reporter) = bridge();
        bridge.on_load(|param| {
            if param.kind() == LoadKind::PackageLoad {
                return Err("entry failed".into());
            }
            panic!("resources entry panicked");
        });

        assert!(bridge.dispatch(LoadNotification::package("app.example")).is_dispatched());
        assert!(bridge.dispatch(LoadNotification::resources("app.example")).is_dispatched());
        assert_eq!(reporter.stages(), vec![Stage::Load, Stage::Load]);
        assert!(reporter.messages()[1].contains("resources entry panicked"));
    }

    #[test]
    fn entry_readiness_follows_initialisation() {
        let (bridge, _, _) = bridge();
        assert!(!bridge.is_entry_ready());
        bridge.on_load(|_| Ok(()));
        assert!(bridge.is_entry_ready());
        bridge.mark_initialized();
        assert!(!bridge.is_entry_ready());
        bridge.reset();
        assert!(!bridge.is_entry_ready());
    }

    #[test]
    fn refused_members_are_omitted() {
        let (bridge, engine, reporter) = bridge();
        let scope = InMemoryScope::new();
        let foo = scope.define(
            ClassBuilder::new("com.example.Foo")
                .constructor(Vec::<&str>::new(), Modifiers::PUBLIC)
                .constructor(["int"], Modifiers::PUBLIC)
                .method("run", Vec::<&str>::new(), "void", Modifiers::ABSTRACT)
                .method("run", ["int"], "void", Modifiers::PUBLIC),
        );

        let set = bridge.hook_all_named(&scope, &foo, "run", HookCallback::before(|_| Ok(())));
        assert_eq!(set.len(), 1);
        assert_eq!(set.members()[0].parameter_types().len(), 1);
        assert_eq!(reporter.stages(), vec![Stage::Attach]);

        let ctors = bridge.hook_all_constructors(&scope, &foo, HookCallback::before(|_| Ok(())));
        assert_eq!(ctors.len(), 2);
        assert_eq!(ctors.unhook_all(), 2);
        assert_eq!(ctors.unhook_all(), 0);
        for member in ctors.members() {
            assert_eq!(engine.hook_count(member), 0);
        }
    }

    #[test]
    fn load_param_hooks_through_context_scope() {
        let (bridge, engine, _) = bridge();
        let scope = Arc::new(InMemoryScope::new());
        scope.define(
            ClassBuilder::new("com.example.Foo")
                .constructor(Vec::<&str>::new(), Modifiers::PUBLIC)
                .constructor(["java.lang.String"], Modifiers::PUBLIC),
        );
        bridge.on_load(|param| {
            let foo = param.find_type("com.example.Foo").ok_or("Foo not loaded")?;
            let rules = ConstructorRules::new().empty_param().build()?;
            let result = param.resolve(&foo, &rules, QueryMode::First, false);
            param.hook_resolved(result, HookCallback::replace_with("replaced"));
            Ok(())
        });
        bridge.dispatch(LoadNotification::package("app.example").with_scope(scope.clone()));

        let foo = scope.find_type("com.example.Foo").unwrap();
        let ctors = scope.declared_members(&foo, MemberKind::Constructor);
        assert_eq!(engine.hook_count(&ctors[0]), 1);
        assert_eq!(engine.hook_count(&ctors[1]), 0);
        let frame = engine.invoke(&ctors[0], None, vec![], |_| Value::Null);
        assert_eq!(frame.result().as_str(), Some("replaced"));
    }
}
