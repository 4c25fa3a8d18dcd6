//! Per-process hook contexts.
//!
//! The host announces each target process one or more times. The first
//! announcement for an identity creates its [`ProcessContext`]; later ones
//! update the same instance in place, field by field, so references the
//! author kept from an earlier callback stay valid.

use dashmap::DashMap;
use parking_lot::RwLock;
use snare_core::{ClassScope, MatchResult, MemberResolver, MemberRules, QueryMode, SharedScope, TypeRef};
use std::{any::Any, fmt, sync::Arc};

/// The host lifecycle point a notification belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LoadKind {
    /// The host's base process is initialising, before any application.
    ZygoteInit,
    /// An application package was loaded.
    PackageLoad,
    /// An application's resources were initialised.
    ResourcesInit,
}

impl fmt::Display for LoadKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            LoadKind::ZygoteInit => "zygote",
            LoadKind::PackageLoad => "package",
            LoadKind::ResourcesInit => "resources",
        })
    }
}

/// Application metadata supplied by the host.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AppInfo {
    /// Path of the installed application archive.
    pub source_dir: Option<String>,
    /// Private data directory.
    pub data_dir: Option<String>,
    /// User id the application runs as.
    pub uid: Option<u32>,
    /// Target platform version.
    pub target_sdk: Option<u32>,
}

/// Opaque handle to the application's resources.
#[derive(Clone)]
pub struct ResourceHandle(Arc<dyn Any + Send + Sync>);

impl ResourceHandle {
    /// Wrap a host resource object.
    pub fn new<T: Any + Send + Sync>(resources: T) -> Self {
        Self(Arc::new(resources))
    }

    /// Borrow the resource object as `T`.
    pub fn downcast_ref<T: Any>(&self) -> Option<&T> {
        self.0.downcast_ref()
    }
}

impl fmt::Debug for ResourceHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ResourceHandle({:p})", Arc::as_ptr(&self.0))
    }
}

/// One load notification from the host.
#[derive(Clone)]
pub struct LoadNotification {
    pub(crate) kind: LoadKind,
    pub(crate) identity: Option<String>,
    pub(crate) process_name: Option<String>,
    pub(crate) scope: Option<SharedScope>,
    pub(crate) app_info: Option<AppInfo>,
    pub(crate) resources: Option<ResourceHandle>,
}

impl LoadNotification {
    /// A notification of `kind` with no payload.
    pub fn new(kind: LoadKind) -> Self {
        Self {
            kind,
            identity: None,
            process_name: None,
            scope: None,
            app_info: None,
            resources: None,
        }
    }

    /// Base process initialisation. Carries no application identity.
    pub fn zygote() -> Self {
        Self::new(LoadKind::ZygoteInit)
    }

    /// An application package load.
    pub fn package(identity: impl Into<String>) -> Self {
        Self::new(LoadKind::PackageLoad).with_identity(identity)
    }

    /// An application resources initialisation.
    pub fn resources(identity: impl Into<String>) -> Self {
        Self::new(LoadKind::ResourcesInit).with_identity(identity)
    }

    /// Set the process identity.
    pub fn with_identity(mut self, identity: impl Into<String>) -> Self {
        self.identity = Some(identity.into());
        self
    }

    /// Set the process name.
    pub fn with_process_name(mut self, name: impl Into<String>) -> Self {
        self.process_name = Some(name.into());
        self
    }

    /// Set the type-resolution scope.
    pub fn with_scope(mut self, scope: SharedScope) -> Self {
        self.scope = Some(scope);
        self
    }

    /// Set application metadata.
    pub fn with_app_info(mut self, info: AppInfo) -> Self {
        self.app_info = Some(info);
        self
    }

    /// Set the resources handle.
    pub fn with_resource_handle(mut self, resources: ResourceHandle) -> Self {
        self.resources = Some(resources);
        self
    }

    /// Notification kind.
    pub fn kind(&self) -> LoadKind {
        self.kind
    }

    /// Identity as supplied by the host, before normalisation.
    pub fn identity(&self) -> Option<&str> {
        self.identity.as_deref()
    }
}

impl fmt::Debug for LoadNotification {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LoadNotification")
            .field("kind", &self.kind)
            .field("identity", &self.identity)
            .field("process_name", &self.process_name)
            .field("scope", &self.scope.as_ref().map(|_| ".."))
            .field("app_info", &self.app_info)
            .field("resources", &self.resources)
            .finish()
    }
}

fn non_blank(value: &Option<String>) -> Option<&String> {
    value.as_ref().filter(|s| !s.trim().is_empty())
}

/// Hook context of one target process.
///
/// Each field is guarded separately; an update overwrites only the fields
/// the new notification supplies.
pub struct ProcessContext {
    identity: String,
    kind: RwLock<LoadKind>,
    process_name: RwLock<String>,
    scope: RwLock<Option<SharedScope>>,
    app_info: RwLock<Option<AppInfo>>,
    resources: RwLock<Option<ResourceHandle>>,
}

impl ProcessContext {
    fn create(identity: &str, notification: &LoadNotification, base_scope: Option<&SharedScope>) -> Self {
        Self {
            identity: identity.to_string(),
            kind: RwLock::new(notification.kind),
            process_name: RwLock::new(
                non_blank(&notification.process_name).map_or_else(|| identity.to_string(), Clone::clone),
            ),
            scope: RwLock::new(notification.scope.clone().or_else(|| base_scope.cloned())),
            app_info: RwLock::new(notification.app_info.clone()),
            resources: RwLock::new(notification.resources.clone()),
        }
    }

    fn merge(&self, notification: &LoadNotification) {
        *self.kind.write() = notification.kind;
        if let Some(name) = non_blank(&notification.process_name) {
            *self.process_name.write() = name.clone();
        }
        if let Some(scope) = &notification.scope {
            *self.scope.write() = Some(scope.clone());
        }
        if let Some(info) = &notification.app_info {
            *self.app_info.write() = Some(info.clone());
        }
        if let Some(resources) = &notification.resources {
            *self.resources.write() = Some(resources.clone());
        }
    }

    /// Normalised process identity.
    pub fn identity(&self) -> &str {
        &self.identity
    }

    /// Kind of the most recent notification.
    pub fn kind(&self) -> LoadKind {
        *self.kind.read()
    }

    /// Process name.
    pub fn process_name(&self) -> String {
        self.process_name.read().clone()
    }

    /// Type-resolution scope, if the host supplied one.
    pub fn scope(&self) -> Option<SharedScope> {
        self.scope.read().clone()
    }

    /// Application metadata.
    pub fn app_info(&self) -> Option<AppInfo> {
        self.app_info.read().clone()
    }

    /// Resources handle.
    pub fn resources(&self) -> Option<ResourceHandle> {
        self.resources.read().clone()
    }

    /// Resolve a type name in this process.
    pub fn find_type(&self, name: &str) -> Option<TypeRef> {
        self.scope()?.find_type(name)
    }

    /// Resolve `rules` against `target` in this process.
    ///
    /// Returns [`MatchResult::NotFound`] when no scope is known yet.
    pub fn resolve(
        &self,
        target: &TypeRef,
        rules: &MemberRules,
        mode: QueryMode,
        include_superclasses: bool,
    ) -> MatchResult {
        match self.scope() {
            Some(scope) => {
                MemberResolver::new(scope.as_ref()).resolve(target, rules, mode, include_superclasses)
            }
            None => MatchResult::NotFound,
        }
    }
}

impl fmt::Debug for ProcessContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProcessContext")
            .field("identity", &self.identity)
            .field("kind", &self.kind())
            .field("process_name", &self.process_name())
            .field("app_info", &self.app_info())
            .finish_non_exhaustive()
    }
}

/// One context per process identity, created lazily.
#[derive(Default)]
pub struct ContextRegistry {
    contexts: DashMap<String, Arc<ProcessContext>>,
}

impl ContextRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create the context for `identity`, or merge `notification` into it.
    pub(crate) fn assign(
        &self,
        identity: &str,
        notification: &LoadNotification,
        base_scope: Option<&SharedScope>,
    ) -> Arc<ProcessContext> {
        self.contexts
            .entry(identity.to_string())
            .and_modify(|ctx| ctx.merge(notification))
            .or_insert_with(|| Arc::new(ProcessContext::create(identity, notification, base_scope)))
            .clone()
    }

    /// Context of `identity`, if it was ever notified.
    pub fn get(&self, identity: &str) -> Option<Arc<ProcessContext>> {
        self.contexts.get(identity).map(|ctx| ctx.value().clone())
    }

    /// Number of known identities.
    pub fn len(&self) -> usize {
        self.contexts.len()
    }

    /// Whether no identity was notified yet.
    pub fn is_empty(&self) -> bool {
        self.contexts.is_empty()
    }

    /// Forget every context.
    pub fn clear(&self) {
        self.contexts.clear();
    }
}
