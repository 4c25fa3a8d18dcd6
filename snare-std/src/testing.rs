//! Testing utilities for Snare.
//!
//! In-process stand-ins for the collaborators a real host supplies, so that
//! rules, resolution and the dispatch bridge can be exercised without a
//! managed runtime.
//!
//! # Features
//!
//! - [`InMemoryScope`] / [`ClassBuilder`]: a reflective type system built by hand
//! - [`SoftwareEngine`]: a native hook engine that runs callbacks around a
//!   supplied original body
//! - [`RecordingReporter`]: a failure reporter that keeps what it receives

use dashmap::{DashMap, DashSet};
use parking_lot::Mutex;
use snare_core::{
    AttachError, CallFrame, ClassScope, FailureReporter, HookFailure, MemberId, MemberKind,
    Modifiers, NativeCallback, NativeHandle, NativeHookEngine, ResolvedMember, Stage, TypeRef,
    Value,
};
use std::{
    cmp::Reverse,
    sync::{
        Arc,
        atomic::{AtomicU64, Ordering},
    },
};

// ============================================================================
// Reflective scope
// ============================================================================

/// Name of the universal root type.
pub const ROOT_TYPE: &str = "java.lang.Object";

const PRIMITIVES: [&str; 9] = [
    "boolean", "byte", "char", "short", "int", "long", "float", "double", "void",
];

/// Declaration of one class, consumed by [`InMemoryScope::define`].
///
/// # Example
///
/// ```rust,ignore
/// let scope = InMemoryScope::new();
/// let foo = scope.define(
///     ClassBuilder::new("com.example.Foo")
///         .constructor(["java.lang.String"], Modifiers::PUBLIC)
///         .method("run", ["int"], "void", Modifiers::PUBLIC),
/// );
/// ```
#[derive(Debug, Clone)]
pub struct ClassBuilder {
    name: String,
    superclass: Option<String>,
    constructors: Vec<(Vec<String>, Modifiers)>,
    methods: Vec<(String, Vec<String>, String, Modifiers)>,
    fields: Vec<(String, String, Modifiers)>,
}

fn names<S: Into<String>>(params: impl IntoIterator<Item = S>) -> Vec<String> {
    params.into_iter().map(Into::into).collect()
}

impl ClassBuilder {
    /// Start a class extending the root type.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            superclass: None,
            constructors: Vec::new(),
            methods: Vec::new(),
            fields: Vec::new(),
        }
    }

    /// Set the direct supertype.
    pub fn extends(mut self, superclass: impl Into<String>) -> Self {
        self.superclass = Some(superclass.into());
        self
    }

    /// Declare a constructor.
    pub fn constructor<S: Into<String>>(
        mut self,
        params: impl IntoIterator<Item = S>,
        modifiers: Modifiers,
    ) -> Self {
        self.constructors.push((names(params), modifiers));
        self
    }

    /// Declare a method.
    pub fn method<S: Into<String>>(
        mut self,
        name: impl Into<String>,
        params: impl IntoIterator<Item = S>,
        return_type: impl Into<String>,
        modifiers: Modifiers,
    ) -> Self {
        self.methods
            .push((name.into(), names(params), return_type.into(), modifiers));
        self
    }

    /// Declare a field.
    pub fn field(
        mut self,
        name: impl Into<String>,
        field_type: impl Into<String>,
        modifiers: Modifiers,
    ) -> Self {
        self.fields.push((name.into(), field_type.into(), modifiers));
        self
    }
}

#[derive(Debug, Default)]
struct ClassEntry {
    superclass: Option<TypeRef>,
    constructors: Vec<ResolvedMember>,
    methods: Vec<ResolvedMember>,
    fields: Vec<ResolvedMember>,
}

/// A reflective type system held in memory.
///
/// Every type name mentioned by a definition becomes resolvable, as do the
/// primitive types and [`ROOT_TYPE`]. Only defined classes have members.
#[derive(Debug)]
pub struct InMemoryScope {
    classes: DashMap<String, ClassEntry>,
    known: DashSet<String>,
    next_id: AtomicU64,
}

impl Default for InMemoryScope {
    fn default() -> Self {
        Self::new()
    }
}

impl InMemoryScope {
    /// Create a scope containing the root type and the primitives.
    pub fn new() -> Self {
        let scope = Self {
            classes: DashMap::new(),
            known: DashSet::new(),
            next_id: AtomicU64::new(1),
        };
        scope.classes.insert(ROOT_TYPE.to_string(), ClassEntry::default());
        scope.known.insert(ROOT_TYPE.to_string());
        for primitive in PRIMITIVES {
            scope.known.insert(primitive.to_string());
        }
        scope
    }

    fn type_ref(&self, name: &str) -> TypeRef {
        self.known.insert(name.to_string());
        TypeRef::new(name)
    }

    fn types(&self, names: &[String]) -> Vec<TypeRef> {
        names.iter().map(|n| self.type_ref(n)).collect()
    }

    fn next_id(&self) -> MemberId {
        MemberId(self.next_id.fetch_add(1, Ordering::Relaxed))
    }

    /// Define (or redefine) a class and return its type.
    ///
    /// Member ids are assigned in declaration order.
    pub fn define(&self, class: ClassBuilder) -> TypeRef {
        let ty = self.type_ref(&class.name);
        let superclass = class
            .superclass
            .as_deref()
            .or((class.name != ROOT_TYPE).then_some(ROOT_TYPE))
            .map(|name| self.type_ref(name));

        let constructors = class
            .constructors
            .iter()
            .map(|(params, mods)| {
                ResolvedMember::constructor(ty.clone(), self.types(params), *mods, self.next_id())
            })
            .collect();
        let methods = class
            .methods
            .iter()
            .map(|(name, params, ret, mods)| {
                ResolvedMember::method(
                    ty.clone(),
                    name.as_str(),
                    self.types(params),
                    self.type_ref(ret),
                    *mods,
                    self.next_id(),
                )
            })
            .collect();
        let fields = class
            .fields
            .iter()
            .map(|(name, field_type, mods)| {
                ResolvedMember::field(
                    ty.clone(),
                    name.as_str(),
                    self.type_ref(field_type),
                    *mods,
                    self.next_id(),
                )
            })
            .collect();

        self.classes.insert(
            class.name,
            ClassEntry {
                superclass,
                constructors,
                methods,
                fields,
            },
        );
        ty
    }
}

impl ClassScope for InMemoryScope {
    fn find_type(&self, name: &str) -> Option<TypeRef> {
        self.known.contains(name).then(|| TypeRef::new(name))
    }

    fn superclass(&self, ty: &TypeRef) -> Option<TypeRef> {
        self.classes.get(ty.name())?.superclass.clone()
    }

    fn declared_members(&self, ty: &TypeRef, kind: MemberKind) -> Vec<ResolvedMember> {
        let Some(class) = self.classes.get(ty.name()) else {
            return Vec::new();
        };
        match kind {
            MemberKind::Constructor => class.constructors.clone(),
            MemberKind::Method => class.methods.clone(),
            MemberKind::Field => class.fields.clone(),
        }
    }

    fn is_root_type(&self, ty: &TypeRef) -> bool {
        ty.name() == ROOT_TYPE
    }
}

// ============================================================================
// Software Engine
// ============================================================================

struct Attached {
    handle: NativeHandle,
    priority: i32,
    callback: Arc<dyn NativeCallback>,
}

/// An in-process hook engine.
///
/// Callbacks of one member are kept ordered by descending priority, ties in
/// attach order. [`invoke`](Self::invoke) follows the engine execution
/// contract documented on [`NativeHookEngine`].
///
/// Abstract members are unhookable; members passed to
/// [`refuse`](Self::refuse) are refused.
#[derive(Default)]
pub struct SoftwareEngine {
    hooks: DashMap<MemberId, Vec<Attached>>,
    owners: DashMap<NativeHandle, MemberId>,
    refused: DashSet<MemberId>,
    next_handle: AtomicU64,
}

impl SoftwareEngine {
    /// Engine name reported to status checks.
    pub const NAME: &'static str = "SoftwareEngine";
    /// Engine version reported to status checks.
    pub const VERSION: i32 = 1;

    /// Create an engine with nothing attached.
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every future attach to `member` fail.
    pub fn refuse(&self, member: &ResolvedMember) {
        self.refused.insert(member.id());
    }

    /// Number of callbacks attached to `member`.
    pub fn hook_count(&self, member: &ResolvedMember) -> usize {
        self.hooks.get(&member.id()).map_or(0, |hooks| hooks.len())
    }

    /// Call `member` through its hooks.
    ///
    /// `original` stands in for the member body and is skipped when a
    /// callback forces a result. No lock is held while callbacks run.
    pub fn invoke(
        &self,
        member: &ResolvedMember,
        instance: Option<Value>,
        args: Vec<Value>,
        original: impl FnOnce(&CallFrame) -> Value,
    ) -> CallFrame {
        let callbacks: Vec<Arc<dyn NativeCallback>> = self
            .hooks
            .get(&member.id())
            .map(|hooks| hooks.iter().map(|a| a.callback.clone()).collect())
            .unwrap_or_default();

        let mut frame = CallFrame::new(member.clone(), instance, args);
        for callback in &callbacks {
            callback.before(&mut frame);
            if frame.is_returned_early() {
                break;
            }
        }
        if !frame.is_returned_early() {
            let value = original(&frame);
            frame.complete(value);
        }
        for callback in &callbacks {
            callback.after(&mut frame);
        }
        frame
    }
}

impl NativeHookEngine for SoftwareEngine {
    fn attach(
        &self,
        member: &ResolvedMember,
        priority: i32,
        callback: Arc<dyn NativeCallback>,
    ) -> Result<NativeHandle, AttachError> {
        if member.modifiers().contains(Modifiers::ABSTRACT) {
            return Err(AttachError::Unhookable {
                member: member.to_string(),
            });
        }
        if self.refused.contains(&member.id()) {
            return Err(AttachError::Refused {
                member: member.to_string(),
                reason: "refused by engine".to_string(),
            });
        }

        let handle = NativeHandle(self.next_handle.fetch_add(1, Ordering::Relaxed));
        let mut hooks = self.hooks.entry(member.id()).or_default();
        hooks.push(Attached {
            handle,
            priority,
            callback,
        });
        // Stable sort keeps attach order among equal priorities.
        hooks.sort_by_key(|a| Reverse(a.priority));
        drop(hooks);
        self.owners.insert(handle, member.id());
        Ok(handle)
    }

    fn detach(&self, handle: NativeHandle) {
        let Some((_, member)) = self.owners.remove(&handle) else {
            return;
        };
        if let Some(mut hooks) = self.hooks.get_mut(&member) {
            hooks.retain(|a| a.handle != handle);
        }
    }

    fn name(&self) -> &str {
        Self::NAME
    }

    fn version(&self) -> i32 {
        Self::VERSION
    }
}

// ============================================================================
// Recording Reporter
// ============================================================================

/// A failure reporter that records every failure it receives.
///
/// Clones share the same record.
#[derive(Debug, Clone, Default)]
pub struct RecordingReporter {
    records: Arc<Mutex<Vec<(Stage, Option<String>, String)>>>,
}

impl RecordingReporter {
    /// Create an empty reporter.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of recorded failures.
    pub fn count(&self) -> usize {
        self.records.lock().len()
    }

    /// Stages of the recorded failures, in report order.
    pub fn stages(&self) -> Vec<Stage> {
        self.records.lock().iter().map(|(stage, _, _)| *stage).collect()
    }

    /// Identities of the recorded failures, in report order.
    pub fn identities(&self) -> Vec<Option<String>> {
        self.records
            .lock()
            .iter()
            .map(|(_, identity, _)| identity.clone())
            .collect()
    }

    /// Rendered failures, in report order.
    pub fn messages(&self) -> Vec<String> {
        self.records
            .lock()
            .iter()
            .map(|(_, _, message)| message.clone())
            .collect()
    }

    /// Forget everything recorded so far.
    pub fn clear(&self) {
        self.records.lock().clear();
    }
}

impl FailureReporter for RecordingReporter {
    fn report(&self, failure: HookFailure) {
        let message = failure.to_string();
        self.records
            .lock()
            .push((failure.stage, failure.identity, message));
    }
}
