#![allow(dead_code)]

use snare::{
    ClassScope, HookBridge, MemberKind, Modifiers, ResolvedMember, TypeRef,
    testing::{ClassBuilder, InMemoryScope, RecordingReporter, SoftwareEngine},
};
use std::sync::Arc;

// ============================================================================
// Fixtures
// ============================================================================

pub const FOO: &str = "com.example.Foo";
pub const BASE: &str = "com.example.Base";
pub const STRING: &str = "java.lang.String";

pub fn init_tracing() {
    let _ = tracing_subscriber::fmt().with_test_writer().try_init();
}

/// `Foo extends Base`, with constructors `Foo()` and `Foo(String)`.
pub fn foo_scope() -> (Arc<InMemoryScope>, TypeRef) {
    let scope = Arc::new(InMemoryScope::new());
    scope.define(
        ClassBuilder::new(BASE)
            .constructor(Vec::<&str>::new(), Modifiers::PUBLIC)
            .method("describe", Vec::<&str>::new(), STRING, Modifiers::PUBLIC)
            .method("close", Vec::<&str>::new(), "void", Modifiers::PROTECTED),
    );
    let foo = scope.define(
        ClassBuilder::new(FOO)
            .extends(BASE)
            .constructor(Vec::<&str>::new(), Modifiers::PUBLIC)
            .constructor([STRING], Modifiers::PUBLIC)
            .method("greet", [STRING], STRING, Modifiers::PUBLIC)
            .method("greet", [STRING, "int"], STRING, Modifiers::PUBLIC)
            .method("describe", Vec::<&str>::new(), STRING, Modifiers::PUBLIC)
            .field("count", "int", Modifiers::PRIVATE),
    );
    (scope, foo)
}

pub fn members(scope: &dyn ClassScope, ty: &TypeRef, kind: MemberKind) -> Vec<ResolvedMember> {
    scope.declared_members(ty, kind)
}

pub fn method(scope: &dyn ClassScope, ty: &TypeRef, name: &str, arity: usize) -> ResolvedMember {
    members(scope, ty, MemberKind::Method)
        .into_iter()
        .find(|m| m.name() == name && m.parameter_types().len() == arity)
        .unwrap()
}

pub struct Harness {
    pub bridge: HookBridge,
    pub engine: Arc<SoftwareEngine>,
    pub reporter: RecordingReporter,
}

pub fn harness() -> Harness {
    init_tracing();
    let engine = Arc::new(SoftwareEngine::new());
    let reporter = RecordingReporter::new();
    let bridge = HookBridge::new(engine.clone()).with_reporter(reporter.clone());
    Harness {
        bridge,
        engine,
        reporter,
    }
}
