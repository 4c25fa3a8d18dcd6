//! The reflective type system, consumed read-only.

use crate::{
    member::{MemberKind, ResolvedMember},
    types::TypeRef,
};
use std::sync::Arc;

/// A type-resolution context (the classloader of the target process).
///
/// Implementations wrap whatever reflective facility the host offers. The
/// resolution engine only reads through this trait and may call it from
/// several hook callbacks at once.
#[diagnostic::on_unimplemented(
    message = "`{Self}` is not a reflective type scope",
    label = "missing `ClassScope` implementation",
    note = "Implement `find_type`, `superclass`, `declared_members` and `is_root_type` to resolve rules against `{Self}`."
)]
pub trait ClassScope: Send + Sync {
    /// Resolve a fully-qualified type name within this scope.
    fn find_type(&self, name: &str) -> Option<TypeRef>;

    /// Direct supertype of `ty`, if any.
    fn superclass(&self, ty: &TypeRef) -> Option<TypeRef>;

    /// Members of `kind` declared directly on `ty`, in declaration order.
    fn declared_members(&self, ty: &TypeRef, kind: MemberKind) -> Vec<ResolvedMember>;

    /// Whether `ty` is the universal root type.
    ///
    /// Superclass walks stop before the root, so its members are never
    /// candidates. Scopes without a root type return `false`.
    fn is_root_type(&self, ty: &TypeRef) -> bool;
}

impl<S: ClassScope + ?Sized> ClassScope for Arc<S> {
    fn find_type(&self, name: &str) -> Option<TypeRef> {
        (**self).find_type(name)
    }

    fn superclass(&self, ty: &TypeRef) -> Option<TypeRef> {
        (**self).superclass(ty)
    }

    fn declared_members(&self, ty: &TypeRef, kind: MemberKind) -> Vec<ResolvedMember> {
        (**self).declared_members(ty, kind)
    }

    fn is_root_type(&self, ty: &TypeRef) -> bool {
        (**self).is_root_type(ty)
    }
}

/// Shared, type-erased scope as stored in process contexts.
pub type SharedScope = Arc<dyn ClassScope>;
