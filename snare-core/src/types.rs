//! # Type Matcher
//!
//! Decides whether a concrete parameter/return type satisfies a [`TypeSpec`].
//!
//! A rule author rarely has every type at hand: some types live in the
//! target process only and are known by name, others are long and
//! meaningless and are better skipped with [`TypeSpec::Vague`]. The matcher
//! folds all of these into one exhaustive comparison:
//!
//! | spec              | matches                                       |
//! |-------------------|-----------------------------------------------|
//! | `Exact(t)`        | a candidate equal to `t`                      |
//! | `ByName(s)`       | a candidate equal to `s` resolved in scope    |
//! | `Vague`           | anything                                      |
//! | `Undefined`       | nothing                                       |
//!
//! A name that cannot be resolved degrades to `Undefined`; it is reported as
//! "no match", never as an error.

use crate::scope::ClassScope;
use std::fmt;
use std::sync::Arc;

/// A concrete type known to the reflective type system.
///
/// Types compare by fully-qualified name. Cloning is cheap.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TypeRef(Arc<str>);

impl TypeRef {
    /// Create a type reference from its fully-qualified name.
    pub fn new(name: impl Into<Arc<str>>) -> Self {
        Self(name.into())
    }

    /// Fully-qualified name.
    pub fn name(&self) -> &str {
        &self.0
    }

    /// Name without the package/namespace prefix.
    pub fn simple_name(&self) -> &str {
        self.0.rsplit_once('.').map_or(&self.0, |(_, simple)| simple)
    }
}

impl fmt::Display for TypeRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// How a rule describes one type position.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum TypeSpec {
    /// A concrete type.
    Exact(TypeRef),
    /// A fully-qualified name, resolved within the query's scope.
    ByName(String),
    /// Any type at this position.
    Vague,
    /// A type that could not be resolved; never matches.
    Undefined,
}

impl From<TypeRef> for TypeSpec {
    fn from(ty: TypeRef) -> Self {
        TypeSpec::Exact(ty)
    }
}

impl From<&TypeRef> for TypeSpec {
    fn from(ty: &TypeRef) -> Self {
        TypeSpec::Exact(ty.clone())
    }
}

impl From<&str> for TypeSpec {
    fn from(name: &str) -> Self {
        TypeSpec::ByName(name.to_string())
    }
}

impl From<String> for TypeSpec {
    fn from(name: String) -> Self {
        TypeSpec::ByName(name)
    }
}

impl<T: Into<TypeSpec>> From<Option<T>> for TypeSpec {
    fn from(value: Option<T>) -> Self {
        value.map_or(TypeSpec::Undefined, Into::into)
    }
}

/// A [`TypeSpec`] with names already resolved against a scope.
///
/// The resolution engine compiles every spec of a rule once per query so
/// that name lookups are not repeated per candidate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Slot {
    Exact(TypeRef),
    Any,
    Never,
}

impl Slot {
    pub(crate) fn compile(spec: &TypeSpec, scope: &dyn ClassScope) -> Self {
        match spec {
            TypeSpec::Exact(ty) => Slot::Exact(ty.clone()),
            TypeSpec::ByName(name) => match scope.find_type(name) {
                Some(ty) => Slot::Exact(ty),
                None => {
                    tracing::debug!(name = %name, "type name did not resolve, treating as undefined");
                    Slot::Never
                }
            },
            TypeSpec::Vague => Slot::Any,
            TypeSpec::Undefined => Slot::Never,
        }
    }

    pub(crate) fn accepts(&self, candidate: &TypeRef) -> bool {
        match self {
            Slot::Exact(ty) => ty == candidate,
            Slot::Any => true,
            Slot::Never => false,
        }
    }

    pub(crate) fn is_never(&self) -> bool {
        matches!(self, Slot::Never)
    }
}

/// Whether `candidate` satisfies `spec`, resolving names within `scope`.
///
/// Pure and total: unresolvable names simply do not match.
pub fn matches(candidate: &TypeRef, spec: &TypeSpec, scope: &dyn ClassScope) -> bool {
    Slot::compile(spec, scope).accepts(candidate)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::member::{MemberKind, ResolvedMember};

    struct NameOnlyScope;

    impl ClassScope for NameOnlyScope {
        fn find_type(&self, name: &str) -> Option<TypeRef> {
            (name == "java.lang.String").then(|| TypeRef::new(name))
        }

        fn superclass(&self, _ty: &TypeRef) -> Option<TypeRef> {
            None
        }

        fn declared_members(&self, _ty: &TypeRef, _kind: MemberKind) -> Vec<ResolvedMember> {
            Vec::new()
        }

        fn is_root_type(&self, _ty: &TypeRef) -> bool {
            false
        }
    }

    #[test]
    fn every_spec_variant() {
        let string = TypeRef::new("java.lang.String");
        let int = TypeRef::new("int");
        let scope = NameOnlyScope;

        assert!(matches(&string, &TypeSpec::Exact(string.clone()), &scope));
        assert!(!matches(&int, &TypeSpec::Exact(string.clone()), &scope));

        assert!(matches(&string, &"java.lang.String".into(), &scope));
        assert!(!matches(&int, &"java.lang.String".into(), &scope));

        assert!(matches(&string, &TypeSpec::Vague, &scope));
        assert!(matches(&int, &TypeSpec::Vague, &scope));

        assert!(!matches(&string, &TypeSpec::Undefined, &scope));
    }

    #[test]
    fn unresolvable_name_never_matches() {
        let scope = NameOnlyScope;
        let missing = TypeRef::new("com.example.Missing");
        assert!(!matches(&missing, &"com.example.Missing".into(), &scope));
        assert!(Slot::compile(&"com.example.Missing".into(), &scope).is_never());
    }

    #[test]
    fn missing_optional_type_is_undefined() {
        let spec: TypeSpec = None::<TypeRef>.into();
        assert_eq!(spec, TypeSpec::Undefined);
        assert_eq!(TypeRef::new("a.b.Foo").simple_name(), "Foo");
        assert_eq!(TypeRef::new("int").simple_name(), "int");
    }
}
