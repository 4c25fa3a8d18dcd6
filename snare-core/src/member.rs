//! Reflected members: constructors, methods and fields.

use crate::types::TypeRef;
use bitflags::bitflags;
use std::fmt;
use std::sync::Arc;

/// The kind of member a rule targets.
///
/// Names only apply to methods and fields; parameters only to
/// constructors and methods.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MemberKind {
    /// A constructor (`<init>`).
    Constructor,
    /// A method.
    Method,
    /// A field.
    Field,
}

impl MemberKind {
    /// Whether members of this kind carry a name that rules may filter on.
    pub const fn is_named(self) -> bool {
        !matches!(self, MemberKind::Constructor)
    }

    /// Whether members of this kind take parameters.
    pub const fn has_params(self) -> bool {
        !matches!(self, MemberKind::Field)
    }
}

impl fmt::Display for MemberKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            MemberKind::Constructor => "constructor",
            MemberKind::Method => "method",
            MemberKind::Field => "field",
        })
    }
}

bitflags! {
    /// Modifier bits as reported by the reflective type system.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct Modifiers: u32 {
        /// `public`
        const PUBLIC = 0x0001;
        /// `private`
        const PRIVATE = 0x0002;
        /// `protected`
        const PROTECTED = 0x0004;
        /// `static`
        const STATIC = 0x0008;
        /// `final`
        const FINAL = 0x0010;
        /// `synchronized`
        const SYNCHRONIZED = 0x0020;
        /// `volatile`
        const VOLATILE = 0x0040;
        /// `transient`
        const TRANSIENT = 0x0080;
        /// `native`
        const NATIVE = 0x0100;
        /// `interface`
        const INTERFACE = 0x0200;
        /// `abstract`
        const ABSTRACT = 0x0400;
        /// `strictfp`
        const STRICT = 0x0800;
    }
}

/// Opaque handle the reflective type system uses to identify a member.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct MemberId(pub u64);

/// A concrete member produced by the resolution engine.
///
/// Immutable once created; cloning is cheap.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ResolvedMember {
    inner: Arc<MemberInner>,
}

#[derive(Debug, PartialEq, Eq, Hash)]
struct MemberInner {
    kind: MemberKind,
    declaring_type: TypeRef,
    name: Arc<str>,
    parameter_types: Vec<TypeRef>,
    value_type: Option<TypeRef>,
    modifiers: Modifiers,
    id: MemberId,
}

impl ResolvedMember {
    /// Create a constructor descriptor.
    pub fn constructor(
        declaring_type: TypeRef,
        parameter_types: Vec<TypeRef>,
        modifiers: Modifiers,
        id: MemberId,
    ) -> Self {
        Self::new(
            MemberKind::Constructor,
            declaring_type,
            "<init>",
            parameter_types,
            None,
            modifiers,
            id,
        )
    }

    /// Create a method descriptor.
    pub fn method(
        declaring_type: TypeRef,
        name: impl Into<Arc<str>>,
        parameter_types: Vec<TypeRef>,
        return_type: TypeRef,
        modifiers: Modifiers,
        id: MemberId,
    ) -> Self {
        Self::new(
            MemberKind::Method,
            declaring_type,
            name,
            parameter_types,
            Some(return_type),
            modifiers,
            id,
        )
    }

    /// Create a field descriptor.
    pub fn field(
        declaring_type: TypeRef,
        name: impl Into<Arc<str>>,
        field_type: TypeRef,
        modifiers: Modifiers,
        id: MemberId,
    ) -> Self {
        Self::new(
            MemberKind::Field,
            declaring_type,
            name,
            Vec::new(),
            Some(field_type),
            modifiers,
            id,
        )
    }

    fn new(
        kind: MemberKind,
        declaring_type: TypeRef,
        name: impl Into<Arc<str>>,
        parameter_types: Vec<TypeRef>,
        value_type: Option<TypeRef>,
        modifiers: Modifiers,
        id: MemberId,
    ) -> Self {
        Self {
            inner: Arc::new(MemberInner {
                kind,
                declaring_type,
                name: name.into(),
                parameter_types,
                value_type,
                modifiers,
                id,
            }),
        }
    }

    /// Member kind.
    pub fn kind(&self) -> MemberKind {
        self.inner.kind
    }

    /// The type that declares this member.
    pub fn declaring_type(&self) -> &TypeRef {
        &self.inner.declaring_type
    }

    /// Member name (`<init>` for constructors).
    pub fn name(&self) -> &str {
        &self.inner.name
    }

    /// Ordered parameter types. Always empty for fields.
    pub fn parameter_types(&self) -> &[TypeRef] {
        &self.inner.parameter_types
    }

    /// Return type for methods, declared type for fields.
    pub fn value_type(&self) -> Option<&TypeRef> {
        self.inner.value_type.as_ref()
    }

    /// Modifier bits.
    pub fn modifiers(&self) -> Modifiers {
        self.inner.modifiers
    }

    /// Opaque reflective handle.
    pub fn id(&self) -> MemberId {
        self.inner.id
    }
}

impl fmt::Display for ResolvedMember {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}#{}", self.inner.declaring_type, self.inner.name)?;
        if self.inner.kind.has_params() {
            f.write_str("(")?;
            for (i, ty) in self.inner.parameter_types.iter().enumerate() {
                if i > 0 {
                    f.write_str(", ")?;
                }
                write!(f, "{ty}")?;
            }
            f.write_str(")")?;
        }
        Ok(())
    }
}
