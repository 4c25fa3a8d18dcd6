//! # Member Rules
//!
//! Declarative criteria describing which constructor, method or field to
//! resolve. Every criterion is optional; an unset criterion constrains
//! nothing.
//!
//! Rules are written through the typed builders [`ConstructorRules`],
//! [`MethodRules`] and [`FieldRules`], which only expose the criteria that
//! make sense for their kind, or through the untyped [`RuleBuilder`]. All of
//! them validate on [`build`](RuleBuilder::build) and yield a
//! [`MemberRules`] that can be resolved against any number of types and
//! scopes without being declared again.
//!
//! ```rust,ignore
//! let rules = MethodRules::new()
//!     .name("onCreate")
//!     .param(["android.os.Bundle"])
//!     .modifiers(|m| !m.contains(Modifiers::STATIC))
//!     .build()?;
//! ```

use crate::{
    error::ConfigError,
    member::{MemberKind, Modifiers},
    types::{TypeRef, TypeSpec},
};
use std::{fmt, ops::RangeInclusive, sync::Arc};

/// Predicate over a parameter count.
pub type CountPredicate = Arc<dyn Fn(usize) -> bool + Send + Sync>;
/// Predicate over modifier bits.
pub type ModifierPredicate = Arc<dyn Fn(Modifiers) -> bool + Send + Sync>;
/// Predicate over a member name.
pub type NamePredicate = Arc<dyn Fn(&str) -> bool + Send + Sync>;
/// Predicate over the ordered, resolved parameter types.
pub type TypesPredicate = Arc<dyn Fn(&[TypeRef]) -> bool + Send + Sync>;

/// Constraint on the number of parameters.
#[derive(Clone, Default)]
pub enum CountSpec {
    /// Any number of parameters.
    #[default]
    Unconstrained,
    /// Exactly `n` parameters.
    Exact(usize),
    /// Between `lo` and `hi` parameters, inclusive.
    Range(usize, usize),
    /// Any count accepted by the predicate.
    Predicate(CountPredicate),
}

impl CountSpec {
    /// Whether a member with `count` parameters satisfies this constraint.
    pub fn accepts(&self, count: usize) -> bool {
        match self {
            CountSpec::Unconstrained => true,
            CountSpec::Exact(n) => count == *n,
            CountSpec::Range(lo, hi) => (*lo..=*hi).contains(&count),
            CountSpec::Predicate(p) => p(count),
        }
    }

    /// Whether the constraint is [`CountSpec::Unconstrained`].
    pub fn is_unconstrained(&self) -> bool {
        matches!(self, CountSpec::Unconstrained)
    }
}

impl From<usize> for CountSpec {
    fn from(n: usize) -> Self {
        CountSpec::Exact(n)
    }
}

impl From<RangeInclusive<usize>> for CountSpec {
    fn from(range: RangeInclusive<usize>) -> Self {
        CountSpec::Range(*range.start(), *range.end())
    }
}

impl fmt::Debug for CountSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CountSpec::Unconstrained => f.write_str("Unconstrained"),
            CountSpec::Exact(n) => f.debug_tuple("Exact").field(n).finish(),
            CountSpec::Range(lo, hi) => write!(f, "Range({lo}..={hi})"),
            CountSpec::Predicate(_) => f.write_str("Predicate(..)"),
        }
    }
}

/// Constraint on a member name.
#[derive(Clone)]
pub enum NameSpec {
    /// The exact name.
    Exact(String),
    /// Any name accepted by the predicate.
    Predicate(NamePredicate),
}

impl NameSpec {
    /// Whether `name` satisfies this constraint.
    pub fn accepts(&self, name: &str) -> bool {
        match self {
            NameSpec::Exact(expected) => expected == name,
            NameSpec::Predicate(p) => p(name),
        }
    }
}

impl From<&str> for NameSpec {
    fn from(name: &str) -> Self {
        NameSpec::Exact(name.to_string())
    }
}

impl From<String> for NameSpec {
    fn from(name: String) -> Self {
        NameSpec::Exact(name)
    }
}

impl fmt::Debug for NameSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NameSpec::Exact(name) => f.debug_tuple("Exact").field(name).finish(),
            NameSpec::Predicate(_) => f.write_str("Predicate(..)"),
        }
    }
}

/// Constraint on parameter types. At most one form is active.
#[derive(Clone, Default)]
pub enum ParamSpec {
    /// No constraint.
    #[default]
    Unset,
    /// One spec per position; also fixes the arity.
    Types(Vec<TypeSpec>),
    /// A predicate over the resolved parameter types.
    Predicate(TypesPredicate),
}

impl fmt::Debug for ParamSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParamSpec::Unset => f.write_str("Unset"),
            ParamSpec::Types(types) => f.debug_tuple("Types").field(types).finish(),
            ParamSpec::Predicate(_) => f.write_str("Predicate(..)"),
        }
    }
}

/// The criteria of one rule.
///
/// Owned by its builder until [`RuleBuilder::build`] freezes it into
/// [`MemberRules`]; the resolution engine only reads it.
#[derive(Clone)]
pub struct RuleData {
    kind: MemberKind,
    name: Option<NameSpec>,
    modifiers: Option<ModifierPredicate>,
    param_count: CountSpec,
    params: ParamSpec,
    value_type: Option<TypeSpec>,
}

impl RuleData {
    fn new(kind: MemberKind) -> Self {
        Self {
            kind,
            name: None,
            modifiers: None,
            param_count: CountSpec::Unconstrained,
            params: ParamSpec::Unset,
            value_type: None,
        }
    }

    /// Kind of member this rule targets.
    pub fn kind(&self) -> MemberKind {
        self.kind
    }

    /// Name constraint.
    pub fn name(&self) -> Option<&NameSpec> {
        self.name.as_ref()
    }

    /// Modifier predicate.
    pub fn modifiers(&self) -> Option<&ModifierPredicate> {
        self.modifiers.as_ref()
    }

    /// Parameter count constraint.
    pub fn param_count(&self) -> &CountSpec {
        &self.param_count
    }

    /// Parameter type constraint.
    pub fn params(&self) -> &ParamSpec {
        &self.params
    }

    /// Return type (methods) or declared type (fields) constraint.
    pub fn value_type(&self) -> Option<&TypeSpec> {
        self.value_type.as_ref()
    }

    fn validate(&self) -> Result<(), ConfigError> {
        let not_applicable = |criterion| ConfigError::CriterionNotApplicable {
            kind: self.kind,
            criterion,
        };

        if !self.kind.is_named() && self.name.is_some() {
            return Err(not_applicable("name"));
        }
        if !self.kind.has_params() {
            if !self.param_count.is_unconstrained() {
                return Err(not_applicable("parameter count"));
            }
            if !matches!(self.params, ParamSpec::Unset) {
                return Err(not_applicable("parameter types"));
            }
        }
        if self.kind == MemberKind::Constructor && self.value_type.is_some() {
            return Err(not_applicable("value type"));
        }
        if let CountSpec::Range(lo, hi) = self.param_count
            && lo > hi
        {
            return Err(ConfigError::InvertedRange { lo, hi });
        }
        if let ParamSpec::Types(types) = &self.params
            && types.is_empty()
        {
            return Err(ConfigError::EmptyParamList);
        }
        Ok(())
    }
}

impl fmt::Debug for RuleData {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RuleData")
            .field("kind", &self.kind)
            .field("name", &self.name)
            .field("modifiers", &self.modifiers.as_ref().map(|_| ".."))
            .field("param_count", &self.param_count)
            .field("params", &self.params)
            .field("value_type", &self.value_type)
            .finish()
    }
}

/// Validated, immutable rule ready for resolution.
///
/// Cheap to clone and safe to share between threads.
#[derive(Clone, Debug)]
pub struct MemberRules(Arc<RuleData>);

impl MemberRules {
    /// Kind of member this rule targets.
    pub fn kind(&self) -> MemberKind {
        self.0.kind
    }

    /// The underlying criteria.
    pub fn data(&self) -> &RuleData {
        &self.0
    }
}

/// Untyped rule builder exposing every criterion.
///
/// Criteria that do not apply to the chosen kind are rejected by
/// [`build`](Self::build) with [`ConfigError::CriterionNotApplicable`].
#[derive(Clone, Debug)]
pub struct RuleBuilder {
    data: RuleData,
    // The current count came from `empty_param` rather than `param_count`.
    empty_param: bool,
}

impl RuleBuilder {
    /// Start an empty rule for `kind`.
    pub fn new(kind: MemberKind) -> Self {
        Self {
            data: RuleData::new(kind),
            empty_param: false,
        }
    }

    /// Require an exact name.
    pub fn name(mut self, name: impl Into<NameSpec>) -> Self {
        self.data.name = Some(name.into());
        self
    }

    /// Require a name accepted by `predicate`.
    pub fn name_by(mut self, predicate: impl Fn(&str) -> bool + Send + Sync + 'static) -> Self {
        self.data.name = Some(NameSpec::Predicate(Arc::new(predicate)));
        self
    }

    /// Require modifier bits accepted by `predicate`.
    pub fn modifiers(
        mut self,
        predicate: impl Fn(Modifiers) -> bool + Send + Sync + 'static,
    ) -> Self {
        self.data.modifiers = Some(Arc::new(predicate));
        self
    }

    /// Constrain the parameter count with an exact value or inclusive range.
    pub fn param_count(mut self, count: impl Into<CountSpec>) -> Self {
        self.data.param_count = count.into();
        self.empty_param = false;
        self
    }

    /// Constrain the parameter count with a predicate.
    pub fn param_count_by(
        mut self,
        predicate: impl Fn(usize) -> bool + Send + Sync + 'static,
    ) -> Self {
        self.data.param_count = CountSpec::Predicate(Arc::new(predicate));
        self.empty_param = false;
        self
    }

    /// Require a member without parameters.
    ///
    /// Replaces any parameter type list set earlier.
    pub fn empty_param(mut self) -> Self {
        self.data.param_count = CountSpec::Exact(0);
        self.data.params = ParamSpec::Unset;
        self.empty_param = true;
        self
    }

    /// Require these parameter types, in order.
    ///
    /// Use [`TypeSpec::Vague`] for positions whose type does not matter.
    /// Replaces an earlier [`empty_param`](Self::empty_param). A count set
    /// with [`param_count`](Self::param_count) is kept.
    pub fn param<I>(mut self, types: I) -> Self
    where
        I: IntoIterator,
        I::Item: Into<TypeSpec>,
    {
        if std::mem::take(&mut self.empty_param) {
            self.data.param_count = CountSpec::Unconstrained;
        }
        self.data.params = ParamSpec::Types(types.into_iter().map(Into::into).collect());
        self
    }

    /// Require parameter types accepted by `predicate`.
    pub fn param_by(
        mut self,
        predicate: impl Fn(&[TypeRef]) -> bool + Send + Sync + 'static,
    ) -> Self {
        self.data.params = ParamSpec::Predicate(Arc::new(predicate));
        self
    }

    /// Require a return type (methods) or declared type (fields).
    pub fn value_type(mut self, ty: impl Into<TypeSpec>) -> Self {
        self.data.value_type = Some(ty.into());
        self
    }

    /// Validate and freeze the rule.
    pub fn build(self) -> Result<MemberRules, ConfigError> {
        self.data.validate()?;
        Ok(MemberRules(Arc::new(self.data)))
    }
}

macro_rules! typed_rules {
    (
        $(#[$meta:meta])*
        $name:ident => $kind:expr;
    ) => {
        $(#[$meta])*
        #[derive(Clone, Debug)]
        pub struct $name(RuleBuilder);

        impl Default for $name {
            fn default() -> Self {
                Self::new()
            }
        }

        impl $name {
            /// Start an empty rule.
            pub fn new() -> Self {
                Self(RuleBuilder::new($kind))
            }

            /// Restrict modifiers. See [`RuleBuilder::modifiers`].
            pub fn modifiers(
                self,
                predicate: impl Fn(Modifiers) -> bool + Send + Sync + 'static,
            ) -> Self {
                Self(self.0.modifiers(predicate))
            }

            /// Validate and freeze the rule.
            pub fn build(self) -> Result<MemberRules, ConfigError> {
                self.0.build()
            }
        }
    };
}

typed_rules! {
    /// Builder for constructor rules.
    ConstructorRules => MemberKind::Constructor;
}

typed_rules! {
    /// Builder for method rules.
    MethodRules => MemberKind::Method;
}

typed_rules! {
    /// Builder for field rules.
    FieldRules => MemberKind::Field;
}

macro_rules! param_setters {
    ($($name:ident),+) => {
        $(
            impl $name {
                /// See [`RuleBuilder::param_count`].
                pub fn param_count(self, count: impl Into<CountSpec>) -> Self {
                    Self(self.0.param_count(count))
                }

                /// See [`RuleBuilder::param_count_by`].
                pub fn param_count_by(
                    self,
                    predicate: impl Fn(usize) -> bool + Send + Sync + 'static,
                ) -> Self {
                    Self(self.0.param_count_by(predicate))
                }

                /// See [`RuleBuilder::empty_param`].
                pub fn empty_param(self) -> Self {
                    Self(self.0.empty_param())
                }

                /// See [`RuleBuilder::param`].
                pub fn param<I>(self, types: I) -> Self
                where
                    I: IntoIterator,
                    I::Item: Into<TypeSpec>,
                {
                    Self(self.0.param(types))
                }

                /// See [`RuleBuilder::param_by`].
                pub fn param_by(
                    self,
                    predicate: impl Fn(&[TypeRef]) -> bool + Send + Sync + 'static,
                ) -> Self {
                    Self(self.0.param_by(predicate))
                }
            }
        )+
    };
}

param_setters!(ConstructorRules, MethodRules);

macro_rules! name_setters {
    ($($name:ident),+) => {
        $(
            impl $name {
                /// See [`RuleBuilder::name`].
                pub fn name(self, name: impl Into<NameSpec>) -> Self {
                    Self(self.0.name(name))
                }

                /// See [`RuleBuilder::name_by`].
                pub fn name_by(
                    self,
                    predicate: impl Fn(&str) -> bool + Send + Sync + 'static,
                ) -> Self {
                    Self(self.0.name_by(predicate))
                }
            }
        )+
    };
}

name_setters!(MethodRules, FieldRules);

impl MethodRules {
    /// Require a return type.
    pub fn return_type(self, ty: impl Into<TypeSpec>) -> Self {
        Self(self.0.value_type(ty))
    }
}

impl FieldRules {
    /// Require a declared field type.
    pub fn field_type(self, ty: impl Into<TypeSpec>) -> Self {
        Self(self.0.value_type(ty))
    }
}
