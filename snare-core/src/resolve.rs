//! # Resolution Engine
//!
//! Turns [`MemberRules`] into concrete members of a live type.
//!
//! A query runs in two steps:
//!
//! 1. **Plan**: every [`TypeSpec`](crate::TypeSpec) in the rule is resolved
//!    once against the scope. A position that can never match (an
//!    undefined or unresolvable type) short-circuits the whole query to
//!    [`MatchResult::NotFound`] before any member is enumerated.
//! 2. **Scan**: declared members of the target (and, on request, of its
//!    supertypes up to but excluding the root type) are enumerated in
//!    declaration order and checked cheapest criterion first:
//!    name, modifiers, parameter count, parameter types, value type.
//!
//! The engine only reads the scope and the rule, so it may be used from
//! many hook callbacks concurrently.

use crate::{
    error::ResolveError,
    member::{MemberKind, ResolvedMember},
    rules::{CountSpec, MemberRules, ParamSpec, RuleData},
    scope::ClassScope,
    types::{Slot, TypeRef},
};

/// How many matches a query should produce.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum QueryMode {
    /// Stop at the first match.
    #[default]
    First,
    /// Collect every match.
    All,
    /// Collect every match and report more than one as ambiguous.
    Unique,
}

/// Outcome of a resolution.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MatchResult {
    /// Exactly one member (first match, or the only match in `Unique` mode).
    Single(ResolvedMember),
    /// Every match, in enumeration order (`All` mode).
    Many(Vec<ResolvedMember>),
    /// Nothing matched.
    NotFound,
    /// Several members matched a `Unique` query.
    Ambiguous(Vec<ResolvedMember>),
}

impl MatchResult {
    /// Number of members carried by the result.
    pub fn len(&self) -> usize {
        match self {
            MatchResult::Single(_) => 1,
            MatchResult::Many(members) | MatchResult::Ambiguous(members) => members.len(),
            MatchResult::NotFound => 0,
        }
    }

    /// Whether nothing matched.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// The first member carried by the result, if any.
    pub fn first(&self) -> Option<&ResolvedMember> {
        match self {
            MatchResult::Single(member) => Some(member),
            MatchResult::Many(members) | MatchResult::Ambiguous(members) => members.first(),
            MatchResult::NotFound => None,
        }
    }

    /// Every member carried by the result, in order.
    pub fn into_vec(self) -> Vec<ResolvedMember> {
        match self {
            MatchResult::Single(member) => vec![member],
            MatchResult::Many(members) | MatchResult::Ambiguous(members) => members,
            MatchResult::NotFound => Vec::new(),
        }
    }

    /// Require exactly one member.
    ///
    /// A `Many` result with a single entry is accepted.
    pub fn single(self, kind: MemberKind, target: &TypeRef) -> Result<ResolvedMember, ResolveError> {
        match self {
            MatchResult::Single(member) => Ok(member),
            MatchResult::Many(mut members) if members.len() == 1 => Ok(members.remove(0)),
            MatchResult::NotFound => Err(ResolveError::NotFound {
                kind,
                target: target.to_string(),
            }),
            MatchResult::Many(members) | MatchResult::Ambiguous(members) => {
                Err(ResolveError::Ambiguous {
                    target: target.to_string(),
                    count: members.len(),
                })
            }
        }
    }

    /// Require at least one member.
    pub fn many(self, kind: MemberKind, target: &TypeRef) -> Result<Vec<ResolvedMember>, ResolveError> {
        if self.is_empty() {
            return Err(ResolveError::NotFound {
                kind,
                target: target.to_string(),
            });
        }
        Ok(self.into_vec())
    }
}

/// Compiled form of a rule for one scope.
struct Plan<'r> {
    rules: &'r RuleData,
    params: ParamPlan<'r>,
    value_type: Option<Slot>,
}

enum ParamPlan<'r> {
    Unset,
    Slots(Vec<Slot>),
    Predicate(&'r (dyn Fn(&[TypeRef]) -> bool + Send + Sync)),
}

impl<'r> Plan<'r> {
    fn compile(rules: &'r RuleData, scope: &dyn ClassScope) -> Self {
        let params = match rules.params() {
            ParamSpec::Unset => ParamPlan::Unset,
            ParamSpec::Types(specs) => {
                ParamPlan::Slots(specs.iter().map(|s| Slot::compile(s, scope)).collect())
            }
            ParamSpec::Predicate(p) => ParamPlan::Predicate(p.as_ref()),
        };
        Self {
            rules,
            params,
            value_type: rules.value_type().map(|s| Slot::compile(s, scope)),
        }
    }

    /// Whether some position can never be satisfied by any candidate.
    fn is_unsatisfiable(&self) -> bool {
        let params = matches!(&self.params, ParamPlan::Slots(slots) if slots.iter().any(Slot::is_never));
        params || self.value_type.as_ref().is_some_and(Slot::is_never)
    }

    fn accepts(&self, member: &ResolvedMember) -> bool {
        if let Some(name) = self.rules.name()
            && !name.accepts(member.name())
        {
            return false;
        }
        if let Some(modifiers) = self.rules.modifiers()
            && !modifiers(member.modifiers())
        {
            return false;
        }

        let params = member.parameter_types();
        let count = self.rules.param_count();
        if !count.accepts(params.len()) {
            return false;
        }
        match &self.params {
            ParamPlan::Unset => {}
            ParamPlan::Slots(slots) => {
                if let CountSpec::Exact(n) = count
                    && *n != slots.len()
                {
                    tracing::trace!(
                        member = %member,
                        count = n,
                        types = slots.len(),
                        "parameter count and type list disagree, skipping candidate"
                    );
                    return false;
                }
                if slots.len() != params.len()
                    || !slots.iter().zip(params).all(|(slot, ty)| slot.accepts(ty))
                {
                    return false;
                }
            }
            ParamPlan::Predicate(p) => {
                if !p(params) {
                    return false;
                }
            }
        }

        match (&self.value_type, member.value_type()) {
            (None, _) => true,
            (Some(slot), Some(ty)) => slot.accepts(ty),
            (Some(_), None) => false,
        }
    }
}

/// Resolves [`MemberRules`] against types of one scope.
///
/// ```rust,ignore
/// let resolver = MemberResolver::new(&scope);
/// let rules = ConstructorRules::new().empty_param().build()?;
/// let ctor = resolver.resolve_one(&foo, &rules, false)?;
/// ```
pub struct MemberResolver<'s> {
    scope: &'s dyn ClassScope,
    superclass_first: bool,
}

impl<'s> MemberResolver<'s> {
    /// Create a resolver over `scope`.
    pub fn new(scope: &'s dyn ClassScope) -> Self {
        Self {
            scope,
            superclass_first: false,
        }
    }

    /// When superclasses are included, try their members before the
    /// target's own. By default the target's declared members come first.
    pub fn superclass_first(mut self) -> Self {
        self.superclass_first = true;
        self
    }

    /// The scope this resolver reads from.
    pub fn scope(&self) -> &'s dyn ClassScope {
        self.scope
    }

    /// Resolve `rules` against `target`.
    ///
    /// Never fails: "nothing matched" is [`MatchResult::NotFound`].
    pub fn resolve(
        &self,
        target: &TypeRef,
        rules: &MemberRules,
        mode: QueryMode,
        include_superclasses: bool,
    ) -> MatchResult {
        let plan = Plan::compile(rules.data(), self.scope);
        if plan.is_unsatisfiable() {
            tracing::debug!(
                target = %target,
                kind = %rules.kind(),
                "rule contains an undefined type, no candidate can match"
            );
            return MatchResult::NotFound;
        }

        let mut found = Vec::new();
        for ty in self.hierarchy(target, include_superclasses) {
            for member in self.scope.declared_members(&ty, rules.kind()) {
                if !plan.accepts(&member) {
                    continue;
                }
                if mode == QueryMode::First {
                    return MatchResult::Single(member);
                }
                found.push(member);
            }
        }

        tracing::trace!(target = %target, kind = %rules.kind(), matches = found.len(), "resolved rule");
        match (mode, found.len()) {
            (_, 0) => MatchResult::NotFound,
            (QueryMode::Unique, 1) => MatchResult::Single(found.remove(0)),
            (QueryMode::Unique, _) => MatchResult::Ambiguous(found),
            _ => MatchResult::Many(found),
        }
    }

    /// Resolve `rules` to exactly one member of `target`.
    ///
    /// Runs a [`QueryMode::Unique`] query, so several matches are an
    /// [`ResolveError::Ambiguous`] error rather than the first of them.
    pub fn resolve_one(
        &self,
        target: &TypeRef,
        rules: &MemberRules,
        include_superclasses: bool,
    ) -> Result<ResolvedMember, ResolveError> {
        self.resolve(target, rules, QueryMode::Unique, include_superclasses)
            .single(rules.kind(), target)
    }

    /// Resolve `rules` to every matching member of `target`, failing when
    /// there are none.
    pub fn resolve_many(
        &self,
        target: &TypeRef,
        rules: &MemberRules,
        include_superclasses: bool,
    ) -> Result<Vec<ResolvedMember>, ResolveError> {
        self.resolve(target, rules, QueryMode::All, include_superclasses)
            .many(rules.kind(), target)
    }

    /// Types to scan, in precedence order.
    fn hierarchy(&self, target: &TypeRef, include_superclasses: bool) -> Vec<TypeRef> {
        let mut chain = vec![target.clone()];
        if include_superclasses {
            let mut current = self.scope.superclass(target);
            while let Some(ty) = current {
                if self.scope.is_root_type(&ty) || chain.contains(&ty) {
                    break;
                }
                current = self.scope.superclass(&ty);
                chain.push(ty);
            }
            if self.superclass_first {
                chain.reverse();
            }
        }
        chain
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        member::{MemberId, Modifiers},
        rules::{ConstructorRules, FieldRules, MethodRules},
        types::TypeSpec,
    };
    use std::collections::HashMap;

    /// A small fixed hierarchy: Object <- Base <- Foo.
    struct Fixture {
        members: HashMap<(&'static str, MemberKind), Vec<ResolvedMember>>,
    }

    fn ty(name: &str) -> TypeRef {
        TypeRef::new(name)
    }

    impl Fixture {
        fn new() -> Self {
            let foo = ty("com.example.Foo");
            let base = ty("com.example.Base");
            let string = ty("java.lang.String");
            let int = ty("int");
            let void = ty("void");

            let mut members = HashMap::new();
            members.insert(
                ("com.example.Foo", MemberKind::Constructor),
                vec![
                    ResolvedMember::constructor(foo.clone(), vec![], Modifiers::PUBLIC, MemberId(1)),
                    ResolvedMember::constructor(
                        foo.clone(),
                        vec![string.clone()],
                        Modifiers::PUBLIC,
                        MemberId(2),
                    ),
                    ResolvedMember::constructor(
                        foo.clone(),
                        vec![string.clone(), int.clone()],
                        Modifiers::PRIVATE,
                        MemberId(3),
                    ),
                ],
            );
            members.insert(
                ("com.example.Foo", MemberKind::Method),
                vec![
                    ResolvedMember::method(
                        foo.clone(),
                        "run",
                        vec![int.clone()],
                        void.clone(),
                        Modifiers::PUBLIC,
                        MemberId(4),
                    ),
                    ResolvedMember::method(
                        foo.clone(),
                        "name",
                        vec![],
                        string.clone(),
                        Modifiers::PUBLIC | Modifiers::FINAL,
                        MemberId(5),
                    ),
                ],
            );
            members.insert(
                ("com.example.Base", MemberKind::Method),
                vec![ResolvedMember::method(
                    base.clone(),
                    "run",
                    vec![string.clone()],
                    void,
                    Modifiers::PROTECTED,
                    MemberId(6),
                )],
            );
            members.insert(
                ("java.lang.Object", MemberKind::Method),
                vec![ResolvedMember::method(
                    ty("java.lang.Object"),
                    "run",
                    vec![],
                    ty("void"),
                    Modifiers::PUBLIC,
                    MemberId(7),
                )],
            );
            members.insert(
                ("com.example.Foo", MemberKind::Field),
                vec![ResolvedMember::field(foo, "count", int, Modifiers::PRIVATE, MemberId(8))],
            );
            Self { members }
        }
    }

    impl ClassScope for Fixture {
        fn find_type(&self, name: &str) -> Option<TypeRef> {
            ["com.example.Foo", "com.example.Base", "java.lang.Object", "java.lang.String", "int"]
                .contains(&name)
                .then(|| ty(name))
        }

        fn superclass(&self, t: &TypeRef) -> Option<TypeRef> {
            match t.name() {
                "com.example.Foo" => Some(ty("com.example.Base")),
                "com.example.Base" => Some(ty("java.lang.Object")),
                _ => None,
            }
        }

        fn declared_members(&self, t: &TypeRef, kind: MemberKind) -> Vec<ResolvedMember> {
            self.members
                .iter()
                .find(|((name, k), _)| *name == t.name() && *k == kind)
                .map(|(_, m)| m.clone())
                .unwrap_or_default()
        }

        fn is_root_type(&self, t: &TypeRef) -> bool {
            t.name() == "java.lang.Object"
        }
    }

    fn ids(result: MatchResult) -> Vec<u64> {
        result.into_vec().iter().map(|m| m.id().0).collect()
    }

    #[test]
    fn empty_param_selects_no_arg_constructor() {
        let scope = Fixture::new();
        let resolver = MemberResolver::new(&scope);
        let rules = ConstructorRules::new().empty_param().build().unwrap();
        let result = resolver.resolve(&ty("com.example.Foo"), &rules, QueryMode::All, false);
        assert_eq!(ids(result), vec![1]);
    }

    #[test]
    fn vague_position_accepts_any_type() {
        let scope = Fixture::new();
        let resolver = MemberResolver::new(&scope);
        let rules = ConstructorRules::new()
            .param([TypeSpec::Vague, "int".into()])
            .build()
            .unwrap();
        let result = resolver.resolve(&ty("com.example.Foo"), &rules, QueryMode::All, false);
        assert_eq!(ids(result), vec![3]);
    }

    #[test]
    fn first_all_and_unique_modes() {
        let scope = Fixture::new();
        let resolver = MemberResolver::new(&scope);
        let foo = ty("com.example.Foo");
        let rules = ConstructorRules::new().build().unwrap();

        assert_eq!(ids(resolver.resolve(&foo, &rules, QueryMode::First, false)), vec![1]);
        assert_eq!(ids(resolver.resolve(&foo, &rules, QueryMode::All, false)), vec![1, 2, 3]);
        assert!(matches!(
            resolver.resolve(&foo, &rules, QueryMode::Unique, false),
            MatchResult::Ambiguous(m) if m.len() == 3
        ));
    }

    #[test]
    fn superclass_walk_stops_at_root() {
        let scope = Fixture::new();
        let foo = ty("com.example.Foo");
        let rules = MethodRules::new().name("run").build().unwrap();

        let own = MemberResolver::new(&scope).resolve(&foo, &rules, QueryMode::All, false);
        assert_eq!(ids(own), vec![4]);

        let with_supers = MemberResolver::new(&scope).resolve(&foo, &rules, QueryMode::All, true);
        assert_eq!(ids(with_supers), vec![4, 6]);

        let supers_first = MemberResolver::new(&scope)
            .superclass_first()
            .resolve(&foo, &rules, QueryMode::First, true);
        assert_eq!(ids(supers_first), vec![6]);
    }

    #[test]
    fn count_and_type_list_disagreement_skips_candidate() {
        let scope = Fixture::new();
        let resolver = MemberResolver::new(&scope);
        let rules = MethodRules::new()
            .name("run")
            .param_count(2)
            .param([TypeSpec::Vague])
            .build()
            .unwrap();
        let result = resolver.resolve(&ty("com.example.Foo"), &rules, QueryMode::First, true);
        assert_eq!(result, MatchResult::NotFound);
    }

    #[test]
    fn undefined_type_fails_fast() {
        let scope = Fixture::new();
        let resolver = MemberResolver::new(&scope);
        let rules = ConstructorRules::new()
            .param(["com.example.Missing"])
            .build()
            .unwrap();
        let result = resolver.resolve(&ty("com.example.Foo"), &rules, QueryMode::All, false);
        assert_eq!(result, MatchResult::NotFound);
    }

    #[test]
    fn modifiers_and_value_types() {
        let scope = Fixture::new();
        let resolver = MemberResolver::new(&scope);
        let foo = ty("com.example.Foo");

        let rules = MethodRules::new()
            .modifiers(|m| m.contains(Modifiers::FINAL))
            .build()
            .unwrap();
        assert_eq!(ids(resolver.resolve(&foo, &rules, QueryMode::All, false)), vec![5]);

        let rules = MethodRules::new().return_type("void").build().unwrap();
        // "void" is not resolvable in this scope.
        assert!(resolver.resolve(&foo, &rules, QueryMode::All, false).is_empty());

        let rules = FieldRules::new().field_type(ty("int")).build().unwrap();
        assert_eq!(ids(resolver.resolve(&foo, &rules, QueryMode::First, false)), vec![8]);
    }

    #[test]
    fn params_predicate_sees_resolved_types() {
        let scope = Fixture::new();
        let resolver = MemberResolver::new(&scope);
        let rules = ConstructorRules::new()
            .param_by(|types| types.last().is_some_and(|t| t.name() == "int"))
            .build()
            .unwrap();
        let result = resolver.resolve(&ty("com.example.Foo"), &rules, QueryMode::All, false);
        assert_eq!(ids(result), vec![3]);
    }

    #[test]
    fn single_and_many_conversions() {
        let foo = ty("com.example.Foo");
        let err = MatchResult::NotFound
            .single(MemberKind::Method, &foo)
            .unwrap_err();
        assert!(matches!(err, ResolveError::NotFound { .. }));

        let scope = Fixture::new();
        let rules = ConstructorRules::new().build().unwrap();
        let all = MemberResolver::new(&scope).resolve(&foo, &rules, QueryMode::All, false);
        let err = all.clone().single(MemberKind::Constructor, &foo).unwrap_err();
        assert_eq!(err, ResolveError::Ambiguous { target: foo.to_string(), count: 3 });
        assert_eq!(all.many(MemberKind::Constructor, &foo).unwrap().len(), 3);
    }

    #[test]
    fn resolve_one_and_many_carry_the_rule_kind() {
        let scope = Fixture::new();
        let resolver = MemberResolver::new(&scope);
        let foo = ty("com.example.Foo");

        let no_arg = ConstructorRules::new().empty_param().build().unwrap();
        assert_eq!(resolver.resolve_one(&foo, &no_arg, false).unwrap().id(), MemberId(1));

        let any = ConstructorRules::new().build().unwrap();
        assert_eq!(
            resolver.resolve_one(&foo, &any, false).unwrap_err(),
            ResolveError::Ambiguous { target: foo.to_string(), count: 3 }
        );
        assert_eq!(resolver.resolve_many(&foo, &any, false).unwrap().len(), 3);

        let runs = MethodRules::new().name("run").build().unwrap();
        assert_eq!(resolver.resolve_many(&foo, &runs, true).unwrap().len(), 2);

        let missing = FieldRules::new().name("missing").build().unwrap();
        assert_eq!(
            resolver.resolve_many(&foo, &missing, true).unwrap_err(),
            ResolveError::NotFound { kind: MemberKind::Field, target: foo.to_string() }
        );
    }
}
