use genus_identity::{Interner, ScopeId, Span, Symbol};
use smallvec::smallvec;

use super::*;
use crate::entity_registry::{DeclKind, EntityRegistry};
use crate::generic::ScopeTree;
use crate::type_arena::TypeArena;

struct Fixture {
    arena: TypeArena,
    entities: EntityRegistry,
    scopes: ScopeTree,
    interner: Interner,
    callee: Vec<TypeParamId>,
    caller: Vec<TypeParamId>,
}

impl Fixture {
    fn new(callee_params: &[&str]) -> Self {
        let mut interner = Interner::with_primitives();
        let mut scopes = ScopeTree::new();
        let params: Vec<(Symbol, Span)> = callee_params
            .iter()
            .map(|n| (interner.intern(n), Span::default()))
            .collect();
        let callee_scope = scopes.declare_scope(ScopeId::ROOT, &params, Span::default());
        let caller_scope = scopes.declare_scope(
            ScopeId::ROOT,
            &[(interner.intern("U"), Span::default())],
            Span::default(),
        );
        Self {
            callee: scopes.all_params(callee_scope),
            caller: scopes.all_params(caller_scope),
            arena: TypeArena::new(),
            entities: EntityRegistry::new(),
            scopes,
            interner,
        }
    }

    fn cx(&mut self) -> TypeCx<'_> {
        TypeCx::new(&mut self.arena, &self.entities, &self.scopes, &self.interner)
    }

    fn param(&mut self, i: usize) -> TypeId {
        let p = self.callee[i];
        self.arena.type_param(p)
    }

    fn run(&mut self, declared: &[TypeId], results: &[TypeId], args: &[ArgType]) -> Result<Substitution, DeductionError> {
        let bindable = self.callee.clone();
        let mut cx = self.cx();
        deduce(&mut cx, &bindable, Substitution::default(), declared, results, args)
    }
}

#[test]
fn repeated_parameter_binds_once() {
    let mut fx = Fixture::new(&["T"]);
    let t = fx.param(0);
    let subs = fx
        .run(&[t, t], &[], &[ArgType::Typed(TypeId::INT), ArgType::Typed(TypeId::INT)])
        .unwrap();
    assert_eq!(subs.get(&fx.callee[0]), Some(&TypeId::INT));
}

#[test]
fn conflicting_occurrences_name_both_types() {
    let mut fx = Fixture::new(&["T"]);
    let t = fx.param(0);
    let err = fx
        .run(&[t, t], &[], &[ArgType::Typed(TypeId::INT), ArgType::Typed(TypeId::STRING)])
        .unwrap_err();
    assert_eq!(
        err,
        DeductionError::Conflict {
            param: fx.callee[0],
            first: TypeId::INT,
            second: TypeId::STRING,
            arg: 1,
        }
    );
}

#[test]
fn composite_shapes_are_walked() {
    let mut fx = Fixture::new(&["K", "V"]);
    let (k, v) = (fx.param(0), fx.param(1));
    let declared = fx.arena.map(k, v);
    let slice_v = fx.arena.slice(v);
    let actual = fx.arena.map(TypeId::STRING, TypeId::FLOAT64);
    let floats = fx.arena.slice(TypeId::FLOAT64);

    let subs = fx
        .run(&[declared, slice_v], &[], &[ArgType::Typed(actual), ArgType::Typed(floats)])
        .unwrap();
    assert_eq!(subs.get(&fx.callee[0]), Some(&TypeId::STRING));
    assert_eq!(subs.get(&fx.callee[1]), Some(&TypeId::FLOAT64));
}

#[test]
fn shape_mismatch_is_reported() {
    let mut fx = Fixture::new(&["T"]);
    let t = fx.param(0);
    let declared = fx.arena.slice(t);
    let err = fx.run(&[declared], &[], &[ArgType::Typed(TypeId::INT)]).unwrap_err();
    assert!(matches!(err, DeductionError::Shape { found: TypeId::INT, arg: 0, .. }));
}

#[test]
fn result_only_parameter_is_not_deducible() {
    let mut fx = Fixture::new(&["T"]);
    let t = fx.param(0);
    let err = fx.run(&[TypeId::INT], &[t], &[ArgType::Typed(TypeId::INT)]).unwrap_err();
    assert_eq!(err, DeductionError::ResultOnly { param: fx.callee[0] });
}

#[test]
fn nil_never_binds() {
    let mut fx = Fixture::new(&["T"]);
    let t = fx.param(0);
    let ptr = fx.arena.pointer(t);
    let err = fx.run(&[ptr], &[], &[ArgType::Nil]).unwrap_err();
    assert_eq!(err, DeductionError::FromNil { param: fx.callee[0], arg: 0 });

    // A later typed argument supplies the binding; nil is checked afterwards.
    let subs = fx
        .run(&[ptr, t], &[], &[ArgType::Nil, ArgType::Typed(TypeId::BOOL)])
        .unwrap();
    assert_eq!(subs.get(&fx.callee[0]), Some(&TypeId::BOOL));
}

#[test]
fn untyped_arguments_use_default_type() {
    let mut fx = Fixture::new(&["T"]);
    let t = fx.param(0);
    let subs = fx.run(&[t], &[], &[ArgType::Untyped(TypeId::FLOAT64)]).unwrap();
    assert_eq!(subs.get(&fx.callee[0]), Some(&TypeId::FLOAT64));
}

#[test]
fn caller_parameters_bind_like_types() {
    let mut fx = Fixture::new(&["T"]);
    let t = fx.param(0);
    let u = fx.caller[0];
    let u_ty = fx.arena.type_param(u);

    let subs = fx
        .run(&[t, t], &[], &[ArgType::Typed(u_ty), ArgType::Typed(u_ty)])
        .unwrap();
    assert_eq!(subs.get(&fx.callee[0]), Some(&u_ty));

    let err = fx
        .run(&[t, t], &[], &[ArgType::Typed(u_ty), ArgType::Typed(TypeId::INT)])
        .unwrap_err();
    assert!(matches!(err, DeductionError::Conflict { first, second: TypeId::INT, .. } if first == u_ty));
}

#[test]
fn named_argument_matches_through_underlying() {
    let mut fx = Fixture::new(&["T"]);
    let name = fx.interner.intern("IntList");
    let decl = fx
        .entities
        .declare(name, DeclKind::Type, ScopeId::ROOT, true, Span::default())
        .unwrap();
    let ints = fx.arena.slice(TypeId::INT);
    fx.entities.set_shape(decl, ints);
    let int_list = fx.arena.named(decl, smallvec![]);

    let t = fx.param(0);
    let declared = fx.arena.slice(t);
    let subs = fx.run(&[declared], &[], &[ArgType::Typed(int_list)]).unwrap();
    assert_eq!(subs.get(&fx.callee[0]), Some(&TypeId::INT));
}
