// resolve.rs
//
// Resolution of references to (possibly parametric) declarations.

use genus_identity::{DeclId, ScopeId, TypeParamId};

use crate::entity_registry::EntityRegistry;
use crate::generic::ScopeTree;
use crate::type_arena::{TypeArena, TypeId, TypeIdVec};

/// How the type arguments of a reference were obtained.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Instantiation {
    NotGeneric,
    /// Written at the reference. Parameters of scopes shared with the
    /// reference site may be left out and are supplied implicitly.
    Explicit,
    /// Reference from within the declaring scope: the scope's own
    /// parameters, outermost first.
    Implicit,
    /// Inferred from call arguments.
    Deduced,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedArgs {
    pub decl: DeclId,
    pub type_args: TypeIdVec,
    pub instantiation: Instantiation,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReferenceError {
    WrongCount { expected: usize, found: usize },
    /// No arguments and the reference lies outside the declaring scope.
    /// `implicit` are the bindings for scopes shared with the reference
    /// site; `missing` the parameters left to supply or deduce.
    NeedsArguments {
        scope: ScopeId,
        implicit: Vec<(TypeParamId, TypeId)>,
        missing: Vec<TypeParamId>,
    },
}

/// Parameters of the scopes enclosing both `decl_scope` and `site`.
fn shared_params(scopes: &ScopeTree, decl_scope: ScopeId, site: ScopeId) -> Vec<TypeParamId> {
    let decl_chain = scopes.chain(decl_scope);
    let site_chain = scopes.chain(site);
    decl_chain
        .iter()
        .zip(site_chain.iter())
        .take_while(|(a, b)| a == b)
        .flat_map(|(s, _)| scopes.scope(*s).params.iter().copied())
        .collect()
}

/// Resolve the type arguments of a reference to `decl` made from `site`.
pub fn resolve_reference(
    arena: &mut TypeArena,
    scopes: &ScopeTree,
    entities: &EntityRegistry,
    decl: DeclId,
    explicit: Option<&[TypeId]>,
    site: ScopeId,
) -> Result<ResolvedArgs, ReferenceError> {
    let decl_scope = entities.get(decl).scope;
    let all = scopes.all_params(decl_scope);
    let shared = shared_params(scopes, decl_scope, site);

    let resolved = |type_args: TypeIdVec, instantiation| ResolvedArgs {
        decl,
        type_args,
        instantiation,
    };

    match explicit {
        Some(args) if args.len() == all.len() => {
            if all.is_empty() {
                Ok(resolved(TypeIdVec::new(), Instantiation::NotGeneric))
            } else {
                Ok(resolved(args.iter().copied().collect(), Instantiation::Explicit))
            }
        }
        Some(args) if !shared.is_empty() && args.len() + shared.len() == all.len() => {
            let mut type_args: TypeIdVec = shared.iter().map(|&p| arena.type_param(p)).collect();
            type_args.extend(args.iter().copied());
            Ok(resolved(type_args, Instantiation::Explicit))
        }
        Some(args) => Err(ReferenceError::WrongCount {
            expected: all.len(),
            found: args.len(),
        }),
        None if all.is_empty() => Ok(resolved(TypeIdVec::new(), Instantiation::NotGeneric)),
        None if shared.len() == all.len() => {
            let type_args = all.iter().map(|&p| arena.type_param(p)).collect();
            Ok(resolved(type_args, Instantiation::Implicit))
        }
        None => Err(ReferenceError::NeedsArguments {
            scope: decl_scope,
            implicit: shared.iter().map(|&p| (p, arena.type_param(p))).collect(),
            missing: all[shared.len()..].to_vec(),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entity_registry::DeclKind;
    use genus_identity::{Interner, Span, Symbol};

    struct Fixture {
        arena: TypeArena,
        scopes: ScopeTree,
        entities: EntityRegistry,
        outer: ScopeId,
        inner: ScopeId,
        sibling: ScopeId,
        inner_decl: DeclId,
        outer_decl: DeclId,
    }

    // [T] { type Outer ...; [T2] { type Inner ... } }  [S] { ... }
    fn fixture() -> Fixture {
        let mut interner = Interner::new();
        let mut scopes = ScopeTree::new();
        let mut p = |n: &str| (interner.intern(n), Span::default());
        let t = p("T");
        let t2 = p("T2");
        let s = p("S");
        let outer = scopes.declare_scope(ScopeId::ROOT, &[t], Span::default());
        let inner = scopes.declare_scope(outer, &[t2], Span::default());
        let sibling = scopes.declare_scope(ScopeId::ROOT, &[s], Span::default());

        let mut entities = EntityRegistry::new();
        let outer_decl = entities
            .declare(Symbol::new_for_test(100), DeclKind::Type, outer, true, Span::default())
            .unwrap();
        let inner_decl = entities
            .declare(Symbol::new_for_test(101), DeclKind::Type, inner, true, Span::default())
            .unwrap();
        Fixture {
            arena: TypeArena::new(),
            scopes,
            entities,
            outer,
            inner,
            sibling,
            inner_decl,
            outer_decl,
        }
    }

    fn resolve(fx: &mut Fixture, decl: DeclId, explicit: Option<&[TypeId]>, site: ScopeId) -> Result<ResolvedArgs, ReferenceError> {
        resolve_reference(&mut fx.arena, &fx.scopes, &fx.entities, decl, explicit, site)
    }

    #[test]
    fn implicit_inside_declaring_scope_lists_outer_first() {
        let mut fx = fixture();
        let (inner, inner_decl,) = (fx.inner, fx.inner_decl,);
        let r = resolve(&mut fx, inner_decl, None, inner).unwrap();
        assert_eq!(r.instantiation, Instantiation::Implicit);
        let params = fx.scopes.all_params(fx.inner);
        let expected: TypeIdVec = params.iter().map(|&p| fx.arena.type_param(p)).collect();
        assert_eq!(r.type_args, expected);

        // Outer declaration referenced from the nested scope.
        let (inner, outer_decl,) = (fx.inner, fx.outer_decl,);
        let r = resolve(&mut fx, outer_decl, None, inner).unwrap();
        assert_eq!(r.instantiation, Instantiation::Implicit);
        assert_eq!(r.type_args.len(), 1);
    }

    #[test]
    fn outside_reference_needs_every_level() {
        let mut fx = fixture();
        let (inner_decl, sibling,) = (fx.inner_decl, fx.sibling,);
        let ok = resolve(&mut fx, inner_decl, Some(&[TypeId::INT, TypeId::STRING]), sibling).unwrap();
        assert_eq!(ok.type_args.as_slice(), &[TypeId::INT, TypeId::STRING]);
        assert_eq!(ok.instantiation, Instantiation::Explicit);

        let (inner_decl, sibling,) = (fx.inner_decl, fx.sibling,);
        let err = resolve(&mut fx, inner_decl, Some(&[TypeId::INT]), sibling).unwrap_err();
        assert_eq!(err, ReferenceError::WrongCount { expected: 2, found: 1 });

        let (inner_decl,) = (fx.inner_decl,);
        let err = resolve(&mut fx, inner_decl, None, ScopeId::ROOT).unwrap_err();
        assert!(matches!(err, ReferenceError::NeedsArguments { scope, ref missing, .. }
            if scope == fx.inner && missing.len() == 2));
    }

    #[test]
    fn shared_outer_scope_is_supplied_implicitly() {
        let mut fx = fixture();
        let outer_t = fx.scopes.all_params(fx.outer)[0];
        let t_ty = fx.arena.type_param(outer_t);

        let (inner_decl, outer,) = (fx.inner_decl, fx.outer,);
        let r = resolve(&mut fx, inner_decl, Some(&[TypeId::BOOL]), outer).unwrap();
        assert_eq!(r.type_args.as_slice(), &[t_ty, TypeId::BOOL]);

        let (inner_decl, outer,) = (fx.inner_decl, fx.outer,);
        let err = resolve(&mut fx, inner_decl, None, outer).unwrap_err();
        let ReferenceError::NeedsArguments { implicit, missing, .. } = err else {
            panic!("expected NeedsArguments");
        };
        assert_eq!(implicit, vec![(outer_t, t_ty)]);
        assert_eq!(missing.len(), 1);
    }

    #[test]
    fn non_generic_rejects_arguments() {
        let mut fx = fixture();
        let plain = fx
            .entities
            .declare(Symbol::new_for_test(102), DeclKind::Function, ScopeId::ROOT, true, Span::default())
            .unwrap();
        let (inner,) = (fx.inner,);
        let r = resolve(&mut fx, plain, None, inner).unwrap();
        assert_eq!(r.instantiation, Instantiation::NotGeneric);
        assert_eq!(
            resolve(&mut fx, plain, Some(&[TypeId::INT]), ScopeId::ROOT),
            Err(ReferenceError::WrongCount { expected: 0, found: 1 })
        );
    }
}
