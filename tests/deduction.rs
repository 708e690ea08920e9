// tests/deduction.rs
//! Deduction and scope resolution through the whole pipeline.

mod common;

use genus::frontend::{AstBuilder, Decl};
use genus::runtime::DescriptorRegistry;
use genus::sema::{ErrorCategory, Instantiation, SemanticError, TypeId};

/// `[T] { func Pair(a T, b T) }` called with locals of types `first` and
/// `second`.
fn pair_call(b: &mut AstBuilder, first: &str, second: &str) -> Vec<Decl> {
    let (t1, t2) = (b.ty("T"), b.ty("T"));
    let pair = b.func("Pair", vec![("a", t1), ("b", t2)], vec![], None);
    let tp = b.type_param("T", None);
    let block = b.generic(vec![tp], vec![pair]);

    let (ty_a, ty_b) = (b.ty(first), b.ty(second));
    let let_a = b.let_(&["a"], Some(ty_a), None);
    let let_b = b.let_(&["b"], Some(ty_b), None);
    let (a, bb) = (b.ident("a"), b.ident("b"));
    let call = b.call_named("Pair", vec![a, bb]);
    let stmt = b.expr_stmt(call);
    let main = b.func("Main", vec![], vec![], Some(vec![let_a, let_b, stmt]));
    vec![block, main]
}

#[test]
fn first_occurrence_binds() {
    let registry = DescriptorRegistry::new();
    let compiled = common::compile_ok(&registry, true, |b| pair_call(b, "int", "int"));
    let sites: Vec<_> = compiled.analysis.call_sites.values().collect();
    assert_eq!(sites.len(), 1);
    assert_eq!(sites[0].instantiation, Instantiation::Deduced);
    assert_eq!(sites[0].type_args.as_slice(), &[TypeId::INT]);
}

#[test]
fn conflicting_occurrences_fail() {
    let registry = DescriptorRegistry::new();
    let err = common::compile(&registry, true, |b| pair_call(b, "int", "string")).unwrap_err();
    let errors = err.type_errors();
    assert_eq!(errors.len(), 1);
    assert_eq!(errors[0].category(), ErrorCategory::DeductionFailure);
    assert!(matches!(
        &errors[0].error,
        SemanticError::DeductionConflict { first, second, .. } if first == "int" && second == "string"
    ));
}

/// `[T] { [T2] { type Pair struct { a T; b T2 } } }` referenced from outside
/// with `args` type arguments.
fn nested_reference(b: &mut AstBuilder, args: &[&str]) -> Vec<Decl> {
    let (t, t2) = (b.ty("T"), b.ty("T2"));
    let fields = b.struct_ty(vec![("a", t), ("b", t2)]);
    let pair = b.type_decl("Pair", fields, vec![]);
    let p2 = b.type_param("T2", None);
    let inner = b.generic(vec![p2], vec![pair]);
    let p = b.type_param("T", None);
    let outer = b.generic(vec![p], vec![inner]);

    let args = args.iter().map(|a| b.ty(a)).collect();
    let ty = b.ty_args("Pair", args);
    let use_fn = b.func("Use", vec![("p", ty)], vec![], Some(vec![]));
    vec![outer, use_fn]
}

#[test]
fn nested_scopes_take_outer_then_inner_arguments() {
    let registry = DescriptorRegistry::new();
    let mut compiled = common::compile_ok(&registry, true, |b| nested_reference(b, &["int", "string"]));
    let out = &mut compiled.analysis;
    let use_fn = out.lookup("Use").unwrap();
    let shape = out.entities.get(use_fn).shape;
    let (params, _) = out.arena.unwrap_function(shape).unwrap();
    let param = params[0];
    assert_eq!(out.display(param), "Pair[int, string]");
    let underlying = out.cx().underlying(param);
    assert_eq!(out.display(underlying), "struct{a int; b string}");
}

#[test]
fn nested_scopes_reject_partial_arguments() {
    let registry = DescriptorRegistry::new();
    let err = common::compile(&registry, true, |b| nested_reference(b, &["int"])).unwrap_err();
    let errors = err.type_errors();
    assert_eq!(errors.len(), 1);
    assert_eq!(errors[0].category(), ErrorCategory::ScopeResolution);
    assert!(matches!(
        &errors[0].error,
        SemanticError::WrongTypeArgCount { expected: 2, found: 1, .. }
    ));
}
