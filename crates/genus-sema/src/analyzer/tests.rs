use genus_frontend::{AstBuilder, BinaryOp, Decl, NodeId, Stmt};

use super::*;
use crate::compatibility::CoercionSource;
use crate::errors::ErrorCategory;
use crate::resolve::Instantiation;

fn check(build: impl FnOnce(&mut AstBuilder) -> Vec<Decl>) -> AnalysisOutput {
    let mut b = AstBuilder::new();
    let decls = build(&mut b);
    let (program, interner) = b.finish(decls);
    Analyzer::builder(&program, &interner).build().analyze()
}

fn errors(out: &AnalysisOutput) -> Vec<&SemanticError> {
    out.errors.iter().map(|e| &e.error).collect()
}

fn categories(out: &AnalysisOutput) -> Vec<ErrorCategory> {
    out.errors.iter().map(TypeError::category).collect()
}

/// `[T] { [T2] { type Pair struct { a T; b T2 } } }`
fn pair(b: &mut AstBuilder, inner: Vec<Decl>, outer: Vec<Decl>) -> Decl {
    let (t, t2) = (b.ty("T"), b.ty("T2"));
    let fields = b.struct_ty(vec![("a", t), ("b", t2)]);
    let pair = b.type_decl("Pair", fields, vec![]);
    let p2 = b.type_param("T2", None);
    let mut inner_decls = vec![pair];
    inner_decls.extend(inner);
    let inner = b.generic(vec![p2], inner_decls);
    let p = b.type_param("T", None);
    let mut outer_decls = vec![inner];
    outer_decls.extend(outer);
    b.generic(vec![p], outer_decls)
}

// ============================================================================
// Scopes and references
// ============================================================================

#[test]
fn outside_reference_must_supply_every_level() {
    let out = check(|b| {
        let int = b.ty("int");
        let one = b.ty_args("Pair", vec![int]);
        let short = b.func("Short", vec![("p", one)], vec![], None);
        let bare = b.ty("Pair");
        let missing = b.func("Missing", vec![("p", bare)], vec![], None);
        let (int, string) = (b.ty("int"), b.ty("string"));
        let full = b.ty_args("Pair", vec![int, string]);
        let ok = b.func("Full", vec![("p", full)], vec![], None);
        vec![pair(b, vec![], vec![]), short, missing, ok]
    });
    let errs = errors(&out);
    assert_eq!(errs.len(), 2, "{:?}", out.errors);
    assert!(matches!(
        errs[0],
        SemanticError::WrongTypeArgCount { name, expected: 2, found: 1, .. } if name == "Pair"
    ));
    assert!(matches!(
        errs[1],
        SemanticError::MissingTypeArguments { scope, .. } if scope == "[T][T2]"
    ));
    assert!(categories(&out).iter().all(|&c| c == ErrorCategory::ScopeResolution));
}

#[test]
fn shared_outer_scope_is_implicit() {
    let out = check(|b| {
        // Inside [T]: Pair[bool] means Pair[T, bool].
        let boolean = b.ty("bool");
        let partial = b.ty_args("Pair", vec![boolean]);
        let outer_fn = b.func("Outer", vec![("p", partial)], vec![], None);
        // Inside [T][T2]: bare Pair means Pair[T, T2].
        let bare = b.ty("Pair");
        let inner_fn = b.func("Inner", vec![("p", bare)], vec![], None);
        vec![pair(b, vec![inner_fn], vec![outer_fn])]
    });
    assert!(!out.has_errors(), "{:?}", out.errors);
    let outer = out.lookup("Outer").unwrap();
    let (params, _) = out.arena.unwrap_function(out.entities.get(outer).shape).unwrap();
    assert_eq!(out.display(params[0]), "Pair[T, bool]");
    let inner = out.lookup("Inner").unwrap();
    let (params, _) = out.arena.unwrap_function(out.entities.get(inner).shape).unwrap();
    assert_eq!(out.display(params[0]), "Pair[T, T2]");
}

#[test]
fn duplicate_declaration_reports_both_sites() {
    let out = check(|b| {
        let first = b.func("A", vec![], vec![], None);
        let second = b.func("A", vec![], vec![], None);
        vec![first, second]
    });
    assert!(matches!(errors(&out)[..], [SemanticError::DuplicateDeclaration { .. }]));
}

#[test]
fn value_recursive_type_is_rejected() {
    let out = check(|b| {
        let node = b.ty("Node");
        let fields = b.struct_ty(vec![("next", node)]);
        let node = b.type_decl("Node", fields, vec![]);
        let list = b.ty("List");
        let ptr = b.ptr(list);
        let fields = b.struct_ty(vec![("next", ptr)]);
        let list = b.type_decl("List", fields, vec![]);
        vec![node, list]
    });
    assert!(matches!(
        errors(&out)[..],
        [SemanticError::InvalidRecursiveType { name, .. }] if name == "Node"
    ));
}

#[test]
fn oversized_array_is_rejected() {
    let out = check(|b| {
        let int = b.ty("int64");
        let huge = b.array(int, u64::MAX / 4);
        let big = b.type_decl("Big", huge, vec![]);
        let byte = b.ty("uint8");
        let fits = b.array(byte, 1 << 20);
        let buffer = b.type_decl("Buffer", fits, vec![]);
        vec![big, buffer]
    });
    assert!(matches!(
        errors(&out)[..],
        [SemanticError::ArrayTooLarge { len, max, .. }]
            if *len == u64::MAX / 4 && *max == genus_runtime::MAX_TYPE_SIZE
    ));
    assert_eq!(categories(&out), [ErrorCategory::Other]);
}

// ============================================================================
// Constraints
// ============================================================================

/// `type Stringer interface { String() string }`,
/// `type Name string` with `String`, and `[T Stringer] { func Show(x T) string }`.
fn stringer_decls(b: &mut AstBuilder) -> Vec<Decl> {
    let string = b.ty("string");
    let sig = b.method_sig("String", vec![], vec![string]);
    let iface = b.interface_ty(vec![sig]);
    let stringer = b.type_decl("Stringer", iface, vec![]);
    let string = b.ty("string");
    let method_result = b.ty("string");
    let method = b.method("String", "n", vec![], vec![method_result], None);
    let name = b.type_decl("Name", string, vec![method]);
    let (t, string) = (b.ty("T"), b.ty("string"));
    let show = b.func("Show", vec![("x", t)], vec![string], None);
    let constraint = b.ty("Stringer");
    let tp = b.type_param("T", Some(constraint));
    let block = b.generic(vec![tp], vec![show]);
    vec![stringer, name, block]
}

#[test]
fn deduced_argument_must_satisfy_constraint() {
    let out = check(|b| {
        let mut decls = stringer_decls(b);
        let one = b.int(1);
        let bad = b.call_named("Show", vec![one]);
        let let_bad = b.let_(&["s"], None, Some(bad));
        let name_ty = b.ty("Name");
        let init = b.string("ann");
        let let_name = b.let_(&["n"], Some(name_ty), Some(init));
        let n = b.ident("n");
        let good = b.call_named("Show", vec![n]);
        let let_good = b.let_(&["t"], None, Some(good));
        decls.push(b.func("Main", vec![], vec![], Some(vec![let_bad, let_name, let_good])));
        decls
    });
    let errs = errors(&out);
    assert_eq!(errs.len(), 1, "{:?}", out.errors);
    assert!(matches!(
        errs[0],
        SemanticError::ConstraintUnsatisfied { offered, missing, .. } if offered == "int" && missing == "String"
    ));
    assert_eq!(categories(&out), vec![ErrorCategory::ConstraintUnsatisfied]);
}

#[test]
fn explicit_argument_is_checked_against_constraint() {
    let out = check(|b| {
        let mut decls = stringer_decls(b);
        let int = b.ty("int");
        let inst = b.instantiate("Show", vec![int]);
        let let_f = b.let_(&["f"], None, Some(inst));
        decls.push(b.func("Main", vec![], vec![], Some(vec![let_f])));
        decls
    });
    assert_eq!(categories(&out), vec![ErrorCategory::ConstraintUnsatisfied]);
}

#[test]
fn non_interface_constraint_is_invalid() {
    let out = check(|b| {
        let int = b.ty("int");
        let tp = b.type_param("T", Some(int));
        let t = b.ty("T");
        let f = b.func("F", vec![("x", t)], vec![], None);
        vec![b.generic(vec![tp], vec![f])]
    });
    assert!(matches!(errors(&out)[..], [SemanticError::InvalidConstraint { .. }]));
}

// ============================================================================
// Deduction
// ============================================================================

/// `[T] { func Same(a T, b T) T; func Make() T }`
fn same_and_make(b: &mut AstBuilder) -> Decl {
    let (t1, t2, t3) = (b.ty("T"), b.ty("T"), b.ty("T"));
    let same = b.func("Same", vec![("a", t1), ("b", t2)], vec![t3], None);
    let t = b.ty("T");
    let make = b.func("Make", vec![], vec![t], None);
    let tp = b.type_param("T", None);
    b.generic(vec![tp], vec![same, make])
}

#[test]
fn conflicting_deduction_names_both_types() {
    let out = check(|b| {
        let block = same_and_make(b);
        let (int, one) = (b.ty("int"), b.int(1));
        let let_i = b.let_(&["i"], Some(int), Some(one));
        let (string, s) = (b.ty("string"), b.string("s"));
        let let_s = b.let_(&["s"], Some(string), Some(s));
        let (i, s) = (b.ident("i"), b.ident("s"));
        let call = b.call_named("Same", vec![i, s]);
        let stmt = b.expr_stmt(call);
        vec![block, b.func("Main", vec![], vec![], Some(vec![let_i, let_s, stmt]))]
    });
    let errs = errors(&out);
    assert!(matches!(
        errs[..],
        [SemanticError::DeductionConflict { param, first, second, .. }]
            if param == "T" && first == "int" && second == "string"
    ));
    assert_eq!(categories(&out), vec![ErrorCategory::DeductionFailure]);
}

#[test]
fn result_only_parameter_requires_explicit_arguments() {
    let out = check(|b| {
        let block = same_and_make(b);
        let call = b.call_named("Make", vec![]);
        let let_m = b.let_(&["m"], None, Some(call));
        let int = b.ty("int");
        let inst = b.instantiate("Make", vec![int]);
        let call = b.call(inst, vec![]);
        let let_n = b.let_(&["n"], None, Some(call));
        vec![block, b.func("Main", vec![], vec![], Some(vec![let_m, let_n]))]
    });
    assert!(matches!(errors(&out)[..], [SemanticError::ResultOnlyTypeParam { .. }]));
    assert_eq!(categories(&out), vec![ErrorCategory::ExplicitInstantiationRequired]);
}

#[test]
fn nil_argument_cannot_bind_parameter() {
    let out = check(|b| {
        let block = same_and_make(b);
        let (a, nil) = (b.nil(), b.nil());
        let call = b.call_named("Same", vec![a, nil]);
        let stmt = b.expr_stmt(call);
        vec![block, b.func("Main", vec![], vec![], Some(vec![stmt]))]
    });
    assert!(matches!(errors(&out)[..], [SemanticError::CannotInferFromNil { .. }]));
    assert_eq!(categories(&out), vec![ErrorCategory::DeductionFailure]);
}

#[test]
fn generic_function_value_needs_arguments() {
    let out = check(|b| {
        let block = same_and_make(b);
        let bare = b.ident("Same");
        let let_f = b.let_(&["f"], None, Some(bare));
        let int = b.ty("int");
        let inst = b.instantiate("Same", vec![int]);
        let let_g = b.let_(&["g"], None, Some(inst));
        vec![block, b.func("Main", vec![], vec![], Some(vec![let_f, let_g]))]
    });
    assert!(matches!(
        errors(&out)[..],
        [SemanticError::UninstantiatedGenericValue { name, .. }] if name == "Same"
    ));
    let main = out.lookup("Main").unwrap();
    let ops = &out.function(main).unwrap().ops;
    assert!(matches!(ops[..], [TypeOp::FuncValue { .. }]));
}

#[test]
fn call_records_boundary_conversions() {
    let mut arg_id = NodeId::new(0);
    let mut call_id = NodeId::new(0);
    let out = check(|b| {
        let block = same_and_make(b);
        let (int, one) = (b.ty("int"), b.int(1));
        let let_i = b.let_(&["i"], Some(int), Some(one));
        let (i, j) = (b.ident("i"), b.ident("i"));
        arg_id = i.id;
        let call = b.call_named("Same", vec![i, j]);
        call_id = call.id;
        let let_r = b.let_(&["r"], None, Some(call));
        vec![block, b.func("Main", vec![], vec![], Some(vec![let_i, let_r]))]
    });
    assert!(!out.has_errors(), "{:?}", out.errors);

    let site = &out.call_sites[&call_id];
    assert_eq!(site.instantiation, Instantiation::Deduced);
    assert_eq!(site.type_args.as_slice(), &[TypeId::INT]);
    assert_eq!(out.type_of(call_id), Some(TypeId::INT));

    assert!(matches!(
        out.conversions[&arg_id][..],
        [ImplicitConversion::Coerce { concrete: TypeId::INT, .. }]
    ));
    assert!(matches!(
        out.conversions[&call_id][..],
        [ImplicitConversion::Assert { index: 0, concrete: TypeId::INT, .. }]
    ));
}

// ============================================================================
// Assignability, coercion and assertion
// ============================================================================

/// `[T, U] { func F(x T) { stmts } }` with `i int` also in scope.
fn generic_body(b: &mut AstBuilder, stmts: impl FnOnce(&mut AstBuilder) -> Vec<Stmt>) -> Vec<Decl> {
    let (int, one) = (b.ty("int"), b.int(1));
    let let_i = b.let_(&["i"], Some(int), Some(one));
    let mut body = vec![let_i];
    body.extend(stmts(b));
    let t = b.ty("T");
    let f = b.func("F", vec![("x", t)], vec![], Some(body));
    let (tp, up) = (b.type_param("T", None), b.type_param("U", None));
    vec![b.generic(vec![tp, up], vec![f])]
}

#[test]
fn implicit_boundary_crossings_are_rejected() {
    let out = check(|b| {
        generic_body(b, |b| {
            let (t, i) = (b.ty("T"), b.ident("i"));
            let into = b.let_(&["a"], Some(t), Some(i));
            let (int, x) = (b.ty("int"), b.ident("x"));
            let out_of = b.let_(&["c"], Some(int), Some(x));
            let (u, x) = (b.ty("U"), b.ident("x"));
            let across = b.let_(&["d"], Some(u), Some(x));
            let (t, one) = (b.ty("T"), b.int(1));
            let literal = b.let_(&["e"], Some(t), Some(one));
            vec![into, out_of, across, literal]
        })
    });
    let errs = errors(&out);
    assert_eq!(errs.len(), 4, "{:?}", out.errors);
    assert!(matches!(errs[0], SemanticError::ImplicitCoercion { .. }));
    assert!(matches!(errs[1], SemanticError::ImplicitAssertion { .. }));
    assert!(matches!(errs[2], SemanticError::ParametricMismatch { .. }));
    assert!(matches!(errs[3], SemanticError::ImplicitCoercion { .. }));
    assert!(categories(&out).iter().all(|&c| c == ErrorCategory::AssignabilityViolation));
}

#[test]
fn explicit_conversions_are_recorded() {
    let out = check(|b| {
        generic_body(b, |b| {
            let (i, t) = (b.ident("i"), b.ty("T"));
            let coerce = b.coerce(i, t);
            let let_a = b.let_(&["a"], None, Some(coerce));
            let (x, int) = (b.ident("x"), b.ty("int"));
            let assert = b.assert_checked(x, int);
            let let_b = b.let_(&["v", "ok"], None, Some(assert));
            let x = b.ident("x");
            let int = b.ty("int");
            let case = b.type_case(vec![int], vec![]);
            let (string, u) = (b.ty("string"), b.ty("U"));
            let case2 = b.type_case(vec![string, u], vec![]);
            let switch = b.type_switch(Some("y"), x, vec![case, case2], None);
            vec![let_a, let_b, switch]
        })
    });
    assert!(!out.has_errors(), "{:?}", out.errors);
    let f = out.lookup("F").unwrap();
    let ops = &out.function(f).unwrap().ops;
    assert_eq!(ops.len(), 3);
    assert!(matches!(ops[0], TypeOp::Coerce { source: CoercionSource::Typed(TypeId::INT), .. }));
    assert!(matches!(ops[1], TypeOp::Assert { target: TypeId::INT, two_result: true, .. }));
    let TypeOp::Switch { arms, .. } = &ops[2] else {
        panic!("expected switch");
    };
    let cases: Vec<usize> = arms.iter().map(|&(case, _)| case).collect();
    assert_eq!(cases, vec![0, 1, 1]);
}

#[test]
fn invalid_explicit_conversions() {
    let out = check(|b| {
        generic_body(b, |b| {
            let (one, int) = (b.int(1), b.ty("int"));
            let concrete_target = b.coerce(one, int);
            let s1 = b.expr_stmt(concrete_target);
            let (i, string) = (b.ident("i"), b.ty("string"));
            let concrete_source = b.assert(i, string);
            let s2 = b.expr_stmt(concrete_source);
            let (s, t) = (b.string("s"), b.ty("T"));
            let slice = b.slice(t);
            let never = b.coerce(s, slice);
            let s3 = b.expr_stmt(never);
            let (x, u) = (b.ident("x"), b.ty("U"));
            let mismatch = b.coerce(x, u);
            let s4 = b.expr_stmt(mismatch);
            vec![s1, s2, s3, s4]
        })
    });
    let errs = errors(&out);
    assert_eq!(errs.len(), 4, "{:?}", out.errors);
    assert!(matches!(errs[0], SemanticError::CoercionTargetNotParametric { .. }));
    assert!(matches!(errs[1], SemanticError::AssertionSourceNotParametric { .. }));
    assert!(matches!(errs[2], SemanticError::CoercionNeverSucceeds { .. }));
    assert!(matches!(errs[3], SemanticError::ParametricMismatch { .. }));
}

#[test]
fn literal_into_parametric_interface_is_ambiguous() {
    let out = check(|b| {
        let t = b.ty("T");
        let sig = b.method_sig("Get", vec![], vec![t]);
        let iface = b.interface_ty(vec![sig]);
        let getter = b.type_decl("Getter", iface, vec![]);
        let (one, target) = (b.int(1), b.ty("Getter"));
        let coerce = b.coerce(one, target);
        let stmt = b.expr_stmt(coerce);
        let f = b.func("F", vec![], vec![], Some(vec![stmt]));
        let tp = b.type_param("T", None);
        vec![b.generic(vec![tp], vec![getter, f])]
    });
    assert!(matches!(errors(&out)[..], [SemanticError::AmbiguousCoercion { .. }]));
}

// ============================================================================
// Operations on parametric values
// ============================================================================

#[test]
fn operators_and_indexing_need_concrete_operands() {
    let out = check(|b| {
        generic_body(b, |b| {
            let (x, y) = (b.ident("x"), b.ident("x"));
            let sum = b.binary(BinaryOp::Add, x, y);
            let s1 = b.expr_stmt(sum);
            let (x, zero) = (b.ident("x"), b.int(0));
            let index = b.index(x, zero);
            let s2 = b.expr_stmt(index);
            let x = b.ident("x");
            let field = b.select(x, "len");
            let s3 = b.expr_stmt(field);
            vec![s1, s2, s3]
        })
    });
    let errs = errors(&out);
    assert_eq!(errs.len(), 3, "{:?}", out.errors);
    assert!(errs.iter().all(|e| matches!(e, SemanticError::IllegalParametricOperation { .. })));
    assert!(categories(&out).iter().all(|&c| c == ErrorCategory::IllegalOperation));
}

#[test]
fn methods_of_generic_types_use_receiver_arguments() {
    let out = check(|b| {
        let t = b.ty("T");
        let items = b.slice(t);
        let fields = b.struct_ty(vec![("items", items)]);
        let t = b.ty("T");
        let l = b.ident("l");
        let field = b.select(l, "items");
        let zero = b.int(0);
        let first = b.index(field, zero);
        let ret = b.ret(vec![first]);
        let method = b.method("First", "l", vec![], vec![t], Some(vec![ret]));
        let list = b.type_decl("List", fields, vec![method]);
        let tp = b.type_param("T", None);
        let block = b.generic(vec![tp], vec![list]);

        let (int, string) = (b.ty("int"), b.ty("string"));
        let (list_int, list_str) = (b.ty_args("List", vec![int]), b.ty_args("List", vec![string]));
        let let_a = b.let_(&["a"], Some(list_int), None);
        let let_s = b.let_(&["s"], Some(list_str), None);
        let a = b.ident("a");
        let get = b.select(a, "First");
        let call = b.call(get, vec![]);
        let int = b.ty("int");
        let let_v = b.let_(&["v"], Some(int), Some(call));
        let s = b.ident("s");
        let get = b.select(s, "First");
        let call = b.call(get, vec![]);
        let int = b.ty("int");
        let let_w = b.let_(&["w"], Some(int), Some(call));
        let main = b.func("Main", vec![], vec![], Some(vec![let_a, let_s, let_v, let_w]));
        vec![block, main]
    });
    let errs = errors(&out);
    assert!(
        matches!(errs[..], [SemanticError::TypeMismatch { expected, found, .. }] if expected == "int" && found == "string"),
        "{:?}",
        out.errors
    );
}
