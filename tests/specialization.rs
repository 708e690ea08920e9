// tests/specialization.rs
//! Specialized copies behave exactly like the general form.

mod common;

use genus::frontend::{AstBuilder, Decl, NodeId};
use genus::runtime::{Desc, DescriptorRegistry, Shape, Value, ValueData};
use genus::sema::{CallTarget, CheckOutcome, CompiledBody, CompiledOp, ErrorCategory, TypeCheck};

/// ```text
/// type Stringer interface { String() string }
/// type Y string
/// func (y Y) String() string
/// [T] {
///     func Outer(x T) T { return Inner(x) }
///     func Inner(x T) T { switch x.(type) { case int: case Stringer: }; return x }
/// }
/// func Main() { var n int; var w Y; Outer(n); Outer(w) }
/// ```
fn layered(b: &mut AstBuilder) -> Vec<Decl> {
    let stringer = common::stringer(b);
    let string = b.ty("string");
    let result = b.ty("string");
    let method = b.method("String", "y", vec![], vec![result], None);
    let y_decl = b.type_decl("Y", string, vec![method]);

    let x = b.ident("x");
    let call = b.call_named("Inner", vec![x]);
    let ret = b.ret(vec![call]);
    let (t, r) = (b.ty("T"), b.ty("T"));
    let outer = b.func("Outer", vec![("x", t)], vec![r], Some(vec![ret]));

    let int = b.ty("int");
    let case_int = b.type_case(vec![int], vec![]);
    let target = b.ty("Stringer");
    let case_stringer = b.type_case(vec![target], vec![]);
    let x = b.ident("x");
    let switch = b.type_switch(None, x, vec![case_int, case_stringer], None);
    let x = b.ident("x");
    let ret = b.ret(vec![x]);
    let (t, r) = (b.ty("T"), b.ty("T"));
    let inner = b.func("Inner", vec![("x", t)], vec![r], Some(vec![switch, ret]));

    let tp = b.type_param("T", None);
    let block = b.generic(vec![tp], vec![outer, inner]);

    let int = b.ty("int");
    let let_n = b.let_(&["n"], Some(int), None);
    let y_ty = b.ty("Y");
    let let_w = b.let_(&["w"], Some(y_ty), None);
    let n = b.ident("n");
    let call_n = b.call_named("Outer", vec![n]);
    let stmt_n = b.expr_stmt(call_n);
    let w = b.ident("w");
    let call_w = b.call_named("Outer", vec![w]);
    let stmt_w = b.expr_stmt(call_w);
    let main = b.func("Main", vec![], vec![], Some(vec![let_n, let_w, stmt_n, stmt_w]));
    vec![stringer, y_decl, block, main]
}

fn main_targets(body: &CompiledBody) -> Vec<&CallTarget> {
    body.call_targets().map(|(_, target)| target).collect()
}

#[test]
fn specialization_reaches_transitive_callees() {
    let registry = DescriptorRegistry::new();
    let compiled = common::compile_ok(&registry, true, layered);
    let spec = &compiled.specialization;

    let mut symbols: Vec<_> = spec.specialized.iter().map(|b| b.symbol.as_str()).collect();
    symbols.sort_unstable();
    assert_eq!(symbols, ["Inner[Y]", "Inner[int]", "Outer[Y]", "Outer[int]"]);

    let outer_int = spec.find("Outer[int]").unwrap();
    assert!(matches!(
        main_targets(outer_int)[..],
        [CallTarget::Direct { symbol }] if symbol == "Inner[int]"
    ));

    // The general form hands its own descriptor through.
    let outer = compiled.analysis.lookup("Outer").unwrap();
    let general = spec.general_form(outer).unwrap();
    assert!(matches!(
        main_targets(general)[..],
        [CallTarget::General { descriptors, .. }] if matches!(descriptors[..], [Shape::Param(0)])
    ));
}

#[test]
fn specialized_and_general_forms_agree() {
    let registry = DescriptorRegistry::new();
    let on = common::compile_ok(&registry, true, layered);
    let off = common::compile_ok(&registry, false, layered);
    assert!(off.specialization.specialized.is_empty());

    for body in &on.specialization.specialized {
        let general = off.specialization.general_form(body.decl).unwrap();
        let expected = general.evaluate(&body.type_args, &registry).unwrap();
        let actual = body.evaluate(&[], &registry).unwrap();
        assert_eq!(actual, expected, "{}", body.symbol);
    }

    let inner_int = on.specialization.find("Inner[int]").unwrap();
    let outcomes = inner_int.evaluate(&[], &registry).unwrap();
    assert_eq!(outcomes[0].1, CheckOutcome::Arm(Some(0)));
    let inner_y = on.specialization.find("Inner[Y]").unwrap();
    let outcomes = inner_y.evaluate(&[], &registry).unwrap();
    assert_eq!(outcomes[0].1, CheckOutcome::Arm(Some(1)));
}

#[test]
fn only_call_targets_differ() {
    let registry = DescriptorRegistry::new();
    let on = common::compile_ok(&registry, true, layered);
    let off = common::compile_ok(&registry, false, layered);
    assert_eq!(on.analysis.call_sites.len(), off.analysis.call_sites.len());

    let main = on.analysis.lookup("Main").unwrap();
    let outer = on.analysis.lookup("Outer").unwrap();
    let on_main = on.specialization.general_form(main).unwrap();
    let off_main = off.specialization.general_form(main).unwrap();

    let on_targets = main_targets(on_main);
    assert!(matches!(
        on_targets[..],
        [CallTarget::Direct { symbol: a }, CallTarget::Direct { symbol: b }]
            if a == "Outer[int]" && b == "Outer[Y]"
    ));

    let off_targets = main_targets(off_main);
    assert_eq!(off_targets.len(), 2);
    for target in off_targets {
        let CallTarget::General { decl, descriptors } = target else {
            panic!("expected a general call, got {target:?}");
        };
        assert_eq!(*decl, outer);
        assert!(matches!(descriptors[..], [Shape::Concrete(_)]));
    }
}

#[test]
fn errors_do_not_depend_on_specialization() {
    fn conflicting(b: &mut AstBuilder) -> Vec<Decl> {
        let (t1, t2) = (b.ty("T"), b.ty("T"));
        let same = b.func("Same", vec![("a", t1), ("b", t2)], vec![], Some(vec![]));
        let tp = b.type_param("T", None);
        let block = b.generic(vec![tp], vec![same]);
        let (int, string) = (b.ty("int"), b.ty("string"));
        let let_a = b.let_(&["a"], Some(int), None);
        let let_s = b.let_(&["s"], Some(string), None);
        let (a, s) = (b.ident("a"), b.ident("s"));
        let call = b.call_named("Same", vec![a, s]);
        let stmt = b.expr_stmt(call);
        let main = b.func("Main", vec![], vec![], Some(vec![let_a, let_s, stmt]));
        vec![block, main]
    }

    let registry = DescriptorRegistry::new();
    let categories = |specialize| -> Vec<ErrorCategory> {
        match common::compile(&registry, specialize, conflicting) {
            Ok(_) => panic!("expected a deduction failure"),
            Err(err) => err.type_errors().iter().map(|e| e.category()).collect(),
        }
    };
    let on = categories(true);
    assert_eq!(on, categories(false));
    assert_eq!(on, [ErrorCategory::DeductionFailure]);
}

/// ```text
/// type Stringer interface { String() string }
/// type Y string
/// func (y Y) String() string
/// [T] {
///     func Classify(x T) {
///         switch x.(type) { case int: case Stringer: }
///         let s, ok = x.(Stringer)
///     }
/// }
/// func Main() { var n int; var w Y; var s Stringer = w; Classify(n); Classify(w); Classify(s) }
/// ```
fn classify(b: &mut AstBuilder) -> Vec<Decl> {
    let stringer = common::stringer(b);
    let string = b.ty("string");
    let result = b.ty("string");
    let method = b.method("String", "y", vec![], vec![result], None);
    let y_decl = b.type_decl("Y", string, vec![method]);

    let int = b.ty("int");
    let case_int = b.type_case(vec![int], vec![]);
    let target = b.ty("Stringer");
    let case_stringer = b.type_case(vec![target], vec![]);
    let x = b.ident("x");
    let switch = b.type_switch(None, x, vec![case_int, case_stringer], None);
    let (x, target) = (b.ident("x"), b.ty("Stringer"));
    let checked = b.assert_checked(x, target);
    let let_checked = b.let_(&["s", "ok"], None, Some(checked));
    let t = b.ty("T");
    let classify = b.func("Classify", vec![("x", t)], vec![], Some(vec![switch, let_checked]));
    let tp = b.type_param("T", None);
    let block = b.generic(vec![tp], vec![classify]);

    let int = b.ty("int");
    let let_n = b.let_(&["n"], Some(int), None);
    let y_ty = b.ty("Y");
    let let_w = b.let_(&["w"], Some(y_ty), None);
    let (s_ty, w) = (b.ty("Stringer"), b.ident("w"));
    let let_s = b.let_(&["s"], Some(s_ty), Some(w));
    let mut body = vec![let_n, let_w, let_s];
    for var in ["n", "w", "s"] {
        let arg = b.ident(var);
        let call = b.call_named("Classify", vec![arg]);
        body.push(b.expr_stmt(call));
    }
    let main = b.func("Main", vec![], vec![], Some(body));
    vec![stringer, y_decl, block, main]
}

fn check_nodes(body: &CompiledBody) -> Vec<NodeId> {
    body.ops
        .iter()
        .filter_map(|op| match op {
            CompiledOp::Switch { node, .. } | CompiledOp::Assert { node, .. } => Some(*node),
            _ => None,
        })
        .collect()
}

#[test]
fn forms_agree_on_non_nil_operands() {
    let registry = DescriptorRegistry::new();
    let on = common::compile_ok(&registry, true, classify);
    let off = common::compile_ok(&registry, false, classify);
    let bodies = &on.specialization;

    let int = bodies.find("Classify[int]").unwrap().type_args[0];
    let y = bodies.find("Classify[Y]").unwrap().type_args[0];
    let seven = Value::new(int, ValueData::Int(7));
    let warm = Value::new(y, ValueData::Str("warm".into()));

    // Each instantiation sees a live value: the Stringer one holds a Y.
    let cases: [(&str, &Value); 3] = [
        ("Classify[int]", &seven),
        ("Classify[Y]", &warm),
        ("Classify[Stringer]", &warm),
    ];
    for (symbol, value) in cases {
        let body = bodies.find(symbol).unwrap();
        let general = off.specialization.general_form(body.decl).unwrap();
        let nodes = check_nodes(body);
        assert_eq!(nodes, check_nodes(general));
        let operands = |node: NodeId| nodes.contains(&node).then(|| value.clone());

        let expected = general.evaluate_on(&body.type_args, &registry, &operands).unwrap();
        let actual = body.evaluate_on(&[], &registry, &operands).unwrap();
        assert_eq!(actual, expected, "{symbol}");
    }

    let held = bodies.find("Classify[Stringer]").unwrap();
    assert!(held.ops.iter().all(|op| !matches!(
        op,
        CompiledOp::Assert { target: TypeCheck::Folded(_), .. }
    )));
    let operands = |_: NodeId| Some(warm.clone());
    let outcomes: Vec<_> = held
        .evaluate_on(&[], &registry, &operands)
        .unwrap()
        .into_iter()
        .map(|(_, outcome)| outcome)
        .collect();
    assert_eq!(outcomes, [CheckOutcome::Arm(Some(1)), CheckOutcome::Holds(true)]);

    // A nil Stringer matches no case, in either form.
    let stringer: Desc = held.type_args[0];
    let general = off.specialization.general_form(held.decl).unwrap();
    for outcomes in [
        held.evaluate(&[], &registry).unwrap(),
        general.evaluate(&[stringer], &registry).unwrap(),
    ] {
        let outcomes: Vec<_> = outcomes.into_iter().map(|(_, outcome)| outcome).collect();
        assert_eq!(outcomes, [CheckOutcome::Arm(None), CheckOutcome::Holds(false)]);
    }
}
