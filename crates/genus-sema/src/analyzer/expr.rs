// analyzer/expr.rs
//
// Expression checking.

use genus_frontend::{BinaryOp, CallExpr, Expr, ExprKind};
use genus_identity::{DeclId, PrimitiveType, Span, Symbol, TypeParamId};
use genus_runtime::Literal;

use super::{Analyzer, CallSite, ImplicitConversion, TypeOp};
use crate::compatibility::{CoercionSource, assign_error, check_assertion, check_coercion, literal_fits};
use crate::deduce::{ArgType, DeductionError, deduce};
use crate::cx::TypeCx;
use crate::errors::SemanticError;
use crate::resolve::{Instantiation, ReferenceError, resolve_reference};
use crate::type_arena::{SemaType, Substitution, TypeId, TypeIdVec, substitution_for};

/// Result of checking an expression.
#[derive(Debug, Clone, PartialEq)]
pub(super) enum Operand {
    Typed(TypeId),
    /// Untyped constant, including `nil`.
    Untyped(Literal),
    /// A parametric function named without type arguments outside its
    /// scope. Only usable as a callee.
    GenericFunc(DeclId),
    /// Call without results.
    Void,
}

/// Callee of a call expression once resolved to a declaration.
struct DeclCallee {
    decl: DeclId,
    /// Arguments already known (explicit, implicit, or from the receiver).
    type_args: Option<TypeIdVec>,
    instantiation: Instantiation,
    /// Bindings for shared outer scopes when deduction must supply the rest.
    deduce_from: Option<(Substitution, Vec<TypeParamId>)>,
}

impl<'p> Analyzer<'p> {
    pub(super) fn check_expr(&mut self, expr: &Expr) -> Operand {
        let operand = self.check_expr_inner(expr);
        if let Operand::Typed(ty) = operand {
            self.expr_types.insert(expr.id, ty);
        }
        operand
    }

    fn check_expr_inner(&mut self, expr: &Expr) -> Operand {
        match &expr.kind {
            ExprKind::IntLiteral(v) => Operand::Untyped(Literal::Int(*v)),
            ExprKind::FloatLiteral(f) => Operand::Untyped(Literal::Float(*f)),
            ExprKind::StringLiteral(s) => Operand::Untyped(Literal::Str(s.clone())),
            ExprKind::BoolLiteral(b) => Operand::Untyped(Literal::Bool(*b)),
            ExprKind::Nil => Operand::Untyped(Literal::Nil),
            ExprKind::Ident(name) => self.check_ident(expr, *name),
            ExprKind::Instantiate { name, args } => {
                let scope = self.current_scope();
                let args: TypeIdVec = args.iter().map(|a| self.lower_type(a, scope)).collect();
                let Some(decl) = self.lookup_callable(*name, expr.span) else {
                    return Operand::Typed(TypeId::INVALID);
                };
                match self.resolve_decl_args(decl, Some(&args), scope, expr.span) {
                    Some(type_args) => self.function_value(expr, decl, type_args, Instantiation::Explicit),
                    None => Operand::Typed(TypeId::INVALID),
                }
            }
            ExprKind::Call(call) => self.check_call(expr, call),
            ExprKind::Coerce(coerce) => {
                let scope = self.current_scope();
                let target = self.lower_type(&coerce.target, scope);
                let source = match self.check_expr(&coerce.value) {
                    Operand::Typed(t) => CoercionSource::Typed(t),
                    Operand::Untyped(lit) => CoercionSource::Untyped(lit),
                    other => {
                        self.operand_error(&other, coerce.value.span);
                        return Operand::Typed(TypeId::INVALID);
                    }
                };
                if let Err(error) = check_coercion(&mut self.cx(), &source, target, expr.span) {
                    self.add_error(error, expr.span);
                    return Operand::Typed(TypeId::INVALID);
                }
                self.record_op(TypeOp::Coerce {
                    node: expr.id,
                    target,
                    source,
                });
                Operand::Typed(target)
            }
            ExprKind::Assert(assert) => {
                let scope = self.current_scope();
                let source = self.value_type(&assert.value);
                let target = self.lower_type(&assert.target, scope);
                if let Err(error) = check_assertion(&mut self.cx(), source, expr.span) {
                    self.add_error(error, expr.span);
                    return Operand::Typed(TypeId::INVALID);
                }
                self.record_op(TypeOp::Assert {
                    node: expr.id,
                    target,
                    source,
                    two_result: assert.two_result,
                });
                if assert.two_result {
                    Operand::Typed(self.arena.tuple(smallvec::smallvec![target, TypeId::BOOL]))
                } else {
                    Operand::Typed(target)
                }
            }
            ExprKind::Selector { base, field } => {
                let base_ty = self.value_type(base);
                Operand::Typed(self.check_selector(base_ty, *field, expr.span))
            }
            ExprKind::Index { base, index } => {
                let base_ty = self.value_type(base);
                let index = self.check_expr(index);
                Operand::Typed(self.check_index(base_ty, &index, expr.span))
            }
            ExprKind::Binary { op, left, right } => {
                let left = self.check_expr(left);
                let right = self.check_expr(right);
                self.check_binary(*op, left, right, expr.span)
            }
        }
    }

    /// Check an expression used as a single value; untyped constants take
    /// their default type.
    pub(super) fn value_type(&mut self, expr: &Expr) -> TypeId {
        let operand = self.check_expr(expr);
        self.operand_type(&operand, expr.span)
    }

    fn operand_type(&mut self, operand: &Operand, span: Span) -> TypeId {
        match operand {
            Operand::Typed(t) => *t,
            Operand::Untyped(lit) => match lit.default_type() {
                Some(prim) => TypeId::primitive(prim),
                None => {
                    self.add_error(
                        SemanticError::TypeMismatch {
                            expected: "typed value".to_string(),
                            found: "nil".to_string(),
                            span: span.into(),
                        },
                        span,
                    );
                    TypeId::INVALID
                }
            },
            other => {
                self.operand_error(other, span);
                TypeId::INVALID
            }
        }
    }

    fn operand_error(&mut self, operand: &Operand, span: Span) {
        let error = match operand {
            Operand::GenericFunc(decl) => SemanticError::UninstantiatedGenericValue {
                name: self.decl_name(*decl),
                span: span.into(),
            },
            Operand::Void => SemanticError::TypeMismatch {
                expected: "value".to_string(),
                found: "()".to_string(),
                span: span.into(),
            },
            Operand::Typed(_) | Operand::Untyped(_) => return,
        };
        self.add_error(error, span);
    }

    /// Implicit assignment of `operand` to a location of type `target`.
    pub(super) fn assign_operand(&mut self, operand: &Operand, target: TypeId, span: Span) {
        match operand {
            Operand::Typed(from) => {
                let mut cx = TypeCx::new(&mut self.arena, &self.entities, &self.scopes, self.interner);
                let error = assign_error(&mut cx, self.rules.as_ref(), *from, target, span);
                if let Some(error) = error {
                    self.add_error(error, span);
                }
            }
            Operand::Untyped(lit) => {
                if target.is_invalid() {
                    return;
                }
                if self.arena.is_parametric(target) {
                    let error = SemanticError::ImplicitCoercion {
                        expected: self.display(target),
                        found: lit.to_string(),
                        span: span.into(),
                    };
                    self.add_error(error, span);
                } else if !literal_fits(&mut self.cx(), lit, target) {
                    let error = SemanticError::TypeMismatch {
                        expected: self.display(target),
                        found: lit.to_string(),
                        span: span.into(),
                    };
                    self.add_error(error, span);
                }
            }
            other => self.operand_error(other, span),
        }
    }

    fn lookup_local(&self, name: Symbol) -> Option<TypeId> {
        let body = self.body.as_ref()?;
        body.locals.iter().rev().find_map(|scope| scope.get(&name).copied())
    }

    fn lookup_callable(&mut self, name: Symbol, span: Span) -> Option<DeclId> {
        let Some(decl) = self.entities.lookup(name) else {
            self.add_error(
                SemanticError::UndefinedName {
                    name: self.name(name),
                    span: span.into(),
                },
                span,
            );
            return None;
        };
        if self.entities.get(decl).is_type() {
            self.add_error(
                SemanticError::NotAValue {
                    name: self.name(name),
                    span: span.into(),
                },
                span,
            );
            return None;
        }
        Some(decl)
    }

    fn check_ident(&mut self, expr: &Expr, name: Symbol) -> Operand {
        if let Some(ty) = self.lookup_local(name) {
            return Operand::Typed(ty);
        }
        let Some(decl) = self.lookup_callable(name, expr.span) else {
            return Operand::Typed(TypeId::INVALID);
        };
        let scope = self.current_scope();
        match resolve_reference(&mut self.arena, &self.scopes, &self.entities, decl, None, scope) {
            Ok(resolved) => self.function_value(expr, decl, resolved.type_args, resolved.instantiation),
            Err(ReferenceError::NeedsArguments { .. }) => Operand::GenericFunc(decl),
            Err(err) => {
                self.reference_error(decl, err, expr.span);
                Operand::Typed(TypeId::INVALID)
            }
        }
    }

    /// A function referenced as a value. Always goes through the general
    /// calling convention.
    fn function_value(&mut self, expr: &Expr, decl: DeclId, type_args: TypeIdVec, instantiation: Instantiation) -> Operand {
        let ty = self.cx().instantiate_shape(decl, &type_args);
        self.call_sites.insert(
            expr.id,
            CallSite {
                decl,
                type_args: type_args.clone(),
                instantiation,
            },
        );
        self.record_op(TypeOp::FuncValue {
            node: expr.id,
            decl,
            type_args,
        });
        Operand::Typed(ty)
    }

    // ========================================================================
    // Calls
    // ========================================================================

    fn check_call(&mut self, expr: &Expr, call: &CallExpr) -> Operand {
        let scope = self.current_scope();
        let callee = match &call.callee.kind {
            ExprKind::Ident(name) if self.lookup_local(*name).is_none() => {
                let Some(decl) = self.lookup_callable(*name, call.callee.span) else {
                    self.check_args_only(call);
                    return Operand::Typed(TypeId::INVALID);
                };
                match resolve_reference(&mut self.arena, &self.scopes, &self.entities, decl, None, scope) {
                    Ok(resolved) => DeclCallee {
                        decl,
                        type_args: Some(resolved.type_args),
                        instantiation: resolved.instantiation,
                        deduce_from: None,
                    },
                    Err(ReferenceError::NeedsArguments { implicit, missing, .. }) => DeclCallee {
                        decl,
                        type_args: None,
                        instantiation: Instantiation::Deduced,
                        deduce_from: Some((implicit.into_iter().collect(), missing)),
                    },
                    Err(err) => {
                        self.reference_error(decl, err, call.callee.span);
                        self.check_args_only(call);
                        return Operand::Typed(TypeId::INVALID);
                    }
                }
            }
            ExprKind::Instantiate { name, args } => {
                let args: TypeIdVec = args.iter().map(|a| self.lower_type(a, scope)).collect();
                let resolved = self
                    .lookup_callable(*name, call.callee.span)
                    .and_then(|decl| {
                        self.resolve_decl_args(decl, Some(&args), scope, call.callee.span)
                            .map(|type_args| (decl, type_args))
                    });
                let Some((decl, type_args)) = resolved else {
                    self.check_args_only(call);
                    return Operand::Typed(TypeId::INVALID);
                };
                DeclCallee {
                    decl,
                    type_args: Some(type_args),
                    instantiation: Instantiation::Explicit,
                    deduce_from: None,
                }
            }
            ExprKind::Selector { base, field } => {
                let base_ty = self.value_type(base);
                match self.method_callee(base_ty, *field) {
                    Some(callee) => callee,
                    None => {
                        let ty = self.check_selector(base_ty, *field, call.callee.span);
                        self.expr_types.insert(call.callee.id, ty);
                        return self.call_value(ty, call, call.callee.span);
                    }
                }
            }
            _ => {
                let operand = self.check_expr(&call.callee);
                let ty = self.operand_type(&operand, call.callee.span);
                return self.call_value(ty, call, call.callee.span);
            }
        };
        self.call_decl(expr, call, callee)
    }

    fn check_args_only(&mut self, call: &CallExpr) {
        for arg in &call.args {
            self.check_expr(arg);
        }
    }

    /// Method declared on the (possibly pointer-to) named receiver type.
    fn method_callee(&mut self, base: TypeId, name: Symbol) -> Option<DeclCallee> {
        let named = match self.arena.get(base) {
            SemaType::Pointer(elem) => *elem,
            _ => base,
        };
        let (decl, args) = self.arena.unwrap_named(named).map(|(d, a)| (d, a.clone()))?;
        let method = self.entities.find_method(decl, name)?;
        Some(DeclCallee {
            decl: method,
            instantiation: if args.is_empty() {
                Instantiation::NotGeneric
            } else {
                Instantiation::Implicit
            },
            type_args: Some(args),
            deduce_from: None,
        })
    }

    /// Call through a function-typed value.
    fn call_value(&mut self, callee: TypeId, call: &CallExpr, span: Span) -> Operand {
        if callee.is_invalid() {
            self.check_args_only(call);
            return Operand::Typed(TypeId::INVALID);
        }
        let underlying = self.cx().underlying(callee);
        let Some((params, results)) = self
            .arena
            .unwrap_function(underlying)
            .map(|(p, r)| (p.clone(), r.clone()))
        else {
            let error = if self.arena.unwrap_type_param(underlying).is_some() {
                SemanticError::IllegalParametricOperation {
                    operation: "call".to_string(),
                    ty: self.display(callee),
                    span: span.into(),
                }
            } else {
                SemanticError::NotCallable {
                    ty: self.display(callee),
                    span: span.into(),
                }
            };
            self.add_error(error, span);
            self.check_args_only(call);
            return Operand::Typed(TypeId::INVALID);
        };
        if !self.check_arity(params.len(), call, span) {
            return Operand::Typed(TypeId::INVALID);
        }
        for (arg, &param) in call.args.iter().zip(params.iter()) {
            let operand = self.check_expr(arg);
            self.assign_operand(&operand, param, arg.span);
        }
        self.results_operand(&results)
    }

    fn check_arity(&mut self, expected: usize, call: &CallExpr, span: Span) -> bool {
        if call.args.len() == expected {
            return true;
        }
        self.add_error(
            SemanticError::WrongArgumentCount {
                expected,
                found: call.args.len(),
                span: span.into(),
            },
            span,
        );
        self.check_args_only(call);
        false
    }

    fn results_operand(&mut self, results: &[TypeId]) -> Operand {
        if results.is_empty() {
            Operand::Void
        } else {
            Operand::Typed(self.arena.results(results))
        }
    }

    fn call_decl(&mut self, expr: &Expr, call: &CallExpr, callee: DeclCallee) -> Operand {
        let decl = callee.decl;
        let shape = self.entities.get(decl).shape;
        let Some((declared_params, declared_results)) = self
            .arena
            .unwrap_function(shape)
            .map(|(p, r)| (p.clone(), r.clone()))
        else {
            self.check_args_only(call);
            return Operand::Typed(TypeId::INVALID);
        };
        if !self.check_arity(declared_params.len(), call, expr.span) {
            return Operand::Typed(TypeId::INVALID);
        }

        let args: Vec<Operand> = call.args.iter().map(|a| self.check_expr(a)).collect();

        let type_args = match callee.type_args {
            Some(type_args) => type_args,
            None => {
                let Some((prebound, missing)) = callee.deduce_from else {
                    return Operand::Typed(TypeId::INVALID);
                };
                match self.deduce_call(expr, call, decl, prebound, &missing, &declared_params, &declared_results, &args) {
                    Some(type_args) => type_args,
                    None => return Operand::Typed(TypeId::INVALID),
                }
            }
        };

        // Methods share the receiver's parameters, functions have their own.
        let callee_params = self.cx().decl_params(decl);
        let subs = substitution_for(&callee_params, &type_args);
        let params = self.arena.substitute_all(&declared_params, &subs);
        let results = self.arena.substitute_all(&declared_results, &subs);

        for (i, (arg, operand)) in call.args.iter().zip(&args).enumerate() {
            self.assign_operand(operand, params[i], arg.span);
            let declared = declared_params[i];
            if !self.arena.mentions_any(declared, &callee_params) {
                continue;
            }
            let concrete = match operand {
                Operand::Typed(t) if !self.arena.is_parametric(*t) => Some(*t),
                Operand::Untyped(_) if !self.arena.is_parametric(params[i]) => Some(params[i]),
                _ => None,
            };
            if let Some(concrete) = concrete {
                self.conversions
                    .entry(arg.id)
                    .or_default()
                    .push(ImplicitConversion::Coerce { declared, concrete });
            }
        }
        for (index, (&declared, &concrete)) in declared_results.iter().zip(results.iter()).enumerate() {
            if self.arena.mentions_any(declared, &callee_params) && !self.arena.is_parametric(concrete) {
                self.conversions
                    .entry(expr.id)
                    .or_default()
                    .push(ImplicitConversion::Assert {
                        index,
                        declared,
                        concrete,
                    });
            }
        }

        self.call_sites.insert(
            expr.id,
            CallSite {
                decl,
                type_args: type_args.clone(),
                instantiation: callee.instantiation,
            },
        );
        self.record_op(TypeOp::Call {
            node: expr.id,
            callee: decl,
            type_args,
        });
        self.results_operand(&results)
    }

    #[allow(clippy::too_many_arguments)]
    fn deduce_call(
        &mut self,
        expr: &Expr,
        call: &CallExpr,
        decl: DeclId,
        prebound: Substitution,
        missing: &[TypeParamId],
        declared_params: &[TypeId],
        declared_results: &[TypeId],
        args: &[Operand],
    ) -> Option<TypeIdVec> {
        let mut arg_types = Vec::with_capacity(args.len());
        for (arg, operand) in call.args.iter().zip(args) {
            let ty = match operand {
                Operand::Typed(t) => ArgType::Typed(*t),
                Operand::Untyped(Literal::Nil) => ArgType::Nil,
                Operand::Untyped(lit) => match lit.default_type() {
                    Some(prim) => ArgType::Untyped(TypeId::primitive(prim)),
                    None => ArgType::Nil,
                },
                other => {
                    self.operand_error(other, arg.span);
                    return None;
                }
            };
            arg_types.push(ty);
        }

        let result = deduce(&mut self.cx(), missing, prebound, declared_params, declared_results, &arg_types);
        let bindings = match result {
            Ok(bindings) => bindings,
            Err(err) => {
                self.deduction_error(decl, err, call, expr.span);
                return None;
            }
        };

        let type_args: TypeIdVec = self
            .cx()
            .decl_params(decl)
            .iter()
            .map(|p| bindings.get(p).copied().unwrap_or(TypeId::INVALID))
            .collect();
        tracing::debug!(
            callee = self.decl_name(decl),
            args = ?type_args.iter().map(|&t| self.display(t)).collect::<Vec<_>>(),
            "deduced call"
        );
        if let Err(error) = self.cx().check_instantiation(decl, &type_args, expr.span) {
            self.add_error(error, expr.span);
            return None;
        }
        Some(type_args)
    }

    fn deduction_error(&mut self, decl: DeclId, err: DeductionError, call: &CallExpr, span: Span) {
        let param_name = |this: &Self, p: TypeParamId| this.name(this.scopes.param(p).name);
        let arg_span = |i: usize| call.args.get(i).map_or(span, |a| a.span);
        let (error, at) = match err {
            DeductionError::ResultOnly { param } => (
                SemanticError::ResultOnlyTypeParam {
                    name: self.decl_name(decl),
                    param: param_name(self, param),
                    span: span.into(),
                },
                span,
            ),
            DeductionError::Conflict {
                param,
                first,
                second,
                arg,
            } => (
                SemanticError::DeductionConflict {
                    param: param_name(self, param),
                    first: self.display(first),
                    second: self.display(second),
                    span: arg_span(arg).into(),
                },
                arg_span(arg),
            ),
            DeductionError::FromNil { param, arg } => (
                SemanticError::CannotInferFromNil {
                    param: param_name(self, param),
                    span: arg_span(arg).into(),
                },
                arg_span(arg),
            ),
            DeductionError::Shape { expected, found, arg } => (
                SemanticError::DeductionShapeMismatch {
                    expected: self.display(expected),
                    found: self.display(found),
                    span: arg_span(arg).into(),
                },
                arg_span(arg),
            ),
            DeductionError::Incomplete { param } => (
                SemanticError::CannotInfer {
                    name: self.decl_name(decl),
                    param: param_name(self, param),
                    span: span.into(),
                },
                span,
            ),
        };
        self.add_error(error, at);
    }

    // ========================================================================
    // Selectors, indexing, operators
    // ========================================================================

    fn check_selector(&mut self, base: TypeId, field: Symbol, span: Span) -> TypeId {
        if base.is_invalid() {
            return TypeId::INVALID;
        }
        if let Some(signature) = self.cx().lookup_method(base, field) {
            return signature;
        }
        let mut underlying = self.cx().underlying(base);
        if let SemaType::Pointer(elem) = self.arena.get(underlying) {
            let elem = *elem;
            underlying = self.cx().underlying(elem);
        }
        match self.arena.get(underlying) {
            SemaType::Struct(fields) => {
                if let Some(f) = fields.iter().find(|f| f.name == field) {
                    return f.ty;
                }
            }
            SemaType::TypeParam(_) => {
                let error = SemanticError::IllegalParametricOperation {
                    operation: format!("selector .{}", self.name(field)),
                    ty: self.display(base),
                    span: span.into(),
                };
                self.add_error(error, span);
                return TypeId::INVALID;
            }
            _ => {}
        }
        let error = SemanticError::NoSuchMember {
            ty: self.display(base),
            member: self.name(field),
            span: span.into(),
        };
        self.add_error(error, span);
        TypeId::INVALID
    }

    fn check_index(&mut self, base: TypeId, index: &Operand, span: Span) -> TypeId {
        if base.is_invalid() {
            return TypeId::INVALID;
        }
        let mut underlying = self.cx().underlying(base);
        if let SemaType::Pointer(elem) = self.arena.get(underlying) {
            let elem = *elem;
            let pointee = self.cx().underlying(elem);
            if matches!(self.arena.get(pointee), SemaType::Array { .. }) {
                underlying = pointee;
            }
        }
        let (key, elem) = match self.arena.get(underlying).clone() {
            SemaType::Slice(elem) | SemaType::Array { elem, .. } => (TypeId::INT, elem),
            SemaType::Map { key, value } => (key, value),
            SemaType::Primitive(PrimitiveType::String) => (TypeId::INT, TypeId::UINT8),
            SemaType::TypeParam(_) => {
                let error = SemanticError::IllegalParametricOperation {
                    operation: "index".to_string(),
                    ty: self.display(base),
                    span: span.into(),
                };
                self.add_error(error, span);
                return TypeId::INVALID;
            }
            _ => {
                let error = SemanticError::InvalidOperands {
                    op: "[]".to_string(),
                    left: self.display(base),
                    right: self.operand_name(index),
                    span: span.into(),
                };
                self.add_error(error, span);
                return TypeId::INVALID;
            }
        };
        if key == TypeId::INT {
            let integral = match index {
                Operand::Typed(t) => {
                    let u = self.cx().underlying(*t);
                    t.is_invalid() || self.arena.unwrap_primitive(u).is_some_and(|p| p.is_integer())
                }
                Operand::Untyped(lit) => literal_fits(&mut self.cx(), lit, TypeId::INT),
                _ => false,
            };
            if !integral {
                let error = SemanticError::TypeMismatch {
                    expected: "integer index".to_string(),
                    found: self.operand_name(index),
                    span: span.into(),
                };
                self.add_error(error, span);
            }
        } else {
            self.assign_operand(index, key, span);
        }
        elem
    }

    fn operand_name(&self, operand: &Operand) -> String {
        match operand {
            Operand::Typed(t) => self.display(*t),
            Operand::Untyped(lit) => lit.to_string(),
            Operand::GenericFunc(decl) => self.decl_name(*decl),
            Operand::Void => "()".to_string(),
        }
    }

    fn check_binary(&mut self, op: BinaryOp, left: Operand, right: Operand, span: Span) -> Operand {
        for operand in [&left, &right] {
            if let Operand::Typed(t) = operand
                && self.arena.is_parametric(*t)
            {
                let error = SemanticError::IllegalParametricOperation {
                    operation: format!("operator {}", op.as_str()),
                    ty: self.display(*t),
                    span: span.into(),
                };
                self.add_error(error, span);
                return Operand::Typed(TypeId::INVALID);
            }
        }

        let operand_ty = match (&left, &right) {
            (Operand::Typed(l), Operand::Typed(r)) => {
                let compatible = l == r || {
                    let mut cx = TypeCx::new(&mut self.arena, &self.entities, &self.scopes, self.interner);
                    self.rules.assignable(&mut cx, *l, *r) || self.rules.assignable(&mut cx, *r, *l)
                };
                if !compatible && !l.is_invalid() && !r.is_invalid() {
                    return self.invalid_operands(op, &left, &right, span);
                }
                *l
            }
            (Operand::Typed(t), Operand::Untyped(lit)) | (Operand::Untyped(lit), Operand::Typed(t)) => {
                if !literal_fits(&mut self.cx(), lit, *t) {
                    return self.invalid_operands(op, &left, &right, span);
                }
                *t
            }
            (Operand::Untyped(l), Operand::Untyped(_)) => match l.default_type() {
                Some(prim) => TypeId::primitive(prim),
                None => return self.invalid_operands(op, &left, &right, span),
            },
            _ => {
                self.operand_error(&left, span);
                self.operand_error(&right, span);
                return Operand::Typed(TypeId::INVALID);
            }
        };
        if operand_ty.is_invalid() {
            return Operand::Typed(TypeId::INVALID);
        }

        let underlying = self.cx().underlying(operand_ty);
        let prim = self.arena.unwrap_primitive(underlying);
        let valid = if op.is_logical() {
            prim == Some(PrimitiveType::Bool)
        } else if matches!(op, BinaryOp::Eq | BinaryOp::Ne) {
            true
        } else if op.is_comparison() {
            prim.is_some_and(|p| p.is_integer() || p.is_float() || p == PrimitiveType::String)
        } else if op == BinaryOp::Add {
            prim.is_some_and(|p| p.is_numeric() || p == PrimitiveType::String)
        } else {
            prim.is_some_and(|p| p.is_numeric())
        };
        if !valid {
            return self.invalid_operands(op, &left, &right, span);
        }
        if op.is_comparison() {
            Operand::Typed(TypeId::BOOL)
        } else {
            Operand::Typed(operand_ty)
        }
    }

    fn invalid_operands(&mut self, op: BinaryOp, left: &Operand, right: &Operand, span: Span) -> Operand {
        let error = SemanticError::InvalidOperands {
            op: op.as_str().to_string(),
            left: self.operand_name(left),
            right: self.operand_name(right),
            span: span.into(),
        };
        self.add_error(error, span);
        Operand::Typed(TypeId::INVALID)
    }
}
