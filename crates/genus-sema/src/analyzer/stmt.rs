// analyzer/stmt.rs
//
// Statement checking.

use genus_frontend::{Block, LetStmt, ReturnStmt, Stmt, TypeSwitchStmt};
use genus_identity::{Span, Symbol};
use rustc_hash::FxHashMap;

use super::expr::Operand;
use super::{Analyzer, TypeOp};
use crate::compatibility::check_assertion;
use crate::errors::SemanticError;
use crate::type_arena::TypeId;

impl<'p> Analyzer<'p> {
    pub(super) fn check_block(&mut self, block: &Block) {
        self.push_locals();
        for stmt in &block.stmts {
            self.check_stmt(stmt);
        }
        self.pop_locals();
    }

    fn push_locals(&mut self) {
        if let Some(body) = self.body.as_mut() {
            body.locals.push(FxHashMap::default());
        }
    }

    fn pop_locals(&mut self) {
        if let Some(body) = self.body.as_mut() {
            body.locals.pop();
        }
    }

    fn bind_local(&mut self, name: Symbol, ty: TypeId) {
        if let Some(scope) = self.body.as_mut().and_then(|b| b.locals.last_mut()) {
            scope.insert(name, ty);
        }
    }

    fn check_stmt(&mut self, stmt: &Stmt) {
        match stmt {
            Stmt::Let(let_stmt) => self.check_let(let_stmt),
            Stmt::Assign(assign) => {
                let target = self.check_expr(&assign.target);
                let target = match target {
                    Operand::Typed(t) => t,
                    _ => {
                        let error = SemanticError::TypeMismatch {
                            expected: "assignable location".to_string(),
                            found: "value".to_string(),
                            span: assign.target.span.into(),
                        };
                        self.add_error(error, assign.target.span);
                        TypeId::INVALID
                    }
                };
                let value = self.check_expr(&assign.value);
                self.assign_operand(&value, target, assign.value.span);
            }
            Stmt::Expr(expr_stmt) => {
                self.check_expr(&expr_stmt.expr);
            }
            Stmt::Return(ret) => self.check_return(ret),
            Stmt::TypeSwitch(switch) => self.check_type_switch(switch),
            Stmt::Block(block) => self.check_block(block),
        }
    }

    fn check_let(&mut self, stmt: &LetStmt) {
        let scope = self.current_scope();
        let declared = stmt.ty.as_ref().map(|t| self.lower_type(t, scope));
        let init = stmt.init.as_ref().map(|e| (self.check_expr(e), e.span));

        match stmt.names.as_slice() {
            [name] => {
                let ty = match (declared, init) {
                    (Some(declared), Some((operand, span))) => {
                        self.assign_operand(&operand, declared, span);
                        declared
                    }
                    (Some(declared), None) => declared,
                    (None, Some((operand, span))) => self.let_value_type(&operand, span),
                    (None, None) => {
                        let error = SemanticError::TypeMismatch {
                            expected: "type or initializer".to_string(),
                            found: "neither".to_string(),
                            span: stmt.span.into(),
                        };
                        self.add_error(error, stmt.span);
                        TypeId::INVALID
                    }
                };
                self.bind_local(*name, ty);
            }
            names => {
                let elems = match &init {
                    Some((Operand::Typed(t), _)) => self.arena.tuple_elems(*t).cloned(),
                    _ => None,
                };
                let elems = match elems {
                    Some(elems) if elems.len() == names.len() => elems,
                    _ => {
                        let found = match &init {
                            Some((Operand::Typed(t), _)) if t.is_invalid() => names.len(),
                            Some((Operand::Typed(t), _)) => self.arena.tuple_elems(*t).map_or(1, |e| e.len()),
                            Some(_) => 1,
                            None => 0,
                        };
                        if found != names.len() {
                            let error = SemanticError::WrongResultCount {
                                expected: names.len(),
                                found,
                                span: stmt.span.into(),
                            };
                            self.add_error(error, stmt.span);
                        }
                        for &name in names {
                            self.bind_local(name, TypeId::INVALID);
                        }
                        return;
                    }
                };
                for (i, (&name, &ty)) in names.iter().zip(elems.iter()).enumerate() {
                    let ty = match declared {
                        Some(declared) if i == 0 => {
                            self.assign_operand(&Operand::Typed(ty), declared, stmt.span);
                            declared
                        }
                        _ => ty,
                    };
                    self.bind_local(name, ty);
                }
            }
        }
    }

    /// Type a `let` without annotation takes from its initializer.
    fn let_value_type(&mut self, operand: &Operand, span: Span) -> TypeId {
        match operand {
            Operand::Typed(t) => *t,
            Operand::Untyped(lit) => match lit.default_type() {
                Some(prim) => TypeId::primitive(prim),
                None => {
                    let error = SemanticError::TypeMismatch {
                        expected: "typed initializer".to_string(),
                        found: "nil".to_string(),
                        span: span.into(),
                    };
                    self.add_error(error, span);
                    TypeId::INVALID
                }
            },
            Operand::GenericFunc(decl) => {
                let error = SemanticError::UninstantiatedGenericValue {
                    name: self.decl_name(*decl),
                    span: span.into(),
                };
                self.add_error(error, span);
                TypeId::INVALID
            }
            Operand::Void => {
                let error = SemanticError::TypeMismatch {
                    expected: "value".to_string(),
                    found: "()".to_string(),
                    span: span.into(),
                };
                self.add_error(error, span);
                TypeId::INVALID
            }
        }
    }

    fn check_return(&mut self, ret: &ReturnStmt) {
        let results = self.body.as_ref().map(|b| b.results.clone()).unwrap_or_default();
        if ret.values.len() != results.len() {
            let error = SemanticError::WrongResultCount {
                expected: results.len(),
                found: ret.values.len(),
                span: ret.span.into(),
            };
            self.add_error(error, ret.span);
            for value in &ret.values {
                self.check_expr(value);
            }
            return;
        }
        for (value, &expected) in ret.values.iter().zip(results.iter()) {
            let operand = self.check_expr(value);
            self.assign_operand(&operand, expected, value.span);
        }
    }

    /// Cases are tried in listed order by repeated assertion.
    fn check_type_switch(&mut self, switch: &TypeSwitchStmt) {
        let scope = self.current_scope();
        let scrutinee = self.value_type(&switch.scrutinee);
        if let Err(error) = check_assertion(&mut self.cx(), scrutinee, switch.scrutinee.span) {
            self.add_error(error, switch.scrutinee.span);
        }

        let case_types: Vec<Vec<TypeId>> = switch
            .cases
            .iter()
            .map(|case| case.types.iter().map(|t| self.lower_type(t, scope)).collect())
            .collect();
        let arms = case_types
            .iter()
            .enumerate()
            .flat_map(|(i, types)| types.iter().map(move |&t| (i, t)))
            .collect();
        self.record_op(TypeOp::Switch {
            node: switch.scrutinee.id,
            scrutinee,
            arms,
        });

        for (case, types) in switch.cases.iter().zip(&case_types) {
            self.push_locals();
            if let Some(binding) = switch.binding {
                let ty = match types.as_slice() {
                    [single] => *single,
                    _ => scrutinee,
                };
                self.bind_local(binding, ty);
            }
            self.check_block(&case.body);
            self.pop_locals();
        }
        if let Some(default) = &switch.default {
            self.push_locals();
            if let Some(binding) = switch.binding {
                self.bind_local(binding, scrutinee);
            }
            self.check_block(default);
            self.pop_locals();
        }
    }
}
