// analyzer/declarations.rs
//
// Passes 1 and 2: scopes, declarations, type expressions and signatures.

use genus_frontend::{Decl, Param, TypeExpr, TypeExprKind};
use genus_identity::{DeclId, PrimitiveType, ScopeId, Span, Symbol};
use rustc_hash::FxHashMap;
use smallvec::SmallVec;

use super::{Analyzer, BodyState, FunctionFacts, Item};
use crate::entity_registry::DeclKind;
use crate::errors::SemanticError;
use crate::resolve::{Instantiation, ReferenceError, resolve_reference};
use crate::type_arena::{FieldType, MethodType, SemaType, TypeId, TypeIdVec};

/// Expansion limit when looking for by-value cycles through instantiations.
const MAX_CONTAINMENT_DEPTH: usize = 64;

impl<'p> Analyzer<'p> {
    // ========================================================================
    // Pass 1
    // ========================================================================

    pub(super) fn collect(&mut self, decls: &'p [Decl], scope: ScopeId) {
        for decl in decls {
            match decl {
                Decl::Generic(block) => {
                    let params: Vec<(Symbol, Span)> =
                        block.type_params.iter().map(|p| (p.name, p.span)).collect();
                    let inner = self.scopes.declare_scope(scope, &params, block.span);
                    self.generic_blocks.push((inner, block.type_params.as_slice()));
                    self.collect(&block.decls, inner);
                }
                Decl::Type(ast) => {
                    let Some(id) = self.declare(ast.name, DeclKind::Type, scope, true, ast.span) else {
                        continue;
                    };
                    self.items.push(Item::Type { decl: id, ast });
                    for method in &ast.methods {
                        match self
                            .entities
                            .declare_method(id, method.name, method.body.is_some(), method.span)
                        {
                            Ok(m) => self.items.push(Item::Method { decl: m, ast: method }),
                            Err(first) => self.duplicate(method.name, method.span, first),
                        }
                    }
                }
                Decl::Function(ast) => {
                    let has_body = ast.body.is_some();
                    if let Some(id) = self.declare(ast.name, DeclKind::Function, scope, has_body, ast.span) {
                        self.items.push(Item::Function { decl: id, ast });
                    }
                }
            }
        }
    }

    fn declare(&mut self, name: Symbol, kind: DeclKind, scope: ScopeId, has_body: bool, span: Span) -> Option<DeclId> {
        match self.entities.declare(name, kind, scope, has_body, span) {
            Ok(id) => Some(id),
            Err(first) => {
                self.duplicate(name, span, first);
                None
            }
        }
    }

    fn duplicate(&mut self, name: Symbol, span: Span, first: DeclId) {
        let first = self.entities.get(first).span;
        self.add_error(
            SemanticError::DuplicateDeclaration {
                name: self.name(name),
                span: span.into(),
                first: first.into(),
            },
            span,
        );
    }

    // ========================================================================
    // Pass 2
    // ========================================================================

    pub(super) fn resolve_type_shapes(&mut self) {
        for item in self.items.clone() {
            if let Item::Type { decl, ast } = item {
                let scope = self.entities.get(decl).scope;
                let shape = self.lower_type(&ast.ty, scope);
                self.entities.set_shape(decl, shape);
            }
        }
    }

    pub(super) fn resolve_constraints(&mut self) {
        for (scope, params) in self.generic_blocks.clone() {
            let ids = self.scopes.scope(scope).params.clone();
            for (param, ast) in ids.into_iter().zip(params) {
                let Some(expr) = &ast.constraint else {
                    continue;
                };
                let constraint = self.lower_type(expr, scope);
                if constraint.is_invalid() {
                    continue;
                }
                if !self.cx().is_interface(constraint) {
                    self.add_error(
                        SemanticError::InvalidConstraint {
                            param: self.name(ast.name),
                            found: self.display(constraint),
                            span: expr.span.into(),
                        },
                        expr.span,
                    );
                    continue;
                }
                self.scopes.set_constraint(param, constraint);
            }
        }
    }

    pub(super) fn resolve_signatures(&mut self) {
        for item in self.items.clone() {
            let (decl, params, results) = match item {
                Item::Type { .. } => continue,
                Item::Function { decl, ast } => (decl, &ast.params, &ast.results),
                Item::Method { decl, ast } => (decl, &ast.params, &ast.results),
            };
            let scope = self.entities.get(decl).scope;
            let signature = self.lower_signature(params, results, scope);
            self.entities.set_shape(decl, signature);
        }
    }

    fn lower_signature(&mut self, params: &[Param], results: &[TypeExpr], scope: ScopeId) -> TypeId {
        let params: TypeIdVec = params.iter().map(|p| self.lower_type(&p.ty, scope)).collect();
        let results: TypeIdVec = results.iter().map(|r| self.lower_type(r, scope)).collect();
        self.arena.function(params, results)
    }

    /// Report named types that contain themselves by value.
    pub(super) fn check_recursive_types(&mut self) {
        for item in self.items.clone() {
            let Item::Type { decl, ast } = item else {
                continue;
            };
            let params = self.cx().decl_params(decl);
            let args = params.iter().map(|&p| self.arena.type_param(p)).collect();
            let root = self.arena.named(decl, args);
            let mut stack = vec![root];
            let shape = self.entities.get(decl).shape;
            if self.contains_by_value(shape, &mut stack) {
                self.add_error(
                    SemanticError::InvalidRecursiveType {
                        name: self.name(ast.name),
                        span: ast.span.into(),
                    },
                    ast.span,
                );
            }
        }
    }

    fn contains_by_value(&mut self, ty: TypeId, stack: &mut Vec<TypeId>) -> bool {
        if stack.len() > MAX_CONTAINMENT_DEPTH {
            return false;
        }
        match self.arena.get(ty).clone() {
            SemaType::Named { decl, type_args } => {
                if stack.contains(&ty) {
                    return true;
                }
                // Only the root's own cycle is reported here.
                if stack.iter().any(|&s| self.arena.unwrap_named(s).map(|(d, _)| d) == Some(decl)) {
                    return false;
                }
                stack.push(ty);
                let inner = self.cx().instantiate_shape(decl, &type_args);
                let found = self.contains_by_value(inner, stack);
                stack.pop();
                found
            }
            SemaType::Struct(fields) => fields.iter().any(|f| self.contains_by_value(f.ty, stack)),
            SemaType::Array { elem, .. } => self.contains_by_value(elem, stack),
            _ => false,
        }
    }

    // ========================================================================
    // Type expressions
    // ========================================================================

    pub(super) fn lower_type(&mut self, expr: &TypeExpr, scope: ScopeId) -> TypeId {
        match &expr.kind {
            TypeExprKind::Named { name, args } => self.lower_named(*name, args.as_deref(), scope, expr.span),
            TypeExprKind::Pointer(elem) => {
                let elem = self.lower_type(elem, scope);
                self.arena.pointer(elem)
            }
            TypeExprKind::Slice(elem) => {
                let elem = self.lower_type(elem, scope);
                self.arena.slice(elem)
            }
            TypeExprKind::Array { elem, len } => {
                let elem = self.lower_type(elem, scope);
                if *len > genus_runtime::MAX_TYPE_SIZE {
                    self.add_error(
                        SemanticError::ArrayTooLarge {
                            len: *len,
                            max: genus_runtime::MAX_TYPE_SIZE,
                            span: expr.span.into(),
                        },
                        expr.span,
                    );
                    return TypeId::INVALID;
                }
                self.arena.array(elem, *len)
            }
            TypeExprKind::Map { key, value } => {
                let key = self.lower_type(key, scope);
                let value = self.lower_type(value, scope);
                self.arena.map(key, value)
            }
            TypeExprKind::Chan { elem, dir } => {
                let elem = self.lower_type(elem, scope);
                self.arena.chan(elem, *dir)
            }
            TypeExprKind::Func { params, results } => {
                let params: TypeIdVec = params.iter().map(|p| self.lower_type(p, scope)).collect();
                let results: TypeIdVec = results.iter().map(|r| self.lower_type(r, scope)).collect();
                self.arena.function(params, results)
            }
            TypeExprKind::Struct(fields) => {
                let fields: SmallVec<[FieldType; 4]> = fields
                    .iter()
                    .map(|f| FieldType {
                        name: f.name,
                        ty: self.lower_type(&f.ty, scope),
                    })
                    .collect();
                self.arena.struct_type(fields)
            }
            TypeExprKind::Interface(methods) => {
                let methods: SmallVec<[MethodType; 2]> = methods
                    .iter()
                    .map(|m| {
                        let params: TypeIdVec = m.params.iter().map(|p| self.lower_type(p, scope)).collect();
                        let results: TypeIdVec = m.results.iter().map(|r| self.lower_type(r, scope)).collect();
                        MethodType {
                            name: m.name,
                            signature: self.arena.function(params, results),
                        }
                    })
                    .collect();
                self.arena.interface(methods)
            }
        }
    }

    /// Type parameter, then primitive, then declared type.
    fn lower_named(&mut self, name: Symbol, args: Option<&[TypeExpr]>, scope: ScopeId, span: Span) -> TypeId {
        if args.is_none() {
            if let Some(param) = self.scopes.lookup_param(scope, name) {
                return self.arena.type_param(param);
            }
            if let Some(prim) = PrimitiveType::from_name(self.interner.resolve(name)) {
                return TypeId::primitive(prim);
            }
        }
        let Some(decl) = self.entities.lookup(name) else {
            self.add_error(
                SemanticError::UndefinedName {
                    name: self.name(name),
                    span: span.into(),
                },
                span,
            );
            return TypeId::INVALID;
        };
        if !self.entities.get(decl).is_type() {
            self.add_error(
                SemanticError::NotAType {
                    name: self.name(name),
                    span: span.into(),
                },
                span,
            );
            return TypeId::INVALID;
        }
        let explicit: Option<TypeIdVec> = args.map(|args| args.iter().map(|a| self.lower_type(a, scope)).collect());
        match self.resolve_decl_args(decl, explicit.as_deref(), scope, span) {
            Some(resolved) => self.arena.named(decl, resolved),
            None => TypeId::INVALID,
        }
    }

    /// Type arguments for a reference to `decl`, reporting failures. Explicit
    /// arguments get their constraint check here.
    pub(super) fn resolve_decl_args(
        &mut self,
        decl: DeclId,
        explicit: Option<&[TypeId]>,
        scope: ScopeId,
        span: Span,
    ) -> Option<TypeIdVec> {
        if explicit.is_some_and(|args| args.iter().any(|a| a.is_invalid())) {
            return None;
        }
        match resolve_reference(&mut self.arena, &self.scopes, &self.entities, decl, explicit, scope) {
            Ok(resolved) => {
                if resolved.instantiation == Instantiation::Explicit {
                    self.check_or_defer(decl, resolved.type_args.clone(), span);
                }
                Some(resolved.type_args)
            }
            Err(err) => {
                self.reference_error(decl, err, span);
                None
            }
        }
    }

    pub(super) fn reference_error(&mut self, decl: DeclId, err: ReferenceError, span: Span) {
        let name = self.decl_name(decl);
        let error = match err {
            ReferenceError::WrongCount { expected, found } => SemanticError::WrongTypeArgCount {
                name,
                expected,
                found,
                span: span.into(),
            },
            ReferenceError::NeedsArguments { scope, .. } => SemanticError::MissingTypeArguments {
                name,
                scope: self
                    .scopes
                    .label(scope, |s| self.interner.resolve(s).to_string()),
                span: span.into(),
            },
        };
        self.add_error(error, span);
    }

    // ========================================================================
    // Pass 3 driver
    // ========================================================================

    pub(super) fn check_bodies(&mut self) {
        for item in self.items.clone() {
            let (decl, params, body, receiver) = match item {
                Item::Type { .. } => continue,
                Item::Function { decl, ast } => (decl, &ast.params, &ast.body, None),
                Item::Method { decl, ast } => (decl, &ast.params, &ast.body, Some(ast.receiver)),
            };
            let Some(body) = body else {
                continue;
            };
            let info = self.entities.get(decl);
            let scope = info.scope;
            let Some((param_types, results)) = self
                .arena
                .unwrap_function(info.shape)
                .map(|(p, r)| (p.clone(), r.clone()))
            else {
                continue;
            };

            let mut locals = FxHashMap::default();
            if let Some(receiver) = receiver {
                let receiver_ty = self.cx().receiver_type(decl);
                locals.insert(receiver, receiver_ty);
            }
            for (param, ty) in params.iter().zip(param_types.iter()) {
                locals.insert(param.name, *ty);
            }

            tracing::trace!(decl = self.decl_name(item.decl()), "checking body");
            self.body = Some(BodyState {
                decl,
                scope,
                results,
                locals: vec![locals],
                ops: Vec::new(),
            });
            self.check_block(body);
            if let Some(state) = self.body.take() {
                self.functions.push(FunctionFacts {
                    decl: state.decl,
                    ops: state.ops,
                });
            }
        }
    }
}
