// analyzer/mod.rs
//
// The checker: declares scopes and declarations, resolves shapes and
// signatures, then checks bodies, recording what the specializer needs.

mod declarations;
mod expr;
mod output;
mod stmt;
#[cfg(test)]
mod tests;

pub use output::{
    AnalysisOutput, AnalyzerBuilder, CallSite, FunctionFacts, ImplicitConversion, TypeError, TypeOp,
};

use genus_frontend::{FuncDecl, MethodDecl, NodeId, Program, TypeDecl, TypeParam};
use genus_identity::{DeclId, Interner, ScopeId, Span, Symbol};
use rustc_hash::FxHashMap;

use crate::compatibility::ConcreteAssignability;
use crate::cx::{NameView, TypeCx};
use crate::entity_registry::EntityRegistry;
use crate::errors::SemanticError;
use crate::generic::ScopeTree;
use crate::type_arena::{TypeArena, TypeId, TypeIdVec};

/// A declaration together with the AST it came from.
#[derive(Debug, Clone, Copy)]
enum Item<'p> {
    Type { decl: DeclId, ast: &'p TypeDecl },
    Function { decl: DeclId, ast: &'p FuncDecl },
    Method { decl: DeclId, ast: &'p MethodDecl },
}

impl Item<'_> {
    fn decl(&self) -> DeclId {
        match self {
            Item::Type { decl, .. } | Item::Function { decl, .. } | Item::Method { decl, .. } => *decl,
        }
    }
}

/// Constraint check on an explicit instantiation written in a declaration,
/// run once every shape and constraint is known.
#[derive(Debug, Clone)]
struct PendingCheck {
    decl: DeclId,
    args: TypeIdVec,
    span: Span,
}

/// State while checking one function or method body.
#[derive(Debug)]
struct BodyState {
    decl: DeclId,
    scope: ScopeId,
    results: TypeIdVec,
    locals: Vec<FxHashMap<Symbol, TypeId>>,
    ops: Vec<TypeOp>,
}

pub struct Analyzer<'p> {
    program: &'p Program,
    interner: &'p Interner,
    rules: Box<dyn ConcreteAssignability>,
    arena: TypeArena,
    entities: EntityRegistry,
    scopes: ScopeTree,
    items: Vec<Item<'p>>,
    generic_blocks: Vec<(ScopeId, &'p [TypeParam])>,
    /// While true, constraint checks on explicit instantiations are queued.
    defer_checks: bool,
    pending_checks: Vec<PendingCheck>,
    errors: Vec<TypeError>,
    expr_types: FxHashMap<NodeId, TypeId>,
    call_sites: FxHashMap<NodeId, CallSite>,
    conversions: FxHashMap<NodeId, Vec<ImplicitConversion>>,
    functions: Vec<FunctionFacts>,
    body: Option<BodyState>,
}

impl<'p> Analyzer<'p> {
    pub fn builder(program: &'p Program, interner: &'p Interner) -> AnalyzerBuilder<'p> {
        AnalyzerBuilder::new(program, interner)
    }

    fn new(program: &'p Program, interner: &'p Interner, rules: Box<dyn ConcreteAssignability>) -> Self {
        Self {
            program,
            interner,
            rules,
            arena: TypeArena::new(),
            entities: EntityRegistry::new(),
            scopes: ScopeTree::new(),
            items: Vec::new(),
            generic_blocks: Vec::new(),
            defer_checks: true,
            pending_checks: Vec::new(),
            errors: Vec::new(),
            expr_types: FxHashMap::default(),
            call_sites: FxHashMap::default(),
            conversions: FxHashMap::default(),
            functions: Vec::new(),
            body: None,
        }
    }

    /// Run every pass. Errors are collected in the output rather than
    /// stopping at the first one.
    pub fn analyze(mut self) -> AnalysisOutput {
        // Pass 1: scopes and declarations
        let program = self.program;
        self.collect(&program.declarations, ScopeId::ROOT);

        // Pass 2: shapes, constraints, signatures
        self.resolve_type_shapes();
        self.resolve_constraints();
        self.resolve_signatures();
        self.defer_checks = false;
        self.run_pending_checks();
        self.check_recursive_types();

        // Pass 3: bodies
        self.check_bodies();

        tracing::debug!(
            decls = self.entities.len(),
            types = self.arena.len(),
            errors = self.errors.len(),
            "analysis complete"
        );

        AnalysisOutput {
            arena: self.arena,
            entities: self.entities,
            scopes: self.scopes,
            interner: self.interner.clone(),
            expr_types: self.expr_types,
            call_sites: self.call_sites,
            conversions: self.conversions,
            functions: self.functions,
            errors: self.errors,
        }
    }

    fn cx(&mut self) -> TypeCx<'_> {
        TypeCx::new(&mut self.arena, &self.entities, &self.scopes, self.interner)
    }

    fn display(&self, ty: TypeId) -> String {
        let names = NameView {
            entities: &self.entities,
            scopes: &self.scopes,
            interner: self.interner,
        };
        self.arena.display(ty, &names)
    }

    fn name(&self, sym: Symbol) -> String {
        self.interner.resolve(sym).to_string()
    }

    fn decl_name(&self, decl: DeclId) -> String {
        self.name(self.entities.get(decl).name)
    }

    fn add_error(&mut self, error: SemanticError, span: Span) {
        tracing::trace!(%error, line = span.line, "semantic error");
        self.errors.push(TypeError::new(error, span));
    }

    /// Scope references resolve from: the body being checked, else root.
    fn current_scope(&self) -> ScopeId {
        self.body.as_ref().map_or(ScopeId::ROOT, |b| b.scope)
    }

    fn record_op(&mut self, op: TypeOp) {
        if let Some(body) = self.body.as_mut() {
            body.ops.push(op);
        }
    }

    fn check_or_defer(&mut self, decl: DeclId, args: TypeIdVec, span: Span) {
        if self.defer_checks {
            self.pending_checks.push(PendingCheck { decl, args, span });
            return;
        }
        if let Err(error) = self.cx().check_instantiation(decl, &args, span) {
            self.add_error(error, span);
        }
    }

    fn run_pending_checks(&mut self) {
        for check in std::mem::take(&mut self.pending_checks) {
            if let Err(error) = self.cx().check_instantiation(check.decl, &check.args, check.span) {
                self.add_error(error, check.span);
            }
        }
    }
}
