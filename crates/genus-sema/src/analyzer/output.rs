// Analysis output, builder, and diagnostic types for the analyzer.

use genus_frontend::{NodeId, Program};
use genus_identity::{DeclId, Interner, Span};
use rustc_hash::FxHashMap;

use crate::compatibility::{CoercionSource, ConcreteAssignability, DefaultConcreteRules};
use crate::cx::TypeCx;
use crate::entity_registry::EntityRegistry;
use crate::errors::{ErrorCategory, SemanticError};
use crate::generic::ScopeTree;
use crate::resolve::Instantiation;
use crate::type_arena::{TypeArena, TypeId, TypeIdVec};

use super::Analyzer;

/// A type error wrapping a miette-enabled SemanticError
#[derive(Debug, Clone)]
pub struct TypeError {
    pub error: SemanticError,
    pub span: Span,
}

impl TypeError {
    /// Create a new type error
    pub fn new(error: SemanticError, span: Span) -> Self {
        Self { error, span }
    }

    pub fn category(&self) -> ErrorCategory {
        self.error.category()
    }
}

impl std::fmt::Display for TypeError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:{}: {}", self.span.line, self.span.column, self.error)
    }
}

/// Resolved callee of a call expression or function-value reference.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CallSite {
    pub decl: DeclId,
    /// Outer scope arguments first. May mention the caller's parameters.
    pub type_args: TypeIdVec,
    pub instantiation: Instantiation,
}

/// Conversion inserted around a call without source syntax.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImplicitConversion {
    /// Concrete argument passed for a parameter declared with a parametric
    /// type. Recorded on the argument node.
    Coerce { declared: TypeId, concrete: TypeId },
    /// Parametric result flowing back as a concrete type. Recorded on the
    /// call node, per result index.
    Assert {
        index: usize,
        declared: TypeId,
        concrete: TypeId,
    },
}

/// Operations in a function body whose meaning depends on type arguments,
/// in source order. Types are expressed in the function's own parameters.
#[derive(Debug, Clone, PartialEq)]
pub enum TypeOp {
    Coerce {
        node: NodeId,
        target: TypeId,
        source: CoercionSource,
    },
    Assert {
        node: NodeId,
        target: TypeId,
        source: TypeId,
        two_result: bool,
    },
    /// Candidates flattened in listed order, each tagged with its case index.
    Switch {
        node: NodeId,
        scrutinee: TypeId,
        arms: Vec<(usize, TypeId)>,
    },
    Call {
        node: NodeId,
        callee: DeclId,
        type_args: TypeIdVec,
    },
    /// A function referenced as a value rather than called.
    FuncValue {
        node: NodeId,
        decl: DeclId,
        type_args: TypeIdVec,
    },
}

impl TypeOp {
    pub fn node(&self) -> NodeId {
        match self {
            TypeOp::Coerce { node, .. }
            | TypeOp::Assert { node, .. }
            | TypeOp::Switch { node, .. }
            | TypeOp::Call { node, .. }
            | TypeOp::FuncValue { node, .. } => *node,
        }
    }
}

#[derive(Debug, Clone)]
pub struct FunctionFacts {
    pub decl: DeclId,
    pub ops: Vec<TypeOp>,
}

/// Output from semantic analysis.
#[derive(Debug, Clone)]
pub struct AnalysisOutput {
    pub arena: TypeArena,
    pub entities: EntityRegistry,
    pub scopes: ScopeTree,
    pub interner: Interner,
    pub expr_types: FxHashMap<NodeId, TypeId>,
    pub call_sites: FxHashMap<NodeId, CallSite>,
    pub conversions: FxHashMap<NodeId, Vec<ImplicitConversion>>,
    /// Functions and methods with bodies, in declaration order.
    pub functions: Vec<FunctionFacts>,
    pub errors: Vec<TypeError>,
}

impl AnalysisOutput {
    pub fn cx(&mut self) -> TypeCx<'_> {
        TypeCx::new(&mut self.arena, &self.entities, &self.scopes, &self.interner)
    }

    pub fn display(&self, ty: TypeId) -> String {
        let names = crate::cx::NameView {
            entities: &self.entities,
            scopes: &self.scopes,
            interner: &self.interner,
        };
        self.arena.display(ty, &names)
    }

    pub fn has_errors(&self) -> bool {
        !self.errors.is_empty()
    }

    pub fn lookup(&self, name: &str) -> Option<DeclId> {
        self.interner
            .lookup(name)
            .and_then(|sym| self.entities.lookup(sym))
    }

    pub fn function(&self, decl: DeclId) -> Option<&FunctionFacts> {
        self.functions.iter().find(|f| f.decl == decl)
    }

    pub fn type_of(&self, node: NodeId) -> Option<TypeId> {
        self.expr_types.get(&node).copied()
    }

    pub fn decl_name(&self, decl: DeclId) -> &str {
        self.interner.resolve(self.entities.get(decl).name)
    }
}

/// Builder for creating Analyzer instances.
pub struct AnalyzerBuilder<'p> {
    program: &'p Program,
    interner: &'p Interner,
    rules: Box<dyn ConcreteAssignability>,
}

impl<'p> AnalyzerBuilder<'p> {
    pub fn new(program: &'p Program, interner: &'p Interner) -> Self {
        Self {
            program,
            interner,
            rules: Box::new(DefaultConcreteRules),
        }
    }

    /// Replace the concrete-to-concrete assignability rules.
    pub fn with_rules(mut self, rules: Box<dyn ConcreteAssignability>) -> Self {
        self.rules = rules;
        self
    }

    pub fn build(self) -> Analyzer<'p> {
        Analyzer::new(self.program, self.interner, self.rules)
    }
}
