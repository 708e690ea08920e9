// lib.rs
//
// genus sema: checking of parametric declarations and the code shapes the
// back end emits for them.
pub mod analyzer;
pub mod compatibility;
pub mod cx;
pub mod deduce;
pub mod entity_registry;
pub mod errors;
pub mod generic;
pub mod options;
pub mod reflect;
pub mod resolve;
pub mod specialize;
pub mod type_arena;

pub use analyzer::{
    AnalysisOutput, Analyzer, AnalyzerBuilder, CallSite, FunctionFacts, ImplicitConversion,
    TypeError, TypeOp,
};
pub use compatibility::{
    CoercionSource, Compatibility, ConcreteAssignability, DefaultConcreteRules, check_assign,
};
pub use cx::TypeCx;
pub use deduce::{ArgType, DeductionError, deduce};
pub use entity_registry::{DeclInfo, DeclKind, EntityRegistry};
pub use errors::{ErrorCategory, SemanticError};
pub use generic::{MonomorphCacheBase, MonomorphKey, ParameterScope, ScopeTree, TypeParamInfo};
pub use options::AnalyzerOptions;
pub use reflect::{BridgeError, DescriptorBridge};
pub use resolve::{Instantiation, ReferenceError, ResolvedArgs, resolve_reference};
pub use specialize::{
    CallTarget, CheckInput, CheckOutcome, CompiledBody, CompiledOp, Specialization, Specializer,
    TypeCheck, specialize,
};
pub use type_arena::{SemaType, Substitution, TypeArena, TypeId, TypeIdVec};
