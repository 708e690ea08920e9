// errors.rs
//! Semantic analysis errors (E3xxx).

#![allow(unused_assignments)] // False positives from thiserror derive

use miette::{Diagnostic, SourceSpan};
use thiserror::Error;

/// Broad classes of compile-time failure in the parametric subsystem.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    ScopeResolution,
    ConstraintUnsatisfied,
    DeductionFailure,
    /// A result-only type parameter: deduction is not applicable at all.
    ExplicitInstantiationRequired,
    AssignabilityViolation,
    IllegalOperation,
    Other,
}

#[derive(Error, Debug, Diagnostic, Clone)]
pub enum SemanticError {
    #[error("undefined name '{name}'")]
    #[diagnostic(code(E3001))]
    UndefinedName {
        name: String,
        #[label("not found in scope")]
        span: SourceSpan,
    },

    #[error("'{name}' requires type arguments for {scope}")]
    #[diagnostic(
        code(E3002),
        help("outside its declaring scope, write {name}{scope} with every parameter bound, outermost first")
    )]
    MissingTypeArguments {
        name: String,
        scope: String,
        #[label("missing type arguments")]
        span: SourceSpan,
    },

    #[error("'{name}' expects {expected} type arguments, found {found}")]
    #[diagnostic(code(E3003))]
    WrongTypeArgCount {
        name: String,
        expected: usize,
        found: usize,
        #[label("wrong number of type arguments")]
        span: SourceSpan,
    },

    #[error("'{name}' is already declared")]
    #[diagnostic(code(E3004))]
    DuplicateDeclaration {
        name: String,
        #[label("redeclared here")]
        span: SourceSpan,
        #[label("first declared here")]
        first: SourceSpan,
    },

    #[error("'{name}' is not a type")]
    #[diagnostic(code(E3005))]
    NotAType {
        name: String,
        #[label("expected a type")]
        span: SourceSpan,
    },

    #[error("'{name}' is not a value")]
    #[diagnostic(code(E3006))]
    NotAValue {
        name: String,
        #[label("expected a value")]
        span: SourceSpan,
    },

    #[error("{offered} does not satisfy {constraint} required by type parameter {param}")]
    #[diagnostic(code(E3010), help("{offered} is missing method {missing}"))]
    ConstraintUnsatisfied {
        param: String,
        constraint: String,
        offered: String,
        missing: String,
        #[label("constraint not satisfied")]
        span: SourceSpan,
    },

    #[error("constraint of {param} must be an interface, found {found}")]
    #[diagnostic(code(E3011))]
    InvalidConstraint {
        param: String,
        found: String,
        #[label("not an interface")]
        span: SourceSpan,
    },

    #[error("conflicting types for {param}: {first} and {second}")]
    #[diagnostic(code(E3020), help("supply the type arguments explicitly"))]
    DeductionConflict {
        param: String,
        first: String,
        second: String,
        #[label("deduced differently here")]
        span: SourceSpan,
    },

    #[error("cannot deduce {param} from nil")]
    #[diagnostic(
        code(E3021),
        help("supply the type arguments explicitly or coerce the argument")
    )]
    CannotInferFromNil {
        param: String,
        #[label("nil carries no type")]
        span: SourceSpan,
    },

    #[error("cannot deduce type arguments: {found} does not match {expected}")]
    #[diagnostic(code(E3022))]
    DeductionShapeMismatch {
        expected: String,
        found: String,
        #[label("argument shape differs")]
        span: SourceSpan,
    },

    #[error("cannot deduce {param} for '{name}'")]
    #[diagnostic(code(E3023), help("supply the type arguments explicitly"))]
    CannotInfer {
        name: String,
        param: String,
        #[label("insufficient information")]
        span: SourceSpan,
    },

    #[error("parametric function '{name}' used as a value without type arguments")]
    #[diagnostic(code(E3024), help("instantiate it explicitly: {name}[...]"))]
    UninstantiatedGenericValue {
        name: String,
        #[label("explicit instantiation required")]
        span: SourceSpan,
    },

    #[error("type parameter {param} of '{name}' occurs only in results")]
    #[diagnostic(
        code(E3030),
        help("type arguments cannot be deduced; write {name}[...] explicitly")
    )]
    ResultOnlyTypeParam {
        name: String,
        param: String,
        #[label("explicit type arguments required")]
        span: SourceSpan,
    },

    #[error("cannot use {found} as parametric type {expected} without coercion")]
    #[diagnostic(code(E3040), help("write value[{expected}]"))]
    ImplicitCoercion {
        expected: String,
        found: String,
        #[label("coercion required")]
        span: SourceSpan,
    },

    #[error("cannot use parametric {found} as {expected} without assertion")]
    #[diagnostic(code(E3041), help("write value.({expected})"))]
    ImplicitAssertion {
        expected: String,
        found: String,
        #[label("assertion required")]
        span: SourceSpan,
    },

    #[error("parametric types {found} and {expected} are not identical")]
    #[diagnostic(code(E3042))]
    ParametricMismatch {
        expected: String,
        found: String,
        #[label("no implicit conversion between parametric types")]
        span: SourceSpan,
    },

    #[error("coercion of {found} to {target} can never succeed")]
    #[diagnostic(code(E3043))]
    CoercionNeverSucceeds {
        target: String,
        found: String,
        #[label("no instantiation of {target} matches")]
        span: SourceSpan,
    },

    #[error("coercion of untyped {found} to {target} is ambiguous")]
    #[diagnostic(code(E3044), help("give the literal a concrete type first"))]
    AmbiguousCoercion {
        target: String,
        found: String,
        #[label("several instantiations could accept this literal")]
        span: SourceSpan,
    },

    #[error("coercion target {target} is not parametric")]
    #[diagnostic(code(E3045), help("use an ordinary assignment or conversion"))]
    CoercionTargetNotParametric {
        target: String,
        #[label("expected a type mentioning a type parameter")]
        span: SourceSpan,
    },

    #[error("cannot assert on non-parametric value of type {found}")]
    #[diagnostic(code(E3046))]
    AssertionSourceNotParametric {
        found: String,
        #[label("value type is statically known")]
        span: SourceSpan,
    },

    #[error("illegal operation on parametric value: {operation} on {ty}")]
    #[diagnostic(
        code(E3050),
        help("parametric values support assignment, coercion, assertion and operations provable from their shape or constraint")
    )]
    IllegalParametricOperation {
        operation: String,
        ty: String,
        #[label("not provable for every instantiation")]
        span: SourceSpan,
    },

    #[error("type {ty} has no field or method '{member}'")]
    #[diagnostic(code(E3051))]
    NoSuchMember {
        ty: String,
        member: String,
        #[label("unknown member")]
        span: SourceSpan,
    },

    #[error("expected {expected}, found {found}")]
    #[diagnostic(code(E3060))]
    TypeMismatch {
        expected: String,
        found: String,
        #[label("type mismatch")]
        span: SourceSpan,
    },

    #[error("expected {expected} arguments, found {found}")]
    #[diagnostic(code(E3061))]
    WrongArgumentCount {
        expected: usize,
        found: usize,
        #[label("wrong number of arguments")]
        span: SourceSpan,
    },

    #[error("{ty} is not callable")]
    #[diagnostic(code(E3062))]
    NotCallable {
        ty: String,
        #[label("not a function")]
        span: SourceSpan,
    },

    #[error("expected {expected} values, found {found}")]
    #[diagnostic(code(E3063))]
    WrongResultCount {
        expected: usize,
        found: usize,
        #[label("value count mismatch")]
        span: SourceSpan,
    },

    #[error("operator {op} cannot be applied to {left} and {right}")]
    #[diagnostic(code(E3064))]
    InvalidOperands {
        op: String,
        left: String,
        right: String,
        #[label("invalid operands")]
        span: SourceSpan,
    },

    #[error("invalid recursive type '{name}'")]
    #[diagnostic(code(E3065), help("introduce a pointer, slice or map to break the cycle"))]
    InvalidRecursiveType {
        name: String,
        #[label("contains itself by value")]
        span: SourceSpan,
    },

    #[error("array length {len} is too large")]
    #[diagnostic(code(E3066), help("array lengths may not exceed {max}"))]
    ArrayTooLarge {
        len: u64,
        max: u64,
        #[label("array too large")]
        span: SourceSpan,
    },
}

impl SemanticError {
    pub fn category(&self) -> ErrorCategory {
        use SemanticError::*;
        match self {
            UndefinedName { .. } | MissingTypeArguments { .. } | WrongTypeArgCount { .. } => {
                ErrorCategory::ScopeResolution
            }
            ConstraintUnsatisfied { .. } | InvalidConstraint { .. } => {
                ErrorCategory::ConstraintUnsatisfied
            }
            DeductionConflict { .. }
            | CannotInferFromNil { .. }
            | DeductionShapeMismatch { .. }
            | CannotInfer { .. } => ErrorCategory::DeductionFailure,
            ResultOnlyTypeParam { .. } | UninstantiatedGenericValue { .. } => {
                ErrorCategory::ExplicitInstantiationRequired
            }
            ImplicitCoercion { .. }
            | ImplicitAssertion { .. }
            | ParametricMismatch { .. }
            | CoercionNeverSucceeds { .. }
            | AmbiguousCoercion { .. }
            | CoercionTargetNotParametric { .. }
            | AssertionSourceNotParametric { .. } => ErrorCategory::AssignabilityViolation,
            IllegalParametricOperation { .. } => ErrorCategory::IllegalOperation,
            DuplicateDeclaration { .. }
            | NotAType { .. }
            | NotAValue { .. }
            | NoSuchMember { .. }
            | TypeMismatch { .. }
            | WrongArgumentCount { .. }
            | NotCallable { .. }
            | WrongResultCount { .. }
            | InvalidOperands { .. }
            | InvalidRecursiveType { .. }
            | ArrayTooLarge { .. } => ErrorCategory::Other,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use genus_identity::Span;

    fn span() -> SourceSpan {
        Span::new(4, 9, 1, 5).into()
    }

    #[test]
    fn categories_follow_taxonomy() {
        let missing = SemanticError::MissingTypeArguments {
            name: "Inner".into(),
            scope: "[T][T2]".into(),
            span: span(),
        };
        assert_eq!(missing.category(), ErrorCategory::ScopeResolution);

        let result_only = SemanticError::ResultOnlyTypeParam {
            name: "Zero".into(),
            param: "T".into(),
            span: span(),
        };
        assert_eq!(result_only.category(), ErrorCategory::ExplicitInstantiationRequired);

        let conflict = SemanticError::DeductionConflict {
            param: "T".into(),
            first: "int".into(),
            second: "string".into(),
            span: span(),
        };
        assert_eq!(conflict.category(), ErrorCategory::DeductionFailure);
    }

    #[test]
    fn messages_name_the_types_involved() {
        let err = SemanticError::ConstraintUnsatisfied {
            param: "T".into(),
            constraint: "Stringer".into(),
            offered: "Point".into(),
            missing: "String".into(),
            span: span(),
        };
        assert_eq!(err.to_string(), "Point does not satisfy Stringer required by type parameter T");
        assert_eq!(err.category(), ErrorCategory::ConstraintUnsatisfied);
    }
}
