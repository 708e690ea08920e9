// errors.rs
//
// Load-time and runtime failures of the descriptor subsystem.

use thiserror::Error;

/// Failure while building or instantiating descriptors. Raised when an
/// instantiation is triggered at load time; the checker reports the
/// compile-time equivalents before code is ever loaded.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RuntimeError {
    #[error(
        "cannot instantiate {decl}: {offered} does not satisfy {constraint} \
         (type parameter {param}, {reason})"
    )]
    ConstraintUnsatisfied {
        decl: String,
        param: String,
        constraint: String,
        offered: String,
        reason: String,
    },

    #[error("wrong number of type arguments for {decl}: expected {expected}, found {found}")]
    ArityMismatch {
        decl: String,
        expected: usize,
        found: usize,
    },

    #[error("invalid recursive type {name}: it contains itself by value")]
    InvalidRecursiveType { name: String },

    #[error("type {name} is larger than {max} bytes")]
    TypeTooLarge { name: String, max: u64 },

    #[error("descriptor {name} is still being built")]
    IncompleteDescriptor { name: String },

    #[error("unknown runtime declaration #{index}")]
    UnknownDecl { index: u32 },

    #[error("declaration {name} was reserved but never defined")]
    UndefinedDecl { name: String },

    #[error("declaration {name} is already defined")]
    AlreadyDefined { name: String },

    #[error("type parameter #{index} has no binding")]
    UnboundParameter { index: usize },
}

/// A failed single-result assertion or coercion. Recoverable: the caller
/// decides how to propagate it, exactly like other runtime assertion faults.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AssertionFault {
    #[error("type assertion failed: value of type {actual} is not {target}")]
    Mismatch { actual: String, target: String },

    #[error("type assertion failed: {actual} does not implement {target} (missing method {method})")]
    MissingMethod {
        actual: String,
        target: String,
        method: String,
    },

    #[error("type assertion failed: nil interface value is not {target}")]
    NilInterface { target: String },

    #[error("cannot coerce value of type {actual} to {target}")]
    CoercionMismatch { actual: String, target: String },

    #[error("cannot coerce literal {literal} to {target}")]
    LiteralNotRepresentable { literal: String, target: String },
}
