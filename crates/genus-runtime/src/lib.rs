//! genus runtime: type descriptors for parametric values.
//!
//! Descriptors are created lazily, interned in a process-wide registry and
//! never freed. Canonical descriptors compare by identity; descriptors from
//! different registries fall back to a coinductive structural comparison.
//!
//! Values of parametric type carry their descriptor, which is what
//! coercions, type assertions and type switches inspect.

mod assert;
mod descriptor;
mod equality;
mod errors;
mod registry;
mod shape;
mod value;

pub use assert::{
    assert_type, assert_type_checked, coerce, coerce_checked, coerce_literal, coercible, implements,
    type_switch,
};
pub use descriptor::{
    DescId, DescKind, Desc, Field, Layout, MAX_TYPE_SIZE, MethodSig, NamedInfo, TypeDescriptor,
};
pub use equality::equal;
pub use errors::{AssertionFault, RuntimeError};
pub use registry::{Declared, DescriptorRegistry, RegistryStats, global};
pub use shape::{RtDeclId, RtParam, RuntimeDecl, Shape};
pub use value::{Literal, Value, ValueData};
