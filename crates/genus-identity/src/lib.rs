// genus-identity/src/lib.rs
//
// Identity primitives shared by every genus crate: interned symbols,
// source spans, entity ids and the primitive type set.

mod entities;
mod intern;
mod primitive_type;
mod span;
mod symbol;

pub use entities::{DeclId, ScopeId, TypeParamId};
pub use intern::Interner;
pub use primitive_type::{ChanDir, PrimitiveType};
pub use span::Span;
pub use symbol::Symbol;

/// Identity of a compilation unit. Declarations from different units share
/// one descriptor registry but never share specialized bodies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct ModuleId(u32);

impl ModuleId {
    pub fn new(index: u32) -> Self {
        Self(index)
    }

    pub fn index(self) -> u32 {
        self.0
    }
}
