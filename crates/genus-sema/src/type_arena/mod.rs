// type_arena/mod.rs
//
// Interned compile-time types: TypeId handles with O(1) equality.
//
// - TypeId: u32 handle (Copy, trivial Eq/Hash)
// - TypeArena: per-unit storage with automatic deduplication
// - SemaType: canonical representation using TypeId children

mod arena;
mod display;
pub mod sema_type;
mod substitution;
#[cfg(test)]
mod tests;
pub mod type_id;

pub use arena::TypeArena;
pub use display::TypeNames;
pub use sema_type::*;
pub use substitution::{Substitution, substitution_for};
pub use type_id::*;
