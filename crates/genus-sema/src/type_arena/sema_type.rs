// type_arena/sema_type.rs
//
// SemaType: the canonical interned type representation.

use genus_identity::{ChanDir, DeclId, PrimitiveType, Symbol, TypeParamId};
use smallvec::SmallVec;

use super::type_id::{TypeId, TypeIdVec};

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct FieldType {
    pub name: Symbol,
    pub ty: TypeId,
}

/// Interface method; `signature` is a `Function` type without receiver.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct MethodType {
    pub name: Symbol,
    pub signature: TypeId,
}

#[derive(Clone, PartialEq, Eq, Hash, Debug)]
pub enum SemaType {
    /// Error recovery; never produces further diagnostics.
    Invalid,
    /// Result of a call without results.
    Void,

    Primitive(PrimitiveType),

    Pointer(TypeId),
    Slice(TypeId),
    Array { elem: TypeId, len: u64 },
    Map { key: TypeId, value: TypeId },
    Chan { elem: TypeId, dir: ChanDir },
    /// Multiple results of a call.
    Tuple(TypeIdVec),
    Function { params: TypeIdVec, results: TypeIdVec },
    Struct(SmallVec<[FieldType; 4]>),
    /// Methods sorted by name symbol.
    Interface(SmallVec<[MethodType; 2]>),

    /// A declared type, instantiated with `type_args` (outer scope arguments
    /// first). Non-parametric declarations have no arguments.
    Named { decl: DeclId, type_args: TypeIdVec },

    TypeParam(TypeParamId),
}
