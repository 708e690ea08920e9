// type_arena/type_id.rs
//
// TypeId: interned type handle with reserved constants for primitives.

use genus_identity::PrimitiveType;
use smallvec::SmallVec;

/// Handle to an interned `SemaType`. Equal handles mean identical types.
#[derive(Copy, Clone, PartialEq, Eq, Hash, Debug, PartialOrd, Ord)]
pub struct TypeId(u32);

impl TypeId {
    // ========================================================================
    // Reserved TypeIds, interned at these indices by TypeArena::new()
    // ========================================================================

    pub const INVALID: TypeId = TypeId(0);
    pub const VOID: TypeId = TypeId(1);

    pub const BOOL: TypeId = TypeId(2);
    pub const INT: TypeId = TypeId(3);
    pub const INT8: TypeId = TypeId(4);
    pub const INT16: TypeId = TypeId(5);
    pub const INT32: TypeId = TypeId(6);
    pub const INT64: TypeId = TypeId(7);
    pub const UINT: TypeId = TypeId(8);
    pub const UINT8: TypeId = TypeId(9);
    pub const UINT16: TypeId = TypeId(10);
    pub const UINT32: TypeId = TypeId(11);
    pub const UINT64: TypeId = TypeId(12);
    pub const UINTPTR: TypeId = TypeId(13);
    pub const FLOAT32: TypeId = TypeId(14);
    pub const FLOAT64: TypeId = TypeId(15);
    pub const COMPLEX64: TypeId = TypeId(16);
    pub const COMPLEX128: TypeId = TypeId(17);
    pub const STRING: TypeId = TypeId(18);

    pub const FIRST_DYNAMIC: u32 = 19;

    /// Reserved id of a primitive; follows `PrimitiveType::ALL` order.
    pub fn primitive(prim: PrimitiveType) -> TypeId {
        let offset = PrimitiveType::ALL
            .iter()
            .position(|p| *p == prim)
            .unwrap_or(0) as u32;
        TypeId(Self::BOOL.0 + offset)
    }

    pub fn index(self) -> u32 {
        self.0
    }

    pub(super) fn from_raw(index: u32) -> Self {
        TypeId(index)
    }

    #[inline]
    pub fn is_invalid(self) -> bool {
        self == Self::INVALID
    }

    #[inline]
    pub fn is_void(self) -> bool {
        self == Self::VOID
    }

    #[inline]
    pub fn is_primitive(self) -> bool {
        self.0 >= Self::BOOL.0 && self.0 <= Self::STRING.0
    }
}

/// Child type lists: parameters, results, type arguments.
pub type TypeIdVec = SmallVec<[TypeId; 4]>;
