// primitive_type.rs
//
// Predeclared concrete types and channel direction.

/// Predeclared basic types. Every other type is composed from these,
/// declared names, and type parameters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum PrimitiveType {
    Bool,
    Int,
    Int8,
    Int16,
    Int32,
    Int64,
    Uint,
    Uint8,
    Uint16,
    Uint32,
    Uint64,
    Uintptr,
    Float32,
    Float64,
    Complex64,
    Complex128,
    String,
}

impl PrimitiveType {
    pub const ALL: [PrimitiveType; 17] = [
        PrimitiveType::Bool,
        PrimitiveType::Int,
        PrimitiveType::Int8,
        PrimitiveType::Int16,
        PrimitiveType::Int32,
        PrimitiveType::Int64,
        PrimitiveType::Uint,
        PrimitiveType::Uint8,
        PrimitiveType::Uint16,
        PrimitiveType::Uint32,
        PrimitiveType::Uint64,
        PrimitiveType::Uintptr,
        PrimitiveType::Float32,
        PrimitiveType::Float64,
        PrimitiveType::Complex64,
        PrimitiveType::Complex128,
        PrimitiveType::String,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            PrimitiveType::Bool => "bool",
            PrimitiveType::Int => "int",
            PrimitiveType::Int8 => "int8",
            PrimitiveType::Int16 => "int16",
            PrimitiveType::Int32 => "int32",
            PrimitiveType::Int64 => "int64",
            PrimitiveType::Uint => "uint",
            PrimitiveType::Uint8 => "uint8",
            PrimitiveType::Uint16 => "uint16",
            PrimitiveType::Uint32 => "uint32",
            PrimitiveType::Uint64 => "uint64",
            PrimitiveType::Uintptr => "uintptr",
            PrimitiveType::Float32 => "float32",
            PrimitiveType::Float64 => "float64",
            PrimitiveType::Complex64 => "complex64",
            PrimitiveType::Complex128 => "complex128",
            PrimitiveType::String => "string",
        }
    }

    pub fn from_name(name: &str) -> Option<PrimitiveType> {
        // Aliases resolve to their target.
        match name {
            "byte" => return Some(PrimitiveType::Uint8),
            "rune" => return Some(PrimitiveType::Int32),
            _ => {}
        }
        Self::ALL.iter().copied().find(|p| p.as_str() == name)
    }

    /// Size and alignment in bytes on a 64-bit target.
    pub fn size_align(self) -> (u64, u64) {
        match self {
            PrimitiveType::Bool | PrimitiveType::Int8 | PrimitiveType::Uint8 => (1, 1),
            PrimitiveType::Int16 | PrimitiveType::Uint16 => (2, 2),
            PrimitiveType::Int32 | PrimitiveType::Uint32 | PrimitiveType::Float32 => (4, 4),
            PrimitiveType::Int
            | PrimitiveType::Int64
            | PrimitiveType::Uint
            | PrimitiveType::Uint64
            | PrimitiveType::Uintptr
            | PrimitiveType::Float64 => (8, 8),
            PrimitiveType::Complex64 => (8, 4),
            PrimitiveType::Complex128 => (16, 8),
            PrimitiveType::String => (16, 8),
        }
    }

    pub fn is_signed(self) -> bool {
        matches!(
            self,
            PrimitiveType::Int
                | PrimitiveType::Int8
                | PrimitiveType::Int16
                | PrimitiveType::Int32
                | PrimitiveType::Int64
        )
    }

    pub fn is_unsigned(self) -> bool {
        matches!(
            self,
            PrimitiveType::Uint
                | PrimitiveType::Uint8
                | PrimitiveType::Uint16
                | PrimitiveType::Uint32
                | PrimitiveType::Uint64
                | PrimitiveType::Uintptr
        )
    }

    pub fn is_integer(self) -> bool {
        self.is_signed() || self.is_unsigned()
    }

    pub fn is_float(self) -> bool {
        matches!(self, PrimitiveType::Float32 | PrimitiveType::Float64)
    }

    pub fn is_complex(self) -> bool {
        matches!(self, PrimitiveType::Complex64 | PrimitiveType::Complex128)
    }

    pub fn is_numeric(self) -> bool {
        self.is_integer() || self.is_float() || self.is_complex()
    }

    /// Inclusive value range of an integer type.
    pub fn integer_range(self) -> Option<(i128, i128)> {
        let (size, _) = self.size_align();
        let bits = size * 8;
        if self.is_signed() {
            Some((-(1i128 << (bits - 1)), (1i128 << (bits - 1)) - 1))
        } else if self.is_unsigned() {
            Some((0, (1i128 << bits) - 1))
        } else {
            None
        }
    }
}

/// Direction of a channel type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum ChanDir {
    #[default]
    Both,
    Send,
    Recv,
}

impl ChanDir {
    /// Type-name prefix, e.g. `<-chan `.
    pub fn prefix(self) -> &'static str {
        match self {
            ChanDir::Both => "chan ",
            ChanDir::Send => "chan<- ",
            ChanDir::Recv => "<-chan ",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn names_round_trip_through_from_name() {
        for prim in PrimitiveType::ALL {
            assert_eq!(PrimitiveType::from_name(prim.as_str()), Some(prim));
        }
        assert_eq!(PrimitiveType::from_name("byte"), Some(PrimitiveType::Uint8));
        assert_eq!(PrimitiveType::from_name("List"), None);
    }

    #[test]
    fn integer_ranges() {
        assert_eq!(PrimitiveType::Int8.integer_range(), Some((-128, 127)));
        assert_eq!(PrimitiveType::Uint16.integer_range(), Some((0, 65535)));
        assert_eq!(PrimitiveType::Float32.integer_range(), None);
    }
}
