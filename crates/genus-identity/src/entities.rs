//! Typed identifiers for the entities the checker tracks.
//!
//! Each id is an index into the table owned by whichever component created
//! it; mixing them up is a type error rather than a silent lookup bug.

macro_rules! define_entity_id {
    ($(#[$meta:meta])* $vis:vis struct $name:ident;) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
        $vis struct $name(u32);

        impl $name {
            pub fn new(index: u32) -> Self {
                Self(index)
            }

            pub fn index(self) -> u32 {
                self.0
            }
        }
    };
}

define_entity_id! {
    /// A named type, function or method declaration.
    pub struct DeclId;
}

define_entity_id! {
    /// A parameter-introduction site. The root (non-parametric) scope is
    /// `ScopeId::ROOT`.
    pub struct ScopeId;
}

define_entity_id! {
    /// A single type parameter, owned by exactly one scope.
    pub struct TypeParamId;
}

impl ScopeId {
    pub const ROOT: ScopeId = ScopeId(0);

    pub fn is_root(self) -> bool {
        self == Self::ROOT
    }
}
