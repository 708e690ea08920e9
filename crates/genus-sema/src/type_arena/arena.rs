// type_arena/arena.rs

use genus_identity::{ChanDir, DeclId, PrimitiveType, TypeParamId};
use rustc_hash::FxHashMap;
use smallvec::SmallVec;

use super::sema_type::{FieldType, MethodType, SemaType};
use super::type_id::{TypeId, TypeIdVec};

/// Storage for interned types. Builders propagate `INVALID`: a composite
/// with an invalid child is itself invalid.
#[derive(Debug, Clone)]
pub struct TypeArena {
    types: Vec<SemaType>,
    intern_map: FxHashMap<SemaType, TypeId>,
}

impl Default for TypeArena {
    fn default() -> Self {
        Self::new()
    }
}

impl TypeArena {
    pub fn new() -> Self {
        let mut arena = Self {
            types: Vec::new(),
            intern_map: FxHashMap::default(),
        };
        arena.intern(SemaType::Invalid);
        arena.intern(SemaType::Void);
        for prim in PrimitiveType::ALL {
            let id = arena.intern(SemaType::Primitive(prim));
            debug_assert_eq!(id, TypeId::primitive(prim));
        }
        debug_assert_eq!(arena.types.len() as u32, TypeId::FIRST_DYNAMIC);
        arena
    }

    fn intern(&mut self, ty: SemaType) -> TypeId {
        let next_id = TypeId::from_raw(self.types.len() as u32);
        *self.intern_map.entry(ty.clone()).or_insert_with(|| {
            self.types.push(ty);
            next_id
        })
    }

    pub fn get(&self, id: TypeId) -> &SemaType {
        &self.types[id.index() as usize]
    }

    pub fn len(&self) -> usize {
        self.types.len()
    }

    pub fn is_empty(&self) -> bool {
        self.types.is_empty()
    }

    // ========================================================================
    // Builders
    // ========================================================================

    pub fn primitive(&self, prim: PrimitiveType) -> TypeId {
        TypeId::primitive(prim)
    }

    pub fn pointer(&mut self, elem: TypeId) -> TypeId {
        if elem.is_invalid() {
            return TypeId::INVALID;
        }
        self.intern(SemaType::Pointer(elem))
    }

    pub fn slice(&mut self, elem: TypeId) -> TypeId {
        if elem.is_invalid() {
            return TypeId::INVALID;
        }
        self.intern(SemaType::Slice(elem))
    }

    pub fn array(&mut self, elem: TypeId, len: u64) -> TypeId {
        if elem.is_invalid() {
            return TypeId::INVALID;
        }
        self.intern(SemaType::Array { elem, len })
    }

    pub fn map(&mut self, key: TypeId, value: TypeId) -> TypeId {
        if key.is_invalid() || value.is_invalid() {
            return TypeId::INVALID;
        }
        self.intern(SemaType::Map { key, value })
    }

    pub fn chan(&mut self, elem: TypeId, dir: ChanDir) -> TypeId {
        if elem.is_invalid() {
            return TypeId::INVALID;
        }
        self.intern(SemaType::Chan { elem, dir })
    }

    /// Result type of a call: void, the single result, or a tuple.
    pub fn results(&mut self, results: &[TypeId]) -> TypeId {
        match results {
            [] => TypeId::VOID,
            [single] => *single,
            many => self.tuple(many.iter().copied().collect()),
        }
    }

    pub fn tuple(&mut self, elems: TypeIdVec) -> TypeId {
        if elems.iter().any(|t| t.is_invalid()) {
            return TypeId::INVALID;
        }
        self.intern(SemaType::Tuple(elems))
    }

    pub fn function(&mut self, params: TypeIdVec, results: TypeIdVec) -> TypeId {
        if params.iter().chain(results.iter()).any(|t| t.is_invalid()) {
            return TypeId::INVALID;
        }
        self.intern(SemaType::Function { params, results })
    }

    pub fn struct_type(&mut self, fields: SmallVec<[FieldType; 4]>) -> TypeId {
        if fields.iter().any(|f| f.ty.is_invalid()) {
            return TypeId::INVALID;
        }
        self.intern(SemaType::Struct(fields))
    }

    pub fn interface(&mut self, mut methods: SmallVec<[MethodType; 2]>) -> TypeId {
        if methods.iter().any(|m| m.signature.is_invalid()) {
            return TypeId::INVALID;
        }
        methods.sort_by_key(|m| m.name);
        methods.dedup_by_key(|m| m.name);
        self.intern(SemaType::Interface(methods))
    }

    pub fn named(&mut self, decl: DeclId, type_args: TypeIdVec) -> TypeId {
        if type_args.iter().any(|t| t.is_invalid()) {
            return TypeId::INVALID;
        }
        self.intern(SemaType::Named { decl, type_args })
    }

    pub fn type_param(&mut self, param: TypeParamId) -> TypeId {
        self.intern(SemaType::TypeParam(param))
    }

    // ========================================================================
    // Queries
    // ========================================================================

    /// True when the type mentions any type parameter.
    pub fn is_parametric(&self, ty: TypeId) -> bool {
        self.any_child(ty, &mut |t| matches!(t, SemaType::TypeParam(_)))
    }

    /// True when the type mentions one of `params`.
    pub fn mentions_any(&self, ty: TypeId, params: &[TypeParamId]) -> bool {
        self.any_child(ty, &mut |t| matches!(t, SemaType::TypeParam(p) if params.contains(p)))
    }

    fn any_child(&self, ty: TypeId, pred: &mut dyn FnMut(&SemaType) -> bool) -> bool {
        let sema = self.get(ty);
        if pred(sema) {
            return true;
        }
        self.children(ty).into_iter().any(|c| self.any_child(c, pred))
    }

    /// Direct child types, in source order.
    pub fn children(&self, ty: TypeId) -> TypeIdVec {
        match self.get(ty) {
            SemaType::Pointer(e) | SemaType::Slice(e) => smallvec::smallvec![*e],
            SemaType::Array { elem, .. } | SemaType::Chan { elem, .. } => smallvec::smallvec![*elem],
            SemaType::Map { key, value } => smallvec::smallvec![*key, *value],
            SemaType::Tuple(elems) => elems.clone(),
            SemaType::Function { params, results } => {
                params.iter().chain(results.iter()).copied().collect()
            }
            SemaType::Struct(fields) => fields.iter().map(|f| f.ty).collect(),
            SemaType::Interface(methods) => methods.iter().map(|m| m.signature).collect(),
            SemaType::Named { type_args, .. } => type_args.clone(),
            SemaType::Invalid
            | SemaType::Void
            | SemaType::Primitive(_)
            | SemaType::TypeParam(_) => TypeIdVec::new(),
        }
    }

    /// Type parameters in first-occurrence order.
    pub fn collect_type_params(&self, ty: TypeId) -> Vec<TypeParamId> {
        let mut out = Vec::new();
        self.collect_into(ty, &mut out);
        out
    }

    fn collect_into(&self, ty: TypeId, out: &mut Vec<TypeParamId>) {
        if let SemaType::TypeParam(p) = self.get(ty) {
            if !out.contains(p) {
                out.push(*p);
            }
            return;
        }
        for child in self.children(ty) {
            self.collect_into(child, out);
        }
    }

    pub fn unwrap_function(&self, ty: TypeId) -> Option<(&TypeIdVec, &TypeIdVec)> {
        match self.get(ty) {
            SemaType::Function { params, results } => Some((params, results)),
            _ => None,
        }
    }

    pub fn unwrap_type_param(&self, ty: TypeId) -> Option<TypeParamId> {
        match self.get(ty) {
            SemaType::TypeParam(p) => Some(*p),
            _ => None,
        }
    }

    pub fn unwrap_named(&self, ty: TypeId) -> Option<(DeclId, &TypeIdVec)> {
        match self.get(ty) {
            SemaType::Named { decl, type_args } => Some((*decl, type_args)),
            _ => None,
        }
    }

    pub fn unwrap_primitive(&self, ty: TypeId) -> Option<PrimitiveType> {
        match self.get(ty) {
            SemaType::Primitive(p) => Some(*p),
            _ => None,
        }
    }

    pub fn tuple_elems(&self, ty: TypeId) -> Option<&TypeIdVec> {
        match self.get(ty) {
            SemaType::Tuple(elems) => Some(elems),
            _ => None,
        }
    }
}
