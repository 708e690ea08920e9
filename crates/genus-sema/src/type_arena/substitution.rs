// type_arena/substitution.rs
//
// Type parameter substitution for instantiation.

use genus_identity::TypeParamId;
use rustc_hash::FxHashMap;
use smallvec::SmallVec;

use super::arena::TypeArena;
use super::sema_type::{FieldType, MethodType, SemaType};
use super::type_id::{TypeId, TypeIdVec};

/// Parameter bindings for one instantiation.
pub type Substitution = FxHashMap<TypeParamId, TypeId>;

impl TypeArena {
    /// Replace type parameters according to `subs`. Memoised through
    /// interning: the same input always yields the same TypeId.
    pub fn substitute(&mut self, ty: TypeId, subs: &Substitution) -> TypeId {
        if subs.is_empty() || !self.is_parametric(ty) {
            return ty;
        }

        match self.get(ty).clone() {
            SemaType::TypeParam(param) => subs.get(&param).copied().unwrap_or(ty),

            SemaType::Pointer(elem) => {
                let elem = self.substitute(elem, subs);
                self.pointer(elem)
            }
            SemaType::Slice(elem) => {
                let elem = self.substitute(elem, subs);
                self.slice(elem)
            }
            SemaType::Array { elem, len } => {
                let elem = self.substitute(elem, subs);
                self.array(elem, len)
            }
            SemaType::Map { key, value } => {
                let key = self.substitute(key, subs);
                let value = self.substitute(value, subs);
                self.map(key, value)
            }
            SemaType::Chan { elem, dir } => {
                let elem = self.substitute(elem, subs);
                self.chan(elem, dir)
            }
            SemaType::Tuple(elems) => {
                let elems = self.substitute_all(&elems, subs);
                self.tuple(elems)
            }
            SemaType::Function { params, results } => {
                let params = self.substitute_all(&params, subs);
                let results = self.substitute_all(&results, subs);
                self.function(params, results)
            }
            SemaType::Struct(fields) => {
                let fields: SmallVec<[FieldType; 4]> = fields
                    .iter()
                    .map(|f| FieldType {
                        name: f.name,
                        ty: self.substitute(f.ty, subs),
                    })
                    .collect();
                self.struct_type(fields)
            }
            SemaType::Interface(methods) => {
                let methods: SmallVec<[MethodType; 2]> = methods
                    .iter()
                    .map(|m| MethodType {
                        name: m.name,
                        signature: self.substitute(m.signature, subs),
                    })
                    .collect();
                self.interface(methods)
            }
            SemaType::Named { decl, type_args } => {
                let type_args = self.substitute_all(&type_args, subs);
                self.named(decl, type_args)
            }

            SemaType::Invalid | SemaType::Void | SemaType::Primitive(_) => ty,
        }
    }

    pub fn substitute_all(&mut self, types: &[TypeId], subs: &Substitution) -> TypeIdVec {
        types.iter().map(|&t| self.substitute(t, subs)).collect()
    }
}

/// Bindings pairing `params` with `args` positionally.
pub fn substitution_for(params: &[TypeParamId], args: &[TypeId]) -> Substitution {
    params.iter().copied().zip(args.iter().copied()).collect()
}
