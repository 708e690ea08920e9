// type_arena/tests.rs

use genus_identity::{ChanDir, DeclId, Interner, PrimitiveType, Symbol, TypeParamId};
use rustc_hash::FxHashMap;
use smallvec::smallvec;

use super::*;

struct Names {
    interner: Interner,
}

impl TypeNames for Names {
    fn symbol(&self, sym: Symbol) -> &str {
        self.interner.resolve(sym)
    }

    fn decl_name(&self, decl: DeclId) -> &str {
        match decl.index() {
            0 => "List",
            _ => "Pair",
        }
    }

    fn param_name(&self, param: TypeParamId) -> &str {
        match param.index() {
            0 => "T",
            _ => "U",
        }
    }
}

fn t_param(arena: &mut TypeArena) -> TypeId {
    arena.type_param(TypeParamId::new(0))
}

#[test]
fn primitives_have_reserved_ids() {
    let arena = TypeArena::new();
    assert_eq!(arena.get(TypeId::INT), &SemaType::Primitive(PrimitiveType::Int));
    assert_eq!(arena.get(TypeId::STRING), &SemaType::Primitive(PrimitiveType::String));
    assert_eq!(TypeId::primitive(PrimitiveType::Float32), TypeId::FLOAT32);
    assert_eq!(arena.len() as u32, TypeId::FIRST_DYNAMIC);
}

#[test]
fn structural_types_are_interned() {
    let mut arena = TypeArena::new();
    let a = arena.slice(TypeId::INT);
    let b = arena.slice(TypeId::INT);
    let c = arena.slice(TypeId::STRING);
    assert_eq!(a, b);
    assert_ne!(a, c);

    let f1 = arena.function(smallvec![a, TypeId::BOOL], smallvec![TypeId::INT]);
    let f2 = arena.function(smallvec![b, TypeId::BOOL], smallvec![TypeId::INT]);
    assert_eq!(f1, f2);
}

#[test]
fn invalid_children_propagate() {
    let mut arena = TypeArena::new();
    assert!(arena.pointer(TypeId::INVALID).is_invalid());
    assert!(arena.map(TypeId::INT, TypeId::INVALID).is_invalid());
    assert!(
        arena
            .named(DeclId::new(0), smallvec![TypeId::INVALID])
            .is_invalid()
    );
}

#[test]
fn parametric_detection_and_collection() {
    let mut arena = TypeArena::new();
    let t = t_param(&mut arena);
    let u = arena.type_param(TypeParamId::new(1));
    let map = arena.map(u, t);
    let list = arena.named(DeclId::new(0), smallvec![map]);
    let concrete = arena.named(DeclId::new(0), smallvec![TypeId::INT]);

    assert!(arena.is_parametric(list));
    assert!(!arena.is_parametric(concrete));
    assert_eq!(
        arena.collect_type_params(list),
        vec![TypeParamId::new(1), TypeParamId::new(0)]
    );
    assert!(arena.mentions_any(list, &[TypeParamId::new(0)]));
    assert!(!arena.mentions_any(concrete, &[TypeParamId::new(0)]));
}

#[test]
fn substitution_rebuilds_through_interning() {
    let mut arena = TypeArena::new();
    let t = t_param(&mut arena);
    let ptr_t = arena.pointer(t);
    let chan = arena.chan(ptr_t, ChanDir::Send);
    let func = arena.function(smallvec![chan], smallvec![t]);

    let mut subs = FxHashMap::default();
    subs.insert(TypeParamId::new(0), TypeId::FLOAT64);
    let substituted = arena.substitute(func, &subs);

    let ptr_f = arena.pointer(TypeId::FLOAT64);
    let chan_f = arena.chan(ptr_f, ChanDir::Send);
    let expected = arena.function(smallvec![chan_f], smallvec![TypeId::FLOAT64]);
    assert_eq!(substituted, expected);
    assert!(!arena.is_parametric(substituted));
}

#[test]
fn substitution_leaves_unbound_params() {
    let mut arena = TypeArena::new();
    let t = t_param(&mut arena);
    let u = arena.type_param(TypeParamId::new(1));
    let pair = arena.named(DeclId::new(1), smallvec![t, u]);

    let subs = substitution_for(&[TypeParamId::new(0)], &[TypeId::BOOL]);
    let partial = arena.substitute(pair, &subs);
    let expected = arena.named(DeclId::new(1), smallvec![TypeId::BOOL, u]);
    assert_eq!(partial, expected);
}

#[test]
fn interface_methods_are_canonicalised() {
    let mut interner = Interner::new();
    let len = interner.intern("Len");
    let cap = interner.intern("Cap");
    let mut arena = TypeArena::new();
    let sig = arena.function(smallvec![], smallvec![TypeId::INT]);

    let a = arena.interface(smallvec![
        MethodType { name: len, signature: sig },
        MethodType { name: cap, signature: sig },
    ]);
    let b = arena.interface(smallvec![
        MethodType { name: cap, signature: sig },
        MethodType { name: len, signature: sig },
    ]);
    assert_eq!(a, b);
}

#[test]
fn display_embeds_argument_names() {
    let mut interner = Interner::new();
    let value = interner.intern("value");
    let names = Names { interner };
    let mut arena = TypeArena::new();

    let list_int = arena.named(DeclId::new(0), smallvec![TypeId::INT]);
    assert_eq!(arena.display(list_int, &names), "List[int]");

    let t = t_param(&mut arena);
    let slice_t = arena.slice(t);
    let pair = arena.named(DeclId::new(1), smallvec![slice_t, TypeId::STRING]);
    assert_eq!(arena.display(pair, &names), "Pair[[]T, string]");

    let s = arena.struct_type(smallvec![FieldType { name: value, ty: t }]);
    assert_eq!(arena.display(s, &names), "struct{value T}");

    let f = arena.function(smallvec![TypeId::INT], smallvec![TypeId::BOOL, TypeId::STRING]);
    assert_eq!(arena.display(f, &names), "func(int) (bool, string)");
}
