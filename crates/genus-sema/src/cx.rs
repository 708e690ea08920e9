// cx.rs
//
// TypeCx: the view of checker state needed to answer type questions
// (underlying types, method sets, constraint satisfaction, display).

use genus_identity::{DeclId, Interner, Span, Symbol, TypeParamId};
use smallvec::SmallVec;

use crate::entity_registry::{DeclKind, EntityRegistry};
use crate::errors::SemanticError;
use crate::generic::ScopeTree;
use crate::type_arena::{MethodType, SemaType, Substitution, TypeArena, TypeId, TypeNames, substitution_for};

/// Named types may be declared in terms of other named types; chains longer
/// than this are cyclic and resolve to `INVALID`.
const MAX_UNDERLYING_DEPTH: usize = 64;

pub struct NameView<'a> {
    pub entities: &'a EntityRegistry,
    pub scopes: &'a ScopeTree,
    pub interner: &'a Interner,
}

impl TypeNames for NameView<'_> {
    fn symbol(&self, sym: Symbol) -> &str {
        self.interner.resolve(sym)
    }

    fn decl_name(&self, decl: DeclId) -> &str {
        self.interner.resolve(self.entities.get(decl).name)
    }

    fn param_name(&self, param: TypeParamId) -> &str {
        self.interner.resolve(self.scopes.param(param).name)
    }
}

pub struct TypeCx<'a> {
    pub arena: &'a mut TypeArena,
    pub entities: &'a EntityRegistry,
    pub scopes: &'a ScopeTree,
    pub interner: &'a Interner,
}

impl<'a> TypeCx<'a> {
    pub fn new(
        arena: &'a mut TypeArena,
        entities: &'a EntityRegistry,
        scopes: &'a ScopeTree,
        interner: &'a Interner,
    ) -> Self {
        Self {
            arena,
            entities,
            scopes,
            interner,
        }
    }

    pub fn names(&self) -> NameView<'_> {
        NameView {
            entities: self.entities,
            scopes: self.scopes,
            interner: self.interner,
        }
    }

    pub fn display(&self, ty: TypeId) -> String {
        self.arena.display(ty, &self.names())
    }

    pub fn symbol(&self, sym: Symbol) -> &str {
        self.interner.resolve(sym)
    }

    /// Every parameter a declaration is instantiated with, outermost first.
    pub fn decl_params(&self, decl: DeclId) -> Vec<TypeParamId> {
        self.scopes.all_params(self.entities.get(decl).scope)
    }

    pub fn decl_subs(&self, decl: DeclId, args: &[TypeId]) -> Substitution {
        substitution_for(&self.decl_params(decl), args)
    }

    /// The declaration's shape with `args` substituted for its parameters.
    pub fn instantiate_shape(&mut self, decl: DeclId, args: &[TypeId]) -> TypeId {
        let subs = self.decl_subs(decl, args);
        let shape = self.entities.get(decl).shape;
        self.arena.substitute(shape, &subs)
    }

    /// Strip named types down to their structural definition. Type
    /// parameters and unnamed types are returned unchanged.
    pub fn underlying(&mut self, ty: TypeId) -> TypeId {
        let mut current = ty;
        for _ in 0..MAX_UNDERLYING_DEPTH {
            let Some((decl, args)) = self.arena.unwrap_named(current) else {
                return current;
            };
            let args: SmallVec<[TypeId; 4]> = args.clone();
            current = self.instantiate_shape(decl, &args);
        }
        TypeId::INVALID
    }

    pub fn is_interface(&mut self, ty: TypeId) -> bool {
        let u = self.underlying(ty);
        matches!(self.arena.get(u), SemaType::Interface(_))
    }

    /// Kinds that accept `nil`.
    pub fn is_nilable(&mut self, ty: TypeId) -> bool {
        let u = self.underlying(ty);
        matches!(
            self.arena.get(u),
            SemaType::Pointer(_)
                | SemaType::Slice(_)
                | SemaType::Map { .. }
                | SemaType::Chan { .. }
                | SemaType::Function { .. }
                | SemaType::Interface(_)
        )
    }

    /// Methods callable on a value of `ty`, sorted by name.
    pub fn method_set(&mut self, ty: TypeId) -> SmallVec<[MethodType; 2]> {
        match self.arena.get(ty).clone() {
            SemaType::Interface(methods) => methods,
            SemaType::TypeParam(p) => match self.scopes.param(p).constraint {
                Some(constraint) => self.method_set(constraint),
                None => SmallVec::new(),
            },
            SemaType::Named { decl, type_args } => {
                let underlying = self.underlying(ty);
                if let SemaType::Interface(methods) = self.arena.get(underlying) {
                    return methods.clone();
                }
                self.declared_methods(decl, &type_args)
            }
            SemaType::Pointer(elem) => match self.arena.get(elem).clone() {
                SemaType::Named { decl, type_args } if !self.is_interface(elem) => {
                    self.declared_methods(decl, &type_args)
                }
                _ => SmallVec::new(),
            },
            _ => SmallVec::new(),
        }
    }

    fn declared_methods(&mut self, decl: DeclId, args: &[TypeId]) -> SmallVec<[MethodType; 2]> {
        let subs = self.decl_subs(decl, args);
        let mut methods: SmallVec<[MethodType; 2]> = self
            .entities
            .get(decl)
            .methods
            .iter()
            .map(|&m| {
                let info = self.entities.get(m);
                (info.name, info.shape)
            })
            .collect::<Vec<_>>()
            .into_iter()
            .map(|(name, shape)| MethodType {
                name,
                signature: self.arena.substitute(shape, &subs),
            })
            .collect();
        methods.sort_by_key(|m| m.name);
        methods
    }

    /// Signature of method `name` on `ty`, if any.
    pub fn lookup_method(&mut self, ty: TypeId, name: Symbol) -> Option<TypeId> {
        self.method_set(ty)
            .into_iter()
            .find(|m| m.name == name)
            .map(|m| m.signature)
    }

    /// First method of interface `iface` that `ty` lacks or declares with a
    /// different signature.
    pub fn missing_method(&mut self, ty: TypeId, iface: TypeId) -> Option<Symbol> {
        let required = self.method_set(iface);
        let offered = self.method_set(ty);
        required
            .iter()
            .find(|req| {
                !offered
                    .iter()
                    .any(|m| m.name == req.name && m.signature == req.signature)
            })
            .map(|req| req.name)
    }

    pub fn satisfies(&mut self, ty: TypeId, iface: TypeId) -> bool {
        self.missing_method(ty, iface).is_none()
    }

    /// Check every argument of an instantiation of `decl` against its
    /// parameter's constraint. Constraints may mention the parameters, so
    /// they are substituted with the same arguments first.
    pub fn check_instantiation(
        &mut self,
        decl: DeclId,
        args: &[TypeId],
        span: Span,
    ) -> Result<(), SemanticError> {
        let params = self.decl_params(decl);
        let subs = substitution_for(&params, args);
        for (&param, &arg) in params.iter().zip(args) {
            if arg.is_invalid() {
                continue;
            }
            let Some(constraint) = self.scopes.param(param).constraint else {
                continue;
            };
            let constraint = self.arena.substitute(constraint, &subs);
            if let Some(missing) = self.missing_method(arg, constraint) {
                return Err(SemanticError::ConstraintUnsatisfied {
                    param: self.symbol(self.scopes.param(param).name).to_string(),
                    constraint: self.display(constraint),
                    offered: self.display(arg),
                    missing: self.symbol(missing).to_string(),
                    span: span.into(),
                });
            }
        }
        Ok(())
    }

    /// Receiver type of a method declaration: the named type instantiated
    /// with its own scope parameters.
    pub fn receiver_type(&mut self, method: DeclId) -> TypeId {
        let DeclKind::Method { receiver } = self.entities.get(method).kind else {
            return TypeId::INVALID;
        };
        let params = self.decl_params(receiver);
        let args = params.iter().map(|&p| self.arena.type_param(p)).collect();
        self.arena.named(receiver, args)
    }
}
