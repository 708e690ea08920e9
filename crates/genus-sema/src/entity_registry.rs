// entity_registry.rs
//
// Declarations known to the checker: named types, functions and methods.

use genus_identity::{DeclId, ScopeId, Span, Symbol};
use rustc_hash::FxHashMap;

use crate::type_arena::TypeId;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeclKind {
    Type,
    Function,
    Method { receiver: DeclId },
}

#[derive(Debug, Clone)]
pub struct DeclInfo {
    pub id: DeclId,
    pub name: Symbol,
    pub kind: DeclKind,
    /// Scope whose parameters (and every enclosing scope's) parameterize
    /// this declaration.
    pub scope: ScopeId,
    /// Underlying type for type declarations, `Function` type otherwise.
    /// `INVALID` until signatures are resolved.
    pub shape: TypeId,
    /// Method declarations, for type declarations only.
    pub methods: Vec<DeclId>,
    /// Whether the body source is available to this unit.
    pub has_body: bool,
    pub span: Span,
}

impl DeclInfo {
    pub fn is_type(&self) -> bool {
        self.kind == DeclKind::Type
    }

    pub fn is_callable(&self) -> bool {
        !self.is_type()
    }
}

#[derive(Debug, Clone, Default)]
pub struct EntityRegistry {
    decls: Vec<DeclInfo>,
    by_name: FxHashMap<Symbol, DeclId>,
}

impl EntityRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Declare a top-level type or function. Names share one namespace;
    /// on a clash the earlier declaration is returned as the error.
    pub fn declare(
        &mut self,
        name: Symbol,
        kind: DeclKind,
        scope: ScopeId,
        has_body: bool,
        span: Span,
    ) -> Result<DeclId, DeclId> {
        if let Some(&existing) = self.by_name.get(&name) {
            return Err(existing);
        }
        let id = self.push(name, kind, scope, has_body, span);
        self.by_name.insert(name, id);
        Ok(id)
    }

    /// Declare a method on `receiver`; method names are per receiver.
    pub fn declare_method(
        &mut self,
        receiver: DeclId,
        name: Symbol,
        has_body: bool,
        span: Span,
    ) -> Result<DeclId, DeclId> {
        if let Some(existing) = self.find_method(receiver, name) {
            return Err(existing);
        }
        let scope = self.get(receiver).scope;
        let id = self.push(name, DeclKind::Method { receiver }, scope, has_body, span);
        self.decls[receiver.index() as usize].methods.push(id);
        Ok(id)
    }

    fn push(&mut self, name: Symbol, kind: DeclKind, scope: ScopeId, has_body: bool, span: Span) -> DeclId {
        let id = DeclId::new(self.decls.len() as u32);
        self.decls.push(DeclInfo {
            id,
            name,
            kind,
            scope,
            shape: TypeId::INVALID,
            methods: Vec::new(),
            has_body,
            span,
        });
        id
    }

    pub fn get(&self, id: DeclId) -> &DeclInfo {
        &self.decls[id.index() as usize]
    }

    pub fn set_shape(&mut self, id: DeclId, shape: TypeId) {
        self.decls[id.index() as usize].shape = shape;
    }

    pub fn lookup(&self, name: Symbol) -> Option<DeclId> {
        self.by_name.get(&name).copied()
    }

    pub fn find_method(&self, receiver: DeclId, name: Symbol) -> Option<DeclId> {
        self.get(receiver)
            .methods
            .iter()
            .copied()
            .find(|&m| self.get(m).name == name)
    }

    pub fn iter(&self) -> impl Iterator<Item = &DeclInfo> {
        self.decls.iter()
    }

    pub fn len(&self) -> usize {
        self.decls.len()
    }

    pub fn is_empty(&self) -> bool {
        self.decls.is_empty()
    }
}
