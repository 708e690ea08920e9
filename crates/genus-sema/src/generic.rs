// generic.rs
//
// Type parameter scopes and the monomorphization cache.
//
// Scopes form a tree rooted at the non-parametric `ScopeId::ROOT`. A
// declaration belongs to exactly one scope and is parameterized by the
// parameters of that scope and every enclosing one, outermost first.

use std::hash::Hash;
use std::sync::atomic::{AtomicU32, Ordering};

use genus_identity::{DeclId, ScopeId, Span, Symbol, TypeParamId};
use rustc_hash::FxHashMap;

use crate::type_arena::{TypeId, TypeIdVec};

// ============================================================================
// Monomorphization cache
// ============================================================================

/// Cache of specialized instances keyed by (declaration, type arguments),
/// with hit/miss statistics.
#[derive(Debug)]
pub struct MonomorphCacheBase<K, V> {
    instances: FxHashMap<K, V>,
    order: Vec<K>,
    hits: AtomicU32,
    misses: AtomicU32,
}

impl<K: Hash + Eq + Clone, V> Default for MonomorphCacheBase<K, V> {
    fn default() -> Self {
        Self::new()
    }
}

impl<K: Hash + Eq + Clone, V> MonomorphCacheBase<K, V> {
    pub fn new() -> Self {
        Self {
            instances: FxHashMap::default(),
            order: Vec::new(),
            hits: AtomicU32::new(0),
            misses: AtomicU32::new(0),
        }
    }

    pub fn get(&self, key: &K) -> Option<&V> {
        let result = self.instances.get(key);
        if result.is_some() {
            self.hits.fetch_add(1, Ordering::Relaxed);
        } else {
            self.misses.fetch_add(1, Ordering::Relaxed);
        }
        result
    }

    pub fn contains(&self, key: &K) -> bool {
        self.instances.contains_key(key)
    }

    pub fn insert(&mut self, key: K, instance: V) {
        if self.instances.insert(key.clone(), instance).is_none() {
            self.order.push(key);
        }
    }

    pub fn len(&self) -> usize {
        self.instances.len()
    }

    pub fn is_empty(&self) -> bool {
        self.instances.is_empty()
    }

    /// Instances in insertion order.
    pub fn instances(&self) -> impl Iterator<Item = (&K, &V)> {
        self.order
            .iter()
            .filter_map(|k| self.instances.get(k).map(|v| (k, v)))
    }

    pub fn hit_count(&self) -> u32 {
        self.hits.load(Ordering::Relaxed)
    }

    pub fn miss_count(&self) -> u32 {
        self.misses.load(Ordering::Relaxed)
    }

    /// Hit rate as a percentage; 0.0 before any lookup.
    pub fn hit_rate(&self) -> f64 {
        let hits = self.hit_count();
        let total = hits + self.miss_count();
        if total == 0 {
            0.0
        } else {
            (hits as f64 / total as f64) * 100.0
        }
    }
}

/// Key of a specialized function body.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct MonomorphKey {
    pub decl: DeclId,
    pub type_args: TypeIdVec,
}

impl MonomorphKey {
    pub fn new(decl: DeclId, type_args: TypeIdVec) -> Self {
        Self { decl, type_args }
    }
}

// ============================================================================
// Type parameter scopes
// ============================================================================

#[derive(Debug, Clone)]
pub struct TypeParamInfo {
    pub id: TypeParamId,
    pub name: Symbol,
    pub scope: ScopeId,
    /// Position within its own scope.
    pub index: usize,
    /// Interface type; resolved after all parameters are declared since it
    /// may mention them.
    pub constraint: Option<TypeId>,
    pub span: Span,
}

#[derive(Debug, Clone)]
pub struct ParameterScope {
    pub id: ScopeId,
    pub parent: Option<ScopeId>,
    pub params: Vec<TypeParamId>,
    pub span: Span,
}

#[derive(Debug, Clone)]
pub struct ScopeTree {
    scopes: Vec<ParameterScope>,
    params: Vec<TypeParamInfo>,
}

impl Default for ScopeTree {
    fn default() -> Self {
        Self::new()
    }
}

impl ScopeTree {
    pub fn new() -> Self {
        Self {
            scopes: vec![ParameterScope {
                id: ScopeId::ROOT,
                parent: None,
                params: Vec::new(),
                span: Span::default(),
            }],
            params: Vec::new(),
        }
    }

    /// Introduce a scope nested in `parent` with the given parameters, in
    /// declaration order. Constraints are attached with `set_constraint`.
    pub fn declare_scope(&mut self, parent: ScopeId, params: &[(Symbol, Span)], span: Span) -> ScopeId {
        let id = ScopeId::new(self.scopes.len() as u32);
        let mut ids = Vec::with_capacity(params.len());
        for (index, &(name, param_span)) in params.iter().enumerate() {
            let param = TypeParamId::new(self.params.len() as u32);
            self.params.push(TypeParamInfo {
                id: param,
                name,
                scope: id,
                index,
                constraint: None,
                span: param_span,
            });
            ids.push(param);
        }
        self.scopes.push(ParameterScope {
            id,
            parent: Some(parent),
            params: ids,
            span,
        });
        tracing::trace!(scope = id.index(), parent = parent.index(), "declared scope");
        id
    }

    pub fn set_constraint(&mut self, param: TypeParamId, constraint: TypeId) {
        if let Some(info) = self.params.get_mut(param.index() as usize) {
            info.constraint = Some(constraint);
        }
    }

    pub fn scope(&self, id: ScopeId) -> &ParameterScope {
        &self.scopes[id.index() as usize]
    }

    pub fn param(&self, id: TypeParamId) -> &TypeParamInfo {
        &self.params[id.index() as usize]
    }

    /// Non-root scopes from the outermost down to `scope`.
    pub fn chain(&self, scope: ScopeId) -> Vec<ScopeId> {
        let mut chain = Vec::new();
        let mut current = Some(scope);
        while let Some(id) = current
            && !id.is_root()
        {
            chain.push(id);
            current = self.scope(id).parent;
        }
        chain.reverse();
        chain
    }

    /// Every parameter in force inside `scope`: outer scopes first, each in
    /// declaration order. This is the implicit argument list of a reference
    /// made from within the scope.
    pub fn all_params(&self, scope: ScopeId) -> Vec<TypeParamId> {
        self.chain(scope)
            .into_iter()
            .flat_map(|s| self.scope(s).params.iter().copied())
            .collect()
    }

    /// Innermost parameter named `name` visible from `scope`.
    pub fn lookup_param(&self, scope: ScopeId, name: Symbol) -> Option<TypeParamId> {
        let mut current = Some(scope);
        while let Some(id) = current {
            let s = self.scope(id);
            if let Some(&p) = s.params.iter().find(|&&p| self.param(p).name == name) {
                return Some(p);
            }
            current = s.parent;
        }
        None
    }

    /// True when `inner` is `outer` or nested inside it.
    pub fn is_within(&self, inner: ScopeId, outer: ScopeId) -> bool {
        let mut current = Some(inner);
        while let Some(id) = current {
            if id == outer {
                return true;
            }
            current = self.scope(id).parent;
        }
        false
    }

    pub fn depth(&self, scope: ScopeId) -> usize {
        self.chain(scope).len()
    }

    /// `[K, V][T]` style rendering of the parameter lists enclosing `scope`.
    pub fn label(&self, scope: ScopeId, symbol: impl Fn(Symbol) -> String) -> String {
        self.chain(scope)
            .into_iter()
            .map(|s| {
                let names: Vec<String> = self
                    .scope(s)
                    .params
                    .iter()
                    .map(|&p| symbol(self.param(p).name))
                    .collect();
                format!("[{}]", names.join(", "))
            })
            .collect()
    }

    pub fn scope_count(&self) -> usize {
        self.scopes.len()
    }
}
