// registry.rs
//
// Process-wide interning of type descriptors and lazy instantiation of
// parametric declarations.
//
// Interning is check-then-insert under a write lock: the candidate is built
// before the lock is taken and a thread that loses the race drops its
// candidate and adopts the winner. Named instantiations are interned as
// incomplete shells and completed outside the lock, so nested instantiation
// (a field whose type is another instantiation, or the type itself) never
// runs while the lock is held.
//
// Declarations are identified by their definition key. Defining a
// declaration whose key is already known makes it an alias of the existing
// one, so independently lowered units share one canonical descriptor per
// instantiation.

use std::cell::RefCell;
use std::sync::atomic::{AtomicU32, AtomicU64, Ordering};
use std::sync::{Arc, OnceLock, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use genus_identity::{ChanDir, PrimitiveType};
use rustc_hash::{FxHashMap, FxHashSet};
use smallvec::SmallVec;

use crate::descriptor::{DescId, DescKind, Desc, Field, MethodSig, NamedInfo, TypeDescriptor};
use crate::errors::RuntimeError;
use crate::shape::{RtDeclId, RuntimeDecl, Shape};

type IdVec = SmallVec<[DescId; 4]>;

/// Interning key. Children are referenced by canonical id, so structural
/// identity of unnamed types reduces to key equality. Named types are keyed
/// by (declaration, argument tuple).
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
enum DescKey {
    Basic(PrimitiveType),
    Pointer(DescId),
    Slice(DescId),
    Array(DescId, u64),
    Map(DescId, DescId),
    Chan(DescId, ChanDir),
    Func(IdVec, IdVec),
    Struct(Vec<(String, DescId)>),
    Interface(Vec<(String, DescId)>),
    Named(RtDeclId, IdVec),
}

struct DeclSlot {
    name: String,
    def: OnceLock<RuntimeDecl>,
    key: OnceLock<Arc<str>>,
    /// Set once defined: this slot's own id, or the earlier declaration with
    /// the same key.
    canonical: OnceLock<RtDeclId>,
}

/// Result of [`DescriptorRegistry::declare`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Declared {
    /// Reserved now; the caller must define it.
    New(RtDeclId),
    /// Declared earlier under the same source key.
    Existing(RtDeclId),
}

impl Declared {
    pub fn id(self) -> RtDeclId {
        match self {
            Declared::New(id) | Declared::Existing(id) => id,
        }
    }
}

/// Counters for diagnostics and tests.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct RegistryStats {
    pub descriptors: usize,
    /// Declaration slots, aliases included.
    pub declarations: usize,
    pub hits: u64,
    pub misses: u64,
    /// Candidates built by a thread that lost an interning race.
    pub discarded: u64,
}

#[derive(Default)]
struct CompletionState {
    active: FxHashSet<DescId>,
    finished: Vec<Desc>,
}

thread_local! {
    // Named descriptors this thread is currently completing.
    static COMPLETING: RefCell<CompletionState> = RefCell::new(CompletionState::default());
}

static NEXT_REGISTRY_ID: AtomicU32 = AtomicU32::new(1);
static GLOBAL: OnceLock<DescriptorRegistry> = OnceLock::new();

/// The registry shared by every unit loaded into this process.
pub fn global() -> &'static DescriptorRegistry {
    GLOBAL.get_or_init(DescriptorRegistry::new)
}

pub struct DescriptorRegistry {
    id: u32,
    decls: RwLock<Vec<Arc<DeclSlot>>>,
    /// Definition key to canonical declaration.
    definitions: RwLock<FxHashMap<Arc<str>, RtDeclId>>,
    /// Caller-supplied source key to declaration.
    sources: RwLock<FxHashMap<String, RtDeclId>>,
    interned: RwLock<FxHashMap<DescKey, Desc>>,
    hits: AtomicU64,
    misses: AtomicU64,
    discarded: AtomicU64,
}

impl Default for DescriptorRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for DescriptorRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DescriptorRegistry")
            .field("id", &self.id)
            .field("stats", &self.stats())
            .finish()
    }
}

impl DescriptorRegistry {
    /// An empty registry. Descriptors it creates are still process-lived;
    /// only the interning table is private to it.
    pub fn new() -> Self {
        Self {
            id: NEXT_REGISTRY_ID.fetch_add(1, Ordering::Relaxed),
            decls: RwLock::new(Vec::new()),
            definitions: RwLock::new(FxHashMap::default()),
            sources: RwLock::new(FxHashMap::default()),
            interned: RwLock::new(FxHashMap::default()),
            hits: AtomicU64::new(0),
            misses: AtomicU64::new(0),
            discarded: AtomicU64::new(0),
        }
    }

    pub fn stats(&self) -> RegistryStats {
        RegistryStats {
            descriptors: self.read_interned().len(),
            declarations: self.decls.read().unwrap_or_else(PoisonError::into_inner).len(),
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
            discarded: self.discarded.load(Ordering::Relaxed),
        }
    }

    fn read_interned(&self) -> RwLockReadGuard<'_, FxHashMap<DescKey, Desc>> {
        self.interned.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write_interned(&self) -> RwLockWriteGuard<'_, FxHashMap<DescKey, Desc>> {
        self.interned.write().unwrap_or_else(PoisonError::into_inner)
    }

    fn lookup(&self, key: &DescKey) -> Option<Desc> {
        let found = self.read_interned().get(key).copied();
        if found.is_some() {
            self.hits.fetch_add(1, Ordering::Relaxed);
        }
        found
    }

    fn intern(&self, key: DescKey, build: impl FnOnce() -> (DescKind, String)) -> Desc {
        if let Some(desc) = self.lookup(&key) {
            return desc;
        }
        let (kind, name) = build();
        let candidate = Box::new(TypeDescriptor::new(self.id, kind, name));

        let mut interned = self.write_interned();
        if let Some(&winner) = interned.get(&key) {
            self.discarded.fetch_add(1, Ordering::Relaxed);
            tracing::trace!(name = winner.name(), "lost interning race");
            return winner;
        }
        self.misses.fetch_add(1, Ordering::Relaxed);
        let desc: Desc = Box::leak(candidate);
        interned.insert(key, desc);
        desc
    }

    // ========================================================================
    // Concrete constructors
    // ========================================================================

    pub fn basic(&self, prim: PrimitiveType) -> Desc {
        self.intern(DescKey::Basic(prim), || {
            (DescKind::Basic(prim), prim.as_str().to_string())
        })
    }

    pub fn pointer(&self, elem: Desc) -> Desc {
        self.intern(DescKey::Pointer(elem.id()), || {
            (DescKind::Pointer(elem), format!("*{}", elem.name()))
        })
    }

    pub fn slice(&self, elem: Desc) -> Desc {
        self.intern(DescKey::Slice(elem.id()), || {
            (DescKind::Slice(elem), format!("[]{}", elem.name()))
        })
    }

    pub fn array(&self, elem: Desc, len: u64) -> Desc {
        self.intern(DescKey::Array(elem.id(), len), || {
            (
                DescKind::Array { elem, len },
                format!("[{}]{}", len, elem.name()),
            )
        })
    }

    pub fn map(&self, key: Desc, value: Desc) -> Desc {
        self.intern(DescKey::Map(key.id(), value.id()), || {
            (
                DescKind::Map { key, value },
                format!("map[{}]{}", key.name(), value.name()),
            )
        })
    }

    pub fn chan(&self, elem: Desc, dir: ChanDir) -> Desc {
        self.intern(DescKey::Chan(elem.id(), dir), || {
            (
                DescKind::Chan { elem, dir },
                format!("{}{}", dir.prefix(), elem.name()),
            )
        })
    }

    pub fn func(&self, params: &[Desc], results: &[Desc]) -> Desc {
        let key = DescKey::Func(
            params.iter().map(|d| d.id()).collect(),
            results.iter().map(|d| d.id()).collect(),
        );
        self.intern(key, || {
            let name = format!("func{}", render_signature(params, results));
            (
                DescKind::Func {
                    params: params.to_vec(),
                    results: results.to_vec(),
                },
                name,
            )
        })
    }

    pub fn struct_of(&self, fields: &[(&str, Desc)]) -> Desc {
        let key = DescKey::Struct(
            fields
                .iter()
                .map(|(name, ty)| (name.to_string(), ty.id()))
                .collect(),
        );
        self.intern(key, || {
            let body: Vec<String> = fields
                .iter()
                .map(|(name, ty)| format!("{} {}", name, ty.name()))
                .collect();
            let fields = fields
                .iter()
                .map(|&(name, ty)| Field {
                    name: name.to_string(),
                    ty,
                })
                .collect();
            (DescKind::Struct(fields), format!("struct{{{}}}", body.join("; ")))
        })
    }

    /// Interface with the given methods; each signature must be a `Func`
    /// descriptor. Method order does not matter.
    pub fn interface(&self, methods: &[(&str, Desc)]) -> Desc {
        let mut sorted: Vec<(&str, Desc)> = methods.to_vec();
        sorted.sort_by(|a, b| a.0.cmp(b.0));
        let key = DescKey::Interface(
            sorted
                .iter()
                .map(|(name, sig)| (name.to_string(), sig.id()))
                .collect(),
        );
        self.intern(key, || {
            let body: Vec<String> = sorted
                .iter()
                .map(|(name, sig)| {
                    format!("{}{}", name, sig.name().strip_prefix("func").unwrap_or(""))
                })
                .collect();
            let methods = sorted
                .iter()
                .map(|&(name, signature)| MethodSig {
                    name: name.to_string(),
                    signature,
                })
                .collect();
            (
                DescKind::Interface(methods),
                format!("interface{{{}}}", body.join("; ")),
            )
        })
    }

    /// Descriptor of a concrete type, built bottom-up and memoized.
    pub fn descriptor_of(&self, shape: &Shape) -> Result<Desc, RuntimeError> {
        self.materialize(shape, &[])
    }

    /// Human-readable name for diagnostics and reflection.
    pub fn name_of(&self, desc: Desc) -> String {
        desc.name().to_string()
    }

    // ========================================================================
    // Declarations
    // ========================================================================

    /// Reserve an id for a declaration whose shape may refer to itself.
    pub fn reserve_decl(&self, name: &str) -> RtDeclId {
        let mut decls = self.decls.write().unwrap_or_else(PoisonError::into_inner);
        let id = RtDeclId::new(decls.len() as u32);
        decls.push(Arc::new(DeclSlot {
            name: name.to_string(),
            def: OnceLock::new(),
            key: OnceLock::new(),
            canonical: OnceLock::new(),
        }));
        id
    }

    /// Reserve an id for the source declaration identified by `source_key`,
    /// or return the id it was given before. A front end lowering the same
    /// declaration again (another unit, another compile) gets the same id
    /// and skips defining it.
    ///
    /// Only defined declarations are returned as `Existing`. While another
    /// caller is still lowering the key, or after it gave up, a fresh id is
    /// reserved; defining it makes it an alias if the other one lands first.
    pub fn declare(&self, name: &str, source_key: &str) -> Declared {
        let mut sources = self.sources.write().unwrap_or_else(PoisonError::into_inner);
        if let Some(&id) = sources.get(source_key)
            && self.slot(id).is_ok_and(|slot| slot.canonical.get().is_some())
        {
            return Declared::Existing(id);
        }
        let id = self.reserve_decl(name);
        sources.insert(source_key.to_string(), id);
        Declared::New(id)
    }

    /// Define a reserved declaration and return its canonical id: `id`
    /// itself, or an earlier declaration with the same definition.
    pub fn define_decl(&self, id: RtDeclId, decl: RuntimeDecl) -> Result<RtDeclId, RuntimeError> {
        let slot = self.slot(id)?;
        let key: Arc<str> = decl.key(&|r| self.reference_key(r)).into();

        let mut definitions = self.definitions.write().unwrap_or_else(PoisonError::into_inner);
        if slot.canonical.get().is_some() {
            return Err(RuntimeError::AlreadyDefined {
                name: slot.name.clone(),
            });
        }
        let canonical = match definitions.get(&key) {
            Some(&existing) => {
                tracing::debug!(name = %slot.name, "definition already known; aliasing");
                existing
            }
            None => {
                definitions.insert(key.clone(), id);
                let _ = slot.key.set(key);
                let _ = slot.def.set(decl);
                id
            }
        };
        let _ = slot.canonical.set(canonical);
        Ok(canonical)
    }

    pub fn register_decl(&self, decl: RuntimeDecl) -> Result<RtDeclId, RuntimeError> {
        let id = self.reserve_decl(&decl.name);
        self.define_decl(id, decl)
    }

    pub fn decl_name(&self, id: RtDeclId) -> Option<String> {
        self.slot(id).ok().map(|slot| slot.name.clone())
    }

    /// How a definition key names another declaration: by that
    /// declaration's own key once defined, by name while it is still being
    /// defined (self or mutual reference).
    fn reference_key(&self, id: RtDeclId) -> String {
        match self.resolve(id) {
            Ok((_, slot)) => match slot.key.get() {
                Some(key) => format!("{}{{{}}}", slot.name, key),
                None => slot.name.clone(),
            },
            Err(_) => String::new(),
        }
    }

    /// Canonical id and slot of `id`, following an alias.
    fn resolve(&self, id: RtDeclId) -> Result<(RtDeclId, Arc<DeclSlot>), RuntimeError> {
        let slot = self.slot(id)?;
        match slot.canonical.get() {
            Some(&canonical) if canonical != id => Ok((canonical, self.slot(canonical)?)),
            _ => Ok((id, slot)),
        }
    }

    fn slot(&self, id: RtDeclId) -> Result<Arc<DeclSlot>, RuntimeError> {
        let decls = self.decls.read().unwrap_or_else(PoisonError::into_inner);
        decls
            .get(id.index() as usize)
            .cloned()
            .ok_or(RuntimeError::UnknownDecl { index: id.index() })
    }

    // ========================================================================
    // Instantiation
    // ========================================================================

    /// Canonical descriptor for `decl[args...]`.
    ///
    /// Constraints are checked only when the instantiation is first created;
    /// cached instantiations were valid when they were built.
    pub fn instantiate(&self, decl: RtDeclId, args: &[Desc]) -> Result<Desc, RuntimeError> {
        let (decl, slot) = self.resolve(decl)?;
        let (Some(def), Some(decl_key)) = (slot.def.get(), slot.key.get()) else {
            return Err(RuntimeError::UndefinedDecl {
                name: slot.name.clone(),
            });
        };
        if def.params.len() != args.len() {
            return Err(RuntimeError::ArityMismatch {
                decl: slot.name.clone(),
                expected: def.params.len(),
                found: args.len(),
            });
        }

        let key = DescKey::Named(decl, args.iter().map(|d| d.id()).collect());
        let desc = match self.lookup(&key) {
            Some(desc) => {
                tracing::trace!(name = desc.name(), "instantiation cache hit");
                desc
            }
            None => {
                self.check_constraints(&slot.name, def, args)?;
                let desc = self.intern(key, || {
                    let name = render_named(&slot.name, args);
                    let info =
                        NamedInfo::new(decl, slot.name.clone(), decl_key.clone(), args.to_vec());
                    (DescKind::Named(info), name)
                });
                tracing::debug!(name = desc.name(), "instantiated");
                desc
            }
        };
        self.complete(desc, def, args)?;
        Ok(desc)
    }

    fn check_constraints(
        &self,
        decl_name: &str,
        def: &RuntimeDecl,
        args: &[Desc],
    ) -> Result<(), RuntimeError> {
        for (param, &arg) in def.params.iter().zip(args) {
            let Some(shape) = &param.constraint else {
                continue;
            };
            let constraint = self.materialize(shape, args)?;
            let reason = if constraint.is_interface() {
                arg.missing_method(constraint)
                    .map(|method| format!("missing method {}", method))
            } else if crate::equal(arg, constraint) {
                None
            } else {
                Some("not identical".to_string())
            };
            if let Some(reason) = reason {
                return Err(RuntimeError::ConstraintUnsatisfied {
                    decl: decl_name.to_string(),
                    param: param.name.clone(),
                    constraint: constraint.name().to_string(),
                    offered: arg.name().to_string(),
                    reason,
                });
            }
        }
        Ok(())
    }

    /// Fill in the underlying type and methods of a named shell.
    fn complete(&self, desc: Desc, def: &RuntimeDecl, args: &[Desc]) -> Result<(), RuntimeError> {
        let DescKind::Named(info) = desc.kind() else {
            return Ok(());
        };
        if info.is_complete() {
            // A shell is marked complete before its layout is checked, and
            // a failed layout is not memoized. Outside any completion in
            // progress, re-check so an invalid type is never handed out.
            if COMPLETING.with(|c| c.borrow().active.is_empty()) {
                desc.layout()?;
            }
            return Ok(());
        }
        let entered = COMPLETING.with(|c| c.borrow_mut().active.insert(desc.id()));
        if !entered {
            // Self-reference: the caller up the stack finishes this one.
            return Ok(());
        }

        let result = self.fill_named(info, def, args);

        let finished = COMPLETING.with(|c| {
            let mut state = c.borrow_mut();
            state.active.remove(&desc.id());
            state.finished.push(desc);
            if state.active.is_empty() {
                std::mem::take(&mut state.finished)
            } else {
                Vec::new()
            }
        });
        result?;

        // Layouts are only checkable once the whole cycle is complete.
        for done in finished {
            done.layout()?;
        }
        Ok(())
    }

    fn fill_named(
        &self,
        info: &NamedInfo,
        def: &RuntimeDecl,
        args: &[Desc],
    ) -> Result<(), RuntimeError> {
        let underlying = self.materialize(&def.underlying, args)?;
        let mut methods = Vec::with_capacity(def.methods.len());
        for (name, sig) in &def.methods {
            methods.push(MethodSig {
                name: name.clone(),
                signature: self.materialize(sig, args)?,
            });
        }
        info.complete(underlying, methods);
        Ok(())
    }

    fn materialize_all(&self, shapes: &[Shape], env: &[Desc]) -> Result<Vec<Desc>, RuntimeError> {
        shapes.iter().map(|s| self.materialize(s, env)).collect()
    }

    fn materialize_members<'s>(
        &self,
        members: &'s [(String, Shape)],
        env: &[Desc],
    ) -> Result<Vec<(&'s str, Desc)>, RuntimeError> {
        let mut out = Vec::with_capacity(members.len());
        for (name, shape) in members {
            out.push((name.as_str(), self.materialize(shape, env)?));
        }
        Ok(out)
    }

    /// Build the descriptor for `shape` with `Param(i)` bound to `env[i]`.
    pub fn materialize(&self, shape: &Shape, env: &[Desc]) -> Result<Desc, RuntimeError> {
        Ok(match shape {
            Shape::Param(index) => *env
                .get(*index)
                .ok_or(RuntimeError::UnboundParameter { index: *index })?,
            Shape::Concrete(desc) => *desc,
            Shape::Basic(prim) => self.basic(*prim),
            Shape::Pointer(elem) => self.pointer(self.materialize(elem, env)?),
            Shape::Slice(elem) => self.slice(self.materialize(elem, env)?),
            Shape::Array(elem, len) => self.array(self.materialize(elem, env)?, *len),
            Shape::Map(key, value) => {
                self.map(self.materialize(key, env)?, self.materialize(value, env)?)
            }
            Shape::Chan(elem, dir) => self.chan(self.materialize(elem, env)?, *dir),
            Shape::Func { params, results } => self.func(
                &self.materialize_all(params, env)?,
                &self.materialize_all(results, env)?,
            ),
            Shape::Struct(fields) => self.struct_of(&self.materialize_members(fields, env)?),
            Shape::Interface(methods) => self.interface(&self.materialize_members(methods, env)?),
            Shape::Named { decl, args } => {
                self.instantiate(*decl, &self.materialize_all(args, env)?)?
            }
        })
    }
}

fn render_named(decl: &str, args: &[Desc]) -> String {
    if args.is_empty() {
        return decl.to_string();
    }
    let args: Vec<&str> = args.iter().map(|a| a.name()).collect();
    format!("{}[{}]", decl, args.join(", "))
}

fn render_signature(params: &[Desc], results: &[Desc]) -> String {
    let params: Vec<&str> = params.iter().map(|d| d.name()).collect();
    let results: Vec<&str> = results.iter().map(|d| d.name()).collect();
    match results.len() {
        0 => format!("({})", params.join(", ")),
        1 => format!("({}) {}", params.join(", "), results[0]),
        _ => format!("({}) ({})", params.join(", "), results.join(", ")),
    }
}
