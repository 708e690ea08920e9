// descriptor.rs
//
// TypeDescriptor: the runtime description of a concrete type.

use std::fmt;
use std::sync::{Arc, OnceLock};
use std::sync::atomic::{AtomicU32, Ordering};

use genus_identity::{ChanDir, PrimitiveType};

use crate::errors::RuntimeError;
use crate::shape::RtDeclId;

/// Canonical descriptor handle. Descriptors live for the whole process.
pub type Desc = &'static TypeDescriptor;

/// Largest size in bytes a type may occupy.
pub const MAX_TYPE_SIZE: u64 = 1 << 40;

/// Process-unique descriptor number, also used as the interning key for
/// child references.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct DescId(u32);

static NEXT_DESC_ID: AtomicU32 = AtomicU32::new(1);

impl DescId {
    fn fresh() -> Self {
        Self(NEXT_DESC_ID.fetch_add(1, Ordering::Relaxed))
    }

    pub fn index(self) -> u32 {
        self.0
    }
}

pub struct TypeDescriptor {
    id: DescId,
    /// Registry that interned this descriptor.
    origin: u32,
    /// Some descriptor below this one was interned by another registry.
    mixed: bool,
    kind: DescKind,
    name: String,
    layout: OnceLock<Layout>,
}

pub enum DescKind {
    Basic(PrimitiveType),
    Pointer(Desc),
    Slice(Desc),
    Array { elem: Desc, len: u64 },
    Map { key: Desc, value: Desc },
    Chan { elem: Desc, dir: ChanDir },
    Func { params: Vec<Desc>, results: Vec<Desc> },
    Struct(Vec<Field>),
    /// Methods sorted by name.
    Interface(Vec<MethodSig>),
    Named(NamedInfo),
}

pub struct Field {
    pub name: String,
    pub ty: Desc,
}

pub struct MethodSig {
    pub name: String,
    /// Always a `Func` descriptor, receiver excluded.
    pub signature: Desc,
}

/// A declared type, possibly an instantiation of a parametric declaration.
///
/// Named descriptors are interned as shells first and completed afterwards,
/// so a declaration that refers to itself (through a pointer, slice, ...)
/// finds its own shell instead of recursing forever.
pub struct NamedInfo {
    pub decl: RtDeclId,
    pub decl_name: String,
    /// Definition identity shared by every registry.
    pub decl_key: Arc<str>,
    pub args: Vec<Desc>,
    underlying: OnceLock<Desc>,
    methods: OnceLock<Vec<MethodSig>>,
}

impl NamedInfo {
    pub(crate) fn new(decl: RtDeclId, decl_name: String, decl_key: Arc<str>, args: Vec<Desc>) -> Self {
        Self {
            decl,
            decl_name,
            decl_key,
            args,
            underlying: OnceLock::new(),
            methods: OnceLock::new(),
        }
    }

    pub fn underlying(&self) -> Option<Desc> {
        self.underlying.get().copied()
    }

    pub fn methods(&self) -> &[MethodSig] {
        self.methods.get().map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn is_complete(&self) -> bool {
        self.underlying.get().is_some()
    }

    /// Concurrent completers compute identical canonical values, so losing
    /// a `set` race is harmless.
    pub(crate) fn complete(&self, underlying: Desc, mut methods: Vec<MethodSig>) {
        methods.sort_by(|a, b| a.name.cmp(&b.name));
        let _ = self.methods.set(methods);
        let _ = self.underlying.set(underlying);
    }
}

/// Size, alignment and field offsets on a 64-bit target.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Layout {
    pub size: u64,
    pub align: u64,
    /// Byte offset of each struct field, in declaration order.
    pub field_offsets: Vec<u64>,
}

impl Layout {
    fn scalar(size: u64, align: u64) -> Self {
        Self {
            size,
            align,
            field_offsets: Vec::new(),
        }
    }
}

fn mixes_registries(origin: u32, kind: &DescKind) -> bool {
    let foreign = |d: &Desc| d.origin != origin || d.mixed;
    match kind {
        DescKind::Basic(_) => false,
        DescKind::Pointer(e)
        | DescKind::Slice(e)
        | DescKind::Array { elem: e, .. }
        | DescKind::Chan { elem: e, .. } => foreign(e),
        DescKind::Map { key, value } => foreign(key) || foreign(value),
        DescKind::Func { params, results } => params.iter().chain(results).any(foreign),
        DescKind::Struct(fields) => fields.iter().any(|f| foreign(&f.ty)),
        DescKind::Interface(methods) => methods.iter().any(|m| foreign(&m.signature)),
        DescKind::Named(info) => info.args.iter().any(foreign),
    }
}

fn round_up(value: u64, align: u64) -> Option<u64> {
    value.div_ceil(align.max(1)).checked_mul(align.max(1))
}

impl TypeDescriptor {
    pub(crate) fn new(origin: u32, kind: DescKind, name: String) -> Self {
        Self {
            id: DescId::fresh(),
            origin,
            mixed: mixes_registries(origin, &kind),
            kind,
            name,
            layout: OnceLock::new(),
        }
    }

    pub fn id(&self) -> DescId {
        self.id
    }

    pub(crate) fn origin(&self) -> u32 {
        self.origin
    }

    /// Built only from descriptors of its own registry. Such descriptors
    /// are canonical there: equal iff identical.
    pub(crate) fn is_canonical(&self) -> bool {
        !self.mixed
    }

    pub fn kind(&self) -> &DescKind {
        &self.kind
    }

    /// Human-readable name embedding type arguments, e.g. `List[int]`.
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn named(&self) -> Option<&NamedInfo> {
        match &self.kind {
            DescKind::Named(info) => Some(info),
            _ => None,
        }
    }

    pub fn type_args(&self) -> &[Desc] {
        self.named().map(|n| n.args.as_slice()).unwrap_or(&[])
    }

    /// Follows named types to their structural underlying type. An
    /// incomplete named shell is its own underlying type.
    pub fn underlying(&self) -> &TypeDescriptor {
        let mut current = self;
        while let DescKind::Named(info) = &current.kind {
            match info.underlying() {
                Some(next) if !std::ptr::eq(next, current) => current = next,
                _ => break,
            }
        }
        current
    }

    pub fn is_interface(&self) -> bool {
        matches!(self.underlying().kind, DescKind::Interface(_))
    }

    /// Kinds whose zero value is nil.
    pub fn is_nilable(&self) -> bool {
        matches!(
            self.underlying().kind,
            DescKind::Pointer(_)
                | DescKind::Slice(_)
                | DescKind::Map { .. }
                | DescKind::Chan { .. }
                | DescKind::Func { .. }
                | DescKind::Interface(_)
        )
    }

    pub fn primitive(&self) -> Option<PrimitiveType> {
        match self.underlying().kind {
            DescKind::Basic(p) => Some(p),
            _ => None,
        }
    }

    /// Element type of pointer, slice, array and channel kinds.
    pub fn elem(&self) -> Option<Desc> {
        match &self.underlying().kind {
            DescKind::Pointer(e) | DescKind::Slice(e) => Some(e),
            DescKind::Array { elem, .. } | DescKind::Chan { elem, .. } => Some(elem),
            DescKind::Map { value, .. } => Some(value),
            _ => None,
        }
    }

    pub fn fields(&self) -> &[Field] {
        match &self.underlying().kind {
            DescKind::Struct(fields) => fields,
            _ => &[],
        }
    }

    /// Field descriptor and byte offset by name.
    pub fn field(&'static self, name: &str) -> Result<Option<(Desc, u64)>, RuntimeError> {
        let Some(index) = self.fields().iter().position(|f| f.name == name) else {
            return Ok(None);
        };
        let layout = self.underlying_static().layout()?;
        Ok(Some((self.fields()[index].ty, layout.field_offsets[index])))
    }

    fn underlying_static(&'static self) -> Desc {
        let mut current: Desc = self;
        while let DescKind::Named(info) = &current.kind {
            match info.underlying() {
                Some(next) if !std::ptr::eq(next, current) => current = next,
                _ => break,
            }
        }
        current
    }

    /// Methods callable on a value of this type: declared methods of a named
    /// type (also reachable through a pointer to it) and the methods of an
    /// interface.
    pub fn method_set(&self) -> &[MethodSig] {
        match &self.kind {
            DescKind::Named(info) => {
                if let DescKind::Interface(methods) = &self.underlying().kind {
                    return methods;
                }
                info.methods()
            }
            DescKind::Pointer(target) => match &target.kind {
                DescKind::Named(info) if !target.is_interface() => info.methods(),
                _ => &[],
            },
            DescKind::Interface(methods) => methods,
            _ => &[],
        }
    }

    /// First method of interface `iface` this type lacks (or has with a
    /// different signature). `None` means the type implements `iface`.
    pub fn missing_method(&self, iface: &TypeDescriptor) -> Option<String> {
        let DescKind::Interface(required) = &iface.underlying().kind else {
            return Some(format!("<{} is not an interface>", iface.name()));
        };
        let available = self.method_set();
        required
            .iter()
            .find(|req| {
                !available.iter().any(|have| {
                    have.name == req.name && crate::equal(have.signature, req.signature)
                })
            })
            .map(|req| req.name.clone())
    }

    pub fn size(&'static self) -> Result<u64, RuntimeError> {
        Ok(self.layout()?.size)
    }

    /// Memory layout, computed on first request. A type that contains
    /// itself by value has no finite layout.
    pub fn layout(&'static self) -> Result<&'static Layout, RuntimeError> {
        if let Some(layout) = self.layout.get() {
            return Ok(layout);
        }
        let mut stack = Vec::new();
        let computed = compute_layout(self, &mut stack)?;
        Ok(self.layout.get_or_init(|| computed))
    }
}

fn compute_layout(desc: Desc, stack: &mut Vec<DescId>) -> Result<Layout, RuntimeError> {
    if let Some(layout) = desc.layout.get() {
        return Ok(layout.clone());
    }
    if stack.contains(&desc.id) {
        return Err(RuntimeError::InvalidRecursiveType {
            name: desc.name.clone(),
        });
    }
    stack.push(desc.id);
    let layout = match &desc.kind {
        DescKind::Basic(p) => {
            let (size, align) = p.size_align();
            Layout::scalar(size, align)
        }
        DescKind::Pointer(_) | DescKind::Map { .. } | DescKind::Chan { .. } | DescKind::Func { .. } => {
            Layout::scalar(8, 8)
        }
        DescKind::Slice(_) => Layout::scalar(24, 8),
        DescKind::Interface(_) => Layout::scalar(16, 8),
        DescKind::Array { elem, len } => {
            let elem = compute_layout(elem, stack)?;
            let size = elem.size.checked_mul(*len).ok_or_else(|| too_large(desc))?;
            Layout::scalar(size, elem.align)
        }
        DescKind::Struct(fields) => {
            let mut offset: u64 = 0;
            let mut align = 1;
            let mut field_offsets = Vec::with_capacity(fields.len());
            for field in fields {
                let inner = compute_layout(field.ty, stack)?;
                offset = round_up(offset, inner.align).ok_or_else(|| too_large(desc))?;
                field_offsets.push(offset);
                offset = offset.checked_add(inner.size).ok_or_else(|| too_large(desc))?;
                align = align.max(inner.align);
            }
            Layout {
                size: round_up(offset, align).ok_or_else(|| too_large(desc))?,
                align,
                field_offsets,
            }
        }
        DescKind::Named(info) => match info.underlying() {
            Some(underlying) => compute_layout(underlying, stack)?,
            None => {
                return Err(RuntimeError::IncompleteDescriptor {
                    name: desc.name.clone(),
                });
            }
        },
    };
    stack.pop();
    if layout.size > MAX_TYPE_SIZE {
        return Err(too_large(desc));
    }
    let _ = desc.layout.set(layout.clone());
    Ok(layout)
}

fn too_large(desc: Desc) -> RuntimeError {
    RuntimeError::TypeTooLarge {
        name: desc.name.clone(),
        max: MAX_TYPE_SIZE,
    }
}

impl PartialEq for TypeDescriptor {
    fn eq(&self, other: &Self) -> bool {
        crate::equal(self, other)
    }
}

impl Eq for TypeDescriptor {}

// Named descriptors may be cyclic; never print through them.
impl fmt::Debug for TypeDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TypeDescriptor")
            .field("id", &self.id.0)
            .field("name", &self.name)
            .finish()
    }
}

impl fmt::Display for TypeDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name)
    }
}
