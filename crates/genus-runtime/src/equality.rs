// equality.rs
//
// Descriptor identity. Equality is structural everywhere, with named types
// compared by definition key and arguments. Pairs already under comparison
// are treated as equal (coinductive equality), which terminates on
// recursive types. Canonical descriptors of one registry are structurally
// equal iff they are the same object, so that case is answered by identity.

use rustc_hash::FxHashSet;

use crate::descriptor::{DescKind, TypeDescriptor};

pub fn equal(a: &TypeDescriptor, b: &TypeDescriptor) -> bool {
    if std::ptr::eq(a, b) {
        return true;
    }
    if same_canonical_registry(a, b) {
        return false;
    }
    let mut assumed = FxHashSet::default();
    structurally_equal(a, b, &mut assumed)
}

fn same_canonical_registry(a: &TypeDescriptor, b: &TypeDescriptor) -> bool {
    a.origin() == b.origin() && a.is_canonical() && b.is_canonical()
}

fn structurally_equal(
    a: &TypeDescriptor,
    b: &TypeDescriptor,
    assumed: &mut FxHashSet<(usize, usize)>,
) -> bool {
    if std::ptr::eq(a, b) {
        return true;
    }
    if same_canonical_registry(a, b) {
        return false;
    }
    let pair = (
        a as *const TypeDescriptor as usize,
        b as *const TypeDescriptor as usize,
    );
    if !assumed.insert(pair) {
        return true;
    }

    let mut all = |xs: &[&'static TypeDescriptor], ys: &[&'static TypeDescriptor]| {
        xs.len() == ys.len()
            && xs
                .iter()
                .zip(ys)
                .all(|(x, y)| structurally_equal(x, y, assumed))
    };

    match (a.kind(), b.kind()) {
        (DescKind::Basic(x), DescKind::Basic(y)) => x == y,
        (DescKind::Pointer(x), DescKind::Pointer(y)) | (DescKind::Slice(x), DescKind::Slice(y)) => {
            all(&[*x], &[*y])
        }
        (
            DescKind::Array { elem: x, len: lx },
            DescKind::Array { elem: y, len: ly },
        ) => lx == ly && all(&[*x], &[*y]),
        (
            DescKind::Map { key: kx, value: vx },
            DescKind::Map { key: ky, value: vy },
        ) => all(&[*kx, *vx], &[*ky, *vy]),
        (
            DescKind::Chan { elem: x, dir: dx },
            DescKind::Chan { elem: y, dir: dy },
        ) => dx == dy && all(&[*x], &[*y]),
        (
            DescKind::Func {
                params: px,
                results: rx,
            },
            DescKind::Func {
                params: py,
                results: ry,
            },
        ) => all(px.as_slice(), py.as_slice()) && all(rx.as_slice(), ry.as_slice()),
        (DescKind::Struct(fx), DescKind::Struct(fy)) => {
            fx.len() == fy.len()
                && fx.iter().zip(fy).all(|(x, y)| x.name == y.name)
                && all(
                    fx.iter().map(|f| f.ty).collect::<Vec<_>>().as_slice(),
                    fy.iter().map(|f| f.ty).collect::<Vec<_>>().as_slice(),
                )
        }
        (DescKind::Interface(mx), DescKind::Interface(my)) => {
            mx.len() == my.len()
                && mx.iter().zip(my).all(|(x, y)| x.name == y.name)
                && all(
                    mx.iter().map(|m| m.signature).collect::<Vec<_>>().as_slice(),
                    my.iter().map(|m| m.signature).collect::<Vec<_>>().as_slice(),
                )
        }
        // Named types are nominal: same definition and arguments.
        (DescKind::Named(nx), DescKind::Named(ny)) => {
            if nx.decl_key != ny.decl_key || !all(nx.args.as_slice(), ny.args.as_slice()) {
                return false;
            }
            match (nx.underlying(), ny.underlying()) {
                (Some(ux), Some(uy)) => all(&[ux], &[uy]),
                (None, None) => true,
                _ => false,
            }
        }
        _ => false,
    }
}
