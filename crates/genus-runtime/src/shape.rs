// shape.rs
//
// Shapes: descriptor templates with positional parameter holes, and the
// runtime form of a parametric declaration.

use std::fmt::Write;

use genus_identity::{ChanDir, PrimitiveType};

use crate::descriptor::Desc;

/// Index of a declaration within one `DescriptorRegistry`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RtDeclId(u32);

impl RtDeclId {
    pub(crate) fn new(index: u32) -> Self {
        Self(index)
    }

    pub fn index(self) -> u32 {
        self.0
    }
}

/// A type with holes. `Param(i)` refers to the i-th binding of the
/// environment it is materialized under (for declarations, the flattened
/// outer-to-inner parameter list).
#[derive(Debug, Clone)]
pub enum Shape {
    Param(usize),
    Concrete(Desc),
    Basic(PrimitiveType),
    Pointer(Box<Shape>),
    Slice(Box<Shape>),
    Array(Box<Shape>, u64),
    Map(Box<Shape>, Box<Shape>),
    Chan(Box<Shape>, ChanDir),
    Func {
        params: Vec<Shape>,
        results: Vec<Shape>,
    },
    Struct(Vec<(String, Shape)>),
    Interface(Vec<(String, Shape)>),
    Named {
        decl: RtDeclId,
        args: Vec<Shape>,
    },
}

impl Shape {
    pub fn pointer(elem: Shape) -> Shape {
        Shape::Pointer(Box::new(elem))
    }

    pub fn slice(elem: Shape) -> Shape {
        Shape::Slice(Box::new(elem))
    }

    /// True when the shape mentions no parameter.
    pub fn is_concrete(&self) -> bool {
        match self {
            Shape::Param(_) => false,
            Shape::Concrete(_) | Shape::Basic(_) => true,
            Shape::Pointer(e) | Shape::Slice(e) | Shape::Array(e, _) | Shape::Chan(e, _) => {
                e.is_concrete()
            }
            Shape::Map(k, v) => k.is_concrete() && v.is_concrete(),
            Shape::Func { params, results } => params
                .iter()
                .chain(results.iter())
                .all(Shape::is_concrete),
            Shape::Struct(members) | Shape::Interface(members) => {
                members.iter().all(|(_, s)| s.is_concrete())
            }
            Shape::Named { args, .. } => args.iter().all(Shape::is_concrete),
        }
    }

    /// Append the canonical text of this shape. Declarations are written as
    /// `names` renders them and concrete named types with their definition
    /// key, so the text does not depend on which registry numbered them.
    pub(crate) fn write_key(&self, out: &mut String, names: &dyn Fn(RtDeclId) -> String) {
        match self {
            Shape::Param(index) => {
                let _ = write!(out, "${}", index);
            }
            Shape::Concrete(desc) => match desc.named() {
                Some(info) => {
                    let _ = write!(out, "{}{{{}}}", desc.name(), info.decl_key);
                }
                None => out.push_str(desc.name()),
            },
            Shape::Basic(prim) => out.push_str(prim.as_str()),
            Shape::Pointer(elem) => {
                out.push('*');
                elem.write_key(out, names);
            }
            Shape::Slice(elem) => {
                out.push_str("[]");
                elem.write_key(out, names);
            }
            Shape::Array(elem, len) => {
                let _ = write!(out, "[{}]", len);
                elem.write_key(out, names);
            }
            Shape::Map(key, value) => {
                out.push_str("map[");
                key.write_key(out, names);
                out.push(']');
                value.write_key(out, names);
            }
            Shape::Chan(elem, dir) => {
                out.push_str(dir.prefix());
                elem.write_key(out, names);
            }
            Shape::Func { params, results } => {
                out.push_str("func");
                write_signature(out, params, results, names);
            }
            Shape::Struct(fields) => {
                out.push_str("struct{");
                write_members(out, fields.iter(), " ", names);
                out.push('}');
            }
            Shape::Interface(methods) => {
                let mut sorted: Vec<&(String, Shape)> = methods.iter().collect();
                sorted.sort_by(|a, b| a.0.cmp(&b.0));
                out.push_str("interface{");
                write_members(out, sorted.into_iter(), "", names);
                out.push('}');
            }
            Shape::Named { decl, args } => {
                out.push_str(&names(*decl));
                if !args.is_empty() {
                    out.push('[');
                    write_list(out, args, names);
                    out.push(']');
                }
            }
        }
    }
}

fn write_list(out: &mut String, shapes: &[Shape], names: &dyn Fn(RtDeclId) -> String) {
    for (i, shape) in shapes.iter().enumerate() {
        if i > 0 {
            out.push_str(", ");
        }
        shape.write_key(out, names);
    }
}

fn write_signature(out: &mut String, params: &[Shape], results: &[Shape], names: &dyn Fn(RtDeclId) -> String) {
    out.push('(');
    write_list(out, params, names);
    out.push(')');
    match results {
        [] => {}
        [single] => {
            out.push(' ');
            single.write_key(out, names);
        }
        _ => {
            out.push_str(" (");
            write_list(out, results, names);
            out.push(')');
        }
    }
}

/// `name<sep>shape` pairs joined by `; `. Method shapes drop their `func`.
fn write_members<'s>(
    out: &mut String,
    members: impl Iterator<Item = &'s (String, Shape)>,
    sep: &str,
    names: &dyn Fn(RtDeclId) -> String,
) {
    for (i, (name, shape)) in members.enumerate() {
        if i > 0 {
            out.push_str("; ");
        }
        out.push_str(name);
        out.push_str(sep);
        match shape {
            Shape::Func { params, results } if sep.is_empty() => {
                write_signature(out, params, results, names)
            }
            other => other.write_key(out, names),
        }
    }
}

#[derive(Debug, Clone)]
pub struct RtParam {
    pub name: String,
    /// Interface shape; may mention any parameter of the declaration,
    /// including this one.
    pub constraint: Option<Shape>,
}

/// A named type declaration as the runtime sees it.
#[derive(Debug, Clone)]
pub struct RuntimeDecl {
    pub name: String,
    pub params: Vec<RtParam>,
    pub underlying: Shape,
    /// Method name and `Func` shape (receiver excluded).
    pub methods: Vec<(String, Shape)>,
}

impl RuntimeDecl {
    /// Identity of the definition: its name, parameter count, constraints,
    /// underlying shape and methods. Two definitions with the same key are
    /// the same declaration, in one registry or across registries.
    pub(crate) fn key(&self, names: &dyn Fn(RtDeclId) -> String) -> String {
        let mut out = String::new();
        let _ = write!(out, "{}[{}]", self.name, self.params.len());
        for param in &self.params {
            match &param.constraint {
                Some(constraint) => {
                    out.push('(');
                    constraint.write_key(&mut out, names);
                    out.push(')');
                }
                None => out.push_str("(_)"),
            }
        }
        out.push_str(" = ");
        self.underlying.write_key(&mut out, names);
        let mut methods: Vec<&(String, Shape)> = self.methods.iter().collect();
        methods.sort_by(|a, b| a.0.cmp(&b.0));
        out.push_str(" {");
        write_members(&mut out, methods.into_iter(), "", names);
        out.push('}');
        out
    }

    /// Non-parametric declaration without methods.
    pub fn simple(name: &str, underlying: Shape) -> Self {
        Self {
            name: name.to_string(),
            params: Vec::new(),
            underlying,
            methods: Vec::new(),
        }
    }
}
