// value.rs
//
// Uniform representation of values whose static type is parametric.

use std::fmt;

use genus_identity::PrimitiveType;

use crate::descriptor::{DescKind, Desc};
use crate::registry::DescriptorRegistry;

/// A value together with the descriptor of its dynamic type.
#[derive(Debug, Clone, PartialEq)]
pub struct Value {
    pub descriptor: Desc,
    pub data: ValueData,
}

#[derive(Debug, Clone, PartialEq)]
pub enum ValueData {
    Bool(bool),
    Int(i64),
    Uint(u64),
    Float(f64),
    Complex(f64, f64),
    Str(String),
    /// Struct fields or array elements, in order.
    Aggregate(Vec<Value>),
    /// An array of `len` copies of one element; zero arrays use this form.
    Repeat { elem: Box<Value>, len: u64 },
    Nil,
}

/// An untyped constant as written in source.
#[derive(Debug, Clone, PartialEq)]
pub enum Literal {
    Int(i128),
    Float(f64),
    Str(String),
    Bool(bool),
    Nil,
}

impl Value {
    pub fn new(descriptor: Desc, data: ValueData) -> Self {
        Self { descriptor, data }
    }

    /// The zero value of `desc`. Types without a finite layout have no
    /// values; they get a nil placeholder.
    pub fn zero(desc: Desc) -> Value {
        if desc.layout().is_err() {
            return Value::new(desc, ValueData::Nil);
        }
        Value::new(desc, zero_data(desc))
    }

    pub fn is_nil(&self) -> bool {
        matches!(self.data, ValueData::Nil)
    }

    pub fn as_int(&self) -> Option<i64> {
        match self.data {
            ValueData::Int(v) => Some(v),
            _ => None,
        }
    }

    pub fn as_float(&self) -> Option<f64> {
        match self.data {
            ValueData::Float(v) => Some(v),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match &self.data {
            ValueData::Str(s) => Some(s),
            _ => None,
        }
    }

    /// Same payload, viewed as another (identical) type.
    pub(crate) fn retyped(&self, descriptor: Desc) -> Value {
        Value::new(descriptor, self.data.clone())
    }
}

fn zero_data(desc: Desc) -> ValueData {
    match desc.underlying().kind() {
        DescKind::Basic(prim) => match *prim {
            PrimitiveType::Bool => ValueData::Bool(false),
            PrimitiveType::String => ValueData::Str(String::new()),
            p if p.is_float() => ValueData::Float(0.0),
            p if p.is_complex() => ValueData::Complex(0.0, 0.0),
            p if p.is_unsigned() => ValueData::Uint(0),
            _ => ValueData::Int(0),
        },
        DescKind::Struct(fields) => {
            ValueData::Aggregate(fields.iter().map(|f| Value::zero(f.ty)).collect())
        }
        DescKind::Array { elem, len } => ValueData::Repeat {
            elem: Box::new(Value::zero(*elem)),
            len: *len,
        },
        _ => ValueData::Nil,
    }
}

impl Literal {
    /// Default type of an untyped constant; nil has none.
    pub fn default_type(&self) -> Option<PrimitiveType> {
        match self {
            Literal::Int(_) => Some(PrimitiveType::Int),
            Literal::Float(_) => Some(PrimitiveType::Float64),
            Literal::Str(_) => Some(PrimitiveType::String),
            Literal::Bool(_) => Some(PrimitiveType::Bool),
            Literal::Nil => None,
        }
    }

    /// Implicit conversion of the constant to `target`, if legal.
    ///
    /// Interface targets receive the constant at its default type, provided
    /// that type implements the interface.
    pub fn convert_to(&self, target: Desc, registry: &DescriptorRegistry) -> Option<Value> {
        if let Literal::Nil = self {
            return target
                .is_nilable()
                .then(|| Value::new(target, ValueData::Nil));
        }
        if target.is_interface() {
            let dynamic = registry.basic(self.default_type()?);
            if dynamic.missing_method(target).is_some() {
                return None;
            }
            return self.convert_to(dynamic, registry);
        }
        let prim = target.primitive()?;
        let data = match self {
            Literal::Int(v) => int_data(*v, prim)?,
            Literal::Float(f) => {
                if prim.is_float() {
                    ValueData::Float(round_float(*f, prim))
                } else if prim.is_complex() {
                    ValueData::Complex(*f, 0.0)
                } else if prim.is_integer() && f.is_finite() && f.fract() == 0.0 {
                    int_data(*f as i128, prim)?
                } else {
                    return None;
                }
            }
            Literal::Str(s) if prim == PrimitiveType::String => ValueData::Str(s.clone()),
            Literal::Bool(b) if prim == PrimitiveType::Bool => ValueData::Bool(*b),
            _ => return None,
        };
        Some(Value::new(target, data))
    }
}

fn int_data(v: i128, prim: PrimitiveType) -> Option<ValueData> {
    if let Some((min, max)) = prim.integer_range() {
        if v < min || v > max {
            return None;
        }
        return Some(if prim.is_unsigned() {
            ValueData::Uint(v as u64)
        } else {
            ValueData::Int(v as i64)
        });
    }
    if prim.is_float() {
        return Some(ValueData::Float(round_float(v as f64, prim)));
    }
    if prim.is_complex() {
        return Some(ValueData::Complex(v as f64, 0.0));
    }
    None
}

fn round_float(f: f64, prim: PrimitiveType) -> f64 {
    if prim == PrimitiveType::Float32 {
        f as f32 as f64
    } else {
        f
    }
}

impl fmt::Display for Literal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Literal::Int(v) => write!(f, "{}", v),
            Literal::Float(v) => write!(f, "{}", v),
            Literal::Str(s) => write!(f, "{:?}", s),
            Literal::Bool(b) => write!(f, "{}", b),
            Literal::Nil => f.write_str("nil"),
        }
    }
}
