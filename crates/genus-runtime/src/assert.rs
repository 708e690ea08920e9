// assert.rs
//
// Coercion into and assertion out of parametric types.

use crate::descriptor::{DescKind, Desc};
use crate::equality::equal;
use crate::errors::AssertionFault;
use crate::registry::DescriptorRegistry;
use crate::value::{Literal, Value};

/// True when `desc` has every method of interface `iface` with an identical
/// signature.
pub fn implements(desc: Desc, iface: Desc) -> bool {
    iface.is_interface() && desc.missing_method(iface).is_none()
}

/// Whether a value of static type `source` converts to `target`: the two
/// must be identical.
pub fn coercible(source: Desc, target: Desc) -> bool {
    equal(source, target)
}

/// Typed value into a parametric type. The decision uses the operand's
/// static type `source`, never the dynamic type of an interface value, so a
/// `Stringer` holding a `Celsius` converts to `Stringer` and not to
/// `Celsius`. Interface targets keep the value's dynamic type.
pub fn coerce(value: &Value, source: Desc, target: Desc) -> Result<Value, AssertionFault> {
    if !coercible(source, target) {
        return Err(AssertionFault::CoercionMismatch {
            actual: source.name().to_string(),
            target: target.name().to_string(),
        });
    }
    if target.is_interface() {
        Ok(value.clone())
    } else {
        Ok(value.retyped(target))
    }
}

/// Two-result coercion: never faults.
pub fn coerce_checked(value: &Value, source: Desc, target: Desc) -> (Value, bool) {
    match coerce(value, source, target) {
        Ok(v) => (v, true),
        Err(_) => (Value::zero(target), false),
    }
}

/// Untyped constant into a parametric type, following the implicit
/// conversion rules for the target's instantiation.
pub fn coerce_literal(
    literal: &Literal,
    target: Desc,
    registry: &DescriptorRegistry,
) -> Result<Value, AssertionFault> {
    literal
        .convert_to(target, registry)
        .ok_or_else(|| AssertionFault::LiteralNotRepresentable {
            literal: literal.to_string(),
            target: target.name().to_string(),
        })
}

/// Single-result type assertion. Interface targets check the method set of
/// the dynamic type; anything else requires identical descriptors.
pub fn assert_type(value: &Value, target: Desc) -> Result<Value, AssertionFault> {
    let actual = value.descriptor;
    if matches!(actual.underlying().kind(), DescKind::Interface(_)) {
        // Only a nil interface value carries an interface as its dynamic type.
        return Err(AssertionFault::NilInterface {
            target: target.name().to_string(),
        });
    }
    if target.is_interface() {
        return match actual.missing_method(target) {
            None => Ok(value.clone()),
            Some(method) => Err(AssertionFault::MissingMethod {
                actual: actual.name().to_string(),
                target: target.name().to_string(),
                method,
            }),
        };
    }
    if equal(actual, target) {
        Ok(value.retyped(target))
    } else {
        Err(AssertionFault::Mismatch {
            actual: actual.name().to_string(),
            target: target.name().to_string(),
        })
    }
}

/// Two-result type assertion: `(value, true)` or `(zero, false)`.
pub fn assert_type_checked(value: &Value, target: Desc) -> (Value, bool) {
    match assert_type(value, target) {
        Ok(v) => (v, true),
        Err(_) => (Value::zero(target), false),
    }
}

/// Index of the first case the value asserts to, in listed order.
pub fn type_switch(value: &Value, cases: &[Desc]) -> Option<usize> {
    cases
        .iter()
        .position(|&case| assert_type(value, case).is_ok())
}
