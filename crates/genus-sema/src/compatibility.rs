//! Assignability between concrete and parametric types, and validation of
//! explicit coercions and assertions.

use genus_runtime::Literal;

use crate::cx::TypeCx;
use crate::deduce::Unifier;
use crate::errors::SemanticError;
use crate::type_arena::{SemaType, Substitution, TypeId};
use genus_identity::Span;

/// Assignability between two concrete types. This belongs to the ordinary
/// type system; the parametric rules only delegate to it.
pub trait ConcreteAssignability {
    fn assignable(&self, cx: &mut TypeCx<'_>, from: TypeId, to: TypeId) -> bool;
}

/// Go-like rules: identity, identical underlying types when at most one side
/// is named, and interface satisfaction.
#[derive(Debug, Clone, Copy, Default)]
pub struct DefaultConcreteRules;

impl ConcreteAssignability for DefaultConcreteRules {
    fn assignable(&self, cx: &mut TypeCx<'_>, from: TypeId, to: TypeId) -> bool {
        if from == to {
            return true;
        }
        let from_named = cx.arena.unwrap_named(from).is_some();
        let to_named = cx.arena.unwrap_named(to).is_some();
        if (!from_named || !to_named) && cx.underlying(from) == cx.underlying(to) {
            return true;
        }
        cx.is_interface(to) && cx.satisfies(from, to)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Compatibility {
    Assignable,
    /// Concrete into parametric: an explicit coercion is required.
    NeedsCoercion,
    /// Parametric into concrete: an explicit assertion is required.
    NeedsAssertion,
    /// Two parametric types that are not identical.
    ParametricMismatch,
    Incompatible,
}

impl Compatibility {
    pub fn is_assignable(self) -> bool {
        self == Compatibility::Assignable
    }
}

/// Classify an implicit assignment of a value of type `from` to `to`.
pub fn check_assign(
    cx: &mut TypeCx<'_>,
    rules: &dyn ConcreteAssignability,
    from: TypeId,
    to: TypeId,
) -> Compatibility {
    if from.is_invalid() || to.is_invalid() {
        return Compatibility::Assignable;
    }
    match (cx.arena.is_parametric(from), cx.arena.is_parametric(to)) {
        (true, true) if from == to => Compatibility::Assignable,
        (true, true) => Compatibility::ParametricMismatch,
        (false, true) => Compatibility::NeedsCoercion,
        (true, false) => Compatibility::NeedsAssertion,
        (false, false) if rules.assignable(cx, from, to) => Compatibility::Assignable,
        (false, false) => Compatibility::Incompatible,
    }
}

/// Diagnostic for a failed implicit assignment; `None` when assignable.
pub fn assign_error(
    cx: &mut TypeCx<'_>,
    rules: &dyn ConcreteAssignability,
    from: TypeId,
    to: TypeId,
    span: Span,
) -> Option<SemanticError> {
    let expected = cx.display(to);
    let found = cx.display(from);
    let span = span.into();
    match check_assign(cx, rules, from, to) {
        Compatibility::Assignable => None,
        Compatibility::NeedsCoercion => Some(SemanticError::ImplicitCoercion { expected, found, span }),
        Compatibility::NeedsAssertion => Some(SemanticError::ImplicitAssertion { expected, found, span }),
        Compatibility::ParametricMismatch => {
            Some(SemanticError::ParametricMismatch { expected, found, span })
        }
        Compatibility::Incompatible => Some(SemanticError::TypeMismatch { expected, found, span }),
    }
}

/// Whether an untyped constant may be implicitly converted to the concrete
/// type `to`.
pub fn literal_fits(cx: &mut TypeCx<'_>, literal: &Literal, to: TypeId) -> bool {
    if to.is_invalid() {
        return true;
    }
    if let Literal::Nil = literal {
        return cx.is_nilable(to);
    }
    if cx.is_interface(to) {
        let Some(default) = literal.default_type() else {
            return false;
        };
        return cx.satisfies(TypeId::primitive(default), to);
    }
    let underlying = cx.underlying(to);
    let Some(prim) = cx.arena.unwrap_primitive(underlying) else {
        return false;
    };
    match literal {
        Literal::Int(v) => match prim.integer_range() {
            Some((min, max)) => (min..=max).contains(v),
            None => prim.is_float() || prim.is_complex(),
        },
        Literal::Float(f) => {
            prim.is_float()
                || prim.is_complex()
                || (f.is_finite()
                    && f.fract() == 0.0
                    && prim
                        .integer_range()
                        .is_some_and(|(min, max)| (min..=max).contains(&(*f as i128))))
        }
        Literal::Str(_) => prim == genus_identity::PrimitiveType::String,
        Literal::Bool(_) => prim == genus_identity::PrimitiveType::Bool,
        Literal::Nil => false,
    }
}

/// Source of an explicit coercion.
#[derive(Debug, Clone, PartialEq)]
pub enum CoercionSource {
    Typed(TypeId),
    Untyped(Literal),
}

/// Validate `value[target]`. Succeeds when some instantiation of `target`
/// could accept the value; the exact check happens at runtime against the
/// instantiation in force.
pub fn check_coercion(
    cx: &mut TypeCx<'_>,
    source: &CoercionSource,
    target: TypeId,
    span: Span,
) -> Result<(), SemanticError> {
    if target.is_invalid() {
        return Ok(());
    }
    if !cx.arena.is_parametric(target) {
        return Err(SemanticError::CoercionTargetNotParametric {
            target: cx.display(target),
            span: span.into(),
        });
    }
    match source {
        CoercionSource::Typed(from) => {
            let from = *from;
            if from.is_invalid() || from == target {
                return Ok(());
            }
            if cx.arena.is_parametric(from) {
                return Err(SemanticError::ParametricMismatch {
                    expected: cx.display(target),
                    found: cx.display(from),
                    span: span.into(),
                });
            }
            if could_match(cx, from, target) {
                Ok(())
            } else {
                Err(SemanticError::CoercionNeverSucceeds {
                    target: cx.display(target),
                    found: cx.display(from),
                    span: span.into(),
                })
            }
        }
        CoercionSource::Untyped(literal) => {
            let underlying = cx.underlying(target);
            let accepted = match cx.arena.get(underlying).clone() {
                SemaType::TypeParam(_) => true,
                SemaType::Interface(_) if !matches!(literal, Literal::Nil) => {
                    return Err(SemanticError::AmbiguousCoercion {
                        target: cx.display(target),
                        found: literal.to_string(),
                        span: span.into(),
                    });
                }
                _ => matches!(literal, Literal::Nil) && cx.is_nilable(underlying),
            };
            if accepted {
                Ok(())
            } else {
                Err(SemanticError::CoercionNeverSucceeds {
                    target: cx.display(target),
                    found: literal.to_string(),
                    span: span.into(),
                })
            }
        }
    }
}

/// True when binding the parameters of `target` could make it identical to
/// the concrete `from`, with every binding satisfying its constraint.
pub fn could_match(cx: &mut TypeCx<'_>, from: TypeId, target: TypeId) -> bool {
    let params = cx.arena.collect_type_params(target);
    let mut unifier = Unifier::new(&params, Substitution::default());
    if unifier.unify(cx, target, from).is_err() {
        return false;
    }
    let bindings = unifier.into_bindings();
    if cx.arena.substitute(target, &bindings) != from {
        // Matched only through an underlying type: a named target never
        // coerces from an unnamed value.
        return false;
    }
    params.iter().all(|&p| {
        let (Some(&arg), Some(constraint)) = (bindings.get(&p), cx.scopes.param(p).constraint) else {
            return true;
        };
        let constraint = cx.arena.substitute(constraint, &bindings);
        cx.satisfies(arg, constraint)
    })
}

/// Validate `value.(target)`: the value's static type must leave room for
/// more than one dynamic type.
pub fn check_assertion(cx: &mut TypeCx<'_>, from: TypeId, span: Span) -> Result<(), SemanticError> {
    if from.is_invalid() || cx.arena.is_parametric(from) || cx.is_interface(from) {
        return Ok(());
    }
    Err(SemanticError::AssertionSourceNotParametric {
        found: cx.display(from),
        span: span.into(),
    })
}
