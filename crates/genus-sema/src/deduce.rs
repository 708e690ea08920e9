//! Type argument deduction for calls that omit explicit type arguments.
//!
//! Declared parameter types are walked against the argument types left to
//! right. The first occurrence of a type parameter binds it; every later
//! occurrence must see an identical type.

use genus_identity::TypeParamId;

use crate::cx::TypeCx;
use crate::type_arena::{SemaType, Substitution, TypeId};

/// Static type of one call argument, as far as deduction is concerned.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArgType {
    Typed(TypeId),
    /// Untyped constant, already defaulted (`int`, `float64`, ...).
    Untyped(TypeId),
    Nil,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeductionError {
    /// A parameter occurs in results but in no ordinary parameter.
    ResultOnly { param: TypeParamId },
    Conflict {
        param: TypeParamId,
        first: TypeId,
        second: TypeId,
        arg: usize,
    },
    /// A parameter whose only occurrences were at `nil` arguments.
    FromNil { param: TypeParamId, arg: usize },
    Shape {
        expected: TypeId,
        found: TypeId,
        arg: usize,
    },
    /// A parameter that occurs nowhere in the signature.
    Incomplete { param: TypeParamId },
}

/// Structural matcher binding a fixed set of parameters.
pub struct Unifier<'p> {
    bindable: &'p [TypeParamId],
    bindings: Substitution,
}

/// Mismatch found while unifying, before it is attributed to an argument.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnifyError {
    Conflict {
        param: TypeParamId,
        first: TypeId,
        second: TypeId,
    },
    Shape {
        expected: TypeId,
        found: TypeId,
    },
}

impl<'p> Unifier<'p> {
    pub fn new(bindable: &'p [TypeParamId], prebound: Substitution) -> Self {
        Self {
            bindable,
            bindings: prebound,
        }
    }

    pub fn bindings(&self) -> &Substitution {
        &self.bindings
    }

    pub fn into_bindings(self) -> Substitution {
        self.bindings
    }

    /// Match `pattern` (a declared type) against `actual`.
    pub fn unify(&mut self, cx: &mut TypeCx<'_>, pattern: TypeId, actual: TypeId) -> Result<(), UnifyError> {
        if actual.is_invalid() || pattern.is_invalid() || !cx.arena.mentions_any(pattern, self.bindable) {
            return Ok(());
        }

        if let Some(param) = cx.arena.unwrap_type_param(pattern) {
            return match self.bindings.get(&param) {
                Some(&bound) if bound == actual => Ok(()),
                Some(&bound) => Err(UnifyError::Conflict {
                    param,
                    first: bound,
                    second: actual,
                }),
                None => {
                    self.bindings.insert(param, actual);
                    Ok(())
                }
            };
        }

        let shape_error = UnifyError::Shape {
            expected: pattern,
            found: actual,
        };
        let pairs: Vec<(TypeId, TypeId)> = match (cx.arena.get(pattern).clone(), cx.arena.get(actual).clone()) {
            // Satisfaction of a parametric interface is not used to bind.
            (SemaType::Interface(_), _) => return Ok(()),
            (SemaType::Pointer(p), SemaType::Pointer(a)) | (SemaType::Slice(p), SemaType::Slice(a)) => {
                vec![(p, a)]
            }
            (SemaType::Array { elem: p, len: pl }, SemaType::Array { elem: a, len: al }) if pl == al => {
                vec![(p, a)]
            }
            (SemaType::Map { key: pk, value: pv }, SemaType::Map { key: ak, value: av }) => {
                vec![(pk, ak), (pv, av)]
            }
            (SemaType::Chan { elem: p, dir: pd }, SemaType::Chan { elem: a, dir: ad }) if pd == ad => {
                vec![(p, a)]
            }
            (
                SemaType::Function { params: pp, results: pr },
                SemaType::Function { params: ap, results: ar },
            ) if pp.len() == ap.len() && pr.len() == ar.len() => pp
                .iter()
                .chain(pr.iter())
                .copied()
                .zip(ap.iter().chain(ar.iter()).copied())
                .collect(),
            (SemaType::Struct(pf), SemaType::Struct(af))
                if pf.len() == af.len() && pf.iter().zip(af.iter()).all(|(p, a)| p.name == a.name) =>
            {
                pf.iter().zip(af.iter()).map(|(p, a)| (p.ty, a.ty)).collect()
            }
            (
                SemaType::Named { decl: pd, type_args: pa },
                SemaType::Named { decl: ad, type_args: aa },
            ) if pd == ad => pa.iter().copied().zip(aa.iter().copied()).collect(),
            (pattern_ty, SemaType::Named { .. }) if !matches!(pattern_ty, SemaType::Named { .. }) => {
                // An unnamed declared shape matches a named argument through
                // its underlying type.
                let underlying = cx.underlying(actual);
                if underlying == actual || underlying.is_invalid() {
                    return Err(shape_error);
                }
                return self.unify(cx, pattern, underlying);
            }
            _ => return Err(shape_error),
        };

        for (p, a) in pairs {
            self.unify(cx, p, a)?;
        }
        Ok(())
    }
}

/// Deduce every parameter in `bindable` from the argument types.
///
/// `prebound` carries parameters already fixed by the reference site
/// (enclosing scopes shared with the caller). The result binds every
/// parameter of `bindable` and `prebound`.
pub fn deduce(
    cx: &mut TypeCx<'_>,
    bindable: &[TypeParamId],
    prebound: Substitution,
    declared_params: &[TypeId],
    declared_results: &[TypeId],
    args: &[ArgType],
) -> Result<Substitution, DeductionError> {
    for &param in bindable {
        let in_params = declared_params
            .iter()
            .any(|&t| cx.arena.mentions_any(t, &[param]));
        if in_params {
            continue;
        }
        let in_results = declared_results
            .iter()
            .any(|&t| cx.arena.mentions_any(t, &[param]));
        return Err(if in_results {
            DeductionError::ResultOnly { param }
        } else {
            DeductionError::Incomplete { param }
        });
    }

    let mut unifier = Unifier::new(bindable, prebound);
    let mut nil_positions: Vec<(TypeId, usize)> = Vec::new();

    for (index, (&declared, arg)) in declared_params.iter().zip(args).enumerate() {
        let actual = match *arg {
            ArgType::Typed(t) | ArgType::Untyped(t) => t,
            ArgType::Nil => {
                nil_positions.push((declared, index));
                continue;
            }
        };
        unifier
            .unify(cx, declared, actual)
            .map_err(|err| match err {
                UnifyError::Conflict {
                    param,
                    first,
                    second,
                } => DeductionError::Conflict {
                    param,
                    first,
                    second,
                    arg: index,
                },
                UnifyError::Shape { expected, found } => DeductionError::Shape {
                    expected,
                    found,
                    arg: index,
                },
            })?;
    }

    for &param in bindable {
        if unifier.bindings().contains_key(&param) {
            continue;
        }
        if let Some(&(_, arg)) = nil_positions
            .iter()
            .find(|(declared, _)| cx.arena.mentions_any(*declared, &[param]))
        {
            return Err(DeductionError::FromNil { param, arg });
        }
        return Err(DeductionError::Incomplete { param });
    }

    let bindings = unifier.into_bindings();
    tracing::debug!(bound = bindings.len(), "deduced type arguments");
    Ok(bindings)
}

#[cfg(test)]
mod tests;
