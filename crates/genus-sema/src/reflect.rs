//! Lowering of checked types to runtime descriptors.
//!
//! Declarations are registered with the descriptor registry on first use.
//! A declaration's id is reserved before its shape is lowered, so named
//! types that refer to themselves through pointers or slices work.
//!
//! Each declaration is announced under a source key built from its checked
//! form. A declaration the registry has already seen under that key (an
//! earlier compile, another unit) reuses the existing id and is not lowered
//! again. Units sharing a registry must agree on what each declaration name
//! means.

use genus_identity::{DeclId, TypeParamId};
use genus_runtime::{Declared, Desc, DescriptorRegistry, RtDeclId, RtParam, RuntimeDecl, RuntimeError, Shape};
use rustc_hash::FxHashMap;
use thiserror::Error;

use crate::analyzer::AnalysisOutput;
use crate::entity_registry::DeclKind;
use crate::type_arena::{SemaType, TypeId};

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum BridgeError {
    #[error(transparent)]
    Runtime(#[from] RuntimeError),

    #[error("type parameter {name} is not bound here")]
    UnboundParameter { name: String },

    #[error("{ty} has no runtime representation")]
    NotRepresentable { ty: String },
}

pub struct DescriptorBridge<'r> {
    registry: &'r DescriptorRegistry,
    decls: FxHashMap<DeclId, RtDeclId>,
}

impl<'r> DescriptorBridge<'r> {
    pub fn new(registry: &'r DescriptorRegistry) -> Self {
        Self {
            registry,
            decls: FxHashMap::default(),
        }
    }

    pub fn registry(&self) -> &'r DescriptorRegistry {
        self.registry
    }

    /// Runtime id of a named type declaration, registering it on first use.
    pub fn register(&mut self, out: &AnalysisOutput, decl: DeclId) -> Result<RtDeclId, BridgeError> {
        if let Some(&id) = self.decls.get(&decl) {
            return Ok(id);
        }
        let info = out.entities.get(decl);
        debug_assert_eq!(info.kind, DeclKind::Type);
        let id = match self.registry.declare(out.decl_name(decl), &source_key(out, decl)) {
            Declared::Existing(id) => {
                tracing::trace!(decl = out.decl_name(decl), rt = id.index(), "runtime declaration reused");
                self.decls.insert(decl, id);
                return Ok(id);
            }
            Declared::New(id) => id,
        };
        self.decls.insert(decl, id);

        let env = out.scopes.all_params(info.scope);
        let mut params = Vec::with_capacity(env.len());
        for &p in &env {
            let param = out.scopes.param(p);
            let constraint = match param.constraint {
                Some(c) => Some(self.shape_of(out, c, &env)?),
                None => None,
            };
            params.push(RtParam {
                name: out.interner.resolve(param.name).to_string(),
                constraint,
            });
        }
        let underlying = self.shape_of(out, info.shape, &env)?;
        let mut methods = Vec::with_capacity(info.methods.len());
        for &m in &info.methods {
            let method = out.entities.get(m);
            methods.push((
                out.interner.resolve(method.name).to_string(),
                self.shape_of(out, method.shape, &env)?,
            ));
        }
        let canonical = self.registry.define_decl(
            id,
            RuntimeDecl {
                name: out.decl_name(decl).to_string(),
                params,
                underlying,
                methods,
            },
        )?;
        self.decls.insert(decl, canonical);
        tracing::debug!(decl = out.decl_name(decl), rt = canonical.index(), "registered runtime declaration");
        Ok(canonical)
    }

    /// Shape of `ty` with parameters in `env` as positional holes.
    pub fn shape_of(&mut self, out: &AnalysisOutput, ty: TypeId, env: &[TypeParamId]) -> Result<Shape, BridgeError> {
        let all = |this: &mut Self, types: &[TypeId]| -> Result<Vec<Shape>, BridgeError> {
            types.iter().map(|&t| this.shape_of(out, t, env)).collect()
        };
        Ok(match out.arena.get(ty) {
            SemaType::Primitive(p) => Shape::Basic(*p),
            SemaType::Pointer(e) => Shape::pointer(self.shape_of(out, *e, env)?),
            SemaType::Slice(e) => Shape::slice(self.shape_of(out, *e, env)?),
            SemaType::Array { elem, len } => Shape::Array(Box::new(self.shape_of(out, *elem, env)?), *len),
            SemaType::Map { key, value } => Shape::Map(
                Box::new(self.shape_of(out, *key, env)?),
                Box::new(self.shape_of(out, *value, env)?),
            ),
            SemaType::Chan { elem, dir } => Shape::Chan(Box::new(self.shape_of(out, *elem, env)?), *dir),
            SemaType::Function { params, results } => Shape::Func {
                params: all(self, params)?,
                results: all(self, results)?,
            },
            SemaType::Struct(fields) => {
                let mut members = Vec::with_capacity(fields.len());
                for f in fields {
                    members.push((out.interner.resolve(f.name).to_string(), self.shape_of(out, f.ty, env)?));
                }
                Shape::Struct(members)
            }
            SemaType::Interface(methods) => {
                let mut members = Vec::with_capacity(methods.len());
                for m in methods {
                    members.push((
                        out.interner.resolve(m.name).to_string(),
                        self.shape_of(out, m.signature, env)?,
                    ));
                }
                Shape::Interface(members)
            }
            SemaType::Named { decl, type_args } => {
                let decl = self.register(out, *decl)?;
                Shape::Named {
                    decl,
                    args: all(self, type_args)?,
                }
            }
            SemaType::TypeParam(p) => match env.iter().position(|e| e == p) {
                Some(index) => Shape::Param(index),
                None => {
                    return Err(BridgeError::UnboundParameter {
                        name: out.interner.resolve(out.scopes.param(*p).name).to_string(),
                    });
                }
            },
            SemaType::Invalid | SemaType::Void | SemaType::Tuple(_) => {
                return Err(BridgeError::NotRepresentable { ty: out.display(ty) });
            }
        })
    }

    /// Descriptor of `ty` with `params[i]` bound to `env[i]`: the
    /// materialized-descriptor calling convention.
    pub fn descriptor(
        &mut self,
        out: &AnalysisOutput,
        ty: TypeId,
        params: &[TypeParamId],
        env: &[Desc],
    ) -> Result<Desc, BridgeError> {
        let shape = self.shape_of(out, ty, params)?;
        Ok(self.registry.materialize(&shape, env)?)
    }

    /// Descriptor of a type that mentions no parameter.
    pub fn concrete(&mut self, out: &AnalysisOutput, ty: TypeId) -> Result<Desc, BridgeError> {
        self.descriptor(out, ty, &[], &[])
    }
}

/// Key identifying a type declaration by its checked form: name, parameters
/// with constraints, underlying type and method signatures.
fn source_key(out: &AnalysisOutput, decl: DeclId) -> String {
    use std::fmt::Write;

    let info = out.entities.get(decl);
    let mut key = out.decl_name(decl).to_string();
    key.push('[');
    for (i, &p) in out.scopes.all_params(info.scope).iter().enumerate() {
        let param = out.scopes.param(p);
        if i > 0 {
            key.push_str(", ");
        }
        key.push_str(out.interner.resolve(param.name));
        if let Some(c) = param.constraint {
            let _ = write!(key, " {}", out.display(c));
        }
    }
    let _ = write!(key, "] {}", out.display(info.shape));
    for &m in &info.methods {
        let method = out.entities.get(m);
        let _ = write!(key, "; {} {}", out.interner.resolve(method.name), out.display(method.shape));
    }
    key
}
