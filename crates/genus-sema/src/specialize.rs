//! Code shapes for parametric function bodies.
//!
//! Every function with a body gets a general form: it receives one runtime
//! descriptor per type parameter (outermost scope first) and builds the
//! descriptors its coercions, assertions and switches need from them. Call
//! sites whose type arguments are all concrete may instead target a
//! specialized copy of the callee, in which every check whose answer
//! depends only on the type arguments is folded to a constant. Folding runs
//! the same runtime routines the general form calls, so both forms agree.
//!
//! Specialization is never required. Callees without an available body,
//! function values, and call sites past `max_specializations` use the
//! general form.

use std::collections::VecDeque;

use genus_frontend::NodeId;
use genus_identity::{DeclId, TypeParamId};
use genus_runtime::{self as runtime, Desc, DescriptorRegistry, Literal, RuntimeError, Shape, Value};
use rustc_hash::FxHashSet;
use tracing::{debug, trace, warn};

use crate::analyzer::{AnalysisOutput, TypeOp};
use crate::compatibility::CoercionSource;
use crate::entity_registry::DeclKind;
use crate::generic::{MonomorphCacheBase, MonomorphKey};
use crate::options::AnalyzerOptions;
use crate::reflect::{BridgeError, DescriptorBridge};
use crate::type_arena::{Substitution, TypeId, TypeIdVec};

/// Target of a runtime type check.
#[derive(Debug, Clone)]
pub enum TypeCheck {
    /// Answer known at compile time.
    Folded(bool),
    /// Target known at compile time, value inspected at runtime.
    Concrete(Desc),
    /// Target built from the body's descriptor parameters.
    Materialized(Shape),
}

impl TypeCheck {
    fn target(&self, env: &[Desc], registry: &DescriptorRegistry) -> Result<Option<Desc>, RuntimeError> {
        match self {
            TypeCheck::Folded(_) => Ok(None),
            TypeCheck::Concrete(desc) => Ok(Some(*desc)),
            TypeCheck::Materialized(shape) => registry.materialize(shape, env).map(Some),
        }
    }
}

/// Operand of a coercion.
#[derive(Debug, Clone)]
pub enum CheckInput {
    /// A typed value whose static type has this shape.
    Value(Shape),
    Literal(Literal),
}

#[derive(Debug, Clone)]
pub enum CallTarget {
    /// A body with no descriptor parameters: a non-parametric function or
    /// a specialized copy.
    Direct { symbol: String },
    /// The general form, passed one descriptor per type parameter.
    General { decl: DeclId, descriptors: Vec<Shape> },
}

#[derive(Debug, Clone)]
pub enum CompiledOp {
    Coerce {
        node: NodeId,
        input: CheckInput,
        target: TypeCheck,
    },
    Assert {
        node: NodeId,
        input: Shape,
        target: TypeCheck,
        two_result: bool,
    },
    Switch {
        node: NodeId,
        input: Shape,
        arms: Vec<(usize, TypeCheck)>,
    },
    Call {
        node: NodeId,
        target: CallTarget,
    },
    FuncValue {
        node: NodeId,
        target: CallTarget,
    },
}

/// Result of one check in [`CompiledBody::evaluate`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CheckOutcome {
    Holds(bool),
    /// Case index of the first matching switch arm.
    Arm(Option<usize>),
}

#[derive(Debug, Clone)]
pub struct CompiledBody {
    pub decl: DeclId,
    pub symbol: String,
    /// Bound type arguments; empty for a general form.
    pub type_args: Vec<Desc>,
    /// Descriptors the body receives at runtime.
    pub descriptor_params: usize,
    pub ops: Vec<CompiledOp>,
}

impl CompiledBody {
    pub fn is_specialized(&self) -> bool {
        !self.type_args.is_empty()
    }

    pub fn call_targets(&self) -> impl Iterator<Item = (NodeId, &CallTarget)> {
        self.ops.iter().filter_map(|op| match op {
            CompiledOp::Call { node, target } | CompiledOp::FuncValue { node, target } => {
                Some((*node, target))
            }
            _ => None,
        })
    }

    /// Run every type check with `env` as the descriptor arguments and the
    /// zero value of each operand's static type, so an interface operand is
    /// a nil interface value.
    pub fn evaluate(
        &self,
        env: &[Desc],
        registry: &DescriptorRegistry,
    ) -> Result<Vec<(NodeId, CheckOutcome)>, RuntimeError> {
        self.evaluate_on(env, registry, &|_| None)
    }

    /// Like [`evaluate`](Self::evaluate), with the operand of a check node
    /// taken from `operands` when it has one. An operand of interface static
    /// type carries its dynamic type as descriptor; any other must have its
    /// static type.
    pub fn evaluate_on(
        &self,
        env: &[Desc],
        registry: &DescriptorRegistry,
        operands: &dyn Fn(NodeId) -> Option<Value>,
    ) -> Result<Vec<(NodeId, CheckOutcome)>, RuntimeError> {
        let operand = |node: &NodeId, shape: &Shape| -> Result<(Desc, Value), RuntimeError> {
            let source = registry.materialize(shape, env)?;
            let value = operands(*node).unwrap_or_else(|| Value::zero(source));
            Ok((source, value))
        };
        let mut outcomes = Vec::new();
        for op in &self.ops {
            match op {
                CompiledOp::Coerce {
                    node,
                    input,
                    target,
                } => {
                    let holds = match (target, target.target(env, registry)?) {
                        (TypeCheck::Folded(b), _) => *b,
                        (_, Some(target)) => match input {
                            CheckInput::Value(shape) => {
                                let (source, value) = operand(node, shape)?;
                                runtime::coerce(&value, source, target).is_ok()
                            }
                            CheckInput::Literal(lit) => {
                                runtime::coerce_literal(lit, target, registry).is_ok()
                            }
                        },
                        (_, None) => false,
                    };
                    outcomes.push((*node, CheckOutcome::Holds(holds)));
                }
                CompiledOp::Assert {
                    node,
                    input,
                    target,
                    ..
                } => {
                    let holds = match (target, target.target(env, registry)?) {
                        (TypeCheck::Folded(b), _) => *b,
                        (_, Some(target)) => {
                            let (_, value) = operand(node, input)?;
                            runtime::assert_type(&value, target).is_ok()
                        }
                        (_, None) => false,
                    };
                    outcomes.push((*node, CheckOutcome::Holds(holds)));
                }
                CompiledOp::Switch { node, input, arms } => {
                    let (_, value) = operand(node, input)?;
                    let mut hit = None;
                    for (case, check) in arms {
                        let holds = match (check, check.target(env, registry)?) {
                            (TypeCheck::Folded(b), _) => *b,
                            (_, Some(target)) => runtime::assert_type(&value, target).is_ok(),
                            (_, None) => false,
                        };
                        if holds {
                            hit = Some(*case);
                            break;
                        }
                    }
                    outcomes.push((*node, CheckOutcome::Arm(hit)));
                }
                CompiledOp::Call { .. } | CompiledOp::FuncValue { .. } => {}
            }
        }
        Ok(outcomes)
    }
}

pub type SpecializationCache = MonomorphCacheBase<MonomorphKey, CompiledBody>;

/// Compiled bodies of one unit.
#[derive(Debug)]
pub struct Specialization {
    /// General forms in declaration order.
    pub general: Vec<CompiledBody>,
    /// Specialized copies in the order they were first requested.
    pub specialized: Vec<CompiledBody>,
    /// Call sites that wanted a specialization past the limit.
    pub fallbacks: usize,
    pub cache_hit_rate: f64,
}

impl Specialization {
    pub fn general_form(&self, decl: DeclId) -> Option<&CompiledBody> {
        self.general.iter().find(|b| b.decl == decl)
    }

    pub fn find(&self, symbol: &str) -> Option<&CompiledBody> {
        self.general
            .iter()
            .chain(self.specialized.iter())
            .find(|b| b.symbol == symbol)
    }
}

/// Compile every body in `out` and the specializations its call sites ask
/// for.
pub fn specialize(
    out: &mut AnalysisOutput,
    registry: &DescriptorRegistry,
    options: AnalyzerOptions,
) -> Result<Specialization, BridgeError> {
    let mut specializer = Specializer::new(out, registry, options);
    specializer.run()?;
    Ok(specializer.finish())
}

pub struct Specializer<'a, 'r> {
    out: &'a mut AnalysisOutput,
    bridge: DescriptorBridge<'r>,
    options: AnalyzerOptions,
    cache: SpecializationCache,
    queued: FxHashSet<MonomorphKey>,
    worklist: VecDeque<MonomorphKey>,
    general: Vec<CompiledBody>,
    fallbacks: usize,
}

impl<'a, 'r> Specializer<'a, 'r> {
    pub fn new(out: &'a mut AnalysisOutput, registry: &'r DescriptorRegistry, options: AnalyzerOptions) -> Self {
        Self {
            out,
            bridge: DescriptorBridge::new(registry),
            options,
            cache: SpecializationCache::new(),
            queued: FxHashSet::default(),
            worklist: VecDeque::new(),
            general: Vec::new(),
            fallbacks: 0,
        }
    }

    /// General forms for every body, then the transitive closure of the
    /// specializations they request.
    pub fn run(&mut self) -> Result<(), BridgeError> {
        let decls: Vec<DeclId> = self.out.functions.iter().map(|f| f.decl).collect();
        for decl in decls {
            let body = self.compile_general(decl)?;
            self.general.push(body);
        }
        self.drain()?;
        debug!(
            general = self.general.len(),
            specialized = self.cache.len(),
            fallbacks = self.fallbacks,
            "specialization done"
        );
        Ok(())
    }

    pub fn finish(self) -> Specialization {
        let cache_hit_rate = self.cache.hit_rate();
        let specialized = self.cache.instances().map(|(_, body)| body.clone()).collect();
        Specialization {
            general: self.general,
            specialized,
            fallbacks: self.fallbacks,
            cache_hit_rate,
        }
    }

    pub fn cache(&self) -> &SpecializationCache {
        &self.cache
    }

    /// Specialized copy of `decl` for concrete `type_args`, if one can be
    /// produced. `None` means callers use the general form.
    pub fn try_specialize(&mut self, decl: DeclId, type_args: &[TypeId]) -> Option<CompiledBody> {
        if !self.can_specialize(decl, type_args) {
            return None;
        }
        let key = MonomorphKey::new(decl, TypeIdVec::from_slice(type_args));
        if let Some(body) = self.cache.get(&key) {
            return Some(body.clone());
        }
        if self.cache.len() + self.worklist.len() >= self.options.max_specializations {
            self.note_fallback(decl);
            return None;
        }
        let result = self.compile_specialized(&key).and_then(|body| {
            self.cache.insert(key, body.clone());
            self.drain()?;
            Ok(body)
        });
        match result {
            Ok(body) => Some(body),
            Err(error) => {
                warn!(decl = self.out.decl_name(decl), %error, "specialization failed");
                None
            }
        }
    }

    fn can_specialize(&self, decl: DeclId, type_args: &[TypeId]) -> bool {
        let info = self.out.entities.get(decl);
        self.options.specialize
            && info.has_body
            && !type_args.is_empty()
            && type_args.len() == self.out.scopes.all_params(info.scope).len()
            && type_args.iter().all(|&t| !self.out.arena.is_parametric(t))
    }

    fn note_fallback(&mut self, decl: DeclId) {
        self.fallbacks += 1;
        warn!(
            decl = self.out.decl_name(decl),
            limit = self.options.max_specializations,
            "specialization limit reached, using general form"
        );
    }

    fn drain(&mut self) -> Result<(), BridgeError> {
        while let Some(key) = self.worklist.pop_front() {
            let body = self.compile_specialized(&key)?;
            self.queued.remove(&key);
            self.cache.insert(key, body);
        }
        Ok(())
    }

    fn params_of(&self, decl: DeclId) -> Vec<TypeParamId> {
        self.out.scopes.all_params(self.out.entities.get(decl).scope)
    }

    fn ops_of(&self, decl: DeclId) -> Vec<TypeOp> {
        self.out.function(decl).map(|f| f.ops.clone()).unwrap_or_default()
    }

    fn compile_general(&mut self, decl: DeclId) -> Result<CompiledBody, BridgeError> {
        let env = self.params_of(decl);
        let ops = self.ops_of(decl);
        let ops = self.lower_ops(&ops, None, &env)?;
        Ok(CompiledBody {
            decl,
            symbol: self.symbol(decl, &[]),
            type_args: Vec::new(),
            descriptor_params: env.len(),
            ops,
        })
    }

    fn compile_specialized(&mut self, key: &MonomorphKey) -> Result<CompiledBody, BridgeError> {
        let subs = self.out.cx().decl_subs(key.decl, &key.type_args);
        let ops = self.ops_of(key.decl);
        let ops = self.lower_ops(&ops, Some(&subs), &[])?;
        let mut type_args = Vec::with_capacity(key.type_args.len());
        for &arg in &key.type_args {
            type_args.push(self.bridge.concrete(self.out, arg)?);
        }
        let symbol = self.symbol(key.decl, &key.type_args);
        debug!(%symbol, "specialized");
        Ok(CompiledBody {
            decl: key.decl,
            symbol,
            type_args,
            descriptor_params: 0,
            ops,
        })
    }

    /// `subs` is present for specialized bodies; every type is then concrete
    /// after substitution and checks fold.
    fn lower_ops(
        &mut self,
        ops: &[TypeOp],
        subs: Option<&Substitution>,
        env: &[TypeParamId],
    ) -> Result<Vec<CompiledOp>, BridgeError> {
        let registry = self.bridge.registry();
        let mut lowered = Vec::with_capacity(ops.len());
        for op in ops {
            let compiled = match op {
                TypeOp::Coerce {
                    node,
                    target,
                    source,
                } => {
                    let target = self.apply(*target, subs);
                    let input = match source {
                        CoercionSource::Typed(ty) => {
                            let ty = self.apply(*ty, subs);
                            CheckInput::Value(self.bridge.shape_of(self.out, ty, env)?)
                        }
                        CoercionSource::Untyped(lit) => CheckInput::Literal(lit.clone()),
                    };
                    let target = if subs.is_some() {
                        let target = self.bridge.concrete(self.out, target)?;
                        TypeCheck::Folded(match &input {
                            CheckInput::Value(shape) => {
                                runtime::coercible(registry.materialize(shape, &[])?, target)
                            }
                            CheckInput::Literal(lit) => {
                                runtime::coerce_literal(lit, target, registry).is_ok()
                            }
                        })
                    } else {
                        self.check_for(target, env)?
                    };
                    CompiledOp::Coerce {
                        node: *node,
                        input,
                        target,
                    }
                }
                TypeOp::Assert {
                    node,
                    target,
                    source,
                    two_result,
                } => {
                    let source = self.apply(*source, subs);
                    let target = self.apply(*target, subs);
                    let input = self.bridge.shape_of(self.out, source, env)?;
                    let target = if subs.is_some() {
                        self.fold_assertion(&input, target)?
                    } else {
                        self.check_for(target, env)?
                    };
                    CompiledOp::Assert {
                        node: *node,
                        input,
                        target,
                        two_result: *two_result,
                    }
                }
                TypeOp::Switch {
                    node,
                    scrutinee,
                    arms,
                } => {
                    let scrutinee = self.apply(*scrutinee, subs);
                    let input = self.bridge.shape_of(self.out, scrutinee, env)?;
                    let mut lowered_arms = Vec::with_capacity(arms.len());
                    for &(case, ty) in arms {
                        let ty = self.apply(ty, subs);
                        let check = if subs.is_some() {
                            self.fold_assertion(&input, ty)?
                        } else {
                            self.check_for(ty, env)?
                        };
                        lowered_arms.push((case, check));
                    }
                    CompiledOp::Switch {
                        node: *node,
                        input,
                        arms: lowered_arms,
                    }
                }
                TypeOp::Call {
                    node,
                    callee,
                    type_args,
                } => {
                    let type_args = self.apply_all(type_args, subs);
                    CompiledOp::Call {
                        node: *node,
                        target: self.call_target(*callee, &type_args, env)?,
                    }
                }
                TypeOp::FuncValue {
                    node,
                    decl,
                    type_args,
                } => {
                    let type_args = self.apply_all(type_args, subs);
                    let target = if type_args.is_empty() {
                        CallTarget::Direct {
                            symbol: self.symbol(*decl, &[]),
                        }
                    } else {
                        self.general_target(*decl, &type_args, env)?
                    };
                    CompiledOp::FuncValue {
                        node: *node,
                        target,
                    }
                }
            };
            lowered.push(compiled);
        }
        Ok(lowered)
    }

    fn apply(&mut self, ty: TypeId, subs: Option<&Substitution>) -> TypeId {
        match subs {
            Some(subs) => self.out.arena.substitute(ty, subs),
            None => ty,
        }
    }

    fn apply_all(&mut self, types: &[TypeId], subs: Option<&Substitution>) -> TypeIdVec {
        match subs {
            Some(subs) => self.out.arena.substitute_all(types, subs),
            None => TypeIdVec::from_slice(types),
        }
    }

    fn check_for(&mut self, target: TypeId, env: &[TypeParamId]) -> Result<TypeCheck, BridgeError> {
        if self.out.arena.is_parametric(target) {
            Ok(TypeCheck::Materialized(self.bridge.shape_of(self.out, target, env)?))
        } else {
            Ok(TypeCheck::Concrete(self.bridge.concrete(self.out, target)?))
        }
    }

    /// An operand of non-interface type has its static type as dynamic
    /// type, so the assertion is decided here. Interface operands keep a
    /// runtime check.
    fn fold_assertion(&mut self, input: &Shape, target: TypeId) -> Result<TypeCheck, BridgeError> {
        let registry = self.bridge.registry();
        let source = registry.materialize(input, &[])?;
        let target = self.bridge.concrete(self.out, target)?;
        if source.is_interface() {
            return Ok(TypeCheck::Concrete(target));
        }
        Ok(TypeCheck::Folded(
            runtime::assert_type(&Value::zero(source), target).is_ok(),
        ))
    }

    fn call_target(
        &mut self,
        callee: DeclId,
        type_args: &[TypeId],
        env: &[TypeParamId],
    ) -> Result<CallTarget, BridgeError> {
        if type_args.is_empty() {
            return Ok(CallTarget::Direct {
                symbol: self.symbol(callee, &[]),
            });
        }
        if self.can_specialize(callee, type_args) {
            let key = MonomorphKey::new(callee, TypeIdVec::from_slice(type_args));
            if self.cache.get(&key).is_some() || self.queued.contains(&key) {
                let symbol = self.symbol(callee, type_args);
                trace!(%symbol, "reusing specialization");
                return Ok(CallTarget::Direct { symbol });
            }
            if self.cache.len() + self.worklist.len() < self.options.max_specializations {
                self.queued.insert(key.clone());
                self.worklist.push_back(key);
                return Ok(CallTarget::Direct {
                    symbol: self.symbol(callee, type_args),
                });
            }
            self.note_fallback(callee);
        }
        self.general_target(callee, type_args, env)
    }

    fn general_target(
        &mut self,
        decl: DeclId,
        type_args: &[TypeId],
        env: &[TypeParamId],
    ) -> Result<CallTarget, BridgeError> {
        let mut descriptors = Vec::with_capacity(type_args.len());
        for &arg in type_args {
            descriptors.push(self.bridge.shape_of(self.out, arg, env)?);
        }
        Ok(CallTarget::General { decl, descriptors })
    }

    /// `Max`, `Max[int]`, `List.Len`, `List[int].Len`.
    fn symbol(&self, decl: DeclId, type_args: &[TypeId]) -> String {
        let args = if type_args.is_empty() {
            String::new()
        } else {
            let names: Vec<String> = type_args.iter().map(|&t| self.out.display(t)).collect();
            format!("[{}]", names.join(", "))
        };
        let info = self.out.entities.get(decl);
        match info.kind {
            DeclKind::Method { receiver } => format!(
                "{}{}.{}",
                self.out.decl_name(receiver),
                args,
                self.out.decl_name(decl)
            ),
            _ => format!("{}{}", self.out.decl_name(decl), args),
        }
    }
}
