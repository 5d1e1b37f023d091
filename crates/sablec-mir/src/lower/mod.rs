//! HIR → MIR lowering.
//!
//! The whole subsystem is a single-threaded batch transformation: collect
//! callables and signatures first, then lower each body in destination-
//! passing style. Expressions are lowered through one dispatcher,
//! [`FunctionLowering::lower_node`], which takes an optional destination
//! place and answers with a [`LowerResult`]; the three adapters on the
//! result reconcile whatever the node produced with whatever the caller
//! needs.

pub mod call;
pub mod constant;
pub mod control;
pub mod expr;
pub mod place;

use sablec_hir::consteval::{ConstEvaluator, ConstValue};
use sablec_hir::hir::{Body, ConstId, ExprId, ExprKind, HirLocalId, Program};
use sablec_hir::types::{TypeId, TypeInterner};
use indexmap::IndexMap;
use sablec_util::{DefId, Idx, IndexVec, Symbol};

use crate::builder::FunctionBuilder;
use crate::collect::{collect, Collection};
use crate::error::{LowerError, LowerErrorKind};
use crate::mir::{
    AliasTarget, BasicBlockId, CallTarget, Constant, FunctionId, LocalId, MirFunction,
    MirModule, Operand, Place, RValue, ReturnDesc, TempId, Terminator, ValueSource,
};
use crate::validate::validate_function;

/// What lowering an expression produced.
#[derive(Debug, Clone)]
pub enum LowerResult {
    /// The expression produced a value.
    Operand(Operand),
    /// The expression denotes an existing addressable location.
    Place(Place),
    /// The value was materialized directly into the destination hint.
    Written,
}

impl LowerResult {
    /// Coerce to an SSA value, loading from memory if needed.
    pub fn as_operand(self, fx: &mut FunctionLowering<'_>) -> Result<Operand, LowerError> {
        match self {
            LowerResult::Operand(op) => Ok(op),
            LowerResult::Place(place) => {
                let ty = fx.place_ty(&place)?;
                let temp = fx.builder.load(place, ty);
                Ok(Operand::Temp(temp))
            }
            LowerResult::Written => Err(LowerError::new(LowerErrorKind::InvariantViolation(
                "value was already written to its destination and cannot be re-read".into(),
            ))),
        }
    }

    /// Coerce to a memory location, spilling an operand into a synthetic
    /// local if needed.
    pub fn as_place(self, fx: &mut FunctionLowering<'_>) -> Result<Place, LowerError> {
        match self {
            LowerResult::Place(place) => Ok(place),
            LowerResult::Operand(op) => {
                let ty = fx.operand_ty(&op);
                let local = fx.builder.new_local(ty, None);
                let place = Place::local(local);
                fx.builder.assign(place.clone(), ValueSource::Operand(op));
                Ok(place)
            }
            LowerResult::Written => Err(LowerError::new(LowerErrorKind::InvariantViolation(
                "value was already written to its destination and has no place".into(),
            ))),
        }
    }

    /// Make sure the value ends up in `dest`. `Written` means the node
    /// already did; a place equal to `dest` needs no copy (this is what
    /// makes the NRVO terminal expression copy-free).
    pub fn write_to_dest(self, fx: &mut FunctionLowering<'_>, dest: &Place) -> Result<(), LowerError> {
        match self {
            LowerResult::Written => Ok(()),
            LowerResult::Operand(op) => {
                fx.builder.assign(dest.clone(), ValueSource::Operand(op));
                Ok(())
            }
            LowerResult::Place(place) => {
                if place == *dest {
                    return Ok(());
                }
                fx.builder.assign(dest.clone(), ValueSource::Place(place));
                Ok(())
            }
        }
    }
}

/// Context tracked for each enclosing loop. `key` is the loop's own HIR id,
/// which is what `break`/`continue` nodes carry as their target.
pub(crate) struct LoopContext {
    pub key: ExprId,
    pub continue_block: BasicBlockId,
    pub break_block: BasicBlockId,
    /// `Some` iff the loop carries a value through `break expr`.
    pub break_ty: Option<TypeId>,
    pub break_incoming: Vec<(BasicBlockId, TempId)>,
    pub break_reached: bool,
}

/// Per-function lowering state. Owns the builder; borrows the session.
pub struct FunctionLowering<'a> {
    pub(crate) program: &'a Program,
    pub(crate) body: &'a Body,
    pub(crate) tys: &'a mut TypeInterner,
    pub(crate) module: &'a MirModule,
    pub(crate) targets: &'a IndexMap<DefId, CallTarget>,
    pub(crate) const_values: &'a IndexVec<ConstId, ConstValue>,
    pub(crate) builder: FunctionBuilder,
    pub(crate) local_map: IndexVec<HirLocalId, LocalId>,
    pub(crate) loop_stack: Vec<LoopContext>,
    /// The SRET return destination, when the function returns indirectly.
    pub(crate) return_place: Option<Place>,
    pub(crate) unit_ty: TypeId,
    pub(crate) bool_ty: TypeId,
    pub(crate) usize_ty: TypeId,
}

impl FunctionLowering<'_> {
    pub(crate) fn unit_operand(&self) -> Operand {
        Operand::Const(Constant::unit(self.unit_ty))
    }

    /// Result for expressions lowered on an unreachable path; nothing that
    /// consumes it will emit anything.
    pub(crate) fn dead_result(&self) -> LowerResult {
        LowerResult::Operand(self.unit_operand())
    }

    /// Type of an operand. On unreachable paths operands may carry the
    /// sentinel temp; their type is irrelevant because nothing consuming
    /// them emits anything, so `unit` is answered.
    pub(crate) fn operand_ty(&self, op: &Operand) -> TypeId {
        if !self.builder.is_reachable() {
            return self.unit_ty;
        }
        self.builder.func.operand_ty(op)
    }

    pub(crate) fn place_ty(&self, place: &Place) -> Result<TypeId, LowerError> {
        if !self.builder.is_reachable() {
            return Ok(self.unit_ty);
        }
        self.builder
            .func
            .place_ty(place, self.tys, &self.module.globals)
            .ok_or_else(|| {
                LowerError::new(LowerErrorKind::TypeMismatch(
                    "place projection does not type-check".into(),
                ))
            })
    }

    /// Materialize an operand as a temp (phi inputs and index projections
    /// require temps, never constants).
    pub(crate) fn as_temp(&mut self, op: Operand) -> TempId {
        match op {
            Operand::Temp(t) => t,
            Operand::Const(c) => {
                let ty = c.ty;
                self.builder.define(RValue::Const(c), ty)
            }
        }
    }
}

/// Lower a whole program. Signatures for every callable are built before
/// any body; bodies are lowered in collection order and validated. The
/// first error aborts its function; all collected errors are surfaced and
/// no partial module is returned.
pub fn lower_program(
    program: &Program,
    tys: &mut TypeInterner,
) -> Result<MirModule, Vec<LowerError>> {
    let Collection { mut module, targets, internal_order } = collect(program, tys)?;

    let mut const_values: IndexVec<ConstId, ConstValue> = IndexVec::new();
    {
        let mut errors = Vec::new();
        let mut eval = ConstEvaluator::new(program, tys);
        for id in program.consts.indices() {
            match eval.eval_const(id) {
                Ok(value) => {
                    const_values.push(value);
                }
                Err(e) => {
                    errors.push(LowerError::new(LowerErrorKind::NotImplemented(format!(
                        "constant `{}` cannot be evaluated: {e}",
                        program.consts[id].name
                    ))));
                    const_values.push(ConstValue::Unit);
                }
            }
        }
        if !errors.is_empty() {
            return Err(errors);
        }
    }

    let mut errors = Vec::new();
    for &(fid, fn_ref) in &internal_order {
        let fndef = fn_ref.resolve(program);
        match lower_function(program, tys, &module, &targets, &const_values, fid, fndef) {
            Ok(func) => module.functions[fid] = func,
            Err(e) => {
                let name = module.functions[fid].name;
                errors.push(e.in_function(name));
            }
        }
    }
    if !errors.is_empty() {
        return Err(errors);
    }

    for func in module.functions.iter() {
        errors.extend(validate_function(func, &module, tys));
    }
    if !errors.is_empty() {
        return Err(errors);
    }

    Ok(module)
}

fn lower_function(
    program: &Program,
    tys: &mut TypeInterner,
    module: &MirModule,
    targets: &IndexMap<DefId, CallTarget>,
    const_values: &IndexVec<ConstId, ConstValue>,
    fid: FunctionId,
    fndef: &sablec_hir::hir::FnDef,
) -> Result<MirFunction, LowerError> {
    let body = fndef
        .body
        .as_ref()
        .expect("internal function collected without a body");
    let placeholder = &module.functions[fid];
    let name = placeholder.name;
    let sig = placeholder.sig.clone();
    log::debug!("lowering `{name}`");

    let mut builder = FunctionBuilder::new(fid, name, sig.clone());
    let mut local_map: IndexVec<HirLocalId, LocalId> = IndexVec::new();

    // Parameter locals come first: byval params alias their ABI pointer,
    // direct params own a stack slot the prologue spills into.
    for (i, param) in sig.params.iter().enumerate() {
        let (abi_idx, abi) = sig.abi_param_for(i).ok_or_else(|| {
            LowerError::new(LowerErrorKind::SigInvariant(format!(
                "semantic parameter {i} of `{name}` has no ABI slot"
            )))
        })?;
        let local = match abi.kind {
            crate::mir::AbiParamKind::ByValCallerCopy => builder.new_alias_local(
                param.ty,
                Some(param.debug_name),
                AliasTarget::AbiParam(abi_idx),
            ),
            crate::mir::AbiParamKind::Direct => {
                builder.new_local(param.ty, Some(param.debug_name))
            }
            crate::mir::AbiParamKind::SRet => {
                return Err(LowerError::new(LowerErrorKind::SigInvariant(format!(
                    "sret slot of `{name}` is linked to a semantic parameter"
                ))))
            }
        };
        builder.func.sig.params[i].local = local;
        local_map.push(local);
    }

    // SRET functions need a return destination. With NRVO the single
    // return-typed user local becomes the slot; otherwise a synthetic
    // return-slot local aliases the sret pointer.
    let mut return_place = None;
    let mut nrvo_local = None;
    if let ReturnDesc::IndirectSret { ty, sret_index } = sig.return_desc {
        nrvo_local = find_nrvo_local(body, ty, sig.params.len());
        if nrvo_local.is_none() {
            let slot = builder.new_alias_local(
                ty,
                Some(Symbol::intern("<ret>")),
                AliasTarget::AbiParam(sret_index),
            );
            return_place = Some(Place::local(slot));
        }
    }

    for (hid, decl) in body.locals.iter_enumerated() {
        if hid.index() < sig.params.len() {
            continue;
        }
        if Some(hid) == nrvo_local {
            let sret_index = sig
                .sret_param()
                .expect("nrvo candidate implies an sret return");
            let local = builder.new_alias_local(
                decl.ty,
                Some(decl.name),
                AliasTarget::AbiParam(sret_index),
            );
            log::trace!("`{name}`: nrvo reuses `{}` as the return slot", decl.name);
            return_place = Some(Place::local(local));
            local_map.push(local);
        } else {
            local_map.push(builder.new_local(decl.ty, Some(decl.name)));
        }
    }

    let entry = builder.new_block();
    builder.func.start_block = entry;
    builder.switch_to(entry);

    let unit_ty = tys.unit();
    let bool_ty = tys.bool();
    let usize_ty = tys.usize_ty();
    let mut fx = FunctionLowering {
        program,
        body,
        tys,
        module,
        targets,
        const_values,
        builder,
        local_map,
        loop_stack: Vec::new(),
        return_place,
        unit_ty,
        bool_ty,
        usize_ty,
    };

    fx.lower_fn_tail(&sig.return_desc)?;
    Ok(fx.builder.finish())
}

impl FunctionLowering<'_> {
    /// Lower the function body and the implicit terminal return.
    fn lower_fn_tail(&mut self, return_desc: &ReturnDesc) -> Result<(), LowerError> {
        let root = self.body.root;
        match return_desc {
            ReturnDesc::Never => {
                let _ = self.lower_node(root, None)?;
                // A diverging function cannot reach the end of its body.
                self.builder.terminate(Terminator::Unreachable);
            }
            ReturnDesc::Void => {
                let _ = self.lower_node(root, None)?;
                self.builder.terminate(Terminator::Return(None));
            }
            ReturnDesc::Direct(ret_ty) => {
                let result = self.lower_node(root, None)?;
                if self.builder.is_reachable() {
                    let op = result.as_operand(self)?;
                    let op_ty = self.operand_ty(&op);
                    if op_ty != *ret_ty {
                        return Err(LowerError::new(LowerErrorKind::TypeMismatch(format!(
                            "body yields `{}` but the function returns `{}`",
                            self.tys.display_name(op_ty),
                            self.tys.display_name(*ret_ty)
                        ))));
                    }
                    self.builder.terminate(Terminator::Return(Some(op)));
                }
            }
            ReturnDesc::IndirectSret { .. } => {
                let dest = self
                    .return_place
                    .clone()
                    .expect("sret function lowered without a return place");
                let result = self.lower_node(root, Some(&dest))?;
                if self.builder.is_reachable() {
                    result.write_to_dest(self, &dest)?;
                    self.builder.terminate(Terminator::Return(None));
                }
            }
        }
        Ok(())
    }
}

/// NRVO candidate selection: exactly one non-parameter local has the
/// return type, and every `return` operand and the body's terminal
/// expression is syntactically that variable. Anything ambiguous disables
/// the optimization.
fn find_nrvo_local(body: &Body, ret_ty: TypeId, n_params: usize) -> Option<HirLocalId> {
    let mut candidates = body
        .locals
        .iter_enumerated()
        .filter(|(id, decl)| id.index() >= n_params && decl.ty == ret_ty)
        .map(|(id, _)| id);
    let candidate = candidates.next()?;
    if candidates.next().is_some() {
        return None;
    }

    let is_candidate_var = |id: ExprId| matches!(body.expr(id).kind, ExprKind::Var(v) if v == candidate);

    for expr in body.exprs.iter() {
        if let ExprKind::Return(value) = &expr.kind {
            match value {
                Some(v) if is_candidate_var(*v) => {}
                _ => return None,
            }
        }
    }

    match &body.expr(body.root).kind {
        ExprKind::Block { tail, .. } => match tail {
            Some(t) if is_candidate_var(*t) => Some(candidate),
            Some(_) => None,
            // No terminal expression: every path returns explicitly, and
            // the returns were checked above.
            None => Some(candidate),
        },
        _ if is_candidate_var(body.root) => Some(candidate),
        _ => None,
    }
}
