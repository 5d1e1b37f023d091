//! Call lowering and semantic→ABI argument mapping.
//!
//! Arguments are evaluated strictly left to right, each dispatched on the
//! kind of the ABI slot implementing its semantic parameter: direct slots
//! take operands; byval slots take a freshly initialized synthetic local
//! whose address the callee receives as its private copy. Aggregate
//! returns go through an sret destination: the caller's hint when there
//! is one, a synthetic local otherwise.

use sablec_hir::ExprId;
use sablec_util::DefId;

use crate::error::{LowerError, LowerErrorKind};
use crate::lower::{FunctionLowering, LowerResult};
use crate::mir::{
    AbiParamKind, Operand, Place, ReturnDesc, Statement, Terminator, ValueSource,
};

impl FunctionLowering<'_> {
    pub(crate) fn lower_call(
        &mut self,
        callee: DefId,
        arg_exprs: &[ExprId],
        dest: Option<&Place>,
    ) -> Result<LowerResult, LowerError> {
        if !self.builder.is_reachable() {
            return Ok(self.dead_result());
        }
        let target = *self.targets.get(&callee).ok_or_else(|| {
            LowerError::new(LowerErrorKind::UnresolvedTarget(format!(
                "no callable registered for definition {}",
                callee.0
            )))
        })?;
        let sig = self.module.target_sig(target).clone();

        if arg_exprs.len() != sig.params.len() {
            return Err(LowerError::new(LowerErrorKind::InvariantViolation(format!(
                "call to `{}` passes {} arguments for {} parameters",
                self.module.target_name(target),
                arg_exprs.len(),
                sig.params.len()
            ))));
        }

        // Slots are filled per semantic parameter; every slot must be set
        // by the time the call is emitted.
        let mut args: Vec<Option<ValueSource>> = vec![None; sig.params.len()];
        for (i, &arg) in arg_exprs.iter().enumerate() {
            let (_, abi) = sig.abi_param_for(i).ok_or_else(|| {
                LowerError::new(LowerErrorKind::SigInvariant(format!(
                    "parameter {i} of `{}` has no ABI slot",
                    self.module.target_name(target)
                )))
            })?;
            match abi.kind {
                AbiParamKind::Direct => {
                    let op = self.lower_node(arg, None)?.as_operand(self)?;
                    args[i] = Some(ValueSource::Operand(op));
                }
                AbiParamKind::ByValCallerCopy => {
                    // Initialize the private copy in place; no whole-value
                    // load of the aggregate is emitted.
                    let local = self.builder.new_local(sig.params[i].ty, None);
                    let place = Place::local(local);
                    let result = self.lower_node(arg, Some(&place))?;
                    result.write_to_dest(self, &place)?;
                    args[i] = Some(ValueSource::Place(place));
                }
                AbiParamKind::SRet => {
                    return Err(LowerError::new(LowerErrorKind::SigInvariant(format!(
                        "sret slot of `{}` is linked to parameter {i}",
                        self.module.target_name(target)
                    ))));
                }
            }
        }
        let args: Vec<ValueSource> = args
            .into_iter()
            .map(|slot| {
                slot.ok_or_else(|| {
                    LowerError::new(LowerErrorKind::InvariantViolation(
                        "argument slot left unset".into(),
                    ))
                })
            })
            .collect::<Result<_, _>>()?;

        match sig.return_desc {
            ReturnDesc::Direct(ret_ty) => {
                if !self.builder.is_reachable() {
                    return Ok(self.dead_result());
                }
                let result = self.builder.new_temp(ret_ty);
                self.builder.push(Statement::Call {
                    dest: Some(result),
                    target,
                    args,
                    sret_dest: None,
                });
                Ok(LowerResult::Operand(Operand::Temp(result)))
            }
            ReturnDesc::Void => {
                self.builder.push(Statement::Call {
                    dest: None,
                    target,
                    args,
                    sret_dest: None,
                });
                Ok(LowerResult::Operand(self.unit_operand()))
            }
            ReturnDesc::Never => {
                // The call never returns; the path ends here.
                self.builder.push(Statement::Call {
                    dest: None,
                    target,
                    args,
                    sret_dest: None,
                });
                self.builder.terminate(Terminator::Unreachable);
                Ok(self.dead_result())
            }
            ReturnDesc::IndirectSret { ty, .. } => match dest {
                Some(dest) => {
                    self.builder.push(Statement::Call {
                        dest: None,
                        target,
                        args,
                        sret_dest: Some(dest.clone()),
                    });
                    Ok(LowerResult::Written)
                }
                None => {
                    let local = self.builder.new_local(ty, None);
                    let place = Place::local(local);
                    self.builder.push(Statement::Call {
                        dest: None,
                        target,
                        args,
                        sret_dest: Some(place.clone()),
                    });
                    Ok(LowerResult::Place(place))
                }
            },
        }
    }
}
