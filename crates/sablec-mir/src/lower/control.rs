//! Statement and control-flow lowering.
//!
//! Builds the CFG for `if`/`while`/`loop`/`break`/`continue`/`return` and
//! block statements. The builder's current block doubles as the
//! reachability state: once a terminator is emitted, everything until the
//! next `switch_to` is dead and lowers to nothing.

use sablec_hir::hir::Stmt;
use sablec_hir::types::TypeId;
use sablec_hir::ExprId;

use crate::error::{LowerError, LowerErrorKind};
use crate::lower::{FunctionLowering, LoopContext, LowerResult};
use crate::mir::{Constant, Operand, Place, ReturnDesc, Terminator};

impl FunctionLowering<'_> {
    pub(crate) fn lower_block(
        &mut self,
        stmts: &[Stmt],
        tail: Option<ExprId>,
        dest: Option<&Place>,
    ) -> Result<LowerResult, LowerError> {
        for stmt in stmts {
            match stmt {
                Stmt::Let { local, init } => {
                    if let Some(init) = init {
                        let place = Place::local(self.local_map[*local]);
                        let result = self.lower_node(*init, Some(&place))?;
                        result.write_to_dest(self, &place)?;
                    }
                }
                Stmt::Expr(expr) => {
                    let _ = self.lower_node(*expr, None)?;
                }
            }
        }
        match tail {
            Some(tail) if self.builder.is_reachable() => self.lower_node(tail, dest),
            Some(_) => Ok(self.dead_result()),
            None => Ok(LowerResult::Operand(self.unit_operand())),
        }
    }

    pub(crate) fn lower_if(
        &mut self,
        cond: ExprId,
        then_branch: ExprId,
        else_branch: Option<ExprId>,
        ty: TypeId,
        dest: Option<&Place>,
    ) -> Result<LowerResult, LowerError> {
        if !self.builder.is_reachable() {
            return Ok(self.dead_result());
        }
        let cond_op = self.lower_node(cond, None)?.as_operand(self)?;
        if !self.builder.is_reachable() {
            return Ok(self.dead_result());
        }

        let then_block = self.builder.new_block();
        let else_block = else_branch.map(|_| self.builder.new_block());
        let join_block = self.builder.new_block();
        self.builder.terminate(Terminator::SwitchInt {
            discr: cond_op,
            cases: vec![(Constant::bool(self.bool_ty, true), then_block)],
            otherwise: else_block.unwrap_or(join_block),
        });

        let produces_value =
            else_branch.is_some() && !self.tys.is_unit(ty) && !self.tys.is_never(ty);

        if produces_value {
            let else_expr = else_branch.expect("value-producing if has an else");
            let else_block = else_block.expect("value-producing if has an else block");
            if let Some(dest) = dest {
                // Dest-aware: both branches write into the hint; no phi.
                let mut fallthroughs = 0;
                for (block, branch) in [(then_block, then_branch), (else_block, else_expr)] {
                    self.builder.switch_to(block);
                    let result = self.lower_node(branch, Some(dest))?;
                    if self.builder.is_reachable() {
                        result.write_to_dest(self, dest)?;
                        self.builder.terminate(Terminator::Goto(join_block));
                        fallthroughs += 1;
                    }
                }
                if fallthroughs == 0 {
                    self.builder.switch_to(join_block);
                    self.builder.terminate(Terminator::Unreachable);
                    return Ok(self.dead_result());
                }
                self.builder.switch_to(join_block);
                Ok(LowerResult::Written)
            } else {
                // Materialize each branch value and merge with a phi.
                // Unreachable branches contribute no incoming.
                let mut incoming = Vec::new();
                for (block, branch) in [(then_block, then_branch), (else_block, else_expr)] {
                    self.builder.switch_to(block);
                    let result = self.lower_node(branch, None)?;
                    if self.builder.is_reachable() {
                        let op = result.as_operand(self)?;
                        let temp = self.as_temp(op);
                        let pred = self.builder.current().expect("reachable");
                        incoming.push((pred, temp));
                        self.builder.terminate(Terminator::Goto(join_block));
                    }
                }
                if incoming.is_empty() {
                    self.builder.switch_to(join_block);
                    self.builder.terminate(Terminator::Unreachable);
                    return Ok(self.dead_result());
                }
                let result = self.builder.add_phi(join_block, ty, incoming);
                self.builder.switch_to(join_block);
                Ok(LowerResult::Operand(Operand::Temp(result)))
            }
        } else {
            // Statement position: branch values are unit (or never) and
            // discarded. Without an else the otherwise edge reaches the
            // join directly.
            let mut join_reachable = else_block.is_none();
            self.builder.switch_to(then_block);
            let _ = self.lower_node(then_branch, None)?;
            if self.builder.is_reachable() {
                self.builder.terminate(Terminator::Goto(join_block));
                join_reachable = true;
            }
            if let (Some(block), Some(branch)) = (else_block, else_branch) {
                self.builder.switch_to(block);
                let _ = self.lower_node(branch, None)?;
                if self.builder.is_reachable() {
                    self.builder.terminate(Terminator::Goto(join_block));
                    join_reachable = true;
                }
            }
            self.builder.switch_to(join_block);
            if !join_reachable {
                self.builder.terminate(Terminator::Unreachable);
                return Ok(self.dead_result());
            }
            Ok(LowerResult::Operand(self.unit_operand()))
        }
    }

    pub(crate) fn lower_loop(
        &mut self,
        id: ExprId,
        body: ExprId,
        ty: TypeId,
    ) -> Result<LowerResult, LowerError> {
        if !self.builder.is_reachable() {
            return Ok(self.dead_result());
        }
        let body_block = self.builder.new_block();
        let break_block = self.builder.new_block();
        self.builder.terminate(Terminator::Goto(body_block));
        self.builder.switch_to(body_block);

        let break_ty = if self.tys.is_unit(ty) || self.tys.is_never(ty) {
            None
        } else {
            Some(ty)
        };
        self.loop_stack.push(LoopContext {
            key: id,
            continue_block: body_block,
            break_block,
            break_ty,
            break_incoming: Vec::new(),
            break_reached: false,
        });
        let _ = self.lower_node(body, None)?;
        if self.builder.is_reachable() {
            self.builder.terminate(Terminator::Goto(body_block));
        }
        let ctx = self.loop_stack.pop().expect("loop context pushed above");

        if !ctx.break_reached {
            // Infinite loop: the post-loop block is statically impossible.
            self.builder.switch_to(break_block);
            self.builder.terminate(Terminator::Unreachable);
            return Ok(self.dead_result());
        }
        match ctx.break_ty {
            Some(break_ty) => {
                let result = self.builder.add_phi(break_block, break_ty, ctx.break_incoming);
                self.builder.switch_to(break_block);
                Ok(LowerResult::Operand(Operand::Temp(result)))
            }
            None => {
                self.builder.switch_to(break_block);
                Ok(LowerResult::Operand(self.unit_operand()))
            }
        }
    }

    /// `while` never carries a break value; its result is always unit.
    pub(crate) fn lower_while(
        &mut self,
        id: ExprId,
        cond: ExprId,
        body: ExprId,
    ) -> Result<LowerResult, LowerError> {
        if !self.builder.is_reachable() {
            return Ok(self.dead_result());
        }
        let cond_block = self.builder.new_block();
        self.builder.terminate(Terminator::Goto(cond_block));
        self.builder.switch_to(cond_block);
        let cond_op = self.lower_node(cond, None)?.as_operand(self)?;
        if !self.builder.is_reachable() {
            // The condition itself diverges; the loop body is unreachable.
            return Ok(self.dead_result());
        }

        let body_block = self.builder.new_block();
        let break_block = self.builder.new_block();
        self.builder.terminate(Terminator::SwitchInt {
            discr: cond_op,
            cases: vec![(Constant::bool(self.bool_ty, true), body_block)],
            otherwise: break_block,
        });

        self.loop_stack.push(LoopContext {
            key: id,
            continue_block: cond_block,
            break_block,
            break_ty: None,
            break_incoming: Vec::new(),
            // The false edge of the condition always reaches the join.
            break_reached: true,
        });
        self.builder.switch_to(body_block);
        let _ = self.lower_node(body, None)?;
        if self.builder.is_reachable() {
            self.builder.terminate(Terminator::Goto(cond_block));
        }
        self.loop_stack.pop();

        self.builder.switch_to(break_block);
        Ok(LowerResult::Operand(self.unit_operand()))
    }

    pub(crate) fn lower_break(
        &mut self,
        target: ExprId,
        value: Option<ExprId>,
    ) -> Result<LowerResult, LowerError> {
        if !self.builder.is_reachable() {
            return Ok(self.dead_result());
        }
        let index = self
            .loop_stack
            .iter()
            .rposition(|ctx| ctx.key == target)
            .ok_or_else(|| {
                LowerError::new(LowerErrorKind::InvariantViolation(
                    "break target is not an enclosing loop".into(),
                ))
            })?;
        let break_ty = self.loop_stack[index].break_ty;
        let break_block = self.loop_stack[index].break_block;

        if let Some(break_ty) = break_ty {
            let value = value.ok_or_else(|| {
                LowerError::new(LowerErrorKind::MissingValue(
                    "break without a value in a value-carrying loop".into(),
                ))
            })?;
            let op = self.lower_node(value, None)?.as_operand(self)?;
            if self.builder.is_reachable() {
                let op_ty = self.operand_ty(&op);
                if op_ty != break_ty {
                    return Err(LowerError::new(LowerErrorKind::TypeMismatch(format!(
                        "break value is `{}` but the loop yields `{}`",
                        self.tys.display_name(op_ty),
                        self.tys.display_name(break_ty)
                    ))));
                }
                let temp = self.as_temp(op);
                let pred = self.builder.current().expect("reachable");
                self.loop_stack[index].break_incoming.push((pred, temp));
            }
        } else if let Some(value) = value {
            // A unit-valued break expression: side effects only.
            let _ = self.lower_node(value, None)?;
        }

        if self.builder.is_reachable() {
            self.loop_stack[index].break_reached = true;
            self.builder.terminate(Terminator::Goto(break_block));
        }
        Ok(self.dead_result())
    }

    pub(crate) fn lower_continue(&mut self, target: ExprId) -> Result<LowerResult, LowerError> {
        if !self.builder.is_reachable() {
            return Ok(self.dead_result());
        }
        let ctx = self
            .loop_stack
            .iter()
            .rev()
            .find(|ctx| ctx.key == target)
            .ok_or_else(|| {
                LowerError::new(LowerErrorKind::InvariantViolation(
                    "continue target is not an enclosing loop".into(),
                ))
            })?;
        let continue_block = ctx.continue_block;
        self.builder.terminate(Terminator::Goto(continue_block));
        Ok(self.dead_result())
    }

    pub(crate) fn lower_return(
        &mut self,
        value: Option<ExprId>,
    ) -> Result<LowerResult, LowerError> {
        if !self.builder.is_reachable() {
            return Ok(self.dead_result());
        }
        let return_desc = self.builder.func.sig.return_desc.clone();
        match return_desc {
            ReturnDesc::Never => {
                // A diverging function has no real returns: evaluate the
                // operand for its side effects, then cut the path.
                if let Some(value) = value {
                    let _ = self.lower_node(value, None)?;
                }
                self.builder.terminate(Terminator::Unreachable);
            }
            ReturnDesc::Void => {
                if let Some(value) = value {
                    let value_ty = self.body.ty(value);
                    if !self.tys.is_unit(value_ty) && !self.tys.is_never(value_ty) {
                        return Err(LowerError::new(LowerErrorKind::InvalidReturn(
                            "value returned from a function returning nothing".into(),
                        )));
                    }
                    let _ = self.lower_node(value, None)?;
                }
                self.builder.terminate(Terminator::Return(None));
            }
            ReturnDesc::Direct(ret_ty) => {
                let value = value.ok_or_else(|| {
                    LowerError::new(LowerErrorKind::InvalidReturn(
                        "missing return value".into(),
                    ))
                })?;
                let op = self.lower_node(value, None)?.as_operand(self)?;
                if self.builder.is_reachable() {
                    let op_ty = self.operand_ty(&op);
                    if op_ty != ret_ty {
                        return Err(LowerError::new(LowerErrorKind::TypeMismatch(format!(
                            "return value is `{}` but the function returns `{}`",
                            self.tys.display_name(op_ty),
                            self.tys.display_name(ret_ty)
                        ))));
                    }
                    self.builder.terminate(Terminator::Return(Some(op)));
                }
            }
            ReturnDesc::IndirectSret { .. } => {
                let value = value.ok_or_else(|| {
                    LowerError::new(LowerErrorKind::InvalidReturn(
                        "missing return value for an aggregate-returning function".into(),
                    ))
                })?;
                let dest = self
                    .return_place
                    .clone()
                    .expect("sret function lowered without a return place");
                let result = self.lower_node(value, Some(&dest))?;
                if self.builder.is_reachable() {
                    result.write_to_dest(self, &dest)?;
                    self.builder.terminate(Terminator::Return(None));
                }
            }
        }
        Ok(self.dead_result())
    }
}
