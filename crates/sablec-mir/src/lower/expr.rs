//! The expression lowerer.
//!
//! One dispatcher, [`FunctionLowering::lower_node`], drives every
//! expression. The destination hint is a suggestion: dest-aware nodes
//! (aggregate literals, sret calls, `if`/block in value position) write
//! straight into it and answer `Written`; dest-ignorant nodes hand back an
//! operand or place and the caller reconciles through the
//! [`LowerResult`](crate::lower::LowerResult) adapters.

use sablec_hir::hir::{BinOp as HirBinOp, ExprKind, LogicalOp, UnOp as HirUnOp};
use sablec_hir::types::{TypeId, TypeKind};
use sablec_hir::{ExprId, TypeInterner};

use crate::error::{LowerError, LowerErrorKind};
use crate::lower::constant::literal_constant;
use crate::lower::{FunctionLowering, LowerResult};
use crate::mir::{
    scalar_is_signed, BinOp, ConstKind, Constant, InitLeaf, InitPattern, Operand, Place,
    Projection, RValue, Statement, Terminator, UnOp, ValueSource,
};

impl FunctionLowering<'_> {
    /// Lower one expression, optionally into `dest`.
    pub fn lower_node(
        &mut self,
        id: ExprId,
        dest: Option<&Place>,
    ) -> Result<LowerResult, LowerError> {
        let expr = self.body.expr(id);
        match &expr.kind {
            ExprKind::Literal(lit) => Ok(LowerResult::Operand(Operand::Const(
                literal_constant(lit, expr.ty, self.tys),
            ))),
            ExprKind::ConstUse(const_id) => self.lower_const_use(*const_id, expr.ty),
            ExprKind::EnumVariant { enum_id, variant } => {
                let discr = self.tys.enums[*enum_id].variants[*variant as usize].discr;
                Ok(LowerResult::Operand(Operand::Const(Constant {
                    ty: expr.ty,
                    value: ConstKind::EnumDiscriminant(discr),
                })))
            }

            ExprKind::Var(_) | ExprKind::Field { .. } | ExprKind::Index { .. }
            | ExprKind::Deref(_) => self.lower_place_expr(id).map(LowerResult::Place),

            ExprKind::Ref { place, .. } => {
                let place = self.lower_place_expr(*place)?;
                let temp = self.builder.define(RValue::Ref(place), expr.ty);
                Ok(LowerResult::Operand(Operand::Temp(temp)))
            }

            ExprKind::Unary { op, operand } => {
                let operand = self.lower_node(*operand, None)?.as_operand(self)?;
                let op = match op {
                    HirUnOp::Not => UnOp::Not,
                    HirUnOp::Neg => UnOp::Neg,
                };
                let temp = self.builder.define(RValue::UnaryOp { op, operand }, expr.ty);
                Ok(LowerResult::Operand(Operand::Temp(temp)))
            }

            ExprKind::Binary { op, lhs, rhs } => {
                let lhs_ty = self.body.ty(*lhs);
                let lhs = self.lower_node(*lhs, None)?.as_operand(self)?;
                let rhs = self.lower_node(*rhs, None)?.as_operand(self)?;
                let op = classify_bin_op(*op, lhs_ty, self.tys)?;
                let temp = self
                    .builder
                    .define(RValue::BinaryOp { op, lhs, rhs }, expr.ty);
                Ok(LowerResult::Operand(Operand::Temp(temp)))
            }

            ExprKind::Logical { op, lhs, rhs } => self.lower_logical(*op, *lhs, *rhs),

            ExprKind::Assign { target, value } => {
                let result = self.lower_node(*value, None)?;
                match target {
                    // `_ = value`: evaluate for side effects, discard.
                    None => {}
                    Some(target) => {
                        let place = self.lower_place_expr(*target)?;
                        result.write_to_dest(self, &place)?;
                    }
                }
                Ok(LowerResult::Operand(self.unit_operand()))
            }

            ExprKind::Cast { value } => {
                let value = self.lower_node(*value, None)?.as_operand(self)?;
                let temp = self
                    .builder
                    .define(RValue::Cast { value, target: expr.ty }, expr.ty);
                Ok(LowerResult::Operand(Operand::Temp(temp)))
            }

            ExprKind::Call { callee, args } => self.lower_call(*callee, args, dest),
            ExprKind::MethodCall { receiver, method, args } => {
                let mut all_args = Vec::with_capacity(args.len() + 1);
                all_args.push(*receiver);
                all_args.extend_from_slice(args);
                self.lower_call(*method, &all_args, dest)
            }

            ExprKind::StructLiteral { .. }
            | ExprKind::ArrayLiteral { .. }
            | ExprKind::ArrayRepeat { .. } => self.lower_aggregate(id, dest),

            ExprKind::If { cond, then_branch, else_branch } => {
                self.lower_if(*cond, *then_branch, *else_branch, expr.ty, dest)
            }
            ExprKind::Block { stmts, tail } => self.lower_block(stmts, *tail, dest),
            ExprKind::Loop { body } => self.lower_loop(id, *body, expr.ty),
            ExprKind::While { cond, body } => self.lower_while(id, *cond, *body),
            ExprKind::Break { target, value } => self.lower_break(*target, *value),
            ExprKind::Continue { target } => self.lower_continue(*target),
            ExprKind::Return(value) => self.lower_return(*value),
        }
    }

    /// Short-circuit `&&`/`||`. Never a binary op: the rhs is evaluated in
    /// its own block and a phi merges the short value with the rhs value.
    /// No constant folding happens here, even for literal operands.
    fn lower_logical(
        &mut self,
        op: LogicalOp,
        lhs: ExprId,
        rhs: ExprId,
    ) -> Result<LowerResult, LowerError> {
        if !self.builder.is_reachable() {
            return Ok(self.dead_result());
        }
        let lhs_op = self.lower_node(lhs, None)?.as_operand(self)?;
        if !self.builder.is_reachable() {
            return Ok(self.dead_result());
        }

        // The short-circuit value is materialized as a temp in the lhs
        // block so the join phi's incomings are uniformly temps.
        let short_value = matches!(op, LogicalOp::Or);
        let short_temp = self.builder.define(
            RValue::Const(Constant::bool(self.bool_ty, short_value)),
            self.bool_ty,
        );
        let lhs_block = self.builder.current().expect("reachable");

        let rhs_block = self.builder.new_block();
        let join_block = self.builder.new_block();
        let (on_true, on_false) = match op {
            LogicalOp::And => (rhs_block, join_block),
            LogicalOp::Or => (join_block, rhs_block),
        };
        self.builder.terminate(Terminator::SwitchInt {
            discr: lhs_op,
            cases: vec![(Constant::bool(self.bool_ty, true), on_true)],
            otherwise: on_false,
        });

        self.builder.switch_to(rhs_block);
        let rhs_op = self.lower_node(rhs, None)?.as_operand(self)?;
        let mut incoming = vec![(lhs_block, short_temp)];
        if self.builder.is_reachable() {
            let rhs_temp = self.as_temp(rhs_op);
            incoming.push((self.builder.current().expect("reachable"), rhs_temp));
            self.builder.terminate(Terminator::Goto(join_block));
        }

        let result = self.builder.add_phi(join_block, self.bool_ty, incoming);
        self.builder.switch_to(join_block);
        Ok(LowerResult::Operand(Operand::Temp(result)))
    }

    /// Aggregate literals. With a destination the fields are written in
    /// place and the node answers `Written`; without one a synthetic local
    /// stands in and the node answers its place.
    fn lower_aggregate(
        &mut self,
        id: ExprId,
        dest: Option<&Place>,
    ) -> Result<LowerResult, LowerError> {
        let ty = self.body.ty(id);
        match dest {
            Some(dest) => {
                self.aggregate_into(id, dest)?;
                Ok(LowerResult::Written)
            }
            None => {
                // An undirected array-repeat is small enough to live in a
                // temp; other aggregates get a synthetic local.
                if let ExprKind::ArrayRepeat { element, count } = &self.body.expr(id).kind {
                    let element_ty = self.body.ty(*element);
                    if !self.tys.is_aggregate(element_ty) {
                        let value = self.lower_node(*element, None)?.as_operand(self)?;
                        let temp = self
                            .builder
                            .define(RValue::ArrayRepeat { value, count: *count }, ty);
                        return Ok(LowerResult::Operand(Operand::Temp(temp)));
                    }
                }
                let local = self.builder.new_local(ty, None);
                let place = Place::local(local);
                self.aggregate_into(id, &place)?;
                Ok(LowerResult::Place(place))
            }
        }
    }

    /// Initialize `dest` from the aggregate literal `id`. One `Init`
    /// statement covers the scalar leaves; aggregate-typed sub-expressions
    /// recurse into the projected sub-place first and show up as `Omitted`.
    fn aggregate_into(&mut self, id: ExprId, dest: &Place) -> Result<(), LowerError> {
        let expr = self.body.expr(id);
        match &expr.kind {
            ExprKind::StructLiteral { fields, .. } => {
                let mut leaves = Vec::with_capacity(fields.len());
                for (i, &field) in fields.iter().enumerate() {
                    let sub = dest.clone().project(Projection::Field(i as u32));
                    leaves.push(self.lower_init_leaf(field, sub)?);
                }
                self.builder.push(Statement::Init {
                    dest: dest.clone(),
                    pattern: InitPattern::Struct(leaves),
                });
            }
            ExprKind::ArrayLiteral { elements } => {
                let mut leaves = Vec::with_capacity(elements.len());
                for (i, &element) in elements.iter().enumerate() {
                    let element_ty = self.body.ty(element);
                    if self.tys.is_aggregate(element_ty) {
                        // Index operands are temps even for constants.
                        let index = self.builder.define(
                            RValue::Const(Constant::int(self.usize_ty, i as u64, false, false)),
                            self.usize_ty,
                        );
                        let sub = dest.clone().project(Projection::Index(index));
                        leaves.push(self.lower_init_leaf(element, sub)?);
                    } else {
                        let op = self.lower_node(element, None)?.as_operand(self)?;
                        leaves.push(InitLeaf::Value(ValueSource::Operand(op)));
                    }
                }
                self.builder.push(Statement::Init {
                    dest: dest.clone(),
                    pattern: InitPattern::ArrayLiteral(leaves),
                });
            }
            ExprKind::ArrayRepeat { element, count } => {
                let element_ty = self.body.ty(*element);
                let leaf = if self.tys.is_aggregate(element_ty) {
                    let place = self.lower_node(*element, None)?.as_place(self)?;
                    InitLeaf::Value(ValueSource::Place(place))
                } else {
                    let op = self.lower_node(*element, None)?.as_operand(self)?;
                    InitLeaf::Value(ValueSource::Operand(op))
                };
                self.builder.push(Statement::Init {
                    dest: dest.clone(),
                    pattern: InitPattern::ArrayRepeat { element: leaf, count: *count },
                });
            }
            _ => {
                return Err(LowerError::new(LowerErrorKind::InvariantViolation(
                    "aggregate_into on a non-aggregate expression".into(),
                )))
            }
        }
        Ok(())
    }

    /// One field/element of an aggregate initialization: aggregates write
    /// through the sub-place (leaf `Omitted`), scalars become operands.
    fn lower_init_leaf(&mut self, field: ExprId, sub: Place) -> Result<InitLeaf, LowerError> {
        let field_ty = self.body.ty(field);
        if self.tys.is_aggregate(field_ty) {
            let result = self.lower_node(field, Some(&sub))?;
            result.write_to_dest(self, &sub)?;
            Ok(InitLeaf::Omitted)
        } else {
            let op = self.lower_node(field, None)?.as_operand(self)?;
            Ok(InitLeaf::Value(ValueSource::Operand(op)))
        }
    }
}

/// Pick the domain-encoded MIR operator for a HIR operator applied at
/// `operand_ty`. Scalar only; `&&`/`||` never reach here.
fn classify_bin_op(
    op: HirBinOp,
    operand_ty: TypeId,
    tys: &TypeInterner,
) -> Result<BinOp, LowerError> {
    let mismatch = |what: &str| {
        LowerError::new(LowerErrorKind::TypeMismatch(format!(
            "`{op:?}` is not defined on {what}"
        )))
    };
    match tys.kind(operand_ty) {
        TypeKind::Bool => Ok(match op {
            HirBinOp::Eq => BinOp::BoolEq,
            HirBinOp::Ne => BinOp::BoolNe,
            HirBinOp::BitAnd => BinOp::BitAnd,
            HirBinOp::BitOr => BinOp::BitOr,
            HirBinOp::BitXor => BinOp::BitXor,
            _ => return Err(mismatch("bool")),
        }),
        TypeKind::Int(_) | TypeKind::Char | TypeKind::Enum(_) => {
            let signed = scalar_is_signed(tys, operand_ty);
            Ok(match op {
                HirBinOp::Add => if signed { BinOp::SAdd } else { BinOp::UAdd },
                HirBinOp::Sub => if signed { BinOp::SSub } else { BinOp::USub },
                HirBinOp::Mul => if signed { BinOp::SMul } else { BinOp::UMul },
                HirBinOp::Div => if signed { BinOp::SDiv } else { BinOp::UDiv },
                HirBinOp::Rem => if signed { BinOp::SRem } else { BinOp::URem },
                HirBinOp::BitAnd => BinOp::BitAnd,
                HirBinOp::BitOr => BinOp::BitOr,
                HirBinOp::BitXor => BinOp::BitXor,
                HirBinOp::Shl => BinOp::Shl,
                HirBinOp::Shr => if signed { BinOp::AShr } else { BinOp::LShr },
                HirBinOp::Eq => BinOp::IEq,
                HirBinOp::Ne => BinOp::INe,
                HirBinOp::Lt => if signed { BinOp::SLt } else { BinOp::ULt },
                HirBinOp::Le => if signed { BinOp::SLe } else { BinOp::ULe },
                HirBinOp::Gt => if signed { BinOp::SGt } else { BinOp::UGt },
                HirBinOp::Ge => if signed { BinOp::SGe } else { BinOp::UGe },
            })
        }
        _ => Err(mismatch("a non-scalar type")),
    }
}
