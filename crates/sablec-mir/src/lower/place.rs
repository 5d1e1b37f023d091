//! Place resolution.
//!
//! Resolves lvalue expressions into base + projection paths. Field and
//! index projections accumulate in source order; dereference is always a
//! pointer base, never a projection. A value expression in place position
//! (say, field access on a call result) is materialized into a synthetic
//! local first.

use sablec_hir::hir::ExprKind;
use sablec_hir::ExprId;

use crate::error::LowerError;
use crate::lower::FunctionLowering;
use crate::mir::{Place, Projection};

impl FunctionLowering<'_> {
    pub(crate) fn lower_place_expr(&mut self, id: ExprId) -> Result<Place, LowerError> {
        let expr = self.body.expr(id);
        match &expr.kind {
            ExprKind::Var(local) => Ok(Place::local(self.local_map[*local])),
            ExprKind::Field { base, index } => {
                let place = self.lower_place_expr(*base)?;
                Ok(place.project(Projection::Field(*index)))
            }
            ExprKind::Index { base, index } => {
                let place = self.lower_place_expr(*base)?;
                // Index operands are materialized to temps, even constants.
                let index_op = self.lower_node(*index, None)?.as_operand(self)?;
                let index_temp = self.as_temp(index_op);
                Ok(place.project(Projection::Index(index_temp)))
            }
            ExprKind::Deref(inner) => {
                let pointer = self.lower_node(*inner, None)?.as_operand(self)?;
                let pointer_temp = self.as_temp(pointer);
                Ok(Place::deref_of(pointer_temp))
            }
            _ => {
                // Not a place in the HIR sense; force materialization.
                let result = self.lower_node(id, None)?;
                result.as_place(self)
            }
        }
    }
}
