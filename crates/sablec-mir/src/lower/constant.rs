//! Literal and named-constant lowering.

use sablec_hir::consteval::ConstValue;
use sablec_hir::hir::{ConstId, Literal};
use sablec_hir::types::{TypeId, TypeInterner, TypeKind};

use crate::error::{LowerError, LowerErrorKind};
use crate::lower::{FunctionLowering, LowerResult};
use crate::mir::{ConstKind, Constant, Operand};

/// Convert a HIR literal with its resolved type into a MIR constant.
pub(crate) fn literal_constant(lit: &Literal, ty: TypeId, tys: &TypeInterner) -> Constant {
    match *lit {
        Literal::Int { magnitude, negative } => {
            Constant::int(ty, magnitude, negative, tys.is_signed_int(ty))
        }
        Literal::Bool(b) => Constant::bool(ty, b),
        Literal::Char(c) => Constant { ty, value: ConstKind::Char(c) },
        Literal::Str(s) => Constant { ty, value: ConstKind::Str(s) },
        Literal::Unit => Constant::unit(ty),
    }
}

/// Convert an evaluated constant into a MIR constant. Only scalar shapes
/// fit in an operand; aggregate constants in expression position are not
/// lowered here.
pub(crate) fn const_value_to_constant(
    value: &ConstValue,
    ty: TypeId,
    tys: &TypeInterner,
) -> Result<Constant, LowerError> {
    match value {
        ConstValue::Int { magnitude, negative } => {
            if matches!(tys.kind(ty), TypeKind::Enum(_)) {
                Ok(Constant { ty, value: ConstKind::EnumDiscriminant(*magnitude) })
            } else {
                Ok(Constant::int(ty, *magnitude, *negative, tys.is_signed_int(ty)))
            }
        }
        ConstValue::Bool(b) => Ok(Constant::bool(ty, *b)),
        ConstValue::Char(c) => Ok(Constant { ty, value: ConstKind::Char(*c) }),
        ConstValue::Str(s) => Ok(Constant { ty, value: ConstKind::Str(*s) }),
        ConstValue::Unit => Ok(Constant::unit(ty)),
        ConstValue::Struct(_) | ConstValue::Array(_) => {
            Err(LowerError::new(LowerErrorKind::NotImplemented(
                "aggregate constant in expression position".into(),
            )))
        }
    }
}

impl FunctionLowering<'_> {
    pub(crate) fn lower_const_use(
        &mut self,
        id: ConstId,
        ty: TypeId,
    ) -> Result<LowerResult, LowerError> {
        let value = &self.const_values[id];
        let constant = const_value_to_constant(value, ty, self.tys).map_err(|e| {
            LowerError::new(LowerErrorKind::NotImplemented(format!(
                "use of constant `{}`: {}",
                self.program.consts[id].name, e.kind
            )))
        })?;
        Ok(LowerResult::Operand(Operand::Const(constant)))
    }
}
