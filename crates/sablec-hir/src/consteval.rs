//! Constant evaluation.
//!
//! Folds a `const` initializer body into a [`ConstValue`]. The evaluator
//! handles the constant subset of the language: literals, integer and bool
//! unary/binary operators, enum variant paths, uses of previously evaluated
//! consts, and struct/array literals built from constant parts.

use sablec_util::{Idx, Symbol};
use thiserror::Error;

use crate::hir::{BinOp, Body, ConstId, ExprId, ExprKind, Literal, Program, UnOp};
use crate::types::TypeInterner;

/// A fully evaluated constant.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConstValue {
    Int { magnitude: u64, negative: bool },
    Bool(bool),
    Char(char),
    Str(Symbol),
    Unit,
    Struct(Vec<ConstValue>),
    Array(Vec<ConstValue>),
}

#[derive(Debug, Error)]
pub enum ConstEvalError {
    #[error("expression form is not a constant")]
    NonConstExpr,
    #[error("use of const `{0}` before its evaluation")]
    ForwardConstUse(Symbol),
    #[error("arithmetic overflow in constant expression")]
    Overflow,
    #[error("division by zero in constant expression")]
    DivisionByZero,
}

/// Evaluator over a program's const table. Consts must be evaluated in
/// declaration order; each may refer to the ones before it.
pub struct ConstEvaluator<'a> {
    program: &'a Program,
    tys: &'a TypeInterner,
    evaluated: Vec<Option<ConstValue>>,
    in_progress: Vec<bool>,
}

impl<'a> ConstEvaluator<'a> {
    pub fn new(program: &'a Program, tys: &'a TypeInterner) -> Self {
        Self {
            program,
            tys,
            evaluated: vec![None; program.consts.len()],
            in_progress: vec![false; program.consts.len()],
        }
    }

    /// Evaluate the const with id `id`, memoizing the result.
    pub fn eval_const(&mut self, id: ConstId) -> Result<ConstValue, ConstEvalError> {
        if let Some(value) = &self.evaluated[id.index()] {
            return Ok(value.clone());
        }
        if self.in_progress[id.index()] {
            return Err(ConstEvalError::ForwardConstUse(self.program.consts[id].name));
        }
        self.in_progress[id.index()] = true;
        let def = &self.program.consts[id];
        let value = self.eval_expr(&def.init, def.init.root)?;
        self.in_progress[id.index()] = false;
        self.evaluated[id.index()] = Some(value.clone());
        Ok(value)
    }

    fn eval_expr(&mut self, body: &Body, id: ExprId) -> Result<ConstValue, ConstEvalError> {
        match &body.expr(id).kind {
            ExprKind::Literal(lit) => Ok(match *lit {
                Literal::Int { magnitude, negative } => ConstValue::Int { magnitude, negative },
                Literal::Bool(b) => ConstValue::Bool(b),
                Literal::Char(c) => ConstValue::Char(c),
                Literal::Str(s) => ConstValue::Str(s),
                Literal::Unit => ConstValue::Unit,
            }),
            ExprKind::EnumVariant { enum_id, variant } => {
                let discr = self.tys.enums[*enum_id].variants[*variant as usize].discr;
                Ok(ConstValue::Int { magnitude: discr, negative: false })
            }
            ExprKind::ConstUse(other) => self.eval_const(*other),
            ExprKind::Unary { op, operand } => {
                let value = self.eval_expr(body, *operand)?;
                self.eval_unary(*op, value)
            }
            ExprKind::Binary { op, lhs, rhs } => {
                let signed = self.tys.is_signed_int(body.ty(*lhs));
                let lhs = self.eval_expr(body, *lhs)?;
                let rhs = self.eval_expr(body, *rhs)?;
                eval_binary(*op, lhs, rhs, signed)
            }
            ExprKind::StructLiteral { fields, .. } => {
                let values = fields
                    .iter()
                    .map(|&f| self.eval_expr(body, f))
                    .collect::<Result<Vec<_>, _>>()?;
                Ok(ConstValue::Struct(values))
            }
            ExprKind::ArrayLiteral { elements } => {
                let values = elements
                    .iter()
                    .map(|&e| self.eval_expr(body, e))
                    .collect::<Result<Vec<_>, _>>()?;
                Ok(ConstValue::Array(values))
            }
            ExprKind::ArrayRepeat { element, count } => {
                let value = self.eval_expr(body, *element)?;
                Ok(ConstValue::Array(vec![value; *count as usize]))
            }
            // Constant casts between integer types keep the numeric value;
            // out-of-range wrapping is the backend's business.
            ExprKind::Cast { value } => self.eval_expr(body, *value),
            ExprKind::Block { stmts, tail } if stmts.is_empty() => match tail {
                Some(tail) => self.eval_expr(body, *tail),
                None => Ok(ConstValue::Unit),
            },
            _ => Err(ConstEvalError::NonConstExpr),
        }
    }

    fn eval_unary(&self, op: UnOp, value: ConstValue) -> Result<ConstValue, ConstEvalError> {
        match (op, value) {
            (UnOp::Not, ConstValue::Bool(b)) => Ok(ConstValue::Bool(!b)),
            (UnOp::Neg, ConstValue::Int { magnitude, negative }) => {
                Ok(ConstValue::Int { magnitude, negative: !negative && magnitude != 0 })
            }
            _ => Err(ConstEvalError::NonConstExpr),
        }
    }
}

fn to_i128(value: &ConstValue) -> Option<i128> {
    match value {
        ConstValue::Int { magnitude, negative } => {
            let m = *magnitude as i128;
            Some(if *negative { -m } else { m })
        }
        _ => None,
    }
}

fn from_i128(value: i128) -> Result<ConstValue, ConstEvalError> {
    let negative = value < 0;
    let magnitude = value.unsigned_abs();
    if magnitude > u64::MAX as u128 {
        return Err(ConstEvalError::Overflow);
    }
    Ok(ConstValue::Int { magnitude: magnitude as u64, negative })
}

fn eval_binary(
    op: BinOp,
    lhs: ConstValue,
    rhs: ConstValue,
    signed: bool,
) -> Result<ConstValue, ConstEvalError> {
    if let (ConstValue::Bool(a), ConstValue::Bool(b)) = (&lhs, &rhs) {
        return match op {
            BinOp::Eq => Ok(ConstValue::Bool(a == b)),
            BinOp::Ne => Ok(ConstValue::Bool(a != b)),
            BinOp::BitAnd => Ok(ConstValue::Bool(*a & *b)),
            BinOp::BitOr => Ok(ConstValue::Bool(*a | *b)),
            BinOp::BitXor => Ok(ConstValue::Bool(*a ^ *b)),
            _ => Err(ConstEvalError::NonConstExpr),
        };
    }

    let (a, b) = match (to_i128(&lhs), to_i128(&rhs)) {
        (Some(a), Some(b)) => (a, b),
        _ => return Err(ConstEvalError::NonConstExpr),
    };

    match op {
        BinOp::Add => from_i128(a.checked_add(b).ok_or(ConstEvalError::Overflow)?),
        BinOp::Sub => from_i128(a.checked_sub(b).ok_or(ConstEvalError::Overflow)?),
        BinOp::Mul => from_i128(a.checked_mul(b).ok_or(ConstEvalError::Overflow)?),
        BinOp::Div => {
            if b == 0 {
                return Err(ConstEvalError::DivisionByZero);
            }
            from_i128(a / b)
        }
        BinOp::Rem => {
            if b == 0 {
                return Err(ConstEvalError::DivisionByZero);
            }
            from_i128(a % b)
        }
        BinOp::BitAnd => from_i128(a & b),
        BinOp::BitOr => from_i128(a | b),
        BinOp::BitXor => from_i128(a ^ b),
        BinOp::Shl => from_i128(a.checked_shl(b as u32).ok_or(ConstEvalError::Overflow)?),
        BinOp::Shr => {
            // Arithmetic shift for signed operands, logical otherwise.
            if signed {
                from_i128(a >> (b as u32))
            } else {
                from_i128(((a as u64) >> (b as u32)) as i128)
            }
        }
        BinOp::Eq => Ok(ConstValue::Bool(a == b)),
        BinOp::Ne => Ok(ConstValue::Bool(a != b)),
        BinOp::Lt => Ok(ConstValue::Bool(a < b)),
        BinOp::Le => Ok(ConstValue::Bool(a <= b)),
        BinOp::Gt => Ok(ConstValue::Bool(a > b)),
        BinOp::Ge => Ok(ConstValue::Bool(a >= b)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::build::BodyBuilder;
    use crate::hir::ConstDef;
    use sablec_util::DefId;

    fn int(magnitude: u64, negative: bool) -> ConstValue {
        ConstValue::Int { magnitude, negative }
    }

    #[test]
    fn literal_arithmetic_folds() {
        let mut tys = TypeInterner::new();
        let i32_ty = tys.i32();

        let mut b = BodyBuilder::new();
        let lhs = b.lit_int(40, i32_ty);
        let rhs = b.lit_int(2, i32_ty);
        let sum = b.binary(BinOp::Add, lhs, rhs, i32_ty);
        let init = b.finish(sum);

        let mut program = Program::default();
        program.consts.push(ConstDef {
            def_id: DefId(0),
            name: Symbol::intern("ANSWER"),
            ty: i32_ty,
            init,
        });

        let mut eval = ConstEvaluator::new(&program, &tys);
        assert_eq!(eval.eval_const(ConstId(0)).unwrap(), int(42, false));
    }

    #[test]
    fn const_may_use_earlier_const() {
        let mut tys = TypeInterner::new();
        let i32_ty = tys.i32();

        let mut b = BodyBuilder::new();
        let one = b.lit_int(1, i32_ty);
        let first = b.finish(one);

        let mut b = BodyBuilder::new();
        let use_first = b.const_use(ConstId(0), i32_ty);
        let two = b.lit_int(2, i32_ty);
        let sum = b.binary(BinOp::Add, use_first, two, i32_ty);
        let second = b.finish(sum);

        let mut program = Program::default();
        program.consts.push(ConstDef {
            def_id: DefId(0),
            name: Symbol::intern("ONE"),
            ty: i32_ty,
            init: first,
        });
        program.consts.push(ConstDef {
            def_id: DefId(1),
            name: Symbol::intern("THREE"),
            ty: i32_ty,
            init: second,
        });

        let mut eval = ConstEvaluator::new(&program, &tys);
        assert_eq!(eval.eval_const(ConstId(1)).unwrap(), int(3, false));
    }

    #[test]
    fn division_by_zero_is_an_error() {
        let mut tys = TypeInterner::new();
        let i32_ty = tys.i32();

        let mut b = BodyBuilder::new();
        let lhs = b.lit_int(1, i32_ty);
        let rhs = b.lit_int(0, i32_ty);
        let div = b.binary(BinOp::Div, lhs, rhs, i32_ty);
        let init = b.finish(div);

        let mut program = Program::default();
        program.consts.push(ConstDef {
            def_id: DefId(0),
            name: Symbol::intern("BAD"),
            ty: i32_ty,
            init,
        });

        let mut eval = ConstEvaluator::new(&program, &tys);
        assert!(matches!(
            eval.eval_const(ConstId(0)),
            Err(ConstEvalError::DivisionByZero)
        ));
    }

    #[test]
    fn negation_of_zero_stays_positive() {
        let mut tys = TypeInterner::new();
        let i32_ty = tys.i32();

        let mut b = BodyBuilder::new();
        let zero = b.lit_int(0, i32_ty);
        let neg = b.unary(UnOp::Neg, zero, i32_ty);
        let init = b.finish(neg);

        let mut program = Program::default();
        program.consts.push(ConstDef {
            def_id: DefId(0),
            name: Symbol::intern("ZERO"),
            ty: i32_ty,
            init,
        });

        let mut eval = ConstEvaluator::new(&program, &tys);
        assert_eq!(eval.eval_const(ConstId(0)).unwrap(), int(0, false));
    }
}
