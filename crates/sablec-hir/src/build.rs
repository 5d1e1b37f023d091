//! HIR body construction.
//!
//! [`BodyBuilder`] fills a [`Body`] arena the way the frontend does after
//! type checking: every node is pushed with its resolved type. Loops need
//! their own id before their body exists (breaks carry the loop id), so the
//! builder supports reserving a node and filling it in afterwards.

use sablec_util::{DefId, IndexVec, Symbol};

use crate::hir::{
    BinOp, Body, ConstId, Expr, ExprId, ExprKind, HirLocalId, Literal, LocalDecl, LogicalOp,
    Stmt, UnOp,
};
use crate::types::{EnumId, StructId, TypeId};

pub struct BodyBuilder {
    locals: IndexVec<HirLocalId, LocalDecl>,
    exprs: IndexVec<ExprId, Expr>,
}

impl BodyBuilder {
    pub fn new() -> Self {
        Self {
            locals: IndexVec::new(),
            exprs: IndexVec::new(),
        }
    }

    /// Declare a local. Function parameters must be declared first, in
    /// order, so that local `i` is parameter `i` for `i < params.len()`.
    pub fn local(&mut self, name: &str, ty: TypeId) -> HirLocalId {
        self.locals.push(LocalDecl {
            name: Symbol::intern(name),
            ty,
            mutable: false,
        })
    }

    pub fn local_mut(&mut self, name: &str, ty: TypeId) -> HirLocalId {
        self.locals.push(LocalDecl {
            name: Symbol::intern(name),
            ty,
            mutable: true,
        })
    }

    pub fn push(&mut self, kind: ExprKind, ty: TypeId) -> ExprId {
        self.exprs.push(Expr { kind, ty })
    }

    /// Reserve a node id to be filled later with [`BodyBuilder::set`].
    /// Needed for loops, whose breaks refer back to the loop's own id.
    pub fn reserve(&mut self) -> ExprId {
        self.exprs.push(Expr {
            kind: ExprKind::Literal(Literal::Unit),
            ty: TypeId::INVALID,
        })
    }

    pub fn set(&mut self, id: ExprId, kind: ExprKind, ty: TypeId) {
        self.exprs[id] = Expr { kind, ty };
    }

    // Leaf nodes.

    pub fn lit_int(&mut self, value: i64, ty: TypeId) -> ExprId {
        self.push(
            ExprKind::Literal(Literal::Int {
                magnitude: value.unsigned_abs(),
                negative: value < 0,
            }),
            ty,
        )
    }

    pub fn lit_uint(&mut self, value: u64, ty: TypeId) -> ExprId {
        self.push(
            ExprKind::Literal(Literal::Int { magnitude: value, negative: false }),
            ty,
        )
    }

    pub fn lit_bool(&mut self, value: bool, ty: TypeId) -> ExprId {
        self.push(ExprKind::Literal(Literal::Bool(value)), ty)
    }

    pub fn lit_char(&mut self, value: char, ty: TypeId) -> ExprId {
        self.push(ExprKind::Literal(Literal::Char(value)), ty)
    }

    pub fn lit_str(&mut self, value: &str, ty: TypeId) -> ExprId {
        self.push(ExprKind::Literal(Literal::Str(Symbol::intern(value))), ty)
    }

    pub fn lit_unit(&mut self, ty: TypeId) -> ExprId {
        self.push(ExprKind::Literal(Literal::Unit), ty)
    }

    pub fn var(&mut self, local: HirLocalId, ty: TypeId) -> ExprId {
        self.push(ExprKind::Var(local), ty)
    }

    pub fn const_use(&mut self, id: ConstId, ty: TypeId) -> ExprId {
        self.push(ExprKind::ConstUse(id), ty)
    }

    pub fn enum_variant(&mut self, enum_id: EnumId, variant: u32, ty: TypeId) -> ExprId {
        self.push(ExprKind::EnumVariant { enum_id, variant }, ty)
    }

    // Compound nodes.

    pub fn field(&mut self, base: ExprId, index: u32, ty: TypeId) -> ExprId {
        self.push(ExprKind::Field { base, index }, ty)
    }

    pub fn index(&mut self, base: ExprId, index: ExprId, ty: TypeId) -> ExprId {
        self.push(ExprKind::Index { base, index }, ty)
    }

    pub fn deref(&mut self, operand: ExprId, ty: TypeId) -> ExprId {
        self.push(ExprKind::Deref(operand), ty)
    }

    pub fn ref_to(&mut self, place: ExprId, mutable: bool, ty: TypeId) -> ExprId {
        self.push(ExprKind::Ref { place, mutable }, ty)
    }

    pub fn unary(&mut self, op: UnOp, operand: ExprId, ty: TypeId) -> ExprId {
        self.push(ExprKind::Unary { op, operand }, ty)
    }

    pub fn binary(&mut self, op: BinOp, lhs: ExprId, rhs: ExprId, ty: TypeId) -> ExprId {
        self.push(ExprKind::Binary { op, lhs, rhs }, ty)
    }

    pub fn logical(&mut self, op: LogicalOp, lhs: ExprId, rhs: ExprId, ty: TypeId) -> ExprId {
        self.push(ExprKind::Logical { op, lhs, rhs }, ty)
    }

    pub fn assign(&mut self, target: ExprId, value: ExprId, unit_ty: TypeId) -> ExprId {
        self.push(ExprKind::Assign { target: Some(target), value }, unit_ty)
    }

    /// `_ = value` discard assignment.
    pub fn assign_discard(&mut self, value: ExprId, unit_ty: TypeId) -> ExprId {
        self.push(ExprKind::Assign { target: None, value }, unit_ty)
    }

    pub fn cast(&mut self, value: ExprId, target_ty: TypeId) -> ExprId {
        self.push(ExprKind::Cast { value }, target_ty)
    }

    pub fn call(&mut self, callee: DefId, args: Vec<ExprId>, ty: TypeId) -> ExprId {
        self.push(ExprKind::Call { callee, args }, ty)
    }

    pub fn method_call(
        &mut self,
        receiver: ExprId,
        method: DefId,
        args: Vec<ExprId>,
        ty: TypeId,
    ) -> ExprId {
        self.push(ExprKind::MethodCall { receiver, method, args }, ty)
    }

    pub fn struct_lit(&mut self, struct_id: StructId, fields: Vec<ExprId>, ty: TypeId) -> ExprId {
        self.push(ExprKind::StructLiteral { struct_id, fields }, ty)
    }

    pub fn array_lit(&mut self, elements: Vec<ExprId>, ty: TypeId) -> ExprId {
        self.push(ExprKind::ArrayLiteral { elements }, ty)
    }

    pub fn array_repeat(&mut self, element: ExprId, count: u64, ty: TypeId) -> ExprId {
        self.push(ExprKind::ArrayRepeat { element, count }, ty)
    }

    pub fn if_(
        &mut self,
        cond: ExprId,
        then_branch: ExprId,
        else_branch: Option<ExprId>,
        ty: TypeId,
    ) -> ExprId {
        self.push(ExprKind::If { cond, then_branch, else_branch }, ty)
    }

    pub fn block(&mut self, stmts: Vec<Stmt>, tail: Option<ExprId>, ty: TypeId) -> ExprId {
        self.push(ExprKind::Block { stmts, tail }, ty)
    }

    /// Fill a reserved node with a `loop`.
    pub fn loop_at(&mut self, id: ExprId, body: ExprId, ty: TypeId) {
        self.set(id, ExprKind::Loop { body }, ty);
    }

    /// Fill a reserved node with a `while`.
    pub fn while_at(&mut self, id: ExprId, cond: ExprId, body: ExprId, unit_ty: TypeId) {
        self.set(id, ExprKind::While { cond, body }, unit_ty);
    }

    pub fn break_(&mut self, target: ExprId, value: Option<ExprId>, never_ty: TypeId) -> ExprId {
        self.push(ExprKind::Break { target, value }, never_ty)
    }

    pub fn continue_(&mut self, target: ExprId, never_ty: TypeId) -> ExprId {
        self.push(ExprKind::Continue { target }, never_ty)
    }

    pub fn return_(&mut self, value: Option<ExprId>, never_ty: TypeId) -> ExprId {
        self.push(ExprKind::Return(value), never_ty)
    }

    pub fn let_stmt(&mut self, local: HirLocalId, init: Option<ExprId>) -> Stmt {
        Stmt::Let { local, init }
    }

    pub fn expr_stmt(&mut self, expr: ExprId) -> Stmt {
        Stmt::Expr(expr)
    }

    pub fn finish(self, root: ExprId) -> Body {
        Body { locals: self.locals, exprs: self.exprs, root }
    }
}

impl Default for BodyBuilder {
    fn default() -> Self {
        Self::new()
    }
}
