//! The typed HIR tree.
//!
//! This is the shape the frontend hands to MIR lowering: names resolved,
//! every expression annotated with its interned type, no inference
//! placeholders left. Bodies are arenas: expressions refer to their
//! children by [`ExprId`] and loops are keyed by their own id, which is
//! what `break`/`continue` carry as their resolved target.
//!
//! Child slots are always present; where the language allows omission the
//! slot is an explicit `Option`.

use sablec_util::{define_idx, DefId, IndexVec, Symbol};

use crate::types::{EnumId, StructId, TypeId};

define_idx!(ExprId);
define_idx!(HirLocalId);
define_idx!(ConstId);

/// A whole type-checked program.
#[derive(Debug, Default)]
pub struct Program {
    pub consts: IndexVec<ConstId, ConstDef>,
    pub functions: Vec<FnDef>,
    pub impls: Vec<ImplBlock>,
    pub traits: Vec<TraitDef>,
}

/// A free function or method. External iff `body` is absent.
#[derive(Debug)]
pub struct FnDef {
    pub def_id: DefId,
    pub name: Symbol,
    pub params: Vec<ParamDecl>,
    pub ret_ty: TypeId,
    pub body: Option<Body>,
}

#[derive(Debug, Clone)]
pub struct ParamDecl {
    pub name: Symbol,
    pub ty: TypeId,
}

/// An `impl` block: inherent or trait methods on `self_ty`.
///
/// Method calls in expressions resolve to the concrete method's `DefId`, so
/// lowering never needs the trait itself.
#[derive(Debug)]
pub struct ImplBlock {
    pub self_ty: TypeId,
    pub methods: Vec<FnDef>,
}

/// A trait declaration. Carried for completeness; by this stage every
/// method call is resolved to an impl, so traits contribute no callables.
#[derive(Debug)]
pub struct TraitDef {
    pub def_id: DefId,
    pub name: Symbol,
    pub methods: Vec<TraitMethodSig>,
}

#[derive(Debug)]
pub struct TraitMethodSig {
    pub name: Symbol,
    pub params: Vec<ParamDecl>,
    pub ret_ty: TypeId,
}

/// `const NAME: ty = init`.
#[derive(Debug)]
pub struct ConstDef {
    pub def_id: DefId,
    pub name: Symbol,
    pub ty: TypeId,
    pub init: Body,
}

/// A function (or const initializer) body.
///
/// The first `params.len()` locals of a function body are its parameters,
/// in declaration order; for methods local 0 is `self`.
#[derive(Debug)]
pub struct Body {
    pub locals: IndexVec<HirLocalId, LocalDecl>,
    pub exprs: IndexVec<ExprId, Expr>,
    pub root: ExprId,
}

#[derive(Debug, Clone)]
pub struct LocalDecl {
    pub name: Symbol,
    pub ty: TypeId,
    pub mutable: bool,
}

/// A typed expression node.
#[derive(Debug, Clone)]
pub struct Expr {
    pub kind: ExprKind,
    pub ty: TypeId,
}

#[derive(Debug, Clone)]
pub enum ExprKind {
    Literal(Literal),
    Var(HirLocalId),
    /// Use of a named `const`.
    ConstUse(ConstId),
    /// A unit enum variant path, e.g. `Color::Red`.
    EnumVariant { enum_id: EnumId, variant: u32 },
    /// Field access by canonical declared index.
    Field { base: ExprId, index: u32 },
    Index { base: ExprId, index: ExprId },
    /// `*expr` where `expr` has reference type.
    Deref(ExprId),
    /// `&place` / `&mut place`.
    Ref { place: ExprId, mutable: bool },
    Unary { op: UnOp, operand: ExprId },
    Binary { op: BinOp, lhs: ExprId, rhs: ExprId },
    /// Short-circuiting `&&` / `||`; not a [`ExprKind::Binary`].
    Logical { op: LogicalOp, lhs: ExprId, rhs: ExprId },
    /// `target = value`; a `None` target is the `_ = value` discard form.
    Assign { target: Option<ExprId>, value: ExprId },
    /// `value as ty`; the node's `ty` is the cast target.
    Cast { value: ExprId },
    Call { callee: DefId, args: Vec<ExprId> },
    MethodCall { receiver: ExprId, method: DefId, args: Vec<ExprId> },
    /// Fields in canonical declaration order.
    StructLiteral { struct_id: StructId, fields: Vec<ExprId> },
    ArrayLiteral { elements: Vec<ExprId> },
    ArrayRepeat { element: ExprId, count: u64 },
    If { cond: ExprId, then_branch: ExprId, else_branch: Option<ExprId> },
    Block { stmts: Vec<Stmt>, tail: Option<ExprId> },
    Loop { body: ExprId },
    While { cond: ExprId, body: ExprId },
    /// `target` is the `ExprId` of the enclosing loop this breaks out of.
    Break { target: ExprId, value: Option<ExprId> },
    Continue { target: ExprId },
    Return(Option<ExprId>),
}

/// A block statement.
#[derive(Debug, Clone)]
pub enum Stmt {
    /// `let local (= init)?;` where the local was declared by name
    /// resolution.
    Let { local: HirLocalId, init: Option<ExprId> },
    Expr(ExprId),
}

#[derive(Debug, Clone, Copy)]
pub enum Literal {
    /// Integer literal split into magnitude and sign so the full unsigned
    /// range is representable.
    Int { magnitude: u64, negative: bool },
    Bool(bool),
    Char(char),
    Str(Symbol),
    Unit,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnOp {
    Not,
    Neg,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinOp {
    Add,
    Sub,
    Mul,
    Div,
    Rem,
    BitAnd,
    BitOr,
    BitXor,
    Shl,
    Shr,
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
}

impl BinOp {
    pub fn is_comparison(self) -> bool {
        matches!(
            self,
            BinOp::Eq | BinOp::Ne | BinOp::Lt | BinOp::Le | BinOp::Gt | BinOp::Ge
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogicalOp {
    And,
    Or,
}

impl Body {
    pub fn expr(&self, id: ExprId) -> &Expr {
        &self.exprs[id]
    }

    pub fn ty(&self, id: ExprId) -> TypeId {
        self.exprs[id].ty
    }

    /// Whether `id` denotes an addressable location: a variable, a deref of
    /// a reference, or a field/index whose base is itself a place.
    pub fn is_place(&self, id: ExprId) -> bool {
        match &self.exprs[id].kind {
            ExprKind::Var(_) | ExprKind::Deref(_) => true,
            ExprKind::Field { base, .. } | ExprKind::Index { base, .. } => self.is_place(*base),
            _ => false,
        }
    }
}
