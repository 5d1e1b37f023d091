//! The predefined builtin scope.
//!
//! Builtins are body-less callables every program can name without
//! declaring them. Their `DefId`s live in a reserved range below
//! `DefId::DUMMY` so name resolution and function collection agree on them
//! without coordination.

use sablec_util::{DefId, Symbol};

use crate::hir::ParamDecl;
use crate::types::{TypeId, TypeInterner};

/// First id of the reserved builtin range.
pub const BUILTIN_DEF_ID_BASE: u32 = 0xFFFF_0000;

pub const PRINT: DefId = DefId(BUILTIN_DEF_ID_BASE);
pub const PRINTLN: DefId = DefId(BUILTIN_DEF_ID_BASE + 1);
pub const PRINT_INT: DefId = DefId(BUILTIN_DEF_ID_BASE + 2);
pub const GET_INT: DefId = DefId(BUILTIN_DEF_ID_BASE + 3);
pub const GET_STRING: DefId = DefId(BUILTIN_DEF_ID_BASE + 4);
pub const EXIT: DefId = DefId(BUILTIN_DEF_ID_BASE + 5);

/// A builtin's resolved declaration.
pub struct BuiltinDecl {
    pub def_id: DefId,
    pub name: Symbol,
    pub params: Vec<ParamDecl>,
    pub ret_ty: TypeId,
}

/// All builtins, in their stable declaration order.
pub fn all(tys: &mut TypeInterner) -> Vec<BuiltinDecl> {
    let str_ty = tys.str();
    let i32_ty = tys.i32();
    let unit = tys.unit();
    let never = tys.never();

    let param = |name: &str, ty: TypeId| ParamDecl { name: Symbol::intern(name), ty };

    vec![
        BuiltinDecl {
            def_id: PRINT,
            name: Symbol::intern("print"),
            params: vec![param("s", str_ty)],
            ret_ty: unit,
        },
        BuiltinDecl {
            def_id: PRINTLN,
            name: Symbol::intern("println"),
            params: vec![param("s", str_ty)],
            ret_ty: unit,
        },
        BuiltinDecl {
            def_id: PRINT_INT,
            name: Symbol::intern("printInt"),
            params: vec![param("value", i32_ty)],
            ret_ty: unit,
        },
        BuiltinDecl {
            def_id: GET_INT,
            name: Symbol::intern("getInt"),
            params: Vec::new(),
            ret_ty: i32_ty,
        },
        BuiltinDecl {
            def_id: GET_STRING,
            name: Symbol::intern("getString"),
            params: Vec::new(),
            ret_ty: str_ty,
        },
        BuiltinDecl {
            def_id: EXIT,
            name: Symbol::intern("exit"),
            params: vec![param("code", i32_ty)],
            ret_ty: never,
        },
    ]
}
