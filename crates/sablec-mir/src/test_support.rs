//! Shared helpers for the lowering tests.

use sablec_hir::build::BodyBuilder;
use sablec_hir::hir::{FnDef, HirLocalId, ParamDecl, Program};
use sablec_hir::types::{FieldDef, TypeId, TypeInterner};
use sablec_util::{DefId, Symbol};

use crate::lower::lower_program;
use crate::mir::MirModule;

/// Lower and panic with the full error list on failure. `lower_program`
/// already validates every function before returning.
pub(crate) fn lower_ok(program: &Program, tys: &mut TypeInterner) -> MirModule {
    lower_program(program, tys)
        .unwrap_or_else(|errors| panic!("lowering failed:\n{errors:#?}"))
}

/// Declare the scenario struct `Pair { x: i32, y: i32 }`.
pub(crate) fn declare_pair(tys: &mut TypeInterner) -> (sablec_hir::types::StructId, TypeId) {
    let i32_ty = tys.i32();
    tys.declare_struct(
        Symbol::intern("Pair"),
        vec![
            FieldDef { name: Symbol::intern("x"), ty: i32_ty },
            FieldDef { name: Symbol::intern("y"), ty: i32_ty },
        ],
    )
}

/// Start a body whose first locals are the function's parameters.
pub(crate) fn body_with_params(params: &[(&str, TypeId)]) -> (BodyBuilder, Vec<HirLocalId>) {
    let mut builder = BodyBuilder::new();
    let locals = params
        .iter()
        .map(|(name, ty)| builder.local(name, *ty))
        .collect();
    (builder, locals)
}

pub(crate) fn param_decls(params: &[(&str, TypeId)]) -> Vec<ParamDecl> {
    params
        .iter()
        .map(|(name, ty)| ParamDecl { name: Symbol::intern(name), ty: *ty })
        .collect()
}

pub(crate) fn fn_def(
    def_id: u32,
    name: &str,
    params: &[(&str, TypeId)],
    ret_ty: TypeId,
    body: sablec_hir::Body,
) -> FnDef {
    FnDef {
        def_id: DefId(def_id),
        name: Symbol::intern(name),
        params: param_decls(params),
        ret_ty,
        body: Some(body),
    }
}
