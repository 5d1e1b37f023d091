//! Signature construction.
//!
//! Turns a callable's semantic parameter list and return type into a
//! [`MirFunctionSig`]: the return descriptor, the programmer-visible
//! params, and the ABI slots the backend emits. Signatures are computed for
//! every callable, internal and external, before any body is lowered; the
//! call mapper consults callee ABI while lowering.

use sablec_hir::hir::ParamDecl;
use sablec_hir::types::{TypeId, TypeInterner};
use sablec_util::Symbol;

use crate::error::{LowerError, LowerErrorKind};
use crate::mir::{
    AbiAttrs, AbiParam, AbiParamIndex, AbiParamKind, LocalId, MirFunctionSig, MirParam,
    ParamIndex, ReturnDesc,
};

/// Build the signature for a callable named `name`.
///
/// ABI slot order: the hidden sret slot first if the return type is an
/// aggregate, then one byval slot per aggregate parameter in parameter
/// order, then one direct slot per remaining parameter in parameter order.
/// Slots carry `param_index` links back to the semantic parameter they
/// implement; consumers must locate slots through those links, not by
/// position.
pub fn build_sig(
    name: Symbol,
    params: &[ParamDecl],
    ret_ty: TypeId,
    tys: &TypeInterner,
) -> Result<MirFunctionSig, LowerError> {
    if !ret_ty.is_valid() {
        return Err(LowerError::new(LowerErrorKind::SigInvariant(format!(
            "`{name}` has no resolved return type"
        ))));
    }

    let return_desc = if tys.is_never(ret_ty) {
        ReturnDesc::Never
    } else if tys.is_unit(ret_ty) {
        ReturnDesc::Void
    } else if tys.is_aggregate(ret_ty) {
        // sret_index is back-patched once the abi slots exist.
        ReturnDesc::IndirectSret { ty: ret_ty, sret_index: AbiParamIndex::INVALID }
    } else {
        ReturnDesc::Direct(ret_ty)
    };

    let mut mir_params = Vec::with_capacity(params.len());
    for param in params {
        if !param.ty.is_valid() {
            return Err(LowerError::new(LowerErrorKind::SigInvariant(format!(
                "parameter `{}` of `{name}` has no resolved type",
                param.name
            ))));
        }
        mir_params.push(MirParam {
            local: LocalId::INVALID,
            ty: param.ty,
            debug_name: param.name,
        });
    }

    let mut abi_params = Vec::new();
    if matches!(return_desc, ReturnDesc::IndirectSret { .. }) {
        abi_params.push(AbiParam {
            param_index: None,
            kind: AbiParamKind::SRet,
            attrs: AbiAttrs::NOALIAS | AbiAttrs::NONNULL | AbiAttrs::NOUNDEF,
        });
    }
    for (i, param) in params.iter().enumerate() {
        if tys.is_aggregate(param.ty) {
            abi_params.push(AbiParam {
                param_index: Some(ParamIndex(i as u32)),
                kind: AbiParamKind::ByValCallerCopy,
                attrs: AbiAttrs::NOALIAS | AbiAttrs::NONNULL | AbiAttrs::NOUNDEF,
            });
        }
    }
    for (i, param) in params.iter().enumerate() {
        if !tys.is_aggregate(param.ty) {
            abi_params.push(AbiParam {
                param_index: Some(ParamIndex(i as u32)),
                kind: AbiParamKind::Direct,
                attrs: AbiAttrs::EMPTY,
            });
        }
    }

    let return_desc = match return_desc {
        ReturnDesc::IndirectSret { ty, .. } => {
            let sret_index = abi_params
                .iter()
                .position(|p| p.kind == AbiParamKind::SRet)
                .map(|i| AbiParamIndex(i as u32))
                .expect("sret slot was just pushed");
            ReturnDesc::IndirectSret { ty, sret_index }
        }
        other => other,
    };

    Ok(MirFunctionSig { return_desc, params: mir_params, abi_params })
}

#[cfg(test)]
mod tests {
    use super::*;
    use sablec_hir::types::FieldDef;

    fn pair_ty(tys: &mut TypeInterner) -> TypeId {
        let i32_ty = tys.i32();
        let (_, ty) = tys.declare_struct(
            Symbol::intern("Pair"),
            vec![
                FieldDef { name: Symbol::intern("x"), ty: i32_ty },
                FieldDef { name: Symbol::intern("y"), ty: i32_ty },
            ],
        );
        ty
    }

    fn param(name: &str, ty: TypeId) -> ParamDecl {
        ParamDecl { name: Symbol::intern(name), ty }
    }

    #[test]
    fn scalar_fn_is_direct() {
        let mut tys = TypeInterner::new();
        let i32_ty = tys.i32();
        let sig = build_sig(
            Symbol::intern("add"),
            &[param("a", i32_ty), param("b", i32_ty)],
            i32_ty,
            &tys,
        )
        .unwrap();

        assert_eq!(sig.return_desc, ReturnDesc::Direct(i32_ty));
        assert_eq!(sig.abi_params.len(), 2);
        assert!(sig
            .abi_params
            .iter()
            .all(|p| p.kind == AbiParamKind::Direct));
        assert_eq!(sig.abi_params[0].param_index, Some(ParamIndex(0)));
        assert_eq!(sig.abi_params[1].param_index, Some(ParamIndex(1)));
    }

    #[test]
    fn aggregate_return_gets_sret_slot_first() {
        let mut tys = TypeInterner::new();
        let i32_ty = tys.i32();
        let pair = pair_ty(&mut tys);
        let sig = build_sig(
            Symbol::intern("make"),
            &[param("a", i32_ty), param("b", i32_ty)],
            pair,
            &tys,
        )
        .unwrap();

        assert_eq!(
            sig.return_desc,
            ReturnDesc::IndirectSret { ty: pair, sret_index: AbiParamIndex(0) }
        );
        assert_eq!(sig.abi_params.len(), 3);
        assert_eq!(sig.abi_params[0].kind, AbiParamKind::SRet);
        assert_eq!(sig.abi_params[0].param_index, None);
        assert!(sig.abi_params[0].attrs.contains(AbiAttrs::NOALIAS));
        assert_eq!(sig.abi_params[1].kind, AbiParamKind::Direct);
        assert_eq!(sig.abi_params[2].kind, AbiParamKind::Direct);
    }

    #[test]
    fn aggregate_params_become_byval_and_precede_directs() {
        let mut tys = TypeInterner::new();
        let i32_ty = tys.i32();
        let pair = pair_ty(&mut tys);
        let sig = build_sig(
            Symbol::intern("f"),
            &[param("a", i32_ty), param("p", pair), param("b", i32_ty)],
            i32_ty,
            &tys,
        )
        .unwrap();

        // Byval slots come before direct slots; links identify the params.
        assert_eq!(sig.abi_params.len(), 3);
        assert_eq!(sig.abi_params[0].kind, AbiParamKind::ByValCallerCopy);
        assert_eq!(sig.abi_params[0].param_index, Some(ParamIndex(1)));
        assert_eq!(sig.abi_params[1].param_index, Some(ParamIndex(0)));
        assert_eq!(sig.abi_params[2].param_index, Some(ParamIndex(2)));

        let (abi_idx, abi) = sig.abi_param_for(1).unwrap();
        assert_eq!(abi_idx, AbiParamIndex(0));
        assert_eq!(abi.kind, AbiParamKind::ByValCallerCopy);
    }

    #[test]
    fn never_and_unit_returns() {
        let mut tys = TypeInterner::new();
        let unit = tys.unit();
        let never = tys.never();
        let sig = build_sig(Symbol::intern("v"), &[], unit, &tys).unwrap();
        assert_eq!(sig.return_desc, ReturnDesc::Void);
        let sig = build_sig(Symbol::intern("n"), &[], never, &tys).unwrap();
        assert_eq!(sig.return_desc, ReturnDesc::Never);
    }

    #[test]
    fn references_are_direct() {
        let mut tys = TypeInterner::new();
        let pair = pair_ty(&mut tys);
        let r = tys.make_ref(pair, true);
        let sig = build_sig(Symbol::intern("touch"), &[param("p", r)], tys.unit(), &tys).unwrap();
        assert_eq!(sig.abi_params.len(), 1);
        assert_eq!(sig.abi_params[0].kind, AbiParamKind::Direct);
    }

    #[test]
    fn missing_type_is_a_sig_error() {
        let tys = TypeInterner::new();
        let err = build_sig(
            Symbol::intern("broken"),
            &[param("x", TypeId::INVALID)],
            TypeId::INVALID,
            &tys,
        )
        .unwrap_err();
        assert!(matches!(err.kind, LowerErrorKind::SigInvariant(_)));
    }
}
