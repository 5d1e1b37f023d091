//! MIR validation.
//!
//! Checks the invariants a backend may rely on: terminator presence, one
//! definition per temp, use-dominates-def, phi completeness over reachable
//! predecessors, type agreement on loads/assigns/inits/calls/phis/returns,
//! and ABI shape. Unlike the lowerer, the validator keeps going after a
//! finding where it can, so one pass reports every violation in a
//! function.

use sablec_hir::types::{TypeId, TypeInterner, TypeKind};
use sablec_util::{Idx, IndexVec};

use crate::analysis::cfg::Cfg;
use crate::error::{LowerError, LowerErrorKind};
use crate::mir::{
    AbiParamKind, BasicBlockId, InitLeaf, InitPattern, MirFunction, MirFunctionSig, MirModule,
    Operand, ParamIndex, Place, RValue, ReturnDesc, Statement, TempId, Terminator, ValueSource,
};

/// Where a temp is defined or used inside a block.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord)]
enum Pos {
    Phi,
    Stmt(usize),
    Term,
}

pub fn validate_function(
    func: &MirFunction,
    module: &MirModule,
    tys: &TypeInterner,
) -> Vec<LowerError> {
    let mut validator = Validator {
        func,
        module,
        tys,
        cfg: Cfg::new(func),
        def_sites: (0..func.temp_types.len()).map(|_| Vec::new()).collect(),
        errors: Vec::new(),
    };
    validator.check_sig(&func.sig);
    validator.check_structure();
    validator.collect_defs();
    validator.check_temp_defs();
    validator.check_blocks();
    validator
        .errors
        .into_iter()
        .map(|e| e.in_function(func.name))
        .collect()
}

/// Validate every function of a module.
pub fn validate_module(module: &MirModule, tys: &TypeInterner) -> Vec<LowerError> {
    let mut errors = Vec::new();
    for func in module.functions.iter() {
        errors.extend(validate_function(func, module, tys));
    }
    errors
}

struct Validator<'a> {
    func: &'a MirFunction,
    module: &'a MirModule,
    tys: &'a TypeInterner,
    cfg: Cfg,
    def_sites: IndexVec<TempId, Vec<(BasicBlockId, Pos)>>,
    errors: Vec<LowerError>,
}

impl Validator<'_> {
    fn error(&mut self, kind: LowerErrorKind, block: BasicBlockId, pos: Pos) {
        let mut err = LowerError::new(kind).at_block(block);
        if let Pos::Stmt(i) = pos {
            err = err.at_stmt(block, i);
        }
        self.errors.push(err);
    }

    fn sig_error(&mut self, detail: String) {
        self.errors
            .push(LowerError::new(LowerErrorKind::SigInvariant(detail)));
    }

    fn temp_ty(&self, temp: TempId) -> Option<TypeId> {
        self.func.temp_types.get(temp).copied()
    }

    fn operand_ty(&self, op: &Operand) -> Option<TypeId> {
        match op {
            Operand::Temp(t) => self.temp_ty(*t),
            Operand::Const(c) => Some(c.ty),
        }
    }

    fn place_ty(&self, place: &Place) -> Option<TypeId> {
        self.func.place_ty(place, self.tys, &self.module.globals)
    }

    fn value_source_ty(&self, src: &ValueSource) -> Option<TypeId> {
        match src {
            ValueSource::Operand(op) => self.operand_ty(op),
            ValueSource::Place(p) => self.place_ty(p),
        }
    }

    fn ty_name(&self, ty: Option<TypeId>) -> String {
        match ty {
            Some(ty) => self.tys.display_name(ty),
            None => "<ill-typed>".to_owned(),
        }
    }

    // Signature shape.

    fn check_sig(&mut self, sig: &MirFunctionSig) {
        for i in 0..sig.params.len() {
            let slots = sig
                .abi_params
                .iter()
                .filter(|p| p.param_index == Some(ParamIndex(i as u32)))
                .count();
            if slots != 1 {
                self.sig_error(format!("semantic parameter {i} has {slots} ABI slots"));
            }
        }
        let sret_slots: Vec<usize> = sig
            .abi_params
            .iter()
            .enumerate()
            .filter(|(_, p)| p.kind == AbiParamKind::SRet)
            .map(|(i, _)| i)
            .collect();
        match &sig.return_desc {
            ReturnDesc::IndirectSret { sret_index, .. } => {
                let linked = sig.abi_params.get(sret_index.index());
                match linked {
                    Some(p) if p.kind == AbiParamKind::SRet && p.param_index.is_none() => {}
                    _ => self.sig_error("sret_index does not name an sret ABI slot".into()),
                }
                if sret_slots.len() != 1 {
                    self.sig_error(format!("{} sret slots in signature", sret_slots.len()));
                }
            }
            _ => {
                if !sret_slots.is_empty() {
                    self.sig_error("sret slot without an indirect return".into());
                }
            }
        }
    }

    // Block structure: every block carries exactly one terminator.

    fn check_structure(&mut self) {
        if self.func.blocks.is_empty() || !self.func.blocks.contains(self.func.start_block) {
            self.errors.push(LowerError::new(LowerErrorKind::InvariantViolation(
                "function has no valid start block".into(),
            )));
        }
        for (id, block) in self.func.blocks.iter_enumerated() {
            if block.terminator.is_none() {
                self.error(
                    LowerErrorKind::InvariantViolation("block has no terminator".into()),
                    id,
                    Pos::Term,
                );
            }
        }
    }

    // Temp definitions: exactly one site per temp.

    fn collect_defs(&mut self) {
        for (id, block) in self.func.blocks.iter_enumerated() {
            for phi in &block.phis {
                self.record_def(phi.dest, id, Pos::Phi);
            }
            for (i, stmt) in block.statements.iter().enumerate() {
                match stmt {
                    Statement::Define { dest, .. } | Statement::Load { dest, .. } => {
                        self.record_def(*dest, id, Pos::Stmt(i));
                    }
                    Statement::Call { dest: Some(dest), .. } => {
                        self.record_def(*dest, id, Pos::Stmt(i));
                    }
                    _ => {}
                }
            }
        }
    }

    fn record_def(&mut self, temp: TempId, block: BasicBlockId, pos: Pos) {
        match self.def_sites.get_mut(temp) {
            Some(sites) => sites.push((block, pos)),
            None => self.error(
                LowerErrorKind::InvariantViolation(format!(
                    "definition of unknown temp t{}",
                    temp.0
                )),
                block,
                pos,
            ),
        }
    }

    fn check_temp_defs(&mut self) {
        let mut findings = Vec::new();
        for (temp, sites) in self.def_sites.iter_enumerated() {
            if sites.len() != 1 {
                findings.push(LowerError::new(LowerErrorKind::InvariantViolation(
                    format!("temp t{} has {} definition sites", temp.0, sites.len()),
                )));
            }
        }
        self.errors.extend(findings);
    }

    /// Whether the single definition of `temp` dominates a use at
    /// (`block`, `pos`). Phi incomings pass the predecessor as the use
    /// block with `Pos::Term`.
    fn def_dominates_use(&self, temp: TempId, block: BasicBlockId, pos: Pos) -> bool {
        let Some(sites) = self.def_sites.get(temp) else { return false };
        let [(def_block, def_pos)] = sites.as_slice() else {
            // Zero or multiple defs is reported elsewhere.
            return true;
        };
        if *def_block == block {
            return *def_pos < pos;
        }
        self.cfg.dominates(*def_block, block)
    }

    fn check_uses(&mut self, temps: &[TempId], block: BasicBlockId, pos: Pos) {
        for &temp in temps {
            if self.temp_ty(temp).is_none() {
                self.error(
                    LowerErrorKind::InvariantViolation(format!("use of unknown temp t{}", temp.0)),
                    block,
                    pos,
                );
                continue;
            }
            if !self.def_dominates_use(temp, block, pos) {
                self.error(
                    LowerErrorKind::InvariantViolation(format!(
                        "use of t{} is not dominated by its definition",
                        temp.0
                    )),
                    block,
                    pos,
                );
            }
        }
    }

    // Per-block statement, phi and terminator checks.

    fn check_blocks(&mut self) {
        for (id, block) in self.func.blocks.iter_enumerated() {
            if self.cfg.is_reachable(id) {
                self.check_phis(id);
            }
            for (i, stmt) in block.statements.iter().enumerate() {
                let pos = Pos::Stmt(i);
                if self.cfg.is_reachable(id) {
                    let mut used = Vec::new();
                    temps_in_statement(stmt, &mut used);
                    self.check_uses(&used, id, pos);
                }
                self.check_statement(stmt, id, pos);
            }
            if let Some(terminator) = &block.terminator {
                if self.cfg.is_reachable(id) {
                    let mut used = Vec::new();
                    temps_in_terminator(terminator, &mut used);
                    self.check_uses(&used, id, Pos::Term);
                }
                self.check_terminator(terminator, id);
            }
        }
    }

    fn check_phis(&mut self, id: BasicBlockId) {
        let block = &self.func.blocks[id];
        let reachable_preds = self.cfg.reachable_preds(id);
        let mut findings = Vec::new();
        for phi in &block.phis {
            let dest_ty = self.temp_ty(phi.dest);
            for &pred in &reachable_preds {
                let count = phi.incoming.iter().filter(|(b, _)| *b == pred).count();
                if count != 1 {
                    findings.push(LowerErrorKind::InvariantViolation(format!(
                        "phi for t{} has {} entries for predecessor bb{}",
                        phi.dest.0, count, pred.0
                    )));
                }
            }
            for (pred, temp) in &phi.incoming {
                if !reachable_preds.contains(pred) {
                    findings.push(LowerErrorKind::InvariantViolation(format!(
                        "phi for t{} has an entry for non-predecessor bb{}",
                        phi.dest.0, pred.0
                    )));
                    continue;
                }
                let incoming_ty = self.temp_ty(*temp);
                if incoming_ty.is_none() || incoming_ty != dest_ty {
                    findings.push(LowerErrorKind::TypeMismatch(format!(
                        "phi incoming t{} is `{}` but t{} is `{}`",
                        temp.0,
                        self.ty_name(incoming_ty),
                        phi.dest.0,
                        self.ty_name(dest_ty)
                    )));
                }
                if !self.def_dominates_use(*temp, *pred, Pos::Term) {
                    findings.push(LowerErrorKind::InvariantViolation(format!(
                        "phi incoming t{} does not dominate the end of bb{}",
                        temp.0, pred.0
                    )));
                }
            }
        }
        for kind in findings {
            self.error(kind, id, Pos::Phi);
        }
    }

    fn check_statement(&mut self, stmt: &Statement, block: BasicBlockId, pos: Pos) {
        match stmt {
            Statement::Define { dest, rvalue } => self.check_define(*dest, rvalue, block, pos),
            Statement::Load { dest, src } => {
                let dest_ty = self.temp_ty(*dest);
                let src_ty = self.place_ty(src);
                if dest_ty.is_none() || src_ty.is_none() || dest_ty != src_ty {
                    self.error(
                        LowerErrorKind::TypeMismatch(format!(
                            "load of `{}` into temp of `{}`",
                            self.ty_name(src_ty),
                            self.ty_name(dest_ty)
                        )),
                        block,
                        pos,
                    );
                }
            }
            Statement::Assign { dest, src } => {
                let dest_ty = self.place_ty(dest);
                let src_ty = self.value_source_ty(src);
                if dest_ty.is_none() || src_ty.is_none() || dest_ty != src_ty {
                    self.error(
                        LowerErrorKind::TypeMismatch(format!(
                            "assignment of `{}` into place of `{}`",
                            self.ty_name(src_ty),
                            self.ty_name(dest_ty)
                        )),
                        block,
                        pos,
                    );
                }
            }
            Statement::Init { dest, pattern } => self.check_init(dest, pattern, block, pos),
            Statement::Call { dest, target, args, sret_dest } => {
                self.check_call(*dest, *target, args, sret_dest.as_ref(), block, pos)
            }
        }
    }

    fn check_define(&mut self, dest: TempId, rvalue: &RValue, block: BasicBlockId, pos: Pos) {
        let Some(dest_ty) = self.temp_ty(dest) else {
            self.error(
                LowerErrorKind::InvariantViolation(format!("define of unknown temp t{}", dest.0)),
                block,
                pos,
            );
            return;
        };
        let mut findings: Vec<String> = Vec::new();
        match rvalue {
            RValue::Const(c) => {
                if c.ty != dest_ty {
                    findings.push(format!(
                        "constant of `{}` defines temp of `{}`",
                        self.tys.display_name(c.ty),
                        self.tys.display_name(dest_ty)
                    ));
                }
            }
            RValue::BinaryOp { op, lhs, rhs } => {
                let lhs_ty = self.operand_ty(lhs);
                let rhs_ty = self.operand_ty(rhs);
                if lhs_ty.is_none() || lhs_ty != rhs_ty {
                    findings.push(format!(
                        "binary operands disagree: `{}` vs `{}`",
                        self.ty_name(lhs_ty),
                        self.ty_name(rhs_ty)
                    ));
                } else if op.is_comparison() {
                    if !self.tys.is_bool(dest_ty) {
                        findings.push("comparison result must be bool".into());
                    }
                } else if lhs_ty != Some(dest_ty) {
                    findings.push("arithmetic result type must match its operands".into());
                }
            }
            RValue::UnaryOp { operand, .. } => {
                if self.operand_ty(operand) != Some(dest_ty) {
                    findings.push("unary result type must match its operand".into());
                }
            }
            RValue::Ref(place) => {
                let pointee = self.place_ty(place);
                match (self.tys.kind(dest_ty), pointee) {
                    (TypeKind::Ref { pointee: p, .. }, Some(ty)) if *p == ty => {}
                    _ => findings.push(format!(
                        "ref to `{}` defines temp of `{}`",
                        self.ty_name(pointee),
                        self.tys.display_name(dest_ty)
                    )),
                }
            }
            RValue::Cast { target, .. } => {
                if *target != dest_ty {
                    findings.push("cast target type must match the destination temp".into());
                }
            }
            RValue::ArrayRepeat { value, count } => {
                let elem_ty = self.operand_ty(value);
                let ok = matches!(
                    self.tys.kind(dest_ty),
                    TypeKind::Array { elem, len } if Some(*elem) == elem_ty && len == count
                );
                if !ok {
                    findings.push("array-repeat shape disagrees with the destination".into());
                }
            }
            RValue::FieldAccess { base, index } => {
                let field_ty = self
                    .temp_ty(*base)
                    .and_then(|t| self.tys.field_ty(t, *index));
                if field_ty != Some(dest_ty) {
                    findings.push(format!(
                        "field access yields `{}` but defines `{}`",
                        self.ty_name(field_ty),
                        self.tys.display_name(dest_ty)
                    ));
                }
            }
            RValue::IndexAccess { base, index } => {
                let elem_ty = self.temp_ty(*base).and_then(|t| self.tys.element_ty(t));
                if elem_ty != Some(dest_ty) {
                    findings.push("index access result disagrees with the element type".into());
                }
                let idx_ok = self
                    .temp_ty(*index)
                    .is_some_and(|t| self.tys.int_kind(t).is_some());
                if !idx_ok {
                    findings.push("index operand must be an integer temp".into());
                }
            }
        }
        for detail in findings {
            self.error(LowerErrorKind::TypeMismatch(detail), block, pos);
        }
    }

    fn check_init(&mut self, dest: &Place, pattern: &InitPattern, block: BasicBlockId, pos: Pos) {
        let Some(dest_ty) = self.place_ty(dest) else {
            self.error(
                LowerErrorKind::TypeMismatch("init destination does not type-check".into()),
                block,
                pos,
            );
            return;
        };
        let mut findings = Vec::new();
        match pattern {
            InitPattern::Struct(leaves) => {
                match self.tys.field_count(dest_ty) {
                    Some(count) if count == leaves.len() => {
                        for (i, leaf) in leaves.iter().enumerate() {
                            if let InitLeaf::Value(src) = leaf {
                                let leaf_ty = self.value_source_ty(src);
                                let field_ty = self.tys.field_ty(dest_ty, i as u32);
                                if leaf_ty.is_none() || leaf_ty != field_ty {
                                    findings.push(LowerErrorKind::TypeMismatch(format!(
                                        "init field {i} is `{}` but the field is `{}`",
                                        self.ty_name(leaf_ty),
                                        self.ty_name(field_ty)
                                    )));
                                }
                            }
                        }
                    }
                    Some(count) => findings.push(LowerErrorKind::TypeMismatch(format!(
                        "struct init covers {} of {count} fields",
                        leaves.len()
                    ))),
                    None => findings.push(LowerErrorKind::TypeMismatch(
                        "struct init into a non-struct place".into(),
                    )),
                }
            }
            InitPattern::ArrayLiteral(leaves) => {
                let elem_ty = self.tys.element_ty(dest_ty);
                match self.tys.array_len(dest_ty) {
                    Some(len) if len == leaves.len() as u64 => {
                        for (i, leaf) in leaves.iter().enumerate() {
                            if let InitLeaf::Value(src) = leaf {
                                let leaf_ty = self.value_source_ty(src);
                                if leaf_ty.is_none() || leaf_ty != elem_ty {
                                    findings.push(LowerErrorKind::TypeMismatch(format!(
                                        "init element {i} is `{}` but elements are `{}`",
                                        self.ty_name(leaf_ty),
                                        self.ty_name(elem_ty)
                                    )));
                                }
                            }
                        }
                    }
                    Some(len) => findings.push(LowerErrorKind::TypeMismatch(format!(
                        "array init covers {} of {len} elements",
                        leaves.len()
                    ))),
                    None => findings.push(LowerErrorKind::TypeMismatch(
                        "array init into a non-array place".into(),
                    )),
                }
            }
            InitPattern::ArrayRepeat { element, count } => {
                if self.tys.array_len(dest_ty) != Some(*count) {
                    findings.push(LowerErrorKind::TypeMismatch(
                        "array-repeat count disagrees with the array length".into(),
                    ));
                }
                if let InitLeaf::Value(src) = element {
                    let leaf_ty = self.value_source_ty(src);
                    let elem_ty = self.tys.element_ty(dest_ty);
                    if leaf_ty.is_none() || leaf_ty != elem_ty {
                        findings.push(LowerErrorKind::TypeMismatch(
                            "array-repeat element type disagrees".into(),
                        ));
                    }
                }
            }
        }
        for kind in findings {
            self.error(kind, block, pos);
        }
    }

    fn check_call(
        &mut self,
        dest: Option<TempId>,
        target: crate::mir::CallTarget,
        args: &[ValueSource],
        sret_dest: Option<&Place>,
        block: BasicBlockId,
        pos: Pos,
    ) {
        let sig = self.module.target_sig(target).clone();
        let mut findings = Vec::new();
        if args.len() != sig.params.len() {
            findings.push(LowerErrorKind::InvariantViolation(format!(
                "call passes {} arguments for {} parameters",
                args.len(),
                sig.params.len()
            )));
        }
        for (i, arg) in args.iter().enumerate().take(sig.params.len()) {
            let Some((_, abi)) = sig.abi_param_for(i) else {
                findings.push(LowerErrorKind::SigInvariant(format!(
                    "callee parameter {i} has no ABI slot"
                )));
                continue;
            };
            let kind_ok = match abi.kind {
                AbiParamKind::Direct => matches!(arg, ValueSource::Operand(_)),
                AbiParamKind::ByValCallerCopy => matches!(arg, ValueSource::Place(_)),
                AbiParamKind::SRet => false,
            };
            if !kind_ok {
                findings.push(LowerErrorKind::InvariantViolation(format!(
                    "argument {i} does not match its ABI slot kind"
                )));
            }
            let arg_ty = self.value_source_ty(arg);
            if arg_ty.is_none() || arg_ty != Some(sig.params[i].ty) {
                findings.push(LowerErrorKind::TypeMismatch(format!(
                    "argument {i} is `{}` but the parameter is `{}`",
                    self.ty_name(arg_ty),
                    self.tys.display_name(sig.params[i].ty)
                )));
            }
        }
        match &sig.return_desc {
            ReturnDesc::Direct(ret_ty) => {
                match dest {
                    Some(d) if self.temp_ty(d) == Some(*ret_ty) => {}
                    Some(_) => findings.push(LowerErrorKind::TypeMismatch(
                        "call destination type disagrees with the return type".into(),
                    )),
                    None => findings.push(LowerErrorKind::InvariantViolation(
                        "direct-return call has no destination temp".into(),
                    )),
                }
                if sret_dest.is_some() {
                    findings.push(LowerErrorKind::InvariantViolation(
                        "direct-return call carries an sret destination".into(),
                    ));
                }
            }
            ReturnDesc::Void | ReturnDesc::Never => {
                if dest.is_some() || sret_dest.is_some() {
                    findings.push(LowerErrorKind::InvariantViolation(
                        "valueless call carries a destination".into(),
                    ));
                }
            }
            ReturnDesc::IndirectSret { ty, .. } => {
                if dest.is_some() {
                    findings.push(LowerErrorKind::InvariantViolation(
                        "sret call also has a destination temp".into(),
                    ));
                }
                match sret_dest {
                    Some(place) if self.place_ty(place) == Some(*ty) => {}
                    Some(_) => findings.push(LowerErrorKind::TypeMismatch(
                        "sret destination type disagrees with the return type".into(),
                    )),
                    None => findings.push(LowerErrorKind::InvariantViolation(
                        "sret call has no sret destination".into(),
                    )),
                }
            }
        }
        for kind in findings {
            self.error(kind, block, pos);
        }
    }

    fn check_terminator(&mut self, terminator: &Terminator, block: BasicBlockId) {
        let mut findings = Vec::new();
        match terminator {
            Terminator::Goto(target) => {
                if !self.func.blocks.contains(*target) {
                    findings.push(LowerErrorKind::InvariantViolation(
                        "goto to an unknown block".into(),
                    ));
                }
            }
            Terminator::SwitchInt { discr, cases, otherwise } => {
                let discr_ty = self.operand_ty(discr);
                let switchable = discr_ty.is_some_and(|t| {
                    matches!(
                        self.tys.kind(t),
                        TypeKind::Int(_) | TypeKind::Bool | TypeKind::Char | TypeKind::Enum(_)
                    )
                });
                if !switchable {
                    findings.push(LowerErrorKind::TypeMismatch(format!(
                        "switch discriminant of `{}` is not an integer",
                        self.ty_name(discr_ty)
                    )));
                }
                for (case, target) in cases {
                    if Some(case.ty) != discr_ty {
                        findings.push(LowerErrorKind::TypeMismatch(
                            "switch case constant type disagrees with the discriminant".into(),
                        ));
                    }
                    if !self.func.blocks.contains(*target) {
                        findings.push(LowerErrorKind::InvariantViolation(
                            "switch case targets an unknown block".into(),
                        ));
                    }
                }
                if !self.func.blocks.contains(*otherwise) {
                    findings.push(LowerErrorKind::InvariantViolation(
                        "switch otherwise targets an unknown block".into(),
                    ));
                }
            }
            Terminator::Return(value) => match (&self.func.sig.return_desc, value) {
                (ReturnDesc::Never, _) => findings.push(LowerErrorKind::InvalidReturn(
                    "return terminator in a diverging function".into(),
                )),
                (ReturnDesc::Void, None) | (ReturnDesc::IndirectSret { .. }, None) => {}
                (ReturnDesc::Void, Some(_)) | (ReturnDesc::IndirectSret { .. }, Some(_)) => {
                    findings.push(LowerErrorKind::InvalidReturn(
                        "return carries a value where none is allowed".into(),
                    ))
                }
                (ReturnDesc::Direct(ret_ty), Some(op)) => {
                    let op_ty = self.operand_ty(op);
                    if op_ty != Some(*ret_ty) {
                        findings.push(LowerErrorKind::TypeMismatch(format!(
                            "return value is `{}` but the function returns `{}`",
                            self.ty_name(op_ty),
                            self.tys.display_name(*ret_ty)
                        )));
                    }
                }
                (ReturnDesc::Direct(_), None) => findings.push(LowerErrorKind::InvalidReturn(
                    "return without a value in a value-returning function".into(),
                )),
            },
            Terminator::Unreachable => {}
        }
        for kind in findings {
            self.error(kind, block, Pos::Term);
        }
    }
}

// Temp-use collection helpers.

fn temps_in_operand(op: &Operand, out: &mut Vec<TempId>) {
    if let Operand::Temp(t) = op {
        out.push(*t);
    }
}

fn temps_in_place(place: &Place, out: &mut Vec<TempId>) {
    if let crate::mir::PlaceBase::Pointer(t) = &place.base {
        out.push(*t);
    }
    for projection in &place.projection {
        if let crate::mir::Projection::Index(t) = projection {
            out.push(*t);
        }
    }
}

fn temps_in_value_source(src: &ValueSource, out: &mut Vec<TempId>) {
    match src {
        ValueSource::Operand(op) => temps_in_operand(op, out),
        ValueSource::Place(p) => temps_in_place(p, out),
    }
}

fn temps_in_rvalue(rvalue: &RValue, out: &mut Vec<TempId>) {
    match rvalue {
        RValue::Const(_) => {}
        RValue::BinaryOp { lhs, rhs, .. } => {
            temps_in_operand(lhs, out);
            temps_in_operand(rhs, out);
        }
        RValue::UnaryOp { operand, .. } => temps_in_operand(operand, out),
        RValue::Ref(place) => temps_in_place(place, out),
        RValue::Cast { value, .. } => temps_in_operand(value, out),
        RValue::ArrayRepeat { value, .. } => temps_in_operand(value, out),
        RValue::FieldAccess { base, .. } => out.push(*base),
        RValue::IndexAccess { base, index } => {
            out.push(*base);
            out.push(*index);
        }
    }
}

fn temps_in_statement(stmt: &Statement, out: &mut Vec<TempId>) {
    match stmt {
        Statement::Define { rvalue, .. } => temps_in_rvalue(rvalue, out),
        Statement::Load { src, .. } => temps_in_place(src, out),
        Statement::Assign { dest, src } => {
            temps_in_place(dest, out);
            temps_in_value_source(src, out);
        }
        Statement::Init { dest, pattern } => {
            temps_in_place(dest, out);
            match pattern {
                InitPattern::Struct(leaves) | InitPattern::ArrayLiteral(leaves) => {
                    for leaf in leaves {
                        if let InitLeaf::Value(src) = leaf {
                            temps_in_value_source(src, out);
                        }
                    }
                }
                InitPattern::ArrayRepeat { element, .. } => {
                    if let InitLeaf::Value(src) = element {
                        temps_in_value_source(src, out);
                    }
                }
            }
        }
        Statement::Call { args, sret_dest, .. } => {
            for arg in args {
                temps_in_value_source(arg, out);
            }
            if let Some(place) = sret_dest {
                temps_in_place(place, out);
            }
        }
    }
}

fn temps_in_terminator(terminator: &Terminator, out: &mut Vec<TempId>) {
    match terminator {
        Terminator::SwitchInt { discr, .. } => temps_in_operand(discr, out),
        Terminator::Return(Some(op)) => temps_in_operand(op, out),
        Terminator::Goto(_) | Terminator::Return(None) | Terminator::Unreachable => {}
    }
}
