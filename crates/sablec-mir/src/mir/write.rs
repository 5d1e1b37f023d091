//! Textual rendering of MIR.
//!
//! The output is deterministic: two structurally identical modules print to
//! identical text, which is what the determinism tests compare. Backends
//! use the same rendering for dumps.

use std::fmt;

use sablec_hir::types::TypeInterner;
use sablec_util::Idx;

use super::*;

/// Borrowing wrapper implementing [`fmt::Display`] for a module.
pub struct ModuleWriter<'a> {
    pub module: &'a MirModule,
    pub tys: &'a TypeInterner,
}

impl MirModule {
    pub fn display<'a>(&'a self, tys: &'a TypeInterner) -> ModuleWriter<'a> {
        ModuleWriter { module: self, tys }
    }
}

impl fmt::Display for ModuleWriter<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for global in &self.module.globals {
            writeln!(
                f,
                "global {}: {} = {};",
                global.name,
                self.tys.display_name(global.ty),
                fmt_constant(&global.initial)
            )?;
        }
        for ext in &self.module.external_functions {
            writeln!(f, "extern fn {}{};", ext.name, fmt_sig(&ext.sig, self.tys))?;
        }
        for func in &self.module.functions {
            writeln!(f)?;
            write_function(f, func, self.module, self.tys)?;
        }
        Ok(())
    }
}

/// Borrowing wrapper implementing [`fmt::Display`] for one function.
pub struct FunctionWriter<'a> {
    pub func: &'a MirFunction,
    pub module: &'a MirModule,
    pub tys: &'a TypeInterner,
}

impl MirFunction {
    pub fn display<'a>(
        &'a self,
        module: &'a MirModule,
        tys: &'a TypeInterner,
    ) -> FunctionWriter<'a> {
        FunctionWriter { func: self, module, tys }
    }
}

impl fmt::Display for FunctionWriter<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write_function(f, self.func, self.module, self.tys)
    }
}

fn fmt_sig(sig: &MirFunctionSig, tys: &TypeInterner) -> String {
    let mut out = String::from("(");
    for (i, abi) in sig.abi_params.iter().enumerate() {
        if i > 0 {
            out.push_str(", ");
        }
        match abi.kind {
            AbiParamKind::SRet => {
                if let ReturnDesc::IndirectSret { ty, .. } = &sig.return_desc {
                    out.push_str(&format!("sret {}", tys.display_name(*ty)));
                } else {
                    out.push_str("sret <invalid>");
                }
            }
            AbiParamKind::ByValCallerCopy | AbiParamKind::Direct => {
                let Some(pi) = abi.param_index else {
                    out.push_str("<unlinked>");
                    continue;
                };
                let param = &sig.params[pi.index()];
                let prefix = if abi.kind == AbiParamKind::ByValCallerCopy { "byval " } else { "" };
                out.push_str(&format!(
                    "{}{}: {}",
                    prefix,
                    param.debug_name,
                    tys.display_name(param.ty)
                ));
            }
        }
    }
    out.push(')');
    match &sig.return_desc {
        ReturnDesc::Never => out.push_str(" -> !"),
        ReturnDesc::Void => {}
        ReturnDesc::Direct(ty) => out.push_str(&format!(" -> {}", tys.display_name(*ty))),
        ReturnDesc::IndirectSret { ty, .. } => {
            out.push_str(&format!(" -> sret {}", tys.display_name(*ty)))
        }
    }
    out
}

fn write_function(
    f: &mut fmt::Formatter<'_>,
    func: &MirFunction,
    module: &MirModule,
    tys: &TypeInterner,
) -> fmt::Result {
    writeln!(f, "fn {}{} {{", func.name, fmt_sig(&func.sig, tys))?;
    for (id, local) in func.locals.iter_enumerated() {
        let name = match local.debug_name {
            Some(n) => format!(" // {n}"),
            None => String::new(),
        };
        let alias = match local.alias_target {
            Some(AliasTarget::AbiParam(i)) => format!(" = alias abi[{}]", i.0),
            Some(AliasTarget::Temp(t)) => format!(" = alias t{}", t.0),
            None => String::new(),
        };
        writeln!(
            f,
            "    local l{}: {}{}{}",
            id.0,
            tys.display_name(local.ty),
            alias,
            name
        )?;
    }
    for (id, block) in func.blocks.iter_enumerated() {
        let entry = if id == func.start_block { " // entry" } else { "" };
        writeln!(f, "  bb{}:{}", id.0, entry)?;
        for phi in &block.phis {
            let incoming: Vec<String> = phi
                .incoming
                .iter()
                .map(|(b, t)| format!("bb{}: t{}", b.0, t.0))
                .collect();
            writeln!(f, "    t{} = phi [{}]", phi.dest.0, incoming.join(", "))?;
        }
        for stmt in &block.statements {
            writeln!(f, "    {}", fmt_statement(stmt, module, tys))?;
        }
        match &block.terminator {
            Some(term) => writeln!(f, "    {}", fmt_terminator(term))?,
            None => writeln!(f, "    <missing terminator>")?,
        }
    }
    writeln!(f, "}}")
}

fn fmt_constant(c: &Constant) -> String {
    match &c.value {
        ConstKind::Bool(b) => format!("const {b}"),
        ConstKind::Int { magnitude, negative, signed } => {
            let sign = if *negative { "-" } else { "" };
            let suffix = if *signed { "i" } else { "u" };
            format!("const {sign}{magnitude}{suffix}")
        }
        ConstKind::Char(ch) => format!("const {ch:?}"),
        ConstKind::Str(s) => format!("const {:?}", s.as_str()),
        ConstKind::Unit => "const ()".to_owned(),
        ConstKind::EnumDiscriminant(d) => format!("const discr {d}"),
    }
}

fn fmt_operand(op: &Operand) -> String {
    match op {
        Operand::Temp(t) => format!("t{}", t.0),
        Operand::Const(c) => fmt_constant(c),
    }
}

fn fmt_place(place: &Place) -> String {
    let mut out = match &place.base {
        PlaceBase::Local(l) => format!("l{}", l.0),
        PlaceBase::Global(g) => format!("g{}", g.0),
        PlaceBase::Pointer(t) => format!("*t{}", t.0),
    };
    for projection in &place.projection {
        match projection {
            Projection::Field(i) => out.push_str(&format!(".{i}")),
            Projection::Index(t) => out.push_str(&format!("[t{}]", t.0)),
        }
    }
    out
}

fn fmt_value_source(src: &ValueSource) -> String {
    match src {
        ValueSource::Operand(op) => fmt_operand(op),
        ValueSource::Place(p) => format!("mem({})", fmt_place(p)),
    }
}

fn fmt_bin_op(op: BinOp) -> &'static str {
    match op {
        BinOp::SAdd => "sadd",
        BinOp::UAdd => "uadd",
        BinOp::SSub => "ssub",
        BinOp::USub => "usub",
        BinOp::SMul => "smul",
        BinOp::UMul => "umul",
        BinOp::SDiv => "sdiv",
        BinOp::UDiv => "udiv",
        BinOp::SRem => "srem",
        BinOp::URem => "urem",
        BinOp::BitAnd => "and",
        BinOp::BitOr => "or",
        BinOp::BitXor => "xor",
        BinOp::Shl => "shl",
        BinOp::AShr => "ashr",
        BinOp::LShr => "lshr",
        BinOp::IEq => "icmp eq",
        BinOp::INe => "icmp ne",
        BinOp::SLt => "icmp slt",
        BinOp::SLe => "icmp sle",
        BinOp::SGt => "icmp sgt",
        BinOp::SGe => "icmp sge",
        BinOp::ULt => "icmp ult",
        BinOp::ULe => "icmp ule",
        BinOp::UGt => "icmp ugt",
        BinOp::UGe => "icmp uge",
        BinOp::BoolEq => "bcmp eq",
        BinOp::BoolNe => "bcmp ne",
    }
}

fn fmt_rvalue(rvalue: &RValue, tys: &TypeInterner) -> String {
    match rvalue {
        RValue::Const(c) => fmt_constant(c),
        RValue::BinaryOp { op, lhs, rhs } => {
            format!("{} {}, {}", fmt_bin_op(*op), fmt_operand(lhs), fmt_operand(rhs))
        }
        RValue::UnaryOp { op, operand } => {
            let name = match op {
                UnOp::Not => "not",
                UnOp::Neg => "neg",
            };
            format!("{} {}", name, fmt_operand(operand))
        }
        RValue::Ref(place) => format!("ref {}", fmt_place(place)),
        RValue::Cast { value, target } => {
            format!("cast {} to {}", fmt_operand(value), tys.display_name(*target))
        }
        RValue::ArrayRepeat { value, count } => {
            format!("repeat {} x {}", fmt_operand(value), count)
        }
        RValue::FieldAccess { base, index } => format!("field t{}, {}", base.0, index),
        RValue::IndexAccess { base, index } => format!("index t{}[t{}]", base.0, index.0),
    }
}

fn fmt_init_leaf(leaf: &InitLeaf) -> String {
    match leaf {
        InitLeaf::Omitted => "_".to_owned(),
        InitLeaf::Value(src) => fmt_value_source(src),
    }
}

fn fmt_statement(stmt: &Statement, module: &MirModule, tys: &TypeInterner) -> String {
    match stmt {
        Statement::Define { dest, rvalue } => {
            format!("t{} = {}", dest.0, fmt_rvalue(rvalue, tys))
        }
        Statement::Load { dest, src } => format!("t{} = load {}", dest.0, fmt_place(src)),
        Statement::Assign { dest, src } => {
            format!("{} = {}", fmt_place(dest), fmt_value_source(src))
        }
        Statement::Init { dest, pattern } => {
            let body = match pattern {
                InitPattern::Struct(leaves) => {
                    let parts: Vec<String> = leaves.iter().map(fmt_init_leaf).collect();
                    format!("{{ {} }}", parts.join(", "))
                }
                InitPattern::ArrayLiteral(leaves) => {
                    let parts: Vec<String> = leaves.iter().map(fmt_init_leaf).collect();
                    format!("[{}]", parts.join(", "))
                }
                InitPattern::ArrayRepeat { element, count } => {
                    format!("[{}; {}]", fmt_init_leaf(element), count)
                }
            };
            format!("init {} = {}", fmt_place(dest), body)
        }
        Statement::Call { dest, target, args, sret_dest } => {
            let mut out = String::new();
            if let Some(dest) = dest {
                out.push_str(&format!("t{} = ", dest.0));
            }
            let args: Vec<String> = args.iter().map(fmt_value_source).collect();
            out.push_str(&format!("call {}({})", module.target_name(*target), args.join(", ")));
            if let Some(sret) = sret_dest {
                out.push_str(&format!(" sret({})", fmt_place(sret)));
            }
            out
        }
    }
}

fn fmt_terminator(term: &Terminator) -> String {
    match term {
        Terminator::Goto(target) => format!("goto bb{}", target.0),
        Terminator::SwitchInt { discr, cases, otherwise } => {
            let cases: Vec<String> = cases
                .iter()
                .map(|(c, b)| format!("{} -> bb{}", fmt_constant(c), b.0))
                .collect();
            format!(
                "switch {} [{}] else bb{}",
                fmt_operand(discr),
                cases.join(", "),
                otherwise.0
            )
        }
        Terminator::Return(Some(op)) => format!("return {}", fmt_operand(op)),
        Terminator::Return(None) => "return".to_owned(),
        Terminator::Unreachable => "unreachable".to_owned(),
    }
}
