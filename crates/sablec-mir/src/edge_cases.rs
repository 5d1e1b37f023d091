//! Edge-case lowering tests.

use sablec_hir::build::BodyBuilder;
use sablec_hir::builtin;
use sablec_hir::hir::{BinOp as HirBinOp, LogicalOp, Program, Stmt};
use sablec_hir::types::{IntKind, TypeInterner, VariantDef};
use sablec_util::Symbol;

use crate::mir::*;
use crate::test_support::*;

// ==================== CONTROL FLOW BOUNDARIES ====================

/// EDGE CASE (B1): `loop { break }`. The body is exactly a goto to the
/// join and the join carries no phi.
#[test]
fn b1_loop_with_bare_break() {
    let mut tys = TypeInterner::new();
    let unit_ty = tys.unit();
    let never_ty = tys.never();

    let mut b = BodyBuilder::new();
    let loop_id = b.reserve();
    let brk = b.break_(loop_id, None, never_ty);
    let loop_body = b.block(vec![Stmt::Expr(brk)], None, unit_ty);
    b.loop_at(loop_id, loop_body, unit_ty);
    let root = b.block(vec![Stmt::Expr(loop_id)], None, unit_ty);
    let body = b.finish(root);

    let mut program = Program::default();
    program.functions.push(fn_def(0, "f", &[], unit_ty, body));

    let module = lower_ok(&program, &mut tys);
    let func = &module.functions[FunctionId(0)];
    assert_eq!(func.blocks.len(), 3);

    let entry = &func.blocks[func.start_block];
    let Some(Terminator::Goto(body_block)) = entry.terminator else {
        panic!("entry jumps into the loop body");
    };
    let loop_body = &func.blocks[body_block];
    assert!(loop_body.statements.is_empty());
    let Some(Terminator::Goto(join)) = loop_body.terminator else {
        panic!("loop body is exactly a goto to the join");
    };
    assert_ne!(join, body_block, "bare break leaves the loop, no backedge");
    assert!(func.blocks[join].phis.is_empty());
}

/// EDGE CASE (B2): an aggregate-valued `if` with a destination hint writes
/// into the hint in both branches and emits no phi.
#[test]
fn b2_aggregate_if_into_destination_has_no_phi() {
    let mut tys = TypeInterner::new();
    let i32_ty = tys.i32();
    let bool_ty = tys.bool();
    let (pair_id, pair_ty) = declare_pair(&mut tys);

    let (mut b, params) = body_with_params(&[("c", bool_ty)]);
    let p = b.local("p", pair_ty);
    let cond = b.var(params[0], bool_ty);
    let one = b.lit_int(1, i32_ty);
    let two = b.lit_int(2, i32_ty);
    let then_lit = b.struct_lit(pair_id, vec![one, two], pair_ty);
    let three = b.lit_int(3, i32_ty);
    let four = b.lit_int(4, i32_ty);
    let else_lit = b.struct_lit(pair_id, vec![three, four], pair_ty);
    let if_expr = b.if_(cond, then_lit, Some(else_lit), pair_ty);
    let let_p = b.let_stmt(p, Some(if_expr));
    let p_use = b.var(p, pair_ty);
    let x = b.field(p_use, 0, i32_ty);
    let root = b.block(vec![let_p], Some(x), i32_ty);
    let body = b.finish(root);

    let mut program = Program::default();
    program
        .functions
        .push(fn_def(0, "f", &[("c", bool_ty)], i32_ty, body));

    let module = lower_ok(&program, &mut tys);
    let func = &module.functions[FunctionId(0)];

    assert!(func.blocks.iter().all(|b| b.phis.is_empty()), "no phi for a hinted if");
    let p_place = Place::local(LocalId(1));
    let inits_into_p = func
        .blocks
        .iter()
        .flat_map(|b| &b.statements)
        .filter(|s| matches!(s, Statement::Init { dest, .. } if *dest == p_place))
        .count();
    assert_eq!(inits_into_p, 2, "each branch initializes the destination");
}

/// EDGE CASE (B3): `return expr` in an sret function writes through the
/// sret place and returns no operand.
#[test]
fn b3_return_from_sret_function() {
    let mut tys = TypeInterner::new();
    let i32_ty = tys.i32();
    let never_ty = tys.never();
    let (pair_id, pair_ty) = declare_pair(&mut tys);

    let mut b = BodyBuilder::new();
    let one = b.lit_int(1, i32_ty);
    let two = b.lit_int(2, i32_ty);
    let lit = b.struct_lit(pair_id, vec![one, two], pair_ty);
    let ret = b.return_(Some(lit), never_ty);
    let root = b.block(vec![Stmt::Expr(ret)], None, never_ty);
    let body = b.finish(root);

    let mut program = Program::default();
    program.functions.push(fn_def(0, "make", &[], pair_ty, body));

    let module = lower_ok(&program, &mut tys);
    let func = &module.functions[FunctionId(0)];

    let ret_slot = func
        .locals
        .iter_enumerated()
        .find(|(_, l)| l.is_alias)
        .map(|(id, _)| id)
        .expect("aliased return slot");
    let writes_slot = func.blocks.iter().flat_map(|b| &b.statements).any(|s| {
        matches!(s, Statement::Init { dest, .. } if *dest == Place::local(ret_slot))
    });
    assert!(writes_slot);
    for block in func.blocks.iter() {
        if let Some(Terminator::Return(value)) = &block.terminator {
            assert!(value.is_none(), "sret return carries no operand");
        }
    }
}

/// EDGE CASE (B4): `false && b` still builds the full short-circuit CFG;
/// the lowerer does no constant folding.
#[test]
fn b4_short_circuit_with_constant_lhs_is_not_folded() {
    let mut tys = TypeInterner::new();
    let bool_ty = tys.bool();

    let (mut b, params) = body_with_params(&[("b", bool_ty)]);
    let lhs = b.lit_bool(false, bool_ty);
    let rhs = b.var(params[0], bool_ty);
    let and = b.logical(LogicalOp::And, lhs, rhs, bool_ty);
    let root = b.block(vec![], Some(and), bool_ty);
    let body = b.finish(root);

    let mut program = Program::default();
    program
        .functions
        .push(fn_def(0, "f", &[("b", bool_ty)], bool_ty, body));

    let module = lower_ok(&program, &mut tys);
    let func = &module.functions[FunctionId(0)];

    assert_eq!(func.blocks.len(), 3);
    assert!(matches!(
        func.blocks[func.start_block].terminator,
        Some(Terminator::SwitchInt { .. })
    ));
    let phis: Vec<_> = func.blocks.iter().flat_map(|b| &b.phis).collect();
    assert_eq!(phis.len(), 1);
    assert_eq!(phis[0].incoming.len(), 2);
}

// ==================== FUNCTIONS AND RETURNS ====================

/// EDGE CASE: empty unit function.
#[test]
fn empty_unit_function() {
    let mut tys = TypeInterner::new();
    let unit_ty = tys.unit();

    let mut b = BodyBuilder::new();
    let root = b.block(vec![], None, unit_ty);
    let body = b.finish(root);

    let mut program = Program::default();
    program.functions.push(fn_def(0, "nop", &[], unit_ty, body));

    let module = lower_ok(&program, &mut tys);
    let func = &module.functions[FunctionId(0)];
    assert_eq!(func.blocks.len(), 1);
    assert!(func.blocks[func.start_block].statements.is_empty());
    assert_eq!(
        func.blocks[func.start_block].terminator,
        Some(Terminator::Return(None))
    );
}

/// EDGE CASE: NRVO. The single return-typed local becomes the sret slot
/// and the terminal expression costs no copy.
#[test]
fn nrvo_reuses_the_named_local() {
    let mut tys = TypeInterner::new();
    let i32_ty = tys.i32();
    let (pair_id, pair_ty) = declare_pair(&mut tys);

    // fn make() -> Pair { let r = Pair { x: 1, y: 2 }; r }
    let mut b = BodyBuilder::new();
    let r = b.local("r", pair_ty);
    let one = b.lit_int(1, i32_ty);
    let two = b.lit_int(2, i32_ty);
    let lit = b.struct_lit(pair_id, vec![one, two], pair_ty);
    let let_r = b.let_stmt(r, Some(lit));
    let r_use = b.var(r, pair_ty);
    let root = b.block(vec![let_r], Some(r_use), pair_ty);
    let body = b.finish(root);

    let mut program = Program::default();
    program.functions.push(fn_def(0, "make", &[], pair_ty, body));

    let module = lower_ok(&program, &mut tys);
    let func = &module.functions[FunctionId(0)];

    // Exactly one local: `r`, aliased onto the sret pointer.
    assert_eq!(func.locals.len(), 1);
    let local = &func.locals[LocalId(0)];
    assert!(local.is_alias);
    assert_eq!(local.alias_target, Some(AliasTarget::AbiParam(AbiParamIndex(0))));
    assert_eq!(local.debug_name.map(|s| s.as_str()), Some("r"));

    // The terminal `r` produced no self-copy.
    for block in func.blocks.iter() {
        assert!(!block
            .statements
            .iter()
            .any(|s| matches!(s, Statement::Assign { .. })));
    }
}

/// EDGE CASE: two locals of the return type disable NRVO; a synthetic
/// return slot appears instead.
#[test]
fn nrvo_is_disabled_when_ambiguous() {
    let mut tys = TypeInterner::new();
    let i32_ty = tys.i32();
    let (pair_id, pair_ty) = declare_pair(&mut tys);

    let mut b = BodyBuilder::new();
    let a = b.local("a", pair_ty);
    let c = b.local("c", pair_ty);
    let one = b.lit_int(1, i32_ty);
    let two = b.lit_int(2, i32_ty);
    let lit_a = b.struct_lit(pair_id, vec![one, two], pair_ty);
    let three = b.lit_int(3, i32_ty);
    let four = b.lit_int(4, i32_ty);
    let lit_c = b.struct_lit(pair_id, vec![three, four], pair_ty);
    let let_a = b.let_stmt(a, Some(lit_a));
    let let_c = b.let_stmt(c, Some(lit_c));
    let a_use = b.var(a, pair_ty);
    let root = b.block(vec![let_a, let_c], Some(a_use), pair_ty);
    let body = b.finish(root);

    let mut program = Program::default();
    program.functions.push(fn_def(0, "make", &[], pair_ty, body));

    let module = lower_ok(&program, &mut tys);
    let func = &module.functions[FunctionId(0)];

    let aliased: Vec<_> = func
        .locals
        .iter_enumerated()
        .filter(|(_, l)| l.is_alias)
        .collect();
    assert_eq!(aliased.len(), 1);
    assert_eq!(aliased[0].1.debug_name.map(|s| s.as_str()), Some("<ret>"));

    // The terminal `a` is copied into the slot.
    let slot = aliased[0].0;
    assert!(func.blocks.iter().flat_map(|b| &b.statements).any(|s| matches!(
        s,
        Statement::Assign { dest, src: ValueSource::Place(_) } if *dest == Place::local(slot)
    )));
}

/// EDGE CASE: a diverging function has no return terminator at all.
#[test]
fn never_function_has_no_returns() {
    let mut tys = TypeInterner::new();
    let unit_ty = tys.unit();
    let never_ty = tys.never();

    // fn forever() -> ! { loop { } }
    let mut b = BodyBuilder::new();
    let loop_id = b.reserve();
    let empty = b.block(vec![], None, unit_ty);
    b.loop_at(loop_id, empty, never_ty);
    let root = b.block(vec![], Some(loop_id), never_ty);
    let body = b.finish(root);

    let mut program = Program::default();
    program.functions.push(fn_def(0, "forever", &[], never_ty, body));

    let module = lower_ok(&program, &mut tys);
    let func = &module.functions[FunctionId(0)];
    assert_eq!(func.sig.return_desc, ReturnDesc::Never);
    for block in func.blocks.iter() {
        assert!(!matches!(block.terminator, Some(Terminator::Return(_))));
    }
    // The loop body jumps back to itself.
    let has_backedge = func
        .blocks
        .iter_enumerated()
        .any(|(id, b)| b.terminator == Some(Terminator::Goto(id)));
    assert!(has_backedge);
}

/// EDGE CASE: `return expr` inside a diverging function evaluates the
/// expression for side effects and ends in `unreachable`, not a return.
#[test]
fn return_inside_never_function_is_unreachable() {
    let mut tys = TypeInterner::new();
    let i32_ty = tys.i32();
    let never_ty = tys.never();

    let mut b = BodyBuilder::new();
    let get = b.call(builtin::GET_INT, vec![], i32_ty);
    let ret = b.return_(Some(get), never_ty);
    let root = b.block(vec![], Some(ret), never_ty);
    let body = b.finish(root);

    let mut program = Program::default();
    program.functions.push(fn_def(0, "bail", &[], never_ty, body));

    let module = lower_ok(&program, &mut tys);
    let func = &module.functions[FunctionId(0)];
    let block = &func.blocks[func.start_block];
    assert!(block
        .statements
        .iter()
        .any(|s| matches!(s, Statement::Call { .. })), "side effects still happen");
    assert_eq!(block.terminator, Some(Terminator::Unreachable));
}

// ==================== LOOPS ====================

/// EDGE CASE: `while` builds condition/body/join blocks with a backedge
/// into the condition.
#[test]
fn while_loop_shape() {
    let mut tys = TypeInterner::new();
    let i32_ty = tys.i32();
    let bool_ty = tys.bool();
    let unit_ty = tys.unit();

    let (mut b, params) = body_with_params(&[("n", i32_ty)]);
    let while_id = b.reserve();
    let n = b.var(params[0], i32_ty);
    let zero = b.lit_int(0, i32_ty);
    let cond = b.binary(HirBinOp::Gt, n, zero, bool_ty);
    let empty = b.block(vec![], None, unit_ty);
    b.while_at(while_id, cond, empty, unit_ty);
    let root = b.block(vec![Stmt::Expr(while_id)], None, unit_ty);
    let body = b.finish(root);

    let mut program = Program::default();
    program
        .functions
        .push(fn_def(0, "f", &[("n", i32_ty)], unit_ty, body));

    let module = lower_ok(&program, &mut tys);
    let func = &module.functions[FunctionId(0)];
    assert_eq!(func.blocks.len(), 4);

    let Some(Terminator::Goto(cond_block)) = func.blocks[func.start_block].terminator else {
        panic!("entry jumps to the condition block");
    };
    let (body_block, break_block) = match &func.blocks[cond_block].terminator {
        Some(Terminator::SwitchInt { cases, otherwise, .. }) => (cases[0].1, *otherwise),
        other => panic!("condition ends in a switch, got {other:?}"),
    };
    assert_eq!(
        func.blocks[body_block].terminator,
        Some(Terminator::Goto(cond_block)),
        "body jumps back to the condition"
    );
    assert_eq!(
        func.blocks[break_block].terminator,
        Some(Terminator::Return(None))
    );
}

/// EDGE CASE: `continue` jumps to the condition block of a `while`.
#[test]
fn continue_targets_the_condition() {
    let mut tys = TypeInterner::new();
    let bool_ty = tys.bool();
    let unit_ty = tys.unit();
    let never_ty = tys.never();

    let (mut b, params) = body_with_params(&[("c", bool_ty)]);
    let while_id = b.reserve();
    let cond = b.var(params[0], bool_ty);
    let cont = b.continue_(while_id, never_ty);
    let while_body = b.block(vec![Stmt::Expr(cont)], None, unit_ty);
    b.while_at(while_id, cond, while_body, unit_ty);
    let root = b.block(vec![Stmt::Expr(while_id)], None, unit_ty);
    let body = b.finish(root);

    let mut program = Program::default();
    program
        .functions
        .push(fn_def(0, "f", &[("c", bool_ty)], unit_ty, body));

    let module = lower_ok(&program, &mut tys);
    let func = &module.functions[FunctionId(0)];
    let Some(Terminator::Goto(cond_block)) = func.blocks[func.start_block].terminator else {
        panic!("entry jumps to the condition block");
    };
    let Some(Terminator::SwitchInt { cases, .. }) = &func.blocks[cond_block].terminator else {
        panic!("condition switches");
    };
    let body_block = cases[0].1;
    assert_eq!(
        func.blocks[body_block].terminator,
        Some(Terminator::Goto(cond_block)),
        "continue goes back to the condition"
    );
}

// ==================== PLACES, REFERENCES, ARRAYS ====================

/// EDGE CASE: dereferencing a reference parameter loads through a pointer
/// base, not a projection.
#[test]
fn deref_uses_a_pointer_base() {
    let mut tys = TypeInterner::new();
    let i32_ty = tys.i32();
    let ref_ty = tys.make_ref(i32_ty, false);

    let (mut b, params) = body_with_params(&[("p", ref_ty)]);
    let p = b.var(params[0], ref_ty);
    let deref = b.deref(p, i32_ty);
    let root = b.block(vec![], Some(deref), i32_ty);
    let body = b.finish(root);

    let mut program = Program::default();
    program
        .functions
        .push(fn_def(0, "get", &[("p", ref_ty)], i32_ty, body));

    let module = lower_ok(&program, &mut tys);
    let func = &module.functions[FunctionId(0)];
    let block = &func.blocks[func.start_block];
    assert!(block.statements.iter().any(|s| matches!(
        s,
        Statement::Load { src: Place { base: PlaceBase::Pointer(_), projection }, .. }
            if projection.is_empty()
    )));
}

/// EDGE CASE: `&p.x` materializes the address of a projected place.
#[test]
fn ref_to_field_projects_then_takes_the_address() {
    let mut tys = TypeInterner::new();
    let i32_ty = tys.i32();
    let (pair_id, pair_ty) = declare_pair(&mut tys);
    let ref_i32 = tys.make_ref(i32_ty, false);

    let mut b = BodyBuilder::new();
    let p = b.local("p", pair_ty);
    let one = b.lit_int(1, i32_ty);
    let two = b.lit_int(2, i32_ty);
    let lit = b.struct_lit(pair_id, vec![one, two], pair_ty);
    let let_p = b.let_stmt(p, Some(lit));
    let p_use = b.var(p, pair_ty);
    let x_place = b.field(p_use, 0, i32_ty);
    let addr = b.ref_to(x_place, false, ref_i32);
    let deref = b.deref(addr, i32_ty);
    let root = b.block(vec![let_p], Some(deref), i32_ty);
    let body = b.finish(root);

    let mut program = Program::default();
    program.functions.push(fn_def(0, "f", &[], i32_ty, body));

    let module = lower_ok(&program, &mut tys);
    let func = &module.functions[FunctionId(0)];
    let block = &func.blocks[func.start_block];
    assert!(block.statements.iter().any(|s| matches!(
        s,
        Statement::Define { rvalue: RValue::Ref(place), .. }
            if place.projection == vec![Projection::Field(0)]
    )));
}

/// EDGE CASE: array literal init plus indexing; the constant index is
/// still materialized into a temp.
#[test]
fn array_literal_and_constant_index() {
    let mut tys = TypeInterner::new();
    let i32_ty = tys.i32();
    let usize_ty = tys.usize_ty();
    let arr_ty = tys.array(i32_ty, 3);

    let mut b = BodyBuilder::new();
    let a = b.local("a", arr_ty);
    let e1 = b.lit_int(1, i32_ty);
    let e2 = b.lit_int(2, i32_ty);
    let e3 = b.lit_int(3, i32_ty);
    let lit = b.array_lit(vec![e1, e2, e3], arr_ty);
    let let_a = b.let_stmt(a, Some(lit));
    let a_use = b.var(a, arr_ty);
    let idx = b.lit_uint(1, usize_ty);
    let elem = b.index(a_use, idx, i32_ty);
    let root = b.block(vec![let_a], Some(elem), i32_ty);
    let body = b.finish(root);

    let mut program = Program::default();
    program.functions.push(fn_def(0, "f", &[], i32_ty, body));

    let module = lower_ok(&program, &mut tys);
    let func = &module.functions[FunctionId(0)];
    let block = &func.blocks[func.start_block];

    assert!(block.statements.iter().any(|s| matches!(
        s,
        Statement::Init { pattern: InitPattern::ArrayLiteral(leaves), .. } if leaves.len() == 3
    )));
    // The load's index projection names a temp, defined from the const 1.
    let index_temp = block
        .statements
        .iter()
        .find_map(|s| match s {
            Statement::Load { src: Place { projection, .. }, .. } => {
                projection.iter().find_map(|p| match p {
                    Projection::Index(t) => Some(*t),
                    _ => None,
                })
            }
            _ => None,
        })
        .expect("indexed load present");
    assert!(block.statements.iter().any(|s| matches!(
        s,
        Statement::Define { dest, rvalue: RValue::Const(c) }
            if *dest == index_temp && matches!(c.value, ConstKind::Int { magnitude: 1, .. })
    )));
}

/// EDGE CASE: `[v; n]` with a destination lowers to an array-repeat init;
/// without one it becomes an array-repeat rvalue temp.
#[test]
fn array_repeat_with_and_without_destination() {
    let mut tys = TypeInterner::new();
    let i32_ty = tys.i32();
    let usize_ty = tys.usize_ty();
    let arr4 = tys.array(i32_ty, 4);
    let arr3 = tys.array(i32_ty, 3);

    // fn f() -> i32 { let a = [0; 4]; ([7; 3])[0] }
    let mut b = BodyBuilder::new();
    let a = b.local("a", arr4);
    let zero = b.lit_int(0, i32_ty);
    let rep4 = b.array_repeat(zero, 4, arr4);
    let let_a = b.let_stmt(a, Some(rep4));
    let seven = b.lit_int(7, i32_ty);
    let rep3 = b.array_repeat(seven, 3, arr3);
    let idx = b.lit_uint(0, usize_ty);
    let elem = b.index(rep3, idx, i32_ty);
    let root = b.block(vec![let_a], Some(elem), i32_ty);
    let body = b.finish(root);

    let mut program = Program::default();
    program.functions.push(fn_def(0, "f", &[], i32_ty, body));

    let module = lower_ok(&program, &mut tys);
    let func = &module.functions[FunctionId(0)];
    let block = &func.blocks[func.start_block];

    assert!(block.statements.iter().any(|s| matches!(
        s,
        Statement::Init { pattern: InitPattern::ArrayRepeat { count: 4, .. }, .. }
    )));
    assert!(block.statements.iter().any(|s| matches!(
        s,
        Statement::Define { rvalue: RValue::ArrayRepeat { count: 3, .. }, .. }
    )));
}

// ==================== SCALARS AND MISC ====================

/// EDGE CASE: enum variants lower to typed discriminant constants and
/// return directly.
#[test]
fn enum_variant_lowers_to_discriminant() {
    let mut tys = TypeInterner::new();
    let (color_id, color_ty) = tys.declare_enum(
        Symbol::intern("Color"),
        IntKind::U32,
        vec![
            VariantDef { name: Symbol::intern("Red"), discr: 0 },
            VariantDef { name: Symbol::intern("Green"), discr: 1 },
        ],
    );

    let mut b = BodyBuilder::new();
    let green = b.enum_variant(color_id, 1, color_ty);
    let root = b.block(vec![], Some(green), color_ty);
    let body = b.finish(root);

    let mut program = Program::default();
    program.functions.push(fn_def(0, "pick", &[], color_ty, body));

    let module = lower_ok(&program, &mut tys);
    let func = &module.functions[FunctionId(0)];
    assert_eq!(func.sig.return_desc, ReturnDesc::Direct(color_ty));
    assert!(matches!(
        &func.blocks[func.start_block].terminator,
        Some(Terminator::Return(Some(Operand::Const(c))))
            if c.ty == color_ty && c.value == ConstKind::EnumDiscriminant(1)
    ));
}

/// EDGE CASE: integer casts become cast rvalues typed at the target.
#[test]
fn cast_defines_a_cast_rvalue() {
    let mut tys = TypeInterner::new();
    let i32_ty = tys.i32();
    let u32_ty = tys.u32();

    let (mut b, params) = body_with_params(&[("x", i32_ty)]);
    let x = b.var(params[0], i32_ty);
    let cast = b.cast(x, u32_ty);
    let root = b.block(vec![], Some(cast), u32_ty);
    let body = b.finish(root);

    let mut program = Program::default();
    program
        .functions
        .push(fn_def(0, "widen", &[("x", i32_ty)], u32_ty, body));

    let module = lower_ok(&program, &mut tys);
    let func = &module.functions[FunctionId(0)];
    let block = &func.blocks[func.start_block];
    assert!(block.statements.iter().any(|s| matches!(
        s,
        Statement::Define { rvalue: RValue::Cast { target, .. }, .. } if *target == u32_ty
    )));
}

/// EDGE CASE: unsigned operands pick the unsigned operator domain.
#[test]
fn unsigned_arithmetic_picks_unsigned_ops() {
    let mut tys = TypeInterner::new();
    let u32_ty = tys.u32();

    let (mut b, params) = body_with_params(&[("a", u32_ty), ("b", u32_ty)]);
    let a = b.var(params[0], u32_ty);
    let bb = b.var(params[1], u32_ty);
    let div = b.binary(HirBinOp::Div, a, bb, u32_ty);
    let shifted = {
        let two = b.lit_uint(2, u32_ty);
        b.binary(HirBinOp::Shr, div, two, u32_ty)
    };
    let root = b.block(vec![], Some(shifted), u32_ty);
    let body = b.finish(root);

    let mut program = Program::default();
    program.functions.push(fn_def(
        0,
        "f",
        &[("a", u32_ty), ("b", u32_ty)],
        u32_ty,
        body,
    ));

    let module = lower_ok(&program, &mut tys);
    let func = &module.functions[FunctionId(0)];
    let block = &func.blocks[func.start_block];
    assert!(block.statements.iter().any(|s| matches!(
        s,
        Statement::Define { rvalue: RValue::BinaryOp { op: BinOp::UDiv, .. }, .. }
    )));
    assert!(block.statements.iter().any(|s| matches!(
        s,
        Statement::Define { rvalue: RValue::BinaryOp { op: BinOp::LShr, .. }, .. }
    )));
}

/// EDGE CASE: `_ = expr` evaluates the expression and stores nothing.
#[test]
fn underscore_assignment_discards() {
    let mut tys = TypeInterner::new();
    let i32_ty = tys.i32();
    let unit_ty = tys.unit();

    let mut b = BodyBuilder::new();
    let get = b.call(builtin::GET_INT, vec![], i32_ty);
    let discard = b.assign_discard(get, unit_ty);
    let root = b.block(vec![Stmt::Expr(discard)], None, unit_ty);
    let body = b.finish(root);

    let mut program = Program::default();
    program.functions.push(fn_def(0, "f", &[], unit_ty, body));

    let module = lower_ok(&program, &mut tys);
    let func = &module.functions[FunctionId(0)];
    let block = &func.blocks[func.start_block];
    assert!(block.statements.iter().any(|s| matches!(s, Statement::Call { .. })));
    assert!(!block.statements.iter().any(|s| matches!(s, Statement::Assign { .. })));
}

/// EDGE CASE: an if whose branches both diverge leaves the join
/// unreachable but terminated.
#[test]
fn if_with_diverging_branches_terminates_the_join() {
    let mut tys = TypeInterner::new();
    let i32_ty = tys.i32();
    let bool_ty = tys.bool();
    let unit_ty = tys.unit();
    let never_ty = tys.never();

    // fn f(c: bool) -> i32 { if c { return 1; } else { return 2; } }
    let (mut b, params) = body_with_params(&[("c", bool_ty)]);
    let cond = b.var(params[0], bool_ty);
    let one = b.lit_int(1, i32_ty);
    let ret1 = b.return_(Some(one), never_ty);
    let then_b = b.block(vec![], Some(ret1), never_ty);
    let two = b.lit_int(2, i32_ty);
    let ret2 = b.return_(Some(two), never_ty);
    let else_b = b.block(vec![], Some(ret2), never_ty);
    let if_expr = b.if_(cond, then_b, Some(else_b), never_ty);
    let root = b.block(vec![Stmt::Expr(if_expr)], None, unit_ty);
    let body = b.finish(root);

    // The function returns i32 on both paths even though the tail is
    // formally unreachable.
    let mut program = Program::default();
    program
        .functions
        .push(fn_def(0, "f", &[("c", bool_ty)], i32_ty, body));

    let module = lower_ok(&program, &mut tys);
    let func = &module.functions[FunctionId(0)];
    assert!(func
        .blocks
        .iter()
        .any(|b| b.terminator == Some(Terminator::Unreachable)));
    for block in func.blocks.iter() {
        assert!(block.terminator.is_some());
    }
}
