//! Function-level MIR construction.
//!
//! [`FunctionBuilder`] owns the function under construction and the notion
//! of the *current block*. `current = None` means "unreachable since the
//! last terminator": statement emission becomes a silent no-op and temp
//! allocation is suppressed, so dead straight-line code leaves no trace in
//! the emitted MIR.

use sablec_hir::types::TypeId;
use sablec_util::Symbol;

use crate::mir::{
    AliasTarget, BasicBlock, BasicBlockId, FunctionId, LocalId, LocalInfo, MirFunction,
    MirFunctionSig, Place, PhiNode, RValue, Statement, TempId, Terminator, ValueSource,
};

pub struct FunctionBuilder {
    pub func: MirFunction,
    current: Option<BasicBlockId>,
}

impl FunctionBuilder {
    pub fn new(id: FunctionId, name: Symbol, sig: MirFunctionSig) -> Self {
        Self {
            func: MirFunction {
                id,
                name,
                sig,
                locals: Default::default(),
                temp_types: Default::default(),
                blocks: Default::default(),
                start_block: BasicBlockId::INVALID,
            },
            current: None,
        }
    }

    pub fn new_block(&mut self) -> BasicBlockId {
        self.func.blocks.push(BasicBlock::default())
    }

    pub fn switch_to(&mut self, block: BasicBlockId) {
        debug_assert!(
            self.func.blocks[block].terminator.is_none(),
            "switching to an already-terminated block"
        );
        self.current = Some(block);
    }

    pub fn current(&self) -> Option<BasicBlockId> {
        self.current
    }

    pub fn is_reachable(&self) -> bool {
        self.current.is_some()
    }

    /// Append a statement to the current block; no-op while unreachable.
    pub fn push(&mut self, statement: Statement) {
        if let Some(block) = self.current {
            self.func.blocks[block].statements.push(statement);
        }
    }

    /// Allocate a fresh temp of type `ty`.
    pub fn new_temp(&mut self, ty: TypeId) -> TempId {
        self.func.temp_types.push(ty)
    }

    /// Define a fresh temp from a pure rvalue. While unreachable nothing is
    /// allocated or emitted and the sentinel temp is returned, keeping the
    /// one-definition-per-temp invariant intact.
    pub fn define(&mut self, rvalue: RValue, ty: TypeId) -> TempId {
        if !self.is_reachable() {
            return TempId::INVALID;
        }
        let dest = self.new_temp(ty);
        self.push(Statement::Define { dest, rvalue });
        dest
    }

    /// Load from memory into a fresh temp. Same unreachable behavior as
    /// [`FunctionBuilder::define`].
    pub fn load(&mut self, src: Place, ty: TypeId) -> TempId {
        if !self.is_reachable() {
            return TempId::INVALID;
        }
        let dest = self.new_temp(ty);
        self.push(Statement::Load { dest, src });
        dest
    }

    pub fn assign(&mut self, dest: Place, src: ValueSource) {
        self.push(Statement::Assign { dest, src });
    }

    /// Terminate the current block; no-op while unreachable. Control is
    /// unreachable afterwards until the next `switch_to`.
    pub fn terminate(&mut self, terminator: Terminator) {
        if let Some(block) = self.current.take() {
            let slot = &mut self.func.blocks[block].terminator;
            debug_assert!(slot.is_none(), "block terminated twice");
            *slot = Some(terminator);
        }
    }

    /// Install a phi at the start of `block` and return its destination.
    pub fn add_phi(
        &mut self,
        block: BasicBlockId,
        ty: TypeId,
        incoming: Vec<(BasicBlockId, TempId)>,
    ) -> TempId {
        let dest = self.new_temp(ty);
        self.func.blocks[block].phis.push(PhiNode { dest, incoming });
        dest
    }

    pub fn new_local(&mut self, ty: TypeId, debug_name: Option<Symbol>) -> LocalId {
        self.func.locals.push(LocalInfo {
            ty,
            debug_name,
            is_alias: false,
            alias_target: None,
        })
    }

    /// A local that allocates no storage: its place resolves to `target`.
    pub fn new_alias_local(
        &mut self,
        ty: TypeId,
        debug_name: Option<Symbol>,
        target: AliasTarget,
    ) -> LocalId {
        self.func.locals.push(LocalInfo {
            ty,
            debug_name,
            is_alias: true,
            alias_target: Some(target),
        })
    }

    pub fn finish(self) -> MirFunction {
        self.func
    }
}
