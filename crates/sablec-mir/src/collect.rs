//! Function collection.
//!
//! Walks the HIR program and enumerates every callable (free functions,
//! impl methods, and the predefined builtin scope), assigning dense ids in
//! collection order and building every signature before any body is
//! lowered. Internals get placeholder `MirFunction` slots (signature
//! filled, body empty); externals are complete immediately.

use indexmap::IndexMap;
use sablec_hir::builtin;
use sablec_hir::hir::{FnDef, Program};
use sablec_hir::types::TypeInterner;
use sablec_util::{DefId, FxHashSet, Symbol};

use crate::error::{LowerError, LowerErrorKind};
use crate::mir::{
    BasicBlockId, CallTarget, ExternalFunction, FunctionId, MirFunction, MirModule,
};
use crate::sig::build_sig;

/// Where an internal function's HIR lives within the program.
#[derive(Clone, Copy, Debug)]
pub enum FnRef {
    Free(usize),
    Method { impl_index: usize, method_index: usize },
}

impl FnRef {
    pub fn resolve<'a>(self, program: &'a Program) -> &'a FnDef {
        match self {
            FnRef::Free(i) => &program.functions[i],
            FnRef::Method { impl_index, method_index } => {
                &program.impls[impl_index].methods[method_index]
            }
        }
    }
}

/// Result of the collection pass.
pub struct Collection {
    /// Module with placeholder internals and complete externals.
    pub module: MirModule,
    /// HIR definition → callable id, used to resolve call targets.
    /// Insertion-ordered so any iteration stays deterministic.
    pub targets: IndexMap<DefId, CallTarget>,
    /// Internal functions in id order, for the body-lowering pass.
    pub internal_order: Vec<(FunctionId, FnRef)>,
}

pub fn collect(program: &Program, tys: &mut TypeInterner) -> Result<Collection, Vec<LowerError>> {
    let mut collector = Collector {
        module: MirModule::default(),
        targets: IndexMap::new(),
        internal_order: Vec::new(),
        seen_names: FxHashSet::default(),
        errors: Vec::new(),
    };

    for (i, func) in program.functions.iter().enumerate() {
        collector.add_callable(func, func.name, FnRef::Free(i), tys);
    }
    for (impl_index, block) in program.impls.iter().enumerate() {
        let type_name = tys.display_name(block.self_ty);
        for (method_index, method) in block.methods.iter().enumerate() {
            let mangled = Symbol::intern(&format!("{}::{}", type_name, method.name));
            collector.add_callable(
                method,
                mangled,
                FnRef::Method { impl_index, method_index },
                tys,
            );
        }
    }
    for decl in builtin::all(tys) {
        collector.add_builtin(decl, tys);
    }

    if !collector.errors.is_empty() {
        return Err(collector.errors);
    }

    log::debug!(
        "collected {} internal and {} external callables",
        collector.module.functions.len(),
        collector.module.external_functions.len()
    );

    Ok(Collection {
        module: collector.module,
        targets: collector.targets,
        internal_order: collector.internal_order,
    })
}

struct Collector {
    module: MirModule,
    targets: IndexMap<DefId, CallTarget>,
    internal_order: Vec<(FunctionId, FnRef)>,
    seen_names: FxHashSet<Symbol>,
    errors: Vec<LowerError>,
}

impl Collector {
    fn check_name(&mut self, mangled: Symbol) -> bool {
        if !self.seen_names.insert(mangled) {
            self.errors
                .push(LowerError::new(LowerErrorKind::DuplicateCallable(mangled)));
            return false;
        }
        true
    }

    fn add_callable(&mut self, func: &FnDef, mangled: Symbol, fn_ref: FnRef, tys: &TypeInterner) {
        if !self.check_name(mangled) {
            return;
        }
        let sig = match build_sig(mangled, &func.params, func.ret_ty, tys) {
            Ok(sig) => sig,
            Err(e) => {
                self.errors.push(e);
                return;
            }
        };
        let target = if func.body.is_some() {
            let id = self.module.functions.next_index();
            self.module.functions.push(MirFunction {
                id,
                name: mangled,
                sig,
                locals: Default::default(),
                temp_types: Default::default(),
                blocks: Default::default(),
                start_block: BasicBlockId::INVALID,
            });
            self.internal_order.push((id, fn_ref));
            CallTarget::Internal(id)
        } else {
            let id = self.module.external_functions.next_index();
            self.module.external_functions.push(ExternalFunction {
                id,
                name: mangled,
                sig,
            });
            CallTarget::External(id)
        };
        if self.targets.insert(func.def_id, target).is_some() {
            self.errors.push(LowerError::new(LowerErrorKind::InvariantViolation(
                format!("definition id of `{mangled}` registered twice"),
            )));
        }
    }

    fn add_builtin(&mut self, decl: builtin::BuiltinDecl, tys: &TypeInterner) {
        if !self.check_name(decl.name) {
            return;
        }
        let sig = match build_sig(decl.name, &decl.params, decl.ret_ty, tys) {
            Ok(sig) => sig,
            Err(e) => {
                self.errors.push(e);
                return;
            }
        };
        let id = self.module.external_functions.next_index();
        self.module.external_functions.push(ExternalFunction {
            id,
            name: decl.name,
            sig,
        });
        if self
            .targets
            .insert(decl.def_id, CallTarget::External(id))
            .is_some()
        {
            self.errors.push(LowerError::new(LowerErrorKind::InvariantViolation(
                format!("builtin `{}` registered twice", decl.name),
            )));
        }
    }
}
