//! Control-flow graph analysis.
//!
//! Predecessors, successors, reachability and dominators for one
//! function. The validator leans on this for phi completeness and
//! use-dominates-def; the dominator sets come from the classic iterative
//! fixed point over reachable blocks.

use sablec_util::{FxHashSet, IndexVec};

use crate::mir::{BasicBlockId, MirFunction};

pub struct Cfg {
    pub preds: IndexVec<BasicBlockId, Vec<BasicBlockId>>,
    pub succs: IndexVec<BasicBlockId, Vec<BasicBlockId>>,
    pub reachable: IndexVec<BasicBlockId, bool>,
    dominators: IndexVec<BasicBlockId, FxHashSet<BasicBlockId>>,
}

impl Cfg {
    pub fn new(func: &MirFunction) -> Self {
        let n = func.blocks.len();
        let mut preds: IndexVec<BasicBlockId, Vec<BasicBlockId>> =
            (0..n).map(|_| Vec::new()).collect();
        let mut succs: IndexVec<BasicBlockId, Vec<BasicBlockId>> =
            (0..n).map(|_| Vec::new()).collect();

        for (id, block) in func.blocks.iter_enumerated() {
            let Some(terminator) = &block.terminator else { continue };
            for target in terminator.successors() {
                if !succs[id].contains(&target) {
                    succs[id].push(target);
                }
                if !preds[target].contains(&id) {
                    preds[target].push(id);
                }
            }
        }

        // Breadth-first reachability from the entry block.
        let mut reachable: IndexVec<BasicBlockId, bool> = (0..n).map(|_| false).collect();
        if func.start_block.is_valid() && func.blocks.contains(func.start_block) {
            let mut queue = std::collections::VecDeque::new();
            queue.push_back(func.start_block);
            reachable[func.start_block] = true;
            while let Some(block) = queue.pop_front() {
                for &succ in &succs[block] {
                    if !reachable[succ] {
                        reachable[succ] = true;
                        queue.push_back(succ);
                    }
                }
            }
        }

        let dominators = compute_dominators(func, &preds, &reachable);

        Cfg { preds, succs, reachable, dominators }
    }

    pub fn is_reachable(&self, block: BasicBlockId) -> bool {
        self.reachable.get(block).copied().unwrap_or(false)
    }

    /// Reachable predecessors of `block`, deduplicated.
    pub fn reachable_preds(&self, block: BasicBlockId) -> Vec<BasicBlockId> {
        self.preds[block]
            .iter()
            .copied()
            .filter(|&p| self.is_reachable(p))
            .collect()
    }

    /// Whether `a` dominates `b`. Only meaningful for reachable `b`.
    pub fn dominates(&self, a: BasicBlockId, b: BasicBlockId) -> bool {
        self.dominators
            .get(b)
            .map(|doms| doms.contains(&a))
            .unwrap_or(false)
    }
}

/// Iterative fixed point: `dom(entry) = {entry}`, every other reachable
/// block starts at the full reachable set and is refined by intersecting
/// its predecessors' sets.
fn compute_dominators(
    func: &MirFunction,
    preds: &IndexVec<BasicBlockId, Vec<BasicBlockId>>,
    reachable: &IndexVec<BasicBlockId, bool>,
) -> IndexVec<BasicBlockId, FxHashSet<BasicBlockId>> {
    let n = func.blocks.len();
    let mut dominators: IndexVec<BasicBlockId, FxHashSet<BasicBlockId>> =
        (0..n).map(|_| FxHashSet::default()).collect();
    if n == 0 || !func.start_block.is_valid() {
        return dominators;
    }

    let entry = func.start_block;
    let all_reachable: FxHashSet<BasicBlockId> = func
        .blocks
        .indices()
        .filter(|&b| reachable[b])
        .collect();

    for block in func.blocks.indices() {
        if !reachable[block] {
            continue;
        }
        if block == entry {
            dominators[block].insert(entry);
        } else {
            dominators[block] = all_reachable.clone();
        }
    }

    let mut changed = true;
    while changed {
        changed = false;
        for block in func.blocks.indices() {
            if !reachable[block] || block == entry {
                continue;
            }
            let mut new_doms: Option<FxHashSet<BasicBlockId>> = None;
            for &pred in &preds[block] {
                if !reachable[pred] {
                    continue;
                }
                new_doms = Some(match new_doms {
                    None => dominators[pred].clone(),
                    Some(acc) => acc.intersection(&dominators[pred]).copied().collect(),
                });
            }
            let mut new_doms = new_doms.unwrap_or_default();
            new_doms.insert(block);
            if new_doms != dominators[block] {
                dominators[block] = new_doms;
                changed = true;
            }
        }
    }

    dominators
}
