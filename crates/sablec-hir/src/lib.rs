//! sablec-hir - Typed HIR and semantic types for the Sable compiler
//!
//! This crate is the surface the MIR lowering consumes: the interned type
//! table ([`types::TypeInterner`]), the typed HIR tree produced by name
//! resolution and type inference ([`hir`]), and the constant evaluator
//! ([`consteval`]). [`build`] offers construction helpers for frontends
//! and tests.
//!
//! Every type reachable from a finished HIR program is fully resolved: no
//! inference placeholders survive past this layer.

pub mod build;
pub mod builtin;
pub mod consteval;
pub mod hir;
pub mod types;

pub use hir::{Body, Expr, ExprId, ExprKind, FnDef, HirLocalId, Program, Stmt};
pub use types::{IntKind, TypeId, TypeInterner, TypeKind};
