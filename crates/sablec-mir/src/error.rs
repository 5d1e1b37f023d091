//! Lowering errors.
//!
//! Every failure is a structured [`LowerError`]: a kind from the fixed
//! taxonomy plus enough context (function name, block, statement index) for
//! a compiler author to pinpoint the site. Lowering does not recover: the
//! first error aborts the current function and no partial module is
//! returned.

use std::fmt;

use sablec_util::Symbol;
use thiserror::Error;

use crate::mir::BasicBlockId;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum LowerErrorKind {
    #[error("malformed signature: {0}")]
    SigInvariant(String),
    #[error("duplicate callable `{0}`")]
    DuplicateCallable(Symbol),
    #[error("unsupported pattern: {0}")]
    UnsupportedPattern(String),
    #[error("type mismatch: {0}")]
    TypeMismatch(String),
    #[error("missing value: {0}")]
    MissingValue(String),
    #[error("invalid return: {0}")]
    InvalidReturn(String),
    #[error("unresolved call target: {0}")]
    UnresolvedTarget(String),
    #[error("invariant violation: {0}")]
    InvariantViolation(String),
    #[error("not implemented: {0}")]
    NotImplemented(String),
}

/// An error with its lowering context attached.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LowerError {
    pub kind: LowerErrorKind,
    pub function: Option<Symbol>,
    pub block: Option<BasicBlockId>,
    pub stmt_index: Option<usize>,
}

impl LowerError {
    pub fn new(kind: LowerErrorKind) -> Self {
        Self { kind, function: None, block: None, stmt_index: None }
    }

    pub fn in_function(mut self, function: Symbol) -> Self {
        self.function.get_or_insert(function);
        self
    }

    pub fn at_block(mut self, block: BasicBlockId) -> Self {
        self.block = Some(block);
        self
    }

    pub fn at_stmt(mut self, block: BasicBlockId, stmt_index: usize) -> Self {
        self.block = Some(block);
        self.stmt_index = Some(stmt_index);
        self
    }
}

impl fmt::Display for LowerError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.kind)?;
        if let Some(function) = self.function {
            write!(f, " (in `{function}`")?;
            if let Some(block) = self.block {
                write!(f, ", bb{}", block.0)?;
                if let Some(i) = self.stmt_index {
                    write!(f, ", statement {i}")?;
                }
            }
            write!(f, ")")?;
        }
        Ok(())
    }
}

impl std::error::Error for LowerError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        Some(&self.kind)
    }
}

impl From<LowerErrorKind> for LowerError {
    fn from(kind: LowerErrorKind) -> Self {
        LowerError::new(kind)
    }
}
