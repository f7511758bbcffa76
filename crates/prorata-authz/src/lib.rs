//! prorata-authz
//!
//! Task-authorization capability consumed by the ledger's admin-gated
//! operations. The production implementation is an external multisig
//! application where a quorum of administrators approves each task; the
//! ledger depends only on this trait and treats approval as consume-once.

pub mod memory;

pub use memory::MemoryAuthorizer;

use prorata_core::error::LedgerError;
use prorata_core::types::{AccountId, TaskId};

/// Consume-once authorization for admin-gated ledger operations.
pub trait TaskAuthorizer: Send + Sync {
    /// Whether `account` may invoke admin-gated entry points at all. Checked
    /// before any task is consumed.
    fn is_admin(&self, account: &AccountId) -> bool;

    /// Authorize one admin-gated call against `task`, consuming it: the same
    /// task can never authorize a second call.
    fn authorize(&self, task: TaskId) -> Result<(), LedgerError>;
}
