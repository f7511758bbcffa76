use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard, PoisonError};

use prorata_core::error::LedgerError;
use prorata_core::types::{AccountId, TaskId};
use tracing::debug;

use crate::TaskAuthorizer;

// ── Task lifecycle ───────────────────────────────────────────────────────────

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum TaskState {
    /// Submitted, quorum not yet reached.
    Pending,
    /// Approved by quorum; may authorize exactly one call.
    Approved,
    /// Spent.
    Consumed,
}

// ── MemoryAuthorizer ─────────────────────────────────────────────────────────

/// In-memory `TaskAuthorizer` for embedders and tests: a fixed admin set plus
/// a task table driven through `submit` / `approve`.
pub struct MemoryAuthorizer {
    admins: Vec<AccountId>,
    tasks: Mutex<HashMap<TaskId, TaskState>>,
}

impl MemoryAuthorizer {
    pub fn new(admins: Vec<AccountId>) -> Self {
        Self {
            admins,
            tasks: Mutex::new(HashMap::new()),
        }
    }

    /// Register a task in the pending state.
    pub fn submit(&self, task: TaskId) {
        self.table().insert(task, TaskState::Pending);
    }

    /// Mark a task as approved by quorum, submitting it first if needed.
    pub fn approve(&self, task: TaskId) {
        self.table().insert(task, TaskState::Approved);
    }

    // a poisoned lock still guards a consistent map
    fn table(&self) -> MutexGuard<'_, HashMap<TaskId, TaskState>> {
        self.tasks.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl TaskAuthorizer for MemoryAuthorizer {
    fn is_admin(&self, account: &AccountId) -> bool {
        self.admins.contains(account)
    }

    fn authorize(&self, task: TaskId) -> Result<(), LedgerError> {
        let mut tasks = self.table();
        match tasks.get(&task) {
            None => Err(LedgerError::TaskNotFound(task.0)),
            Some(TaskState::Pending) => Err(LedgerError::TaskNotApproved(task.0)),
            Some(TaskState::Consumed) => Err(LedgerError::TaskAlreadyConsumed(task.0)),
            Some(TaskState::Approved) => {
                tasks.insert(task, TaskState::Consumed);
                debug!(task = task.0, "authorization task consumed");
                Ok(())
            }
        }
    }
}
