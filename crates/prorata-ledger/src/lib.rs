//! Persistent dual-token ledger with pull-based profit distribution.
//!
//! [`LedgerDb`] owns the sled trees, [`genesis`] seeds the fixed supplies,
//! and [`LedgerEngine`] applies every read and mutation on top. Profit is
//! distributed lazily: capture bumps a single counter and each holder's
//! share crystallizes on its next touch, so no operation ever loops over
//! token holders.

pub mod db;
pub mod engine;
pub mod genesis;

pub use db::LedgerDb;
pub use engine::{owed, LedgerEngine, SupplyAudit};
pub use genesis::{apply_genesis, GenesisParams};
