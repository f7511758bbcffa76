//! Genesis bootstrap.
//!
//! Writes the founding ledger state directly into a `LedgerDb` without going
//! through the engine: the full VALUE and WEIGHT supplies are credited to
//! the reservoir account, the token metadata URIs are stored, and the profit
//! percentage starts at its default. This is the only place tokens are
//! created; supplies never change afterwards.

use prorata_core::account::Account;
use prorata_core::constants::{
    DEFAULT_PROFIT_PERCENTAGE, GENESIS_VALUE_URI, GENESIS_WEIGHT_URI, TOTAL_VALUE_SUPPLY,
    TOTAL_WEIGHT_SUPPLY,
};
use prorata_core::error::LedgerError;
use prorata_core::event::{LedgerEvent, Receipt};
use prorata_core::types::{AccountId, TokenId};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::db::LedgerDb;

// ── GenesisParams ────────────────────────────────────────────────────────────

fn default_value_uri() -> String {
    GENESIS_VALUE_URI.to_string()
}

fn default_weight_uri() -> String {
    GENESIS_WEIGHT_URI.to_string()
}

/// Founding configuration. In production this comes from a reviewed JSON
/// document; tests build it directly.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct GenesisParams {
    /// Account credited with the entire un-distributed supply of both
    /// tokens. Excluded from profit settlement for its whole life.
    pub reservoir: AccountId,
    /// Metadata URI for the VALUE token.
    #[serde(default = "default_value_uri")]
    pub value_uri: String,
    /// Metadata URI for the WEIGHT token.
    #[serde(default = "default_weight_uri")]
    pub weight_uri: String,
}

impl GenesisParams {
    pub fn new(reservoir: AccountId) -> Self {
        Self {
            reservoir,
            value_uri: default_value_uri(),
            weight_uri: default_weight_uri(),
        }
    }

    /// Parse params from a JSON document.
    pub fn from_json(json: &str) -> Result<Self, LedgerError> {
        serde_json::from_str(json).map_err(|e| LedgerError::Serialization(e.to_string()))
    }
}

// ── Genesis application ──────────────────────────────────────────────────────

/// Apply the genesis state to an empty `LedgerDb`. Runs at most once per
/// database; a second call fails with `GenesisAlreadyApplied`.
pub fn apply_genesis(db: &LedgerDb, params: &GenesisParams) -> Result<Receipt, LedgerError> {
    if db.genesis_done() {
        return Err(LedgerError::GenesisAlreadyApplied);
    }
    if params.reservoir.is_null() {
        return Err(LedgerError::NullAddressTarget);
    }
    if params.value_uri.is_empty() || params.weight_uri.is_empty() {
        return Err(LedgerError::EmptyUri);
    }

    info!(reservoir = %params.reservoir, "applying genesis state");

    let mut reservoir = Account::new(params.reservoir.clone());
    reservoir.value_balance = TOTAL_VALUE_SUPPLY;
    reservoir.weight_balance = TOTAL_WEIGHT_SUPPLY;
    db.put_account(&reservoir)?;

    db.put_reservoir_account(&params.reservoir)?;
    db.put_profit_percentage(DEFAULT_PROFIT_PERCENTAGE)?;
    db.put_token_uri(TokenId::Value, &params.value_uri)?;
    db.put_token_uri(TokenId::Weight, &params.weight_uri)?;

    verify_genesis_supply(db, &params.reservoir)?;

    db.mark_genesis_done()?;
    db.flush()?;
    info!(
        value_supply = TOTAL_VALUE_SUPPLY,
        weight_supply = TOTAL_WEIGHT_SUPPLY,
        "genesis state committed to disk"
    );

    Ok(Receipt {
        events: vec![
            LedgerEvent::UriChanged {
                token: TokenId::Value,
                uri: params.value_uri.clone(),
            },
            LedgerEvent::UriChanged {
                token: TokenId::Weight,
                uri: params.weight_uri.clone(),
            },
            LedgerEvent::TokenTransferred {
                token: TokenId::Value,
                from: AccountId::NULL,
                to: params.reservoir.clone(),
                amount: TOTAL_VALUE_SUPPLY,
            },
            LedgerEvent::TokenTransferred {
                token: TokenId::Weight,
                from: AccountId::NULL,
                to: params.reservoir.clone(),
                amount: TOTAL_WEIGHT_SUPPLY,
            },
        ],
    })
}

/// Verify that the reservoir holds exactly the fixed supplies. Genesis
/// credits everything to one account, so the check is a read-back of that
/// single record.
fn verify_genesis_supply(db: &LedgerDb, reservoir: &AccountId) -> Result<(), LedgerError> {
    let acc = db.account_or_default(reservoir)?;
    if acc.value_balance != TOTAL_VALUE_SUPPLY {
        return Err(LedgerError::GenesisSupplyMismatch {
            expected: TOTAL_VALUE_SUPPLY,
            got: acc.value_balance,
        });
    }
    if acc.weight_balance != TOTAL_WEIGHT_SUPPLY {
        return Err(LedgerError::GenesisSupplyMismatch {
            expected: TOTAL_WEIGHT_SUPPLY,
            got: acc.weight_balance,
        });
    }
    info!(
        value_supply = acc.value_balance,
        weight_supply = acc.weight_balance,
        "genesis supply verified"
    );
    Ok(())
}
