use prorata_core::account::Account;
use prorata_core::constants::DEFAULT_PROFIT_PERCENTAGE;
use prorata_core::error::LedgerError;
use prorata_core::types::{AccountId, Balance, TokenId};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::path::Path;

// ── Keys ─────────────────────────────────────────────────────────────────────

const KEY_RESERVOIR: &str = "reservoir";
const KEY_TREASURY: &str = "treasury";
const KEY_PROFIT_PERCENTAGE: &str = "profit_percentage";
const KEY_ALL_TIME_PROFIT: &str = "all_time_profit";
const KEY_PROFIT_TRANSFERRED: &str = "profit_transferred";
const KEY_GENESIS_DONE: &str = "genesis_done";

fn exchange_key(slot: u8) -> String {
    format!("exchange_{}", slot)
}

fn uri_key(token: TokenId) -> &'static str {
    match token {
        TokenId::Value => "uri_value",
        TokenId::Weight => "uri_weight",
    }
}

// ── LedgerDb ─────────────────────────────────────────────────────────────────

/// Persistent ledger database backed by sled (pure-Rust, no C dependencies).
///
/// Named trees (analogous to column families):
///   accounts — AccountId bytes → bincode(Account)
///   config   — utf8 key bytes  → bincode(value)   (roles, uris, percentage)
///   counters — utf8 key bytes  → bincode(Balance) (profit accumulators)
///   meta     — utf8 key bytes  → raw bytes
pub struct LedgerDb {
    _db: sled::Db,
    accounts: sled::Tree,
    config: sled::Tree,
    counters: sled::Tree,
    meta: sled::Tree,
}

impl LedgerDb {
    /// Open or create the ledger database at `path`.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, LedgerError> {
        let db = sled::open(path).map_err(|e| LedgerError::Storage(e.to_string()))?;
        let accounts = db.open_tree("accounts").map_err(|e| LedgerError::Storage(e.to_string()))?;
        let config   = db.open_tree("config").map_err(|e| LedgerError::Storage(e.to_string()))?;
        let counters = db.open_tree("counters").map_err(|e| LedgerError::Storage(e.to_string()))?;
        let meta     = db.open_tree("meta").map_err(|e| LedgerError::Storage(e.to_string()))?;
        Ok(Self { _db: db, accounts, config, counters, meta })
    }

    // ── Typed tree access ────────────────────────────────────────────────────

    fn get<T: DeserializeOwned>(tree: &sled::Tree, key: &str) -> Result<Option<T>, LedgerError> {
        match tree.get(key.as_bytes()).map_err(|e| LedgerError::Storage(e.to_string()))? {
            Some(bytes) => {
                let value = bincode::deserialize(&bytes)
                    .map_err(|e| LedgerError::Serialization(e.to_string()))?;
                Ok(Some(value))
            }
            None => Ok(None),
        }
    }

    fn put<T: Serialize>(tree: &sled::Tree, key: &str, value: &T) -> Result<(), LedgerError> {
        let bytes = bincode::serialize(value)
            .map_err(|e| LedgerError::Serialization(e.to_string()))?;
        tree.insert(key.as_bytes(), bytes)
            .map_err(|e| LedgerError::Storage(e.to_string()))?;
        Ok(())
    }

    // ── Accounts ─────────────────────────────────────────────────────────────

    pub fn get_account(&self, id: &AccountId) -> Result<Option<Account>, LedgerError> {
        match self.accounts.get(id.as_bytes()).map_err(|e| LedgerError::Storage(e.to_string()))? {
            Some(bytes) => {
                let acc = bincode::deserialize(&bytes)
                    .map_err(|e| LedgerError::Serialization(e.to_string()))?;
                Ok(Some(acc))
            }
            None => Ok(None),
        }
    }

    /// Account record for `id`, or the zero record if none is stored.
    pub fn account_or_default(&self, id: &AccountId) -> Result<Account, LedgerError> {
        Ok(self.get_account(id)?.unwrap_or_else(|| Account::new(id.clone())))
    }

    pub fn put_account(&self, account: &Account) -> Result<(), LedgerError> {
        let bytes = bincode::serialize(account)
            .map_err(|e| LedgerError::Serialization(e.to_string()))?;
        self.accounts
            .insert(account.account_id.as_bytes(), bytes)
            .map_err(|e| LedgerError::Storage(e.to_string()))?;
        Ok(())
    }

    pub fn account_exists(&self, id: &AccountId) -> bool {
        self.accounts.contains_key(id.as_bytes()).unwrap_or(false)
    }

    /// Every stored account record. Audit/diagnostics surface; nothing on the
    /// transfer or settlement path iterates accounts.
    pub fn all_accounts(&self) -> Result<Vec<Account>, LedgerError> {
        let mut out = Vec::new();
        for item in self.accounts.iter() {
            let (_, bytes) = item.map_err(|e| LedgerError::Storage(e.to_string()))?;
            let acc = bincode::deserialize(&bytes)
                .map_err(|e| LedgerError::Serialization(e.to_string()))?;
            out.push(acc);
        }
        Ok(out)
    }

    // ── Roles ────────────────────────────────────────────────────────────────

    pub fn reservoir_account(&self) -> Result<Option<AccountId>, LedgerError> {
        Self::get(&self.config, KEY_RESERVOIR)
    }

    pub fn put_reservoir_account(&self, id: &AccountId) -> Result<(), LedgerError> {
        Self::put(&self.config, KEY_RESERVOIR, id)
    }

    pub fn treasury_account(&self) -> Result<Option<AccountId>, LedgerError> {
        Self::get(&self.config, KEY_TREASURY)
    }

    pub fn put_treasury_account(&self, id: &AccountId) -> Result<(), LedgerError> {
        Self::put(&self.config, KEY_TREASURY, id)
    }

    pub fn exchange_account(&self, slot: u8) -> Result<Option<AccountId>, LedgerError> {
        Self::get(&self.config, &exchange_key(slot))
    }

    pub fn put_exchange_account(&self, slot: u8, id: &AccountId) -> Result<(), LedgerError> {
        Self::put(&self.config, &exchange_key(slot), id)
    }

    // ── Profit configuration / counters ──────────────────────────────────────

    pub fn profit_percentage(&self) -> Result<u32, LedgerError> {
        Ok(Self::get(&self.config, KEY_PROFIT_PERCENTAGE)?.unwrap_or(DEFAULT_PROFIT_PERCENTAGE))
    }

    pub fn put_profit_percentage(&self, value: u32) -> Result<(), LedgerError> {
        Self::put(&self.config, KEY_PROFIT_PERCENTAGE, &value)
    }

    pub fn all_time_profit(&self) -> Result<Balance, LedgerError> {
        Ok(Self::get(&self.counters, KEY_ALL_TIME_PROFIT)?.unwrap_or(0))
    }

    pub fn put_all_time_profit(&self, value: Balance) -> Result<(), LedgerError> {
        Self::put(&self.counters, KEY_ALL_TIME_PROFIT, &value)
    }

    pub fn profit_transferred(&self) -> Result<Balance, LedgerError> {
        Ok(Self::get(&self.counters, KEY_PROFIT_TRANSFERRED)?.unwrap_or(0))
    }

    pub fn put_profit_transferred(&self, value: Balance) -> Result<(), LedgerError> {
        Self::put(&self.counters, KEY_PROFIT_TRANSFERRED, &value)
    }

    // ── Token metadata ───────────────────────────────────────────────────────

    pub fn token_uri(&self, token: TokenId) -> Result<Option<String>, LedgerError> {
        Self::get(&self.config, uri_key(token))
    }

    pub fn put_token_uri(&self, token: TokenId, uri: &str) -> Result<(), LedgerError> {
        Self::put(&self.config, uri_key(token), &uri.to_string())
    }

    // ── Meta ─────────────────────────────────────────────────────────────────

    pub fn genesis_done(&self) -> bool {
        self.meta.contains_key(KEY_GENESIS_DONE.as_bytes()).unwrap_or(false)
    }

    pub fn mark_genesis_done(&self) -> Result<(), LedgerError> {
        self.meta
            .insert(KEY_GENESIS_DONE.as_bytes(), b"".as_ref())
            .map_err(|e| LedgerError::Storage(e.to_string()))?;
        Ok(())
    }

    /// Flush all pending writes to disk.
    pub fn flush(&self) -> Result<(), LedgerError> {
        self._db.flush().map_err(|e| LedgerError::Storage(e.to_string()))?;
        Ok(())
    }
}
