use serde::{Deserialize, Serialize};

use crate::types::{AccountId, Balance, Timestamp, TokenId};

// ── Account ──────────────────────────────────────────────────────────────────

/// Per-account ledger record as stored in the state DB.
///
/// Accounts come into existence implicitly: reading an unknown id yields the
/// zero record. The stored VALUE balance is not the externally observable
/// one — pending profit is added on top at read time.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Account {
    pub account_id: AccountId,
    /// Stored VALUE balance.
    pub value_balance: Balance,
    /// Stored WEIGHT balance; determines the pro-rata profit share.
    pub weight_balance: Balance,
    /// Pro-rata entitlement already accounted for against the global profit
    /// counter; subtrahend of the owed formula. Re-anchored whenever
    /// `weight_balance` changes.
    pub profit_basis: Balance,

    // ── Extensibility fields (serde(default) for backward compat) ────────────
    /// Cumulative profit ever crystallized into `value_balance`.
    #[serde(default)]
    pub profit_credited: Balance,
    /// Outgoing transfers are blocked while `now < locked_until`; 0 = never
    /// locked. Settable only during the ramp-up window.
    #[serde(default)]
    pub locked_until: Timestamp,
}

impl Account {
    pub fn new(account_id: AccountId) -> Self {
        Self {
            account_id,
            value_balance: 0,
            weight_balance: 0,
            profit_basis: 0,
            profit_credited: 0,
            locked_until: 0,
        }
    }

    /// Stored balance for `token`; pending profit not included.
    pub fn stored_balance(&self, token: TokenId) -> Balance {
        match token {
            TokenId::Value => self.value_balance,
            TokenId::Weight => self.weight_balance,
        }
    }

    /// Whether outgoing transfers are blocked at `now`. The lock expires at
    /// `locked_until` itself: an account may send again at that exact time.
    pub fn is_locked(&self, now: Timestamp) -> bool {
        now < self.locked_until
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_account_is_zeroed_and_unlocked() {
        let acc = Account::new(AccountId::derive(b"fresh"));
        assert_eq!(acc.stored_balance(TokenId::Value), 0);
        assert_eq!(acc.stored_balance(TokenId::Weight), 0);
        assert_eq!(acc.profit_basis, 0);
        assert_eq!(acc.profit_credited, 0);
        assert!(!acc.is_locked(0));
    }

    #[test]
    fn lock_expires_at_the_boundary() {
        let mut acc = Account::new(AccountId::derive(b"locked"));
        acc.locked_until = 1_640_986_500;
        assert!(acc.is_locked(1_640_986_499));
        assert!(!acc.is_locked(1_640_986_500));
        assert!(!acc.is_locked(1_640_986_501));
    }

    #[test]
    fn records_without_trailing_fields_deserialize() {
        // json written before profit_credited / locked_until existed
        let json = r#"{
            "account_id": [0,0,0,0,0,0,0,0,0,0,0,0,0,0,0,0,
                           0,0,0,0,0,0,0,0,0,0,0,0,0,0,0,7],
            "value_balance": 42,
            "weight_balance": 5,
            "profit_basis": 1
        }"#;
        let acc: Account = serde_json::from_str(json).unwrap();
        assert_eq!(acc.value_balance, 42);
        assert_eq!(acc.profit_credited, 0);
        assert_eq!(acc.locked_until, 0);
    }
}
