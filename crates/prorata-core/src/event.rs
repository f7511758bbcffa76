use serde::{Deserialize, Serialize};

use crate::types::{AccountId, Balance, Timestamp, TokenId};

// ── LedgerEvent ──────────────────────────────────────────────────────────────

/// Observable ledger notification. Every mutating call collects the events
/// it emitted, in order, into its `Receipt`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum LedgerEvent {
    /// Stored-balance movement of either token. Genesis mints carry the null
    /// address as `from`. Deposit capture reports the full deposited amount
    /// here even though the treasury's stored credit is reduced by the
    /// captured profit.
    TokenTransferred {
        token: TokenId,
        from: AccountId,
        to: AccountId,
        amount: Balance,
    },

    /// Metadata URI set for a token (genesis and reconfiguration).
    UriChanged { token: TokenId, uri: String },

    /// New treasury account configured.
    TreasuryAccountChanged { account: AccountId },

    /// Exchange account configured for `slot` (1-based).
    ExchangeAccountChanged { slot: u8, account: AccountId },

    /// Lazily accrued profit crystallized into an account's stored balance.
    ProfitDistributed { account: AccountId, amount: Balance },

    /// Profit captured out of a qualifying deposit or a manual buy-back.
    ProfitTokensCollected { amount: Balance },

    /// Treasury debit backing a manual buy-back.
    ManualBuyBackWithdrawal { amount: Balance },

    /// One ramp-up distribution entry applied. `locked_until` is the lock
    /// written for the target, 0 when the entry carried no lock.
    RampUpTokensDistributed {
        account: AccountId,
        amount: Balance,
        locked_until: Timestamp,
    },
}

// ── Receipt ──────────────────────────────────────────────────────────────────

/// Result of a successful mutating call: the ordered notifications it
/// emitted. Failed calls emit nothing.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Receipt {
    pub events: Vec<LedgerEvent>,
}
