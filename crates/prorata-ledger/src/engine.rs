//! The ledger engine.
//!
//! Every mutating call stages its writes in memory, validates completely,
//! then commits; a failed call leaves the database untouched. Profit owed to
//! WEIGHT holders is never pushed: each holder's share is crystallized
//! lazily, immediately before any operation that reads or moves that
//! holder's balances, so a deposit costs the same no matter how many holders
//! exist.

use std::collections::BTreeMap;
use std::sync::Arc;

use prorata_authz::TaskAuthorizer;
use prorata_core::account::Account;
use prorata_core::constants::{
    EXCHANGE_ACCOUNT_SLOTS, PROFIT_PERCENTAGE_MAX, PROFIT_PERCENTAGE_MIN, RAMP_UP_PHASE_END,
    TOTAL_VALUE_SUPPLY, TOTAL_WEIGHT_SUPPLY,
};
use prorata_core::error::LedgerError;
use prorata_core::event::{LedgerEvent, Receipt};
use prorata_core::types::{AccountId, Balance, TaskId, Timestamp, TokenId};
use tracing::{debug, info};

use crate::db::LedgerDb;

// ── Owed computation ─────────────────────────────────────────────────────────

/// Pro-rata entitlement of a `weight` holding against the cumulative profit
/// counter. Truncating division; zero when either factor is zero.
fn entitlement(weight: Balance, all_time_profit: Balance, circulating: Balance) -> Balance {
    if weight == 0 || circulating == 0 {
        return 0;
    }
    weight * all_time_profit / circulating
}

/// Profit owed to an account but not yet crystallized into its stored
/// balance.
///
/// Pure function of the account record and the two global factors; the
/// mutating counterpart lives in the staged settlement. The subtraction
/// saturates: reservoir distributions grow the circulating denominator, which
/// can push an entitlement below a basis anchored at the older, smaller
/// denominator.
pub fn owed(account: &Account, all_time_profit: Balance, circulating: Balance) -> Balance {
    entitlement(account.weight_balance, all_time_profit, circulating)
        .saturating_sub(account.profit_basis)
}

/// `floor(amount * pct / 100)`, exact over the whole `Balance` range: the
/// split evaluation has no intermediate product that can overflow for any
/// `pct <= 100`.
fn profit_cut(amount: Balance, pct: u32) -> Balance {
    let pct = pct as Balance;
    (amount / 100) * pct + (amount % 100) * pct / 100
}

// ── Staged state ─────────────────────────────────────────────────────────────

/// Working copies of everything one call may touch, committed atomically
/// after full validation.
struct StagedState<'a> {
    db: &'a LedgerDb,
    reservoir: AccountId,
    accounts: BTreeMap<AccountId, Account>,
    all_time_profit: Balance,
    profit_transferred: Balance,
    events: Vec<LedgerEvent>,
}

impl<'a> StagedState<'a> {
    fn load(db: &'a LedgerDb) -> Result<Self, LedgerError> {
        let reservoir = db.reservoir_account()?.ok_or(LedgerError::GenesisNotApplied)?;
        Ok(Self {
            db,
            reservoir,
            accounts: BTreeMap::new(),
            all_time_profit: db.all_time_profit()?,
            profit_transferred: db.profit_transferred()?,
            events: Vec::new(),
        })
    }

    /// Working copy of `id`, loaded on first touch.
    fn account(&mut self, id: &AccountId) -> Result<&mut Account, LedgerError> {
        use std::collections::btree_map::Entry;
        let db = self.db;
        Ok(match self.accounts.entry(id.clone()) {
            Entry::Occupied(e) => e.into_mut(),
            Entry::Vacant(e) => e.insert(db.account_or_default(id)?),
        })
    }

    /// WEIGHT supply in circulation: everything not held by the reservoir,
    /// evaluated against the staged view. Derived, never stored.
    fn circulating(&mut self) -> Result<Balance, LedgerError> {
        let reservoir = self.reservoir.clone();
        let held = self.account(&reservoir)?.weight_balance;
        Ok(TOTAL_WEIGHT_SUPPLY.saturating_sub(held))
    }

    /// Crystallize any profit owed to `id`: move it into the stored VALUE
    /// balance and advance the per-account and global counters by the same
    /// amount, leaving the observable balance unchanged. The reservoir never
    /// participates. Idempotent until the profit counter next moves.
    fn settle(&mut self, id: &AccountId) -> Result<(), LedgerError> {
        if *id == self.reservoir {
            return Ok(());
        }
        let circulating = self.circulating()?;
        let all_time_profit = self.all_time_profit;
        let acc = self.account(id)?;
        let due = owed(acc, all_time_profit, circulating);
        if due == 0 {
            return Ok(());
        }
        acc.value_balance += due;
        acc.profit_basis += due;
        acc.profit_credited += due;
        self.profit_transferred += due;
        self.events.push(LedgerEvent::ProfitDistributed {
            account: id.clone(),
            amount: due,
        });
        debug!(account = %id, amount = due, "profit crystallized");
        Ok(())
    }

    /// Re-anchor `profit_basis` after a WEIGHT-balance change so the owed
    /// formula restarts from zero pending at the new weight. Fractions
    /// deferred at the old weight do not transport to the new position.
    fn rebase(&mut self, id: &AccountId) -> Result<(), LedgerError> {
        if *id == self.reservoir {
            return Ok(());
        }
        let circulating = self.circulating()?;
        let all_time_profit = self.all_time_profit;
        let acc = self.account(id)?;
        acc.profit_basis = entitlement(acc.weight_balance, all_time_profit, circulating);
        Ok(())
    }

    /// Write every staged record and counter, then hand back the receipt.
    fn commit(self) -> Result<Receipt, LedgerError> {
        for acc in self.accounts.values() {
            self.db.put_account(acc)?;
        }
        self.db.put_all_time_profit(self.all_time_profit)?;
        self.db.put_profit_transferred(self.profit_transferred)?;
        Ok(Receipt { events: self.events })
    }
}

// ── SupplyAudit ──────────────────────────────────────────────────────────────

/// Full-ledger balance sums, for diagnostics and invariant checks.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SupplyAudit {
    pub stored_value: Balance,
    pub pending_profit: Balance,
    pub stored_weight: Balance,
}

impl SupplyAudit {
    /// Observable VALUE total: stored plus everything still pending. Falls
    /// short of the fixed supply by at most the truncation dust not yet
    /// attributable to any single holder; it never exceeds it.
    pub fn value_total(&self) -> Balance {
        self.stored_value + self.pending_profit
    }
}

// ── LedgerEngine ─────────────────────────────────────────────────────────────

/// The ledger state machine.
///
/// One instance per database. Callers serialize their calls; each method
/// runs to completion atomically with no partial effects on failure.
pub struct LedgerEngine {
    pub db: Arc<LedgerDb>,
    authz: Arc<dyn TaskAuthorizer>,
}

impl LedgerEngine {
    pub fn new(db: Arc<LedgerDb>, authz: Arc<dyn TaskAuthorizer>) -> Self {
        Self { db, authz }
    }

    // ── Read surface ─────────────────────────────────────────────────────────

    /// Observable balance: the stored amount, plus pending profit for VALUE
    /// reads of non-reservoir accounts. Side-effect free.
    pub fn balance_of(&self, id: &AccountId, token: TokenId) -> Result<Balance, LedgerError> {
        let acc = self.db.account_or_default(id)?;
        match token {
            TokenId::Weight => Ok(acc.weight_balance),
            TokenId::Value => {
                if self.is_reservoir(id)? {
                    return Ok(acc.value_balance);
                }
                let all_time_profit = self.db.all_time_profit()?;
                let circulating = self.total_circulating_governance_tokens()?;
                Ok(acc.value_balance + owed(&acc, all_time_profit, circulating))
            }
        }
    }

    /// Profit owed to `id` but not yet crystallized.
    pub fn pending_profit(&self, id: &AccountId) -> Result<Balance, LedgerError> {
        if self.is_reservoir(id)? {
            return Ok(0);
        }
        let acc = self.db.account_or_default(id)?;
        let all_time_profit = self.db.all_time_profit()?;
        let circulating = self.total_circulating_governance_tokens()?;
        Ok(owed(&acc, all_time_profit, circulating))
    }

    pub fn total_supply(&self, token: TokenId) -> Balance {
        match token {
            TokenId::Value => TOTAL_VALUE_SUPPLY,
            TokenId::Weight => TOTAL_WEIGHT_SUPPLY,
        }
    }

    /// Whether a wire code names one of the two defined tokens.
    pub fn exists(&self, token_code: u32) -> bool {
        TokenId::from_code(token_code).is_ok()
    }

    /// Metadata URI for `token`; empty until genesis stores one.
    pub fn uri(&self, token: TokenId) -> Result<String, LedgerError> {
        Ok(self.db.token_uri(token)?.unwrap_or_default())
    }

    /// WEIGHT supply minus the reservoir's holding; denominator of the
    /// profit-share formula. Zero before genesis.
    pub fn total_circulating_governance_tokens(&self) -> Result<Balance, LedgerError> {
        match self.db.reservoir_account()? {
            None => Ok(0),
            Some(r) => {
                let held = self.db.account_or_default(&r)?.weight_balance;
                Ok(TOTAL_WEIGHT_SUPPLY.saturating_sub(held))
            }
        }
    }

    pub fn all_time_profit(&self) -> Result<Balance, LedgerError> {
        self.db.all_time_profit()
    }

    pub fn profit_tokens_transferred_to_accounts(&self) -> Result<Balance, LedgerError> {
        self.db.profit_transferred()
    }

    pub fn profit_percentage(&self) -> Result<u32, LedgerError> {
        self.db.profit_percentage()
    }

    pub fn treasury_account(&self) -> Result<Option<AccountId>, LedgerError> {
        self.db.treasury_account()
    }

    pub fn exchange_account(&self, slot: u8) -> Result<Option<AccountId>, LedgerError> {
        if slot == 0 || slot > EXCHANGE_ACCOUNT_SLOTS {
            return Err(LedgerError::InvalidExchangeSlot(slot));
        }
        self.db.exchange_account(slot)
    }

    pub fn reservoir_account(&self) -> Result<Option<AccountId>, LedgerError> {
        self.db.reservoir_account()
    }

    pub fn locked_until(&self, id: &AccountId) -> Result<Timestamp, LedgerError> {
        Ok(self.db.account_or_default(id)?.locked_until)
    }

    /// Walk every stored account and sum balances and pending profit. O(n)
    /// diagnostics surface; the distribution path itself never iterates
    /// holders.
    pub fn audit_supply(&self) -> Result<SupplyAudit, LedgerError> {
        let reservoir = self.db.reservoir_account()?;
        let all_time_profit = self.db.all_time_profit()?;
        let circulating = self.total_circulating_governance_tokens()?;

        let mut audit = SupplyAudit {
            stored_value: 0,
            pending_profit: 0,
            stored_weight: 0,
        };
        for acc in self.db.all_accounts()? {
            audit.stored_value += acc.value_balance;
            audit.stored_weight += acc.weight_balance;
            if reservoir.as_ref() != Some(&acc.account_id) {
                audit.pending_profit += owed(&acc, all_time_profit, circulating);
            }
        }
        Ok(audit)
    }

    fn is_reservoir(&self, id: &AccountId) -> Result<bool, LedgerError> {
        Ok(self.db.reservoir_account()?.as_ref() == Some(id))
    }

    // ── Transfers ────────────────────────────────────────────────────────────

    /// Move `amount` of `token` from one account to another at time `now`.
    ///
    /// VALUE deposits from a registered exchange account into the treasury
    /// are intercepted for profit capture: the configured percentage never
    /// reaches the treasury's stored balance and becomes pending profit for
    /// every WEIGHT holder instead. The emitted transfer event still carries
    /// the full deposited amount.
    pub fn transfer(
        &self,
        from: &AccountId,
        to: &AccountId,
        token: TokenId,
        amount: Balance,
        now: Timestamp,
    ) -> Result<Receipt, LedgerError> {
        if amount == 0 {
            return Err(LedgerError::ZeroAmount);
        }
        if to.is_null() {
            return Err(LedgerError::NullAddressTarget);
        }

        let mut staged = StagedState::load(&self.db)?;
        staged.settle(from)?;
        staged.settle(to)?;

        {
            let sender = staged.account(from)?;
            if sender.is_locked(now) {
                return Err(LedgerError::AccountLocked {
                    until: sender.locked_until,
                });
            }
            let have = sender.stored_balance(token);
            if have < amount {
                return Err(LedgerError::InsufficientBalance { need: amount, have });
            }
        }

        // Capture happens only for a deposit the sender can cover. The
        // endpoints were settled at the pre-capture counter; their share of
        // this capture stays pending like any other holder's.
        let captured = if token == TokenId::Value && self.is_capture_deposit(from, to)? {
            profit_cut(amount, self.db.profit_percentage()?)
        } else {
            0
        };
        if captured > 0 {
            staged.all_time_profit += captured;
        }

        {
            let sender = staged.account(from)?;
            match token {
                TokenId::Value => sender.value_balance -= amount,
                TokenId::Weight => sender.weight_balance -= amount,
            }
        }
        {
            let recipient = staged.account(to)?;
            match token {
                TokenId::Value => recipient.value_balance += amount - captured,
                TokenId::Weight => recipient.weight_balance += amount,
            }
        }

        if token == TokenId::Weight {
            staged.rebase(from)?;
            staged.rebase(to)?;
        }

        staged.events.push(LedgerEvent::TokenTransferred {
            token,
            from: from.clone(),
            to: to.clone(),
            amount,
        });
        if captured > 0 {
            staged.events.push(LedgerEvent::ProfitTokensCollected { amount: captured });
        }

        let receipt = staged.commit()?;
        info!(from = %from, to = %to, token = %token, amount, "transfer applied");
        Ok(receipt)
    }

    /// Whether a VALUE move from `from` to `to` is a registered-exchange
    /// deposit into the treasury.
    fn is_capture_deposit(&self, from: &AccountId, to: &AccountId) -> Result<bool, LedgerError> {
        let treasury = match self.db.treasury_account()? {
            Some(t) => t,
            None => return Ok(false),
        };
        if *to != treasury {
            return Ok(false);
        }
        for slot in 1..=EXCHANGE_ACCOUNT_SLOTS {
            if self.db.exchange_account(slot)?.as_ref() == Some(from) {
                return Ok(true);
            }
        }
        Ok(false)
    }

    // ── Reservoir distribution ───────────────────────────────────────────────

    /// Admin-gated move out of the reservoir, outside the ramp-up machinery:
    /// no window check and no lock is written. WEIGHT moved this way enters
    /// circulation and starts accruing profit from this point only.
    pub fn transfer_from_reservoir(
        &self,
        caller: &AccountId,
        task: TaskId,
        to: &AccountId,
        token: TokenId,
        amount: Balance,
    ) -> Result<Receipt, LedgerError> {
        self.require_admin(caller)?;
        if amount == 0 {
            return Err(LedgerError::ZeroAmount);
        }
        if to.is_null() {
            return Err(LedgerError::NullAddressTarget);
        }

        let mut staged = StagedState::load(&self.db)?;
        let reservoir_id = staged.reservoir.clone();

        staged.settle(to)?;

        {
            let reservoir = staged.account(&reservoir_id)?;
            let have = reservoir.stored_balance(token);
            if have < amount {
                return Err(LedgerError::InsufficientBalance { need: amount, have });
            }
            match token {
                TokenId::Value => reservoir.value_balance -= amount,
                TokenId::Weight => reservoir.weight_balance -= amount,
            }
        }
        {
            let dest = staged.account(to)?;
            match token {
                TokenId::Value => dest.value_balance += amount,
                TokenId::Weight => dest.weight_balance += amount,
            }
        }
        if token == TokenId::Weight {
            staged.rebase(to)?;
        }

        staged.events.push(LedgerEvent::TokenTransferred {
            token,
            from: reservoir_id,
            to: to.clone(),
            amount,
        });

        self.authz.authorize(task)?;
        let receipt = staged.commit()?;
        info!(to = %to, token = %token, amount, "reservoir distribution applied");
        Ok(receipt)
    }

    // ── Ramp-up distribution ─────────────────────────────────────────────────

    /// Batch VALUE distribution from the reservoir with optional per-entry
    /// time locks, possible only while the ramp-up phase lasts. The batch is
    /// all-or-nothing: one bad entry aborts everything and leaves the
    /// authorization task unconsumed.
    pub fn ramp_up_phase_distribute_token(
        &self,
        caller: &AccountId,
        task: TaskId,
        accounts: &[AccountId],
        amounts: &[Balance],
        lock_until: &[Timestamp],
        now: Timestamp,
    ) -> Result<Receipt, LedgerError> {
        self.require_admin(caller)?;
        if now >= RAMP_UP_PHASE_END {
            return Err(LedgerError::RampUpPhaseFinished);
        }
        if accounts.len() != amounts.len() || accounts.len() != lock_until.len() {
            return Err(LedgerError::ArrayLengthMismatch);
        }
        if accounts.is_empty() {
            return Err(LedgerError::EmptyBatch);
        }

        let treasury = self.db.treasury_account()?;
        let mut staged = StagedState::load(&self.db)?;
        let reservoir_id = staged.reservoir.clone();

        for i in 0..accounts.len() {
            let account = &accounts[i];
            let amount = amounts[i];
            let lock = lock_until[i];

            if account.is_null() {
                return Err(LedgerError::NullAddressTarget);
            }
            if treasury.as_ref() == Some(account) {
                return Err(LedgerError::TransferToTreasury);
            }
            if *account == reservoir_id {
                return Err(LedgerError::TransferToReservoir);
            }
            if amount == 0 {
                return Err(LedgerError::ZeroAmount);
            }

            staged.settle(account)?;

            {
                let reservoir = staged.account(&reservoir_id)?;
                if reservoir.value_balance < amount {
                    return Err(LedgerError::InsufficientBalance {
                        need: amount,
                        have: reservoir.value_balance,
                    });
                }
                reservoir.value_balance -= amount;
            }
            {
                // Direct stored-balance credit: the target may be about to
                // become locked by this very entry, so the ordinary sender
                // lock check never applies here.
                let target = staged.account(account)?;
                target.value_balance += amount;
                if lock != 0 {
                    target.locked_until = lock;
                }
            }

            staged.events.push(LedgerEvent::TokenTransferred {
                token: TokenId::Value,
                from: reservoir_id.clone(),
                to: account.clone(),
                amount,
            });
            staged.events.push(LedgerEvent::RampUpTokensDistributed {
                account: account.clone(),
                amount,
                locked_until: lock,
            });
        }

        self.authz.authorize(task)?;
        let receipt = staged.commit()?;
        info!(entries = accounts.len(), "ramp-up distribution applied");
        Ok(receipt)
    }

    // ── Buy-back capture ─────────────────────────────────────────────────────

    /// Record an off-ledger buy-back: the configured percentage of `amount`
    /// leaves the treasury's stored balance and becomes pending profit. A
    /// computed profit of zero is a valid no-op that still consumes the
    /// authorization task. The treasury is settled before the counter moves,
    /// so its own share of the new profit stays pending until its next touch.
    pub fn process_manual_buy_back_event(
        &self,
        caller: &AccountId,
        task: TaskId,
        amount: Balance,
    ) -> Result<Receipt, LedgerError> {
        self.require_admin(caller)?;

        let profit = profit_cut(amount, self.db.profit_percentage()?);
        if profit == 0 {
            self.authz.authorize(task)?;
            info!(amount, "manual buy-back below capture threshold");
            return Ok(Receipt::default());
        }

        let treasury = self.db.treasury_account()?.ok_or(LedgerError::TreasuryNotSet)?;

        let mut staged = StagedState::load(&self.db)?;
        staged.settle(&treasury)?;

        {
            let t = staged.account(&treasury)?;
            if t.value_balance < profit {
                return Err(LedgerError::InsufficientBalance {
                    need: profit,
                    have: t.value_balance,
                });
            }
            t.value_balance -= profit;
        }
        // the counter moves only once the treasury has covered the cut
        staged.all_time_profit += profit;

        staged.events.push(LedgerEvent::ManualBuyBackWithdrawal { amount: profit });
        staged.events.push(LedgerEvent::ProfitTokensCollected { amount: profit });

        self.authz.authorize(task)?;
        let receipt = staged.commit()?;
        info!(amount, profit, "manual buy-back processed");
        Ok(receipt)
    }

    // ── Configuration ────────────────────────────────────────────────────────

    pub fn set_treasury_account(
        &self,
        caller: &AccountId,
        task: TaskId,
        account: &AccountId,
    ) -> Result<Receipt, LedgerError> {
        self.require_admin(caller)?;
        if account.is_null() {
            return Err(LedgerError::NullAddressTarget);
        }
        self.authz.authorize(task)?;
        self.db.put_treasury_account(account)?;
        info!(account = %account, "treasury account changed");
        Ok(Receipt {
            events: vec![LedgerEvent::TreasuryAccountChanged {
                account: account.clone(),
            }],
        })
    }

    pub fn set_exchange_account(
        &self,
        caller: &AccountId,
        task: TaskId,
        slot: u8,
        account: &AccountId,
    ) -> Result<Receipt, LedgerError> {
        self.require_admin(caller)?;
        if slot == 0 || slot > EXCHANGE_ACCOUNT_SLOTS {
            return Err(LedgerError::InvalidExchangeSlot(slot));
        }
        if account.is_null() {
            return Err(LedgerError::NullAddressTarget);
        }
        self.authz.authorize(task)?;
        self.db.put_exchange_account(slot, account)?;
        info!(slot, account = %account, "exchange account changed");
        Ok(Receipt {
            events: vec![LedgerEvent::ExchangeAccountChanged {
                slot,
                account: account.clone(),
            }],
        })
    }

    /// Reconfigure the capture percentage. The new value must lie inside the
    /// allowed band and differ from the current one.
    pub fn set_profit_percentage(
        &self,
        caller: &AccountId,
        task: TaskId,
        value: u32,
    ) -> Result<Receipt, LedgerError> {
        self.require_admin(caller)?;
        if !(PROFIT_PERCENTAGE_MIN..=PROFIT_PERCENTAGE_MAX).contains(&value) {
            return Err(LedgerError::InvalidProfitPercentage(value));
        }
        if value == self.db.profit_percentage()? {
            return Err(LedgerError::InvalidProfitPercentage(value));
        }
        self.authz.authorize(task)?;
        self.db.put_profit_percentage(value)?;
        info!(value, "profit percentage changed");
        Ok(Receipt::default())
    }

    pub fn set_token_uri(
        &self,
        caller: &AccountId,
        task: TaskId,
        token: TokenId,
        uri: &str,
    ) -> Result<Receipt, LedgerError> {
        self.require_admin(caller)?;
        if uri.is_empty() {
            return Err(LedgerError::EmptyUri);
        }
        self.authz.authorize(task)?;
        self.db.put_token_uri(token, uri)?;
        info!(token = %token, uri, "token uri changed");
        Ok(Receipt {
            events: vec![LedgerEvent::UriChanged {
                token,
                uri: uri.to_string(),
            }],
        })
    }

    fn require_admin(&self, caller: &AccountId) -> Result<(), LedgerError> {
        if !self.authz.is_admin(caller) {
            return Err(LedgerError::NotAdmin);
        }
        Ok(())
    }
}
