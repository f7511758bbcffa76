use thiserror::Error;

#[derive(Debug, Error)]
pub enum LedgerError {
    // ── Validation errors ────────────────────────────────────────────────────
    #[error("amount must be greater than zero")]
    ZeroAmount,

    #[error("transfer to the null address")]
    NullAddressTarget,

    #[error("non-existing token id: {0}")]
    UnknownTokenId(u32),

    #[error("malformed account id: {0}")]
    MalformedAccountId(String),

    #[error("batch array lengths do not match")]
    ArrayLengthMismatch,

    #[error("batch must contain at least one entry")]
    EmptyBatch,

    #[error("invalid value for profit percentage: {0}")]
    InvalidProfitPercentage(u32),

    #[error("invalid exchange account slot: {0}")]
    InvalidExchangeSlot(u8),

    #[error("token uri must not be empty")]
    EmptyUri,

    // ── State errors ─────────────────────────────────────────────────────────
    #[error("insufficient balance: need {need}, have {have}")]
    InsufficientBalance { need: u128, have: u128 },

    #[error("account cannot send tokens until {until}")]
    AccountLocked { until: i64 },

    #[error("ramp up phase is finished")]
    RampUpPhaseFinished,

    #[error("cannot transfer to treasury account")]
    TransferToTreasury,

    #[error("cannot transfer to reservoir account")]
    TransferToReservoir,

    #[error("treasury account is not set")]
    TreasuryNotSet,

    // ── Authorization errors ─────────────────────────────────────────────────
    #[error("caller is not an administrator")]
    NotAdmin,

    #[error("task not found: {0}")]
    TaskNotFound(u64),

    #[error("task not approved by quorum: {0}")]
    TaskNotApproved(u64),

    #[error("task already consumed: {0}")]
    TaskAlreadyConsumed(u64),

    // ── Serialization / storage ──────────────────────────────────────────────
    #[error("serialization error: {0}")]
    Serialization(String),

    #[error("storage error: {0}")]
    Storage(String),

    // ── Genesis ──────────────────────────────────────────────────────────────
    #[error("genesis state not applied")]
    GenesisNotApplied,

    #[error("genesis state already applied")]
    GenesisAlreadyApplied,

    #[error("genesis supply mismatch: expected {expected}, got {got}")]
    GenesisSupplyMismatch { expected: u128, got: u128 },
}
