/// ─── Prorata Protocol Constants ─────────────────────────────────────────────
///
/// A dual-token fund ledger: VALUE carries the investment unit, WEIGHT
/// carries governance and the pro-rata claim on collected profit.

// ── Supply ───────────────────────────────────────────────────────────────────

/// Total fixed VALUE supply. Never changes after genesis.
pub const TOTAL_VALUE_SUPPLY: u128 = 10_000_000_000;

/// Total fixed WEIGHT supply. Never changes after genesis.
pub const TOTAL_WEIGHT_SUPPLY: u128 = 1_000_000;

// ── Profit capture ───────────────────────────────────────────────────────────

/// Share of each qualifying treasury deposit captured as profit, in percent,
/// until reconfigured.
pub const DEFAULT_PROFIT_PERCENTAGE: u32 = 20;

/// Lower bound (inclusive) for the configurable profit percentage.
pub const PROFIT_PERCENTAGE_MIN: u32 = 10;

/// Upper bound (inclusive) for the configurable profit percentage.
pub const PROFIT_PERCENTAGE_MAX: u32 = 50;

/// Number of registered exchange account slots (1-based).
pub const EXCHANGE_ACCOUNT_SLOTS: u8 = 5;

// ── Ramp-up window (Unix seconds UTC) ────────────────────────────────────────

/// End of the ramp-up phase: 2022-01-02 00:00:00 UTC. Time-locked initial
/// distributions are possible strictly before this instant only.
pub const RAMP_UP_PHASE_END: i64 = 1_641_081_600;

// ── Token metadata ───────────────────────────────────────────────────────────

/// Genesis metadata URI for the VALUE token.
pub const GENESIS_VALUE_URI: &str = "ipfs://QmfBtH8BSztaYn3QFnz2qvu2ehZgy8AZsNMJDkgr3pdqT8";

/// Genesis metadata URI for the WEIGHT token.
pub const GENESIS_WEIGHT_URI: &str = "ipfs://QmRAXmU9AymDgtphh37hqx5R2QXSS2ngchQRDFtg6XSD7w";
