use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::LedgerError;

/// Token amount. u128 comfortably holds the full VALUE supply of
/// 10_000_000_000 units and every counter derived from it.
pub type Balance = u128;

/// Unix timestamp (seconds, UTC).
pub type Timestamp = i64;

// ── AccountId ────────────────────────────────────────────────────────────────

/// 32-byte account identifier.
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct AccountId(pub [u8; 32]);

impl AccountId {
    /// The null address. Never a valid transfer target; genesis supply
    /// logically originates from it.
    pub const NULL: AccountId = AccountId([0u8; 32]);

    pub fn from_bytes(b: [u8; 32]) -> Self {
        Self(b)
    }

    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    /// Checked conversion from a raw byte slice; anything but exactly 32
    /// bytes is malformed.
    pub fn try_from_slice(bytes: &[u8]) -> Result<Self, LedgerError> {
        if bytes.len() != 32 {
            return Err(LedgerError::MalformedAccountId(format!(
                "expected 32 bytes, got {}",
                bytes.len()
            )));
        }
        let mut arr = [0u8; 32];
        arr.copy_from_slice(bytes);
        Ok(Self(arr))
    }

    pub fn is_null(&self) -> bool {
        self.0 == [0u8; 32]
    }

    /// Deterministic identifier: BLAKE3 of a role or fixture label.
    pub fn derive(label: &[u8]) -> Self {
        Self(*blake3::hash(label).as_bytes())
    }

    /// Base-58 encoded string representation.
    pub fn to_b58(&self) -> String {
        bs58::encode(&self.0).into_string()
    }

    pub fn from_b58(s: &str) -> Result<Self, LedgerError> {
        let bytes = bs58::decode(s)
            .into_vec()
            .map_err(|e| LedgerError::MalformedAccountId(e.to_string()))?;
        Self::try_from_slice(&bytes)
    }

    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }

    pub fn from_hex(s: &str) -> Result<Self, LedgerError> {
        let bytes = hex::decode(s).map_err(|e| LedgerError::MalformedAccountId(e.to_string()))?;
        Self::try_from_slice(&bytes)
    }
}

impl fmt::Display for AccountId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_b58())
    }
}

impl fmt::Debug for AccountId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "AccountId({})", &self.to_b58()[..8])
    }
}

// ── TokenId ──────────────────────────────────────────────────────────────────

/// The two token classes the ledger accounts for. Wire codes are stable:
/// 1 = VALUE, 2 = WEIGHT.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TokenId {
    /// High-supply investment/utility token.
    Value,
    /// Low-supply governance token; holding determines the profit share.
    Weight,
}

impl TokenId {
    pub fn code(&self) -> u32 {
        match self {
            TokenId::Value => 1,
            TokenId::Weight => 2,
        }
    }

    /// Resolve a wire code. Anything other than the two defined ids is
    /// rejected.
    pub fn from_code(code: u32) -> Result<TokenId, LedgerError> {
        match code {
            1 => Ok(TokenId::Value),
            2 => Ok(TokenId::Weight),
            _ => Err(LedgerError::UnknownTokenId(code)),
        }
    }
}

impl fmt::Display for TokenId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TokenId::Value => write!(f, "VALUE"),
            TokenId::Weight => write!(f, "WEIGHT"),
        }
    }
}

// ── TaskId ───────────────────────────────────────────────────────────────────

/// Handle into the external task-authorization service. The ledger never
/// interprets it beyond equality.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct TaskId(pub u64);

impl fmt::Display for TaskId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "task#{}", self.0)
    }
}

impl fmt::Debug for TaskId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "TaskId({})", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn account_id_b58_roundtrip() {
        let id = AccountId::derive(b"roundtrip");
        let restored = AccountId::from_b58(&id.to_b58()).unwrap();
        assert_eq!(id, restored);
    }

    #[test]
    fn account_id_hex_roundtrip() {
        let id = AccountId::derive(b"hex_roundtrip");
        let restored = AccountId::from_hex(&id.to_hex()).unwrap();
        assert_eq!(id, restored);
        assert_eq!(id.to_hex().len(), 64);
    }

    #[test]
    fn malformed_account_strings_rejected() {
        // wrong decoded length, valid alphabet
        assert!(matches!(
            AccountId::from_b58("3vQB7B6MrGQZaxCuFg4oh").unwrap_err(),
            LedgerError::MalformedAccountId(_)
        ));
        assert!(matches!(
            AccountId::from_hex("deadbeef").unwrap_err(),
            LedgerError::MalformedAccountId(_)
        ));
        // characters outside the alphabet
        assert!(AccountId::from_b58("0OIl").is_err());
        assert!(AccountId::from_hex("zz").is_err());
        // longer than an id must not silently truncate
        assert!(AccountId::from_hex(&"ab".repeat(33)).is_err());
    }

    #[test]
    fn null_account_is_null() {
        assert!(AccountId::NULL.is_null());
        assert!(!AccountId::derive(b"anyone").is_null());
    }

    #[test]
    fn token_codes_are_stable() {
        assert_eq!(TokenId::Value.code(), 1);
        assert_eq!(TokenId::Weight.code(), 2);
        assert_eq!(TokenId::from_code(1).unwrap(), TokenId::Value);
        assert_eq!(TokenId::from_code(2).unwrap(), TokenId::Weight);
    }

    #[test]
    fn unknown_token_code_rejected() {
        assert!(matches!(
            TokenId::from_code(3).unwrap_err(),
            LedgerError::UnknownTokenId(3)
        ));
        assert!(matches!(
            TokenId::from_code(0).unwrap_err(),
            LedgerError::UnknownTokenId(0)
        ));
    }

    #[test]
    fn account_id_bincode_roundtrip() {
        let id = AccountId::derive(b"serde");
        let bytes = bincode::serialize(&id).unwrap();
        let back: AccountId = bincode::deserialize(&bytes).unwrap();
        assert_eq!(id, back);
    }
}
