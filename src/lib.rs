//! TNS SDK
//!
//! Client SDK for the TNS hierarchical name registry. This crate implements the
//! protocol logic a client needs to interoperate with the on-chain registry:
//! deterministic name hashing, registry entry resolution with grace-period
//! handling, the commit-reveal registration lifecycle, and DNSSEC-based claim
//! validation. Transport concerns (provider bootstrap, contract ABI bindings)
//! stay behind the [`rpc::RegistryRpc`] trait.

pub mod config;
pub mod dns;
pub mod entry;
pub mod namehash;
pub mod oracle;
pub mod registration;
pub mod rpc;
pub mod session;
pub mod utils;

// Re-export commonly used types
pub use config::{ContractAddresses, TnsConfig};
pub use dns::{ClaimEvaluation, ClaimState, DnsClaimValidator, DnsProofChain, DnssecProver};
pub use entry::{EntryResolver, RegistrarEntry};
pub use namehash::{label_hash, namehash, validate_name};
pub use oracle::PriceOracle;
pub use registration::{RegistrationEngine, RentQuote};
pub use rpc::{CallOptions, RegistryCall, RegistryRpc, RpcError, TxHandle};
pub use session::Session;

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// TNS SDK error types
#[derive(thiserror::Error, Debug)]
pub enum TnsError {
    #[error("Invalid name: {0}")]
    InvalidName(String),

    #[error("Invalid address: {0}")]
    InvalidAddress(String),

    #[error("Empty label list")]
    EmptyLabelList,

    #[error("Registry call failed: {0}")]
    Rpc(#[from] rpc::RpcError),

    #[error("DNSSEC lookup results cannot be {0}")]
    UnknownProofShape(usize),

    #[error("Price oracle unavailable: {0}")]
    OracleUnavailable(String),

    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Encoding error: {0}")]
    Encoding(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for TNS SDK operations
pub type TnsResult<T> = Result<T, TnsError>;

/// Amounts in the registry's base currency unit (wei)
pub type Wei = u128;

/// A 20-byte account or contract address
#[derive(Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Address([u8; 20]);

impl Address {
    /// The all-zero address, used by the registry as "not set"
    pub fn zero() -> Self {
        Address([0u8; 20])
    }

    /// Whether this is the all-zero address
    pub fn is_zero(&self) -> bool {
        self.0.iter().all(|b| *b == 0)
    }

    /// Raw address bytes
    pub fn as_bytes(&self) -> &[u8; 20] {
        &self.0
    }

    /// Build an address from raw bytes
    pub fn from_bytes(bytes: [u8; 20]) -> Self {
        Address(bytes)
    }
}

impl FromStr for Address {
    type Err = TnsError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let stripped = s.strip_prefix("0x").unwrap_or(s);
        if stripped.len() != 40 {
            return Err(TnsError::InvalidAddress(s.to_string()));
        }
        let mut bytes = [0u8; 20];
        hex::decode_to_slice(stripped, &mut bytes)
            .map_err(|_| TnsError::InvalidAddress(s.to_string()))?;
        Ok(Address(bytes))
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{}", hex::encode(self.0))
    }
}

impl fmt::Debug for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Address({})", self)
    }
}

impl TryFrom<String> for Address {
    type Error = TnsError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        s.parse()
    }
}

impl From<Address> for String {
    fn from(addr: Address) -> String {
        addr.to_string()
    }
}

/// A 32-byte hash value
#[derive(Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Hash32([u8; 32]);

/// Node identifier within the registry hierarchy (namehash output)
pub type NodeId = Hash32;
/// Hash of a single label
pub type LabelHash = Hash32;
/// Hiding commitment submitted ahead of registration
pub type Commitment = Hash32;

impl Hash32 {
    /// The all-zero hash; identifies the registry root node
    pub fn zero() -> Self {
        Hash32([0u8; 32])
    }

    /// Whether this is the all-zero hash
    pub fn is_zero(&self) -> bool {
        self.0.iter().all(|b| *b == 0)
    }

    /// Raw hash bytes
    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    /// Build a hash from raw bytes
    pub fn from_bytes(bytes: [u8; 32]) -> Self {
        Hash32(bytes)
    }
}

impl FromStr for Hash32 {
    type Err = TnsError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let stripped = s.strip_prefix("0x").unwrap_or(s);
        if stripped.len() != 64 {
            return Err(TnsError::Encoding(format!("expected 32-byte hex value, got {s:?}")));
        }
        let mut bytes = [0u8; 32];
        hex::decode_to_slice(stripped, &mut bytes)
            .map_err(|_| TnsError::Encoding(format!("expected 32-byte hex value, got {s:?}")))?;
        Ok(Hash32(bytes))
    }
}

impl fmt::Display for Hash32 {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{}", hex::encode(self.0))
    }
}

impl fmt::Debug for Hash32 {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Hash32({})", self)
    }
}

impl TryFrom<String> for Hash32 {
    type Error = TnsError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        s.parse()
    }
}

impl From<Hash32> for String {
    fn from(hash: Hash32) -> String {
        hash.to_string()
    }
}

/// Caller-supplied secret for the commit-reveal scheme
#[derive(Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Secret([u8; 32]);

impl Secret {
    /// A fresh random secret
    pub fn random() -> Self {
        use rand::RngCore;
        let mut bytes = [0u8; 32];
        rand::thread_rng().fill_bytes(&mut bytes);
        Secret(bytes)
    }

    /// Derive a secret from an arbitrary passphrase. Deterministic, so the
    /// same phrase always reproduces the same commitment.
    pub fn from_phrase(phrase: &str) -> Self {
        Secret(namehash::keccak256(phrase.as_bytes()))
    }

    /// Build a secret from raw bytes
    pub fn from_bytes(bytes: [u8; 32]) -> Self {
        Secret(bytes)
    }

    /// Raw secret bytes
    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }
}

impl fmt::Debug for Secret {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // Never leak the secret into logs
        write!(f, "Secret(..)")
    }
}

impl TryFrom<String> for Secret {
    type Error = TnsError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        let hash: Hash32 = s.parse()?;
        Ok(Secret(*hash.as_bytes()))
    }
}

impl From<Secret> for String {
    fn from(secret: Secret) -> String {
        format!("0x{}", hex::encode(secret.0))
    }
}
