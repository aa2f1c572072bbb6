//! Registry RPC seam
//!
//! Everything the SDK needs from the chain goes through [`RegistryRpc`]: read
//! calls against the registry, registrar, and controller contracts, a gas
//! estimation simulation, and a single write entry point taking a
//! [`RegistryCall`] description. Implementations wrap whatever transport and
//! contract bindings the embedding application uses; tests use an in-memory
//! mock.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::{Address, Commitment, LabelHash, NodeId, Secret, Wei};

/// Remote call failure carrying the underlying transport or revert message
#[derive(thiserror::Error, Debug, Clone)]
#[error("{message}")]
pub struct RpcError {
    /// Underlying error text, including any revert reason
    pub message: String,
}

impl RpcError {
    /// Wrap an error message
    pub fn new(message: impl Into<String>) -> Self {
        Self { message: message.into() }
    }
}

/// Result type for raw registry RPC calls
pub type RpcResult<T> = Result<T, RpcError>;

/// A 4-byte contract capability identifier
pub type InterfaceId = [u8; 4];

/// Capability identifiers advertised by the registrar contracts
pub mod interface_ids {
    use super::InterfaceId;

    /// Legacy auction registrar
    pub const LEGACY_REGISTRAR: InterfaceId = [0x7b, 0xa1, 0x8b, 0xa1];
    /// Permanent registrar controller
    pub const PERMANENT_REGISTRAR: InterfaceId = [0x01, 0x8f, 0xac, 0x06];
    /// Bulk renewal contract
    pub const BULK_RENEWAL: InterfaceId = [0x31, 0x50, 0xbf, 0xba];
    /// DNSSEC claim, legacy protocol (flat proof payload)
    pub const DNSSEC_CLAIM_OLD: InterfaceId = [0x1a, 0xa2, 0xe6, 0x41];
    /// DNSSEC claim, current protocol (resource-record sets)
    pub const DNSSEC_CLAIM_NEW: InterfaceId = [0x17, 0xd8, 0xf4, 0x9b];
}

/// Block metadata snapshot
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlockInfo {
    /// Block number
    pub number: u64,
    /// Block timestamp, seconds since the Unix epoch
    pub timestamp: u64,
}

/// A DNSSEC resource-record set with its signature, flattened for submission
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SignedRrset {
    /// Wire-format record set
    pub rrset: Vec<u8>,
    /// RRSIG covering the set
    pub sig: Vec<u8>,
}

/// Proof payload shape, depending on the registrar protocol version
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum DnsPayload {
    /// Legacy protocol: one flat byte payload
    Flat(Vec<u8>),
    /// Current protocol: ordered record-set tuples
    Rrsets(Vec<SignedRrset>),
}

impl DnsPayload {
    /// Whether the payload carries no proof material
    pub fn is_empty(&self) -> bool {
        match self {
            DnsPayload::Flat(data) => data.is_empty(),
            DnsPayload::Rrsets(sets) => sets.is_empty(),
        }
    }
}

/// Description of a state-changing registry call.
///
/// The SDK never assembles calldata itself; it hands one of these to the RPC
/// implementation for encoding and submission, and to [`RegistryRpc::estimate_gas`]
/// for simulation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum RegistryCall {
    /// Submit a registration commitment
    Commit {
        commitment: Commitment,
    },
    /// Reveal a registration without resolver configuration
    Register {
        label: String,
        owner: Address,
        duration: u64,
        secret: Secret,
    },
    /// Reveal a registration, also configuring a resolver and resolved address
    RegisterWithConfig {
        label: String,
        owner: Address,
        duration: u64,
        secret: Secret,
        resolver: Address,
        addr: Address,
    },
    /// Renew a single name
    Renew {
        label: String,
        duration: u64,
    },
    /// Renew several names in one call
    RenewAll {
        labels: Vec<String>,
        duration: u64,
    },
    /// Transfer registration ownership
    TransferOwner {
        from: Address,
        to: Address,
        label_hash: LabelHash,
    },
    /// Reset the registry record of an owned name to a new address
    Reclaim {
        label_hash: LabelHash,
        addr: Address,
    },
    /// Claim a DNS name with no proof material
    DnsClaim {
        registrar: Address,
        encoded_name: Vec<u8>,
        proof: Vec<u8>,
    },
    /// Prove a DNSSEC chain and claim in one call
    DnsProveAndClaim {
        registrar: Address,
        encoded_name: Vec<u8>,
        payload: DnsPayload,
        proof: Vec<u8>,
    },
    /// Prove and claim, additionally binding a resolver and resolved address
    DnsProveAndClaimWithResolver {
        registrar: Address,
        encoded_name: Vec<u8>,
        payload: DnsPayload,
        proof: Vec<u8>,
        resolver: Address,
        addr: Address,
    },
    /// Register a name on the throwaway test registrar
    RegisterTest {
        registrar: Address,
        label_hash: LabelHash,
        owner: Address,
    },
}

/// Options attached to a submitted call
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CallOptions {
    /// Funds to attach, if the call is payable
    pub value: Option<Wei>,
    /// Explicit gas limit; `None` delegates estimation to the execution layer
    pub gas_limit: Option<u64>,
}

/// Handle to a submitted transaction
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TxHandle {
    /// Transaction hash
    pub hash: crate::Hash32,
    /// Gas limit the transaction was submitted with, if one was set
    pub gas_limit: Option<u64>,
    /// Funds attached to the transaction
    pub value: Option<Wei>,
}

/// External registry RPC collaborator.
///
/// All methods are single request/response calls; the SDK fans independent
/// reads out concurrently but never retries or queues writes. `owner_of` is
/// expected to fail for unregistered names, and capability probes may fail on
/// contracts that do not implement the introspection interface; callers of
/// those methods treat failure as an answer, not an error.
#[async_trait]
pub trait RegistryRpc: Send + Sync {
    /// Network chain id
    async fn chain_id(&self) -> RpcResult<u64>;

    /// Latest block number and timestamp
    async fn latest_block(&self) -> RpcResult<BlockInfo>;

    /// Address submitting calls through this connection
    async fn caller(&self) -> RpcResult<Address>;

    /// Resolver contract configured for a node, zero if unset
    async fn resolver(&self, node: NodeId) -> RpcResult<Address>;

    /// Whether the registry holds a record for a node
    async fn record_exists(&self, node: NodeId) -> RpcResult<bool>;

    /// Registry-level owner of a node
    async fn node_owner(&self, node: NodeId) -> RpcResult<Address>;

    /// `addr` record of a node, read through the given resolver
    async fn resolve_addr(&self, resolver: Address, node: NodeId) -> RpcResult<Address>;

    /// Text record of a node, read through the given resolver
    async fn text(&self, resolver: Address, node: NodeId, key: &str) -> RpcResult<String>;

    /// Low-level registrar availability check by label hash
    async fn registrar_available(&self, label_hash: LabelHash) -> RpcResult<bool>;

    /// Controller availability check by plain label; the controller applies
    /// extra validity rules (e.g. minimum length) on top of the registrar's
    async fn controller_available(&self, label: &str) -> RpcResult<bool>;

    /// Expiry timestamp of a registration, 0 if never registered
    async fn name_expires(&self, label_hash: LabelHash) -> RpcResult<u64>;

    /// Current registrant of a name; reverts for unregistered names
    async fn owner_of(&self, label_hash: LabelHash) -> RpcResult<Address>;

    /// Registry-wide grace period constant, in seconds
    async fn grace_period(&self) -> RpcResult<u64>;

    /// Rent price for a label over a duration; duration 0 quotes any premium
    async fn rent_price(&self, label: &str, duration: u64) -> RpcResult<Wei>;

    /// Minimum commitment age before a reveal is accepted, in seconds
    async fn min_commitment_age(&self) -> RpcResult<u64>;

    /// Maximum commitment age before a commitment expires, in seconds
    async fn max_commitment_age(&self) -> RpcResult<u64>;

    /// Timestamp a commitment was recorded at, 0 if absent
    async fn commitment_timestamp(&self, commitment: Commitment) -> RpcResult<u64>;

    /// Capability probe against a contract
    async fn supports_interface(
        &self,
        contract: Address,
        interface_id: InterfaceId,
    ) -> RpcResult<bool>;

    /// DNSSEC oracle address advertised by a DNS registrar
    async fn dns_oracle(&self, registrar: Address) -> RpcResult<Address>;

    /// Expiry timestamp on the test registrar, 0 if unregistered
    async fn test_registrar_expiry(
        &self,
        registrar: Address,
        label_hash: LabelHash,
    ) -> RpcResult<u64>;

    /// Simulate a call and return its gas estimate
    async fn estimate_gas(&self, call: &RegistryCall, value: Option<Wei>) -> RpcResult<u64>;

    /// Submit a state-changing call
    async fn submit(&self, call: &RegistryCall, options: CallOptions) -> RpcResult<TxHandle>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dns_payload_emptiness() {
        assert!(DnsPayload::Flat(Vec::new()).is_empty());
        assert!(DnsPayload::Rrsets(Vec::new()).is_empty());
        assert!(!DnsPayload::Flat(vec![1, 2, 3]).is_empty());
        assert!(!DnsPayload::Rrsets(vec![SignedRrset { rrset: vec![1], sig: vec![2] }]).is_empty());
    }

    #[test]
    fn test_call_options_default_sets_nothing() {
        let options = CallOptions::default();
        assert_eq!(options.value, None);
        assert_eq!(options.gas_limit, None);
    }
}
