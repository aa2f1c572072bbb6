//! DNSSEC claim validation
//!
//! A DNS name is claimed on-chain by proving a DNSSEC chain over a TXT record
//! that names the claiming address. This module queries an external DNSSEC
//! prover, classifies the result into a closed set of claim states, and
//! assembles the proof submission for whichever registrar protocol version
//! the contract speaks.
//!
//! Claims are never cached: external DNS state can change between lookups, so
//! every evaluation re-fetches the proof chain.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::rpc::{
    interface_ids, CallOptions, DnsPayload, RegistryCall, RegistryRpc, SignedRrset, TxHandle,
};
use crate::session::Session;
use crate::{Address, TnsError, TnsResult};

/// Failure reported by the external DNSSEC prover
#[derive(thiserror::Error, Debug, Clone)]
#[error("{0}")]
pub struct ProverError(pub String);

/// One raw record from the prover's lookup chain. Only the count of these
/// drives classification; the fields are kept for diagnostics.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DnsLookupRecord {
    /// Queried name
    pub name: String,
    /// Record type, e.g. `TXT` or `DS`
    pub record_type: String,
}

/// Result of a DNSSEC proof lookup for one name
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DnsProofChain {
    /// Whether a claim TXT record was found
    pub found: bool,
    /// Raw TXT record value naming the claiming address; may be malformed
    pub owner_text: Option<String>,
    /// DNS wire encoding of the claimed name
    pub encoded_name: Vec<u8>,
    /// Whether the zone presented a DNSSEC proof chain at all
    pub signed: bool,
    /// Raw lookup results; the record count classifies missing claims
    pub results: Vec<DnsLookupRecord>,
    /// Trust-chain proof bytes
    pub proof: Vec<u8>,
    /// Flat proof payload for the legacy registrar protocol
    pub payload: Vec<u8>,
    /// Record-set tuples for the current registrar protocol
    pub rrsets: Vec<SignedRrset>,
}

/// Registrar protocol versions advertised by a DNS registrar contract
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DnsProtocol {
    /// Legacy protocol: flat proof payload
    pub old: bool,
    /// Current protocol: record-set tuples
    pub new: bool,
}

impl DnsProtocol {
    /// Whether the contract supports DNSSEC claims at all
    pub fn supported(&self) -> bool {
        self.old || self.new
    }
}

/// Classification of a DNSSEC claim lookup
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ClaimState {
    /// Claim record exists but names no address
    Empty,
    /// Claim record exists but its value is not a well-formed address
    Invalid,
    /// Claim record names the expected owner (or no expectation was given)
    ReadyToRegister,
    /// Claim record names a different owner than expected
    OutOfSync,
    /// The zone is not DNSSEC-signed
    DnssecDisabled,
    /// The zone is signed but the DNS entry does not exist
    DnsEntryMissing,
    /// The DNS entry exists but the claim subdomain does not
    SubdomainMissing,
    /// The lookup itself failed; carries the underlying error message
    LookupError(String),
}

/// Outcome of evaluating a claim for one name
#[derive(Debug, Clone)]
pub struct ClaimEvaluation {
    /// Classified claim state
    pub state: ClaimState,
    /// Owner address proven by the DNS record, when well-formed
    pub dns_owner: Option<Address>,
    /// The fetched proof chain; absent when the lookup failed
    pub claim: Option<DnsProofChain>,
    /// Protocol versions the registrar contract advertises
    pub protocol: DnsProtocol,
}

/// External DNSSEC proof oracle.
///
/// Implementations perform the actual DNS queries and proof-chain assembly
/// against the oracle contract's trust anchors.
#[async_trait]
pub trait DnssecProver: Send + Sync {
    /// Look up the claim record and proof chain for a name
    async fn lookup(&self, name: &str, oracle: Address) -> Result<DnsProofChain, ProverError>;
}

/// Record counts produced by a signed lookup that found no claim
const RESULTS_DNS_ENTRY_MISSING: usize = 4;
const RESULTS_SUBDOMAIN_MISSING: usize = 6;

/// Classify a fetched proof chain against an optionally expected owner.
///
/// The table is total over documented shapes; a signed missing-claim chain
/// with an undocumented record count is a protocol mismatch and fails loudly.
pub fn classify_claim(
    claim: &DnsProofChain,
    expected_owner: Option<Address>,
) -> TnsResult<(ClaimState, Option<Address>)> {
    if claim.found {
        let text = claim.owner_text.as_deref().unwrap_or("").trim();
        let stripped = text.strip_prefix("0x").unwrap_or(text);
        if stripped.is_empty() || stripped.chars().all(|c| c == '0') {
            return Ok((ClaimState::Empty, None));
        }
        let owner = match text.parse::<Address>() {
            Ok(addr) => addr,
            Err(_) => return Ok((ClaimState::Invalid, None)),
        };
        // Address parsing folds case, so the comparison is case-insensitive
        match expected_owner {
            Some(expected) if expected != owner => Ok((ClaimState::OutOfSync, Some(owner))),
            _ => Ok((ClaimState::ReadyToRegister, Some(owner))),
        }
    } else if claim.signed {
        match claim.results.len() {
            RESULTS_DNS_ENTRY_MISSING => Ok((ClaimState::DnsEntryMissing, None)),
            RESULTS_SUBDOMAIN_MISSING => Ok((ClaimState::SubdomainMissing, None)),
            n => Err(TnsError::UnknownProofShape(n)),
        }
    } else {
        Ok((ClaimState::DnssecDisabled, None))
    }
}

/// Validates DNSSEC claims and assembles proof submissions
pub struct DnsClaimValidator<R: RegistryRpc, P: DnssecProver> {
    session: Session<R>,
    prover: Arc<P>,
}

impl<R: RegistryRpc, P: DnssecProver> DnsClaimValidator<R, P> {
    /// Create a validator over a session and an external prover
    pub fn new(session: Session<R>, prover: Arc<P>) -> Self {
        Self { session, prover }
    }

    /// Probe which registrar protocol versions a contract speaks.
    ///
    /// Both capability probes run concurrently; a failed probe means the
    /// contract does not support that protocol, never an error, and must not
    /// discard the other probe's answer.
    pub async fn probe_protocol(&self, registrar: Address) -> DnsProtocol {
        let rpc = self.session.rpc();
        let (old, new) = futures::join!(
            rpc.supports_interface(registrar, interface_ids::DNSSEC_CLAIM_OLD),
            rpc.supports_interface(registrar, interface_ids::DNSSEC_CLAIM_NEW),
        );
        if let Err(e) = &old {
            tracing::debug!(%registrar, error = %e, "legacy capability probe failed");
        }
        if let Err(e) = &new {
            tracing::debug!(%registrar, error = %e, "current capability probe failed");
        }
        DnsProtocol { old: old.unwrap_or(false), new: new.unwrap_or(false) }
    }

    /// Whether a contract supports DNSSEC claims at all
    pub async fn is_dns_registrar(&self, registrar: Address) -> bool {
        self.probe_protocol(registrar).await.supported()
    }

    /// Evaluate the DNSSEC claim for a name.
    ///
    /// `registrar` is the contract owning the name's parent zone;
    /// `expected_owner` is compared against the proven DNS owner when given.
    /// The proof chain is always re-fetched.
    pub async fn evaluate_claim(
        &self,
        name: &str,
        registrar: Address,
        expected_owner: Option<Address>,
    ) -> TnsResult<ClaimEvaluation> {
        let protocol = self.probe_protocol(registrar).await;
        let oracle = self.session.rpc().dns_oracle(registrar).await?;

        match self.prover.lookup(name, oracle).await {
            Ok(claim) => {
                let (state, dns_owner) = classify_claim(&claim, expected_owner)?;
                tracing::debug!(name, ?state, "classified DNSSEC claim");
                Ok(ClaimEvaluation { state, dns_owner, claim: Some(claim), protocol })
            }
            Err(e) => {
                tracing::warn!(name, error = %e, "DNSSEC lookup failed");
                Ok(ClaimEvaluation {
                    state: ClaimState::LookupError(e.to_string()),
                    dns_owner: None,
                    claim: None,
                    protocol,
                })
            }
        }
    }

    /// Assemble the registry call submitting a fetched proof.
    ///
    /// No proof material means a bare claim of the encoded name. Otherwise the
    /// payload shape follows the protocol version, and the current protocol
    /// additionally binds the reserved resolver when one is configured and the
    /// submitting caller is the proven owner.
    pub fn build_submission(
        &self,
        claim: &DnsProofChain,
        protocol: DnsProtocol,
        registrar: Address,
        resolver: Address,
        caller: Address,
    ) -> TnsResult<RegistryCall> {
        let payload = if protocol.old {
            DnsPayload::Flat(claim.payload.clone())
        } else {
            DnsPayload::Rrsets(claim.rrsets.clone())
        };
        if payload.is_empty() {
            return Ok(RegistryCall::DnsClaim {
                registrar,
                encoded_name: claim.encoded_name.clone(),
                proof: claim.proof.clone(),
            });
        }

        let dns_owner = claim
            .owner_text
            .as_deref()
            .and_then(|text| text.parse::<Address>().ok());

        // Resolver binding is only available on the current protocol
        if !protocol.old && !resolver.is_zero() && dns_owner == Some(caller) {
            Ok(RegistryCall::DnsProveAndClaimWithResolver {
                registrar,
                encoded_name: claim.encoded_name.clone(),
                payload,
                proof: claim.proof.clone(),
                resolver,
                addr: caller,
            })
        } else {
            Ok(RegistryCall::DnsProveAndClaim {
                registrar,
                encoded_name: claim.encoded_name.clone(),
                payload,
                proof: claim.proof.clone(),
            })
        }
    }

    /// Fetch the proof chain for a name and submit the on-chain claim
    pub async fn submit_proof(&self, name: &str, registrar: Address) -> TnsResult<TxHandle> {
        let evaluation = self.evaluate_claim(name, registrar, None).await?;
        let claim = match (&evaluation.state, evaluation.claim) {
            (ClaimState::LookupError(message), _) => {
                return Err(TnsError::Rpc(crate::rpc::RpcError::new(message.clone())));
            }
            (_, Some(claim)) => claim,
            (_, None) => {
                return Err(TnsError::Rpc(crate::rpc::RpcError::new(
                    "DNSSEC lookup returned no claim".to_string(),
                )));
            }
        };

        let (resolver, caller) = tokio::join!(
            self.session.reserved_resolver_address(),
            self.session.caller(),
        );
        let call =
            self.build_submission(&claim, evaluation.protocol, registrar, resolver?, caller?)?;
        tracing::info!(name, "submitting DNSSEC claim");
        Ok(self.session.rpc().submit(&call, CallOptions::default()).await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn chain(found: bool, owner: Option<&str>, signed: bool, result_count: usize) -> DnsProofChain {
        DnsProofChain {
            found,
            owner_text: owner.map(str::to_string),
            encoded_name: vec![0x05, b'a', b'l', b'i', b'c', b'e', 0x00],
            signed,
            results: (0..result_count)
                .map(|i| DnsLookupRecord { name: format!("q{i}"), record_type: "TXT".to_string() })
                .collect(),
            proof: Vec::new(),
            payload: Vec::new(),
            rrsets: Vec::new(),
        }
    }

    const OWNER: &str = "0x6c3ef94ec8ce171b3b3993520e91df9d4d06f812";
    const OTHER: &str = "0x0000000000000000000000000000000000000042";

    #[test]
    fn test_found_claim_with_zero_owner_is_empty() {
        let (state, owner) = classify_claim(&chain(true, Some("0x0"), true, 0), None).unwrap();
        assert_eq!(state, ClaimState::Empty);
        assert_eq!(owner, None);

        let all_zero = "0x0000000000000000000000000000000000000000";
        let (state, _) = classify_claim(&chain(true, Some(all_zero), true, 0), None).unwrap();
        assert_eq!(state, ClaimState::Empty);

        let (state, _) = classify_claim(&chain(true, None, true, 0), None).unwrap();
        assert_eq!(state, ClaimState::Empty);
    }

    #[test]
    fn test_found_claim_with_malformed_owner_is_invalid() {
        let (state, owner) =
            classify_claim(&chain(true, Some("not-an-address"), true, 0), None).unwrap();
        assert_eq!(state, ClaimState::Invalid);
        assert_eq!(owner, None);
    }

    #[test]
    fn test_found_claim_with_no_expectation_is_ready() {
        let (state, owner) = classify_claim(&chain(true, Some(OWNER), true, 0), None).unwrap();
        assert_eq!(state, ClaimState::ReadyToRegister);
        assert_eq!(owner, Some(OWNER.parse().unwrap()));
    }

    #[test]
    fn test_found_claim_owner_match_is_case_insensitive() {
        let mixed = "0x6C3EF94eC8CE171B3b3993520e91Df9d4D06f812";
        let (state, _) =
            classify_claim(&chain(true, Some(mixed), true, 0), Some(OWNER.parse().unwrap()))
                .unwrap();
        assert_eq!(state, ClaimState::ReadyToRegister);
    }

    #[test]
    fn test_found_claim_with_different_owner_is_out_of_sync() {
        let (state, owner) =
            classify_claim(&chain(true, Some(OWNER), true, 0), Some(OTHER.parse().unwrap()))
                .unwrap();
        assert_eq!(state, ClaimState::OutOfSync);
        assert_eq!(owner, Some(OWNER.parse().unwrap()));
    }

    #[test]
    fn test_unsigned_missing_claim_is_dnssec_disabled() {
        let (state, _) = classify_claim(&chain(false, None, false, 0), None).unwrap();
        assert_eq!(state, ClaimState::DnssecDisabled);
    }

    #[test]
    fn test_signed_missing_claim_record_counts() {
        let (state, _) = classify_claim(&chain(false, None, true, 4), None).unwrap();
        assert_eq!(state, ClaimState::DnsEntryMissing);

        let (state, _) = classify_claim(&chain(false, None, true, 6), None).unwrap();
        assert_eq!(state, ClaimState::SubdomainMissing);
    }

    #[test]
    fn test_undocumented_record_count_fails_loudly() {
        for count in [0, 1, 3, 5, 7, 12] {
            let result = classify_claim(&chain(false, None, true, count), None);
            assert!(
                matches!(result, Err(TnsError::UnknownProofShape(n)) if n == count),
                "count {count} must not classify silently"
            );
        }
    }

    #[test]
    fn test_protocol_supported() {
        assert!(DnsProtocol { old: true, new: false }.supported());
        assert!(DnsProtocol { old: false, new: true }.supported());
        assert!(!DnsProtocol { old: false, new: false }.supported());
    }
}
