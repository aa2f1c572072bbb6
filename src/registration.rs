//! Commit-reveal registration engine
//!
//! Implements the registration and renewal lifecycle against the registrar
//! controller: price quoting with a slippage buffer, commitment construction,
//! commit submission, reveal, renewal and bulk renewal, and the ownership
//! operations. The engine never waits out the commitment maturity window
//! itself; callers schedule the reveal between the minimum and maximum
//! commitment ages it exposes.

use serde::{Deserialize, Serialize};
use sha3::{Digest, Keccak256};

use crate::namehash::label_hash;
use crate::rpc::{CallOptions, RegistryCall, RegistryRpc, TxHandle};
use crate::session::Session;
use crate::utils::{first_label, to_datetime};
use crate::{Address, Commitment, Secret, TnsError, TnsResult, Wei};

/// Headroom added on top of a recovered gas estimate
const TRANSFER_GAS_COST: u64 = 21_000;

/// Chain ids above this are treated as private or test networks
const PRIVATE_CHAIN_ID_THRESHOLD: u64 = 1_000;

/// Revert message patterns that embed a usable gas requirement
const GAS_HINT_PATTERNS: [&str; 2] = ["(supplied gas ", "(gas required exceeds allowance "];

/// Rent quote for a name: base price plus any premium currently in effect
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RentQuote {
    /// Price for the requested duration
    pub price: Wei,
    /// Decaying premium on a recently reclaimed name, zero otherwise
    pub premium: Wei,
}

/// Add a 10% buffer to absorb price fluctuation between quote and execution.
/// Any unused value is refunded by the controller contract.
pub fn buffered_price(price: Wei) -> Wei {
    price.saturating_mul(110) / 100
}

/// Compute a registration commitment from its inputs.
///
/// Pure and byte-for-byte reproducible: Keccak-256 over the packed label
/// hash, owner, optional resolver configuration (resolver address followed by
/// the address to set as the resolved address), and secret. The same layout
/// is hashed by the controller contract when checking the reveal.
pub fn commitment_digest(
    label_hash: crate::LabelHash,
    owner: Address,
    config: Option<(Address, Address)>,
    secret: &Secret,
) -> Commitment {
    let mut hasher = Keccak256::new();
    hasher.update(label_hash.as_bytes());
    hasher.update(owner.as_bytes());
    if let Some((resolver, addr)) = config {
        hasher.update(resolver.as_bytes());
        hasher.update(addr.as_bytes());
    }
    hasher.update(secret.as_bytes());
    Commitment::from_bytes(hasher.finalize().into())
}

/// Recover a gas requirement embedded in a revert message.
///
/// Matches exactly `(supplied gas N)` and `(gas required exceeds allowance
/// N)`; anything else is "no hint" and must not be guessed at.
pub fn parse_gas_hint(message: &str) -> Option<u64> {
    for pattern in GAS_HINT_PATTERNS {
        if let Some(start) = message.find(pattern) {
            let rest = &message[start + pattern.len()..];
            if let Some(end) = rest.find(')') {
                if let Ok(gas) = rest[..end].trim().parse::<u64>() {
                    return Some(gas);
                }
            }
        }
    }
    None
}

/// Commit-reveal registration engine over the registrar controller
pub struct RegistrationEngine<R: RegistryRpc> {
    session: Session<R>,
}

impl<R: RegistryRpc> RegistrationEngine<R> {
    /// Create an engine over a session
    pub fn new(session: Session<R>) -> Self {
        Self { session }
    }

    /// Rent price for a label over a duration in seconds
    pub async fn rent_price(&self, label: &str, duration: u64) -> TnsResult<Wei> {
        Ok(self.session.rpc().rent_price(label, duration).await?)
    }

    /// Rent price plus any premium currently in effect. The premium is the
    /// zero-duration quote, fetched concurrently with the base price.
    pub async fn rent_price_with_premium(&self, label: &str, duration: u64) -> TnsResult<RentQuote> {
        let rpc = self.session.rpc();
        let (price, premium) =
            tokio::join!(rpc.rent_price(label, duration), rpc.rent_price(label, 0));
        Ok(RentQuote { price: price?, premium: premium? })
    }

    /// Aggregate rent price over several labels. Rejects an empty label list
    /// before contacting the registry; there is no meaningful empty sum here.
    pub async fn rent_prices(&self, labels: &[String], duration: u64) -> TnsResult<Wei> {
        if labels.is_empty() {
            return Err(TnsError::EmptyLabelList);
        }
        let rpc = self.session.rpc();
        let prices = futures::future::try_join_all(
            labels.iter().map(|label| rpc.rent_price(label, duration)),
        )
        .await?;
        Ok(prices.into_iter().fold(0, Wei::saturating_add))
    }

    /// Minimum commitment age before a reveal is accepted, in seconds
    pub async fn min_commitment_age(&self) -> TnsResult<u64> {
        Ok(self.session.rpc().min_commitment_age().await?)
    }

    /// Maximum commitment age before a commitment expires, in seconds
    pub async fn max_commitment_age(&self) -> TnsResult<u64> {
        Ok(self.session.rpc().max_commitment_age().await?)
    }

    /// Resolver configuration applied to commitments and reveals: the
    /// reserved resolver bound to the future registrant, or `None` when the
    /// naming system has no resolver configured. Commit and register must
    /// agree on this selection or the reveal will not match the commitment.
    async fn resolver_config(&self, owner: Address) -> TnsResult<Option<(Address, Address)>> {
        let resolver = self.session.reserved_resolver_address().await?;
        if resolver.is_zero() {
            Ok(None)
        } else {
            Ok(Some((resolver, owner)))
        }
    }

    /// Build the commitment for registering a label to an owner
    pub async fn make_commitment(
        &self,
        label: &str,
        owner: Address,
        secret: &Secret,
    ) -> TnsResult<Commitment> {
        let hash = label_hash(label)?;
        let config = self.resolver_config(owner).await?;
        Ok(commitment_digest(hash, owner, config, secret))
    }

    /// Submit a commitment for the session caller
    pub async fn commit(&self, label: &str, secret: &Secret) -> TnsResult<TxHandle> {
        let owner = self.session.caller().await?;
        let commitment = self.make_commitment(label, owner, secret).await?;
        tracing::info!(label, %commitment, "submitting registration commitment");
        Ok(self
            .session
            .rpc()
            .submit(&RegistryCall::Commit { commitment }, CallOptions::default())
            .await?)
    }

    /// Timestamp the caller's commitment was recorded at; 0 while no matching
    /// commitment is known to the registry
    pub async fn check_commitment(&self, label: &str, secret: &Secret) -> TnsResult<u64> {
        let owner = self.session.caller().await?;
        let commitment = self.make_commitment(label, owner, secret).await?;
        Ok(self.session.rpc().commitment_timestamp(commitment).await?)
    }

    /// Reveal a registration for the session caller.
    ///
    /// Pays the buffered rent price and applies the same resolver-config
    /// selection as [`RegistrationEngine::commit`]. The commitment must have
    /// matured past the minimum age and not passed the maximum.
    pub async fn register(&self, label: &str, duration: u64, secret: &Secret) -> TnsResult<TxHandle> {
        let owner = self.session.caller().await?;
        let price = self.rent_price(label, duration).await?;
        let value = buffered_price(price);
        let call = match self.resolver_config(owner).await? {
            None => RegistryCall::Register {
                label: label.to_string(),
                owner,
                duration,
                secret: *secret,
            },
            Some((resolver, addr)) => RegistryCall::RegisterWithConfig {
                label: label.to_string(),
                owner,
                duration,
                secret: *secret,
                resolver,
                addr,
            },
        };
        let gas_limit = self.estimate_gas_limit(&call, Some(value)).await;
        tracing::info!(label, duration, value, ?gas_limit, "submitting registration");
        Ok(self
            .session
            .rpc()
            .submit(&call, CallOptions { value: Some(value), gas_limit })
            .await?)
    }

    /// Renew a registration, paying the buffered rent price
    pub async fn renew(&self, label: &str, duration: u64) -> TnsResult<TxHandle> {
        let price = self.rent_price(label, duration).await?;
        let value = buffered_price(price);
        let call = RegistryCall::Renew { label: label.to_string(), duration };
        let gas_limit = self.estimate_gas_limit(&call, Some(value)).await;
        tracing::info!(label, duration, value, ?gas_limit, "submitting renewal");
        Ok(self
            .session
            .rpc()
            .submit(&call, CallOptions { value: Some(value), gas_limit })
            .await?)
    }

    /// Renew several names in one call. Per-label prices are summed and the
    /// 10% buffer applied once to the aggregate.
    pub async fn renew_all(&self, labels: &[String], duration: u64) -> TnsResult<TxHandle> {
        let total = self.rent_prices(labels, duration).await?;
        let value = buffered_price(total);
        let call = RegistryCall::RenewAll { labels: labels.to_vec(), duration };
        let gas_limit = self.estimate_gas_limit(&call, Some(value)).await;
        tracing::info!(count = labels.len(), duration, value, ?gas_limit, "submitting bulk renewal");
        Ok(self
            .session
            .rpc()
            .submit(&call, CallOptions { value: Some(value), gas_limit })
            .await?)
    }

    /// Gas limit for a state-changing call.
    ///
    /// Simulates the call and pads the estimate with a fixed transfer
    /// surcharge. When simulation reverts with a message embedding a required
    /// gas hint, the hint is recovered and padded instead. With no usable
    /// number the call proceeds without an explicit limit, delegating
    /// estimation to the execution layer; gas mis-estimation is a soft
    /// failure, never a reason to abort the operation.
    pub async fn estimate_gas_limit(&self, call: &RegistryCall, value: Option<Wei>) -> Option<u64> {
        match self.session.rpc().estimate_gas(call, value).await {
            Ok(gas) => Some(gas + TRANSFER_GAS_COST),
            Err(e) => match parse_gas_hint(&e.message) {
                Some(gas) => {
                    tracing::debug!(gas, error = %e, "recovered gas estimate from revert message");
                    Some(gas + TRANSFER_GAS_COST)
                }
                None => {
                    tracing::warn!(error = %e, "gas estimation failed, deferring to execution layer");
                    None
                }
            },
        }
    }

    /// Explicit gas limit for ownership operations: private and test networks
    /// under-estimate, so the simulated estimate is doubled there; public
    /// networks set no limit.
    async fn ownership_gas_limit(&self, call: &RegistryCall) -> TnsResult<Option<u64>> {
        let chain_id = self.session.chain_id().await?;
        if chain_id <= PRIVATE_CHAIN_ID_THRESHOLD {
            return Ok(None);
        }
        let gas = self.session.rpc().estimate_gas(call, None).await?;
        Ok(Some(gas.saturating_mul(2)))
    }

    /// Transfer registration ownership of a name to another address
    pub async fn transfer_owner(&self, name: &str, to: Address) -> TnsResult<TxHandle> {
        let hash = label_hash(first_label(name)?)?;
        let from = self.session.caller().await?;
        let call = RegistryCall::TransferOwner { from, to, label_hash: hash };
        let gas_limit = self.ownership_gas_limit(&call).await?;
        tracing::info!(name, %to, ?gas_limit, "transferring registration ownership");
        Ok(self
            .session
            .rpc()
            .submit(&call, CallOptions { value: None, gas_limit })
            .await?)
    }

    /// Reset the registry record of an owned name to a new address
    pub async fn reclaim(&self, name: &str, addr: Address) -> TnsResult<TxHandle> {
        let hash = label_hash(first_label(name)?)?;
        let call = RegistryCall::Reclaim { label_hash: hash, addr };
        let gas_limit = self.ownership_gas_limit(&call).await?;
        tracing::info!(name, %addr, ?gas_limit, "reclaiming registry record");
        Ok(self
            .session
            .rpc()
            .submit(&call, CallOptions { value: None, gas_limit })
            .await?)
    }

    /// Pricing curve name advertised under the TLD's `oracle` text record;
    /// falls back to linear pricing when the record is unset or unreadable
    pub async fn price_curve(&self) -> String {
        match self.session.text_record(self.session.tld(), "oracle").await {
            Ok(curve) if !curve.is_empty() => curve,
            _ => "linear".to_string(),
        }
    }

    /// Register a label on the throwaway test registrar owning the `test` TLD
    pub async fn register_test_domain(&self, label: &str) -> TnsResult<TxHandle> {
        let hash = label_hash(label)?;
        let owner = self.session.caller().await?;
        let registrar = self.test_registrar().await?;
        let call = RegistryCall::RegisterTest { registrar, label_hash: hash, owner };
        Ok(self.session.rpc().submit(&call, CallOptions::default()).await?)
    }

    /// Expiry of a test-registrar registration, if any
    pub async fn test_domain_expiry(
        &self,
        label: &str,
    ) -> TnsResult<Option<chrono::DateTime<chrono::Utc>>> {
        let hash = label_hash(label)?;
        let registrar = self.test_registrar().await?;
        let expiry = self.session.rpc().test_registrar_expiry(registrar, hash).await?;
        Ok((expiry > 0).then(|| to_datetime(expiry)))
    }

    async fn test_registrar(&self) -> TnsResult<Address> {
        let node = crate::namehash::namehash("test")?;
        let registrar = self.session.rpc().node_owner(node).await?;
        if registrar.is_zero() {
            return Err(TnsError::Configuration(
                "no test registrar deployed on this network".to_string(),
            ));
        }
        Ok(registrar)
    }
}
