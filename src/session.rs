//! Shared session context
//!
//! A [`Session`] bundles the RPC handle with the deployed contract addresses
//! and the registry's top-level domain. Every component takes one at
//! construction, so there is no process-wide provider or signer state.

use std::sync::Arc;

use crate::config::{ContractAddresses, TnsConfig};
use crate::namehash::namehash;
use crate::rpc::RegistryRpc;
use crate::{Address, TnsError, TnsResult};

/// Explicit context object passed into every component constructor
pub struct Session<R: RegistryRpc> {
    rpc: Arc<R>,
    contracts: ContractAddresses,
    tld: String,
}

impl<R: RegistryRpc> Clone for Session<R> {
    fn clone(&self) -> Self {
        Self {
            rpc: Arc::clone(&self.rpc),
            contracts: self.contracts.clone(),
            tld: self.tld.clone(),
        }
    }
}

impl<R: RegistryRpc> Session<R> {
    /// Create a session over an RPC handle.
    ///
    /// The registry, registrar, and controller addresses must be set; the bulk
    /// renewal contract is optional and may be zero on networks without one.
    pub fn new(rpc: Arc<R>, contracts: ContractAddresses, tld: impl Into<String>) -> TnsResult<Self> {
        let tld = tld.into();
        if tld.is_empty() || tld.contains('.') {
            return Err(TnsError::Configuration(format!(
                "top-level domain {tld:?} must be a single nonempty label"
            )));
        }
        if contracts.registry.is_zero() {
            return Err(TnsError::Configuration("registry address is not set".to_string()));
        }
        if contracts.registrar.is_zero() {
            return Err(TnsError::Configuration("registrar address is not set".to_string()));
        }
        if contracts.controller.is_zero() {
            return Err(TnsError::Configuration("controller address is not set".to_string()));
        }
        Ok(Self { rpc, contracts, tld })
    }

    /// Create a session from a validated configuration
    pub fn from_config(rpc: Arc<R>, config: &TnsConfig) -> TnsResult<Self> {
        config.validate()?;
        Self::new(rpc, config.contracts.clone(), config.tld.clone())
    }

    /// The underlying RPC handle
    pub fn rpc(&self) -> &R {
        &self.rpc
    }

    /// Deployed contract addresses
    pub fn contracts(&self) -> &ContractAddresses {
        &self.contracts
    }

    /// The registry's top-level domain label
    pub fn tld(&self) -> &str {
        &self.tld
    }

    /// Network chain id
    pub async fn chain_id(&self) -> TnsResult<u64> {
        Ok(self.rpc.chain_id().await?)
    }

    /// Address submitting calls through this session
    pub async fn caller(&self) -> TnsResult<Address> {
        Ok(self.rpc.caller().await?)
    }

    /// Whether the registry holds a record for a name
    pub async fn record_exists(&self, name: &str) -> TnsResult<bool> {
        let node = namehash(name)?;
        Ok(self.rpc.record_exists(node).await?)
    }

    /// Resolve a name to its `addr` record. Returns the zero address when no
    /// resolver is configured for the node.
    pub async fn resolved_address(&self, name: &str) -> TnsResult<Address> {
        let node = namehash(name)?;
        let resolver = self.rpc.resolver(node).await?;
        if resolver.is_zero() {
            return Ok(Address::zero());
        }
        Ok(self.rpc.resolve_addr(resolver, node).await?)
    }

    /// Resolve a text record of a name. Fails if no resolver is configured.
    pub async fn text_record(&self, name: &str, key: &str) -> TnsResult<String> {
        let node = namehash(name)?;
        let resolver = self.rpc.resolver(node).await?;
        if resolver.is_zero() {
            return Err(TnsError::Configuration(format!("no resolver configured for {name}")));
        }
        Ok(self.rpc.text(resolver, node, key).await?)
    }

    /// Address of the default resolver registered under `resolver.<tld>`.
    /// Zero when the naming system has no resolver configured; commitment
    /// scheme selection and DNS claim submission branch on this.
    pub async fn reserved_resolver_address(&self) -> TnsResult<Address> {
        self.resolved_address(&format!("resolver.{}", self.tld)).await
    }
}
