//! Configuration for the TNS SDK
//!
//! Deployment-specific state lives here: the RPC endpoint, the deployed
//! contract addresses, the registry's top-level domain, and the optional
//! price oracle endpoint. Configurations load from and save to TOML files.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::{Address, TnsError, TnsResult};

/// Addresses of the deployed registry contracts
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContractAddresses {
    /// The registry itself
    pub registry: Address,
    /// Permanent registrar
    pub registrar: Address,
    /// Registrar controller
    pub controller: Address,
    /// Bulk renewal contract; zero when the network has none deployed
    pub bulk_renewal: Address,
}

impl Default for ContractAddresses {
    fn default() -> Self {
        Self {
            registry: Address::zero(),
            registrar: Address::zero(),
            controller: Address::zero(),
            bulk_renewal: Address::zero(),
        }
    }
}

/// Main SDK configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TnsConfig {
    /// Registry RPC endpoint
    pub rpc_url: String,
    /// Top-level domain served by the registrar
    pub tld: String,
    /// Price oracle endpoint; `None` disables USD quoting
    pub oracle_url: Option<String>,
    /// Remote call timeout in seconds
    pub request_timeout: u64,
    /// Deployed contract addresses
    pub contracts: ContractAddresses,
}

impl Default for TnsConfig {
    fn default() -> Self {
        Self {
            rpc_url: "http://localhost:8545".to_string(),
            tld: "tns".to_string(),
            oracle_url: None,
            request_timeout: 30,
            contracts: ContractAddresses::default(),
        }
    }
}

impl TnsConfig {
    /// Validate the configuration.
    ///
    /// Contract addresses are checked at session construction instead, so a
    /// config written before deployment still validates and round-trips.
    pub fn validate(&self) -> TnsResult<()> {
        if self.rpc_url.is_empty() {
            return Err(TnsError::Configuration("rpc_url cannot be empty".to_string()));
        }
        if self.tld.is_empty() || self.tld.contains('.') {
            return Err(TnsError::Configuration(format!(
                "tld {:?} must be a single nonempty label",
                self.tld
            )));
        }
        if self.request_timeout == 0 {
            return Err(TnsError::Configuration("request_timeout cannot be zero".to_string()));
        }
        if let Some(url) = &self.oracle_url {
            if url.is_empty() {
                return Err(TnsError::Configuration("oracle_url cannot be empty".to_string()));
            }
        }
        Ok(())
    }

    /// Load configuration from a TOML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> TnsResult<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Self =
            toml::from_str(&content).map_err(|e| TnsError::Configuration(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Save configuration to a TOML file, creating parent directories
    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> TnsResult<()> {
        let content =
            toml::to_string_pretty(self).map_err(|e| TnsError::Configuration(e.to_string()))?;
        if let Some(parent) = path.as_ref().parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, content)?;
        Ok(())
    }
}

/// Default configuration directory, `~/.tns` when a home directory exists
pub fn default_config_dir() -> PathBuf {
    if let Some(home) = dirs::home_dir() {
        home.join(".tns")
    } else {
        PathBuf::from("/etc/tns")
    }
}
