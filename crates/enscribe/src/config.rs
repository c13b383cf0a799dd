//! Layered configuration.
//!
//! Values are resolved in this order, later layers winning: built-in defaults, `enscribe.toml`
//! (or the file named by `ENSCRIBE_CONFIG`), `ENSCRIBE_*` environment variables, and finally
//! whatever provider the caller merges on top (the CLI arguments).

use crate::{
    network::{Deployment, NetworkRegistry},
    switch::{ChainSwitcher, DEFAULT_MAX_ATTEMPTS, DEFAULT_POLL_INTERVAL},
};
use alloy_primitives::ChainId;
use figment::{
    Figment, Metadata, Profile, Provider,
    providers::{Env, Format, Serialized, Toml},
    value::{Dict, Map},
};
use serde::{Deserialize, Serialize};
use std::{path::PathBuf, time::Duration};

/// Default config file name, looked up in the working directory.
pub const CONFIG_FILE: &str = "enscribe.toml";

/// Environment variable overriding the config file path.
pub const CONFIG_PATH_ENV: &str = "ENSCRIBE_CONFIG";

/// Prefix of the environment variables read into the config.
pub const ENV_PREFIX: &str = "ENSCRIBE_";

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to extract enscribe config: {0}")]
    Extract(#[from] figment::Error),
    #[error("primary chain {0} has no network entry and no known deployment")]
    UnknownPrimaryChain(ChainId),
}

/// Settings of the naming tool.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct NamingConfig {
    /// Network the names live on.
    pub primary_chain: ChainId,
    /// Per network RPC endpoints and contract addresses. Known ENS addresses are filled in.
    pub networks: Vec<Deployment>,
    pub switch_poll_interval_ms: u64,
    pub switch_max_attempts: u32,
    /// How long to wait for a receipt before failing the step.
    pub confirmation_timeout_secs: u64,
    /// Revoke operator access at the end of a run even when it was granted before.
    pub revoke_preexisting_access: bool,
}

impl Default for NamingConfig {
    fn default() -> Self {
        Self {
            primary_chain: 11155111,
            networks: Vec::new(),
            switch_poll_interval_ms: DEFAULT_POLL_INTERVAL.as_millis() as u64,
            switch_max_attempts: DEFAULT_MAX_ATTEMPTS,
            confirmation_timeout_secs: 120,
            revoke_preexisting_access: false,
        }
    }
}

impl NamingConfig {
    /// Returns the default figment: defaults, config file and environment.
    pub fn figment() -> Figment {
        let path = std::env::var_os(CONFIG_PATH_ENV)
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from(CONFIG_FILE));
        Figment::from(Self::default())
            .merge(Toml::file(path))
            .merge(Env::prefixed(ENV_PREFIX).ignore(&["config", "private_key"]))
    }

    /// Loads the config from the default figment.
    pub fn load() -> Result<Self, ConfigError> {
        Self::from_provider(Self::figment())
    }

    /// Extracts a config from `provider`.
    pub fn from_provider<T: Provider>(provider: T) -> Result<Self, ConfigError> {
        trace!(target: "enscribe::config", "load config with provider: {:?}", provider.metadata());
        Ok(Figment::from(provider).extract()?)
    }

    pub fn switcher(&self) -> ChainSwitcher {
        ChainSwitcher::new(
            Duration::from_millis(self.switch_poll_interval_ms),
            self.switch_max_attempts,
        )
    }

    /// Sets the RPC endpoint of `chain_id`, adding a network entry when there is none.
    pub fn set_rpc_url(&mut self, chain_id: ChainId, rpc_url: impl Into<String>) {
        let rpc_url = Some(rpc_url.into());
        match self.networks.iter_mut().find(|d| d.chain_id == chain_id) {
            Some(deployment) => deployment.rpc_url = rpc_url,
            None => self.networks.push(Deployment { chain_id, rpc_url, ..Default::default() }),
        }
    }

    pub fn confirmation_timeout(&self) -> Duration {
        Duration::from_secs(self.confirmation_timeout_secs)
    }

    /// Configured deployments, with an entry for the primary chain added when it is known.
    pub fn deployments(&self) -> Result<Vec<Deployment>, ConfigError> {
        let mut deployments = self.networks.clone();
        if !deployments.iter().any(|d| d.chain_id == self.primary_chain) {
            let known = Deployment::known(self.primary_chain)
                .ok_or(ConfigError::UnknownPrimaryChain(self.primary_chain))?;
            deployments.push(known);
        }
        Ok(deployments)
    }

    pub fn registry(&self) -> Result<NetworkRegistry, ConfigError> {
        Ok(NetworkRegistry::new(self.deployments()?))
    }
}

impl Provider for NamingConfig {
    fn metadata(&self) -> Metadata {
        Metadata::named("Enscribe Config")
    }

    fn data(&self) -> Result<Map<Profile, Dict>, figment::Error> {
        Serialized::defaults(self).data()
    }
}
