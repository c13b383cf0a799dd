use alloy_primitives::{Address, ChainId};
use serde::{Deserialize, Serialize};

/// How the signer treats submitted calls.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SignerMode {
    /// Every transaction is confirmed individually.
    #[default]
    Direct,
    /// Calls are queued into a multi-sig batch and executed later, outside of the run.
    Batched,
}

/// User chosen options of a naming run.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NamingOptions {
    /// Do not set primary names on the primary network.
    #[serde(default)]
    pub skip_primary_naming: bool,
    /// Additional networks to set forward and reverse records on, in order.
    #[serde(default)]
    pub secondary_networks: Vec<ChainId>,
    /// Revoke operator access at the end even when it was granted before the run.
    #[serde(default)]
    pub revoke_preexisting_access: bool,
}

/// Immutable inputs shared by graph building and planning.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExecutionContext {
    /// Account that signs every step.
    pub caller: Address,
    pub primary_chain: ChainId,
    pub root_parent: String,
    #[serde(default)]
    pub options: NamingOptions,
    #[serde(default)]
    pub signer_mode: SignerMode,
}

impl ExecutionContext {
    pub fn new(caller: Address, primary_chain: ChainId, root_parent: impl Into<String>) -> Self {
        Self {
            caller,
            primary_chain,
            root_parent: root_parent.into().trim().to_ascii_lowercase(),
            options: NamingOptions::default(),
            signer_mode: SignerMode::default(),
        }
    }

    pub fn with_options(mut self, options: NamingOptions) -> Self {
        self.options = options;
        self
    }

    pub fn with_signer_mode(mut self, signer_mode: SignerMode) -> Self {
        self.signer_mode = signer_mode;
        self
    }

    /// Secondary networks without duplicates or the primary network, in selection order.
    pub fn secondary_networks(&self) -> Vec<ChainId> {
        let mut chains = Vec::with_capacity(self.options.secondary_networks.len());
        for &chain_id in &self.options.secondary_networks {
            if chain_id != self.primary_chain && !chains.contains(&chain_id) {
                chains.push(chain_id);
            }
        }
        chains
    }
}
