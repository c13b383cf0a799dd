//! Per network family call builders.
//!
//! Every network the tool can touch is described by a [`Deployment`]; the [`NetworkFamily`] of
//! its chain id decides which call shapes are used for it.

use crate::{
    abi::{Enscribe, L2ReverseRegistrar, PublicResolver, ReverseRegistrar},
    ens::{coin_type, namehash, reverse_node},
    graph::Batch,
    wallet::ContractCall,
};
use alloy_chains::{Chain, NamedChain};
use alloy_primitives::{Address, ChainId, U256, address};
use alloy_sol_types::SolCall;
use serde::{Deserialize, Serialize};
use std::{collections::BTreeMap, fmt, sync::Arc};

/// Contract addresses of one network.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Deployment {
    pub chain_id: ChainId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rpc_url: Option<String>,
    /// Naming contract that creates subnames in batches.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub enscribe: Option<Address>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub registry: Option<Address>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name_wrapper: Option<Address>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub public_resolver: Option<Address>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reverse_registrar: Option<Address>,
}

const ENS_REGISTRY: Address = address!("0x00000000000C2E074eC69A0dFb2997BA6C7d2e1e");

impl Deployment {
    /// Returns the known ENS deployment of `chain_id`, if any.
    pub fn known(chain_id: ChainId) -> Option<Self> {
        let deployment = match chain_id {
            1 => Self {
                chain_id,
                registry: Some(ENS_REGISTRY),
                name_wrapper: Some(address!("0xD4416b13d2b3a9aBae7AcD5D6C2BbDBE25686401")),
                public_resolver: Some(address!("0x231b0Ee14048e9dCcD1d247744d114a4EB5E8E63")),
                reverse_registrar: Some(address!("0xa58E81fe9b61B5c3fE2AFD33CF304c454AbFc7Cb")),
                ..Default::default()
            },
            11155111 => Self {
                chain_id,
                registry: Some(ENS_REGISTRY),
                name_wrapper: Some(address!("0x0635513f179D50A207757E05759CbD106d7dFcE8")),
                public_resolver: Some(address!("0x8948458626811dd0c23EB25Cc74291247077cC51")),
                reverse_registrar: Some(address!("0xCF75B92126B02C9811d8c632144288a3eb84afC8")),
                ..Default::default()
            },
            _ => return None,
        };
        Some(deployment)
    }

    /// Overlays the fields set in `other` onto `self`.
    pub fn merge(mut self, other: &Self) -> Self {
        macro_rules! overlay {
            ($($field:ident),*) => {$(
                if other.$field.is_some() {
                    self.$field = other.$field.clone();
                }
            )*};
        }
        overlay!(rpc_url, enscribe, registry, name_wrapper, public_resolver, reverse_registrar);
        self
    }

    fn require(&self, contract: Option<Address>, name: &'static str) -> Result<Address, AdapterError> {
        contract.ok_or(AdapterError::MissingContract { chain_id: self.chain_id, contract: name })
    }
}

/// Groups of networks sharing call shapes.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum NetworkFamily {
    /// Ethereum mainnet, its testnets, and unknown (local) chains.
    Ethereum,
    /// Base and Base Sepolia, whose reverse registrar keeps the L1 call shape.
    Base,
    /// Other rollups with an ENSIP-19 `L2ReverseRegistrar`.
    Rollup,
}

impl NetworkFamily {
    pub fn of(chain_id: ChainId) -> Self {
        match Chain::from_id(chain_id).named() {
            Some(NamedChain::Base | NamedChain::BaseSepolia) => Self::Base,
            Some(
                NamedChain::Optimism
                | NamedChain::OptimismSepolia
                | NamedChain::Arbitrum
                | NamedChain::ArbitrumSepolia
                | NamedChain::Scroll
                | NamedChain::ScrollSepolia
                | NamedChain::Linea
                | NamedChain::LineaSepolia,
            ) => Self::Rollup,
            _ => Self::Ethereum,
        }
    }
}

/// How the caller is allowed to set a contract's reverse record.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ReverseAuthority {
    /// The contract is `Ownable` and owned by the caller.
    Owner,
    /// The contract assigned its reverse node to the caller (`ReverseClaimable`).
    ReverseClaimer,
}

/// A call could not be built for a network.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum AdapterError {
    #[error("no `{contract}` contract configured for chain {chain_id}")]
    MissingContract { chain_id: ChainId, contract: &'static str },
    #[error("{operation} is not supported on chain {chain_id}")]
    Unsupported { chain_id: ChainId, operation: &'static str },
    #[error("chain {0} has no ENSIP-11 coin type")]
    NoCoinType(ChainId),
}

/// Builds the calls of one network family.
pub trait NetworkAdapter: Send + Sync + fmt::Debug {
    fn deployment(&self) -> &Deployment;

    fn chain_id(&self) -> ChainId {
        self.deployment().chain_id
    }

    /// ENSIP-11 coin type under which this network's addresses are stored.
    fn coin_type(&self) -> Result<U256, AdapterError> {
        coin_type(self.chain_id()).ok_or(AdapterError::NoCoinType(self.chain_id()))
    }

    /// One call creating every entry of `batch` under its immediate parent, with forward
    /// records for the primary network and every coin type in `coin_types`.
    fn build_subname_call(
        &self,
        batch: &Batch,
        coin_types: &[U256],
    ) -> Result<ContractCall, AdapterError>;

    /// Sets the address record of `name` for this network's coin type.
    fn build_forward_resolution_call(
        &self,
        name: &str,
        addr: Address,
    ) -> Result<ContractCall, AdapterError> {
        let resolver = self.deployment().require(self.deployment().public_resolver, "public resolver")?;
        let call = PublicResolver::setAddrCall {
            node: namehash(name),
            coinType: self.coin_type()?,
            a: addr.to_vec().into(),
        };
        Ok(ContractCall::new(resolver, call.abi_encode()))
    }

    /// Points the reverse record of `contract` at `name`.
    fn build_reverse_resolution_call(
        &self,
        contract: Address,
        caller: Address,
        name: &str,
        authority: ReverseAuthority,
    ) -> Result<ContractCall, AdapterError>;
}

/// `setNameBatch` on the naming contract of `deployment`.
fn enscribe_batch_call(
    deployment: &Deployment,
    batch: &Batch,
    coin_types: &[U256],
) -> Result<ContractCall, AdapterError> {
    let enscribe = deployment.require(deployment.enscribe, "enscribe")?;
    let (addresses, labels): (Vec<_>, Vec<_>) =
        batch.entries.iter().map(|node| (node.address(), node.label().to_string())).unzip();
    let call = Enscribe::setNameBatchCall {
        contractAddresses: addresses,
        labels,
        parentName: batch.immediate_parent.clone(),
        parentNode: namehash(&batch.immediate_parent),
        coinTypes: coin_types.to_vec(),
    };
    Ok(ContractCall::new(enscribe, call.abi_encode()))
}

/// Ethereum L1 (and unknown chains).
#[derive(Clone, Debug)]
pub struct L1Adapter {
    deployment: Deployment,
}

impl NetworkAdapter for L1Adapter {
    fn deployment(&self) -> &Deployment {
        &self.deployment
    }

    fn build_subname_call(
        &self,
        batch: &Batch,
        coin_types: &[U256],
    ) -> Result<ContractCall, AdapterError> {
        enscribe_batch_call(&self.deployment, batch, coin_types)
    }

    fn build_reverse_resolution_call(
        &self,
        contract: Address,
        caller: Address,
        name: &str,
        authority: ReverseAuthority,
    ) -> Result<ContractCall, AdapterError> {
        let resolver = self.deployment.require(self.deployment.public_resolver, "public resolver")?;
        match authority {
            ReverseAuthority::Owner => {
                let registrar =
                    self.deployment.require(self.deployment.reverse_registrar, "reverse registrar")?;
                let call = ReverseRegistrar::setNameForAddrCall {
                    addr: contract,
                    owner: caller,
                    resolver,
                    name: name.to_string(),
                };
                Ok(ContractCall::new(registrar, call.abi_encode()))
            }
            ReverseAuthority::ReverseClaimer => {
                let call = PublicResolver::setNameCall {
                    node: reverse_node(contract),
                    newName: name.to_string(),
                };
                Ok(ContractCall::new(resolver, call.abi_encode()))
            }
        }
    }
}

/// Base and Base Sepolia.
#[derive(Clone, Debug)]
pub struct BaseAdapter {
    deployment: Deployment,
}

impl NetworkAdapter for BaseAdapter {
    fn deployment(&self) -> &Deployment {
        &self.deployment
    }

    fn build_subname_call(
        &self,
        batch: &Batch,
        coin_types: &[U256],
    ) -> Result<ContractCall, AdapterError> {
        enscribe_batch_call(&self.deployment, batch, coin_types)
    }

    fn build_reverse_resolution_call(
        &self,
        contract: Address,
        caller: Address,
        name: &str,
        _authority: ReverseAuthority,
    ) -> Result<ContractCall, AdapterError> {
        let registrar =
            self.deployment.require(self.deployment.reverse_registrar, "reverse registrar")?;
        let resolver = self.deployment.require(self.deployment.public_resolver, "public resolver")?;
        let call = ReverseRegistrar::setNameForAddrCall {
            addr: contract,
            owner: caller,
            resolver,
            name: name.to_string(),
        };
        Ok(ContractCall::new(registrar, call.abi_encode()))
    }
}

/// Rollups using the ENSIP-19 `L2ReverseRegistrar`.
#[derive(Clone, Debug)]
pub struct RollupAdapter {
    deployment: Deployment,
}

impl NetworkAdapter for RollupAdapter {
    fn deployment(&self) -> &Deployment {
        &self.deployment
    }

    fn build_subname_call(&self, _: &Batch, _: &[U256]) -> Result<ContractCall, AdapterError> {
        Err(AdapterError::Unsupported { chain_id: self.chain_id(), operation: "subname creation" })
    }

    fn build_reverse_resolution_call(
        &self,
        contract: Address,
        _caller: Address,
        name: &str,
        _authority: ReverseAuthority,
    ) -> Result<ContractCall, AdapterError> {
        let registrar =
            self.deployment.require(self.deployment.reverse_registrar, "reverse registrar")?;
        let call =
            L2ReverseRegistrar::setNameForAddrCall { addr: contract, name: name.to_string() };
        Ok(ContractCall::new(registrar, call.abi_encode()))
    }
}

/// Creates the adapter matching the family of `deployment`'s chain.
pub fn adapter_for(deployment: Deployment) -> Arc<dyn NetworkAdapter> {
    match NetworkFamily::of(deployment.chain_id) {
        NetworkFamily::Ethereum => Arc::new(L1Adapter { deployment }),
        NetworkFamily::Base => Arc::new(BaseAdapter { deployment }),
        NetworkFamily::Rollup => Arc::new(RollupAdapter { deployment }),
    }
}

/// Adapters keyed by chain id.
#[derive(Clone, Debug, Default)]
pub struct NetworkRegistry {
    adapters: BTreeMap<ChainId, Arc<dyn NetworkAdapter>>,
}

impl NetworkRegistry {
    /// Builds a registry from deployments, filling unset fields from [`Deployment::known`].
    pub fn new(deployments: impl IntoIterator<Item = Deployment>) -> Self {
        let adapters = deployments
            .into_iter()
            .map(|deployment| {
                let deployment = match Deployment::known(deployment.chain_id) {
                    Some(known) => known.merge(&deployment),
                    None => deployment,
                };
                (deployment.chain_id, adapter_for(deployment))
            })
            .collect();
        Self { adapters }
    }

    pub fn get(&self, chain_id: ChainId) -> Option<&Arc<dyn NetworkAdapter>> {
        self.adapters.get(&chain_id)
    }

    pub fn chain_ids(&self) -> impl Iterator<Item = ChainId> + '_ {
        self.adapters.keys().copied()
    }
}
