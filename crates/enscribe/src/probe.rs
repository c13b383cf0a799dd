//! Read-only classification of contracts and of the parent name.
//!
//! Every read failure is a negative answer: a contract whose `owner()` reverts is simply not
//! ownable on that network. Nothing here is retried.

use crate::{
    abi::{EnsRegistry, NameWrapper, Ownable},
    context::ExecutionContext,
    ens::{namehash, reverse_node},
    graph::Batch,
    network::{Deployment, NetworkRegistry, ReverseAuthority},
    wallet::{ChainReader, read_call},
};
use alloy_primitives::{Address, ChainId};
use futures::future::join_all;
use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet};

/// Ownability of a contract on one network.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum Ownership {
    OwnedByCaller,
    OwnedByOther,
    #[default]
    NotOwnable,
}

impl Ownership {
    /// Tri-state view: `Some(true)` owned by the caller, `Some(false)` owned by someone else,
    /// `None` not ownable.
    pub fn as_flag(self) -> Option<bool> {
        match self {
            Self::OwnedByCaller => Some(true),
            Self::OwnedByOther => Some(false),
            Self::NotOwnable => None,
        }
    }
}

/// What the caller may do with a contract on the primary network.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
pub struct PrimaryAuthority {
    pub ownership: Ownership,
    /// The caller owns the contract's reverse node.
    pub reverse_claimer: bool,
}

impl PrimaryAuthority {
    /// How the caller can set the reverse record, if at all.
    pub fn reverse_authority(&self) -> Option<ReverseAuthority> {
        if self.ownership == Ownership::OwnedByCaller {
            Some(ReverseAuthority::Owner)
        } else if self.reverse_claimer {
            Some(ReverseAuthority::ReverseClaimer)
        } else {
            None
        }
    }
}

/// State of the root parent name on the primary network.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
pub struct ParentAuthority {
    /// The parent is held by the NameWrapper.
    pub wrapped: bool,
    /// The naming contract is already an approved operator of the caller.
    pub operator_approved: bool,
}

/// Joined results of one probe cycle.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ProbeReport {
    pub parent: ParentAuthority,
    pub primary: BTreeMap<Address, PrimaryAuthority>,
    pub secondary: BTreeMap<(ChainId, Address), Ownership>,
}

impl ProbeReport {
    /// Authority on the primary network, negative when never probed.
    pub fn primary(&self, contract: Address) -> PrimaryAuthority {
        self.primary.get(&contract).copied().unwrap_or_default()
    }

    pub fn secondary(&self, chain_id: ChainId, contract: Address) -> Ownership {
        self.secondary.get(&(chain_id, contract)).copied().unwrap_or_default()
    }
}

/// Issues the read-only queries that feed planning.
#[derive(Clone, Copy)]
pub struct OwnershipProbe<'a> {
    reader: &'a dyn ChainReader,
    caller: Address,
}

impl<'a> OwnershipProbe<'a> {
    pub fn new(reader: &'a dyn ChainReader, caller: Address) -> Self {
        Self { reader, caller }
    }

    /// Classifies `contract` on `chain_id` through its `owner()`.
    pub async fn ownership(&self, chain_id: ChainId, contract: Address) -> Ownership {
        match read_call(self.reader, chain_id, contract, Ownable::ownerCall {}).await {
            Ok(owner) if owner == self.caller => Ownership::OwnedByCaller,
            Ok(_) => Ownership::OwnedByOther,
            Err(err) => {
                trace!(target: "enscribe::probe", chain_id, %contract, %err, "not ownable");
                Ownership::NotOwnable
            }
        }
    }

    /// Probes ownership and reverse claimability on the primary network concurrently.
    pub async fn primary(&self, deployment: &Deployment, contract: Address) -> PrimaryAuthority {
        let chain_id = deployment.chain_id;
        let reverse_claimer = async {
            let Some(registry) = deployment.registry else { return false };
            let call = EnsRegistry::ownerCall { node: reverse_node(contract) };
            matches!(
                read_call(self.reader, chain_id, registry, call).await,
                Ok(owner) if owner == self.caller
            )
        };
        let (ownership, reverse_claimer) =
            futures::join!(self.ownership(chain_id, contract), reverse_claimer);
        PrimaryAuthority { ownership, reverse_claimer }
    }

    /// Probes `contract` on every network of `chains` in parallel.
    pub async fn secondaries(
        &self,
        contract: Address,
        chains: &[ChainId],
    ) -> BTreeMap<ChainId, Ownership> {
        let probes = chains.iter().map(|&chain_id| async move {
            (chain_id, self.ownership(chain_id, contract).await)
        });
        join_all(probes).await.into_iter().collect()
    }

    /// Whether `root_parent` is wrapped and whether `operator` may already act for the caller.
    pub async fn parent(
        &self,
        deployment: &Deployment,
        root_parent: &str,
        operator: Option<Address>,
    ) -> ParentAuthority {
        let chain_id = deployment.chain_id;
        let wrapped = match deployment.name_wrapper {
            Some(wrapper) => {
                let call = NameWrapper::isWrappedCall { node: namehash(root_parent) };
                read_call(self.reader, chain_id, wrapper, call).await.unwrap_or(false)
            }
            None => false,
        };

        let registry = if wrapped { deployment.name_wrapper } else { deployment.registry };
        let operator_approved = match (registry, operator) {
            (Some(registry), Some(operator)) => {
                let call = EnsRegistry::isApprovedForAllCall { owner: self.caller, operator };
                read_call(self.reader, chain_id, registry, call).await.unwrap_or(false)
            }
            _ => false,
        };

        ParentAuthority { wrapped, operator_approved }
    }

    /// Runs a full probe cycle for every real entry of `batches`.
    ///
    /// The parent, primary and secondary probes run concurrently and are joined before
    /// returning. Networks missing from `networks` are skipped and read as negative.
    pub async fn run(
        &self,
        ctx: &ExecutionContext,
        networks: &NetworkRegistry,
        batches: &[Batch],
    ) -> ProbeReport {
        let contracts = batches
            .iter()
            .flat_map(|batch| batch.real_entries().map(|node| node.address()))
            .collect::<BTreeSet<_>>();
        let secondary_chains = ctx
            .secondary_networks()
            .into_iter()
            .filter(|chain_id| networks.get(*chain_id).is_some())
            .collect::<Vec<_>>();

        let Some(primary) = networks.get(ctx.primary_chain).map(|adapter| adapter.deployment())
        else {
            warn!(target: "enscribe::probe", chain_id = ctx.primary_chain, "primary network not configured");
            return ProbeReport::default();
        };

        let parent = self.parent(primary, &ctx.root_parent, primary.enscribe);
        let primaries = join_all(contracts.iter().map(|&contract| async move {
            (contract, self.primary(primary, contract).await)
        }));
        let secondaries = join_all(contracts.iter().map(|&contract| {
            let chains = &secondary_chains;
            async move { (contract, self.secondaries(contract, chains).await) }
        }));

        let (parent, primaries, secondaries) = futures::join!(parent, primaries, secondaries);

        let report = ProbeReport {
            parent,
            primary: primaries.into_iter().collect(),
            secondary: secondaries
                .into_iter()
                .flat_map(|(contract, by_chain)| {
                    by_chain.into_iter().map(move |(chain_id, ownership)| ((chain_id, contract), ownership))
                })
                .collect(),
        };
        debug!(
            target: "enscribe::probe",
            contracts = contracts.len(),
            wrapped = report.parent.wrapped,
            operator_approved = report.parent.operator_approved,
            "probe cycle complete"
        );
        report
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::wallet::ReadError;
    use alloy_primitives::{Bytes, address};
    use alloy_sol_types::{SolCall, SolValue};
    use async_trait::async_trait;
    use std::collections::HashMap;

    const CALLER: Address = address!("0x00000000000000000000000000000000000000cc");
    const OTHER: Address = address!("0x00000000000000000000000000000000000000dd");
    const MINE: Address = address!("0x0000000000000000000000000000000000000001");
    const THEIRS: Address = address!("0x0000000000000000000000000000000000000002");
    const PLAIN: Address = address!("0x0000000000000000000000000000000000000003");

    /// Answers `owner()` from a table; everything else reverts.
    #[derive(Default)]
    struct OwnerTable(HashMap<(ChainId, Address), Address>);

    #[async_trait]
    impl ChainReader for OwnerTable {
        async fn read_contract_state(
            &self,
            chain_id: ChainId,
            to: Address,
            data: Bytes,
        ) -> Result<Bytes, ReadError> {
            let owner_call = Ownable::ownerCall {}.abi_encode();
            if data.as_ref() == owner_call.as_slice()
                && let Some(owner) = self.0.get(&(chain_id, to))
            {
                return Ok(owner.abi_encode().into());
            }
            Err(ReadError::Reverted("execution reverted".into()))
        }
    }

    #[tokio::test]
    async fn classifies_ownership() {
        let reader = OwnerTable(HashMap::from([((1, MINE), CALLER), ((1, THEIRS), OTHER)]));
        let probe = OwnershipProbe::new(&reader, CALLER);
        assert_eq!(probe.ownership(1, MINE).await, Ownership::OwnedByCaller);
        assert_eq!(probe.ownership(1, THEIRS).await, Ownership::OwnedByOther);
        assert_eq!(probe.ownership(1, PLAIN).await, Ownership::NotOwnable);
        assert_eq!(Ownership::NotOwnable.as_flag(), None);
    }

    #[tokio::test]
    async fn secondary_failures_are_negative() {
        let reader = OwnerTable(HashMap::from([((10, MINE), CALLER)]));
        let probe = OwnershipProbe::new(&reader, CALLER);
        let result = probe.secondaries(MINE, &[10, 8453]).await;
        assert_eq!(result[&10], Ownership::OwnedByCaller);
        assert_eq!(result[&8453], Ownership::NotOwnable);
    }

    #[tokio::test]
    async fn unknown_parent_is_unapproved() {
        let reader = OwnerTable::default();
        let probe = OwnershipProbe::new(&reader, CALLER);
        let deployment = Deployment::known(1).unwrap();
        let parent = probe.parent(&deployment, "x.eth", Some(OTHER)).await;
        assert_eq!(parent, ParentAuthority::default());
    }
}
