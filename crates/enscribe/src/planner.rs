//! Step planning.
//!
//! The order of the emitted steps is a hard contract: operator access is granted first, every
//! batch is created shallow first, reverse records follow the creation of their names, and the
//! operator is revoked last.

use crate::{
    abi::EnsRegistry,
    context::ExecutionContext,
    graph::Batch,
    network::{AdapterError, NetworkAdapter, NetworkRegistry, ReverseAuthority},
    probe::{Ownership, ProbeReport},
    step::{Precondition, PlannedStep, StepKind},
    wallet::ContractCall,
};
use alloy_chains::Chain;
use alloy_primitives::{Address, ChainId, U256};
use alloy_sol_types::SolCall;
use std::sync::Arc;

/// Planning failures.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum PlanError {
    #[error("network {0} is not configured")]
    UnknownNetwork(ChainId),
    #[error(transparent)]
    Adapter(#[from] AdapterError),
}

/// Turns batches and probe results into an ordered list of planned steps.
#[derive(Debug)]
pub struct StepPlanner<'a> {
    ctx: &'a ExecutionContext,
    networks: &'a NetworkRegistry,
}

impl<'a> StepPlanner<'a> {
    pub fn new(ctx: &'a ExecutionContext, networks: &'a NetworkRegistry) -> Self {
        Self { ctx, networks }
    }

    /// Plans the run. Pure: no network access happens here.
    pub fn plan(&self, batches: &[Batch], report: &ProbeReport) -> Result<Vec<PlannedStep>, PlanError> {
        let primary = self.adapter(self.ctx.primary_chain)?;
        let secondaries = self
            .ctx
            .secondary_networks()
            .into_iter()
            .map(|chain_id| self.adapter(chain_id))
            .collect::<Result<Vec<_>, _>>()?;
        let coin_types =
            secondaries.iter().map(|adapter| adapter.coin_type()).collect::<Result<Vec<U256>, _>>()?;

        let mut steps = Vec::new();

        let access = if batches.is_empty() { None } else { Some(self.operator_access(primary.as_ref(), report)?) };
        let granted = match access {
            Some(access) if !report.parent.operator_approved => {
                steps.push(access.grant(primary.chain_id()));
                true
            }
            _ => false,
        };

        for batch in batches {
            let call = primary.build_subname_call(batch, &coin_types)?;
            steps.push(PlannedStep {
                title: format!(
                    "Create {} subname{} under {}",
                    batch.entries.len(),
                    if batch.entries.len() == 1 { "" } else { "s" },
                    batch.immediate_parent
                ),
                chain_id: primary.chain_id(),
                kind: StepKind::CreateSubnames {
                    level: batch.level,
                    parent: batch.immediate_parent.clone(),
                    names: batch.entries.iter().map(|node| node.full_name.clone()).collect(),
                },
                call,
                precondition: None,
            });
        }

        if !self.ctx.options.skip_primary_naming {
            for node in batches.iter().flat_map(Batch::real_entries) {
                let Some(authority) = report.primary(node.address()).reverse_authority() else {
                    debug!(target: "enscribe::planner", name = %node.full_name, "caller cannot set primary name");
                    continue;
                };
                steps.push(self.reverse_step(primary.as_ref(), node.address(), &node.full_name, authority, None)?);
            }
        }

        for adapter in &secondaries {
            let chain_id = adapter.chain_id();
            let mut first = true;
            for node in batches.iter().flat_map(Batch::real_entries) {
                let ownership = report.secondary(chain_id, node.address());
                if ownership != Ownership::OwnedByCaller {
                    debug!(
                        target: "enscribe::planner",
                        chain_id,
                        name = %node.full_name,
                        owned = ?ownership.as_flag(),
                        "caller cannot set primary name on secondary network"
                    );
                    continue;
                }
                let note = first.then(|| format!("switch to {}", chain_name(chain_id)));
                first = false;
                steps.push(self.reverse_step(
                    adapter.as_ref(),
                    node.address(),
                    &node.full_name,
                    ReverseAuthority::Owner,
                    note,
                )?);
            }
        }

        // Access that existed before the run is left alone unless asked otherwise.
        if let Some(access) = access
            && (granted || self.ctx.options.revoke_preexisting_access)
        {
            steps.push(access.revoke(primary.chain_id()));
        }

        debug!(target: "enscribe::planner", steps = steps.len(), granted, "planned naming run");
        Ok(steps)
    }

    fn adapter(&self, chain_id: ChainId) -> Result<Arc<dyn NetworkAdapter>, PlanError> {
        self.networks.get(chain_id).cloned().ok_or(PlanError::UnknownNetwork(chain_id))
    }

    fn operator_access(
        &self,
        primary: &dyn NetworkAdapter,
        report: &ProbeReport,
    ) -> Result<OperatorAccess, PlanError> {
        let deployment = primary.deployment();
        let missing = |contract| AdapterError::MissingContract { chain_id: deployment.chain_id, contract };
        let operator = deployment.enscribe.ok_or_else(|| missing("enscribe"))?;
        let registry = if report.parent.wrapped {
            deployment.name_wrapper.ok_or_else(|| missing("name wrapper"))?
        } else {
            deployment.registry.ok_or_else(|| missing("registry"))?
        };
        Ok(OperatorAccess { registry, owner: self.ctx.caller, operator })
    }

    fn reverse_step(
        &self,
        adapter: &dyn NetworkAdapter,
        contract: Address,
        name: &str,
        authority: ReverseAuthority,
        note: Option<String>,
    ) -> Result<PlannedStep, PlanError> {
        let call = adapter.build_reverse_resolution_call(contract, self.ctx.caller, name, authority)?;
        let mut title = format!("Set primary name {name}");
        if adapter.chain_id() != self.ctx.primary_chain {
            title.push_str(&format!(" on {}", chain_name(adapter.chain_id())));
        }
        if let Some(note) = note {
            title = format!("{title} ({note})");
        }
        Ok(PlannedStep {
            title,
            chain_id: adapter.chain_id(),
            kind: StepKind::ReverseResolution { contract, name: name.to_string() },
            call,
            precondition: None,
        })
    }
}

/// Operator approval of the naming contract over the caller's names.
#[derive(Clone, Copy, Debug)]
struct OperatorAccess {
    registry: Address,
    owner: Address,
    operator: Address,
}

impl OperatorAccess {
    fn approval_call(&self, approved: bool) -> ContractCall {
        let call = EnsRegistry::setApprovalForAllCall { operator: self.operator, approved };
        ContractCall::new(self.registry, call.abi_encode())
    }

    fn grant(&self, chain_id: ChainId) -> PlannedStep {
        PlannedStep {
            title: "Grant operator access".to_string(),
            chain_id,
            kind: StepKind::GrantOperator,
            call: self.approval_call(true),
            precondition: Some(Precondition::SkipIfApproved {
                registry: self.registry,
                owner: self.owner,
                operator: self.operator,
            }),
        }
    }

    fn revoke(&self, chain_id: ChainId) -> PlannedStep {
        PlannedStep {
            title: "Revoke operator access".to_string(),
            chain_id,
            kind: StepKind::RevokeOperator,
            call: self.approval_call(false),
            precondition: Some(Precondition::SkipUnlessApproved {
                registry: self.registry,
                owner: self.owner,
                operator: self.operator,
            }),
        }
    }
}

fn chain_name(chain_id: ChainId) -> String {
    Chain::from_id(chain_id).to_string()
}
