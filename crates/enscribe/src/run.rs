//! Preparation of a naming run: validate, build, probe, plan.

use crate::{
    context::ExecutionContext,
    executor::StepExecutor,
    graph::{self, Batch, GraphError},
    network::NetworkRegistry,
    planner::{PlanError, StepPlanner},
    probe::{OwnershipProbe, ProbeReport},
    request::{NamingRequest, ValidationError, validate_requests},
    safe::SafeBatch,
    step::PlannedStep,
    switch::ChainSwitcher,
    wallet::{ChainReader, Wallet},
};
use alloy_primitives::{Address, ChainId};
use std::{collections::BTreeMap, sync::Arc};

#[derive(Debug, thiserror::Error)]
pub enum PrepareError {
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error(transparent)]
    Graph(#[from] GraphError),
    #[error(transparent)]
    Plan(#[from] PlanError),
}

/// Everything known about a run before its first step.
#[derive(Clone, Debug)]
pub struct NamingPlan {
    pub ctx: ExecutionContext,
    pub batches: Vec<Batch>,
    pub report: ProbeReport,
    pub steps: Vec<PlannedStep>,
}

impl NamingPlan {
    /// Validates `requests`, builds the name graph, probes the chain and plans the steps.
    pub async fn prepare(
        ctx: ExecutionContext,
        networks: &NetworkRegistry,
        reader: &dyn ChainReader,
        requests: &[NamingRequest],
    ) -> Result<Self, PrepareError> {
        validate_requests(requests, &ctx.root_parent)?;
        let batches = graph::build(requests, &ctx.root_parent)?;
        let report = OwnershipProbe::new(reader, ctx.caller).run(&ctx, networks, &batches).await;
        let steps = StepPlanner::new(&ctx, networks).plan(&batches, &report)?;
        debug!(target: "enscribe::run", batches = batches.len(), steps = steps.len(), "prepared naming run");
        Ok(Self { ctx, batches, report, steps })
    }

    /// Binds every step to `wallet` and returns an executor in the context's signer mode.
    pub fn into_executor(
        self,
        wallet: Arc<dyn Wallet>,
        reader: Arc<dyn ChainReader>,
        switcher: ChainSwitcher,
    ) -> StepExecutor {
        let mode = self.ctx.signer_mode;
        let steps = self
            .steps
            .into_iter()
            .map(|step| step.bind(wallet.clone(), reader.clone(), switcher))
            .collect();
        StepExecutor::new(steps, wallet, mode).with_switcher(switcher)
    }

    /// Safe Transaction Builder batches of the planned calls, one per chain.
    pub fn safe_batches(&self, safe: Option<Address>) -> BTreeMap<ChainId, SafeBatch> {
        SafeBatch::per_chain(&self.steps, safe)
    }
}
