//! Planned and executable steps.

use crate::{
    abi::EnsRegistry,
    switch::{ChainSwitcher, SwitchError},
    wallet::{ChainReader, ContractCall, TxHandle, Wallet, WalletError, read_call},
};
use alloy_primitives::{Address, B256, ChainId};
use async_trait::async_trait;
use serde::Serialize;
use std::{fmt, future::Future, sync::Arc};

/// Lifecycle of one step within a run.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum StepStatus {
    #[default]
    Pending,
    Completed,
    Error,
}

/// Why a step attempt failed.
#[derive(Debug, thiserror::Error)]
pub enum StepError {
    #[error("user rejected the request")]
    Rejected,
    #[error(transparent)]
    Switch(#[from] SwitchError),
    #[error(transparent)]
    Wallet(WalletError),
    #[error("transaction {0} reverted")]
    Reverted(B256),
    #[error("{0}")]
    Other(String),
}

impl StepError {
    /// Rejections are recoverable: the step goes back to pending.
    pub fn is_user_rejection(&self) -> bool {
        match self {
            Self::Rejected => true,
            Self::Switch(err) => err.is_user_rejection(),
            Self::Wallet(err) => err.is_user_rejection(),
            _ => false,
        }
    }
}

impl From<WalletError> for StepError {
    fn from(err: WalletError) -> Self {
        if err.is_user_rejection() { Self::Rejected } else { Self::Wallet(err) }
    }
}

/// What an action returns: the transaction it produced, or `None` when its effect was
/// already in place.
pub type ActionResult = Result<Option<TxHandle>, StepError>;

/// The work behind a [`Step`].
#[async_trait]
pub trait StepAction: Send + Sync {
    async fn run(&self) -> ActionResult;
}

#[async_trait]
impl<F, Fut> StepAction for F
where
    F: Fn() -> Fut + Send + Sync,
    Fut: Future<Output = ActionResult> + Send,
{
    async fn run(&self) -> ActionResult {
        self().await
    }
}

/// An executable, immutable step bound to a target network.
#[derive(Clone)]
pub struct Step {
    pub title: String,
    pub chain_id: ChainId,
    action: Arc<dyn StepAction>,
}

impl Step {
    pub fn new(
        title: impl Into<String>,
        chain_id: ChainId,
        action: impl StepAction + 'static,
    ) -> Self {
        Self { title: title.into(), chain_id, action: Arc::new(action) }
    }

    pub async fn run(&self) -> ActionResult {
        self.action.run().await
    }
}

impl fmt::Debug for Step {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Step")
            .field("title", &self.title)
            .field("chain_id", &self.chain_id)
            .finish_non_exhaustive()
    }
}

/// What a planned step does.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum StepKind {
    GrantOperator,
    CreateSubnames { level: usize, parent: String, names: Vec<String> },
    ReverseResolution { contract: Address, name: String },
    RevokeOperator,
}

/// A state check run right before submission.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum Precondition {
    /// Skip when `operator` already is an approved operator of `owner` on `registry`.
    SkipIfApproved { registry: Address, owner: Address, operator: Address },
    /// Skip when `operator` is no longer an approved operator of `owner` on `registry`.
    SkipUnlessApproved { registry: Address, owner: Address, operator: Address },
}

impl Precondition {
    /// Returns `true` when the step's effect is already in place.
    ///
    /// A failed read never skips: the step is submitted and fails on chain if it must.
    async fn is_satisfied(&self, reader: &dyn ChainReader, chain_id: ChainId) -> bool {
        let (registry, owner, operator, want) = match *self {
            Self::SkipIfApproved { registry, owner, operator } => (registry, owner, operator, true),
            Self::SkipUnlessApproved { registry, owner, operator } => {
                (registry, owner, operator, false)
            }
        };
        let call = EnsRegistry::isApprovedForAllCall { owner, operator };
        match read_call(reader, chain_id, registry, call).await {
            Ok(approved) => approved == want,
            Err(err) => {
                debug!(target: "enscribe::step", %err, "precondition read failed");
                false
            }
        }
    }
}

/// A planned, inspectable step: one call on one network.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct PlannedStep {
    pub title: String,
    pub chain_id: ChainId,
    pub kind: StepKind,
    pub call: ContractCall,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub precondition: Option<Precondition>,
}

impl PlannedStep {
    /// Binds this step to a signer, producing an executable [`Step`].
    pub fn bind(
        self,
        wallet: Arc<dyn Wallet>,
        reader: Arc<dyn ChainReader>,
        switcher: ChainSwitcher,
    ) -> Step {
        let title = self.title.clone();
        let chain_id = self.chain_id;
        Step::new(title, chain_id, CallAction { step: self, wallet, reader, switcher })
    }
}

/// Submits a planned call after moving the wallet onto its network.
struct CallAction {
    step: PlannedStep,
    wallet: Arc<dyn Wallet>,
    reader: Arc<dyn ChainReader>,
    switcher: ChainSwitcher,
}

#[async_trait]
impl StepAction for CallAction {
    async fn run(&self) -> ActionResult {
        let chain_id = self.step.chain_id;
        self.switcher.ensure_chain(self.wallet.as_ref(), chain_id).await?;

        if let Some(precondition) = &self.step.precondition
            && precondition.is_satisfied(self.reader.as_ref(), chain_id).await
        {
            debug!(target: "enscribe::step", title = %self.step.title, "already satisfied, skipping");
            return Ok(None);
        }

        let handle = self.wallet.submit_transaction(&self.step.call).await?;
        trace!(target: "enscribe::step", title = %self.step.title, tx = %handle, "submitted");
        Ok(Some(handle))
    }
}
