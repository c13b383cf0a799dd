//! Sequential step execution.
//!
//! [`StepExecutor`] runs a planned step list one step at a time and owns the mutable
//! [`RunState`] of that run. Step `i + 1` is only started once step `i` is completed.

use crate::{
    context::SignerMode,
    step::{Step, StepError, StepStatus},
    switch::ChainSwitcher,
    wallet::{TxHandle, Wallet},
};
use serde::Serialize;
use std::{fmt, sync::Arc};

/// Where a run stands.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
#[serde(tag = "phase", content = "step", rename_all = "kebab-case")]
pub enum RunPhase {
    #[default]
    NotStarted,
    Running,
    /// Step `i` was rejected by the user and waits for [`StepExecutor::retry`].
    AwaitingRetry(usize),
    AllCompleted,
    HaltedOnError,
    Cancelled,
}

impl RunPhase {
    /// Whether the run can make no further progress.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::AllCompleted | Self::HaltedOnError | Self::Cancelled)
    }
}

/// Terminal result of a run.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ExecutionResult {
    /// Every step completed. Carries the most recent transaction, if any step produced one.
    Success { last_tx: Option<TxHandle> },
    /// The run was closed before it completed.
    Incomplete,
    Error(String),
}

impl fmt::Display for ExecutionResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Success { last_tx: Some(tx) } => write!(f, "SUCCESS {tx}"),
            Self::Success { last_tx: None } => f.write_str("SUCCESS"),
            Self::Incomplete => f.write_str("INCOMPLETE"),
            Self::Error(message) => write!(f, "ERROR: {message}"),
        }
    }
}

/// Mutable state of one run.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct RunState {
    pub statuses: Vec<StepStatus>,
    pub tx_handles: Vec<Option<TxHandle>>,
    /// Index of the step being run or waiting to run.
    pub current: usize,
    pub phase: RunPhase,
    pub error: Option<String>,
}

impl RunState {
    fn new(steps: usize) -> Self {
        Self {
            statuses: vec![StepStatus::Pending; steps],
            tx_handles: vec![None; steps],
            ..Default::default()
        }
    }

    /// The most recent transaction produced by a completed step.
    pub fn last_tx(&self) -> Option<TxHandle> {
        self.tx_handles.iter().rev().flatten().next().copied()
    }
}

/// Observer of a run.
pub trait RunReporter: Send + Sync {
    fn on_step_started(&self, _index: usize, _step: &Step) {}

    fn on_step_status(&self, index: usize, step: &Step, status: StepStatus);

    /// Called exactly once, with the terminal result of the run.
    fn on_outcome(&self, result: &ExecutionResult);
}

/// Reports through `tracing`.
#[derive(Clone, Copy, Debug, Default)]
pub struct TracingReporter;

impl RunReporter for TracingReporter {
    fn on_step_status(&self, index: usize, step: &Step, status: StepStatus) {
        debug!(target: "enscribe::executor", step = index, title = %step.title, ?status, "step status");
    }

    fn on_outcome(&self, result: &ExecutionResult) {
        info!(target: "enscribe::executor", %result, "run finished");
    }
}

/// Runs a step list against one wallet.
pub struct StepExecutor {
    steps: Vec<Step>,
    wallet: Arc<dyn Wallet>,
    switcher: ChainSwitcher,
    mode: SignerMode,
    reporter: Arc<dyn RunReporter>,
    state: RunState,
    outcome: Option<ExecutionResult>,
}

impl fmt::Debug for StepExecutor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StepExecutor")
            .field("steps", &self.steps)
            .field("mode", &self.mode)
            .field("state", &self.state)
            .finish_non_exhaustive()
    }
}

impl StepExecutor {
    pub fn new(steps: Vec<Step>, wallet: Arc<dyn Wallet>, mode: SignerMode) -> Self {
        let state = RunState::new(steps.len());
        Self {
            steps,
            wallet,
            switcher: ChainSwitcher::default(),
            mode,
            reporter: Arc::new(TracingReporter),
            state,
            outcome: None,
        }
    }

    pub fn with_switcher(mut self, switcher: ChainSwitcher) -> Self {
        self.switcher = switcher;
        self
    }

    pub fn with_reporter(mut self, reporter: Arc<dyn RunReporter>) -> Self {
        self.reporter = reporter;
        self
    }

    pub fn steps(&self) -> &[Step] {
        &self.steps
    }

    pub fn state(&self) -> &RunState {
        &self.state
    }

    /// The terminal result, once the run reached one.
    pub fn outcome(&self) -> Option<&ExecutionResult> {
        self.outcome.as_ref()
    }

    /// Starts the run at the first step and advances until it completes, pauses on a
    /// rejection, or halts on an error.
    ///
    /// In [`SignerMode::Batched`] no action is invoked: every step is marked completed at once.
    pub async fn start(&mut self) -> RunPhase {
        if self.state.phase != RunPhase::NotStarted {
            warn!(target: "enscribe::executor", phase = ?self.state.phase, "run already started");
            return self.state.phase.clone();
        }

        if self.mode == SignerMode::Batched {
            for index in 0..self.steps.len() {
                self.set_status(index, StepStatus::Completed);
            }
            self.state.current = self.steps.len();
            self.finish(RunPhase::AllCompleted, ExecutionResult::Success { last_tx: None });
            return self.state.phase.clone();
        }

        self.advance().await
    }

    /// Resumes a run paused on a rejected step, starting with that step again.
    pub async fn retry(&mut self) -> RunPhase {
        let phase = self.state.phase.clone();
        match phase {
            RunPhase::AwaitingRetry(index) => {
                debug!(target: "enscribe::executor", step = index, "retrying step");
                self.advance().await
            }
            phase => {
                warn!(target: "enscribe::executor", ?phase, "nothing to retry");
                phase
            }
        }
    }

    /// Closes the run. Transactions already submitted are not rolled back.
    pub fn cancel(&mut self) -> ExecutionResult {
        if let Some(outcome) = &self.outcome {
            return outcome.clone();
        }
        debug!(target: "enscribe::executor", step = self.state.current, "run cancelled");
        self.finish(RunPhase::Cancelled, ExecutionResult::Incomplete);
        ExecutionResult::Incomplete
    }

    async fn advance(&mut self) -> RunPhase {
        self.state.phase = RunPhase::Running;
        while self.state.current < self.steps.len() {
            let index = self.state.current;
            let step = self.steps[index].clone();
            self.reporter.on_step_started(index, &step);
            trace!(target: "enscribe::executor", step = index, title = %step.title, chain_id = step.chain_id, "running step");

            match self.run_step(&step).await {
                Ok(handle) => {
                    self.state.tx_handles[index] = handle;
                    self.set_status(index, StepStatus::Completed);
                    self.state.current += 1;
                }
                Err(err) if err.is_user_rejection() => {
                    debug!(target: "enscribe::executor", step = index, "step rejected by user");
                    self.set_status(index, StepStatus::Pending);
                    self.state.phase = RunPhase::AwaitingRetry(index);
                    return self.state.phase.clone();
                }
                Err(err) => {
                    let message = err.to_string();
                    warn!(target: "enscribe::executor", step = index, %message, "step failed");
                    self.set_status(index, StepStatus::Error);
                    self.state.error = Some(message.clone());
                    self.finish(RunPhase::HaltedOnError, ExecutionResult::Error(message));
                    return self.state.phase.clone();
                }
            }
        }

        let last_tx = self.state.last_tx();
        self.finish(RunPhase::AllCompleted, ExecutionResult::Success { last_tx });
        self.state.phase.clone()
    }

    async fn run_step(&self, step: &Step) -> Result<Option<TxHandle>, StepError> {
        self.switcher.ensure_chain(self.wallet.as_ref(), step.chain_id).await?;

        let Some(handle) = step.run().await? else { return Ok(None) };
        if handle.is_queued() {
            return Ok(Some(handle));
        }

        let receipt = self.wallet.await_confirmation(&handle).await?;
        if !receipt.success {
            return Err(StepError::Reverted(receipt.tx_hash));
        }
        trace!(target: "enscribe::executor", tx = %receipt.tx_hash, block = ?receipt.block_number, "confirmed");
        Ok(Some(handle))
    }

    fn set_status(&mut self, index: usize, status: StepStatus) {
        self.state.statuses[index] = status;
        self.reporter.on_step_status(index, &self.steps[index], status);
    }

    fn finish(&mut self, phase: RunPhase, result: ExecutionResult) {
        self.state.phase = phase;
        self.reporter.on_outcome(&result);
        self.outcome = Some(result);
    }
}
