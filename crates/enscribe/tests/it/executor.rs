use crate::mock::{BASE_SEPOLIA, Reply, SEPOLIA, ScriptedWallet};
use alloy_primitives::{Address, B256, ChainId};
use enscribe::{
    ChainSwitcher, ContractCall, ExecutionResult, RunPhase, RunReporter, SignerMode, Step,
    StepError, StepExecutor, StepStatus, TxHandle, Wallet, step::ActionResult,
};
use std::{
    sync::{
        Arc, Mutex,
        atomic::{AtomicUsize, Ordering},
    },
    time::Duration,
};

type Log = Arc<Mutex<Vec<String>>>;

/// A step that logs its start and end, yields in between, and returns `result()`.
fn logged_step(
    index: usize,
    chain_id: ChainId,
    log: &Log,
    result: impl Fn(usize) -> ActionResult + Send + Sync + Clone + 'static,
) -> Step {
    let log = log.clone();
    let calls = Arc::new(AtomicUsize::new(0));
    Step::new(format!("step {index}"), chain_id, move || {
        let log = log.clone();
        let result = result.clone();
        let attempt = calls.fetch_add(1, Ordering::SeqCst);
        async move {
            log.lock().unwrap().push(format!("start {index}"));
            tokio::time::sleep(Duration::from_millis(1)).await;
            log.lock().unwrap().push(format!("end {index}"));
            result(attempt)
        }
    })
}

fn tx(chain_id: ChainId, byte: u8) -> TxHandle {
    TxHandle::Hash { chain_id, hash: B256::repeat_byte(byte) }
}

fn executor(steps: Vec<Step>, wallet: Arc<ScriptedWallet>, mode: SignerMode) -> StepExecutor {
    StepExecutor::new(steps, wallet, mode).with_switcher(ChainSwitcher::new(Duration::from_millis(1), 3))
}

#[derive(Default)]
struct RecordingReporter {
    statuses: Mutex<Vec<(usize, StepStatus)>>,
    outcomes: Mutex<Vec<ExecutionResult>>,
}

impl RunReporter for RecordingReporter {
    fn on_step_status(&self, index: usize, _step: &Step, status: StepStatus) {
        self.statuses.lock().unwrap().push((index, status));
    }

    fn on_outcome(&self, result: &ExecutionResult) {
        self.outcomes.lock().unwrap().push(result.clone());
    }
}

#[tokio::test]
async fn runs_steps_strictly_in_sequence() {
    let log = Log::default();
    let steps = (0..4)
        .map(|i| logged_step(i, SEPOLIA, &log, move |_| Ok(Some(tx(SEPOLIA, i as u8 + 1)))))
        .collect();
    let wallet = Arc::new(ScriptedWallet::new(SEPOLIA));
    let mut executor = executor(steps, wallet.clone(), SignerMode::Direct);

    assert_eq!(executor.start().await, RunPhase::AllCompleted);
    assert_eq!(
        *log.lock().unwrap(),
        ["start 0", "end 0", "start 1", "end 1", "start 2", "end 2", "start 3", "end 3"]
    );
    assert_eq!(executor.state().statuses, vec![StepStatus::Completed; 4]);
    assert_eq!(executor.outcome(), Some(&ExecutionResult::Success { last_tx: Some(tx(SEPOLIA, 4)) }));
    assert_eq!(wallet.confirmations.load(Ordering::SeqCst), 4);
}

#[tokio::test]
async fn fire_and_forget_completes_without_running_actions() {
    let log = Log::default();
    let steps = (0..3).map(|i| logged_step(i, SEPOLIA, &log, |_| Ok(None))).collect();
    let wallet = Arc::new(ScriptedWallet::new(SEPOLIA));
    let mut executor = executor(steps, wallet.clone(), SignerMode::Batched);

    assert_eq!(executor.start().await, RunPhase::AllCompleted);
    assert!(log.lock().unwrap().is_empty());
    assert_eq!(executor.state().statuses, vec![StepStatus::Completed; 3]);
    assert!(executor.state().tx_handles.iter().all(Option::is_none));
    assert_eq!(executor.outcome(), Some(&ExecutionResult::Success { last_tx: None }));
    assert_eq!(executor.outcome().unwrap().to_string(), "SUCCESS");
    assert!(wallet.switches.lock().unwrap().is_empty());
}

#[tokio::test]
async fn halts_on_error_and_leaves_later_steps_pending() {
    let log = Log::default();
    let steps = (0..4)
        .map(|i| {
            logged_step(i, SEPOLIA, &log, move |_| {
                if i == 1 { Err(StepError::Other("insufficient funds".into())) } else { Ok(None) }
            })
        })
        .collect();
    let reporter = Arc::new(RecordingReporter::default());
    let wallet = Arc::new(ScriptedWallet::new(SEPOLIA));
    let mut executor = executor(steps, wallet, SignerMode::Direct).with_reporter(reporter.clone());

    assert_eq!(executor.start().await, RunPhase::HaltedOnError);
    assert_eq!(
        executor.state().statuses,
        vec![StepStatus::Completed, StepStatus::Error, StepStatus::Pending, StepStatus::Pending]
    );
    assert_eq!(*log.lock().unwrap(), ["start 0", "end 0", "start 1", "end 1"]);
    assert_eq!(executor.state().error.as_deref(), Some("insufficient funds"));
    assert_eq!(executor.outcome().unwrap().to_string(), "ERROR: insufficient funds");
    assert_eq!(*reporter.outcomes.lock().unwrap(), vec![ExecutionResult::Error("insufficient funds".into())]);

    // A halted run cannot be retried or cancelled into another outcome.
    assert_eq!(executor.retry().await, RunPhase::HaltedOnError);
    assert_eq!(executor.cancel(), ExecutionResult::Error("insufficient funds".into()));
    assert_eq!(reporter.outcomes.lock().unwrap().len(), 1);
}

#[tokio::test]
async fn rejection_pauses_until_retry() {
    let log = Log::default();
    let steps = vec![
        logged_step(0, SEPOLIA, &log, |_| Ok(Some(tx(SEPOLIA, 1)))),
        logged_step(1, SEPOLIA, &log, |attempt| {
            if attempt == 0 { Err(StepError::Rejected) } else { Ok(Some(tx(SEPOLIA, 2))) }
        }),
        logged_step(2, SEPOLIA, &log, |_| Ok(None)),
    ];
    let reporter = Arc::new(RecordingReporter::default());
    let wallet = Arc::new(ScriptedWallet::new(SEPOLIA));
    let mut executor = executor(steps, wallet, SignerMode::Direct).with_reporter(reporter.clone());

    assert_eq!(executor.start().await, RunPhase::AwaitingRetry(1));
    assert_eq!(executor.state().current, 1);
    assert_eq!(
        executor.state().statuses,
        vec![StepStatus::Completed, StepStatus::Pending, StepStatus::Pending]
    );
    assert!(executor.outcome().is_none());
    assert!(reporter.outcomes.lock().unwrap().is_empty());

    assert_eq!(executor.retry().await, RunPhase::AllCompleted);
    assert_eq!(*log.lock().unwrap(), ["start 0", "end 0", "start 1", "end 1", "start 1", "end 1", "start 2", "end 2"]);
    // Step 2 was already satisfied, so step 1 holds the last transaction.
    assert_eq!(executor.outcome(), Some(&ExecutionResult::Success { last_tx: Some(tx(SEPOLIA, 2)) }));
    assert_eq!(
        *reporter.statuses.lock().unwrap(),
        vec![(0, StepStatus::Completed), (1, StepStatus::Pending), (1, StepStatus::Completed), (2, StepStatus::Completed)]
    );
}

#[tokio::test]
async fn cancel_after_rejection_is_incomplete() {
    let log = Log::default();
    let steps = vec![
        logged_step(0, SEPOLIA, &log, |_| Err(StepError::Rejected)),
        logged_step(1, SEPOLIA, &log, |_| Ok(None)),
    ];
    let wallet = Arc::new(ScriptedWallet::new(SEPOLIA));
    let mut executor = executor(steps, wallet, SignerMode::Direct);

    assert_eq!(executor.start().await, RunPhase::AwaitingRetry(0));
    assert_eq!(executor.cancel(), ExecutionResult::Incomplete);
    assert_eq!(executor.state().phase, RunPhase::Cancelled);
    assert_eq!(executor.outcome().unwrap().to_string(), "INCOMPLETE");
    assert_eq!(executor.state().statuses, vec![StepStatus::Pending; 2]);
}

#[tokio::test]
async fn cancel_after_completion_keeps_success() {
    let log = Log::default();
    let steps = vec![logged_step(0, SEPOLIA, &log, |_| Ok(None))];
    let mut executor = executor(steps, Arc::new(ScriptedWallet::new(SEPOLIA)), SignerMode::Direct);
    executor.start().await;
    assert_eq!(executor.cancel(), ExecutionResult::Success { last_tx: None });
    assert_eq!(executor.state().phase, RunPhase::AllCompleted);
}

#[tokio::test]
async fn switches_network_before_each_step() {
    let log = Log::default();
    let steps = vec![
        logged_step(0, SEPOLIA, &log, |_| Ok(None)),
        logged_step(1, BASE_SEPOLIA, &log, |_| Ok(None)),
        logged_step(2, SEPOLIA, &log, |_| Ok(None)),
    ];
    let wallet = Arc::new(ScriptedWallet::new(SEPOLIA));
    let mut executor = executor(steps, wallet.clone(), SignerMode::Direct);

    assert_eq!(executor.start().await, RunPhase::AllCompleted);
    assert_eq!(*wallet.switches.lock().unwrap(), vec![BASE_SEPOLIA, SEPOLIA]);
}

#[tokio::test]
async fn switch_timeout_halts_the_run() {
    let log = Log::default();
    let steps = vec![
        logged_step(0, SEPOLIA, &log, |_| Ok(Some(tx(SEPOLIA, 1)))),
        logged_step(1, BASE_SEPOLIA, &log, |_| Ok(Some(tx(BASE_SEPOLIA, 2)))),
        logged_step(2, SEPOLIA, &log, |_| Ok(Some(tx(SEPOLIA, 3)))),
    ];
    let reporter = Arc::new(RecordingReporter::default());
    let wallet = Arc::new(ScriptedWallet::new(SEPOLIA).stuck());
    let mut executor = executor(steps, wallet.clone(), SignerMode::Direct).with_reporter(reporter.clone());

    assert_eq!(executor.start().await, RunPhase::HaltedOnError);
    assert_eq!(
        executor.state().statuses,
        vec![StepStatus::Completed, StepStatus::Error, StepStatus::Pending]
    );
    assert_eq!(*log.lock().unwrap(), ["start 0", "end 0"]);
    assert_eq!(*wallet.switches.lock().unwrap(), vec![BASE_SEPOLIA]);

    let expected = format!(
        "ERROR: wallet did not switch to chain {BASE_SEPOLIA} after 3 attempts (still on {SEPOLIA})"
    );
    assert_eq!(executor.outcome().unwrap().to_string(), expected);
    assert_eq!(reporter.outcomes.lock().unwrap().len(), 1);
}

#[tokio::test]
async fn queued_handles_are_not_awaited() {
    let log = Log::default();
    let steps = vec![logged_step(0, SEPOLIA, &log, |_| Ok(Some(TxHandle::Queued)))];
    let wallet = Arc::new(ScriptedWallet::new(SEPOLIA));
    let mut executor = executor(steps, wallet.clone(), SignerMode::Direct);

    assert_eq!(executor.start().await, RunPhase::AllCompleted);
    assert_eq!(wallet.confirmations.load(Ordering::SeqCst), 0);
    assert_eq!(executor.outcome().unwrap().to_string(), "SUCCESS safe-queued");
}

#[tokio::test]
async fn reverted_receipt_halts_the_run() {
    let wallet = Arc::new(ScriptedWallet::new(SEPOLIA).script([Some(Reply::Revert)]));
    let submitter = wallet.clone();
    let step = Step::new("revert", SEPOLIA, move || {
        let wallet = submitter.clone();
        async move {
            let call = ContractCall::new(Address::ZERO, vec![]);
            wallet.submit_transaction(&call).await.map(Some).map_err(StepError::from)
        }
    });
    let mut executor = executor(vec![step], wallet, SignerMode::Direct);

    assert_eq!(executor.start().await, RunPhase::HaltedOnError);
    assert_eq!(executor.state().statuses, vec![StepStatus::Error]);
    assert!(executor.state().error.as_deref().unwrap().ends_with("reverted"));
}

#[tokio::test]
async fn wallet_rejection_is_recoverable() {
    let wallet = Arc::new(ScriptedWallet::new(SEPOLIA).script([Some(Reply::Reject), None]));
    let submitter = wallet.clone();
    let step = Step::new("submit", SEPOLIA, move || {
        let wallet = submitter.clone();
        async move {
            let call = ContractCall::new(Address::ZERO, vec![]);
            wallet.submit_transaction(&call).await.map(Some).map_err(StepError::from)
        }
    });
    let mut executor = executor(vec![step], wallet.clone(), SignerMode::Direct);

    assert_eq!(executor.start().await, RunPhase::AwaitingRetry(0));
    assert!(wallet.submitted.lock().unwrap().is_empty());
    assert_eq!(executor.retry().await, RunPhase::AllCompleted);
    assert_eq!(wallet.submitted.lock().unwrap().len(), 1);
}
