use crate::mock::{API, APP, BASE_SEPOLIA, CALLER, ChainState, ENSCRIBE, SEPOLIA, ScriptedWallet};
use alloy_primitives::address;
use alloy_sol_types::SolCall;
use enscribe::{
    ChainSwitcher, Deployment, ExecutionContext, ExecutionResult, NamingOptions, NamingPlan,
    NamingRequest, NetworkRegistry, PrepareError, RunPhase, SignerMode, StepKind, StepStatus,
    TxHandle, ValidationError,
    abi::{EnsRegistry, Enscribe},
};
use std::{sync::Arc, time::Duration};

fn networks() -> NetworkRegistry {
    NetworkRegistry::new([
        Deployment { chain_id: SEPOLIA, enscribe: Some(ENSCRIBE), ..Default::default() },
        Deployment {
            chain_id: BASE_SEPOLIA,
            reverse_registrar: Some(address!("0x0000000000000000000000000000000000000b05")),
            public_resolver: Some(address!("0x0000000000000000000000000000000000000b06")),
            ..Default::default()
        },
    ])
}

fn requests() -> Vec<NamingRequest> {
    vec![NamingRequest::new(APP, "app.team"), NamingRequest::new(API, "api")]
}

fn context() -> ExecutionContext {
    ExecutionContext::new(CALLER, SEPOLIA, "x.eth").with_options(NamingOptions {
        secondary_networks: vec![BASE_SEPOLIA],
        ..Default::default()
    })
}

fn chain() -> ChainState {
    ChainState::default()
        .owned(SEPOLIA, APP, CALLER)
        .owned(SEPOLIA, API, CALLER)
        .owned(BASE_SEPOLIA, API, CALLER)
}

fn switcher() -> ChainSwitcher {
    ChainSwitcher::new(Duration::from_millis(1), 3)
}

#[tokio::test]
async fn names_contracts_end_to_end() {
    let chain = Arc::new(chain());
    let plan = NamingPlan::prepare(context(), &networks(), chain.as_ref(), &requests()).await.unwrap();

    assert_eq!(plan.batches.len(), 2);
    assert!(plan.batches[0].entries.iter().any(|node| node.is_placeholder()));
    let kinds = plan.steps.iter().map(|step| &step.kind).collect::<Vec<_>>();
    assert!(matches!(kinds[0], StepKind::GrantOperator));
    assert!(matches!(kinds[1], StepKind::CreateSubnames { level: 1, .. }));
    assert!(matches!(kinds[2], StepKind::CreateSubnames { level: 2, .. }));
    assert!(matches!(kinds[6], StepKind::RevokeOperator));
    assert_eq!(plan.steps.len(), 7);

    // The placeholder ancestor is created with a zero address, in the level 1 batch.
    let create = Enscribe::setNameBatchCall::abi_decode(&plan.steps[1].call.data).unwrap();
    assert_eq!(create.labels, vec!["api".to_string(), "team".to_string()]);
    assert!(create.contractAddresses[1].is_zero());
    assert_eq!(create.coinTypes.len(), 1);

    let wallet = Arc::new(ScriptedWallet::new(SEPOLIA));
    let mut executor = plan.into_executor(wallet.clone(), chain.clone(), switcher());
    assert_eq!(executor.start().await, RunPhase::AllCompleted);

    assert_eq!(
        wallet.submitted_chains(),
        vec![SEPOLIA, SEPOLIA, SEPOLIA, SEPOLIA, SEPOLIA, BASE_SEPOLIA]
    );
    assert_eq!(*wallet.switches.lock().unwrap(), vec![BASE_SEPOLIA, SEPOLIA]);
    let Some(ExecutionResult::Success { last_tx: Some(TxHandle::Hash { chain_id, .. }) }) =
        executor.outcome().cloned()
    else {
        panic!("expected a successful run");
    };
    assert_eq!(chain_id, BASE_SEPOLIA);
    // The revoke step read the approval as still unset and was skipped.
    assert_eq!(executor.state().statuses, vec![StepStatus::Completed; 7]);
    assert!(executor.state().tx_handles[6].is_none());
}

#[tokio::test]
async fn preconditions_are_checked_at_run_time() {
    let chain = Arc::new(chain());
    let plan = NamingPlan::prepare(context(), &networks(), chain.as_ref(), &requests()).await.unwrap();
    assert!(matches!(plan.steps[0].kind, StepKind::GrantOperator));

    // Access granted elsewhere between planning and execution.
    chain.set_approved(true);
    let wallet = Arc::new(ScriptedWallet::new(SEPOLIA));
    let mut executor = plan.into_executor(wallet.clone(), chain.clone(), switcher());
    assert_eq!(executor.start().await, RunPhase::AllCompleted);

    let submitted = wallet.submitted.lock().unwrap();
    let first = EnsRegistry::setApprovalForAllCall::abi_decode(&submitted[0].1.data);
    assert!(first.is_err(), "grant must be skipped");
    let last = EnsRegistry::setApprovalForAllCall::abi_decode(&submitted.last().unwrap().1.data).unwrap();
    assert!(!last.approved);
    assert_eq!(last.operator, ENSCRIBE);
}

#[tokio::test]
async fn unowned_contracts_get_no_reverse_records() {
    let chain = Arc::new(ChainState::default());
    let ctx = ExecutionContext::new(CALLER, SEPOLIA, "x.eth");
    let plan = NamingPlan::prepare(ctx, &networks(), chain.as_ref(), &requests()).await.unwrap();
    assert!(plan.steps.iter().all(|step| !matches!(step.kind, StepKind::ReverseResolution { .. })));
    assert_eq!(plan.steps.len(), 4);
}

#[tokio::test]
async fn batched_mode_exports_without_signing() {
    let chain = Arc::new(chain());
    let ctx = context().with_signer_mode(SignerMode::Batched);
    let plan = NamingPlan::prepare(ctx, &networks(), chain.as_ref(), &requests()).await.unwrap();

    let batches = plan.safe_batches(None);
    assert_eq!(batches[&SEPOLIA].transactions.len(), 6);
    assert_eq!(batches[&BASE_SEPOLIA].transactions.len(), 1);

    let wallet = Arc::new(ScriptedWallet::new(SEPOLIA));
    let mut executor = plan.into_executor(wallet.clone(), chain, switcher());
    assert_eq!(executor.start().await, RunPhase::AllCompleted);
    assert!(wallet.submitted.lock().unwrap().is_empty());
    assert_eq!(executor.outcome(), Some(&ExecutionResult::Success { last_tx: None }));
}

#[tokio::test]
async fn invalid_requests_never_reach_the_chain() {
    let chain = ChainState::default();
    let requests = vec![NamingRequest::new(APP, "app"), NamingRequest::new(API, "app.x.eth")];
    let err = NamingPlan::prepare(context(), &networks(), &chain, &requests).await.unwrap_err();
    assert!(matches!(err, PrepareError::Validation(ValidationError::Rejected(_))));
    assert_eq!(chain.reads.load(std::sync::atomic::Ordering::SeqCst), 0);
}
