use crate::{
    opts::{EntryOpts, NetworkOpts},
    progress::StepProgress,
    rpc::RpcWallet,
    utils::chain_display,
};
use alloy_primitives::{Address, ChainId, utils::format_ether};
use alloy_signer_local::PrivateKeySigner;
use clap::Parser;
use dialoguer::Confirm;
use enscribe::{
    ChainReader, ExecutionContext, ExecutionResult, NamingPlan, RunPhase, SafeBatch, SignerMode,
    StepExecutor,
};
use eyre::{Result, WrapErr};
use std::{
    collections::BTreeMap,
    future::Future,
    path::{Path, PathBuf},
    sync::Arc,
};
use yansi::Paint;

/// CLI arguments for `naming run`.
#[derive(Clone, Debug, Parser)]
pub struct RunArgs {
    #[command(flatten)]
    pub entries: EntryOpts,

    #[command(flatten)]
    pub network: NetworkOpts,

    /// Private key of the account that signs every step.
    #[arg(long, value_name = "KEY", env = "ENSCRIBE_PRIVATE_KEY", hide_env_values = true)]
    pub private_key: Option<String>,

    /// Write the planned calls as Safe Transaction Builder batches instead of sending them.
    ///
    /// With several chains involved, one file per chain is written, suffixed with the chain id.
    #[arg(long, value_name = "FILE")]
    pub safe_batch: Option<PathBuf>,

    /// Safe the batch is built for. It is also the account whose authority is probed.
    #[arg(long, value_name = "ADDRESS", requires = "safe_batch")]
    pub safe: Option<Address>,

    /// Do not ask for confirmation before sending, and give up on rejected steps.
    #[arg(long, short)]
    pub yes: bool,
}

impl RunArgs {
    pub async fn run(self) -> Result<ExecutionResult> {
        let config = self.network.load_config()?;
        let signer = self
            .private_key
            .as_deref()
            .map(|key| key.trim().parse::<PrivateKeySigner>())
            .transpose()
            .wrap_err("invalid private key")?;

        let mode = if self.safe_batch.is_some() { SignerMode::Batched } else { SignerMode::Direct };
        let caller = match (self.safe, &signer) {
            (Some(safe), _) => safe,
            (None, Some(signer)) => signer.address(),
            (None, None) if mode == SignerMode::Batched => {
                eyre::bail!("a Safe batch needs the Safe address (--safe) or a signer")
            }
            (None, None) => eyre::bail!("no signer given, pass --private-key or --safe-batch"),
        };

        let requests = self.entries.requests()?;
        let networks = config.registry()?;
        let wallet = Arc::new(
            RpcWallet::connect(
                &config.deployments()?,
                signer,
                config.primary_chain,
                config.confirmation_timeout(),
            )
            .await?,
        );

        let ctx = ExecutionContext::new(caller, config.primary_chain, &self.entries.parent)
            .with_options(self.network.options(&config))
            .with_signer_mode(mode);
        let plan = NamingPlan::prepare(ctx, &networks, &*wallet, &requests).await?;
        print_plan(&plan, caller);

        if let Some(path) = &self.safe_batch {
            write_safe_batches(path, &plan.safe_batches(self.safe))?;
        } else if !self.yes && !confirm("Send these transactions?")? {
            return Ok(ExecutionResult::Incomplete);
        }

        let reporter = Arc::new(StepProgress::new(plan.steps.len()));
        let reader: Arc<dyn ChainReader> = wallet.clone();
        let executor =
            plan.into_executor(wallet, reader, config.switcher()).with_reporter(reporter);
        drive(executor, self.yes).await
    }
}

/// Runs the executor to a terminal outcome, asking whether to retry rejected steps.
///
/// Ctrl-C cancels the run.
async fn drive(mut executor: StepExecutor, yes: bool) -> Result<ExecutionResult> {
    let Some(mut phase) = interruptible(executor.start()).await else {
        return Ok(executor.cancel());
    };
    while let RunPhase::AwaitingRetry(index) = phase {
        let title = &executor.steps()[index].title;
        if yes || !confirm(&format!("Step `{title}` was rejected. Retry?"))? {
            return Ok(executor.cancel());
        }
        let Some(next) = interruptible(executor.retry()).await else {
            return Ok(executor.cancel());
        };
        phase = next;
    }
    Ok(executor.outcome().cloned().unwrap_or_else(|| executor.cancel()))
}

/// Awaits `fut` unless Ctrl-C comes first.
async fn interruptible<F: Future<Output = RunPhase>>(fut: F) -> Option<RunPhase> {
    tokio::select! {
        phase = fut => Some(phase),
        _ = tokio::signal::ctrl_c() => {
            warn!(target: "naming::run", "interrupted");
            None
        }
    }
}

fn confirm(prompt: &str) -> Result<bool> {
    Ok(Confirm::new().with_prompt(prompt).default(true).interact()?)
}

fn print_plan(plan: &NamingPlan, caller: Address) {
    eprintln!(
        "Naming {} contracts under {} on {} as {caller}",
        plan.batches.iter().map(|b| b.real_entries().count()).sum::<usize>(),
        plan.ctx.root_parent.bold(),
        chain_display(plan.ctx.primary_chain),
    );
    for (i, step) in plan.steps.iter().enumerate() {
        eprintln!("  {} {}", format!("{}.", i + 1).dim(), step.title);
    }
}

/// Writes one batch file per chain. The chain id is appended to the file stem when there is
/// more than one.
fn write_safe_batches(path: &Path, batches: &BTreeMap<ChainId, SafeBatch>) -> Result<()> {
    for (&chain_id, batch) in batches {
        let out = if batches.len() > 1 { chain_path(path, chain_id) } else { path.to_path_buf() };
        batch.write(&out).wrap_err_with(|| format!("failed to write {}", out.display()))?;
        eprintln!("{}", batch_summary(batch, chain_id, &out));
    }
    Ok(())
}

fn batch_summary(batch: &SafeBatch, chain_id: ChainId, out: &Path) -> String {
    let mut summary = format!(
        "Wrote {} transactions for {} to {}",
        batch.transactions.len(),
        chain_display(chain_id),
        out.display()
    );
    let value = batch.total_value();
    if !value.is_zero() {
        summary.push_str(&format!(" ({} ETH attached)", format_ether(value)));
    }
    summary
}

fn chain_path(path: &Path, chain_id: ChainId) -> PathBuf {
    let stem = path.file_stem().map(|s| s.to_string_lossy()).unwrap_or_default();
    let name = match path.extension() {
        Some(ext) => format!("{stem}-{chain_id}.{}", ext.to_string_lossy()),
        None => format!("{stem}-{chain_id}"),
    };
    path.with_file_name(name)
}
