//! Active network switching.
//!
//! A switch request only asks the wallet to move; [`ChainSwitcher`] then polls the active network
//! until it matches or the attempts run out.

use crate::wallet::{Wallet, WalletError};
use alloy_primitives::ChainId;
use std::time::Duration;

/// Default delay between two active network polls.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(500);

/// Default number of polls before a switch is considered failed.
pub const DEFAULT_MAX_ATTEMPTS: u32 = 20;

/// Failure to bring the wallet onto a network.
#[derive(Debug, thiserror::Error)]
pub enum SwitchError {
    #[error("wallet did not switch to chain {target} after {attempts} attempts (still on {current})")]
    Timeout { target: ChainId, current: ChainId, attempts: u32 },
    #[error(transparent)]
    Wallet(#[from] WalletError),
}

impl SwitchError {
    pub fn is_user_rejection(&self) -> bool {
        matches!(self, Self::Wallet(err) if err.is_user_rejection())
    }
}

/// Requests an active network change and confirms it took effect.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ChainSwitcher {
    pub poll_interval: Duration,
    pub max_attempts: u32,
}

impl Default for ChainSwitcher {
    fn default() -> Self {
        Self { poll_interval: DEFAULT_POLL_INTERVAL, max_attempts: DEFAULT_MAX_ATTEMPTS }
    }
}

impl ChainSwitcher {
    pub fn new(poll_interval: Duration, max_attempts: u32) -> Self {
        Self { poll_interval, max_attempts }
    }

    /// Makes `target` the wallet's active network.
    ///
    /// Returns immediately when it already is; otherwise requests a switch and polls until the
    /// wallet reports `target` or the attempts are exhausted.
    pub async fn ensure_chain(
        &self,
        wallet: &dyn Wallet,
        target: ChainId,
    ) -> Result<(), SwitchError> {
        let mut current = wallet.active_chain().await?;
        if current == target {
            return Ok(());
        }

        debug!(target: "enscribe::switch", from = current, to = target, "requesting network switch");
        wallet.request_chain_switch(target).await?;

        for attempt in 1..=self.max_attempts {
            current = wallet.active_chain().await?;
            if current == target {
                trace!(target: "enscribe::switch", attempt, chain_id = target, "network switched");
                return Ok(());
            }
            if attempt < self.max_attempts {
                tokio::time::sleep(self.poll_interval).await;
            }
        }

        warn!(target: "enscribe::switch", to = target, current, "network switch timed out");
        Err(SwitchError::Timeout { target, current, attempts: self.max_attempts })
    }
}
