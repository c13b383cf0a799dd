//! Signer and chain read boundaries.
//!
//! The core never talks to a node directly: transactions go through a [`Wallet`] and read-only
//! queries through a [`ChainReader`].

use alloy_primitives::{Address, B256, Bytes, ChainId, U256};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt;

/// EIP-1193 error code for a request the user rejected.
pub const USER_REJECTED_CODE: i64 = 4001;

/// A single encoded contract call.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContractCall {
    pub to: Address,
    pub data: Bytes,
    #[serde(default)]
    pub value: U256,
}

impl ContractCall {
    pub fn new(to: Address, data: impl Into<Bytes>) -> Self {
        Self { to, data: data.into(), value: U256::ZERO }
    }
}

/// Handle to a submitted transaction.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum TxHandle {
    /// A transaction broadcast on `chain_id`.
    Hash { chain_id: ChainId, hash: B256 },
    /// Queued in an external multi-sig batch, not individually awaited.
    Queued,
}

impl TxHandle {
    pub fn hash(&self) -> Option<B256> {
        match self {
            Self::Hash { hash, .. } => Some(*hash),
            Self::Queued => None,
        }
    }

    pub fn is_queued(&self) -> bool {
        matches!(self, Self::Queued)
    }
}

impl fmt::Display for TxHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Hash { hash, .. } => write!(f, "{hash}"),
            Self::Queued => f.write_str("safe-queued"),
        }
    }
}

/// Outcome of a mined transaction.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Receipt {
    pub tx_hash: B256,
    pub block_number: Option<u64>,
    pub success: bool,
}

/// Errors surfaced by a [`Wallet`].
#[derive(Debug, thiserror::Error)]
pub enum WalletError {
    #[error("user rejected the request")]
    Rejected,
    #[error("no provider configured for chain {0}")]
    UnknownChain(ChainId),
    #[error("timed out waiting for transaction {0}")]
    ConfirmationTimeout(B256),
    #[error("rpc error {code}: {message}")]
    Rpc { code: i64, message: String },
    #[error("{0}")]
    Transport(String),
}

impl WalletError {
    /// Builds an error from a JSON-RPC error payload, classifying user rejections.
    pub fn from_rpc(code: i64, message: impl Into<String>) -> Self {
        let message = message.into();
        if code == USER_REJECTED_CODE || is_rejection_message(&message) {
            Self::Rejected
        } else {
            Self::Rpc { code, message }
        }
    }

    /// Whether the user declined the request, as opposed to a failure.
    pub fn is_user_rejection(&self) -> bool {
        match self {
            Self::Rejected => true,
            Self::Rpc { code, message } => {
                *code == USER_REJECTED_CODE || is_rejection_message(message)
            }
            Self::Transport(message) => is_rejection_message(message),
            _ => false,
        }
    }
}

fn is_rejection_message(message: &str) -> bool {
    let message = message.to_lowercase();
    message.contains("user rejected") || message.contains("user denied")
}

/// The signer and its active network.
///
/// Implementations are process wide resources: one run uses a wallet exclusively.
#[async_trait]
pub trait Wallet: Send + Sync {
    /// Address that signs every call.
    fn address(&self) -> Address;

    /// Submits a call on the active network.
    async fn submit_transaction(&self, call: &ContractCall) -> Result<TxHandle, WalletError>;

    /// Waits until the transaction behind `handle` is mined.
    async fn await_confirmation(&self, handle: &TxHandle) -> Result<Receipt, WalletError>;

    /// Returns the currently active network.
    async fn active_chain(&self) -> Result<ChainId, WalletError>;

    /// Asks the wallet to change its active network. Completion is not implied.
    async fn request_chain_switch(&self, chain_id: ChainId) -> Result<(), WalletError>;
}

/// Read failures. Probes treat these as negative answers.
#[derive(Debug, thiserror::Error)]
pub enum ReadError {
    #[error("no provider configured for chain {0}")]
    UnknownChain(ChainId),
    #[error("call reverted: {0}")]
    Reverted(String),
    #[error("could not decode return data: {0}")]
    Decode(#[from] alloy_sol_types::Error),
    #[error("{0}")]
    Transport(String),
}

/// Side-effect free contract reads.
#[async_trait]
pub trait ChainReader: Send + Sync {
    /// Executes `data` against `to` on `chain_id` and returns the raw return data.
    async fn read_contract_state(
        &self,
        chain_id: ChainId,
        to: Address,
        data: Bytes,
    ) -> Result<Bytes, ReadError>;
}

/// Typed reads over a [`ChainReader`].
pub(crate) async fn read_call<C: alloy_sol_types::SolCall>(
    reader: &dyn ChainReader,
    chain_id: ChainId,
    to: Address,
    call: C,
) -> Result<C::Return, ReadError> {
    let data = reader.read_contract_state(chain_id, to, call.abi_encode().into()).await?;
    Ok(C::abi_decode_returns(&data)?)
}
