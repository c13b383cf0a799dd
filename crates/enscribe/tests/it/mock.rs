//! In-memory wallet and chain state.

use alloy_primitives::{Address, B256, Bytes, ChainId, address};
use alloy_sol_types::{SolCall, SolValue};
use async_trait::async_trait;
use enscribe::{
    ChainReader, ContractCall, ReadError, Receipt, TxHandle, Wallet, WalletError,
    abi::{EnsRegistry, NameWrapper, Ownable},
};
use std::{
    collections::{HashMap, HashSet, VecDeque},
    sync::{
        Mutex,
        atomic::{AtomicBool, AtomicUsize, Ordering},
    },
};

pub const SEPOLIA: ChainId = 11155111;
pub const BASE_SEPOLIA: ChainId = 84532;

pub const CALLER: Address = address!("0x00000000000000000000000000000000000000cc");
pub const ENSCRIBE: Address = address!("0x00000000000000000000000000000000000000ee");
pub const APP: Address = address!("0x0000000000000000000000000000000000000aaa");
pub const API: Address = address!("0x0000000000000000000000000000000000000bbb");

/// Scripted answer to the next submission.
#[derive(Clone, Debug)]
pub enum Reply {
    Reject,
    Fail(&'static str),
    /// Mined but reverted.
    Revert,
}

/// Wallet that switches instantly and mines every transaction.
pub struct ScriptedWallet {
    chain: Mutex<ChainId>,
    stuck: bool,
    replies: Mutex<VecDeque<Option<Reply>>>,
    reverted: Mutex<HashSet<B256>>,
    pub submitted: Mutex<Vec<(ChainId, ContractCall)>>,
    pub switches: Mutex<Vec<ChainId>>,
    pub confirmations: AtomicUsize,
}

impl ScriptedWallet {
    pub fn new(chain: ChainId) -> Self {
        Self {
            chain: Mutex::new(chain),
            stuck: false,
            replies: Default::default(),
            reverted: Default::default(),
            submitted: Default::default(),
            switches: Default::default(),
            confirmations: AtomicUsize::new(0),
        }
    }

    /// Queues replies for the next submissions; `None` submits normally.
    pub fn script(self, replies: impl IntoIterator<Item = Option<Reply>>) -> Self {
        self.replies.lock().unwrap().extend(replies);
        self
    }

    /// Records switch requests but never leaves the current chain.
    pub fn stuck(mut self) -> Self {
        self.stuck = true;
        self
    }

    pub fn submitted_chains(&self) -> Vec<ChainId> {
        self.submitted.lock().unwrap().iter().map(|(chain, _)| *chain).collect()
    }
}

#[async_trait]
impl Wallet for ScriptedWallet {
    fn address(&self) -> Address {
        CALLER
    }

    async fn submit_transaction(&self, call: &ContractCall) -> Result<TxHandle, WalletError> {
        let reply = self.replies.lock().unwrap().pop_front().flatten();
        match reply {
            Some(Reply::Reject) => return Err(WalletError::from_rpc(4001, "User rejected the request.")),
            Some(Reply::Fail(message)) => return Err(WalletError::Transport(message.to_string())),
            _ => {}
        }

        let chain_id = *self.chain.lock().unwrap();
        let mut submitted = self.submitted.lock().unwrap();
        submitted.push((chain_id, call.clone()));
        let hash = B256::with_last_byte(submitted.len() as u8);
        if matches!(reply, Some(Reply::Revert)) {
            self.reverted.lock().unwrap().insert(hash);
        }
        Ok(TxHandle::Hash { chain_id, hash })
    }

    async fn await_confirmation(&self, handle: &TxHandle) -> Result<Receipt, WalletError> {
        self.confirmations.fetch_add(1, Ordering::SeqCst);
        let hash = handle.hash().expect("queued handles are never awaited");
        Ok(Receipt {
            tx_hash: hash,
            block_number: Some(1),
            success: !self.reverted.lock().unwrap().contains(&hash),
        })
    }

    async fn active_chain(&self) -> Result<ChainId, WalletError> {
        Ok(*self.chain.lock().unwrap())
    }

    async fn request_chain_switch(&self, chain_id: ChainId) -> Result<(), WalletError> {
        self.switches.lock().unwrap().push(chain_id);
        if !self.stuck {
            *self.chain.lock().unwrap() = chain_id;
        }
        Ok(())
    }
}

/// Answers `owner()`, `isApprovedForAll` and `isWrapped`; every other read reverts.
#[derive(Default)]
pub struct ChainState {
    owners: Mutex<HashMap<(ChainId, Address), Address>>,
    pub approved: AtomicBool,
    pub reads: AtomicUsize,
}

impl ChainState {
    pub fn owned(self, chain_id: ChainId, contract: Address, owner: Address) -> Self {
        self.owners.lock().unwrap().insert((chain_id, contract), owner);
        self
    }

    pub fn set_approved(&self, approved: bool) {
        self.approved.store(approved, Ordering::SeqCst);
    }
}

#[async_trait]
impl ChainReader for ChainState {
    async fn read_contract_state(
        &self,
        chain_id: ChainId,
        to: Address,
        data: Bytes,
    ) -> Result<Bytes, ReadError> {
        self.reads.fetch_add(1, Ordering::SeqCst);
        let revert = || ReadError::Reverted("execution reverted".into());
        let selector: [u8; 4] = data.get(..4).and_then(|s| s.try_into().ok()).ok_or_else(revert)?;

        if selector == Ownable::ownerCall::SELECTOR {
            let owner = self.owners.lock().unwrap().get(&(chain_id, to)).copied().ok_or_else(revert)?;
            Ok(owner.abi_encode().into())
        } else if selector == EnsRegistry::isApprovedForAllCall::SELECTOR {
            Ok(self.approved.load(Ordering::SeqCst).abi_encode().into())
        } else if selector == NameWrapper::isWrappedCall::SELECTOR {
            Ok(false.abi_encode().into())
        } else {
            Err(revert())
        }
    }
}
