//! JSON-RPC backed wallet and reader.
//!
//! One HTTP provider is kept per configured chain. Switching networks only selects another
//! provider, so a switch completes as soon as it is requested.

use alloy_network::{EthereumWallet, ReceiptResponse, TransactionBuilder};
use alloy_primitives::{Address, B256, Bytes, ChainId};
use alloy_provider::{
    DynProvider, PendingTransactionBuilder, PendingTransactionError, Provider, ProviderBuilder,
    WatchTxError,
};
use alloy_rpc_types::TransactionRequest;
use alloy_signer_local::PrivateKeySigner;
use alloy_transport::TransportError;
use async_trait::async_trait;
use enscribe::{
    ChainReader, ContractCall, Deployment, ReadError, Receipt, TxHandle, Wallet, WalletError,
};
use eyre::{Result, WrapErr};
use parking_lot::RwLock;
use std::{collections::BTreeMap, time::Duration};
use url::Url;

pub struct RpcWallet {
    providers: BTreeMap<ChainId, DynProvider>,
    sender: Option<Address>,
    active: RwLock<ChainId>,
    confirmation_timeout: Duration,
}

impl RpcWallet {
    /// Connects to every deployment with an RPC URL and checks the chain id each endpoint reports.
    ///
    /// Without a signer the wallet can only read; submissions fail.
    pub async fn connect(
        deployments: &[Deployment],
        signer: Option<PrivateKeySigner>,
        primary_chain: ChainId,
        confirmation_timeout: Duration,
    ) -> Result<Self> {
        let mut providers = BTreeMap::new();
        for deployment in deployments {
            let Some(rpc_url) = &deployment.rpc_url else { continue };
            let url = Url::parse(rpc_url).wrap_err_with(|| format!("invalid RPC URL `{rpc_url}`"))?;
            let provider = match &signer {
                Some(signer) => ProviderBuilder::new()
                    .wallet(EthereumWallet::from(signer.clone()))
                    .connect_http(url)
                    .erased(),
                None => ProviderBuilder::new().connect_http(url).erased(),
            };

            let remote = provider
                .get_chain_id()
                .await
                .wrap_err_with(|| format!("failed to query chain id from {rpc_url}"))?;
            if remote != deployment.chain_id {
                eyre::bail!(
                    "RPC endpoint {rpc_url} serves chain {remote}, but is configured for chain {}",
                    deployment.chain_id
                );
            }
            debug!(target: "naming::rpc", chain_id = remote, %rpc_url, "connected");
            providers.insert(deployment.chain_id, provider);
        }

        if !providers.contains_key(&primary_chain) {
            eyre::bail!("no RPC URL configured for the primary chain {primary_chain}");
        }

        Ok(Self {
            providers,
            sender: signer.map(|signer| signer.address()),
            active: RwLock::new(primary_chain),
            confirmation_timeout,
        })
    }

    fn provider(&self, chain_id: ChainId) -> Result<&DynProvider, WalletError> {
        self.providers.get(&chain_id).ok_or(WalletError::UnknownChain(chain_id))
    }
}

#[async_trait]
impl Wallet for RpcWallet {
    fn address(&self) -> Address {
        self.sender.unwrap_or_default()
    }

    async fn submit_transaction(&self, call: &ContractCall) -> Result<TxHandle, WalletError> {
        let from = self.sender.ok_or_else(|| WalletError::Transport("no signer configured".into()))?;
        let chain_id = *self.active.read();
        let provider = self.provider(chain_id)?;

        let tx = TransactionRequest::default()
            .with_from(from)
            .with_to(call.to)
            .with_input(call.data.clone())
            .with_value(call.value);
        let pending = provider.send_transaction(tx).await.map_err(wallet_error)?;
        let hash = *pending.tx_hash();
        trace!(target: "naming::rpc", chain_id, %hash, "sent transaction");
        Ok(TxHandle::Hash { chain_id, hash })
    }

    async fn await_confirmation(&self, handle: &TxHandle) -> Result<Receipt, WalletError> {
        let TxHandle::Hash { chain_id, hash } = *handle else {
            return Err(WalletError::Transport("queued transactions cannot be awaited".into()));
        };
        let provider = self.provider(chain_id)?;
        let receipt = PendingTransactionBuilder::new(provider.root().clone(), hash)
            .with_timeout(Some(self.confirmation_timeout))
            .get_receipt()
            .await
            .map_err(|err| confirmation_error(hash, err))?;
        Ok(Receipt { tx_hash: hash, block_number: receipt.block_number(), success: receipt.status() })
    }

    async fn active_chain(&self) -> Result<ChainId, WalletError> {
        Ok(*self.active.read())
    }

    async fn request_chain_switch(&self, chain_id: ChainId) -> Result<(), WalletError> {
        self.provider(chain_id)?;
        *self.active.write() = chain_id;
        Ok(())
    }
}

#[async_trait]
impl ChainReader for RpcWallet {
    async fn read_contract_state(
        &self,
        chain_id: ChainId,
        to: Address,
        data: Bytes,
    ) -> Result<Bytes, ReadError> {
        let provider = self.providers.get(&chain_id).ok_or(ReadError::UnknownChain(chain_id))?;
        let tx = TransactionRequest::default().with_to(to).with_input(data);
        provider.call(tx).await.map_err(|err| match err.as_error_resp() {
            Some(payload) => ReadError::Reverted(payload.message.to_string()),
            None => ReadError::Transport(err.to_string()),
        })
    }
}

/// Classifies a transport error, recognizing user rejections by their EIP-1193 code.
fn wallet_error(err: TransportError) -> WalletError {
    match err.as_error_resp() {
        Some(payload) => WalletError::from_rpc(payload.code, payload.message.to_string()),
        None => WalletError::Transport(err.to_string()),
    }
}

/// A receipt that did not arrive in time is a [`WalletError::ConfirmationTimeout`].
fn confirmation_error(hash: B256, err: PendingTransactionError) -> WalletError {
    match err {
        PendingTransactionError::TxWatcher(WatchTxError::Timeout) => {
            WalletError::ConfirmationTimeout(hash)
        }
        PendingTransactionError::TransportError(err) => wallet_error(err),
        err => WalletError::Transport(err.to_string()),
    }
}
