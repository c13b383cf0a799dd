//! Safe Transaction Builder batch export.
//!
//! With [`SignerMode::Batched`](crate::SignerMode::Batched) the planned calls are not signed one
//! by one but written out as a batch file that the Safe Transaction Builder app imports.

use crate::step::PlannedStep;
use alloy_primitives::{Address, Bytes, ChainId, U256};
use serde::{Deserialize, Serialize};
use std::{
    collections::{BTreeMap, BTreeSet},
    io,
    path::Path,
    time::{SystemTime, UNIX_EPOCH},
};

pub const SAFE_BATCH_VERSION: &str = "1.0";

/// One Transaction Builder batch, bound to a single chain.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SafeBatch {
    pub version: String,
    /// Decimal chain id, as a string.
    pub chain_id: String,
    /// Milliseconds since the unix epoch.
    pub created_at: u64,
    pub meta: SafeBatchMeta,
    pub transactions: Vec<SafeTransaction>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SafeBatchMeta {
    pub name: String,
    pub description: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_from_safe_address: Option<Address>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SafeTransaction {
    pub to: Address,
    /// Wei, as a decimal string.
    pub value: String,
    pub data: Bytes,
}

impl SafeBatch {
    /// Builds the batch of every step of `steps` that targets `chain_id`, in plan order.
    pub fn new(chain_id: ChainId, steps: &[PlannedStep], safe: Option<Address>) -> Self {
        let transactions = steps
            .iter()
            .filter(|step| step.chain_id == chain_id)
            .map(|step| SafeTransaction {
                to: step.call.to,
                value: step.call.value.to_string(),
                data: step.call.data.clone(),
            })
            .collect::<Vec<_>>();
        let description = steps
            .iter()
            .filter(|step| step.chain_id == chain_id)
            .map(|step| step.title.as_str())
            .collect::<Vec<_>>()
            .join("; ");
        Self {
            version: SAFE_BATCH_VERSION.to_string(),
            chain_id: chain_id.to_string(),
            created_at: now_millis(),
            meta: SafeBatchMeta {
                name: "Enscribe naming batch".to_string(),
                description,
                created_from_safe_address: safe,
            },
            transactions,
        }
    }

    /// Splits a plan into one batch per chain.
    pub fn per_chain(steps: &[PlannedStep], safe: Option<Address>) -> BTreeMap<ChainId, Self> {
        let chains = steps.iter().map(|step| step.chain_id).collect::<BTreeSet<_>>();
        chains.into_iter().map(|chain_id| (chain_id, Self::new(chain_id, steps, safe))).collect()
    }

    /// Total value carried by the batch.
    pub fn total_value(&self) -> U256 {
        self.transactions
            .iter()
            .filter_map(|tx| tx.value.parse::<U256>().ok())
            .fold(U256::ZERO, |acc, v| acc + v)
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }

    pub fn write(&self, path: &Path) -> io::Result<()> {
        let json = self.to_json().map_err(io::Error::other)?;
        std::fs::write(path, json)
    }
}

fn now_millis() -> u64 {
    SystemTime::now().duration_since(UNIX_EPOCH).map(|d| d.as_millis() as u64).unwrap_or_default()
}
