//! ENS name helpers on top of [`alloy_ens`].
//!
//! Names reaching [`namehash`] are already normalized to lower case by
//! [`normalize_name`](crate::request::normalize_name).

use alloy_primitives::{Address, B256, ChainId, U256};

pub use alloy_ens::{namehash, reverse_address};

/// SLIP-44 coin type of Ethereum mainnet.
pub const ETH_COIN_TYPE: u64 = 60;

/// Bit set on EVM chain ids to derive their ENSIP-11 coin type.
const EVM_COIN_TYPE_BIT: u64 = 0x8000_0000;

/// Returns the reverse node of an address, the namehash of `<hex>.addr.reverse`.
pub fn reverse_node(addr: Address) -> B256 {
    namehash(&reverse_address(&addr))
}

/// Returns the ENSIP-11 coin type for an EVM chain.
///
/// Only chain ids below `0x8000_0000` have one; `None` otherwise.
pub fn coin_type(chain_id: ChainId) -> Option<U256> {
    match chain_id {
        1 => Some(U256::from(ETH_COIN_TYPE)),
        id if id < EVM_COIN_TYPE_BIT => Some(U256::from(EVM_COIN_TYPE_BIT | id)),
        _ => None,
    }
}

/// Counts the labels of a dot separated name.
pub fn label_count(name: &str) -> usize {
    name.split('.').count()
}
