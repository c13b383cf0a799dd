use alloy_chains::Chain;
use alloy_primitives::{Address, ChainId};
use enscribe::NamingRequest;
use eyre::{Result, WrapErr};
use std::str::FromStr;
use tracing_subscriber::{EnvFilter, prelude::*};

/// Initializes a tracing subscriber writing to stderr, filtered by `RUST_LOG`.
pub fn subscriber() {
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .with(EnvFilter::from_default_env())
        .init()
}

/// Disables terminal colors when `NO_COLOR` is set or stdout is not a terminal.
pub fn enable_paint() {
    let enable = yansi::Condition::os_support() && yansi::Condition::tty_and_color_live();
    yansi::whenever(yansi::Condition::cached(enable));
}

/// Parses a chain given by name (`sepolia`, `base`) or by id.
pub fn parse_chain(s: &str) -> Result<ChainId> {
    if let Ok(id) = s.parse::<u64>() {
        return Ok(id);
    }
    let chain = Chain::from_str(s).map_err(|_| eyre::eyre!("unknown chain `{s}`"))?;
    Ok(chain.id())
}

/// Parses an `<address>=<label>` entry.
pub fn parse_entry(s: &str) -> Result<NamingRequest> {
    let (address, label) =
        s.split_once('=').ok_or_else(|| eyre::eyre!("expected `<address>=<label>`, got `{s}`"))?;
    let address = Address::from_str(address.trim())
        .wrap_err_with(|| format!("invalid address `{}`", address.trim()))?;
    Ok(NamingRequest::new(address, label.trim()))
}

/// Formats a chain id with its name when known.
pub fn chain_display(chain_id: ChainId) -> String {
    let chain = Chain::from_id(chain_id);
    match chain.named() {
        Some(named) => format!("{named} ({chain_id})"),
        None => chain_id.to_string(),
    }
}
