use crate::{
    cmd::{plan::PlanArgs, run::RunArgs},
    utils::{parse_chain, parse_entry},
};
use alloy_primitives::ChainId;
use clap::{Parser, Subcommand};
use enscribe::{NamingConfig, NamingOptions, NamingRequest, read_csv};
use eyre::Result;
use figment::{
    Metadata, Profile, Provider,
    providers::Serialized,
    value::{Dict, Map},
};
use serde::Serialize;
use std::path::PathBuf;

/// Name smart contracts with ENS, in batches.
#[derive(Parser)]
#[command(name = "naming", version, next_display_order = None)]
pub struct Naming {
    #[command(subcommand)]
    pub cmd: NamingSubcommand,
}

#[derive(Subcommand)]
pub enum NamingSubcommand {
    /// Show how the names would be grouped and created, without touching the chain.
    Plan(PlanArgs),

    /// Create the names and set their records.
    Run(RunArgs),
}

/// The names to create.
#[derive(Clone, Debug, Default, Parser)]
pub struct EntryOpts {
    /// Parent name the subnames are created under, e.g. `myapp.eth`.
    #[arg(long, short, value_name = "NAME")]
    pub parent: String,

    /// A contract and its label, as `<ADDRESS>=<LABEL>`. The label is either bare (`api`) or a
    /// full name under the parent (`api.v2.myapp.eth`).
    #[arg(long = "entry", short, value_name = "ADDRESS=LABEL", value_parser = parse_entry)]
    pub entries: Vec<NamingRequest>,

    /// CSV file with one `address,label` pair per line.
    #[arg(long, value_name = "FILE")]
    pub csv: Option<PathBuf>,
}

impl EntryOpts {
    /// Entries from the command line followed by the CSV entries.
    pub fn requests(&self) -> Result<Vec<NamingRequest>> {
        let mut requests = self.entries.clone();
        if let Some(csv) = &self.csv {
            requests.extend(read_csv(csv)?);
        }
        Ok(requests)
    }
}

/// Network selection. Also merged into the config as its topmost layer.
#[derive(Clone, Debug, Default, Serialize, Parser)]
pub struct NetworkOpts {
    /// Chain the names live on, by name or id.
    #[arg(long, short, value_name = "CHAIN", value_parser = parse_chain)]
    #[serde(rename = "primary_chain", skip_serializing_if = "Option::is_none")]
    pub chain: Option<ChainId>,

    /// RPC endpoint of the primary chain.
    #[arg(long, short, value_name = "URL", env = "ETH_RPC_URL")]
    #[serde(skip)]
    pub rpc_url: Option<String>,

    /// Additional chains to set primary names on. Repeat or separate with commas.
    #[arg(long = "secondary", value_name = "CHAIN", value_parser = parse_chain, value_delimiter = ',')]
    #[serde(skip)]
    pub secondary: Vec<ChainId>,

    /// Do not set primary names on the primary chain.
    #[arg(long)]
    #[serde(skip)]
    pub skip_primary: bool,

    /// Revoke the operator approval at the end even if it was granted before this run.
    #[arg(long)]
    #[serde(rename = "revoke_preexisting_access", skip_serializing_if = "std::ops::Not::not")]
    pub revoke_existing: bool,
}

impl NetworkOpts {
    /// Loads the config with these options on top.
    pub fn load_config(&self) -> Result<NamingConfig> {
        let mut config = NamingConfig::from_provider(NamingConfig::figment().merge(self.clone()))?;
        if let Some(rpc_url) = &self.rpc_url {
            config.set_rpc_url(config.primary_chain, rpc_url.clone());
        }
        trace!(target: "naming", ?config, "loaded config");
        Ok(config)
    }

    pub fn options(&self, config: &NamingConfig) -> NamingOptions {
        NamingOptions {
            skip_primary_naming: self.skip_primary,
            secondary_networks: self.secondary.clone(),
            revoke_preexisting_access: config.revoke_preexisting_access,
        }
    }
}

impl Provider for NetworkOpts {
    fn metadata(&self) -> Metadata {
        Metadata::named("command line arguments")
    }

    fn data(&self) -> Result<Map<Profile, Dict>, figment::Error> {
        Serialized::defaults(self).data()
    }
}
