//! # enscribe
//!
//! Batch ENS naming of smart contracts.
//!
//! A run turns a list of `(address, name)` requests into a dependency ordered list of on-chain
//! calls and executes them one at a time:
//!
//! 1. [`graph::build`] groups the requests into [`Batch`]es by depth and parent, inserting
//!    placeholders for missing intermediate names.
//! 2. [`OwnershipProbe`] classifies every contract on the primary and secondary networks.
//! 3. [`StepPlanner`] emits the ordered [`PlannedStep`]s: grant operator access, create each
//!    batch, set reverse records, revoke access.
//! 4. [`StepExecutor`] runs the steps against a [`Wallet`], switching networks through the
//!    [`ChainSwitcher`] and reporting a single [`ExecutionResult`].

#![cfg_attr(not(test), warn(unused_crate_dependencies))]

#[macro_use]
extern crate tracing;

pub mod abi;
pub mod config;
pub mod context;
pub mod ens;
pub mod executor;
pub mod graph;
pub mod import;
pub mod network;
pub mod planner;
pub mod probe;
pub mod request;
pub mod run;
pub mod safe;
pub mod step;
pub mod switch;
pub mod wallet;

pub use config::{ConfigError, NamingConfig};
pub use context::{ExecutionContext, NamingOptions, SignerMode};
pub use executor::{ExecutionResult, RunPhase, RunReporter, RunState, StepExecutor, TracingReporter};
pub use graph::{Batch, DomainNode, GraphError};
pub use import::{ImportError, parse_csv, read_csv};
pub use network::{Deployment, NetworkAdapter, NetworkFamily, NetworkRegistry, ReverseAuthority};
pub use planner::{PlanError, StepPlanner};
pub use probe::{Ownership, OwnershipProbe, ProbeReport};
pub use request::{NamingRequest, ValidationError, validate_requests};
pub use run::{NamingPlan, PrepareError};
pub use safe::SafeBatch;
pub use step::{PlannedStep, Step, StepError, StepKind, StepStatus};
pub use switch::{ChainSwitcher, SwitchError};
pub use wallet::{ChainReader, ContractCall, ReadError, Receipt, TxHandle, Wallet, WalletError};
