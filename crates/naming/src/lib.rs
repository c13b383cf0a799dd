//! # naming
//!
//! Command line interface of [`enscribe`]: plans and sends the transactions that give a list
//! of contracts their ENS names.

#![cfg_attr(not(test), warn(unused_crate_dependencies))]

#[macro_use]
extern crate tracing;

pub mod args;
pub mod cmd;
pub mod handler;
pub mod opts;
pub mod progress;
pub mod rpc;
pub mod utils;
