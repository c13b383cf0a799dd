use crate::opts::EntryOpts;
use clap::Parser;
use enscribe::{Batch, graph, validate_requests};
use eyre::Result;
use std::fmt::Write;
use yansi::Paint;

/// CLI arguments for `naming plan`.
#[derive(Clone, Debug, Parser)]
pub struct PlanArgs {
    #[command(flatten)]
    pub entries: EntryOpts,

    /// Print the batches as JSON.
    #[arg(long)]
    pub json: bool,
}

impl PlanArgs {
    pub fn run(self) -> Result<()> {
        let requests = self.entries.requests()?;
        let parent = self.entries.parent.trim().to_ascii_lowercase();
        validate_requests(&requests, &parent)?;
        let batches = graph::build(&requests, &parent)?;

        if self.json {
            println!("{}", serde_json::to_string_pretty(&batches)?);
        } else {
            print!("{}", render_batches(&parent, &batches));
        }
        Ok(())
    }
}

/// One section per batch, in creation order.
pub fn render_batches(parent: &str, batches: &[Batch]) -> String {
    let mut out = String::new();
    let names: usize = batches.iter().map(|b| b.entries.len()).sum();
    let _ = writeln!(out, "{} names under {} in {} batches", names, parent.bold(), batches.len());
    for (i, batch) in batches.iter().enumerate() {
        let _ = writeln!(
            out,
            "\n{} level {} under {}",
            format!("#{}", i + 1).cyan(),
            batch.level,
            batch.immediate_parent.bold()
        );
        for node in &batch.entries {
            if node.is_placeholder() {
                let _ = writeln!(out, "  {} {}", node.full_name, "(placeholder)".dim());
            } else {
                let _ = writeln!(out, "  {} -> {}", node.full_name, node.address());
            }
        }
    }
    out
}
