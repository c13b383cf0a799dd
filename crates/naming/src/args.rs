use crate::{
    handler,
    opts::{Naming, NamingSubcommand},
    utils,
};
use clap::Parser;
use enscribe::ExecutionResult;
use eyre::Result;
use std::process::ExitCode;

/// Run the `naming` command-line interface.
pub fn run() -> Result<ExitCode> {
    setup();

    let args = Naming::parse();
    let runtime = tokio::runtime::Builder::new_multi_thread().enable_all().build()?;
    runtime.block_on(run_command(args))
}

/// Setup the error hooks, the global logger and terminal colors.
pub fn setup() {
    handler::install();
    utils::subscriber();
    utils::enable_paint();
}

/// Run the subcommand.
pub async fn run_command(args: Naming) -> Result<ExitCode> {
    match args.cmd {
        NamingSubcommand::Plan(cmd) => {
            cmd.run()?;
            Ok(ExitCode::SUCCESS)
        }
        NamingSubcommand::Run(cmd) => {
            let result = cmd.run().await?;
            println!("{result}");
            Ok(match result {
                ExecutionResult::Error(_) => ExitCode::FAILURE,
                _ => ExitCode::SUCCESS,
            })
        }
    }
}
