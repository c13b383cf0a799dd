//! The `naming` binary.

use std::process::ExitCode;

fn main() -> ExitCode {
    match naming::args::run() {
        Ok(code) => code,
        Err(err) => {
            eprintln!("Error: {err:?}");
            ExitCode::FAILURE
        }
    }
}
