//! fxp utility - main entrypoint
// (c) 2026 fxp authors

use std::process::ExitCode;

fn main() -> ExitCode {
    fxp::cli(std::env::args_os())
}
