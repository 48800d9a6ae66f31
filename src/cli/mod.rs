//! Command Line Interface for fxp
// (c) 2026 fxp authors
mod args;
mod cli_main;
pub mod styles;
pub use cli_main::cli;
