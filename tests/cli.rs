//! CLI based tests
// (c) 2026 fxp authors

use std::process::ExitCode;

use fxp::cli;

#[test]
fn show_config_files() {
    assert_eq!(cli(["fxp", "--config-files"]), ExitCode::SUCCESS);
}

#[test]
fn bad_option() {
    assert_eq!(
        cli(["fxp", "--this-ridiculous-option-does-not-exist"]),
        ExitCode::FAILURE
    );
}

#[test]
fn client_needs_a_job() {
    assert_eq!(cli(["fxp"]), ExitCode::FAILURE);
    assert_eq!(cli(["fxp", "localhost", "9000"]), ExitCode::FAILURE);
}

#[test]
fn put_needs_a_filename() {
    assert_eq!(cli(["fxp", "localhost", "9000", "put"]), ExitCode::FAILURE);
}
