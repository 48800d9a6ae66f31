//! fxp: simple file exchange over TCP
//!
//! One process serves a directory; clients connect to upload (`put`), download (`get`) or list
//! (`list`) files, one operation per connection.
//!
//! ## Usage
//!
//! ```text
//! fxp --server -C /srv/files            # serve /srv/files on the default port (9000)
//! fxp files.example.com 9000 put report.pdf
//! fxp files.example.com 9000 get report.pdf ./copy.pdf
//! fxp files.example.com 9000 list
//! ```
//!
//! ## Protocol
//!
//! Every control message is a JSON document in a length-prefixed frame; file contents travel raw
//! after the handshake has authorised them. See [`protocol`] for the details.
//!
//! A server never overwrites an existing file: uploads are created exclusively, and a name that is
//! already taken is refused with `cannot overwrite remote file`.
//! An interrupted transfer never leaves a partial file behind on the receiving side.
//!
//! ## Configuration
//!
//! Options may be set on the command line, in the environment (`FXP_*`), or in `fxp.toml`
//! configuration files. Run `fxp --config-files` to see where these are looked for on your platform,
//! and `fxp --show-config` to see the result.
//!
//! ## Library use
//!
//! [`Server`] runs the responder side; [`run_job`] performs a single client operation.
// (c) 2026 fxp authors

pub(crate) mod cli;
pub use cli::cli;
pub use cli::styles;

pub(crate) mod client;
pub use client::{run_job, JobSpec, Operation, Parameters};

pub mod config;
pub use config::Configuration;

pub mod error;
pub mod protocol;

mod server;
pub use server::{server_main, Server};

pub(crate) mod session;
pub use session::{CommandStats, TransferRole, TransferSession};

pub mod util;
