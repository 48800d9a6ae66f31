//! General utility code that didn't fit anywhere else
// (c) 2026 fxp authors

pub(crate) mod io;
pub use io::{timeout_from_secs, DEFAULT_CHUNK_SIZE};

mod tracing;
pub use tracing::{
    is_initialized as tracing_is_initialised, setup as setup_tracing, trace_level,
    ConsoleTraceType, TimeFormat,
};

#[cfg(test)]
pub(crate) mod test_protocol;
