//! client-side (_initiator_) main loop and supporting structures
// (c) 2026 fxp authors

pub mod job;
pub use job::{JobSpec, Operation};

mod main_loop;
#[allow(clippy::module_name_repetitions)]
pub use main_loop::{client_main, run_job};

mod options;
pub use options::Parameters;

pub(crate) mod progress;
pub use progress::MAX_UPDATE_FPS;
