//! The top-level scheduling unit and its worker plumbing.
//!
//! A task owns missions, runs them on subordinate workers or inline, holds
//! the shared stop signal, applies the local-fault retry policy, and is the
//! only boundary that interprets a fault's containment scope.

mod signal;
mod status;
#[allow(clippy::module_inception)]
mod task;

pub use signal::StopSignal;
pub use status::TaskStatus;
pub use task::{MissionReport, SubordinateId, Task};
