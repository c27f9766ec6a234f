//! Task/mission orchestration core for automating long-running interactive
//! sessions against a live, imperfectly observable application.
//!
//! The crate provides the scheduling unit ([`task::Task`]), the
//! cooperatively-polled work unit ([`mission::Mission`]), stop-rule
//! predicates ([`stop_rule::StopRule`]), a typed fault taxonomy carrying
//! failure-scope metadata ([`error::Fault`]), and best-effort diagnostic
//! capture ([`snapshot::SnapshotWriter`]). Sensing, actuation and UI
//! navigation are collaborator traits injected at construction; the
//! game-specific scripts built on top of them live downstream.

pub mod config;
pub mod error;
pub mod interaction;
pub mod mission;
pub mod orchestrator;
pub mod sim;
pub mod snapshot;
pub mod stop_rule;
pub mod task;

pub use config::AutoquestConfig;
pub use error::{AutoquestError, Fault, Result, StopScope};
pub use interaction::{Actuator, Interactor, Sensor, UiControl};
pub use mission::{Mission, MissionContext, MissionOutcome};
pub use orchestrator::Orchestrator;
pub use snapshot::SnapshotWriter;
pub use stop_rule::{Observation, StopRule};
pub use task::{StopSignal, Task, TaskStatus};
