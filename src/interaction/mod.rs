//! Collaborator seams between the orchestration core and the live
//! environment.
//!
//! The core never talks to a screen or an input device directly; missions
//! borrow these trait objects for the duration of a call. Backends are
//! injected at construction by the orchestrator, and failures cross the
//! mission boundary only as [`Fault`](crate::error::Fault)s, never as raw
//! sensing or actuation errors.

mod types;

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use thiserror::Error;

pub use types::{Frame, Interval, PageId, Point, Region};

/// A sensing failure. Recoverable by contract; missions translate these into
/// mission-scoped faults via [`Fault::from_sense`](crate::error::Fault::from_sense).
#[derive(Debug, Error)]
pub enum SenseError {
    #[error("frame capture timed out after {0:?}")]
    Timeout(Duration),

    #[error("template `{0}` not found")]
    NoMatch(String),

    #[error("frame decode failed: {0}")]
    Decode(String),
}

/// An actuation failure. Actuation is assumed synchronous and non-failing;
/// an error here is environment-fatal and surfaces as a task-scoped fault.
#[derive(Debug, Error)]
pub enum ActError {
    #[error("actuation backend failure: {0}")]
    Backend(String),
}

/// Observes the environment: frame capture, text recognition, template
/// matching.
#[async_trait]
pub trait Sensor: Send + Sync {
    /// Capture the current frame, optionally restricted to a region.
    async fn capture_frame(&self, region: Option<Region>) -> Result<Frame, SenseError>;

    /// Recognize text lines in a frame.
    async fn recognize_text(&self, frame: &Frame) -> Result<Vec<String>, SenseError>;

    /// Locate every occurrence of a named template in a frame.
    async fn find_template(&self, frame: &Frame, template: &str) -> Result<Vec<Point>, SenseError>;
}

/// Drives the environment: pointer movement, button state, timed delays.
#[async_trait]
pub trait Actuator: Send + Sync {
    async fn move_to(&self, point: Point) -> Result<(), ActError>;

    async fn press(&self) -> Result<(), ActError>;

    async fn release(&self) -> Result<(), ActError>;

    async fn click(&self, point: Point) -> Result<(), ActError>;

    async fn delay(&self, interval: Interval) -> Result<(), ActError>;
}

/// Confirms and restores UI-page preconditions before step execution.
/// The core retains no page state of its own.
#[async_trait]
pub trait UiControl: Send + Sync {
    async fn verify_page(&self, page: &PageId) -> Result<bool, SenseError>;

    async fn ensure_page(&self, page: &PageId) -> Result<(), SenseError>;
}

/// Cloneable bundle of the three collaborator handles injected into every
/// mission context.
///
/// Each mission is driven by exactly one worker, so the bundle itself needs
/// no locking. Backends shared by fully concurrent missions must serialize
/// access internally or be wrapped by the owning task.
#[derive(Clone)]
pub struct Interactor {
    pub sensor: Arc<dyn Sensor>,
    pub actuator: Arc<dyn Actuator>,
    pub ui: Arc<dyn UiControl>,
}

impl Interactor {
    pub fn new(
        sensor: Arc<dyn Sensor>,
        actuator: Arc<dyn Actuator>,
        ui: Arc<dyn UiControl>,
    ) -> Self {
        Self {
            sensor,
            actuator,
            ui,
        }
    }
}
