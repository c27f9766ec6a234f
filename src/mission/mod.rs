//! Cooperatively-cancellable units of repeated interaction steps.
//!
//! A mission drives a named, possibly long sequence of steps toward a goal.
//! Every polling loop inside a mission evaluates [`MissionContext::checkup`]
//! at least once per iteration and returns promptly when it fires; every
//! blocking sub-operation internally polls the same check instead of waiting
//! unconditionally. That is what makes cancellation cooperative rather than
//! requiring forced interruption.

mod context;

use async_trait::async_trait;

pub use context::{MissionContext, PollBudget, PollOutcome, ReadyBeacon};

use crate::error::Fault;

/// How a mission run ended without a fault.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MissionOutcome {
    /// The mission reached its goal.
    Completed,
    /// The mission observed a stop request and returned early. Not a
    /// failure; no actuation happens after the check that fired.
    Stopped,
}

/// A unit of work owned and driven by exactly one task worker.
///
/// Missions borrow their collaborators from the context for the duration of
/// a call and never swallow a fault silently: a step either resolves within
/// its bounded retry or the fault is raised to the owning task, which is the
/// only layer allowed to turn a local fault into a retry decision.
#[async_trait]
pub trait Mission: Send {
    fn name(&self) -> &str;

    async fn run(&mut self, ctx: &MissionContext) -> Result<MissionOutcome, Fault>;
}
