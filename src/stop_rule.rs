//! Stop-rule predicates evaluated at polling-loop boundaries.
//!
//! A rule is a pure function of the current observation plus its own
//! parameters: evaluating it twice against the same observation yields the
//! same answer, and an evaluation never blocks. The surrounding loop supplies
//! the delay between evaluations, and rules are only consulted between
//! discrete interaction steps, so a step is atomic with respect to
//! cancellation.

use crate::interaction::Point;
use crate::task::StopSignal;

/// Observable state a polling loop tracks for its stop rule. Missions own
/// the tracking (e.g. the position derived from their own movement steps);
/// the rule only reads it.
#[derive(Debug, Clone, Copy, Default)]
pub struct Observation {
    pub position: Option<Point>,
}

impl Observation {
    pub fn at(position: Point) -> Self {
        Self {
            position: Some(position),
        }
    }
}

/// Decides when a polling loop terminates. `true` means stop.
#[derive(Clone)]
pub enum StopRule {
    /// Never stops on its own; the loop runs until externally cancelled or
    /// its poll budget is exhausted.
    Never,

    /// Stops once the tracked position is within `tolerance` of `target`.
    Arrival { target: Point, tolerance: f64 },

    /// Wraps an injected shutdown check so any loop can react to external
    /// stop requests without bespoke wiring.
    Flag(StopSignal),
}

impl StopRule {
    pub fn arrival(target: Point, tolerance: f64) -> Self {
        Self::Arrival { target, tolerance }
    }

    /// Single bounded check; never blocks.
    pub fn evaluate(&self, observation: &Observation) -> bool {
        match self {
            Self::Never => false,
            Self::Arrival { target, tolerance } => observation
                .position
                .is_some_and(|position| position.distance(*target) <= *tolerance),
            Self::Flag(signal) => signal.is_triggered(),
        }
    }
}

impl std::fmt::Debug for StopRule {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Never => write!(f, "Never"),
            Self::Arrival { target, tolerance } => {
                write!(f, "Arrival(target={target}, tolerance={tolerance})")
            }
            Self::Flag(signal) => write!(f, "Flag(triggered={})", signal.is_triggered()),
        }
    }
}
