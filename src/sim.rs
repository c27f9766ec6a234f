//! Deterministic in-memory environment for exercising the orchestration
//! core without a live application.
//!
//! `SimWorld` answers every collaborator call from scripted state and counts
//! what was asked of it; `PatrolMission` walks a tracked position toward a
//! target under an arrival rule. Together they back the `patrol` demo task
//! and the integration tests.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::Mutex;
use tracing::debug;

use crate::error::Fault;
use crate::interaction::{
    ActError, Actuator, Frame, Interactor, Interval, PageId, Point, Region, SenseError, Sensor,
    UiControl,
};
use crate::mission::{Mission, MissionContext, MissionOutcome};
use crate::stop_rule::{Observation, StopRule};

#[derive(Debug, Default)]
struct SimState {
    pointer: Option<Point>,
    current_page: Option<PageId>,
    scripted_text: Vec<String>,
    scripted_templates: HashMap<String, Vec<Point>>,
    moves: u32,
    clicks: u32,
    presses: u32,
    frames_captured: u32,
}

/// Scripted stand-in for the sensing, actuation and UI-state collaborators.
pub struct SimWorld {
    state: Mutex<SimState>,
}

impl SimWorld {
    pub fn shared() -> Arc<Self> {
        Arc::new(Self {
            state: Mutex::new(SimState::default()),
        })
    }

    /// Bundle this world into the three collaborator handles.
    pub fn interactor(self: &Arc<Self>) -> Interactor {
        Interactor::new(self.clone(), self.clone(), self.clone())
    }

    pub fn set_page(&self, page: PageId) {
        self.state.lock().current_page = Some(page);
    }

    pub fn set_scripted_text(&self, lines: Vec<String>) {
        self.state.lock().scripted_text = lines;
    }

    pub fn set_template(&self, name: impl Into<String>, positions: Vec<Point>) {
        self.state
            .lock()
            .scripted_templates
            .insert(name.into(), positions);
    }

    pub fn moves(&self) -> u32 {
        self.state.lock().moves
    }

    pub fn clicks(&self) -> u32 {
        self.state.lock().clicks
    }

    pub fn frames_captured(&self) -> u32 {
        self.state.lock().frames_captured
    }

    pub fn pointer(&self) -> Option<Point> {
        self.state.lock().pointer
    }
}

#[async_trait]
impl Sensor for SimWorld {
    async fn capture_frame(&self, _region: Option<Region>) -> Result<Frame, SenseError> {
        self.state.lock().frames_captured += 1;
        Ok(Frame::new_rgb8(4, 4))
    }

    async fn recognize_text(&self, _frame: &Frame) -> Result<Vec<String>, SenseError> {
        Ok(self.state.lock().scripted_text.clone())
    }

    async fn find_template(
        &self,
        _frame: &Frame,
        template: &str,
    ) -> Result<Vec<Point>, SenseError> {
        self.state
            .lock()
            .scripted_templates
            .get(template)
            .cloned()
            .ok_or_else(|| SenseError::NoMatch(template.to_string()))
    }
}

#[async_trait]
impl Actuator for SimWorld {
    async fn move_to(&self, point: Point) -> Result<(), ActError> {
        let mut state = self.state.lock();
        state.pointer = Some(point);
        state.moves += 1;
        Ok(())
    }

    async fn press(&self) -> Result<(), ActError> {
        self.state.lock().presses += 1;
        Ok(())
    }

    async fn release(&self) -> Result<(), ActError> {
        Ok(())
    }

    async fn click(&self, point: Point) -> Result<(), ActError> {
        let mut state = self.state.lock();
        state.pointer = Some(point);
        state.clicks += 1;
        Ok(())
    }

    async fn delay(&self, _interval: Interval) -> Result<(), ActError> {
        Ok(())
    }
}

#[async_trait]
impl UiControl for SimWorld {
    async fn verify_page(&self, page: &PageId) -> Result<bool, SenseError> {
        Ok(self.state.lock().current_page.as_ref() == Some(page))
    }

    async fn ensure_page(&self, page: &PageId) -> Result<(), SenseError> {
        self.state.lock().current_page = Some(page.clone());
        Ok(())
    }
}

/// Walks a tracked position toward a target by a fixed step each iteration,
/// terminating on an arrival rule.
pub struct PatrolMission {
    name: String,
    position: Point,
    step: (f64, f64),
    rule: StopRule,
    iterations: u32,
}

impl PatrolMission {
    pub fn new(name: impl Into<String>, start: Point, step: (f64, f64), rule: StopRule) -> Self {
        Self {
            name: name.into(),
            position: start,
            step,
            rule,
            iterations: 0,
        }
    }

    pub fn iterations(&self) -> u32 {
        self.iterations
    }
}

#[async_trait]
impl Mission for PatrolMission {
    fn name(&self) -> &str {
        &self.name
    }

    async fn run(&mut self, ctx: &MissionContext) -> Result<MissionOutcome, Fault> {
        ctx.signal_ready();

        loop {
            if ctx.should_stop() {
                return Ok(MissionOutcome::Stopped);
            }
            if self.rule.evaluate(&Observation::at(self.position)) {
                debug!(mission = %self.name, iterations = self.iterations, "arrived");
                return Ok(MissionOutcome::Completed);
            }

            self.position = self.position.offset(self.step.0, self.step.1);
            ctx.interactor()
                .actuator
                .move_to(self.position)
                .await
                .map_err(Fault::from_actuation)?;
            self.iterations += 1;

            ctx.pause().await;
        }
    }
}
