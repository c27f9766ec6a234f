//! Shared mocks for the integration tests.
#![allow(dead_code)]

use std::sync::Arc;
use std::sync::atomic::{AtomicU32, Ordering};
use std::time::Duration;

use async_trait::async_trait;

use autoquest::config::AutoquestConfig;
use autoquest::error::Fault;
use autoquest::interaction::{PageId, Point};
use autoquest::mission::{Mission, MissionContext, MissionOutcome};

/// Fast polling and a retry bound of three.
pub fn test_config() -> AutoquestConfig {
    let mut config = AutoquestConfig::default();
    config.polling.interval_ms = 1;
    config.polling.default_max_polls = 50;
    config.task.retry_limit = 3;
    config
}

/// Raises the same fault on every attempt, counting attempts.
pub struct FaultingMission {
    fault: Fault,
    pub attempts: Arc<AtomicU32>,
}

impl FaultingMission {
    pub fn new(fault: Fault) -> Self {
        Self {
            fault,
            attempts: Arc::new(AtomicU32::new(0)),
        }
    }

    pub fn attempt_counter(&self) -> Arc<AtomicU32> {
        self.attempts.clone()
    }
}

#[async_trait]
impl Mission for FaultingMission {
    fn name(&self) -> &str {
        "faulting"
    }

    async fn run(&mut self, ctx: &MissionContext) -> Result<MissionOutcome, Fault> {
        ctx.signal_ready();
        self.attempts.fetch_add(1, Ordering::SeqCst);
        Err(self.fault.clone())
    }
}

/// Signals readiness after a controlled delay, then keeps running for a
/// while before completing. Lets tests observe that the handshake blocks
/// exactly until the milestone, not until completion.
pub struct SlowReadyMission {
    ready_after: Duration,
    complete_after: Duration,
}

impl SlowReadyMission {
    pub fn new(ready_after: Duration, complete_after: Duration) -> Self {
        Self {
            ready_after,
            complete_after,
        }
    }
}

#[async_trait]
impl Mission for SlowReadyMission {
    fn name(&self) -> &str {
        "slow_ready"
    }

    async fn run(&mut self, ctx: &MissionContext) -> Result<MissionOutcome, Fault> {
        tokio::time::sleep(self.ready_after).await;
        ctx.signal_ready();
        tokio::time::sleep(self.complete_after).await;
        Ok(MissionOutcome::Completed)
    }
}

/// Clicks forever until the stop check fires; every iteration performs one
/// actuation and then re-evaluates the checkup.
pub struct ClickUntilStopped {
    pub clicks_made: Arc<AtomicU32>,
}

impl ClickUntilStopped {
    pub fn new() -> Self {
        Self {
            clicks_made: Arc::new(AtomicU32::new(0)),
        }
    }

    pub fn click_counter(&self) -> Arc<AtomicU32> {
        self.clicks_made.clone()
    }
}

#[async_trait]
impl Mission for ClickUntilStopped {
    fn name(&self) -> &str {
        "click_until_stopped"
    }

    async fn run(&mut self, ctx: &MissionContext) -> Result<MissionOutcome, Fault> {
        ctx.signal_ready();
        loop {
            if ctx.should_stop() {
                return Ok(MissionOutcome::Stopped);
            }
            ctx.interactor()
                .actuator
                .click(Point::new(1.0, 1.0))
                .await
                .map_err(Fault::from_actuation)?;
            self.clicks_made.fetch_add(1, Ordering::SeqCst);
            ctx.pause().await;
        }
    }
}

/// Confirms its page precondition, then polls the sensor until an expected
/// text line shows up. Collaborator failures cross the mission boundary as
/// faults; an exhausted poll budget raises a local one.
pub struct ReadTextMission {
    page: PageId,
    expect: String,
}

impl ReadTextMission {
    pub fn new(page: PageId, expect: impl Into<String>) -> Self {
        Self {
            page,
            expect: expect.into(),
        }
    }
}

#[async_trait]
impl Mission for ReadTextMission {
    fn name(&self) -> &str {
        "read_text"
    }

    async fn run(&mut self, ctx: &MissionContext) -> Result<MissionOutcome, Fault> {
        ctx.interactor()
            .ui
            .ensure_page(&self.page)
            .await
            .map_err(Fault::from_sense)?;
        ctx.signal_ready();

        let mut budget = ctx.budget(format!("text `{}` to appear", self.expect));
        loop {
            if ctx.should_stop() {
                return Ok(MissionOutcome::Stopped);
            }

            let frame = ctx
                .interactor()
                .sensor
                .capture_frame(None)
                .await
                .map_err(Fault::from_sense)?;
            let lines = ctx
                .interactor()
                .sensor
                .recognize_text(&frame)
                .await
                .map_err(Fault::from_sense)?;
            if lines.iter().any(|line| line.contains(&self.expect)) {
                return Ok(MissionOutcome::Completed);
            }

            budget.spend()?;
            ctx.pause().await;
        }
    }
}

/// Never announces its ready milestone; the handshake bound is the only
/// thing that can unblock a task waiting on it.
pub struct NeverReadyMission;

#[async_trait]
impl Mission for NeverReadyMission {
    fn name(&self) -> &str {
        "never_ready"
    }

    async fn run(&mut self, _ctx: &MissionContext) -> Result<MissionOutcome, Fault> {
        tokio::time::sleep(Duration::from_secs(30)).await;
        Ok(MissionOutcome::Completed)
    }
}

/// Completes immediately without ever touching the actuator. Used to check
/// that a pre-triggered signal suppresses all actuation.
pub struct NoopMission;

#[async_trait]
impl Mission for NoopMission {
    fn name(&self) -> &str {
        "noop"
    }

    async fn run(&mut self, ctx: &MissionContext) -> Result<MissionOutcome, Fault> {
        ctx.signal_ready();
        Ok(MissionOutcome::Completed)
    }
}
