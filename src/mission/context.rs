use tokio::sync::watch;
use tracing::debug;

use crate::config::PollingConfig;
use crate::error::Fault;
use crate::interaction::Interactor;
use crate::stop_rule::{Observation, StopRule};
use crate::task::StopSignal;

/// Everything a mission borrows from its owning task for the duration of a
/// run: the cancellation check, the ready milestone, the environment
/// collaborators, and the polling parameters.
#[derive(Clone)]
pub struct MissionContext {
    signal: StopSignal,
    ready: ReadyBeacon,
    interactor: Interactor,
    polling: PollingConfig,
}

impl MissionContext {
    pub fn new(
        signal: StopSignal,
        ready: ReadyBeacon,
        interactor: Interactor,
        polling: PollingConfig,
    ) -> Self {
        Self {
            signal,
            ready,
            interactor,
            polling,
        }
    }

    pub fn interactor(&self) -> &Interactor {
        &self.interactor
    }

    pub fn polling(&self) -> &PollingConfig {
        &self.polling
    }

    /// The externally injected cancellation check alone.
    pub fn should_stop(&self) -> bool {
        self.signal.is_triggered()
    }

    /// Combined per-iteration stop check: the task's cancellation signal or
    /// the mission's own stop rule. Every polling loop calls this at least
    /// once per iteration and honors `true` by returning without further
    /// actuation.
    pub fn checkup(&self, rule: &StopRule, observation: &Observation) -> bool {
        self.should_stop() || rule.evaluate(observation)
    }

    /// Announce the first observable ready milestone. Single-fire; the
    /// owning task's `start_blocking` returns once this has been called.
    pub fn signal_ready(&self) {
        self.ready.fire();
    }

    /// Sleep one polling interval. The only suspension point between steps;
    /// the caller re-runs its checkup on wake.
    pub async fn pause(&self) {
        tokio::time::sleep(self.polling.interval()).await;
    }

    /// A bounded poll counter for repeated waits, sized from configuration.
    /// Exhausting it is a mission-scoped fault: an unbounded poll without an
    /// exit condition is a contract violation, not an implementation choice.
    pub fn budget(&self, what: impl Into<String>) -> PollBudget {
        PollBudget::new(what, self.polling.default_max_polls)
    }

    /// Poll `check` once per interval until it returns true, the budget runs
    /// out, or a stop is requested. Stop-rule evaluation happens in the
    /// caller's `check` when needed; this helper covers flag-style waits
    /// such as "UI became stable".
    pub async fn wait_until<F>(&self, what: &str, mut check: F) -> Result<PollOutcome, Fault>
    where
        F: FnMut() -> bool,
    {
        let mut budget = self.budget(what);
        loop {
            if self.should_stop() {
                debug!(what, "wait aborted by stop request");
                return Ok(PollOutcome::Stopped);
            }
            if check() {
                return Ok(PollOutcome::Satisfied);
            }
            budget.spend()?;
            self.pause().await;
        }
    }
}

/// Result of a bounded cooperative wait.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PollOutcome {
    Satisfied,
    Stopped,
}

/// Single-fire ready milestone shared between a mission worker and the task
/// blocked in `start_blocking`.
#[derive(Clone)]
pub struct ReadyBeacon {
    tx: watch::Sender<bool>,
}

impl ReadyBeacon {
    pub fn channel() -> (Self, watch::Receiver<bool>) {
        let (tx, rx) = watch::channel(false);
        (Self { tx }, rx)
    }

    /// Fire the milestone. Idempotent; later calls are no-ops.
    pub fn fire(&self) {
        // send_if_modified avoids waking watchers on repeat fires.
        self.tx.send_if_modified(|ready| {
            if *ready {
                false
            } else {
                *ready = true;
                true
            }
        });
    }

    pub fn is_fired(&self) -> bool {
        *self.tx.borrow()
    }
}

/// Counts down a bounded number of polls; exhaustion raises a local fault
/// naming the wait.
#[derive(Debug)]
pub struct PollBudget {
    what: String,
    remaining: u32,
}

impl PollBudget {
    pub fn new(what: impl Into<String>, max_polls: u32) -> Self {
        Self {
            what: what.into(),
            remaining: max_polls,
        }
    }

    pub fn remaining(&self) -> u32 {
        self.remaining
    }

    /// Consume one poll. Errs with a mission-scoped fault once the budget is
    /// exhausted.
    pub fn spend(&mut self) -> Result<(), Fault> {
        if self.remaining == 0 {
            return Err(Fault::local(format!("poll budget exhausted: {}", self.what))
                .with_reasons([
                    "expected state never appeared",
                    "polling interval too short for this transition",
                ]));
        }
        self.remaining -= 1;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::interaction::Point;

    fn test_context(signal: StopSignal) -> (MissionContext, watch::Receiver<bool>) {
        let (ready, rx) = ReadyBeacon::channel();
        let ctx = MissionContext::new(
            signal,
            ready,
            crate::sim::SimWorld::shared().interactor(),
            PollingConfig {
                interval_ms: 1,
                default_max_polls: 5,
            },
        );
        (ctx, rx)
    }

    #[test]
    fn poll_budget_exhausts_into_local_fault() {
        let mut budget = PollBudget::new("page_main to appear", 2);
        assert!(budget.spend().is_ok());
        assert!(budget.spend().is_ok());

        let fault = budget.spend().unwrap_err();
        assert_eq!(fault.scope, crate::error::StopScope::Local);
        assert!(fault.message.contains("page_main"));
    }

    #[test]
    fn ready_beacon_fires_once() {
        let (beacon, rx) = ReadyBeacon::channel();
        assert!(!*rx.borrow());
        beacon.fire();
        beacon.fire();
        assert!(*rx.borrow());
        assert!(beacon.is_fired());
    }

    #[tokio::test]
    async fn checkup_combines_signal_and_rule() {
        let signal = StopSignal::new();
        let (ctx, _rx) = test_context(signal.clone());

        let rule = StopRule::arrival(Point::new(0.0, 0.0), 1.0);
        let far = Observation::at(Point::new(10.0, 10.0));
        let near = Observation::at(Point::new(0.5, 0.5));

        assert!(!ctx.checkup(&rule, &far));
        assert!(ctx.checkup(&rule, &near));

        signal.trigger();
        assert!(ctx.checkup(&rule, &far));
    }

    #[tokio::test]
    async fn wait_until_satisfied() {
        let (ctx, _rx) = test_context(StopSignal::new());
        let mut polls = 0;
        let outcome = ctx
            .wait_until("counter to reach three", || {
                polls += 1;
                polls >= 3
            })
            .await
            .unwrap();
        assert_eq!(outcome, PollOutcome::Satisfied);
    }

    #[tokio::test]
    async fn wait_until_honors_stop_signal() {
        let signal = StopSignal::new();
        signal.trigger();
        let (ctx, _rx) = test_context(signal);

        let outcome = ctx.wait_until("never", || false).await.unwrap();
        assert_eq!(outcome, PollOutcome::Stopped);
    }

    #[tokio::test]
    async fn wait_until_faults_on_exhaustion() {
        let (ctx, _rx) = test_context(StopSignal::new());
        let fault = ctx.wait_until("never", || false).await.unwrap_err();
        assert_eq!(fault.scope, crate::error::StopScope::Local);
    }
}
