use chrono::Local;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::config::{AutoquestConfig, PollingConfig, TaskConfig};
use crate::error::Fault;
use crate::interaction::Interactor;
use crate::mission::{Mission, MissionContext, MissionOutcome, ReadyBeacon};
use crate::snapshot::SnapshotWriter;

use super::signal::StopSignal;
use super::status::TaskStatus;

/// Handle to a registered subordinate mission.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SubordinateId(usize);

/// What a mission worker hands back when its attempt ends: the mission
/// itself (so the task can relaunch it) and the attempt's result.
type AttemptReturn = (Box<dyn Mission>, Result<MissionOutcome, Fault>);

enum SubordinateState {
    /// Registered but not yet launched; held until `start_blocking`.
    Held(Box<dyn Mission>),
    Launched {
        ready: watch::Receiver<bool>,
        worker: JoinHandle<AttemptReturn>,
    },
    Finished(MissionOutcome),
}

struct Subordinate {
    name: String,
    attempts: u32,
    state: SubordinateState,
}

/// Per-mission attempt summary for a finished task run.
#[derive(Debug, Clone)]
pub struct MissionReport {
    pub name: String,
    pub attempts: u32,
}

/// The top-level scheduling unit.
///
/// A task exclusively owns its missions; missions never outlive the task.
/// Subordinate missions run on independent workers, each driven by exactly
/// one worker; follow-up missions run inline on the task's own worker after
/// the subordinates finish. The task boundary is the only layer that turns
/// a local fault into a retry decision; fatal faults are never retried.
pub struct Task {
    name: String,
    status: TaskStatus,
    fault: Option<Fault>,
    signal: StopSignal,
    interactor: Interactor,
    snapshots: SnapshotWriter,
    task_config: TaskConfig,
    polling: PollingConfig,
    subordinates: Vec<Subordinate>,
    followups: Vec<(Box<dyn Mission>, u32)>,
}

impl Task {
    pub fn new(name: impl Into<String>, interactor: Interactor, config: &AutoquestConfig) -> Self {
        Self {
            name: name.into(),
            status: TaskStatus::Pending,
            fault: None,
            signal: StopSignal::new(),
            interactor,
            snapshots: SnapshotWriter::new(config.snapshot.root_dir.clone()),
            task_config: config.task.clone(),
            polling: config.polling.clone(),
            subordinates: Vec::new(),
            followups: Vec::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn status(&self) -> TaskStatus {
        self.status
    }

    /// The fault that stopped the task, if it resolved to `StoppedFatal`.
    /// Preserved exactly as raised; diagnostics never rewrite it.
    pub fn fault(&self) -> Option<&Fault> {
        self.fault.as_ref()
    }

    /// The cooperative shutdown flag shared with every mission this task
    /// owns. Triggering it stops all polling loops within one interval.
    pub fn stop_signal(&self) -> StopSignal {
        self.signal.clone()
    }

    /// Register a mission to run on an independent worker. With
    /// `start_immediately` the worker is spawned now; otherwise it is held
    /// until [`start_blocking`](Self::start_blocking).
    pub fn add_subordinate(
        &mut self,
        mission: Box<dyn Mission>,
        start_immediately: bool,
    ) -> SubordinateId {
        let id = SubordinateId(self.subordinates.len());
        self.subordinates.push(Subordinate {
            name: mission.name().to_string(),
            attempts: 0,
            state: SubordinateState::Held(mission),
        });
        if start_immediately {
            self.launch(id);
        }
        id
    }

    /// Register a mission to run inline on the task's own worker after all
    /// subordinates have finished.
    pub fn add_followup(&mut self, mission: Box<dyn Mission>) {
        self.followups.push((mission, 0));
    }

    /// Start the subordinate's worker if it is still held, then block until
    /// its ready milestone fires, not until completion. After this returns,
    /// mission-produced state the milestone guards is safe to read.
    pub async fn start_blocking(&mut self, id: SubordinateId) -> Result<(), Fault> {
        if matches!(self.subordinate(id).state, SubordinateState::Held(_)) {
            self.launch(id);
        }

        let mut ready = match &self.subordinate(id).state {
            SubordinateState::Launched { ready, .. } => ready.clone(),
            // Already finished: the milestone fired before run() returned.
            SubordinateState::Finished(_) => return Ok(()),
            SubordinateState::Held(_) => unreachable!("launched above"),
        };

        let name = self.subordinate(id).name.clone();
        let timeout = self.task_config.handshake_timeout();
        let handshake = async {
            while !*ready.borrow() {
                // A closed channel means the worker ended before signalling;
                // the join below will surface whatever happened.
                if ready.changed().await.is_err() {
                    break;
                }
            }
        };

        match tokio::time::timeout(timeout, handshake).await {
            Ok(()) => {
                debug!(task = %self.name, mission = %name, "ready handshake complete");
                Ok(())
            }
            Err(_) => Err(Fault::fatal(format!(
                "mission {name} never reached its ready milestone within {timeout:?}"
            ))
            .with_reasons([
                "mission body does not call signal_ready",
                "environment stalled before the first milestone",
            ])),
        }
    }

    /// Wait for a subordinate to finish, applying the local-fault retry
    /// policy: a local fault is retried until the per-mission attempt bound
    /// is spent, then escalates; a fatal fault propagates immediately.
    pub async fn join_subordinate(&mut self, id: SubordinateId) -> Result<MissionOutcome, Fault> {
        loop {
            let sub = self.subordinate_mut(id);
            let worker = match std::mem::replace(
                &mut sub.state,
                SubordinateState::Finished(MissionOutcome::Stopped),
            ) {
                SubordinateState::Launched { worker, .. } => worker,
                SubordinateState::Finished(outcome) => {
                    sub.state = SubordinateState::Finished(outcome);
                    return Ok(outcome);
                }
                SubordinateState::Held(_) => {
                    return Err(Fault::fatal(format!(
                        "mission {} joined before it was started",
                        sub.name
                    )));
                }
            };

            let (mission, result) = worker.await.map_err(|e| {
                Fault::fatal(format!("mission worker panicked: {e}"))
                    .with_reasons(["defect in the mission body"])
            })?;

            match result {
                Ok(outcome) => {
                    self.subordinate_mut(id).state = SubordinateState::Finished(outcome);
                    return Ok(outcome);
                }
                Err(fault) if fault.is_fatal() => return Err(fault),
                Err(fault) => {
                    let attempts = self.subordinate(id).attempts;
                    let mission_name = self.subordinate(id).name.clone();
                    if attempts >= self.task_config.retry_limit {
                        warn!(
                            task = %self.name,
                            mission = %mission_name,
                            attempts,
                            "local-fault retry bound spent, escalating"
                        );
                        return Err(fault);
                    }
                    if self.signal.is_triggered() {
                        info!(task = %self.name, "stop requested, not retrying");
                        self.subordinate_mut(id).state =
                            SubordinateState::Finished(MissionOutcome::Stopped);
                        return Ok(MissionOutcome::Stopped);
                    }

                    self.status = TaskStatus::StoppedLocalRetry;
                    warn!(
                        task = %self.name,
                        mission = %mission_name,
                        attempt = attempts,
                        fault = %fault,
                        "local fault, retrying mission"
                    );
                    self.subordinate_mut(id).state = SubordinateState::Held(mission);
                    self.launch(id);
                    self.status = TaskStatus::Running;
                }
            }
        }
    }

    /// The task body: handshake every subordinate in registration order,
    /// join them all, then run follow-up missions inline under the same
    /// retry policy.
    pub async fn run(&mut self) -> Result<(), Fault> {
        let ids: Vec<SubordinateId> = (0..self.subordinates.len()).map(SubordinateId).collect();

        for &id in &ids {
            self.start_blocking(id).await?;
        }
        for &id in &ids {
            let outcome = self.join_subordinate(id).await?;
            if outcome == MissionOutcome::Stopped {
                info!(task = %self.name, mission = %self.subordinate(id).name, "mission stopped cooperatively");
            }
        }

        let mut followups = std::mem::take(&mut self.followups);
        let mut result = Ok(());
        for (mission, attempts) in followups.iter_mut() {
            if let Err(fault) = self.run_inline(mission.as_mut(), attempts).await {
                result = Err(fault);
                break;
            }
        }
        self.followups = followups;

        result
    }

    /// Entry point: `Pending → Running`, run the body, resolve the terminal
    /// status. A capture-tagged fault gets one best-effort snapshot before
    /// the task finishes unwinding.
    pub async fn start(&mut self) -> TaskStatus {
        if self.status != TaskStatus::Pending {
            warn!(task = %self.name, status = %self.status, "start called on a non-pending task");
            return self.status;
        }

        self.status = TaskStatus::Running;
        info!(task = %self.name, "task started");

        match self.run().await {
            Ok(()) => {
                self.status = TaskStatus::Completed;
                info!(task = %self.name, "task completed");
            }
            Err(fault) => {
                // Stop whatever is still polling before we unwind.
                self.signal.trigger();
                if fault.capture {
                    self.capture_snapshot(&fault).await;
                }
                self.status = TaskStatus::StoppedFatal;
                warn!(
                    task = %self.name,
                    scope = %fault.scope,
                    reasons = ?fault.possible_reasons,
                    "task stopped: {fault}"
                );
                self.fault = Some(fault);
            }
        }

        self.status
    }

    /// Attempt summary per owned mission, in registration order.
    pub fn report(&self) -> Vec<MissionReport> {
        self.subordinates
            .iter()
            .map(|s| MissionReport {
                name: s.name.clone(),
                attempts: s.attempts,
            })
            .chain(self.followups.iter().map(|(m, attempts)| MissionReport {
                name: m.name().to_string(),
                attempts: *attempts,
            }))
            .collect()
    }

    fn subordinate(&self, id: SubordinateId) -> &Subordinate {
        &self.subordinates[id.0]
    }

    fn subordinate_mut(&mut self, id: SubordinateId) -> &mut Subordinate {
        &mut self.subordinates[id.0]
    }

    fn mission_context(&self) -> (MissionContext, watch::Receiver<bool>) {
        let (ready, rx) = ReadyBeacon::channel();
        let ctx = MissionContext::new(
            self.signal.clone(),
            ready,
            self.interactor.clone(),
            self.polling.clone(),
        );
        (ctx, rx)
    }

    /// Spawn one attempt of a held subordinate on its own worker.
    fn launch(&mut self, id: SubordinateId) {
        let (ctx, rx) = self.mission_context();
        let task_name = self.name.clone();
        let sub = self.subordinate_mut(id);

        let mut mission = match std::mem::replace(
            &mut sub.state,
            SubordinateState::Finished(MissionOutcome::Stopped),
        ) {
            SubordinateState::Held(mission) => mission,
            other => {
                sub.state = other;
                return;
            }
        };

        sub.attempts += 1;
        debug!(task = %task_name, mission = %sub.name, attempt = sub.attempts, "launching mission worker");

        let worker = tokio::spawn(async move {
            let result = mission.run(&ctx).await;
            // Completion implies readiness; a mission that finished without
            // an explicit milestone must not deadlock the handshake.
            ctx.signal_ready();
            (mission, result)
        });

        sub.state = SubordinateState::Launched { ready: rx, worker };
    }

    /// Run a follow-up mission on the task's own worker with the same
    /// retry policy as subordinate workers.
    async fn run_inline(
        &mut self,
        mission: &mut dyn Mission,
        attempts: &mut u32,
    ) -> Result<MissionOutcome, Fault> {
        loop {
            if self.signal.is_triggered() {
                return Ok(MissionOutcome::Stopped);
            }

            *attempts += 1;
            let (ctx, _rx) = self.mission_context();
            match mission.run(&ctx).await {
                Ok(outcome) => return Ok(outcome),
                Err(fault) if fault.is_fatal() => return Err(fault),
                Err(fault) => {
                    if *attempts >= self.task_config.retry_limit {
                        warn!(
                            task = %self.name,
                            mission = mission.name(),
                            attempts = *attempts,
                            "local-fault retry bound spent, escalating"
                        );
                        return Err(fault);
                    }
                    self.status = TaskStatus::StoppedLocalRetry;
                    warn!(
                        task = %self.name,
                        mission = mission.name(),
                        attempt = *attempts,
                        fault = %fault,
                        "local fault, retrying mission"
                    );
                    self.status = TaskStatus::Running;
                }
            }
        }
    }

    /// Best-effort: grab the current frame and persist it. Failures are
    /// logged by the collaborators and never mask the original fault.
    async fn capture_snapshot(&self, fault: &Fault) {
        match self.interactor.sensor.capture_frame(None).await {
            Ok(frame) => {
                let _ = self.snapshots.save(&frame, &fault.message, Local::now());
            }
            Err(err) => {
                warn!(task = %self.name, error = %err, "frame capture for snapshot failed");
            }
        }
    }
}
