//! Process-boundary driver: builds registered tasks and runs them.
//!
//! The orchestrator owns the collaborator lifecycle and is the only place a
//! task is constructed; domain crates register factories and the CLI picks
//! one by name. Ctrl-C is wired to the running task's stop signal, so
//! shutdown is cooperative and observed within one polling interval.

use std::collections::HashMap;

use tracing::{info, warn};

use crate::config::AutoquestConfig;
use crate::error::{AutoquestError, Result};
use crate::interaction::Interactor;
use crate::task::{Task, TaskStatus};

type TaskFactory = Box<dyn Fn(Interactor, &AutoquestConfig) -> Task + Send + Sync>;

pub struct Orchestrator {
    config: AutoquestConfig,
    interactor: Interactor,
    registry: HashMap<String, TaskFactory>,
}

impl Orchestrator {
    pub fn new(config: AutoquestConfig, interactor: Interactor) -> Self {
        Self {
            config,
            interactor,
            registry: HashMap::new(),
        }
    }

    /// Register a buildable task under a name. Later registrations with the
    /// same name replace earlier ones.
    pub fn register<F>(&mut self, name: impl Into<String>, factory: F)
    where
        F: Fn(Interactor, &AutoquestConfig) -> Task + Send + Sync + 'static,
    {
        let name = name.into();
        if self.registry.insert(name.clone(), Box::new(factory)).is_some() {
            warn!(task = %name, "task factory replaced");
        }
    }

    pub fn task_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.registry.keys().cloned().collect();
        names.sort();
        names
    }

    /// Build and run a registered task to its terminal status.
    pub async fn run(&self, name: &str) -> Result<TaskStatus> {
        let factory = self
            .registry
            .get(name)
            .ok_or_else(|| AutoquestError::UnknownTask(name.to_string()))?;

        let mut task = factory(self.interactor.clone(), &self.config);
        let signal = task.stop_signal();

        // First Ctrl-C requests a cooperative stop; the task unwinds on its
        // own once every mission observes the signal.
        let ctrl_c = tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                info!("interrupt received, requesting cooperative stop");
                signal.trigger();
            }
        });

        let status = task.start().await;
        ctrl_c.abort();

        for report in task.report() {
            info!(
                task = name,
                mission = %report.name,
                attempts = report.attempts,
                "mission attempts"
            );
        }

        Ok(status)
    }
}
