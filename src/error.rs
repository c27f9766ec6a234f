use thiserror::Error;

use crate::interaction::{ActError, SenseError};

/// Containment scope of a raised [`Fault`].
///
/// `Local` faults abort only the mission that raised them and may be retried
/// by the owning task. `Task` faults invalidate the whole task and are never
/// retried.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopScope {
    Local,
    Task,
}

impl std::fmt::Display for StopScope {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Local => write!(f, "local"),
            Self::Task => write!(f, "task"),
        }
    }
}

/// A structured failure signal raised by a mission or one of its
/// collaborators.
///
/// Scope and capture flag are fixed at construction and carried up the call
/// stack unmodified; the nearest task boundary interprets them. The two are
/// independent: a fault can be local yet snapshot-worthy, or task-fatal
/// without any snapshot.
#[derive(Debug, Clone, Error)]
#[error("{message}")]
pub struct Fault {
    pub message: String,
    /// Documentation-only list of likely root causes, most likely first.
    /// Never used for control flow.
    pub possible_reasons: Vec<String>,
    pub scope: StopScope,
    pub capture: bool,
}

impl Fault {
    /// A recoverable, mission-scoped fault. The owning task may retry.
    pub fn local(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            possible_reasons: Vec::new(),
            scope: StopScope::Local,
            capture: false,
        }
    }

    /// A task-scoped fault. Unwinds the owning task immediately.
    pub fn fatal(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            possible_reasons: Vec::new(),
            scope: StopScope::Task,
            capture: false,
        }
    }

    pub fn with_reasons<I, S>(mut self, reasons: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.possible_reasons = reasons.into_iter().map(Into::into).collect();
        self
    }

    /// Tag this fault so the catching task boundary persists a diagnostic
    /// snapshot before unwinding.
    pub fn with_capture(mut self) -> Self {
        self.capture = true;
        self
    }

    pub fn is_fatal(&self) -> bool {
        self.scope == StopScope::Task
    }

    /// Translate a sensing failure at the mission boundary. Sensing errors
    /// are recoverable by contract, so the result is mission-scoped.
    pub fn from_sense(err: SenseError) -> Self {
        let reasons: Vec<String> = match &err {
            SenseError::Timeout(_) => vec![
                "environment is loading or frozen".into(),
                "capture backend lost the target window".into(),
            ],
            SenseError::NoMatch(_) => vec![
                "expected UI element is not on screen".into(),
                "template asset does not match current resolution".into(),
            ],
            SenseError::Decode(_) => vec!["capture produced a corrupt frame".into()],
        };
        Self::local(format!("sensing failed: {err}")).with_reasons(reasons)
    }

    /// Translate an actuation failure. Actuation is assumed non-failing, so
    /// any error here means the environment itself is compromised.
    pub fn from_actuation(err: ActError) -> Self {
        Self::fatal(format!("actuation failed: {err}")).with_reasons([
            "input backend lost access to the target process",
            "target application exited or changed focus",
        ])
    }
}

#[derive(Error, Debug)]
pub enum AutoquestError {
    #[error("fault: {0}")]
    Fault(#[from] Fault),

    #[error("unknown task: {0}")]
    UnknownTask(String),

    #[error("configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("TOML parse error: {0}")]
    TomlDe(#[from] toml::de::Error),

    #[error("TOML serialize error: {0}")]
    TomlSer(#[from] toml::ser::Error),
}

pub type Result<T> = std::result::Result<T, AutoquestError>;
