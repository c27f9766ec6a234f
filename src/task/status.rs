use serde::{Deserialize, Serialize};

/// Run status of a task.
///
/// `StoppedLocalRetry` is the transient dip a task takes between attempts of
/// a mission that raised a local fault; it resolves to `Running` on the next
/// attempt or `StoppedFatal` once the retry bound is spent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum TaskStatus {
    #[default]
    Pending,
    Running,
    StoppedLocalRetry,
    StoppedFatal,
    Completed,
}

impl TaskStatus {
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::StoppedFatal | Self::Completed)
    }
}

impl std::fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::Pending => "pending",
            Self::Running => "running",
            Self::StoppedLocalRetry => "stopped (local retry)",
            Self::StoppedFatal => "stopped (fatal)",
            Self::Completed => "completed",
        };
        write!(f, "{}", s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn terminal_states() {
        assert!(!TaskStatus::Pending.is_terminal());
        assert!(!TaskStatus::Running.is_terminal());
        assert!(!TaskStatus::StoppedLocalRetry.is_terminal());
        assert!(TaskStatus::StoppedFatal.is_terminal());
        assert!(TaskStatus::Completed.is_terminal());
    }
}
