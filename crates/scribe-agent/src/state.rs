//! Run state and the cooperative interrupt flag.

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Where a run currently stands.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum RunStatus {
    Running,
    /// The model answered without tool calls.
    Completed { final_text: String },
    Interrupted,
    MaxIterationsReached,
}

impl RunStatus {
    pub fn is_terminal(&self) -> bool {
        !matches!(self, RunStatus::Running)
    }
}

/// Per-run state, owned by the caller and threaded through every loop step.
///
/// Nothing here is global, so two runs in one process don't interfere.
#[derive(Clone, Debug)]
pub struct RunState {
    /// 1-based index of the current iteration (0 before the first).
    pub iteration: usize,
    /// Most recent token estimate for the full prompt.
    pub token_estimate: usize,
    /// The single active project directory, once `create_project` ran.
    pub project_dir: Option<PathBuf>,
    pub status: RunStatus,
    /// Every snapshot file written during the run, oldest first.
    pub snapshots: Vec<PathBuf>,
    /// The snapshot written when the run stopped on an interrupt or the
    /// iteration ceiling. `None` if that save failed or never ran.
    pub final_snapshot: Option<PathBuf>,
}

impl RunState {
    pub fn new() -> Self {
        Self {
            iteration: 0,
            token_estimate: 0,
            project_dir: None,
            status: RunStatus::Running,
            snapshots: Vec::new(),
            final_snapshot: None,
        }
    }

    /// Directory snapshots go to: the active project, else `fallback`.
    pub fn snapshot_dir<'a>(&'a self, fallback: &'a Path) -> &'a Path {
        self.project_dir.as_deref().unwrap_or(fallback)
    }

    pub fn last_snapshot(&self) -> Option<&Path> {
        self.snapshots.last().map(PathBuf::as_path)
    }

    /// The file to resume from after a stop. Earlier backups don't count:
    /// they predate the work done since.
    pub fn resume_snapshot(&self) -> Option<&Path> {
        self.final_snapshot.as_deref()
    }
}

impl Default for RunState {
    fn default() -> Self {
        Self::new()
    }
}

/// A cloneable flag raised by the signal handler and polled by the loop at
/// iteration boundaries. Never honoured mid-call.
#[derive(Clone, Debug, Default)]
pub struct InterruptFlag(Arc<AtomicBool>);

impl InterruptFlag {
    pub fn new() -> Self {
        Self::default()
    }

    /// Raise the flag. Returns `true` if it was already raised.
    pub fn raise(&self) -> bool {
        self.0.swap(true, Ordering::SeqCst)
    }

    pub fn is_raised(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_state() {
        let state = RunState::new();
        assert_eq!(state.iteration, 0);
        assert_eq!(state.status, RunStatus::Running);
        assert!(!state.status.is_terminal());
        assert!(state.last_snapshot().is_none());
        assert!(state.resume_snapshot().is_none());
    }

    #[test]
    fn test_resume_snapshot_ignores_earlier_backups() {
        let mut state = RunState::new();
        state.snapshots.push(PathBuf::from("/tmp/output/.context_summary_a.md"));
        assert!(state.last_snapshot().is_some());
        assert!(state.resume_snapshot().is_none());

        state.final_snapshot = Some(PathBuf::from("/tmp/output/.context_summary_b.md"));
        assert_eq!(
            state.resume_snapshot(),
            Some(Path::new("/tmp/output/.context_summary_b.md"))
        );
    }

    #[test]
    fn test_snapshot_dir_prefers_project() {
        let fallback = PathBuf::from("/tmp/output");
        let mut state = RunState::new();
        assert_eq!(state.snapshot_dir(&fallback), fallback.as_path());

        state.project_dir = Some(PathBuf::from("/tmp/output/novel"));
        assert_eq!(state.snapshot_dir(&fallback), Path::new("/tmp/output/novel"));
    }

    #[test]
    fn test_interrupt_flag_shared_between_clones() {
        let flag = InterruptFlag::new();
        let handle = flag.clone();
        assert!(!flag.is_raised());
        assert!(!handle.raise());
        assert!(flag.is_raised());
        // Second raise reports the earlier one
        assert!(flag.raise());
    }

    #[test]
    fn test_terminal_statuses() {
        assert!(RunStatus::Interrupted.is_terminal());
        assert!(RunStatus::MaxIterationsReached.is_terminal());
        assert!(RunStatus::Completed {
            final_text: String::new()
        }
        .is_terminal());
    }
}
