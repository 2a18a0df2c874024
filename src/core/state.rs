//! Task state machine.
//!
//! `reduce` is pure: every transition is a function of the current session and
//! one action. Actions tagged with a task id that is not the current task are
//! dropped, which keeps late timers and responses of a replaced task inert.

use crate::domain::model::{AnalysisResult, CleaningResult, CompletedTask, Phase};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TaskId(pub u64);

impl fmt::Display for TaskId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "task-{}", self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TaskState {
    #[default]
    Idle,
    Uploading,
    Analyzing,
    Cleaning,
    Done,
    Error,
}

impl TaskState {
    pub fn phase(self) -> Option<Phase> {
        match self {
            TaskState::Analyzing => Some(Phase::Analyzing),
            TaskState::Cleaning => Some(Phase::Cleaning),
            _ => None,
        }
    }

    pub fn is_settled(self) -> bool {
        matches!(self, TaskState::Done | TaskState::Error)
    }
}

impl fmt::Display for TaskState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            TaskState::Idle => "idle",
            TaskState::Uploading => "uploading",
            TaskState::Analyzing => "analyzing",
            TaskState::Cleaning => "cleaning",
            TaskState::Done => "done",
            TaskState::Error => "error",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone)]
pub enum Action {
    FileSelected { task: TaskId, file_name: String },
    AnalyzeSent { task: TaskId },
    AnalyzeSucceeded { task: TaskId, analysis: AnalysisResult },
    CleaningStarted { task: TaskId },
    CleanSucceeded { task: TaskId, result: CleaningResult },
    Finished { task: TaskId },
    RequestFailed { task: TaskId, message: String },
    Reset,
}

impl Action {
    pub fn task(&self) -> Option<TaskId> {
        match self {
            Action::FileSelected { task, .. }
            | Action::AnalyzeSent { task }
            | Action::AnalyzeSucceeded { task, .. }
            | Action::CleaningStarted { task }
            | Action::CleanSucceeded { task, .. }
            | Action::Finished { task }
            | Action::RequestFailed { task, .. } => Some(*task),
            Action::Reset => None,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct Session {
    pub state: TaskState,
    pub task: Option<TaskId>,
    pub file_name: Option<String>,
    pub analysis: Option<AnalysisResult>,
    pub cleaning: Option<CleaningResult>,
    /// Developer-facing detail of the last failure; never shown in the dashboard.
    pub error: Option<String>,
    /// States visited by the current task, in order.
    pub trail: Vec<TaskState>,
}

impl Session {
    /// Whether `reduce` will consider `action` at all; stale actions are not.
    pub fn accepts(&self, action: &Action) -> bool {
        matches!(action, Action::FileSelected { .. } | Action::Reset) || action.task() == self.task
    }

    pub fn file_id(&self) -> Option<&str> {
        self.analysis
            .as_ref()
            .map(|analysis| analysis.file_id.as_str())
            .filter(|id| !id.is_empty())
    }

    /// The merged result, only once the task is done.
    pub fn completed(&self) -> Option<CompletedTask> {
        if self.state != TaskState::Done {
            return None;
        }
        match (&self.analysis, &self.cleaning) {
            (Some(analysis), Some(cleaning)) => Some(CompletedTask::merge(analysis, cleaning)),
            _ => None,
        }
    }

    fn enter(mut self, state: TaskState) -> Self {
        self.state = state;
        self.trail.push(state);
        self
    }
}

pub fn reduce(session: Session, action: Action) -> Session {
    if let Action::FileSelected { task, file_name } = action {
        return Session {
            task: Some(task),
            file_name: Some(file_name),
            ..Session::default()
        }
        .enter(TaskState::Uploading);
    }

    if let Action::Reset = action {
        return Session::default();
    }

    if !session.accepts(&action) {
        tracing::debug!("Dropping stale {:?} for {:?}", action.task(), session.task);
        return session;
    }

    match (session.state, action) {
        (TaskState::Uploading, Action::AnalyzeSent { .. }) => session.enter(TaskState::Analyzing),
        (TaskState::Analyzing, Action::AnalyzeSucceeded { analysis, .. }) => Session {
            analysis: Some(analysis),
            ..session
        },
        (TaskState::Analyzing, Action::CleaningStarted { .. }) if session.file_id().is_some() => {
            session.enter(TaskState::Cleaning)
        }
        (TaskState::Cleaning, Action::CleanSucceeded { result, .. }) => Session {
            cleaning: Some(result),
            ..session
        },
        (TaskState::Cleaning, Action::Finished { .. }) if session.cleaning.is_some() => {
            session.enter(TaskState::Done)
        }
        (TaskState::Uploading | TaskState::Analyzing | TaskState::Cleaning, Action::RequestFailed { message, .. }) => {
            Session {
                error: Some(message),
                ..session
            }
            .enter(TaskState::Error)
        }
        (state, action) => {
            tracing::debug!("Ignoring {:?} in state {}", action, state);
            session
        }
    }
}
