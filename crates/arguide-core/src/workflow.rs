/*
[INPUT]:  TaskState values pushed by the instruction manager
[OUTPUT]: VisibilitySet per state and pull-refresh signalling on state entry
[POS]:    Workflow layer - pure state -> visible region mapping
[UPDATE]: When regions are added or the visibility table changes
*/

use std::fmt;

use crate::types::TaskState;

/// Named UI regions whose visibility depends on the task state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Region {
    TaskSelector,
    BackControl,
    StartControl,
    CaptureControl,
    LocateControl,
    FeedbackDisplay,
}

impl Region {
    pub const ALL: [Region; 6] = [
        Region::TaskSelector,
        Region::BackControl,
        Region::StartControl,
        Region::CaptureControl,
        Region::LocateControl,
        Region::FeedbackDisplay,
    ];

    pub fn label(self) -> &'static str {
        match self {
            Region::TaskSelector => "task selector",
            Region::BackControl => "back control",
            Region::StartControl => "start control",
            Region::CaptureControl => "capture control",
            Region::LocateControl => "locate control",
            Region::FeedbackDisplay => "feedback display",
        }
    }
}

impl fmt::Display for Region {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Which regions are shown. Every combination comes from [`apply`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct VisibilitySet {
    pub task_selector: bool,
    pub back_control: bool,
    pub start_control: bool,
    pub capture_control: bool,
    pub locate_control: bool,
    pub feedback_display: bool,
}

impl VisibilitySet {
    pub fn is_visible(&self, region: Region) -> bool {
        match region {
            Region::TaskSelector => self.task_selector,
            Region::BackControl => self.back_control,
            Region::StartControl => self.start_control,
            Region::CaptureControl => self.capture_control,
            Region::LocateControl => self.locate_control,
            Region::FeedbackDisplay => self.feedback_display,
        }
    }

    pub fn visible_regions(&self) -> Vec<Region> {
        Region::ALL
            .into_iter()
            .filter(|region| self.is_visible(*region))
            .collect()
    }
}

/// Maps a task state to its visibility row.
pub fn apply(state: TaskState) -> VisibilitySet {
    let not_idle = state != TaskState::Idle;
    let tracking = matches!(state, TaskState::Tracking | TaskState::Completed);

    VisibilitySet {
        task_selector: !not_idle,
        back_control: not_idle,
        start_control: state == TaskState::TaskSummary,
        capture_control: tracking,
        locate_control: tracking,
        feedback_display: tracking,
    }
}

/// Result of entering a state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StateEntry {
    pub previous: TaskState,
    pub state: TaskState,
    pub visibility: VisibilitySet,
    /// Set when the checklists must be refreshed by pulling full snapshots.
    pub pull_checklists: bool,
}

/// Tracks the current task state and its derived visibility.
#[derive(Debug, Clone)]
pub struct WorkflowStateController {
    current: TaskState,
    visibility: VisibilitySet,
}

impl WorkflowStateController {
    pub fn new() -> Self {
        Self {
            current: TaskState::Idle,
            visibility: apply(TaskState::Idle),
        }
    }

    /// Record a manager-driven state change, re-entry included.
    pub fn enter(&mut self, state: TaskState) -> StateEntry {
        let previous = self.current;
        self.current = state;
        self.visibility = apply(state);

        StateEntry {
            previous,
            state,
            visibility: self.visibility,
            pull_checklists: state == TaskState::TaskSummary,
        }
    }

    pub fn state(&self) -> TaskState {
        self.current
    }

    pub fn visibility(&self) -> VisibilitySet {
        self.visibility
    }

    pub fn is_visible(&self, region: Region) -> bool {
        self.visibility.is_visible(region)
    }
}

impl Default for WorkflowStateController {
    fn default() -> Self {
        Self::new()
    }
}
