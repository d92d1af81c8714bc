/*
[INPUT]:  External instruction/tracking engine
[OUTPUT]: InstructionManager trait - push feed, async commands, pull queries
[POS]:    Integration boundary - the only way the UI core reaches the engine
[UPDATE]: When the engine exposes new commands or queries
*/

use std::fmt;

use anyhow::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::events::EventHub;
use crate::types::{ObjectProgress, StepProgress};

/// Manager commands reachable from UI controls.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CommandKind {
    SelectTask,
    StartTracking,
    CaptureAndLocalize,
    TrackStep,
    ResetToTaskSelection,
}

impl CommandKind {
    pub fn label(self) -> &'static str {
        match self {
            CommandKind::SelectTask => "select-task",
            CommandKind::StartTracking => "start-tracking",
            CommandKind::CaptureAndLocalize => "capture-and-localize",
            CommandKind::TrackStep => "track-step",
            CommandKind::ResetToTaskSelection => "reset-to-task-selection",
        }
    }
}

impl fmt::Display for CommandKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Contract of the external instruction manager.
///
/// Implementations are injected into the UI core; nothing looks them up globally.
/// Commands complete asynchronously and report failure through `Result`. State
/// changes they cause arrive later on the push feed, not as return values.
#[async_trait]
pub trait InstructionManager: Send + Sync {
    /// Push feed the UI subscribes to.
    fn events(&self) -> &EventHub;

    async fn select_task(&self, task_id: &str) -> Result<()>;

    async fn start_tracking(&self) -> Result<()>;

    async fn capture_and_localize(&self) -> Result<()>;

    async fn track_step(&self) -> Result<()>;

    async fn reset_to_task_selection(&self) -> Result<()>;

    /// Full object set for the current task.
    fn all_objects_for_current_task(&self) -> ObjectProgress;

    /// Full ordered step list for the current task.
    fn all_steps_for_current_task(&self) -> StepProgress;
}
