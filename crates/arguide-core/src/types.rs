/*
[INPUT]:  Snapshots pushed or pulled from the instruction manager
[OUTPUT]: TaskState, TaskDescriptor, ObjectProgress, StepProgress, InstructionFeedback
[POS]:    Domain types - data model shared by every UI component
[UPDATE]: When the manager contract adds fields or task states
*/

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

/// Identity of a detected object class as reported by the detector.
pub type ObjectId = u32;

/// Task lifecycle state, owned and advanced by the instruction manager.
///
/// Transitions are never computed locally; the UI only reacts to them.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskState {
    #[default]
    Idle,
    LocatingObjects,
    ReadyToTrack,
    TaskSummary,
    Tracking,
    Completed,
}

impl TaskState {
    pub const ALL: [TaskState; 6] = [
        TaskState::Idle,
        TaskState::LocatingObjects,
        TaskState::ReadyToTrack,
        TaskState::TaskSummary,
        TaskState::Tracking,
        TaskState::Completed,
    ];

    pub fn label(self) -> &'static str {
        match self {
            TaskState::Idle => "idle",
            TaskState::LocatingObjects => "locating objects",
            TaskState::ReadyToTrack => "ready to track",
            TaskState::TaskSummary => "task summary",
            TaskState::Tracking => "tracking",
            TaskState::Completed => "completed",
        }
    }
}

impl fmt::Display for TaskState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// A selectable task as listed by the manager.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskDescriptor {
    pub id: String,
    pub title: String,
}

impl TaskDescriptor {
    pub fn new(id: impl Into<String>, title: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
        }
    }
}

/// Detection progress for a single object class.
///
/// Counts missing from a snapshot deserialize as zero.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ObjectEntry {
    #[serde(default)]
    pub label: String,
    #[serde(default, alias = "required")]
    pub required_count: u32,
    #[serde(default, alias = "found")]
    pub found_count: u32,
}

impl ObjectEntry {
    pub fn new(label: impl Into<String>, required_count: u32, found_count: u32) -> Self {
        Self {
            label: label.into(),
            required_count,
            found_count,
        }
    }

    pub fn is_satisfied(&self) -> bool {
        self.found_count >= self.required_count
    }
}

/// Full object-detection snapshot, keyed by object id.
///
/// Always replaced wholesale; iteration order is ascending object id.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ObjectProgress {
    entries: BTreeMap<ObjectId, ObjectEntry>,
}

impl ObjectProgress {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, id: ObjectId, entry: ObjectEntry) -> Option<ObjectEntry> {
        self.entries.insert(id, entry)
    }

    pub fn get(&self, id: ObjectId) -> Option<&ObjectEntry> {
        self.entries.get(&id)
    }

    pub fn iter(&self) -> impl Iterator<Item = (ObjectId, &ObjectEntry)> {
        self.entries.iter().map(|(id, entry)| (*id, entry))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn all_satisfied(&self) -> bool {
        self.entries.values().all(ObjectEntry::is_satisfied)
    }
}

impl FromIterator<(ObjectId, ObjectEntry)> for ObjectProgress {
    fn from_iter<I: IntoIterator<Item = (ObjectId, ObjectEntry)>>(iter: I) -> Self {
        Self {
            entries: iter.into_iter().collect(),
        }
    }
}

/// One procedural step in display order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StepEntry {
    #[serde(default)]
    pub step_id: u32,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub completed: bool,
}

impl StepEntry {
    pub fn new(step_id: u32, description: impl Into<String>, completed: bool) -> Self {
        Self {
            step_id,
            description: description.into(),
            completed,
        }
    }
}

/// Ordered step list. Sequence order is display order, not `step_id` order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct StepProgress {
    steps: Vec<StepEntry>,
}

impl StepProgress {
    pub fn new(steps: Vec<StepEntry>) -> Self {
        Self { steps }
    }

    pub fn iter(&self) -> std::slice::Iter<'_, StepEntry> {
        self.steps.iter()
    }

    pub fn len(&self) -> usize {
        self.steps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    pub fn completed_count(&self) -> usize {
        self.steps.iter().filter(|step| step.completed).count()
    }
}

impl FromIterator<StepEntry> for StepProgress {
    fn from_iter<I: IntoIterator<Item = StepEntry>>(iter: I) -> Self {
        Self {
            steps: iter.into_iter().collect(),
        }
    }
}

/// Natural-language feedback for the current step. Last value wins.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct InstructionFeedback {
    #[serde(default)]
    pub text: String,
    #[serde(default)]
    pub task_completed: bool,
}

impl InstructionFeedback {
    pub fn new(text: impl Into<String>, task_completed: bool) -> Self {
        Self {
            text: text.into(),
            task_completed,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn satisfied_when_found_meets_required() {
        assert!(ObjectEntry::new("cup", 2, 2).is_satisfied());
        assert!(ObjectEntry::new("cup", 2, 3).is_satisfied());
        assert!(!ObjectEntry::new("cup", 2, 1).is_satisfied());
    }

    #[test]
    fn missing_counts_deserialize_as_zero() {
        let progress: ObjectProgress =
            serde_json::from_str(r#"{"7": {"label": "cup"}, "9": {"found": 3}}"#)
                .expect("valid snapshot");

        let cup = progress.get(7).expect("cup entry");
        assert_eq!(cup.required_count, 0);
        assert_eq!(cup.found_count, 0);

        let unlabeled = progress.get(9).expect("unlabeled entry");
        assert_eq!(unlabeled.label, "");
        assert_eq!(unlabeled.found_count, 3);
    }

    #[test]
    fn object_iteration_is_ordered_by_id() {
        let progress: ObjectProgress = [
            (9, ObjectEntry::new("wrench", 1, 0)),
            (2, ObjectEntry::new("bolt", 4, 4)),
        ]
        .into_iter()
        .collect();

        let ids: Vec<_> = progress.iter().map(|(id, _)| id).collect();
        assert_eq!(ids, vec![2, 9]);
        assert!(!progress.all_satisfied());
    }

    #[test]
    fn task_state_uses_snake_case_on_the_wire() {
        let json = serde_json::to_string(&TaskState::ReadyToTrack).expect("serialize");
        assert_eq!(json, "\"ready_to_track\"");
    }
}
