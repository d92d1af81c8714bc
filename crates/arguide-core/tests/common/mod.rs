/*
[INPUT]:  Test scenarios needing an instruction manager
[OUTPUT]: FakeManager recording commands and pulls, RecordingSink, fixtures
[POS]:    Test infrastructure - shared across integration tests
[UPDATE]: When the manager contract changes
*/

//! Common test utilities for arguide-core integration tests

use std::collections::HashSet;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use anyhow::{Result, bail};
use arguide_core::{
    CommandDispatcher, CommandKind, EventHub, FrontendUi, InstructionManager, ManagerEvent,
    ObjectEntry, ObjectProgress, ObservabilitySink, StepEntry, StepProgress, TaskDescriptor,
    UiConfig,
};
use async_trait::async_trait;

/// Manager double that records every command and pull.
#[derive(Default)]
pub struct FakeManager {
    hub: EventHub,
    calls: Mutex<Vec<(CommandKind, Option<String>)>>,
    failing: Mutex<HashSet<CommandKind>>,
    objects: Mutex<ObjectProgress>,
    steps: Mutex<StepProgress>,
    object_pulls: AtomicUsize,
    step_pulls: AtomicUsize,
}

#[allow(dead_code)]
impl FakeManager {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn emit(&self, event: ManagerEvent) {
        self.hub.emit(event);
    }

    /// Tear down the push feed the way a shutting-down engine would.
    pub fn close_feed(&self) {
        self.hub.close();
    }

    pub fn set_current_task(&self, objects: ObjectProgress, steps: StepProgress) {
        *self.objects.lock().unwrap() = objects;
        *self.steps.lock().unwrap() = steps;
    }

    pub fn fail(&self, command: CommandKind) {
        self.failing.lock().unwrap().insert(command);
    }

    pub fn calls(&self) -> Vec<(CommandKind, Option<String>)> {
        self.calls.lock().unwrap().clone()
    }

    pub fn object_pulls(&self) -> usize {
        self.object_pulls.load(Ordering::SeqCst)
    }

    pub fn step_pulls(&self) -> usize {
        self.step_pulls.load(Ordering::SeqCst)
    }

    fn record(&self, command: CommandKind, arg: Option<&str>) -> Result<()> {
        self.calls
            .lock()
            .unwrap()
            .push((command, arg.map(str::to_string)));
        if self.failing.lock().unwrap().contains(&command) {
            bail!("{command} rejected by engine");
        }
        Ok(())
    }
}

#[async_trait]
impl InstructionManager for FakeManager {
    fn events(&self) -> &EventHub {
        &self.hub
    }

    async fn select_task(&self, task_id: &str) -> Result<()> {
        self.record(CommandKind::SelectTask, Some(task_id))
    }

    async fn start_tracking(&self) -> Result<()> {
        self.record(CommandKind::StartTracking, None)
    }

    async fn capture_and_localize(&self) -> Result<()> {
        self.record(CommandKind::CaptureAndLocalize, None)
    }

    async fn track_step(&self) -> Result<()> {
        self.record(CommandKind::TrackStep, None)
    }

    async fn reset_to_task_selection(&self) -> Result<()> {
        self.record(CommandKind::ResetToTaskSelection, None)
    }

    fn all_objects_for_current_task(&self) -> ObjectProgress {
        self.object_pulls.fetch_add(1, Ordering::SeqCst);
        self.objects.lock().unwrap().clone()
    }

    fn all_steps_for_current_task(&self) -> StepProgress {
        self.step_pulls.fetch_add(1, Ordering::SeqCst);
        self.steps.lock().unwrap().clone()
    }
}

/// Sink that keeps reported failures for assertions.
#[derive(Default)]
pub struct RecordingSink {
    failures: Mutex<Vec<(CommandKind, String)>>,
}

#[allow(dead_code)]
impl RecordingSink {
    pub fn failures(&self) -> Vec<(CommandKind, String)> {
        self.failures.lock().unwrap().clone()
    }
}

impl ObservabilitySink for RecordingSink {
    fn report_failure(&self, command: CommandKind, error: &anyhow::Error) {
        self.failures
            .lock()
            .unwrap()
            .push((command, error.to_string()));
    }

    fn record_completion(&self, _command: CommandKind, _elapsed: Duration) {}
}

/// Attached frontend over `manager` with a recording sink.
pub fn attached_frontend(manager: &Arc<FakeManager>) -> (FrontendUi, Arc<RecordingSink>) {
    let sink = Arc::new(RecordingSink::default());
    let dispatcher = CommandDispatcher::new(sink.clone());
    let mut ui = FrontendUi::new(manager.clone(), dispatcher, UiConfig::default());
    ui.attach();
    (ui, sink)
}

#[allow(dead_code)]
pub fn sample_tasks() -> Vec<TaskDescriptor> {
    vec![
        TaskDescriptor::new("task-espresso", "Descale espresso machine"),
        TaskDescriptor::new("task-bike", "Replace bike chain"),
    ]
}

#[allow(dead_code)]
pub fn objects(entries: &[(u32, &str, u32, u32)]) -> ObjectProgress {
    entries
        .iter()
        .map(|(id, label, required, found)| (*id, ObjectEntry::new(*label, *required, *found)))
        .collect()
}

#[allow(dead_code)]
pub fn steps(entries: &[(u32, &str, bool)]) -> StepProgress {
    entries
        .iter()
        .map(|(id, description, completed)| StepEntry::new(*id, *description, *completed))
        .collect()
}
