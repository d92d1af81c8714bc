/*
[INPUT]:  DemoConfig task catalog and simulation knobs
[OUTPUT]: SimulatedManager - scripted InstructionManager driving the demo UI
[POS]:    Engine stand-in - binary only, replaces the AR tracking backend
[UPDATE]: When the scripted engine gains new behaviour or commands
*/

use std::collections::HashSet;
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use anyhow::{Context, Result, bail};
use arguide_core::{
    CommandKind, EventHub, InstructionFeedback, InstructionManager, ManagerEvent, ObjectEntry,
    ObjectProgress, StepEntry, StepProgress, TaskDescriptor, TaskState,
};
use async_trait::async_trait;
use tracing::{debug, info, warn};

use crate::config::{DemoConfig, TaskScript};

#[derive(Debug, Default)]
struct Session {
    state: TaskState,
    task: Option<usize>,
    objects: ObjectProgress,
    steps: Vec<StepEntry>,
    /// Bumped on every reset so in-flight localization can tell it was abandoned.
    generation: u64,
}

impl Session {
    fn next_step(&self) -> Option<usize> {
        self.steps.iter().position(|step| !step.completed)
    }

    fn step_progress(&self) -> StepProgress {
        StepProgress::new(self.steps.clone())
    }
}

/// Scripted instruction manager.
///
/// Walks a task from the catalog through localization, summary, tracking and
/// completion, pushing the same events a real engine would.
pub struct SimulatedManager {
    hub: EventHub,
    catalog: Vec<TaskScript>,
    step_delay: Duration,
    failing: HashSet<CommandKind>,
    session: Mutex<Session>,
}

impl SimulatedManager {
    pub fn new(config: &DemoConfig) -> Self {
        Self {
            hub: EventHub::new(),
            catalog: config.tasks.clone(),
            step_delay: Duration::from_millis(config.simulation.step_delay_ms),
            failing: config.simulation.fail_commands.iter().copied().collect(),
            session: Mutex::new(Session::default()),
        }
    }

    pub fn tasks(&self) -> Vec<TaskDescriptor> {
        self.catalog
            .iter()
            .map(|task| TaskDescriptor::new(task.id.as_str(), task.title.as_str()))
            .collect()
    }

    /// Push the task catalog to subscribers. Returns how many received it.
    pub fn publish_tasks(&self) -> usize {
        let tasks = self.tasks();
        info!(count = tasks.len(), "publishing task catalog");
        self.hub.emit(ManagerEvent::TasksLoaded(tasks))
    }

    pub fn state(&self) -> TaskState {
        self.lock().state
    }

    fn lock(&self) -> MutexGuard<'_, Session> {
        self.session.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn ensure_accepts(&self, command: CommandKind) -> Result<()> {
        if self.failing.contains(&command) {
            warn!(command = %command, "scripted engine rejecting command");
            bail!("{command} rejected by scripted engine");
        }
        Ok(())
    }

    async fn pause(&self) {
        if !self.step_delay.is_zero() {
            tokio::time::sleep(self.step_delay).await;
        }
    }

    fn enter(&self, session: &mut Session, state: TaskState) {
        debug!(from = %session.state, to = %state, "scripted engine state change");
        session.state = state;
        self.hub.emit(ManagerEvent::StateChanged(state));
    }

    /// Enter `state` unless a reset happened since `generation` was taken.
    fn advance(&self, generation: u64, state: TaskState) -> bool {
        let mut session = self.lock();
        if session.generation != generation {
            debug!(state = %state, "run abandoned after reset");
            return false;
        }
        self.enter(&mut session, state);
        true
    }

    /// Objects relevant to the given step. Steps without a list use every object.
    fn relevant_objects(&self, session: &Session, step: Option<usize>) -> ObjectProgress {
        let Some(task) = session.task.and_then(|idx| self.catalog.get(idx)) else {
            return ObjectProgress::new();
        };
        let Some(script) = step.and_then(|idx| task.steps.get(idx)) else {
            return session.objects.clone();
        };
        if script.objects.is_empty() {
            return session.objects.clone();
        }
        session
            .objects
            .iter()
            .filter(|(id, _)| script.objects.contains(id))
            .map(|(id, entry)| (id, entry.clone()))
            .collect()
    }

    fn announce_step(&self, session: &Session, step: usize) {
        self.hub
            .emit(ManagerEvent::RelevantObjectsUpdated(self.relevant_objects(session, Some(step))));
        if let Some(entry) = session.steps.get(step) {
            let text = format!("Step {}: {}", step + 1, entry.description.trim());
            self.hub
                .emit(ManagerEvent::Feedback(InstructionFeedback::new(text, false)));
        }
    }

    fn complete(&self, session: &mut Session) {
        info!("scripted task completed");
        self.hub
            .emit(ManagerEvent::Feedback(InstructionFeedback::new("", true)));
        self.enter(session, TaskState::Completed);
    }
}

#[async_trait]
impl InstructionManager for SimulatedManager {
    fn events(&self) -> &EventHub {
        &self.hub
    }

    async fn select_task(&self, task_id: &str) -> Result<()> {
        self.ensure_accepts(CommandKind::SelectTask)?;
        let index = self
            .catalog
            .iter()
            .position(|task| task.id == task_id)
            .with_context(|| format!("unknown task id: {task_id}"))?;
        let task = &self.catalog[index];

        let generation = {
            let mut session = self.lock();
            if session.state != TaskState::Idle {
                bail!("cannot select a task while {}", session.state);
            }
            session.task = Some(index);
            session.objects = task
                .objects
                .iter()
                .map(|object| {
                    (
                        object.id,
                        ObjectEntry::new(object.label.as_str(), object.required, 0),
                    )
                })
                .collect();
            session.steps = task
                .steps
                .iter()
                .zip(1u32..)
                .map(|(step, id)| StepEntry::new(id, step.description.as_str(), false))
                .collect();
            self.enter(&mut session, TaskState::LocatingObjects);
            self.hub
                .emit(ManagerEvent::ObjectProgressUpdated(session.objects.clone()));
            session.generation
        };
        info!(task_id = %task_id, objects = task.objects.len(), "localizing task objects");

        for object in &task.objects {
            for found in 1..=object.required {
                self.pause().await;
                let mut session = self.lock();
                if session.generation != generation {
                    debug!(task_id = %task_id, "localization abandoned after reset");
                    return Ok(());
                }
                session.objects.insert(
                    object.id,
                    ObjectEntry::new(object.label.as_str(), object.required, found),
                );
                self.hub
                    .emit(ManagerEvent::ObjectProgressUpdated(session.objects.clone()));
            }
        }

        if !self.advance(generation, TaskState::ReadyToTrack) {
            return Ok(());
        }
        self.pause().await;
        self.advance(generation, TaskState::TaskSummary);
        Ok(())
    }

    async fn start_tracking(&self) -> Result<()> {
        self.ensure_accepts(CommandKind::StartTracking)?;
        let mut session = self.lock();
        if !matches!(
            session.state,
            TaskState::TaskSummary | TaskState::ReadyToTrack
        ) {
            bail!("cannot start tracking while {}", session.state);
        }

        self.enter(&mut session, TaskState::Tracking);
        self.hub
            .emit(ManagerEvent::StepProgressUpdated(session.step_progress()));
        match session.next_step() {
            Some(step) => self.announce_step(&session, step),
            None => self.complete(&mut session),
        }
        Ok(())
    }

    async fn capture_and_localize(&self) -> Result<()> {
        self.ensure_accepts(CommandKind::CaptureAndLocalize)?;
        self.pause().await;
        let session = self.lock();
        if !matches!(session.state, TaskState::Tracking | TaskState::Completed) {
            bail!("cannot localize while {}", session.state);
        }
        let relevant = self.relevant_objects(&session, session.next_step());
        debug!(objects = relevant.len(), "relocalized relevant objects");
        self.hub.emit(ManagerEvent::RelevantObjectsUpdated(relevant));
        Ok(())
    }

    async fn track_step(&self) -> Result<()> {
        self.ensure_accepts(CommandKind::TrackStep)?;
        self.pause().await;
        let mut session = self.lock();
        if session.state != TaskState::Tracking {
            bail!("cannot track a step while {}", session.state);
        }
        let Some(current) = session.next_step() else {
            bail!("no step left to track");
        };

        session.steps[current].completed = true;
        info!(step = current + 1, total = session.steps.len(), "step tracked");
        self.hub
            .emit(ManagerEvent::StepProgressUpdated(session.step_progress()));
        match session.next_step() {
            Some(step) => self.announce_step(&session, step),
            None => self.complete(&mut session),
        }
        Ok(())
    }

    async fn reset_to_task_selection(&self) -> Result<()> {
        self.ensure_accepts(CommandKind::ResetToTaskSelection)?;
        let mut session = self.lock();
        let generation = session.generation + 1;
        *session = Session {
            generation,
            ..Session::default()
        };
        self.hub.emit(ManagerEvent::StateChanged(TaskState::Idle));
        info!("scripted engine reset to task selection");
        Ok(())
    }

    fn all_objects_for_current_task(&self) -> ObjectProgress {
        self.lock().objects.clone()
    }

    fn all_steps_for_current_task(&self) -> StepProgress {
        self.lock().step_progress()
    }
}
