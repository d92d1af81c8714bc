/*
[INPUT]:  InstructionManager push feed, pull queries, and user control presses
[OUTPUT]: FrontendUi - current visibility, checklist renders, feedback text, busy state
[POS]:    Composition layer - wires workflow, dispatcher and checklist together
[UPDATE]: 2026-10-12 Initial composition of workflow, dispatcher and reconciler
[UPDATE]: 2026-10-13 Gate control presses on region visibility
[UPDATE]: 2026-10-15 Clear the view when the manager returns to Idle on its own
[UPDATE]: 2026-10-16 Surface local rejections to the sink and detach on a closed feed
*/

use std::sync::Arc;

use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::checklist::{ChecklistReconciler, RenderedText};
use crate::config::UiConfig;
use crate::dispatcher::{BusyIndicator, CommandDispatcher};
use crate::error::{Result, UiError};
use crate::events::{EventKind, ManagerEvent, Subscription, TryRecvError};
use crate::manager::{CommandKind, InstructionManager};
use crate::types::{InstructionFeedback, TaskDescriptor, TaskState};
use crate::workflow::{Region, VisibilitySet, WorkflowStateController};

/// UI-side view of the task workflow.
///
/// All mutation happens through `&mut self` on the UI loop. Dispatched commands
/// only touch the busy indicator; their effects come back as push events.
pub struct FrontendUi {
    manager: Arc<dyn InstructionManager>,
    dispatcher: CommandDispatcher,
    config: UiConfig,
    workflow: WorkflowStateController,
    checklist: ChecklistReconciler,
    tasks: Vec<TaskDescriptor>,
    feedback_text: String,
    subscription: Option<Subscription>,
}

impl FrontendUi {
    pub fn new(
        manager: Arc<dyn InstructionManager>,
        dispatcher: CommandDispatcher,
        config: UiConfig,
    ) -> Self {
        Self {
            manager,
            dispatcher,
            config,
            workflow: WorkflowStateController::new(),
            checklist: ChecklistReconciler::new(),
            tasks: Vec::new(),
            feedback_text: String::new(),
            subscription: None,
        }
    }

    /// Subscribe to every push event of the manager. No-op when already attached.
    pub fn attach(&mut self) {
        if self.subscription.is_some() {
            return;
        }
        self.subscription = Some(self.manager.events().subscribe(EventKind::ALL));
        info!("attached to instruction manager");
    }

    /// Drop the subscription. Returns whether one was held.
    pub fn detach(&mut self) -> bool {
        let attached = self.subscription.take().is_some();
        if attached {
            info!("detached from instruction manager");
        }
        attached
    }

    pub fn is_attached(&self) -> bool {
        self.subscription.is_some()
    }

    /// Wait for the next push event. Pends forever while detached.
    pub async fn next_event(&mut self) -> Option<ManagerEvent> {
        let Some(subscription) = self.subscription.as_mut() else {
            return std::future::pending().await;
        };
        let event = subscription.recv().await;
        if event.is_none() {
            warn!("instruction manager feed closed");
            self.subscription = None;
        }
        event
    }

    /// Apply every event already queued. Returns how many were applied.
    ///
    /// Detaches when the feed turns out to be closed.
    pub fn process_pending(&mut self) -> usize {
        let mut applied = 0;
        while let Some(subscription) = self.subscription.as_mut() {
            match subscription.try_recv() {
                Ok(event) => {
                    self.handle_event(event);
                    applied += 1;
                }
                Err(TryRecvError::Empty) => break,
                Err(TryRecvError::Disconnected) => {
                    warn!("instruction manager feed closed");
                    self.subscription = None;
                }
            }
        }
        applied
    }

    pub fn handle_event(&mut self, event: ManagerEvent) {
        match event {
            ManagerEvent::TasksLoaded(tasks) => self.on_tasks_loaded(tasks),
            ManagerEvent::Feedback(feedback) => self.on_feedback(feedback),
            ManagerEvent::StateChanged(state) => self.on_state_changed(state),
            ManagerEvent::ObjectProgressUpdated(progress)
            | ManagerEvent::RelevantObjectsUpdated(progress) => {
                let render = self.checklist.apply_objects(progress);
                debug!(lines = render.len(), "object checklist updated");
            }
            ManagerEvent::StepProgressUpdated(steps) => {
                let render = self.checklist.apply_steps(steps);
                debug!(lines = render.len(), "step checklist updated");
            }
        }
    }

    fn on_tasks_loaded(&mut self, tasks: Vec<TaskDescriptor>) {
        info!(count = tasks.len(), "tasks loaded");
        self.tasks = tasks;
    }

    fn on_feedback(&mut self, feedback: InstructionFeedback) {
        info!(
            text = %feedback.text,
            task_completed = feedback.task_completed,
            "feedback received"
        );
        self.feedback_text = if feedback.task_completed && feedback.text.trim().is_empty() {
            self.config.completion_message.clone()
        } else {
            feedback.text
        };
    }

    fn on_state_changed(&mut self, state: TaskState) {
        let entry = self.workflow.enter(state);
        info!(from = %entry.previous, to = %entry.state, "task state changed");

        if state == TaskState::Idle && entry.previous != TaskState::Idle {
            self.clear_view();
        }

        if entry.pull_checklists {
            let objects = self.manager.all_objects_for_current_task();
            let steps = self.manager.all_steps_for_current_task();
            debug!(
                objects = objects.len(),
                steps = steps.len(),
                "pulled checklists for task summary"
            );
            self.checklist.apply_objects(objects);
            self.checklist.apply_steps(steps);
        }
    }

    /// Select the task at `index` in the loaded list and start a new run.
    pub fn select_task(&mut self, index: usize) -> Result<JoinHandle<bool>> {
        self.ensure_visible(Region::TaskSelector, CommandKind::SelectTask)?;
        let Some(task) = self.tasks.get(index) else {
            let err = if self.tasks.is_empty() {
                UiError::NoTasksLoaded
            } else {
                UiError::TaskIndexOutOfRange {
                    index,
                    len: self.tasks.len(),
                }
            };
            return Err(self.reject(CommandKind::SelectTask, err));
        };

        let task_id = task.id.clone();
        info!(task_id = %task_id, title = %task.title, "task selected");
        self.checklist.clear();

        let manager = Arc::clone(&self.manager);
        Ok(self.dispatcher.dispatch(CommandKind::SelectTask, move || async move {
            manager.select_task(&task_id).await
        }))
    }

    pub fn start_tracking(&mut self) -> Result<JoinHandle<bool>> {
        self.ensure_visible(Region::StartControl, CommandKind::StartTracking)?;
        let manager = Arc::clone(&self.manager);
        Ok(self.dispatcher.dispatch(CommandKind::StartTracking, move || async move {
            manager.start_tracking().await
        }))
    }

    /// Capture control: advance step tracking.
    pub fn capture(&mut self) -> Result<JoinHandle<bool>> {
        self.ensure_visible(Region::CaptureControl, CommandKind::TrackStep)?;
        let manager = Arc::clone(&self.manager);
        Ok(self.dispatcher.dispatch(CommandKind::TrackStep, move || async move {
            manager.track_step().await
        }))
    }

    /// Locate control: capture a frame and localize objects.
    pub fn locate(&mut self) -> Result<JoinHandle<bool>> {
        self.ensure_visible(Region::LocateControl, CommandKind::CaptureAndLocalize)?;
        let manager = Arc::clone(&self.manager);
        Ok(self.dispatcher.dispatch(CommandKind::CaptureAndLocalize, move || async move {
            manager.capture_and_localize().await
        }))
    }

    /// Back control: reset to task selection.
    pub fn back(&mut self) -> Result<JoinHandle<bool>> {
        self.ensure_visible(Region::BackControl, CommandKind::ResetToTaskSelection)?;
        Ok(self.reset())
    }

    /// Clear both checklists and the feedback text, then ask the manager to
    /// return to task selection. Valid from any state.
    pub fn reset(&mut self) -> JoinHandle<bool> {
        info!(state = %self.workflow.state(), "resetting to task selection");
        self.clear_view();
        let manager = Arc::clone(&self.manager);
        self.dispatcher
            .dispatch(CommandKind::ResetToTaskSelection, move || async move {
                manager.reset_to_task_selection().await
            })
    }

    fn clear_view(&mut self) {
        self.checklist.clear();
        self.feedback_text.clear();
    }

    fn ensure_visible(&self, region: Region, command: CommandKind) -> Result<()> {
        if self.workflow.is_visible(region) {
            return Ok(());
        }
        let state = self.workflow.state();
        Err(self.reject(command, UiError::ControlHidden { region, state }))
    }

    fn reject(&self, command: CommandKind, err: UiError) -> UiError {
        self.dispatcher.report_rejection(command, &err);
        err
    }

    pub fn state(&self) -> TaskState {
        self.workflow.state()
    }

    pub fn visibility(&self) -> VisibilitySet {
        self.workflow.visibility()
    }

    pub fn tasks(&self) -> &[TaskDescriptor] {
        &self.tasks
    }

    /// Options shown by the task selector.
    pub fn task_titles(&self) -> Vec<&str> {
        self.tasks.iter().map(|task| task.title.as_str()).collect()
    }

    /// Latest feedback text, regardless of feedback-display visibility.
    pub fn feedback_text(&self) -> &str {
        &self.feedback_text
    }

    /// Feedback text when the feedback display is visible.
    pub fn visible_feedback(&self) -> Option<&str> {
        self.workflow
            .is_visible(Region::FeedbackDisplay)
            .then_some(self.feedback_text.as_str())
    }

    pub fn object_render(&self) -> &RenderedText {
        self.checklist.object_render()
    }

    pub fn step_render(&self) -> &RenderedText {
        self.checklist.step_render()
    }

    pub fn busy(&self) -> &BusyIndicator {
        self.dispatcher.busy()
    }

    pub fn is_busy(&self) -> bool {
        self.dispatcher.busy().is_busy()
    }
}
