/*
[INPUT]:  FrontendUi driven by FakeManager events and control presses
[OUTPUT]: Workflow, dispatch and checklist behaviour verification
[POS]:    Integration test layer - UI core end to end
[UPDATE]: When changing event handling or control semantics
*/

mod common;

use arguide_core::{
    CommandKind, Completion, InstructionFeedback, ManagerEvent, Region, TaskState, UiError,
    render_objects, render_steps,
};
use common::{FakeManager, attached_frontend, objects, sample_tasks, steps};

fn push(manager: &FakeManager, ui: &mut arguide_core::FrontendUi, event: ManagerEvent) {
    manager.emit(event);
    ui.process_pending();
}

#[tokio::test]
async fn starts_idle_with_only_the_selector() {
    let manager = FakeManager::new();
    let (ui, _sink) = attached_frontend(&manager);

    assert_eq!(ui.state(), TaskState::Idle);
    assert_eq!(ui.visibility().visible_regions(), vec![Region::TaskSelector]);
    assert!(ui.object_render().is_empty());
    assert!(ui.step_render().is_empty());
    assert!(!ui.is_busy());
}

#[tokio::test]
async fn tasks_loaded_populates_selector_options() {
    let manager = FakeManager::new();
    let (mut ui, _sink) = attached_frontend(&manager);

    push(&manager, &mut ui, ManagerEvent::TasksLoaded(sample_tasks()));

    assert_eq!(
        ui.task_titles(),
        vec!["Descale espresso machine", "Replace bike chain"]
    );
}

#[tokio::test]
async fn selecting_a_task_calls_manager_with_its_id() {
    let manager = FakeManager::new();
    let (mut ui, sink) = attached_frontend(&manager);
    push(&manager, &mut ui, ManagerEvent::TasksLoaded(sample_tasks()));

    let handle = ui.select_task(1).expect("valid selection");
    assert!(ui.is_busy());
    assert!(handle.await.unwrap());

    assert!(!ui.is_busy());
    assert_eq!(
        manager.calls(),
        vec![(CommandKind::SelectTask, Some("task-bike".to_string()))]
    );
    assert!(sink.failures().is_empty());
}

#[tokio::test]
async fn out_of_range_selection_fails_locally() {
    let manager = FakeManager::new();
    let (mut ui, sink) = attached_frontend(&manager);
    push(&manager, &mut ui, ManagerEvent::TasksLoaded(sample_tasks()));

    let err = ui.select_task(9).unwrap_err();

    assert_eq!(err, UiError::TaskIndexOutOfRange { index: 9, len: 2 });
    assert!(manager.calls().is_empty());
    assert_eq!(ui.busy().times_shown(), 0);
    assert_eq!(
        sink.failures(),
        vec![(CommandKind::SelectTask, err.to_string())]
    );
}

#[tokio::test]
async fn selection_before_tasks_load_is_rejected() {
    let manager = FakeManager::new();
    let (mut ui, sink) = attached_frontend(&manager);

    assert_eq!(ui.select_task(0).unwrap_err(), UiError::NoTasksLoaded);
    assert!(manager.calls().is_empty());
    assert_eq!(
        sink.failures(),
        vec![(CommandKind::SelectTask, "no tasks loaded".to_string())]
    );
}

#[tokio::test]
async fn entering_task_summary_pulls_once_and_renders_the_pull() {
    let manager = FakeManager::new();
    let pulled_objects = objects(&[(1, "descaler", 1, 1), (4, "water tank", 1, 0)]);
    let pulled_steps = steps(&[(10, "Empty the tank", false), (11, "Add descaler ", false)]);
    manager.set_current_task(pulled_objects.clone(), pulled_steps.clone());
    let (mut ui, _sink) = attached_frontend(&manager);

    push(&manager, &mut ui, ManagerEvent::StateChanged(TaskState::TaskSummary));

    assert_eq!(manager.object_pulls(), 1);
    assert_eq!(manager.step_pulls(), 1);
    assert_eq!(ui.object_render(), &render_objects(&pulled_objects));
    assert_eq!(ui.step_render(), &render_steps(&pulled_steps));
    assert!(ui.visibility().start_control);
}

#[tokio::test]
async fn other_states_never_pull() {
    let manager = FakeManager::new();
    let (mut ui, _sink) = attached_frontend(&manager);

    for state in [
        TaskState::LocatingObjects,
        TaskState::ReadyToTrack,
        TaskState::Tracking,
        TaskState::Completed,
        TaskState::Idle,
    ] {
        push(&manager, &mut ui, ManagerEvent::StateChanged(state));
    }

    assert_eq!(manager.object_pulls(), 0);
    assert_eq!(manager.step_pulls(), 0);
}

#[tokio::test]
async fn newer_object_progress_leaves_no_stale_counts() {
    let manager = FakeManager::new();
    let (mut ui, _sink) = attached_frontend(&manager);

    push(
        &manager,
        &mut ui,
        ManagerEvent::ObjectProgressUpdated(objects(&[(7, "cup", 2, 1)])),
    );
    push(
        &manager,
        &mut ui,
        ManagerEvent::ObjectProgressUpdated(objects(&[(7, "cup", 2, 2)])),
    );

    let render = ui.object_render();
    assert_eq!(render.len(), 1);
    let line = render.find("cup: 2/2").expect("cup line");
    assert_eq!(line.completion, Completion::Satisfied);
    assert!(!render.to_string().contains("1/2"));
}

#[tokio::test]
async fn relevant_objects_replace_the_object_checklist() {
    let manager = FakeManager::new();
    let (mut ui, _sink) = attached_frontend(&manager);

    push(
        &manager,
        &mut ui,
        ManagerEvent::ObjectProgressUpdated(objects(&[(1, "chain", 1, 1), (2, "tool", 1, 1)])),
    );
    push(
        &manager,
        &mut ui,
        ManagerEvent::RelevantObjectsUpdated(objects(&[(2, "tool", 1, 0)])),
    );

    assert_eq!(ui.object_render().len(), 1);
    assert!(ui.object_render().find("tool: 0/1").is_some());
}

#[tokio::test]
async fn step_descriptions_are_trimmed_and_numbered() {
    let manager = FakeManager::new();
    let (mut ui, _sink) = attached_frontend(&manager);

    push(
        &manager,
        &mut ui,
        ManagerEvent::StepProgressUpdated(steps(&[(3, " tighten bolt ", false)])),
    );

    let line = &ui.step_render().lines()[0];
    assert_eq!(line.text, "1: tighten bolt");
    assert_eq!(line.completion, Completion::Pending);
}

#[tokio::test]
async fn blank_completion_feedback_shows_the_completion_message() {
    let manager = FakeManager::new();
    let (mut ui, _sink) = attached_frontend(&manager);
    push(&manager, &mut ui, ManagerEvent::StateChanged(TaskState::Completed));

    push(
        &manager,
        &mut ui,
        ManagerEvent::Feedback(InstructionFeedback::new("", true)),
    );

    assert_eq!(ui.visible_feedback(), Some("Task completed!"));
}

#[tokio::test]
async fn whitespace_completion_feedback_shows_the_completion_message() {
    let manager = FakeManager::new();
    let (mut ui, _sink) = attached_frontend(&manager);
    push(&manager, &mut ui, ManagerEvent::StateChanged(TaskState::Completed));

    push(
        &manager,
        &mut ui,
        ManagerEvent::Feedback(InstructionFeedback::new("  \n\t", true)),
    );

    assert_eq!(ui.visible_feedback(), Some("Task completed!"));
}

#[tokio::test]
async fn worded_completion_feedback_is_shown_verbatim() {
    let manager = FakeManager::new();
    let (mut ui, _sink) = attached_frontend(&manager);
    push(&manager, &mut ui, ManagerEvent::StateChanged(TaskState::Completed));

    push(
        &manager,
        &mut ui,
        ManagerEvent::Feedback(InstructionFeedback::new("Chain replaced, ride safe", true)),
    );

    assert_eq!(ui.visible_feedback(), Some("Chain replaced, ride safe"));
}

#[tokio::test]
async fn feedback_is_last_value_wins_and_hidden_outside_tracking() {
    let manager = FakeManager::new();
    let (mut ui, _sink) = attached_frontend(&manager);

    push(
        &manager,
        &mut ui,
        ManagerEvent::Feedback(InstructionFeedback::new("Loosen the nut", false)),
    );
    push(
        &manager,
        &mut ui,
        ManagerEvent::Feedback(InstructionFeedback::new("Now pull the chain", false)),
    );

    assert_eq!(ui.feedback_text(), "Now pull the chain");
    assert_eq!(ui.visible_feedback(), None);

    push(&manager, &mut ui, ManagerEvent::StateChanged(TaskState::Tracking));
    assert_eq!(ui.visible_feedback(), Some("Now pull the chain"));
}

#[tokio::test]
async fn reset_clears_everything_from_any_state() {
    for state in TaskState::ALL {
        let manager = FakeManager::new();
        manager.set_current_task(objects(&[(1, "bolt", 2, 0)]), steps(&[(1, "a", false)]));
        let (mut ui, _sink) = attached_frontend(&manager);

        push(
            &manager,
            &mut ui,
            ManagerEvent::ObjectProgressUpdated(objects(&[(1, "bolt", 2, 1)])),
        );
        push(
            &manager,
            &mut ui,
            ManagerEvent::StepProgressUpdated(steps(&[(1, "a", true)])),
        );
        push(
            &manager,
            &mut ui,
            ManagerEvent::Feedback(InstructionFeedback::new("keep going", false)),
        );
        push(&manager, &mut ui, ManagerEvent::StateChanged(state));

        let handle = ui.reset();

        assert!(ui.object_render().is_empty(), "objects after reset from {state}");
        assert!(ui.step_render().is_empty(), "steps after reset from {state}");
        assert_eq!(ui.feedback_text(), "");
        assert!(handle.await.unwrap());
        assert_eq!(
            manager.calls().last(),
            Some(&(CommandKind::ResetToTaskSelection, None))
        );
    }
}

#[tokio::test]
async fn back_is_only_available_outside_idle() {
    let manager = FakeManager::new();
    let (mut ui, _sink) = attached_frontend(&manager);

    assert_eq!(
        ui.back().unwrap_err(),
        UiError::ControlHidden {
            region: Region::BackControl,
            state: TaskState::Idle,
        }
    );

    push(&manager, &mut ui, ManagerEvent::StateChanged(TaskState::LocatingObjects));
    assert!(ui.back().unwrap().await.unwrap());
}

#[tokio::test]
async fn hidden_controls_never_reach_the_manager() {
    let manager = FakeManager::new();
    let (mut ui, sink) = attached_frontend(&manager);

    assert!(matches!(
        ui.start_tracking(),
        Err(UiError::ControlHidden { region: Region::StartControl, .. })
    ));
    assert!(matches!(
        ui.capture(),
        Err(UiError::ControlHidden { region: Region::CaptureControl, .. })
    ));
    assert!(matches!(
        ui.locate(),
        Err(UiError::ControlHidden { region: Region::LocateControl, .. })
    ));
    assert!(manager.calls().is_empty());

    let rejected: Vec<CommandKind> = sink.failures().into_iter().map(|(c, _)| c).collect();
    assert_eq!(
        rejected,
        vec![
            CommandKind::StartTracking,
            CommandKind::TrackStep,
            CommandKind::CaptureAndLocalize,
        ]
    );
    assert_eq!(ui.busy().times_shown(), 0);
}

#[tokio::test]
async fn failed_command_is_reported_and_workflow_stays_usable() {
    let manager = FakeManager::new();
    manager.fail(CommandKind::TrackStep);
    let (mut ui, sink) = attached_frontend(&manager);
    push(&manager, &mut ui, ManagerEvent::StateChanged(TaskState::Tracking));

    let ok = ui.capture().expect("capture visible").await.unwrap();

    assert!(!ok);
    assert!(!ui.is_busy());
    assert_eq!(ui.state(), TaskState::Tracking);
    assert_eq!(sink.failures().len(), 1);
    assert_eq!(sink.failures()[0].0, CommandKind::TrackStep);

    assert!(ui.locate().expect("locate visible").await.unwrap());
    assert_eq!(ui.busy().times_shown(), ui.busy().times_hidden());
}

#[tokio::test]
async fn control_presses_route_to_their_commands() {
    let manager = FakeManager::new();
    let (mut ui, _sink) = attached_frontend(&manager);

    push(&manager, &mut ui, ManagerEvent::StateChanged(TaskState::TaskSummary));
    ui.start_tracking().unwrap().await.unwrap();
    push(&manager, &mut ui, ManagerEvent::StateChanged(TaskState::Tracking));
    ui.capture().unwrap().await.unwrap();
    ui.locate().unwrap().await.unwrap();

    let commands: Vec<CommandKind> = manager.calls().into_iter().map(|(c, _)| c).collect();
    assert_eq!(
        commands,
        vec![
            CommandKind::StartTracking,
            CommandKind::TrackStep,
            CommandKind::CaptureAndLocalize,
        ]
    );
}

#[tokio::test]
async fn manager_returning_to_idle_clears_the_view() {
    let manager = FakeManager::new();
    let (mut ui, _sink) = attached_frontend(&manager);
    push(&manager, &mut ui, ManagerEvent::StateChanged(TaskState::Tracking));
    push(
        &manager,
        &mut ui,
        ManagerEvent::StepProgressUpdated(steps(&[(1, "a", false)])),
    );

    push(&manager, &mut ui, ManagerEvent::StateChanged(TaskState::Idle));

    assert!(ui.step_render().is_empty());
    assert_eq!(ui.visibility().visible_regions(), vec![Region::TaskSelector]);
}

#[tokio::test]
async fn detached_frontend_ignores_the_feed() {
    let manager = FakeManager::new();
    let (mut ui, _sink) = attached_frontend(&manager);

    assert!(ui.detach());
    assert!(!ui.is_attached());
    manager.emit(ManagerEvent::StateChanged(TaskState::Tracking));

    assert_eq!(ui.process_pending(), 0);
    assert_eq!(ui.state(), TaskState::Idle);
}

#[tokio::test]
async fn closed_feed_is_drained_then_detached() {
    let manager = FakeManager::new();
    let (mut ui, _sink) = attached_frontend(&manager);
    manager.emit(ManagerEvent::StateChanged(TaskState::LocatingObjects));

    manager.close_feed();

    assert_eq!(ui.process_pending(), 1);
    assert_eq!(ui.state(), TaskState::LocatingObjects);
    assert!(!ui.is_attached());
    assert_eq!(ui.process_pending(), 0);
}

#[tokio::test]
async fn re_entering_task_summary_pulls_again() {
    let manager = FakeManager::new();
    manager.set_current_task(objects(&[(1, "cup", 2, 1)]), steps(&[(1, "Rinse", false)]));
    let (mut ui, _sink) = attached_frontend(&manager);

    push(&manager, &mut ui, ManagerEvent::StateChanged(TaskState::TaskSummary));
    let refreshed = objects(&[(1, "cup", 2, 2)]);
    manager.set_current_task(refreshed.clone(), steps(&[(1, "Rinse", true)]));
    push(&manager, &mut ui, ManagerEvent::StateChanged(TaskState::TaskSummary));

    assert_eq!(manager.object_pulls(), 2);
    assert_eq!(manager.step_pulls(), 2);
    assert_eq!(ui.object_render(), &render_objects(&refreshed));
    assert!(ui.object_render().find("cup: 1/2").is_none());
}

#[tokio::test]
async fn next_event_yields_events_in_emission_order() {
    let manager = FakeManager::new();
    let (mut ui, _sink) = attached_frontend(&manager);

    manager.emit(ManagerEvent::StateChanged(TaskState::LocatingObjects));
    manager.emit(ManagerEvent::ObjectProgressUpdated(objects(&[(1, "cup", 1, 0)])));
    manager.emit(ManagerEvent::StateChanged(TaskState::ReadyToTrack));

    let mut seen = Vec::new();
    for _ in 0..3 {
        let event = ui.next_event().await.expect("queued event");
        seen.push(event.kind());
        ui.handle_event(event);
    }

    assert_eq!(
        seen,
        vec![
            arguide_core::EventKind::StateChanged,
            arguide_core::EventKind::ObjectProgressUpdated,
            arguide_core::EventKind::StateChanged,
        ]
    );
    assert_eq!(ui.state(), TaskState::ReadyToTrack);
    assert!(ui.object_render().find("cup: 0/1").is_some());
}

#[tokio::test]
async fn selecting_a_new_task_clears_previous_checklists() {
    let manager = FakeManager::new();
    let (mut ui, _sink) = attached_frontend(&manager);
    push(&manager, &mut ui, ManagerEvent::TasksLoaded(sample_tasks()));
    push(
        &manager,
        &mut ui,
        ManagerEvent::ObjectProgressUpdated(objects(&[(1, "cup", 1, 1)])),
    );

    ui.select_task(0).unwrap().await.unwrap();

    assert!(ui.object_render().is_empty());
}
