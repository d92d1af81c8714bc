/*
[INPUT]:  Public API exports for arguide-core crate
[OUTPUT]: Module declarations and public re-exports
[POS]:    Crate root - library entry point
[UPDATE]: When adding new modules or public exports
*/

pub mod checklist;
pub mod config;
pub mod dispatcher;
pub mod error;
pub mod events;
pub mod frontend;
pub mod manager;
pub mod types;
pub mod workflow;

// Re-export main types for convenience
pub use checklist::{
    ChecklistReconciler, Completion, RenderedLine, RenderedText, render_objects, render_steps,
};
pub use config::UiConfig;
pub use dispatcher::{BusyIndicator, CommandDispatcher, ObservabilitySink, TracingSink};
pub use error::UiError;
pub use events::{EventHub, EventKind, ManagerEvent, Subscription, TryRecvError};
pub use frontend::FrontendUi;
pub use manager::{CommandKind, InstructionManager};
pub use types::{
    InstructionFeedback, ObjectEntry, ObjectId, ObjectProgress, StepEntry, StepProgress,
    TaskDescriptor, TaskState,
};
pub use workflow::{Region, VisibilitySet, WorkflowStateController};
