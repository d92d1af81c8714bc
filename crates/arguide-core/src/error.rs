/*
[INPUT]:  Local validation failures raised before any manager call
[OUTPUT]: UiError enum and crate Result alias
[POS]:    Error handling layer - typed errors for the UI core
[UPDATE]: When adding new fail-fast checks on user actions
*/

use thiserror::Error;

use crate::types::TaskState;
use crate::workflow::Region;

/// Errors raised locally by the UI core.
///
/// Failures of dispatched manager commands are not represented here; they are
/// reported to the observability sink and never returned to the caller.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum UiError {
    /// Selected index does not address a loaded task
    #[error("task index {index} out of range ({len} tasks loaded)")]
    TaskIndexOutOfRange { index: usize, len: usize },

    /// No task list has been received yet
    #[error("no tasks loaded")]
    NoTasksLoaded,

    /// Control pressed while its region is hidden
    #[error("{region} is not available while {state}")]
    ControlHidden { region: Region, state: TaskState },
}

pub type Result<T> = std::result::Result<T, UiError>;
