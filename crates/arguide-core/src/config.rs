/*
[INPUT]:  YAML configuration (standalone file or embedded section)
[OUTPUT]: UiConfig with presentation defaults
[POS]:    Configuration layer - UI core settings
[UPDATE]: When adding new UI presentation options
*/

use anyhow::Context;
use serde::{Deserialize, Serialize};

pub const DEFAULT_COMPLETION_MESSAGE: &str = "Task completed!";

/// Presentation settings for the UI core.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct UiConfig {
    /// Shown when feedback reports completion without any text
    #[serde(default = "default_completion_message")]
    pub completion_message: String,
}

impl Default for UiConfig {
    fn default() -> Self {
        Self {
            completion_message: default_completion_message(),
        }
    }
}

fn default_completion_message() -> String {
    DEFAULT_COMPLETION_MESSAGE.to_string()
}

impl UiConfig {
    /// Parse a standalone `ui` document. Embedding configs deserialize it in place.
    pub fn from_yaml(content: &str) -> anyhow::Result<Self> {
        serde_yaml::from_str(content).context("parse ui config yaml")
    }
}
