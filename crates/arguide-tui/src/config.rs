/*
[INPUT]:  YAML demo configuration file (or the built-in catalog)
[OUTPUT]: DemoConfig - UI settings, simulation knobs and scripted task catalog
[POS]:    Configuration layer - binary setup
[UPDATE]: When adding new simulation options or catalog fields
*/

use std::collections::HashSet;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};
use arguide_core::{CommandKind, ObjectId, UiConfig};
use serde::{Deserialize, Serialize};

const BUILTIN_CATALOG: &str = r#"
tasks:
  - id: espresso-descale
    title: Descale the espresso machine
    objects:
      - { id: 1, label: descaler bottle }
      - { id: 2, label: water tank }
      - { id: 3, label: cup, required: 2 }
    steps:
      - { description: "Empty the water tank ", objects: [2] }
      - { description: " Pour descaler into the tank", objects: [1, 2] }
      - { description: "Place cups under the spout", objects: [3] }
      - { description: "Run the descaling cycle" }
  - id: bike-chain
    title: Replace a bike chain
    objects:
      - { id: 10, label: chain tool }
      - { id: 11, label: new chain }
    steps:
      - { description: "Break the old chain", objects: [10] }
      - { description: "Thread the new chain", objects: [11] }
      - { description: "Join the chain", objects: [10, 11] }
"#;

/// Top-level configuration for the demo front-end
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct DemoConfig {
    /// Presentation settings passed to the UI core
    #[serde(default)]
    pub ui: UiConfig,
    /// Scripted manager behaviour
    #[serde(default)]
    pub simulation: SimulationConfig,
    /// Task catalog served by the scripted manager
    pub tasks: Vec<TaskScript>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct SimulationConfig {
    /// Delay between scripted engine updates, in milliseconds
    #[serde(default = "default_step_delay_ms")]
    pub step_delay_ms: u64,
    /// Commands the scripted engine rejects
    #[serde(default)]
    pub fail_commands: Vec<CommandKind>,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            step_delay_ms: default_step_delay_ms(),
            fail_commands: Vec::new(),
        }
    }
}

fn default_step_delay_ms() -> u64 {
    400
}

fn default_required() -> u32 {
    1
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct TaskScript {
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub objects: Vec<ObjectScript>,
    #[serde(default)]
    pub steps: Vec<StepScript>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ObjectScript {
    pub id: ObjectId,
    pub label: String,
    #[serde(default = "default_required")]
    pub required: u32,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct StepScript {
    pub description: String,
    /// Objects relevant to this step; empty means all task objects
    #[serde(default)]
    pub objects: Vec<ObjectId>,
}

impl DemoConfig {
    /// Load configuration from YAML file
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("read config {}", path.display()))?;
        Self::from_yaml(&content)
    }

    pub fn from_yaml(content: &str) -> Result<Self> {
        let config: Self = serde_yaml::from_str(content).context("parse config yaml")?;
        config.validate()?;
        Ok(config)
    }

    pub fn builtin() -> Result<Self> {
        Self::from_yaml(BUILTIN_CATALOG)
    }

    /// `<config dir>/arguide/demo.yaml`
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("arguide").join("demo.yaml"))
    }

    pub fn validate(&self) -> Result<()> {
        if self.tasks.is_empty() {
            bail!("config must list at least one task");
        }

        let mut task_ids = HashSet::new();
        for task in &self.tasks {
            if !task_ids.insert(task.id.as_str()) {
                bail!("duplicate task id: {}", task.id);
            }

            let mut object_ids = HashSet::new();
            for object in &task.objects {
                if !object_ids.insert(object.id) {
                    bail!("task {}: duplicate object id {}", task.id, object.id);
                }
            }

            for (idx, step) in task.steps.iter().enumerate() {
                if let Some(missing) = step.objects.iter().find(|id| !object_ids.contains(*id)) {
                    bail!(
                        "task {}: step {} references unknown object {}",
                        task.id,
                        idx + 1,
                        missing
                    );
                }
            }
        }
        Ok(())
    }
}
