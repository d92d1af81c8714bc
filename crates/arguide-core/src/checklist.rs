/*
[INPUT]:  ObjectProgress and StepProgress snapshots (push updates and pulls)
[OUTPUT]: RenderedText checklists with satisfied/pending markers
[POS]:    Checklist layer - whole-render reconciliation of progress collections
[UPDATE]: When line formats or marker rules change
*/

use std::fmt;

use crate::types::{ObjectProgress, StepProgress};

/// Completion status of a rendered line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Completion {
    Satisfied,
    Pending,
}

impl Completion {
    pub fn from_satisfied(satisfied: bool) -> Self {
        if satisfied {
            Completion::Satisfied
        } else {
            Completion::Pending
        }
    }

    pub fn marker(self) -> &'static str {
        match self {
            Completion::Satisfied => "[x]",
            Completion::Pending => "[ ]",
        }
    }

    pub fn is_satisfied(self) -> bool {
        self == Completion::Satisfied
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RenderedLine {
    pub text: String,
    pub completion: Completion,
}

impl fmt::Display for RenderedLine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.completion.marker(), self.text)
    }
}

/// A complete checklist render. Each update replaces the previous one.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RenderedText {
    lines: Vec<RenderedLine>,
}

impl RenderedText {
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn lines(&self) -> &[RenderedLine] {
        &self.lines
    }

    pub fn len(&self) -> usize {
        self.lines.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    pub fn find(&self, text: &str) -> Option<&RenderedLine> {
        self.lines.iter().find(|line| line.text == text)
    }
}

impl fmt::Display for RenderedText {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (idx, line) in self.lines.iter().enumerate() {
            if idx > 0 {
                f.write_str("\n")?;
            }
            write!(f, "{line}")?;
        }
        Ok(())
    }
}

/// Render one `label: found/required` line per object, ascending by object id.
pub fn render_objects(progress: &ObjectProgress) -> RenderedText {
    let lines = progress
        .iter()
        .map(|(id, entry)| {
            let label = entry.label.trim();
            let text = if label.is_empty() {
                format!("object #{id}: {}/{}", entry.found_count, entry.required_count)
            } else {
                format!("{label}: {}/{}", entry.found_count, entry.required_count)
            };
            RenderedLine {
                text,
                completion: Completion::from_satisfied(entry.is_satisfied()),
            }
        })
        .collect();

    RenderedText { lines }
}

/// Render one `n: description` line per step, numbered from 1 in sequence order.
pub fn render_steps(steps: &StepProgress) -> RenderedText {
    let lines = steps
        .iter()
        .enumerate()
        .map(|(idx, step)| RenderedLine {
            text: format!("{}: {}", idx + 1, step.description.trim()),
            completion: Completion::from_satisfied(step.completed),
        })
        .collect();

    RenderedText { lines }
}

/// Owns the latest object and step snapshots together with their renders.
#[derive(Debug, Clone, Default)]
pub struct ChecklistReconciler {
    objects: ObjectProgress,
    steps: StepProgress,
    object_render: RenderedText,
    step_render: RenderedText,
}

impl ChecklistReconciler {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn apply_objects(&mut self, progress: ObjectProgress) -> &RenderedText {
        self.object_render = render_objects(&progress);
        self.objects = progress;
        &self.object_render
    }

    pub fn apply_steps(&mut self, steps: StepProgress) -> &RenderedText {
        self.step_render = render_steps(&steps);
        self.steps = steps;
        &self.step_render
    }

    /// Drop both snapshots and replace both renders with empty ones.
    pub fn clear(&mut self) {
        *self = Self::default();
    }

    pub fn objects(&self) -> &ObjectProgress {
        &self.objects
    }

    pub fn steps(&self) -> &StepProgress {
        &self.steps
    }

    pub fn object_render(&self) -> &RenderedText {
        &self.object_render
    }

    pub fn step_render(&self) -> &RenderedText {
        &self.step_render
    }
}
