//! Composite input script for one device session.

use super::batch::CommandBatch;
use super::marker::SessionMarker;
use crate::dialect::DialectDefinition;

/// One marker-wrapped command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScriptStep {
    /// Marker pair for this command.
    pub marker: SessionMarker,

    /// Input line emitting the begin token.
    pub begin_line: String,

    /// The command itself.
    pub command: String,

    /// Input line emitting the end token.
    pub end_line: String,
}

/// Full input for one session: paging directives, wrapped commands, terminator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ComposedScript {
    /// Paging-disable directives, sent first.
    pub preamble: Vec<String>,

    /// Marker-wrapped commands in batch order.
    pub steps: Vec<ScriptStep>,

    /// Session-terminating command.
    pub terminate: String,
}

impl ComposedScript {
    /// Literal script text, one input line per `\n`.
    pub fn render(&self) -> String {
        let mut script = String::new();
        for line in self.lines() {
            script.push_str(line);
            script.push('\n');
        }
        script
    }

    /// Input lines in delivery order.
    pub fn lines(&self) -> impl Iterator<Item = &str> {
        self.preamble
            .iter()
            .map(String::as_str)
            .chain(self.steps.iter().flat_map(|step| {
                [
                    step.begin_line.as_str(),
                    step.command.as_str(),
                    step.end_line.as_str(),
                ]
            }))
            .chain(std::iter::once(self.terminate.as_str()))
    }

    /// Marker pairs in batch order.
    pub fn markers(&self) -> Vec<SessionMarker> {
        self.steps.iter().map(|step| step.marker.clone()).collect()
    }

    /// Number of wrapped commands.
    pub fn len(&self) -> usize {
        self.steps.len()
    }

    /// Whether the script carries no commands.
    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }
}

/// Compose the session script for `batch` in `dialect`.
pub fn compose(batch: &CommandBatch, dialect: &DialectDefinition) -> ComposedScript {
    let steps = batch
        .iter()
        .enumerate()
        .map(|(index, command)| {
            let marker = SessionMarker::new(index);
            ScriptStep {
                begin_line: dialect.marker_line(&marker.begin),
                command: command.to_string(),
                end_line: dialect.marker_line(&marker.end),
                marker,
            }
        })
        .collect();

    ComposedScript {
        preamble: dialect.paging_directives.clone(),
        steps,
        terminate: dialect.terminate_command.clone(),
    }
}
