//! The submission workflow as one explicit state record.
//!
//! Every mutation goes through a transition method. Asynchronous completions
//! must present the [`Generation`] they were started under; anything issued
//! before the latest selection or reset is rejected without side effects.

use crate::error::SubmissionError;
use crate::model::{Generation, PreviewArtifact, ResultArtifact, SourceFile, WorkflowState};

/// Work to start after a file has been acquired.
#[derive(Debug, Clone)]
pub struct Ticket {
    pub generation: Generation,
    pub file: SourceFile,
}

#[derive(Debug)]
pub enum Resolution {
    Committed,
    Failed(SubmissionError),
    Stale,
}

#[derive(Debug, Default)]
pub struct Workflow {
    generation: Generation,
    source: Option<SourceFile>,
    preview: Option<PreviewArtifact>,
    // Generation of the single authoritative outstanding request.
    pending: Option<Generation>,
    result: Option<ResultArtifact>,
}

impl Workflow {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> WorkflowState {
        if self.pending.is_some() {
            WorkflowState::AwaitingResult
        } else if self.result.is_some() {
            WorkflowState::Ready
        } else {
            WorkflowState::Empty
        }
    }

    pub fn generation(&self) -> Generation {
        self.generation
    }

    pub fn is_current(&self, generation: Generation) -> bool {
        self.source.is_some() && self.generation == generation
    }

    pub fn source(&self) -> Option<&SourceFile> {
        self.source.as_ref()
    }

    pub fn preview(&self) -> Option<&PreviewArtifact> {
        self.preview.as_ref()
    }

    pub fn result(&self) -> Option<&ResultArtifact> {
        self.result.as_ref()
    }

    pub fn has_pending_request(&self) -> bool {
        self.pending.is_some()
    }

    /// Replace whatever is in progress with a fresh cycle for `file`.
    ///
    /// Selecting identical bytes again is a new, independent cycle.
    pub fn acquire(&mut self, file: SourceFile) -> Ticket {
        self.generation = self.generation.next();
        self.preview = None;
        self.result = None;
        self.pending = Some(self.generation);
        self.source = Some(file.clone());
        Ticket {
            generation: self.generation,
            file,
        }
    }

    /// Returns false when the preview belongs to a superseded selection.
    pub fn commit_preview(&mut self, generation: Generation, preview: PreviewArtifact) -> bool {
        if !self.is_current(generation) {
            return false;
        }
        self.preview = Some(preview);
        true
    }

    pub fn resolve_submission(
        &mut self,
        generation: Generation,
        outcome: Result<ResultArtifact, SubmissionError>,
    ) -> Resolution {
        if self.pending != Some(generation) {
            return Resolution::Stale;
        }
        self.pending = None;
        match outcome {
            Ok(result) => {
                self.result = Some(result);
                Resolution::Committed
            }
            // Source and preview stay so the user still sees what failed.
            Err(e) => Resolution::Failed(e),
        }
    }

    /// Clear everything. Returns false when there was nothing to clear.
    pub fn reset(&mut self) -> bool {
        if self.source.is_none() && self.pending.is_none() && self.result.is_none() {
            return false;
        }
        self.generation = self.generation.next();
        self.source = None;
        self.preview = None;
        self.pending = None;
        self.result = None;
        true
    }
}
