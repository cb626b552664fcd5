//! Workflow controller.
//!
//! Owns the [`Workflow`] record and applies every mutation from a single task.
//! Decoding and submission run in their own tasks and report back tagged with
//! the generation they started under, so a late answer for a superseded
//! selection is dropped here instead of reaching presentation layers.

use super::download::save_result;
use crate::acquire::{self, FileCandidate};
use crate::colorizer::{ColorizedPayload, Colorizer};
use crate::error::{AcquireError, DecodeError, SubmissionError};
use crate::model::{
    Generation, InfoEvent, PreviewArtifact, ResultArtifact, RunConfig, WorkflowEvent,
};
use crate::preview;
use crate::workflow::{Resolution, Ticket, Workflow};
use std::sync::Arc;
use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};

/// Commands emitted by UI layers.
#[derive(Debug, Clone)]
pub(crate) enum UiCommand {
    Select(FileCandidate),
    Reset,
    Download,
    Quit,
}

/// Result of a suspended step, delivered back to the controller task.
enum Completion {
    Preview {
        generation: Generation,
        outcome: Result<PreviewArtifact, DecodeError>,
    },
    Submission {
        generation: Generation,
        outcome: Result<ResultArtifact, SubmissionError>,
    },
}

struct Controller {
    colorizer: Arc<dyn Colorizer>,
    cfg: RunConfig,
    workflow: Workflow,
    event_tx: UnboundedSender<WorkflowEvent>,
    done_tx: UnboundedSender<Completion>,
}

impl Controller {
    fn emit(&self, ev: WorkflowEvent) {
        let _ = self.event_tx.send(ev);
    }

    /// Announce the state of the workflow record after a transition.
    fn publish_state(&self) {
        let state = self.workflow.state();
        tracing::debug!(
            generation = self.workflow.generation().value(),
            state = state.label(),
            "workflow state"
        );
        self.emit(WorkflowEvent::StateChanged(state));
    }

    async fn select(&mut self, candidate: FileCandidate) {
        let file = match acquire::acquire(&candidate).await {
            Ok(file) => file,
            Err(AcquireError::Empty) => {
                tracing::debug!("no file in selection; ignoring");
                return;
            }
            Err(e) => {
                tracing::warn!(error = %e, "could not acquire file");
                self.emit(WorkflowEvent::Info(InfoEvent::AcquireFailed {
                    reason: e.to_string(),
                }));
                return;
            }
        };

        let superseded = self.workflow.has_pending_request();
        let ticket = self.workflow.acquire(file);
        tracing::info!(
            generation = ticket.generation.value(),
            file = %ticket.file.name,
            path = %ticket.file.path.display(),
            bytes = ticket.file.len(),
            superseded,
            "file acquired"
        );
        self.publish_state();
        self.emit(WorkflowEvent::Acquired {
            generation: ticket.generation,
            name: ticket.file.name.clone(),
            media_type: ticket.file.media_type.clone(),
            size: ticket.file.len(),
        });

        self.spawn_preview(&ticket);
        self.spawn_submission(ticket);
        self.emit(WorkflowEvent::Info(InfoEvent::Submitting {
            endpoint: self.cfg.endpoint.clone(),
        }));
    }

    fn spawn_preview(&self, ticket: &Ticket) {
        let generation = ticket.generation;
        let file = ticket.file.clone();
        let done_tx = self.done_tx.clone();
        tokio::spawn(async move {
            let outcome = preview::generate_preview(file).await;
            let _ = done_tx.send(Completion::Preview {
                generation,
                outcome,
            });
        });
    }

    fn spawn_submission(&self, ticket: Ticket) {
        let request = self.colorizer.colorize(&ticket.file);
        let generation = ticket.generation;
        let done_tx = self.done_tx.clone();
        tokio::spawn(async move {
            // Run the request in its own task so a panic still resolves this generation.
            let outcome = match tokio::spawn(request).await {
                Ok(Ok(payload)) => Ok(into_artifact(payload).await),
                Ok(Err(e)) => Err(e),
                Err(e) => Err(SubmissionError::Task(e.to_string())),
            };
            let _ = done_tx.send(Completion::Submission {
                generation,
                outcome,
            });
        });
    }

    fn complete(&mut self, done: Completion) {
        match done {
            Completion::Preview {
                generation,
                outcome: Ok(preview),
            } => {
                if !self.workflow.commit_preview(generation, preview) {
                    tracing::debug!(generation = generation.value(), "discarding stale preview");
                    return;
                }
                if let Some(p) = self.workflow.preview() {
                    self.emit(WorkflowEvent::PreviewReady {
                        generation,
                        preview: Box::new(p.clone()),
                    });
                }
            }
            Completion::Preview {
                generation,
                outcome: Err(e),
            } => {
                if !self.workflow.is_current(generation) {
                    return;
                }
                tracing::info!(generation = generation.value(), error = %e, "no preview");
                self.emit(WorkflowEvent::PreviewUnavailable {
                    generation,
                    reason: e.to_string(),
                });
            }
            Completion::Submission {
                generation,
                outcome,
            } => match self.workflow.resolve_submission(generation, outcome) {
                Resolution::Committed => {
                    if let Some(r) = self.workflow.result() {
                        tracing::info!(
                            generation = generation.value(),
                            bytes = r.bytes.len(),
                            "colorized result ready"
                        );
                        self.publish_state();
                        self.emit(WorkflowEvent::ResultReady {
                            generation,
                            result: Box::new(r.clone()),
                        });
                    }
                }
                Resolution::Failed(e) => {
                    tracing::warn!(generation = generation.value(), error = %e, "colorization failed");
                    self.publish_state();
                    self.emit(WorkflowEvent::SubmissionFailed {
                        generation,
                        notice: e.notice(),
                    });
                }
                Resolution::Stale => {
                    tracing::debug!(
                        generation = generation.value(),
                        "discarding response for superseded request"
                    );
                }
            },
        }
    }

    fn reset(&mut self) {
        if self.workflow.reset() {
            tracing::info!(generation = self.workflow.generation().value(), "workflow reset");
            self.publish_state();
            self.emit(WorkflowEvent::Cleared);
        }
    }

    async fn download(&self) {
        let Some(result) = self.workflow.result() else {
            self.emit(WorkflowEvent::Info(InfoEvent::NothingToDownload));
            return;
        };
        let source = self.workflow.source().map_or("-", |s| s.name.as_str());
        match save_result(&self.cfg.download_dir, result).await {
            Ok(path) => {
                tracing::info!(path = %path.display(), source, "result saved");
                self.emit(WorkflowEvent::Downloaded {
                    path,
                    bytes: result.bytes.len(),
                });
            }
            Err(e) => {
                tracing::warn!(error = %e, "download failed");
                self.emit(WorkflowEvent::Info(InfoEvent::DownloadFailed {
                    reason: format!("{e:#}"),
                }));
            }
        }
    }
}

async fn into_artifact(payload: ColorizedPayload) -> ResultArtifact {
    let thumbnail = match preview::render_thumbnail(payload.bytes.clone()).await {
        Ok(t) => Some(t),
        Err(e) => {
            tracing::debug!(error = %e, "colorized payload is not displayable");
            None
        }
    };
    ResultArtifact {
        bytes: payload.bytes,
        media_type: payload.media_type,
        thumbnail,
    }
}

/// Drive the workflow from UI commands until `Quit` or the command channel closes.
pub(crate) async fn run_controller(
    colorizer: Arc<dyn Colorizer>,
    cfg: RunConfig,
    event_tx: UnboundedSender<WorkflowEvent>,
    mut cmd_rx: UnboundedReceiver<UiCommand>,
) {
    let (done_tx, mut done_rx) = mpsc::unbounded_channel::<Completion>();
    let mut ctrl = Controller {
        colorizer,
        cfg,
        workflow: Workflow::new(),
        event_tx,
        done_tx,
    };

    loop {
        tokio::select! {
            cmd = cmd_rx.recv() => {
                match cmd {
                    Some(UiCommand::Select(candidate)) => ctrl.select(candidate).await,
                    Some(UiCommand::Reset) => ctrl.reset(),
                    Some(UiCommand::Download) => ctrl.download().await,
                    Some(UiCommand::Quit) | None => break,
                }
            }
            // The controller holds a sender, so this channel never closes while we loop.
            Some(done) = done_rx.recv() => ctrl.complete(done),
        }
    }
}
