use crate::model::{
    Generation, PreviewArtifact, ResultArtifact, Theme, WorkflowEvent, WorkflowState,
};
use ratatui::style::Color;
use std::path::PathBuf;

/// What the header shows about the current selection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceInfo {
    pub name: String,
    pub media_type: String,
    pub size: usize,
}

/// Colors for the two themes.
#[derive(Debug, Clone, Copy)]
pub struct Palette {
    pub fg: Color,
    pub muted: Color,
    pub accent: Color,
    pub highlight: Color,
    pub error: Color,
}

impl Palette {
    pub fn for_theme(theme: Theme) -> Self {
        match theme {
            Theme::Dark => Self {
                fg: Color::White,
                muted: Color::Gray,
                accent: Color::Magenta,
                highlight: Color::Yellow,
                error: Color::Red,
            },
            Theme::Light => Self {
                fg: Color::Black,
                muted: Color::DarkGray,
                accent: Color::Blue,
                highlight: Color::Magenta,
                error: Color::Red,
            },
        }
    }
}

/// Everything the UI thread renders. Owned by the UI thread only and updated
/// from controller events plus local input.
#[derive(Debug, Default)]
pub struct UiState {
    pub theme: Theme,
    pub info: String,
    pub source: Option<SourceInfo>,
    pub generation: Option<Generation>,
    pub preview: Option<PreviewArtifact>,
    pub preview_error: Option<String>,
    // Last state published by the controller.
    pub workflow: WorkflowState,
    pub result: Option<ResultArtifact>,
    // Blocking failure notice; all other input is ignored while set.
    pub notice: Option<String>,
    // Path prompt buffer while the picker is open.
    pub prompt: Option<String>,
    pub show_help: bool,
    pub drag_over: bool,
    pub last_saved_path: Option<PathBuf>,
    pub tick: usize,
}

impl UiState {
    pub fn new(theme: Theme) -> Self {
        Self {
            theme,
            info: "Drop an image onto the terminal or press 'o' to choose a file.".into(),
            ..Default::default()
        }
    }

    pub fn palette(&self) -> Palette {
        Palette::for_theme(self.theme)
    }

    pub fn workflow_state(&self) -> WorkflowState {
        self.workflow
    }

    /// The drop zone is shown only while nothing is selected.
    pub fn shows_drop_zone(&self) -> bool {
        self.source.is_none()
    }

    pub fn has_blocking_overlay(&self) -> bool {
        self.notice.is_some()
    }

    fn is_current(&self, generation: Generation) -> bool {
        self.generation == Some(generation)
    }

    pub fn apply_event(&mut self, ev: WorkflowEvent) {
        match ev {
            WorkflowEvent::StateChanged(state) => self.workflow = state,
            WorkflowEvent::Acquired {
                generation,
                name,
                media_type,
                size,
            } => {
                self.generation = Some(generation);
                self.info = format!("Selected {name}");
                self.source = Some(SourceInfo {
                    name,
                    media_type,
                    size,
                });
                self.preview = None;
                self.preview_error = None;
                self.result = None;
                self.drag_over = false;
            }
            WorkflowEvent::PreviewReady {
                generation,
                preview,
            } => {
                if self.is_current(generation) {
                    self.preview = Some(*preview);
                }
            }
            WorkflowEvent::PreviewUnavailable { generation, reason } => {
                if self.is_current(generation) {
                    self.preview_error = Some(reason);
                }
            }
            WorkflowEvent::ResultReady { generation, result } => {
                if self.is_current(generation) {
                    self.result = Some(*result);
                    self.info = "Colorized. Press 'd' to download.".into();
                }
            }
            WorkflowEvent::SubmissionFailed { generation, notice } => {
                if self.is_current(generation) {
                    self.notice = Some(notice);
                }
            }
            WorkflowEvent::Cleared => {
                self.generation = None;
                self.source = None;
                self.preview = None;
                self.preview_error = None;
                self.result = None;
                self.info = "Ready for a new image.".into();
            }
            WorkflowEvent::Downloaded { path, bytes } => {
                self.info = format!(
                    "Saved {} ({bytes} bytes, press 'y' to copy path)",
                    path.display()
                );
                self.last_saved_path = Some(path);
            }
            WorkflowEvent::Info(info) => self.info = info.to_message(),
        }
    }

    pub fn dismiss_notice(&mut self) {
        self.notice = None;
    }

    pub fn toggle_theme(&mut self) {
        self.theme = self.theme.toggled();
    }

    pub fn spinner(&self) -> char {
        const FRAMES: [char; 4] = ['|', '/', '-', '\\'];
        FRAMES[self.tick % FRAMES.len()]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{InfoEvent, Thumbnail};
    use bytes::Bytes;

    fn acquired(generation: Generation) -> WorkflowEvent {
        WorkflowEvent::Acquired {
            generation,
            name: "photo.jpg".into(),
            media_type: "image/jpeg".into(),
            size: 10,
        }
    }

    fn preview(generation: Generation) -> WorkflowEvent {
        WorkflowEvent::PreviewReady {
            generation,
            preview: Box::new(PreviewArtifact {
                width: 4,
                height: 2,
                thumbnail: Thumbnail {
                    width: 1,
                    height: 1,
                    pixels: vec![[1, 1, 1]],
                },
            }),
        }
    }

    fn changed(state: WorkflowState) -> WorkflowEvent {
        WorkflowEvent::StateChanged(state)
    }

    fn result(generation: Generation) -> WorkflowEvent {
        WorkflowEvent::ResultReady {
            generation,
            result: Box::new(ResultArtifact {
                bytes: Bytes::from_static(b"png"),
                media_type: "image/png".into(),
                thumbnail: None,
            }),
        }
    }

    #[test]
    fn follows_a_successful_cycle() {
        let g = Generation::default().next();
        let mut state = UiState::new(Theme::Dark);
        assert!(state.shows_drop_zone());
        assert_eq!(state.workflow_state(), WorkflowState::Empty);

        state.drag_over = true;
        state.apply_event(changed(WorkflowState::AwaitingResult));
        state.apply_event(acquired(g));
        assert!(!state.shows_drop_zone());
        assert!(!state.drag_over);
        assert_eq!(state.workflow_state(), WorkflowState::AwaitingResult);

        state.apply_event(preview(g));
        state.apply_event(changed(WorkflowState::Ready));
        state.apply_event(result(g));
        assert!(state.preview.is_some());
        assert_eq!(state.workflow_state(), WorkflowState::Ready);
    }

    #[test]
    fn events_for_an_older_selection_are_ignored() {
        let old = Generation::default().next();
        let new = old.next();
        let mut state = UiState::new(Theme::Dark);
        state.apply_event(changed(WorkflowState::AwaitingResult));
        state.apply_event(acquired(old));
        state.apply_event(changed(WorkflowState::AwaitingResult));
        state.apply_event(acquired(new));

        state.apply_event(preview(old));
        state.apply_event(result(old));
        state.apply_event(WorkflowEvent::SubmissionFailed {
            generation: old,
            notice: "late".into(),
        });
        assert!(state.preview.is_none());
        assert!(state.notice.is_none());
        assert_eq!(state.workflow_state(), WorkflowState::AwaitingResult);
    }

    #[test]
    fn failure_raises_blocking_notice_and_keeps_source() {
        let g = Generation::default().next();
        let mut state = UiState::new(Theme::Dark);
        state.apply_event(changed(WorkflowState::AwaitingResult));
        state.apply_event(acquired(g));
        state.apply_event(changed(WorkflowState::Empty));
        state.apply_event(WorkflowEvent::SubmissionFailed {
            generation: g,
            notice: "Failed to colorize image. Please try again.".into(),
        });
        assert!(state.has_blocking_overlay());
        assert_eq!(state.workflow_state(), WorkflowState::Empty);
        assert!(state.source.is_some());

        state.dismiss_notice();
        assert!(!state.has_blocking_overlay());
    }

    #[test]
    fn cleared_returns_to_drop_zone_and_remembers_saved_path() {
        let g = Generation::default().next();
        let mut state = UiState::new(Theme::Light);
        state.apply_event(changed(WorkflowState::AwaitingResult));
        state.apply_event(acquired(g));
        state.apply_event(changed(WorkflowState::Ready));
        state.apply_event(result(g));
        state.apply_event(WorkflowEvent::Downloaded {
            path: PathBuf::from("/tmp/colorized_image.png"),
            bytes: 3,
        });
        state.apply_event(changed(WorkflowState::Empty));
        state.apply_event(WorkflowEvent::Cleared);

        assert!(state.shows_drop_zone());
        assert_eq!(state.workflow_state(), WorkflowState::Empty);
        assert!(state.result.is_none());
        assert_eq!(
            state.last_saved_path.as_deref(),
            Some(std::path::Path::new("/tmp/colorized_image.png"))
        );
        assert_eq!(state.theme, Theme::Light);
    }

    #[test]
    fn info_events_update_status_line() {
        let mut state = UiState::new(Theme::Dark);
        state.apply_event(WorkflowEvent::Info(InfoEvent::NothingToDownload));
        assert_eq!(state.info, "No colorized result to download yet.");
    }

    #[test]
    fn theme_toggles_back_and_forth() {
        let mut state = UiState::new(Theme::Dark);
        state.toggle_theme();
        assert_eq!(state.theme, Theme::Light);
        state.toggle_theme();
        assert_eq!(state.theme, Theme::Dark);
    }
}
