use crate::acquire::FileCandidate;
use crate::colorizer::HttpColorizer;
use crate::model::{
    InfoEvent, RunConfig, RunSummary, Theme, WorkflowEvent, DEFAULT_ENDPOINT,
};
use crate::orchestrator::{self, UiCommand};
use anyhow::{Context, Result};
use clap::Parser;
use std::io::Write;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;

/// Output line routing for stdout/stderr writer.
enum OutputLine {
    Stdout(String),
    Stderr(String),
}

/// Spawn a blocking writer for stdout/stderr to avoid blocking async tasks.
fn spawn_output_writer() -> (
    mpsc::UnboundedSender<OutputLine>,
    tokio::task::JoinHandle<()>,
) {
    let (tx, mut rx) = mpsc::unbounded_channel::<OutputLine>();
    let handle = tokio::task::spawn_blocking(move || {
        let stdout = std::io::stdout();
        let stderr = std::io::stderr();
        let mut out = std::io::LineWriter::new(stdout.lock());
        let mut err = std::io::LineWriter::new(stderr.lock());

        while let Some(line) = rx.blocking_recv() {
            match line {
                OutputLine::Stdout(msg) => {
                    let _ = writeln!(out, "{}", msg);
                }
                OutputLine::Stderr(msg) => {
                    let _ = writeln!(err, "{}", msg);
                }
            }
        }

        let _ = out.flush();
        let _ = err.flush();
    });
    (tx, handle)
}

#[derive(Debug, Parser, Clone)]
#[command(
    name = "colorize-cli",
    version,
    about = "Colorize grayscale images through a remote colorization service"
)]
pub struct Cli {
    /// Colorization endpoint (multipart POST, image in the `file` field)
    #[arg(long, default_value = DEFAULT_ENDPOINT)]
    pub endpoint: String,

    /// Where downloads are written [default: your Downloads folder]
    #[arg(long)]
    pub download_dir: Option<PathBuf>,

    /// Request timeout, e.g. 30s or 2m (no timeout unless given)
    #[arg(long)]
    pub timeout: Option<humantime::Duration>,

    /// Colorize this file once, save the result and exit (no TUI)
    #[arg(long)]
    pub input: Option<PathBuf>,

    /// Print the one-shot summary as JSON (needs --input)
    #[arg(long)]
    pub json: bool,

    /// Print the one-shot summary as text (needs --input; the default with it)
    #[arg(long, conflicts_with = "json")]
    pub text: bool,

    /// Initial TUI theme
    #[arg(long, value_enum, default_value_t = Theme::Dark)]
    pub theme: Theme,

    /// Write logs to this file while the TUI is running
    #[arg(long)]
    pub log_file: Option<PathBuf>,

    /// Debug-level logging
    #[arg(short, long)]
    pub verbose: bool,
}

/// Summary format for one-shot runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum OutputFormat {
    Text,
    Json,
}

impl Cli {
    /// Headless output requested explicitly, if any.
    fn output_format(&self) -> Option<OutputFormat> {
        if self.json {
            Some(OutputFormat::Json)
        } else if self.text {
            Some(OutputFormat::Text)
        } else {
            None
        }
    }
}

pub async fn run(args: Cli) -> Result<()> {
    let format = args.output_format();
    if let Some(input) = args.input.clone() {
        crate::logging::init_stderr(args.verbose);
        return run_once(args, input, format.unwrap_or(OutputFormat::Text)).await;
    }
    if format.is_some() {
        return Err(anyhow::anyhow!(
            "--text and --json describe a one-shot run; pass --input <FILE> as well"
        ));
    }

    #[cfg(feature = "tui")]
    {
        crate::logging::init_file(args.log_file.as_deref(), args.verbose)?;
        crate::tui::run(args).await
    }
    #[cfg(not(feature = "tui"))]
    {
        Err(anyhow::anyhow!(
            "built without TUI support; pass --input <FILE> to colorize a single image"
        ))
    }
}

/// Build a `RunConfig` from CLI arguments.
pub fn build_config(args: &Cli) -> RunConfig {
    RunConfig {
        endpoint: args.endpoint.clone(),
        download_dir: args
            .download_dir
            .clone()
            .unwrap_or_else(orchestrator::default_download_dir),
        request_timeout: args.timeout.map(Duration::from),
        user_agent: format!("colorize-cli/{}", env!("CARGO_PKG_VERSION")),
    }
}

/// One acquire/submit/download cycle without the TUI.
async fn run_once(args: Cli, input: PathBuf, format: OutputFormat) -> Result<()> {
    let candidate = FileCandidate::Picked(input.display().to_string());
    if candidate.resolve().is_none() {
        return Err(anyhow::anyhow!("--input needs a file path"));
    }
    let cfg = build_config(&args);
    let colorizer = Arc::new(HttpColorizer::new(&cfg)?);
    let (out_tx, out_handle) = spawn_output_writer();
    let (event_tx, mut event_rx) = mpsc::unbounded_channel::<WorkflowEvent>();
    let (cmd_tx, cmd_rx) = mpsc::unbounded_channel::<UiCommand>();

    let endpoint = cfg.endpoint.clone();
    let controller = tokio::spawn(orchestrator::run_controller(
        colorizer, cfg, event_tx, cmd_rx,
    ));
    let _ = cmd_tx.send(UiCommand::Select(candidate));

    let quiet = format == OutputFormat::Json;
    let summary = collect_summary(&endpoint, &mut event_rx, &cmd_tx, |msg| {
        if !quiet {
            let _ = out_tx.send(OutputLine::Stderr(msg));
        }
    })
    .await;
    let _ = cmd_tx.send(UiCommand::Quit);
    controller.await.context("controller task failed")?;

    match format {
        OutputFormat::Json => {
            let out = serde_json::to_string_pretty(&summary)?;
            let _ = out_tx.send(OutputLine::Stdout(out));
        }
        OutputFormat::Text => {
            for line in crate::text_summary::build_text_summary(&summary).lines {
                let _ = out_tx.send(OutputLine::Stdout(line));
            }
        }
    }
    drop(out_tx);
    let _ = out_handle.await;

    if summary.succeeded() {
        Ok(())
    } else {
        Err(anyhow::anyhow!(
            "{}",
            summary
                .error
                .unwrap_or_else(|| "colorization did not complete".into())
        ))
    }
}

/// Follow controller events for a single selection, requesting the download once
/// the result lands. Returns when both the result and the preview have settled.
async fn collect_summary(
    endpoint: &str,
    event_rx: &mut mpsc::UnboundedReceiver<WorkflowEvent>,
    cmd_tx: &mpsc::UnboundedSender<UiCommand>,
    mut progress: impl FnMut(String),
) -> RunSummary {
    let mut summary = RunSummary {
        timestamp_utc: time::OffsetDateTime::now_utc()
            .format(&time::format_description::well_known::Rfc3339)
            .unwrap_or_else(|_| "now".into()),
        endpoint: endpoint.to_string(),
        ..Default::default()
    };
    let mut preview_settled = false;
    let mut finished = false;

    while let Some(ev) = event_rx.recv().await {
        match ev {
            WorkflowEvent::StateChanged(state) => summary.state = state,
            WorkflowEvent::Acquired {
                name,
                media_type,
                size,
                ..
            } => {
                progress(format!("Submitting {name} ({media_type}, {size} bytes)"));
                summary.source = Some(name);
                summary.media_type = Some(media_type);
                summary.source_bytes = Some(size);
            }
            WorkflowEvent::PreviewReady { preview, .. } => {
                summary.preview_width = Some(preview.width);
                summary.preview_height = Some(preview.height);
                preview_settled = true;
            }
            WorkflowEvent::PreviewUnavailable { reason, .. } => {
                summary.preview_error = Some(reason);
                preview_settled = true;
            }
            WorkflowEvent::ResultReady { result, .. } => {
                progress(format!("Received {} bytes", result.bytes.len()));
                summary.result_bytes = Some(result.bytes.len());
                summary.result_media_type = Some(result.media_type.clone());
                let _ = cmd_tx.send(UiCommand::Download);
            }
            WorkflowEvent::SubmissionFailed { notice, .. } => {
                summary.error = Some(notice.replace("\n\n", " "));
                finished = true;
            }
            WorkflowEvent::Downloaded { path, .. } => {
                summary.saved_path = Some(path);
                finished = true;
            }
            WorkflowEvent::Info(InfoEvent::AcquireFailed { reason }) => {
                summary.error = Some(format!("could not open file: {reason}"));
                preview_settled = true;
                finished = true;
            }
            WorkflowEvent::Info(InfoEvent::DownloadFailed { reason }) => {
                summary.error = Some(format!("download failed: {reason}"));
                finished = true;
            }
            WorkflowEvent::Info(info) => progress(info.to_message()),
            WorkflowEvent::Cleared => {}
        }
        if finished && preview_settled {
            break;
        }
    }

    summary
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Generation, PreviewArtifact, ResultArtifact, Thumbnail, WorkflowState};
    use bytes::Bytes;

    fn parse(args: &[&str]) -> Cli {
        Cli::try_parse_from(std::iter::once("colorize-cli").chain(args.iter().copied()))
            .expect("parse")
    }

    #[test]
    fn defaults_target_local_service() {
        let cli = parse(&[]);
        let cfg = build_config(&cli);
        assert_eq!(cfg.endpoint, DEFAULT_ENDPOINT);
        assert_eq!(cfg.request_timeout, None);
        assert_eq!(cli.theme, Theme::Dark);
        assert!(cfg.user_agent.starts_with("colorize-cli/"));
    }

    #[test]
    fn timeout_and_download_dir_flow_into_config() {
        let cli = parse(&["--timeout", "30s", "--download-dir", "/tmp/out"]);
        let cfg = build_config(&cli);
        assert_eq!(cfg.request_timeout, Some(Duration::from_secs(30)));
        assert_eq!(cfg.download_dir, PathBuf::from("/tmp/out"));
    }

    #[test]
    fn output_flags_select_summary_format() {
        assert_eq!(parse(&[]).output_format(), None);
        assert_eq!(
            parse(&["--input", "photo.jpg", "--text"]).output_format(),
            Some(OutputFormat::Text)
        );
        assert_eq!(
            parse(&["--input", "photo.jpg", "--json"]).output_format(),
            Some(OutputFormat::Json)
        );
        assert!(Cli::try_parse_from(["colorize-cli", "--text", "--json"]).is_err());
    }

    #[tokio::test]
    async fn output_flags_without_input_are_rejected() {
        let err = run(parse(&["--text"])).await.expect_err("--text alone");
        assert!(err.to_string().contains("--input"));
        assert!(run(parse(&["--json"])).await.is_err());
    }

    fn preview_event(generation: Generation) -> WorkflowEvent {
        WorkflowEvent::PreviewReady {
            generation,
            preview: Box::new(PreviewArtifact {
                width: 640,
                height: 480,
                thumbnail: Thumbnail {
                    width: 1,
                    height: 1,
                    pixels: vec![[0, 0, 0]],
                },
            }),
        }
    }

    #[tokio::test]
    async fn summary_requests_download_after_result() {
        let (event_tx, mut event_rx) = mpsc::unbounded_channel();
        let (cmd_tx, mut cmd_rx) = mpsc::unbounded_channel();
        let g = Generation::default().next();

        event_tx
            .send(WorkflowEvent::StateChanged(WorkflowState::AwaitingResult))
            .expect("send");
        event_tx
            .send(WorkflowEvent::Acquired {
                generation: g,
                name: "photo.jpg".into(),
                media_type: "image/jpeg".into(),
                size: 1234,
            })
            .expect("send");
        event_tx
            .send(WorkflowEvent::StateChanged(WorkflowState::Ready))
            .expect("send");
        event_tx
            .send(WorkflowEvent::ResultReady {
                generation: g,
                result: Box::new(ResultArtifact {
                    bytes: Bytes::from_static(b"png"),
                    media_type: "image/png".into(),
                    thumbnail: None,
                }),
            })
            .expect("send");
        event_tx
            .send(WorkflowEvent::Downloaded {
                path: PathBuf::from("/tmp/colorized_image.png"),
                bytes: 3,
            })
            .expect("send");
        event_tx.send(preview_event(g)).expect("send");

        let mut messages = Vec::new();
        let summary = collect_summary("http://x", &mut event_rx, &cmd_tx, |m| messages.push(m)).await;

        assert!(matches!(cmd_rx.try_recv(), Ok(UiCommand::Download)));
        assert!(summary.succeeded());
        assert_eq!(summary.state, WorkflowState::Ready);
        assert_eq!(summary.source.as_deref(), Some("photo.jpg"));
        assert_eq!(summary.result_bytes, Some(3));
        assert_eq!(summary.preview_width, Some(640));
        assert!(messages[0].contains("photo.jpg"));
    }

    #[tokio::test]
    async fn summary_records_failure_without_download() {
        let (event_tx, mut event_rx) = mpsc::unbounded_channel();
        let (cmd_tx, mut cmd_rx) = mpsc::unbounded_channel();
        let g = Generation::default().next();

        event_tx
            .send(WorkflowEvent::StateChanged(WorkflowState::AwaitingResult))
            .expect("send");
        event_tx
            .send(WorkflowEvent::PreviewUnavailable {
                generation: g,
                reason: "cannot decode image".into(),
            })
            .expect("send");
        event_tx
            .send(WorkflowEvent::StateChanged(WorkflowState::Empty))
            .expect("send");
        event_tx
            .send(WorkflowEvent::SubmissionFailed {
                generation: g,
                notice: "Failed to colorize image. Please try again.\n\nHTTP 500".into(),
            })
            .expect("send");

        let summary = collect_summary("http://x", &mut event_rx, &cmd_tx, |_| {}).await;
        assert!(cmd_rx.try_recv().is_err());
        assert!(!summary.succeeded());
        assert_eq!(summary.state, WorkflowState::Empty);
        assert_eq!(
            summary.error.as_deref(),
            Some("Failed to colorize image. Please try again. HTTP 500")
        );
        assert_eq!(summary.preview_error.as_deref(), Some("cannot decode image"));
    }
}
