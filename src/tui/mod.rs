mod export;
mod help;
mod image_view;
mod state;

use crate::acquire::{self, FileCandidate};
use crate::cli::{build_config, Cli};
use crate::colorizer::HttpColorizer;
use crate::model::{Theme, WorkflowEvent, WorkflowState};
use crate::orchestrator::{self, UiCommand};
use anyhow::{Context, Result};
use crossterm::{
    event::{
        self, DisableBracketedPaste, DisableMouseCapture, EnableBracketedPaste,
        EnableMouseCapture, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers, MouseEventKind,
    },
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use image_view::ThumbnailView;
use ratatui::{
    backend::CrosstermBackend,
    layout::{Constraint, Direction, Layout, Position, Rect},
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Block, BorderType, Borders, Clear, Paragraph, Wrap},
    Terminal,
};
use state::UiState;
use std::sync::Arc;
use std::{io, time::Duration, time::Instant};
use tokio::sync::mpsc;
use tokio::sync::mpsc::{UnboundedReceiver, UnboundedSender};

pub async fn run(args: Cli) -> Result<()> {
    let cfg = build_config(&args);
    let colorizer = Arc::new(HttpColorizer::new(&cfg)?);

    // Unbounded channels keep the controller from ever waiting on the UI.
    let (event_tx, event_rx) = mpsc::unbounded_channel::<WorkflowEvent>();
    let (cmd_tx, cmd_rx) = mpsc::unbounded_channel::<UiCommand>();

    // TUI runs in a dedicated thread to keep all blocking I/O out of the Tokio runtime.
    let theme = args.theme;
    let ui_handle = std::thread::spawn(move || run_threaded(theme, event_rx, cmd_tx));

    orchestrator::run_controller(colorizer, cfg, event_tx, cmd_rx).await;

    let join_res = tokio::task::spawn_blocking(move || ui_handle.join()).await;
    match join_res {
        Ok(Ok(res)) => res,
        Ok(Err(_)) => Err(anyhow::anyhow!("TUI thread panicked")),
        Err(e) => Err(anyhow::anyhow!("join TUI thread: {e}")),
    }
}

/// What a key press asks the loop to do.
#[derive(Debug)]
enum Action {
    None,
    Send(UiCommand),
    CopyPath,
    Quit,
}

/// Run the TUI loop on a dedicated thread.
fn run_threaded(
    theme: Theme,
    mut event_rx: UnboundedReceiver<WorkflowEvent>,
    cmd_tx: UnboundedSender<UiCommand>,
) -> Result<()> {
    enable_raw_mode().context("enable raw mode")?;
    let mut stdout = io::stdout();
    execute!(
        stdout,
        EnterAlternateScreen,
        EnableBracketedPaste,
        EnableMouseCapture
    )
    .ok();

    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend).context("create terminal")?;
    terminal.clear().ok();

    let mut state = UiState::new(theme);
    let tick_rate = Duration::from_millis(100);
    let mut last_tick = Instant::now();

    let res = loop {
        while let Ok(ev) = event_rx.try_recv() {
            state.apply_event(ev);
        }

        if last_tick.elapsed() >= tick_rate {
            state.tick = state.tick.wrapping_add(1);
            terminal.draw(|f| draw(f.area(), f, &state)).ok();
            last_tick = Instant::now();
        }

        // Poll input with a short timeout to avoid blocking the render loop.
        if !event::poll(Duration::from_millis(10)).unwrap_or(false) {
            continue;
        }
        let action = match event::read() {
            Ok(Event::Key(k)) if k.kind == KeyEventKind::Press => handle_key(&mut state, k),
            Ok(Event::Paste(text)) => handle_paste(&mut state, text),
            Ok(Event::Mouse(m)) => {
                if matches!(m.kind, MouseEventKind::Moved | MouseEventKind::Drag(_)) {
                    let area = terminal
                        .size()
                        .map(|s| Rect::new(0, 0, s.width, s.height))
                        .unwrap_or_default();
                    state.drag_over = state.shows_drop_zone()
                        && drop_zone_area(area).contains(Position::new(m.column, m.row));
                }
                Action::None
            }
            _ => Action::None,
        };

        match action {
            Action::None => {}
            Action::Send(cmd) => {
                let _ = cmd_tx.send(cmd);
            }
            Action::CopyPath => copy_saved_path(&mut state),
            Action::Quit => {
                let _ = cmd_tx.send(UiCommand::Quit);
                break Ok(());
            }
        }
    };

    disable_raw_mode().ok();
    let mut stdout = io::stdout();
    execute!(
        stdout,
        DisableMouseCapture,
        DisableBracketedPaste,
        LeaveAlternateScreen
    )
    .ok();
    res
}

fn handle_key(state: &mut UiState, k: KeyEvent) -> Action {
    if k.modifiers.contains(KeyModifiers::CONTROL) && k.code == KeyCode::Char('c') {
        return Action::Quit;
    }

    // The failure notice swallows everything until dismissed.
    if state.has_blocking_overlay() {
        if matches!(k.code, KeyCode::Enter | KeyCode::Esc) {
            state.dismiss_notice();
        }
        return Action::None;
    }

    if let Some(buf) = state.prompt.as_mut() {
        match k.code {
            KeyCode::Enter => {
                let text = std::mem::take(buf);
                state.prompt = None;
                return Action::Send(UiCommand::Select(FileCandidate::Picked(text)));
            }
            // Cancelling the picker leaves the workflow untouched.
            KeyCode::Esc => state.prompt = None,
            KeyCode::Backspace => {
                buf.pop();
            }
            KeyCode::Char(c) => buf.push(c),
            _ => {}
        }
        return Action::None;
    }

    if state.show_help {
        match k.code {
            KeyCode::Char('q') => return Action::Quit,
            KeyCode::Char('?') | KeyCode::Esc | KeyCode::Enter => state.show_help = false,
            _ => {}
        }
        return Action::None;
    }

    match k.code {
        KeyCode::Char('q') => Action::Quit,
        KeyCode::Char('o') => {
            state.prompt = Some(String::new());
            Action::None
        }
        KeyCode::Char('n') => Action::Send(UiCommand::Reset),
        KeyCode::Char('d') => Action::Send(UiCommand::Download),
        KeyCode::Char('y') => Action::CopyPath,
        KeyCode::Char('t') => {
            state.toggle_theme();
            Action::None
        }
        KeyCode::Char('?') => {
            state.show_help = true;
            Action::None
        }
        _ => Action::None,
    }
}

/// Terminals deliver a dragged file as a bracketed paste of its path.
fn handle_paste(state: &mut UiState, text: String) -> Action {
    if state.has_blocking_overlay() {
        return Action::None;
    }
    if let Some(buf) = state.prompt.as_mut() {
        buf.push_str(text.trim_end_matches(['\r', '\n']));
        return Action::None;
    }
    state.drag_over = false;
    Action::Send(UiCommand::Select(FileCandidate::Dropped(text)))
}

fn copy_saved_path(state: &mut UiState) {
    let Some(path) = state.last_saved_path.as_ref() else {
        state.info = "Nothing saved yet. Press 'd' after a result arrives.".into();
        return;
    };
    let path = path.display().to_string();
    state.info = match export::copy_to_clipboard(&path) {
        Ok(()) => format!("Copied to clipboard: {}", export::display_path(&path, 60)),
        Err(e) => format!("Clipboard copy failed: {e:#}"),
    };
}

fn main_layout(area: Rect) -> [Rect; 3] {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3),
            Constraint::Min(0),
            Constraint::Length(3),
        ])
        .split(area);
    [chunks[0], chunks[1], chunks[2]]
}

fn centered(area: Rect, percent_x: u16, height: u16) -> Rect {
    let width = (area.width as u32 * percent_x as u32 / 100) as u16;
    let height = height.min(area.height);
    Rect::new(
        area.x + (area.width - width) / 2,
        area.y + (area.height - height) / 2,
        width,
        height,
    )
}

fn drop_zone_area(area: Rect) -> Rect {
    let body = main_layout(area)[1];
    centered(body, 70, (body.height * 2 / 3).max(5))
}

fn draw(area: Rect, f: &mut ratatui::Frame, state: &UiState) {
    let palette = state.palette();
    let [header, body, footer] = main_layout(area);

    let mut title = vec![
        Span::styled(
            "colorize-cli",
            Style::default()
                .fg(palette.accent)
                .add_modifier(Modifier::BOLD),
        ),
        Span::raw("  "),
        Span::styled(
            state.workflow_state().label(),
            Style::default().fg(palette.highlight),
        ),
    ];
    if let Some(src) = state.source.as_ref() {
        title.push(Span::raw(format!(
            "  {} ({}, {} bytes)",
            src.name, src.media_type, src.size
        )));
    }
    f.render_widget(
        Paragraph::new(Line::from(title))
            .style(Style::default().fg(palette.fg))
            .block(Block::default().borders(Borders::ALL)),
        header,
    );

    if state.shows_drop_zone() {
        draw_drop_zone(body, f, state);
    } else {
        draw_panes(body, f, state);
    }

    let status = Paragraph::new(Line::from(vec![
        Span::styled("Info: ", Style::default().fg(palette.muted)),
        Span::raw(state.info.as_str()),
    ]))
    .style(Style::default().fg(palette.fg))
    .block(
        Block::default()
            .borders(Borders::ALL)
            .title("o open | n new | d download | y copy path | t theme | ? help | q quit"),
    );
    f.render_widget(status, footer);

    if state.show_help {
        help::draw_help(centered(area, 70, 16), f, palette);
    }
    if let Some(input) = state.prompt.as_deref() {
        draw_prompt(centered(area, 80, 5), f, state, input);
    }
    if let Some(notice) = state.notice.as_deref() {
        draw_notice(centered(area, 60, 9), f, state, notice);
    }
}

fn draw_drop_zone(body: Rect, f: &mut ratatui::Frame, state: &UiState) {
    let palette = state.palette();
    let zone = drop_zone_area(f.area()).intersection(body);
    let (border, color) = if state.drag_over {
        (BorderType::Double, palette.highlight)
    } else {
        (BorderType::Rounded, palette.muted)
    };
    let text = vec![
        Line::from(""),
        Line::from(Span::styled(
            "Drop a grayscale image here",
            Style::default().fg(palette.fg).add_modifier(Modifier::BOLD),
        )),
        Line::from(""),
        Line::from(Span::styled(
            "or press 'o' to type a path",
            Style::default().fg(palette.muted),
        )),
    ];
    let p = Paragraph::new(text)
        .alignment(ratatui::layout::Alignment::Center)
        .block(
            Block::default()
                .borders(Borders::ALL)
                .border_type(border)
                .border_style(Style::default().fg(color)),
        );
    f.render_widget(p, zone);
}

fn draw_panes(body: Rect, f: &mut ratatui::Frame, state: &UiState) {
    let palette = state.palette();
    let panes = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(50), Constraint::Percentage(50)])
        .split(body);

    let original_title = match state.preview.as_ref() {
        Some(p) => format!("Original Grayscale ({}x{})", p.width, p.height),
        None => "Original Grayscale".to_string(),
    };
    let block = Block::default()
        .borders(Borders::ALL)
        .title(original_title)
        .border_style(Style::default().fg(palette.muted));
    let inner = block.inner(panes[0]);
    f.render_widget(block, panes[0]);
    match (state.preview.as_ref(), state.preview_error.as_deref()) {
        (Some(preview), _) => f.render_widget(ThumbnailView::new(&preview.thumbnail), inner),
        (None, Some(reason)) => f.render_widget(
            Paragraph::new(format!("Preview unavailable: {reason}"))
                .style(Style::default().fg(palette.muted))
                .wrap(Wrap { trim: true }),
            inner,
        ),
        (None, None) => f.render_widget(
            Paragraph::new("Decoding...").style(Style::default().fg(palette.muted)),
            inner,
        ),
    }

    let block = Block::default()
        .borders(Borders::ALL)
        .title("AI Colorized")
        .border_style(Style::default().fg(palette.accent));
    let inner = block.inner(panes[1]);
    f.render_widget(block, panes[1]);
    if state.workflow_state() == WorkflowState::AwaitingResult {
        f.render_widget(
            Paragraph::new(format!("{} Colorizing...", state.spinner()))
                .style(Style::default().fg(palette.highlight)),
            inner,
        );
    } else if let Some(result) = state.result.as_ref() {
        match result.thumbnail.as_ref() {
            Some(thumb) => f.render_widget(ThumbnailView::new(thumb), inner),
            None => f.render_widget(
                Paragraph::new(format!(
                    "Received {} bytes ({}) that cannot be shown here. Press 'd' to download.",
                    result.bytes.len(),
                    result.media_type
                ))
                .wrap(Wrap { trim: true }),
                inner,
            ),
        }
    } else {
        f.render_widget(
            Paragraph::new("No result. Choose another file or press 'n' to start over.")
                .style(Style::default().fg(palette.muted))
                .wrap(Wrap { trim: true }),
            inner,
        );
    }
}

fn draw_prompt(area: Rect, f: &mut ratatui::Frame, state: &UiState, input: &str) {
    let palette = state.palette();
    let path = FileCandidate::Picked(input.to_string()).resolve();
    let hint = match path.as_deref() {
        Some(p) if !acquire::looks_like_image(p) => Span::styled(
            "not an image type; it will still be sent",
            Style::default().fg(palette.highlight),
        ),
        _ => Span::styled(
            "Enter to open, Esc to cancel",
            Style::default().fg(palette.muted),
        ),
    };
    let p = Paragraph::new(vec![
        Line::from(vec![
            Span::styled("Path: ", Style::default().fg(palette.muted)),
            Span::raw(input),
            Span::styled("_", Style::default().add_modifier(Modifier::SLOW_BLINK)),
        ]),
        Line::from(""),
        Line::from(hint),
    ])
    .style(Style::default().fg(palette.fg))
    .block(Block::default().borders(Borders::ALL).title("Open image"));
    f.render_widget(Clear, area);
    f.render_widget(p, area);
}

fn draw_notice(area: Rect, f: &mut ratatui::Frame, state: &UiState, notice: &str) {
    let palette = state.palette();
    let mut lines: Vec<Line> = notice.lines().map(|l| Line::from(l.to_string())).collect();
    lines.push(Line::from(""));
    lines.push(Line::from(Span::styled(
        "Press Enter to dismiss",
        Style::default().fg(palette.muted),
    )));
    let p = Paragraph::new(lines)
        .style(Style::default().fg(palette.fg))
        .wrap(Wrap { trim: true })
        .block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(Style::default().fg(palette.error))
                .title("Error"),
        );
    f.render_widget(Clear, area);
    f.render_widget(p, area);
}
