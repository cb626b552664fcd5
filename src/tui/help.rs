use super::state::Palette;
use ratatui::{
    layout::Rect,
    style::Style,
    text::{Line, Span},
    widgets::{Block, Borders, Clear, Paragraph},
    Frame,
};

const KEYBINDS: [(&str, &str); 9] = [
    ("o", "Choose a file by path"),
    ("drop", "Drag a file onto the terminal"),
    ("n", "New image (clear everything)"),
    ("d", "Download colorized image"),
    ("y", "Copy saved path to clipboard"),
    ("t", "Toggle light/dark theme"),
    ("?", "Show/hide this help"),
    ("q", "Quit (also Ctrl-C)"),
    ("Enter/Esc", "Dismiss a failure notice"),
];

pub fn draw_help(area: Rect, f: &mut Frame, palette: Palette) {
    let key_style = Style::default().fg(palette.accent);
    let mut lines = vec![Line::from("Keybinds:")];
    for (key, what) in KEYBINDS {
        lines.push(Line::from(vec![
            Span::raw("  "),
            Span::styled(format!("{key:<10}"), key_style),
            Span::raw(" "),
            Span::raw(what),
        ]));
    }
    lines.push(Line::from(""));
    lines.push(Line::from(Span::styled(
        "Files of any type are accepted; the service decides what it can colorize.",
        Style::default().fg(palette.muted),
    )));

    let p = Paragraph::new(lines)
        .style(Style::default().fg(palette.fg))
        .block(Block::default().borders(Borders::ALL).title("Help"));
    f.render_widget(Clear, area);
    f.render_widget(p, area);
}
