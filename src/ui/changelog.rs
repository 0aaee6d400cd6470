use crate::app::App;
use ratatui::{
    layout::Rect,
    style::{Color, Style},
    text::Line,
    widgets::{Block, Borders, Paragraph, Wrap},
    Frame,
};

/// Render the pending-changes panel.
pub fn render(f: &mut Frame, app: &App, area: Rect) {
    let lines: Vec<Line> = if app.changelog.is_empty() {
        vec![Line::styled(
            "No pending changes.",
            Style::default().fg(Color::DarkGray),
        )]
    } else {
        app.changelog
            .entries
            .iter()
            .map(|entry| Line::from(format!("• {}", entry)))
            .collect()
    };

    let title = format!("Changelog ({})", app.changelog.entries.len());
    let paragraph = Paragraph::new(lines)
        .wrap(Wrap { trim: true })
        .block(Block::default().borders(Borders::ALL).title(title));
    f.render_widget(paragraph, area);
}
