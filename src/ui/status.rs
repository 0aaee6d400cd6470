use crate::app::{App, Focus};
use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Style},
    widgets::{Block, Borders, Paragraph},
    Frame,
};

/// Height of the message box plus the hint bar.
pub(super) const HEIGHT: u16 = 4;

/// Render the message box above the keybinding hints
pub fn render(f: &mut Frame, app: &App, area: Rect) {
    // Guard against zero-width/height areas
    if area.width < 1 || area.height < HEIGHT {
        return;
    }

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(HEIGHT - 1), Constraint::Length(1)])
        .split(area);

    // Nothing is drawn until the first message arrives
    if let Some(text) = app.message.text() {
        let message = Paragraph::new(text)
            .style(Style::default().fg(Color::Yellow))
            .block(Block::default().borders(Borders::ALL).title("Message"));
        f.render_widget(message, chunks[0]);
    }

    let hints = match app.focus {
        Focus::AddForm => "[Enter]add [↑/↓]field [←/→]choice [Ctrl+a]advanced [Esc]list [Tab]switch",
        Focus::Feeds => {
            "[e]dit [x]remove [y]copy XML [o]pen [a]dd [r]eload [?]help [q]uit"
        }
        Focus::EditForm => "[Enter]save [↑/↓]field [←/→]choice [Ctrl+e]cancel [Esc]list",
    };
    let bar = Paragraph::new(hints).style(Style::default().bg(Color::DarkGray).fg(Color::White));
    f.render_widget(bar, chunks[1]);
}
