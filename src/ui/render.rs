//! Render functions for the TUI.

use crate::api::EditField;
use crate::app::App;
use ratatui::{
    layout::{Alignment, Constraint, Direction, Layout},
    widgets::Paragraph,
    Frame,
};

use super::{add_form, changelog, feeds, help, status};

/// Minimum terminal dimensions required for normal operation.
pub(super) const MIN_WIDTH: u16 = 60;
pub(super) const MIN_HEIGHT: u16 = 18;

/// Main render dispatch function.
pub(super) fn render(f: &mut Frame, app: &App) {
    let area = f.area();

    // Guard against zero-width/height to prevent panics
    if area.width < 1 || area.height < 1 {
        return;
    }

    if area.width < MIN_WIDTH || area.height < MIN_HEIGHT {
        let msg = if area.height < 3 || area.width < 20 {
            Paragraph::new("Too small")
        } else {
            Paragraph::new(format!(
                "Terminal too small\n\nMinimum: {}x{}\nCurrent: {}x{}",
                MIN_WIDTH, MIN_HEIGHT, area.width, area.height
            ))
            .alignment(Alignment::Center)
        };
        f.render_widget(msg, area);
        return;
    }

    // URL line, advanced toggle, buttons, plus the advanced fields when shown
    let mut form_lines = 3;
    if app.add_form.advanced.is_shown() {
        form_lines += EditField::ALL.len() as u16;
    }

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(form_lines + 2),
            Constraint::Min(0),
            Constraint::Length(status::HEIGHT),
        ])
        .split(area);

    let top = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(60), Constraint::Percentage(40)])
        .split(chunks[0]);

    add_form::render(f, app, top[0]);
    changelog::render(f, app, top[1]);
    feeds::render(f, app, chunks[1]);
    status::render(f, app, chunks[2]);

    if app.show_help {
        help::render(f);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::FeedApi;
    use crate::app::AppEvent;
    use crate::config::Config;
    use ratatui::{backend::TestBackend, Terminal};
    use reqwest::Url;
    use tokio::sync::mpsc;

    fn test_app() -> App {
        let base = Url::parse("http://127.0.0.1:9/").unwrap();
        App::new(FeedApi::new(reqwest::Client::new(), base), &Config::default())
    }

    fn screen(app: &App, width: u16, height: u16) -> String {
        let mut terminal = Terminal::new(TestBackend::new(width, height)).unwrap();
        terminal.draw(|f| render(f, app)).unwrap();
        let buffer = terminal.backend().buffer();
        buffer
            .content()
            .chunks(width as usize)
            .map(|line| line.iter().map(|c| c.symbol()).collect::<String>())
            .collect::<Vec<_>>()
            .join("\n")
    }

    #[test]
    fn test_small_terminal_shows_notice() {
        let app = test_app();
        assert!(screen(&app, 40, 12).contains("Terminal too small"));
    }

    #[tokio::test]
    async fn test_loaded_list_renders_rows_and_controls() {
        let mut app = test_app();
        let (tx, _rx) = mpsc::channel(8);
        app.sync.refresh_list(&tx);
        let generation = app.sync.list_generation();
        app.handle_event(
            AppEvent::FeedListFetched {
                generation,
                result: Ok(r#"<div class="feed-item" data-feedkey="alpha">
                    <a class="feed-name" href="https://www.youtube.com/@alpha">Alpha Channel</a>
                    <button data-role="remove-feed" data-feedkey="alpha">Remove Feed</button>
                </div>"#
                    .to_string()),
            },
            &tx,
        );

        let text = screen(&app, 100, 30);
        assert!(text.contains("Alpha Channel"));
        assert!(text.contains("Remove Feed"));
        assert!(text.contains("Add Feed"));
        assert!(text.contains("No pending changes."));
    }

    #[tokio::test]
    async fn test_failed_list_renders_error() {
        let mut app = test_app();
        let (tx, _rx) = mpsc::channel(8);
        app.sync.refresh_list(&tx);
        let generation = app.sync.list_generation();
        app.handle_event(
            AppEvent::FeedListFetched {
                generation,
                result: Err(crate::api::TransportError::HttpStatus {
                    status: 500,
                    body: String::new(),
                }),
            },
            &tx,
        );
        assert!(screen(&app, 100, 30).contains("Error loading feed list."));
    }
}
