//! Input handling for the TUI.
//!
//! Keys are routed by focus region. Every handler only translates a key into
//! an `App` operation; state changes live in `App`.

use crate::app::{App, AppEvent, Focus, TextEdit};
use crossterm::event::{KeyCode, KeyModifiers};
use tokio::sync::mpsc;

use super::Action;

/// Main input dispatch function.
pub(super) fn handle_input(
    app: &mut App,
    code: KeyCode,
    modifiers: KeyModifiers,
    event_tx: &mpsc::Sender<AppEvent>,
) -> Action {
    // Help overlay captures all keys when visible
    if app.show_help {
        handle_help_input(app, code);
        return Action::Continue;
    }

    let ctrl = modifiers.contains(KeyModifiers::CONTROL);
    match code {
        KeyCode::Char('c') if ctrl => return Action::Quit,
        KeyCode::Char('r') if ctrl => {
            app.trigger_reload(event_tx);
            return Action::Continue;
        }
        KeyCode::F(5) => {
            app.trigger_reload(event_tx);
            return Action::Continue;
        }
        KeyCode::F(1) => {
            app.show_help = true;
            return Action::Continue;
        }
        KeyCode::Tab | KeyCode::BackTab => {
            app.focus = match app.focus {
                Focus::AddForm => Focus::Feeds,
                Focus::Feeds | Focus::EditForm => Focus::AddForm,
            };
            return Action::Continue;
        }
        _ => {}
    }

    match app.focus {
        Focus::AddForm => handle_add_form_input(app, code, ctrl, event_tx),
        Focus::Feeds => return handle_feeds_input(app, code, event_tx),
        Focus::EditForm => handle_edit_form_input(app, code, ctrl, event_tx),
    }
    Action::Continue
}

fn handle_help_input(app: &mut App, code: KeyCode) {
    if matches!(
        code,
        KeyCode::Esc | KeyCode::Char('q') | KeyCode::Char('?') | KeyCode::F(1)
    ) {
        app.show_help = false;
    }
}

fn handle_add_form_input(
    app: &mut App,
    code: KeyCode,
    ctrl: bool,
    event_tx: &mpsc::Sender<AppEvent>,
) {
    match code {
        KeyCode::Esc => app.focus = Focus::Feeds,
        KeyCode::Enter => app.submit_add_form(event_tx),
        KeyCode::Up => app.nav_up(),
        KeyCode::Down => app.nav_down(),
        KeyCode::Left => app.cycle_add_form(false),
        KeyCode::Right => app.cycle_add_form(true),
        KeyCode::Char('a') if ctrl => {
            app.toggle_advanced();
        }
        KeyCode::Char('u') if ctrl => app.edit_add_form(TextEdit::Clear),
        KeyCode::Backspace => app.edit_add_form(TextEdit::Backspace),
        KeyCode::Char(c) if !ctrl => app.edit_add_form(TextEdit::Insert(c)),
        _ => {}
    }
}

fn handle_feeds_input(app: &mut App, code: KeyCode, event_tx: &mpsc::Sender<AppEvent>) -> Action {
    let key = app.selected_key().map(str::to_string);

    match code {
        KeyCode::Char('q') => return Action::Quit,
        KeyCode::Char('?') => app.show_help = true,
        KeyCode::Char('j') | KeyCode::Down => app.nav_down(),
        KeyCode::Char('k') | KeyCode::Up => app.nav_up(),
        KeyCode::Char('a') | KeyCode::Char('i') => app.focus = Focus::AddForm,
        KeyCode::Char('r') => app.trigger_reload(event_tx),
        KeyCode::Char('e') => {
            if let Some(key) = key {
                if app.toggle_edit(&key).is_some() && app.row_state(&key).edit.is_shown() {
                    enter_edit_form(app);
                }
            }
        }
        KeyCode::Enter => {
            if key.is_some_and(|k| app.row_state(&k).edit.is_shown()) {
                enter_edit_form(app);
            }
        }
        KeyCode::Char('s') => {
            if let Some(key) = key {
                app.save_edit(&key, event_tx);
            }
        }
        KeyCode::Char('x') | KeyCode::Char('d') => {
            if let Some(key) = key {
                app.activate_remove(&key, event_tx);
            }
        }
        KeyCode::Char('y') | KeyCode::Char('c') => {
            if let Some(key) = key {
                app.copy_xml(&key);
            }
        }
        KeyCode::Char('o') => {
            if let Some(key) = key {
                app.open_source(&key);
            }
        }
        _ => {}
    }
    Action::Continue
}

fn enter_edit_form(app: &mut App) {
    app.focus = Focus::EditForm;
    app.selected_edit_field = 0;
}

fn handle_edit_form_input(
    app: &mut App,
    code: KeyCode,
    ctrl: bool,
    event_tx: &mpsc::Sender<AppEvent>,
) {
    let Some(key) = app.selected_key().map(str::to_string) else {
        app.focus = Focus::Feeds;
        return;
    };
    let field = app.selected_edit_field();

    match code {
        KeyCode::Esc => app.focus = Focus::Feeds,
        KeyCode::Up => app.nav_up(),
        KeyCode::Down => app.nav_down(),
        KeyCode::Enter => app.save_edit(&key, event_tx),
        KeyCode::Char('e') if ctrl => {
            app.toggle_edit(&key);
            app.focus = Focus::Feeds;
        }
        KeyCode::Left | KeyCode::Right => {
            if let Some(field) = field {
                app.cycle_row_field(&key, field, code == KeyCode::Right);
            }
        }
        KeyCode::Char('u') if ctrl => {
            if let Some(field) = field {
                app.edit_row_field(&key, field, TextEdit::Clear);
            }
        }
        KeyCode::Backspace => {
            if let Some(field) = field {
                app.edit_row_field(&key, field, TextEdit::Backspace);
            }
        }
        KeyCode::Char(c) if !ctrl => {
            if let Some(field) = field {
                app.edit_row_field(&key, field, TextEdit::Insert(c));
            }
        }
        _ => {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::{EditField, FeedApi};
    use crate::config::Config;
    use pretty_assertions::assert_eq;
    use reqwest::Url;

    const ROWS: &str = r#"
<div class="feed-item" data-feedkey="alpha">
  <a class="feed-name" href="https://www.youtube.com/@alpha">Alpha</a>
  <button data-role="edit-button" data-feedkey="alpha">Edit Feed</button>
  <button data-role="remove-feed" data-feedkey="alpha">Remove Feed</button>
  <div id="edit-form-alpha">
    <input id="alpha-update_period" value="1h">
    <input id="alpha-max_age" value="30">
    <button data-role="save-edit" data-feedkey="alpha">Save Changes</button>
  </div>
</div>
"#;

    fn loaded_app() -> (App, mpsc::Sender<AppEvent>) {
        let base = Url::parse("http://127.0.0.1:9/").unwrap();
        let api = FeedApi::new(reqwest::Client::new(), base);
        let (tx, _rx) = mpsc::channel(32);
        let mut app = App::new(api, &Config::default());
        app.sync.refresh_list(&tx);
        let generation = app.sync.list_generation();
        app.handle_event(
            AppEvent::FeedListFetched {
                generation,
                result: Ok(ROWS.to_string()),
            },
            &tx,
        );
        (app, tx)
    }

    fn press(app: &mut App, tx: &mpsc::Sender<AppEvent>, code: KeyCode) -> Action {
        handle_input(app, code, KeyModifiers::NONE, tx)
    }

    #[tokio::test]
    async fn test_quit_keys() {
        let (mut app, tx) = loaded_app();
        assert!(matches!(press(&mut app, &tx, KeyCode::Char('q')), Action::Quit));
        assert!(matches!(
            handle_input(&mut app, KeyCode::Char('c'), KeyModifiers::CONTROL, &tx),
            Action::Quit
        ));
    }

    #[tokio::test]
    async fn test_help_captures_keys() {
        let (mut app, tx) = loaded_app();
        press(&mut app, &tx, KeyCode::Char('?'));
        assert!(app.show_help);

        // 'q' closes help instead of quitting
        assert!(matches!(press(&mut app, &tx, KeyCode::Char('q')), Action::Continue));
        assert!(!app.show_help);
    }

    #[tokio::test]
    async fn test_typing_in_add_form() {
        let (mut app, tx) = loaded_app();
        press(&mut app, &tx, KeyCode::Tab);
        assert_eq!(app.focus, Focus::AddForm);

        for c in "https://y".chars() {
            press(&mut app, &tx, KeyCode::Char(c));
        }
        press(&mut app, &tx, KeyCode::Backspace);
        assert_eq!(app.add_form.youtube_url, "https://");

        // 'q' is text here, not quit
        assert!(matches!(press(&mut app, &tx, KeyCode::Char('q')), Action::Continue));
        assert_eq!(app.add_form.youtube_url, "https://q");
    }

    #[tokio::test]
    async fn test_edit_form_round_trip() {
        let (mut app, tx) = loaded_app();
        press(&mut app, &tx, KeyCode::Char('e'));
        assert_eq!(app.focus, Focus::EditForm);
        assert_eq!(app.selected_edit_field(), Some(EditField::UpdatePeriod));

        press(&mut app, &tx, KeyCode::Down);
        press(&mut app, &tx, KeyCode::Char('0'));
        assert_eq!(app.row("alpha").unwrap().field_value(EditField::MaxAge), Some("300"));
        assert!(app.row_state("alpha").save_enabled);

        handle_input(&mut app, KeyCode::Char('e'), KeyModifiers::CONTROL, &tx);
        assert_eq!(app.focus, Focus::Feeds);
        assert!(!app.row_state("alpha").edit.is_shown());
    }

    #[tokio::test]
    async fn test_remove_key_arms_gate() {
        let (mut app, tx) = loaded_app();
        press(&mut app, &tx, KeyCode::Char('x'));
        assert_eq!(app.remove_label("alpha"), "Confirm Remove");
    }
}
