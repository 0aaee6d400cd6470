//! End-to-end session tests: the app state machine driven against a mock
//! podconfig backend.
//!
//! Each test starts its own `MockServer`, performs the initial load, then
//! drives user operations and feeds every background event back into the
//! app the way the UI loop does.

use podconfig_tui::api::{EditField, FeedApi};
use podconfig_tui::app::{App, AppEvent, TextEdit, LABEL_ADVANCED, LABEL_EDIT, LABEL_REMOVE};
use podconfig_tui::config::Config;
use podconfig_tui::presentation::{Clipboard, ClipboardBackend, ClipboardError, Visibility};
use podconfig_tui::sync::ListRegion;
use pretty_assertions::assert_eq;
use reqwest::Url;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::mpsc;
use wiremock::matchers::{body_string, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const FEEDS: &str = r#"
<div class="feed-item" data-feedkey="alpha">
  <a class="feed-name" href="https://www.youtube.com/@alpha">Alpha</a>
  <button data-role="edit-button" data-feedkey="alpha">Edit Feed</button>
  <button data-role="remove-feed" data-feedkey="alpha">Remove Feed</button>
  <span data-role="xml-button" data-feedkey="alpha" data-xmlurl="http://pod/alpha.xml">Copy XML</span>
  <div id="edit-form-alpha">
    <input id="alpha-update_period" value="1h">
    <select id="alpha-format"><option value="audio" selected>audio</option><option value="video">video</option></select>
    <input id="alpha-max_age" value="30">
    <button data-role="save-edit" data-feedkey="alpha">Save Changes</button>
  </div>
</div>
"#;

const CHANGELOG: &str = "<ul><li>Added alpha</li></ul>";

// ============================================================================
// Harness
// ============================================================================

struct RecordingClipboard(Arc<Mutex<Vec<String>>>);

impl ClipboardBackend for RecordingClipboard {
    fn name(&self) -> &'static str {
        "recording"
    }

    fn set_text(&mut self, text: &str) -> Result<(), ClipboardError> {
        self.0.lock().unwrap().push(text.to_string());
        Ok(())
    }
}

struct Session {
    app: App,
    tx: mpsc::Sender<AppEvent>,
    rx: mpsc::Receiver<AppEvent>,
}

impl Session {
    fn new(server: &MockServer) -> Self {
        let base = Url::parse(&server.uri()).unwrap();
        let api = FeedApi::new(reqwest::Client::new(), base).with_timeout(Duration::from_secs(5));
        let (tx, rx) = mpsc::channel(32);
        Self {
            app: App::new(api, &Config::default()),
            tx,
            rx,
        }
    }

    fn with_clipboard(server: &MockServer, clipboard: Clipboard) -> Self {
        let Self { app, tx, rx } = Self::new(server);
        Self {
            app: app.with_clipboard(clipboard),
            tx,
            rx,
        }
    }

    /// Receives `count` events and applies them in arrival order.
    async fn pump(&mut self, count: usize) {
        for _ in 0..count {
            let event = tokio::time::timeout(Duration::from_secs(5), self.rx.recv())
                .await
                .expect("timed out waiting for a background event")
                .expect("event channel closed");
            self.app.handle_event(event, &self.tx);
        }
    }

    /// Initial load: one list and one changelog response.
    async fn start(&mut self) {
        self.app.start(&self.tx);
        self.pump(2).await;
    }

    async fn assert_quiet(&mut self) {
        let extra = tokio::time::timeout(Duration::from_millis(300), self.rx.recv()).await;
        assert!(extra.is_err(), "unexpected event: {:?}", extra);
    }
}

async fn mount_reads(server: &MockServer, feeds: &str, expected_resyncs: u64) {
    Mock::given(method("GET"))
        .and(path("/feeds"))
        .and(header("X-Requested-With", "XMLHttpRequest"))
        .respond_with(ResponseTemplate::new(200).set_body_string(feeds))
        .expect(expected_resyncs)
        .mount(server)
        .await;
    Mock::given(method("GET"))
        .and(path("/changelog"))
        .respond_with(ResponseTemplate::new(200).set_body_string(CHANGELOG))
        .expect(expected_resyncs)
        .mount(server)
        .await;
}

fn message(text: &str) -> ResponseTemplate {
    ResponseTemplate::new(200).set_body_string(format!(r#"{{"message":"{}"}}"#, text))
}

// ============================================================================
// Initial load
// ============================================================================

#[tokio::test]
async fn test_initial_load_renders_rows_and_changelog() {
    let server = MockServer::start().await;
    mount_reads(&server, FEEDS, 1).await;

    let mut session = Session::new(&server);
    session.start().await;

    let list = session.app.feeds().expect("list should be loaded");
    assert_eq!(list.rows.len(), 1);
    assert_eq!(list.rows[0].name, "Alpha");
    assert_eq!(session.app.changelog.entries, vec!["Added alpha"]);
    assert!(!session.app.is_loading());
}

#[tokio::test]
async fn test_list_error_shows_fixed_message() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/feeds"))
        .respond_with(ResponseTemplate::new(500).set_body_string("template exploded"))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/changelog"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    let mut session = Session::new(&server);
    session.start().await;

    assert_eq!(session.app.list, ListRegion::Failed("Error loading feed list."));
    // Changelog failure clears the panel without a message
    assert!(session.app.changelog.is_empty());
    assert_eq!(session.app.message.text(), None);
}

#[tokio::test]
async fn test_empty_list_keeps_server_notice() {
    let server = MockServer::start().await;
    mount_reads(&server, "<p>No feeds found.</p>", 1).await;

    let mut session = Session::new(&server);
    session.start().await;

    let list = session.app.feeds().unwrap();
    assert!(list.is_empty());
    assert_eq!(list.notice.as_deref(), Some("No feeds found."));
}

// ============================================================================
// Add
// ============================================================================

#[tokio::test]
async fn test_add_sends_only_url_then_resyncs_once() {
    let server = MockServer::start().await;
    mount_reads(&server, FEEDS, 2).await;
    Mock::given(method("POST"))
        .and(path("/add"))
        .and(header("Content-Type", "application/x-www-form-urlencoded"))
        .and(body_string("youtubeUrl=https%3A%2F%2Fyoutube.com%2Fc%2Ftest"))
        .respond_with(message("Feed added successfully."))
        .expect(1)
        .mount(&server)
        .await;

    let mut session = Session::new(&server);
    session.start().await;

    session.app.toggle_advanced();
    for c in "https://youtube.com/c/test".chars() {
        session.app.edit_add_form(TextEdit::Insert(c));
    }
    session.app.submit_add_form(&session.tx);
    assert_eq!(session.app.add_form.submit_label(), "Adding Feed…");

    // settle + list + changelog
    session.pump(3).await;
    session.assert_quiet().await;

    assert_eq!(session.app.message.text(), Some("Feed added successfully."));
    assert!(session.app.add_form.youtube_url.is_empty());
    assert_eq!(session.app.add_form.advanced, Visibility::Hidden);
    assert_eq!(session.app.add_form.advanced_label(), LABEL_ADVANCED);
    assert_eq!(session.app.add_form.submit_label(), "Add Feed");
    assert_eq!(session.app.sync.resyncs_issued(), 2);
}

#[tokio::test]
async fn test_add_failure_reports_and_skips_resync() {
    let server = MockServer::start().await;
    mount_reads(&server, FEEDS, 1).await;
    Mock::given(method("POST"))
        .and(path("/add"))
        .respond_with(ResponseTemplate::new(400).set_body_string("bad url"))
        .expect(1)
        .mount(&server)
        .await;

    let mut session = Session::new(&server);
    session.start().await;
    session.app.add_form.youtube_url = "not-a-channel".to_string();
    session.app.submit_add_form(&session.tx);

    session.pump(1).await;
    session.assert_quiet().await;

    assert_eq!(session.app.message.text(), Some("Error adding feed."));
    assert_eq!(session.app.add_form.youtube_url, "not-a-channel");
    assert!(!session.app.add_form.busy);
}

// ============================================================================
// Modify
// ============================================================================

#[tokio::test]
async fn test_modify_sends_non_empty_fields() {
    let server = MockServer::start().await;
    mount_reads(&server, FEEDS, 2).await;
    Mock::given(method("POST"))
        .and(path("/modify"))
        .and(body_string(
            "feedKey=alpha&update_period=1h&format=audio&max_age=300",
        ))
        .respond_with(message("Feed modified."))
        .expect(1)
        .mount(&server)
        .await;

    let mut session = Session::new(&server);
    session.start().await;

    session.app.toggle_edit("alpha");
    session
        .app
        .edit_row_field("alpha", EditField::MaxAge, TextEdit::Insert('0'));
    session.app.save_edit("alpha", &session.tx);
    assert!(session.app.row_state("alpha").saving);

    session.pump(3).await;

    assert_eq!(session.app.message.text(), Some("Feed modified."));
    assert_eq!(session.app.edit_label("alpha"), LABEL_EDIT);
    assert!(!session.app.row_state("alpha").save_enabled);
}

#[tokio::test]
async fn test_modify_failure_still_resyncs() {
    let server = MockServer::start().await;
    mount_reads(&server, FEEDS, 2).await;
    Mock::given(method("POST"))
        .and(path("/modify"))
        .respond_with(ResponseTemplate::new(500))
        .expect(1)
        .mount(&server)
        .await;

    let mut session = Session::new(&server);
    session.start().await;

    session.app.toggle_edit("alpha");
    session
        .app
        .set_row_field("alpha", EditField::UpdatePeriod, "6h");
    session.app.save_edit("alpha", &session.tx);

    session.pump(3).await;

    assert_eq!(session.app.message.text(), Some("Error modifying feed."));
    // The resync replaced the row with the server's copy
    assert_eq!(
        session.app.row("alpha").unwrap().field_value(EditField::UpdatePeriod),
        Some("1h")
    );
    assert_eq!(session.app.sync.resyncs_issued(), 2);
}

// ============================================================================
// Remove
// ============================================================================

#[tokio::test]
async fn test_remove_needs_second_activation() {
    let server = MockServer::start().await;
    mount_reads(&server, FEEDS, 2).await;
    Mock::given(method("POST"))
        .and(path("/remove"))
        .and(body_string("feedKey=alpha"))
        .respond_with(message("Feed removed."))
        .expect(1)
        .mount(&server)
        .await;

    let mut session = Session::new(&server);
    session.start().await;

    session.app.activate_remove("alpha", &session.tx);
    assert_eq!(session.app.remove_label("alpha"), "Confirm Remove");
    session.assert_quiet().await;

    session.app.activate_remove("alpha", &session.tx);
    session.pump(3).await;

    assert_eq!(session.app.message.text(), Some("Feed removed."));
    assert_eq!(session.app.remove_label("alpha"), LABEL_REMOVE);
}

// ============================================================================
// Reload
// ============================================================================

#[tokio::test]
async fn test_reload_success_and_failure() {
    let server = MockServer::start().await;
    mount_reads(&server, FEEDS, 2).await;
    Mock::given(method("POST"))
        .and(path("/reload"))
        .respond_with(message("Container reloaded."))
        .up_to_n_times(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/reload"))
        .respond_with(ResponseTemplate::new(502))
        .mount(&server)
        .await;

    let mut session = Session::new(&server);
    session.start().await;

    session.app.trigger_reload(&session.tx);
    assert_eq!(session.app.reload_label(), "Reloading Container…");
    session.pump(3).await;
    assert_eq!(session.app.message.text(), Some("Container reloaded."));
    assert_eq!(session.app.reload_label(), "Reload Container");

    session.app.trigger_reload(&session.tx);
    session.pump(1).await;
    session.assert_quiet().await;
    assert_eq!(session.app.message.text(), Some("Error reloading container."));
}

// ============================================================================
// Coalescing and clipboard
// ============================================================================

#[tokio::test]
async fn test_superseded_resync_is_dropped() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/feeds"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_string(FEEDS)
                .set_delay(Duration::from_millis(200)),
        )
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/changelog"))
        .respond_with(ResponseTemplate::new(200).set_body_string(CHANGELOG))
        .mount(&server)
        .await;

    let mut session = Session::new(&server);
    session.app.start(&session.tx);
    session.app.sync.request_resync(&session.tx);

    // Only the latest list and changelog fetch report back
    session.pump(2).await;
    session.assert_quiet().await;

    assert_eq!(session.app.sync.list_generation(), 2);
    assert_eq!(session.app.feeds().map(|l| l.rows.len()), Some(1));
}

#[tokio::test]
async fn test_copy_xml_uses_rendered_path() {
    let server = MockServer::start().await;
    mount_reads(&server, FEEDS, 1).await;

    let copied = Arc::new(Mutex::new(Vec::new()));
    let mut session = Session::with_clipboard(
        &server,
        Clipboard::with_backends(
            Box::new(RecordingClipboard(copied.clone())),
            Box::new(RecordingClipboard(copied.clone())),
        ),
    );
    session.start().await;

    session.app.copy_xml("alpha");
    assert_eq!(*copied.lock().unwrap(), vec!["http://pod/alpha.xml"]);
    assert_eq!(session.app.copy_label("alpha"), "Copied XML path to clipboard!");
}
