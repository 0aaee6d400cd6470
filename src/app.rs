use crate::api::{
    AddFeedRequest, EditField, FeedApi, FeedSettings, ModifyFeedRequest, TransportError,
    DEFAULT_FORMAT_OPTIONS,
};
use crate::config::Config;
use crate::confirm::{Activation, ConfirmationGate};
use crate::dirty::DirtyTracker;
use crate::markup::{
    parse_changelog, parse_feed_list, Changelog, ControlRole, FeedList, FeedRow, FieldInput,
};
use crate::presentation::{toggle_visibility, Clipboard, MessageRegion, TransientLabels, Visibility};
use crate::sync::{ListRegion, ListSynchronizer, FEED_LIST_TASK, LIST_ERROR_MESSAGE};
use crate::util::{catch_task_panic, validate_url_for_open};
use std::collections::{BTreeMap, HashMap};
use std::future::Future;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

// ============================================================================
// Labels and Messages
// ============================================================================

pub const LABEL_EDIT: &str = "Edit Feed";
pub const LABEL_CANCEL_EDIT: &str = "Cancel Edit";
pub const LABEL_SAVE: &str = "Save Changes";
pub const LABEL_REMOVE: &str = "Remove Feed";
pub const LABEL_COPY_XML: &str = "Copy XML path to clipboard";
pub const LABEL_COPIED_XML: &str = "Copied XML path to clipboard!";
pub const LABEL_ADVANCED: &str = "Advanced Options";
pub const LABEL_HIDE_ADVANCED: &str = "Hide Advanced Options";
pub const LABEL_ADD: &str = "Add Feed";
pub const LABEL_ADDING: &str = "Adding Feed…";
pub const LABEL_RELOAD: &str = "Reload Container";
pub const LABEL_RELOADING: &str = "Reloading Container…";

pub const MSG_URL_REQUIRED: &str = "YouTube URL is required.";
pub const MSG_NO_XML: &str = "No XML path available for this feed.";
pub const MSG_COPY_FAILED: &str = "Copy failed.";
pub const MSG_NO_SOURCE: &str = "No source URL for this feed.";

/// Number of frames in the loading spinner animation.
pub const SPINNER_FRAMES: usize = 10;

// ============================================================================
// Actions and Events
// ============================================================================

/// A user-triggered mutation against the backend.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ActionKind {
    AddFeed,
    ModifyFeed { key: String },
    RemoveFeed { key: String },
    Reload,
}

impl ActionKind {
    pub const fn task_name(&self) -> &'static str {
        match self {
            ActionKind::AddFeed => "add_feed",
            ActionKind::ModifyFeed { .. } => "modify_feed",
            ActionKind::RemoveFeed { .. } => "remove_feed",
            ActionKind::Reload => "reload",
        }
    }

    /// Generic message shown when the action fails.
    pub const fn error_message(&self) -> &'static str {
        match self {
            ActionKind::AddFeed => "Error adding feed.",
            ActionKind::ModifyFeed { .. } => "Error modifying feed.",
            ActionKind::RemoveFeed { .. } => "Error removing feed.",
            ActionKind::Reload => "Error reloading container.",
        }
    }

    /// Modify resyncs once settled either way; the others only on success.
    pub const fn resyncs_on_failure(&self) -> bool {
        matches!(self, ActionKind::ModifyFeed { .. })
    }
}

/// Events from background tasks
#[derive(Debug)]
pub enum AppEvent {
    /// Feed list markup arrived for the resync tagged `generation`.
    FeedListFetched {
        generation: u64,
        result: Result<String, TransportError>,
    },
    ChangelogFetched {
        generation: u64,
        result: Result<String, TransportError>,
    },
    /// A mutation finished. `result` carries the server message on success.
    ActionSettled {
        action: ActionKind,
        result: Result<String, TransportError>,
    },
    /// A background task panicked.
    ///
    /// Fields:
    /// - `task`: Name of the task that panicked (e.g., "feed_list", "add_feed")
    /// - `action`: The mutation it was serving, so its control can be released
    /// - `error`: The panic message extracted from the panic payload
    TaskPanicked {
        task: &'static str,
        action: Option<ActionKind>,
        error: String,
    },
}

/// Spawns `future` and sends the event it produces. A panic is reported as
/// `AppEvent::TaskPanicked` instead.
pub(crate) fn spawn_reporting<F>(
    task: &'static str,
    action: Option<ActionKind>,
    event_tx: mpsc::Sender<AppEvent>,
    future: F,
) -> JoinHandle<()>
where
    F: Future<Output = AppEvent> + Send + 'static,
{
    tokio::spawn(async move {
        let event = match catch_task_panic(future).await {
            Ok(event) => event,
            Err(panic_msg) => {
                tracing::error!(task, error = %panic_msg, "Background task panicked");
                AppEvent::TaskPanicked {
                    task,
                    action,
                    error: panic_msg,
                }
            }
        };
        if let Err(e) = event_tx.send(event).await {
            tracing::warn!(task, error = %e, "Channel send failed (receiver dropped)");
        }
    })
}

// ============================================================================
// Text Editing
// ============================================================================

/// A single edit applied to a text field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TextEdit {
    Insert(char),
    Backspace,
    Clear,
}

impl TextEdit {
    pub fn apply(self, text: &mut String) {
        match self {
            TextEdit::Insert(c) => text.push(c),
            TextEdit::Backspace => {
                text.pop();
            }
            TextEdit::Clear => text.clear(),
        }
    }
}

// ============================================================================
// Add Form
// ============================================================================

/// The add-feed form. Field 0 is the YouTube URL; the rest are the advanced
/// options in `EditField::ALL` order and are only selectable while shown.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AddForm {
    pub youtube_url: String,
    pub fields: BTreeMap<EditField, FieldInput>,
    pub advanced: Visibility,
    pub busy: bool,
    pub selected: usize,
}

impl Default for AddForm {
    fn default() -> Self {
        Self {
            youtube_url: String::new(),
            fields: Self::blank_fields(),
            advanced: Visibility::Hidden,
            busy: false,
            selected: 0,
        }
    }
}

impl AddForm {
    fn blank_fields() -> BTreeMap<EditField, FieldInput> {
        EditField::ALL
            .into_iter()
            .map(|field| {
                let input = if field.is_choice() {
                    // Leading blank choice means "server default" and is never sent.
                    let options = std::iter::once(String::new())
                        .chain(DEFAULT_FORMAT_OPTIONS.iter().map(|o| o.to_string()))
                        .collect();
                    FieldInput::choice("", options)
                } else {
                    FieldInput::text("")
                };
                (field, input)
            })
            .collect()
    }

    /// Clears every input. Advanced visibility is left to the caller.
    pub fn reset(&mut self) {
        self.youtube_url.clear();
        self.fields = Self::blank_fields();
        self.selected = 0;
    }

    pub fn selectable_count(&self) -> usize {
        if self.advanced.is_shown() {
            1 + EditField::ALL.len()
        } else {
            1
        }
    }

    /// The advanced field under the cursor, or `None` for the URL input.
    pub fn selected_field(&self) -> Option<EditField> {
        self.selected
            .checked_sub(1)
            .and_then(|i| EditField::ALL.get(i).copied())
    }

    pub fn select_next(&mut self) {
        self.selected = (self.selected + 1).min(self.selectable_count() - 1);
    }

    pub fn select_prev(&mut self) {
        self.selected = self.selected.saturating_sub(1);
    }

    pub fn value(&self, field: EditField) -> &str {
        self.fields
            .get(&field)
            .map(|f| f.value.as_str())
            .unwrap_or_default()
    }

    /// Builds the request. Empty optional fields are left out.
    pub fn to_request(&self) -> AddFeedRequest {
        let mut settings = FeedSettings::new();
        for (field, input) in &self.fields {
            if !input.value.is_empty() {
                settings.set(*field, input.value.clone());
            }
        }
        AddFeedRequest {
            youtube_url: self.youtube_url.clone(),
            settings,
        }
    }

    pub fn submit_label(&self) -> &'static str {
        if self.busy {
            LABEL_ADDING
        } else {
            LABEL_ADD
        }
    }

    pub fn advanced_label(&self) -> &'static str {
        self.advanced.label(LABEL_ADVANCED, LABEL_HIDE_ADVANCED)
    }
}

// ============================================================================
// Row State
// ============================================================================

/// Client-side state for one rendered row. Discarded on every resync.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RowState {
    pub edit: Visibility,
    pub save_enabled: bool,
    pub saving: bool,
    pub removing: bool,
}

/// Which region has keyboard focus
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Focus {
    AddForm,
    Feeds,
    /// Inside the selected row's edit form.
    EditForm,
}

// ============================================================================
// Application State
// ============================================================================

/// Central application state
pub struct App {
    pub api: FeedApi,
    pub sync: ListSynchronizer,

    // Server-rendered regions
    pub list: ListRegion,
    pub changelog: Changelog,
    pub message: MessageRegion,

    // Per-row bindings, rebuilt on every resync
    pub rows: HashMap<String, RowState>,
    pub tracker: DirtyTracker,
    pub gate: ConfirmationGate<String>,
    pub transients: TransientLabels<String>,

    pub clipboard: Clipboard,
    pub copy_feedback: Duration,

    // Global controls
    pub add_form: AddForm,
    pub reload_busy: bool,

    // UI State
    pub focus: Focus,
    pub selected_row: usize,
    pub selected_edit_field: usize,
    pub show_help: bool,
    /// Skips frame renders when nothing changed
    pub needs_redraw: bool,
    pub spinner_frame: usize,
}

impl App {
    pub fn new(api: FeedApi, config: &Config) -> Self {
        Self {
            sync: ListSynchronizer::new(api.clone()),
            api,
            list: ListRegion::Loading,
            changelog: Changelog::default(),
            message: MessageRegion::new(),
            rows: HashMap::new(),
            tracker: DirtyTracker::new(),
            gate: ConfirmationGate::new(config.confirm_timeout()),
            transients: TransientLabels::new(),
            clipboard: Clipboard::system(),
            copy_feedback: config.copy_feedback(),
            add_form: AddForm::default(),
            reload_busy: false,
            focus: Focus::Feeds,
            selected_row: 0,
            selected_edit_field: 0,
            show_help: false,
            needs_redraw: true,
            spinner_frame: 0,
        }
    }

    pub fn with_clipboard(mut self, clipboard: Clipboard) -> Self {
        self.clipboard = clipboard;
        self
    }

    /// Performs the initial load of the list and changelog.
    pub fn start(&mut self, event_tx: &mpsc::Sender<AppEvent>) {
        tracing::info!(server = %self.api.base_url(), "Starting session");
        self.list = ListRegion::Loading;
        self.sync.request_resync(event_tx);
    }

    // ------------------------------------------------------------------------
    // Lookups
    // ------------------------------------------------------------------------

    pub fn feeds(&self) -> Option<&FeedList> {
        self.list.feeds()
    }

    pub fn row(&self, key: &str) -> Option<&FeedRow> {
        self.list.feeds().and_then(|l| l.row(key))
    }

    pub fn row_state(&self, key: &str) -> RowState {
        self.rows.get(key).copied().unwrap_or_default()
    }

    /// Key of the selected row (bounds-checked)
    pub fn selected_key(&self) -> Option<&str> {
        self.list
            .feeds()
            .and_then(|l| l.rows.get(self.selected_row))
            .map(|r| r.key.as_str())
    }

    /// The edit field under the cursor in the selected row's form.
    pub fn selected_edit_field(&self) -> Option<EditField> {
        let key = self.selected_key()?;
        self.row(key)?
            .present_fields()
            .get(self.selected_edit_field)
            .copied()
    }

    pub fn edit_label(&self, key: &str) -> &'static str {
        self.row_state(key).edit.label(LABEL_EDIT, LABEL_CANCEL_EDIT)
    }

    pub fn remove_label(&self, key: &str) -> &'static str {
        self.gate.label(&key.to_string(), LABEL_REMOVE)
    }

    pub fn copy_label(&self, key: &str) -> &str {
        self.transients.label(&key.to_string(), LABEL_COPY_XML)
    }

    pub fn reload_label(&self) -> &'static str {
        if self.reload_busy {
            LABEL_RELOADING
        } else {
            LABEL_RELOAD
        }
    }

    pub fn is_loading(&self) -> bool {
        self.sync.is_loading() || self.add_form.busy || self.reload_busy
    }

    // ------------------------------------------------------------------------
    // Navigation
    // ------------------------------------------------------------------------

    pub fn nav_up(&mut self) {
        match self.focus {
            Focus::AddForm => self.add_form.select_prev(),
            Focus::Feeds => self.selected_row = self.selected_row.saturating_sub(1),
            Focus::EditForm => {
                self.selected_edit_field = self.selected_edit_field.saturating_sub(1);
            }
        }
    }

    pub fn nav_down(&mut self) {
        match self.focus {
            Focus::AddForm => self.add_form.select_next(),
            Focus::Feeds => {
                let len = self.feeds().map_or(0, |l| l.rows.len());
                if len > 0 {
                    self.selected_row = self.selected_row.saturating_add(1).min(len - 1);
                }
            }
            Focus::EditForm => {
                let count = self
                    .selected_key()
                    .and_then(|k| self.row(k))
                    .map_or(0, |r| r.present_fields().len());
                if count > 0 {
                    self.selected_edit_field =
                        self.selected_edit_field.saturating_add(1).min(count - 1);
                }
            }
        }
    }

    /// Keeps the row selection inside the current list.
    pub fn clamp_selection(&mut self) {
        let len = self.feeds().map_or(0, |l| l.rows.len());
        self.selected_row = if len == 0 {
            0
        } else {
            self.selected_row.min(len - 1)
        };
    }

    // ------------------------------------------------------------------------
    // Add form and reload
    // ------------------------------------------------------------------------

    /// Flips the advanced-options section and returns the toggle's new label.
    pub fn toggle_advanced(&mut self) -> &'static str {
        let label = toggle_visibility(
            &mut self.add_form.advanced,
            LABEL_ADVANCED,
            LABEL_HIDE_ADVANCED,
        );
        self.add_form.selected = self
            .add_form
            .selected
            .min(self.add_form.selectable_count() - 1);
        self.needs_redraw = true;
        label
    }

    /// Applies `edit` to the add-form input under the cursor. Choice fields
    /// ignore text edits.
    pub fn edit_add_form(&mut self, edit: TextEdit) {
        match self.add_form.selected_field() {
            None => edit.apply(&mut self.add_form.youtube_url),
            Some(field) if field.is_choice() => {}
            Some(field) => {
                if let Some(input) = self.add_form.fields.get_mut(&field) {
                    edit.apply(&mut input.value);
                }
            }
        }
    }

    pub fn cycle_add_form(&mut self, forward: bool) {
        if let Some(field) = self.add_form.selected_field() {
            if let Some(input) = self.add_form.fields.get_mut(&field) {
                input.cycle(forward);
            }
        }
    }

    pub fn submit_add_form(&mut self, event_tx: &mpsc::Sender<AppEvent>) {
        if self.add_form.busy {
            return;
        }
        if self.add_form.youtube_url.is_empty() {
            self.message.show(MSG_URL_REQUIRED);
            return;
        }

        let request = self.add_form.to_request();
        tracing::info!(url = %request.youtube_url, "Adding feed");
        self.add_form.busy = true;
        let api = self.api.clone();
        self.spawn_action(ActionKind::AddFeed, event_tx, async move {
            api.add_feed(&request).await
        });
    }

    pub fn trigger_reload(&mut self, event_tx: &mpsc::Sender<AppEvent>) {
        if self.reload_busy {
            return;
        }
        tracing::info!("Reloading container");
        self.reload_busy = true;
        let api = self.api.clone();
        self.spawn_action(ActionKind::Reload, event_tx, async move { api.reload().await });
    }

    // ------------------------------------------------------------------------
    // Row controls
    // ------------------------------------------------------------------------

    /// Row `key` if it carries the `role` control.
    fn bound_row(&self, key: &str, role: ControlRole) -> Option<&FeedRow> {
        self.row(key).filter(|r| r.has_control(role))
    }

    /// Shows or hides the row's edit form and returns the toggle's new label.
    ///
    /// Showing starts an edit session with a fresh baseline. Hiding puts the
    /// baseline values back into the fields and ends the session, so the next
    /// session starts from what the server rendered.
    pub fn toggle_edit(&mut self, key: &str) -> Option<&'static str> {
        let row = self
            .list
            .feeds()
            .and_then(|l| l.row(key))
            .filter(|r| r.has_control(ControlRole::EditToggle))?;
        let state = self.rows.entry(key.to_string()).or_default();
        let label = toggle_visibility(&mut state.edit, LABEL_EDIT, LABEL_CANCEL_EDIT);

        if state.edit.is_shown() {
            self.tracker.capture_baseline(key, row);
            state.save_enabled = self.tracker.is_dirty(key, row);
            tracing::debug!(feed = key, "Edit session started");
        } else {
            state.save_enabled = false;
            self.restore_baseline(key);
            self.tracker.end_session(key);
            tracing::debug!(feed = key, "Edit session cancelled");
        }
        self.needs_redraw = true;
        Some(label)
    }

    /// Discards unsaved edits on the row by writing its baseline back.
    fn restore_baseline(&mut self, key: &str) {
        let Some(row) = self.list.feeds_mut().and_then(|l| l.row_mut(key)) else {
            return;
        };
        for (field, input) in row.fields.iter_mut() {
            if let Some(value) = self.tracker.baseline(key, *field) {
                input.value = value.to_string();
            }
        }
    }

    /// Applies a text edit to one of the row's edit fields, then recomputes
    /// whether save is enabled.
    pub fn edit_row_field(&mut self, key: &str, field: EditField, edit: TextEdit) {
        if field.is_choice() || !self.row_state(key).edit.is_shown() {
            return;
        }
        if let Some(input) = self
            .list
            .feeds_mut()
            .and_then(|l| l.row_mut(key))
            .and_then(|r| r.field_mut(field))
        {
            edit.apply(&mut input.value);
        }
        self.recompute_dirty(key);
    }

    pub fn set_row_field(&mut self, key: &str, field: EditField, value: &str) {
        if !self.row_state(key).edit.is_shown() {
            return;
        }
        if let Some(input) = self
            .list
            .feeds_mut()
            .and_then(|l| l.row_mut(key))
            .and_then(|r| r.field_mut(field))
        {
            input.value = value.to_string();
        }
        self.recompute_dirty(key);
    }

    pub fn cycle_row_field(&mut self, key: &str, field: EditField, forward: bool) {
        if !self.row_state(key).edit.is_shown() {
            return;
        }
        if let Some(input) = self
            .list
            .feeds_mut()
            .and_then(|l| l.row_mut(key))
            .and_then(|r| r.field_mut(field))
        {
            input.cycle(forward);
        }
        self.recompute_dirty(key);
    }

    /// Sets the save flag to exactly the current dirtiness.
    fn recompute_dirty(&mut self, key: &str) {
        let dirty = self
            .list
            .feeds()
            .and_then(|l| l.row(key))
            .is_some_and(|row| self.tracker.is_dirty(key, row));
        if let Some(state) = self.rows.get_mut(key) {
            state.save_enabled = dirty;
        }
        self.needs_redraw = true;
    }

    /// Sends the row's non-empty fields to `/modify`. Inert unless something
    /// changed and no save is already pending.
    pub fn save_edit(&mut self, key: &str, event_tx: &mpsc::Sender<AppEvent>) {
        let state = self.row_state(key);
        if !state.save_enabled || state.saving {
            return;
        }
        let Some(row) = self.bound_row(key, ControlRole::SaveEdit) else {
            return;
        };

        let mut settings = FeedSettings::new();
        for field in row.present_fields() {
            if let Some(value) = row.field_value(field).filter(|v| !v.is_empty()) {
                settings.set(field, value);
            }
        }
        let request = ModifyFeedRequest {
            feed_key: key.to_string(),
            settings,
        };

        tracing::info!(feed = key, "Saving feed changes");
        if let Some(state) = self.rows.get_mut(key) {
            state.saving = true;
        }
        let api = self.api.clone();
        self.spawn_action(
            ActionKind::ModifyFeed {
                key: key.to_string(),
            },
            event_tx,
            async move { api.modify_feed(&request).await },
        );
    }

    /// Routes the remove control through the confirmation gate. Only the
    /// second activation inside the timeout sends `/remove`.
    pub fn activate_remove(&mut self, key: &str, event_tx: &mpsc::Sender<AppEvent>) {
        if self.bound_row(key, ControlRole::RemoveFeed).is_none() || self.row_state(key).removing
        {
            return;
        }
        self.needs_redraw = true;

        match self.gate.activate(key.to_string()) {
            Activation::Armed => {
                tracing::debug!(feed = key, "Remove armed");
            }
            Activation::Confirmed => {
                tracing::info!(feed = key, "Removing feed");
                self.rows.entry(key.to_string()).or_default().removing = true;
                let api = self.api.clone();
                let feed_key = key.to_string();
                self.spawn_action(
                    ActionKind::RemoveFeed {
                        key: key.to_string(),
                    },
                    event_tx,
                    async move { api.remove_feed(&feed_key).await },
                );
            }
        }
    }

    /// Copies the row's generated-feed URL and shows transient feedback.
    pub fn copy_xml(&mut self, key: &str) {
        let Some(row) = self.bound_row(key, ControlRole::CopyXml) else {
            return;
        };
        let Some(xml_url) = row.xml_url.clone().filter(|u| !u.is_empty()) else {
            self.message.show(MSG_NO_XML);
            return;
        };

        match self.clipboard.copy(&xml_url) {
            Ok(path) => {
                tracing::debug!(feed = key, ?path, "Copied XML path");
                self.transients
                    .show(key.to_string(), LABEL_COPIED_XML, self.copy_feedback);
            }
            Err(e) => {
                tracing::warn!(feed = key, error = %e, "Clipboard copy failed");
                self.message.show(MSG_COPY_FAILED);
            }
        }
        self.needs_redraw = true;
    }

    /// Opens the row's source channel in the system browser.
    pub fn open_source(&mut self, key: &str) {
        let Some(url) = self.row(key).and_then(|r| r.source_url.clone()) else {
            self.message.show(MSG_NO_SOURCE);
            return;
        };
        // Validate before open::that() so a row cannot launch a non-web handler
        if let Err(e) = validate_url_for_open(&url) {
            self.message.show(e.to_string());
        } else if let Err(e) = open::that(&url) {
            self.message.show(format!("Failed to open browser: {}", e));
        }
    }

    // ------------------------------------------------------------------------
    // Background events
    // ------------------------------------------------------------------------

    fn spawn_action<F>(&mut self, action: ActionKind, event_tx: &mpsc::Sender<AppEvent>, call: F)
    where
        F: Future<Output = Result<String, TransportError>> + Send + 'static,
    {
        self.needs_redraw = true;
        let task = action.task_name();
        let settled = action.clone();
        // Mutations are not cancellable; the handle is detached.
        drop(spawn_reporting(
            task,
            Some(action),
            event_tx.clone(),
            async move {
                AppEvent::ActionSettled {
                    action: settled,
                    result: call.await,
                }
            },
        ));
    }

    /// Applies a background event to the state.
    pub fn handle_event(&mut self, event: AppEvent, event_tx: &mpsc::Sender<AppEvent>) {
        self.needs_redraw = true;
        match event {
            AppEvent::FeedListFetched { generation, result } => {
                self.apply_feed_list(generation, result);
            }
            AppEvent::ChangelogFetched { generation, result } => {
                self.apply_changelog(generation, result);
            }
            AppEvent::ActionSettled { action, result } => {
                self.settle_action(action, result, event_tx);
            }
            AppEvent::TaskPanicked {
                task,
                action,
                error,
            } => {
                tracing::error!(task, error, "Background task panicked");
                if let Some(action) = action {
                    self.release(&action);
                }
                if task == FEED_LIST_TASK {
                    self.sync.abandon_list();
                    if self.list == ListRegion::Loading {
                        self.list = ListRegion::Failed(LIST_ERROR_MESSAGE);
                    }
                }
                self.message.show(format!("Internal error in {} task", task));
            }
        }
    }

    fn apply_feed_list(&mut self, generation: u64, result: Result<String, TransportError>) {
        if !self.sync.accept_list(generation) {
            return;
        }
        let parsed = result
            .map_err(|e| e.to_string())
            .and_then(|markup| parse_feed_list(&markup).map_err(|e| e.to_string()));

        match parsed {
            Ok(list) => {
                tracing::debug!(rows = list.rows.len(), generation, "Feed list replaced");
                self.replace_list(ListRegion::Loaded(list));
            }
            Err(e) => {
                tracing::warn!(error = %e, "Failed to load feed list");
                self.replace_list(ListRegion::Failed(LIST_ERROR_MESSAGE));
            }
        }
    }

    fn apply_changelog(&mut self, generation: u64, result: Result<String, TransportError>) {
        if !self.sync.accept_changelog(generation) {
            return;
        }
        self.changelog = match result.map(|markup| parse_changelog(&markup)) {
            Ok(Ok(changelog)) => changelog,
            Ok(Err(e)) => {
                tracing::debug!(error = %e, "Unreadable changelog, clearing panel");
                Changelog::default()
            }
            Err(e) => {
                tracing::debug!(error = %e, "Changelog fetch failed, clearing panel");
                Changelog::default()
            }
        };
    }

    /// Replaces the list region wholesale and discards every per-row binding.
    /// Nothing survives from the previous rows except the selected key.
    fn replace_list(&mut self, region: ListRegion) {
        let previous_key = self.selected_key().map(str::to_string);

        self.list = region;
        self.rows.clear();
        self.tracker.clear();
        self.gate.reset_all();
        self.transients.clear();
        if self.focus == Focus::EditForm {
            self.focus = Focus::Feeds;
        }
        self.selected_edit_field = 0;

        if let Some(index) = previous_key.and_then(|key| {
            self.feeds()
                .and_then(|l| l.rows.iter().position(|r| r.key == key))
        }) {
            self.selected_row = index;
        }
        self.clamp_selection();
    }

    /// Releases the control that was busy with `action`.
    fn release(&mut self, action: &ActionKind) {
        match action {
            ActionKind::AddFeed => self.add_form.busy = false,
            ActionKind::Reload => self.reload_busy = false,
            ActionKind::ModifyFeed { key } => {
                if let Some(state) = self.rows.get_mut(key) {
                    state.saving = false;
                }
            }
            ActionKind::RemoveFeed { key } => {
                if let Some(state) = self.rows.get_mut(key) {
                    state.removing = false;
                }
            }
        }
    }

    fn settle_action(
        &mut self,
        action: ActionKind,
        result: Result<String, TransportError>,
        event_tx: &mpsc::Sender<AppEvent>,
    ) {
        self.release(&action);

        let succeeded = match result {
            Ok(message) => {
                tracing::info!(task = action.task_name(), message = %message, "Action succeeded");
                self.message.show(message);
                true
            }
            Err(e) => {
                tracing::warn!(
                    task = action.task_name(),
                    status = ?e.status(),
                    body = ?e.raw_text(),
                    error = %e,
                    "Action failed"
                );
                self.message.show(action.error_message());
                false
            }
        };

        match &action {
            ActionKind::AddFeed if succeeded => {
                self.add_form.reset();
                self.add_form.advanced = Visibility::Hidden;
            }
            ActionKind::ModifyFeed { key } => {
                if let Some(state) = self.rows.get_mut(key) {
                    state.edit = Visibility::Hidden;
                    state.save_enabled = false;
                }
                self.tracker.end_session(key);
                if self.focus == Focus::EditForm && self.selected_key() == Some(key.as_str()) {
                    self.focus = Focus::Feeds;
                }
            }
            _ => {}
        }

        if succeeded || action.resyncs_on_failure() {
            self.sync.request_resync(event_tx);
        }
    }

    // ------------------------------------------------------------------------
    // Tick
    // ------------------------------------------------------------------------

    /// Sweeps elapsed timers and advances the spinner.
    pub fn tick(&mut self) {
        let gate_expired = self.gate.expire();
        let labels_reverted = self.transients.expire();
        if gate_expired || labels_reverted {
            self.needs_redraw = true;
        }
        if self.is_loading() {
            self.spinner_frame = (self.spinner_frame + 1) % SPINNER_FRAMES;
            self.needs_redraw = true;
        }
    }
}
