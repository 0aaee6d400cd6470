//! Main event loop for the TUI.
//!
//! Multiplexes terminal input, background task events, shutdown signals and
//! a periodic tick over a single `App`.

use crate::app::{App, AppEvent};
use anyhow::{Context, Result};
use crossterm::{
    event::{Event, EventStream, KeyEventKind},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use futures::StreamExt;
use ratatui::{backend::CrosstermBackend, Terminal};
use std::io::{self, Stdout};
use std::time::Duration;
use tokio::sync::mpsc;

use super::input::handle_input;
use super::render::render;

/// Drives gate expiry, copy-feedback revert and the spinner.
const TICK: Duration = Duration::from_millis(250);

/// Result of handling a key press event.
pub enum Action {
    /// Continue the event loop and process more events.
    Continue,
    /// Exit the application and restore the terminal.
    Quit,
}

/// Raw-mode alternate screen, restored when dropped.
struct TerminalSession {
    terminal: Terminal<CrosstermBackend<Stdout>>,
}

impl TerminalSession {
    fn enter() -> Result<Self> {
        enable_raw_mode().context("Failed to enable raw mode")?;
        let mut stdout = io::stdout();
        execute!(stdout, EnterAlternateScreen)?;
        let terminal = Terminal::new(CrosstermBackend::new(stdout))?;
        Ok(Self { terminal })
    }
}

impl Drop for TerminalSession {
    fn drop(&mut self) {
        if let Err(e) = disable_raw_mode() {
            tracing::warn!(error = %e, "Failed to disable raw mode");
        }
        if let Err(e) = execute!(self.terminal.backend_mut(), LeaveAlternateScreen) {
            tracing::warn!(error = %e, "Failed to leave alternate screen");
        }
        let _ = self.terminal.show_cursor();
    }
}

/// SIGTERM and SIGINT. Never fires on non-Unix platforms.
struct ShutdownSignals {
    #[cfg(unix)]
    term: tokio::signal::unix::Signal,
    #[cfg(unix)]
    int: tokio::signal::unix::Signal,
}

impl ShutdownSignals {
    #[cfg(unix)]
    fn install() -> Result<Self> {
        use tokio::signal::unix::{signal, SignalKind};
        Ok(Self {
            term: signal(SignalKind::terminate())?,
            int: signal(SignalKind::interrupt())?,
        })
    }

    #[cfg(not(unix))]
    fn install() -> Result<Self> {
        Ok(Self {})
    }

    /// Resolves with the signal name once either arrives.
    #[cfg(unix)]
    async fn recv(&mut self) -> &'static str {
        tokio::select! {
            _ = self.term.recv() => "SIGTERM",
            _ = self.int.recv() => "SIGINT",
        }
    }

    #[cfg(not(unix))]
    async fn recv(&mut self) -> &'static str {
        std::future::pending().await
    }
}

/// Runs the TUI until the user quits or a shutdown signal arrives.
///
/// The initial resync is issued here, so the first frame shows the list
/// region loading. A panic hook restores the terminal before unwinding.
pub async fn run(
    app: &mut App,
    event_tx: mpsc::Sender<AppEvent>,
    mut event_rx: mpsc::Receiver<AppEvent>,
) -> Result<()> {
    // Install panic hook BEFORE setting up terminal
    let original_hook = std::panic::take_hook();
    std::panic::set_hook(Box::new(move |panic_info| {
        let _ = disable_raw_mode();
        let _ = execute!(io::stdout(), LeaveAlternateScreen);
        original_hook(panic_info);
    }));

    let mut session = TerminalSession::enter()?;
    let mut signals = ShutdownSignals::install()?;
    let mut input = EventStream::new();
    let mut tick = tokio::time::interval(TICK);

    app.start(&event_tx);

    loop {
        if app.needs_redraw {
            session.terminal.draw(|f| render(f, app))?;
            app.needs_redraw = false;
        }

        // Drain task results first so typing cannot starve a resync
        while let Ok(event) = event_rx.try_recv() {
            app.handle_event(event, &event_tx);
        }

        tokio::select! {
            biased;

            name = signals.recv() => {
                tracing::info!(signal = name, "Shutting down");
                break;
            }

            maybe_event = input.next() => match maybe_event {
                Some(Ok(Event::Key(key))) if key.kind == KeyEventKind::Press => {
                    app.needs_redraw = true;
                    if let Action::Quit = handle_input(app, key.code, key.modifiers, &event_tx) {
                        break;
                    }
                }
                Some(Ok(Event::Resize(_, _))) => app.needs_redraw = true,
                Some(Ok(_)) => {}
                Some(Err(e)) => tracing::warn!(error = %e, "Terminal event stream error"),
                None => break,
            },

            Some(event) = event_rx.recv() => app.handle_event(event, &event_tx),

            _ = tick.tick() => app.tick(),
        }
    }

    app.sync.abort_all();
    drop(session);
    Ok(())
}
