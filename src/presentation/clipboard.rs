//! Copy-to-clipboard with a primary mechanism and a scoped fallback.
//!
//! The primary path is the system clipboard via `arboard`. When it is missing
//! (no display server, headless session) or refuses the write, the text is
//! piped into the first clipboard helper program found on the system. The
//! helper process is owned by a guard that reaps it on every exit path.

use std::io::Write;
use std::process::{Child, Command, Stdio};
use std::time::{Duration, Instant};
use thiserror::Error;

/// Default time a helper gets to take the text and exit.
const HELPER_WAIT_LIMIT: Duration = Duration::from_secs(2);
const HELPER_POLL: Duration = Duration::from_millis(10);

#[derive(Debug, Error)]
pub enum ClipboardError {
    #[error("System clipboard unavailable: {0}")]
    Unavailable(String),
    #[error("No clipboard helper program found")]
    NoHelper,
    #[error("Clipboard helper '{program}' failed: {reason}")]
    Helper {
        program: &'static str,
        reason: String,
    },
    #[error("Copy failed ({primary}; fallback: {fallback})")]
    Exhausted {
        primary: Box<ClipboardError>,
        fallback: Box<ClipboardError>,
    },
}

/// Which mechanism performed a successful copy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CopyPath {
    Primary,
    Fallback,
}

/// A way of placing text on the clipboard.
pub trait ClipboardBackend {
    fn name(&self) -> &'static str;
    fn set_text(&mut self, text: &str) -> Result<(), ClipboardError>;
}

// ============================================================================
// Primary: system clipboard
// ============================================================================

/// The platform clipboard. The handle is opened lazily and kept for the
/// lifetime of the app, since on X11 the contents are served by the owner.
#[derive(Default)]
pub struct SystemClipboard {
    inner: Option<arboard::Clipboard>,
}

impl SystemClipboard {
    pub fn new() -> Self {
        Self::default()
    }
}

impl ClipboardBackend for SystemClipboard {
    fn name(&self) -> &'static str {
        "system"
    }

    fn set_text(&mut self, text: &str) -> Result<(), ClipboardError> {
        if self.inner.is_none() {
            let opened = arboard::Clipboard::new()
                .map_err(|e| ClipboardError::Unavailable(e.to_string()))?;
            self.inner = Some(opened);
        }
        let clipboard = self
            .inner
            .as_mut()
            .ok_or_else(|| ClipboardError::Unavailable("not initialised".to_string()))?;
        clipboard
            .set_text(text.to_string())
            .map_err(|e| ClipboardError::Unavailable(e.to_string()))
    }
}

// ============================================================================
// Fallback: helper program
// ============================================================================

/// An external program that reads clipboard contents from stdin.
#[derive(Debug, Clone, Copy)]
pub struct HelperCommand {
    pub program: &'static str,
    pub args: &'static [&'static str],
}

/// Helpers tried in order. Missing programs are skipped.
pub const DEFAULT_HELPERS: &[HelperCommand] = &[
    HelperCommand {
        program: "wl-copy",
        args: &[],
    },
    HelperCommand {
        program: "xclip",
        args: &["-selection", "clipboard"],
    },
    HelperCommand {
        program: "xsel",
        args: &["--clipboard", "--input"],
    },
    HelperCommand {
        program: "pbcopy",
        args: &[],
    },
    HelperCommand {
        program: "clip",
        args: &[],
    },
];

/// Owns a spawned helper. Dropping it kills the process if it is still
/// running and always waits on it, so no helper outlives the copy attempt.
struct ScopedChild {
    child: Option<Child>,
}

impl ScopedChild {
    fn spawn(helper: &HelperCommand) -> std::io::Result<Self> {
        let child = Command::new(helper.program)
            .args(helper.args)
            .stdin(Stdio::piped())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .spawn()?;
        Ok(Self { child: Some(child) })
    }

    fn feed_and_wait(mut self, text: &str, limit: Duration) -> Result<(), String> {
        let Some(child) = self.child.as_mut() else {
            return Err("helper already reaped".to_string());
        };
        if let Some(mut stdin) = child.stdin.take() {
            stdin.write_all(text.as_bytes()).map_err(|e| e.to_string())?;
            // stdin is dropped here so the helper sees EOF
        }
        // Polled so a helper that never exits cannot stall the event loop;
        // on timeout Drop kills and reaps it.
        let deadline = Instant::now() + limit;
        let status = loop {
            if let Some(status) = child.try_wait().map_err(|e| e.to_string())? {
                break status;
            }
            if Instant::now() >= deadline {
                return Err(format!("timed out after {} ms", limit.as_millis()));
            }
            std::thread::sleep(HELPER_POLL);
        };
        self.child = None;
        if status.success() {
            Ok(())
        } else {
            Err(format!("exited with {}", status))
        }
    }
}

impl Drop for ScopedChild {
    fn drop(&mut self) {
        if let Some(mut child) = self.child.take() {
            if matches!(child.try_wait(), Ok(None)) {
                let _ = child.kill();
            }
            let _ = child.wait();
        }
    }
}

/// Fallback backend that pipes text into the first available helper program.
pub struct CommandClipboard {
    helpers: Vec<HelperCommand>,
    wait_limit: Duration,
}

impl CommandClipboard {
    pub fn new(helpers: &[HelperCommand]) -> Self {
        Self {
            helpers: helpers.to_vec(),
            wait_limit: HELPER_WAIT_LIMIT,
        }
    }

    /// How long a helper may take to exit before it is killed.
    pub fn with_wait_limit(mut self, limit: Duration) -> Self {
        self.wait_limit = limit;
        self
    }
}

impl Default for CommandClipboard {
    fn default() -> Self {
        Self::new(DEFAULT_HELPERS)
    }
}

impl ClipboardBackend for CommandClipboard {
    fn name(&self) -> &'static str {
        "helper"
    }

    fn set_text(&mut self, text: &str) -> Result<(), ClipboardError> {
        for helper in &self.helpers {
            let child = match ScopedChild::spawn(helper) {
                Ok(child) => child,
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => continue,
                Err(e) => {
                    return Err(ClipboardError::Helper {
                        program: helper.program,
                        reason: e.to_string(),
                    })
                }
            };
            return child
                .feed_and_wait(text, self.wait_limit)
                .map_err(|reason| ClipboardError::Helper {
                    program: helper.program,
                    reason,
                });
        }
        Err(ClipboardError::NoHelper)
    }
}

// ============================================================================
// Clipboard
// ============================================================================

/// Primary-then-fallback clipboard.
pub struct Clipboard {
    primary: Box<dyn ClipboardBackend>,
    fallback: Box<dyn ClipboardBackend>,
}

impl Clipboard {
    /// System clipboard with helper-program fallback.
    pub fn system() -> Self {
        Self::with_backends(
            Box::new(SystemClipboard::new()),
            Box::new(CommandClipboard::default()),
        )
    }

    pub fn with_backends(
        primary: Box<dyn ClipboardBackend>,
        fallback: Box<dyn ClipboardBackend>,
    ) -> Self {
        Self { primary, fallback }
    }

    /// Copies `text`, trying the primary mechanism first.
    pub fn copy(&mut self, text: &str) -> Result<CopyPath, ClipboardError> {
        let primary_err = match self.primary.set_text(text) {
            Ok(()) => return Ok(CopyPath::Primary),
            Err(e) => e,
        };
        tracing::debug!(
            backend = self.primary.name(),
            error = %primary_err,
            "Primary clipboard failed, trying fallback"
        );

        match self.fallback.set_text(text) {
            Ok(()) => Ok(CopyPath::Fallback),
            Err(fallback_err) => Err(ClipboardError::Exhausted {
                primary: Box::new(primary_err),
                fallback: Box::new(fallback_err),
            }),
        }
    }
}
