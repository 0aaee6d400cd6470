//! Two-step confirmation for destructive controls.
//!
//! State is held explicitly per control; labels are derived from it and are
//! never read back to infer whether a control is armed.

use std::collections::HashMap;
use std::hash::Hash;
use std::time::Duration;
use tokio::time::Instant;

/// How long an armed control waits for its confirming activation.
pub const DEFAULT_CONFIRM_TIMEOUT: Duration = Duration::from_millis(3000);

/// Label shown on a remove control while it is armed.
pub const CONFIRM_REMOVE_LABEL: &str = "Confirm Remove";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfirmState {
    Idle,
    Armed { expires_at: Instant },
}

/// What an activation did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Activation {
    /// First activation: the control is now waiting for confirmation.
    Armed,
    /// Second activation within the timeout: dispatch the action.
    Confirmed,
}

#[derive(Debug, Clone)]
pub struct ConfirmationGate<K> {
    timeout: Duration,
    armed: HashMap<K, Instant>,
}

impl<K: Eq + Hash + Clone> ConfirmationGate<K> {
    pub fn new(timeout: Duration) -> Self {
        Self {
            timeout,
            armed: HashMap::new(),
        }
    }

    /// Activates the control for `key`.
    ///
    /// An armed control whose deadline has passed is treated as idle, so a late
    /// second activation arms again instead of confirming.
    pub fn activate(&mut self, key: K) -> Activation {
        let now = Instant::now();
        match self.armed.remove(&key) {
            Some(expires_at) if now < expires_at => Activation::Confirmed,
            _ => {
                self.armed.insert(key, now + self.timeout);
                Activation::Armed
            }
        }
    }

    pub fn state(&self, key: &K) -> ConfirmState {
        match self.armed.get(key) {
            Some(&expires_at) if Instant::now() < expires_at => ConfirmState::Armed { expires_at },
            _ => ConfirmState::Idle,
        }
    }

    pub fn is_armed(&self, key: &K) -> bool {
        matches!(self.state(key), ConfirmState::Armed { .. })
    }

    /// Label for the control: the prompt while armed, else `idle_label`.
    pub fn label<'a>(&self, key: &K, idle_label: &'a str) -> &'a str {
        match self.state(key) {
            ConfirmState::Armed { .. } => CONFIRM_REMOVE_LABEL,
            ConfirmState::Idle => idle_label,
        }
    }

    /// Returns elapsed controls to idle. True if any reverted.
    pub fn expire(&mut self) -> bool {
        let now = Instant::now();
        let before = self.armed.len();
        self.armed.retain(|_, expires_at| now < *expires_at);
        self.armed.len() != before
    }

    /// Disarms everything; the controls they belonged to no longer exist.
    pub fn reset_all(&mut self) {
        self.armed.clear();
    }
}

impl<K: Eq + Hash + Clone> Default for ConfirmationGate<K> {
    fn default() -> Self {
        Self::new(DEFAULT_CONFIRM_TIMEOUT)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::time;

    #[tokio::test]
    async fn test_single_activation_only_arms() {
        time::pause();
        let mut gate = ConfirmationGate::default();
        assert_eq!(gate.activate("alpha"), Activation::Armed);
        assert_eq!(gate.label(&"alpha", "Remove Feed"), "Confirm Remove");

        time::advance(Duration::from_millis(3000)).await;
        assert_eq!(gate.state(&"alpha"), ConfirmState::Idle);
        assert_eq!(gate.label(&"alpha", "Remove Feed"), "Remove Feed");
        assert!(gate.expire());
    }

    #[tokio::test]
    async fn test_second_activation_within_timeout_confirms() {
        time::pause();
        let mut gate = ConfirmationGate::default();
        gate.activate("alpha");
        time::advance(Duration::from_millis(2999)).await;
        assert_eq!(gate.activate("alpha"), Activation::Confirmed);
        assert_eq!(gate.state(&"alpha"), ConfirmState::Idle);

        // Confirming consumed the armed state.
        assert_eq!(gate.activate("alpha"), Activation::Armed);
    }

    #[tokio::test]
    async fn test_late_second_activation_rearms() {
        time::pause();
        let mut gate = ConfirmationGate::default();
        gate.activate("alpha");
        time::advance(Duration::from_millis(3001)).await;
        assert_eq!(gate.activate("alpha"), Activation::Armed);

        let ConfirmState::Armed { expires_at } = gate.state(&"alpha") else {
            panic!("expected armed");
        };
        assert_eq!(expires_at, Instant::now() + DEFAULT_CONFIRM_TIMEOUT);
    }

    #[tokio::test]
    async fn test_controls_are_independent() {
        time::pause();
        let mut gate = ConfirmationGate::default();
        gate.activate("alpha");
        assert_eq!(gate.activate("beta"), Activation::Armed);
        assert_eq!(gate.activate("alpha"), Activation::Confirmed);
        assert!(gate.is_armed(&"beta"));

        gate.reset_all();
        assert!(!gate.is_armed(&"beta"));
    }
}
