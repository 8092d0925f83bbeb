//! Lifecycle of a single access attempt.
//!
//! ```text
//! Unauthenticated -> Validating -> Granted
//!                               -> Denied
//! ```
//!
//! Web actors arrive already authenticated and skip straight from
//! `Unauthenticated` to `Granted`.

use gatewarden_core::{Error, Result};
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AttemptState {
    Unauthenticated,
    /// PIN resolved, window checks running.
    Validating,
    Granted,
    Denied,
}

impl AttemptState {
    pub fn can_transition_to(&self, target: &AttemptState) -> bool {
        matches!(
            (self, target),
            (
                AttemptState::Unauthenticated,
                AttemptState::Validating | AttemptState::Granted | AttemptState::Denied
            ) | (AttemptState::Validating, AttemptState::Granted | AttemptState::Denied)
        )
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, AttemptState::Granted | AttemptState::Denied)
    }
}

impl fmt::Display for AttemptState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            AttemptState::Unauthenticated => "Unauthenticated",
            AttemptState::Validating => "Validating",
            AttemptState::Granted => "Granted",
            AttemptState::Denied => "Denied",
        };
        write!(f, "{name}")
    }
}

/// Tracks one attempt through its states.
#[derive(Debug, Clone)]
pub struct Attempt {
    state: AttemptState,
    history: Vec<AttemptState>,
}

impl Default for Attempt {
    fn default() -> Self {
        Self::new()
    }
}

impl Attempt {
    pub fn new() -> Self {
        Self {
            state: AttemptState::Unauthenticated,
            history: vec![AttemptState::Unauthenticated],
        }
    }

    pub fn state(&self) -> AttemptState {
        self.state
    }

    /// States visited so far, in order.
    pub fn history(&self) -> &[AttemptState] {
        &self.history
    }

    pub fn transition_to(&mut self, target: AttemptState) -> Result<()> {
        if !self.state.can_transition_to(&target) {
            return Err(Error::InvalidStateTransition {
                from: self.state.to_string(),
                to: target.to_string(),
            });
        }
        self.state = target;
        self.history.push(target);
        Ok(())
    }
}
