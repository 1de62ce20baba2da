//! Game-night spin lifecycle for one user.
//!
//! The selection is drawn before a [`Spin`] is built; the session only tracks when the reveal
//! becomes visible, so the revealed game is always the one chosen at spin start.

use std::time::{Duration, Instant};

use thiserror::Error;
use uuid::Uuid;

use crate::state::owned::OwnedGame;

/// One spin with its pre-computed outcome.
#[derive(Debug, Clone)]
pub struct Spin {
    pub id: Uuid,
    pub selection: OwnedGame,
    pub candidate_count: usize,
    /// Cosmetic names shown while spinning; the selection is appended as the last frame.
    pub reel: Vec<String>,
    pub started_at: Instant,
    pub duration: Duration,
}

impl Spin {
    pub fn remaining(&self, now: Instant) -> Duration {
        (self.started_at + self.duration).saturating_duration_since(now)
    }
}

/// Lifecycle of the spin owned by one user.
#[derive(Debug, Clone, Default)]
pub enum PickerPhase {
    #[default]
    Idle,
    Spinning(Spin),
    Revealed(Spin),
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum PickerError {
    #[error("a spin is already running ({} ms left)", remaining.as_millis())]
    SpinInProgress { remaining: Duration },
}

/// Spin state held per user.
#[derive(Debug, Clone, Default)]
pub struct PickerSession {
    phase: PickerPhase,
}

impl PickerSession {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn phase(&self) -> &PickerPhase {
        &self.phase
    }

    /// Move an elapsed spin to the revealed phase.
    pub fn advance(&mut self, now: Instant) {
        self.phase = match std::mem::take(&mut self.phase) {
            PickerPhase::Spinning(spin) if spin.remaining(now).is_zero() => {
                PickerPhase::Revealed(spin)
            }
            other => other,
        };
    }

    /// Begin a new spin unless one is still running.
    pub fn start(&mut self, spin: Spin, now: Instant) -> Result<(), PickerError> {
        self.advance(now);
        if let PickerPhase::Spinning(running) = &self.phase {
            return Err(PickerError::SpinInProgress {
                remaining: running.remaining(now),
            });
        }
        self.phase = PickerPhase::Spinning(spin);
        Ok(())
    }
}

/// Split `duration` into `frames` delays that grow towards the end (ease-out).
pub fn frame_delays(duration: Duration, frames: u32) -> Vec<Duration> {
    let frames = frames.max(1) as u64;
    let total_weight: u64 = (1..=frames).map(|step| step * step).sum();
    let total_ms = duration.as_millis() as u64;
    (1..=frames)
        .map(|step| Duration::from_millis(total_ms * step * step / total_weight))
        .collect()
}
