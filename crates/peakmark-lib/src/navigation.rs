//! Window navigation.
//!
//! Previous, next and jump controls each remember when they last fired.
//! Whichever fired most recently decides the new window. A late-arriving
//! event carrying an older timestamp only records its own timestamp; the
//! newest control is applied again to the current window.

use crate::config::LoadNavigation;
use crate::window::WindowIndexer;
use serde::{Deserialize, Serialize};

/// Milliseconds since the epoch as reported by the UI; 0 means never fired.
pub type Timestamp = u64;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    Prev,
    Next,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum NavEvent {
    Previous { timestamp: Timestamp },
    Next { timestamp: Timestamp },
    Jump {
        seconds: Option<f64>,
        timestamp: Timestamp,
    },
    SubjectLoaded,
}

impl NavEvent {
    pub fn step(direction: Direction, timestamp: Timestamp) -> Self {
        match direction {
            Direction::Prev => NavEvent::Previous { timestamp },
            Direction::Next => NavEvent::Next { timestamp },
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NavTimestamps {
    pub prev: Timestamp,
    pub next: Timestamp,
    pub jump: Timestamp,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Control {
    Prev,
    Next,
    Jump,
}

impl NavTimestamps {
    /// Control that fired last. Ties go to prev, then next, then jump.
    fn latest(&self) -> Option<Control> {
        let mut best = (Control::Prev, self.prev);
        for candidate in [(Control::Next, self.next), (Control::Jump, self.jump)] {
            if candidate.1 > best.1 {
                best = candidate;
            }
        }
        (best.1 > 0).then_some(best.0)
    }
}

/// New window index given the controls' timestamps.
///
/// A missing, negative or NaN jump leaves the index where it is. The result
/// always lies in `[0, num_windows - 1]`.
pub fn resolve(
    stamps: &NavTimestamps,
    current: usize,
    jump_seconds: Option<f64>,
    indexer: &WindowIndexer,
) -> usize {
    let current = current.min(indexer.last_window());
    match stamps.latest() {
        None => current,
        Some(Control::Prev) => current.saturating_sub(1),
        Some(Control::Next) => (current + 1).min(indexer.last_window()),
        Some(Control::Jump) => match jump_seconds {
            Some(s) if !s.is_nan() && s >= 0.0 => indexer.time_to_window(s),
            _ => current,
        },
    }
}

/// Holds the navigation controls' state for one session.
#[derive(Debug, Clone, Default)]
pub struct Navigator {
    stamps: NavTimestamps,
    jump_seconds: Option<f64>,
    on_load: LoadNavigation,
}

impl Navigator {
    pub fn new(on_load: LoadNavigation) -> Self {
        Self {
            on_load,
            ..Self::default()
        }
    }

    pub fn stamps(&self) -> &NavTimestamps {
        &self.stamps
    }

    pub fn jump_seconds(&self) -> Option<f64> {
        self.jump_seconds
    }

    /// Record `event` and return the window to show next.
    pub fn apply(&mut self, event: NavEvent, current: usize, indexer: &WindowIndexer) -> usize {
        match event {
            NavEvent::SubjectLoaded => {
                return match self.on_load {
                    LoadNavigation::Reset => 0,
                    LoadNavigation::Advance => (current + 1).min(indexer.last_window()),
                };
            }
            NavEvent::Previous { timestamp } => self.stamps.prev = timestamp,
            NavEvent::Next { timestamp } => self.stamps.next = timestamp,
            NavEvent::Jump { seconds, timestamp } => {
                self.stamps.jump = timestamp;
                self.jump_seconds = seconds;
            }
        }
        resolve(&self.stamps, current, self.jump_seconds, indexer)
    }
}
