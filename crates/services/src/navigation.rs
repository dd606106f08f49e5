//! Input mapping for the story viewer.
//!
//! The presentation layer owns the raw events; this module fixes how they
//! translate into session operations so every front-end behaves the same.

use serde::{Deserialize, Serialize};

/// Minimum horizontal travel, in px-equivalent units, before a drag counts as a swipe.
pub const DEFAULT_SWIPE_THRESHOLD: f32 = 50.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Key {
    ArrowLeft,
    ArrowRight,
    Space,
    Escape,
    Other,
}

impl Key {
    /// Parses DOM-style key names (`"ArrowLeft"`, `" "`, `"Escape"`).
    pub fn from_name(name: &str) -> Self {
        match name {
            "ArrowLeft" => Self::ArrowLeft,
            "ArrowRight" => Self::ArrowRight,
            " " | "Space" | "Spacebar" => Self::Space,
            "Escape" | "Esc" => Self::Escape,
            _ => Self::Other,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TapZone {
    Left,
    Right,
    Center,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum NavInput {
    Key(Key),
    Tap(TapZone),
    /// Horizontal drag from `start_x` to `end_x`.
    Drag { start_x: f32, end_x: f32 },
    CloseControl,
    PauseControl,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum NavAction {
    Advance,
    Retreat,
    Close,
    TogglePause,
}

/// Resolves a raw input into the session operation it stands for, or `None`
/// when the input should be ignored.
pub fn resolve(input: NavInput, swipe_threshold: f32) -> Option<NavAction> {
    match input {
        NavInput::Key(Key::ArrowLeft) => Some(NavAction::Retreat),
        NavInput::Key(Key::ArrowRight) | NavInput::Key(Key::Space) => Some(NavAction::Advance),
        NavInput::Key(Key::Escape) => Some(NavAction::Close),
        NavInput::Key(Key::Other) => None,
        NavInput::Tap(TapZone::Left) => Some(NavAction::Retreat),
        NavInput::Tap(TapZone::Right) | NavInput::Tap(TapZone::Center) => Some(NavAction::Advance),
        NavInput::Drag { start_x, end_x } => resolve_drag(start_x, end_x, swipe_threshold),
        NavInput::CloseControl => Some(NavAction::Close),
        NavInput::PauseControl => Some(NavAction::TogglePause),
    }
}

// Finger moving right-to-left pulls the next story in.
fn resolve_drag(start_x: f32, end_x: f32, threshold: f32) -> Option<NavAction> {
    let diff = start_x - end_x;
    if !diff.is_finite() || diff.abs() <= threshold {
        return None;
    }
    if diff > 0.0 {
        Some(NavAction::Advance)
    } else {
        Some(NavAction::Retreat)
    }
}
