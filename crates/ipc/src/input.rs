//! Pointer input forwarded by the host viewport

use serde::{Deserialize, Serialize};

/// Pointer events in viewport pixels (origin top-left).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum MouseEvent {
    Move {
        x: f32,
        y: f32,
        #[serde(default)]
        modifiers: Modifiers,
    },
    ButtonDown {
        button: MouseButton,
        x: f32,
        y: f32,
        #[serde(default)]
        modifiers: Modifiers,
    },
    ButtonUp {
        button: MouseButton,
        x: f32,
        y: f32,
        #[serde(default)]
        modifiers: Modifiers,
    },
}

impl MouseEvent {
    pub fn position(&self) -> [f32; 2] {
        match self {
            Self::Move { x, y, .. } | Self::ButtonDown { x, y, .. } | Self::ButtonUp { x, y, .. } => {
                [*x, *y]
            }
        }
    }

    pub fn modifiers(&self) -> &Modifiers {
        match self {
            Self::Move { modifiers, .. }
            | Self::ButtonDown { modifiers, .. }
            | Self::ButtonUp { modifiers, .. } => modifiers,
        }
    }

    /// The button whose edge this event carries, if any
    pub fn button(&self) -> Option<MouseButton> {
        match self {
            Self::Move { .. } => None,
            Self::ButtonDown { button, .. } | Self::ButtonUp { button, .. } => Some(*button),
        }
    }
}

/// Mouse button identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MouseButton {
    Left,
    Right,
    Middle,
}

/// Keyboard modifier keys state.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Modifiers {
    pub shift: bool,
    pub ctrl: bool,
    pub alt: bool,
    pub meta: bool,
}
