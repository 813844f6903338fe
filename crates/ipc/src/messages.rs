//! Main IPC message enums for communication between the host shell and the painter.

use serde::{Deserialize, Serialize};

use crate::commands::HostCommand;
use crate::error::IpcError;
use crate::input::MouseEvent;

/// Messages from the host shell to the painter.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "data")]
pub enum HostToPainter {
    /// Menu, slider or dialog command
    Command(HostCommand),

    /// Pointer event in the scene viewport; one event per input tick
    Pointer(MouseEvent),

    /// The host rendered a frame and wants the brush preview drawn
    Frame,
}

/// Notifications from the painter to the host shell.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "data")]
pub enum PainterToHost {
    /// A session was bound to the selected object
    ToolOpened {
        target: String,
        width: u32,
        height: u32,
        max_brush_size: u32,
    },

    /// The selected object cannot be painted
    NotSuitable { reason: String },

    /// The session was released and the original texture rebound
    ToolClosed { saved: bool },

    /// A stroke started (undo snapshot taken)
    StrokeBegun,

    /// The pointer was released
    StrokeEnded,

    /// A dab was composited at this uv
    DabApplied { uv: [f32; 2] },

    /// The whole map was flooded with the active channel
    Filled,

    /// The working texture was written to its asset
    Saved { asset: String },

    /// A stroke was reverted
    Undone { remaining: usize },

    /// The preview pass for one frame
    PreviewDrawn { slots: usize, gizmo: bool },

    /// Error notification
    Error { code: String, message: String },
}

impl PainterToHost {
    pub fn error(code: impl Into<String>, message: impl ToString) -> Self {
        Self::Error {
            code: code.into(),
            message: message.to_string(),
        }
    }

    pub fn to_json(&self) -> Result<String, IpcError> {
        Ok(serde_json::to_string(self)?)
    }
}

impl HostToPainter {
    pub fn from_json(json: &str) -> Result<Self, IpcError> {
        Ok(serde_json::from_str(json)?)
    }
}
