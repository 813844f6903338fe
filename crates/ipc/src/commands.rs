//! Commands issued by the host shell (menu entries, sliders, dialogs)

use serde::{Deserialize, Serialize};
use splat_painter_config::{BrushSettings, ChannelSetting};

/// Splat painter commands.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "data")]
pub enum HostCommand {
    /// Open the tool on the currently selected object
    OpenTool,
    /// Close the tool, prompting to save unsaved edits
    Close,
    /// Persist the working texture to its original asset
    Save,
    /// Flood the whole map with the active channel (confirm-gated)
    FillAll,
    /// Revert the most recent stroke
    Undo,
    /// Select the channel painted by subsequent strokes
    SetChannel { channel: ChannelSetting },
    /// Update the brush sliders
    SetBrush(BrushSettings),
    /// Show or hide the brush footprint on the mesh
    SetPreviewVisible { visible: bool },
}

impl HostCommand {
    /// Whether the command needs an open session to do anything
    pub fn requires_session(&self) -> bool {
        matches!(self, Self::Save | Self::FillAll | Self::Undo)
    }
}
