//! Recorded host sessions replayed by the headless painter

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::IpcError;
use crate::messages::HostToPainter;

/// Viewport camera the pointer positions are relative to
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CameraSetup {
    pub eye: [f32; 3],
    pub target: [f32; 3],
    /// Vertical field of view in degrees
    pub fov_y_degrees: f32,
    /// Viewport size in pixels
    pub viewport: [f32; 2],
}

impl Default for CameraSetup {
    fn default() -> Self {
        Self {
            eye: [0.0, 0.0, 2.0],
            target: [0.0, 0.0, 0.0],
            fov_y_degrees: 60.0,
            viewport: [512.0, 512.0],
        }
    }
}

/// Answers the host gives to blocking prompts
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DialogAnswers {
    pub confirm_fill_all: bool,
    pub save_on_close: bool,
}

impl Default for DialogAnswers {
    fn default() -> Self {
        Self {
            confirm_fill_all: true,
            save_on_close: true,
        }
    }
}

/// A recorded session: the object to paint and the host messages to replay
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionScript {
    /// Splat texture asset of the scripted object, relative to the asset root
    pub splat_texture: String,
    #[serde(default)]
    pub camera: CameraSetup,
    #[serde(default)]
    pub dialogs: DialogAnswers,
    pub steps: Vec<HostToPainter>,
}

impl SessionScript {
    pub fn from_json(json: &str) -> Result<Self, IpcError> {
        let script: Self = serde_json::from_str(json)?;
        script.validate()?;
        Ok(script)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, IpcError> {
        let json = std::fs::read_to_string(path)?;
        Self::from_json(&json)
    }

    fn validate(&self) -> Result<(), IpcError> {
        if self.splat_texture.is_empty() {
            return Err(IpcError::InvalidFormat("splat_texture is empty".to_string()));
        }
        let [width, height] = self.camera.viewport;
        if !(width >= 1.0 && height >= 1.0) {
            return Err(IpcError::InvalidFormat(format!(
                "viewport {width}x{height} must be at least 1x1"
            )));
        }
        if !(self.camera.fov_y_degrees > 0.0 && self.camera.fov_y_degrees < 180.0) {
            return Err(IpcError::InvalidFormat(format!(
                "fov_y_degrees {} outside (0, 180)",
                self.camera.fov_y_degrees
            )));
        }
        Ok(())
    }
}
