//! IPC message protocol for the splat painter
//!
//! Defines the messages exchanged between a host shell (menus, sliders,
//! dialogs, viewport input) and the painting engine. Messages are JSON with
//! an adjacent `type`/`data` tag.

pub mod commands;
pub mod error;
pub mod input;
pub mod messages;
pub mod script;

pub use commands::HostCommand;
pub use error::IpcError;
pub use input::{Modifiers, MouseButton, MouseEvent};
pub use messages::{HostToPainter, PainterToHost};
pub use script::{CameraSetup, DialogAnswers, SessionScript};
