//! Headless stand-ins for the host shell's dialogs and viewport

use painting::{CursorGizmo, HostDialogs, PreviewParams, PreviewSink};
use splat_painter_ipc::DialogAnswers;
use tracing::{debug, error, info};

/// Answers prompts from the session script and keeps every error shown
#[derive(Debug, Default)]
pub struct ScriptedHost {
    answers: DialogAnswers,
    errors: Vec<(String, String)>,
}

impl ScriptedHost {
    pub fn new(answers: DialogAnswers) -> Self {
        Self {
            answers,
            errors: Vec::new(),
        }
    }

    pub fn answers(&self) -> DialogAnswers {
        self.answers
    }

    /// Errors reported since the last call, as (title, message)
    pub fn take_errors(&mut self) -> Vec<(String, String)> {
        std::mem::take(&mut self.errors)
    }
}

impl HostDialogs for ScriptedHost {
    fn confirm_fill_all(&mut self) -> bool {
        info!("Fill all? {}", if self.answers.confirm_fill_all { "yes" } else { "no" });
        self.answers.confirm_fill_all
    }

    fn confirm_save_on_close(&mut self, target: &str) -> bool {
        info!(
            "Save changes to {}? {}",
            target,
            if self.answers.save_on_close { "yes" } else { "no" }
        );
        self.answers.save_on_close
    }

    fn report_error(&mut self, title: &str, message: &str) {
        error!("{}: {}", title, message);
        self.errors.push((title.to_string(), message.to_string()));
    }
}

/// Viewport without a rasterizer; logs what would be drawn
#[derive(Debug, Default)]
pub struct LogSink;

impl PreviewSink for LogSink {
    fn draw_mesh_slot(&mut self, slot: usize, params: &PreviewParams) {
        debug!(
            "Preview slot {} at uv ({:.3}, {:.3}) radius {:.4}",
            slot, params.cursor_uv[0], params.cursor_uv[1], params.uv_radius
        );
    }

    fn draw_cursor_gizmo(&mut self, gizmo: &CursorGizmo) {
        debug!("Cursor gizmo at {:?} facing {:?}", gizmo.center, gizmo.normal);
    }
}
