//! Splat painter tool: the host-facing shell around at most one session

use splat_painter_config::{BrushSettings, PainterConfig};
use tracing::{error, info, warn};

use crate::asset::AssetStore;
use crate::backend::CompositeBackend;
use crate::channel::Channel;
use crate::error::{BindError, PaintError};
use crate::mapper::Camera;
use crate::preview::{PreviewFrame, PreviewSink};
use crate::session::Session;
use crate::stroke::{PointerInput, TickOutcome};
use crate::target::PaintTarget;

/// Blocking prompts provided by the host shell
pub trait HostDialogs {
    /// Ask before flooding the whole splat map
    fn confirm_fill_all(&mut self) -> bool;

    /// Ask whether to save unsaved edits before closing
    fn confirm_save_on_close(&mut self, target: &str) -> bool;

    /// Show a blocking error notification
    fn report_error(&mut self, title: &str, message: &str);
}

/// Tool status shown by the host
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ToolStatus {
    Closed,
    /// The last selected object cannot be painted
    NotSuitable(BindError),
    Active,
}

/// Splat map painting tool
pub struct SplatPainter<T: PaintTarget, B: CompositeBackend, A: AssetStore, D: HostDialogs> {
    config: PainterConfig,
    assets: A,
    dialogs: D,
    session: Option<Session<T, B>>,
    not_suitable: Option<BindError>,
}

impl<T, B, A, D> SplatPainter<T, B, A, D>
where
    T: PaintTarget,
    B: CompositeBackend,
    A: AssetStore,
    D: HostDialogs,
{
    pub fn new(config: PainterConfig, assets: A, dialogs: D) -> Self {
        Self {
            config,
            assets,
            dialogs,
            session: None,
            not_suitable: None,
        }
    }

    pub fn status(&self) -> ToolStatus {
        match (&self.session, &self.not_suitable) {
            (Some(_), _) => ToolStatus::Active,
            (None, Some(reason)) => ToolStatus::NotSuitable(reason.clone()),
            (None, None) => ToolStatus::Closed,
        }
    }

    /// Open the tool on the selected object
    ///
    /// An ineligible object leaves the tool in the `NotSuitable` state and
    /// returns `Ok(false)`. An open session is closed first.
    pub fn open(&mut self, target: T, backend: B) -> Result<bool, PaintError> {
        if self.session.is_some() {
            self.close()?;
        }

        match Session::bind(target, backend, &self.assets, &self.config) {
            Ok(session) => {
                self.session = Some(session);
                self.not_suitable = None;
                Ok(true)
            }
            Err(PaintError::NotSuitable(reason)) => {
                warn!("Selected object not suitable for splat map painting: {}", reason);
                self.not_suitable = Some(reason);
                Ok(false)
            }
            Err(e) => {
                error!("Failed to open splat painter: {}", e);
                self.dialogs.report_error("Splat Painter", &e.to_string());
                Err(e)
            }
        }
    }

    /// Close the tool, offering to save unsaved edits
    ///
    /// Returns the target. If the user chose to save and the save fails,
    /// the session stays open.
    pub fn close(&mut self) -> Result<Option<T>, PaintError> {
        let Some(session) = self.session.as_mut() else {
            self.not_suitable = None;
            return Ok(None);
        };

        if session.is_dirty() && self.dialogs.confirm_save_on_close(session.target().name()) {
            if let Err(e) = session.save(&mut self.assets) {
                error!("Failed to save splat map on close: {}", e);
                self.dialogs.report_error("Save failed", &e.to_string());
                return Err(e);
            }
        }

        Ok(self.session.take().map(Session::unbind))
    }

    /// Persist the working texture
    pub fn save(&mut self) -> Result<(), PaintError> {
        let session = self.session.as_mut().ok_or(PaintError::NoSession)?;
        session.save(&mut self.assets).inspect_err(|e| {
            error!("Failed to save splat map: {}", e);
            self.dialogs.report_error("Save failed", &e.to_string());
        })
    }

    /// Flood the texture with the active channel after confirmation
    ///
    /// Returns false if the user declined.
    pub fn fill_all(&mut self) -> Result<bool, PaintError> {
        let session = self.session.as_mut().ok_or(PaintError::NoSession)?;
        if !self.dialogs.confirm_fill_all() {
            info!("Fill all declined");
            return Ok(false);
        }
        session.fill_all()?;
        Ok(true)
    }

    /// Handle the host's undo signal; a no-op without a session or history
    pub fn undo(&mut self) -> bool {
        self.session.as_mut().is_some_and(Session::undo)
    }

    /// Per-tick pointer input; ignored while no session is active
    pub fn tick(&mut self, camera: &Camera, input: &PointerInput) -> Result<TickOutcome, PaintError> {
        match self.session.as_mut() {
            Some(session) => session.tick(camera, input),
            None => Ok(TickOutcome::default()),
        }
    }

    /// Per-frame brush feedback
    pub fn render_preview(&self, sink: &mut dyn PreviewSink) -> PreviewFrame {
        self.session
            .as_ref()
            .map(|session| session.render_preview(sink))
            .unwrap_or_default()
    }

    /// Select the channel for this and later sessions
    pub fn set_channel(&mut self, channel: Channel) {
        self.config.active_channel = channel.into();
        if let Some(session) = self.session.as_mut() {
            session.set_channel(channel);
        }
    }

    /// Update the brush sliders for this and later sessions
    pub fn set_brush(&mut self, settings: BrushSettings) {
        self.config.brush = settings;
        if let Some(session) = self.session.as_mut() {
            session.set_brush(&settings);
        }
    }

    /// Toggle the brush footprint for this and later sessions
    pub fn set_preview_visible(&mut self, visible: bool) {
        self.config.preview.show_brush_preview = visible;
        if let Some(session) = self.session.as_mut() {
            session.set_preview_visible(visible);
        }
    }

    pub fn config(&self) -> &PainterConfig {
        &self.config
    }

    pub fn session(&self) -> Option<&Session<T, B>> {
        self.session.as_ref()
    }

    pub fn session_mut(&mut self) -> Option<&mut Session<T, B>> {
        self.session.as_mut()
    }

    pub fn assets(&self) -> &A {
        &self.assets
    }

    pub fn dialogs(&self) -> &D {
        &self.dialogs
    }

    pub fn dialogs_mut(&mut self) -> &mut D {
        &mut self.dialogs
    }
}
