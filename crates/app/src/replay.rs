//! Replays recorded host messages through the splat painter

use glam::{Vec2, Vec3};
use painting::{
    AssetId, Camera, Channel, CompositeBackend, FileAssetStore, PaintError, PaintTarget,
    PointerInput, SceneObject, SplatPainter, StrokeEvent, SurfaceMesh, ToolStatus,
};
use splat_painter_config::PainterConfig;
use splat_painter_ipc::{
    CameraSetup, HostCommand, HostToPainter, MouseButton, MouseEvent, PainterToHost, SessionScript,
};
use tracing::{debug, info};

use crate::host::{LogSink, ScriptedHost};

/// Half extent of the scripted ground quad in world units
const GROUND_HALF_EXTENT: f32 = 1.0;

pub fn camera_from_setup(setup: &CameraSetup) -> Camera {
    Camera::look_at(
        Vec3::from_array(setup.eye),
        Vec3::from_array(setup.target),
        setup.fov_y_degrees.to_radians(),
        Vec2::from_array(setup.viewport),
    )
}

/// Convert a viewport event into one input tick
///
/// Only the left button paints; other buttons move the cursor.
pub fn pointer_input(event: &MouseEvent) -> PointerInput {
    let position = Vec2::from_array(event.position());
    let input = match event {
        MouseEvent::ButtonDown {
            button: MouseButton::Left,
            ..
        } => PointerInput::down(position),
        MouseEvent::ButtonUp {
            button: MouseButton::Left,
            ..
        } => PointerInput::up(position),
        _ => PointerInput::moved(position),
    };
    input.with_alt(event.modifiers().alt)
}

/// Drives a [`SplatPainter`] from host messages
pub struct Replayer<B, F>
where
    B: CompositeBackend,
    F: FnMut() -> Result<B, PaintError>,
{
    painter: SplatPainter<SceneObject, B, FileAssetStore, ScriptedHost>,
    camera: Camera,
    splat_texture: AssetId,
    /// The selected object while no session holds it
    selected: Option<SceneObject>,
    make_backend: F,
}

impl<B, F> Replayer<B, F>
where
    B: CompositeBackend,
    F: FnMut() -> Result<B, PaintError>,
{
    pub fn new(
        script: &SessionScript,
        config: PainterConfig,
        assets: FileAssetStore,
        make_backend: F,
    ) -> Self {
        let splat_texture = AssetId::new(script.splat_texture.as_str());
        Self {
            painter: SplatPainter::new(config, assets, ScriptedHost::new(script.dialogs)),
            camera: camera_from_setup(&script.camera),
            selected: Some(ground(&splat_texture)),
            splat_texture,
            make_backend,
        }
    }

    pub fn painter(&self) -> &SplatPainter<SceneObject, B, FileAssetStore, ScriptedHost> {
        &self.painter
    }

    /// Handle one host message and return the notifications it produced
    pub fn step(&mut self, message: &HostToPainter) -> Vec<PainterToHost> {
        let mut out = match message {
            HostToPainter::Command(command) => self.command(command),
            HostToPainter::Pointer(event) => self.pointer(event),
            HostToPainter::Frame => {
                let frame = self.painter.render_preview(&mut LogSink);
                vec![PainterToHost::PreviewDrawn {
                    slots: frame.slots_drawn,
                    gizmo: frame.gizmo_drawn,
                }]
            }
        };
        out.extend(
            self.painter
                .dialogs_mut()
                .take_errors()
                .into_iter()
                .map(|(title, message)| PainterToHost::error(title, message)),
        );
        out
    }

    /// Close any open session, as the host does on exit
    pub fn finish(&mut self) -> Vec<PainterToHost> {
        let mut out = self.close();
        out.extend(
            self.painter
                .dialogs_mut()
                .take_errors()
                .into_iter()
                .map(|(title, message)| PainterToHost::error(title, message)),
        );
        out
    }

    fn command(&mut self, command: &HostCommand) -> Vec<PainterToHost> {
        if command.requires_session() && self.painter.session().is_none() {
            debug!("Ignoring {:?}: no active session", command);
            return Vec::new();
        }

        match command {
            HostCommand::OpenTool => self.open(),
            HostCommand::Close => self.close(),
            HostCommand::Save => match self.painter.save() {
                Ok(()) => vec![PainterToHost::Saved {
                    asset: self.splat_texture.to_string(),
                }],
                // Reported through the dialog sink
                Err(_) => Vec::new(),
            },
            HostCommand::FillAll => match self.painter.fill_all() {
                Ok(true) => vec![PainterToHost::Filled],
                Ok(false) => Vec::new(),
                Err(e) => vec![PainterToHost::error("fill_all", e)],
            },
            HostCommand::Undo => {
                if self.painter.undo() {
                    let remaining = self.painter.session().map_or(0, |s| s.undo_count());
                    vec![PainterToHost::Undone { remaining }]
                } else {
                    Vec::new()
                }
            }
            HostCommand::SetChannel { channel } => {
                self.painter.set_channel(Channel::from(*channel));
                Vec::new()
            }
            HostCommand::SetBrush(settings) => {
                self.painter.set_brush(*settings);
                Vec::new()
            }
            HostCommand::SetPreviewVisible { visible } => {
                self.painter.set_preview_visible(*visible);
                Vec::new()
            }
        }
    }

    fn open(&mut self) -> Vec<PainterToHost> {
        let mut out = self.close();

        let backend = match (self.make_backend)() {
            Ok(backend) => backend,
            Err(e) => {
                out.push(PainterToHost::error("backend", e));
                return out;
            }
        };
        let target = self
            .selected
            .take()
            .unwrap_or_else(|| ground(&self.splat_texture));

        match self.painter.open(target, backend) {
            Ok(true) => {
                if let Some(session) = self.painter.session_mut() {
                    session.subscribe(|event| debug!("Stroke event: {:?}", event));
                    let (width, height) = session.texture_size();
                    out.push(PainterToHost::ToolOpened {
                        target: session.target().name().to_string(),
                        width,
                        height,
                        max_brush_size: session.max_brush_size(),
                    });
                }
            }
            Ok(false) => {
                if let ToolStatus::NotSuitable(reason) = self.painter.status() {
                    out.push(PainterToHost::NotSuitable {
                        reason: reason.to_string(),
                    });
                }
            }
            // Reported through the dialog sink
            Err(_) => {}
        }
        out
    }

    fn close(&mut self) -> Vec<PainterToHost> {
        let saved = self.painter.session().is_some_and(|session| session.is_dirty())
            && self.painter.dialogs().answers().save_on_close;

        // Also clears a stale not-suitable status
        match self.painter.close() {
            Ok(Some(target)) => {
                self.selected = Some(target);
                vec![PainterToHost::ToolClosed { saved }]
            }
            Ok(None) => Vec::new(),
            // Save on close failed; the session stays open
            Err(_) => Vec::new(),
        }
    }

    fn pointer(&mut self, event: &MouseEvent) -> Vec<PainterToHost> {
        let input = pointer_input(event);
        let outcome = match self.painter.tick(&self.camera, &input) {
            Ok(outcome) => outcome,
            Err(e) => return vec![PainterToHost::error("tick", e)],
        };

        let mut out: Vec<PainterToHost> = outcome
            .events
            .iter()
            .map(|event| match event {
                StrokeEvent::StrokeBegun => PainterToHost::StrokeBegun,
                StrokeEvent::StrokeEnded => PainterToHost::StrokeEnded,
            })
            .collect();
        if let Some(uv) = outcome.dab {
            out.push(PainterToHost::DabApplied { uv: uv.to_array() });
        }
        out
    }
}

/// The object the scripted host has selected
fn ground(splat_texture: &AssetId) -> SceneObject {
    SceneObject::new(
        "Ground",
        SurfaceMesh::quad(GROUND_HALF_EXTENT),
        splat_texture.clone(),
    )
}

/// Replay a whole script, logging every notification
pub fn run<B, F>(
    script: &SessionScript,
    config: PainterConfig,
    assets: FileAssetStore,
    make_backend: F,
) -> Vec<PainterToHost>
where
    B: CompositeBackend,
    F: FnMut() -> Result<B, PaintError>,
{
    let mut replayer = Replayer::new(script, config, assets, make_backend);
    let mut notifications = Vec::new();

    for (index, message) in script.steps.iter().enumerate() {
        for note in replayer.step(message) {
            match note.to_json() {
                Ok(json) => info!("[{}] {}", index, json),
                Err(e) => info!("[{}] {:?} ({})", index, note, e),
            }
            notifications.push(note);
        }
    }
    for note in replayer.finish() {
        info!("[exit] {:?}", note);
        notifications.push(note);
    }
    notifications
}
