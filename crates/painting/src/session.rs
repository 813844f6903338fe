//! Painting session: one target bound to one working splat texture
//!
//! Binding validates the target, loads a working copy of its splat map,
//! attaches a temporary collider when the target has none and fetches the
//! layer previews. Unbinding restores the original texture binding and
//! removes whatever the session attached.

use splat_painter_config::{BrushSettings, PainterConfig};
use tracing::{debug, info, warn};

use crate::asset::{AssetId, AssetStore};
use crate::backend::CompositeBackend;
use crate::brush::BrushState;
use crate::channel::Channel;
use crate::compositor::PaintCompositor;
use crate::constants::LAYER_COUNT;
use crate::error::{BindError, PaintError};
use crate::mapper::{Camera, SurfaceMapper};
use crate::preview::{BrushPreviewRenderer, PreviewFrame, PreviewSink};
use crate::raycast::MeshCollider;
use crate::stroke::{PointerInput, StrokeController, StrokeEvent, StrokeState, TickOutcome};
use crate::surface::CpuTexture;
use crate::target::{PaintTarget, SplatBinding};
use crate::types::SurfaceHit;
use crate::undo::UndoManager;

/// Check that a target can be painted
///
/// Returns the splat material slot and the splat texture's asset id.
pub fn validate_target(target: &impl PaintTarget) -> Result<(usize, AssetId), BindError> {
    if target.mesh().is_none() {
        return Err(BindError::MissingMesh);
    }
    let material = target
        .splat_material()
        .ok_or(BindError::MissingSplatMaterial)?;
    let texture = material
        .splat_texture
        .ok_or(BindError::MissingSplatTexture)?;
    Ok((material.slot, texture))
}

/// An active painting session
pub struct Session<T: PaintTarget, B: CompositeBackend> {
    target: T,
    original: AssetId,
    splat_slot: usize,
    /// Whether the session attached the collider it will remove
    created_collider: bool,
    compositor: PaintCompositor<B>,
    undo: UndoManager<B>,
    stroke: StrokeController,
    mapper: SurfaceMapper,
    preview: BrushPreviewRenderer,
    brush: BrushState,
    channel: Channel,
    layer_previews: [Option<CpuTexture>; LAYER_COUNT],
    dirty: bool,
}

impl<T: PaintTarget, B: CompositeBackend> Session<T, B> {
    /// Bind a target
    pub fn bind(
        mut target: T,
        backend: B,
        assets: &dyn AssetStore,
        config: &PainterConfig,
    ) -> Result<Self, PaintError> {
        let (splat_slot, original) = validate_target(&target)?;

        let working = assets.load_texture(&original)?;
        if working.width == 0 || working.height == 0 {
            return Err(BindError::EmptyTexture {
                width: working.width,
                height: working.height,
            }
            .into());
        }
        let compositor = PaintCompositor::new(backend, &working)?;
        let largest = compositor.largest_dimension();

        let layer_previews = load_layer_previews(&target, assets, config.preview.layer_preview_size);

        let created_collider = if target.collider().is_none() {
            let mesh = target.mesh().cloned().unwrap_or_default();
            let collider = MeshCollider::new(mesh, target.transform());
            target.attach_collider(collider);
            debug!("{}: attached temporary collider", target.name());
            true
        } else {
            false
        };

        target.bind_splat_texture(splat_slot, SplatBinding::Working);

        let mut brush = BrushState::from_settings(&config.brush);
        brush.apply_settings(&config.brush, largest);

        info!(
            "Bound {} ({}x{} splat map {}, slot {})",
            target.name(),
            working.width,
            working.height,
            original,
            splat_slot
        );

        Ok(Self {
            target,
            original,
            splat_slot,
            created_collider,
            compositor,
            undo: UndoManager::new(config.undo.max_depth),
            stroke: StrokeController::new(),
            mapper: SurfaceMapper::new(),
            preview: BrushPreviewRenderer {
                visible: config.preview.show_brush_preview,
            },
            brush,
            channel: config.active_channel.into(),
            layer_previews,
            dirty: false,
        })
    }

    /// Tear the session down and hand the target back
    ///
    /// Unsaved edits are discarded; persist them with [`Session::save`]
    /// first.
    pub fn unbind(mut self) -> T {
        self.target
            .bind_splat_texture(self.splat_slot, SplatBinding::Original(self.original.clone()));
        if self.created_collider {
            self.target.detach_collider();
            debug!("{}: removed temporary collider", self.target.name());
        }
        if self.dirty {
            warn!("{}: discarding unsaved splat map edits", self.target.name());
        }
        info!("Unbound {}", self.target.name());
        self.target
    }

    /// Process one input tick against the target under the camera
    pub fn tick(&mut self, camera: &Camera, input: &PointerInput) -> Result<TickOutcome, PaintError> {
        let hit = self.mapper.map(camera, input.position, self.target.collider());
        self.apply_input(input, hit.as_ref())
    }

    /// Process one input tick with a hit already resolved by the host
    pub fn apply_input(
        &mut self,
        input: &PointerInput,
        hit: Option<&SurfaceHit>,
    ) -> Result<TickOutcome, PaintError> {
        let outcome = self.stroke.tick(
            input,
            hit.map(|hit| hit.uv),
            &mut self.brush,
            self.compositor.largest_dimension(),
        );

        for event in &outcome.events {
            if *event == StrokeEvent::StrokeBegun {
                if let Err(err) = self.undo.snapshot(&mut self.compositor) {
                    warn!("Stroke dropped, undo snapshot failed: {}", err);
                    self.stroke.abort(&mut self.brush);
                    return Err(err);
                }
            }
        }

        if let Some(uv) = outcome.dab {
            self.compositor.apply_dab(
                uv,
                self.brush.size as f32,
                self.channel,
                self.brush.hardness,
            );
            self.dirty = true;
        }

        Ok(outcome)
    }

    /// Register a stroke event listener
    pub fn subscribe(&mut self, listener: impl FnMut(StrokeEvent) + 'static) {
        self.stroke.subscribe(listener);
    }

    /// Draw this frame's brush feedback
    pub fn render_preview(&self, sink: &mut dyn PreviewSink) -> PreviewFrame {
        self.preview.render(
            sink,
            &self.brush,
            self.channel,
            self.stroke.state(),
            self.target.material_slot_count(),
            self.compositor.largest_dimension(),
            self.mapper.cursor_gizmo(),
        )
    }

    /// Toggle the brush footprint; the cursor gizmo is unaffected
    pub fn set_preview_visible(&mut self, visible: bool) {
        self.preview.visible = visible;
    }

    /// Flood the whole texture with the active channel as one undoable dab
    pub fn fill_all(&mut self) -> Result<(), PaintError> {
        self.undo.snapshot(&mut self.compositor)?;
        self.compositor.fill_all(self.channel, self.brush.hardness);
        self.dirty = true;
        info!("{}: filled splat map with {:?}", self.target.name(), self.channel);
        Ok(())
    }

    /// Undo the most recent stroke
    pub fn undo(&mut self) -> bool {
        let undone = self.undo.undo(&mut self.compositor);
        if undone {
            self.dirty = true;
        }
        undone
    }

    /// Persist the working texture to the original asset
    ///
    /// On failure the session is left untouched so the save can be retried.
    pub fn save(&mut self, assets: &mut dyn AssetStore) -> Result<(), PaintError> {
        let texture = self.compositor.read_back()?;
        assets.save_texture(&self.original, &texture)?;
        self.dirty = false;
        info!("{}: saved splat map to {}", self.target.name(), self.original);
        Ok(())
    }

    pub fn set_channel(&mut self, channel: Channel) {
        debug!("Active channel: {:?}", channel);
        self.channel = channel;
    }

    pub fn channel(&self) -> Channel {
        self.channel
    }

    /// Apply slider values, clamped for this texture
    pub fn set_brush(&mut self, settings: &BrushSettings) {
        self.brush
            .apply_settings(settings, self.compositor.largest_dimension());
    }

    pub fn brush(&self) -> &BrushState {
        &self.brush
    }

    /// Upper bound of the size slider for this texture
    pub fn max_brush_size(&self) -> u32 {
        BrushSettings::max_size_for(self.compositor.largest_dimension())
    }

    pub fn layer_preview(&self, channel: Channel) -> Option<&CpuTexture> {
        self.layer_previews[channel.layer_index()].as_ref()
    }

    /// Read the working texture back
    pub fn texture(&mut self) -> Result<CpuTexture, PaintError> {
        self.compositor.read_back()
    }

    pub fn texture_size(&self) -> (u32, u32) {
        (self.compositor.width(), self.compositor.height())
    }

    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    pub fn stroke_state(&self) -> StrokeState {
        self.stroke.state()
    }

    pub fn undo_count(&self) -> usize {
        self.undo.undo_count()
    }

    pub fn original_asset(&self) -> &AssetId {
        &self.original
    }

    pub fn target(&self) -> &T {
        &self.target
    }

    pub fn last_hit(&self) -> Option<&SurfaceHit> {
        self.mapper.last_hit()
    }
}

fn load_layer_previews(
    target: &impl PaintTarget,
    assets: &dyn AssetStore,
    size: u32,
) -> [Option<CpuTexture>; LAYER_COUNT] {
    let Some(material) = target.splat_material() else {
        return Default::default();
    };
    material.layers.map(|layer| {
        let id = layer?;
        match assets.load_preview(&id, size) {
            Ok(preview) => Some(preview),
            Err(e) => {
                warn!("Layer preview {} unavailable: {}", id, e);
                None
            }
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::asset::AssetError;
    use crate::backend::CpuBackend;
    use crate::raycast::SurfaceMesh;
    use crate::target::SceneObject;
    use glam::{Vec2, Vec3};
    use std::collections::HashMap;

    /// In-memory store; writes fail while `fail_saves` is set
    #[derive(Default)]
    struct MemoryStore {
        textures: HashMap<AssetId, CpuTexture>,
        fail_saves: bool,
    }

    impl AssetStore for MemoryStore {
        fn load_texture(&self, id: &AssetId) -> Result<CpuTexture, AssetError> {
            self.textures.get(id).cloned().ok_or_else(|| AssetError::Io {
                path: id.as_str().into(),
                source: std::io::Error::from(std::io::ErrorKind::NotFound),
            })
        }

        fn load_preview(&self, id: &AssetId, size: u32) -> Result<CpuTexture, AssetError> {
            self.load_texture(id).map(|_| CpuTexture::new(size, size))
        }

        fn save_texture(&mut self, id: &AssetId, texture: &CpuTexture) -> Result<(), AssetError> {
            if self.fail_saves {
                return Err(AssetError::Io {
                    path: id.as_str().into(),
                    source: std::io::Error::from(std::io::ErrorKind::PermissionDenied),
                });
            }
            self.textures.insert(id.clone(), texture.clone());
            Ok(())
        }
    }

    fn store_with(id: &str, texture: CpuTexture) -> MemoryStore {
        let mut store = MemoryStore::default();
        store.textures.insert(AssetId::new(id), texture);
        store
    }

    fn quad_object() -> SceneObject {
        SceneObject::new("terrain", SurfaceMesh::quad(1.0), AssetId::new("splat.exr"))
    }

    fn hit(uv: Vec2) -> SurfaceHit {
        SurfaceHit {
            uv,
            world_pos: Vec3::ZERO,
            normal: Vec3::Z,
        }
    }

    #[test]
    fn test_bind_rejects_ineligible_targets() {
        let store = store_with("splat.exr", CpuTexture::new(4, 4));
        let config = PainterConfig::default();

        let mut no_mesh = quad_object();
        no_mesh.mesh = None;
        assert!(matches!(
            Session::bind(&mut no_mesh, CpuBackend::new(), &store, &config),
            Err(PaintError::NotSuitable(BindError::MissingMesh))
        ));

        let mut no_material = quad_object();
        no_material.splat = None;
        assert!(matches!(
            Session::bind(&mut no_material, CpuBackend::new(), &store, &config),
            Err(PaintError::NotSuitable(BindError::MissingSplatMaterial))
        ));

        let mut no_texture = quad_object();
        if let Some(material) = no_texture.splat.as_mut() {
            material.splat_texture = None;
        }
        assert!(matches!(
            Session::bind(&mut no_texture, CpuBackend::new(), &store, &config),
            Err(PaintError::NotSuitable(BindError::MissingSplatTexture))
        ));
        assert!(no_texture.collider.is_none());
    }

    #[test]
    fn test_bind_rejects_empty_texture() {
        let store = store_with("splat.exr", CpuTexture::new(0, 4));
        let mut object = quad_object();
        assert!(matches!(
            Session::bind(&mut object, CpuBackend::new(), &store, &PainterConfig::default()),
            Err(PaintError::NotSuitable(BindError::EmptyTexture { .. }))
        ));
        assert!(object.collider.is_none());
    }

    #[test]
    fn test_bind_and_unbind_restore_target() {
        let store = store_with("splat.exr", CpuTexture::new(8, 8));
        let mut object = quad_object();

        let session =
            Session::bind(&mut object, CpuBackend::new(), &store, &PainterConfig::default()).unwrap();
        assert!(session.target().collider.is_some());
        assert_eq!(session.target().binding, Some(SplatBinding::Working));
        assert!(!session.is_dirty());

        let object = session.unbind();
        assert!(object.collider.is_none());
        assert_eq!(
            object.binding,
            Some(SplatBinding::Original(AssetId::new("splat.exr")))
        );
    }

    #[test]
    fn test_existing_collider_is_kept() {
        let store = store_with("splat.exr", CpuTexture::new(8, 8));
        let mut object = quad_object();
        object.collider = Some(MeshCollider::new(SurfaceMesh::quad(2.0), object.transform));

        let session =
            Session::bind(&mut object, CpuBackend::new(), &store, &PainterConfig::default()).unwrap();
        let object = session.unbind();
        assert!(object.collider.is_some());
    }

    #[test]
    fn test_brush_is_clamped_to_texture() {
        let store = store_with("splat.exr", CpuTexture::new(12, 6));
        let mut object = quad_object();
        let mut config = PainterConfig::default();
        config.brush.size = 50;

        let mut session = Session::bind(&mut object, CpuBackend::new(), &store, &config).unwrap();
        assert_eq!(session.brush().size, 2);
        assert_eq!(session.max_brush_size(), 2);

        session.set_brush(&BrushSettings {
            spacing: 0,
            size: 1,
            hardness: 0.9,
        });
        assert_eq!(session.brush().spacing, 1);
        assert_eq!(session.brush().size, 1);
    }

    #[test]
    fn test_one_tick_stroke_takes_one_snapshot() {
        let store = store_with("splat.exr", CpuTexture::new(16, 16));
        let mut object = quad_object();
        let mut session =
            Session::bind(&mut object, CpuBackend::new(), &store, &PainterConfig::default()).unwrap();

        let target = hit(Vec2::splat(0.5));
        let down = session
            .apply_input(&PointerInput::down(Vec2::ZERO), Some(&target))
            .unwrap();
        let up = session
            .apply_input(&PointerInput::up(Vec2::ZERO), Some(&target))
            .unwrap();

        assert_eq!(down.events, vec![StrokeEvent::StrokeBegun]);
        assert_eq!(up.events, vec![StrokeEvent::StrokeEnded]);
        assert_eq!(session.undo_count(), 1);
        assert!(session.is_dirty());
    }

    /// CPU backend whose allocations fail while `exhausted` is set
    struct ExhaustibleBackend {
        inner: CpuBackend,
        exhausted: std::rc::Rc<std::cell::Cell<bool>>,
    }

    impl CompositeBackend for ExhaustibleBackend {
        type Texture = CpuTexture;

        fn create_texture(&mut self, width: u32, height: u32) -> Result<CpuTexture, PaintError> {
            if self.exhausted.get() {
                return Err(PaintError::SizeMismatch {
                    expected: (width, height),
                    actual: (0, 0),
                });
            }
            self.inner.create_texture(width, height)
        }

        fn texture_size(&self, texture: &CpuTexture) -> (u32, u32) {
            self.inner.texture_size(texture)
        }

        fn upload(&mut self, texture: &mut CpuTexture, data: &CpuTexture) -> Result<(), PaintError> {
            self.inner.upload(texture, data)
        }

        fn read_pixels(&mut self, texture: &CpuTexture) -> Result<CpuTexture, PaintError> {
            self.inner.read_pixels(texture)
        }

        fn copy_texture(&mut self, src: &CpuTexture, dst: &mut CpuTexture) {
            self.inner.copy_texture(src, dst);
        }

        fn apply_brush_kernel(
            &mut self,
            src: &CpuTexture,
            dst: &mut CpuTexture,
            params: &crate::brush::BrushKernelParams,
        ) {
            self.inner.apply_brush_kernel(src, dst, params);
        }
    }

    #[test]
    fn test_failed_snapshot_drops_the_stroke() {
        let source = CpuTexture::new(16, 16);
        let store = store_with("splat.exr", source.clone());
        let mut object = quad_object();
        let exhausted = std::rc::Rc::new(std::cell::Cell::new(false));
        let backend = ExhaustibleBackend {
            inner: CpuBackend::new(),
            exhausted: exhausted.clone(),
        };
        let mut session =
            Session::bind(&mut object, backend, &store, &PainterConfig::default()).unwrap();

        exhausted.set(true);
        let target = hit(Vec2::splat(0.5));
        assert!(session
            .apply_input(&PointerInput::down(Vec2::ZERO), Some(&target))
            .is_err());
        assert_eq!(session.stroke_state(), StrokeState::Idle);
        assert!(session.brush().last_paint_uv.is_none());
        assert_eq!(session.undo_count(), 0);
        assert!(!session.is_dirty());

        // Moves after the failed press do not paint
        session
            .apply_input(&PointerInput::moved(Vec2::ZERO), Some(&hit(Vec2::splat(0.6))))
            .unwrap();
        assert_eq!(session.texture().unwrap(), source);

        // The next press starts a fresh stroke
        exhausted.set(false);
        let down = session
            .apply_input(&PointerInput::down(Vec2::ZERO), Some(&target))
            .unwrap();
        assert_eq!(down.events, vec![StrokeEvent::StrokeBegun]);
        assert_eq!(session.undo_count(), 1);
    }

    #[test]
    fn test_stroke_then_undo_restores_texture() {
        let mut source = CpuTexture::new(16, 16);
        source.clear([0.0, 0.0, 0.5, 0.5]);
        let store = store_with("splat.exr", source.clone());
        let mut object = quad_object();
        let mut config = PainterConfig::default();
        config.active_channel = splat_painter_config::ChannelSetting::G;

        let mut session = Session::bind(&mut object, CpuBackend::new(), &store, &config).unwrap();
        session
            .apply_input(&PointerInput::down(Vec2::ZERO), Some(&hit(Vec2::splat(0.3))))
            .unwrap();
        session
            .apply_input(&PointerInput::moved(Vec2::ZERO), Some(&hit(Vec2::splat(0.7))))
            .unwrap();
        session
            .apply_input(&PointerInput::up(Vec2::ZERO), None)
            .unwrap();
        assert_ne!(session.texture().unwrap(), source);

        assert!(session.undo());
        assert_eq!(session.texture().unwrap(), source);
        assert!(!session.undo());
    }

    #[test]
    fn test_camera_tick_paints_under_cursor() {
        let store = store_with("splat.exr", CpuTexture::new(32, 32));
        let mut object = quad_object();
        let mut config = PainterConfig::default();
        config.brush.hardness = 1.0;

        let mut session = Session::bind(&mut object, CpuBackend::new(), &store, &config).unwrap();
        let camera = Camera::look_at(
            Vec3::new(0.0, 0.0, 3.0),
            Vec3::ZERO,
            std::f32::consts::FRAC_PI_2,
            Vec2::new(100.0, 100.0),
        );

        let outcome = session
            .tick(&camera, &PointerInput::down(Vec2::new(50.0, 50.0)))
            .unwrap();
        assert!(outcome.dab.is_some());
        assert!(session.last_hit().is_some());

        let texture = session.texture().unwrap();
        assert_eq!(texture.get_pixel(16, 16), Some([1.0, 0.0, 0.0, 0.0]));
        assert_eq!(texture.get_pixel(0, 0), Some([0.0; 4]));
    }

    #[test]
    fn test_fill_all_is_undoable() {
        let store = store_with("splat.exr", CpuTexture::new(4, 4));
        let mut object = quad_object();
        let mut session =
            Session::bind(&mut object, CpuBackend::new(), &store, &PainterConfig::default()).unwrap();

        session.set_channel(Channel::G);
        session.fill_all().unwrap();
        let texture = session.texture().unwrap();
        assert!(texture.pixels().iter().all(|p| *p == [0.0, 1.0, 0.0, 0.0]));

        assert!(session.undo());
        assert_eq!(session.texture().unwrap(), CpuTexture::new(4, 4));
    }

    #[test]
    fn test_failed_save_keeps_session_state() {
        let mut store = store_with("splat.exr", CpuTexture::new(4, 4));
        let mut object = quad_object();
        let mut session =
            Session::bind(&mut object, CpuBackend::new(), &store, &PainterConfig::default()).unwrap();
        session.fill_all().unwrap();
        let painted = session.texture().unwrap();

        store.fail_saves = true;
        assert!(matches!(session.save(&mut store), Err(PaintError::Asset(_))));
        assert!(session.is_dirty());
        assert_eq!(session.texture().unwrap(), painted);

        store.fail_saves = false;
        session.save(&mut store).unwrap();
        assert!(!session.is_dirty());
        assert_eq!(store.textures[&AssetId::new("splat.exr")], painted);
    }

    #[test]
    fn test_layer_previews() {
        let mut store = store_with("splat.exr", CpuTexture::new(4, 4));
        store
            .textures
            .insert(AssetId::new("grass.exr"), CpuTexture::new(2, 2));
        let mut object = quad_object();
        if let Some(material) = object.splat.as_mut() {
            material.layers[0] = Some(AssetId::new("grass.exr"));
            material.layers[1] = Some(AssetId::new("missing.exr"));
        }

        let session =
            Session::bind(&mut object, CpuBackend::new(), &store, &PainterConfig::default()).unwrap();
        let preview = session.layer_preview(Channel::R).unwrap();
        assert_eq!((preview.width, preview.height), (256, 256));
        assert!(session.layer_preview(Channel::G).is_none());
        assert!(session.layer_preview(Channel::None).is_none());
    }
}
