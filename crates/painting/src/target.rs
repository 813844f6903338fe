//! Paint targets: the host objects a session binds to

use glam::Affine3A;
use tracing::debug;

use crate::asset::AssetId;
use crate::constants::LAYER_COUNT;
use crate::mapper::CollisionProxy;
use crate::raycast::{MeshCollider, SurfaceMesh};

/// Material slot carrying a splat map and its layer textures
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SplatMaterial {
    /// Index of the material slot on the target's renderer
    pub slot: usize,
    /// Splat map texture (None when the property is unassigned)
    pub splat_texture: Option<AssetId>,
    /// Layer textures in channel order R, G, B, A, None
    pub layers: [Option<AssetId>; LAYER_COUNT],
}

/// Which texture the splat material samples
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SplatBinding {
    /// The session's live working texture
    Working,
    /// The persisted asset
    Original(AssetId),
}

/// Host object that can be painted
pub trait PaintTarget {
    /// Display name for logs
    fn name(&self) -> &str;

    fn mesh(&self) -> Option<&SurfaceMesh>;

    /// Object-to-world transform
    fn transform(&self) -> Affine3A;

    fn material_slot_count(&self) -> usize;

    /// First material slot that has a splat map property
    fn splat_material(&self) -> Option<SplatMaterial>;

    fn collider(&self) -> Option<&dyn CollisionProxy>;

    fn attach_collider(&mut self, collider: MeshCollider);

    fn detach_collider(&mut self);

    /// Point the splat material at a texture
    fn bind_splat_texture(&mut self, slot: usize, binding: SplatBinding);
}

impl<P: PaintTarget + ?Sized> PaintTarget for &mut P {
    fn name(&self) -> &str {
        (**self).name()
    }

    fn mesh(&self) -> Option<&SurfaceMesh> {
        (**self).mesh()
    }

    fn transform(&self) -> Affine3A {
        (**self).transform()
    }

    fn material_slot_count(&self) -> usize {
        (**self).material_slot_count()
    }

    fn splat_material(&self) -> Option<SplatMaterial> {
        (**self).splat_material()
    }

    fn collider(&self) -> Option<&dyn CollisionProxy> {
        (**self).collider()
    }

    fn attach_collider(&mut self, collider: MeshCollider) {
        (**self).attach_collider(collider)
    }

    fn detach_collider(&mut self) {
        (**self).detach_collider()
    }

    fn bind_splat_texture(&mut self, slot: usize, binding: SplatBinding) {
        (**self).bind_splat_texture(slot, binding)
    }
}

/// Plain scene object used by headless hosts
#[derive(Debug, Clone)]
pub struct SceneObject {
    pub name: String,
    pub mesh: Option<SurfaceMesh>,
    pub transform: Affine3A,
    pub material_slots: usize,
    pub splat: Option<SplatMaterial>,
    pub collider: Option<MeshCollider>,
    /// Texture the splat material currently samples
    pub binding: Option<SplatBinding>,
}

impl SceneObject {
    /// Object with a mesh, one material slot and a splat material
    pub fn new(name: impl Into<String>, mesh: SurfaceMesh, splat_texture: AssetId) -> Self {
        Self {
            name: name.into(),
            mesh: Some(mesh),
            transform: Affine3A::IDENTITY,
            material_slots: 1,
            binding: Some(SplatBinding::Original(splat_texture.clone())),
            splat: Some(SplatMaterial {
                slot: 0,
                splat_texture: Some(splat_texture),
                layers: Default::default(),
            }),
            collider: None,
        }
    }
}

impl PaintTarget for SceneObject {
    fn name(&self) -> &str {
        &self.name
    }

    fn mesh(&self) -> Option<&SurfaceMesh> {
        self.mesh.as_ref()
    }

    fn transform(&self) -> Affine3A {
        self.transform
    }

    fn material_slot_count(&self) -> usize {
        self.material_slots
    }

    fn splat_material(&self) -> Option<SplatMaterial> {
        self.splat.clone()
    }

    fn collider(&self) -> Option<&dyn CollisionProxy> {
        self.collider
            .as_ref()
            .map(|collider| collider as &dyn CollisionProxy)
    }

    fn attach_collider(&mut self, collider: MeshCollider) {
        self.collider = Some(collider);
    }

    fn detach_collider(&mut self) {
        self.collider = None;
    }

    fn bind_splat_texture(&mut self, slot: usize, binding: SplatBinding) {
        debug!("{}: slot {} now samples {:?}", self.name, slot, binding);
        self.binding = Some(binding);
    }
}
