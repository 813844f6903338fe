//! Paint compositor: double-buffered dab compositing
//!
//! Every dab is two backend passes. The live splat texture is first
//! copied into the scratch buffer, then the brush kernel renders from the
//! scratch buffer back into the live texture. The kernel never reads the
//! texture it writes.

use glam::Vec2;
use tracing::debug;

use crate::backend::CompositeBackend;
use crate::brush::BrushKernelParams;
use crate::channel::Channel;
use crate::constants::FILL_ALL_RADIUS;
use crate::error::PaintError;
use crate::surface::CpuTexture;

/// Owns the live splat texture, its scratch buffer and the backend
pub struct PaintCompositor<B: CompositeBackend> {
    backend: B,
    live: B::Texture,
    scratch: B::Texture,
    width: u32,
    height: u32,
}

impl<B: CompositeBackend> PaintCompositor<B> {
    /// Upload a working copy of `source` and allocate the scratch buffer
    pub fn new(mut backend: B, source: &CpuTexture) -> Result<Self, PaintError> {
        let live = backend.create_texture_from(source)?;
        let scratch = backend.create_texture(source.width, source.height)?;
        debug!(
            "PaintCompositor: allocated {}x{} live + scratch",
            source.width, source.height
        );
        Ok(Self {
            backend,
            live,
            scratch,
            width: source.width,
            height: source.height,
        })
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    #[inline]
    pub fn largest_dimension(&self) -> u32 {
        self.width.max(self.height)
    }

    /// Composite one dab
    ///
    /// `radius` is in texels. Non-positive radii are ignored.
    pub fn apply_dab(&mut self, uv: Vec2, radius: f32, channel: Channel, hardness: f32) {
        if radius.is_nan() || radius <= 0.0 {
            debug!("apply_dab: ignoring non-positive radius {}", radius);
            return;
        }
        let params =
            BrushKernelParams::new(uv, radius, hardness, channel, self.width, self.height);
        debug!(
            "apply_dab: uv=({:.4}, {:.4}), radius={:.1}, uv_radius={:.5}, hardness={:.2}, channel={:?}",
            uv.x, uv.y, radius, params.uv_radius, params.hardness, channel
        );

        self.backend.copy_texture(&self.live, &mut self.scratch);
        self.backend
            .apply_brush_kernel(&self.scratch, &mut self.live, &params);
    }

    /// One dab large enough to cover the whole texture
    pub fn fill_all(&mut self, channel: Channel, hardness: f32) {
        self.apply_dab(Vec2::splat(0.5), FILL_ALL_RADIUS, channel, hardness);
    }

    /// Allocate a copy of the live texture
    pub fn snapshot(&mut self) -> Result<B::Texture, PaintError> {
        self.backend.duplicate(&self.live)
    }

    /// Overwrite the live texture with a snapshot
    pub fn restore(&mut self, snapshot: &B::Texture) {
        self.backend.copy_texture(snapshot, &mut self.live);
    }

    /// Read the live texture back to the CPU
    pub fn read_back(&mut self) -> Result<CpuTexture, PaintError> {
        self.backend.read_pixels(&self.live)
    }

    /// Replace the live texture's contents
    pub fn upload(&mut self, data: &CpuTexture) -> Result<(), PaintError> {
        self.backend.upload(&mut self.live, data)
    }

    pub fn live(&self) -> &B::Texture {
        &self.live
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    /// Release the textures and hand the backend back
    pub fn into_backend(self) -> B {
        self.backend
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::CpuBackend;

    fn compositor(width: u32, height: u32) -> PaintCompositor<CpuBackend> {
        PaintCompositor::new(CpuBackend::new(), &CpuTexture::new(width, height)).unwrap()
    }

    #[test]
    fn test_hard_dab_inside_and_outside() {
        let mut source = CpuTexture::new(32, 32);
        source.clear([0.2, 0.3, 0.1, 0.4]);
        let mut compositor = PaintCompositor::new(CpuBackend::new(), &source).unwrap();

        let center = Vec2::splat(0.5);
        let radius = 6.0;
        compositor.apply_dab(center, radius, Channel::B, 1.0);
        let result = compositor.read_back().unwrap();

        let uv_radius = radius / 32.0;
        for y in 0..32 {
            for x in 0..32 {
                let distance = (result.texel_uv(x, y) - center).length();
                let texel = result.get_pixel(x, y).unwrap();
                if distance < uv_radius * 0.999 {
                    assert_eq!(texel, [0.0, 0.0, 1.0, 0.0], "inside at ({x}, {y})");
                } else if distance > uv_radius * 1.001 {
                    assert_eq!(texel, [0.2, 0.3, 0.1, 0.4], "outside at ({x}, {y})");
                }
            }
        }
    }

    #[test]
    fn test_fill_all_green() {
        let mut compositor = compositor(4, 4);
        compositor.fill_all(Channel::G, 0.5);
        let result = compositor.read_back().unwrap();
        assert!(result.pixels().iter().all(|p| *p == [0.0, 1.0, 0.0, 0.0]));
    }

    #[test]
    fn test_none_channel_is_idempotent() {
        let mut source = CpuTexture::new(16, 8);
        for (i, texel) in source.pixels_mut().iter_mut().enumerate() {
            let f = i as f32 / 128.0;
            *texel = [f, 1.0 - f, f * 0.5, 0.25];
        }
        let mut compositor = PaintCompositor::new(CpuBackend::new(), &source).unwrap();

        for (radius, hardness) in [(1.0, 0.0), (4.0, 0.5), (100.0, 1.0)] {
            compositor.apply_dab(Vec2::new(0.3, 0.6), radius, Channel::None, hardness);
        }
        compositor.fill_all(Channel::None, 0.2);
        assert_eq!(compositor.read_back().unwrap(), source);
    }

    #[test]
    fn test_soft_dab_blends_partially() {
        let mut compositor = compositor(64, 64);
        compositor.apply_dab(Vec2::splat(0.5), 10.0, Channel::R, 0.0);
        let result = compositor.read_back().unwrap();

        let centre = result.get_pixel(32, 32).unwrap();
        let edge = result.get_pixel(32 + 7, 32).unwrap();
        assert!(centre[0] > 0.9);
        assert!(edge[0] > 0.0 && edge[0] < centre[0]);
        assert_eq!(edge[1], 0.0);
    }

    #[test]
    fn test_non_positive_radius_is_ignored() {
        let mut compositor = compositor(8, 8);
        compositor.apply_dab(Vec2::splat(0.5), 0.0, Channel::R, 1.0);
        compositor.apply_dab(Vec2::splat(0.5), -3.0, Channel::R, 1.0);
        assert!(compositor.read_back().unwrap().pixels().iter().all(|p| *p == [0.0; 4]));
    }

    #[test]
    fn test_snapshot_restore() {
        let mut compositor = compositor(8, 8);
        let before = compositor.snapshot().unwrap();
        compositor.fill_all(Channel::A, 1.0);
        compositor.restore(&before);
        assert_eq!(compositor.read_back().unwrap(), CpuTexture::new(8, 8));
    }
}
