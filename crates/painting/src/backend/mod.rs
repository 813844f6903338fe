//! Compositing backends
//!
//! A backend owns texture storage and executes the two operations the
//! compositor is built from: a texture-to-texture copy and a brush-kernel
//! pass from one texture into another. Both take the source by shared
//! reference and the destination by exclusive reference, so a texture can
//! never be read by the kernel while it is being written.

mod cpu;

pub use cpu::CpuBackend;

use crate::brush::BrushKernelParams;
use crate::error::PaintError;
use crate::surface::CpuTexture;

/// Texture storage and compositing operations
pub trait CompositeBackend {
    /// Backend texture handle (RGBA, 32-bit float per channel)
    type Texture;

    /// Allocate a zero-initialized texture
    fn create_texture(&mut self, width: u32, height: u32) -> Result<Self::Texture, PaintError>;

    /// Texture dimensions as (width, height)
    fn texture_size(&self, texture: &Self::Texture) -> (u32, u32);

    /// Replace a texture's contents with CPU texels of the same size
    fn upload(&mut self, texture: &mut Self::Texture, data: &CpuTexture) -> Result<(), PaintError>;

    /// Read a texture back to the CPU
    fn read_pixels(&mut self, texture: &Self::Texture) -> Result<CpuTexture, PaintError>;

    /// Copy `src` into `dst` (same size)
    fn copy_texture(&mut self, src: &Self::Texture, dst: &mut Self::Texture);

    /// Render `src` into `dst` through the brush kernel
    ///
    /// Texels the kernel does not cover are copied through unchanged.
    fn apply_brush_kernel(
        &mut self,
        src: &Self::Texture,
        dst: &mut Self::Texture,
        params: &BrushKernelParams,
    );

    /// Allocate a texture holding a copy of `src`
    fn duplicate(&mut self, src: &Self::Texture) -> Result<Self::Texture, PaintError> {
        let (width, height) = self.texture_size(src);
        let mut copy = self.create_texture(width, height)?;
        self.copy_texture(src, &mut copy);
        Ok(copy)
    }

    /// Allocate a texture initialized from CPU texels
    fn create_texture_from(&mut self, data: &CpuTexture) -> Result<Self::Texture, PaintError> {
        let mut texture = self.create_texture(data.width, data.height)?;
        self.upload(&mut texture, data)?;
        Ok(texture)
    }
}
