//! Reference CPU backend

use tracing::{debug, warn};

use super::CompositeBackend;
use crate::brush::BrushKernelParams;
use crate::error::PaintError;
use crate::surface::CpuTexture;

/// Compositing backend that evaluates the brush kernel on the CPU
#[derive(Debug, Default)]
pub struct CpuBackend;

impl CpuBackend {
    pub fn new() -> Self {
        Self
    }
}

impl CompositeBackend for CpuBackend {
    type Texture = CpuTexture;

    fn create_texture(&mut self, width: u32, height: u32) -> Result<CpuTexture, PaintError> {
        Ok(CpuTexture::new(width, height))
    }

    fn texture_size(&self, texture: &CpuTexture) -> (u32, u32) {
        (texture.width, texture.height)
    }

    fn upload(&mut self, texture: &mut CpuTexture, data: &CpuTexture) -> Result<(), PaintError> {
        if texture.copy_from(data) {
            Ok(())
        } else {
            Err(PaintError::SizeMismatch {
                expected: (texture.width, texture.height),
                actual: (data.width, data.height),
            })
        }
    }

    fn read_pixels(&mut self, texture: &CpuTexture) -> Result<CpuTexture, PaintError> {
        Ok(texture.clone())
    }

    fn copy_texture(&mut self, src: &CpuTexture, dst: &mut CpuTexture) {
        if !dst.copy_from(src) {
            warn!(
                "CpuBackend::copy_texture: size mismatch {}x{} -> {}x{}, skipped",
                src.width, src.height, dst.width, dst.height
            );
        }
    }

    fn apply_brush_kernel(
        &mut self,
        src: &CpuTexture,
        dst: &mut CpuTexture,
        params: &BrushKernelParams,
    ) {
        if (src.width, src.height) != (dst.width, dst.height) {
            warn!(
                "CpuBackend::apply_brush_kernel: size mismatch {}x{} -> {}x{}, skipped",
                src.width, src.height, dst.width, dst.height
            );
            return;
        }

        // Uncovered texels pass through
        self.copy_texture(src, dst);

        let Some((x_min, y_min, x_max, y_max)) = kernel_bounds(src, params) else {
            debug!("CpuBackend::apply_brush_kernel: dab outside texture bounds");
            return;
        };

        for py in y_min..y_max {
            for px in x_min..x_max {
                let Some(existing) = src.get_pixel(px, py) else {
                    continue;
                };
                let value = params.apply(existing, src.texel_uv(px, py));
                dst.set_pixel(px, py, value);
            }
        }
    }
}

/// Texel rectangle (x_min, y_min, x_max, y_max) a dab can touch
fn kernel_bounds(texture: &CpuTexture, params: &BrushKernelParams) -> Option<(u32, u32, u32, u32)> {
    if params.uv_radius <= 0.0 || texture.width == 0 || texture.height == 0 {
        return None;
    }

    let radius = params.uv_radius * texture.largest_dimension() as f32;
    let center_x = params.cursor_uv[0] * texture.width as f32;
    let center_y = (1.0 - params.cursor_uv[1]) * texture.height as f32;

    let x_min = ((center_x - radius).floor().max(0.0) as u32).min(texture.width);
    let y_min = ((center_y - radius).floor().max(0.0) as u32).min(texture.height);
    let x_max = ((center_x + radius).ceil().max(0.0) as u32).min(texture.width);
    let y_max = ((center_y + radius).ceil().max(0.0) as u32).min(texture.height);

    if x_min >= x_max || y_min >= y_max {
        return None;
    }
    Some((x_min, y_min, x_max, y_max))
}
