//! CPU texture storage - 32-bit float RGBA weights

use glam::Vec2;

/// A 2D grid of four-component float texels
///
/// Rows are stored top-first, so row `y` covers `v = 1 - (y + 0.5) / height`.
#[derive(Debug, Clone, PartialEq)]
pub struct CpuTexture {
    /// Texture dimensions
    pub width: u32,
    pub height: u32,
    /// Texel data in row-major order, each texel is [r, g, b, a] as f32
    pixels: Vec<[f32; 4]>,
}

impl CpuTexture {
    /// Create a new texture with the given dimensions, initialized to zero weights
    pub fn new(width: u32, height: u32) -> Self {
        let pixel_count = (width as usize) * (height as usize);
        Self {
            width,
            height,
            pixels: vec![[0.0, 0.0, 0.0, 0.0]; pixel_count],
        }
    }

    /// Wrap existing texel data
    ///
    /// Returns None if the data length does not match the dimensions.
    pub fn from_pixels(width: u32, height: u32, pixels: Vec<[f32; 4]>) -> Option<Self> {
        if pixels.len() != (width as usize) * (height as usize) {
            return None;
        }
        Some(Self {
            width,
            height,
            pixels,
        })
    }

    /// Fill every texel with one value
    pub fn clear(&mut self, value: [f32; 4]) {
        self.pixels.fill(value);
    }

    /// Larger of width and height; brush sizes are measured against it
    #[inline]
    pub fn largest_dimension(&self) -> u32 {
        self.width.max(self.height)
    }

    /// Get a texel at the given coordinates
    /// Returns None if coordinates are out of bounds
    #[inline]
    pub fn get_pixel(&self, x: u32, y: u32) -> Option<[f32; 4]> {
        if x >= self.width || y >= self.height {
            return None;
        }
        let index = (y as usize) * (self.width as usize) + (x as usize);
        Some(self.pixels[index])
    }

    /// Set a texel at the given coordinates
    /// Does nothing if coordinates are out of bounds
    #[inline]
    pub fn set_pixel(&mut self, x: u32, y: u32, value: [f32; 4]) {
        if x >= self.width || y >= self.height {
            return;
        }
        let index = (y as usize) * (self.width as usize) + (x as usize);
        self.pixels[index] = value;
    }

    /// UV coordinate of a texel centre
    #[inline]
    pub fn texel_uv(&self, x: u32, y: u32) -> Vec2 {
        Vec2::new(
            (x as f32 + 0.5) / self.width as f32,
            1.0 - (y as f32 + 0.5) / self.height as f32,
        )
    }

    /// Overwrite this texture with another of the same size
    ///
    /// Returns false (and copies nothing) on a size mismatch.
    pub fn copy_from(&mut self, other: &CpuTexture) -> bool {
        if self.width != other.width || self.height != other.height {
            return false;
        }
        self.pixels.copy_from_slice(&other.pixels);
        true
    }

    /// Get raw texel data for GPU upload or encoding
    pub fn as_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(&self.pixels)
    }

    /// Get the total number of texels
    #[inline]
    pub fn pixel_count(&self) -> usize {
        self.pixels.len()
    }

    #[inline]
    pub fn pixels(&self) -> &[[f32; 4]] {
        &self.pixels
    }

    #[inline]
    pub fn pixels_mut(&mut self) -> &mut [[f32; 4]] {
        &mut self.pixels
    }

    /// Consume the texture and return its texels
    pub fn into_pixels(self) -> Vec<[f32; 4]> {
        self.pixels
    }
}
