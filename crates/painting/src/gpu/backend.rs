use std::sync::mpsc;

use tracing::{error, info, warn};

use super::GpuError;
use crate::backend::CompositeBackend;
use crate::brush::BrushKernelParams;
use crate::constants::TEXEL_SIZE;
use crate::error::PaintError;
use crate::surface::CpuTexture;

const SPLAT_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Rgba32Float;

/// Matches `@workgroup_size` in brush_kernel.wgsl
const KERNEL_WORKGROUP_SIZE: u32 = 16;

/// A splat texture resident on the GPU
pub struct GpuTexture {
    texture: wgpu::Texture,
    view: wgpu::TextureView,
    width: u32,
    height: u32,
}

impl GpuTexture {
    fn extent(&self) -> wgpu::Extent3d {
        wgpu::Extent3d {
            width: self.width,
            height: self.height,
            depth_or_array_layers: 1,
        }
    }

    fn copy_info(&self) -> wgpu::TexelCopyTextureInfo<'_> {
        wgpu::TexelCopyTextureInfo {
            texture: &self.texture,
            mip_level: 0,
            origin: wgpu::Origin3d::ZERO,
            aspect: wgpu::TextureAspect::All,
        }
    }
}

/// Compositing backend on a wgpu device
pub struct WgpuBackend {
    device: wgpu::Device,
    queue: wgpu::Queue,
    pipeline: wgpu::ComputePipeline,
    bind_group_layout: wgpu::BindGroupLayout,
    params_buffer: wgpu::Buffer,
}

impl WgpuBackend {
    /// Create a headless backend on the default adapter
    ///
    /// Fails with [`GpuError::UnsupportedAdapter`] when the adapter cannot
    /// run compute shaders or write Rgba32Float storage textures.
    pub fn new() -> Result<Self, GpuError> {
        let instance = wgpu::Instance::new(&wgpu::InstanceDescriptor {
            backends: wgpu::Backends::all(),
            ..Default::default()
        });

        let adapter = pollster::block_on(instance.request_adapter(&wgpu::RequestAdapterOptions {
            power_preference: wgpu::PowerPreference::HighPerformance,
            compatible_surface: None,
            force_fallback_adapter: false,
        }))?;
        check_adapter(&adapter)?;

        let (device, queue) = pollster::block_on(adapter.request_device(&wgpu::DeviceDescriptor {
            label: Some("Splat Painter Device"),
            required_features: wgpu::Features::empty(),
            required_limits: wgpu::Limits::downlevel_defaults().using_resolution(adapter.limits()),
            ..Default::default()
        }))?;

        info!("GPU backend on {}", adapter.get_info().name);
        Self::with_device(device, queue)
    }

    /// Create a backend on a device owned by the host renderer
    ///
    /// Validation errors raised while building the kernel are returned
    /// instead of reaching the device's uncaptured-error handler.
    pub fn with_device(device: wgpu::Device, queue: wgpu::Queue) -> Result<Self, GpuError> {
        device.push_error_scope(wgpu::ErrorFilter::Validation);

        let shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("Brush Kernel Shader"),
            source: wgpu::ShaderSource::Wgsl(include_str!("brush_kernel.wgsl").into()),
        });

        let bind_group_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("Brush Kernel Bind Group Layout"),
            entries: &[
                wgpu::BindGroupLayoutEntry {
                    binding: 0,
                    visibility: wgpu::ShaderStages::COMPUTE,
                    ty: wgpu::BindingType::Buffer {
                        ty: wgpu::BufferBindingType::Uniform,
                        has_dynamic_offset: false,
                        min_binding_size: None,
                    },
                    count: None,
                },
                wgpu::BindGroupLayoutEntry {
                    binding: 1,
                    visibility: wgpu::ShaderStages::COMPUTE,
                    ty: wgpu::BindingType::Texture {
                        sample_type: wgpu::TextureSampleType::Float { filterable: false },
                        view_dimension: wgpu::TextureViewDimension::D2,
                        multisampled: false,
                    },
                    count: None,
                },
                wgpu::BindGroupLayoutEntry {
                    binding: 2,
                    visibility: wgpu::ShaderStages::COMPUTE,
                    ty: wgpu::BindingType::StorageTexture {
                        access: wgpu::StorageTextureAccess::WriteOnly,
                        format: SPLAT_FORMAT,
                        view_dimension: wgpu::TextureViewDimension::D2,
                    },
                    count: None,
                },
            ],
        });

        let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("Brush Kernel Pipeline Layout"),
            bind_group_layouts: &[&bind_group_layout],
            push_constant_ranges: &[],
        });

        let pipeline = device.create_compute_pipeline(&wgpu::ComputePipelineDescriptor {
            label: Some("Brush Kernel Pipeline"),
            layout: Some(&pipeline_layout),
            module: &shader,
            entry_point: Some("cs_main"),
            compilation_options: Default::default(),
            cache: None,
        });

        let params_buffer = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("Brush Kernel Params"),
            size: std::mem::size_of::<BrushKernelParams>() as u64,
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });

        if let Some(err) = pollster::block_on(device.pop_error_scope()) {
            error!("Brush kernel setup failed: {}", err);
            return Err(GpuError::Validation(err.to_string()));
        }

        Ok(Self {
            device,
            queue,
            pipeline,
            bind_group_layout,
            params_buffer,
        })
    }

    pub fn device(&self) -> &wgpu::Device {
        &self.device
    }

    pub fn queue(&self) -> &wgpu::Queue {
        &self.queue
    }

    /// Block until a mapped readback completes
    fn wait_for_map(&self, receiver: &mpsc::Receiver<Result<(), wgpu::BufferAsyncError>>) -> Result<(), GpuError> {
        loop {
            self.device.poll(wgpu::PollType::Poll)?;
            match receiver.try_recv() {
                Ok(result) => return Ok(result?),
                Err(mpsc::TryRecvError::Empty) => std::thread::yield_now(),
                Err(mpsc::TryRecvError::Disconnected) => return Err(GpuError::ReadbackLost),
            }
        }
    }
}

/// Whether the adapter can run the brush kernel
fn check_adapter(adapter: &wgpu::Adapter) -> Result<(), GpuError> {
    let name = adapter.get_info().name;
    if !adapter
        .get_downlevel_capabilities()
        .flags
        .contains(wgpu::DownlevelFlags::COMPUTE_SHADERS)
    {
        return Err(GpuError::UnsupportedAdapter {
            adapter: name,
            reason: "compute shaders unavailable".to_string(),
        });
    }

    let features = adapter.get_texture_format_features(SPLAT_FORMAT);
    let required = wgpu::TextureUsages::STORAGE_BINDING | wgpu::TextureUsages::TEXTURE_BINDING;
    if !features.allowed_usages.contains(required) {
        return Err(GpuError::UnsupportedAdapter {
            adapter: name,
            reason: format!(
                "{:?} usages {:?} lack storage binding",
                SPLAT_FORMAT, features.allowed_usages
            ),
        });
    }
    Ok(())
}

impl CompositeBackend for WgpuBackend {
    type Texture = GpuTexture;

    fn create_texture(&mut self, width: u32, height: u32) -> Result<GpuTexture, PaintError> {
        let max = self.device.limits().max_texture_dimension_2d;
        if width == 0 || height == 0 || width > max || height > max {
            return Err(GpuError::TextureSize { width, height, max }.into());
        }

        let texture = self.device.create_texture(&wgpu::TextureDescriptor {
            label: Some("Splat Texture"),
            size: wgpu::Extent3d {
                width,
                height,
                depth_or_array_layers: 1,
            },
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: SPLAT_FORMAT,
            usage: wgpu::TextureUsages::TEXTURE_BINDING
                | wgpu::TextureUsages::STORAGE_BINDING
                | wgpu::TextureUsages::COPY_SRC
                | wgpu::TextureUsages::COPY_DST,
            view_formats: &[],
        });
        let view = texture.create_view(&wgpu::TextureViewDescriptor::default());

        Ok(GpuTexture {
            texture,
            view,
            width,
            height,
        })
    }

    fn texture_size(&self, texture: &GpuTexture) -> (u32, u32) {
        (texture.width, texture.height)
    }

    fn upload(&mut self, texture: &mut GpuTexture, data: &CpuTexture) -> Result<(), PaintError> {
        if (texture.width, texture.height) != (data.width, data.height) {
            return Err(PaintError::SizeMismatch {
                expected: (texture.width, texture.height),
                actual: (data.width, data.height),
            });
        }

        self.queue.write_texture(
            texture.copy_info(),
            data.as_bytes(),
            wgpu::TexelCopyBufferLayout {
                offset: 0,
                bytes_per_row: Some(TEXEL_SIZE as u32 * data.width),
                rows_per_image: Some(data.height),
            },
            texture.extent(),
        );
        Ok(())
    }

    fn read_pixels(&mut self, texture: &GpuTexture) -> Result<CpuTexture, PaintError> {
        let unpadded_row = TEXEL_SIZE as u32 * texture.width;
        let align = wgpu::COPY_BYTES_PER_ROW_ALIGNMENT;
        let padded_row = unpadded_row.div_ceil(align) * align;

        let staging = self.device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("Splat Readback"),
            size: padded_row as u64 * texture.height as u64,
            usage: wgpu::BufferUsages::MAP_READ | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });

        let mut encoder = self
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("Splat Readback Encoder"),
            });
        encoder.copy_texture_to_buffer(
            texture.copy_info(),
            wgpu::TexelCopyBufferInfo {
                buffer: &staging,
                layout: wgpu::TexelCopyBufferLayout {
                    offset: 0,
                    bytes_per_row: Some(padded_row),
                    rows_per_image: Some(texture.height),
                },
            },
            texture.extent(),
        );
        self.queue.submit(Some(encoder.finish()));

        let slice = staging.slice(..);
        let (sender, receiver) = mpsc::channel();
        slice.map_async(wgpu::MapMode::Read, move |result| {
            let _ = sender.send(result);
        });
        self.wait_for_map(&receiver)?;

        let mut pixels = Vec::with_capacity(texture.width as usize * texture.height as usize);
        {
            let mapped = slice.get_mapped_range();
            for row in mapped.chunks(padded_row as usize) {
                let texels: &[[f32; 4]] = bytemuck::cast_slice(&row[..unpadded_row as usize]);
                pixels.extend_from_slice(texels);
            }
        }
        staging.unmap();

        CpuTexture::from_pixels(texture.width, texture.height, pixels).ok_or(
            PaintError::SizeMismatch {
                expected: (texture.width, texture.height),
                actual: (texture.width, 0),
            },
        )
    }

    fn copy_texture(&mut self, src: &GpuTexture, dst: &mut GpuTexture) {
        if (src.width, src.height) != (dst.width, dst.height) {
            warn!(
                "WgpuBackend::copy_texture: size mismatch {}x{} -> {}x{}, skipped",
                src.width, src.height, dst.width, dst.height
            );
            return;
        }

        let mut encoder = self
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("Splat Copy Encoder"),
            });
        encoder.copy_texture_to_texture(src.copy_info(), dst.copy_info(), src.extent());
        self.queue.submit(Some(encoder.finish()));
    }

    fn apply_brush_kernel(
        &mut self,
        src: &GpuTexture,
        dst: &mut GpuTexture,
        params: &BrushKernelParams,
    ) {
        if (src.width, src.height) != (dst.width, dst.height) {
            warn!(
                "WgpuBackend::apply_brush_kernel: size mismatch {}x{} -> {}x{}, skipped",
                src.width, src.height, dst.width, dst.height
            );
            return;
        }

        self.queue
            .write_buffer(&self.params_buffer, 0, bytemuck::bytes_of(params));

        let bind_group = self.device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("Brush Kernel Bind Group"),
            layout: &self.bind_group_layout,
            entries: &[
                wgpu::BindGroupEntry {
                    binding: 0,
                    resource: self.params_buffer.as_entire_binding(),
                },
                wgpu::BindGroupEntry {
                    binding: 1,
                    resource: wgpu::BindingResource::TextureView(&src.view),
                },
                wgpu::BindGroupEntry {
                    binding: 2,
                    resource: wgpu::BindingResource::TextureView(&dst.view),
                },
            ],
        });

        let mut encoder = self
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("Brush Kernel Encoder"),
            });
        {
            let mut pass = encoder.begin_compute_pass(&wgpu::ComputePassDescriptor {
                label: Some("Brush Kernel Pass"),
                timestamp_writes: None,
            });
            pass.set_pipeline(&self.pipeline);
            pass.set_bind_group(0, &bind_group, &[]);
            pass.dispatch_workgroups(
                dst.width.div_ceil(KERNEL_WORKGROUP_SIZE),
                dst.height.div_ceil(KERNEL_WORKGROUP_SIZE),
                1,
            );
        }
        self.queue.submit(Some(encoder.finish()));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::CpuBackend;
    use crate::channel::Channel;
    use crate::compositor::PaintCompositor;
    use crate::undo::UndoManager;
    use glam::Vec2;

    /// A GPU backend, or None (test skipped) when the adapter cannot run the kernel
    fn backend() -> Option<WgpuBackend> {
        match WgpuBackend::new() {
            Ok(backend) => Some(backend),
            Err(err) => {
                eprintln!("skipping GPU test: {err}");
                None
            }
        }
    }

    /// Distinct, non-uniform weights per texel
    fn gradient(width: u32, height: u32) -> CpuTexture {
        let mut texture = CpuTexture::new(width, height);
        for y in 0..height {
            for x in 0..width {
                let u = x as f32 / width as f32;
                let v = y as f32 / height as f32;
                texture.set_pixel(x, y, [u, v, 1.0 - u, 0.25]);
            }
        }
        texture
    }

    #[test]
    fn test_gpu_upload_readback() {
        let Some(backend) = backend() else { return };
        let mut source = CpuTexture::new(3, 5);
        source.set_pixel(1, 2, [0.25, 0.5, 0.75, 1.0]);

        let mut compositor = PaintCompositor::new(backend, &source).unwrap();
        assert_eq!(compositor.read_back().unwrap(), source);
    }

    #[test]
    fn test_gpu_fill_all_matches_cpu() {
        let Some(backend) = backend() else { return };
        let mut source = CpuTexture::new(4, 4);
        source.clear([1.0, 0.0, 0.0, 0.0]);

        let mut compositor = PaintCompositor::new(backend, &source).unwrap();
        compositor.fill_all(Channel::G, 1.0);
        let result = compositor.read_back().unwrap();
        for texel in result.pixels() {
            assert_eq!(*texel, [0.0, 1.0, 0.0, 0.0]);
        }
    }

    #[test]
    fn test_gpu_mismatched_copy_is_skipped() {
        let Some(mut backend) = backend() else { return };
        let mut data = CpuTexture::new(2, 2);
        data.clear([0.0, 0.0, 0.0, 1.0]);
        let src = backend.create_texture_from(&gradient(4, 4)).unwrap();
        let mut dst = backend.create_texture_from(&data).unwrap();

        backend.copy_texture(&src, &mut dst);
        assert_eq!(backend.read_pixels(&dst).unwrap(), data);
    }

    #[test]
    fn test_gpu_soft_dab_matches_cpu_on_non_square_texture() {
        let Some(backend) = backend() else { return };
        let source = gradient(24, 12);

        let mut gpu = PaintCompositor::new(backend, &source).unwrap();
        let mut cpu = PaintCompositor::new(CpuBackend::new(), &source).unwrap();
        for uv in [Vec2::new(0.3, 0.7), Vec2::new(0.85, 0.2)] {
            gpu.apply_dab(uv, 5.0, Channel::B, 0.5);
            cpu.apply_dab(uv, 5.0, Channel::B, 0.5);
        }

        let gpu_result = gpu.read_back().unwrap();
        let cpu_result = cpu.read_back().unwrap();
        assert_ne!(cpu_result, source);
        for y in 0..12 {
            for x in 0..24 {
                let g = gpu_result.get_pixel(x, y).unwrap();
                let c = cpu_result.get_pixel(x, y).unwrap();
                for channel in 0..4 {
                    assert!(
                        (g[channel] - c[channel]).abs() < 1e-5,
                        "texel ({x}, {y}) channel {channel}: gpu {g:?} cpu {c:?}"
                    );
                }
            }
        }
    }

    #[test]
    fn test_gpu_undo_restores_exact_texels() {
        let Some(backend) = backend() else { return };
        let source = gradient(24, 12);

        let mut compositor = PaintCompositor::new(backend, &source).unwrap();
        let mut undo = UndoManager::new(None);
        undo.snapshot(&mut compositor).unwrap();
        compositor.apply_dab(Vec2::new(0.5, 0.5), 4.0, Channel::A, 0.5);
        assert_ne!(compositor.read_back().unwrap(), source);

        assert!(undo.undo(&mut compositor));
        let restored = compositor.read_back().unwrap();
        assert_eq!(restored.as_bytes(), source.as_bytes());
    }
}
