// src/gfx.rs
//
// wgpu presenter: the pipeline frame is uploaded into an RGBA texture the size
// of the raster and stretched over the window. The fragment shader reads texels
// with `textureLoad`, so scaling is nearest-neighbour without a sampler.

use std::sync::Arc;

use anyhow::Context;
use background::{FrameSink, Pixel, PixelBuffer};
use log::{info, warn};
use rayon::prelude::*;
use winit::window::Window;

const BLIT_WGSL: &str = r#"
struct VertexOut {
  @builtin(position) clip: vec4<f32>,
  @location(0) uv: vec2<f32>,
};

// One oversized triangle covering the viewport; uv is (0,0) top-left.
@vertex
fn vs_main(@builtin(vertex_index) i: u32) -> VertexOut {
  let uv = vec2<f32>(f32((i << 1u) & 2u), f32(i & 2u));
  var out: VertexOut;
  out.clip = vec4<f32>(uv.x * 2.0 - 1.0, 1.0 - uv.y * 2.0, 0.0, 1.0);
  out.uv = uv;
  return out;
}

@group(0) @binding(0) var frame: texture_2d<f32>;

@fragment
fn fs_main(v: VertexOut) -> @location(0) vec4<f32> {
  let size = textureDimensions(frame);
  let texel = min(vec2<u32>(v.uv * vec2<f32>(size)), size - vec2<u32>(1u));
  return textureLoad(frame, texel, 0);
}
"#;

const FRAME_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Rgba8Unorm;

/// Render pipeline and the layout its frame bind groups are built against.
struct Blit {
    pipeline: wgpu::RenderPipeline,
    layout: wgpu::BindGroupLayout,
}

impl Blit {
    fn new(device: &wgpu::Device, target: wgpu::TextureFormat) -> Self {
        let layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("frame_layout"),
            entries: &[wgpu::BindGroupLayoutEntry {
                binding: 0,
                visibility: wgpu::ShaderStages::FRAGMENT,
                ty: wgpu::BindingType::Texture {
                    multisampled: false,
                    view_dimension: wgpu::TextureViewDimension::D2,
                    sample_type: wgpu::TextureSampleType::Float { filterable: false },
                },
                count: None,
            }],
        });

        let shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("blit"),
            source: wgpu::ShaderSource::Wgsl(BLIT_WGSL.into()),
        });
        let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("blit"),
            bind_group_layouts: &[&layout],
            push_constant_ranges: &[],
        });

        let pipeline = device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
            label: Some("blit"),
            layout: Some(&pipeline_layout),
            vertex: wgpu::VertexState {
                module: &shader,
                entry_point: Some("vs_main"),
                compilation_options: Default::default(),
                buffers: &[],
            },
            fragment: Some(wgpu::FragmentState {
                module: &shader,
                entry_point: Some("fs_main"),
                compilation_options: Default::default(),
                targets: &[Some(target.into())],
            }),
            primitive: wgpu::PrimitiveState::default(),
            depth_stencil: None,
            multisample: wgpu::MultisampleState::default(),
            multiview: None,
            cache: None,
        });

        Self { pipeline, layout }
    }
}

/// GPU copy of the raster plus its padded staging rows. Rebuilt whenever the
/// raster size changes.
struct FrameTexture {
    texture: wgpu::Texture,
    bind: wgpu::BindGroup,
    size: wgpu::Extent3d,
    /// Row pitch, padded to `COPY_BYTES_PER_ROW_ALIGNMENT`.
    pitch: u32,
    staging: Vec<u8>,
}

impl FrameTexture {
    fn new(device: &wgpu::Device, blit: &Blit, width: u32, height: u32) -> Self {
        let size = wgpu::Extent3d {
            width: width.max(1),
            height: height.max(1),
            depth_or_array_layers: 1,
        };
        let texture = device.create_texture(&wgpu::TextureDescriptor {
            label: Some("frame"),
            size,
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: FRAME_FORMAT,
            usage: wgpu::TextureUsages::TEXTURE_BINDING | wgpu::TextureUsages::COPY_DST,
            view_formats: &[],
        });
        let view = texture.create_view(&Default::default());
        let bind = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("frame"),
            layout: &blit.layout,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: wgpu::BindingResource::TextureView(&view),
            }],
        });

        let pitch = (4 * size.width).next_multiple_of(wgpu::COPY_BYTES_PER_ROW_ALIGNMENT);
        Self {
            texture,
            bind,
            size,
            pitch,
            staging: vec![0; (pitch * size.height) as usize],
        }
    }

    fn fits(&self, frame: &PixelBuffer) -> bool {
        (self.size.width as usize, self.size.height as usize) == frame.dims()
    }

    fn write(&mut self, queue: &wgpu::Queue, frame: &PixelBuffer) {
        self.staging
            .par_chunks_mut(self.pitch as usize)
            .zip(frame.pixels().par_chunks(frame.width()))
            .for_each(|(bytes, row)| {
                for (dst, &Pixel { r, g, b, a }) in bytes.chunks_exact_mut(4).zip(row) {
                    dst.copy_from_slice(&[r, g, b, a]);
                }
            });

        queue.write_texture(
            wgpu::TexelCopyTextureInfo {
                texture: &self.texture,
                mip_level: 0,
                origin: wgpu::Origin3d::ZERO,
                aspect: wgpu::TextureAspect::All,
            },
            &self.staging,
            wgpu::TexelCopyBufferLayout {
                offset: 0,
                bytes_per_row: Some(self.pitch),
                rows_per_image: Some(self.size.height),
            },
            self.size,
        );
    }
}

/// Swapchain settings: the first reported format, vsync when available.
fn surface_config(
    caps: &wgpu::SurfaceCapabilities,
    width: u32,
    height: u32,
) -> anyhow::Result<wgpu::SurfaceConfiguration> {
    let format = caps
        .formats
        .first()
        .copied()
        .context("surface reports no texture formats")?;
    let present_mode = if caps.present_modes.contains(&wgpu::PresentMode::Fifo) {
        wgpu::PresentMode::Fifo
    } else {
        caps.present_modes
            .first()
            .copied()
            .unwrap_or(wgpu::PresentMode::Fifo)
    };
    Ok(wgpu::SurfaceConfiguration {
        usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
        format,
        width: width.max(1),
        height: height.max(1),
        present_mode,
        alpha_mode: caps
            .alpha_modes
            .first()
            .copied()
            .unwrap_or(wgpu::CompositeAlphaMode::Auto),
        view_formats: vec![],
        desired_maximum_frame_latency: 2,
    })
}

pub struct Gfx {
    surface: wgpu::Surface<'static>,
    device: wgpu::Device,
    queue: wgpu::Queue,
    config: wgpu::SurfaceConfiguration,
    blit: Blit,
    frame: FrameTexture,
}

impl Gfx {
    pub async fn new(window: Arc<Window>, width: u32, height: u32) -> anyhow::Result<Self> {
        let instance = wgpu::Instance::default();
        let surface = instance
            .create_surface(window)
            .context("creating window surface")?;

        let adapter = instance
            .request_adapter(&wgpu::RequestAdapterOptions {
                power_preference: wgpu::PowerPreference::LowPower,
                compatible_surface: Some(&surface),
                force_fallback_adapter: false,
            })
            .await
            .context("no suitable GPU adapter")?;
        info!("using adapter {:?}", adapter.get_info().name);

        let (device, queue) = adapter
            .request_device(&wgpu::DeviceDescriptor {
                label: Some("device"),
                required_features: wgpu::Features::empty(),
                required_limits: wgpu::Limits::default(),
                experimental_features: wgpu::ExperimentalFeatures::default(),
                memory_hints: wgpu::MemoryHints::Performance,
                trace: wgpu::Trace::default(),
            })
            .await
            .context("requesting GPU device")?;

        let config = surface_config(&surface.get_capabilities(&adapter), width, height)?;
        surface.configure(&device, &config);

        let blit = Blit::new(&device, config.format);
        // Placeholder until the first frame arrives with the real raster size.
        let frame = FrameTexture::new(&device, &blit, 1, 1);

        Ok(Self {
            surface,
            device,
            queue,
            config,
            blit,
            frame,
        })
    }

    /// Reconfigure the swapchain for a new window size. The frame texture keeps
    /// its raster size; the pipeline reallocates it on its next frame.
    pub fn resize(&mut self, new_w: u32, new_h: u32) {
        self.config.width = new_w.max(1);
        self.config.height = new_h.max(1);
        self.surface.configure(&self.device, &self.config);
    }

    pub fn render(&mut self) {
        let output = match self.surface.get_current_texture() {
            Ok(t) => t,
            Err(e) => {
                warn!("surface lost ({e}), reconfiguring");
                self.surface.configure(&self.device, &self.config);
                return;
            }
        };
        let view = output.texture.create_view(&Default::default());

        let mut encoder = self
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor { label: Some("blit") });
        {
            let mut pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("blit"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: &view,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(wgpu::Color::BLACK),
                        store: wgpu::StoreOp::Store,
                    },
                    depth_slice: None,
                })],
                depth_stencil_attachment: None,
                timestamp_writes: None,
                occlusion_query_set: None,
            });
            pass.set_pipeline(&self.blit.pipeline);
            pass.set_bind_group(0, &self.frame.bind, &[]);
            pass.draw(0..3, 0..1);
        }

        self.queue.submit(Some(encoder.finish()));
        output.present();
    }
}

impl FrameSink for Gfx {
    fn present(&mut self, frame: &PixelBuffer) {
        if !self.frame.fits(frame) {
            let (w, h) = frame.dims();
            self.frame = FrameTexture::new(&self.device, &self.blit, w as u32, h as u32);
        }
        self.frame.write(&self.queue, frame);
    }
}
