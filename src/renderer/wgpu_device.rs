//! `wgpu`-backed [`GpuDevice`].
//!
//! Device calls record into a per-frame op list; `present` replays the
//! list as render passes (one per target bind) and submits a single
//! command buffer. Vertex/index buffers are created eagerly at draw time
//! with `create_buffer_init`, which keeps the replay borrow-free.

use std::collections::HashMap;
use std::sync::Arc;

use raw_window_handle::{HasDisplayHandle, HasWindowHandle};
use wgpu::util::DeviceExt;
use wgpu::{BufferUsages, Extent3d, TextureDimension, TextureFormat, TextureUsages};

use crate::texture::ScaleMode;

use super::device::{
    BlendMode, ColorVertex, ContextId, GpuDevice, ShaderKind, TargetHandle, TextureHandle,
    TexturedVertex,
};

const COLOR_SHADER_SOURCE: &str = r#"
struct VertexInput {
    @location(0) position: vec2<f32>,
    @location(1) color: vec4<f32>,
}

struct VertexOutput {
    @builtin(position) clip_position: vec4<f32>,
    @location(0) color: vec4<f32>,
}

@vertex
fn vs_main(in: VertexInput) -> VertexOutput {
    var out: VertexOutput;
    out.clip_position = vec4<f32>(in.position, 0.0, 1.0);
    out.color = in.color;
    return out;
}

@fragment
fn fs_main(in: VertexOutput) -> @location(0) vec4<f32> {
    return in.color;
}
"#;

const TEXTURED_SHADER_SOURCE: &str = r#"
struct VertexInput {
    @location(0) position: vec2<f32>,
    @location(1) uv: vec2<f32>,
    @location(2) color: vec4<f32>,
}

struct VertexOutput {
    @builtin(position) clip_position: vec4<f32>,
    @location(0) uv: vec2<f32>,
    @location(1) color: vec4<f32>,
}

@vertex
fn vs_main(in: VertexInput) -> VertexOutput {
    var out: VertexOutput;
    out.clip_position = vec4<f32>(in.position, 0.0, 1.0);
    out.uv = in.uv;
    out.color = in.color;
    return out;
}

@group(0) @binding(0) var t_color: texture_2d<f32>;
@group(0) @binding(1) var s_color: sampler;

@fragment
fn fs_main(in: VertexOutput) -> @location(0) vec4<f32> {
    return textureSample(t_color, s_color, in.uv) * in.color;
}
"#;

struct GpuTexture {
    #[allow(dead_code)] // Keeps the underlying texture alive for its views
    texture: wgpu::Texture,
    bind_clamp: wgpu::BindGroup,
    bind_repeat: wgpu::BindGroup,
}

struct TargetResources {
    #[allow(dead_code)]
    texture: wgpu::Texture,
    view: wgpu::TextureView,
}

struct SurfaceState {
    surface: wgpu::Surface<'static>,
    config: wgpu::SurfaceConfiguration,
}

struct Offscreen {
    #[allow(dead_code)]
    texture: wgpu::Texture,
    view: wgpu::TextureView,
}

enum FrameOp {
    Bind(Option<TargetHandle>),
    Clear([f32; 4]),
    Draw {
        shader: ShaderKind,
        blend: BlendMode,
        texture: Option<TextureHandle>,
        vertices: wgpu::Buffer,
        indices: wgpu::Buffer,
        index_count: u32,
    },
}

pub struct WgpuDevice {
    device: Arc<wgpu::Device>,
    queue: Arc<wgpu::Queue>,
    format: TextureFormat,

    surface: Option<SurfaceState>,
    offscreen: Option<Offscreen>,

    texture_bind_group_layout: wgpu::BindGroupLayout,
    sampler_linear: wgpu::Sampler,
    sampler_nearest: wgpu::Sampler,
    sampler_repeat: wgpu::Sampler,
    color_shader: wgpu::ShaderModule,
    textured_shader: wgpu::ShaderModule,
    pipelines: HashMap<(ShaderKind, BlendMode), wgpu::RenderPipeline>,

    textures: HashMap<TextureHandle, GpuTexture>,
    targets: HashMap<TargetHandle, TargetResources>,
    next_texture: u32,
    next_target: u32,

    context: ContextId,
    lost: bool,
    current_shader: ShaderKind,
    ops: Vec<FrameOp>,
}

impl WgpuDevice {
    /// Bring up a device with no window: the screen target is an offscreen
    /// texture of the given size.
    pub fn new_headless(width: u32, height: u32) -> Self {
        let (instance, device, queue) = Self::request_device();
        let format = TextureFormat::Rgba8Unorm;
        drop(instance);

        let mut this = Self::from_parts(device, queue, format, None);
        this.offscreen = Some(this.create_offscreen(width.max(1), height.max(1)));
        this
    }

    /// Bring up a device rendering to `window`.
    pub fn for_window<W>(window: W, width: u32, height: u32) -> Self
    where
        W: HasWindowHandle + HasDisplayHandle,
    {
        let (instance, device, queue) = Self::request_device();

        let surface = unsafe {
            instance
                .create_surface_unsafe(wgpu::SurfaceTargetUnsafe::from_window(&window).unwrap())
                .expect("Failed to create surface")
        };

        let caps = surface.get_capabilities(
            &pollster::block_on(instance.request_adapter(&wgpu::RequestAdapterOptions {
                power_preference: wgpu::PowerPreference::LowPower,
                compatible_surface: Some(&surface),
                force_fallback_adapter: false,
            }))
            .unwrap(),
        );

        // Prefer plain 8-bit formats; the shaders expect non-sRGB sampling.
        let format = caps
            .formats
            .iter()
            .find(|f| {
                matches!(
                    f,
                    TextureFormat::Bgra8Unorm | TextureFormat::Rgba8Unorm
                )
            })
            .copied()
            .unwrap_or(caps.formats[0]);
        log::info!("Using surface format: {:?}", format);

        let config = wgpu::SurfaceConfiguration {
            usage: TextureUsages::RENDER_ATTACHMENT,
            format,
            width: width.max(1),
            height: height.max(1),
            present_mode: wgpu::PresentMode::Fifo,
            alpha_mode: caps
                .alpha_modes
                .first()
                .copied()
                .unwrap_or(wgpu::CompositeAlphaMode::Auto),
            view_formats: vec![],
            desired_maximum_frame_latency: 2,
        };
        surface.configure(&device, &config);

        Self::from_parts(device, queue, format, Some(SurfaceState { surface, config }))
    }

    fn request_device() -> (wgpu::Instance, Arc<wgpu::Device>, Arc<wgpu::Queue>) {
        let instance = wgpu::Instance::new(&wgpu::InstanceDescriptor::default());

        let adapter = pollster::block_on(instance.request_adapter(&wgpu::RequestAdapterOptions {
            power_preference: wgpu::PowerPreference::LowPower,
            compatible_surface: None,
            force_fallback_adapter: false,
        }))
        .expect("Failed to find GPU adapter");

        let (device, queue) = pollster::block_on(adapter.request_device(&wgpu::DeviceDescriptor {
            label: Some("Tableau Device"),
            required_features: wgpu::Features::empty(),
            required_limits: wgpu::Limits::default(),
            memory_hints: wgpu::MemoryHints::default(),
            experimental_features: wgpu::ExperimentalFeatures::default(),
            trace: wgpu::Trace::Off,
        }))
        .expect("Failed to create device");

        (instance, Arc::new(device), Arc::new(queue))
    }

    fn from_parts(
        device: Arc<wgpu::Device>,
        queue: Arc<wgpu::Queue>,
        format: TextureFormat,
        surface: Option<SurfaceState>,
    ) -> Self {
        let texture_bind_group_layout =
            device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
                label: Some("Texture Bind Group Layout"),
                entries: &[
                    wgpu::BindGroupLayoutEntry {
                        binding: 0,
                        visibility: wgpu::ShaderStages::FRAGMENT,
                        ty: wgpu::BindingType::Texture {
                            sample_type: wgpu::TextureSampleType::Float { filterable: true },
                            view_dimension: wgpu::TextureViewDimension::D2,
                            multisampled: false,
                        },
                        count: None,
                    },
                    wgpu::BindGroupLayoutEntry {
                        binding: 1,
                        visibility: wgpu::ShaderStages::FRAGMENT,
                        ty: wgpu::BindingType::Sampler(wgpu::SamplerBindingType::Filtering),
                        count: None,
                    },
                ],
            });

        let clamp_sampler = |filter: wgpu::FilterMode| {
            device.create_sampler(&wgpu::SamplerDescriptor {
                label: Some("Texture Sampler"),
                address_mode_u: wgpu::AddressMode::ClampToEdge,
                address_mode_v: wgpu::AddressMode::ClampToEdge,
                address_mode_w: wgpu::AddressMode::ClampToEdge,
                mag_filter: filter,
                min_filter: filter,
                mipmap_filter: wgpu::MipmapFilterMode::Nearest,
                ..Default::default()
            })
        };
        let sampler_linear = clamp_sampler(wgpu::FilterMode::Linear);
        let sampler_nearest = clamp_sampler(wgpu::FilterMode::Nearest);
        let sampler_repeat = device.create_sampler(&wgpu::SamplerDescriptor {
            label: Some("Repeat Sampler"),
            address_mode_u: wgpu::AddressMode::Repeat,
            address_mode_v: wgpu::AddressMode::Repeat,
            address_mode_w: wgpu::AddressMode::Repeat,
            mag_filter: wgpu::FilterMode::Linear,
            min_filter: wgpu::FilterMode::Linear,
            mipmap_filter: wgpu::MipmapFilterMode::Nearest,
            ..Default::default()
        });

        let color_shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("Color Shader"),
            source: wgpu::ShaderSource::Wgsl(COLOR_SHADER_SOURCE.into()),
        });
        let textured_shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("Textured Shader"),
            source: wgpu::ShaderSource::Wgsl(TEXTURED_SHADER_SOURCE.into()),
        });

        Self {
            device,
            queue,
            format,
            surface,
            offscreen: None,
            texture_bind_group_layout,
            sampler_linear,
            sampler_nearest,
            sampler_repeat,
            color_shader,
            textured_shader,
            pipelines: HashMap::new(),
            textures: HashMap::new(),
            targets: HashMap::new(),
            next_texture: 0,
            next_target: 0,
            context: ContextId(1),
            lost: false,
            current_shader: ShaderKind::Textured,
            ops: Vec::new(),
        }
    }

    fn create_offscreen(&self, width: u32, height: u32) -> Offscreen {
        let texture = self.device.create_texture(&wgpu::TextureDescriptor {
            label: Some("Offscreen Screen Target"),
            size: Extent3d {
                width,
                height,
                depth_or_array_layers: 1,
            },
            mip_level_count: 1,
            sample_count: 1,
            dimension: TextureDimension::D2,
            format: self.format,
            usage: TextureUsages::RENDER_ATTACHMENT | TextureUsages::COPY_SRC,
            view_formats: &[],
        });
        let view = texture.create_view(&wgpu::TextureViewDescriptor::default());
        Offscreen { texture, view }
    }

    fn blend_state(mode: BlendMode) -> wgpu::BlendState {
        match mode {
            BlendMode::Normal => wgpu::BlendState::ALPHA_BLENDING,
            BlendMode::Add => wgpu::BlendState {
                color: wgpu::BlendComponent {
                    src_factor: wgpu::BlendFactor::SrcAlpha,
                    dst_factor: wgpu::BlendFactor::One,
                    operation: wgpu::BlendOperation::Add,
                },
                alpha: wgpu::BlendComponent {
                    src_factor: wgpu::BlendFactor::One,
                    dst_factor: wgpu::BlendFactor::One,
                    operation: wgpu::BlendOperation::Add,
                },
            },
            BlendMode::Multiply => wgpu::BlendState {
                color: wgpu::BlendComponent {
                    src_factor: wgpu::BlendFactor::Dst,
                    dst_factor: wgpu::BlendFactor::OneMinusSrcAlpha,
                    operation: wgpu::BlendOperation::Add,
                },
                alpha: wgpu::BlendComponent {
                    src_factor: wgpu::BlendFactor::One,
                    dst_factor: wgpu::BlendFactor::OneMinusSrcAlpha,
                    operation: wgpu::BlendOperation::Add,
                },
            },
            BlendMode::Screen => wgpu::BlendState {
                color: wgpu::BlendComponent {
                    src_factor: wgpu::BlendFactor::One,
                    dst_factor: wgpu::BlendFactor::OneMinusSrc,
                    operation: wgpu::BlendOperation::Add,
                },
                alpha: wgpu::BlendComponent {
                    src_factor: wgpu::BlendFactor::One,
                    dst_factor: wgpu::BlendFactor::OneMinusSrcAlpha,
                    operation: wgpu::BlendOperation::Add,
                },
            },
        }
    }

    fn ensure_pipeline(&mut self, shader: ShaderKind, blend: BlendMode) {
        if self.pipelines.contains_key(&(shader, blend)) {
            return;
        }

        let (module, buffers, needs_texture) = match shader {
            ShaderKind::Color => (&self.color_shader, ColorVertex::desc(), false),
            ShaderKind::Textured | ShaderKind::TiledTextured => {
                (&self.textured_shader, TexturedVertex::desc(), true)
            }
        };
        let textured_layouts = [&self.texture_bind_group_layout];
        let bind_group_layouts: &[&wgpu::BindGroupLayout] = if needs_texture {
            &textured_layouts
        } else {
            &[]
        };

        let pipeline_layout = self
            .device
            .create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
                label: Some("Tableau Pipeline Layout"),
                bind_group_layouts,
                immediate_size: 0,
            });

        let pipeline = self
            .device
            .create_render_pipeline(&wgpu::RenderPipelineDescriptor {
                label: Some("Tableau Render Pipeline"),
                layout: Some(&pipeline_layout),
                vertex: wgpu::VertexState {
                    module,
                    entry_point: Some("vs_main"),
                    buffers: &[buffers],
                    compilation_options: wgpu::PipelineCompilationOptions::default(),
                },
                fragment: Some(wgpu::FragmentState {
                    module,
                    entry_point: Some("fs_main"),
                    targets: &[Some(wgpu::ColorTargetState {
                        format: self.format,
                        blend: Some(Self::blend_state(blend)),
                        write_mask: wgpu::ColorWrites::ALL,
                    })],
                    compilation_options: wgpu::PipelineCompilationOptions::default(),
                }),
                primitive: wgpu::PrimitiveState {
                    topology: wgpu::PrimitiveTopology::TriangleList,
                    strip_index_format: None,
                    front_face: wgpu::FrontFace::Ccw,
                    cull_mode: None,
                    polygon_mode: wgpu::PolygonMode::Fill,
                    unclipped_depth: false,
                    conservative: false,
                },
                depth_stencil: None,
                multisample: wgpu::MultisampleState::default(),
                multiview_mask: None,
                cache: None,
            });

        self.pipelines.insert((shader, blend), pipeline);
    }
}

impl GpuDevice for WgpuDevice {
    fn context_id(&self) -> ContextId {
        self.context
    }

    fn is_lost(&self) -> bool {
        self.lost
    }

    fn create_texture(
        &mut self,
        width: u32,
        height: u32,
        scale_mode: ScaleMode,
        pixels: &[u8],
    ) -> TextureHandle {
        let texture = self.device.create_texture(&wgpu::TextureDescriptor {
            label: Some("Tableau Texture"),
            size: Extent3d {
                width,
                height,
                depth_or_array_layers: 1,
            },
            mip_level_count: 1,
            sample_count: 1,
            dimension: TextureDimension::D2,
            format: TextureFormat::Rgba8Unorm,
            usage: TextureUsages::TEXTURE_BINDING | TextureUsages::COPY_DST,
            view_formats: &[],
        });

        self.queue.write_texture(
            wgpu::TexelCopyTextureInfo {
                texture: &texture,
                mip_level: 0,
                origin: wgpu::Origin3d::ZERO,
                aspect: wgpu::TextureAspect::All,
            },
            pixels,
            wgpu::TexelCopyBufferLayout {
                offset: 0,
                bytes_per_row: Some(4 * width),
                rows_per_image: Some(height),
            },
            Extent3d {
                width,
                height,
                depth_or_array_layers: 1,
            },
        );

        let view = texture.create_view(&wgpu::TextureViewDescriptor::default());
        let sampler = match scale_mode {
            ScaleMode::Linear => &self.sampler_linear,
            ScaleMode::Nearest => &self.sampler_nearest,
        };
        let make_bind_group = |sampler: &wgpu::Sampler| {
            self.device.create_bind_group(&wgpu::BindGroupDescriptor {
                label: Some("Texture Bind Group"),
                layout: &self.texture_bind_group_layout,
                entries: &[
                    wgpu::BindGroupEntry {
                        binding: 0,
                        resource: wgpu::BindingResource::TextureView(&view),
                    },
                    wgpu::BindGroupEntry {
                        binding: 1,
                        resource: wgpu::BindingResource::Sampler(sampler),
                    },
                ],
            })
        };
        let bind_clamp = make_bind_group(sampler);
        let bind_repeat = make_bind_group(&self.sampler_repeat);

        self.next_texture += 1;
        let handle = TextureHandle(self.next_texture);
        self.textures.insert(
            handle,
            GpuTexture {
                texture,
                bind_clamp,
                bind_repeat,
            },
        );
        handle
    }

    fn delete_texture(&mut self, handle: TextureHandle) {
        self.textures.remove(&handle);
    }

    fn create_render_target(&mut self, width: u32, height: u32) -> (TargetHandle, TextureHandle) {
        let texture = self.device.create_texture(&wgpu::TextureDescriptor {
            label: Some("Tableau Render Target"),
            size: Extent3d {
                width,
                height,
                depth_or_array_layers: 1,
            },
            mip_level_count: 1,
            sample_count: 1,
            dimension: TextureDimension::D2,
            format: self.format,
            usage: TextureUsages::RENDER_ATTACHMENT | TextureUsages::TEXTURE_BINDING,
            view_formats: &[],
        });
        let view = texture.create_view(&wgpu::TextureViewDescriptor::default());

        let make_bind_group = |sampler: &wgpu::Sampler| {
            self.device.create_bind_group(&wgpu::BindGroupDescriptor {
                label: Some("Render Target Bind Group"),
                layout: &self.texture_bind_group_layout,
                entries: &[
                    wgpu::BindGroupEntry {
                        binding: 0,
                        resource: wgpu::BindingResource::TextureView(&view),
                    },
                    wgpu::BindGroupEntry {
                        binding: 1,
                        resource: wgpu::BindingResource::Sampler(sampler),
                    },
                ],
            })
        };
        let bind_clamp = make_bind_group(&self.sampler_linear);
        let bind_repeat = make_bind_group(&self.sampler_repeat);

        self.next_target += 1;
        let target = TargetHandle(self.next_target);
        self.targets.insert(
            target,
            TargetResources {
                texture: texture.clone(),
                view,
            },
        );

        self.next_texture += 1;
        let sample_handle = TextureHandle(self.next_texture);
        self.textures.insert(
            sample_handle,
            GpuTexture {
                texture,
                bind_clamp,
                bind_repeat,
            },
        );
        (target, sample_handle)
    }

    fn delete_render_target(&mut self, target: TargetHandle) {
        self.targets.remove(&target);
    }

    fn bind_render_target(&mut self, target: Option<TargetHandle>) {
        self.ops.push(FrameOp::Bind(target));
    }

    fn clear(&mut self, color: [f32; 4]) {
        self.ops.push(FrameOp::Clear(color));
    }

    fn set_shader(&mut self, shader: ShaderKind) {
        self.current_shader = shader;
    }

    fn draw_indexed(
        &mut self,
        texture: Option<TextureHandle>,
        vertex_bytes: &[u8],
        indices: &[u16],
        blend: BlendMode,
    ) {
        if vertex_bytes.is_empty() || indices.is_empty() {
            return;
        }
        let vertices = self
            .device
            .create_buffer_init(&wgpu::util::BufferInitDescriptor {
                label: Some("Tableau Vertex Buffer"),
                contents: vertex_bytes,
                usage: BufferUsages::VERTEX,
            });
        let index_buffer = self
            .device
            .create_buffer_init(&wgpu::util::BufferInitDescriptor {
                label: Some("Tableau Index Buffer"),
                contents: bytemuck::cast_slice(indices),
                usage: BufferUsages::INDEX,
            });
        self.ops.push(FrameOp::Draw {
            shader: self.current_shader,
            blend,
            texture,
            vertices,
            indices: index_buffer,
            index_count: indices.len() as u32,
        });
    }

    fn present(&mut self) {
        let ops = std::mem::take(&mut self.ops);
        if ops.is_empty() {
            return;
        }

        for op in &ops {
            if let FrameOp::Draw { shader, blend, .. } = op {
                self.ensure_pipeline(*shader, *blend);
            }
        }

        let frame = match &self.surface {
            Some(state) => match state.surface.get_current_texture() {
                Ok(frame) => Some(frame),
                Err(wgpu::SurfaceError::Lost) => {
                    log::warn!("surface lost; reconfiguring and skipping frame");
                    state.surface.configure(&self.device, &state.config);
                    return;
                }
                Err(wgpu::SurfaceError::OutOfMemory) => {
                    log::error!("Out of GPU memory");
                    return;
                }
                Err(e) => {
                    log::error!("Surface error: {:?}", e);
                    return;
                }
            },
            None => None,
        };
        let screen_view = match (&frame, &self.offscreen) {
            (Some(frame), _) => frame
                .texture
                .create_view(&wgpu::TextureViewDescriptor::default()),
            (None, Some(offscreen)) => offscreen
                .texture
                .create_view(&wgpu::TextureViewDescriptor::default()),
            (None, None) => return,
        };

        // Group the op stream into passes, one per target bind.
        struct Pass {
            target: Option<TargetHandle>,
            clear: Option<[f32; 4]>,
            draws: Vec<FrameOp>,
        }
        let mut passes: Vec<Pass> = Vec::new();
        for op in ops {
            match op {
                FrameOp::Bind(target) => passes.push(Pass {
                    target,
                    clear: None,
                    draws: Vec::new(),
                }),
                FrameOp::Clear(color) => {
                    if passes.is_empty() {
                        passes.push(Pass {
                            target: None,
                            clear: None,
                            draws: Vec::new(),
                        });
                    }
                    let pass = passes.last_mut().unwrap();
                    pass.clear = Some(color);
                }
                draw @ FrameOp::Draw { .. } => {
                    if passes.is_empty() {
                        passes.push(Pass {
                            target: None,
                            clear: None,
                            draws: Vec::new(),
                        });
                    }
                    passes.last_mut().unwrap().draws.push(draw);
                }
            }
        }

        let mut encoder = self
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("Tableau Render Encoder"),
            });

        for pass in &passes {
            if pass.clear.is_none() && pass.draws.is_empty() {
                continue;
            }
            let view = match pass.target {
                None => &screen_view,
                Some(target) => match self.targets.get(&target) {
                    Some(resources) => &resources.view,
                    None => continue,
                },
            };
            let load = match pass.clear {
                Some([r, g, b, a]) => wgpu::LoadOp::Clear(wgpu::Color {
                    r: r as f64,
                    g: g as f64,
                    b: b as f64,
                    a: a as f64,
                }),
                None => wgpu::LoadOp::Load,
            };

            let mut render_pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("Tableau Render Pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load,
                        store: wgpu::StoreOp::Store,
                    },
                    depth_slice: None,
                })],
                depth_stencil_attachment: None,
                timestamp_writes: None,
                occlusion_query_set: None,
                multiview_mask: None,
            });

            for draw in &pass.draws {
                let FrameOp::Draw {
                    shader,
                    blend,
                    texture,
                    vertices,
                    indices,
                    index_count,
                } = draw
                else {
                    continue;
                };
                let pipeline = &self.pipelines[&(*shader, *blend)];
                render_pass.set_pipeline(pipeline);
                if let Some(handle) = texture {
                    let Some(gpu_texture) = self.textures.get(handle) else {
                        continue;
                    };
                    let bind_group = match shader {
                        ShaderKind::TiledTextured => &gpu_texture.bind_repeat,
                        _ => &gpu_texture.bind_clamp,
                    };
                    render_pass.set_bind_group(0, bind_group, &[]);
                }
                render_pass.set_vertex_buffer(0, vertices.slice(..));
                render_pass.set_index_buffer(indices.slice(..), wgpu::IndexFormat::Uint16);
                render_pass.draw_indexed(0..*index_count, 0, 0..1);
            }
        }

        self.queue.submit(std::iter::once(encoder.finish()));
        if let Some(frame) = frame {
            frame.present();
        }
    }

    fn resize_surface(&mut self, width: u32, height: u32) {
        if width == 0 || height == 0 {
            return;
        }
        if let Some(state) = &mut self.surface {
            state.config.width = width;
            state.config.height = height;
            state.surface.configure(&self.device, &state.config);
        } else {
            self.offscreen = Some(self.create_offscreen(width, height));
        }
    }
}
