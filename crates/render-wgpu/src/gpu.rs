use std::num::NonZeroU64;

use bytemuck::{Pod, Zeroable};
use glam::Mat4;
use orbitview_render::{
    ColorSpace, PerspectiveCamera, RenderError, Renderer, RendererSettings, clamp_pixel_ratio,
    drawing_buffer_size,
};
use orbitview_scene::{DrawItem, LightItem, LightKind, SceneGraph};
use wgpu::util::DeviceExt;

use crate::mesh::{MeshCache, Vertex};
use crate::shaders;
use crate::shadow::{SHADOW_FORMAT, ShadowMap, comparison_sampler, light_view_projection};

const DEPTH_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Depth32Float;
const SHADOW_DEPTH_BIAS: f32 = 0.0005;
const INITIAL_OBJECT_CAPACITY: usize = 64;

#[repr(C)]
#[derive(Copy, Clone, Debug, Pod, Zeroable)]
struct FrameUniforms {
    view_proj: [[f32; 4]; 4],
    light_view_proj: [[f32; 4]; 4],
    camera_pos: [f32; 4],
    light_pos: [f32; 4],
    light_color: [f32; 4],
    light_params: [f32; 4],
    shadow_params: [f32; 4],
}

#[repr(C)]
#[derive(Copy, Clone, Debug, Pod, Zeroable)]
struct ShadowUniforms {
    light_view_proj: [[f32; 4]; 4],
}

#[repr(C)]
#[derive(Copy, Clone, Debug, PartialEq, Pod, Zeroable)]
struct ObjectUniforms {
    model: [[f32; 4]; 4],
    normal_matrix: [[f32; 4]; 4],
    color: [f32; 4],
    material: [f32; 4],
}

impl ObjectUniforms {
    fn from_item(item: &DrawItem<'_>) -> Self {
        let material = &item.mesh.material;
        let [r, g, b] = material.color.to_linear();
        Self {
            model: item.world.to_cols_array_2d(),
            normal_matrix: item.world.inverse().transpose().to_cols_array_2d(),
            color: [r, g, b, 1.0],
            material: [
                material.shading.shininess(),
                material.shading.specular_strength(),
                if item.mesh.receive_shadow { 1.0 } else { 0.0 },
                0.0,
            ],
        }
    }
}

/// What the scene's one light contributes to a frame.
struct FrameLight {
    uniforms: FrameUniforms,
    shadow: Option<(Mat4, u32)>,
}

fn frame_light(
    settings: &RendererSettings,
    camera: &PerspectiveCamera,
    light: Option<LightItem<'_>>,
    shadow_texel: f32,
) -> FrameLight {
    let mut uniforms = FrameUniforms {
        view_proj: camera.view_projection().to_cols_array_2d(),
        light_view_proj: Mat4::IDENTITY.to_cols_array_2d(),
        camera_pos: camera.position.extend(1.0).to_array(),
        light_pos: [0.0; 4],
        light_color: [0.0; 4],
        light_params: [0.0; 4],
        shadow_params: [0.0; 4],
    };
    let Some(light) = light else {
        return FrameLight {
            uniforms,
            shadow: None,
        };
    };

    let [r, g, b] = light.light.color.to_linear();
    let i = light.light.intensity;
    uniforms.light_color = [r * i, g * i, b * i, 1.0];
    let (kind, distance, decay) = match light.light.kind {
        LightKind::Directional => (0.0, 0.0, 0.0),
        LightKind::Point { distance, decay } => (1.0, distance, decay),
    };
    uniforms.light_pos = light.position.extend(kind).to_array();
    let correct = if settings.physically_correct_lights { 1.0 } else { 0.0 };
    uniforms.light_params = [distance, decay, correct, 1.0];

    let shadow = match settings.shadows {
        Some(filter) if light.light.cast_shadow => {
            let matrix = light_view_projection(&light);
            uniforms.light_view_proj = matrix.to_cols_array_2d();
            uniforms.shadow_params = [
                1.0,
                filter.kernel_radius() as f32,
                shadow_texel,
                SHADOW_DEPTH_BIAS,
            ];
            Some((matrix, light.light.shadow_map_size))
        }
        _ => None,
    };
    FrameLight { uniforms, shadow }
}

/// Pick a surface format whose encoding matches the requested output.
fn choose_surface_format(
    formats: &[wgpu::TextureFormat],
    space: ColorSpace,
) -> Option<wgpu::TextureFormat> {
    let want_srgb = space == ColorSpace::Srgb;
    formats
        .iter()
        .copied()
        .find(|f| f.is_srgb() == want_srgb)
        .or_else(|| formats.first().copied())
}

fn align_to(size: u64, alignment: u64) -> u64 {
    size.div_ceil(alignment) * alignment
}

/// Where an overlay draws after the scene.
pub struct OverlayTarget<'a> {
    pub device: &'a wgpu::Device,
    pub queue: &'a wgpu::Queue,
    pub encoder: &'a mut wgpu::CommandEncoder,
    pub view: &'a wgpu::TextureView,
    pub size_in_pixels: [u32; 2],
    pub pixel_ratio: f64,
}

/// Extra drawing composited over the scene in the same frame (a HUD).
pub trait OverlayPass {
    fn draw(&mut self, target: OverlayTarget<'_>);
}

/// Per-object uniforms in one buffer, addressed by dynamic offset.
struct ObjectBuffer {
    buffer: wgpu::Buffer,
    bind_group: wgpu::BindGroup,
    stride: u64,
    capacity: usize,
}

impl ObjectBuffer {
    fn new(device: &wgpu::Device, layout: &wgpu::BindGroupLayout, capacity: usize) -> Self {
        let alignment = device.limits().min_uniform_buffer_offset_alignment as u64;
        let stride = align_to(std::mem::size_of::<ObjectUniforms>() as u64, alignment);
        let capacity = capacity.max(1);
        let buffer = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("object_uniforms"),
            size: stride * capacity as u64,
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });
        let bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("object_bind_group"),
            layout,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: wgpu::BindingResource::Buffer(wgpu::BufferBinding {
                    buffer: &buffer,
                    offset: 0,
                    size: NonZeroU64::new(std::mem::size_of::<ObjectUniforms>() as u64),
                }),
            }],
        });
        Self {
            buffer,
            bind_group,
            stride,
            capacity,
        }
    }

    fn write(&self, queue: &wgpu::Queue, objects: &[ObjectUniforms]) {
        if objects.is_empty() {
            return;
        }
        let stride = self.stride as usize;
        let mut bytes = vec![0u8; stride * objects.len()];
        for (i, object) in objects.iter().enumerate() {
            let start = i * stride;
            let src = bytemuck::bytes_of(object);
            bytes[start..start + src.len()].copy_from_slice(src);
        }
        queue.write_buffer(&self.buffer, 0, &bytes);
    }

    fn offset(&self, index: usize) -> u32 {
        (self.stride * index as u64) as u32
    }
}

/// Color and depth attachments sized to the drawing buffer.
struct FrameTargets {
    msaa: Option<wgpu::TextureView>,
    depth: wgpu::TextureView,
}

impl FrameTargets {
    fn new(device: &wgpu::Device, config: &wgpu::SurfaceConfiguration, samples: u32) -> Self {
        let size = wgpu::Extent3d {
            width: config.width.max(1),
            height: config.height.max(1),
            depth_or_array_layers: 1,
        };
        let msaa = (samples > 1).then(|| {
            device
                .create_texture(&wgpu::TextureDescriptor {
                    label: Some("msaa_color"),
                    size,
                    mip_level_count: 1,
                    sample_count: samples,
                    dimension: wgpu::TextureDimension::D2,
                    format: config.format,
                    usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
                    view_formats: &[],
                })
                .create_view(&Default::default())
        });
        let depth = device
            .create_texture(&wgpu::TextureDescriptor {
                label: Some("depth_texture"),
                size,
                mip_level_count: 1,
                sample_count: samples,
                dimension: wgpu::TextureDimension::D2,
                format: DEPTH_FORMAT,
                usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
                view_formats: &[],
            })
            .create_view(&Default::default());
        Self { msaa, depth }
    }
}

/// wgpu scene renderer. Owns the surface, device and queue.
pub struct WgpuRenderer {
    surface: wgpu::Surface<'static>,
    device: wgpu::Device,
    queue: wgpu::Queue,
    config: wgpu::SurfaceConfiguration,
    settings: RendererSettings,
    backend: String,
    width: u32,
    height: u32,
    pixel_ratio: f64,
    samples: u32,
    targets: FrameTargets,
    opaque_pipeline: wgpu::RenderPipeline,
    overlay_pipeline: wgpu::RenderPipeline,
    shadow_pipeline: wgpu::RenderPipeline,
    frame_buffer: wgpu::Buffer,
    frame_layout: wgpu::BindGroupLayout,
    frame_bind_group: wgpu::BindGroup,
    shadow_buffer: wgpu::Buffer,
    shadow_bind_group: wgpu::BindGroup,
    shadow_sampler: wgpu::Sampler,
    shadow_map: ShadowMap,
    object_layout: wgpu::BindGroupLayout,
    objects: ObjectBuffer,
    meshes: MeshCache,
}

impl WgpuRenderer {
    /// Create a renderer drawing into `target` (usually an `Arc<Window>`).
    ///
    /// `width` and `height` are logical pixels; the drawing buffer is
    /// scaled by the clamped pixel ratio.
    pub async fn new(
        target: impl Into<wgpu::SurfaceTarget<'static>>,
        settings: RendererSettings,
        width: u32,
        height: u32,
        pixel_ratio: f64,
    ) -> Result<Self, RenderError> {
        let instance = wgpu::Instance::new(&wgpu::InstanceDescriptor {
            backends: wgpu::Backends::all(),
            ..Default::default()
        });

        let surface = instance
            .create_surface(target)
            .map_err(|e| RenderError::Device(format!("create surface: {e}")))?;

        let adapter = instance
            .request_adapter(&wgpu::RequestAdapterOptions {
                power_preference: wgpu::PowerPreference::HighPerformance,
                compatible_surface: Some(&surface),
                force_fallback_adapter: false,
            })
            .await
            .ok_or_else(|| RenderError::Device("no compatible GPU adapter".into()))?;

        let (device, queue) = adapter
            .request_device(
                &wgpu::DeviceDescriptor {
                    label: Some("orbitview_device"),
                    required_features: wgpu::Features::empty(),
                    required_limits: wgpu::Limits::default(),
                    memory_hints: Default::default(),
                },
                None,
            )
            .await
            .map_err(|e| RenderError::Device(format!("request device: {e}")))?;

        let caps = surface.get_capabilities(&adapter);
        let format = choose_surface_format(&caps.formats, settings.output_color_space)
            .ok_or_else(|| RenderError::Device("surface reports no formats".into()))?;

        let mut samples = settings.msaa_samples();
        if samples > 1
            && !adapter
                .get_texture_format_features(format)
                .flags
                .sample_count_supported(samples)
        {
            tracing::warn!(?format, samples, "MSAA not supported for surface format, disabling");
            samples = 1;
        }

        let pixel_ratio = clamp_pixel_ratio(pixel_ratio);
        let (buffer_width, buffer_height) = drawing_buffer_size(width, height, pixel_ratio);
        let config = wgpu::SurfaceConfiguration {
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            format,
            width: buffer_width,
            height: buffer_height,
            present_mode: wgpu::PresentMode::AutoVsync,
            alpha_mode: caps
                .alpha_modes
                .first()
                .copied()
                .unwrap_or(wgpu::CompositeAlphaMode::Auto),
            view_formats: vec![],
            desired_maximum_frame_latency: 2,
        };
        surface.configure(&device, &config);

        let frame_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("frame_bind_group_layout"),
            entries: &[
                wgpu::BindGroupLayoutEntry {
                    binding: 0,
                    visibility: wgpu::ShaderStages::VERTEX | wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Buffer {
                        ty: wgpu::BufferBindingType::Uniform,
                        has_dynamic_offset: false,
                        min_binding_size: None,
                    },
                    count: None,
                },
                wgpu::BindGroupLayoutEntry {
                    binding: 1,
                    visibility: wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Texture {
                        sample_type: wgpu::TextureSampleType::Depth,
                        view_dimension: wgpu::TextureViewDimension::D2,
                        multisampled: false,
                    },
                    count: None,
                },
                wgpu::BindGroupLayoutEntry {
                    binding: 2,
                    visibility: wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Sampler(wgpu::SamplerBindingType::Comparison),
                    count: None,
                },
            ],
        });

        let object_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("object_bind_group_layout"),
            entries: &[wgpu::BindGroupLayoutEntry {
                binding: 0,
                visibility: wgpu::ShaderStages::VERTEX | wgpu::ShaderStages::FRAGMENT,
                ty: wgpu::BindingType::Buffer {
                    ty: wgpu::BufferBindingType::Uniform,
                    has_dynamic_offset: true,
                    min_binding_size: NonZeroU64::new(std::mem::size_of::<ObjectUniforms>() as u64),
                },
                count: None,
            }],
        });

        let shadow_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("shadow_bind_group_layout"),
            entries: &[wgpu::BindGroupLayoutEntry {
                binding: 0,
                visibility: wgpu::ShaderStages::VERTEX,
                ty: wgpu::BindingType::Buffer {
                    ty: wgpu::BufferBindingType::Uniform,
                    has_dynamic_offset: false,
                    min_binding_size: None,
                },
                count: None,
            }],
        });

        let frame_buffer = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("frame_uniforms"),
            size: std::mem::size_of::<FrameUniforms>() as u64,
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });
        let shadow_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("shadow_uniforms"),
            contents: bytemuck::bytes_of(&ShadowUniforms {
                light_view_proj: Mat4::IDENTITY.to_cols_array_2d(),
            }),
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
        });
        let shadow_bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("shadow_bind_group"),
            layout: &shadow_layout,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: shadow_buffer.as_entire_binding(),
            }],
        });

        let shadow_sampler = comparison_sampler(&device);
        let shadow_map = ShadowMap::new(&device, 1);
        let frame_bind_group =
            Self::frame_bind_group(&device, &frame_layout, &frame_buffer, &shadow_map, &shadow_sampler);

        let mesh_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("mesh_pipeline_layout"),
            bind_group_layouts: &[&frame_layout, &object_layout],
            push_constant_ranges: &[],
        });
        let mesh_shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("mesh_shader"),
            source: wgpu::ShaderSource::Wgsl(shaders::MESH_SHADER.into()),
        });
        let opaque_pipeline =
            Self::mesh_pipeline(&device, &mesh_layout, &mesh_shader, format, samples, true);
        let overlay_pipeline =
            Self::mesh_pipeline(&device, &mesh_layout, &mesh_shader, format, samples, false);

        let shadow_pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("shadow_pipeline_layout"),
            bind_group_layouts: &[&shadow_layout, &object_layout],
            push_constant_ranges: &[],
        });
        let shadow_shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("shadow_shader"),
            source: wgpu::ShaderSource::Wgsl(shaders::SHADOW_SHADER.into()),
        });
        let shadow_pipeline = device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
            label: Some("shadow_pipeline"),
            layout: Some(&shadow_pipeline_layout),
            vertex: wgpu::VertexState {
                module: &shadow_shader,
                entry_point: Some("vs_shadow"),
                compilation_options: Default::default(),
                buffers: &[Vertex::LAYOUT],
            },
            fragment: None,
            primitive: wgpu::PrimitiveState {
                topology: wgpu::PrimitiveTopology::TriangleList,
                ..Default::default()
            },
            depth_stencil: Some(wgpu::DepthStencilState {
                format: SHADOW_FORMAT,
                depth_write_enabled: true,
                depth_compare: wgpu::CompareFunction::LessEqual,
                stencil: Default::default(),
                bias: wgpu::DepthBiasState {
                    constant: 2,
                    slope_scale: 2.0,
                    clamp: 0.0,
                },
            }),
            multisample: Default::default(),
            multiview: None,
            cache: None,
        });

        let objects = ObjectBuffer::new(&device, &object_layout, INITIAL_OBJECT_CAPACITY);
        let targets = FrameTargets::new(&device, &config, samples);
        let backend = adapter.get_info().backend.to_str().to_string();

        tracing::info!(
            backend = %backend,
            ?format,
            samples,
            width = buffer_width,
            height = buffer_height,
            "GPU initialized"
        );

        Ok(Self {
            surface,
            device,
            queue,
            config,
            settings,
            backend,
            width: width.max(1),
            height: height.max(1),
            pixel_ratio,
            samples,
            targets,
            opaque_pipeline,
            overlay_pipeline,
            shadow_pipeline,
            frame_buffer,
            frame_layout,
            frame_bind_group,
            shadow_buffer,
            shadow_bind_group,
            shadow_sampler,
            shadow_map,
            object_layout,
            objects,
            meshes: MeshCache::default(),
        })
    }

    fn mesh_pipeline(
        device: &wgpu::Device,
        layout: &wgpu::PipelineLayout,
        shader: &wgpu::ShaderModule,
        format: wgpu::TextureFormat,
        samples: u32,
        depth_write: bool,
    ) -> wgpu::RenderPipeline {
        device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
            label: Some(if depth_write {
                "mesh_pipeline"
            } else {
                "mesh_pipeline_no_depth_write"
            }),
            layout: Some(layout),
            vertex: wgpu::VertexState {
                module: shader,
                entry_point: Some("vs_main"),
                compilation_options: Default::default(),
                buffers: &[Vertex::LAYOUT],
            },
            fragment: Some(wgpu::FragmentState {
                module: shader,
                entry_point: Some("fs_main"),
                compilation_options: Default::default(),
                targets: &[Some(wgpu::ColorTargetState {
                    format,
                    blend: Some(wgpu::BlendState::REPLACE),
                    write_mask: wgpu::ColorWrites::ALL,
                })],
            }),
            primitive: wgpu::PrimitiveState {
                topology: wgpu::PrimitiveTopology::TriangleList,
                cull_mode: None,
                ..Default::default()
            },
            depth_stencil: Some(wgpu::DepthStencilState {
                format: DEPTH_FORMAT,
                depth_write_enabled: depth_write,
                depth_compare: wgpu::CompareFunction::Less,
                stencil: Default::default(),
                bias: Default::default(),
            }),
            multisample: wgpu::MultisampleState {
                count: samples,
                ..Default::default()
            },
            multiview: None,
            cache: None,
        })
    }

    fn frame_bind_group(
        device: &wgpu::Device,
        layout: &wgpu::BindGroupLayout,
        buffer: &wgpu::Buffer,
        shadow_map: &ShadowMap,
        sampler: &wgpu::Sampler,
    ) -> wgpu::BindGroup {
        device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("frame_bind_group"),
            layout,
            entries: &[
                wgpu::BindGroupEntry {
                    binding: 0,
                    resource: buffer.as_entire_binding(),
                },
                wgpu::BindGroupEntry {
                    binding: 1,
                    resource: wgpu::BindingResource::TextureView(&shadow_map.view),
                },
                wgpu::BindGroupEntry {
                    binding: 2,
                    resource: wgpu::BindingResource::Sampler(sampler),
                },
            ],
        })
    }

    pub fn device(&self) -> &wgpu::Device {
        &self.device
    }

    pub fn surface_format(&self) -> wgpu::TextureFormat {
        self.config.format
    }

    pub fn settings(&self) -> &RendererSettings {
        &self.settings
    }

    /// Name of the graphics backend in use.
    pub fn backend(&self) -> &str {
        &self.backend
    }

    /// Drawing-buffer size in physical pixels.
    pub fn drawing_buffer_size(&self) -> (u32, u32) {
        (self.config.width, self.config.height)
    }

    fn reconfigure(&mut self) {
        let (width, height) = drawing_buffer_size(self.width, self.height, self.pixel_ratio);
        if (width, height) == (self.config.width, self.config.height) {
            return;
        }
        self.config.width = width;
        self.config.height = height;
        self.surface.configure(&self.device, &self.config);
        self.targets = FrameTargets::new(&self.device, &self.config, self.samples);
        tracing::debug!(width, height, "surface reconfigured");
    }

    fn ensure_shadow_map(&mut self, size: u32) {
        if self.shadow_map.size == size {
            return;
        }
        self.shadow_map = ShadowMap::new(&self.device, size);
        self.frame_bind_group = Self::frame_bind_group(
            &self.device,
            &self.frame_layout,
            &self.frame_buffer,
            &self.shadow_map,
            &self.shadow_sampler,
        );
        tracing::debug!(size = self.shadow_map.size, "shadow map allocated");
    }

    fn ensure_object_capacity(&mut self, count: usize) {
        if count <= self.objects.capacity {
            return;
        }
        let capacity = count.next_power_of_two();
        self.objects = ObjectBuffer::new(&self.device, &self.object_layout, capacity);
        tracing::debug!(capacity, "object uniform buffer grown");
    }

    /// Render one frame, then let `overlay` draw on top before presenting.
    ///
    /// A lost or outdated surface is reconfigured and the frame skipped.
    pub fn render_frame(
        &mut self,
        scene: &SceneGraph,
        camera: &PerspectiveCamera,
        overlay: Option<&mut dyn OverlayPass>,
    ) -> Result<(), RenderError> {
        let output = match self.surface.get_current_texture() {
            Ok(t) => t,
            Err(wgpu::SurfaceError::Lost | wgpu::SurfaceError::Outdated) => {
                tracing::debug!("surface lost or outdated, reconfiguring");
                self.surface.configure(&self.device, &self.config);
                return Ok(());
            }
            Err(wgpu::SurfaceError::Timeout) => return Err(RenderError::SurfaceTimeout),
            Err(wgpu::SurfaceError::OutOfMemory) => return Err(RenderError::OutOfMemory),
            Err(e) => return Err(RenderError::Device(e.to_string())),
        };
        let view = output
            .texture
            .create_view(&wgpu::TextureViewDescriptor::default());

        let items = scene.draw_items();
        self.meshes.sync(&self.device, &items);
        self.ensure_object_capacity(items.len());

        let light = scene.shadow_light().or_else(|| scene.lights().next());
        let wanted_map = match (self.settings.shadows, light) {
            (Some(_), Some(l)) if l.light.cast_shadow => l.light.shadow_map_size,
            _ => self.shadow_map.size,
        };
        self.ensure_shadow_map(wanted_map);
        let lighting = frame_light(&self.settings, camera, light, self.shadow_map.texel_size());

        self.queue
            .write_buffer(&self.frame_buffer, 0, bytemuck::bytes_of(&lighting.uniforms));
        let objects: Vec<ObjectUniforms> = items.iter().map(ObjectUniforms::from_item).collect();
        self.objects.write(&self.queue, &objects);

        let mut encoder = self
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("render_encoder"),
            });

        if let Some((matrix, _)) = lighting.shadow {
            self.queue.write_buffer(
                &self.shadow_buffer,
                0,
                bytemuck::bytes_of(&ShadowUniforms {
                    light_view_proj: matrix.to_cols_array_2d(),
                }),
            );
            let mut pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("shadow_pass"),
                color_attachments: &[],
                depth_stencil_attachment: Some(wgpu::RenderPassDepthStencilAttachment {
                    view: &self.shadow_map.view,
                    depth_ops: Some(wgpu::Operations {
                        load: wgpu::LoadOp::Clear(1.0),
                        store: wgpu::StoreOp::Store,
                    }),
                    stencil_ops: None,
                }),
                ..Default::default()
            });
            pass.set_pipeline(&self.shadow_pipeline);
            pass.set_bind_group(0, &self.shadow_bind_group, &[]);
            for (index, item) in items.iter().enumerate() {
                if !item.mesh.cast_shadow {
                    continue;
                }
                let Some(mesh) = self.meshes.get(&item.key) else {
                    continue;
                };
                pass.set_bind_group(1, &self.objects.bind_group, &[self.objects.offset(index)]);
                pass.set_vertex_buffer(0, mesh.vertex_buffer.slice(..));
                pass.set_index_buffer(mesh.index_buffer.slice(..), wgpu::IndexFormat::Uint32);
                pass.draw_indexed(0..mesh.index_count, 0, 0..1);
            }
        }

        {
            let clear = self.settings.clear_color.to_linear();
            let (attachment, resolve_target) = match &self.targets.msaa {
                Some(msaa) => (msaa, Some(&view)),
                None => (&view, None),
            };
            let mut pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("main_pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: attachment,
                    resolve_target,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(wgpu::Color {
                            r: clear[0] as f64,
                            g: clear[1] as f64,
                            b: clear[2] as f64,
                            a: 1.0,
                        }),
                        store: wgpu::StoreOp::Store,
                    },
                })],
                depth_stencil_attachment: Some(wgpu::RenderPassDepthStencilAttachment {
                    view: &self.targets.depth,
                    depth_ops: Some(wgpu::Operations {
                        load: wgpu::LoadOp::Clear(1.0),
                        store: wgpu::StoreOp::Store,
                    }),
                    stencil_ops: None,
                }),
                ..Default::default()
            });
            pass.set_bind_group(0, &self.frame_bind_group, &[]);
            for (index, item) in items.iter().enumerate() {
                let Some(mesh) = self.meshes.get(&item.key) else {
                    continue;
                };
                let pipeline = if item.mesh.material.depth_write {
                    &self.opaque_pipeline
                } else {
                    &self.overlay_pipeline
                };
                pass.set_pipeline(pipeline);
                pass.set_bind_group(1, &self.objects.bind_group, &[self.objects.offset(index)]);
                pass.set_vertex_buffer(0, mesh.vertex_buffer.slice(..));
                pass.set_index_buffer(mesh.index_buffer.slice(..), wgpu::IndexFormat::Uint32);
                pass.draw_indexed(0..mesh.index_count, 0, 0..1);
            }
        }

        if let Some(overlay) = overlay {
            overlay.draw(OverlayTarget {
                device: &self.device,
                queue: &self.queue,
                encoder: &mut encoder,
                view: &view,
                size_in_pixels: [self.config.width, self.config.height],
                pixel_ratio: self.pixel_ratio,
            });
        }

        self.queue.submit(std::iter::once(encoder.finish()));
        output.present();
        Ok(())
    }
}

impl Renderer for WgpuRenderer {
    fn set_size(&mut self, width: u32, height: u32) {
        self.width = width.max(1);
        self.height = height.max(1);
        self.reconfigure();
    }

    fn set_pixel_ratio(&mut self, ratio: f64) {
        self.pixel_ratio = clamp_pixel_ratio(ratio);
        self.reconfigure();
    }

    fn size(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    fn pixel_ratio(&self) -> f64 {
        self.pixel_ratio
    }

    fn render(&mut self, scene: &SceneGraph, camera: &PerspectiveCamera) -> Result<(), RenderError> {
        self.render_frame(scene, camera, None)
    }
}
