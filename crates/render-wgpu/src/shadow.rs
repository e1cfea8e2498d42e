use glam::{Mat4, Vec3};
use orbitview_scene::{LightItem, LightKind};

pub(crate) const SHADOW_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Depth32Float;

const POINT_SHADOW_FOV_DEGREES: f32 = 90.0;
const POINT_SHADOW_NEAR: f32 = 0.5;
const POINT_SHADOW_FAR: f32 = 500.0;
const DIRECTIONAL_SHADOW_EXTENT: f32 = 10.0;
const DIRECTIONAL_SHADOW_FAR: f32 = 100.0;

/// World-to-clip transform of the light's shadow camera.
///
/// Point lights use one perspective frustum aimed at the origin rather
/// than a cube map, so casters behind the light are not shadowed.
pub(crate) fn light_view_projection(light: &LightItem<'_>) -> Mat4 {
    let eye = light.position;
    let up = if eye.normalize_or_zero().abs_diff_eq(Vec3::Y, 1e-4)
        || eye.normalize_or_zero().abs_diff_eq(-Vec3::Y, 1e-4)
    {
        Vec3::Z
    } else {
        Vec3::Y
    };
    let view = Mat4::look_at_rh(eye, Vec3::ZERO, up);
    let projection = match light.light.kind {
        LightKind::Point { .. } => Mat4::perspective_rh(
            POINT_SHADOW_FOV_DEGREES.to_radians(),
            1.0,
            POINT_SHADOW_NEAR,
            POINT_SHADOW_FAR,
        ),
        LightKind::Directional => {
            let e = DIRECTIONAL_SHADOW_EXTENT;
            Mat4::orthographic_rh(-e, e, -e, e, 0.0, DIRECTIONAL_SHADOW_FAR)
        }
    };
    projection * view
}

/// Depth texture the shadow pass renders into.
pub(crate) struct ShadowMap {
    pub view: wgpu::TextureView,
    pub size: u32,
}

impl ShadowMap {
    pub fn new(device: &wgpu::Device, size: u32) -> Self {
        let size = size.clamp(1, device.limits().max_texture_dimension_2d);
        let texture = device.create_texture(&wgpu::TextureDescriptor {
            label: Some("shadow_map"),
            size: wgpu::Extent3d {
                width: size,
                height: size,
                depth_or_array_layers: 1,
            },
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: SHADOW_FORMAT,
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT | wgpu::TextureUsages::TEXTURE_BINDING,
            view_formats: &[],
        });
        Self {
            view: texture.create_view(&Default::default()),
            size,
        }
    }

    pub fn texel_size(&self) -> f32 {
        1.0 / self.size as f32
    }
}

pub(crate) fn comparison_sampler(device: &wgpu::Device) -> wgpu::Sampler {
    device.create_sampler(&wgpu::SamplerDescriptor {
        label: Some("shadow_sampler"),
        address_mode_u: wgpu::AddressMode::ClampToEdge,
        address_mode_v: wgpu::AddressMode::ClampToEdge,
        address_mode_w: wgpu::AddressMode::ClampToEdge,
        mag_filter: wgpu::FilterMode::Linear,
        min_filter: wgpu::FilterMode::Linear,
        mipmap_filter: wgpu::FilterMode::Nearest,
        compare: Some(wgpu::CompareFunction::LessEqual),
        ..Default::default()
    })
}
