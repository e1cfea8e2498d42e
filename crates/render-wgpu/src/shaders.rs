/// Lit mesh shader: Blinn-Phong with one light and a filtered shadow lookup.
pub const MESH_SHADER: &str = r#"
struct Frame {
    view_proj: mat4x4<f32>,
    light_view_proj: mat4x4<f32>,
    camera_pos: vec4<f32>,
    // xyz position, w: 0 directional, 1 point
    light_pos: vec4<f32>,
    // rgb color * intensity
    light_color: vec4<f32>,
    // x distance, y decay, z physically correct, w light present
    light_params: vec4<f32>,
    // x enabled, y kernel radius, z texel size, w depth bias
    shadow_params: vec4<f32>,
};

struct Object {
    model: mat4x4<f32>,
    normal_matrix: mat4x4<f32>,
    color: vec4<f32>,
    // x shininess, y specular strength, z receive shadow
    material: vec4<f32>,
};

@group(0) @binding(0)
var<uniform> frame: Frame;
@group(0) @binding(1)
var shadow_map: texture_depth_2d;
@group(0) @binding(2)
var shadow_sampler: sampler_comparison;

@group(1) @binding(0)
var<uniform> object: Object;

struct VertexInput {
    @location(0) position: vec3<f32>,
    @location(1) normal: vec3<f32>,
};

struct VertexOutput {
    @builtin(position) clip_position: vec4<f32>,
    @location(0) world_pos: vec3<f32>,
    @location(1) world_normal: vec3<f32>,
};

@vertex
fn vs_main(vertex: VertexInput) -> VertexOutput {
    let world = object.model * vec4<f32>(vertex.position, 1.0);
    var out: VertexOutput;
    out.clip_position = frame.view_proj * world;
    out.world_pos = world.xyz;
    out.world_normal = (object.normal_matrix * vec4<f32>(vertex.normal, 0.0)).xyz;
    return out;
}

fn point_attenuation(d: f32) -> f32 {
    let cutoff = frame.light_params.x;
    let decay = frame.light_params.y;
    if (frame.light_params.z > 0.5) {
        var falloff = 1.0 / max(pow(d, decay), 0.01);
        if (cutoff > 0.0) {
            let r = clamp(1.0 - pow(d / cutoff, 4.0), 0.0, 1.0);
            falloff = falloff * r * r;
        }
        return falloff;
    }
    if (cutoff > 0.0 && decay > 0.0) {
        return pow(clamp(1.0 - d / cutoff, 0.0, 1.0), decay);
    }
    return 1.0;
}

fn shadow_factor(world_pos: vec3<f32>) -> f32 {
    if (frame.shadow_params.x < 0.5 || object.material.z < 0.5) {
        return 1.0;
    }
    let clip = frame.light_view_proj * vec4<f32>(world_pos, 1.0);
    if (clip.w <= 0.0) {
        return 1.0;
    }
    let ndc = clip.xyz / clip.w;
    let uv = vec2<f32>(ndc.x * 0.5 + 0.5, 0.5 - ndc.y * 0.5);
    if (any(uv < vec2<f32>(0.0)) || any(uv > vec2<f32>(1.0)) || ndc.z > 1.0) {
        return 1.0;
    }
    let depth = ndc.z - frame.shadow_params.w;
    let radius = i32(frame.shadow_params.y);
    let texel = frame.shadow_params.z;
    var lit = 0.0;
    var taps = 0.0;
    for (var y = -radius; y <= radius; y++) {
        for (var x = -radius; x <= radius; x++) {
            let offset = vec2<f32>(f32(x), f32(y)) * texel;
            lit += textureSampleCompareLevel(shadow_map, shadow_sampler, uv + offset, depth);
            taps += 1.0;
        }
    }
    return lit / taps;
}

@fragment
fn fs_main(in: VertexOutput) -> @location(0) vec4<f32> {
    if (frame.light_params.w < 0.5) {
        return vec4<f32>(0.0, 0.0, 0.0, 1.0);
    }

    let view_dir = normalize(frame.camera_pos.xyz - in.world_pos);
    var normal = normalize(in.world_normal);
    if (dot(normal, view_dir) < 0.0) {
        normal = -normal;
    }

    var light_dir = normalize(frame.light_pos.xyz);
    var attenuation = 1.0;
    if (frame.light_pos.w > 0.5) {
        let to_light = frame.light_pos.xyz - in.world_pos;
        let d = length(to_light);
        light_dir = to_light / max(d, 0.0001);
        attenuation = point_attenuation(d);
    }

    let n_dot_l = max(dot(normal, light_dir), 0.0);
    let half_dir = normalize(light_dir + view_dir);
    var specular = 0.0;
    if (n_dot_l > 0.0) {
        specular = pow(max(dot(normal, half_dir), 0.0), object.material.x) * object.material.y;
    }

    let radiance = frame.light_color.rgb * attenuation * shadow_factor(in.world_pos);
    let color = (object.color.rgb * n_dot_l + vec3<f32>(specular)) * radiance;
    return vec4<f32>(color, 1.0);
}
"#;

/// Depth-only pass rendering shadow casters from the light.
pub const SHADOW_SHADER: &str = r#"
struct ShadowFrame {
    light_view_proj: mat4x4<f32>,
};

struct Object {
    model: mat4x4<f32>,
    normal_matrix: mat4x4<f32>,
    color: vec4<f32>,
    material: vec4<f32>,
};

@group(0) @binding(0)
var<uniform> shadow: ShadowFrame;

@group(1) @binding(0)
var<uniform> object: Object;

@vertex
fn vs_shadow(@location(0) position: vec3<f32>) -> @builtin(position) vec4<f32> {
    return shadow.light_view_proj * object.model * vec4<f32>(position, 1.0);
}
"#;
