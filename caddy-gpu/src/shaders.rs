//! WGSL shaders for point cloud rendering

/// Points as camera-facing square quads, one instance per point, plus
/// colored lines for the axes helper.
///
/// Attenuated point size follows the usual `size * (height / 2) / depth`
/// rule, so a size is in world units at the point's depth.
pub const POINT_CLOUD_SHADER: &str = r#"
struct Frame {
    view: mat4x4<f32>,
    proj: mat4x4<f32>,
    color: vec4<f32>,
    viewport: vec2<f32>,
    point_size: f32,
    size_attenuation: f32,
};

@group(0) @binding(0)
var<uniform> frame: Frame;

struct PointOut {
    @builtin(position) clip: vec4<f32>,
};

@vertex
fn vs_point(@location(0) corner: vec2<f32>, @location(1) center: vec3<f32>) -> PointOut {
    let view_pos = frame.view * vec4<f32>(center, 1.0);
    var clip = frame.proj * view_pos;

    var size_px = frame.point_size;
    if (frame.size_attenuation > 0.5) {
        size_px = frame.point_size * frame.viewport.y * 0.5 / max(-view_pos.z, 0.0001);
    }
    size_px = max(size_px, 1.0);

    let offset = corner * size_px / frame.viewport * clip.w;
    clip = vec4<f32>(clip.xy + offset, clip.zw);

    var out: PointOut;
    out.clip = clip;
    return out;
}

@fragment
fn fs_point(in: PointOut) -> @location(0) vec4<f32> {
    return vec4<f32>(frame.color.rgb, 1.0);
}

struct LineOut {
    @builtin(position) clip: vec4<f32>,
    @location(0) color: vec3<f32>,
};

@vertex
fn vs_line(@location(0) position: vec3<f32>, @location(1) color: vec3<f32>) -> LineOut {
    var out: LineOut;
    out.clip = frame.proj * frame.view * vec4<f32>(position, 1.0);
    out.color = color;
    return out;
}

@fragment
fn fs_line(in: LineOut) -> @location(0) vec4<f32> {
    return vec4<f32>(in.color, 1.0);
}
"#;
