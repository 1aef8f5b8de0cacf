use std::borrow::Cow;

use wgpu::naga::ShaderStage;

fn compile_glsl(
    device: &wgpu::Device,
    label: &'static str,
    source: &'static str,
    stage: ShaderStage,
) -> wgpu::ShaderModule {
    device.create_shader_module(wgpu::ShaderModuleDescriptor {
        label: Some(label),
        source: wgpu::ShaderSource::Glsl {
            shader: Cow::Borrowed(source),
            stage,
            defines: &[],
        },
    })
}

/// Compiles the static full-screen triangle vertex shader.
pub(crate) fn compile_vertex_shader(device: &wgpu::Device) -> wgpu::ShaderModule {
    compile_glsl(
        device,
        "fullscreen triangle vertex",
        VERTEX_SHADER_GLSL,
        ShaderStage::Vertex,
    )
}

pub(crate) fn compile_lens_shader(device: &wgpu::Device) -> wgpu::ShaderModule {
    compile_glsl(
        device,
        "lens fragment",
        LENS_FRAGMENT_GLSL,
        ShaderStage::Fragment,
    )
}

pub(crate) fn compile_blit_shader(device: &wgpu::Device) -> wgpu::ShaderModule {
    compile_glsl(
        device,
        "scaled blit fragment",
        BLIT_FRAGMENT_GLSL,
        ShaderStage::Fragment,
    )
}

/// Minimal full-screen triangle vertex shader. `v_uv` has a bottom-left origin.
pub const VERTEX_SHADER_GLSL: &str = r"#version 450
layout(location = 0) out vec2 v_uv;

const vec2 positions[3] = vec2[3](
    vec2(-1.0, -3.0),
    vec2(3.0, 1.0),
    vec2(-1.0, 1.0)
);

void main() {
    uint vertex_index = uint(gl_VertexIndex);
    vec2 pos = positions[vertex_index];
    v_uv = pos * 0.5 + vec2(0.5, 0.5);
    gl_Position = vec4(pos, 0.0, 1.0);
}
";

/// Lens distortion and chromatic aberration.
///
/// The uniform block layout must match `LensUniforms` in `gpu/uniforms.rs`,
/// and the math must match `lens::evaluate`.
pub const LENS_FRAGMENT_GLSL: &str = r"#version 450
layout(location = 0) in vec2 v_uv;
layout(location = 0) out vec4 outColor;

layout(std140, set = 0, binding = 0) uniform LensParams {
    vec2 mouse;
    vec2 resolution;
    float time;
    float lens_size;
    float bulge;
    float aberration_strength;
} params;

layout(set = 1, binding = 0) uniform texture2D lens_texture;
layout(set = 1, binding = 1) uniform sampler lens_sampler;

vec2 normalize_or_zero(vec2 v) {
    float len = length(v);
    if (len > 0.0) {
        return v / len;
    }
    return vec2(0.0);
}

void main() {
    vec2 uv = v_uv;
    vec2 mouse = params.mouse;

    float aspect = params.resolution.x / params.resolution.y;
    vec2 uv_corrected = vec2(uv.x * aspect, uv.y);
    vec2 mouse_corrected = vec2(mouse.x * aspect, mouse.y);

    float dist = distance(uv_corrected, mouse_corrected);
    float lens_mask = 1.0 - smoothstep(params.lens_size * 0.8, params.lens_size, dist);

    vec2 distorted_uv = uv;
    if (dist < params.lens_size) {
        float displacement = pow(dist / params.lens_size, params.bulge);
        vec2 direction = normalize_or_zero(uv - mouse);
        distorted_uv = mouse + direction * dist * (1.0 - params.bulge * 0.5);
    }

    float aberration = lens_mask * params.aberration_strength * (dist / params.lens_size);

    float r = texture(sampler2D(lens_texture, lens_sampler), distorted_uv + vec2(aberration, 0.0)).r;
    float g = texture(sampler2D(lens_texture, lens_sampler), distorted_uv).g;
    float b = texture(sampler2D(lens_texture, lens_sampler), distorted_uv - vec2(aberration, 0.0)).b;

    outColor = vec4(r, g, b, 1.0);
}
";

/// Stretches the capped-resolution target over the whole swapchain.
pub const BLIT_FRAGMENT_GLSL: &str = r"#version 450
layout(location = 0) in vec2 v_uv;
layout(location = 0) out vec4 outColor;

layout(set = 0, binding = 0) uniform texture2D scaled_texture;
layout(set = 0, binding = 1) uniform sampler scaled_sampler;

void main() {
    // render targets store row 0 at the top edge
    vec2 uv = vec2(v_uv.x, 1.0 - v_uv.y);
    outColor = texture(sampler2D(scaled_texture, scaled_sampler), uv);
}
";
