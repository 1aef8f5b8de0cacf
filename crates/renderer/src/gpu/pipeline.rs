use crate::compile::{compile_blit_shader, compile_lens_shader, compile_vertex_shader};

fn texture_layout_entries() -> [wgpu::BindGroupLayoutEntry; 2] {
    [
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
    ]
}

pub(crate) struct PipelineLayouts {
    pub uniform_layout: wgpu::BindGroupLayout,
    /// Texture + sampler pair; used by both the lens and the blit pass.
    pub texture_layout: wgpu::BindGroupLayout,
    pub vertex_module: wgpu::ShaderModule,
}

impl PipelineLayouts {
    pub fn new(device: &wgpu::Device) -> Self {
        let uniform_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("lens uniform layout"),
            entries: &[wgpu::BindGroupLayoutEntry {
                binding: 0,
                visibility: wgpu::ShaderStages::FRAGMENT,
                ty: wgpu::BindingType::Buffer {
                    ty: wgpu::BufferBindingType::Uniform,
                    has_dynamic_offset: false,
                    min_binding_size: None,
                },
                count: None,
            }],
        });
        let texture_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("texture layout"),
            entries: &texture_layout_entries(),
        });

        Self {
            uniform_layout,
            texture_layout,
            vertex_module: compile_vertex_shader(device),
        }
    }
}

fn fullscreen_pipeline(
    device: &wgpu::Device,
    label: &str,
    layout: &wgpu::PipelineLayout,
    vertex_module: &wgpu::ShaderModule,
    fragment_module: &wgpu::ShaderModule,
    format: wgpu::TextureFormat,
) -> wgpu::RenderPipeline {
    device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
        label: Some(label),
        layout: Some(layout),
        vertex: wgpu::VertexState {
            module: vertex_module,
            entry_point: Some("main"),
            buffers: &[],
            compilation_options: wgpu::PipelineCompilationOptions::default(),
        },
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
        fragment: Some(wgpu::FragmentState {
            module: fragment_module,
            entry_point: Some("main"),
            targets: &[Some(wgpu::ColorTargetState {
                format,
                blend: Some(wgpu::BlendState::REPLACE),
                write_mask: wgpu::ColorWrites::ALL,
            })],
            compilation_options: wgpu::PipelineCompilationOptions::default(),
        }),
        multiview: None,
        cache: None,
    })
}

/// Samples the background through the lens; bind group 0 holds the uniforms,
/// group 1 the texture.
pub(crate) fn create_lens_pipeline(
    device: &wgpu::Device,
    layouts: &PipelineLayouts,
    format: wgpu::TextureFormat,
) -> wgpu::RenderPipeline {
    let fragment_module = compile_lens_shader(device);
    let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
        label: Some("lens pipeline layout"),
        bind_group_layouts: &[&layouts.uniform_layout, &layouts.texture_layout],
        push_constant_ranges: &[],
    });
    fullscreen_pipeline(
        device,
        "lens pipeline",
        &pipeline_layout,
        &layouts.vertex_module,
        &fragment_module,
        format,
    )
}

/// Copies the scaled target onto the swapchain; bind group 0 is the target.
pub(crate) fn create_blit_pipeline(
    device: &wgpu::Device,
    layouts: &PipelineLayouts,
    format: wgpu::TextureFormat,
) -> wgpu::RenderPipeline {
    let fragment_module = compile_blit_shader(device);
    let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
        label: Some("blit pipeline layout"),
        bind_group_layouts: &[&layouts.texture_layout],
        push_constant_ranges: &[],
    });
    fullscreen_pipeline(
        device,
        "blit pipeline",
        &pipeline_layout,
        &layouts.vertex_module,
        &fragment_module,
        format,
    )
}
