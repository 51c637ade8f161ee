use std::borrow::Cow;
use std::num::NonZeroU64;
use std::path::Path;

use anyhow::{Context, Result};

use super::textures::PATTERN_FORMAT;
use super::uniforms::SHADER_PARAMS_SIZE;

/// Loads a shader module by base name from the shaders root.
///
/// Precompiled `<stem>.spv` binaries win over `<stem>.wgsl` sources so the
/// same tree works with either a SPIR-V build step or plain WGSL.
pub(crate) fn load_shader_module(
    device: &wgpu::Device,
    shaders_root: &Path,
    stem: &str,
) -> Result<wgpu::ShaderModule> {
    let spirv_path = shaders_root.join(format!("{stem}.spv"));
    if spirv_path.is_file() {
        let bytes = std::fs::read(&spirv_path)
            .with_context(|| format!("failed to read shader binary at {}", spirv_path.display()))?;
        return Ok(device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some(stem),
            source: wgpu::util::make_spirv(&bytes),
        }));
    }

    let wgsl_path = shaders_root.join(format!("{stem}.wgsl"));
    if wgsl_path.is_file() {
        let source = std::fs::read_to_string(&wgsl_path)
            .with_context(|| format!("failed to read shader source at {}", wgsl_path.display()))?;
        return Ok(device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some(stem),
            source: wgpu::ShaderSource::Wgsl(Cow::Owned(source)),
        }));
    }

    anyhow::bail!(
        "shader '{stem}' not found under {} (looked for {stem}.spv and {stem}.wgsl)",
        shaders_root.display()
    );
}

/// The demo's two pipelines plus the layouts their bind groups are built on.
///
/// Created once at startup from the shader pair named by the config; never
/// recreated. `min_binding_size` on the uniform entries makes wgpu reject a
/// mismatched `ShaderParams` layout at pipeline creation instead of at draw
/// time.
pub(crate) struct Pipelines {
    pub compute: wgpu::ComputePipeline,
    pub render: wgpu::RenderPipeline,
    pub compute_layout: wgpu::BindGroupLayout,
    pub uniform_layout: wgpu::BindGroupLayout,
    pub texture_layout: wgpu::BindGroupLayout,
}

impl Pipelines {
    pub(crate) fn new(
        device: &wgpu::Device,
        shaders_root: &Path,
        shader_name: &str,
        surface_format: wgpu::TextureFormat,
    ) -> Result<Self> {
        let params_size = NonZeroU64::new(SHADER_PARAMS_SIZE);

        let compute_module = load_shader_module(device, shaders_root, &format!("{shader_name}.comp"))
            .context("failed to load compute shader")?;
        let draw_module = load_shader_module(device, shaders_root, shader_name)
            .context("failed to load draw shader")?;

        let compute_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("pattern compute layout"),
            entries: &[
                wgpu::BindGroupLayoutEntry {
                    binding: 0,
                    visibility: wgpu::ShaderStages::COMPUTE,
                    ty: wgpu::BindingType::StorageTexture {
                        access: wgpu::StorageTextureAccess::WriteOnly,
                        format: PATTERN_FORMAT,
                        view_dimension: wgpu::TextureViewDimension::D2,
                    },
                    count: None,
                },
                wgpu::BindGroupLayoutEntry {
                    binding: 1,
                    visibility: wgpu::ShaderStages::COMPUTE,
                    ty: wgpu::BindingType::Buffer {
                        ty: wgpu::BufferBindingType::Uniform,
                        has_dynamic_offset: false,
                        min_binding_size: params_size,
                    },
                    count: None,
                },
            ],
        });

        let uniform_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("params layout"),
            entries: &[wgpu::BindGroupLayoutEntry {
                binding: 0,
                visibility: wgpu::ShaderStages::VERTEX_FRAGMENT,
                ty: wgpu::BindingType::Buffer {
                    ty: wgpu::BufferBindingType::Uniform,
                    has_dynamic_offset: false,
                    min_binding_size: params_size,
                },
                count: None,
            }],
        });

        // Binding order mirrors the draw shader: pattern image + sampler,
        // then the static texture + sampler.
        let texture_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("sampled images layout"),
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
                wgpu::BindGroupLayoutEntry {
                    binding: 2,
                    visibility: wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Texture {
                        sample_type: wgpu::TextureSampleType::Float { filterable: true },
                        view_dimension: wgpu::TextureViewDimension::D2,
                        multisampled: false,
                    },
                    count: None,
                },
                wgpu::BindGroupLayoutEntry {
                    binding: 3,
                    visibility: wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Sampler(wgpu::SamplerBindingType::Filtering),
                    count: None,
                },
            ],
        });

        let compute_pipeline_layout =
            device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
                label: Some("pattern compute pipeline layout"),
                bind_group_layouts: &[&compute_layout],
                push_constant_ranges: &[],
            });
        let compute = device.create_compute_pipeline(&wgpu::ComputePipelineDescriptor {
            label: Some("pattern compute pipeline"),
            layout: Some(&compute_pipeline_layout),
            module: &compute_module,
            entry_point: Some("cs_main"),
            compilation_options: wgpu::PipelineCompilationOptions::default(),
            cache: None,
        });

        let render_pipeline_layout =
            device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
                label: Some("toy pipeline layout"),
                bind_group_layouts: &[&uniform_layout, &texture_layout],
                push_constant_ranges: &[],
            });
        let render = device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
            label: Some("toy pipeline"),
            layout: Some(&render_pipeline_layout),
            vertex: wgpu::VertexState {
                module: &draw_module,
                entry_point: Some("vs_main"),
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
            multisample: wgpu::MultisampleState {
                count: 1,
                mask: !0,
                alpha_to_coverage_enabled: false,
            },
            fragment: Some(wgpu::FragmentState {
                module: &draw_module,
                entry_point: Some("fs_main"),
                targets: &[Some(wgpu::ColorTargetState {
                    format: surface_format,
                    blend: None,
                    write_mask: wgpu::ColorWrites::ALL,
                })],
                compilation_options: wgpu::PipelineCompilationOptions::default(),
            }),
            multiview: None,
            cache: None,
        });

        Ok(Self {
            compute,
            render,
            compute_layout,
            uniform_layout,
            texture_layout,
        })
    }
}
