use crate::device::GpuContext;
use crate::shaders::POINT_CLOUD_SHADER;
use bytemuck::{Pod, Zeroable};
use caddy_core::{Error, Result, VertexBuffer};
use nalgebra::Matrix4;
use std::sync::Arc;
use winit::window::Window;

const DEPTH_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Depth32Float;

const QUAD_ATTRIBUTES: [wgpu::VertexAttribute; 1] = wgpu::vertex_attr_array![0 => Float32x2];
const INSTANCE_ATTRIBUTES: [wgpu::VertexAttribute; 1] = wgpu::vertex_attr_array![1 => Float32x3];
const LINE_ATTRIBUTES: [wgpu::VertexAttribute; 2] =
    wgpu::vertex_attr_array![0 => Float32x3, 1 => Float32x3];

/// Maps OpenGL clip depth `[-1, 1]` onto wgpu's `[0, 1]`
#[rustfmt::skip]
pub fn opengl_to_wgpu_matrix() -> Matrix4<f32> {
    Matrix4::new(
        1.0, 0.0, 0.0, 0.0,
        0.0, 1.0, 0.0, 0.0,
        0.0, 0.0, 0.5, 0.5,
        0.0, 0.0, 0.0, 1.0,
    )
}

/// Corner of the quad every point is expanded into
#[repr(C)]
#[derive(Copy, Clone, Debug, Pod, Zeroable)]
pub struct QuadVertex {
    pub corner: [f32; 2],
}

const QUAD: [QuadVertex; 4] = [
    QuadVertex { corner: [-1.0, -1.0] },
    QuadVertex { corner: [1.0, -1.0] },
    QuadVertex { corner: [-1.0, 1.0] },
    QuadVertex { corner: [1.0, 1.0] },
];

/// Vertex data for line rendering
#[repr(C)]
#[derive(Copy, Clone, Debug, PartialEq, Pod, Zeroable)]
pub struct LineVertex {
    pub position: [f32; 3],
    pub color: [f32; 3],
}

/// Per-frame uniform data, laid out to match `Frame` in the shader
#[repr(C)]
#[derive(Copy, Clone, Debug, Pod, Zeroable)]
pub struct FrameUniform {
    pub view: [[f32; 4]; 4],
    pub proj: [[f32; 4]; 4],
    pub color: [f32; 4],
    pub viewport: [f32; 2],
    pub point_size: f32,
    pub size_attenuation: f32,
}

impl FrameUniform {
    fn identity() -> Self {
        Self {
            view: Matrix4::identity().into(),
            proj: Matrix4::identity().into(),
            color: [1.0, 1.0, 1.0, 1.0],
            viewport: [1.0, 1.0],
            point_size: 1.0,
            size_attenuation: 0.0,
        }
    }
}

/// Point appearance for the next frame
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PointParams {
    pub size: f32,
    pub color: [f32; 3],
    pub size_attenuation: bool,
}

/// Rendering configuration
#[derive(Debug, Clone)]
pub struct RenderConfig {
    pub background_color: [f64; 4],
    pub enable_depth_test: bool,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            background_color: [0.1, 0.1, 0.1, 1.0],
            enable_depth_test: true,
        }
    }
}

struct GpuBuffer {
    buffer: wgpu::Buffer,
    count: u32,
}

/// Draws one point cloud and an optional set of lines into a window
pub struct PointCloudRenderer {
    gpu: GpuContext,
    surface: wgpu::Surface<'static>,
    surface_config: wgpu::SurfaceConfiguration,
    point_pipeline: wgpu::RenderPipeline,
    line_pipeline: wgpu::RenderPipeline,
    frame_uniform: FrameUniform,
    frame_buffer: wgpu::Buffer,
    frame_bind_group: wgpu::BindGroup,
    quad_buffer: wgpu::Buffer,
    depth_view: Option<wgpu::TextureView>,
    points: Option<GpuBuffer>,
    lines: Option<GpuBuffer>,
    config: RenderConfig,
}

impl PointCloudRenderer {
    /// Create a renderer presenting into `window`
    pub async fn new(window: Arc<Window>, config: RenderConfig) -> Result<Self> {
        let size = window.inner_size();
        let (gpu, surface) = GpuContext::for_window(window).await?;

        let surface_caps = surface.get_capabilities(&gpu.adapter);
        // Colors are already sRGB-encoded, so prefer a format that stores
        // them as given.
        let surface_format = surface_caps
            .formats
            .iter()
            .copied()
            .find(|f| !f.is_srgb())
            .or_else(|| surface_caps.formats.first().copied())
            .ok_or_else(|| Error::Gpu("Surface reports no supported formats".to_string()))?;

        let surface_config = wgpu::SurfaceConfiguration {
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            format: surface_format,
            width: size.width.max(1),
            height: size.height.max(1),
            present_mode: wgpu::PresentMode::AutoVsync,
            alpha_mode: surface_caps
                .alpha_modes
                .first()
                .copied()
                .unwrap_or(wgpu::CompositeAlphaMode::Auto),
            view_formats: vec![],
            desired_maximum_frame_latency: 2,
        };
        surface.configure(&gpu.device, &surface_config);

        let frame_uniform = FrameUniform::identity();
        let frame_buffer = gpu.create_buffer_init(
            "Frame Uniform Buffer",
            &[frame_uniform],
            wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
        );

        let frame_bind_group_layout =
            gpu.device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
                entries: &[wgpu::BindGroupLayoutEntry {
                    binding: 0,
                    visibility: wgpu::ShaderStages::VERTEX | wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Buffer {
                        ty: wgpu::BufferBindingType::Uniform,
                        has_dynamic_offset: false,
                        min_binding_size: None,
                    },
                    count: None,
                }],
                label: Some("frame_bind_group_layout"),
            });

        let frame_bind_group = gpu.device.create_bind_group(&wgpu::BindGroupDescriptor {
            layout: &frame_bind_group_layout,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: frame_buffer.as_entire_binding(),
            }],
            label: Some("frame_bind_group"),
        });

        let shader = gpu.create_shader_module("Point Cloud Shader", POINT_CLOUD_SHADER);

        let layout = gpu.device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("Point Cloud Pipeline Layout"),
            bind_group_layouts: &[&frame_bind_group_layout],
            push_constant_ranges: &[],
        });

        let point_buffers = [
            wgpu::VertexBufferLayout {
                array_stride: std::mem::size_of::<QuadVertex>() as wgpu::BufferAddress,
                step_mode: wgpu::VertexStepMode::Vertex,
                attributes: &QUAD_ATTRIBUTES,
            },
            wgpu::VertexBufferLayout {
                array_stride: (VertexBuffer::STRIDE * std::mem::size_of::<f32>())
                    as wgpu::BufferAddress,
                step_mode: wgpu::VertexStepMode::Instance,
                attributes: &INSTANCE_ATTRIBUTES,
            },
        ];
        let line_buffers = [wgpu::VertexBufferLayout {
            array_stride: std::mem::size_of::<LineVertex>() as wgpu::BufferAddress,
            step_mode: wgpu::VertexStepMode::Vertex,
            attributes: &LINE_ATTRIBUTES,
        }];

        let targets = PipelineTargets {
            color: surface_config.format,
            depth: config.enable_depth_test,
        };
        let point_pipeline = create_pipeline(
            &gpu.device,
            &layout,
            &shader,
            ("vs_point", "fs_point"),
            &point_buffers,
            wgpu::PrimitiveTopology::TriangleStrip,
            targets,
        );
        let line_pipeline = create_pipeline(
            &gpu.device,
            &layout,
            &shader,
            ("vs_line", "fs_line"),
            &line_buffers,
            wgpu::PrimitiveTopology::LineList,
            targets,
        );

        let quad_buffer =
            gpu.create_buffer_init("Point Quad Buffer", &QUAD, wgpu::BufferUsages::VERTEX);
        let depth_view = config
            .enable_depth_test
            .then(|| create_depth_view(&gpu.device, &surface_config));

        Ok(Self {
            gpu,
            surface,
            surface_config,
            point_pipeline,
            line_pipeline,
            frame_uniform,
            frame_buffer,
            frame_bind_group,
            quad_buffer,
            depth_view,
            points: None,
            lines: None,
            config,
        })
    }

    /// Resize renderer surface
    pub fn resize(&mut self, width: u32, height: u32) {
        if width > 0 && height > 0 {
            self.surface_config.width = width;
            self.surface_config.height = height;
            self.surface.configure(&self.gpu.device, &self.surface_config);
            if self.config.enable_depth_test {
                self.depth_view = Some(create_depth_view(&self.gpu.device, &self.surface_config));
            }
        }
    }

    /// Set camera matrices and point appearance for the next frame.
    ///
    /// `proj` uses OpenGL depth conventions and is remapped here.
    pub fn update_frame(&mut self, view: Matrix4<f32>, proj: Matrix4<f32>, points: PointParams) {
        let [r, g, b] = points.color;
        self.frame_uniform = FrameUniform {
            view: view.into(),
            proj: (opengl_to_wgpu_matrix() * proj).into(),
            color: [r, g, b, 1.0],
            viewport: [self.surface_config.width as f32, self.surface_config.height as f32],
            point_size: points.size,
            size_attenuation: if points.size_attenuation { 1.0 } else { 0.0 },
        };
    }

    /// Upload point positions, replacing any previous upload
    pub fn set_points(&mut self, buffer: &VertexBuffer) -> Result<()> {
        let count = u32::try_from(buffer.point_count()).map_err(|_| {
            Error::Gpu(format!("{} points exceed the instance limit", buffer.point_count()))
        })?;
        self.points = Some(GpuBuffer {
            buffer: self.gpu.create_buffer_from_bytes(
                "Point Cloud Instance Buffer",
                buffer.as_bytes(),
                wgpu::BufferUsages::VERTEX,
            ),
            count,
        });
        Ok(())
    }

    /// Drop the uploaded points
    pub fn clear_points(&mut self) {
        if let Some(points) = self.points.take() {
            points.buffer.destroy();
        }
    }

    /// Upload line segments (pairs of vertices), replacing any previous upload
    pub fn set_lines(&mut self, vertices: &[LineVertex]) {
        self.clear_lines();
        if vertices.is_empty() {
            return;
        }
        self.lines = Some(GpuBuffer {
            buffer: self
                .gpu
                .create_buffer_init("Line Vertex Buffer", vertices, wgpu::BufferUsages::VERTEX),
            count: vertices.len() as u32,
        });
    }

    /// Drop the uploaded lines
    pub fn clear_lines(&mut self) {
        if let Some(lines) = self.lines.take() {
            lines.buffer.destroy();
        }
    }

    /// Render and present one frame
    pub fn render(&mut self) -> Result<()> {
        let output = match self.surface.get_current_texture() {
            Ok(output) => output,
            Err(wgpu::SurfaceError::Lost | wgpu::SurfaceError::Outdated) => {
                // Skip this frame; the next one uses the reconfigured surface.
                self.surface.configure(&self.gpu.device, &self.surface_config);
                return Ok(());
            }
            Err(e) => return Err(Error::Gpu(format!("Failed to get surface texture: {:?}", e))),
        };

        self.gpu
            .queue
            .write_buffer(&self.frame_buffer, 0, bytemuck::bytes_of(&self.frame_uniform));

        let view = output.texture.create_view(&wgpu::TextureViewDescriptor::default());

        let mut encoder = self.gpu.device.create_command_encoder(&wgpu::CommandEncoderDescriptor {
            label: Some("Point Cloud Render Encoder"),
        });

        {
            let [r, g, b, a] = self.config.background_color;
            let mut render_pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("Point Cloud Render Pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: &view,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(wgpu::Color { r, g, b, a }),
                        store: wgpu::StoreOp::Store,
                    },
                })],
                depth_stencil_attachment: self.depth_view.as_ref().map(|depth_view| {
                    wgpu::RenderPassDepthStencilAttachment {
                        view: depth_view,
                        depth_ops: Some(wgpu::Operations {
                            load: wgpu::LoadOp::Clear(1.0),
                            store: wgpu::StoreOp::Store,
                        }),
                        stencil_ops: None,
                    }
                }),
                timestamp_writes: None,
                occlusion_query_set: None,
            });

            render_pass.set_bind_group(0, &self.frame_bind_group, &[]);

            if let Some(lines) = &self.lines {
                render_pass.set_pipeline(&self.line_pipeline);
                render_pass.set_vertex_buffer(0, lines.buffer.slice(..));
                render_pass.draw(0..lines.count, 0..1);
            }

            if let Some(points) = &self.points {
                render_pass.set_pipeline(&self.point_pipeline);
                render_pass.set_vertex_buffer(0, self.quad_buffer.slice(..));
                render_pass.set_vertex_buffer(1, points.buffer.slice(..));
                render_pass.draw(0..QUAD.len() as u32, 0..points.count);
            }
        }

        self.gpu.queue.submit(std::iter::once(encoder.finish()));
        output.present();

        Ok(())
    }
}

#[derive(Clone, Copy)]
struct PipelineTargets {
    color: wgpu::TextureFormat,
    depth: bool,
}

fn create_pipeline(
    device: &wgpu::Device,
    layout: &wgpu::PipelineLayout,
    shader: &wgpu::ShaderModule,
    (vertex_entry, fragment_entry): (&str, &str),
    buffers: &[wgpu::VertexBufferLayout<'_>],
    topology: wgpu::PrimitiveTopology,
    targets: PipelineTargets,
) -> wgpu::RenderPipeline {
    device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
        label: Some(vertex_entry),
        layout: Some(layout),
        vertex: wgpu::VertexState {
            module: shader,
            entry_point: vertex_entry,
            buffers,
            compilation_options: wgpu::PipelineCompilationOptions::default(),
        },
        fragment: Some(wgpu::FragmentState {
            module: shader,
            entry_point: fragment_entry,
            targets: &[Some(wgpu::ColorTargetState {
                format: targets.color,
                blend: Some(wgpu::BlendState::REPLACE),
                write_mask: wgpu::ColorWrites::ALL,
            })],
            compilation_options: wgpu::PipelineCompilationOptions::default(),
        }),
        primitive: wgpu::PrimitiveState {
            topology,
            strip_index_format: None,
            front_face: wgpu::FrontFace::Ccw,
            cull_mode: None,
            unclipped_depth: false,
            polygon_mode: wgpu::PolygonMode::Fill,
            conservative: false,
        },
        depth_stencil: targets.depth.then(|| wgpu::DepthStencilState {
            format: DEPTH_FORMAT,
            depth_write_enabled: true,
            depth_compare: wgpu::CompareFunction::Less,
            stencil: wgpu::StencilState::default(),
            bias: wgpu::DepthBiasState::default(),
        }),
        multisample: wgpu::MultisampleState {
            count: 1,
            mask: !0,
            alpha_to_coverage_enabled: false,
        },
        multiview: None,
    })
}

fn create_depth_view(
    device: &wgpu::Device,
    surface_config: &wgpu::SurfaceConfiguration,
) -> wgpu::TextureView {
    let texture = device.create_texture(&wgpu::TextureDescriptor {
        label: Some("Depth Texture"),
        size: wgpu::Extent3d {
            width: surface_config.width,
            height: surface_config.height,
            depth_or_array_layers: 1,
        },
        mip_level_count: 1,
        sample_count: 1,
        dimension: wgpu::TextureDimension::D2,
        format: DEPTH_FORMAT,
        usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
        view_formats: &[],
    });
    texture.create_view(&wgpu::TextureViewDescriptor::default())
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use nalgebra::{Perspective3, Point3};

    #[test]
    fn test_frame_uniform_matches_shader_layout() {
        // Frame: two mat4x4, vec4, vec2, f32, f32
        assert_eq!(std::mem::size_of::<FrameUniform>(), 160);
        assert_eq!(std::mem::size_of::<FrameUniform>() % 16, 0);
    }

    #[test]
    fn test_line_vertex_stride() {
        assert_eq!(std::mem::size_of::<LineVertex>(), 24);
    }

    #[test]
    fn test_depth_remap_to_zero_one() {
        let proj = opengl_to_wgpu_matrix() * Perspective3::new(1.0, 1.0, 0.1, 100.0).into_inner();

        let near = proj.transform_point(&Point3::new(0.0, 0.0, -0.1));
        let far = proj.transform_point(&Point3::new(0.0, 0.0, -100.0));

        assert_relative_eq!(near.z, 0.0, epsilon = 1e-5);
        assert_relative_eq!(far.z, 1.0, epsilon = 1e-5);
    }
}
