use wgpu::util::DeviceExt;

use crate::frame::{FrameCommand, RecordedFrame};

use super::vertex::{TRIANGLE_VERTICES, Vertex};

/// The one pipeline configuration plus the static vertex buffer.
///
/// Built once at startup and bound unchanged every frame: passthrough
/// vertex stage consuming a single 3-float position attribute, solid-fill
/// rasterization with back-face culling, opaque color target, no
/// depth/stencil, and an empty binding layout — the pipeline touches no
/// resources beyond the vertex stream.
pub struct TriangleRenderer {
    pipeline: wgpu::RenderPipeline,
    vertex_buffer: wgpu::Buffer,
}

impl TriangleRenderer {
    pub fn new(device: &wgpu::Device, surface_format: wgpu::TextureFormat) -> Self {
        let shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("lumen triangle shader"),
            source: wgpu::ShaderSource::Wgsl(include_str!("shaders/triangle.wgsl").into()),
        });

        // No bind groups: the shaders read nothing but the vertex stream.
        let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("lumen triangle pipeline layout"),
            bind_group_layouts: &[],
            immediate_size: 0,
        });

        let pipeline = device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
            label: Some("lumen triangle pipeline"),
            layout: Some(&pipeline_layout),

            vertex: wgpu::VertexState {
                module: &shader,
                entry_point: Some("vs_main"),
                compilation_options: Default::default(),
                buffers: &[Vertex::layout()],
            },

            fragment: Some(wgpu::FragmentState {
                module: &shader,
                entry_point: Some("fs_main"),
                compilation_options: Default::default(),
                targets: &[Some(wgpu::ColorTargetState {
                    format: surface_format,
                    // Opaque output; blending stays disabled.
                    blend: None,
                    write_mask: wgpu::ColorWrites::ALL,
                })],
            }),

            primitive: wgpu::PrimitiveState {
                topology: wgpu::PrimitiveTopology::TriangleList,
                strip_index_format: None,
                // The static triangle is wound clockwise.
                front_face: wgpu::FrontFace::Cw,
                cull_mode: Some(wgpu::Face::Back),
                polygon_mode: wgpu::PolygonMode::Fill,
                unclipped_depth: false,
                conservative: false,
            },

            depth_stencil: None,
            multisample: wgpu::MultisampleState::default(),

            multiview_mask: None,
            cache: None,
        });

        let vertex_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("lumen triangle vbo"),
            contents: bytemuck::cast_slice(&TRIANGLE_VERTICES),
            usage: wgpu::BufferUsages::VERTEX,
        });

        log::info!("triangle pipeline built (format {surface_format:?})");

        Self {
            pipeline,
            vertex_buffer,
        }
    }

    /// Replays a closed command stream onto `encoder`, rendering into
    /// `view`.
    ///
    /// `Transition` entries carry no wgpu work: the tags are validated
    /// when the stream is recorded, and wgpu inserts the matching barriers
    /// itself when the pass begins and ends.
    pub fn execute(
        &self,
        frame: &RecordedFrame,
        encoder: &mut wgpu::CommandEncoder,
        view: &wgpu::TextureView,
    ) {
        let mut pass: Option<wgpu::RenderPass<'static>> = None;

        for cmd in frame.commands() {
            match *cmd {
                FrameCommand::Transition { .. } => {}

                FrameCommand::BeginPass { clear, .. } => {
                    let rpass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                        label: Some("lumen triangle pass"),
                        color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                            view,
                            resolve_target: None,
                            ops: wgpu::Operations {
                                load: wgpu::LoadOp::Clear(wgpu::Color {
                                    r: clear[0],
                                    g: clear[1],
                                    b: clear[2],
                                    a: clear[3],
                                }),
                                store: wgpu::StoreOp::Store,
                            },
                            depth_slice: None,
                        })],
                        depth_stencil_attachment: None,
                        timestamp_writes: None,
                        occlusion_query_set: None,
                        multiview_mask: None,
                    });
                    pass = Some(rpass.forget_lifetime());
                }

                FrameCommand::BindPipeline => {
                    if let Some(p) = pass.as_mut() {
                        p.set_pipeline(&self.pipeline);
                    }
                }

                FrameCommand::SetViewport { width, height } => {
                    if let Some(p) = pass.as_mut() {
                        p.set_viewport(0.0, 0.0, width, height, 0.0, 1.0);
                    }
                }

                FrameCommand::SetScissor { width, height } => {
                    if let Some(p) = pass.as_mut() {
                        p.set_scissor_rect(0, 0, width, height);
                    }
                }

                FrameCommand::BindVertexBuffer => {
                    if let Some(p) = pass.as_mut() {
                        p.set_vertex_buffer(0, self.vertex_buffer.slice(..));
                    }
                }

                FrameCommand::Draw {
                    vertex_count,
                    instance_count,
                } => {
                    if let Some(p) = pass.as_mut() {
                        p.draw(0..vertex_count, 0..instance_count);
                    }
                }

                FrameCommand::EndPass => {
                    pass = None;
                }
            }
        }
    }
}
