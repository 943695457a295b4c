use crate::camera::Projection;
use crate::geometry::{self, LineVertex, MeshVertex};
use crate::shaders;
use actorloop_assets::{AssetStore, MeshId};
use actorloop_common::Color;
use actorloop_render::{DrawCommand, DrawList};
use bytemuck::{Pod, Zeroable};
use glam::Mat4;
use std::collections::{BTreeMap, HashMap};
use wgpu::util::DeviceExt;

#[repr(C)]
#[derive(Copy, Clone, Pod, Zeroable)]
struct Uniforms {
    view_proj: [[f32; 4]; 4],
}

#[repr(C)]
#[derive(Copy, Clone, Pod, Zeroable)]
struct InstanceData {
    offset: [f32; 3],
    color: [f32; 4],
}

/// Geometry uploaded once per distinct mesh.
struct GpuMesh {
    vertex_buffer: wgpu::Buffer,
    vertex_count: u32,
}

/// What one [`WgpuRenderer::render`] call drew.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RenderStats {
    pub instances: u32,
    /// Distinct meshes drawn, one instanced call each.
    pub batches: u32,
    pub line_vertices: u32,
    /// Mesh draws whose asset was no longer loaded.
    pub skipped: u32,
}

const GRID_HALF_EXTENT: i32 = 10;
const INITIAL_INSTANCES: u64 = 256;
const INITIAL_LINE_VERTICES: u64 = 4096;

/// wgpu renderer for recorded frames: grid floor, instanced meshes and
/// wireframe debug primitives.
pub struct WgpuRenderer {
    mesh_pipeline: wgpu::RenderPipeline,
    line_pipeline: wgpu::RenderPipeline,
    uniform_buffer: wgpu::Buffer,
    uniform_bind_group: wgpu::BindGroup,
    grid_vertex_buffer: wgpu::Buffer,
    grid_vertex_count: u32,
    instance_buffer: wgpu::Buffer,
    instance_capacity: u64,
    line_buffer: wgpu::Buffer,
    line_capacity: u64,
    meshes: HashMap<MeshId, GpuMesh>,
    depth_texture: wgpu::TextureView,
    surface_format: wgpu::TextureFormat,
    projection: Projection,
}

impl WgpuRenderer {
    pub fn new(
        device: &wgpu::Device,
        surface_format: wgpu::TextureFormat,
        width: u32,
        height: u32,
    ) -> Self {
        let uniform_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("uniform_buffer"),
            contents: bytemuck::bytes_of(&Uniforms {
                view_proj: Mat4::IDENTITY.to_cols_array_2d(),
            }),
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
        });

        let bind_group_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("uniform_bind_group_layout"),
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

        let uniform_bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("uniform_bind_group"),
            layout: &bind_group_layout,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: uniform_buffer.as_entire_binding(),
            }],
        });

        let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("pipeline_layout"),
            bind_group_layouts: &[&bind_group_layout],
            push_constant_ranges: &[],
        });

        let depth_stencil = wgpu::DepthStencilState {
            format: wgpu::TextureFormat::Depth32Float,
            depth_write_enabled: true,
            depth_compare: wgpu::CompareFunction::LessEqual,
            stencil: Default::default(),
            bias: Default::default(),
        };
        let color_target = [Some(wgpu::ColorTargetState {
            format: surface_format,
            blend: Some(wgpu::BlendState::REPLACE),
            write_mask: wgpu::ColorWrites::ALL,
        })];

        let mesh_shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("mesh_shader"),
            source: wgpu::ShaderSource::Wgsl(shaders::MESH_SHADER.into()),
        });

        let mesh_pipeline = device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
            label: Some("mesh_pipeline"),
            layout: Some(&pipeline_layout),
            vertex: wgpu::VertexState {
                module: &mesh_shader,
                entry_point: Some("vs_main"),
                compilation_options: Default::default(),
                buffers: &[
                    wgpu::VertexBufferLayout {
                        array_stride: std::mem::size_of::<MeshVertex>() as u64,
                        step_mode: wgpu::VertexStepMode::Vertex,
                        attributes: &wgpu::vertex_attr_array![
                            0 => Float32x3,
                            1 => Float32x3,
                        ],
                    },
                    wgpu::VertexBufferLayout {
                        array_stride: std::mem::size_of::<InstanceData>() as u64,
                        step_mode: wgpu::VertexStepMode::Instance,
                        attributes: &wgpu::vertex_attr_array![
                            2 => Float32x3,
                            3 => Float32x4,
                        ],
                    },
                ],
            },
            fragment: Some(wgpu::FragmentState {
                module: &mesh_shader,
                entry_point: Some("fs_main"),
                compilation_options: Default::default(),
                targets: &color_target,
            }),
            primitive: wgpu::PrimitiveState {
                topology: wgpu::PrimitiveTopology::TriangleList,
                // OBJ winding is not guaranteed.
                cull_mode: None,
                ..Default::default()
            },
            depth_stencil: Some(depth_stencil.clone()),
            multisample: Default::default(),
            multiview: None,
            cache: None,
        });

        let line_shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("line_shader"),
            source: wgpu::ShaderSource::Wgsl(shaders::LINE_SHADER.into()),
        });

        let line_pipeline = device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
            label: Some("line_pipeline"),
            layout: Some(&pipeline_layout),
            vertex: wgpu::VertexState {
                module: &line_shader,
                entry_point: Some("vs_line"),
                compilation_options: Default::default(),
                buffers: &[wgpu::VertexBufferLayout {
                    array_stride: std::mem::size_of::<LineVertex>() as u64,
                    step_mode: wgpu::VertexStepMode::Vertex,
                    attributes: &wgpu::vertex_attr_array![
                        0 => Float32x3,
                        1 => Float32x4,
                    ],
                }],
            },
            fragment: Some(wgpu::FragmentState {
                module: &line_shader,
                entry_point: Some("fs_line"),
                compilation_options: Default::default(),
                targets: &color_target,
            }),
            primitive: wgpu::PrimitiveState {
                topology: wgpu::PrimitiveTopology::LineList,
                ..Default::default()
            },
            depth_stencil: Some(depth_stencil),
            multisample: Default::default(),
            multiview: None,
            cache: None,
        });

        let grid_verts = geometry::grid_lines(GRID_HALF_EXTENT, 1.0);
        let grid_vertex_count = grid_verts.len() as u32;
        let grid_vertex_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("grid_vertex_buffer"),
            contents: bytemuck::cast_slice(&grid_verts),
            usage: wgpu::BufferUsages::VERTEX,
        });

        let instance_buffer =
            Self::create_stream_buffer::<InstanceData>(device, "instance_buffer", INITIAL_INSTANCES);
        let line_buffer =
            Self::create_stream_buffer::<LineVertex>(device, "line_buffer", INITIAL_LINE_VERTICES);

        Self {
            mesh_pipeline,
            line_pipeline,
            uniform_buffer,
            uniform_bind_group,
            grid_vertex_buffer,
            grid_vertex_count,
            instance_buffer,
            instance_capacity: INITIAL_INSTANCES,
            line_buffer,
            line_capacity: INITIAL_LINE_VERTICES,
            meshes: HashMap::new(),
            depth_texture: Self::create_depth_texture(device, width, height),
            surface_format,
            projection: Projection::with_viewport(width, height),
        }
    }

    pub fn resize(&mut self, device: &wgpu::Device, width: u32, height: u32) {
        self.depth_texture = Self::create_depth_texture(device, width, height);
        self.projection = Projection::with_viewport(width, height);
    }

    pub fn surface_format(&self) -> wgpu::TextureFormat {
        self.surface_format
    }

    /// Number of meshes currently resident on the GPU.
    pub fn cached_meshes(&self) -> usize {
        self.meshes.len()
    }

    /// Draw one recorded frame: clear, grid floor, meshes, then wireframes.
    /// Text commands are left to the caller's UI layer.
    pub fn render(
        &mut self,
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        view: &wgpu::TextureView,
        assets: &AssetStore,
        frame: &DrawList,
    ) -> RenderStats {
        let mut stats = RenderStats::default();

        // Geometry whose last handle was unloaded is dropped here too.
        self.meshes.retain(|id, _| assets.mesh_by_id(*id).is_some());

        let camera = frame.camera().copied().unwrap_or_default();
        queue.write_buffer(
            &self.uniform_buffer,
            0,
            bytemuck::bytes_of(&Uniforms {
                view_proj: self.projection.view_projection(&camera).to_cols_array_2d(),
            }),
        );

        let mut batches: BTreeMap<MeshId, Vec<InstanceData>> = BTreeMap::new();
        for (asset, position, tint) in frame.meshes() {
            let Some(mesh_id) = assets.mesh_id(asset) else {
                tracing::warn!(?asset, "draw of unloaded asset skipped");
                stats.skipped += 1;
                continue;
            };
            if !self.meshes.contains_key(&mesh_id) {
                if let Some(mesh) = assets.mesh_by_id(mesh_id) {
                    self.upload_mesh(device, mesh_id, mesh);
                }
            }
            batches.entry(mesh_id).or_default().push(InstanceData {
                offset: position.to_array(),
                color: tint.to_array(),
            });
        }

        let mut lines = Vec::new();
        for command in frame.wires() {
            match command {
                DrawCommand::WireBox { bounds, tint } => {
                    geometry::wire_box_lines(bounds, *tint, &mut lines)
                }
                DrawCommand::WireSphere {
                    center,
                    radius,
                    tint,
                } => geometry::wire_sphere_lines(*center, *radius, *tint, &mut lines),
                _ => {}
            }
        }

        let instances: Vec<InstanceData> = batches.values().flatten().copied().collect();
        if !instances.is_empty() {
            self.ensure_instance_capacity(device, instances.len() as u64);
            queue.write_buffer(&self.instance_buffer, 0, bytemuck::cast_slice(&instances));
        }
        if !lines.is_empty() {
            self.ensure_line_capacity(device, lines.len() as u64);
            queue.write_buffer(&self.line_buffer, 0, bytemuck::cast_slice(&lines));
        }

        let mut encoder = device.create_command_encoder(&wgpu::CommandEncoderDescriptor {
            label: Some("render_encoder"),
        });

        {
            let mut pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("main_pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(clear_color(
                            frame.clear_color().unwrap_or(Color::RAYWHITE),
                        )),
                        store: wgpu::StoreOp::Store,
                    },
                })],
                depth_stencil_attachment: Some(wgpu::RenderPassDepthStencilAttachment {
                    view: &self.depth_texture,
                    depth_ops: Some(wgpu::Operations {
                        load: wgpu::LoadOp::Clear(1.0),
                        store: wgpu::StoreOp::Store,
                    }),
                    stencil_ops: None,
                }),
                ..Default::default()
            });

            pass.set_bind_group(0, &self.uniform_bind_group, &[]);

            pass.set_pipeline(&self.line_pipeline);
            pass.set_vertex_buffer(0, self.grid_vertex_buffer.slice(..));
            pass.draw(0..self.grid_vertex_count, 0..1);

            pass.set_pipeline(&self.mesh_pipeline);
            pass.set_vertex_buffer(1, self.instance_buffer.slice(..));
            let mut first = 0u32;
            for (mesh_id, batch) in &batches {
                let count = batch.len() as u32;
                if let Some(gpu) = self.meshes.get(mesh_id) {
                    pass.set_vertex_buffer(0, gpu.vertex_buffer.slice(..));
                    pass.draw(0..gpu.vertex_count, first..first + count);
                    stats.instances += count;
                    stats.batches += 1;
                }
                first += count;
            }

            if !lines.is_empty() {
                pass.set_pipeline(&self.line_pipeline);
                pass.set_vertex_buffer(0, self.line_buffer.slice(..));
                pass.draw(0..lines.len() as u32, 0..1);
                stats.line_vertices = lines.len() as u32;
            }
        }

        queue.submit(std::iter::once(encoder.finish()));
        stats
    }

    fn upload_mesh(&mut self, device: &wgpu::Device, id: MeshId, mesh: &actorloop_assets::Mesh) {
        let verts = geometry::flat_shaded(mesh);
        let vertex_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some(&format!("mesh_{}", mesh.name)),
            contents: bytemuck::cast_slice(&verts),
            usage: wgpu::BufferUsages::VERTEX,
        });
        tracing::debug!(name = %mesh.name, vertices = verts.len(), "mesh uploaded");
        self.meshes.insert(
            id,
            GpuMesh {
                vertex_buffer,
                vertex_count: verts.len() as u32,
            },
        );
    }

    fn ensure_instance_capacity(&mut self, device: &wgpu::Device, needed: u64) {
        if needed > self.instance_capacity {
            self.instance_capacity = needed.next_power_of_two();
            self.instance_buffer = Self::create_stream_buffer::<InstanceData>(
                device,
                "instance_buffer",
                self.instance_capacity,
            );
        }
    }

    fn ensure_line_capacity(&mut self, device: &wgpu::Device, needed: u64) {
        if needed > self.line_capacity {
            self.line_capacity = needed.next_power_of_two();
            self.line_buffer =
                Self::create_stream_buffer::<LineVertex>(device, "line_buffer", self.line_capacity);
        }
    }

    fn create_stream_buffer<T>(device: &wgpu::Device, label: &str, capacity: u64) -> wgpu::Buffer {
        device.create_buffer(&wgpu::BufferDescriptor {
            label: Some(label),
            size: capacity * std::mem::size_of::<T>() as u64,
            usage: wgpu::BufferUsages::VERTEX | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        })
    }

    fn create_depth_texture(
        device: &wgpu::Device,
        width: u32,
        height: u32,
    ) -> wgpu::TextureView {
        let texture = device.create_texture(&wgpu::TextureDescriptor {
            label: Some("depth_texture"),
            size: wgpu::Extent3d {
                width: width.max(1),
                height: height.max(1),
                depth_or_array_layers: 1,
            },
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: wgpu::TextureFormat::Depth32Float,
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            view_formats: &[],
        });
        texture.create_view(&Default::default())
    }
}

fn clear_color(color: Color) -> wgpu::Color {
    wgpu::Color {
        r: color.r as f64,
        g: color.g as f64,
        b: color.b as f64,
        a: color.a as f64,
    }
}
