use crate::camera::OrthoCamera;
use crate::mesh::{self, GridVertex, Vertex};
use crate::shaders;
use bytemuck::{Pod, Zeroable};
use glam::{Mat4, Vec3};
use lightfield_common::{Rgb, Transform};
use lightfield_kernel::FloorConfig;
use lightfield_render::{LightState, RenderError, RenderSurface};
use wgpu::util::DeviceExt;

/// Colour of every box.
const BOX_COLOR: u32 = 0x222222;
/// Radius of the sphere marking the light.
const MARKER_RADIUS: f32 = 0.5;
const GRID_HALF_EXTENT: i32 = 20;
const GRID_SPACING: f32 = 0.5;
const INITIAL_CAPACITY: u32 = 4096;

#[repr(C)]
#[derive(Copy, Clone, Pod, Zeroable)]
struct Uniforms {
    view_proj: [[f32; 4]; 4],
    light_position: [f32; 4],
    light_color: [f32; 4],
    ambient: [f32; 4],
}

#[repr(C)]
#[derive(Copy, Clone, Debug, PartialEq, Pod, Zeroable)]
struct InstanceData {
    model_0: [f32; 4],
    model_1: [f32; 4],
    model_2: [f32; 4],
    model_3: [f32; 4],
    color: [f32; 4],
    params: [f32; 4],
}

impl InstanceData {
    fn new(model: Mat4, color: [f32; 4], unlit: bool) -> Self {
        let cols = model.to_cols_array_2d();
        Self {
            model_0: cols[0],
            model_1: cols[1],
            model_2: cols[2],
            model_3: cols[3],
            color,
            params: [if unlit { 1.0 } else { 0.0 }, 0.0, 0.0, 0.0],
        }
    }

    fn lit_box(transform: &Transform) -> Self {
        Self::new(
            transform.to_matrix(),
            Rgb::from_hex(BOX_COLOR).to_rgba(1.0),
            false,
        )
    }
}

struct MeshBuffers {
    vertices: wgpu::Buffer,
    indices: wgpu::Buffer,
    index_count: u32,
}

impl MeshBuffers {
    fn upload(device: &wgpu::Device, label: &str, verts: &[Vertex], indices: &[u16]) -> Self {
        let vertices = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some(&format!("{label}_vertex_buffer")),
            contents: bytemuck::cast_slice(verts),
            usage: wgpu::BufferUsages::VERTEX,
        });
        let index_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some(&format!("{label}_index_buffer")),
            contents: bytemuck::cast_slice(indices),
            usage: wgpu::BufferUsages::INDEX,
        });
        Self {
            vertices,
            indices: index_buffer,
            index_count: indices.len() as u32,
        }
    }
}

/// wgpu renderer for the box field.
///
/// Instance transforms are staged on the CPU by index and written to the GPU
/// in one upload per draw when anything changed.
pub struct WgpuRenderer {
    field_pipeline: wgpu::RenderPipeline,
    grid_pipeline: wgpu::RenderPipeline,
    uniform_buffer: wgpu::Buffer,
    uniform_bind_group: wgpu::BindGroup,
    cube: MeshBuffers,
    sphere: MeshBuffers,
    grid_vertex_buffer: wgpu::Buffer,
    grid_vertex_count: u32,
    show_floor: bool,
    instance_buffer: wgpu::Buffer,
    capacity: u32,
    staged: Vec<InstanceData>,
    staged_dirty: bool,
    marker_buffer: wgpu::Buffer,
    light: Option<LightState>,
    depth_texture: wgpu::TextureView,
    disposed: bool,
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
                light_position: [0.0; 4],
                light_color: [0.0; 4],
                ambient: [0.0; 4],
            }),
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
        });

        let bind_group_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("uniform_bind_group_layout"),
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

        let field_pipeline = Self::field_pipeline(device, &pipeline_layout, surface_format);
        let grid_pipeline = Self::grid_pipeline(device, &pipeline_layout, surface_format);

        let (cube_verts, cube_indices) = mesh::cube_mesh();
        let cube = MeshBuffers::upload(device, "cube", &cube_verts, &cube_indices);
        let (sphere_verts, sphere_indices) = mesh::sphere_mesh(MARKER_RADIUS, 30);
        let sphere = MeshBuffers::upload(device, "sphere", &sphere_verts, &sphere_indices);

        let grid_verts = mesh::grid_mesh(GRID_HALF_EXTENT, GRID_SPACING, Mat4::IDENTITY);
        let grid_vertex_count = grid_verts.len() as u32;
        let grid_vertex_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("grid_vertex_buffer"),
            contents: bytemuck::cast_slice(&grid_verts),
            usage: wgpu::BufferUsages::VERTEX | wgpu::BufferUsages::COPY_DST,
        });

        let instance_buffer = Self::create_instance_buffer(device, INITIAL_CAPACITY);
        let marker_buffer = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("marker_instance_buffer"),
            size: std::mem::size_of::<InstanceData>() as u64,
            usage: wgpu::BufferUsages::VERTEX | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });

        let depth_texture = Self::create_depth_texture(device, width, height);

        Self {
            field_pipeline,
            grid_pipeline,
            uniform_buffer,
            uniform_bind_group,
            cube,
            sphere,
            grid_vertex_buffer,
            grid_vertex_count,
            show_floor: false,
            instance_buffer,
            capacity: INITIAL_CAPACITY,
            staged: Vec::new(),
            staged_dirty: false,
            marker_buffer,
            light: None,
            depth_texture,
            disposed: false,
        }
    }

    pub fn resize(&mut self, device: &wgpu::Device, width: u32, height: u32) {
        self.depth_texture = Self::create_depth_texture(device, width, height);
    }

    /// Discard the current batch and make room for `count` instances.
    pub fn create_batch(&mut self, device: &wgpu::Device, count: usize) -> Result<(), RenderError> {
        self.ensure_live()?;
        let needed = u32::try_from(count).map_err(|_| RenderError::OutOfMemory)?;
        if needed > self.capacity {
            let capacity = needed.next_power_of_two();
            self.instance_buffer.destroy();
            self.instance_buffer = Self::create_instance_buffer(device, capacity);
            self.capacity = capacity;
            tracing::debug!(capacity, "grew instance buffer");
        }
        self.staged = vec![InstanceData::lit_box(&Transform::default()); count];
        self.staged_dirty = true;
        Ok(())
    }

    pub fn set_instance(&mut self, index: usize, transform: &Transform) -> Result<(), RenderError> {
        self.ensure_live()?;
        let count = self.staged.len();
        let slot = self
            .staged
            .get_mut(index)
            .ok_or(RenderError::IndexOutOfBounds { index, count })?;
        *slot = InstanceData::lit_box(transform);
        self.staged_dirty = true;
        Ok(())
    }

    pub fn set_light(&mut self, light: &LightState) {
        self.light = Some(*light);
    }

    /// Re-place the floor grid; hidden floors are skipped at draw time.
    pub fn set_floor(&mut self, queue: &wgpu::Queue, floor: &FloorConfig) {
        self.show_floor = floor.visible;
        let placement = mesh::floor_placement(floor.position, floor.rotation);
        let verts: Vec<GridVertex> = mesh::grid_mesh(GRID_HALF_EXTENT, GRID_SPACING, placement);
        queue.write_buffer(&self.grid_vertex_buffer, 0, bytemuck::cast_slice(&verts));
    }

    /// Release the instance buffer. The renderer refuses further work.
    pub fn dispose(&mut self) {
        if self.disposed {
            return;
        }
        self.instance_buffer.destroy();
        self.marker_buffer.destroy();
        self.staged.clear();
        self.disposed = true;
        tracing::info!("wgpu renderer disposed");
    }

    /// Render one frame: floor grid, boxes, light marker.
    pub fn render(
        &mut self,
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        view: &wgpu::TextureView,
        camera: &OrthoCamera,
    ) -> Result<(), RenderError> {
        self.ensure_live()?;

        let light = self.light.unwrap_or(LightState {
            position: Vec3::ZERO,
            marker_color: Rgb::WHITE,
            point_color: Rgb::WHITE,
            intensity: 1.0,
            ambient_intensity: 1.0,
        });

        queue.write_buffer(
            &self.uniform_buffer,
            0,
            bytemuck::bytes_of(&Uniforms {
                view_proj: camera.view_projection().to_cols_array_2d(),
                light_position: light.position.extend(1.0).to_array(),
                light_color: [
                    light.point_color.r,
                    light.point_color.g,
                    light.point_color.b,
                    light.intensity,
                ],
                ambient: Rgb::WHITE.to_rgba(light.ambient_intensity * 0.25),
            }),
        );

        if self.staged_dirty && !self.staged.is_empty() {
            queue.write_buffer(&self.instance_buffer, 0, bytemuck::cast_slice(&self.staged));
        }
        self.staged_dirty = false;

        let marker = InstanceData::new(
            Mat4::from_translation(light.position),
            light.marker_color.to_rgba(1.0),
            true,
        );
        queue.write_buffer(&self.marker_buffer, 0, bytemuck::bytes_of(&marker));

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
                        load: wgpu::LoadOp::Clear(wgpu::Color::BLACK),
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

            if self.show_floor {
                pass.set_pipeline(&self.grid_pipeline);
                pass.set_vertex_buffer(0, self.grid_vertex_buffer.slice(..));
                pass.draw(0..self.grid_vertex_count, 0..1);
            }

            pass.set_pipeline(&self.field_pipeline);

            if !self.staged.is_empty() {
                pass.set_vertex_buffer(0, self.cube.vertices.slice(..));
                pass.set_vertex_buffer(1, self.instance_buffer.slice(..));
                pass.set_index_buffer(self.cube.indices.slice(..), wgpu::IndexFormat::Uint16);
                pass.draw_indexed(0..self.cube.index_count, 0, 0..self.staged.len() as u32);
            }

            pass.set_vertex_buffer(0, self.sphere.vertices.slice(..));
            pass.set_vertex_buffer(1, self.marker_buffer.slice(..));
            pass.set_index_buffer(self.sphere.indices.slice(..), wgpu::IndexFormat::Uint16);
            pass.draw_indexed(0..self.sphere.index_count, 0, 0..1);
        }

        queue.submit(std::iter::once(encoder.finish()));
        Ok(())
    }

    fn ensure_live(&self) -> Result<(), RenderError> {
        if self.disposed {
            Err(RenderError::Disposed)
        } else {
            Ok(())
        }
    }

    fn field_pipeline(
        device: &wgpu::Device,
        layout: &wgpu::PipelineLayout,
        format: wgpu::TextureFormat,
    ) -> wgpu::RenderPipeline {
        let shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("field_shader"),
            source: wgpu::ShaderSource::Wgsl(shaders::FIELD_SHADER.into()),
        });

        device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
            label: Some("field_pipeline"),
            layout: Some(layout),
            vertex: wgpu::VertexState {
                module: &shader,
                entry_point: Some("vs_main"),
                compilation_options: Default::default(),
                buffers: &[
                    wgpu::VertexBufferLayout {
                        array_stride: std::mem::size_of::<Vertex>() as u64,
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
                            2 => Float32x4,
                            3 => Float32x4,
                            4 => Float32x4,
                            5 => Float32x4,
                            6 => Float32x4,
                            7 => Float32x4,
                        ],
                    },
                ],
            },
            fragment: Some(wgpu::FragmentState {
                module: &shader,
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
                cull_mode: Some(wgpu::Face::Back),
                ..Default::default()
            },
            depth_stencil: Some(Self::depth_state()),
            multisample: Default::default(),
            multiview: None,
            cache: None,
        })
    }

    fn grid_pipeline(
        device: &wgpu::Device,
        layout: &wgpu::PipelineLayout,
        format: wgpu::TextureFormat,
    ) -> wgpu::RenderPipeline {
        let shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("grid_shader"),
            source: wgpu::ShaderSource::Wgsl(shaders::GRID_SHADER.into()),
        });

        device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
            label: Some("grid_pipeline"),
            layout: Some(layout),
            vertex: wgpu::VertexState {
                module: &shader,
                entry_point: Some("vs_grid"),
                compilation_options: Default::default(),
                buffers: &[wgpu::VertexBufferLayout {
                    array_stride: std::mem::size_of::<GridVertex>() as u64,
                    step_mode: wgpu::VertexStepMode::Vertex,
                    attributes: &wgpu::vertex_attr_array![
                        0 => Float32x3,
                        1 => Float32x4,
                    ],
                }],
            },
            fragment: Some(wgpu::FragmentState {
                module: &shader,
                entry_point: Some("fs_grid"),
                compilation_options: Default::default(),
                targets: &[Some(wgpu::ColorTargetState {
                    format,
                    blend: Some(wgpu::BlendState::REPLACE),
                    write_mask: wgpu::ColorWrites::ALL,
                })],
            }),
            primitive: wgpu::PrimitiveState {
                topology: wgpu::PrimitiveTopology::LineList,
                ..Default::default()
            },
            depth_stencil: Some(Self::depth_state()),
            multisample: Default::default(),
            multiview: None,
            cache: None,
        })
    }

    fn depth_state() -> wgpu::DepthStencilState {
        wgpu::DepthStencilState {
            format: wgpu::TextureFormat::Depth32Float,
            depth_write_enabled: true,
            depth_compare: wgpu::CompareFunction::Less,
            stencil: Default::default(),
            bias: Default::default(),
        }
    }

    fn create_instance_buffer(device: &wgpu::Device, capacity: u32) -> wgpu::Buffer {
        device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("instance_buffer"),
            size: (capacity as u64) * std::mem::size_of::<InstanceData>() as u64,
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

/// One frame's view of the renderer as a [`RenderSurface`].
///
/// Built per redraw from the renderer and the borrowed GPU handles.
pub struct WgpuFrame<'a> {
    pub renderer: &'a mut WgpuRenderer,
    pub device: &'a wgpu::Device,
    pub queue: &'a wgpu::Queue,
    pub view: &'a wgpu::TextureView,
    pub camera: &'a OrthoCamera,
}

impl RenderSurface for WgpuFrame<'_> {
    fn create_instanced_batch(&mut self, count: usize) -> Result<(), RenderError> {
        self.renderer.create_batch(self.device, count)
    }

    fn set_transform_at(&mut self, index: usize, transform: &Transform) -> Result<(), RenderError> {
        self.renderer.set_instance(index, transform)
    }

    fn set_light(&mut self, light: &LightState) -> Result<(), RenderError> {
        self.renderer.set_light(light);
        Ok(())
    }

    fn draw(&mut self) -> Result<(), RenderError> {
        self.renderer
            .render(self.device, self.queue, self.view, self.camera)
    }

    fn resize(&mut self, width: u32, height: u32) {
        self.renderer.resize(self.device, width, height);
    }

    fn dispose(&mut self) {
        self.renderer.dispose();
    }
}
