//! Solid-color 2D mesh renderer.
//!
//! A frame is drawn in two phases. [`MeshRenderer::prepare`] packs every draw item into
//! one vertex buffer, one index buffer and one uniform buffer (one aligned slot per
//! item, bound with a dynamic offset). [`MeshRenderer::draw`] then records one indexed
//! draw per item into the caller's render pass.
//!
//! World units are pt. Items are drawn in slice order; callers sort by `z` first.
//! There is no depth buffer.

use std::{borrow::Cow, mem, ops::Range};

use anyhow::Context as _;

use crate::render::gpu::Gpu;
use crate::scene::{Camera2D, DrawItem2D, Rgba};

fn round_up_to(v: u64, align: u64) -> u64 {
    debug_assert!(align.is_power_of_two());
    (v + (align - 1)) & !(align - 1)
}

/// GPU vertex format for 2D meshes.
#[repr(C)]
#[derive(Copy, Clone, Debug, Default, bytemuck::Pod, bytemuck::Zeroable)]
pub struct Vertex2D {
    pub position: [f32; 2],
}

impl Vertex2D {
    pub const ATTRS: [wgpu::VertexAttribute; 1] = wgpu::vertex_attr_array![0 => Float32x2];

    #[inline]
    pub fn layout() -> wgpu::VertexBufferLayout<'static> {
        wgpu::VertexBufferLayout {
            array_stride: mem::size_of::<Vertex2D>() as wgpu::BufferAddress,
            step_mode: wgpu::VertexStepMode::Vertex,
            attributes: &Self::ATTRS,
        }
    }
}

/// Per-item uniforms: `clip_from_world * world_from_local` and the fill color.
#[repr(C)]
#[derive(Copy, Clone, Debug, Default, bytemuck::Pod, bytemuck::Zeroable)]
struct SolidUniforms {
    mvp: [[f32; 4]; 4],
    color: [f32; 4],
}

impl SolidUniforms {
    #[inline]
    fn new(mvp: [[f32; 4]; 4], color: Rgba) -> Self {
        Self {
            mvp,
            color: [color.r, color.g, color.b, color.a],
        }
    }
}

const UNIFORM_SIZE: u64 = mem::size_of::<SolidUniforms>() as u64;

fn mat4_mul(a: [[f32; 4]; 4], b: [[f32; 4]; 4]) -> [[f32; 4]; 4] {
    // Column-major: out = a * b
    let mut out = [[0.0f32; 4]; 4];
    for col in 0..4 {
        for row in 0..4 {
            out[col][row] = a[0][row] * b[col][0]
                + a[1][row] * b[col][1]
                + a[2][row] * b[col][2]
                + a[3][row] * b[col][3];
        }
    }
    out
}

/// One recorded draw: a range into the packed index buffer plus its uniform slot.
#[derive(Debug, Clone, PartialEq)]
struct DrawCall {
    indices: Range<u32>,
    base_vertex: i32,
    uniform_offset: u32,
}

/// CPU side of one frame.
#[derive(Debug, Default)]
struct FrameData {
    vertices: Vec<Vertex2D>,
    indices: Vec<u16>,
    uniforms: Vec<u8>,
    calls: Vec<DrawCall>,
}

impl FrameData {
    fn pack(camera: &Camera2D, items: &[DrawItem2D], uniform_stride: u64) -> Self {
        let clip_from_world = camera.clip_from_world().to_mat4();
        let mut frame = Self::default();
        for item in items {
            if item.mesh.is_empty() || item.fill.a <= 0.0 {
                continue;
            }
            let (Ok(base_vertex), Ok(first)) = (
                i32::try_from(frame.vertices.len()),
                u32::try_from(frame.indices.len()),
            ) else {
                log::warn!("mesh renderer: frame too large; dropping remaining items");
                break;
            };

            frame
                .vertices
                .extend(item.mesh.positions.iter().map(|&p| Vertex2D { position: p }));
            frame.indices.extend_from_slice(&item.mesh.indices);

            let uniform_offset = frame.uniforms.len();
            let mvp = mat4_mul(clip_from_world, item.world_from_local.to_mat4());
            frame
                .uniforms
                .extend_from_slice(bytemuck::bytes_of(&SolidUniforms::new(mvp, item.fill)));
            frame
                .uniforms
                .resize(uniform_offset + uniform_stride as usize, 0);

            frame.calls.push(DrawCall {
                indices: first..first + item.mesh.indices.len() as u32,
                base_vertex,
                uniform_offset: uniform_offset as u32,
            });
        }
        frame
    }
}

/// A growable GPU buffer.
struct Growable {
    buffer: wgpu::Buffer,
    capacity: u64,
    usage: wgpu::BufferUsages,
    label: &'static str,
}

impl Growable {
    fn new(gpu: &Gpu, label: &'static str, usage: wgpu::BufferUsages, capacity: u64) -> Self {
        let usage = usage | wgpu::BufferUsages::COPY_DST;
        Self {
            buffer: create_buffer(gpu, label, usage, capacity),
            capacity,
            usage,
            label,
        }
    }

    /// Upload `bytes`, padded to `COPY_BUFFER_ALIGNMENT`. Returns `true` if the buffer
    /// was reallocated.
    fn upload(&mut self, gpu: &Gpu, bytes: &[u8]) -> bool {
        let len = round_up_to(bytes.len() as u64, wgpu::COPY_BUFFER_ALIGNMENT);
        let grown = len > self.capacity;
        if grown {
            self.capacity = len.next_power_of_two().max(1024);
            self.buffer = create_buffer(gpu, self.label, self.usage, self.capacity);
        }
        if bytes.is_empty() {
            return grown;
        }
        if len == bytes.len() as u64 {
            gpu.queue.write_buffer(&self.buffer, 0, bytes);
        } else {
            let mut padded = Vec::with_capacity(len as usize);
            padded.extend_from_slice(bytes);
            padded.resize(len as usize, 0);
            gpu.queue.write_buffer(&self.buffer, 0, &padded);
        }
        grown
    }
}

fn create_buffer(
    gpu: &Gpu,
    label: &'static str,
    usage: wgpu::BufferUsages,
    size: u64,
) -> wgpu::Buffer {
    gpu.device.create_buffer(&wgpu::BufferDescriptor {
        label: Some(label),
        size,
        usage,
        mapped_at_creation: false,
    })
}

fn uniform_bind_group(
    gpu: &Gpu,
    layout: &wgpu::BindGroupLayout,
    buffer: &wgpu::Buffer,
) -> wgpu::BindGroup {
    gpu.device.create_bind_group(&wgpu::BindGroupDescriptor {
        label: Some("MeshRenderer Uniform BG"),
        layout,
        entries: &[wgpu::BindGroupEntry {
            binding: 0,
            resource: wgpu::BindingResource::Buffer(wgpu::BufferBinding {
                buffer,
                offset: 0,
                size: wgpu::BufferSize::new(UNIFORM_SIZE),
            }),
        }],
    })
}

pub struct MeshRenderer {
    pipeline: wgpu::RenderPipeline,

    uniform_layout: wgpu::BindGroupLayout,
    uniforms: Growable,
    uniform_bind_group: wgpu::BindGroup,
    uniform_stride: u64,

    vertices: Growable,
    indices: Growable,

    calls: Vec<DrawCall>,
    vertex_bytes: u64,
    index_bytes: u64,
}

impl MeshRenderer {
    /// Build the solid-color pipeline targeting the surface's SRGB view format.
    pub fn new(gpu: &Gpu) -> anyhow::Result<Self> {
        let shader = gpu
            .device
            .create_shader_module(wgpu::ShaderModuleDescriptor {
                label: Some("MeshRenderer Solid Shader"),
                source: wgpu::ShaderSource::Wgsl(Cow::Borrowed(include_str!(
                    "shaders/solid_mesh.wgsl"
                ))),
            });

        let min_binding_size =
            wgpu::BufferSize::new(UNIFORM_SIZE).context("mesh renderer: empty uniform block")?;
        let uniform_layout =
            gpu.device
                .create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
                    label: Some("MeshRenderer Uniform BGL"),
                    entries: &[wgpu::BindGroupLayoutEntry {
                        binding: 0,
                        visibility: wgpu::ShaderStages::VERTEX | wgpu::ShaderStages::FRAGMENT,
                        ty: wgpu::BindingType::Buffer {
                            ty: wgpu::BufferBindingType::Uniform,
                            has_dynamic_offset: true,
                            min_binding_size: Some(min_binding_size),
                        },
                        count: None,
                    }],
                });

        let alignment = u64::from(gpu.device.limits().min_uniform_buffer_offset_alignment).max(1);
        let uniform_stride = round_up_to(UNIFORM_SIZE, alignment.next_power_of_two());

        let uniforms = Growable::new(
            gpu,
            "MeshRenderer Uniform Buffer",
            wgpu::BufferUsages::UNIFORM,
            uniform_stride * 64,
        );
        let uniform_bind_group = uniform_bind_group(gpu, &uniform_layout, &uniforms.buffer);

        let pipeline_layout = gpu
            .device
            .create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
                label: Some("MeshRenderer Pipeline Layout"),
                bind_group_layouts: &[&uniform_layout],
                immediate_size: 0,
            });

        let pipeline = gpu
            .device
            .create_render_pipeline(&wgpu::RenderPipelineDescriptor {
                label: Some("MeshRenderer Solid Pipeline"),
                layout: Some(&pipeline_layout),
                vertex: wgpu::VertexState {
                    module: &shader,
                    entry_point: Some("vs_main"),
                    buffers: &[Vertex2D::layout()],
                    compilation_options: Default::default(),
                },
                fragment: Some(wgpu::FragmentState {
                    module: &shader,
                    entry_point: Some("fs_main"),
                    targets: &[Some(wgpu::ColorTargetState {
                        format: gpu.surface_format.add_srgb_suffix(),
                        blend: Some(wgpu::BlendState::ALPHA_BLENDING),
                        write_mask: wgpu::ColorWrites::ALL,
                    })],
                    compilation_options: Default::default(),
                }),
                primitive: wgpu::PrimitiveState {
                    topology: wgpu::PrimitiveTopology::TriangleList,
                    front_face: wgpu::FrontFace::Ccw,
                    cull_mode: None,
                    ..Default::default()
                },
                depth_stencil: None,
                multisample: wgpu::MultisampleState::default(),
                multiview_mask: None,
                cache: None,
            });

        Ok(Self {
            pipeline,
            uniform_layout,
            uniforms,
            uniform_bind_group,
            uniform_stride,
            vertices: Growable::new(
                gpu,
                "MeshRenderer Vertex Buffer",
                wgpu::BufferUsages::VERTEX,
                1024,
            ),
            indices: Growable::new(
                gpu,
                "MeshRenderer Index Buffer",
                wgpu::BufferUsages::INDEX,
                1024,
            ),
            calls: Vec::new(),
            vertex_bytes: 0,
            index_bytes: 0,
        })
    }

    /// Upload this frame's items. Must run before the render pass that calls [`Self::draw`].
    pub fn prepare(&mut self, gpu: &Gpu, camera: &Camera2D, items: &[DrawItem2D]) {
        let frame = FrameData::pack(camera, items, self.uniform_stride);

        let vertex_raw: &[u8] = bytemuck::cast_slice(&frame.vertices);
        let index_raw: &[u8] = bytemuck::cast_slice(&frame.indices);
        self.vertices.upload(gpu, vertex_raw);
        self.indices.upload(gpu, index_raw);
        if self.uniforms.upload(gpu, &frame.uniforms) {
            self.uniform_bind_group =
                uniform_bind_group(gpu, &self.uniform_layout, &self.uniforms.buffer);
        }

        self.vertex_bytes = vertex_raw.len() as u64;
        self.index_bytes = index_raw.len() as u64;
        self.calls = frame.calls;
    }

    /// Record the prepared draws.
    pub fn draw(&self, pass: &mut wgpu::RenderPass<'_>) {
        if self.calls.is_empty() {
            return;
        }
        pass.set_pipeline(&self.pipeline);
        pass.set_vertex_buffer(0, self.vertices.buffer.slice(..self.vertex_bytes));
        pass.set_index_buffer(
            self.indices.buffer.slice(..self.index_bytes),
            wgpu::IndexFormat::Uint16,
        );
        for call in &self.calls {
            pass.set_bind_group(0, &self.uniform_bind_group, &[call.uniform_offset]);
            pass.draw_indexed(call.indices.clone(), call.base_vertex, 0..1);
        }
    }

    /// Draws recorded by the last [`Self::prepare`].
    #[inline]
    pub fn draw_count(&self) -> usize {
        self.calls.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scene::{Affine2, Mesh2D};

    fn item(fill: Rgba, positions: usize) -> DrawItem2D {
        DrawItem2D {
            mesh: Mesh2D {
                positions: vec![[0.0, 0.0]; positions],
                indices: vec![0, 1, 2],
            },
            fill,
            world_from_local: Affine2::IDENTITY,
            z: 0,
        }
    }

    #[test]
    fn packing_offsets_vertices_and_uniform_slots() {
        let red = Rgba::rgb(1.0, 0.0, 0.0);
        let items = [item(red, 3), item(red.with_alpha(0.0), 3), item(red, 4)];
        let frame = FrameData::pack(&Camera2D::default(), &items, 256);

        // The transparent item is skipped.
        assert_eq!(frame.calls.len(), 2);
        assert_eq!(frame.calls[1].indices, 3..6);
        assert_eq!(frame.calls[1].base_vertex, 3);
        assert_eq!(frame.calls[1].uniform_offset, 256);
        assert_eq!(frame.vertices.len(), 7);
        assert_eq!(frame.uniforms.len(), 512);
    }

    #[test]
    fn round_up_aligns() {
        assert_eq!(round_up_to(80, 256), 256);
        assert_eq!(round_up_to(256, 256), 256);
        assert_eq!(round_up_to(6, 4), 8);
    }
}
