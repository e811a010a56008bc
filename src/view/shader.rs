//! Shader programs and named uniform access.
//!
//! WGSL has no name-based uniform lookup, so every program carries a
//! [`UniformLayout`] describing its uniform structs (offsets follow the WGSL
//! uniform address-space rules) and a CPU staging copy ([`UniformBlock`]).
//! Setters write into the staging copy by name; [`ShaderProgram::flush`]
//! pushes it to the GPU once per frame.

use std::collections::HashMap;

use glam::{Mat4, Vec3};

use crate::model::light::MAX_DIRECTIONAL_LIGHTS;
use crate::utils::Vertex;

pub const SCENE_VERTEX_SHADER: &str = include_str!("shaders/scene_vertex.wgsl");
pub const SCENE_FRAGMENT_SHADER: &str = include_str!("shaders/scene_fragment.wgsl");

/// Typed uniform writes by name. Unknown names are ignored.
pub trait UniformSetter {
    fn set_int(&mut self, name: &str, value: i32);
    fn set_float(&mut self, name: &str, value: f32);
    fn set_vec3(&mut self, name: &str, value: Vec3);
    fn set_mat4(&mut self, name: &str, value: Mat4);
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UniformKind {
    Int,
    Float,
    Vec3,
    Mat4,
}

impl UniformKind {
    pub fn size(self) -> usize {
        match self {
            UniformKind::Int | UniformKind::Float => 4,
            UniformKind::Vec3 => 12,
            UniformKind::Mat4 => 64,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UniformSlot {
    pub offset: usize,
    pub kind: UniformKind,
}

#[derive(Debug, Clone, PartialEq)]
pub struct UniformLayout {
    slots: HashMap<String, UniformSlot>,
    size: usize,
}

impl UniformLayout {
    pub fn new(size: usize) -> Self {
        Self { slots: HashMap::new(), size }
    }

    pub fn with(mut self, name: impl Into<String>, offset: usize, kind: UniformKind) -> Self {
        debug_assert!(offset + kind.size() <= self.size);
        self.slots.insert(name.into(), UniformSlot { offset, kind });
        self
    }

    /// `FrameUniforms` in the scene shaders (group 0, binding 0):
    ///
    /// ```text
    /// view            mat4x4   0
    /// projection      mat4x4   64
    /// viewPos         vec3     128
    /// dirLightCount   i32      140
    /// dirLights[4]    32 each  144  (direction +0, color +16)
    /// ambientStrength f32      272
    /// ```
    pub fn frame() -> Self {
        const LIGHTS_OFFSET: usize = 144;
        const LIGHT_STRIDE: usize = 32;
        let ambient_offset = LIGHTS_OFFSET + LIGHT_STRIDE * MAX_DIRECTIONAL_LIGHTS;

        let mut layout = Self::new(round_up(ambient_offset + 4, 16))
            .with("view", 0, UniformKind::Mat4)
            .with("projection", 64, UniformKind::Mat4)
            .with("viewPos", 128, UniformKind::Vec3)
            .with("dirLightCount", 140, UniformKind::Int)
            .with("ambientStrength", ambient_offset, UniformKind::Float);

        for i in 0..MAX_DIRECTIONAL_LIGHTS {
            let base = LIGHTS_OFFSET + i * LIGHT_STRIDE;
            layout = layout
                .with(format!("dirLights[{i}].direction"), base, UniformKind::Vec3)
                .with(format!("dirLights[{i}].color"), base + 16, UniformKind::Vec3);
        }
        layout
    }

    /// `ObjectUniforms` (group 1, binding 0).
    pub fn object() -> Self {
        Self::new(64).with("model", 0, UniformKind::Mat4)
    }

    pub fn size(&self) -> usize {
        self.size
    }

    pub fn slot(&self, name: &str) -> Option<UniformSlot> {
        self.slots.get(name).copied()
    }
}

fn round_up(value: usize, align: usize) -> usize {
    value.div_ceil(align) * align
}

/// CPU staging bytes for one uniform struct.
#[derive(Debug, Clone)]
pub struct UniformBlock {
    layout: UniformLayout,
    data: Vec<u8>,
}

impl UniformBlock {
    pub fn new(layout: UniformLayout) -> Self {
        let data = vec![0u8; layout.size()];
        Self { layout, data }
    }

    pub fn bytes(&self) -> &[u8] {
        &self.data
    }

    pub fn layout(&self) -> &UniformLayout {
        &self.layout
    }

    fn write(&mut self, name: &str, kind: UniformKind, bytes: &[u8]) {
        match self.layout.slot(name) {
            Some(slot) if slot.kind == kind => {
                self.data[slot.offset..slot.offset + bytes.len()].copy_from_slice(bytes);
            }
            Some(slot) => {
                tracing::trace!("uniform '{name}' is {:?}, not {:?}; ignored", slot.kind, kind);
            }
            None => tracing::trace!("uniform '{name}' not in program; ignored"),
        }
    }

    fn read(&self, name: &str, kind: UniformKind) -> Option<&[u8]> {
        let slot = self.layout.slot(name).filter(|s| s.kind == kind)?;
        Some(&self.data[slot.offset..slot.offset + kind.size()])
    }

    pub fn get_int(&self, name: &str) -> Option<i32> {
        self.read(name, UniformKind::Int).map(bytemuck::pod_read_unaligned)
    }

    pub fn get_float(&self, name: &str) -> Option<f32> {
        self.read(name, UniformKind::Float).map(bytemuck::pod_read_unaligned)
    }

    pub fn get_vec3(&self, name: &str) -> Option<Vec3> {
        self.read(name, UniformKind::Vec3)
            .map(|b| Vec3::from_array(bytemuck::pod_read_unaligned::<[f32; 3]>(b)))
    }

    pub fn get_mat4(&self, name: &str) -> Option<Mat4> {
        self.read(name, UniformKind::Mat4)
            .map(|b| Mat4::from_cols_array(&bytemuck::pod_read_unaligned::<[f32; 16]>(b)))
    }
}

impl UniformSetter for UniformBlock {
    fn set_int(&mut self, name: &str, value: i32) {
        self.write(name, UniformKind::Int, bytemuck::bytes_of(&value));
    }

    fn set_float(&mut self, name: &str, value: f32) {
        self.write(name, UniformKind::Float, bytemuck::bytes_of(&value));
    }

    fn set_vec3(&mut self, name: &str, value: Vec3) {
        self.write(name, UniformKind::Vec3, bytemuck::bytes_of(&value.to_array()));
    }

    fn set_mat4(&mut self, name: &str, value: Mat4) {
        self.write(name, UniformKind::Mat4, bytemuck::bytes_of(&value.to_cols_array()));
    }
}

///////////////////////////////////////////////////////////////////////////////

pub struct ProgramDescriptor<'a> {
    pub label: &'a str,
    pub vertex_source: &'a str,
    pub fragment_source: &'a str,
    pub color_format: wgpu::TextureFormat,
    pub depth_format: wgpu::TextureFormat,
}

/// Per-object uniform buffer + bind group created against a program's layout.
pub struct ObjectBindings {
    pub block: UniformBlock,
    pub buffer: wgpu::Buffer,
    pub bind_group: wgpu::BindGroup,
}

/// Compiled vertex + fragment stages linked into a render pipeline, together
/// with the per-frame uniform buffer they read.
pub struct ShaderProgram {
    label: String,
    pipeline: wgpu::RenderPipeline,
    wireframe_pipeline: Option<wgpu::RenderPipeline>,
    frame_block: UniformBlock,
    frame_buffer: wgpu::Buffer,
    frame_bind_group: wgpu::BindGroup,
    object_bind_group_layout: wgpu::BindGroupLayout,
    valid: bool,
}

impl ShaderProgram {
    /// Compile both stages and link them. Failures are logged and the program
    /// is still returned; drawing with it renders nothing useful but does not
    /// stop the frame loop.
    pub fn compile_and_link(device: &wgpu::Device, desc: &ProgramDescriptor) -> Self {
        let (vertex_module, vertex_ok) =
            compile_stage(device, &format!("{}_vertex", desc.label), desc.vertex_source);
        let (fragment_module, fragment_ok) =
            compile_stage(device, &format!("{}_fragment", desc.label), desc.fragment_source);

        let frame_block = UniformBlock::new(UniformLayout::frame());
        let frame_buffer = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("frame_uniforms"),
            size: frame_block.bytes().len() as wgpu::BufferAddress,
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });

        let frame_bgl = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("frame_bind_group_layout"),
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

        let frame_bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("frame_bind_group"),
            layout: &frame_bgl,
            entries: &[wgpu::BindGroupEntry { binding: 0, resource: frame_buffer.as_entire_binding() }],
        });

        let object_bind_group_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("object_bind_group_layout"),
            entries: &[
                wgpu::BindGroupLayoutEntry {
                    binding: 0,
                    visibility: wgpu::ShaderStages::VERTEX,
                    ty: wgpu::BindingType::Buffer {
                        ty: wgpu::BufferBindingType::Uniform,
                        has_dynamic_offset: false,
                        min_binding_size: None,
                    },
                    count: None,
                },
                wgpu::BindGroupLayoutEntry {
                    binding: 1,
                    visibility: wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Texture {
                        sample_type: wgpu::TextureSampleType::Float { filterable: true },
                        view_dimension: wgpu::TextureViewDimension::D2,
                        multisampled: false,
                    },
                    count: None,
                },
                wgpu::BindGroupLayoutEntry {
                    binding: 2,
                    visibility: wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Sampler(wgpu::SamplerBindingType::Filtering),
                    count: None,
                },
            ],
        });

        let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("scene_pipeline_layout"),
            bind_group_layouts: &[&frame_bgl, &object_bind_group_layout],
            push_constant_ranges: &[],
        });

        // linking: pipeline creation is where stage interfaces and bindings are checked
        device.push_error_scope(wgpu::ErrorFilter::Validation);
        let pipeline = build_pipeline(
            device,
            desc,
            &pipeline_layout,
            &vertex_module,
            &fragment_module,
            wgpu::PolygonMode::Fill,
        );
        let wireframe_pipeline = device
            .features()
            .contains(wgpu::Features::POLYGON_MODE_LINE)
            .then(|| {
                build_pipeline(
                    device,
                    desc,
                    &pipeline_layout,
                    &vertex_module,
                    &fragment_module,
                    wgpu::PolygonMode::Line,
                )
            });
        let link_ok = match pollster::block_on(device.pop_error_scope()) {
            Some(err) => {
                tracing::error!("program '{}' link error:\n{}", desc.label, err);
                false
            }
            None => true,
        };

        let valid = vertex_ok && fragment_ok && link_ok;
        if valid {
            tracing::debug!("program '{}' compiled and linked", desc.label);
        }

        Self {
            label: desc.label.to_string(),
            pipeline,
            wireframe_pipeline,
            frame_block,
            frame_buffer,
            frame_bind_group,
            object_bind_group_layout,
            valid,
        }
    }

    /// The built-in lit, textured scene program.
    pub fn scene(
        device: &wgpu::Device,
        color_format: wgpu::TextureFormat,
        depth_format: wgpu::TextureFormat,
    ) -> Self {
        Self::compile_and_link(
            device,
            &ProgramDescriptor {
                label: "scene",
                vertex_source: SCENE_VERTEX_SHADER,
                fragment_source: SCENE_FRAGMENT_SHADER,
                color_format,
                depth_format,
            },
        )
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn is_valid(&self) -> bool {
        self.valid
    }

    pub fn supports_wireframe(&self) -> bool {
        self.wireframe_pipeline.is_some()
    }

    /// Bind as the active program on `pass`, together with the frame uniforms.
    pub fn use_program(&self, pass: &mut wgpu::RenderPass<'_>, wireframe: bool) {
        let pipeline = match (&self.wireframe_pipeline, wireframe) {
            (Some(wf), true) => wf,
            _ => &self.pipeline,
        };
        pass.set_pipeline(pipeline);
        pass.set_bind_group(0, &self.frame_bind_group, &[]);
    }

    /// Upload the staged frame uniforms.
    pub fn flush(&self, queue: &wgpu::Queue) {
        queue.write_buffer(&self.frame_buffer, 0, self.frame_block.bytes());
    }

    pub fn create_object_bindings(
        &self,
        device: &wgpu::Device,
        label: &str,
        texture_view: &wgpu::TextureView,
        sampler: &wgpu::Sampler,
    ) -> ObjectBindings {
        let mut block = UniformBlock::new(UniformLayout::object());
        block.set_mat4("model", Mat4::IDENTITY);

        let buffer = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some(label),
            size: block.bytes().len() as wgpu::BufferAddress,
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });

        let bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some(label),
            layout: &self.object_bind_group_layout,
            entries: &[
                wgpu::BindGroupEntry { binding: 0, resource: buffer.as_entire_binding() },
                wgpu::BindGroupEntry { binding: 1, resource: wgpu::BindingResource::TextureView(texture_view) },
                wgpu::BindGroupEntry { binding: 2, resource: wgpu::BindingResource::Sampler(sampler) },
            ],
        });

        ObjectBindings { block, buffer, bind_group }
    }
}

impl UniformSetter for ShaderProgram {
    fn set_int(&mut self, name: &str, value: i32) {
        self.frame_block.set_int(name, value);
    }

    fn set_float(&mut self, name: &str, value: f32) {
        self.frame_block.set_float(name, value);
    }

    fn set_vec3(&mut self, name: &str, value: Vec3) {
        self.frame_block.set_vec3(name, value);
    }

    fn set_mat4(&mut self, name: &str, value: Mat4) {
        self.frame_block.set_mat4(name, value);
    }
}

fn compile_stage(device: &wgpu::Device, label: &str, source: &str) -> (wgpu::ShaderModule, bool) {
    device.push_error_scope(wgpu::ErrorFilter::Validation);
    let module = device.create_shader_module(wgpu::ShaderModuleDescriptor {
        label: Some(label),
        source: wgpu::ShaderSource::Wgsl(source.into()),
    });
    match pollster::block_on(device.pop_error_scope()) {
        Some(err) => {
            tracing::error!("shader compile error ({label}):\n{err}");
            (module, false)
        }
        None => (module, true),
    }
}

fn build_pipeline(
    device: &wgpu::Device,
    desc: &ProgramDescriptor,
    layout: &wgpu::PipelineLayout,
    vertex_module: &wgpu::ShaderModule,
    fragment_module: &wgpu::ShaderModule,
    polygon_mode: wgpu::PolygonMode,
) -> wgpu::RenderPipeline {
    let label = match polygon_mode {
        wgpu::PolygonMode::Fill => format!("{}_pipeline", desc.label),
        _ => format!("{}_wireframe_pipeline", desc.label),
    };

    device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
        label: Some(label.as_str()),
        layout: Some(layout),
        vertex: wgpu::VertexState {
            module: vertex_module,
            entry_point: Some("vs_main"),
            buffers: &[Vertex::layout()],
            compilation_options: Default::default(),
        },
        fragment: Some(wgpu::FragmentState {
            module: fragment_module,
            entry_point: Some("fs_main"),
            targets: &[Some(wgpu::ColorTargetState {
                format: desc.color_format,
                blend: Some(wgpu::BlendState::REPLACE),
                write_mask: wgpu::ColorWrites::ALL,
            })],
            compilation_options: Default::default(),
        }),
        primitive: wgpu::PrimitiveState {
            topology: wgpu::PrimitiveTopology::TriangleList,
            strip_index_format: None,
            front_face: wgpu::FrontFace::Ccw,
            // imported meshes do not guarantee consistent winding
            cull_mode: None,
            polygon_mode,
            unclipped_depth: false,
            conservative: false,
        },
        depth_stencil: Some(wgpu::DepthStencilState {
            format: desc.depth_format,
            depth_write_enabled: true,
            depth_compare: wgpu::CompareFunction::Less,
            stencil: wgpu::StencilState::default(),
            bias: wgpu::DepthBiasState::default(),
        }),
        multisample: wgpu::MultisampleState { count: 1, mask: !0, alpha_to_coverage_enabled: false },
        multiview: None,
        cache: None,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_frame_layout_matches_wgsl_offsets() {
        let layout = UniformLayout::frame();
        assert_eq!(layout.size(), 288);
        assert_eq!(layout.slot("viewPos").unwrap().offset, 128);
        assert_eq!(layout.slot("dirLightCount").unwrap().offset, 140);
        assert_eq!(layout.slot("dirLights[0].direction").unwrap().offset, 144);
        assert_eq!(layout.slot("dirLights[3].color").unwrap().offset, 144 + 3 * 32 + 16);
        assert_eq!(layout.slot("ambientStrength").unwrap().offset, 272);
        assert!(layout.slot("dirLights[4].direction").is_none());
    }

    #[test]
    fn test_set_and_read_back() {
        let mut block = UniformBlock::new(UniformLayout::frame());
        let view = Mat4::from_translation(Vec3::new(1.0, 2.0, 3.0));
        block.set_mat4("view", view);
        block.set_vec3("viewPos", Vec3::new(4.0, 5.0, 6.0));
        block.set_int("dirLightCount", 3);
        block.set_float("ambientStrength", 0.25);

        assert_eq!(block.get_mat4("view"), Some(view));
        assert_eq!(block.get_vec3("viewPos"), Some(Vec3::new(4.0, 5.0, 6.0)));
        assert_eq!(block.get_int("dirLightCount"), Some(3));
        assert_eq!(block.get_float("ambientStrength"), Some(0.25));
        assert_eq!(block.get_mat4("projection"), Some(Mat4::ZERO));
    }

    #[test]
    fn test_unknown_name_is_a_no_op() {
        let mut block = UniformBlock::new(UniformLayout::frame());
        let before = block.bytes().to_vec();
        block.set_mat4("modle", Mat4::IDENTITY);
        block.set_vec3("dirLights[9].color", Vec3::ONE);
        assert_eq!(block.bytes(), &before[..]);
    }

    #[test]
    fn test_kind_mismatch_is_a_no_op() {
        let mut block = UniformBlock::new(UniformLayout::frame());
        block.set_int("view", 7);
        assert_eq!(block.get_mat4("view"), Some(Mat4::ZERO));
        assert_eq!(block.get_int("view"), None);
    }

    #[test]
    fn test_writes_do_not_overlap() {
        let mut block = UniformBlock::new(UniformLayout::frame());
        block.set_vec3("viewPos", Vec3::splat(9.0));
        block.set_int("dirLightCount", 1);
        block.set_vec3("dirLights[0].direction", Vec3::NEG_Y);
        block.set_vec3("dirLights[0].color", Vec3::ONE);

        assert_eq!(block.get_vec3("viewPos"), Some(Vec3::splat(9.0)));
        assert_eq!(block.get_int("dirLightCount"), Some(1));
        assert_eq!(block.get_vec3("dirLights[0].direction"), Some(Vec3::NEG_Y));
    }

    #[test]
    fn test_object_layout() {
        let mut block = UniformBlock::new(UniformLayout::object());
        assert_eq!(block.bytes().len(), 64);
        block.set_mat4("model", Mat4::IDENTITY);
        assert_eq!(block.get_mat4("model"), Some(Mat4::IDENTITY));
    }
}
