use std::collections::{BTreeMap, HashMap, HashSet};
use std::num::NonZeroU64;
use std::sync::Arc;

use wgpu::util::DeviceExt;

use super::context::{
    AttributeLayout, BufferTarget, DepthFunc, IndexType, PrimitiveMode, RasterContext, StageKind,
};
use super::reflect::{self, ProgramReflection, StageReflection};

const DEPTH_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Depth32Float;

/// A compiled (or rejected) WGSL stage.
pub struct WgpuStage {
    compiled: Result<CompiledStage, String>,
}

struct CompiledStage {
    reflection: StageReflection,
    module: wgpu::ShaderModule,
}

/// A linked (or rejected) program. Holds its own references to the stage modules.
pub struct WgpuProgram {
    linked: Result<Arc<LinkedProgram>, String>,
}

struct LinkedProgram {
    id: u64,
    reflection: ProgramReflection,
    vertex: wgpu::ShaderModule,
    fragment: wgpu::ShaderModule,
    layout: wgpu::PipelineLayout,
    bind_group: Option<wgpu::BindGroup>,
    /// Uniform buffers keyed by binding index.
    uniforms: BTreeMap<u32, wgpu::Buffer>,
}

/// An immutable GPU buffer with its binding target.
pub struct WgpuBuffer {
    target: BufferTarget,
    buffer: wgpu::Buffer,
}

#[derive(Clone)]
struct BoundAttribute {
    buffer: wgpu::Buffer,
    layout: AttributeLayout,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct PipelineKey {
    program: u64,
    format: wgpu::TextureFormat,
    mode: PrimitiveMode,
    depth: Option<DepthFunc>,
    attributes: Vec<(u32, u8, u64)>,
}

/// Color view and encoder for one frame, plus the pixel size the depth target follows.
///
/// Built from a swapchain image by the device layer, or from any render-attachment
/// texture when drawing offscreen.
pub struct FrameTarget {
    pub view: wgpu::TextureView,
    pub encoder: wgpu::CommandEncoder,
    pub width: u32,
    pub height: u32,
}

impl FrameTarget {
    pub fn for_texture(device: &wgpu::Device, texture: &wgpu::Texture) -> Self {
        Self {
            view: texture.create_view(&wgpu::TextureViewDescriptor::default()),
            encoder: device.create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("tumble frame encoder"),
            }),
            width: texture.width(),
            height: texture.height(),
        }
    }
}

struct DepthTarget {
    width: u32,
    height: u32,
    view: wgpu::TextureView,
}

/// wgpu implementation of the immediate-mode raster contract.
///
/// State calls (`use_program`, `bind_*`, `enable_depth_test`) only record state.
/// `draw_elements` turns the recorded state into one render pass on the current
/// frame's encoder, creating and caching the matching pipeline on first use.
///
/// Uniform writes are staged on the queue; the value in effect at submit time applies
/// to every draw of the frame.
pub struct WgpuRaster {
    device: wgpu::Device,
    queue: wgpu::Queue,
    surface_format: wgpu::TextureFormat,

    frame: Option<FrameTarget>,
    depth: Option<DepthTarget>,

    pending_clear: Option<([f32; 4], f32)>,
    depth_func: Option<DepthFunc>,
    program: Option<Arc<LinkedProgram>>,
    attributes: BTreeMap<u32, BoundAttribute>,
    index_buffer: Option<wgpu::Buffer>,

    pipelines: HashMap<PipelineKey, wgpu::RenderPipeline>,
    next_program_id: u64,
    warned: HashSet<&'static str>,
}

impl WgpuRaster {
    pub fn new(
        device: wgpu::Device,
        queue: wgpu::Queue,
        surface_format: wgpu::TextureFormat,
    ) -> Self {
        Self {
            device,
            queue,
            surface_format,
            frame: None,
            depth: None,
            pending_clear: None,
            depth_func: None,
            program: None,
            attributes: BTreeMap::new(),
            index_buffer: None,
            pipelines: HashMap::new(),
            next_program_id: 1,
            warned: HashSet::new(),
        }
    }

    /// Starts recording into `target`. The depth target follows its size.
    pub fn begin_frame(&mut self, target: FrameTarget) {
        self.ensure_depth_target(target.width, target.height);
        self.pending_clear = None;
        self.frame = Some(target);
    }

    /// Stops recording and hands the target back for submission.
    ///
    /// A clear that no draw consumed is still applied.
    pub fn finish_frame(&mut self) -> Option<FrameTarget> {
        if self.pending_clear.is_some() {
            self.encode_pass(None);
        }
        self.frame.take()
    }

    fn warn_once(&mut self, key: &'static str, message: &str) {
        if self.warned.insert(key) {
            log::warn!("{message}");
        }
    }

    fn ensure_depth_target(&mut self, width: u32, height: u32) {
        if let Some(d) = &self.depth {
            if d.width == width && d.height == height {
                return;
            }
        }

        let texture = self.device.create_texture(&wgpu::TextureDescriptor {
            label: Some("tumble depth"),
            size: wgpu::Extent3d {
                width: width.max(1),
                height: height.max(1),
                depth_or_array_layers: 1,
            },
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: DEPTH_FORMAT,
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            view_formats: &[],
        });

        log::debug!("depth target {width}x{height}");
        self.depth = Some(DepthTarget {
            width,
            height,
            view: texture.create_view(&wgpu::TextureViewDescriptor::default()),
        });
    }

    fn link_wgpu(
        &mut self,
        vertex: &CompiledStage,
        fragment: &CompiledStage,
    ) -> Result<LinkedProgram, String> {
        let reflection = reflect::link(&vertex.reflection, &fragment.reflection)?;

        let id = self.next_program_id;
        self.next_program_id += 1;

        let layout_entries: Vec<wgpu::BindGroupLayoutEntry> = reflection
            .uniforms
            .iter()
            .map(|u| {
                let mut visibility = wgpu::ShaderStages::NONE;
                if u.visibility.vertex {
                    visibility |= wgpu::ShaderStages::VERTEX;
                }
                if u.visibility.fragment {
                    visibility |= wgpu::ShaderStages::FRAGMENT;
                }
                wgpu::BindGroupLayoutEntry {
                    binding: u.binding,
                    visibility,
                    ty: wgpu::BindingType::Buffer {
                        ty: wgpu::BufferBindingType::Uniform,
                        has_dynamic_offset: false,
                        min_binding_size: NonZeroU64::new(u.size),
                    },
                    count: None,
                }
            })
            .collect();

        let uniforms: BTreeMap<u32, wgpu::Buffer> = reflection
            .uniforms
            .iter()
            .map(|u| {
                let buffer = self.device.create_buffer(&wgpu::BufferDescriptor {
                    label: Some("tumble uniform"),
                    size: u.size,
                    usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
                    mapped_at_creation: false,
                });
                (u.binding, buffer)
            })
            .collect();

        let (layout, bind_group) = if layout_entries.is_empty() {
            let layout = self
                .device
                .create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
                    label: Some("tumble program layout"),
                    bind_group_layouts: &[],
                    immediate_size: 0,
                });
            (layout, None)
        } else {
            let bgl = self
                .device
                .create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
                    label: Some("tumble program bgl"),
                    entries: &layout_entries,
                });

            let entries: Vec<wgpu::BindGroupEntry> = uniforms
                .iter()
                .map(|(binding, buffer)| wgpu::BindGroupEntry {
                    binding: *binding,
                    resource: buffer.as_entire_binding(),
                })
                .collect();

            let bind_group = self.device.create_bind_group(&wgpu::BindGroupDescriptor {
                label: Some("tumble program bind group"),
                layout: &bgl,
                entries: &entries,
            });

            let layout = self
                .device
                .create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
                    label: Some("tumble program layout"),
                    bind_group_layouts: &[&bgl],
                    immediate_size: 0,
                });
            (layout, Some(bind_group))
        };

        Ok(LinkedProgram {
            id,
            reflection,
            vertex: vertex.module.clone(),
            fragment: fragment.module.clone(),
            layout,
            bind_group,
            uniforms,
        })
    }

    /// Attribute bindings the current program reads, or `None` if any is unusable.
    fn resolve_attributes(&mut self, program: &LinkedProgram) -> Option<Vec<(u32, BoundAttribute)>> {
        let mut resolved = Vec::with_capacity(program.reflection.attributes.len());
        for attr in &program.reflection.attributes {
            let Some(bound) = self.attributes.get(&attr.location).cloned() else {
                self.warn_once("unbound-attribute", "draw skipped: a program attribute has no bound buffer");
                return None;
            };

            let wanted = attr.shape.and_then(|s| s.float_components());
            if wanted != Some(bound.layout.components) {
                self.warn_once(
                    "attribute-format",
                    "draw skipped: bound attribute layout does not match the shader input type",
                );
                return None;
            }
            resolved.push((attr.location, bound));
        }
        Some(resolved)
    }

    fn ensure_pipeline(&mut self, program: &LinkedProgram, key: &PipelineKey) {
        if self.pipelines.contains_key(key) {
            return;
        }

        let attrs: Vec<[wgpu::VertexAttribute; 1]> = key
            .attributes
            .iter()
            .map(|&(location, components, _)| {
                [wgpu::VertexAttribute {
                    format: float_format(components),
                    offset: 0,
                    shader_location: location,
                }]
            })
            .collect();

        let buffers: Vec<wgpu::VertexBufferLayout> = key
            .attributes
            .iter()
            .zip(&attrs)
            .map(|(&(_, _, stride), attr)| wgpu::VertexBufferLayout {
                array_stride: stride,
                step_mode: wgpu::VertexStepMode::Vertex,
                attributes: attr,
            })
            .collect();

        let (depth_write_enabled, depth_compare) = match key.depth {
            Some(func) => (true, compare_function(func)),
            None => (false, wgpu::CompareFunction::Always),
        };

        let pipeline = self
            .device
            .create_render_pipeline(&wgpu::RenderPipelineDescriptor {
                label: Some("tumble pipeline"),
                layout: Some(&program.layout),

                vertex: wgpu::VertexState {
                    module: &program.vertex,
                    entry_point: Some(program.reflection.vertex_entry.as_str()),
                    compilation_options: Default::default(),
                    buffers: &buffers,
                },

                fragment: Some(wgpu::FragmentState {
                    module: &program.fragment,
                    entry_point: Some(program.reflection.fragment_entry.as_str()),
                    compilation_options: Default::default(),
                    targets: &[Some(wgpu::ColorTargetState {
                        format: key.format,
                        blend: None,
                        write_mask: wgpu::ColorWrites::ALL,
                    })],
                }),

                primitive: wgpu::PrimitiveState {
                    topology: match key.mode {
                        PrimitiveMode::Triangles => wgpu::PrimitiveTopology::TriangleList,
                    },
                    strip_index_format: None,
                    front_face: wgpu::FrontFace::Ccw,
                    cull_mode: None,
                    polygon_mode: wgpu::PolygonMode::Fill,
                    unclipped_depth: false,
                    conservative: false,
                },

                depth_stencil: Some(wgpu::DepthStencilState {
                    format: DEPTH_FORMAT,
                    depth_write_enabled,
                    depth_compare,
                    stencil: wgpu::StencilState::default(),
                    bias: wgpu::DepthBiasState::default(),
                }),
                multisample: wgpu::MultisampleState::default(),

                multiview_mask: None,
                cache: None,
            });

        log::debug!(
            "pipeline created for program {} ({} cached)",
            key.program,
            self.pipelines.len() + 1
        );
        self.pipelines.insert(key.clone(), pipeline);
    }

    /// Encodes one pass on the current frame, consuming any pending clear.
    /// With `draw = None` the pass only applies the clear.
    fn encode_pass(&mut self, draw: Option<PassDraw<'_>>) {
        let (color_load, depth_load) = match self.pending_clear.take() {
            Some((c, d)) => (
                wgpu::LoadOp::Clear(wgpu::Color {
                    r: f64::from(c[0]),
                    g: f64::from(c[1]),
                    b: f64::from(c[2]),
                    a: f64::from(c[3]),
                }),
                wgpu::LoadOp::Clear(d),
            ),
            None => (wgpu::LoadOp::Load, wgpu::LoadOp::Load),
        };

        let Some(frame) = self.frame.as_mut() else { return };
        let Some(depth) = self.depth.as_ref() else { return };

        let mut rpass = frame.encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
            label: Some("tumble pass"),
            color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                view: &frame.view,
                resolve_target: None,
                ops: wgpu::Operations {
                    load: color_load,
                    store: wgpu::StoreOp::Store,
                },
                depth_slice: None,
            })],
            depth_stencil_attachment: Some(wgpu::RenderPassDepthStencilAttachment {
                view: &depth.view,
                depth_ops: Some(wgpu::Operations {
                    load: depth_load,
                    store: wgpu::StoreOp::Store,
                }),
                stencil_ops: None,
            }),
            timestamp_writes: None,
            occlusion_query_set: None,
            multiview_mask: None,
        });

        let Some(draw) = draw else { return };

        rpass.set_pipeline(draw.pipeline);
        if let Some(bind_group) = draw.bind_group {
            rpass.set_bind_group(0, bind_group, &[]);
        }
        for (slot, (_, bound)) in draw.attributes.iter().enumerate() {
            rpass.set_vertex_buffer(slot as u32, bound.buffer.slice(bound.layout.offset..));
        }
        rpass.set_index_buffer(draw.index.slice(draw.index_offset..), draw.index_format);
        rpass.draw_indexed(0..draw.count, 0, 0..1);
    }
}

struct PassDraw<'a> {
    pipeline: &'a wgpu::RenderPipeline,
    bind_group: Option<&'a wgpu::BindGroup>,
    attributes: &'a [(u32, BoundAttribute)],
    index: &'a wgpu::Buffer,
    index_offset: u64,
    index_format: wgpu::IndexFormat,
    count: u32,
}

impl RasterContext for WgpuRaster {
    type Stage = WgpuStage;
    type Program = WgpuProgram;
    type Buffer = WgpuBuffer;

    fn create_stage(&mut self, kind: StageKind, source: &str) -> WgpuStage {
        let compiled = reflect::compile_stage(kind, source).map(|reflection| {
            // Source already passed naga validation, so module creation cannot raise
            // a validation error here.
            let module = self
                .device
                .create_shader_module(wgpu::ShaderModuleDescriptor {
                    label: Some(match kind {
                        StageKind::Vertex => "tumble vertex stage",
                        StageKind::Fragment => "tumble fragment stage",
                    }),
                    source: wgpu::ShaderSource::Wgsl(source.into()),
                });
            CompiledStage { reflection, module }
        });

        WgpuStage { compiled }
    }

    fn stage_compiled(&self, stage: &WgpuStage) -> bool {
        stage.compiled.is_ok()
    }

    fn stage_info_log(&self, stage: &WgpuStage) -> String {
        match &stage.compiled {
            Ok(_) => String::new(),
            Err(log) => log.clone(),
        }
    }

    fn link_program(&mut self, vertex: &WgpuStage, fragment: &WgpuStage) -> WgpuProgram {
        let linked = match (&vertex.compiled, &fragment.compiled) {
            (Ok(vs), Ok(fs)) => self.link_wgpu(vs, fs).map(Arc::new),
            (Err(_), _) => Err("error: vertex stage is not compiled".to_string()),
            (_, Err(_)) => Err("error: fragment stage is not compiled".to_string()),
        };

        if let Ok(program) = &linked {
            log::debug!(
                "program {} linked: {} attribute(s), {} uniform(s)",
                program.id,
                program.reflection.attributes.len(),
                program.reflection.uniforms.len()
            );
        }

        WgpuProgram { linked }
    }

    fn program_linked(&self, program: &WgpuProgram) -> bool {
        program.linked.is_ok()
    }

    fn program_info_log(&self, program: &WgpuProgram) -> String {
        match &program.linked {
            Ok(_) => String::new(),
            Err(log) => log.clone(),
        }
    }

    fn attribute_location(&self, program: &WgpuProgram, name: &str) -> Option<u32> {
        program.linked.as_ref().ok()?.reflection.attribute_location(name)
    }

    fn uniform_location(&self, program: &WgpuProgram, name: &str) -> Option<u32> {
        program.linked.as_ref().ok()?.reflection.uniform_location(name)
    }

    fn create_buffer(&mut self, target: BufferTarget, contents: &[u8]) -> WgpuBuffer {
        let (label, usage) = match target {
            BufferTarget::VertexArray => ("tumble vertex buffer", wgpu::BufferUsages::VERTEX),
            BufferTarget::IndexArray => ("tumble index buffer", wgpu::BufferUsages::INDEX),
        };

        let buffer = self
            .device
            .create_buffer_init(&wgpu::util::BufferInitDescriptor {
                label: Some(label),
                contents,
                usage,
            });

        WgpuBuffer { target, buffer }
    }

    fn clear(&mut self, color: [f32; 4], depth: f32) {
        self.pending_clear = Some((color, depth));
    }

    fn enable_depth_test(&mut self, func: DepthFunc) {
        self.depth_func = Some(func);
    }

    fn use_program(&mut self, program: &WgpuProgram) {
        match &program.linked {
            Ok(linked) => self.program = Some(Arc::clone(linked)),
            Err(_) => self.warn_once("unlinked-program", "use_program called with an unlinked program"),
        }
    }

    fn bind_vertex_attribute(
        &mut self,
        location: Option<u32>,
        buffer: &WgpuBuffer,
        layout: AttributeLayout,
    ) {
        let Some(location) = location else { return };
        if buffer.target != BufferTarget::VertexArray {
            self.warn_once("attribute-target", "index buffer bound as a vertex attribute; ignored");
            return;
        }
        self.attributes.insert(
            location,
            BoundAttribute {
                buffer: buffer.buffer.clone(),
                layout,
            },
        );
    }

    fn bind_index_buffer(&mut self, buffer: &WgpuBuffer) {
        if buffer.target != BufferTarget::IndexArray {
            self.warn_once("index-target", "vertex buffer bound as the index buffer; ignored");
            return;
        }
        self.index_buffer = Some(buffer.buffer.clone());
    }

    fn set_uniform_mat4(&mut self, location: Option<u32>, value: &[f32; 16]) {
        let Some(location) = location else { return };
        let Some(program) = self.program.clone() else {
            self.warn_once("uniform-no-program", "uniform set with no program in use; ignored");
            return;
        };

        let bytes: &[u8] = bytemuck::cast_slice(value);
        let size_ok = program
            .reflection
            .uniform_at(location)
            .is_some_and(|u| u.size == bytes.len() as u64);

        match program.uniforms.get(&location) {
            Some(buffer) if size_ok => self.queue.write_buffer(buffer, 0, bytes),
            _ => self.warn_once("uniform-mismatch", "mat4 uniform written to a non-mat4 binding; ignored"),
        }
    }

    fn draw_elements(&mut self, mode: PrimitiveMode, count: u32, index_type: IndexType, offset: u64) {
        if self.frame.is_none() {
            self.warn_once("no-frame", "draw issued outside an acquired frame; ignored");
            return;
        }
        let Some(program) = self.program.clone() else {
            self.warn_once("draw-no-program", "draw issued with no program in use; ignored");
            return;
        };
        let Some(index) = self.index_buffer.clone() else {
            self.warn_once("draw-no-index", "draw issued with no index buffer bound; ignored");
            return;
        };
        if offset % index_type.size_bytes() != 0 {
            self.warn_once("index-offset", "draw skipped: index offset is not aligned to the index size");
            return;
        }
        let Some(attributes) = self.resolve_attributes(&program) else { return };

        let key = PipelineKey {
            program: program.id,
            format: self.surface_format,
            mode,
            depth: self.depth_func,
            attributes: attributes
                .iter()
                .map(|(loc, b)| (*loc, b.layout.components, b.layout.effective_stride()))
                .collect(),
        };
        self.ensure_pipeline(&program, &key);

        let Some(pipeline) = self.pipelines.get(&key).cloned() else { return };

        let index_format = match index_type {
            IndexType::U16 => wgpu::IndexFormat::Uint16,
            IndexType::U32 => wgpu::IndexFormat::Uint32,
        };

        log::trace!("draw_elements: {count} indices, program {}", program.id);
        self.encode_pass(Some(PassDraw {
            pipeline: &pipeline,
            bind_group: program.bind_group.as_ref(),
            attributes: &attributes,
            index: &index,
            index_offset: offset,
            index_format,
            count,
        }));
    }
}

fn float_format(components: u8) -> wgpu::VertexFormat {
    match components {
        1 => wgpu::VertexFormat::Float32,
        2 => wgpu::VertexFormat::Float32x2,
        3 => wgpu::VertexFormat::Float32x3,
        _ => wgpu::VertexFormat::Float32x4,
    }
}

fn compare_function(func: DepthFunc) -> wgpu::CompareFunction {
    match func {
        DepthFunc::Never => wgpu::CompareFunction::Never,
        DepthFunc::Less => wgpu::CompareFunction::Less,
        DepthFunc::Equal => wgpu::CompareFunction::Equal,
        DepthFunc::LessEqual => wgpu::CompareFunction::LessEqual,
        DepthFunc::Greater => wgpu::CompareFunction::Greater,
        DepthFunc::NotEqual => wgpu::CompareFunction::NotEqual,
        DepthFunc::GreaterEqual => wgpu::CompareFunction::GreaterEqual,
        DepthFunc::Always => wgpu::CompareFunction::Always,
    }
}
