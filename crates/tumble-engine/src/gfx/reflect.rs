//! WGSL compilation and stage-interface reflection.
//!
//! "Compiling" a stage parses and validates it with naga and extracts the parts the
//! raster contract cares about: the entry point, its located inputs/outputs and the
//! uniform bindings. "Linking" checks that two compiled stages agree with each other.
//! Error strings are the info logs surfaced through the raster contract.

use std::fmt;

use naga::valid::{Capabilities, ValidationFlags, Validator};
use naga::{Binding, Handle, Module, ScalarKind, Type, TypeInner, VectorSize};

use super::StageKind;

/// Only bind group 0 carries uniforms in this contract.
pub const UNIFORM_GROUP: u32 = 0;

/// Scalar/vector/matrix shape of an interface value.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub struct ValueShape {
    pub kind: ScalarKind,
    pub width: u8,
    pub columns: u8,
    pub rows: u8,
}

impl ValueShape {
    fn of(inner: &TypeInner) -> Option<Self> {
        match *inner {
            TypeInner::Scalar(s) => Some(Self {
                kind: s.kind,
                width: s.width,
                columns: 1,
                rows: 1,
            }),
            TypeInner::Vector { size, scalar } => Some(Self {
                kind: scalar.kind,
                width: scalar.width,
                columns: 1,
                rows: vector_len(size),
            }),
            TypeInner::Matrix {
                columns,
                rows,
                scalar,
            } => Some(Self {
                kind: scalar.kind,
                width: scalar.width,
                columns: vector_len(columns),
                rows: vector_len(rows),
            }),
            _ => None,
        }
    }

    /// Component count when the value is a float scalar or vector.
    pub fn float_components(&self) -> Option<u8> {
        (self.kind == ScalarKind::Float && self.width == 4 && self.columns == 1).then_some(self.rows)
    }
}

impl fmt::Display for ValueShape {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let scalar = match (self.kind, self.width) {
            (ScalarKind::Float, 4) => "f32",
            (ScalarKind::Float, 2) => "f16",
            (ScalarKind::Float, 8) => "f64",
            (ScalarKind::Sint, _) => "i32",
            (ScalarKind::Uint, _) => "u32",
            (ScalarKind::Bool, _) => "bool",
            _ => "abstract",
        };
        match (self.columns, self.rows) {
            (1, 1) => f.write_str(scalar),
            (1, n) => write!(f, "vec{n}<{scalar}>"),
            (c, r) => write!(f, "mat{c}x{r}<{scalar}>"),
        }
    }
}

/// A user-defined `@location(n)` input or output of an entry point.
#[derive(Debug, Clone, PartialEq)]
pub struct InterfaceVar {
    pub name: String,
    pub location: u32,
    pub shape: Option<ValueShape>,
}

/// A `var<uniform>` declared by a stage.
#[derive(Debug, Clone, PartialEq)]
pub struct UniformVar {
    pub name: String,
    pub group: u32,
    pub binding: u32,
    pub size: u64,
}

/// Result of a successful stage compilation.
#[derive(Debug, Clone)]
pub struct StageReflection {
    pub kind: StageKind,
    pub entry_point: String,
    pub inputs: Vec<InterfaceVar>,
    pub outputs: Vec<InterfaceVar>,
    pub uniforms: Vec<UniformVar>,
}

/// Which stages read a uniform binding.
#[derive(Debug, Copy, Clone, Default, Eq, PartialEq)]
pub struct StageMask {
    pub vertex: bool,
    pub fragment: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ProgramUniform {
    pub name: String,
    pub binding: u32,
    pub size: u64,
    pub visibility: StageMask,
}

/// Result of a successful link: the program's externally visible interface.
#[derive(Debug, Clone)]
pub struct ProgramReflection {
    pub vertex_entry: String,
    pub fragment_entry: String,
    /// Vertex-stage inputs, sorted by location.
    pub attributes: Vec<InterfaceVar>,
    /// Union of both stages' uniforms, sorted by binding.
    pub uniforms: Vec<ProgramUniform>,
}

impl ProgramReflection {
    pub fn attribute_location(&self, name: &str) -> Option<u32> {
        self.attributes
            .iter()
            .find(|a| a.name == name)
            .map(|a| a.location)
    }

    pub fn uniform_location(&self, name: &str) -> Option<u32> {
        self.uniforms
            .iter()
            .find(|u| u.name == name)
            .map(|u| u.binding)
    }

    pub fn uniform_at(&self, binding: u32) -> Option<&ProgramUniform> {
        self.uniforms.iter().find(|u| u.binding == binding)
    }
}

/// Parses and validates `source`, returning the stage interface or an info log.
pub fn compile_stage(kind: StageKind, source: &str) -> Result<StageReflection, String> {
    let module = naga::front::wgsl::parse_str(source).map_err(|e| e.emit_to_string(source))?;

    Validator::new(ValidationFlags::all(), Capabilities::all())
        .validate(&module)
        .map_err(|e| e.emit_to_string(source))?;

    let wanted = match kind {
        StageKind::Vertex => naga::ShaderStage::Vertex,
        StageKind::Fragment => naga::ShaderStage::Fragment,
    };

    let ep = module
        .entry_points
        .iter()
        .find(|ep| ep.stage == wanted)
        .ok_or_else(|| format!("error: no @{kind} entry point in {kind} shader source"))?;

    let mut inputs = Vec::new();
    for arg in &ep.function.arguments {
        let name = arg.name.as_deref().unwrap_or("");
        collect_located(&module, name, arg.ty, arg.binding.as_ref(), &mut inputs);
    }

    let mut outputs = Vec::new();
    if let Some(result) = &ep.function.result {
        collect_located(&module, &ep.name, result.ty, result.binding.as_ref(), &mut outputs);
    }

    let uniforms = module
        .global_variables
        .iter()
        .filter(|(_, var)| matches!(var.space, naga::AddressSpace::Uniform))
        .filter_map(|(_, var)| {
            let rb = var.binding.as_ref()?;
            Some(UniformVar {
                name: var.name.clone().unwrap_or_default(),
                group: rb.group,
                binding: rb.binding,
                size: u64::from(module.types[var.ty].inner.size(module.to_ctx())),
            })
        })
        .collect();

    inputs.sort_by_key(|v| v.location);
    outputs.sort_by_key(|v| v.location);

    Ok(StageReflection {
        kind,
        entry_point: ep.name.clone(),
        inputs,
        outputs,
        uniforms,
    })
}

/// Checks that a vertex and a fragment stage form a valid program.
///
/// Every problem found is reported; the log lists one per line.
pub fn link(vertex: &StageReflection, fragment: &StageReflection) -> Result<ProgramReflection, String> {
    let mut errors = Vec::new();

    if vertex.kind != StageKind::Vertex {
        errors.push(format!("error: vertex slot holds a {} stage", vertex.kind));
    }
    if fragment.kind != StageKind::Fragment {
        errors.push(format!("error: fragment slot holds a {} stage", fragment.kind));
    }

    for input in &fragment.inputs {
        match vertex.outputs.iter().find(|o| o.location == input.location) {
            None => errors.push(format!(
                "error: fragment input `{}` at @location({}) is not written by the vertex stage",
                input.name, input.location
            )),
            Some(out) if out.shape != input.shape => errors.push(format!(
                "error: @location({}) type mismatch: vertex writes {}, fragment reads {}",
                input.location,
                describe(out.shape),
                describe(input.shape)
            )),
            Some(_) => {}
        }
    }

    let mut uniforms: Vec<ProgramUniform> = Vec::new();
    let stages = [(vertex, StageKind::Vertex), (fragment, StageKind::Fragment)];
    for (stage, kind) in stages {
        for u in &stage.uniforms {
            if u.group != UNIFORM_GROUP {
                errors.push(format!(
                    "error: uniform `{}` uses @group({}); only @group({UNIFORM_GROUP}) is supported",
                    u.name, u.group
                ));
                continue;
            }

            let index = match uniforms.iter().position(|p| p.binding == u.binding) {
                Some(i) => {
                    let existing = &uniforms[i];
                    if existing.name != u.name || existing.size != u.size {
                        errors.push(format!(
                            "error: @binding({}) is `{}` in one stage and `{}` in another",
                            u.binding, existing.name, u.name
                        ));
                        continue;
                    }
                    i
                }
                None => {
                    if let Some(other) = uniforms.iter().find(|p| p.name == u.name) {
                        errors.push(format!(
                            "error: uniform `{}` is bound at @binding({}) and @binding({})",
                            u.name, other.binding, u.binding
                        ));
                        continue;
                    }
                    uniforms.push(ProgramUniform {
                        name: u.name.clone(),
                        binding: u.binding,
                        size: u.size,
                        visibility: StageMask::default(),
                    });
                    uniforms.len() - 1
                }
            };

            let slot = &mut uniforms[index];
            match kind {
                StageKind::Vertex => slot.visibility.vertex = true,
                StageKind::Fragment => slot.visibility.fragment = true,
            }
        }
    }

    if !errors.is_empty() {
        return Err(errors.join("\n"));
    }

    uniforms.sort_by_key(|u| u.binding);

    Ok(ProgramReflection {
        vertex_entry: vertex.entry_point.clone(),
        fragment_entry: fragment.entry_point.clone(),
        attributes: vertex.inputs.clone(),
        uniforms,
    })
}

fn collect_located(
    module: &Module,
    name: &str,
    ty: Handle<Type>,
    binding: Option<&Binding>,
    out: &mut Vec<InterfaceVar>,
) {
    let inner = &module.types[ty].inner;
    match binding {
        Some(Binding::Location { location, .. }) => out.push(InterfaceVar {
            name: name.to_string(),
            location: *location,
            shape: ValueShape::of(inner),
        }),
        Some(Binding::BuiltIn(_)) => {}
        None => {
            if let TypeInner::Struct { members, .. } = inner {
                for m in members {
                    let member_name = m.name.as_deref().unwrap_or("");
                    collect_located(module, member_name, m.ty, m.binding.as_ref(), out);
                }
            }
        }
    }
}

fn vector_len(size: VectorSize) -> u8 {
    match size {
        VectorSize::Bi => 2,
        VectorSize::Tri => 3,
        VectorSize::Quad => 4,
    }
}

fn describe(shape: Option<ValueShape>) -> String {
    shape.map_or_else(|| "an opaque type".to_string(), |s| s.to_string())
}
