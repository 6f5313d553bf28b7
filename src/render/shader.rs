use std::collections::HashMap;

use log::debug;
use thiserror::Error;

use crate::math::{Mat4, Vec3};

use super::{RenderContext, ShaderStage};

#[derive(Debug, Error)]
pub enum ShaderError {
    #[error("failed to compile {stage} shader: {log}")]
    Compile { stage: ShaderStage, log: String },
    #[error("failed to link shader program: {log}")]
    Link { log: String },
    #[error("shader attribute `{name}` is not active in the linked program")]
    MissingAttribute { name: String },
}

/// A linked vertex + fragment program with a lazily filled uniform cache.
///
/// Uniform locations are resolved on first use and remembered for the
/// lifetime of the program, including names the program does not expose.
/// A location is only ever used with the program that produced it.
pub struct ShaderProgram<C: RenderContext> {
    vertex: C::Shader,
    fragment: C::Shader,
    program: C::Program,
    uniforms: HashMap<String, Option<C::UniformLocation>>,
}

impl<C: RenderContext> ShaderProgram<C> {
    /// Compiles both stages and links them. Nothing is retried; partial
    /// objects are deleted before an error is returned.
    pub fn new(ctx: &C, vertex_source: &str, fragment_source: &str) -> Result<Self, ShaderError> {
        let vertex = compile(ctx, ShaderStage::Vertex, vertex_source)?;
        let fragment = match compile(ctx, ShaderStage::Fragment, fragment_source) {
            Ok(fragment) => fragment,
            Err(err) => {
                ctx.delete_shader(vertex);
                return Err(err);
            }
        };
        let program = match ctx.link_program(vertex, fragment) {
            Ok(program) => program,
            Err(log) => {
                ctx.delete_shader(vertex);
                ctx.delete_shader(fragment);
                return Err(ShaderError::Link { log });
            }
        };
        debug!("linked shader program {program:?}");

        Ok(Self {
            vertex,
            fragment,
            program,
            uniforms: HashMap::new(),
        })
    }

    pub fn handle(&self) -> C::Program {
        self.program
    }

    /// Location of a vertex attribute, or `None` when the linked program has
    /// no active attribute with that name.
    pub fn attrib_location(&self, ctx: &C, name: &str) -> Option<u32> {
        ctx.attrib_location(self.program, name)
    }

    /// Like [`attrib_location`](Self::attrib_location) for attributes the
    /// caller cannot draw without.
    pub fn require_attrib(&self, ctx: &C, name: &str) -> Result<u32, ShaderError> {
        self.attrib_location(ctx, name)
            .ok_or_else(|| ShaderError::MissingAttribute {
                name: name.to_owned(),
            })
    }

    /// Makes this the active program for subsequent uniform uploads and draws.
    pub fn use_program(&self, ctx: &C) {
        ctx.use_program(Some(self.program));
    }

    /// Uploads a `vec3` uniform. The program must be in use. Unknown names are
    /// ignored.
    pub fn set_vec3(&mut self, ctx: &C, name: &str, value: Vec3) {
        if let Some(location) = self.uniform(ctx, name) {
            ctx.uniform_vec3(location, value);
        }
    }

    /// Uploads a `mat4` uniform. The program must be in use. Unknown names are
    /// ignored.
    pub fn set_mat4(&mut self, ctx: &C, name: &str, value: &Mat4) {
        if let Some(location) = self.uniform(ctx, name) {
            ctx.uniform_mat4(location, value);
        }
    }

    /// Number of uniform names resolved so far, hits and misses alike.
    pub fn cached_uniform_count(&self) -> usize {
        self.uniforms.len()
    }

    /// Deletes the program and both stages. Cached locations die with it.
    pub fn destroy(self, ctx: &C) {
        ctx.delete_program(self.program);
        ctx.delete_shader(self.vertex);
        ctx.delete_shader(self.fragment);
    }

    fn uniform(&mut self, ctx: &C, name: &str) -> Option<&C::UniformLocation> {
        if !self.uniforms.contains_key(name) {
            let location = ctx.uniform_location(self.program, name);
            if location.is_none() {
                debug!(
                    "uniform `{name}` is not active in program {:?}; uploads will be skipped",
                    self.program
                );
            }
            self.uniforms.insert(name.to_owned(), location);
        }
        self.uniforms.get(name).and_then(Option::as_ref)
    }
}

fn compile<C: RenderContext>(
    ctx: &C,
    stage: ShaderStage,
    source: &str,
) -> Result<C::Shader, ShaderError> {
    ctx.compile_shader(stage, source)
        .map_err(|log| ShaderError::Compile { stage, log })
}
