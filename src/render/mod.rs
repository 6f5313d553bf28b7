//! GPU-facing half of the crate: the rendering context capability, the shader
//! program wrapper built on top of it, and the GLSL sources for the scene.

use std::fmt;

use thiserror::Error;

use crate::math::{Mat4, Vec3};

pub mod gl;
pub mod headless;
mod reflect;
pub mod shader;
pub mod sources;

pub use gl::GlContext;
pub use headless::HeadlessContext;
pub use shader::{ShaderError, ShaderProgram};

/// Programmable pipeline stage a shader source is compiled for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ShaderStage {
    Vertex,
    Fragment,
}

impl fmt::Display for ShaderStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ShaderStage::Vertex => f.write_str("vertex"),
            ShaderStage::Fragment => f.write_str("fragment"),
        }
    }
}

/// How a float attribute is read from the currently bound array buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VertexAttribute {
    /// Number of `f32` components per vertex.
    pub components: i32,
    /// Bytes between consecutive vertices.
    pub stride: i32,
    /// Byte offset of the first component.
    pub offset: i32,
}

#[derive(Debug, Error)]
pub enum ContextError {
    #[error("failed to create {kind}: {message}")]
    Allocation { kind: &'static str, message: String },
}

/// Capability object over a GL-style immediate rendering API.
///
/// Bindings (`bind_array_buffer`, `use_program`) are global mutable state of
/// the underlying context. Callers must re-bind right before any operation
/// that depends on a binding instead of assuming an earlier binding survived.
pub trait RenderContext {
    type Buffer: Copy + fmt::Debug + PartialEq;
    type Shader: Copy + fmt::Debug;
    type Program: Copy + fmt::Debug + PartialEq;
    type UniformLocation: Clone + fmt::Debug;
    type Texture: Copy + fmt::Debug + PartialEq;

    fn create_buffer(&self) -> Result<Self::Buffer, ContextError>;
    fn bind_array_buffer(&self, buffer: Option<Self::Buffer>);
    /// Uploads `data` as static draw data into the bound array buffer.
    fn upload_array_buffer(&self, data: &[u8]);

    /// Compiles one stage. The error carries the compiler's info log.
    fn compile_shader(&self, stage: ShaderStage, source: &str) -> Result<Self::Shader, String>;
    /// Links a vertex and fragment stage. The error carries the linker's info log.
    fn link_program(
        &self,
        vertex: Self::Shader,
        fragment: Self::Shader,
    ) -> Result<Self::Program, String>;
    fn delete_shader(&self, shader: Self::Shader);
    fn delete_program(&self, program: Self::Program);
    fn use_program(&self, program: Option<Self::Program>);

    fn attrib_location(&self, program: Self::Program, name: &str) -> Option<u32>;
    fn uniform_location(&self, program: Self::Program, name: &str)
        -> Option<Self::UniformLocation>;
    /// Uploads to a location of the program currently in use.
    fn uniform_vec3(&self, location: &Self::UniformLocation, value: Vec3);
    /// Uploads to a location of the program currently in use.
    fn uniform_mat4(&self, location: &Self::UniformLocation, value: &Mat4);

    fn enable_vertex_attrib(&self, location: u32);
    /// Points `location` at the bound array buffer.
    fn vertex_attrib_pointer(&self, location: u32, attribute: VertexAttribute);

    fn enable_depth_test(&self);
    fn viewport(&self, width: u32, height: u32);
    /// Clears both the color and the depth buffer.
    fn clear(&self, color: [f32; 4]);
    fn draw_triangles(&self, first: u32, count: u32);
    /// Current drawable size in physical pixels.
    fn surface_size(&self) -> (u32, u32);

    fn create_texture(&self) -> Result<Self::Texture, ContextError>;
    /// Uploads RGBA8 pixels to a 2D texture and regenerates its mipmaps.
    fn upload_texture_rgba8(&self, texture: Self::Texture, width: u32, height: u32, pixels: &[u8]);
}
