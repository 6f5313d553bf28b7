//! [`RenderContext`] over a real OpenGL / OpenGL ES / WebGL2 context via `glow`.
//!
//! Every `glow` call is `unsafe` because the driver cannot verify that handles
//! belong to this context. `GlContext` only ever passes back handles that it
//! created itself, and it must be used on the thread that owns the context.

use std::cell::Cell;

use glow::HasContext;
use log::{debug, warn};

use crate::math::{Mat4, Vec3};

use super::{ContextError, RenderContext, ShaderStage, VertexAttribute};

type Gl = glow::Context;

pub struct GlContext {
    gl: Gl,
    surface: Cell<(u32, u32)>,
}

impl GlContext {
    pub fn new(gl: Gl, width: u32, height: u32) -> Self {
        Self {
            gl,
            surface: Cell::new((width, height)),
        }
    }

    /// Records the drawable size; hosts call this when the surface resizes.
    pub fn set_surface_size(&self, width: u32, height: u32) {
        self.surface.set((width, height));
    }

    pub fn raw(&self) -> &Gl {
        &self.gl
    }
}

impl RenderContext for GlContext {
    type Buffer = <Gl as HasContext>::Buffer;
    type Shader = <Gl as HasContext>::Shader;
    type Program = <Gl as HasContext>::Program;
    type UniformLocation = <Gl as HasContext>::UniformLocation;
    type Texture = <Gl as HasContext>::Texture;

    fn create_buffer(&self) -> Result<Self::Buffer, ContextError> {
        unsafe { self.gl.create_buffer() }.map_err(|message| ContextError::Allocation {
            kind: "buffer",
            message,
        })
    }

    fn bind_array_buffer(&self, buffer: Option<Self::Buffer>) {
        unsafe { self.gl.bind_buffer(glow::ARRAY_BUFFER, buffer) }
    }

    fn upload_array_buffer(&self, data: &[u8]) {
        unsafe {
            self.gl
                .buffer_data_u8_slice(glow::ARRAY_BUFFER, data, glow::STATIC_DRAW)
        }
    }

    fn compile_shader(&self, stage: ShaderStage, source: &str) -> Result<Self::Shader, String> {
        let kind = match stage {
            ShaderStage::Vertex => glow::VERTEX_SHADER,
            ShaderStage::Fragment => glow::FRAGMENT_SHADER,
        };
        unsafe {
            let shader = self.gl.create_shader(kind)?;
            self.gl.shader_source(shader, source);
            self.gl.compile_shader(shader);
            if !self.gl.get_shader_compile_status(shader) {
                let log = self.gl.get_shader_info_log(shader);
                self.gl.delete_shader(shader);
                return Err(log);
            }
            Ok(shader)
        }
    }

    fn link_program(
        &self,
        vertex: Self::Shader,
        fragment: Self::Shader,
    ) -> Result<Self::Program, String> {
        unsafe {
            let program = self.gl.create_program()?;
            self.gl.attach_shader(program, vertex);
            self.gl.attach_shader(program, fragment);
            self.gl.link_program(program);
            if !self.gl.get_program_link_status(program) {
                let log = self.gl.get_program_info_log(program);
                self.gl.delete_program(program);
                return Err(log);
            }
            let warnings = self.gl.get_program_info_log(program);
            if !warnings.trim().is_empty() {
                warn!("program linked with diagnostics: {warnings}");
            }
            Ok(program)
        }
    }

    fn delete_shader(&self, shader: Self::Shader) {
        unsafe { self.gl.delete_shader(shader) }
    }

    fn delete_program(&self, program: Self::Program) {
        unsafe { self.gl.delete_program(program) }
    }

    fn use_program(&self, program: Option<Self::Program>) {
        unsafe { self.gl.use_program(program) }
    }

    fn attrib_location(&self, program: Self::Program, name: &str) -> Option<u32> {
        unsafe { self.gl.get_attrib_location(program, name) }
    }

    fn uniform_location(
        &self,
        program: Self::Program,
        name: &str,
    ) -> Option<Self::UniformLocation> {
        let location = unsafe { self.gl.get_uniform_location(program, name) };
        debug!("resolved uniform `{name}`: {location:?}");
        location
    }

    fn uniform_vec3(&self, location: &Self::UniformLocation, value: Vec3) {
        unsafe {
            self.gl
                .uniform_3_f32(Some(location), value.x, value.y, value.z)
        }
    }

    fn uniform_mat4(&self, location: &Self::UniformLocation, value: &Mat4) {
        unsafe {
            self.gl
                .uniform_matrix_4_f32_slice(Some(location), false, value.as_array())
        }
    }

    fn enable_vertex_attrib(&self, location: u32) {
        unsafe { self.gl.enable_vertex_attrib_array(location) }
    }

    fn vertex_attrib_pointer(&self, location: u32, attribute: VertexAttribute) {
        unsafe {
            self.gl.vertex_attrib_pointer_f32(
                location,
                attribute.components,
                glow::FLOAT,
                false,
                attribute.stride,
                attribute.offset,
            )
        }
    }

    fn enable_depth_test(&self) {
        unsafe { self.gl.enable(glow::DEPTH_TEST) }
    }

    fn viewport(&self, width: u32, height: u32) {
        unsafe {
            self.gl.viewport(
                0,
                0,
                width.min(i32::MAX as u32) as i32,
                height.min(i32::MAX as u32) as i32,
            )
        }
    }

    fn clear(&self, [r, g, b, a]: [f32; 4]) {
        unsafe {
            self.gl.clear_color(r, g, b, a);
            self.gl
                .clear(glow::COLOR_BUFFER_BIT | glow::DEPTH_BUFFER_BIT);
        }
    }

    fn draw_triangles(&self, first: u32, count: u32) {
        unsafe {
            self.gl
                .draw_arrays(glow::TRIANGLES, first as i32, count as i32)
        }
    }

    fn surface_size(&self) -> (u32, u32) {
        self.surface.get()
    }

    fn create_texture(&self) -> Result<Self::Texture, ContextError> {
        unsafe { self.gl.create_texture() }.map_err(|message| ContextError::Allocation {
            kind: "texture",
            message,
        })
    }

    fn upload_texture_rgba8(&self, texture: Self::Texture, width: u32, height: u32, pixels: &[u8]) {
        unsafe {
            self.gl.bind_texture(glow::TEXTURE_2D, Some(texture));
            self.gl.tex_image_2d(
                glow::TEXTURE_2D,
                0,
                glow::RGBA as i32,
                width as i32,
                height as i32,
                0,
                glow::RGBA,
                glow::UNSIGNED_BYTE,
                Some(pixels),
            );
            self.gl.generate_mipmap(glow::TEXTURE_2D);
            self.gl.bind_texture(glow::TEXTURE_2D, None);
        }
    }
}
