//! Unit cube geometry shared by the lit cube and the lamp.
//!
//! Each vertex interleaves `position.xyz`, `texcoord.uv` and `normal.xyz`.
//! Triangles wind counter-clockwise when seen from outside the cube.

use crate::render::{ContextError, RenderContext, VertexAttribute};

pub const FLOATS_PER_VERTEX: usize = 8;
pub const CUBE_VERTEX_COUNT: u32 = 36;
pub const VERTEX_STRIDE: i32 = (FLOATS_PER_VERTEX * std::mem::size_of::<f32>()) as i32;

pub const POSITION_ATTRIBUTE: VertexAttribute = VertexAttribute {
    components: 3,
    stride: VERTEX_STRIDE,
    offset: 0,
};

/// Present in the buffer; neither scene program samples a texture.
#[cfg(test)]
const TEXCOORD_ATTRIBUTE: VertexAttribute = VertexAttribute {
    components: 2,
    stride: VERTEX_STRIDE,
    offset: 3 * std::mem::size_of::<f32>() as i32,
};

pub const NORMAL_ATTRIBUTE: VertexAttribute = VertexAttribute {
    components: 3,
    stride: VERTEX_STRIDE,
    offset: 5 * std::mem::size_of::<f32>() as i32,
};

#[rustfmt::skip]
pub const CUBE_VERTICES: [f32; CUBE_VERTEX_COUNT as usize * FLOATS_PER_VERTEX] = [
    // back face (-z)
    -0.5, -0.5, -0.5,  0.0, 0.0,  0.0,  0.0, -1.0,
     0.5,  0.5, -0.5,  1.0, 1.0,  0.0,  0.0, -1.0,
     0.5, -0.5, -0.5,  1.0, 0.0,  0.0,  0.0, -1.0,
     0.5,  0.5, -0.5,  1.0, 1.0,  0.0,  0.0, -1.0,
    -0.5, -0.5, -0.5,  0.0, 0.0,  0.0,  0.0, -1.0,
    -0.5,  0.5, -0.5,  0.0, 1.0,  0.0,  0.0, -1.0,
    // front face (+z)
    -0.5, -0.5,  0.5,  0.0, 0.0,  0.0,  0.0,  1.0,
     0.5, -0.5,  0.5,  1.0, 0.0,  0.0,  0.0,  1.0,
     0.5,  0.5,  0.5,  1.0, 1.0,  0.0,  0.0,  1.0,
     0.5,  0.5,  0.5,  1.0, 1.0,  0.0,  0.0,  1.0,
    -0.5,  0.5,  0.5,  0.0, 1.0,  0.0,  0.0,  1.0,
    -0.5, -0.5,  0.5,  0.0, 0.0,  0.0,  0.0,  1.0,
    // left face (-x)
    -0.5,  0.5,  0.5,  1.0, 0.0, -1.0,  0.0,  0.0,
    -0.5,  0.5, -0.5,  1.0, 1.0, -1.0,  0.0,  0.0,
    -0.5, -0.5, -0.5,  0.0, 1.0, -1.0,  0.0,  0.0,
    -0.5, -0.5, -0.5,  0.0, 1.0, -1.0,  0.0,  0.0,
    -0.5, -0.5,  0.5,  0.0, 0.0, -1.0,  0.0,  0.0,
    -0.5,  0.5,  0.5,  1.0, 0.0, -1.0,  0.0,  0.0,
    // right face (+x)
     0.5,  0.5,  0.5,  1.0, 0.0,  1.0,  0.0,  0.0,
     0.5, -0.5, -0.5,  0.0, 1.0,  1.0,  0.0,  0.0,
     0.5,  0.5, -0.5,  1.0, 1.0,  1.0,  0.0,  0.0,
     0.5, -0.5, -0.5,  0.0, 1.0,  1.0,  0.0,  0.0,
     0.5,  0.5,  0.5,  1.0, 0.0,  1.0,  0.0,  0.0,
     0.5, -0.5,  0.5,  0.0, 0.0,  1.0,  0.0,  0.0,
    // bottom face (-y)
    -0.5, -0.5, -0.5,  0.0, 1.0,  0.0, -1.0,  0.0,
     0.5, -0.5, -0.5,  1.0, 1.0,  0.0, -1.0,  0.0,
     0.5, -0.5,  0.5,  1.0, 0.0,  0.0, -1.0,  0.0,
     0.5, -0.5,  0.5,  1.0, 0.0,  0.0, -1.0,  0.0,
    -0.5, -0.5,  0.5,  0.0, 0.0,  0.0, -1.0,  0.0,
    -0.5, -0.5, -0.5,  0.0, 1.0,  0.0, -1.0,  0.0,
    // top face (+y)
    -0.5,  0.5, -0.5,  0.0, 1.0,  0.0,  1.0,  0.0,
     0.5,  0.5,  0.5,  1.0, 0.0,  0.0,  1.0,  0.0,
     0.5,  0.5, -0.5,  1.0, 1.0,  0.0,  1.0,  0.0,
     0.5,  0.5,  0.5,  1.0, 0.0,  0.0,  1.0,  0.0,
    -0.5,  0.5, -0.5,  0.0, 1.0,  0.0,  1.0,  0.0,
    -0.5,  0.5,  0.5,  0.0, 0.0,  0.0,  1.0,  0.0,
];

/// A vertex buffer plus the attribute pointers a program reads from it.
///
/// Attribute pointers capture whichever buffer is bound when they are set,
/// so [`bind`](Self::bind) re-binds the buffer and re-points every attribute
/// right before each draw.
#[derive(Debug, Clone, PartialEq)]
pub struct MeshBinding<B> {
    buffer: B,
    attributes: Vec<(u32, VertexAttribute)>,
    vertex_count: u32,
}

impl<B: Copy> MeshBinding<B> {
    /// Creates a buffer and fills it with `vertices` as static data.
    pub fn upload<C>(ctx: &C, vertices: &[f32]) -> Result<Self, ContextError>
    where
        C: RenderContext<Buffer = B>,
    {
        let buffer = ctx.create_buffer()?;
        ctx.bind_array_buffer(Some(buffer));
        ctx.upload_array_buffer(bytemuck::cast_slice(vertices));
        Ok(Self {
            buffer,
            attributes: Vec::new(),
            vertex_count: (vertices.len() / FLOATS_PER_VERTEX) as u32,
        })
    }

    pub fn with_attribute(mut self, location: u32, attribute: VertexAttribute) -> Self {
        self.attributes.push((location, attribute));
        self
    }

    pub fn buffer(&self) -> B {
        self.buffer
    }

    pub fn vertex_count(&self) -> u32 {
        self.vertex_count
    }

    pub fn bind<C>(&self, ctx: &C)
    where
        C: RenderContext<Buffer = B>,
    {
        ctx.bind_array_buffer(Some(self.buffer));
        for &(location, attribute) in &self.attributes {
            ctx.enable_vertex_attrib(location);
            ctx.vertex_attrib_pointer(location, attribute);
        }
    }

    /// Binds and issues a triangle-list draw over every vertex. Returns the
    /// number of draw calls issued, zero for an empty mesh.
    pub fn draw<C>(&self, ctx: &C) -> u32
    where
        C: RenderContext<Buffer = B>,
    {
        if self.vertex_count == 0 {
            return 0;
        }
        self.bind(ctx);
        ctx.draw_triangles(0, self.vertex_count);
        1
    }
}
