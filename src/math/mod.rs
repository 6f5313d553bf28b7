//! Small vector and matrix toolkit for building model, view and projection
//! transforms.
//!
//! Matrices are column-major and composed by left multiplication, matching
//! the layout GLSL `mat4` uniforms expect. No epsilon is applied anywhere;
//! callers comparing results must bring their own tolerance.

mod mat4;
mod vec3;

pub use mat4::{identity, look_at, multiply, perspective, rotate_y, scale, translate, Mat4};
pub use vec3::Vec3;

pub fn degrees_to_radians(degrees: f32) -> f32 {
    degrees * std::f32::consts::PI / 180.0
}

pub fn radians_to_degrees(radians: f32) -> f32 {
    radians * 180.0 / std::f32::consts::PI
}
