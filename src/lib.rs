//! A Phong-lit cube with an orbiting lamp, rendered through a GL-style
//! context.
//!
//! The crate is split into a small vector/matrix library, a camera, a shader
//! program wrapper over the [`render::RenderContext`] capability, and the
//! [`scene::LightingScene`] orchestrator that hosts drive one frame at a time.
//! Hosts own the surface and the scheduling: the native binary drives a
//! recording context headlessly, the web entry point drives WebGL2 from
//! `requestAnimationFrame`.

pub mod camera;
pub mod config;
pub mod frame;
pub mod geometry;
pub mod math;
pub mod render;
pub mod scene;
pub mod sink;
#[cfg(not(target_arch = "wasm32"))]
pub mod texture;
#[cfg(target_arch = "wasm32")]
pub mod web;

pub use camera::Camera;
pub use config::{ConfigError, LightOrbit, SceneConfig};
pub use frame::{FrameDriver, FrameState, FrameStats};
pub use math::{Mat4, Vec3};
pub use render::{GlContext, HeadlessContext, RenderContext, ShaderError, ShaderProgram};
pub use scene::{LightingScene, SetupError, ShaderSources};
pub use sink::{ErrorSink, LogSink};
#[cfg(not(target_arch = "wasm32"))]
pub use texture::{TextureError, TextureLoader};
