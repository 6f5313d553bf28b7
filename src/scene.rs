//! The lighting scene: a Phong-lit cube and a small lamp cube that orbits it.

use std::time::Duration;

use log::{debug, info};
use thiserror::Error;

use crate::camera::Camera;
use crate::config::SceneConfig;
use crate::frame::{FrameDriver, FrameState, FrameStats};
use crate::geometry::{MeshBinding, CUBE_VERTICES, NORMAL_ATTRIBUTE, POSITION_ATTRIBUTE};
use crate::math::{degrees_to_radians, identity, perspective, rotate_y, scale, translate, Mat4, Vec3};
use crate::render::sources::{
    LAMP_FRAGMENT_SHADER, LAMP_VERTEX_SHADER, LIT_FRAGMENT_SHADER, LIT_VERTEX_SHADER,
};
use crate::render::{ContextError, RenderContext, ShaderError, ShaderProgram};
use crate::sink::ErrorSink;

const POSITION: &str = "vertexPosition";
const NORMAL: &str = "aNormal";

#[derive(Debug, Error)]
pub enum SetupError {
    #[error(transparent)]
    Shader(#[from] ShaderError),
    #[error("failed to get attribute locations for the {program} program: `{name}` is missing")]
    MissingAttribute {
        program: &'static str,
        name: &'static str,
    },
    #[error(transparent)]
    Context(#[from] ContextError),
}

/// GLSL sources for both programs. Defaults to the built-in shaders.
#[derive(Debug, Clone, Copy)]
pub struct ShaderSources<'a> {
    pub lit_vertex: &'a str,
    pub lit_fragment: &'a str,
    pub lamp_vertex: &'a str,
    pub lamp_fragment: &'a str,
}

impl Default for ShaderSources<'static> {
    fn default() -> Self {
        Self {
            lit_vertex: LIT_VERTEX_SHADER,
            lit_fragment: LIT_FRAGMENT_SHADER,
            lamp_vertex: LAMP_VERTEX_SHADER,
            lamp_fragment: LAMP_FRAGMENT_SHADER,
        }
    }
}

pub struct LightingScene<C: RenderContext> {
    config: SceneConfig,
    camera: Camera,
    state: FrameState,
    lit: ShaderProgram<C>,
    lamp: ShaderProgram<C>,
    cube: MeshBinding<C::Buffer>,
    lamp_mesh: MeshBinding<C::Buffer>,
}

impl<C: RenderContext> LightingScene<C> {
    /// Builds the scene with the built-in shaders. Any failure is reported to
    /// `sink` before it is returned.
    pub fn new(ctx: &C, config: SceneConfig, sink: &dyn ErrorSink) -> Result<Self, SetupError> {
        Self::with_sources(ctx, config, ShaderSources::default(), sink)
    }

    pub fn with_sources(
        ctx: &C,
        config: SceneConfig,
        sources: ShaderSources<'_>,
        sink: &dyn ErrorSink,
    ) -> Result<Self, SetupError> {
        Self::build(ctx, config, sources).map_err(|err| {
            sink.report_error(&err.to_string());
            err
        })
    }

    fn build(ctx: &C, config: SceneConfig, sources: ShaderSources<'_>) -> Result<Self, SetupError> {
        let lit = ShaderProgram::new(ctx, sources.lit_vertex, sources.lit_fragment)?;
        let lamp = ShaderProgram::new(ctx, sources.lamp_vertex, sources.lamp_fragment)?;

        let lit_position = required_attribute(ctx, &lit, "lit", POSITION)?;
        let lit_normal = required_attribute(ctx, &lit, "lit", NORMAL)?;
        let lamp_position = required_attribute(ctx, &lamp, "lamp", POSITION)?;
        debug!(
            "attribute locations: lit position={lit_position} normal={lit_normal}, lamp position={lamp_position}"
        );

        let cube = MeshBinding::upload(ctx, &CUBE_VERTICES)?
            .with_attribute(lit_position, POSITION_ATTRIBUTE)
            .with_attribute(lit_normal, NORMAL_ATTRIBUTE);
        let lamp_mesh = MeshBinding::upload(ctx, &CUBE_VERTICES)?
            .with_attribute(lamp_position, POSITION_ATTRIBUTE);

        ctx.enable_depth_test();

        let camera = Camera::new(config.camera_position, config.camera_up);
        let state = FrameState::new(&config);
        info!(
            "lighting scene ready: camera at {:?}, {} vertices per mesh",
            camera.position,
            cube.vertex_count()
        );

        Ok(Self {
            config,
            camera,
            state,
            lit,
            lamp,
            cube,
            lamp_mesh,
        })
    }

    pub fn config(&self) -> &SceneConfig {
        &self.config
    }

    pub fn camera(&self) -> &Camera {
        &self.camera
    }

    pub fn camera_mut(&mut self) -> &mut Camera {
        &mut self.camera
    }

    pub fn state(&self) -> &FrameState {
        &self.state
    }

    /// Projection for a surface of the given size. A surface with a zero
    /// dimension falls back to a square aspect.
    pub fn projection(&self, width: u32, height: u32) -> Mat4 {
        let aspect = if width == 0 || height == 0 {
            1.0
        } else {
            width as f32 / height as f32
        };
        perspective(
            degrees_to_radians(self.config.fov_y_degrees),
            aspect,
            self.config.near,
            self.config.far,
        )
    }

    /// Static pose of the lit cube, rebuilt from identity every frame.
    pub fn cube_model(&self) -> Mat4 {
        rotate_y(&identity(), degrees_to_radians(self.config.cube_rotation_degrees))
    }

    pub fn lamp_model(&self, light_pos: Vec3) -> Mat4 {
        scale(
            &translate(&identity(), light_pos),
            Vec3::splat(self.config.lamp_scale),
        )
    }

    /// Releases both programs. Buffers are left to the context's teardown.
    pub fn destroy(self, ctx: &C) {
        self.lit.destroy(ctx);
        self.lamp.destroy(ctx);
    }
}

impl<C: RenderContext> FrameDriver<C> for LightingScene<C> {
    fn frame(&mut self, ctx: &C, elapsed: Duration) -> FrameStats {
        self.state.advance(elapsed, &self.config);

        let (width, height) = ctx.surface_size();
        ctx.viewport(width, height);
        ctx.clear(self.config.clear_color);

        let light_pos = self.state.light_pos;
        let projection = self.projection(width, height);
        let view = self.camera.view_matrix();
        let cube_model = self.cube_model();
        let lamp_model = self.lamp_model(light_pos);

        self.lit.use_program(ctx);
        self.lit.set_vec3(ctx, "objectColor", self.state.object_color);
        self.lit.set_vec3(ctx, "lightColor", self.state.light_color);
        self.lit.set_vec3(ctx, "lightPos", light_pos);
        self.lit.set_vec3(ctx, "viewPos", self.camera.position);
        self.lit.set_mat4(ctx, "projection", &projection);
        self.lit.set_mat4(ctx, "view", &view);
        self.lit.set_mat4(ctx, "model", &cube_model);
        let mut draw_calls = self.cube.draw(ctx);

        self.lamp.use_program(ctx);
        self.lamp.set_mat4(ctx, "projection", &projection);
        self.lamp.set_mat4(ctx, "view", &view);
        self.lamp.set_mat4(ctx, "model", &lamp_model);
        draw_calls += self.lamp_mesh.draw(ctx);

        FrameStats {
            frame_index: self.state.frame_index,
            elapsed,
            delta: self.state.delta,
            light_pos,
            draw_calls,
        }
    }
}

fn required_attribute<C: RenderContext>(
    ctx: &C,
    program: &ShaderProgram<C>,
    label: &'static str,
    name: &'static str,
) -> Result<u32, SetupError> {
    program
        .attrib_location(ctx, name)
        .ok_or(SetupError::MissingAttribute {
            program: label,
            name,
        })
}
