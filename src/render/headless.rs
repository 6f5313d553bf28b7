//! Software implementation of [`RenderContext`] that rasterizes nothing.
//!
//! It performs the bookkeeping a GL driver would: it parses each stage with
//! naga to find attributes, uniforms and varyings, checks that the stages
//! agree at link time, tracks bindings, and snapshots every draw call
//! together with the uniform values the active program would see. Misuse a
//! real driver would flag (wrong uniform type, a location from another
//! program, reading past a buffer) is recorded in [`HeadlessContext::errors`].
//!
//! Every declared uniform and attribute counts as active; unlike a real
//! driver nothing is optimized away.

use std::cell::RefCell;
use std::collections::{BTreeMap, HashMap};

use crate::math::{Mat4, Vec3};

use super::reflect::{reflect, Declaration, ShaderInterface};
use super::{ContextError, RenderContext, ShaderStage, VertexAttribute};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct BufferId(u32);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ShaderId(u32);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ProgramId(u32);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TextureId(u32);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct UniformId {
    program: ProgramId,
    index: usize,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum UniformValue {
    Vec3(Vec3),
    Mat4(Mat4),
}

impl UniformValue {
    fn glsl_type(&self) -> &'static str {
        match self {
            UniformValue::Vec3(_) => "vec3",
            UniformValue::Mat4(_) => "mat4",
        }
    }
}

/// Snapshot of the pipeline state at a draw call.
#[derive(Debug, Clone, PartialEq)]
pub struct DrawCall {
    pub program: ProgramId,
    pub array_buffer: Option<BufferId>,
    /// Enabled attribute locations and the buffer each one reads from.
    pub attributes: BTreeMap<u32, (BufferId, VertexAttribute)>,
    pub first: u32,
    pub count: u32,
    pub uniforms: BTreeMap<String, UniformValue>,
}

#[derive(Debug)]
struct LinkedProgram {
    /// Attribute names and their locations.
    attributes: Vec<(String, u32)>,
    uniforms: Vec<Declaration>,
    values: HashMap<usize, UniformValue>,
}

#[derive(Debug, Default, Clone, Copy)]
struct AttributeSlot {
    enabled: bool,
    pointer: Option<(BufferId, VertexAttribute)>,
}

#[derive(Debug, Default)]
struct State {
    surface: (u32, u32),
    next_id: u32,
    buffers: HashMap<BufferId, usize>,
    bound_buffer: Option<BufferId>,
    shaders: HashMap<ShaderId, ShaderInterface>,
    programs: HashMap<ProgramId, LinkedProgram>,
    current_program: Option<ProgramId>,
    attributes: BTreeMap<u32, AttributeSlot>,
    textures: HashMap<TextureId, Option<(u32, u32)>>,
    depth_test: bool,
    viewport: Option<(u32, u32)>,
    clear_color: Option<[f32; 4]>,
    clear_count: usize,
    uniform_lookups: usize,
    draws: Vec<DrawCall>,
    errors: Vec<String>,
}

impl State {
    fn next_id(&mut self) -> u32 {
        self.next_id += 1;
        self.next_id
    }
}

/// Recording context with a fixed, resizable surface.
#[derive(Debug)]
pub struct HeadlessContext {
    state: RefCell<State>,
}

impl HeadlessContext {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            state: RefCell::new(State {
                surface: (width, height),
                ..State::default()
            }),
        }
    }

    pub fn set_surface_size(&self, width: u32, height: u32) {
        self.state.borrow_mut().surface = (width, height);
    }

    pub fn draw_calls(&self) -> Vec<DrawCall> {
        self.state.borrow().draws.clone()
    }

    /// Returns and forgets the draw calls recorded so far.
    pub fn take_draw_calls(&self) -> Vec<DrawCall> {
        std::mem::take(&mut self.state.borrow_mut().draws)
    }

    /// Driver-style errors raised by invalid calls, oldest first.
    pub fn errors(&self) -> Vec<String> {
        self.state.borrow().errors.clone()
    }

    pub fn viewport(&self) -> Option<(u32, u32)> {
        self.state.borrow().viewport
    }

    pub fn clear_count(&self) -> usize {
        self.state.borrow().clear_count
    }

    pub fn clear_color(&self) -> Option<[f32; 4]> {
        self.state.borrow().clear_color
    }

    pub fn depth_test_enabled(&self) -> bool {
        self.state.borrow().depth_test
    }

    /// How many times a uniform location was queried from the "driver".
    pub fn uniform_lookup_count(&self) -> usize {
        self.state.borrow().uniform_lookups
    }

    pub fn live_shader_count(&self) -> usize {
        self.state.borrow().shaders.len()
    }

    pub fn current_program(&self) -> Option<ProgramId> {
        self.state.borrow().current_program
    }

    pub fn buffer_len(&self, buffer: BufferId) -> Option<usize> {
        self.state.borrow().buffers.get(&buffer).copied()
    }

    /// Dimensions of the texture's level 0, once pixels were uploaded.
    pub fn texture_size(&self, texture: TextureId) -> Option<(u32, u32)> {
        self.state.borrow().textures.get(&texture).copied().flatten()
    }

    /// Current values of every uniform set on `program`, keyed by name.
    pub fn uniform_values(&self, program: ProgramId) -> BTreeMap<String, UniformValue> {
        let state = self.state.borrow();
        state
            .programs
            .get(&program)
            .map(named_values)
            .unwrap_or_default()
    }

    fn upload_uniform(&self, location: &UniformId, value: UniformValue) {
        let mut guard = self.state.borrow_mut();
        let state = &mut *guard;
        if state.current_program != Some(location.program) {
            let message = format!(
                "INVALID_OPERATION: uniform location of {:?} used while {:?} is active",
                location.program, state.current_program
            );
            state.errors.push(message);
            return;
        }
        let Some(linked) = state.programs.get_mut(&location.program) else {
            state
                .errors
                .push(format!("INVALID_OPERATION: {:?} was deleted", location.program));
            return;
        };
        let declared = &linked.uniforms[location.index];
        if declared.ty != value.glsl_type() {
            let message = format!(
                "INVALID_OPERATION: uniform `{}` is {} but a {} was uploaded",
                declared.name,
                declared.ty,
                value.glsl_type()
            );
            state.errors.push(message);
            return;
        }
        linked.values.insert(location.index, value);
    }
}

fn named_values(linked: &LinkedProgram) -> BTreeMap<String, UniformValue> {
    linked
        .values
        .iter()
        .map(|(index, value)| (linked.uniforms[*index].name.clone(), *value))
        .collect()
}

impl RenderContext for HeadlessContext {
    type Buffer = BufferId;
    type Shader = ShaderId;
    type Program = ProgramId;
    type UniformLocation = UniformId;
    type Texture = TextureId;

    fn create_buffer(&self) -> Result<BufferId, ContextError> {
        let mut state = self.state.borrow_mut();
        let id = BufferId(state.next_id());
        state.buffers.insert(id, 0);
        Ok(id)
    }

    fn bind_array_buffer(&self, buffer: Option<BufferId>) {
        self.state.borrow_mut().bound_buffer = buffer;
    }

    fn upload_array_buffer(&self, data: &[u8]) {
        let mut state = self.state.borrow_mut();
        match state.bound_buffer {
            Some(buffer) => {
                state.buffers.insert(buffer, data.len());
            }
            None => state
                .errors
                .push("INVALID_OPERATION: no array buffer bound for upload".to_string()),
        }
    }

    fn compile_shader(&self, stage: ShaderStage, source: &str) -> Result<ShaderId, String> {
        let compiled = reflect(stage, source)?;
        let mut state = self.state.borrow_mut();
        let id = ShaderId(state.next_id());
        state.shaders.insert(id, compiled);
        Ok(id)
    }

    fn link_program(&self, vertex: ShaderId, fragment: ShaderId) -> Result<ProgramId, String> {
        let mut state = self.state.borrow_mut();
        let linked = {
            let vs = state
                .shaders
                .get(&vertex)
                .ok_or_else(|| format!("ERROR: {vertex:?} does not exist"))?;
            let fs = state
                .shaders
                .get(&fragment)
                .ok_or_else(|| format!("ERROR: {fragment:?} does not exist"))?;
            link(vs, fs)?
        };
        let id = ProgramId(state.next_id());
        state.programs.insert(id, linked);
        Ok(id)
    }

    fn delete_shader(&self, shader: ShaderId) {
        self.state.borrow_mut().shaders.remove(&shader);
    }

    fn delete_program(&self, program: ProgramId) {
        let mut state = self.state.borrow_mut();
        state.programs.remove(&program);
        if state.current_program == Some(program) {
            state.current_program = None;
        }
    }

    fn use_program(&self, program: Option<ProgramId>) {
        let mut state = self.state.borrow_mut();
        if let Some(id) = program {
            if !state.programs.contains_key(&id) {
                state
                    .errors
                    .push(format!("INVALID_VALUE: {id:?} is not a linked program"));
                return;
            }
        }
        state.current_program = program;
    }

    fn attrib_location(&self, program: ProgramId, name: &str) -> Option<u32> {
        let state = self.state.borrow();
        let linked = state.programs.get(&program)?;
        linked
            .attributes
            .iter()
            .find(|(attribute, _)| attribute == name)
            .map(|&(_, location)| location)
    }

    fn uniform_location(&self, program: ProgramId, name: &str) -> Option<UniformId> {
        let mut state = self.state.borrow_mut();
        state.uniform_lookups += 1;
        let linked = state.programs.get(&program)?;
        linked
            .uniforms
            .iter()
            .position(|uniform| uniform.name == name)
            .map(|index| UniformId { program, index })
    }

    fn uniform_vec3(&self, location: &UniformId, value: Vec3) {
        self.upload_uniform(location, UniformValue::Vec3(value));
    }

    fn uniform_mat4(&self, location: &UniformId, value: &Mat4) {
        self.upload_uniform(location, UniformValue::Mat4(*value));
    }

    fn enable_vertex_attrib(&self, location: u32) {
        self.state
            .borrow_mut()
            .attributes
            .entry(location)
            .or_default()
            .enabled = true;
    }

    fn vertex_attrib_pointer(&self, location: u32, attribute: VertexAttribute) {
        let mut state = self.state.borrow_mut();
        let Some(buffer) = state.bound_buffer else {
            state.errors.push(format!(
                "INVALID_OPERATION: attribute {location} pointed at with no array buffer bound"
            ));
            return;
        };
        state.attributes.entry(location).or_default().pointer = Some((buffer, attribute));
    }

    fn enable_depth_test(&self) {
        self.state.borrow_mut().depth_test = true;
    }

    fn viewport(&self, width: u32, height: u32) {
        self.state.borrow_mut().viewport = Some((width, height));
    }

    fn clear(&self, color: [f32; 4]) {
        let mut state = self.state.borrow_mut();
        state.clear_color = Some(color);
        state.clear_count += 1;
    }

    fn draw_triangles(&self, first: u32, count: u32) {
        let mut guard = self.state.borrow_mut();
        let state = &mut *guard;
        let Some(program) = state.current_program else {
            state
                .errors
                .push("INVALID_OPERATION: draw with no program in use".to_string());
            return;
        };

        let mut problems = Vec::new();
        let mut attributes = BTreeMap::new();
        if let Some(linked) = state.programs.get(&program) {
            for (name, location) in &linked.attributes {
                let slot = state
                    .attributes
                    .get(location)
                    .copied()
                    .unwrap_or_default();
                match slot.pointer.filter(|_| slot.enabled) {
                    Some((buffer, attribute)) => {
                        let needed = if count == 0 {
                            0
                        } else {
                            (first + count - 1) as usize * attribute.stride as usize
                                + attribute.offset as usize
                                + attribute.components as usize * std::mem::size_of::<f32>()
                        };
                        let available = state.buffers.get(&buffer).copied().unwrap_or(0);
                        if needed > available {
                            problems.push(format!(
                                "INVALID_OPERATION: attribute `{name}` reads {needed} bytes from \
                                 {buffer:?} holding {available}"
                            ));
                        }
                        attributes.insert(*location, (buffer, attribute));
                    }
                    None => problems.push(format!(
                        "INVALID_OPERATION: attribute `{name}` has no enabled pointer"
                    )),
                }
            }
        }

        let uniforms = state
            .programs
            .get(&program)
            .map(named_values)
            .unwrap_or_default();
        let draw = DrawCall {
            program,
            array_buffer: state.bound_buffer,
            attributes,
            first,
            count,
            uniforms,
        };
        state.errors.extend(problems);
        state.draws.push(draw);
    }

    fn surface_size(&self) -> (u32, u32) {
        self.state.borrow().surface
    }

    fn create_texture(&self) -> Result<TextureId, ContextError> {
        let mut state = self.state.borrow_mut();
        let id = TextureId(state.next_id());
        state.textures.insert(id, None);
        Ok(id)
    }

    fn upload_texture_rgba8(&self, texture: TextureId, width: u32, height: u32, pixels: &[u8]) {
        let mut state = self.state.borrow_mut();
        let expected = width as usize * height as usize * 4;
        if pixels.len() != expected {
            state.errors.push(format!(
                "INVALID_OPERATION: texture upload of {} bytes for {width}x{height} RGBA8",
                pixels.len()
            ));
            return;
        }
        match state.textures.get_mut(&texture) {
            Some(slot) => *slot = Some((width, height)),
            None => state
                .errors
                .push(format!("INVALID_VALUE: {texture:?} does not exist")),
        }
    }
}

fn link(vertex: &ShaderInterface, fragment: &ShaderInterface) -> Result<LinkedProgram, String> {
    if vertex.stage != ShaderStage::Vertex || fragment.stage != ShaderStage::Fragment {
        return Err(format!(
            "ERROR: Linking: expected vertex and fragment stages, got {} and {}",
            vertex.stage, fragment.stage
        ));
    }

    for input in &fragment.inputs {
        match vertex.outputs.iter().find(|output| output.name == input.name) {
            Some(output) if output.ty == input.ty => {}
            Some(output) => {
                return Err(format!(
                    "ERROR: Linking: varying `{}` is {} in the vertex stage but {} in the \
                     fragment stage",
                    input.name, output.ty, input.ty
                ))
            }
            None => {
                return Err(format!(
                    "ERROR: Linking: varying `{}` is read by the fragment stage but never \
                     written by the vertex stage",
                    input.name
                ))
            }
        }
    }

    let mut uniforms: Vec<Declaration> = Vec::new();
    for uniform in vertex.uniforms.iter().chain(&fragment.uniforms) {
        match uniforms.iter().find(|known| known.name == uniform.name) {
            Some(known) if known.ty != uniform.ty => {
                return Err(format!(
                    "ERROR: Linking: uniform `{}` declared as both {} and {}",
                    uniform.name, known.ty, uniform.ty
                ))
            }
            Some(_) => {}
            None => uniforms.push(uniform.clone()),
        }
    }

    Ok(LinkedProgram {
        attributes: attribute_locations(&vertex.inputs),
        uniforms,
        values: HashMap::new(),
    })
}

/// Explicit `layout(location = N)` bindings are used when every input has a
/// distinct one. Otherwise locations follow declaration order.
fn attribute_locations(inputs: &[Declaration]) -> Vec<(String, u32)> {
    let mut explicit: Vec<u32> = inputs.iter().filter_map(|input| input.location).collect();
    explicit.sort_unstable();
    explicit.dedup();
    let distinct = explicit.len() == inputs.len();
    inputs
        .iter()
        .enumerate()
        .map(|(index, input)| {
            let location = match input.location {
                Some(location) if distinct => location,
                _ => index as u32,
            };
            (input.name.clone(), location)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::render::sources::{
        LAMP_FRAGMENT_SHADER, LAMP_VERTEX_SHADER, LIT_FRAGMENT_SHADER, LIT_VERTEX_SHADER,
    };

    fn program(ctx: &HeadlessContext, vs: &str, fs: &str) -> ProgramId {
        let vertex = ctx.compile_shader(ShaderStage::Vertex, vs).unwrap();
        let fragment = ctx.compile_shader(ShaderStage::Fragment, fs).unwrap();
        ctx.link_program(vertex, fragment).unwrap()
    }

    #[test]
    fn lit_program_exposes_expected_interface() {
        let ctx = HeadlessContext::new(640, 480);
        let id = program(&ctx, LIT_VERTEX_SHADER, LIT_FRAGMENT_SHADER);
        assert_eq!(ctx.attrib_location(id, "vertexPosition"), Some(0));
        assert_eq!(ctx.attrib_location(id, "aNormal"), Some(1));
        for name in [
            "model",
            "view",
            "projection",
            "lightPos",
            "viewPos",
            "lightColor",
            "objectColor",
        ] {
            assert!(ctx.uniform_location(id, name).is_some(), "{name}");
        }
        assert!(ctx.uniform_location(id, "doesNotExist").is_none());
    }

    #[test]
    fn comments_do_not_declare_anything() {
        let ctx = HeadlessContext::new(1, 1);
        let vs = "#version 300 es
            // uniform mat4 ghost;
            /* in vec3 phantom; */
            in vec3 p;
            void main() { gl_Position = vec4(p, 1.0); }";
        let id = program(&ctx, vs, LAMP_FRAGMENT_SHADER);
        assert_eq!(ctx.attrib_location(id, "p"), Some(0));
        assert_eq!(ctx.attrib_location(id, "phantom"), None);
        assert!(ctx.uniform_location(id, "ghost").is_none());
    }

    #[test]
    fn explicit_attribute_locations_are_honoured() {
        let ctx = HeadlessContext::new(1, 1);
        let vs = "#version 300 es
            layout(location = 1) in vec3 aNormal;
            layout(location = 0) in vec3 vertexPosition;
            void main() { gl_Position = vec4(vertexPosition + aNormal, 1.0); }";
        let id = program(&ctx, vs, LAMP_FRAGMENT_SHADER);
        assert_eq!(ctx.attrib_location(id, "vertexPosition"), Some(0));
        assert_eq!(ctx.attrib_location(id, "aNormal"), Some(1));
    }

    #[test]
    fn unbalanced_braces_fail_to_compile() {
        let ctx = HeadlessContext::new(1, 1);
        let err = ctx
            .compile_shader(ShaderStage::Vertex, "#version 300 es\nvoid main() {")
            .unwrap_err();
        assert!(err.starts_with("ERROR: 0:"), "{err}");
    }

    #[test]
    fn malformed_expression_fails_with_its_line() {
        let ctx = HeadlessContext::new(1, 1);
        let fs = "#version 300 es
precision mediump float;
out vec4 c;
void main() { c = vec4(1.0 +; }";
        let err = ctx.compile_shader(ShaderStage::Fragment, fs).unwrap_err();
        assert!(err.contains("ERROR: 0:4:"), "{err}");
        assert_eq!(ctx.live_shader_count(), 0);
    }

    #[test]
    fn undeclared_identifier_fails_to_compile() {
        let ctx = HeadlessContext::new(1, 1);
        let vs = "#version 300 es
            void main() { gl_Position = vec4(missing, 1.0); }";
        assert!(ctx.compile_shader(ShaderStage::Vertex, vs).is_err());
    }

    #[test]
    fn varying_type_mismatch_fails_to_link() {
        let ctx = HeadlessContext::new(1, 1);
        let fs = "#version 300 es
            precision mediump float;
            in vec4 Normal;
            in vec3 FragPos;
            out vec4 outputColor;
            void main() { outputColor = Normal + vec4(FragPos, 0.0); }";
        let vertex = ctx
            .compile_shader(ShaderStage::Vertex, LIT_VERTEX_SHADER)
            .unwrap();
        let fragment = ctx.compile_shader(ShaderStage::Fragment, fs).unwrap();
        let err = ctx.link_program(vertex, fragment).unwrap_err();
        assert!(err.contains("`Normal` is vec3"), "{err}");
    }

    #[test]
    fn uploading_wrong_type_is_recorded() {
        let ctx = HeadlessContext::new(1, 1);
        let id = program(&ctx, LAMP_VERTEX_SHADER, LAMP_FRAGMENT_SHADER);
        ctx.use_program(Some(id));
        let model = ctx.uniform_location(id, "model").unwrap();
        ctx.uniform_vec3(&model, Vec3::ONE);
        assert_eq!(ctx.errors().len(), 1);
        assert!(ctx.uniform_values(id).is_empty());
    }

    #[test]
    fn locations_are_bound_to_their_program() {
        let ctx = HeadlessContext::new(1, 1);
        let lamp = program(&ctx, LAMP_VERTEX_SHADER, LAMP_FRAGMENT_SHADER);
        let other = program(&ctx, LAMP_VERTEX_SHADER, LAMP_FRAGMENT_SHADER);
        let location = ctx.uniform_location(lamp, "model").unwrap();
        ctx.use_program(Some(other));
        ctx.uniform_mat4(&location, &Mat4::IDENTITY);
        assert!(ctx.errors()[0].contains("INVALID_OPERATION"));
        assert!(ctx.uniform_values(other).is_empty());
    }

    #[test]
    fn draw_flags_attribute_reading_past_buffer() {
        let ctx = HeadlessContext::new(1, 1);
        let id = program(&ctx, LAMP_VERTEX_SHADER, LAMP_FRAGMENT_SHADER);
        let buffer = ctx.create_buffer().unwrap();
        ctx.bind_array_buffer(Some(buffer));
        ctx.upload_array_buffer(&[0u8; 32 * 3]);
        ctx.enable_vertex_attrib(0);
        ctx.vertex_attrib_pointer(
            0,
            VertexAttribute {
                components: 3,
                stride: 32,
                offset: 0,
            },
        );
        ctx.use_program(Some(id));

        ctx.draw_triangles(0, 3);
        assert!(ctx.errors().is_empty());
        ctx.draw_triangles(0, 36);
        assert_eq!(ctx.errors().len(), 1);
        assert_eq!(ctx.draw_calls().len(), 2);
    }
}
