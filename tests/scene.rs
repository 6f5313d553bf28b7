use std::cell::RefCell;
use std::time::Duration;

use lighting_cube::geometry::{CUBE_VERTEX_COUNT, NORMAL_ATTRIBUTE, POSITION_ATTRIBUTE};
use lighting_cube::math::{degrees_to_radians, identity, rotate_y, scale, translate};
use lighting_cube::render::headless::{DrawCall, UniformValue};
use lighting_cube::render::sources::{LAMP_FRAGMENT_SHADER, LIT_VERTEX_SHADER};
use lighting_cube::{
    Camera, FrameDriver, HeadlessContext, LightingScene, LogSink, Mat4, SceneConfig,
    SetupError, ShaderError, ShaderSources, Vec3,
};

fn build(ctx: &HeadlessContext) -> LightingScene<HeadlessContext> {
    LightingScene::new(ctx, SceneConfig::default(), &LogSink).expect("scene builds")
}

fn vec3(draw: &DrawCall, name: &str) -> Vec3 {
    match draw.uniforms.get(name) {
        Some(UniformValue::Vec3(value)) => *value,
        other => panic!("uniform `{name}` is {other:?}"),
    }
}

fn mat4(draw: &DrawCall, name: &str) -> Mat4 {
    match draw.uniforms.get(name) {
        Some(UniformValue::Mat4(value)) => *value,
        other => panic!("uniform `{name}` is {other:?}"),
    }
}

fn assert_close(a: &Mat4, b: &Mat4) {
    for (x, y) in a.to_cols_array().iter().zip(b.to_cols_array().iter()) {
        assert!((x - y).abs() < 1e-5, "{a:?} != {b:?}");
    }
}

#[test]
fn each_frame_draws_cube_then_lamp() {
    let ctx = HeadlessContext::new(800, 600);
    let mut scene = build(&ctx);

    let stats = scene.frame(&ctx, Duration::ZERO);
    assert_eq!(stats.draw_calls, 2);

    let draws = ctx.take_draw_calls();
    assert_eq!(draws.len(), 2);
    let (cube, lamp) = (&draws[0], &draws[1]);
    assert_ne!(cube.program, lamp.program);
    assert_ne!(cube.array_buffer, lamp.array_buffer);
    for draw in &draws {
        assert_eq!(draw.first, 0);
        assert_eq!(draw.count, CUBE_VERTEX_COUNT);
    }
    assert!(ctx.errors().is_empty(), "{:?}", ctx.errors());
    assert_eq!(ctx.viewport(), Some((800, 600)));
    assert_eq!(ctx.clear_color(), Some([0.08, 0.08, 0.08, 1.0]));
}

#[test]
fn attribute_pointers_follow_the_bound_mesh() {
    let ctx = HeadlessContext::new(800, 600);
    let mut scene = build(&ctx);
    scene.frame(&ctx, Duration::from_millis(250));
    scene.frame(&ctx, Duration::from_millis(266));

    let draws = ctx.draw_calls();
    assert_eq!(draws.len(), 4);
    for pair in draws.chunks(2) {
        let (cube, lamp) = (&pair[0], &pair[1]);
        let cube_buffer = cube.array_buffer.expect("cube buffer bound");
        let lamp_buffer = lamp.array_buffer.expect("lamp buffer bound");

        assert_eq!(cube.attributes.len(), 2);
        assert_eq!(cube.attributes[&0], (cube_buffer, POSITION_ATTRIBUTE));
        assert_eq!(cube.attributes[&1], (cube_buffer, NORMAL_ATTRIBUTE));

        assert_eq!(lamp.attributes.len(), 1);
        assert_eq!(lamp.attributes[&0], (lamp_buffer, POSITION_ATTRIBUTE));
    }
    assert!(ctx.errors().is_empty(), "{:?}", ctx.errors());
}

#[test]
fn lit_uniforms_describe_the_scene() {
    let ctx = HeadlessContext::new(800, 600);
    let mut scene = build(&ctx);
    let elapsed = Duration::from_millis(1500);
    let stats = scene.frame(&ctx, elapsed);
    let draws = ctx.take_draw_calls();
    let cube = &draws[0];

    let t = elapsed.as_secs_f64();
    let expected_light = Vec3::new(1.0 + t.sin() as f32 * 2.0, (t / 2.0).sin() as f32, 2.0);
    assert!((stats.light_pos - expected_light).length() < 1e-6);
    assert_eq!(vec3(cube, "lightPos"), stats.light_pos);
    assert_eq!(vec3(cube, "objectColor"), Vec3::new(1.0, 0.5, 0.31));
    assert_eq!(vec3(cube, "lightColor"), Vec3::ONE);
    assert_eq!(vec3(cube, "viewPos"), Vec3::new(0.0, 0.0, 10.0));

    let camera = Camera::new(Vec3::new(0.0, 0.0, 10.0), Vec3::Y);
    assert_close(&mat4(cube, "view"), &camera.view_matrix());
    assert_close(
        &mat4(cube, "model"),
        &rotate_y(&identity(), degrees_to_radians(-10.0)),
    );

    let projection = mat4(cube, "projection");
    let focal = 1.0 / (std::f32::consts::FRAC_PI_4 / 2.0).tan();
    assert!((projection.get(1, 1) - focal).abs() < 1e-5);
    assert!((projection.get(0, 0) - focal * 600.0 / 800.0).abs() < 1e-5);
}

#[test]
fn lamp_shares_projection_and_view_and_follows_the_light() {
    let ctx = HeadlessContext::new(1024, 768);
    let mut scene = build(&ctx);
    let stats = scene.frame(&ctx, Duration::from_secs(3));
    let draws = ctx.take_draw_calls();
    let (cube, lamp) = (&draws[0], &draws[1]);

    assert_eq!(mat4(lamp, "projection"), mat4(cube, "projection"));
    assert_eq!(mat4(lamp, "view"), mat4(cube, "view"));
    let expected = scale(
        &translate(&identity(), stats.light_pos),
        Vec3::splat(0.1),
    );
    assert_close(&mat4(lamp, "model"), &expected);
    assert!(!lamp.uniforms.contains_key("objectColor"));
}

#[test]
fn cube_pose_does_not_accumulate() {
    let ctx = HeadlessContext::new(800, 600);
    let mut scene = build(&ctx);
    for ms in [0, 16, 33, 50, 66] {
        scene.frame(&ctx, Duration::from_millis(ms));
    }
    let draws = ctx.draw_calls();
    let first = mat4(&draws[0], "model");
    let last = mat4(&draws[draws.len() - 2], "model");
    assert_eq!(first, last);
}

#[test]
fn same_timestamps_give_identical_frames() {
    let run = || {
        let ctx = HeadlessContext::new(640, 480);
        let mut scene = build(&ctx);
        for ms in [0, 500, 1250] {
            scene.frame(&ctx, Duration::from_millis(ms));
        }
        ctx.take_draw_calls()
            .into_iter()
            .map(|draw| draw.uniforms)
            .collect::<Vec<_>>()
    };
    assert_eq!(run(), run());
}

#[test]
fn resize_between_frames_updates_viewport_and_projection() {
    let ctx = HeadlessContext::new(800, 600);
    let mut scene = build(&ctx);
    scene.frame(&ctx, Duration::ZERO);
    ctx.set_surface_size(400, 400);
    scene.frame(&ctx, Duration::from_millis(16));

    assert_eq!(ctx.viewport(), Some((400, 400)));
    let draws = ctx.draw_calls();
    let projection = mat4(&draws[2], "projection");
    assert!((projection.get(0, 0) - projection.get(1, 1)).abs() < 1e-6);
    assert_eq!(ctx.clear_count(), 2);
}

#[test]
fn frame_stats_report_delta_between_ticks() {
    let ctx = HeadlessContext::new(800, 600);
    let mut scene = build(&ctx);
    let first = scene.frame(&ctx, Duration::from_millis(1000));
    let second = scene.frame(&ctx, Duration::from_millis(1020));
    assert_eq!(first.delta, Duration::ZERO);
    assert_eq!(second.delta, Duration::from_millis(20));
    assert_eq!(second.frame_index, 1);
    assert_eq!(scene.state().last_frame_time, Some(Duration::from_millis(1020)));
}

#[test]
fn camera_moves_are_picked_up_next_frame() {
    let ctx = HeadlessContext::new(800, 600);
    let mut scene = build(&ctx);
    scene.camera_mut().position = Vec3::new(1.0, 2.0, 8.0);
    scene.frame(&ctx, Duration::ZERO);
    let draws = ctx.take_draw_calls();
    assert_eq!(vec3(&draws[0], "viewPos"), Vec3::new(1.0, 2.0, 8.0));
}

#[test]
fn compile_failure_reaches_the_sink_and_nothing_is_drawn() {
    let ctx = HeadlessContext::new(800, 600);
    let reports = RefCell::new(Vec::<String>::new());
    let sink = |text: &str| reports.borrow_mut().push(text.to_owned());
    let sources = ShaderSources {
        lit_fragment: "#version 300 es\nout vec4 outputColor;\nvoid main() { outputColor = vec4(1.0);",
        ..ShaderSources::default()
    };

    let result = LightingScene::with_sources(&ctx, SceneConfig::default(), sources, &sink);
    match result {
        Err(SetupError::Shader(ShaderError::Compile { .. })) => {}
        Err(other) => panic!("unexpected error {other}"),
        Ok(_) => panic!("broken fragment shader must not build"),
    }
    let reports = reports.borrow();
    assert_eq!(reports.len(), 1);
    assert!(reports[0].contains("fragment"), "{}", reports[0]);
    assert!(ctx.draw_calls().is_empty());
}

#[test]
fn lamp_program_without_position_is_rejected() {
    let ctx = HeadlessContext::new(800, 600);
    let reports = RefCell::new(Vec::<String>::new());
    let sink = |text: &str| reports.borrow_mut().push(text.to_owned());
    let sources = ShaderSources {
        lamp_vertex: "#version 300 es\nvoid main() { gl_Position = vec4(0.0); }",
        lamp_fragment: LAMP_FRAGMENT_SHADER,
        lit_vertex: LIT_VERTEX_SHADER,
        ..ShaderSources::default()
    };

    let result = LightingScene::with_sources(&ctx, SceneConfig::default(), sources, &sink);
    assert!(matches!(
        result,
        Err(SetupError::MissingAttribute {
            program: "lamp",
            name: "vertexPosition"
        })
    ));
    assert_eq!(reports.borrow().len(), 1);
}

#[test]
fn config_overrides_flow_into_uniforms() {
    let config = SceneConfig::from_json_str(
        r#"{
            "object_color": [0.2, 0.4, 0.6],
            "camera_position": [0, 1, 5],
            "light_orbit": { "origin": [0, 3, 0], "amplitude": [0, 0, 0] }
        }"#,
    )
    .unwrap();
    let ctx = HeadlessContext::new(800, 600);
    let mut scene = LightingScene::new(&ctx, config, &LogSink).unwrap();
    let stats = scene.frame(&ctx, Duration::from_secs(7));
    assert_eq!(stats.light_pos, Vec3::new(0.0, 3.0, 0.0));

    let draws = ctx.take_draw_calls();
    assert_eq!(vec3(&draws[0], "objectColor"), Vec3::new(0.2, 0.4, 0.6));
    assert_eq!(vec3(&draws[0], "viewPos"), Vec3::new(0.0, 1.0, 5.0));
}
