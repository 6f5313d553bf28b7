//! Per-frame state and the seam between a scene and whatever schedules it.

use std::time::Duration;

use crate::config::SceneConfig;
use crate::math::Vec3;
use crate::render::RenderContext;

/// Something that renders one frame when the host asks for it.
///
/// The host owns scheduling (an animation callback, a message pump, a fixed
/// step loop) and passes the absolute time elapsed since its epoch. Each call
/// runs to completion and returns; nothing is rescheduled from inside.
pub trait FrameDriver<C: RenderContext> {
    fn frame(&mut self, ctx: &C, elapsed: Duration) -> FrameStats;
}

/// Summary of one rendered frame.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FrameStats {
    pub frame_index: u64,
    pub elapsed: Duration,
    pub delta: Duration,
    pub light_pos: Vec3,
    pub draw_calls: u32,
}

/// Values recomputed at the start of every frame.
///
/// The light position is a pure function of absolute elapsed time, so two
/// runs fed the same timestamps produce identical frames regardless of the
/// frame rate in between.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FrameState {
    pub last_frame_time: Option<Duration>,
    pub delta: Duration,
    pub frame_index: u64,
    pub light_pos: Vec3,
    pub object_color: Vec3,
    pub light_color: Vec3,
}

impl FrameState {
    pub fn new(config: &SceneConfig) -> Self {
        Self {
            last_frame_time: None,
            delta: Duration::ZERO,
            frame_index: 0,
            light_pos: config.light_orbit.position_at(0.0),
            object_color: config.object_color,
            light_color: config.light_color,
        }
    }

    /// Moves the state to `elapsed`. A timestamp earlier than the previous
    /// one yields a zero delta.
    pub fn advance(&mut self, elapsed: Duration, config: &SceneConfig) {
        self.delta = self
            .last_frame_time
            .map(|last| elapsed.saturating_sub(last))
            .unwrap_or(Duration::ZERO);
        if self.last_frame_time.is_some() {
            self.frame_index = self.frame_index.wrapping_add(1);
        }
        self.last_frame_time = Some(elapsed);
        self.light_pos = config.light_orbit.position_at(elapsed.as_secs_f64());
        self.object_color = config.object_color;
        self.light_color = config.light_color;
    }
}
