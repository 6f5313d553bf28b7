use crate::math::{look_at, Mat4, Vec3};

/// Fly-style camera described by a position and a fixed viewing direction.
///
/// The camera is plain data: controllers mutate `position` directly and the
/// view matrix is derived fresh on every request.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Camera {
    pub position: Vec3,
    pub front: Vec3,
    pub up: Vec3,
}

impl Camera {
    pub const DEFAULT_FRONT: Vec3 = Vec3::new(0.0, 0.0, -1.0);

    /// Creates a camera at `position` looking down negative Z.
    pub fn new(position: Vec3, up: Vec3) -> Self {
        Self {
            position,
            front: Self::DEFAULT_FRONT,
            up,
        }
    }

    pub fn view_matrix(&self) -> Mat4 {
        look_at(self.position, self.position + self.front, self.up)
    }
}

impl Default for Camera {
    fn default() -> Self {
        Self::new(Vec3::ZERO, Vec3::Y)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn world_origin_lands_in_front_of_camera() {
        let camera = Camera::new(Vec3::new(0.0, 0.0, 10.0), Vec3::Y);
        let p = camera.view_matrix().transform_point(Vec3::ZERO);
        assert!((p - Vec3::new(0.0, 0.0, -10.0)).length() < 1e-6, "{p:?}");
    }

    #[test]
    fn view_tracks_position_changes() {
        let mut camera = Camera::new(Vec3::new(0.0, 0.0, 10.0), Vec3::Y);
        let before = camera.view_matrix();
        camera.position.x = 2.0;
        let after = camera.view_matrix();
        assert_ne!(before, after);
        let p = after.transform_point(Vec3::new(2.0, 0.0, 0.0));
        assert!((p - Vec3::new(0.0, 0.0, -10.0)).length() < 1e-6);
    }
}
