use std::ops::Mul;

use bytemuck::{Pod, Zeroable};

use super::Vec3;

/// 4x4 transform stored column-major, the layout GL uniforms expect.
///
/// Element `(col, row)` lives at index `col * 4 + row`. The default value is
/// the identity.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Pod, Zeroable)]
pub struct Mat4 {
    cols: [f32; 16],
}

impl Mat4 {
    pub const IDENTITY: Self = Self {
        cols: [
            1.0, 0.0, 0.0, 0.0, //
            0.0, 1.0, 0.0, 0.0, //
            0.0, 0.0, 1.0, 0.0, //
            0.0, 0.0, 0.0, 1.0,
        ],
    };

    pub const fn from_cols_array(cols: [f32; 16]) -> Self {
        Self { cols }
    }

    pub const fn to_cols_array(&self) -> [f32; 16] {
        self.cols
    }

    pub fn as_array(&self) -> &[f32; 16] {
        &self.cols
    }

    /// Element at column `col`, row `row`.
    pub fn get(&self, col: usize, row: usize) -> f32 {
        self.cols[col * 4 + row]
    }

    /// Multiplies a homogeneous column vector.
    pub fn transform_vec4(&self, v: [f32; 4]) -> [f32; 4] {
        let mut out = [0.0; 4];
        for (row, slot) in out.iter_mut().enumerate() {
            *slot = (0..4).map(|col| self.get(col, row) * v[col]).sum();
        }
        out
    }

    /// Transforms a point (`w = 1`) and applies the perspective divide.
    pub fn transform_point(&self, p: Vec3) -> Vec3 {
        let [x, y, z, w] = self.transform_vec4([p.x, p.y, p.z, 1.0]);
        if w == 1.0 {
            Vec3::new(x, y, z)
        } else {
            Vec3::new(x / w, y / w, z / w)
        }
    }
}

impl Default for Mat4 {
    fn default() -> Self {
        Self::IDENTITY
    }
}

impl Mul for Mat4 {
    type Output = Self;

    fn mul(self, rhs: Self) -> Self {
        multiply(&self, &rhs)
    }
}

impl From<glam::Mat4> for Mat4 {
    fn from(value: glam::Mat4) -> Self {
        Self::from_cols_array(value.to_cols_array())
    }
}

impl From<Mat4> for glam::Mat4 {
    fn from(value: Mat4) -> Self {
        glam::Mat4::from_cols_array(&value.cols)
    }
}

pub fn identity() -> Mat4 {
    Mat4::IDENTITY
}

/// Standard product `a * b`: the result applies `b` first, then `a`.
pub fn multiply(a: &Mat4, b: &Mat4) -> Mat4 {
    let mut cols = [0.0; 16];
    for col in 0..4 {
        for row in 0..4 {
            cols[col * 4 + row] = (0..4).map(|k| a.get(k, row) * b.get(col, k)).sum();
        }
    }
    Mat4 { cols }
}

/// OpenGL-style perspective projection mapping view-space depth
/// `[-near, -far]` onto NDC `[-1, 1]`.
///
/// Passing `f32::INFINITY` as `far` produces an infinite far plane.
pub fn perspective(fov_y_radians: f32, aspect: f32, near: f32, far: f32) -> Mat4 {
    debug_assert!(
        fov_y_radians > 0.0 && fov_y_radians < std::f32::consts::PI,
        "vertical field of view must lie in (0, pi)"
    );
    debug_assert!(aspect != 0.0, "aspect ratio must be non-zero");
    debug_assert!(near != far, "near and far planes must differ");

    let f = 1.0 / (fov_y_radians / 2.0).tan();
    let mut cols = [0.0; 16];
    cols[0] = f / aspect;
    cols[5] = f;
    cols[11] = -1.0;
    if far.is_finite() {
        let nf = 1.0 / (near - far);
        cols[10] = (far + near) * nf;
        cols[14] = 2.0 * far * near * nf;
    } else {
        cols[10] = -1.0;
        cols[14] = -2.0 * near;
    }
    Mat4 { cols }
}

/// Right-handed view matrix looking from `eye` towards `target`.
///
/// `up` must not be parallel to the viewing direction.
pub fn look_at(eye: Vec3, target: Vec3, up: Vec3) -> Mat4 {
    let forward = (target - eye).normalize();
    let right = forward.cross(up).normalize();
    let true_up = right.cross(forward);

    Mat4 {
        cols: [
            right.x,
            true_up.x,
            -forward.x,
            0.0,
            right.y,
            true_up.y,
            -forward.y,
            0.0,
            right.z,
            true_up.z,
            -forward.z,
            0.0,
            -right.dot(eye),
            -true_up.dot(eye),
            forward.dot(eye),
            1.0,
        ],
    }
}

/// `m` followed by a rotation of `radians` about the Y axis (applied first).
pub fn rotate_y(m: &Mat4, radians: f32) -> Mat4 {
    let (s, c) = radians.sin_cos();
    let rotation = Mat4 {
        cols: [
            c, 0.0, -s, 0.0, //
            0.0, 1.0, 0.0, 0.0, //
            s, 0.0, c, 0.0, //
            0.0, 0.0, 0.0, 1.0,
        ],
    };
    multiply(m, &rotation)
}

pub fn translate(m: &Mat4, v: Vec3) -> Mat4 {
    let mut translation = Mat4::IDENTITY;
    translation.cols[12] = v.x;
    translation.cols[13] = v.y;
    translation.cols[14] = v.z;
    multiply(m, &translation)
}

pub fn scale(m: &Mat4, v: Vec3) -> Mat4 {
    let mut scaling = Mat4::IDENTITY;
    scaling.cols[0] = v.x;
    scaling.cols[5] = v.y;
    scaling.cols[10] = v.z;
    multiply(m, &scaling)
}
