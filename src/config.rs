use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::math::Vec3;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("unable to read {path}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid scene configuration")]
    Parse(#[from] serde_json::Error),
    #[error("{0}")]
    Invalid(String),
}

/// Light path as a per-axis sine wave of absolute elapsed time:
/// `origin + amplitude * sin(frequency * t)`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LightOrbit {
    pub origin: Vec3,
    pub amplitude: Vec3,
    pub frequency: Vec3,
}

impl LightOrbit {
    /// Light position after `seconds`. The phase is computed in `f64` so
    /// long-running hosts keep sub-frame resolution.
    pub fn position_at(&self, seconds: f64) -> Vec3 {
        let wave = |frequency: f32| (f64::from(frequency) * seconds).sin() as f32;
        let phase = Vec3::new(
            wave(self.frequency.x),
            wave(self.frequency.y),
            wave(self.frequency.z),
        );
        self.origin + self.amplitude.mul_elements(phase)
    }
}

impl Default for LightOrbit {
    fn default() -> Self {
        Self {
            origin: Vec3::new(1.0, 0.0, 2.0),
            amplitude: Vec3::new(2.0, 1.0, 0.0),
            frequency: Vec3::new(1.0, 0.5, 0.0),
        }
    }
}

/// Tunable parameters of the lighting scene. Every field is optional in JSON.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SceneConfig {
    pub camera_position: Vec3,
    pub camera_up: Vec3,
    pub object_color: Vec3,
    pub light_color: Vec3,
    pub clear_color: [f32; 4],
    pub fov_y_degrees: f32,
    pub near: f32,
    pub far: f32,
    pub cube_rotation_degrees: f32,
    pub lamp_scale: f32,
    pub light_orbit: LightOrbit,
}

impl Default for SceneConfig {
    fn default() -> Self {
        Self {
            camera_position: Vec3::new(0.0, 0.0, 10.0),
            camera_up: Vec3::Y,
            object_color: Vec3::new(1.0, 0.5, 0.31),
            light_color: Vec3::ONE,
            clear_color: [0.08, 0.08, 0.08, 1.0],
            fov_y_degrees: 45.0,
            near: 0.1,
            far: 100.0,
            cube_rotation_degrees: -10.0,
            lamp_scale: 0.1,
            light_orbit: LightOrbit::default(),
        }
    }
}

impl SceneConfig {
    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let json = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_json_str(&json)
    }

    /// Rejects values that would make the projection degenerate.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(self.fov_y_degrees > 0.0 && self.fov_y_degrees < 180.0) {
            return Err(ConfigError::Invalid(format!(
                "fov_y_degrees must lie in (0, 180), got {}",
                self.fov_y_degrees
            )));
        }
        if self.near <= 0.0 {
            return Err(ConfigError::Invalid(format!(
                "near must be positive, got {}",
                self.near
            )));
        }
        if self.far <= self.near {
            return Err(ConfigError::Invalid(format!(
                "far ({}) must be greater than near ({})",
                self.far, self.near
            )));
        }
        let front = crate::camera::Camera::DEFAULT_FRONT;
        if front.cross(self.camera_up).length() == 0.0 {
            return Err(ConfigError::Invalid(
                "camera_up must not be parallel to the viewing direction".to_string(),
            ));
        }
        Ok(())
    }
}
