//! Scene configuration store.
//!
//! One record holds every tunable of the scene. Sections are plain data so a
//! debug panel can copy one, edit it and hand it back; [`SceneConfig`] only
//! accepts it if it validates, otherwise the previous value stays in place.

use glam::Vec3;
use lightfield_common::{Hsl, Rgb};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Largest instance count a configuration may ask for.
pub const MAX_BOX_COUNT: usize = 1_000_000;

/// Errors from configuration validation and loading.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("{field}: invalid range {min}..={max}")]
    InvalidRange {
        field: &'static str,
        min: f64,
        max: f64,
    },
    #[error("{field} must be positive, got {value}")]
    NonPositive { field: &'static str, value: f64 },
    #[error("{field} must be finite")]
    NotFinite { field: &'static str },
    #[error("{field}: {reason}")]
    Degenerate {
        field: &'static str,
        reason: &'static str,
    },
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),
}

/// Inclusive integer range.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CountRange {
    pub min: usize,
    pub max: usize,
}

/// Instance count and spawn bounds.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GenerativeConfig {
    pub box_count: CountRange,
    pub min_pos: f32,
    pub max_pos: f32,
    pub min_size: f32,
    pub max_size: f32,
}

impl Default for GenerativeConfig {
    fn default() -> Self {
        Self {
            box_count: CountRange {
                min: 3000,
                max: 4000,
            },
            min_pos: -2.5,
            max_pos: 2.5,
            min_size: 0.08,
            max_size: 0.13,
        }
    }
}

impl GenerativeConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.box_count.min == 0 {
            return Err(ConfigError::NonPositive {
                field: "generative.box_count.min",
                value: 0.0,
            });
        }
        if self.box_count.min > self.box_count.max || self.box_count.max > MAX_BOX_COUNT {
            return Err(ConfigError::InvalidRange {
                field: "generative.box_count",
                min: self.box_count.min as f64,
                max: self.box_count.max as f64,
            });
        }
        finite("generative.min_pos", self.min_pos)?;
        finite("generative.max_pos", self.max_pos)?;
        ordered("generative.pos", self.min_pos, self.max_pos)?;
        finite("generative.min_size", self.min_size)?;
        finite("generative.max_size", self.max_size)?;
        positive("generative.min_size", self.min_size)?;
        ordered("generative.size", self.min_size, self.max_size)
    }
}

/// Tuning of the motion rule.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct InteractiveConfig {
    pub distance_threshold: f32,
    /// How far the light travels per unit of cursor offset from the centre.
    pub mouse_movement_amplitude: f32,
    pub box_mass_factor: f32,
    pub box_speed: f32,
    /// Carried for compatibility with saved configs; the motion rule does not clamp.
    pub box_max_speed: f32,
    pub distance_factor: f32,
    pub origin_factor: f32,
}

impl Default for InteractiveConfig {
    fn default() -> Self {
        Self {
            distance_threshold: 1.5,
            mouse_movement_amplitude: 6.0,
            box_mass_factor: 1.2,
            box_speed: 0.009,
            box_max_speed: 0.15,
            distance_factor: 20.0,
            origin_factor: 0.02,
        }
    }
}

impl InteractiveConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        finite("interactive.distance_threshold", self.distance_threshold)?;
        if self.distance_threshold < 0.0 {
            return Err(ConfigError::NonPositive {
                field: "interactive.distance_threshold",
                value: self.distance_threshold as f64,
            });
        }
        finite(
            "interactive.mouse_movement_amplitude",
            self.mouse_movement_amplitude,
        )?;
        finite("interactive.box_mass_factor", self.box_mass_factor)?;
        positive("interactive.box_mass_factor", self.box_mass_factor)?;
        finite("interactive.box_speed", self.box_speed)?;
        finite("interactive.box_max_speed", self.box_max_speed)?;
        finite("interactive.distance_factor", self.distance_factor)?;
        finite("interactive.origin_factor", self.origin_factor)
    }
}

/// The attractor light and its visual marker.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LightConfig {
    pub position: Vec3,
    pub marker_color: Hsl,
    pub point_color: Rgb,
    pub intensity: f32,
    pub ambient_intensity: f32,
}

impl Default for LightConfig {
    fn default() -> Self {
        Self {
            position: Vec3::ZERO,
            marker_color: Hsl::new(41.0, 0.91, 0.75),
            point_color: Rgb::from_hex(0xf9d586),
            intensity: 5.1,
            ambient_intensity: 2.0,
        }
    }
}

impl LightConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        finite_vec("light.position", self.position)?;
        let Hsl { h, s, l } = self.marker_color;
        finite_vec("light.marker_color", Vec3::new(h, s, l))?;
        finite_vec(
            "light.point_color",
            Vec3::from_array(self.point_color.to_array()),
        )?;
        finite("light.intensity", self.intensity)?;
        finite("light.ambient_intensity", self.ambient_intensity)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoopingConfig {
    pub animate: bool,
}

impl Default for LoopingConfig {
    fn default() -> Self {
        Self { animate: true }
    }
}

/// Placement of the floor grid. Rotation is XYZ Euler, radians.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct FloorConfig {
    pub visible: bool,
    pub position: Vec3,
    pub rotation: Vec3,
}

impl FloorConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        finite_vec("floor.position", self.position)?;
        finite_vec("floor.rotation", self.rotation)
    }
}

/// Orthographic camera looking at the world origin.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CameraConfig {
    pub zoom: f32,
    pub near: f32,
    pub far: f32,
    pub eye: Vec3,
}

impl Default for CameraConfig {
    fn default() -> Self {
        Self {
            zoom: 0.2,
            near: -100.0,
            far: 100.0,
            eye: Vec3::ONE,
        }
    }
}

impl CameraConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        finite("camera.zoom", self.zoom)?;
        positive("camera.zoom", self.zoom)?;
        finite("camera.near", self.near)?;
        finite("camera.far", self.far)?;
        if self.near >= self.far {
            return Err(ConfigError::InvalidRange {
                field: "camera.near/far",
                min: self.near as f64,
                max: self.far as f64,
            });
        }
        finite_vec("camera.eye", self.eye)?;
        // look_at with a Y up vector has no defined basis along Y.
        if self.eye.cross(Vec3::Y).length_squared() <= f32::EPSILON {
            return Err(ConfigError::Degenerate {
                field: "camera.eye",
                reason: "eye must not lie on the vertical axis",
            });
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct PerformanceConfig {
    pub measure: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct DevConfig {
    /// Debug-level logging.
    pub log: bool,
    pub hide_gui: bool,
}

/// The full scene configuration.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct SceneConfig {
    generative: GenerativeConfig,
    interactive: InteractiveConfig,
    light: LightConfig,
    looping: LoopingConfig,
    floor: FloorConfig,
    camera: CameraConfig,
    performance: PerformanceConfig,
    dev: DevConfig,
}

impl SceneConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_yaml_str(text: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_yaml::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    /// Load and validate a YAML file. Missing keys take their defaults.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path.as_ref())?;
        let config = Self::from_yaml_str(&text)?;
        tracing::info!(path = %path.as_ref().display(), "loaded scene config");
        Ok(config)
    }

    pub fn to_yaml_string(&self) -> Result<String, ConfigError> {
        Ok(serde_yaml::to_string(self)?)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        self.generative.validate()?;
        self.interactive.validate()?;
        self.light.validate()?;
        self.floor.validate()?;
        self.camera.validate()
    }

    pub fn generative(&self) -> &GenerativeConfig {
        &self.generative
    }

    pub fn interactive(&self) -> &InteractiveConfig {
        &self.interactive
    }

    pub fn light(&self) -> &LightConfig {
        &self.light
    }

    pub fn looping(&self) -> &LoopingConfig {
        &self.looping
    }

    pub fn floor(&self) -> &FloorConfig {
        &self.floor
    }

    pub fn camera(&self) -> &CameraConfig {
        &self.camera
    }

    pub fn performance(&self) -> &PerformanceConfig {
        &self.performance
    }

    pub fn dev(&self) -> &DevConfig {
        &self.dev
    }

    pub fn set_generative(&mut self, generative: GenerativeConfig) -> Result<(), ConfigError> {
        generative.validate()?;
        self.generative = generative;
        Ok(())
    }

    pub fn set_box_count_range(&mut self, min: usize, max: usize) -> Result<(), ConfigError> {
        self.set_generative(GenerativeConfig {
            box_count: CountRange { min, max },
            ..self.generative
        })
    }

    pub fn set_interactive(&mut self, interactive: InteractiveConfig) -> Result<(), ConfigError> {
        interactive.validate()?;
        self.interactive = interactive;
        Ok(())
    }

    pub fn set_light(&mut self, light: LightConfig) -> Result<(), ConfigError> {
        light.validate()?;
        self.light = light;
        Ok(())
    }

    pub fn set_light_position(&mut self, position: Vec3) -> Result<(), ConfigError> {
        finite_vec("light.position", position)?;
        self.light.position = position;
        Ok(())
    }

    pub fn set_animate(&mut self, animate: bool) {
        self.looping.animate = animate;
    }

    pub fn set_floor(&mut self, floor: FloorConfig) -> Result<(), ConfigError> {
        floor.validate()?;
        self.floor = floor;
        Ok(())
    }

    pub fn set_camera(&mut self, camera: CameraConfig) -> Result<(), ConfigError> {
        camera.validate()?;
        self.camera = camera;
        Ok(())
    }

    pub fn set_measure_performance(&mut self, measure: bool) {
        self.performance.measure = measure;
    }

    pub fn set_dev(&mut self, dev: DevConfig) {
        self.dev = dev;
    }
}

fn finite(field: &'static str, value: f32) -> Result<(), ConfigError> {
    if value.is_finite() {
        Ok(())
    } else {
        Err(ConfigError::NotFinite { field })
    }
}

fn finite_vec(field: &'static str, value: Vec3) -> Result<(), ConfigError> {
    if value.is_finite() {
        Ok(())
    } else {
        Err(ConfigError::NotFinite { field })
    }
}

fn positive(field: &'static str, value: f32) -> Result<(), ConfigError> {
    if value > 0.0 {
        Ok(())
    } else {
        Err(ConfigError::NonPositive {
            field,
            value: value as f64,
        })
    }
}

/// `min <= max`, with a span small enough for uniform sampling to scale it.
fn ordered(field: &'static str, min: f32, max: f32) -> Result<(), ConfigError> {
    let span = max - min;
    if min <= max && span.is_finite() && span <= f32::MAX / 2.0 {
        Ok(())
    } else {
        Err(ConfigError::InvalidRange {
            field,
            min: min as f64,
            max: max as f64,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_validate() {
        let config = SceneConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.generative().box_count, CountRange { min: 3000, max: 4000 });
        assert_eq!(config.interactive().distance_threshold, 1.5);
        assert!(config.looping().animate);
        assert!(!config.floor().visible);
    }

    #[test]
    fn inverted_count_range_is_rejected() {
        let mut config = SceneConfig::default();
        let err = config.set_box_count_range(10, 5).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidRange { .. }));
        // Previous value is untouched.
        assert_eq!(config.generative().box_count.min, 3000);
    }

    #[test]
    fn zero_count_is_rejected() {
        let mut config = SceneConfig::default();
        assert!(matches!(
            config.set_box_count_range(0, 5),
            Err(ConfigError::NonPositive { .. })
        ));
    }

    #[test]
    fn equal_count_bounds_are_allowed() {
        let mut config = SceneConfig::default();
        config.set_box_count_range(7, 7).unwrap();
        assert_eq!(config.generative().box_count, CountRange { min: 7, max: 7 });
    }

    #[test]
    fn non_positive_size_is_rejected() {
        let mut config = SceneConfig::default();
        let generative = GenerativeConfig {
            min_size: 0.0,
            ..*config.generative()
        };
        assert!(matches!(
            config.set_generative(generative),
            Err(ConfigError::NonPositive { .. })
        ));
    }

    #[test]
    fn inverted_position_bounds_are_rejected() {
        let mut config = SceneConfig::default();
        let generative = GenerativeConfig {
            min_pos: 3.0,
            max_pos: -3.0,
            ..*config.generative()
        };
        assert!(config.set_generative(generative).is_err());
    }

    #[test]
    fn zero_mass_factor_is_rejected() {
        let mut config = SceneConfig::default();
        let interactive = InteractiveConfig {
            box_mass_factor: 0.0,
            ..*config.interactive()
        };
        assert!(config.set_interactive(interactive).is_err());
        assert_eq!(config.interactive().box_mass_factor, 1.2);
    }

    #[test]
    fn light_position_must_be_finite() {
        let mut config = SceneConfig::default();
        assert!(matches!(
            config.set_light_position(Vec3::new(f32::NAN, 0.0, 0.0)),
            Err(ConfigError::NotFinite { .. })
        ));
        config.set_light_position(Vec3::new(1.0, 2.0, 3.0)).unwrap();
        assert_eq!(config.light().position, Vec3::new(1.0, 2.0, 3.0));
    }

    #[test]
    fn camera_near_must_precede_far() {
        let mut config = SceneConfig::default();
        let camera = CameraConfig {
            near: 10.0,
            far: 1.0,
            ..*config.camera()
        };
        assert!(config.set_camera(camera).is_err());
    }

    #[test]
    fn yaml_round_trip_of_defaults() {
        let config = SceneConfig::default();
        let text = config.to_yaml_string().unwrap();
        let back = SceneConfig::from_yaml_str(&text).unwrap();
        assert_eq!(back, config);
    }

    #[test]
    fn partial_yaml_fills_defaults() {
        let text = "generative:\n  box_count:\n    min: 10\n    max: 20\n";
        let config = SceneConfig::from_yaml_str(text).unwrap();
        assert_eq!(config.generative().box_count, CountRange { min: 10, max: 20 });
        assert_eq!(config.generative().min_pos, -2.5);
        assert_eq!(config.interactive().origin_factor, 0.02);
    }

    #[test]
    fn oversized_count_in_yaml_is_rejected() {
        let text = "generative:\n  box_count:\n    min: 18446744073709551615\n    max: 18446744073709551615\n";
        assert!(matches!(
            SceneConfig::from_yaml_str(text),
            Err(ConfigError::InvalidRange { .. })
        ));

        let mut config = SceneConfig::default();
        assert!(config.set_box_count_range(10, MAX_BOX_COUNT + 1).is_err());
        config.set_box_count_range(10, MAX_BOX_COUNT).unwrap();
    }

    #[test]
    fn position_span_must_be_finite() {
        let text = "generative:\n  min_pos: -3.0e38\n  max_pos: 3.0e38\n";
        assert!(matches!(
            SceneConfig::from_yaml_str(text),
            Err(ConfigError::InvalidRange { .. })
        ));

        let mut config = SceneConfig::default();
        let generative = GenerativeConfig {
            min_size: 0.1,
            max_size: f32::MAX,
            ..*config.generative()
        };
        assert!(config.set_generative(generative).is_err());
    }

    #[test]
    fn light_colours_must_be_finite() {
        let text = "light:\n  point_color:\n    r: .nan\n    g: 0.5\n    b: 0.5\n";
        assert!(matches!(
            SceneConfig::from_yaml_str(text),
            Err(ConfigError::NotFinite { field: "light.point_color" })
        ));

        let mut config = SceneConfig::default();
        let light = LightConfig {
            marker_color: Hsl::new(f32::INFINITY, 0.5, 0.5),
            ..*config.light()
        };
        assert!(matches!(
            config.set_light(light),
            Err(ConfigError::NotFinite { field: "light.marker_color" })
        ));
    }

    #[test]
    fn camera_eye_off_the_vertical_axis() {
        let mut config = SceneConfig::default();
        for eye in [Vec3::ZERO, Vec3::new(0.0, 2.0, 0.0), Vec3::new(0.0, -1.0, 0.0)] {
            let camera = CameraConfig {
                eye,
                ..*config.camera()
            };
            assert!(matches!(
                config.set_camera(camera),
                Err(ConfigError::Degenerate { .. })
            ));
        }
        let tilted = CameraConfig {
            eye: Vec3::new(0.0, 2.0, 0.5),
            ..*config.camera()
        };
        config.set_camera(tilted).unwrap();
    }

    #[test]
    fn invalid_yaml_values_fail_validation() {
        let text = "generative:\n  box_count:\n    min: 20\n    max: 10\n";
        assert!(matches!(
            SceneConfig::from_yaml_str(text),
            Err(ConfigError::InvalidRange { .. })
        ));
    }
}
