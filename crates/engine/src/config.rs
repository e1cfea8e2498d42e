use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use glam::Vec3;
use orbitview_common::Color;
use serde::{Deserialize, Serialize};

/// Errors from loading or validating a viewer config.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("invalid config: {0}")]
    Invalid(String),
}

/// Which lighting setup the scene is assembled with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SceneVariant {
    /// One unshadowed directional light.
    #[default]
    Directional,
    /// One shadow-casting point light; model meshes cast shadows.
    ShadowedPoint,
}

impl SceneVariant {
    pub fn shadows(&self) -> bool {
        matches!(self, SceneVariant::ShadowedPoint)
    }
}

impl fmt::Display for SceneVariant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SceneVariant::Directional => write!(f, "directional"),
            SceneVariant::ShadowedPoint => write!(f, "shadowed-point"),
        }
    }
}

impl FromStr for SceneVariant {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "directional" => Ok(SceneVariant::Directional),
            "shadowed-point" => Ok(SceneVariant::ShadowedPoint),
            other => Err(ConfigError::Invalid(format!(
                "unknown scene variant {other:?} (expected directional or shadowed-point)"
            ))),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WindowConfig {
    pub title: String,
    pub width: u32,
    pub height: u32,
}

impl Default for WindowConfig {
    fn default() -> Self {
        Self {
            title: "orbitview".into(),
            width: 1280,
            height: 720,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CameraConfig {
    pub fov_degrees: f32,
    pub near: f32,
    pub far: f32,
    pub position: Vec3,
}

impl Default for CameraConfig {
    fn default() -> Self {
        Self {
            fov_degrees: 75.0,
            near: 0.1,
            far: 100.0,
            position: Vec3::new(1.0, 1.5, 1.0),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ControlsConfig {
    pub enable_damping: bool,
    pub damping_factor: f32,
    pub rotate_speed: f32,
    pub zoom_speed: f32,
    pub pan_speed: f32,
}

impl Default for ControlsConfig {
    fn default() -> Self {
        Self {
            enable_damping: true,
            damping_factor: 0.05,
            rotate_speed: 1.0,
            zoom_speed: 1.0,
            pan_speed: 1.0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlaneConfig {
    pub size: f32,
    pub color: Color,
}

impl Default for PlaneConfig {
    fn default() -> Self {
        Self {
            size: 100.0,
            color: Color::rgb(0.6, 0.6, 0.6),
        }
    }
}

/// Transform applied to a model when it is attached.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ModelPlacement {
    pub rotation_z_degrees: f32,
    pub scale: f32,
}

impl Default for ModelPlacement {
    fn default() -> Self {
        Self {
            rotation_z_degrees: 90.0,
            scale: 2.0,
        }
    }
}

/// Everything the viewer needs to start. Every field has a default, so a
/// config file only lists what it changes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ViewerConfig {
    pub model_path: PathBuf,
    pub variant: SceneVariant,
    pub antialias: bool,
    pub window: WindowConfig,
    pub camera: CameraConfig,
    pub controls: ControlsConfig,
    pub plane: PlaneConfig,
    pub model: ModelPlacement,
}

impl Default for ViewerConfig {
    fn default() -> Self {
        Self {
            model_path: PathBuf::from("scene.gltf"),
            variant: SceneVariant::default(),
            antialias: true,
            window: WindowConfig::default(),
            camera: CameraConfig::default(),
            controls: ControlsConfig::default(),
            plane: PlaneConfig::default(),
            model: ModelPlacement::default(),
        }
    }
}

impl ViewerConfig {
    /// Load and validate a JSON config file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let data = std::fs::read_to_string(path.as_ref())?;
        let config = Self::from_json_str(&data)?;
        tracing::info!(path = %path.as_ref().display(), "config loaded");
        Ok(config)
    }

    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn to_json_pretty(&self) -> Result<String, ConfigError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let invalid = |msg: String| Err(ConfigError::Invalid(msg));
        let cam = &self.camera;
        if !(cam.fov_degrees > 0.0 && cam.fov_degrees < 180.0) {
            return invalid(format!("camera.fov_degrees {} not in (0, 180)", cam.fov_degrees));
        }
        if !(cam.near > 0.0 && cam.far > cam.near) {
            return invalid(format!(
                "camera clip planes near={} far={} must satisfy 0 < near < far",
                cam.near, cam.far
            ));
        }
        let damping = self.controls.damping_factor;
        if !(damping > 0.0 && damping <= 1.0) {
            return invalid(format!("controls.damping_factor {damping} not in (0, 1]"));
        }
        if !(self.plane.size > 0.0) {
            return invalid(format!("plane.size {} must be positive", self.plane.size));
        }
        if !(self.model.scale > 0.0) {
            return invalid(format!("model.scale {} must be positive", self.model.scale));
        }
        if self.window.width == 0 || self.window.height == 0 {
            return invalid("window dimensions must be positive".into());
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_viewer_constants() {
        let c = ViewerConfig::default();
        assert_eq!(c.camera.fov_degrees, 75.0);
        assert_eq!(c.camera.near, 0.1);
        assert_eq!(c.camera.far, 100.0);
        assert_eq!(c.camera.position, Vec3::new(1.0, 1.5, 1.0));
        assert!(c.controls.enable_damping);
        assert_eq!(c.plane.color.to_hex(), "#999999");
        assert_eq!(c.model.rotation_z_degrees, 90.0);
        assert_eq!(c.model.scale, 2.0);
        assert_eq!(c.model_path, PathBuf::from("scene.gltf"));
        assert!(c.validate().is_ok());
    }

    #[test]
    fn partial_json_keeps_defaults() {
        let c = ViewerConfig::from_json_str(
            r##"{ "variant": "shadowed-point", "plane": { "color": "#336699" } }"##,
        )
        .unwrap();
        assert_eq!(c.variant, SceneVariant::ShadowedPoint);
        assert_eq!(c.plane.color.to_hex(), "#336699");
        assert_eq!(c.plane.size, 100.0);
        assert_eq!(c.camera, CameraConfig::default());
    }

    #[test]
    fn json_round_trip() {
        let c = ViewerConfig {
            variant: SceneVariant::ShadowedPoint,
            ..ViewerConfig::default()
        };
        let json = c.to_json_pretty().unwrap();
        assert!(json.contains("\"shadowed-point\""));
        assert!(json.contains("\"#999999\""));
        assert_eq!(ViewerConfig::from_json_str(&json).unwrap(), c);
    }

    #[test]
    fn invalid_color_rejected() {
        let err = ViewerConfig::from_json_str(r#"{ "plane": { "color": "grey" } }"#).unwrap_err();
        assert!(matches!(err, ConfigError::Json(_)));
    }

    #[test]
    fn invalid_values_rejected() {
        for json in [
            r#"{ "camera": { "fov_degrees": 0.0 } }"#,
            r#"{ "camera": { "near": 10.0, "far": 1.0 } }"#,
            r#"{ "controls": { "damping_factor": 0.0 } }"#,
            r#"{ "model": { "scale": -1.0 } }"#,
            r#"{ "window": { "width": 0 } }"#,
        ] {
            assert!(
                matches!(ViewerConfig::from_json_str(json), Err(ConfigError::Invalid(_))),
                "{json} should be rejected"
            );
        }
    }

    #[test]
    fn load_from_file() {
        let tmp = tempfile::NamedTempFile::new().unwrap();
        std::fs::write(tmp.path(), r#"{ "model_path": "models/face.glb" }"#).unwrap();
        let c = ViewerConfig::load(tmp.path()).unwrap();
        assert_eq!(c.model_path, PathBuf::from("models/face.glb"));
    }

    #[test]
    fn load_missing_file_is_io_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = ViewerConfig::load(dir.path().join("nope.json")).unwrap_err();
        assert!(matches!(err, ConfigError::Io(_)));
    }

    #[test]
    fn variant_parse_and_display() {
        for v in [SceneVariant::Directional, SceneVariant::ShadowedPoint] {
            assert_eq!(v.to_string().parse::<SceneVariant>().unwrap(), v);
        }
        assert!("spot".parse::<SceneVariant>().is_err());
        assert!(SceneVariant::ShadowedPoint.shadows());
        assert!(!SceneVariant::Directional.shadows());
    }
}
