use glam::{Mat4, Vec3};
use serde::{Deserialize, Serialize};

pub const DEFAULT_FOV_DEGREES: f32 = 75.0;
pub const DEFAULT_NEAR: f32 = 0.1;
pub const DEFAULT_FAR: f32 = 1000.0;
pub const DEFAULT_DISTANCE: f32 = 5.0;

/// Camera settings shared by every generation
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CameraSettings {
    pub fov_degrees: f32,
    pub near: f32,
    pub far: f32,
    /// Distance along +z, looking at the origin
    pub distance: f32,
}

impl Default for CameraSettings {
    fn default() -> Self {
        Self {
            fov_degrees: DEFAULT_FOV_DEGREES,
            near: DEFAULT_NEAR,
            far: DEFAULT_FAR,
            distance: DEFAULT_DISTANCE,
        }
    }
}

/// Perspective camera on the +z axis looking down -z
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PerspectiveCamera {
    pub fov_degrees: f32,
    pub aspect: f32,
    pub near: f32,
    pub far: f32,
    pub position: Vec3,
}

impl PerspectiveCamera {
    pub fn new(settings: CameraSettings, aspect: f32) -> Self {
        Self {
            fov_degrees: settings.fov_degrees,
            aspect,
            near: settings.near,
            far: settings.far,
            position: Vec3::new(0.0, 0.0, settings.distance),
        }
    }

    /// Recompute projection for a new viewport aspect
    pub fn set_aspect(&mut self, aspect: f32) {
        if aspect.is_finite() && aspect > 0.0 {
            self.aspect = aspect;
        }
    }

    pub fn view(&self) -> Mat4 {
        Mat4::look_to_rh(self.position, Vec3::NEG_Z, Vec3::Y)
    }

    pub fn projection(&self) -> Mat4 {
        Mat4::perspective_rh(self.fov_degrees.to_radians(), self.aspect, self.near, self.far)
    }

    pub fn view_projection(&self) -> Mat4 {
        self.projection() * self.view()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_match_harness_camera() {
        let camera = PerspectiveCamera::new(CameraSettings::default(), 4.0 / 3.0);
        assert_eq!(camera.fov_degrees, 75.0);
        assert_eq!(camera.near, 0.1);
        assert_eq!(camera.far, 1000.0);
        assert_eq!(camera.position, Vec3::new(0.0, 0.0, 5.0));
    }

    #[test]
    fn test_origin_projects_to_center() {
        let camera = PerspectiveCamera::new(CameraSettings::default(), 1.0);
        let clip = camera.view_projection() * glam::Vec4::new(0.0, 0.0, 0.0, 1.0);
        let ndc = clip.truncate() / clip.w;

        assert!(ndc.x.abs() < 1e-6);
        assert!(ndc.y.abs() < 1e-6);
        assert!(ndc.z > 0.0 && ndc.z < 1.0);
    }

    #[test]
    fn test_set_aspect_ignores_degenerate_values() {
        let mut camera = PerspectiveCamera::new(CameraSettings::default(), 1.5);
        camera.set_aspect(0.0);
        camera.set_aspect(f32::NAN);
        assert_eq!(camera.aspect, 1.5);

        camera.set_aspect(2.0);
        assert_eq!(camera.aspect, 2.0);
    }

    #[test]
    fn test_settings_from_partial_json() {
        let settings: CameraSettings = serde_json::from_str(r#"{"fov_degrees":60.0}"#).unwrap();
        assert_eq!(settings.fov_degrees, 60.0);
        assert_eq!(settings.far, 1000.0);
    }
}
