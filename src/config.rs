use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::camera::CameraSettings;
use crate::capture::{CaptureSettings, MAX_CAPTURE_SECS};
use crate::error::{HarnessError, HarnessResult};
use crate::gallery::DEFAULT_VOTE_FLAG_KEY;
use crate::math::Color;
use crate::submission::SubmissionSettings;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WindowSettings {
    pub width: u32,
    pub height: u32,
    pub title: String,
}

impl Default for WindowSettings {
    fn default() -> Self {
        Self {
            width: 800,
            height: 600,
            title: "Aster Competition".to_string(),
        }
    }
}

/// Every tunable of the harness; missing keys fall back to defaults
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HarnessConfig {
    /// `0xRRGGBB` as a JSON number
    pub background: Color,
    pub camera: CameraSettings,
    pub capture: CaptureSettings,
    pub submission: SubmissionSettings,
    pub vote_flag_key: String,
    pub window: WindowSettings,
}

impl Default for HarnessConfig {
    fn default() -> Self {
        Self {
            background: Color::BACKGROUND,
            camera: CameraSettings::default(),
            capture: CaptureSettings::default(),
            submission: SubmissionSettings::default(),
            vote_flag_key: DEFAULT_VOTE_FLAG_KEY.to_string(),
            window: WindowSettings::default(),
        }
    }
}

impl HarnessConfig {
    /// Defaults when `path` is `None`, otherwise the parsed file
    pub fn load(path: Option<&Path>) -> HarnessResult<Self> {
        let Some(path) = path else {
            return Ok(Self::default());
        };
        let text = std::fs::read_to_string(path)
            .map_err(|e| HarnessError::config(format!("cannot read {}: {e}", path.display())))?;
        let config = Self::from_json(&text)?;
        log::info!("configuration loaded from {}", path.display());
        Ok(config)
    }

    pub fn from_json(text: &str) -> HarnessResult<Self> {
        let config: Self =
            serde_json::from_str(text).map_err(|e| HarnessError::config(format!("invalid configuration: {e}")))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> HarnessResult<()> {
        let duration = self.capture.duration_secs;
        if !(duration > 0.0 && duration <= MAX_CAPTURE_SECS) {
            return Err(HarnessError::config(format!(
                "capture.duration_secs must be in (0, {MAX_CAPTURE_SECS}]"
            )));
        }
        if self.capture.frame_rate == 0 {
            return Err(HarnessError::config("capture.frame_rate must be at least 1"));
        }
        if !(self.camera.near > 0.0 && self.camera.far > self.camera.near) {
            return Err(HarnessError::config("camera needs 0 < near < far"));
        }
        if self.submission.table.is_empty() || self.vote_flag_key.is_empty() {
            return Err(HarnessError::config("submission.table and vote_flag_key must not be empty"));
        }
        Ok(())
    }
}

/// File layout under `--data-dir`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DataPaths {
    root: PathBuf,
}

impl DataPaths {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn clips(&self) -> PathBuf {
        self.root.join("clips")
    }

    pub fn submissions(&self) -> PathBuf {
        self.root.join("submissions.json")
    }

    pub fn flags(&self) -> PathBuf {
        self.root.join("flags.json")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = HarnessConfig::load(None).unwrap();
        assert_eq!(config.background, Color::from_hex(0x111827));
        assert_eq!(config.capture.duration_secs, 10.0);
        assert_eq!(config.capture.frame_rate, 30);
        assert_eq!(config.camera.fov_degrees, 75.0);
        assert_eq!(config.vote_flag_key, "aster-competition-voted");
        assert_eq!(config.submission.table, "submissions");
    }

    #[test]
    fn test_partial_file_keeps_other_defaults() {
        let config = HarnessConfig::from_json(r#"{ "background": 0, "capture": { "frame_rate": 24 } }"#).unwrap();
        assert_eq!(config.background, Color::BLACK);
        assert_eq!(config.capture.frame_rate, 24);
        assert_eq!(config.capture.duration_secs, 10.0);
        assert_eq!(config.window.width, 800);
    }

    #[test]
    fn test_rejects_zero_frame_rate() {
        let err = HarnessConfig::from_json(r#"{ "capture": { "frame_rate": 0 } }"#).unwrap_err();
        assert!(matches!(err, HarnessError::Config(_)));
    }

    #[test]
    fn test_rejects_unbounded_capture_duration() {
        for text in [
            r#"{ "capture": { "duration_secs": 1e30 } }"#,
            r#"{ "capture": { "duration_secs": 3600.5 } }"#,
            r#"{ "capture": { "duration_secs": -1 } }"#,
        ] {
            let err = HarnessConfig::from_json(text).unwrap_err();
            assert!(matches!(err, HarnessError::Config(_)), "{text}");
        }
        let config = HarnessConfig::from_json(r#"{ "capture": { "duration_secs": 3600 } }"#).unwrap();
        assert_eq!(config.capture.duration_secs, MAX_CAPTURE_SECS);
    }

    #[test]
    fn test_missing_file_is_config_error() {
        let err = HarnessConfig::load(Some(Path::new("/nonexistent/aster.json"))).unwrap_err();
        assert!(matches!(err, HarnessError::Config(_)));
    }

    #[test]
    fn test_data_paths() {
        let paths = DataPaths::new("/data");
        assert_eq!(paths.clips(), PathBuf::from("/data/clips"));
        assert_eq!(paths.submissions(), PathBuf::from("/data/submissions.json"));
        assert_eq!(paths.flags(), PathBuf::from("/data/flags.json"));
    }
}
