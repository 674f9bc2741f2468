pub mod camera;
pub mod capture;
pub mod cli;
pub mod config;
pub mod core;
pub mod definitions;
pub mod error;
pub mod gallery;
pub mod host;
pub mod math;
pub mod reconciler;
pub mod render_loop;
pub mod renderer;
pub mod scene;
pub mod store;
pub mod submission;
pub mod traits;
pub mod types;

pub use capture::{CaptureSettings, CaptureState, CaptureSubsystem};
pub use config::{DataPaths, HarnessConfig};
pub use error::{HarnessError, HarnessResult, StoreError};
pub use gallery::Gallery;
pub use host::{GenerationId, SceneGeneration, SceneHost};
pub use reconciler::{Harness, HarnessStatus};
pub use renderer::{SoftwareRenderer, SoftwareRendererFactory};
pub use submission::{SubmissionPipeline, SubmissionSettings, SubmissionState};
pub use types::{Clip, SubmissionRecord, SubmissionRow};
