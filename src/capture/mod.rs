pub mod encoder;
pub mod session;

pub use encoder::{ChunkEncoder, MjpegEncoder, MJPEG_CONTENT_TYPE};
pub use session::{CaptureSession, CaptureSettings, CaptureState, MAX_CAPTURE_SECS};

pub use crate::types::Clip;

use std::time::Instant;

use crate::core::OutputSurface;
use crate::error::{HarnessError, HarnessResult};

/// Capture Subsystem - owns the one capture session that may exist
pub struct CaptureSubsystem {
    encoder: Box<dyn ChunkEncoder>,
    settings: CaptureSettings,
    session: Option<CaptureSession>,
}

impl CaptureSubsystem {
    pub fn new(encoder: Box<dyn ChunkEncoder>, settings: CaptureSettings) -> Self {
        Self {
            encoder,
            settings,
            session: None,
        }
    }

    /// Motion-JPEG subsystem with the quality from `settings`
    pub fn mjpeg(settings: CaptureSettings) -> Self {
        Self::new(Box::new(MjpegEncoder::new(settings.jpeg_quality)), settings)
    }

    pub fn settings(&self) -> CaptureSettings {
        self.settings
    }

    pub fn state(&self) -> CaptureState {
        self.session.as_ref().map_or(CaptureState::Idle, CaptureSession::state)
    }

    pub fn is_busy(&self) -> bool {
        self.state().is_active()
    }

    pub fn session(&self) -> Option<&CaptureSession> {
        self.session.as_ref()
    }

    /// Start recording `surface`
    ///
    /// Fails with `SessionBusy` while a session is recording or encoding and
    /// with `NoSurface` when there is no live surface to record.
    pub fn start(&mut self, surface: Option<&OutputSurface>, now: Instant) -> HarnessResult<()> {
        if self.is_busy() {
            return Err(HarnessError::SessionBusy);
        }
        let surface = surface
            .filter(|s| !s.is_closed())
            .ok_or(HarnessError::NoSurface)?;

        self.session = Some(CaptureSession::begin(surface.subscribe(), self.settings, now));
        log::info!(
            "capture started on surface {:?}: {}s at {} fps",
            surface.id(),
            self.settings.duration_secs,
            self.settings.frame_rate
        );
        Ok(())
    }

    /// Advance the active session; `Some` once it completed or failed
    pub fn poll(&mut self, now: Instant) -> Option<HarnessResult<Clip>> {
        let session = self.session.as_mut()?;
        session.poll(self.encoder.as_mut(), now)
    }
}
