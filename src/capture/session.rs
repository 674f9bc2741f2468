use std::time::{Duration, Instant};

use serde::{Deserialize, Serialize};

use super::encoder::ChunkEncoder;
use crate::core::{Countdown, FixedRate, FrameStream};
use crate::error::{HarnessError, HarnessResult};
use crate::types::Clip;

pub const DEFAULT_DURATION_SECS: f32 = 10.0;
pub const DEFAULT_FRAME_RATE: u32 = 30;
/// Longest clip a session may record, in seconds
pub const MAX_CAPTURE_SECS: f32 = 3600.0;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CaptureSettings {
    pub duration_secs: f32,
    pub frame_rate: u32,
    pub jpeg_quality: u8,
}

impl Default for CaptureSettings {
    fn default() -> Self {
        Self {
            duration_secs: DEFAULT_DURATION_SECS,
            frame_rate: DEFAULT_FRAME_RATE,
            jpeg_quality: super::encoder::DEFAULT_JPEG_QUALITY,
        }
    }
}

impl CaptureSettings {
    /// Recording window, clamped to `[0, MAX_CAPTURE_SECS]`
    pub fn duration(&self) -> Duration {
        let secs = self.duration_secs.clamp(0.0, MAX_CAPTURE_SECS);
        Duration::try_from_secs_f32(secs).unwrap_or_default()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CaptureState {
    Idle,
    Recording,
    Encoding,
    Completed,
    Failed,
}

impl CaptureState {
    /// Recording or encoding; a new session may not start
    pub fn is_active(self) -> bool {
        matches!(self, Self::Recording | Self::Encoding)
    }
}

/// One bounded recording of a surface's frame stream
///
/// The chunk buffer never leaves the session; only the finished [`Clip`] does.
#[derive(Debug)]
pub struct CaptureSession {
    stream: FrameStream,
    window: Countdown,
    sampler: FixedRate,
    state: CaptureState,
    chunks: Vec<Vec<u8>>,
    size: (u32, u32),
    surface_lost: bool,
}

impl CaptureSession {
    pub fn begin(stream: FrameStream, settings: CaptureSettings, now: Instant) -> Self {
        Self {
            stream,
            window: Countdown::start(now, settings.duration()),
            sampler: FixedRate::new(settings.frame_rate, now),
            state: CaptureState::Recording,
            chunks: Vec::new(),
            size: (0, 0),
            surface_lost: false,
        }
    }

    pub fn state(&self) -> CaptureState {
        self.state
    }

    pub fn progress(&self, now: Instant) -> f32 {
        self.window.progress(now)
    }

    /// Consume available frames; finishes the session at or after the deadline
    ///
    /// Returns `Some` exactly once, when the session reaches `Completed` or
    /// `Failed`.
    pub fn poll(&mut self, encoder: &mut dyn ChunkEncoder, now: Instant) -> Option<HarnessResult<Clip>> {
        if self.state != CaptureState::Recording {
            return None;
        }

        if let Err(e) = self.drain(encoder) {
            return Some(self.fail(e));
        }

        if self.window.expired(now) {
            return Some(self.finish(encoder));
        }
        if self.surface_lost {
            return Some(self.fail(HarnessError::SurfaceLost));
        }
        None
    }

    fn drain(&mut self, encoder: &mut dyn ChunkEncoder) -> HarnessResult<()> {
        loop {
            match self.stream.try_next() {
                Ok(Some(frame)) => {
                    if !self.window.contains(frame.captured_at) || !self.sampler.tick(frame.captured_at) {
                        continue;
                    }
                    let chunk = encoder.encode(&frame)?;
                    if !chunk.is_empty() {
                        self.size = (frame.width, frame.height);
                        self.chunks.push(chunk);
                    }
                }
                Ok(None) => {
                    self.surface_lost = true;
                    return Ok(());
                }
                // Open but empty
                Err(_) => return Ok(()),
            }
        }
    }

    fn finish(&mut self, encoder: &dyn ChunkEncoder) -> HarnessResult<Clip> {
        self.state = CaptureState::Encoding;
        let frames = self.chunks.len() as u32;
        let bytes = std::mem::take(&mut self.chunks).concat();

        if bytes.is_empty() {
            return self.fail(HarnessError::EmptyCapture);
        }

        self.state = CaptureState::Completed;
        log::info!("capture completed: {} frames, {} bytes", frames, bytes.len());
        Ok(Clip {
            bytes,
            content_type: encoder.content_type(),
            extension: encoder.extension(),
            frames,
            width: self.size.0,
            height: self.size.1,
        })
    }

    fn fail(&mut self, error: HarnessError) -> HarnessResult<Clip> {
        self.state = CaptureState::Failed;
        self.chunks.clear();
        log::warn!("capture failed: {}", error);
        Err(error)
    }
}
