use image::codecs::jpeg::JpegEncoder;
use image::ExtendedColorType;

use crate::core::SurfaceFrame;
use crate::error::{HarnessError, HarnessResult};

pub const MJPEG_CONTENT_TYPE: &str = "video/x-motion-jpeg";
pub const DEFAULT_JPEG_QUALITY: u8 = 80;

/// Turns one sampled frame into one self-contained chunk of the clip
pub trait ChunkEncoder {
    fn content_type(&self) -> &'static str;

    /// File extension of the finished clip, without the dot
    fn extension(&self) -> &'static str;

    fn encode(&mut self, frame: &SurfaceFrame) -> HarnessResult<Vec<u8>>;
}

/// Motion-JPEG: every chunk is a complete JPEG image, the clip is their concatenation
#[derive(Debug, Clone, Copy)]
pub struct MjpegEncoder {
    quality: u8,
}

impl MjpegEncoder {
    pub fn new(quality: u8) -> Self {
        Self {
            quality: quality.clamp(1, 100),
        }
    }

    pub fn quality(&self) -> u8 {
        self.quality
    }
}

impl Default for MjpegEncoder {
    fn default() -> Self {
        Self::new(DEFAULT_JPEG_QUALITY)
    }
}

impl ChunkEncoder for MjpegEncoder {
    fn content_type(&self) -> &'static str {
        MJPEG_CONTENT_TYPE
    }

    fn extension(&self) -> &'static str {
        "mjpeg"
    }

    fn encode(&mut self, frame: &SurfaceFrame) -> HarnessResult<Vec<u8>> {
        let expected = frame.width as usize * frame.height as usize * 4;
        if frame.pixels().len() != expected {
            return Err(HarnessError::encode(format!(
                "frame {} has {} bytes, expected {}",
                frame.number,
                frame.pixels().len(),
                expected
            )));
        }

        // JPEG has no alpha channel
        let rgb: Vec<u8> = frame
            .pixels()
            .chunks_exact(4)
            .flat_map(|px| [px[0], px[1], px[2]])
            .collect();

        let mut chunk = Vec::new();
        JpegEncoder::new_with_quality(&mut chunk, self.quality)
            .encode(&rgb, frame.width, frame.height, ExtendedColorType::Rgb8)
            .map_err(|e| HarnessError::encode(e.to_string()))?;
        Ok(chunk)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::rc::Rc;
    use std::time::Instant;

    fn frame(width: u32, height: u32, bytes: usize) -> SurfaceFrame {
        SurfaceFrame {
            number: 0,
            captured_at: Instant::now(),
            width,
            height,
            pixels: Rc::from(vec![200u8; bytes]),
        }
    }

    #[test]
    fn test_chunk_is_a_jpeg_image() {
        let mut encoder = MjpegEncoder::default();
        let chunk = encoder.encode(&frame(8, 8, 8 * 8 * 4)).unwrap();

        assert_eq!(&chunk[..2], &[0xFF, 0xD8]);
        assert_eq!(&chunk[chunk.len() - 2..], &[0xFF, 0xD9]);
        assert_eq!(encoder.content_type(), MJPEG_CONTENT_TYPE);
    }

    #[test]
    fn test_short_frame_is_rejected() {
        let mut encoder = MjpegEncoder::new(50);
        let err = encoder.encode(&frame(8, 8, 10)).unwrap_err();
        assert!(matches!(err, HarnessError::Encode(_)));
    }

    #[test]
    fn test_quality_is_clamped() {
        assert_eq!(MjpegEncoder::new(0).quality(), 1);
        assert_eq!(MjpegEncoder::new(255).quality(), 100);
    }
}
