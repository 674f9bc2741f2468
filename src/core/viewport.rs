/// Viewport - client size of a mount point plus its device pixel ratio
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Viewport {
    /// Client width in logical pixels
    pub width: u32,
    /// Client height in logical pixels
    pub height: u32,
    /// Device pixel ratio
    pub pixel_ratio: f32,
}

impl Viewport {
    /// Create new viewport
    pub fn new(width: u32, height: u32, pixel_ratio: f32) -> Self {
        Self {
            width,
            height,
            pixel_ratio: if pixel_ratio > 0.0 { pixel_ratio } else { 1.0 },
        }
    }

    /// Aspect ratio used by the camera; a collapsed mount reports 1.0
    pub fn aspect(&self) -> f32 {
        if self.width == 0 || self.height == 0 {
            1.0
        } else {
            self.width as f32 / self.height as f32
        }
    }

    /// Drawing buffer size in physical pixels, never smaller than 1x1
    pub fn physical_size(&self) -> (u32, u32) {
        let scale = |v: u32| ((v as f32 * self.pixel_ratio).round() as u32).max(1);
        (scale(self.width), scale(self.height))
    }

    /// Total size in bytes for an RGBA buffer of the physical size
    pub fn buffer_size(&self) -> usize {
        let (w, h) = self.physical_size();
        (w * h * 4) as usize
    }
}
