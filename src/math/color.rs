use serde::{Deserialize, Serialize};

/// 24-bit RGB color stored as `0xRRGGBB`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Color(pub u32);

impl Color {
    pub const WHITE: Color = Color(0xffffff);
    pub const BLACK: Color = Color(0x000000);

    /// Default viewport background, dark navy
    pub const BACKGROUND: Color = Color(0x111827);

    /// Neutral fill shown while no definition is loaded
    pub const PLACEHOLDER: Color = Color(0x1f2937);

    pub const fn from_hex(hex: u32) -> Self {
        Self(hex & 0x00ff_ffff)
    }

    pub fn from_rgb(rgb: [f32; 3]) -> Self {
        let channel = |v: f32| (v.clamp(0.0, 1.0) * 255.0).round() as u32;
        Self((channel(rgb[0]) << 16) | (channel(rgb[1]) << 8) | channel(rgb[2]))
    }

    pub fn from_hsv(h: f32, s: f32, v: f32) -> Self {
        Self::from_rgb(hsv_to_rgb(h, s, v))
    }

    pub fn to_rgb(self) -> [f32; 3] {
        let [r, g, b, _] = self.to_rgba8();
        [r as f32 / 255.0, g as f32 / 255.0, b as f32 / 255.0]
    }

    pub fn to_rgba8(self) -> [u8; 4] {
        [
            ((self.0 >> 16) & 0xff) as u8,
            ((self.0 >> 8) & 0xff) as u8,
            (self.0 & 0xff) as u8,
            255,
        ]
    }
}

impl Default for Color {
    fn default() -> Self {
        Self::BACKGROUND
    }
}

pub fn hsv_to_rgb(h: f32, s: f32, v: f32) -> [f32; 3] {
    let c = v * s;
    let h_prime = (h.rem_euclid(1.0) * 6.0) % 6.0;
    let x = c * (1.0 - ((h_prime % 2.0) - 1.0).abs());
    let m = v - c;

    let (r, g, b) = match h_prime as i32 {
        0 => (c, x, 0.0),
        1 => (x, c, 0.0),
        2 => (0.0, c, x),
        3 => (0.0, x, c),
        4 => (x, 0.0, c),
        _ => (c, 0.0, x),
    };

    [r + m, g + m, b + m]
}
