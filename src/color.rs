use std::{
    fmt::{self, Display},
    ops::{Deref, DerefMut},
    str::FromStr,
};

use serde::{Deserialize, Serialize};

/// The largest brightness level a pixel word can carry (5 bits)
pub const MAX_BRIGHTNESS: u8 = 0b11111;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Color {
    pub const BLACK: Color = Color::new(0, 0, 0);
    pub const WHITE: Color = Color::new(255, 255, 255);
    pub const RED: Color = Color::new(255, 0, 0);
    pub const YELLOW: Color = Color::new(255, 255, 0);
    pub const BLUE: Color = Color::new(0, 0, 255);
    pub const GREEN: Color = Color::new(0, 255, 0);

    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }
}

impl Display for Color {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{:02X}{:02X}{:02X}", self.r, self.g, self.b)
    }
}

/// The desired color of every LED on the strip, index `i` being physical
/// position `i`.
///
/// The length is chosen when the frame is built and can't change afterwards:
/// the frame derefs to a slice, so entries can be rewritten but never pushed
/// or removed.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ColorFrame(Vec<Color>);

impl ColorFrame {
    /// A frame of `len` black pixels
    pub fn new(len: usize) -> Self {
        Self::filled(len, Color::BLACK)
    }

    pub fn filled(len: usize, color: Color) -> Self {
        Self(vec![color; len])
    }

    /// Build a frame from a flat `r, g, b, r, g, b, ...` list. Returns `None`
    /// when the list isn't made of whole triples.
    pub fn from_flat(values: &[u8]) -> Option<Self> {
        if values.len() % 3 != 0 {
            return None;
        }

        Some(Self(
            values
                .chunks_exact(3)
                .map(|rgb| Color::new(rgb[0], rgb[1], rgb[2]))
                .collect(),
        ))
    }

    pub fn fill(&mut self, color: Color) {
        self.0.iter_mut().for_each(|pixel| *pixel = color);
    }

    /// True when every pixel is black
    pub fn is_dark(&self) -> bool {
        self.0.iter().all(|pixel| *pixel == Color::BLACK)
    }
}

impl Deref for ColorFrame {
    type Target = [Color];

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl DerefMut for ColorFrame {
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut self.0
    }
}

impl From<Vec<Color>> for ColorFrame {
    fn from(pixels: Vec<Color>) -> Self {
        Self(pixels)
    }
}

/// A 5-bit brightness level, 0 (off) to 31 (full)
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord)]
pub struct Brightness(u8);

impl Brightness {
    pub const FULL: Brightness = Brightness(MAX_BRIGHTNESS);
    pub const OFF: Brightness = Brightness(0);

    /// Clamps anything above 31 down to 31
    pub fn new(level: u8) -> Self {
        Self(level.min(MAX_BRIGHTNESS))
    }

    /// Convert a 0.0 - 1.0 fraction into the 5-bit scale
    pub fn from_fraction(fraction: f32) -> Self {
        let fraction = if fraction.is_nan() {
            0.0
        } else {
            fraction.clamp(0.0, 1.0)
        };
        Self((fraction * MAX_BRIGHTNESS as f32).round() as u8)
    }

    pub fn level(self) -> u8 {
        self.0
    }

    /// The same brightness on a 0 - 255 scale
    pub fn to_u8_scale(self) -> u8 {
        ((self.0 as u16 * 255 + 15) / MAX_BRIGHTNESS as u16) as u8
    }

    /// `round(percent / 100 * level)`, clamped to the 5-bit range
    pub fn scaled(self, percent: u8) -> Self {
        let level = (percent as u32 * self.0 as u32 + 50) / 100;
        Self::new(level.min(MAX_BRIGHTNESS as u32) as u8)
    }

    /// Scale the channels of a color for transports without a native
    /// brightness field
    pub fn dim(self, color: Color) -> Color {
        let scale = |channel: u8| {
            ((channel as u16 * self.0 as u16 + 15) / MAX_BRIGHTNESS as u16) as u8
        };
        Color::new(scale(color.r), scale(color.g), scale(color.b))
    }
}

impl Default for Brightness {
    fn default() -> Self {
        Self::FULL
    }
}

/// Brightness as it is configured. APA102 users give an integer 1 - 31, the
/// WS2812 drivers take a 0.0 - 1.0 fraction. Both end up as a [`Brightness`].
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum BrightnessSetting {
    Level(u8),
    Fraction(f32),
}

impl BrightnessSetting {
    pub fn normalize(self) -> Brightness {
        match self {
            BrightnessSetting::Level(level) => Brightness::new(level),
            BrightnessSetting::Fraction(fraction) => Brightness::from_fraction(fraction),
        }
    }
}

impl Default for BrightnessSetting {
    fn default() -> Self {
        BrightnessSetting::Level(MAX_BRIGHTNESS)
    }
}

impl FromStr for BrightnessSetting {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.contains('.') {
            s.parse::<f32>()
                .map(BrightnessSetting::Fraction)
                .map_err(|e| format!("invalid brightness fraction {s:?}: {e}"))
        } else {
            s.parse::<u8>()
                .map(BrightnessSetting::Level)
                .map_err(|e| format!("invalid brightness level {s:?}: {e}"))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn brightness_clamps_instead_of_wrapping() {
        assert_eq!(Brightness::new(40).level(), 31);
        assert_eq!(Brightness::new(0).level(), 0);
        assert_eq!(Brightness::new(255).level(), 31);
    }

    #[test]
    fn brightness_percent_rounds_half_up() {
        let full = Brightness::FULL;
        assert_eq!(full.scaled(100).level(), 31);
        assert_eq!(full.scaled(50).level(), 16);
        assert_eq!(full.scaled(0).level(), 0);
        assert_eq!(full.scaled(200).level(), 31);
        assert_eq!(Brightness::new(10).scaled(25).level(), 3);
    }

    #[test]
    fn brightness_settings_normalize_to_one_scale() {
        assert_eq!(BrightnessSetting::Level(31).normalize(), Brightness::FULL);
        assert_eq!(BrightnessSetting::Fraction(1.0).normalize(), Brightness::FULL);
        assert_eq!(BrightnessSetting::Fraction(0.5).normalize().level(), 16);
        assert_eq!(BrightnessSetting::Fraction(3.0).normalize(), Brightness::FULL);
        assert_eq!(BrightnessSetting::Fraction(-1.0).normalize(), Brightness::OFF);

        assert_eq!("12".parse(), Ok(BrightnessSetting::Level(12)));
        assert_eq!("0.25".parse(), Ok(BrightnessSetting::Fraction(0.25)));
        assert!("bright".parse::<BrightnessSetting>().is_err());
    }

    #[test]
    fn dimming_keeps_full_and_off_exact() {
        let color = Color::new(255, 128, 7);
        assert_eq!(Brightness::FULL.dim(color), color);
        assert_eq!(Brightness::OFF.dim(color), Color::BLACK);
        assert_eq!(Brightness::FULL.to_u8_scale(), 255);
        assert_eq!(Brightness::OFF.to_u8_scale(), 0);
    }

    #[test]
    fn flat_values_become_pixels() {
        let frame = ColorFrame::from_flat(&[255, 0, 0, 0, 0, 255]).unwrap();
        assert_eq!(&*frame, &[Color::RED, Color::BLUE]);
        assert!(ColorFrame::from_flat(&[1, 2]).is_none());
    }
}
