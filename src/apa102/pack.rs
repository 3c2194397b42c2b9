use log::warn;
use packed_struct::{prelude::*, types::bits::Bits};

use crate::color::{Brightness, Color};

// Bit layout of one LED word, MSB first:
// byte # | Bits       | Definition
// 0      | 0xE0       | Marker, always 0b111
//        | 0x1F       | Brightness (0 - 31)
// 1      | 0xFF       | First color channel
// 2      | 0xFF       | Second color channel
// 3      | 0xFF       | Third color channel
#[derive(PackedStruct, Default, Debug, PartialEq, Clone)]
#[packed_struct(bit_numbering = "msb0")]
pub struct LedWordPack {
    #[packed_field(bits = "0..=2")]
    pub _marker: ReservedOne<packed_bits::Bits<3>>,
    #[packed_field(bits = "3..=7")]
    pub brightness: Integer<u8, Bits<5>>,
    #[packed_field(bits = "8..=15")]
    pub first: u8,
    #[packed_field(bits = "16..=23")]
    pub second: u8,
    #[packed_field(bits = "24..=31")]
    pub third: u8,
}

impl LedWordPack {
    pub fn new(color: Color, brightness: Brightness, order: ChannelOrder) -> Self {
        let [first, second, third] = order.arrange(color);
        LedWordPack {
            brightness: brightness.level().into(),
            first,
            second,
            third,
            ..LedWordPack::default()
        }
    }
}

/// Which color goes in bytes 1, 2 and 3 of an LED word
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum ChannelOrder {
    #[default]
    Rgb,
    Rbg,
    Grb,
    Gbr,
    Brg,
    Bgr,
}

impl ChannelOrder {
    pub fn parse(token: &str) -> Option<Self> {
        Some(match token.to_ascii_lowercase().as_str() {
            "rgb" => ChannelOrder::Rgb,
            "rbg" => ChannelOrder::Rbg,
            "grb" => ChannelOrder::Grb,
            "gbr" => ChannelOrder::Gbr,
            "brg" => ChannelOrder::Brg,
            "bgr" => ChannelOrder::Bgr,
            _ => return None,
        })
    }

    /// Unknown tokens fall back to rgb
    pub fn parse_or_default(token: &str) -> Self {
        Self::parse(token).unwrap_or_else(|| {
            warn!("Unknown channel order {:?}, using rgb", token);
            ChannelOrder::Rgb
        })
    }

    pub fn arrange(self, Color { r, g, b }: Color) -> [u8; 3] {
        match self {
            ChannelOrder::Rgb => [r, g, b],
            ChannelOrder::Rbg => [r, b, g],
            ChannelOrder::Grb => [g, r, b],
            ChannelOrder::Gbr => [g, b, r],
            ChannelOrder::Brg => [b, r, g],
            ChannelOrder::Bgr => [b, g, r],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_led_word_pack_empty() -> Result<(), PackingError> {
        assert_eq!([0xE0, 0x00, 0x00, 0x00], LedWordPack::default().pack()?);
        Ok(())
    }

    #[test]
    fn test_led_word_pack() -> Result<(), PackingError> {
        assert_eq!(
            [0xFF, 0x12, 0x34, 0x56],
            LedWordPack::new(
                Color::new(0x12, 0x34, 0x56),
                Brightness::FULL,
                ChannelOrder::Rgb
            )
            .pack()?
        );

        assert_eq!(
            [0xE5, 0x56, 0x34, 0x12],
            LedWordPack::new(
                Color::new(0x12, 0x34, 0x56),
                Brightness::new(5),
                ChannelOrder::Bgr
            )
            .pack()?
        );

        Ok(())
    }

    #[test]
    fn every_order_is_a_permutation() {
        let color = Color::new(1, 2, 3);
        let cases = [
            ("rgb", [1, 2, 3]),
            ("rbg", [1, 3, 2]),
            ("grb", [2, 1, 3]),
            ("gbr", [2, 3, 1]),
            ("brg", [3, 1, 2]),
            ("bgr", [3, 2, 1]),
        ];

        for (token, expected) in cases {
            assert_eq!(ChannelOrder::parse(token).unwrap().arrange(color), expected);
        }
    }

    #[test]
    fn unknown_order_falls_back_to_rgb() {
        assert_eq!(ChannelOrder::parse_or_default("GRB"), ChannelOrder::Grb);
        assert_eq!(ChannelOrder::parse_or_default("rgbw"), ChannelOrder::Rgb);
        assert_eq!(ChannelOrder::parse_or_default(""), ChannelOrder::Rgb);
    }
}
