use crate::color::{Brightness, ColorFrame};

/// A WS2812 bit lasts 1.25us and is sent as 3 SPI bits, so the bus runs at
/// 3 / 1.25us
pub const SPI_CLOCK_HZ: u32 = 2_400_000;
/// Bytes of SPI data per LED: 24 color bits, 3 SPI bits each
pub const BYTES_PER_LED: usize = 9;
/// Low time after the data that latches the colors, 300us at 2.4MHz
pub const RESET_BYTES: usize = 90;

const ONE: u32 = 0b110;
const ZERO: u32 = 0b100;

/// Spread one color byte over 3 SPI bytes, MSB first
pub fn encode_byte(value: u8) -> [u8; 3] {
    let mut bits: u32 = 0;
    for i in 0..8 {
        let symbol = if (value >> i) & 1 == 1 { ONE } else { ZERO };
        bits |= symbol << (i * 3);
    }

    let [_, high, mid, low] = bits.to_be_bytes();
    [high, mid, low]
}

/// The SPI stream for a whole frame, in the GRB order the LEDs expect,
/// followed by the reset period
pub fn encode_frame(frame: &ColorFrame, brightness: Brightness) -> Vec<u8> {
    let mut bytes = Vec::with_capacity(frame.len() * BYTES_PER_LED + RESET_BYTES);

    for color in frame.iter() {
        let color = brightness.dim(*color);
        for channel in [color.g, color.r, color.b] {
            bytes.extend_from_slice(&encode_byte(channel));
        }
    }
    bytes.resize(bytes.len() + RESET_BYTES, 0);

    bytes
}
