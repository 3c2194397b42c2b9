//! APA102 output: a start frame of zeroes, one 32-bit word per LED, and an end
//! frame of ones to push the data through the last LEDs.

use log::{debug, info};
use packed_struct::prelude::*;

use self::pack::{ChannelOrder, LedWordPack};

use crate::{
    color::{Brightness, Color, ColorFrame},
    config::Apa102Config,
    error::TransportError,
    link::{self, SpiLink},
    power::PowerEnable,
    sink::PixelSink,
};

pub mod pack;

pub const START_FRAME: [u8; 4] = [0x00; 4];
const MIN_END_FRAME_BYTES: usize = 4;
/// Many SPI backends cap the size of a single transfer
pub const CHUNK_SIZE: usize = 32;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Apa102Encoder {
    pub brightness: Brightness,
    pub order: ChannelOrder,
}

impl Apa102Encoder {
    pub fn new(brightness: Brightness, order: ChannelOrder) -> Self {
        Self { brightness, order }
    }

    /// One end frame bit is needed per two LEDs, but never send fewer than 4
    /// bytes
    pub fn end_frame_len(led_count: usize) -> usize {
        let bits = led_count.div_ceil(2);
        bits.div_ceil(8).max(MIN_END_FRAME_BYTES)
    }

    /// The configured brightness scaled by `percent`
    fn effective_brightness(&self, percent: u8) -> Brightness {
        self.brightness.scaled(percent)
    }

    pub fn word(&self, color: Color, brightness: Brightness) -> Result<[u8; 4], TransportError> {
        LedWordPack::new(color, brightness, self.order)
            .pack()
            .map_err(|e| TransportError::Encoding(format!("{:?}", e)))
    }

    /// Encode a whole frame at the configured brightness
    pub fn encode(&self, frame: &ColorFrame) -> Result<Vec<u8>, TransportError> {
        self.encode_dimmed(frame, &[])
    }

    /// Encode a frame with a per-pixel brightness percentage. Pixels without
    /// an entry in `percents` are sent at 100%.
    fn encode_dimmed(
        &self,
        frame: &ColorFrame,
        percents: &[u8],
    ) -> Result<Vec<u8>, TransportError> {
        let end_frame_len = Self::end_frame_len(frame.len());
        let mut bytes = Vec::with_capacity(START_FRAME.len() + 4 * frame.len() + end_frame_len);

        bytes.extend_from_slice(&START_FRAME);
        for (i, color) in frame.iter().enumerate() {
            let percent = percents.get(i).copied().unwrap_or(100);
            bytes.extend_from_slice(&self.word(*color, self.effective_brightness(percent))?);
        }
        bytes.resize(bytes.len() + end_frame_len, 0xFF);

        Ok(bytes)
    }
}

pub struct Apa102Sink {
    encoder: Apa102Encoder,
    link: Option<Box<dyn SpiLink>>,
    power: Option<PowerEnable>,
}

impl Apa102Sink {
    pub fn open(
        config: &Apa102Config,
        brightness: Brightness,
        order: ChannelOrder,
    ) -> Result<Self, TransportError> {
        let power = config.power_pin.map(PowerEnable::acquire).transpose()?;
        let link = link::open(config.bus, config.slave_select, config.clock_hz)?;

        info!("Using APA102 driver, brightness {}", brightness.level());
        Ok(Self::with_link(
            link,
            power,
            Apa102Encoder::new(brightness, order),
        ))
    }

    /// Power is switched on here, before anything is sent
    pub fn with_link(
        link: Box<dyn SpiLink>,
        mut power: Option<PowerEnable>,
        encoder: Apa102Encoder,
    ) -> Self {
        if let Some(power) = power.as_mut() {
            power.enable();
        }

        Self {
            encoder,
            link: Some(link),
            power,
        }
    }

    pub fn encoder(&self) -> &Apa102Encoder {
        &self.encoder
    }
}

impl PixelSink for Apa102Sink {
    fn transmit(&mut self, frame: &ColorFrame) -> Result<(), TransportError> {
        let link = self.link.as_mut().ok_or(TransportError::Closed("APA102"))?;
        let bytes = self.encoder.encode(frame)?;

        debug!("APA102: sending {} bytes to {}", bytes.len(), link.device());
        for chunk in bytes.chunks(CHUNK_SIZE) {
            link.transfer(chunk)?;
        }

        Ok(())
    }

    fn close(&mut self) {
        if let Some(link) = self.link.take() {
            debug!("APA102: closing {}", link.device());
        }
    }

    fn power_off(&mut self) {
        if let Some(power) = self.power.as_mut() {
            power.release();
        }
    }

    fn name(&self) -> &'static str {
        "APA102"
    }
}
