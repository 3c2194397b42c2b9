use log::{debug, info, warn};

use crate::{
    color::{Color, ColorFrame},
    error::{ConfigError, LedError},
    sink::{PixelSink, Transport},
};

/// The most LEDs a controller will drive
pub const MAX_LEDS: usize = 10;

/// Owns the transport and the last frame sent to it.
///
/// None of the transports can update a single pixel, so every change resends
/// the whole frame: one call, one transmission. Use [`LedController::set_frame`]
/// to change several pixels at once.
pub struct LedController<S: PixelSink = Transport> {
    sink: S,
    frame: ColorFrame,
    closed: bool,
}

impl<S: PixelSink> LedController<S> {
    /// Nothing is sent until the first update
    pub fn new(led_count: usize, sink: S) -> Result<Self, LedError> {
        if led_count == 0 || led_count > MAX_LEDS {
            return Err(ConfigError::LedCount(led_count).into());
        }

        Ok(Self {
            sink,
            frame: ColorFrame::new(led_count),
            closed: false,
        })
    }

    pub fn led_count(&self) -> usize {
        self.frame.len()
    }

    /// The colors most recently handed to the transport
    pub fn frame(&self) -> &ColorFrame {
        &self.frame
    }

    pub fn sink(&self) -> &S {
        &self.sink
    }

    pub fn set_pixel(&mut self, index: usize, color: Color) -> Result<(), LedError> {
        let len = self.led_count();
        let pixel = self
            .frame
            .get_mut(index)
            .ok_or(LedError::Index { index, len })?;
        *pixel = color;

        debug!("LED {}: setting to {}", index, color);
        self.show()
    }

    pub fn set_all(&mut self, color: Color) -> Result<(), LedError> {
        self.frame.fill(color);

        debug!("All LEDs: setting to {}", color);
        self.show()
    }

    pub fn set_frame(&mut self, frame: ColorFrame) -> Result<(), LedError> {
        if frame.len() != self.led_count() {
            return Err(ConfigError::FrameLength {
                expected: self.led_count(),
                actual: frame.len(),
            }
            .into());
        }
        self.frame = frame;

        self.show()
    }

    /// Set every LED from a flat `r, g, b, r, g, b, ...` list, which must hold
    /// exactly three values per LED
    pub fn set_pattern(&mut self, values: &[u8]) -> Result<(), LedError> {
        let expected = 3 * self.led_count();
        let frame = ColorFrame::from_flat(values)
            .filter(|frame| frame.len() == self.led_count())
            .ok_or(ConfigError::PatternLength {
                expected,
                actual: values.len(),
            })?;

        self.set_frame(frame)
    }

    pub fn clear(&mut self) -> Result<(), LedError> {
        self.set_all(Color::BLACK)
    }

    /// Turn everything off, cut LED power and let go of the transport. Errors
    /// are logged and dropped, and later calls only reset the frame.
    pub fn cleanup(&mut self) {
        if self.closed {
            self.frame.fill(Color::BLACK);
            return;
        }

        info!("Cleaning up {}", self.sink.name());
        if let Err(e) = self.clear() {
            warn!("Failed to clear LEDs during cleanup: {}", e);
            self.frame.fill(Color::BLACK);
        }
        self.sink.power_off();
        self.release();
    }

    /// Let go of the transport without touching the LEDs. They keep showing
    /// the last frame.
    pub fn release(&mut self) {
        if !self.closed {
            self.sink.close();
            self.closed = true;
        }
    }

    fn show(&mut self) -> Result<(), LedError> {
        self.sink.transmit(&self.frame)?;
        Ok(())
    }
}
