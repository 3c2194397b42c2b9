use log::{debug, info};
use pi_pinout::GpioPin;

#[cfg(feature = "ws281x")]
use rs_ws281x::{ChannelBuilder, Controller, ControllerBuilder, StripType};

use crate::{
    color::{Brightness, ColorFrame},
    config::Ws2812Config,
    error::TransportError,
    link::{self, SpiLink},
    sink::PixelSink,
};

pub mod pack;

/// WS2812 data rate for the PWM/DMA driver
pub const SIGNAL_FREQ_HZ: u32 = 800_000;

/// WS2812 bit timing generated by the SPI peripheral, as used on the
/// Raspberry Pi 5. Changing one LED means resending all of them.
pub struct Ws2812SpiSink {
    link: Option<Box<dyn SpiLink>>,
    brightness: Brightness,
}

impl Ws2812SpiSink {
    pub fn open(config: &Ws2812Config, brightness: Brightness) -> Result<Self, TransportError> {
        let link = link::open(config.bus, config.slave_select, pack::SPI_CLOCK_HZ)?;

        info!("Using WS2812 SPI driver, brightness {}", brightness.level());
        Ok(Self::with_link(link, brightness))
    }

    pub fn with_link(link: Box<dyn SpiLink>, brightness: Brightness) -> Self {
        Self {
            link: Some(link),
            brightness,
        }
    }
}

impl PixelSink for Ws2812SpiSink {
    fn transmit(&mut self, frame: &ColorFrame) -> Result<(), TransportError> {
        let link = self
            .link
            .as_mut()
            .ok_or(TransportError::Closed("WS2812 SPI"))?;

        link.transfer(&pack::encode_frame(frame, self.brightness))
    }

    fn close(&mut self) {
        if let Some(link) = self.link.take() {
            debug!("WS2812 SPI: closing {}", link.device());
        }
    }

    fn name(&self) -> &'static str {
        "WS2812 SPI"
    }
}

/// WS2812 output through the PWM/DMA driver. The driver does its own bit
/// timing, we only hand it colors.
pub struct PwmSink {
    #[cfg(feature = "ws281x")]
    controller: Option<Controller>,
    data_pin: u8,
}

impl PwmSink {
    pub fn open(
        config: &Ws2812Config,
        led_count: usize,
        brightness: Brightness,
    ) -> Result<Self, TransportError> {
        let data_pin: GpioPin = config.data_pin.into();
        let sink = Self::open_driver(config, data_pin.0, led_count, brightness)?;

        info!(
            "Using WS281x PWM driver on GPIO {}, brightness {}",
            data_pin.0,
            brightness.level()
        );
        Ok(sink)
    }

    #[cfg(feature = "ws281x")]
    fn open_driver(
        config: &Ws2812Config,
        data_pin: u8,
        led_count: usize,
        brightness: Brightness,
    ) -> Result<Self, TransportError> {
        let controller = ControllerBuilder::new()
            .freq(SIGNAL_FREQ_HZ)
            .dma(config.dma)
            .channel(
                0,
                ChannelBuilder::new()
                    .pin(data_pin as i32)
                    .count(led_count as i32)
                    .strip_type(StripType::Ws2812)
                    .brightness(brightness.to_u8_scale())
                    .build(),
            )
            .build()
            .map_err(|e| TransportError::open(driver_name(data_pin), format!("{e:?}")))?;

        Ok(Self {
            controller: Some(controller),
            data_pin,
        })
    }

    #[cfg(not(feature = "ws281x"))]
    fn open_driver(
        _config: &Ws2812Config,
        data_pin: u8,
        _led_count: usize,
        _brightness: Brightness,
    ) -> Result<Self, TransportError> {
        debug!("No PWM driver for GPIO {}", data_pin);
        Err(TransportError::Unsupported(
            "PWM output needs the `ws281x` feature",
        ))
    }
}

#[cfg(feature = "ws281x")]
fn driver_name(data_pin: u8) -> String {
    format!("ws281x on GPIO {data_pin}")
}

impl PixelSink for PwmSink {
    #[cfg(feature = "ws281x")]
    fn transmit(&mut self, frame: &ColorFrame) -> Result<(), TransportError> {
        let controller = self
            .controller
            .as_mut()
            .ok_or(TransportError::Closed("WS281x PWM"))?;

        // The driver wants 0xWWRRGGBB words, little endian
        for (led, color) in controller.leds_mut(0).iter_mut().zip(frame.iter()) {
            *led = [color.b, color.g, color.r, 0];
        }

        controller
            .render()
            .map_err(|e| TransportError::write(driver_name(self.data_pin), format!("{e:?}")))
    }

    #[cfg(not(feature = "ws281x"))]
    fn transmit(&mut self, _frame: &ColorFrame) -> Result<(), TransportError> {
        Err(TransportError::Closed("WS281x PWM"))
    }

    fn close(&mut self) {
        debug!("WS281x PWM: closing GPIO {}", self.data_pin);

        #[cfg(feature = "ws281x")]
        self.controller.take();
    }

    fn name(&self) -> &'static str {
        "WS281x PWM"
    }
}
