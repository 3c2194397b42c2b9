use log::{debug, info};
use pi_pinout::GpioPin;

#[cfg(feature = "pi")]
use rppal::gpio::{Gpio, OutputPin};

use crate::{config::Pin, error::TransportError};

/// The LED power line on boards like the ReSpeaker HATs. The line is active
/// low, so enabling the LEDs drives the pin low and releasing them drives it
/// high.
pub struct PowerEnable {
    #[cfg(feature = "pi")]
    pin: OutputPin,
    gpio: u8,
    enabled: bool,
}

impl PowerEnable {
    pub fn acquire(pin: Pin) -> Result<Self, TransportError> {
        let gpio: GpioPin = pin.into();
        let device = format!("GPIO {}", gpio.0);

        info!("LED power: initializing on pin {}", gpio.0);

        // Only touch the GPIO if the Pi feature is enabled
        #[cfg(feature = "pi")]
        let pin = {
            let mut pin = Gpio::new()
                .map_err(|e| TransportError::open(&device, e))?
                .get(gpio.0)
                .map_err(|e| TransportError::open(&device, e))?
                .into_output_high();

            // Leave the line as-is on exit, only release() turns it off
            pin.set_reset_on_drop(false);
            pin
        };

        #[cfg(not(feature = "pi"))]
        log::warn!("{}: built without the `pi` feature, power control disabled", device);

        Ok(Self {
            #[cfg(feature = "pi")]
            pin,
            gpio: gpio.0,
            enabled: false,
        })
    }

    pub fn enable(&mut self) {
        debug!("LED power: enabling GPIO {}", self.gpio);

        #[cfg(feature = "pi")]
        self.pin.set_low();

        self.enabled = true;
    }

    /// Safe to call repeatedly
    pub fn release(&mut self) {
        if !self.enabled {
            return;
        }
        debug!("LED power: releasing GPIO {}", self.gpio);

        #[cfg(feature = "pi")]
        self.pin.set_high();

        self.enabled = false;
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }
}
