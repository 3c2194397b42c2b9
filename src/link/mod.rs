use log::{info, trace};

#[cfg(feature = "pi")]
use rppal::spi::{Bus, Mode, SlaveSelect, Spi};

use crate::error::TransportError;

/// A clocked serial channel that takes one transfer at a time
pub trait SpiLink: Send {
    fn transfer(&mut self, bytes: &[u8]) -> Result<(), TransportError>;

    fn device(&self) -> &str;
}

/// Open `/dev/spidev<bus>.<slave_select>`
pub fn open(bus: u8, slave_select: u8, clock_hz: u32) -> Result<Box<dyn SpiLink>, TransportError> {
    let device = format!("spidev{bus}.{slave_select}");

    #[cfg(feature = "pi")]
    {
        let spi = Spi::new(
            spi_bus(bus).ok_or_else(|| TransportError::open(&device, "no such SPI bus"))?,
            slave_select_line(slave_select)
                .ok_or_else(|| TransportError::open(&device, "no such slave select line"))?,
            clock_hz,
            Mode::Mode0,
        )
        .map_err(|e| TransportError::open(&device, e))?;

        info!("Opened {} at {} Hz", device, clock_hz);
        Ok(Box::new(RppalLink { spi, device }))
    }

    #[cfg(not(feature = "pi"))]
    {
        info!(
            "{}: built without the `pi` feature, frames at {} Hz are only logged",
            device, clock_hz
        );
        Ok(Box::new(LogLink { device }))
    }
}

#[cfg(feature = "pi")]
struct RppalLink {
    spi: Spi,
    device: String,
}

#[cfg(feature = "pi")]
impl SpiLink for RppalLink {
    fn transfer(&mut self, bytes: &[u8]) -> Result<(), TransportError> {
        trace!("{}: {:02X?}", self.device, bytes);
        let written = self
            .spi
            .write(bytes)
            .map_err(|e| TransportError::write(&self.device, e))?;

        if written != bytes.len() {
            return Err(TransportError::write(
                &self.device,
                format!("short write, {} of {} bytes", written, bytes.len()),
            ));
        }

        Ok(())
    }

    fn device(&self) -> &str {
        &self.device
    }
}

#[cfg(feature = "pi")]
fn spi_bus(bus: u8) -> Option<Bus> {
    Some(match bus {
        0 => Bus::Spi0,
        1 => Bus::Spi1,
        2 => Bus::Spi2,
        3 => Bus::Spi3,
        4 => Bus::Spi4,
        5 => Bus::Spi5,
        6 => Bus::Spi6,
        _ => return None,
    })
}

#[cfg(feature = "pi")]
fn slave_select_line(line: u8) -> Option<SlaveSelect> {
    Some(match line {
        0 => SlaveSelect::Ss0,
        1 => SlaveSelect::Ss1,
        2 => SlaveSelect::Ss2,
        3 => SlaveSelect::Ss3,
        _ => return None,
    })
}

/// Stand-in for hosts without SPI hardware
#[cfg(not(feature = "pi"))]
struct LogLink {
    device: String,
}

#[cfg(not(feature = "pi"))]
impl SpiLink for LogLink {
    fn transfer(&mut self, bytes: &[u8]) -> Result<(), TransportError> {
        trace!("{}: {:02X?}", self.device, bytes);
        Ok(())
    }

    fn device(&self) -> &str {
        &self.device
    }
}
