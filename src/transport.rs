use embedded_hal::i2c::I2c;

use crate::BusConfig;

/// Upper bound in milliseconds a HAL should wait for a free bus per transaction.
pub const I2C_TIMEOUT_MS: u32 = 50;

/// Single byte, write only access to the expander.
pub trait Transport {
    type Error;

    /// Prepares the bus. Called once per driver, before the first write.
    ///
    /// Most HALs hand out an already configured bus, so this does nothing by default.
    fn configure(&mut self, _bus: &BusConfig) -> Result<(), Self::Error> {
        Ok(())
    }

    /// Writes `value` to the device at the 7 bit `address` in one complete transaction.
    fn write_byte(&mut self, address: u8, value: u8) -> Result<(), Self::Error>;
}

/// [`Transport`] over an [`embedded_hal::i2c::I2c`] bus.
///
/// The HAL is expected to give up after [`I2C_TIMEOUT_MS`] and report a timeout as its error.
pub struct I2cBus<I>
where
    I: I2c,
{
    i2c: I,
}

impl<I> I2cBus<I>
where
    I: I2c,
{
    pub fn new(i2c: I) -> Self {
        Self { i2c }
    }

    /// Hands the wrapped bus back.
    pub fn release(self) -> I {
        self.i2c
    }
}

impl<I> Transport for I2cBus<I>
where
    I: I2c,
{
    type Error = I::Error;

    fn write_byte(&mut self, address: u8, value: u8) -> Result<(), Self::Error> {
        self.i2c.write(address, &[value])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use embedded_hal::i2c::ErrorKind;
    use embedded_hal_mock::eh1::i2c::{Mock as I2cMock, Transaction as I2cTransaction};

    #[test]
    fn write_byte_is_one_transaction() {
        let expected = std::vec![I2cTransaction::write(0x27, std::vec![0xA5])];
        let mut bus = I2cBus::new(I2cMock::new(&expected));

        assert!(bus.configure(&BusConfig::default()).is_ok());
        assert!(bus.write_byte(0x27, 0xA5).is_ok());

        bus.release().done();
    }

    #[test]
    fn write_byte_reports_bus_error() {
        let expected = std::vec![
            I2cTransaction::write(0x3F, std::vec![0x08]).with_error(ErrorKind::Other)
        ];
        let mut bus = I2cBus::new(I2cMock::new(&expected));

        assert_eq!(bus.write_byte(0x3F, 0x08), Err(ErrorKind::Other));

        bus.release().done();
    }
}
