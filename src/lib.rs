#![no_std]
//! Driver to write characters to HD44780 compatible LCD displays that sit behind a PCF8574 I/O
//! expander ("I2C backpack") like [this one]. The expander only takes single byte writes, so the
//! 4 bit parallel bus of the display controller is rebuilt from timed writes of whole expander
//! bytes. It requires a transport, usually an [`I2cBus`] around an [`embedded_hal::i2c::I2c`]
//! instance, and an instance to delay execution with [`embedded_hal::delay::DelayNs`].
//!
//! Usage:
//! ```ignore
//! const LCD_ADDRESS: u8 = 0x27; // Address depends on hardware, see link below
//!
//! // Create a I2C instance, needs to implement embedded_hal::i2c::I2c, this
//! // particular uses the arduino_hal crate for avr microcontrollers like the arduinos.
//! let dp = arduino_hal::Peripherals::take().unwrap();
//! let pins = arduino_hal::pins!(dp);
//! let i2c = arduino_hal::I2c::new(
//!     dp.TWI, //
//!     pins.a4.into_pull_up_input(), // use respective pins
//!     pins.a5.into_pull_up_input(),
//!     50000,
//! );
//! let mut bus = pcf8574_hd44780::I2cBus::new(i2c);
//! let mut delay = arduino_hal::Delay::new();
//!
//! let mut lcd = pcf8574_hd44780::Lcd::new(&mut bus, &mut delay)
//!     .with_address(LCD_ADDRESS)
//!     .with_cols(16)
//!     .with_rows(2)
//!     .init().unwrap();
//! lcd.display_text("Hello, S3!").unwrap();
//! ```
//!
//! This [site][lcd address] describes how to find the address of your LCD devices.
//!
//! The expander byte is laid out as `[D7 D6 D5 D4 | BL EN RW RS]`. RW is always 0, the backpack
//! is never read from.
//!
//! [this one]: https://funduinoshop.com/elektronische-module/displays/lcd/16x02-i2c-lcd-modul-hintergrundbeleuchtung-blau
//! [lcd address]: https://www.ardumotive.com/i2clcden.html

#[cfg(test)]
extern crate std;

pub mod sync_lcd;
pub mod transport;

pub use sync_lcd::Lcd;
pub use transport::{I2cBus, Transport, I2C_TIMEOUT_MS};

/// DDRAM base address of each row. Rows 2 and 3 continue rows 0 and 1 on 20x4 controllers, which
/// gives the odd ordering.
pub const LINE_ADDRESSES: [u8; 4] = [0x00, 0x40, 0x14, 0x54];

/// Errors returned by the driver.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Error<E> {
    /// The byte was not confirmed delivered by the transport.
    Bus(E),
    /// No string was passed to print.
    InvalidArgument,
}

/// Flags of the display control command.
#[repr(u8)]
#[derive(Copy, Clone)]
pub enum DisplayControl {
    Off = 0x00,
    CursorBlink = 0x01,
    CursorOn = 0x02,
    DisplayOn = 0x04,
}

/// State of the backlight bit, cached and merged into every byte sent to the expander.
#[repr(u8)]
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Backlight {
    Off = 0x00,
    On = 0x08,
}

impl From<bool> for Backlight {
    fn from(on: bool) -> Self {
        if on {
            Backlight::On
        } else {
            Backlight::Off
        }
    }
}

/// Control lines in the lower nibble of the expander byte.
#[repr(u8)]
#[derive(Copy, Clone)]
enum Pin {
    RegisterSelect = 0x01,
    ReadWrite = 0x02,
    Enable = 0x04,
}

#[repr(u8)]
#[derive(Copy, Clone)]
enum Mode {
    EntrySet = 0x04,
    DisplayControl = 0x08,
    FunctionSet = 0x20,
    DDRAMAddr = 0x80,
}

#[repr(u8)]
#[derive(Copy, Clone)]
enum Commands {
    Clear = 0x01,
    ReturnHome = 0x02,
    ShiftDisplayLeft = 0x10 | 0x08,
    ShiftDisplayRight = 0x10 | 0x08 | 0x04,
}

#[repr(u8)]
#[derive(Copy, Clone)]
enum BitMode {
    Bit4 = 0x0 << 4,
    Bit8 = 0x1 << 4,
}

#[repr(u8)]
#[derive(Copy, Clone)]
enum Lines {
    Two = 0x08,
}

#[repr(u8)]
#[derive(Copy, Clone)]
enum Font {
    Font5x8 = 0x00,
}

#[repr(u8)]
#[derive(Copy, Clone)]
enum CursorMoveDir {
    Increment = 0x02,
}

#[repr(u8)]
#[derive(Copy, Clone)]
enum DisplayShift {
    Off = 0x00,
}

/// Settings of the bus the backpack is connected to.
///
/// Pins and frequency are passed through to [`Transport::configure`] once, the driver itself
/// never interprets them.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct BusConfig {
    /// Bus peripheral index.
    pub port: u8,
    /// Data line pin.
    pub sda_pin: u8,
    /// Clock line pin.
    pub scl_pin: u8,
    /// Clock frequency in Hz.
    pub frequency: u32,
}

impl Default for BusConfig {
    fn default() -> Self {
        Self {
            port: 0,
            sda_pin: 8,
            scl_pin: 9,
            frequency: 400_000,
        }
    }
}

/// Display settings, fixed once the display is initialized.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct DisplayConfig {
    pub bus: BusConfig,
    /// 7 bit address of the expander, usually 0x27 or 0x3F.
    pub address: u8,
    pub cols: u8,
    /// Number of rows, at most [`LINE_ADDRESSES`]`.len()`.
    pub rows: u8,
    /// Backlight state applied by `init`.
    pub backlight: Backlight,
}

impl Default for DisplayConfig {
    fn default() -> Self {
        Self {
            bus: BusConfig::default(),
            address: 0x27,
            cols: 16,
            rows: 2,
            backlight: Backlight::On,
        }
    }
}

impl DisplayConfig {
    /// Row count limited to the rows the line address table knows.
    pub(crate) fn row_count(&self) -> u8 {
        self.rows.clamp(1, LINE_ADDRESSES.len() as u8)
    }
}
