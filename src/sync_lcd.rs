use embedded_hal::delay::DelayNs;

use ufmt_write::uWrite;

use crate::transport::Transport;
use crate::{
    Backlight, BitMode, BusConfig, Commands, CursorMoveDir, DisplayConfig, DisplayControl,
    DisplayShift, Error, Font, Lines, Mode, Pin, LINE_ADDRESSES,
};

/// API to write to the LCD.
pub struct Lcd<'a, T, D>
where
    T: Transport,
    D: DelayNs,
{
    transport: &'a mut T,
    delay: &'a mut D,
    config: DisplayConfig,
    bus_configured: bool,
    backlight_state: Backlight,
    display_ctrl: u8,
}

impl<'a, T, D> Lcd<'a, T, D>
where
    T: Transport,
    D: DelayNs,
{
    /// Create new instance with the transport, the delay instance and the default configuration
    /// of a 16x2 display at address 0x27.
    pub fn new(transport: &'a mut T, delay: &'a mut D) -> Self {
        let config = DisplayConfig::default();
        Self {
            transport,
            delay,
            backlight_state: config.backlight,
            config,
            bus_configured: false,
            display_ctrl: DisplayControl::Off as u8,
        }
    }

    /// Replace the whole configuration.
    pub fn with_config(mut self, config: DisplayConfig) -> Self {
        self.config = config;
        self.config.rows = config.row_count();
        self.backlight_state = config.backlight;
        self
    }

    /// Set I2C address, see [lcd address].
    ///
    /// [lcd address]: https://badboi.dev/rust,/microcontrollers/2020/11/09/i2c-hello-world.html
    pub fn with_address(mut self, address: u8) -> Self {
        self.config.address = address;
        self
    }

    pub fn with_cols(mut self, cols: u8) -> Self {
        self.config.cols = cols;
        self
    }

    /// Number of rows, clamped to `1..=4`.
    pub fn with_rows(mut self, rows: u8) -> Self {
        self.config.rows = rows;
        self.config.rows = self.config.row_count();
        self
    }

    pub fn with_backlight(mut self, backlight: Backlight) -> Self {
        self.config.backlight = backlight;
        self.backlight_state = backlight;
        self
    }

    pub fn with_bus(mut self, bus: BusConfig) -> Self {
        self.config.bus = bus;
        self
    }

    pub fn config(&self) -> &DisplayConfig {
        &self.config
    }

    pub fn backlight_state(&self) -> Backlight {
        self.backlight_state
    }

    /// Configures the bus and initializes the hardware.
    pub fn init(mut self) -> Result<Self, Error<T::Error>> {
        self.reinit()?;
        Ok(self)
    }

    /// Runs the initialization again. The bus is only configured on the first call.
    ///
    /// On error the display is left in whatever state the failed step produced.
    pub fn reinit(&mut self) -> Result<(), Error<T::Error>> {
        #[cfg(feature = "defmt")]
        defmt::debug!(
            "lcd init: address {=u8:#x}, {=u8}x{=u8}",
            self.config.address,
            self.config.cols,
            self.config.rows
        );

        self.backlight_state = self.config.backlight;
        if !self.bus_configured {
            self.transport
                .configure(&self.config.bus)
                .map_err(Error::Bus)?;
            self.bus_configured = true;
        }
        self.write_expander(self.backlight_state as u8)?;
        self.init_hardware()
    }

    /// HD44780 power on sequence for 4 bit operation, see the [datasheet] figure 24.
    ///
    /// [datasheet]: https://www.sparkfun.com/datasheets/LCD/HD44780.pdf
    fn init_hardware(&mut self) -> Result<(), Error<T::Error>> {
        // Initial delay to wait for init after power on.
        self.delay.delay_ms(50);

        // Init with 8 bit mode, only the upper nibble reaches the controller
        let mode_8bit = Mode::FunctionSet as u8 | BitMode::Bit8 as u8;
        self.write_nibble(mode_8bit, false)?;
        self.delay.delay_ms(5);
        self.write_nibble(mode_8bit, false)?;
        self.delay.delay_ms(1);
        self.write_nibble(mode_8bit, false)?;
        self.delay.delay_ms(1);

        // Switch to 4 bit mode
        let mode_4bit = Mode::FunctionSet as u8 | BitMode::Bit4 as u8;
        self.write_nibble(mode_4bit, false)?;
        self.delay.delay_ms(1);

        self.command(
            Mode::FunctionSet as u8 | BitMode::Bit4 as u8 | Lines::Two as u8 | Font::Font5x8 as u8,
        )?;

        self.display_ctrl = DisplayControl::Off as u8;
        self.update_display_control()?;
        self.clear()?;

        // Entry left: cursor moves right, display stays
        self.command(Mode::EntrySet as u8 | CursorMoveDir::Increment as u8 | DisplayShift::Off as u8)?;

        self.display_ctrl = DisplayControl::DisplayOn as u8;
        self.update_display_control()
    }

    fn write_expander(&mut self, value: u8) -> Result<(), Error<T::Error>> {
        let address = self.config.address;
        self.transport.write_byte(address, value).map_err(|e| {
            #[cfg(feature = "defmt")]
            defmt::warn!("lcd: write of {=u8:#x} to {=u8:#x} failed", value, address);
            Error::Bus(e)
        })
    }

    /// Expander byte for the upper nibble of `data` with the cached backlight bit.
    fn compose(&self, data: u8, register_select: bool) -> u8 {
        let rs = if register_select {
            Pin::RegisterSelect as u8
        } else {
            0
        };
        ((data & 0xf0) | self.backlight_state as u8 | rs) & !(Pin::ReadWrite as u8)
    }

    /// Presents the upper nibble of `data` and latches it with an enable pulse.
    fn write_nibble(&mut self, data: u8, register_select: bool) -> Result<(), Error<T::Error>> {
        let byte = self.compose(data, register_select);
        self.write_expander(byte | Pin::Enable as u8)?;
        self.delay.delay_us(1);
        self.write_expander(byte & !(Pin::Enable as u8))?;
        // The controller starts executing on the falling edge.
        self.delay.delay_us(50);
        Ok(())
    }

    fn send(&mut self, data: u8, register_select: bool) -> Result<(), Error<T::Error>> {
        let high_bits: u8 = data & 0xf0;
        let low_bits: u8 = (data << 4) & 0xf0;
        self.write_nibble(high_bits, register_select)?;
        self.write_nibble(low_bits, register_select)?;
        Ok(())
    }

    fn command(&mut self, data: u8) -> Result<(), Error<T::Error>> {
        self.send(data, false)
    }

    fn data(&mut self, data: u8) -> Result<(), Error<T::Error>> {
        self.send(data, true)
    }

    /// Switch the backlight. The new state is written right away and kept for every following
    /// write.
    pub fn set_backlight(&mut self, backlight: impl Into<Backlight>) -> Result<(), Error<T::Error>> {
        self.backlight_state = backlight.into();

        #[cfg(feature = "defmt")]
        defmt::debug!("lcd: backlight {}", self.backlight_state);

        self.write_expander(self.backlight_state as u8)
    }

    /// Write string to display, starting at the current cursor position.
    ///
    /// Stops at the first NUL byte. There is no wrapping, characters past the end of a row land
    /// wherever the controller's address counter points next. Passing `None` fails with
    /// [`Error::InvalidArgument`].
    pub fn print<'s>(&mut self, text: impl Into<Option<&'s str>>) -> Result<(), Error<T::Error>> {
        let text = text.into().ok_or(Error::InvalidArgument)?;
        for c in text.bytes().take_while(|&c| c != 0) {
            self.data(c)?;
        }
        Ok(())
    }

    /// Clear the display and print `text` from the upper left corner.
    pub fn display_text<'s>(
        &mut self,
        text: impl Into<Option<&'s str>>,
    ) -> Result<(), Error<T::Error>> {
        self.clear()?;
        self.set_cursor(0, 0)?;
        self.print(text)
    }

    /// Clear the display
    pub fn clear(&mut self) -> Result<(), Error<T::Error>> {
        self.command(Commands::Clear as u8)?;
        self.delay.delay_ms(2);
        Ok(())
    }

    /// Return cursor to upper left corner, i.e. (0,0).
    pub fn return_home(&mut self) -> Result<(), Error<T::Error>> {
        self.command(Commands::ReturnHome as u8)?;
        self.delay.delay_ms(2);
        Ok(())
    }

    /// Set the cursor to (col, row). Coordinates are zero-based.
    ///
    /// A row past the last one selects the last row, a column past the last one selects column
    /// 0. Neither is an error.
    pub fn set_cursor(&mut self, col: u8, row: u8) -> Result<(), Error<T::Error>> {
        let rows = self.config.row_count();
        let row = if row >= rows { rows - 1 } else { row };
        let col = if col < self.config.cols { col } else { 0 };
        let address = col.wrapping_add(LINE_ADDRESSES[row as usize]);
        self.command(Mode::DDRAMAddr as u8 | address)
    }

    /// Recomputes display_ctrl and updates the lcd
    fn update_display_control(&mut self) -> Result<(), Error<T::Error>> {
        self.command(Mode::DisplayControl as u8 | self.display_ctrl)
    }

    fn set_display_flag(&mut self, flag: DisplayControl, on: bool) -> Result<(), Error<T::Error>> {
        if on {
            self.display_ctrl |= flag as u8;
        } else {
            self.display_ctrl &= !(flag as u8);
        }
        self.update_display_control()
    }

    /// Turn the display on or off, DDRAM content is kept.
    pub fn display_on(&mut self, on: bool) -> Result<(), Error<T::Error>> {
        self.set_display_flag(DisplayControl::DisplayOn, on)
    }

    // Set the curser visibility
    pub fn cursor_on(&mut self, on: bool) -> Result<(), Error<T::Error>> {
        self.set_display_flag(DisplayControl::CursorOn, on)
    }

    // Set if the cursor is blinking
    pub fn cursor_blink(&mut self, blink: bool) -> Result<(), Error<T::Error>> {
        self.set_display_flag(DisplayControl::CursorBlink, blink)
    }

    /// Scrolls the display one char to the left
    pub fn scroll_display_left(&mut self) -> Result<(), Error<T::Error>> {
        self.command(Commands::ShiftDisplayLeft as u8)
    }

    /// Scrolls the display one char to the right
    pub fn scroll_display_right(&mut self) -> Result<(), Error<T::Error>> {
        self.command(Commands::ShiftDisplayRight as u8)
    }
}

impl<'a, T, D> uWrite for Lcd<'a, T, D>
where
    T: Transport,
    D: DelayNs,
{
    type Error = Error<T::Error>;

    fn write_str(&mut self, s: &str) -> Result<(), Self::Error> {
        self.print(s)
    }
}

impl<'a, T, D> core::fmt::Write for Lcd<'a, T, D>
where
    T: Transport,
    D: DelayNs,
{
    fn write_str(&mut self, s: &str) -> core::fmt::Result {
        self.print(s).map_err(|_| core::fmt::Error)
    }
}
