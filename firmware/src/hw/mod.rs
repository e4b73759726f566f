//! Board bindings for the core's clock, watchdog and panel traits.

use embassy_stm32::i2c::I2c;
use embassy_stm32::mode::Blocking;
use embassy_stm32::peripherals::IWDG;
use embassy_stm32::wdg::IndependentWatchdog;
use embassy_time::Instant;
use ssd1306::Ssd1306;
use ssd1306::mode::BufferedGraphicsMode;
use ssd1306::prelude::{DisplaySize128x32, I2CInterface};
use switch_core::time::{Clock, Millis, Watchdog};

use crate::graphics::{Flush, GraphicsError};

/// Independent watchdog timeout.
pub const WATCHDOG_TIMEOUT_US: u32 = 2_000_000;
/// I2C bus speed for the OLED.
pub const I2C_FREQUENCY_HZ: u32 = 400_000;

/// Buffered 128x32 SSD1306 on the blocking I2C bus.
pub type Oled = Ssd1306<
    I2CInterface<I2c<'static, Blocking>>,
    DisplaySize128x32,
    BufferedGraphicsMode<DisplaySize128x32>,
>;

impl Flush for Oled {
    fn flush(&mut self) -> Result<(), GraphicsError> {
        Ssd1306::flush(self).map_err(|_| GraphicsError::Flush)
    }
}

/// Millisecond clock on top of the embassy time driver.
#[derive(Copy, Clone, Debug, Default)]
pub struct EmbassyClock;

impl Clock for EmbassyClock {
    // Truncating the 64-bit tick count is the wrap the core expects.
    #[allow(clippy::cast_possible_truncation)]
    fn now(&self) -> Millis {
        Instant::now().as_millis() as Millis
    }
}

/// Independent watchdog, running once constructed.
pub struct IwdgWatchdog {
    inner: IndependentWatchdog<'static, IWDG>,
}

impl IwdgWatchdog {
    pub fn start(mut inner: IndependentWatchdog<'static, IWDG>) -> Self {
        inner.unleash();
        Self { inner }
    }
}

impl Watchdog for IwdgWatchdog {
    fn feed(&mut self) {
        self.inner.pet();
    }
}
