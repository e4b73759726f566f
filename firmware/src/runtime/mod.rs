use cortex_m::interrupt;
use cortex_m::register::primask;
use critical_section::{self, RawRestoreState};
use defmt::Display2Format;
use defmt_rtt as _;
use embassy_executor::Spawner;
use embassy_stm32 as hal;
use embassy_stm32::gpio::{Level, Output, Speed};
use embassy_stm32::i2c::{self, I2c};
use embassy_stm32::time::Hertz;
use embassy_stm32::wdg::IndependentWatchdog;
use embassy_time::Timer;
use embedded_hal::digital::PinState;
use ssd1306::prelude::*;
use ssd1306::{I2CDisplayInterface, Ssd1306};
use static_cell::StaticCell;
use switch_core::config::{ControllerConfig, DEFAULT_INTERVALS_MIN};
use switch_core::controller::{ControllerParts, IntervalSelector, StatusBoard, SwitchController};
use switch_core::countdown::CountdownSwitch;
use switch_core::indicator::IndicatorLight;
use switch_core::level::ActiveLevel;
use switch_core::telemetry::{TelemetryEvent, TelemetryRecord};

use crate::graphics::OledCanvas;
use crate::hw::{EmbassyClock, I2C_FREQUENCY_HZ, IwdgWatchdog, WATCHDOG_TIMEOUT_US};

/// Pause between two passes of the update loop.
const POLL_INTERVAL_MS: u64 = 10;

critical_section::set_impl!(InterruptCriticalSection);

struct InterruptCriticalSection;

unsafe impl critical_section::Impl for InterruptCriticalSection {
    unsafe fn acquire() -> RawRestoreState {
        let primask = primask::read();
        interrupt::disable();
        primask.is_active()
    }

    unsafe fn release(restore_state: RawRestoreState) {
        if restore_state {
            unsafe {
                interrupt::enable();
            }
        }
    }
}

static STATUS_BOARD: StaticCell<StatusBoard> = StaticCell::new();

#[embassy_executor::main]
pub async fn main(_spawner: Spawner) {
    let config = hal::Config::default();
    let hal::Peripherals {
        PA4,
        PA5,
        PB8,
        PB9,
        I2C1,
        IWDG,
        ..
    } = hal::init(config);

    let clock = EmbassyClock;

    // PA4 switches the load relay (active high); PA5 sinks the status LED.
    let Ok(power) = CountdownSwitch::new(
        Output::new(PA4, Level::Low, Speed::Low),
        ActiveLevel::High,
        clock,
    );
    let Ok(indicator) = IndicatorLight::new(
        Output::new(PA5, Level::High, Speed::Low),
        ActiveLevel::Low,
        PinState::High,
        clock,
    );

    let mut i2c_config = i2c::Config::default();
    i2c_config.frequency = Hertz(I2C_FREQUENCY_HZ);
    let bus = I2c::new_blocking(I2C1, PB8, PB9, i2c_config);
    let mut oled = Ssd1306::new(
        I2CDisplayInterface::new(bus),
        DisplaySize128x32,
        DisplayRotation::Rotate0,
    )
    .into_buffered_graphics_mode();
    oled.init().expect("OLED bring-up");

    let watchdog = IwdgWatchdog::start(IndependentWatchdog::new(IWDG, WATCHDOG_TIMEOUT_US));

    let board = STATUS_BOARD.init(StatusBoard::new());
    let parts = ControllerParts {
        power,
        indicator,
        target: OledCanvas::new(oled),
        intervals: IntervalSelector::from_values(DEFAULT_INTERVALS_MIN),
        watchdog,
    };
    let mut controller = SwitchController::new(parts, clock, board, ControllerConfig::default());

    let config = controller.config();
    defmt::info!(
        "countdown-switch: boot, arming for {} min (refresh {} ms, overlay {} ms, warn at {} s)",
        controller.intervals().current(),
        config.display_refresh_ms,
        config.overlay_ms,
        config.warning_threshold_s
    );

    let mut last_seen = None;
    if controller.arm().is_err() {
        defmt::warn!("countdown-switch: arming reported a hardware fault");
    }

    loop {
        // Faults are recorded in telemetry and mirrored below.
        let _ = controller.run_once();

        for record in controller.telemetry().after(last_seen) {
            mirror(record);
            last_seen = Some(record.id);
        }

        Timer::after_millis(POLL_INTERVAL_MS).await;
    }
}

fn mirror(record: &TelemetryRecord) {
    if let TelemetryEvent::Fault(_) = record.event {
        defmt::warn!("telemetry: {}", Display2Format(record));
    } else {
        defmt::info!("telemetry: {}", Display2Format(record));
    }
}
