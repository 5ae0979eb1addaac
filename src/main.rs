// PlastiWatch V2 - Gesture Firmware Entry Point
//
// Boot sequence:
//   1. Bring up logging and the shared I2C bus.
//   2. Probe the MPU6050; both gesture channels depend on it.
//   3. Attach the haptic and logging listeners.
//   4. Register the sensor task and report detector statistics periodically.

mod drivers;
mod tasks;

use std::sync::{Arc, Mutex};
use std::thread;
use std::time::Duration;

use esp_idf_hal::gpio::{OutputPin, PinDriver};
use esp_idf_hal::i2c::{I2cConfig, I2cDriver};
use esp_idf_hal::prelude::*;

use plastiwatch_gestures::config::*;
use plastiwatch_gestures::{GestureEvent, WristGestureDetector};

use crate::drivers::haptic::{HapticDriver, HapticFeedback};
use crate::drivers::imu::SharedBus;
use crate::tasks::sensor::ImuSampleSource;

const STATS_INTERVAL: Duration = Duration::from_secs(60);

fn main() -> anyhow::Result<()> {
    // Link esp-idf-sys runtime patches and initialise logging.
    esp_idf_svc::sys::link_patches();
    esp_idf_svc::log::EspLogger::initialize_default();
    log::info!("PlastiWatch gesture firmware starting…");

    // ---- Peripherals ------------------------------------------------------
    let peripherals = Peripherals::take()?;

    // ---- I2C bus (MPU6050) ------------------------------------------------
    let i2c_config = I2cConfig::new().baudrate(I2C_BAUDRATE_KHZ.kHz().into());
    let i2c = I2cDriver::new(
        peripherals.i2c0,
        peripherals.pins.gpio6, // D4 - SDA
        peripherals.pins.gpio7, // D5 - SCL
        &i2c_config,
    )?;
    // The bus lives for the whole programme (firmware never exits).
    let i2c_bus: SharedBus = Box::leak(Box::new(Mutex::new(i2c)));

    // ---- Gesture detector -------------------------------------------------
    let mut detector = WristGestureDetector::new(ImuSampleSource::new(i2c_bus));
    log::info!(
        "Capabilities - wrist: {} arm: {}",
        detector.can_detect_wrist_gestures(),
        detector.can_detect_arm_gestures()
    );

    let haptic_pin = PinDriver::output(peripherals.pins.gpio4.downgrade_output())?; // D2 - haptic motor
    detector.add_listener(Arc::new(HapticFeedback::new(HapticDriver::new(haptic_pin))));
    detector.add_listener(Arc::new(|event: GestureEvent| {
        log::info!("Gesture detected: {}", event);
    }));

    if let Err(e) = detector.register() {
        // Keep running so the failure stays visible on the serial console.
        log::error!("Gesture detection disabled: {:#}", e);
    }

    // Main thread only reports statistics; detection runs in the sensor task.
    loop {
        thread::sleep(STATS_INTERVAL);
        let stats = detector.coordinator().stats();
        log::info!(
            "Samples: {} gestures: {} throttled: {} blocked: {} malformed: {} listener failures: {}",
            stats.samples,
            stats.gestures,
            stats.throttled,
            stats.blocked,
            stats.malformed,
            detector.coordinator().listeners().failures()
        );
    }
}
