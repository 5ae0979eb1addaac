// PlastiWatch V2 - Haptic Motor Driver
//
// Simple GPIO-driven vibration motor, plus a gesture listener that confirms
// each recognised gesture with a pulse.

use std::sync::{Mutex, PoisonError};
use std::thread;
use std::time::Duration;

use esp_idf_hal::gpio::{AnyOutputPin, Output, PinDriver};

use plastiwatch_gestures::config::{HAPTIC_ARM_PULSE_MS, HAPTIC_WRIST_PULSE_MS};
use plastiwatch_gestures::{Channel, GestureEvent, GestureListener};

pub struct HapticDriver<'d> {
    pin: PinDriver<'d, AnyOutputPin, Output>,
}

impl<'d> HapticDriver<'d> {
    pub fn new(pin: PinDriver<'d, AnyOutputPin, Output>) -> Self {
        Self { pin }
    }

    /// Vibrate for `duration` (blocks the calling thread).
    pub fn buzz(&mut self, duration: Duration) -> anyhow::Result<()> {
        self.pin.set_high()?;
        thread::sleep(duration);
        self.pin.set_low()?;
        Ok(())
    }
}

/// Short pulse for wrist gestures, longer one for arm gestures.
pub struct HapticFeedback {
    driver: Mutex<HapticDriver<'static>>,
}

impl HapticFeedback {
    pub fn new(driver: HapticDriver<'static>) -> Self {
        Self { driver: Mutex::new(driver) }
    }
}

impl GestureListener for HapticFeedback {
    fn on_gesture(&self, event: GestureEvent) -> anyhow::Result<()> {
        let pulse_ms = match event.channel() {
            Channel::Rotation => HAPTIC_WRIST_PULSE_MS,
            Channel::Acceleration => HAPTIC_ARM_PULSE_MS,
        };
        self.driver
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .buzz(Duration::from_millis(pulse_ms))
    }
}
