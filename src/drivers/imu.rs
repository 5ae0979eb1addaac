// PlastiWatch V2 - MPU6050 IMU Driver
//
// Register-level driver over the shared I2C bus. Readings are converted to
// the units the gesture thresholds expect: rad/s for the gyroscope and m/s²
// for the accelerometer.

use std::sync::{Mutex, MutexGuard, PoisonError};

use esp_idf_hal::i2c::I2cDriver;

use plastiwatch_gestures::config::*;

/// Thread-safe handle to a shared I2C bus.
pub type SharedBus = &'static Mutex<I2cDriver<'static>>;

// MPU6050 register addresses
const REG_PWR_MGMT_1: u8 = 0x6B;
const REG_CONFIG: u8 = 0x1A;
const REG_GYRO_CONFIG: u8 = 0x1B;
const REG_ACCEL_CONFIG: u8 = 0x1C;
const REG_ACCEL_XOUT_H: u8 = 0x3B; // Start of 14-byte sensor burst
const REG_WHO_AM_I: u8 = 0x75;
const WHO_AM_I_EXPECTED: u8 = 0x68;

/// One burst read: raw acceleration (gravity included) and angular velocity.
#[derive(Debug, Clone, Copy, Default)]
pub struct MotionReading {
    /// m/s²
    pub accel: [f32; 3],
    /// rad/s
    pub gyro: [f32; 3],
}

pub struct Mpu6050 {
    bus: SharedBus,
}

impl Mpu6050 {
    pub fn new(bus: SharedBus) -> Self {
        Self { bus }
    }

    fn bus(&self) -> MutexGuard<'_, I2cDriver<'static>> {
        self.bus.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Verify the device is reachable on the I2C bus.
    pub fn is_connected(&self) -> bool {
        let mut buf = [0u8; 1];
        match self.bus().write_read(I2C_ADDR_MPU6050, &[REG_WHO_AM_I], &mut buf, I2C_TIMEOUT_TICKS) {
            Ok(()) => buf[0] == WHO_AM_I_EXPECTED,
            Err(_) => false,
        }
    }

    /// Wake the sensor and configure accel (±8 g), gyro (±2000 °/s), DLPF 21 Hz.
    ///
    /// ROTATION_THRESHOLD must stay below the gyro full scale (~34.9 rad/s).
    pub fn init(&self) -> anyhow::Result<()> {
        let mut bus = self.bus();

        // Wake up (clear SLEEP bit)
        bus.write(I2C_ADDR_MPU6050, &[REG_PWR_MGMT_1, 0x00], I2C_TIMEOUT_TICKS)?;

        // DLPF bandwidth 21 Hz
        bus.write(I2C_ADDR_MPU6050, &[REG_CONFIG, 0x04], I2C_TIMEOUT_TICKS)?;

        // Gyroscope: ±2000 °/s
        bus.write(I2C_ADDR_MPU6050, &[REG_GYRO_CONFIG, 0x18], I2C_TIMEOUT_TICKS)?;

        // Accelerometer: ±8 g
        bus.write(I2C_ADDR_MPU6050, &[REG_ACCEL_CONFIG, 0x10], I2C_TIMEOUT_TICKS)?;

        log::info!("MPU6050 initialised (±8g, ±2000°/s, DLPF 21Hz)");
        Ok(())
    }

    /// Burst-read all 6 axes and convert to SI units.
    pub fn read_motion(&self) -> anyhow::Result<MotionReading> {
        let mut raw = [0u8; 14];
        self.bus().write_read(
            I2C_ADDR_MPU6050,
            &[REG_ACCEL_XOUT_H],
            &mut raw,
            I2C_TIMEOUT_TICKS,
        )?;

        let word = |i: usize| i16::from_be_bytes([raw[i], raw[i + 1]]) as f32;
        let accel = |i: usize| word(i) / ACCEL_SCALE_8G * STANDARD_GRAVITY;
        let gyro = |i: usize| (word(i) / GYRO_SCALE_2000).to_radians();

        Ok(MotionReading {
            accel: [accel(0), accel(2), accel(4)],
            // raw[6..8] = temperature - skipped
            gyro: [gyro(8), gyro(10), gyro(12)],
        })
    }
}

/// Separates gravity from raw acceleration with a first-order low-pass, as
/// linear-acceleration sensors do on phones.
#[derive(Debug, Clone, Default)]
pub struct GravityFilter {
    gravity: Option<[f32; 3]>,
}

impl GravityFilter {
    /// Returns `raw` minus the current gravity estimate.
    pub fn linear(&mut self, raw: [f32; 3]) -> [f32; 3] {
        let gravity = match self.gravity {
            // First reading seeds the estimate so we don't start with a 1 g spike.
            None => raw,
            Some(g) => std::array::from_fn(|i| {
                GRAVITY_FILTER_ALPHA * g[i] + (1.0 - GRAVITY_FILTER_ALPHA) * raw[i]
            }),
        };
        self.gravity = Some(gravity);
        std::array::from_fn(|i| raw[i] - gravity[i])
    }
}
