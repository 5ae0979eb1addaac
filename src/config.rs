// PlastiWatch V2 - Gesture & Hardware Configuration
// Target: Seeed Studio Xiao ESP32-C3 (RISC-V)

// ---------------------------------------------------------------------------
// Gesture Detection
// ---------------------------------------------------------------------------
// Axis indices follow the sample source convention: [X, Y, Z].
pub const AXIS_X: usize = 0;
pub const AXIS_Y: usize = 1;
pub const AXIS_Z: usize = 2;

/// Axis read from the rotation (gyroscope) channel to detect wrist gestures.
pub const ROTATION_AXIS: usize = AXIS_X;
/// Axis read from the linear-acceleration channel to detect arm gestures.
pub const ACCELERATION_AXIS: usize = AXIS_Z;

/// Minimum |angular velocity| (rad/s) for a rotation sample to count.
pub const ROTATION_THRESHOLD: f32 = 10.0;
/// Minimum |linear acceleration| (m/s²) for an acceleration sample to count.
pub const ACCELERATION_THRESHOLD: f32 = 6.0;

pub const MS_TO_NS: u64 = 1_000_000;
pub const THROTTLE_WINDOW_MS: u64 = 1200;
/// Every sample is dropped for this long after a gesture completes.
pub const THROTTLE_WINDOW_NS: u64 = THROTTLE_WINDOW_MS * MS_TO_NS; // 1.2 s

pub const SAMPLE_AXES: usize = 3;

// ---------------------------------------------------------------------------
// I2C Bus
// ---------------------------------------------------------------------------
pub const I2C_ADDR_MPU6050: u8 = 0x68;
pub const I2C_BAUDRATE_KHZ: u32 = 400;
pub const I2C_TIMEOUT_TICKS: u32 = 1000; // FreeRTOS ticks

// ---------------------------------------------------------------------------
// Task Stack Sizes (bytes)
// ---------------------------------------------------------------------------
pub const STACK_SENSOR: usize = 4096;

// ---------------------------------------------------------------------------
// Timing (milliseconds)
// ---------------------------------------------------------------------------
pub const SENSOR_SAMPLE_INTERVAL_MS: u64 = 16;   // ~62.5 Hz
pub const HAPTIC_WRIST_PULSE_MS: u64 = 50;
pub const HAPTIC_ARM_PULSE_MS: u64 = 120;

// ---------------------------------------------------------------------------
// MPU6050 Sensor Scale Factors
// ---------------------------------------------------------------------------
pub const ACCEL_SCALE_8G: f32 = 4096.0;   // LSB/g  at ±8 g
pub const GYRO_SCALE_2000: f32 = 16.4;    // LSB/°/s at ±2000 °/s
pub const STANDARD_GRAVITY: f32 = 9.806_65; // m/s² per g

/// Low-pass factor for the gravity estimate subtracted from raw acceleration.
pub const GRAVITY_FILTER_ALPHA: f32 = 0.8;
