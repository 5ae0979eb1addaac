// PlastiWatch V2 - Sensor Task
//
// MPU6050-backed sample source. One thread polls the IMU at ~62.5 Hz and
// feeds the enabled channels into the gesture coordinator:
//   gyroscope            -> Channel::Rotation
//   accel minus gravity  -> Channel::Acceleration

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use plastiwatch_gestures::config::*;
use plastiwatch_gestures::{Channel, SampleSource, SharedCoordinator};

use crate::drivers::imu::{GravityFilter, Mpu6050, SharedBus};

/// Nanoseconds since boot (monotonic).
pub fn now_ns() -> u64 {
    let us = unsafe { esp_idf_sys::esp_timer_get_time() };
    us.max(0) as u64 * 1000
}

#[derive(Default)]
struct Enabled {
    rotation: AtomicBool,
    acceleration: AtomicBool,
}

impl Enabled {
    fn flag(&self, channel: Channel) -> &AtomicBool {
        match channel {
            Channel::Rotation => &self.rotation,
            Channel::Acceleration => &self.acceleration,
        }
    }
}

pub struct ImuSampleSource {
    bus: SharedBus,
    connected: bool,
    enabled: Arc<Enabled>,
    worker: Option<JoinHandle<()>>,
}

impl ImuSampleSource {
    /// Probe and configure the IMU. A missing or failing sensor leaves both
    /// channels unavailable rather than failing boot.
    pub fn new(bus: SharedBus) -> Self {
        let imu = Mpu6050::new(bus);
        let connected = imu.is_connected()
            && match imu.init() {
                Ok(()) => true,
                Err(e) => {
                    log::error!("MPU6050 init failed: {}", e);
                    false
                }
            };

        Self {
            bus,
            connected,
            enabled: Arc::new(Enabled::default()),
            worker: None,
        }
    }

    fn spawn_worker(&mut self, sink: SharedCoordinator) -> anyhow::Result<()> {
        let bus = self.bus;
        let enabled = Arc::clone(&self.enabled);
        let handle = thread::Builder::new()
            .name("sensor".into())
            .stack_size(STACK_SENSOR)
            .spawn(move || sensor_task(bus, enabled, sink))?;
        self.worker = Some(handle);
        Ok(())
    }
}

impl SampleSource for ImuSampleSource {
    fn is_available(&self, _channel: Channel) -> bool {
        // Both channels come from the same MPU6050.
        self.connected
    }

    fn start(&mut self, channel: Channel, sink: SharedCoordinator) -> anyhow::Result<()> {
        if !self.connected {
            anyhow::bail!("MPU6050 not connected, cannot start {} samples", channel);
        }
        self.enabled.flag(channel).store(true, Ordering::SeqCst);
        if self.worker.is_none() {
            self.spawn_worker(sink)?;
        }
        Ok(())
    }

    fn stop(&mut self, channel: Channel) -> anyhow::Result<()> {
        // The worker keeps running and simply skips disabled channels.
        self.enabled.flag(channel).store(false, Ordering::SeqCst);
        Ok(())
    }
}

fn sensor_task(bus: SharedBus, enabled: Arc<Enabled>, sink: SharedCoordinator) {
    log::info!("Sensor task started");

    let imu = Mpu6050::new(bus);
    let mut gravity = GravityFilter::default();
    let interval = Duration::from_millis(SENSOR_SAMPLE_INTERVAL_MS);

    loop {
        let tick_start = Instant::now();

        match imu.read_motion() {
            Ok(reading) => {
                let timestamp_ns = now_ns();
                // Keep the gravity estimate warm even while arm detection is off.
                let linear = gravity.linear(reading.accel);

                if enabled.rotation.load(Ordering::Relaxed) {
                    sink.on_sample(Channel::Rotation, timestamp_ns, reading.gyro);
                }
                if enabled.acceleration.load(Ordering::Relaxed) {
                    sink.on_sample(Channel::Acceleration, timestamp_ns, linear);
                }
            }
            Err(e) => {
                log::warn!("IMU read error: {}", e);
            }
        }

        // Sleep for the remainder of the sampling interval to maintain ~62.5 Hz.
        let elapsed = tick_start.elapsed();
        if elapsed < interval {
            thread::sleep(interval - elapsed);
        }
    }
}
