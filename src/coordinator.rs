// PlastiWatch V2 - Gesture Coordinator
//
// Single entry point for raw samples. Owns the wrist (rotation) and arm
// (acceleration) detectors and applies the cross-axis rules:
//
//   1. drop everything for THROTTLE_WINDOW_NS after a gesture completes,
//   2. ignore readings below the channel threshold,
//   3. never let both axes have a stroke in flight at once.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use crate::config::*;
use crate::detector::{AxisDetector, Stroke};
use crate::events::{Channel, Direction, GestureEvent, Sample};
use crate::listener::{ListenerRegistry, SharedListener};

// ---------------------------------------------------------------------------
// Configuration
// ---------------------------------------------------------------------------

/// Tuning for the coordinator. Defaults match the sensor units of the
/// sample source (rad/s for rotation, m/s² for linear acceleration).
#[derive(Debug, Clone, PartialEq)]
pub struct GestureConfig {
    /// Axis index read from rotation samples.
    pub rotation_axis: usize,
    /// Axis index read from acceleration samples.
    pub acceleration_axis: usize,
    /// Rotation readings must exceed this magnitude.
    pub rotation_threshold: f32,
    /// Acceleration readings must exceed this magnitude.
    pub acceleration_threshold: f32,
    /// Quiet period after each gesture, in nanoseconds.
    pub throttle_window_ns: u64,
}

impl Default for GestureConfig {
    fn default() -> Self {
        Self {
            rotation_axis: ROTATION_AXIS,
            acceleration_axis: ACCELERATION_AXIS,
            rotation_threshold: ROTATION_THRESHOLD,
            acceleration_threshold: ACCELERATION_THRESHOLD,
            throttle_window_ns: THROTTLE_WINDOW_NS,
        }
    }
}

impl GestureConfig {
    fn axis(&self, channel: Channel) -> usize {
        match channel {
            Channel::Rotation => self.rotation_axis,
            Channel::Acceleration => self.acceleration_axis,
        }
    }

    fn threshold(&self, channel: Channel) -> f32 {
        match channel {
            Channel::Rotation => self.rotation_threshold,
            Channel::Acceleration => self.acceleration_threshold,
        }
    }
}

/// Running counters of what happened to incoming samples.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CoordinatorStats {
    pub samples: u64,
    pub unavailable: u64,
    pub malformed: u64,
    pub throttled: u64,
    pub insignificant: u64,
    pub blocked: u64,
    pub gestures: u64,
}

// ---------------------------------------------------------------------------
// Coordinator
// ---------------------------------------------------------------------------

/// Gesture state machine for both channels. Not synchronized; wrap it in a
/// [`SharedCoordinator`] when samples arrive on more than one thread.
#[derive(Debug)]
pub struct GestureCoordinator {
    config: GestureConfig,
    wrist: AxisDetector,
    arm: AxisDetector,
    rotation_available: bool,
    acceleration_available: bool,
    last_gesture_ns: Option<u64>,
    stats: CoordinatorStats,
}

impl Default for GestureCoordinator {
    fn default() -> Self {
        Self::new(GestureConfig::default())
    }
}

impl GestureCoordinator {
    /// Coordinator with both channels available.
    pub fn new(config: GestureConfig) -> Self {
        Self {
            config,
            wrist: AxisDetector::new(),
            arm: AxisDetector::new(),
            rotation_available: true,
            acceleration_available: true,
            last_gesture_ns: None,
            stats: CoordinatorStats::default(),
        }
    }

    /// Mark a channel as present or missing on this device. Samples from a
    /// missing channel are ignored.
    pub fn set_available(&mut self, channel: Channel, available: bool) {
        match channel {
            Channel::Rotation => self.rotation_available = available,
            Channel::Acceleration => self.acceleration_available = available,
        }
    }

    pub fn is_available(&self, channel: Channel) -> bool {
        match channel {
            Channel::Rotation => self.rotation_available,
            Channel::Acceleration => self.acceleration_available,
        }
    }

    pub fn config(&self) -> &GestureConfig {
        &self.config
    }

    pub fn stats(&self) -> CoordinatorStats {
        self.stats
    }

    /// Timestamp of the most recent gesture, if any fired yet.
    pub fn last_gesture_ns(&self) -> Option<u64> {
        self.last_gesture_ns
    }

    pub fn detector(&self, channel: Channel) -> &AxisDetector {
        match channel {
            Channel::Rotation => &self.wrist,
            Channel::Acceleration => &self.arm,
        }
    }

    fn detector_mut(&mut self, channel: Channel) -> &mut AxisDetector {
        match channel {
            Channel::Rotation => &mut self.wrist,
            Channel::Acceleration => &mut self.arm,
        }
    }

    /// Abandon strokes in flight on both axes. The throttle clock is kept.
    pub fn reset(&mut self) {
        self.wrist.reset();
        self.arm.reset();
    }

    /// Feed an untrusted reading. Wrong-length or non-finite samples are
    /// logged, counted and dropped.
    pub fn on_raw_sample(
        &mut self,
        channel: Channel,
        timestamp_ns: u64,
        values: &[f32],
    ) -> Option<GestureEvent> {
        match Sample::from_slice(channel, timestamp_ns, values) {
            Ok(sample) => self.on_sample(sample.channel, sample.timestamp_ns, sample.values),
            Err(e) => {
                self.stats.samples += 1;
                self.stats.malformed += 1;
                log::warn!("Dropping malformed {} sample at {}ns: {}", channel, timestamp_ns, e);
                None
            }
        }
    }

    /// Feed one reading; returns the gesture it completes, if any.
    pub fn on_sample(
        &mut self,
        channel: Channel,
        timestamp_ns: u64,
        values: [f32; SAMPLE_AXES],
    ) -> Option<GestureEvent> {
        self.stats.samples += 1;

        if !self.is_available(channel) {
            self.stats.unavailable += 1;
            return None;
        }

        if self.is_throttled(timestamp_ns) {
            self.stats.throttled += 1;
            return None;
        }

        let Some(&value) = values.get(self.config.axis(channel)) else {
            log::warn!("{} axis index {} is out of range", channel, self.config.axis(channel));
            self.stats.insignificant += 1;
            return None;
        };
        if value.abs() <= self.config.threshold(channel) {
            self.stats.insignificant += 1;
            return None;
        }

        let level = match channel {
            Channel::Rotation => log::Level::Debug,
            Channel::Acceleration => log::Level::Info,
        };
        log::log!(
            level,
            "{} sample at {}ns: ({:.3}, {:.3}, {:.3})",
            channel, timestamp_ns, values[AXIS_X], values[AXIS_Y], values[AXIS_Z]
        );

        if self.detector(channel.other()).is_armed() {
            self.stats.blocked += 1;
            log::warn!("Dropping {} sample - {} gesture in progress", channel, channel.other());
            return None;
        }

        let stroke = self.detector_mut(channel).evaluate(value)?;
        let event = classify(channel, &stroke);

        self.last_gesture_ns = Some(timestamp_ns);
        self.stats.gestures += 1;
        log::info!("Gesture {} at {}ns (start {:.2}, finish {:.2})", event, timestamp_ns, stroke.start, stroke.finish);

        Some(event)
    }

    fn is_throttled(&self, timestamp_ns: u64) -> bool {
        // Out-of-order timestamps saturate to zero and stay inside the window.
        self.last_gesture_ns
            .map(|last| timestamp_ns.saturating_sub(last) < self.config.throttle_window_ns)
            .unwrap_or(false)
    }
}

/// Map a completed stroke to a gesture.
///
/// Arm strokes that finish non-negative still count as `ArmDown` when they
/// started negative; wrist strokes only look at the sum.
fn classify(channel: Channel, stroke: &Stroke) -> GestureEvent {
    match (channel, stroke.direction) {
        (Channel::Rotation, Direction::Positive) => GestureEvent::WristIn,
        (Channel::Rotation, Direction::Negative) => GestureEvent::WristOut,
        (Channel::Acceleration, Direction::Positive) if stroke.start >= 0.0 => GestureEvent::ArmUp,
        (Channel::Acceleration, _) => GestureEvent::ArmDown,
    }
}

// ---------------------------------------------------------------------------
// Thread-safe front end
// ---------------------------------------------------------------------------

/// Clonable handle that serializes samples from any number of sensor
/// callback threads and fans gestures out to the registered listeners.
#[derive(Clone, Default)]
pub struct SharedCoordinator {
    coordinator: Arc<Mutex<GestureCoordinator>>,
    listeners: Arc<ListenerRegistry>,
}

impl SharedCoordinator {
    pub fn new(coordinator: GestureCoordinator) -> Self {
        Self {
            coordinator: Arc::new(Mutex::new(coordinator)),
            listeners: Arc::new(ListenerRegistry::new()),
        }
    }

    /// Lock the coordinator state. The state is plain scalars, so a poisoned
    /// lock is still consistent and is recovered.
    pub fn lock(&self) -> MutexGuard<'_, GestureCoordinator> {
        self.coordinator.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn listeners(&self) -> &ListenerRegistry {
        &self.listeners
    }

    pub fn add_listener(&self, listener: SharedListener) -> bool {
        self.listeners.add(listener)
    }

    pub fn remove_listener(&self, listener: &SharedListener) -> bool {
        self.listeners.remove(listener)
    }

    pub fn clear_listeners(&self) {
        self.listeners.clear()
    }

    /// Feed one reading and notify listeners if it completes a gesture.
    /// Listeners run after the coordinator lock is released.
    pub fn on_sample(
        &self,
        channel: Channel,
        timestamp_ns: u64,
        values: [f32; SAMPLE_AXES],
    ) -> Option<GestureEvent> {
        let event = self.lock().on_sample(channel, timestamp_ns, values)?;
        self.listeners.notify_all(event);
        Some(event)
    }

    /// Like [`SharedCoordinator::on_sample`] for untrusted slices.
    pub fn on_raw_sample(
        &self,
        channel: Channel,
        timestamp_ns: u64,
        values: &[f32],
    ) -> Option<GestureEvent> {
        let event = self.lock().on_raw_sample(channel, timestamp_ns, values)?;
        self.listeners.notify_all(event);
        Some(event)
    }

    pub fn reset(&self) {
        self.lock().reset();
    }

    pub fn stats(&self) -> CoordinatorStats {
        self.lock().stats()
    }
}
