// PlastiWatch V2 - Sample Sources & Detector Front End
//
// A `SampleSource` is whatever delivers IMU readings: the MPU6050 task on the
// watch, a recorded trace, or a test script. `WristGestureDetector` ties one
// to the coordinator and exposes the host-facing API.

use crate::coordinator::{GestureConfig, GestureCoordinator, SharedCoordinator};
use crate::events::Channel;
use crate::listener::SharedListener;

/// Provider of timestamped 3-axis samples for the two motion channels.
pub trait SampleSource {
    /// Whether this device has the sensor behind `channel`.
    fn is_available(&self, channel: Channel) -> bool;

    /// Begin delivering `channel` samples into `sink`.
    fn start(&mut self, channel: Channel, sink: SharedCoordinator) -> anyhow::Result<()>;

    /// Stop delivering `channel` samples.
    fn stop(&mut self, channel: Channel) -> anyhow::Result<()>;
}

/// Detects wrist (in/out) and arm (up/down) gestures from a sample source.
///
/// Works with any subset of channels; a device without sensors simply never
/// reports a gesture.
pub struct WristGestureDetector<S: SampleSource> {
    source: S,
    coordinator: SharedCoordinator,
    registered: bool,
}

impl<S: SampleSource> WristGestureDetector<S> {
    pub fn new(source: S) -> Self {
        Self::with_config(source, GestureConfig::default())
    }

    pub fn with_config(source: S, config: GestureConfig) -> Self {
        let mut coordinator = GestureCoordinator::new(config);
        for channel in Channel::ALL {
            let available = source.is_available(channel);
            if !available {
                log::error!("{} sensor not available", channel);
            }
            coordinator.set_available(channel, available);
        }

        Self {
            source,
            coordinator: SharedCoordinator::new(coordinator),
            registered: false,
        }
    }

    /// True when the device can report arm up/down (has an accelerometer).
    pub fn can_detect_arm_gestures(&self) -> bool {
        self.source.is_available(Channel::Acceleration)
    }

    /// True when the device can report wrist in/out (has a gyroscope).
    pub fn can_detect_wrist_gestures(&self) -> bool {
        self.source.is_available(Channel::Rotation)
    }

    pub fn is_registered(&self) -> bool {
        self.registered
    }

    /// Start sample delivery on every available channel.
    ///
    /// All or nothing: if one channel fails to start, channels already started
    /// are stopped again before the error is returned.
    pub fn register(&mut self) -> anyhow::Result<()> {
        if self.registered {
            return Ok(());
        }

        let mut started = Vec::with_capacity(Channel::ALL.len());
        for channel in Channel::ALL {
            if !self.source.is_available(channel) {
                continue;
            }
            if let Err(e) = self.source.start(channel, self.coordinator.clone()) {
                for &running in &started {
                    if let Err(stop_err) = self.source.stop(running) {
                        log::error!("Failed to stop {} after aborted register: {:#}", running, stop_err);
                    }
                }
                return Err(e.context(format!("starting {} samples", channel)));
            }
            started.push(channel);
            log::debug!("{} listener registered", channel);
        }

        self.registered = true;
        Ok(())
    }

    /// Stop sample delivery and abandon any half-finished gesture, so a stale
    /// start reading cannot pair with the first reading after resuming.
    pub fn unregister(&mut self) -> anyhow::Result<()> {
        if !self.registered {
            return Ok(());
        }

        for channel in Channel::ALL {
            if self.source.is_available(channel) {
                self.source.stop(channel)?;
                log::debug!("{} listener unregistered", channel);
            }
        }

        self.coordinator.reset();
        self.registered = false;
        Ok(())
    }

    pub fn add_listener(&self, listener: SharedListener) -> bool {
        self.coordinator.add_listener(listener)
    }

    pub fn remove_listener(&self, listener: &SharedListener) -> bool {
        self.coordinator.remove_listener(listener)
    }

    pub fn clear_listeners(&self) {
        self.coordinator.clear_listeners()
    }

    /// Handle to the coordinator that the source feeds.
    pub fn coordinator(&self) -> &SharedCoordinator {
        &self.coordinator
    }

    pub fn source(&self) -> &S {
        &self.source
    }
}
