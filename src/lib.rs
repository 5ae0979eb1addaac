// PlastiWatch V2 - Wrist Gesture Library
//
// Turns two independent IMU streams (angular velocity and linear
// acceleration) into four gestures: wrist in/out and arm up/down.
//
//   SampleSource -> SharedCoordinator::on_sample -> GestureCoordinator
//       (throttle, threshold, mutual exclusion, AxisDetector)
//   -> GestureEvent -> ListenerRegistry::notify_all
//
// The library is target-independent; the ESP32 firmware in `main.rs` is one
// sample source among others.

pub mod config;
pub mod coordinator;
pub mod detector;
pub mod events;
pub mod listener;
pub mod source;

pub use coordinator::{CoordinatorStats, GestureConfig, GestureCoordinator, SharedCoordinator};
pub use detector::{AxisDetector, AxisPhase, Stroke};
pub use events::{Channel, Direction, GestureEvent, Sample, SampleError};
pub use listener::{GestureListener, ListenerRegistry, SharedListener};
pub use source::{SampleSource, WristGestureDetector};
