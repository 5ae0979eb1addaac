// PlastiWatch V2 - Gesture Events & Sample Types

use std::fmt;

use crate::config::SAMPLE_AXES;

// ---------------------------------------------------------------------------
// Sensor Channels
// ---------------------------------------------------------------------------
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Channel {
    /// Angular velocity (gyroscope). Drives wrist gestures.
    Rotation,
    /// Linear acceleration, gravity removed. Drives arm gestures.
    Acceleration,
}

impl Channel {
    pub const ALL: [Channel; 2] = [Channel::Rotation, Channel::Acceleration];

    /// The channel whose in-flight gesture blocks this one.
    pub fn other(self) -> Self {
        match self {
            Self::Rotation => Self::Acceleration,
            Self::Acceleration => Self::Rotation,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Rotation => "rotation",
            Self::Acceleration => "acceleration",
        }
    }
}

impl fmt::Display for Channel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// Gesture Classification
// ---------------------------------------------------------------------------
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Positive,
    Negative,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum GestureEvent {
    /// Wrist rolled inwards (scroll up).
    WristIn,
    /// Wrist rolled outwards (scroll down).
    WristOut,
    /// Arm raised (back).
    ArmUp,
    /// Arm lowered (tap).
    ArmDown,
}

impl GestureEvent {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::WristIn => "wrist-in",
            Self::WristOut => "wrist-out",
            Self::ArmUp => "arm-up",
            Self::ArmDown => "arm-down",
        }
    }

    /// Channel that produces this gesture.
    pub fn channel(&self) -> Channel {
        match self {
            Self::WristIn | Self::WristOut => Channel::Rotation,
            Self::ArmUp | Self::ArmDown => Channel::Acceleration,
        }
    }
}

impl fmt::Display for GestureEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// Samples
// ---------------------------------------------------------------------------

/// Why a raw sample was refused at the ingestion boundary.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum SampleError {
    #[error("expected 3 axis values, got {len}")]
    WrongLength { len: usize },
    #[error("axis {axis} is not a finite number")]
    NonFinite { axis: usize },
}

/// A validated 3-axis reading from one channel.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Sample {
    pub channel: Channel,
    /// Monotonic timestamp in nanoseconds.
    pub timestamp_ns: u64,
    pub values: [f32; SAMPLE_AXES],
}

impl Sample {
    pub fn new(channel: Channel, timestamp_ns: u64, values: [f32; SAMPLE_AXES]) -> Self {
        Self { channel, timestamp_ns, values }
    }

    /// Build a sample from an untrusted slice, rejecting wrong lengths and
    /// NaN/infinite components.
    pub fn from_slice(
        channel: Channel,
        timestamp_ns: u64,
        values: &[f32],
    ) -> Result<Self, SampleError> {
        let values: [f32; SAMPLE_AXES] = values
            .try_into()
            .map_err(|_| SampleError::WrongLength { len: values.len() })?;

        if let Some(axis) = values.iter().position(|v| !v.is_finite()) {
            return Err(SampleError::NonFinite { axis });
        }

        Ok(Self::new(channel, timestamp_ns, values))
    }
}
