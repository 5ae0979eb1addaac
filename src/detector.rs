// PlastiWatch V2 - Axis Detector
//
// Two-phase threshold detector for a single axis. The first significant
// reading arms the detector, the next one completes the stroke and yields its
// direction from the sign of the two readings' sum.

use crate::events::Direction;

/// Capture phase of an [`AxisDetector`].
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub enum AxisPhase {
    #[default]
    Idle,
    /// Waiting for the finishing reading; `start` is the arming value.
    Armed { start: f32 },
}

/// A completed start/finish pair.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Stroke {
    pub start: f32,
    pub finish: f32,
    pub direction: Direction,
}

impl Stroke {
    pub fn sum(&self) -> f32 {
        self.start + self.finish
    }
}

#[derive(Debug, Clone, Default)]
pub struct AxisDetector {
    phase: AxisPhase,
}

impl AxisDetector {
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed one significant reading.
    ///
    /// Returns `None` when the reading starts a stroke and `Some` when it
    /// finishes one. A zero sum resolves to [`Direction::Positive`].
    pub fn evaluate(&mut self, value: f32) -> Option<Stroke> {
        match self.phase {
            AxisPhase::Idle => {
                self.phase = AxisPhase::Armed { start: value };
                None
            }
            AxisPhase::Armed { start } => {
                self.phase = AxisPhase::Idle;
                let direction = if value + start >= 0.0 {
                    Direction::Positive
                } else {
                    Direction::Negative
                };
                Some(Stroke { start, finish: value, direction })
            }
        }
    }

    pub fn is_armed(&self) -> bool {
        matches!(self.phase, AxisPhase::Armed { .. })
    }

    pub fn phase(&self) -> AxisPhase {
        self.phase
    }

    /// Abandon any stroke in flight.
    pub fn reset(&mut self) {
        self.phase = AxisPhase::Idle;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_first_reading_arms_without_result() {
        let mut detector = AxisDetector::new();
        assert_eq!(detector.evaluate(12.0), None);
        assert_eq!(detector.phase(), AxisPhase::Armed { start: 12.0 });
    }

    #[test]
    fn test_second_reading_completes_and_returns_to_idle() {
        let mut detector = AxisDetector::new();
        detector.evaluate(-12.0);
        let stroke = detector.evaluate(3.0).unwrap();
        assert_eq!(stroke.direction, Direction::Negative);
        assert_eq!(stroke.start, -12.0);
        assert_eq!(stroke.finish, 3.0);
        assert!(!detector.is_armed());
    }

    #[test]
    fn test_zero_sum_resolves_positive() {
        let mut detector = AxisDetector::new();
        detector.evaluate(11.5);
        let stroke = detector.evaluate(-11.5).unwrap();
        assert_eq!(stroke.sum(), 0.0);
        assert_eq!(stroke.direction, Direction::Positive);
    }

    #[test]
    fn test_pairs_alternate_start_and_finish() {
        let mut detector = AxisDetector::new();
        let readings = [11.0, 14.0, -20.0, 12.0, 13.0, -30.0];
        let results: Vec<bool> = readings
            .iter()
            .map(|&v| detector.evaluate(v).is_some())
            .collect();
        assert_eq!(results, vec![false, true, false, true, false, true]);
    }

    #[test]
    fn test_reset_abandons_stroke() {
        let mut detector = AxisDetector::new();
        detector.evaluate(15.0);
        detector.reset();
        assert_eq!(detector.phase(), AxisPhase::Idle);
        assert_eq!(detector.evaluate(-15.0), None);
    }
}
