// src/stability.rs - Detects when a joint has settled into a resting position
use nalgebra::Vector3;
use std::collections::{HashMap, VecDeque};
use tracing::trace;

use crate::config::StabilityConfig;
use crate::error::{CaptureError, Result};
use crate::skeleton::JointType;

pub struct StabilityDetector {
    positions: HashMap<JointType, VecDeque<Vector3<f64>>>,
    window_size: usize,
    threshold: f64,
}

impl StabilityDetector {
    pub fn new(config: &StabilityConfig) -> Self {
        Self {
            positions: HashMap::new(),
            window_size: config.window_size.max(1),
            threshold: config.threshold,
        }
    }

    pub fn window_size(&self) -> usize {
        self.window_size
    }

    pub fn threshold(&self) -> f64 {
        self.threshold
    }

    pub fn set_threshold(&mut self, threshold: f64) {
        self.threshold = threshold;
    }

    pub fn add(&mut self, position: Vector3<f64>, joint: JointType) {
        let capacity = self.window_size + 1;
        let history = self
            .positions
            .entry(joint)
            .or_insert_with(|| VecDeque::with_capacity(capacity));

        history.push_back(position);
        if history.len() > self.window_size {
            history.pop_front();
        }
    }

    /// A joint is stable once its window is full and every position except
    /// the two most recent lies within `threshold` of the newest one.
    pub fn is_stable(&self, joint: JointType) -> Result<bool> {
        let history = self
            .positions
            .get(&joint)
            .ok_or(CaptureError::UntrackedJoint(joint))?;

        if history.len() != self.window_size {
            return Ok(false);
        }

        let Some(current) = history.back() else {
            return Ok(false);
        };

        let compared = history.len().saturating_sub(2);
        for (index, position) in history.iter().take(compared).enumerate() {
            let distance = (position - current).norm();
            if distance > self.threshold {
                trace!(?joint, index, distance, "joint still moving");
                return Ok(false);
            }
        }

        Ok(true)
    }

    pub fn reset(&mut self) {
        self.positions.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn detector(window_size: usize, threshold: f64) -> StabilityDetector {
        StabilityDetector::new(&StabilityConfig {
            window_size,
            threshold,
        })
    }

    #[test]
    fn test_untracked_joint_is_an_error() {
        let detector = detector(20, 0.05);
        assert!(matches!(
            detector.is_stable(JointType::HandLeft),
            Err(CaptureError::UntrackedJoint(JointType::HandLeft))
        ));
    }

    #[test]
    fn test_partial_window_is_never_stable() {
        for threshold in [0.0, 0.05, 10.0, f64::MAX] {
            let mut detector = detector(20, threshold);
            for _ in 0..19 {
                detector.add(Vector3::new(0.1, 0.2, 1.5), JointType::HandRight);
                assert!(!detector.is_stable(JointType::HandRight).unwrap());
            }
        }
    }

    #[test]
    fn test_full_window_of_identical_positions_is_stable() {
        let mut detector = detector(20, 0.0);
        for _ in 0..20 {
            detector.add(Vector3::new(0.1, 0.2, 1.5), JointType::HandRight);
        }
        assert!(detector.is_stable(JointType::HandRight).unwrap());
    }

    #[test]
    fn test_movement_inside_window_is_unstable() {
        let mut detector = detector(5, 0.05);
        detector.add(Vector3::new(0.5, 0.0, 1.5), JointType::HandLeft);
        for _ in 0..4 {
            detector.add(Vector3::new(0.0, 0.0, 1.5), JointType::HandLeft);
        }
        assert!(!detector.is_stable(JointType::HandLeft).unwrap());

        // once the outlier is evicted the window settles
        detector.add(Vector3::new(0.0, 0.0, 1.5), JointType::HandLeft);
        assert!(detector.is_stable(JointType::HandLeft).unwrap());
    }

    #[test]
    fn test_two_newest_positions_are_not_compared() {
        let mut detector = detector(5, 0.05);
        for _ in 0..3 {
            detector.add(Vector3::new(0.0, 0.0, 1.5), JointType::HandLeft);
        }
        // the second newest slot jumps far away but is skipped by the scan
        detector.add(Vector3::new(1.0, 1.0, 1.0), JointType::HandLeft);
        detector.add(Vector3::new(0.0, 0.0, 1.5), JointType::HandLeft);
        assert!(detector.is_stable(JointType::HandLeft).unwrap());
    }

    #[test]
    fn test_joints_are_tracked_independently() {
        let mut detector = detector(3, 0.05);
        for _ in 0..3 {
            detector.add(Vector3::zeros(), JointType::HandLeft);
        }
        detector.add(Vector3::zeros(), JointType::HandRight);
        assert!(detector.is_stable(JointType::HandLeft).unwrap());
        assert!(!detector.is_stable(JointType::HandRight).unwrap());
    }
}
