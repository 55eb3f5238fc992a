// src/skeleton.rs - Joint identifiers and per-frame skeleton snapshots
use nalgebra::Vector3;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::error::{CaptureError, Result};

/// Tracked joints of a full-body skeleton stream, in sensor order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum JointType {
    HipCenter,
    Spine,
    ShoulderCenter,
    Head,
    ShoulderLeft,
    ElbowLeft,
    WristLeft,
    HandLeft,
    ShoulderRight,
    ElbowRight,
    WristRight,
    HandRight,
    HipLeft,
    KneeLeft,
    AnkleLeft,
    FootLeft,
    HipRight,
    KneeRight,
    AnkleRight,
    FootRight,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Hand {
    Left,
    Right,
}

impl Hand {
    pub const BOTH: [Hand; 2] = [Hand::Left, Hand::Right];

    pub fn joint(self) -> JointType {
        match self {
            Hand::Left => JointType::HandLeft,
            Hand::Right => JointType::HandRight,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Hand::Left => "Left",
            Hand::Right => "Right",
        }
    }
}

/// One joint position in sensor space. Z is the distance from the sensor.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct JointSample {
    pub joint: JointType,
    pub position: Vector3<f64>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Skeleton {
    joints: HashMap<JointType, Vector3<f64>>,
}

impl Skeleton {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_samples(samples: impl IntoIterator<Item = JointSample>) -> Self {
        let mut skeleton = Self::new();
        for sample in samples {
            skeleton.insert(sample);
        }
        skeleton
    }

    pub fn insert(&mut self, sample: JointSample) {
        self.joints.insert(sample.joint, sample.position);
    }

    pub fn position(&self, joint: JointType) -> Option<Vector3<f64>> {
        self.joints.get(&joint).copied()
    }

    pub fn require(&self, joint: JointType) -> Result<Vector3<f64>> {
        self.position(joint).ok_or(CaptureError::MissingJoint(joint))
    }

    pub fn len(&self) -> usize {
        self.joints.len()
    }

    pub fn is_empty(&self) -> bool {
        self.joints.is_empty()
    }
}

/// The upper-body joints the angle features are computed from.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ArmPose {
    pub shoulder_center: Vector3<f64>,
    pub shoulder_left: Vector3<f64>,
    pub elbow_left: Vector3<f64>,
    pub hand_left: Vector3<f64>,
    pub shoulder_right: Vector3<f64>,
    pub elbow_right: Vector3<f64>,
    pub hand_right: Vector3<f64>,
}

impl ArmPose {
    pub fn from_skeleton(skeleton: &Skeleton) -> Result<Self> {
        Ok(Self {
            shoulder_center: skeleton.require(JointType::ShoulderCenter)?,
            shoulder_left: skeleton.require(JointType::ShoulderLeft)?,
            elbow_left: skeleton.require(JointType::ElbowLeft)?,
            hand_left: skeleton.require(JointType::HandLeft)?,
            shoulder_right: skeleton.require(JointType::ShoulderRight)?,
            elbow_right: skeleton.require(JointType::ElbowRight)?,
            hand_right: skeleton.require(JointType::HandRight)?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_arm_pose_requires_all_arm_joints() {
        let mut skeleton = Skeleton::new();
        skeleton.insert(JointSample {
            joint: JointType::ShoulderCenter,
            position: Vector3::new(0.0, 0.5, 2.0),
        });

        match ArmPose::from_skeleton(&skeleton) {
            Err(CaptureError::MissingJoint(JointType::ShoulderLeft)) => {}
            other => panic!("expected missing ShoulderLeft, got {:?}", other),
        }
    }

    #[test]
    fn test_joint_names_deserialize() {
        let joint: JointType = serde_json::from_str("\"HandRight\"").unwrap();
        assert_eq!(joint, JointType::HandRight);
        assert_eq!(Hand::Right.joint(), JointType::HandRight);
    }
}
