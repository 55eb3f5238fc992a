// src/features.rs - Planar orientation angles between joint pairs
use nalgebra::Vector3;

use crate::skeleton::ArmPose;

/// Orientation of the segment from `upper` to `lower`, in degrees.
///
/// `yx` is measured in the Y-X plane and `zx` in the Z-X plane. Values are
/// whatever `atan2` yields, so they lie in (-180, 180].
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct AngleFeature {
    pub yx: f64,
    pub zx: f64,
}

impl AngleFeature {
    pub fn between(lower: &Vector3<f64>, upper: &Vector3<f64>) -> Self {
        let diff = lower - upper;
        Self {
            yx: planar_degrees(diff.y, diff.x),
            zx: planar_degrees(diff.z, diff.x),
        }
    }
}

// Coincident points give a zero angle rather than a signed-zero artifact.
fn planar_degrees(opposite: f64, adjacent: f64) -> f64 {
    if opposite == 0.0 && adjacent == 0.0 {
        return 0.0;
    }
    opposite.atan2(adjacent).to_degrees()
}

/// Number of numeric series each feature table holds.
pub const SERIES_PER_TABLE: usize = 8;

/// The eight joint-pair angles extracted from one frame.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ArmFeatures {
    /// shoulder->elbow and elbow->hand, left side then right side.
    pub limb: [AngleFeature; 4],
    /// shoulder center->elbow and shoulder center->hand, left then right.
    pub head: [AngleFeature; 4],
}

impl ArmFeatures {
    pub fn from_pose(pose: &ArmPose) -> Self {
        Self {
            limb: [
                AngleFeature::between(&pose.elbow_left, &pose.shoulder_left),
                AngleFeature::between(&pose.hand_left, &pose.elbow_left),
                AngleFeature::between(&pose.elbow_right, &pose.shoulder_right),
                AngleFeature::between(&pose.hand_right, &pose.elbow_right),
            ],
            head: [
                AngleFeature::between(&pose.elbow_left, &pose.shoulder_center),
                AngleFeature::between(&pose.hand_left, &pose.shoulder_center),
                AngleFeature::between(&pose.elbow_right, &pose.shoulder_center),
                AngleFeature::between(&pose.hand_right, &pose.shoulder_center),
            ],
        }
    }

    /// Limb angles flattened in table row order (YX then ZX per pair).
    pub fn limb_row_values(&self) -> [f64; SERIES_PER_TABLE] {
        flatten(&self.limb)
    }

    pub fn head_row_values(&self) -> [f64; SERIES_PER_TABLE] {
        flatten(&self.head)
    }
}

fn flatten(pairs: &[AngleFeature; 4]) -> [f64; SERIES_PER_TABLE] {
    let mut values = [0.0; SERIES_PER_TABLE];
    for (i, pair) in pairs.iter().enumerate() {
        values[i * 2] = pair.yx;
        values[i * 2 + 1] = pair.zx;
    }
    values
}
