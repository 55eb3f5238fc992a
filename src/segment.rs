// src/segment.rs - Depth-based hand masks
use image::{ImageBuffer, Luma, Rgb, RgbImage};
use tracing::debug;

use crate::config::{DepthConfig, SegmentationMode};
use crate::otsu::Histogram;

/// Depth frame in millimetres; 0 means the sensor had no reading.
pub type DepthImage = ImageBuffer<Luma<u16>, Vec<u16>>;

const FOREGROUND: Rgb<u8> = Rgb([0xFF, 0xFF, 0xFF]);
const BACKGROUND: Rgb<u8> = Rgb([0x00, 0x00, 0x00]);

/// Inclusive depth range classified as hand.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DepthBand {
    pub min: i32,
    pub max: i32,
}

impl DepthBand {
    pub fn contains(&self, depth: i32) -> bool {
        depth >= self.min && depth <= self.max
    }
}

pub struct DepthSegmenter {
    mode: SegmentationMode,
    near_tolerance_mm: i32,
    far_tolerance_mm: i32,
}

impl DepthSegmenter {
    pub fn new(config: &DepthConfig) -> Self {
        Self {
            mode: config.mode,
            near_tolerance_mm: config.near_tolerance_mm,
            far_tolerance_mm: config.far_tolerance_mm,
        }
    }

    /// Depth band for a hand at `hand_depth_mm`. In Otsu mode the far bound
    /// comes from the histogram of `region`, ignoring pixels without a reading.
    pub fn band(&self, region: &DepthImage, hand_depth_mm: i32) -> DepthBand {
        let min = hand_depth_mm.saturating_sub(self.near_tolerance_mm);
        let fixed_max = hand_depth_mm.saturating_add(self.far_tolerance_mm);

        let max = match self.mode {
            SegmentationMode::Band => fixed_max,
            SegmentationMode::Otsu => {
                let histogram = Histogram::from_samples(
                    region.pixels().map(|p| p.0[0] as i32).filter(|&d| d > 0),
                );
                match histogram.otsu_threshold() {
                    Some(threshold) => threshold,
                    None => {
                        debug!(hand_depth_mm, "no Otsu threshold, using fixed band");
                        fixed_max
                    }
                }
            }
        };

        DepthBand { min, max }
    }

    /// Binary mask of `region`: hand pixels white, everything else black.
    pub fn segment(&self, region: &DepthImage, hand_depth_mm: i32) -> RgbImage {
        let band = self.band(region, hand_depth_mm);
        RgbImage::from_fn(region.width(), region.height(), |x, y| {
            let depth = region.get_pixel(x, y).0[0] as i32;
            if depth > 0 && band.contains(depth) {
                FOREGROUND
            } else {
                BACKGROUND
            }
        })
    }
}

/// Joint depth (metres) to the depth image's millimetre scale.
pub fn depth_to_mm(depth: f64) -> i32 {
    (depth * 1000.0).round() as i32
}
