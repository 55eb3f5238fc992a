// src/pipeline.rs - Per-frame hand normalization
use image::{imageops, RgbImage};
use tracing::{debug, warn};

use crate::config::CaptureConfig;
use crate::roi::{self, HandView, Modality, RoiCropper, ViewMap};
use crate::segment::{depth_to_mm, DepthImage, DepthSegmenter};
use crate::skeleton::{Hand, Skeleton};
use crate::stability::StabilityDetector;

/// One synchronized sensor timestep, as delivered by the acquisition side.
///
/// `anchors` holds each hand joint already mapped into the pixel space of
/// the color or depth image.
#[derive(Debug, Clone)]
pub struct SensorFrame {
    pub skeleton: Skeleton,
    pub color: RgbImage,
    pub depth: DepthImage,
    pub anchors: ViewMap<(i32, i32)>,
}

#[derive(Debug, Clone, Default)]
pub struct FrameOutcome {
    /// Whether each hand has been at rest over the whole stability window.
    pub left_stable: bool,
    pub right_stable: bool,
    /// Fixed-size windows around each hand, `None` where the window left the image.
    pub raw: ViewMap<Option<RgbImage>>,
    /// Depth-scaled windows, the images that go into a recording.
    pub normalized: ViewMap<Option<RgbImage>>,
}

impl FrameOutcome {
    pub fn is_stable(&self, hand: Hand) -> bool {
        match hand {
            Hand::Left => self.left_stable,
            Hand::Right => self.right_stable,
        }
    }
}

pub struct FramePipeline {
    stability: StabilityDetector,
    cropper: RoiCropper,
    segmenter: DepthSegmenter,
    output_size: u32,
}

impl FramePipeline {
    pub fn new(config: &CaptureConfig) -> Self {
        Self {
            stability: StabilityDetector::new(&config.stability),
            cropper: RoiCropper::new(&config.roi),
            segmenter: DepthSegmenter::new(&config.depth),
            output_size: config.roi.output_size.max(1),
        }
    }

    pub fn output_size(&self) -> u32 {
        self.output_size
    }

    pub fn stability(&self) -> &StabilityDetector {
        &self.stability
    }

    pub fn process(&mut self, frame: &SensorFrame) -> FrameOutcome {
        let mut outcome = FrameOutcome::default();

        for hand in Hand::BOTH {
            let Some(position) = frame.skeleton.position(hand.joint()) else {
                warn!(hand = hand.name(), "hand joint missing from skeleton");
                continue;
            };
            self.stability.add(position, hand.joint());
            // the joint was just added, so the lookup cannot miss
            let stable = self.stability.is_stable(hand.joint()).unwrap_or(false);
            match hand {
                Hand::Left => outcome.left_stable = stable,
                Hand::Right => outcome.right_stable = stable,
            }
        }

        for view in HandView::ALL {
            let Some(depth) = frame.skeleton.position(view.hand.joint()).map(|p| p.z) else {
                continue;
            };
            let anchor = frame.anchors[view];
            let (width, height) = match view.modality {
                Modality::Color => frame.color.dimensions(),
                Modality::Depth => frame.depth.dimensions(),
            };

            outcome.raw[view] = self
                .cropper
                .locate_fixed(anchor, width, height)
                .and_then(|rect| self.render(frame, view, &rect, depth));

            outcome.normalized[view] = self
                .cropper
                .locate_scaled(anchor, depth, width, height)
                .and_then(|rect| self.render(frame, view, &rect, depth));

            if outcome.normalized[view].is_none() {
                debug!(view = %view.tag(), ?anchor, depth, "hand window rejected");
            }
        }

        outcome
    }

    /// Crops one view from its source image and resizes it to the output square.
    fn render(
        &self,
        frame: &SensorFrame,
        view: HandView,
        rect: &roi::RoiRect,
        depth: f64,
    ) -> Option<RgbImage> {
        let size = self.output_size;
        match view.modality {
            Modality::Color => {
                let region = roi::crop(&frame.color, rect)?;
                Some(imageops::resize(&region, size, size, imageops::FilterType::Triangle))
            }
            Modality::Depth => {
                let region = roi::crop(&frame.depth, rect)?;
                let mask = self.segmenter.segment(&region, depth_to_mm(depth));
                Some(imageops::resize(&mask, size, size, imageops::FilterType::Nearest))
            }
        }
    }
}
