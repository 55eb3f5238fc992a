// src/capture.rs - Per-recording frame buffer
use image::{imageops, RgbImage};
use tracing::trace;

use crate::error::Result;
use crate::features::ArmFeatures;
use crate::roi::{HandView, ViewMap};
use crate::skeleton::{ArmPose, Skeleton};

/// One captured timestep: the skeleton and the four normalized hand images.
#[derive(Debug, Clone)]
pub struct FrameRecord {
    skeleton: Skeleton,
    pose: ArmPose,
    images: ViewMap<RgbImage>,
}

impl FrameRecord {
    pub fn skeleton(&self) -> &Skeleton {
        &self.skeleton
    }

    pub fn pose(&self) -> &ArmPose {
        &self.pose
    }

    pub fn image(&self, view: HandView) -> &RgbImage {
        &self.images[view]
    }

    pub fn images(&self) -> &ViewMap<RgbImage> {
        &self.images
    }

    pub fn features(&self) -> ArmFeatures {
        ArmFeatures::from_pose(&self.pose)
    }
}

/// Append-only frames of a single recording.
#[derive(Debug, Clone)]
pub struct CaptureBuffer {
    frames: Vec<FrameRecord>,
    image_size: u32,
}

impl CaptureBuffer {
    pub fn new(image_size: u32) -> Self {
        Self {
            frames: Vec::new(),
            image_size: image_size.max(1),
        }
    }

    pub fn image_size(&self) -> u32 {
        self.image_size
    }

    pub fn blank_image(&self) -> RgbImage {
        RgbImage::new(self.image_size, self.image_size)
    }

    /// Appends a frame. A view that could not be cropped (`None`) reuses the
    /// previous frame's image, or a blank square for the first frame, so
    /// every record carries all four images.
    pub fn push(&mut self, skeleton: &Skeleton, views: ViewMap<Option<RgbImage>>) -> Result<usize> {
        let pose = ArmPose::from_skeleton(skeleton)?;
        let size = self.image_size;

        let images = views.map(|view, image| match image {
            Some(image) if image.dimensions() == (size, size) => image,
            Some(image) => imageops::resize(&image, size, size, imageops::FilterType::Nearest),
            None => {
                trace!(view = %view.tag(), "substituting hand image");
                match self.frames.last() {
                    Some(previous) => previous.image(view).clone(),
                    None => RgbImage::new(size, size),
                }
            }
        });

        self.frames.push(FrameRecord {
            skeleton: skeleton.clone(),
            pose,
            images,
        });
        Ok(self.frames.len())
    }

    pub fn frames(&self) -> &[FrameRecord] {
        &self.frames
    }

    pub fn len(&self) -> usize {
        self.frames.len()
    }

    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }

    pub fn clear(&mut self) {
        self.frames.clear();
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::error::CaptureError;
    use crate::skeleton::{JointSample, JointType};
    use image::Rgb;
    use nalgebra::Vector3;

    pub(crate) fn upper_body(offset: f64) -> Skeleton {
        let joints = [
            (JointType::Head, Vector3::new(0.0, 0.7, 2.0)),
            (JointType::ShoulderCenter, Vector3::new(0.0, 0.5, 2.0)),
            (JointType::ShoulderLeft, Vector3::new(-0.2, 0.5, 2.0)),
            (JointType::ElbowLeft, Vector3::new(-0.25, 0.2, 1.9)),
            (JointType::HandLeft, Vector3::new(-0.2 + offset, 0.1, 1.7)),
            (JointType::ShoulderRight, Vector3::new(0.2, 0.5, 2.0)),
            (JointType::ElbowRight, Vector3::new(0.25, 0.2, 1.9)),
            (JointType::HandRight, Vector3::new(0.2 - offset, 0.3, 1.6)),
        ];
        Skeleton::from_samples(
            joints
                .into_iter()
                .map(|(joint, position)| JointSample { joint, position }),
        )
    }

    pub(crate) fn solid(size: u32, value: u8) -> RgbImage {
        RgbImage::from_pixel(size, size, Rgb([value, value, value]))
    }

    #[test]
    fn test_first_frame_falls_back_to_blank() {
        let mut buffer = CaptureBuffer::new(16);
        let mut views = ViewMap::from_fn(|_| Some(solid(16, 200)));
        views[HandView::LEFT_DEPTH] = None;

        buffer.push(&upper_body(0.0), views).unwrap();
        let record = &buffer.frames()[0];
        assert_eq!(record.image(HandView::LEFT_DEPTH).get_pixel(3, 3), &Rgb([0, 0, 0]));
        assert_eq!(record.image(HandView::LEFT_COLOR).get_pixel(3, 3), &Rgb([200, 200, 200]));
    }

    #[test]
    fn test_rejected_view_reuses_previous_frame() {
        let mut buffer = CaptureBuffer::new(16);
        buffer
            .push(&upper_body(0.0), ViewMap::from_fn(|_| Some(solid(16, 90))))
            .unwrap();

        let mut views = ViewMap::from_fn(|_| Some(solid(16, 10)));
        views[HandView::RIGHT_COLOR] = None;
        buffer.push(&upper_body(0.1), views).unwrap();

        let latest = &buffer.frames()[1];
        assert_eq!(latest.image(HandView::RIGHT_COLOR).get_pixel(0, 0), &Rgb([90, 90, 90]));
        assert_eq!(latest.image(HandView::RIGHT_DEPTH).get_pixel(0, 0), &Rgb([10, 10, 10]));
    }

    #[test]
    fn test_images_are_normalized_to_buffer_size() {
        let mut buffer = CaptureBuffer::new(16);
        buffer
            .push(&upper_body(0.0), ViewMap::from_fn(|_| Some(solid(40, 1))))
            .unwrap();
        for (_, image) in buffer.frames()[0].images().iter() {
            assert_eq!(image.dimensions(), (16, 16));
        }
    }

    #[test]
    fn test_partial_skeleton_is_rejected() {
        let mut buffer = CaptureBuffer::new(16);
        let skeleton = Skeleton::from_samples([JointSample {
            joint: JointType::Head,
            position: Vector3::new(0.0, 0.7, 2.0),
        }]);

        let result = buffer.push(&skeleton, ViewMap::default());
        assert!(matches!(result, Err(CaptureError::MissingJoint(_))));
        assert!(buffer.is_empty());
    }
}
