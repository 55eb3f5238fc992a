// src/roi.rs - Hand crop rectangles with depth-normalized scaling
use image::{imageops, ImageBuffer, Pixel};
use std::ops::{Index, IndexMut};

use crate::config::RoiConfig;
use crate::skeleton::Hand;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Modality {
    Color,
    Depth,
}

impl Modality {
    pub fn name(self) -> &'static str {
        match self {
            Modality::Color => "Color",
            Modality::Depth => "Depth",
        }
    }
}

/// One of the four per-frame hand images.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct HandView {
    pub hand: Hand,
    pub modality: Modality,
}

impl HandView {
    pub const LEFT_COLOR: HandView = HandView::new(Hand::Left, Modality::Color);
    pub const RIGHT_COLOR: HandView = HandView::new(Hand::Right, Modality::Color);
    pub const LEFT_DEPTH: HandView = HandView::new(Hand::Left, Modality::Depth);
    pub const RIGHT_DEPTH: HandView = HandView::new(Hand::Right, Modality::Depth);

    /// Export order: left color, right color, left depth, right depth.
    pub const ALL: [HandView; 4] = [
        HandView::LEFT_COLOR,
        HandView::RIGHT_COLOR,
        HandView::LEFT_DEPTH,
        HandView::RIGHT_DEPTH,
    ];

    pub const fn new(hand: Hand, modality: Modality) -> Self {
        Self { hand, modality }
    }

    pub fn index(self) -> usize {
        let hand = match self.hand {
            Hand::Left => 0,
            Hand::Right => 1,
        };
        let modality = match self.modality {
            Modality::Color => 0,
            Modality::Depth => 2,
        };
        hand + modality
    }

    /// File tag, e.g. `LeftColor`.
    pub fn tag(self) -> String {
        format!("{}{}", self.hand.name(), self.modality.name())
    }
}

/// A value for each of the four hand views.
#[derive(Debug, Clone, PartialEq)]
pub struct ViewMap<T>([T; 4]);

impl<T> ViewMap<T> {
    pub fn from_fn(mut f: impl FnMut(HandView) -> T) -> Self {
        Self(HandView::ALL.map(&mut f))
    }

    pub fn iter(&self) -> impl Iterator<Item = (HandView, &T)> {
        HandView::ALL.into_iter().zip(self.0.iter())
    }

    pub fn map<U>(self, mut f: impl FnMut(HandView, T) -> U) -> ViewMap<U> {
        let mut index = 0;
        ViewMap(self.0.map(|value| {
            let view = HandView::ALL[index];
            index += 1;
            f(view, value)
        }))
    }
}

impl<T: Default> Default for ViewMap<T> {
    fn default() -> Self {
        Self::from_fn(|_| T::default())
    }
}

impl<T> Index<HandView> for ViewMap<T> {
    type Output = T;

    fn index(&self, view: HandView) -> &T {
        &self.0[view.index()]
    }
}

impl<T> IndexMut<HandView> for ViewMap<T> {
    fn index_mut(&mut self, view: HandView) -> &mut T {
        &mut self.0[view.index()]
    }
}

/// Crop rectangle in source-image pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RoiRect {
    pub x: i32,
    pub y: i32,
    pub width: u32,
    pub height: u32,
}

impl RoiRect {
    pub fn centered(anchor: (i32, i32), half_extent: u32) -> Self {
        let half = half_extent.min(i32::MAX as u32) as i32;
        Self {
            x: anchor.0.saturating_sub(half),
            y: anchor.1.saturating_sub(half),
            width: half_extent.saturating_mul(2),
            height: half_extent.saturating_mul(2),
        }
    }

    pub fn fits_within(&self, width: u32, height: u32) -> bool {
        self.x >= 0
            && self.y >= 0
            && self.x as i64 + self.width as i64 <= width as i64
            && self.y as i64 + self.height as i64 <= height as i64
    }
}

pub struct RoiCropper {
    fixed_size: u32,
    reference_depth: f64,
    pixel_scale: f64,
}

impl RoiCropper {
    pub fn new(config: &RoiConfig) -> Self {
        Self {
            fixed_size: config.fixed_size,
            reference_depth: config.reference_depth,
            pixel_scale: config.pixel_scale,
        }
    }

    pub fn fixed_rect(&self, anchor: (i32, i32)) -> RoiRect {
        let half = self.fixed_size / 2;
        RoiRect {
            x: anchor.0.saturating_sub(half as i32),
            y: anchor.1.saturating_sub(half as i32),
            width: self.fixed_size,
            height: self.fixed_size,
        }
    }

    /// Half edge of the perspective crop for a joint at `depth`:
    /// `floor(reference_depth / depth * pixel_scale)`.
    ///
    /// `None` when the depth gives no usable scale (zero, negative, NaN, or
    /// so far away the crop collapses).
    pub fn scaled_half_extent(&self, depth: f64) -> Option<u32> {
        if !depth.is_finite() || depth <= 0.0 {
            return None;
        }

        let half = ((self.reference_depth / depth) * self.pixel_scale).floor();
        if !half.is_finite() || half < 1.0 {
            return None;
        }
        Some(half.min(u32::MAX as f64) as u32)
    }

    pub fn scaled_rect(&self, anchor: (i32, i32), depth: f64) -> Option<RoiRect> {
        self.scaled_half_extent(depth)
            .map(|half| RoiRect::centered(anchor, half))
    }

    /// The fixed window around `anchor`, if it lies inside a `width x height` image.
    pub fn locate_fixed(&self, anchor: (i32, i32), width: u32, height: u32) -> Option<RoiRect> {
        Some(self.fixed_rect(anchor)).filter(|rect| rect.fits_within(width, height))
    }

    pub fn locate_scaled(
        &self,
        anchor: (i32, i32),
        depth: f64,
        width: u32,
        height: u32,
    ) -> Option<RoiRect> {
        self.scaled_rect(anchor, depth)
            .filter(|rect| rect.fits_within(width, height))
    }
}

/// Copies `rect` out of `image`. Rectangles that leave the image yield `None`.
pub fn crop<P>(
    image: &ImageBuffer<P, Vec<P::Subpixel>>,
    rect: &RoiRect,
) -> Option<ImageBuffer<P, Vec<P::Subpixel>>>
where
    P: Pixel + 'static,
{
    if !rect.fits_within(image.width(), image.height()) {
        return None;
    }

    let view = imageops::crop_imm(image, rect.x as u32, rect.y as u32, rect.width, rect.height);
    Some(view.to_image())
}
