// src/resample.rs - Fixed-length resampling of a captured word
use tracing::debug;

use crate::capture::{CaptureBuffer, FrameRecord};
use crate::features::SERIES_PER_TABLE;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Track {
    /// Stride-selected frames, about `frame_length` of them.
    Sampled,
    /// Every frame the stride skipped.
    Full,
}

impl Track {
    pub const BOTH: [Track; 2] = [Track::Sampled, Track::Full];

    pub fn name(self) -> &'static str {
        match self {
            Track::Sampled => "sampled",
            Track::Full => "full",
        }
    }
}

/// Assigns each of `len` frames to a track.
///
/// The k-th cursor position is `k * len / frame_length`; the frame at its
/// floor is sampled, for `k` below `frame_length`. All other frames go to the
/// full track, so at most `frame_length` frames are sampled. Invalid input
/// (no frames, or a frame length that is not a positive number) yields no
/// assignments.
pub fn partition(len: usize, frame_length: f64) -> Vec<Track> {
    if len == 0 || !frame_length.is_finite() || frame_length <= 0.0 {
        return Vec::new();
    }

    // strides of one frame or less land on every offset
    if frame_length >= len as f64 {
        return vec![Track::Sampled; len];
    }

    let mut tracks = vec![Track::Full; len];
    let mut k = 0usize;
    while (k as f64) < frame_length {
        // computed per step, never accumulated
        let offset = (k as f64 * len as f64 / frame_length).floor() as usize;
        if offset >= len {
            break;
        }
        tracks[offset] = Track::Sampled;
        k += 1;
    }

    tracks
}

/// Feature series and images routed to one track.
#[derive(Debug, Clone, Default)]
pub struct TrackData<'a> {
    /// Limb angle rows (shoulder->elbow, elbow->hand), one value per frame.
    pub limb: [Vec<f64>; SERIES_PER_TABLE],
    /// Shoulder-center relative rows.
    pub head: [Vec<f64>; SERIES_PER_TABLE],
    /// Source offsets in the capture buffer, ascending.
    pub indices: Vec<usize>,
    pub frames: Vec<&'a FrameRecord>,
}

impl<'a> TrackData<'a> {
    fn push(&mut self, offset: usize, frame: &'a FrameRecord) {
        let features = frame.features();
        for (row, value) in self.limb.iter_mut().zip(features.limb_row_values()) {
            row.push(value);
        }
        for (row, value) in self.head.iter_mut().zip(features.head_row_values()) {
            row.push(value);
        }
        self.indices.push(offset);
        self.frames.push(frame);
    }

    pub fn len(&self) -> usize {
        self.frames.len()
    }

    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }
}

#[derive(Debug, Clone, Default)]
pub struct ResampledTracks<'a> {
    pub sampled: TrackData<'a>,
    pub full: TrackData<'a>,
}

impl<'a> ResampledTracks<'a> {
    pub fn track(&self, track: Track) -> &TrackData<'a> {
        match track {
            Track::Sampled => &self.sampled,
            Track::Full => &self.full,
        }
    }

    fn track_mut(&mut self, track: Track) -> &mut TrackData<'a> {
        match track {
            Track::Sampled => &mut self.sampled,
            Track::Full => &mut self.full,
        }
    }
}

/// Walks the buffer once, computing features for every frame and routing it
/// to the sampled or full track.
pub fn resample(buffer: &CaptureBuffer, frame_length: f64) -> ResampledTracks<'_> {
    let mut tracks = ResampledTracks::default();

    for (offset, (frame, track)) in buffer
        .frames()
        .iter()
        .zip(partition(buffer.len(), frame_length))
        .enumerate()
    {
        tracks.track_mut(track).push(offset, frame);
    }

    debug!(
        frames = buffer.len(),
        frame_length,
        sampled = tracks.sampled.len(),
        full = tracks.full.len(),
        "resampled capture"
    );
    tracks
}
