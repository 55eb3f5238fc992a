// src/recorder.rs - Recording control: start, append, finalize, discard
use chrono::{DateTime, Local};
use image::RgbImage;
use tracing::info;

use crate::capture::CaptureBuffer;
use crate::error::{CaptureError, Result};
use crate::export::{DatasetExporter, ExportReport};
use crate::resample::resample;
use crate::roi::ViewMap;
use crate::skeleton::Skeleton;

/// One word being recorded. Owns its buffer from `start` until it is
/// consumed by `finalize` or `discard`.
#[derive(Debug)]
pub struct RecordingSession {
    session: String,
    started_at: DateTime<Local>,
    buffer: CaptureBuffer,
}

impl RecordingSession {
    pub fn start(session: impl Into<String>, image_size: u32) -> Self {
        let session = session.into();
        info!(%session, "recording started");
        Self {
            session,
            started_at: Local::now(),
            buffer: CaptureBuffer::new(image_size),
        }
    }

    pub fn session(&self) -> &str {
        &self.session
    }

    pub fn started_at(&self) -> DateTime<Local> {
        self.started_at
    }

    pub fn buffer(&self) -> &CaptureBuffer {
        &self.buffer
    }

    pub fn frame_count(&self) -> usize {
        self.buffer.len()
    }

    pub fn append(&mut self, skeleton: &Skeleton, views: ViewMap<Option<RgbImage>>) -> Result<usize> {
        self.buffer.push(skeleton, views)
    }

    /// Checks that the recording can be finalized to `frame_length`.
    pub fn check_finalize(&self, frame_length: f64) -> Result<()> {
        if !frame_length.is_finite() || frame_length <= 0.0 {
            return Err(CaptureError::InvalidFrameLength(frame_length));
        }
        if self.buffer.is_empty() {
            return Err(CaptureError::EmptyRecording(self.session.clone()));
        }
        Ok(())
    }

    /// Resamples the recording to `frame_length` and writes both tracks.
    pub fn finalize(self, frame_length: f64, exporter: &DatasetExporter) -> Result<ExportReport> {
        self.check_finalize(frame_length)?;

        let duration = Local::now() - self.started_at;
        info!(
            session = %self.session,
            frames = self.buffer.len(),
            seconds = duration.num_milliseconds() as f64 / 1000.0,
            "finalizing recording"
        );

        let tracks = resample(&self.buffer, frame_length);
        Ok(exporter.export(&self.session, &tracks))
    }

    pub fn discard(self) {
        info!(session = %self.session, frames = self.buffer.len(), "recording discarded");
    }
}

/// Holds at most one active recording.
#[derive(Debug)]
pub struct Recorder {
    image_size: u32,
    active: Option<RecordingSession>,
}

impl Recorder {
    pub fn new(image_size: u32) -> Self {
        Self {
            image_size,
            active: None,
        }
    }

    pub fn is_recording(&self) -> bool {
        self.active.is_some()
    }

    pub fn active(&self) -> Option<&RecordingSession> {
        self.active.as_ref()
    }

    pub fn start(&mut self, session: impl Into<String>) -> Result<()> {
        if let Some(active) = &self.active {
            return Err(CaptureError::AlreadyRecording(active.session.clone()));
        }
        self.active = Some(RecordingSession::start(session, self.image_size));
        Ok(())
    }

    pub fn append(&mut self, skeleton: &Skeleton, views: ViewMap<Option<RgbImage>>) -> Result<usize> {
        self.active
            .as_mut()
            .ok_or(CaptureError::NotRecording)?
            .append(skeleton, views)
    }

    /// Ends the active recording and exports it. A rejected request leaves
    /// the recording active.
    pub fn finalize(&mut self, frame_length: f64, exporter: &DatasetExporter) -> Result<ExportReport> {
        self.active
            .as_ref()
            .ok_or(CaptureError::NotRecording)?
            .check_finalize(frame_length)?;

        self.active
            .take()
            .ok_or(CaptureError::NotRecording)?
            .finalize(frame_length, exporter)
    }

    pub fn discard(&mut self) -> Result<()> {
        self.active
            .take()
            .ok_or(CaptureError::NotRecording)?
            .discard();
        Ok(())
    }
}
