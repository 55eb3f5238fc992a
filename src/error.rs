// src/error.rs
use std::path::PathBuf;
use thiserror::Error;

use crate::skeleton::JointType;

#[derive(Debug, Error)]
pub enum CaptureError {
    #[error("joint {0:?} has no position history")]
    UntrackedJoint(JointType),

    #[error("skeleton is missing joint {0:?}")]
    MissingJoint(JointType),

    #[error("a recording is already in progress for session '{0}'")]
    AlreadyRecording(String),

    #[error("no recording in progress")]
    NotRecording,

    #[error("recording '{0}' has no frames to export")]
    EmptyRecording(String),

    #[error("frame length must be a positive number, got {0}")]
    InvalidFrameLength(f64),

    #[error("failed to write {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to encode image {path}: {source}")]
    Image {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },

    #[error("failed to write table {path}: {source}")]
    Csv {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },
}

pub type Result<T> = std::result::Result<T, CaptureError>;
