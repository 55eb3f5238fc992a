// src/replay.rs - Recorded captures on disk, played back frame by frame
use anyhow::{Context, Result};
use nalgebra::Vector3;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

use crate::pipeline::SensorFrame;
use crate::roi::{Modality, ViewMap};
use crate::skeleton::{Hand, JointSample, JointType, Skeleton};

/// Index file of a recorded capture. Image paths are relative to the
/// directory holding the manifest.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CaptureManifest {
    /// Session id to export under; a timestamped one is used when absent.
    #[serde(default)]
    pub session: Option<String>,
    pub frames: Vec<ManifestFrame>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ManifestFrame {
    /// Joint positions in metres, `[x, y, z]`.
    pub joints: BTreeMap<JointType, [f64; 3]>,
    pub color: PathBuf,
    /// 16-bit grayscale image, millimetres.
    pub depth: PathBuf,
    pub anchors: ManifestAnchors,
}

/// Hand joints mapped into color and depth pixel space.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct ManifestAnchors {
    pub left_color: [i32; 2],
    pub right_color: [i32; 2],
    pub left_depth: [i32; 2],
    pub right_depth: [i32; 2],
}

impl ManifestAnchors {
    pub fn to_view_map(&self) -> ViewMap<(i32, i32)> {
        ViewMap::from_fn(|view| {
            let [x, y] = match (view.hand, view.modality) {
                (Hand::Left, Modality::Color) => self.left_color,
                (Hand::Right, Modality::Color) => self.right_color,
                (Hand::Left, Modality::Depth) => self.left_depth,
                (Hand::Right, Modality::Depth) => self.right_depth,
            };
            (x, y)
        })
    }
}

impl ManifestFrame {
    pub fn skeleton(&self) -> Skeleton {
        Skeleton::from_samples(self.joints.iter().map(|(&joint, &[x, y, z])| JointSample {
            joint,
            position: Vector3::new(x, y, z),
        }))
    }
}

pub struct CaptureReplay {
    root: PathBuf,
    manifest: CaptureManifest,
    current: usize,
}

impl CaptureReplay {
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read capture manifest {}", path.display()))?;
        let manifest: CaptureManifest = serde_json::from_str(&content)
            .with_context(|| format!("Invalid capture manifest {}", path.display()))?;

        let root = path
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or_else(|| PathBuf::from("."));

        info!(path = %path.display(), frames = manifest.frames.len(), "capture opened");
        Ok(Self {
            root,
            manifest,
            current: 0,
        })
    }

    pub fn session(&self) -> Option<&str> {
        self.manifest.session.as_deref()
    }

    pub fn len(&self) -> usize {
        self.manifest.frames.len()
    }

    pub fn is_empty(&self) -> bool {
        self.manifest.frames.is_empty()
    }

    pub fn progress(&self) -> f32 {
        if self.is_empty() {
            0.0
        } else {
            self.current as f32 / self.len() as f32
        }
    }

    pub fn seek(&mut self, index: usize) {
        self.current = index.min(self.len());
    }

    /// Decodes the frame at `index` with both of its images.
    pub fn frame(&self, index: usize) -> Result<SensorFrame> {
        let entry = self
            .manifest
            .frames
            .get(index)
            .with_context(|| format!("Frame {} out of range ({} frames)", index, self.len()))?;

        let color_path = self.root.join(&entry.color);
        let color = image::open(&color_path)
            .with_context(|| format!("Failed to load color image {}", color_path.display()))?
            .to_rgb8();

        let depth_path = self.root.join(&entry.depth);
        let depth = image::open(&depth_path)
            .with_context(|| format!("Failed to load depth image {}", depth_path.display()))?
            .to_luma16();

        debug!(index, joints = entry.joints.len(), "frame decoded");
        Ok(SensorFrame {
            skeleton: entry.skeleton(),
            color,
            depth,
            anchors: entry.anchors.to_view_map(),
        })
    }

    pub fn next_frame(&mut self) -> Option<Result<SensorFrame>> {
        if self.current >= self.len() {
            return None;
        }
        let frame = self.frame(self.current);
        self.current += 1;
        Some(frame)
    }
}
