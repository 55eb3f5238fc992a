// src/config.rs - Capture settings with per-field defaults
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CaptureConfig {
    #[serde(default = "default_output_directory")]
    pub output_directory: PathBuf,
    /// Target number of frames in the sampled track.
    #[serde(default = "default_frame_length")]
    pub frame_length: f64,
    #[serde(default)]
    pub stability: StabilityConfig,
    #[serde(default)]
    pub roi: RoiConfig,
    #[serde(default)]
    pub depth: DepthConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StabilityConfig {
    #[serde(default = "default_window_size")]
    pub window_size: usize,
    /// Maximum drift, in sensor units, still considered "at rest".
    #[serde(default = "default_stability_threshold")]
    pub threshold: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RoiConfig {
    /// Edge of the fixed crop window, in pixels.
    #[serde(default = "default_fixed_size")]
    pub fixed_size: u32,
    /// Depth (sensor units) at which the scaled crop equals `2 * pixel_scale`.
    #[serde(default = "default_reference_depth")]
    pub reference_depth: f64,
    #[serde(default = "default_pixel_scale")]
    pub pixel_scale: f64,
    /// Edge of the square every crop is resized to.
    #[serde(default = "default_output_size")]
    pub output_size: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SegmentationMode {
    Band,
    Otsu,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DepthConfig {
    #[serde(default = "default_segmentation_mode")]
    pub mode: SegmentationMode,
    /// Millimetres in front of the hand still counted as hand.
    #[serde(default = "default_near_tolerance")]
    pub near_tolerance_mm: i32,
    /// Millimetres behind the hand still counted as hand.
    #[serde(default = "default_far_tolerance")]
    pub far_tolerance_mm: i32,
}

fn default_output_directory() -> PathBuf {
    directories::UserDirs::new()
        .and_then(|dirs| dirs.document_dir().map(|p| p.join("SibiCapture")))
        .unwrap_or_else(|| PathBuf::from("./output"))
}

fn default_frame_length() -> f64 {
    10.0
}

fn default_window_size() -> usize {
    20
}

fn default_stability_threshold() -> f64 {
    0.05
}

fn default_fixed_size() -> u32 {
    120
}

fn default_reference_depth() -> f64 {
    1.4
}

fn default_pixel_scale() -> f64 {
    60.0
}

fn default_output_size() -> u32 {
    120
}

fn default_segmentation_mode() -> SegmentationMode {
    SegmentationMode::Band
}

fn default_near_tolerance() -> i32 {
    175
}

fn default_far_tolerance() -> i32 {
    50
}

impl Default for CaptureConfig {
    fn default() -> Self {
        Self {
            output_directory: default_output_directory(),
            frame_length: default_frame_length(),
            stability: StabilityConfig::default(),
            roi: RoiConfig::default(),
            depth: DepthConfig::default(),
        }
    }
}

impl Default for StabilityConfig {
    fn default() -> Self {
        Self {
            window_size: default_window_size(),
            threshold: default_stability_threshold(),
        }
    }
}

impl Default for RoiConfig {
    fn default() -> Self {
        Self {
            fixed_size: default_fixed_size(),
            reference_depth: default_reference_depth(),
            pixel_scale: default_pixel_scale(),
            output_size: default_output_size(),
        }
    }
}

impl Default for DepthConfig {
    fn default() -> Self {
        Self {
            mode: default_segmentation_mode(),
            near_tolerance_mm: default_near_tolerance(),
            far_tolerance_mm: default_far_tolerance(),
        }
    }
}

impl CaptureConfig {
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config {}", path.display()))?;
        let config: CaptureConfig = serde_json::from_str(&content)
            .with_context(|| format!("Invalid config {}", path.display()))?;
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_document_uses_defaults() {
        let config: CaptureConfig = serde_json::from_str("{}").unwrap();
        assert_eq!(config.stability.window_size, 20);
        assert!((config.stability.threshold - 0.05).abs() < 1e-12);
        assert_eq!(config.roi.fixed_size, 120);
        assert!((config.roi.reference_depth - 1.4).abs() < 1e-12);
        assert_eq!(config.depth.mode, SegmentationMode::Band);
        assert!((config.frame_length - 10.0).abs() < 1e-12);
    }

    #[test]
    fn test_partial_sections_keep_remaining_defaults() {
        let config: CaptureConfig = serde_json::from_str(
            r#"{ "roi": { "pixel_scale": 45.0 }, "depth": { "mode": "otsu" } }"#,
        )
        .unwrap();
        assert!((config.roi.pixel_scale - 45.0).abs() < 1e-12);
        assert_eq!(config.roi.output_size, 120);
        assert_eq!(config.depth.mode, SegmentationMode::Otsu);
        assert_eq!(config.depth.far_tolerance_mm, 50);
    }
}
