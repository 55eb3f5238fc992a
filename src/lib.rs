// src/lib.rs
pub mod capture;
pub mod config;
pub mod error;
pub mod export;
pub mod features;
pub mod otsu;
pub mod pipeline;
pub mod recorder;
pub mod replay;
pub mod resample;
pub mod roi;
pub mod segment;
pub mod skeleton;
pub mod stability;

pub use config::CaptureConfig;
pub use error::{CaptureError, Result};
