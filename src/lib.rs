//! Remove fixed-position instrument overlays from thermal camera snapshots.
//!
//! Thermal snapshot exports carry the camera's on-screen chrome: white UI
//! text and borders, a green center marker, and the temperature legend bar.
//! This crate repaints those pixels by k-nearest-neighbor inpainting —
//! each artifact pixel takes the mean color of its nearest genuine
//! neighbors — so archives and viewers see the thermal gradient without the
//! instrument overlay.
//!
//! # Quick Start
//!
//! ```no_run
//! use thermal_overlay_removal::CleanupEngine;
//!
//! let engine = CleanupEngine::new();
//! let mut img = image::open("CH01.jpeg").unwrap().to_rgb8();
//! let stats = engine.clean(&mut img);
//! println!("{} pixels cleaned", stats.changed);
//! img.save("CH01_clean.jpeg").unwrap();
//! ```
//!
//! # Overlay layout
//!
//! The overlay positions are fixed by the camera firmware; the default
//! [`CleanupConfig`] carries the pre-measured regions. For a different
//! model, measure the regions once and build the engine with
//! [`CleanupEngine::with_config`]:
//!
//! ```no_run
//! use thermal_overlay_removal::{CleanupConfig, CleanupEngine, Region};
//!
//! let config = CleanupConfig {
//!     white_regions: vec![Region::new(0, 0, 64, 48)],
//!     smooth_bar: false,
//!     ..CleanupConfig::default()
//! };
//! let engine = CleanupEngine::with_config(config);
//! ```

#![deny(missing_docs)]

pub mod batch;
pub mod config;
mod engine;
pub mod error;
pub mod inpaint;
pub mod mask;
pub mod neighbors;
pub mod region;

pub use config::CleanupConfig;
pub use engine::{
    default_output_path, is_supported_image, save_image, CleanStats, CleanupEngine, ProcessResult,
};
pub use error::{Error, Result};
pub use region::{ClippedRegion, Region};
