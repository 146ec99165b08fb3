//! Core snapshot cleanup engine.

use std::path::{Path, PathBuf};

use image::{DynamicImage, ImageFormat, RgbImage};
use tracing::debug;

use crate::config::CleanupConfig;
use crate::error::{Error, Result};
use crate::{inpaint, mask};

/// Counters from one cleanup invocation.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CleanStats {
    /// Pixels whose final color differs from their original color. This is
    /// the count reported to callers.
    pub changed: usize,
    /// Pixel writes performed by the white stage (across all passes).
    pub white_replaced: usize,
    /// Pixel writes performed by the green stage.
    pub green_replaced: usize,
    /// Pixel writes performed by the bar stage.
    pub bar_replaced: usize,
}

/// Result of processing a single image file.
#[derive(Debug)]
pub struct ProcessResult {
    /// Path of the processed file.
    pub path: PathBuf,
    /// Whether processing succeeded.
    pub success: bool,
    /// Pixels altered, when processing succeeded.
    pub changed: usize,
    /// Human-readable status message.
    pub message: String,
}

/// The cleanup engine holding the overlay layout configuration.
///
/// Create once and reuse for multiple images; one `clean` invocation owns
/// its buffer exclusively and callers may process different images on
/// different threads.
pub struct CleanupEngine {
    config: CleanupConfig,
}

impl Default for CleanupEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl CleanupEngine {
    /// Create an engine with the default pre-measured overlay layout.
    #[must_use]
    pub fn new() -> Self {
        Self::with_config(CleanupConfig::default())
    }

    /// Create an engine with an explicit configuration.
    #[must_use]
    pub const fn with_config(config: CleanupConfig) -> Self {
        Self { config }
    }

    /// The engine's configuration.
    #[must_use]
    pub const fn config(&self) -> &CleanupConfig {
        &self.config
    }

    /// Remove all configured overlay artifacts from an image in-place.
    ///
    /// Runs the white stage, then the green stage, then (when enabled) the
    /// bar stage, in that order on the shared buffer; the bar stage
    /// deliberately samples the buffer as left by the earlier stages. The
    /// stages are independent: an empty white candidate set does not skip
    /// the others.
    ///
    /// `changed` in the returned stats counts pixels whose final color
    /// differs from their original color. The default bar region overlaps a
    /// white region, so a pixel can legitimately be rewritten by two
    /// stages; per-stage write counts are therefore reported separately
    /// instead of being summed.
    pub fn clean(&self, image: &mut RgbImage) -> CleanStats {
        let config = &self.config;
        let (width, height) = image.dimensions();
        let original = image.clone();

        let partition = mask::white_artifact_partition(image, config.tolerance, &config.white_regions);
        let white_replaced = if partition.artifact.is_empty() {
            debug!("no white overlay pixels inside the configured regions");
            0
        } else {
            inpaint::smooth_white_artifacts(
                image,
                &partition.artifact,
                &partition.genuine,
                config.neighbor_count,
                config.passes,
            )
        };

        let green_replaced = config.green_region.clip(width, height).map_or(0, |region| {
            let artifacts = mask::green_artifacts(image, region, config.green_floor);
            if artifacts.is_empty() {
                debug!("no green marker pixels detected");
                0
            } else {
                let outside = mask::pixels_outside(width, height, region);
                inpaint::smooth_green_artifacts(image, &artifacts, &outside, config.neighbor_count)
            }
        });

        let bar_replaced = if config.smooth_bar {
            config.bar_region.clip(width, height).map_or(0, |region| {
                let bar_pixels: Vec<(u32, u32)> = region.pixels().collect();
                let outside = mask::pixels_outside(width, height, region);
                inpaint::smooth_bar_region(image, &bar_pixels, &outside, config.neighbor_count)
            })
        } else {
            0
        };

        let changed = original
            .pixels()
            .zip(image.pixels())
            .filter(|(before, after)| before != after)
            .count();

        debug!(
            changed,
            white_replaced, green_replaced, bar_replaced, "cleanup complete"
        );
        CleanStats {
            changed,
            white_replaced,
            green_replaced,
            bar_replaced,
        }
    }

    /// Process a single image file: load, clean, save.
    ///
    /// Returns a [`ProcessResult`] indicating success or failure; load and
    /// save errors are reported in the result message rather than panicking.
    #[must_use]
    pub fn process_file(&self, input: &Path, output: &Path) -> ProcessResult {
        let mut result = ProcessResult {
            path: input.to_path_buf(),
            success: false,
            changed: 0,
            message: String::new(),
        };

        let dyn_img = match image::open(input) {
            Ok(img) => img,
            Err(e) => {
                result.message = format!("Failed to load: {e}");
                return result;
            }
        };
        let mut rgb_img = dyn_img.to_rgb8();

        let stats = self.clean(&mut rgb_img);
        result.changed = stats.changed;

        if let Some(parent) = output.parent() {
            if !parent.exists() {
                if let Err(e) = std::fs::create_dir_all(parent) {
                    result.message = format!("Failed to create output directory: {e}");
                    return result;
                }
            }
        }

        match save_image(&rgb_img, output) {
            Ok(()) => {
                result.success = true;
                result.message = format!("{} pixels cleaned", stats.changed);
            }
            Err(e) => {
                result.message = format!("Failed to save: {e}");
            }
        }

        result
    }

    /// Process all supported images in a directory.
    ///
    /// Uses parallel iteration when the `cli` feature is enabled (via
    /// rayon); invocations share no mutable state, so images are
    /// independent. Returns a [`ProcessResult`] for each image found.
    ///
    /// # Panics
    ///
    /// Panics if any directory entry has no filename (should not happen for
    /// regular files).
    #[must_use]
    pub fn process_directory(&self, input_dir: &Path, output_dir: &Path) -> Vec<ProcessResult> {
        let entries: Vec<_> = match std::fs::read_dir(input_dir) {
            Ok(rd) => rd
                .filter_map(std::result::Result::ok)
                .filter(|e| e.file_type().map(|ft| ft.is_file()).unwrap_or(false))
                .filter(|e| is_supported_image(e.path().as_path()))
                .collect(),
            Err(e) => {
                return vec![ProcessResult {
                    path: input_dir.to_path_buf(),
                    success: false,
                    changed: 0,
                    message: format!("Failed to read directory: {e}"),
                }];
            }
        };

        if !output_dir.exists() {
            if let Err(e) = std::fs::create_dir_all(output_dir) {
                return vec![ProcessResult {
                    path: output_dir.to_path_buf(),
                    success: false,
                    changed: 0,
                    message: format!("Failed to create output directory: {e}"),
                }];
            }
        }

        #[cfg(feature = "cli")]
        {
            use rayon::prelude::*;
            entries
                .par_iter()
                .map(|entry| {
                    let input_path = entry.path();
                    let filename = input_path.file_name().unwrap();
                    let output_path = output_dir.join(filename);
                    self.process_file(&input_path, &output_path)
                })
                .collect()
        }

        #[cfg(not(feature = "cli"))]
        {
            entries
                .iter()
                .map(|entry| {
                    let input_path = entry.path();
                    let filename = input_path.file_name().unwrap();
                    let output_path = output_dir.join(filename);
                    self.process_file(&input_path, &output_path)
                })
                .collect()
        }
    }
}

/// Check if a file has a supported image extension.
#[must_use]
pub fn is_supported_image(path: &Path) -> bool {
    match path.extension().and_then(|e| e.to_str()) {
        Some(ext) => matches!(
            ext.to_lowercase().as_str(),
            "jpg" | "jpeg" | "png" | "webp" | "bmp"
        ),
        None => false,
    }
}

/// Save an RGB image with format-specific quality settings.
///
/// # Errors
///
/// Returns an error if the format is unsupported or writing fails.
pub fn save_image(img: &RgbImage, path: &Path) -> Result<()> {
    let format =
        ImageFormat::from_path(path).map_err(|e| Error::UnsupportedFormat(e.to_string()))?;

    let dyn_img = DynamicImage::ImageRgb8(img.clone());

    match format {
        ImageFormat::Jpeg => {
            let file = std::fs::File::create(path)?;
            let mut encoder = image::codecs::jpeg::JpegEncoder::new_with_quality(file, 100);
            encoder.encode_image(&dyn_img)?;
        }
        ImageFormat::Png | ImageFormat::WebP | ImageFormat::Bmp => {
            dyn_img.save(path)?;
        }
        _ => {
            return Err(Error::UnsupportedFormat(format!("{format:?}")));
        }
    }

    Ok(())
}

/// Generate a default output path from an input path.
///
/// Example: `"CH01.jpeg"` becomes `"CH01_clean.jpeg"`, matching the naming
/// the archive uploader expects.
#[must_use]
pub fn default_output_path(input: &Path) -> PathBuf {
    let stem = input.file_stem().unwrap_or_default().to_string_lossy();
    let ext = input.extension().unwrap_or_default().to_string_lossy();
    let parent = input.parent().unwrap_or(Path::new("."));
    parent.join(format!("{stem}_clean.{ext}"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::region::Region;
    use image::Rgb;

    fn no_overlay_config() -> CleanupConfig {
        CleanupConfig {
            white_regions: Vec::new(),
            green_region: Region::new(0, 0, 0, 0),
            smooth_bar: false,
            ..CleanupConfig::default()
        }
    }

    #[test]
    fn clean_with_no_configured_regions_changes_nothing() {
        let engine = CleanupEngine::with_config(no_overlay_config());
        let mut img = RgbImage::from_pixel(20, 20, Rgb([200, 200, 200]));
        let before = img.clone();

        let stats = engine.clean(&mut img);

        assert_eq!(stats.changed, 0);
        assert_eq!(img, before);
    }

    #[test]
    fn green_stage_runs_even_when_white_candidates_are_empty() {
        let config = CleanupConfig {
            white_regions: Vec::new(),
            green_region: Region::new(4, 4, 2, 2),
            smooth_bar: false,
            ..CleanupConfig::default()
        };
        let engine = CleanupEngine::with_config(config);

        let mut img = RgbImage::from_pixel(10, 10, Rgb([50, 50, 50]));
        img.put_pixel(4, 4, Rgb([0, 200, 0]));

        let stats = engine.clean(&mut img);
        assert_eq!(stats.changed, 1);
        assert_eq!(*img.get_pixel(4, 4), Rgb([50, 50, 50]));
    }

    #[test]
    fn changed_counts_final_difference_not_stage_writes() {
        // Bar region nested inside a white region, as in the default
        // layout: the white stage repaints the near-white bar pixel and the
        // bar stage revisits it. The public counter reflects only the final
        // difference from the original, not the per-stage writes.
        let config = CleanupConfig {
            white_regions: vec![Region::new(2, 2, 4, 4)],
            green_region: Region::new(0, 0, 0, 0),
            smooth_bar: true,
            bar_region: Region::new(3, 3, 1, 1),
            tolerance: 50,
            ..CleanupConfig::default()
        };
        let engine = CleanupEngine::with_config(config);

        let mut img = RgbImage::from_pixel(12, 12, Rgb([30, 30, 30]));
        img.put_pixel(3, 3, Rgb([255, 255, 255]));

        let stats = engine.clean(&mut img);

        assert_eq!(*img.get_pixel(3, 3), Rgb([30, 30, 30]));
        assert_eq!(stats.changed, 1);
        assert!(stats.white_replaced >= 1);
        assert!(stats.bar_replaced <= 1);
    }

    #[test]
    fn default_output_path_appends_clean_suffix() {
        let p = default_output_path(Path::new("/tmp/CH01.jpeg"));
        assert_eq!(p, PathBuf::from("/tmp/CH01_clean.jpeg"));

        let p = default_output_path(Path::new("snapshot.png"));
        assert_eq!(p.file_name().unwrap().to_str().unwrap(), "snapshot_clean.png");
    }

    #[test]
    fn is_supported_image_accepts_common_formats() {
        assert!(is_supported_image(Path::new("photo.jpg")));
        assert!(is_supported_image(Path::new("photo.JPEG")));
        assert!(is_supported_image(Path::new("photo.png")));
        assert!(is_supported_image(Path::new("photo.webp")));
        assert!(is_supported_image(Path::new("photo.bmp")));
    }

    #[test]
    fn is_supported_image_rejects_unsupported_formats() {
        assert!(!is_supported_image(Path::new("photo.gif")));
        assert!(!is_supported_image(Path::new("photo.txt")));
        assert!(!is_supported_image(Path::new("photo")));
    }

    #[test]
    fn process_file_reports_load_failure() {
        let engine = CleanupEngine::new();
        let result = engine.process_file(Path::new("/nonexistent/input.png"), Path::new("/tmp/out.png"));
        assert!(!result.success);
        assert!(result.message.contains("Failed to load"));
    }
}
