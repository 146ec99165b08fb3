//! Artifact mask building.
//!
//! Classifies pixels as overlay artifacts versus genuine thermal content.
//! The white class uses a color rule (near-white on every channel), a 5×5
//! binary dilation to catch anti-aliased text edges, and an intersection
//! with the configured overlay regions. The green class is a plain color
//! rule evaluated inside a single region.

use image::{GrayImage, Luma, RgbImage};
use imageproc::distance_transform::Norm;
use imageproc::morphology::dilate;

use crate::region::{ClippedRegion, Region};

/// Dilation radius under the L∞ norm: 2 yields a 5×5 neighborhood.
pub const DILATION_RADIUS: u8 = 2;

/// The white-class pixel partition: artifact coordinates to repaint and the
/// genuine pool to sample replacement colors from.
///
/// The genuine pool is the complement of the *dilated* candidate mask over
/// the whole image, not of the region-filtered artifact set — a pixel inside
/// a configured region still counts as genuine as long as it is not
/// near-white.
#[derive(Debug, Clone)]
pub struct WhitePartition {
    /// Dilated near-white pixels that fall inside a configured region.
    pub artifact: Vec<(u32, u32)>,
    /// All pixels outside the dilated mask, in row-major scan order.
    pub genuine: Vec<(u32, u32)>,
}

/// Build the white-class partition for an image.
///
/// A pixel is a near-white candidate iff every channel is
/// `>= 255 - tolerance`. The candidate mask is dilated by
/// [`DILATION_RADIUS`] and then restricted to pixels covered by at least one
/// of `regions` (clipped to the image bounds; regions clipping to empty
/// contribute nothing).
#[must_use]
pub fn white_artifact_partition(
    image: &RgbImage,
    tolerance: u8,
    regions: &[Region],
) -> WhitePartition {
    let (width, height) = image.dimensions();
    let floor = 255u8.saturating_sub(tolerance);

    let mut candidates = GrayImage::new(width, height);
    for (x, y, px) in image.enumerate_pixels() {
        if px.0.iter().all(|&c| c >= floor) {
            candidates.put_pixel(x, y, Luma([255]));
        }
    }
    let dilated = dilate(&candidates, Norm::LInf, DILATION_RADIUS);

    let clipped: Vec<ClippedRegion> = regions
        .iter()
        .filter_map(|r| r.clip(width, height))
        .collect();

    let mut artifact = Vec::new();
    let mut genuine = Vec::new();
    for (x, y, px) in dilated.enumerate_pixels() {
        if px.0[0] > 0 {
            if clipped.iter().any(|r| r.contains(x, y)) {
                artifact.push((x, y));
            }
        } else {
            genuine.push((x, y));
        }
    }

    WhitePartition { artifact, genuine }
}

/// Detect green marker artifacts inside a clipped region.
///
/// A pixel qualifies iff its green channel exceeds `floor` and strictly
/// dominates both the red and blue channels. Pixels outside the region are
/// never inspected.
#[must_use]
pub fn green_artifacts(image: &RgbImage, region: ClippedRegion, floor: u8) -> Vec<(u32, u32)> {
    region
        .pixels()
        .filter(|&(x, y)| {
            let [r, g, b] = image.get_pixel(x, y).0;
            g > floor && g > r && g > b
        })
        .collect()
}

/// All pixels of a `width × height` image lying spatially outside `region`,
/// in row-major scan order.
#[must_use]
pub fn pixels_outside(width: u32, height: u32, region: ClippedRegion) -> Vec<(u32, u32)> {
    let mut outside = Vec::new();
    for y in 0..height {
        for x in 0..width {
            if !region.contains(x, y) {
                outside.push((x, y));
            }
        }
    }
    outside
}
