//! The three inpainting stages.
//!
//! Each stage replaces artifact pixels with the per-channel mean color of
//! their `k` nearest genuine neighbors. The stages differ in where they read
//! neighbor colors from:
//!
//! - **White**: a pass-local snapshot of the buffer, repeated for a
//!   configurable number of passes.
//! - **Green**: a snapshot taken once at stage start.
//! - **Bar**: the live, already-partially-cleaned buffer.
//!
//! Genuine pixels are never written by any stage; the neighbor pool of a
//! stage never contains that stage's artifact pixels.

use image::{Rgb, RgbImage};
use tracing::{debug, warn};

use crate::neighbors::NeighborIndex;

/// Per-channel integer mean (floor) of the colors at `neighbors`.
///
/// Returns `None` for an empty neighbor list so callers can skip the pixel.
fn mean_color(source: &RgbImage, neighbors: &[(u32, u32)]) -> Option<Rgb<u8>> {
    if neighbors.is_empty() {
        return None;
    }
    let mut sums = [0u64; 3];
    for &(x, y) in neighbors {
        let px = source.get_pixel(x, y);
        for (sum, &channel) in sums.iter_mut().zip(px.0.iter()) {
            *sum += u64::from(channel);
        }
    }
    let n = neighbors.len() as u64;
    // Quotient of u8 sums over their count always fits in u8.
    #[allow(clippy::cast_possible_truncation)]
    let mean = Rgb([
        (sums[0] / n) as u8,
        (sums[1] / n) as u8,
        (sums[2] / n) as u8,
    ]);
    Some(mean)
}

/// Replace white overlay pixels with the mean color of their nearest
/// genuine neighbors.
///
/// One index is built over `genuine` and reused for every pass. Each pass
/// reads neighbor colors from a snapshot of the buffer taken at the start of
/// that pass and writes a pixel only when the computed mean differs from its
/// current value. Because the genuine pool never contains an artifact pixel,
/// genuine colors cannot change between passes and every pass after the
/// first recomputes the same means; the repeat structure is kept for
/// configurability, not refinement.
///
/// Returns the number of pixel writes performed across all passes.
pub fn smooth_white_artifacts(
    image: &mut RgbImage,
    artifacts: &[(u32, u32)],
    genuine: &[(u32, u32)],
    neighbor_count: usize,
    passes: usize,
) -> usize {
    if artifacts.is_empty() {
        return 0;
    }
    let Some(index) = NeighborIndex::new(genuine) else {
        warn!(
            artifacts = artifacts.len(),
            "white stage: empty genuine pool, skipping"
        );
        return 0;
    };

    let mut replaced = 0;
    for pass in 0..passes {
        let snapshot = image.clone();
        let mut pass_replaced = 0;
        for &(x, y) in artifacts {
            let neighbors = index.query((x, y), neighbor_count);
            let Some(mean) = mean_color(&snapshot, &neighbors) else {
                continue;
            };
            if *image.get_pixel(x, y) != mean {
                image.put_pixel(x, y, mean);
                pass_replaced += 1;
            }
        }
        debug!(pass, replaced = pass_replaced, "white stage pass complete");
        replaced += pass_replaced;
    }
    replaced
}

/// Replace detected green marker pixels with the mean color of the nearest
/// pixels outside the marker region.
///
/// Neighbor colors are read from the buffer state at stage start. Single
/// pass. Returns the number of pixel writes performed.
pub fn smooth_green_artifacts(
    image: &mut RgbImage,
    artifacts: &[(u32, u32)],
    outside: &[(u32, u32)],
    neighbor_count: usize,
) -> usize {
    if artifacts.is_empty() {
        return 0;
    }
    let Some(index) = NeighborIndex::new(outside) else {
        warn!(
            artifacts = artifacts.len(),
            "green stage: region covers the whole frame, no outside pool"
        );
        return 0;
    };

    let snapshot = image.clone();
    let mut replaced = 0;
    for &(x, y) in artifacts {
        let neighbors = index.query((x, y), neighbor_count);
        let Some(mean) = mean_color(&snapshot, &neighbors) else {
            continue;
        };
        if *image.get_pixel(x, y) != mean {
            image.put_pixel(x, y, mean);
            replaced += 1;
        }
    }
    replaced
}

/// Overwrite every pixel of the legend bar with the mean color of the
/// nearest pixels outside the bar region.
///
/// The bar is assumed entirely artificial, so there is no color test.
/// Neighbor colors are read from the live buffer as left by the earlier
/// stages; the pool lies entirely outside the bar, so in-stage writes never
/// feed back into later means. Returns the number of pixel writes performed.
pub fn smooth_bar_region(
    image: &mut RgbImage,
    bar_pixels: &[(u32, u32)],
    outside: &[(u32, u32)],
    neighbor_count: usize,
) -> usize {
    if bar_pixels.is_empty() {
        return 0;
    }
    let Some(index) = NeighborIndex::new(outside) else {
        warn!(
            bar_pixels = bar_pixels.len(),
            "bar stage: region covers the whole frame, no outside pool"
        );
        return 0;
    };

    let mut replaced = 0;
    for &(x, y) in bar_pixels {
        let neighbors = index.query((x, y), neighbor_count);
        let Some(mean) = mean_color(image, &neighbors) else {
            continue;
        };
        if *image.get_pixel(x, y) != mean {
            image.put_pixel(x, y, mean);
            replaced += 1;
        }
    }
    replaced
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mean_color_floors_the_per_channel_average() {
        let mut img = RgbImage::new(2, 1);
        img.put_pixel(0, 0, Rgb([1, 10, 255]));
        img.put_pixel(1, 0, Rgb([2, 11, 254]));
        // (1+2)/2 = 1 (floor), (10+11)/2 = 10, (255+254)/2 = 254
        assert_eq!(
            mean_color(&img, &[(0, 0), (1, 0)]),
            Some(Rgb([1, 10, 254]))
        );
    }

    #[test]
    fn mean_color_of_no_neighbors_is_none() {
        let img = RgbImage::new(1, 1);
        assert_eq!(mean_color(&img, &[]), None);
    }

    #[test]
    fn white_stage_with_empty_genuine_pool_replaces_nothing() {
        let mut img = RgbImage::from_pixel(4, 4, Rgb([255, 255, 255]));
        let before = img.clone();
        let artifacts: Vec<(u32, u32)> = (0..4).flat_map(|y| (0..4).map(move |x| (x, y))).collect();
        let replaced = smooth_white_artifacts(&mut img, &artifacts, &[], 10, 2);
        assert_eq!(replaced, 0);
        assert_eq!(img, before);
    }

    #[test]
    fn white_stage_never_touches_genuine_pixels() {
        let mut img = RgbImage::from_pixel(6, 6, Rgb([40, 40, 40]));
        img.put_pixel(3, 3, Rgb([255, 255, 255]));

        let artifacts = vec![(3, 3)];
        let genuine: Vec<(u32, u32)> = (0..6)
            .flat_map(|y| (0..6).map(move |x| (x, y)))
            .filter(|&p| p != (3, 3))
            .collect();
        let before = img.clone();

        smooth_white_artifacts(&mut img, &artifacts, &genuine, 5, 2);

        for &(x, y) in &genuine {
            assert_eq!(img.get_pixel(x, y), before.get_pixel(x, y));
        }
        assert_eq!(*img.get_pixel(3, 3), Rgb([40, 40, 40]));
    }

    #[test]
    fn second_white_pass_performs_no_writes() {
        let mut once = RgbImage::from_pixel(6, 6, Rgb([40, 40, 40]));
        once.put_pixel(3, 3, Rgb([255, 255, 255]));
        let mut twice = once.clone();

        let artifacts = vec![(3, 3)];
        let genuine: Vec<(u32, u32)> = (0..6)
            .flat_map(|y| (0..6).map(move |x| (x, y)))
            .filter(|&p| p != (3, 3))
            .collect();

        let writes_once = smooth_white_artifacts(&mut once, &artifacts, &genuine, 5, 1);
        let writes_twice = smooth_white_artifacts(&mut twice, &artifacts, &genuine, 5, 2);

        assert_eq!(once, twice, "extra passes must not change the output");
        assert_eq!(writes_once, writes_twice, "pass two must write nothing");
    }

    #[test]
    fn green_stage_reads_from_stage_start_snapshot() {
        // Two adjacent green pixels: if reads leaked through writes, the
        // second replacement would observe the first one's new color. The
        // outside pool makes that impossible here, but the snapshot also
        // guards it structurally; verify both get the same outside mean.
        let mut img = RgbImage::from_pixel(4, 1, Rgb([100, 100, 100]));
        img.put_pixel(1, 0, Rgb([0, 200, 0]));
        img.put_pixel(2, 0, Rgb([0, 200, 0]));

        let artifacts = vec![(1, 0), (2, 0)];
        let outside = vec![(0, 0), (3, 0)];
        let replaced = smooth_green_artifacts(&mut img, &artifacts, &outside, 2);

        assert_eq!(replaced, 2);
        assert_eq!(*img.get_pixel(1, 0), Rgb([100, 100, 100]));
        assert_eq!(*img.get_pixel(2, 0), Rgb([100, 100, 100]));
    }

    #[test]
    fn bar_stage_overwrites_every_bar_pixel() {
        let mut img = RgbImage::from_pixel(5, 1, Rgb([60, 60, 60]));
        img.put_pixel(2, 0, Rgb([0, 0, 0]));

        let bar = vec![(2, 0)];
        let outside = vec![(0, 0), (1, 0), (3, 0), (4, 0)];
        let replaced = smooth_bar_region(&mut img, &bar, &outside, 10);

        assert_eq!(replaced, 1);
        assert_eq!(*img.get_pixel(2, 0), Rgb([60, 60, 60]));
    }

    #[test]
    fn stage_write_counts_skip_identical_means() {
        // An artifact pixel already equal to the neighbor mean is not a write.
        let mut img = RgbImage::from_pixel(3, 1, Rgb([80, 80, 80]));
        let bar = vec![(1, 0)];
        let outside = vec![(0, 0), (2, 0)];
        let replaced = smooth_bar_region(&mut img, &bar, &outside, 5);
        assert_eq!(replaced, 0);
    }
}
