// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Edge-map builder — grayscale, blur, Canny, and morphological cleanup.
// Stateless and deterministic; the stage order and parameters are fixed for
// behavioral compatibility with the reference scanner.

use image::{GrayImage, RgbaImage};
use imageproc::distance_transform::Norm;
use imageproc::edges::canny;
use imageproc::filter::{gaussian_blur_f32, median_filter};
use imageproc::morphology::{close, dilate, erode};
use scanwerk_core::config::AnalyzerConfig;
use tracing::{debug, instrument};

/// Build the binary edge mask for one working buffer.
///
/// Fixed pipeline: grayscale → Gaussian blur (5x5) → median blur (kernel 9)
/// → Canny 10/200 → morphological close → dilate → erode, all with the
/// elliptical 5x5 structuring element.
#[instrument(skip(buffer, config), fields(width = buffer.width(), height = buffer.height()))]
pub fn edge_mask(buffer: &RgbaImage, config: &AnalyzerConfig) -> GrayImage {
    let gray = image::imageops::grayscale(buffer);

    let blurred = gaussian_blur_f32(&gray, kernel_sigma(config.gaussian_kernel));
    let median_radius = config.median_kernel / 2;
    let smoothed = median_filter(&blurred, median_radius, median_radius);

    let edges = canny(&smoothed, config.canny_low, config.canny_high);

    // Close gaps in the detected edges, then dilate and erode once with the
    // same element.
    let closed = close(&edges, Norm::L2, config.morph_radius);
    let dilated = dilate(&closed, Norm::L2, config.morph_radius);
    let mask = erode(&dilated, Norm::L2, config.morph_radius);

    debug!("edge mask built");
    mask
}

/// Sigma the source vision library derives from an odd Gaussian kernel size
/// when none is given: `0.3 * ((k - 1) / 2 - 1) + 0.8`.
fn kernel_sigma(kernel: u32) -> f32 {
    0.3 * ((kernel as f32 - 1.0) * 0.5 - 1.0) + 0.8
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgba;

    /// Dark buffer with a bright axis-aligned rectangle.
    fn rectangle_buffer(width: u32, height: u32, x0: u32, y0: u32, x1: u32, y1: u32) -> RgbaImage {
        let mut buffer = RgbaImage::from_pixel(width, height, Rgba([30, 30, 30, 255]));
        for y in y0..y1 {
            for x in x0..x1 {
                buffer.put_pixel(x, y, Rgba([210, 210, 210, 255]));
            }
        }
        buffer
    }

    #[test]
    fn five_by_five_kernel_sigma() {
        assert!((kernel_sigma(5) - 1.1).abs() < 1e-6);
    }

    #[test]
    fn mask_preserves_dimensions() {
        let buffer = rectangle_buffer(160, 120, 40, 30, 120, 90);
        let mask = edge_mask(&buffer, &AnalyzerConfig::default());
        assert_eq!(mask.dimensions(), (160, 120));
    }

    #[test]
    fn mask_is_deterministic() {
        let buffer = rectangle_buffer(160, 120, 40, 30, 120, 90);
        let config = AnalyzerConfig::default();
        assert_eq!(edge_mask(&buffer, &config), edge_mask(&buffer, &config));
    }

    #[test]
    fn rectangle_produces_edges_at_its_border_only() {
        let buffer = rectangle_buffer(200, 160, 50, 40, 150, 120);
        let mask = edge_mask(&buffer, &AnalyzerConfig::default());

        // Some response near the left border of the rectangle...
        let near_border = (45..56).any(|x| (60..100).any(|y| mask.get_pixel(x, y).0[0] > 0));
        assert!(near_border, "expected edge response near x=50");

        // ...and none deep inside the uniform interior.
        let deep_inside = (90..110).any(|x| (70..90).any(|y| mask.get_pixel(x, y).0[0] > 0));
        assert!(!deep_inside, "uniform interior must stay empty");
    }
}
