// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Overlay renderer — candidate outline + translucent fill drawn back onto
// the working buffer for live feedback, plus the rotation hint applied to
// the preview before it crosses the UI boundary.

use image::{imageops, Rgba, RgbaImage};
use imageproc::drawing::{draw_antialiased_line_segment_mut, draw_polygon_mut};
use imageproc::geometric_transformations::{rotate_about_center, Interpolation};
use imageproc::pixelops::interpolate;
use imageproc::point::Point;

use crate::contours::QuadCandidate;

/// Opaque highlight used for the candidate outline and fill.
const HIGHLIGHT: Rgba<u8> = Rgba([0, 0, 255, 255]);

/// Blend weight of the translucent fill.
const FILL_WEIGHT: f32 = 0.5;

/// Draw the candidate onto the working buffer: an anti-aliased closed
/// outline, then a translucent fill of the same region composited over the
/// frame. Purely visual; never part of the capture decision.
pub fn render_candidate(frame: &mut RgbaImage, candidate: &QuadCandidate) {
    let corners = candidate.corners;

    for i in 0..4 {
        let a = corners[i];
        let b = corners[(i + 1) % 4];
        draw_antialiased_line_segment_mut(frame, (a.x, a.y), (b.x, b.y), HIGHLIGHT, interpolate);
    }

    // Fill goes through a separate mask so the blend weight applies to the
    // region as a whole, matching the source's weighted-add composite.
    let mut mask = RgbaImage::new(frame.width(), frame.height());
    let polygon: Vec<Point<i32>> = corners.to_vec();
    draw_polygon_mut(&mut mask, &polygon, HIGHLIGHT);

    for (dst, src) in frame.pixels_mut().zip(mask.pixels()) {
        for channel in 0..4 {
            let weighted = (src.0[channel] as f32 * FILL_WEIGHT) as u8;
            dst.0[channel] = dst.0[channel].saturating_add(weighted);
        }
    }
}

/// Apply the frame source's rotation hint to the preview.
///
/// Quarter turns are lossless; any other hint falls back to a bilinear
/// rotation about the center.
pub fn rotate_preview(frame: RgbaImage, degrees: i32) -> RgbaImage {
    match degrees.rem_euclid(360) {
        0 => frame,
        90 => imageops::rotate90(&frame),
        180 => imageops::rotate180(&frame),
        270 => imageops::rotate270(&frame),
        other => rotate_about_center(
            &frame,
            (other as f32).to_radians(),
            Interpolation::Bilinear,
            Rgba([0, 0, 0, 255]),
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn candidate() -> QuadCandidate {
        QuadCandidate {
            corners: [
                Point::new(20, 20),
                Point::new(80, 20),
                Point::new(80, 70),
                Point::new(20, 70),
            ],
            area: 3000.0,
        }
    }

    #[test]
    fn fill_brightens_the_candidate_interior_only() {
        let mut frame = RgbaImage::from_pixel(100, 100, Rgba([40, 40, 40, 255]));
        render_candidate(&mut frame, &candidate());

        // Interior picks up half the highlight on the blue channel.
        let inside = frame.get_pixel(50, 45);
        assert!(inside.0[2] > 150, "inside {inside:?}");
        assert_eq!(inside.0[0], 40);

        // Pixels outside the quad are untouched.
        let outside = frame.get_pixel(5, 5);
        assert_eq!(*outside, Rgba([40, 40, 40, 255]));
    }

    #[test]
    fn outline_touches_the_corner_pixels() {
        let mut frame = RgbaImage::from_pixel(100, 100, Rgba([40, 40, 40, 255]));
        render_candidate(&mut frame, &candidate());

        let corner = frame.get_pixel(20, 20);
        assert!(corner.0[2] > 100, "corner {corner:?}");
    }

    #[test]
    fn quarter_turns_swap_dimensions() {
        let frame = RgbaImage::new(60, 40);
        assert_eq!(rotate_preview(frame.clone(), 0).dimensions(), (60, 40));
        assert_eq!(rotate_preview(frame.clone(), 90).dimensions(), (40, 60));
        assert_eq!(rotate_preview(frame.clone(), 180).dimensions(), (60, 40));
        assert_eq!(rotate_preview(frame, 270).dimensions(), (40, 60));
    }

    #[test]
    fn rotation_moves_a_marker_pixel() {
        let mut frame = RgbaImage::from_pixel(40, 20, Rgba([0, 0, 0, 255]));
        frame.put_pixel(0, 0, Rgba([255, 255, 255, 255]));

        let rotated = rotate_preview(frame, 90);
        // Top-left lands at top-right under a clockwise quarter turn.
        assert_eq!(*rotated.get_pixel(19, 0), Rgba([255, 255, 255, 255]));
    }
}
