// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Rectifier — canonical corner ordering, target sizing from measured edge
// lengths, and the perspective warp that flattens the detected document.

use image::{imageops, Rgba, RgbaImage};
use imageproc::geometric_transformations::{warp_into, Interpolation, Projection};
use scanwerk_core::config::AnalyzerConfig;
use scanwerk_core::error::{Result, ScanwerkError};
use scanwerk_core::types::CaptureId;
use tracing::{debug, instrument};

/// Corner points of a quadrilateral in canonical order.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OrderedQuad {
    pub top_left: (f32, f32),
    pub top_right: (f32, f32),
    pub bottom_right: (f32, f32),
    pub bottom_left: (f32, f32),
}

/// Perspective-rectified output of one capture cycle. Dimensions are
/// non-zero by construction; ownership moves to the export boundary
/// immediately after creation.
#[derive(Debug, Clone)]
pub struct RectifiedDocument {
    pub id: CaptureId,
    pub image: RgbaImage,
}

impl RectifiedDocument {
    pub fn width(&self) -> u32 {
        self.image.width()
    }

    pub fn height(&self) -> u32 {
        self.image.height()
    }
}

/// Label four arbitrary image-plane points.
///
/// Top-left has the smallest x+y, bottom-right the largest; top-right has
/// the smallest x−y, bottom-left the largest. Deterministic and
/// permutation-invariant; ties resolve to whichever point is found first.
pub fn order_corners(points: [(f32, f32); 4]) -> OrderedQuad {
    let sum = |p: (f32, f32)| p.0 + p.1;
    let diff = |p: (f32, f32)| p.0 - p.1;

    let mut top_left = points[0];
    let mut bottom_right = points[0];
    let mut top_right = points[0];
    let mut bottom_left = points[0];

    for &p in &points[1..] {
        if sum(p) < sum(top_left) {
            top_left = p;
        }
        if sum(p) > sum(bottom_right) {
            bottom_right = p;
        }
        if diff(p) < diff(top_right) {
            top_right = p;
        }
        if diff(p) > diff(bottom_left) {
            bottom_left = p;
        }
    }

    OrderedQuad {
        top_left,
        top_right,
        bottom_right,
        bottom_left,
    }
}

/// Output rectangle dimensions: the longer of the two horizontal edges by
/// the longer of the two vertical edges, truncated to integers.
pub fn target_size(quad: &OrderedQuad) -> (u32, u32) {
    let top = distance(quad.top_left, quad.top_right);
    let bottom = distance(quad.bottom_left, quad.bottom_right);
    let width = top.max(bottom) as u32;

    let right = distance(quad.top_right, quad.bottom_right);
    let left = distance(quad.top_left, quad.bottom_left);
    let height = right.max(left) as u32;

    (width, height)
}

fn distance(a: (f32, f32), b: (f32, f32)) -> f32 {
    ((b.0 - a.0).powi(2) + (b.1 - a.1).powi(2)).sqrt()
}

/// Warp the working buffer so the quadrilateral spanned by `corners` fills
/// an axis-aligned output rectangle sized from its measured edge lengths.
///
/// A zero-size target or a corner set with no projective transform (e.g.
/// collinear points) fails the capture cycle with
/// `ScanwerkError::DegenerateQuadrilateral`; the caller treats that like an
/// export failure and re-arms without propagating further.
#[instrument(skip(buffer, corners, config), fields(capture_id = %id))]
pub fn rectify(
    buffer: &RgbaImage,
    corners: [(f32, f32); 4],
    id: CaptureId,
    config: &AnalyzerConfig,
) -> Result<RectifiedDocument> {
    let quad = order_corners(corners);
    let (width, height) = target_size(&quad);
    if width == 0 || height == 0 {
        return Err(ScanwerkError::DegenerateQuadrilateral(format!(
            "target size {width}x{height}"
        )));
    }

    let src = [
        quad.top_left,
        quad.top_right,
        quad.bottom_right,
        quad.bottom_left,
    ];
    let dest: [(f32, f32); 4] = [
        (0.0, 0.0),
        (width as f32, 0.0),
        (width as f32, height as f32),
        (0.0, height as f32),
    ];

    let projection = Projection::from_control_points(src, dest).ok_or_else(|| {
        ScanwerkError::DegenerateQuadrilateral("no projective transform for corner set".into())
    })?;

    let mut output = RgbaImage::new(width, height);
    warp_into(
        buffer,
        &projection,
        Interpolation::Bilinear,
        Rgba([0, 0, 0, 255]),
        &mut output,
    );

    // Front-facing capture convention: the sensor image arrives mirrored.
    let image = if config.mirror_output {
        imageops::flip_horizontal(&output)
    } else {
        output
    };

    debug!(width, height, "document rectified");
    Ok(RectifiedDocument { id, image })
}
