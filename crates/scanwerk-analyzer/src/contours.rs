// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Contour extraction and quadrilateral candidate selection.

use image::GrayImage;
use imageproc::contours::{find_contours, BorderType};
use imageproc::geometry::{approximate_polygon_dp, arc_length};
use imageproc::point::Point;
use scanwerk_core::config::AnalyzerConfig;

/// A contour simplified to exactly four corners that cleared the minimum
/// area threshold — the document candidate for one frame.
#[derive(Debug, Clone, PartialEq)]
pub struct QuadCandidate {
    pub corners: [Point<i32>; 4],
    /// Enclosed area of the *original* contour, in source-buffer pixel units.
    pub area: f64,
}

/// Extract the outermost closed boundaries from an edge mask, sorted by
/// enclosed area, largest first.
pub fn ranked_outer_contours(mask: &GrayImage) -> Vec<Vec<Point<i32>>> {
    let mut ranked: Vec<(f64, Vec<Point<i32>>)> = find_contours::<i32>(mask)
        .into_iter()
        .filter(|c| c.border_type == BorderType::Outer && c.parent.is_none())
        .map(|c| (contour_area(&c.points), c.points))
        .collect();

    ranked.sort_by(|a, b| b.0.partial_cmp(&a.0).unwrap_or(std::cmp::Ordering::Equal));
    ranked.into_iter().map(|(_, points)| points).collect()
}

/// Test one contour against the candidate criteria: the Douglas-Peucker
/// simplification (tolerance = `approx_tolerance_ratio` of the closed
/// perimeter) must collapse it to exactly four points, and the original
/// contour's area must exceed `min_candidate_area`.
pub fn qualify(points: &[Point<i32>], config: &AnalyzerConfig) -> Option<QuadCandidate> {
    let area = contour_area(points);
    let epsilon = arc_length(points, true) * config.approx_tolerance_ratio;
    let simplified = approximate_polygon_dp(points, epsilon, true);

    if simplified.len() == 4 && area > config.min_candidate_area {
        Some(QuadCandidate {
            corners: [simplified[0], simplified[1], simplified[2], simplified[3]],
            area,
        })
    } else {
        None
    }
}

/// Shoelace area of a closed contour.
pub fn contour_area(points: &[Point<i32>]) -> f64 {
    if points.len() < 3 {
        return 0.0;
    }
    let mut doubled = 0i64;
    for i in 0..points.len() {
        let a = points[i];
        let b = points[(i + 1) % points.len()];
        doubled += a.x as i64 * b.y as i64 - b.x as i64 * a.y as i64;
    }
    (doubled.abs() as f64) / 2.0
}
