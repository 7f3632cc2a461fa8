// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Analyzer configuration.

use serde::{Deserialize, Serialize};

/// Tunables for the frame-analysis pipeline.
///
/// The defaults are load-bearing: detection quality and the capture debounce
/// were calibrated against them, and hosts that change them give up
/// behavioral compatibility with the reference scanner.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalyzerConfig {
    /// Minimum enclosed contour area (in source-buffer pixel units) for a
    /// quadrilateral to qualify as a document candidate.
    pub min_candidate_area: f64,
    /// Polygon simplification tolerance, as a fraction of the closed
    /// contour's perimeter.
    pub approx_tolerance_ratio: f64,
    /// Gaussian blur kernel size (odd).
    pub gaussian_kernel: u32,
    /// Median blur kernel size (odd).
    pub median_kernel: u32,
    /// Canny low hysteresis threshold.
    pub canny_low: f32,
    /// Canny high hysteresis threshold.
    pub canny_high: f32,
    /// Radius of the elliptical structuring element used by the
    /// morphological cleanup (radius 2 = a 5x5 ellipse).
    pub morph_radius: u8,
    /// Consecutive qualifying frames required before a capture triggers.
    pub stability_threshold: u32,
    /// Delay after a successful export before the gate re-arms.
    pub cooldown_ms: u64,
    /// JPEG quality for exported documents (100 = no lossy degradation).
    pub jpeg_quality: u8,
    /// Mirror the rectified output horizontally (front-facing capture
    /// convention).
    pub mirror_output: bool,
}

impl Default for AnalyzerConfig {
    fn default() -> Self {
        Self {
            min_candidate_area: 5000.0,
            approx_tolerance_ratio: 0.02,
            gaussian_kernel: 5,
            median_kernel: 9,
            canny_low: 10.0,
            canny_high: 200.0,
            morph_radius: 2,
            stability_threshold: 20,
            cooldown_ms: 1000,
            jpeg_quality: 100,
            mirror_output: true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_reference_tunables() {
        let config = AnalyzerConfig::default();
        assert_eq!(config.min_candidate_area, 5000.0);
        assert_eq!(config.approx_tolerance_ratio, 0.02);
        assert_eq!(config.gaussian_kernel, 5);
        assert_eq!(config.median_kernel, 9);
        assert_eq!(config.canny_low, 10.0);
        assert_eq!(config.canny_high, 200.0);
        assert_eq!(config.morph_radius, 2);
        assert_eq!(config.stability_threshold, 20);
        assert_eq!(config.cooldown_ms, 1000);
        assert_eq!(config.jpeg_quality, 100);
        assert!(config.mirror_output);
    }

    #[test]
    fn round_trips_through_json() {
        let config = AnalyzerConfig::default();
        let json = serde_json::to_string(&config).expect("serialize");
        let back: AnalyzerConfig = serde_json::from_str(&json).expect("deserialize");
        assert_eq!(back.stability_threshold, config.stability_threshold);
        assert_eq!(back.min_candidate_area, config.min_candidate_area);
        assert_eq!(back.cooldown_ms, config.cooldown_ms);
    }
}
