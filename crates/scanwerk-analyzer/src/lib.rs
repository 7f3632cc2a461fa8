// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// scanwerk-analyzer — Live document-detection pipeline.
//
// Converts planar camera frames into a packed working buffer, builds a binary
// edge mask, selects a quadrilateral candidate, debounces detections through
// a stability gate, and rectifies the detected document with a perspective
// warp. The per-frame path is fully synchronous; only the export boundary
// (see scanwerk-export) runs off the analysis thread.

pub mod analyzer;
pub mod contours;
pub mod convert;
pub mod edges;
pub mod gate;
pub mod overlay;
pub mod rectify;

pub use analyzer::{CaptureSink, DocumentAnalyzer, FrameAnalysis};
pub use contours::QuadCandidate;
pub use gate::{CaptureTicket, GateSnapshot, StabilityGate};
pub use rectify::{OrderedQuad, RectifiedDocument};
