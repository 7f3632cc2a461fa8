// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Core domain types for the Scanwerk document scanner.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use uuid::Uuid;

/// Unique identifier for one capture cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CaptureId(pub Uuid);

impl CaptureId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for CaptureId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for CaptureId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Pixel formats a frame source may deliver.
///
/// Only the planar YUV 4:2:0 layout is analyzable; frames in any other
/// format are skipped without touching analyzer state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PixelFormat {
    /// Planar luma + two chroma planes, 2x2 subsampled.
    Yuv420,
    /// Compressed still frame (not analyzable).
    Jpeg,
    /// Unprocessed sensor data (not analyzable).
    RawSensor,
    /// Opaque device-private layout (not analyzable).
    Private,
}

impl PixelFormat {
    /// Whether the analyzer can consume frames in this format.
    pub fn is_supported(&self) -> bool {
        matches!(self, Self::Yuv420)
    }
}

/// One plane of a planar frame.
///
/// `row_stride` is the byte distance between the starts of consecutive rows
/// (it may exceed the row's payload when the source pads rows); `pixel_stride`
/// is the byte distance between consecutive samples within a row (2 when the
/// chroma planes are interleaved views over shared memory).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Plane {
    pub data: Vec<u8>,
    pub row_stride: usize,
    pub pixel_stride: usize,
}

impl Plane {
    /// A tightly packed plane (stride = width, one byte per sample).
    pub fn packed(data: Vec<u8>, width: usize) -> Self {
        Self {
            data,
            row_stride: width,
            pixel_stride: 1,
        }
    }
}

/// One analyzer input tick: a single frame from the camera source.
///
/// A frame is owned exclusively by the analyzer for the duration of one
/// analysis call and released when the call returns.
#[derive(Debug, Clone)]
pub struct Frame {
    pub width: u32,
    pub height: u32,
    pub format: PixelFormat,
    /// Rotation the source asks to be applied to preview output, in degrees.
    pub rotation_degrees: i32,
    pub planes: Vec<Plane>,
}

impl Frame {
    pub fn new(
        width: u32,
        height: u32,
        format: PixelFormat,
        rotation_degrees: i32,
        planes: Vec<Plane>,
    ) -> Self {
        Self {
            width,
            height,
            format,
            rotation_degrees,
            planes,
        }
    }
}

/// Record of a persisted capture, handed to the registered listener.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CaptureReceipt {
    pub id: CaptureId,
    /// Where the encoded document was written.
    pub path: PathBuf,
    /// SHA-256 of the encoded bytes, lowercase hex.
    pub sha256: String,
    pub width: u32,
    pub height: u32,
    pub created_at: DateTime<Utc>,
}
