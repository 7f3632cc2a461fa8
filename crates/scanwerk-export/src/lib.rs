// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// scanwerk-export — The capture exporter boundary.
//
// Receives rectified documents from the analyzer, persists them to disk as
// maximal-quality JPEGs off the analysis thread, notifies the registered
// capture listener, and owns the cooldown that gates re-arming.

pub mod exporter;
pub mod listener;

pub use exporter::DiskExporter;
pub use listener::CaptureListener;
