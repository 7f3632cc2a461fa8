// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Unified error types for Scanwerk.

use thiserror::Error;

/// Top-level error type for all Scanwerk operations.
#[derive(Debug, Error)]
pub enum ScanwerkError {
    // -- Frame intake errors --
    #[error("unsupported pixel format: {0}")]
    UnsupportedPixelFormat(String),

    #[error("color-plane conversion failed: {0}")]
    ColorConversion(String),

    // -- Capture errors --
    #[error("degenerate quadrilateral: {0}")]
    DegenerateQuadrilateral(String),

    #[error("image encoding failed: {0}")]
    Encoding(String),

    #[error("capture export failed: {0}")]
    Export(String),

    // -- Storage / persistence --
    #[error("file I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Alias used throughout the codebase.
pub type Result<T> = std::result::Result<T, ScanwerkError>;
