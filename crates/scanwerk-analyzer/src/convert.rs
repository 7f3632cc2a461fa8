// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Color-plane converter — turns a planar YUV 4:2:0 frame into the packed
// RGBA working buffer the rest of the pipeline operates on.

use image::{Rgba, RgbaImage};
use scanwerk_core::error::{Result, ScanwerkError};
use scanwerk_core::types::{Frame, Plane};
use tracing::{debug, instrument};

/// Convert a planar YUV 4:2:0 frame into a packed RGBA buffer.
///
/// Two physical chroma layouts are handled. When the chroma planes are
/// interleaved views over shared memory (`pixel_stride == 2`) the samples are
/// read in a single pass directly from the plane views. When the chroma
/// planes are separate (`pixel_stride == 1`) they may carry per-row padding,
/// so the planes are first repacked into a contiguous I420 buffer — one bulk
/// copy per plane when the row stride equals the row width, a row-by-row
/// copy otherwise — and converted from there.
///
/// Any format other than the supported planar layout is rejected; the caller
/// skips the frame without touching analyzer state.
#[instrument(skip(frame), fields(width = frame.width, height = frame.height, format = ?frame.format))]
pub fn rgba_from_frame(frame: &Frame) -> Result<RgbaImage> {
    if !frame.format.is_supported() || frame.planes.len() != 3 {
        return Err(ScanwerkError::UnsupportedPixelFormat(format!(
            "{:?} with {} planes",
            frame.format,
            frame.planes.len()
        )));
    }

    let width = frame.width as usize;
    let height = frame.height as usize;
    check_plane(&frame.planes[0], width, height, "luma")?;
    check_plane(&frame.planes[1], width / 2, height / 2, "chroma U")?;
    check_plane(&frame.planes[2], width / 2, height / 2, "chroma V")?;

    if frame.planes[1].pixel_stride == 2 {
        debug!("interleaved chroma planes, converting in place");
        Ok(rgba_from_semi_planar(frame))
    } else {
        debug!("separate chroma planes, repacking to I420");
        Ok(rgba_from_planar(frame))
    }
}

/// Verify a plane is large enough for its nominal sample grid.
fn check_plane(plane: &Plane, cols: usize, rows: usize, name: &str) -> Result<()> {
    if cols == 0 || rows == 0 {
        return Err(ScanwerkError::ColorConversion(format!(
            "{name} plane has an empty sample grid"
        )));
    }
    let needed = (rows - 1) * plane.row_stride + (cols - 1) * plane.pixel_stride + 1;
    if plane.data.len() < needed {
        return Err(ScanwerkError::ColorConversion(format!(
            "{name} plane holds {} bytes, needs {needed}",
            plane.data.len()
        )));
    }
    Ok(())
}

/// Fast path: chroma samples sit interleaved in shared memory, with each
/// plane view starting at its own semantic sample. Reading U from plane 1
/// and V from plane 2 at their declared strides is therefore correct for
/// both NV12 and NV21 physical orders.
fn rgba_from_semi_planar(frame: &Frame) -> RgbaImage {
    let (width, height) = (frame.width, frame.height);
    let y_plane = &frame.planes[0];
    let u_plane = &frame.planes[1];
    let v_plane = &frame.planes[2];

    RgbaImage::from_fn(width, height, |x, y| {
        let (x, y) = (x as usize, y as usize);
        let luma = y_plane.data[y * y_plane.row_stride + x * y_plane.pixel_stride];
        let chroma_row = y / 2;
        let chroma_col = x / 2;
        let u = u_plane.data[chroma_row * u_plane.row_stride + chroma_col * u_plane.pixel_stride];
        let v = v_plane.data[chroma_row * v_plane.row_stride + chroma_col * v_plane.pixel_stride];
        yuv_to_rgba(luma, u, v)
    })
}

/// Slow path: repack the padded planar layout into one contiguous I420
/// buffer, then convert.
fn rgba_from_planar(frame: &Frame) -> RgbaImage {
    let width = frame.width as usize;
    let height = frame.height as usize;
    let chroma_width = width / 2;
    let chroma_height = height / 2;

    let mut packed = Vec::with_capacity(width * height + 2 * chroma_width * chroma_height);
    copy_plane(&mut packed, &frame.planes[0], width, height);
    copy_plane(&mut packed, &frame.planes[1], chroma_width, chroma_height);
    copy_plane(&mut packed, &frame.planes[2], chroma_width, chroma_height);

    let y_base = 0;
    let u_base = width * height;
    let v_base = u_base + chroma_width * chroma_height;

    RgbaImage::from_fn(frame.width, frame.height, |x, y| {
        let (x, y) = (x as usize, y as usize);
        let luma = packed[y_base + y * width + x];
        let u = packed[u_base + (y / 2) * chroma_width + x / 2];
        let v = packed[v_base + (y / 2) * chroma_width + x / 2];
        yuv_to_rgba(luma, u, v)
    })
}

/// Append a plane's payload to `packed`, dropping any per-row padding.
fn copy_plane(packed: &mut Vec<u8>, plane: &Plane, cols: usize, rows: usize) {
    if plane.row_stride == cols {
        // Stride equals the row width: the whole plane copies in one go.
        packed.extend_from_slice(&plane.data[..cols * rows]);
    } else {
        for row in 0..rows {
            let start = row * plane.row_stride;
            packed.extend_from_slice(&plane.data[start..start + cols]);
        }
    }
}

/// BT.601 video-range YUV to RGBA, the conversion the camera stack applies
/// to 4:2:0 frames.
fn yuv_to_rgba(y: u8, u: u8, v: u8) -> Rgba<u8> {
    let c = 1.164 * (y as f32 - 16.0);
    let d = u as f32 - 128.0;
    let e = v as f32 - 128.0;

    let r = c + 1.596 * e;
    let g = c - 0.813 * e - 0.391 * d;
    let b = c + 2.018 * d;

    Rgba([clamp_channel(r), clamp_channel(g), clamp_channel(b), 255])
}

fn clamp_channel(value: f32) -> u8 {
    value.clamp(0.0, 255.0) as u8
}
