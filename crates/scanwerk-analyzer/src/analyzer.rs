// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// DocumentAnalyzer — the synchronous per-frame pipeline behind a single
// explicit entry point: submit a frame, get back the analysis.
//
// Frames run conversion → edge map → candidate selection → stability gate →
// (on trigger) rectification + export dispatch → overlay → rotation, all on
// the caller's thread. Only the export itself is asynchronous, and its
// completion re-enters the gate through the event channel drained at the top
// of each call.

use image::RgbaImage;
use scanwerk_core::config::AnalyzerConfig;
use scanwerk_core::error::Result;
use scanwerk_core::types::{CaptureId, Frame};
use tokio::sync::mpsc::{UnboundedReceiver, UnboundedSender};
use tracing::{debug, info, instrument, warn};

use crate::contours::{self, QuadCandidate};
use crate::convert;
use crate::edges;
use crate::gate::{gate_channel, CaptureTicket, GateEvent, GateSnapshot, StabilityGate};
use crate::overlay;
use crate::rectify::{self, RectifiedDocument};

/// Capability the host registers once to receive rectified documents.
///
/// `dispatch` must not block the analysis thread: implementations hand the
/// document to their own executor and resolve the ticket when the export
/// finishes (or fails).
pub trait CaptureSink: Send + Sync {
    fn dispatch(&self, document: RectifiedDocument, ticket: CaptureTicket);
}

/// Per-frame analysis outcome returned to the host.
#[derive(Debug)]
pub struct FrameAnalysis {
    /// The converted frame with the candidate overlay and the source's
    /// rotation hint applied — ready for the preview surface.
    pub preview: RgbaImage,
    /// The qualifying quadrilateral found this frame, if any.
    pub candidate: Option<QuadCandidate>,
    /// Gate state after this frame.
    pub gate: GateSnapshot,
    /// Id of the capture cycle this frame started, if it triggered one.
    pub capture: Option<CaptureId>,
}

/// The frame analyzer. Owns all detection state for its lifetime; one
/// instance serves one camera session.
pub struct DocumentAnalyzer {
    config: AnalyzerConfig,
    gate: StabilityGate,
    events: UnboundedReceiver<GateEvent>,
    control: UnboundedSender<GateEvent>,
    sink: Box<dyn CaptureSink>,
}

impl DocumentAnalyzer {
    pub fn new(config: AnalyzerConfig, sink: Box<dyn CaptureSink>) -> Self {
        let (control, events) = gate_channel();
        let gate = StabilityGate::new(config.stability_threshold);
        Self {
            config,
            gate,
            events,
            control,
            sink,
        }
    }

    /// Analyze one frame.
    ///
    /// Unsupported pixel formats and conversion failures return an error
    /// without mutating any detection state — the frame is simply skipped.
    /// Failures in the capture branch never surface here; they re-arm the
    /// gate and the frame still produces a normal analysis.
    #[instrument(skip_all, fields(width = frame.width, height = frame.height))]
    pub fn submit_frame(&mut self, frame: Frame) -> Result<FrameAnalysis> {
        self.drain_gate_events();

        let mut working = convert::rgba_from_frame(&frame)?;
        let mask = edges::edge_mask(&working, &self.config);

        // Walk the ranked contours: the first qualifying one is the frame's
        // candidate; every non-qualifying contour examined before it halves
        // the stability counter.
        let mut candidate = None;
        let mut capture = None;
        for contour in contours::ranked_outer_contours(&mask) {
            match contours::qualify(&contour, &self.config) {
                Some(quad) => {
                    if self.gate.record_hit() {
                        capture = self.start_capture(&working, &quad);
                    }
                    candidate = Some(quad);
                    break;
                }
                None => self.gate.decay(),
            }
        }

        if let Some(quad) = &candidate {
            overlay::render_candidate(&mut working, quad);
        }
        let preview = overlay::rotate_preview(working, frame.rotation_degrees);

        Ok(FrameAnalysis {
            preview,
            candidate,
            gate: self.gate.snapshot(),
            capture,
        })
    }

    /// Current gate state, without submitting a frame.
    pub fn gate(&self) -> GateSnapshot {
        self.gate.snapshot()
    }

    /// Rectify the stable candidate and hand the document to the export
    /// boundary. Rectification failures re-arm the gate immediately and are
    /// isolated from the per-frame path.
    fn start_capture(&mut self, working: &RgbaImage, quad: &QuadCandidate) -> Option<CaptureId> {
        self.gate.begin_capture();

        let id = CaptureId::new();
        let corners = quad.corners.map(|p| (p.x as f32, p.y as f32));
        match rectify::rectify(working, corners, id, &self.config) {
            Ok(document) => {
                info!(
                    capture_id = %id,
                    width = document.width(),
                    height = document.height(),
                    "capture triggered"
                );
                let ticket = CaptureTicket::new(id, self.control.clone());
                self.sink.dispatch(document, ticket);
                Some(id)
            }
            Err(err) => {
                warn!(capture_id = %id, "rectification failed: {err}");
                self.gate.rearm();
                None
            }
        }
    }

    /// Apply pending re-arm events from the export boundary. This is the
    /// only place export completions touch gate state, and it runs on the
    /// analysis thread.
    fn drain_gate_events(&mut self) {
        while let Ok(event) = self.events.try_recv() {
            match event {
                GateEvent::Rearm { id, success } => {
                    if success {
                        debug!(capture_id = %id, "capture cycle complete, gate re-armed");
                    } else {
                        debug!(capture_id = %id, "capture cycle failed, gate re-armed");
                    }
                    self.gate.rearm();
                }
            }
        }
    }
}
