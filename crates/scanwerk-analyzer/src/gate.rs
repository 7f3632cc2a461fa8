// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Stability gate — the debounce state machine that decides when a detection
// has persisted long enough to trust, and keeps at most one capture cycle in
// flight.
//
// The gate itself is plain owned state; it is only ever mutated by the
// analysis thread. The asynchronous export side cannot touch it directly —
// it resolves a `CaptureTicket`, which enqueues a re-arm event that the
// analysis thread applies at the top of its next frame. That single
// serialization point makes the cross-thread re-arm race impossible by
// construction.

use scanwerk_core::types::CaptureId;
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc::{unbounded_channel, UnboundedReceiver, UnboundedSender};
use tracing::warn;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum GateState {
    /// Armed; counting consecutive qualifying frames.
    Idle,
    /// A capture is in progress or cooling down; hits are ignored.
    Capturing,
}

/// Point-in-time view of the gate, reported with every frame analysis.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct GateSnapshot {
    pub count: u32,
    pub armed: bool,
}

/// Debounce state machine requiring `threshold` consecutive qualifying
/// frames before committing to a capture.
#[derive(Debug)]
pub struct StabilityGate {
    count: u32,
    state: GateState,
    threshold: u32,
}

impl StabilityGate {
    pub fn new(threshold: u32) -> Self {
        Self {
            count: 0,
            state: GateState::Idle,
            threshold,
        }
    }

    /// Record a qualifying candidate. Returns `true` exactly when the count
    /// reaches the threshold while armed — the signal to begin a capture.
    /// Hits while a capture is in flight are ignored.
    pub fn record_hit(&mut self) -> bool {
        if self.state != GateState::Idle {
            return false;
        }
        if self.count < self.threshold {
            self.count += 1;
        }
        self.count == self.threshold
    }

    /// Halve the count (integer division). Applied once per examined
    /// non-qualifying contour, not once per frame — a deliberate decay
    /// rather than a hard reset.
    pub fn decay(&mut self) {
        self.count /= 2;
    }

    /// Disarm for the duration of one capture cycle.
    pub fn begin_capture(&mut self) {
        self.state = GateState::Capturing;
    }

    /// Return to `Idle` with the count reset; the next stable sequence
    /// starts from zero.
    pub fn rearm(&mut self) {
        self.count = 0;
        self.state = GateState::Idle;
    }

    pub fn armed(&self) -> bool {
        self.state == GateState::Idle
    }

    pub fn count(&self) -> u32 {
        self.count
    }

    pub fn snapshot(&self) -> GateSnapshot {
        GateSnapshot {
            count: self.count,
            armed: self.armed(),
        }
    }
}

/// Event funneled back from the export boundary to the analysis thread.
#[derive(Debug)]
pub(crate) enum GateEvent {
    Rearm { id: CaptureId, success: bool },
}

pub(crate) fn gate_channel() -> (UnboundedSender<GateEvent>, UnboundedReceiver<GateEvent>) {
    unbounded_channel()
}

/// Single-use completion handle for one capture cycle.
///
/// The export boundary resolves it exactly once: `completed` after a
/// successful persist (the exporter owns the cooldown delay beforehand), or
/// `failed` immediately on any error so the gate can retry on the next
/// stable sequence.
#[derive(Debug)]
pub struct CaptureTicket {
    id: CaptureId,
    tx: UnboundedSender<GateEvent>,
}

impl CaptureTicket {
    pub(crate) fn new(id: CaptureId, tx: UnboundedSender<GateEvent>) -> Self {
        Self { id, tx }
    }

    pub fn id(&self) -> CaptureId {
        self.id
    }

    pub fn completed(self) {
        let _ = self.tx.send(GateEvent::Rearm {
            id: self.id,
            success: true,
        });
    }

    pub fn failed(self, reason: &str) {
        warn!(capture_id = %self.id, reason, "capture cycle failed");
        let _ = self.tx.send(GateEvent::Rearm {
            id: self.id,
            success: false,
        });
    }
}
