// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Listener capability for capture notifications.

use scanwerk_core::types::CaptureReceipt;

/// Notification capability the host registers once.
///
/// Called from the export task after a document has been persisted, at most
/// once per capture cycle. Implementations should return quickly; anything
/// expensive belongs on the host's own executor.
pub trait CaptureListener: Send + Sync {
    fn on_document_captured(&self, receipt: &CaptureReceipt);
}
