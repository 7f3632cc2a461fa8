// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Disk exporter — persists rectified documents as maximal-quality JPEGs and
// reports the outcome back to the stability gate.
//
// Encoding and the filesystem write are blocking, so they run through
// `tokio::task::spawn_blocking`; the analysis thread only pays for the
// dispatch itself. The cooldown after a successful write lives here, not in
// the analyzer: the gate re-arms only once the exporter releases the ticket.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use image::codecs::jpeg::JpegEncoder;
use image::DynamicImage;
use scanwerk_analyzer::analyzer::CaptureSink;
use scanwerk_analyzer::gate::CaptureTicket;
use scanwerk_analyzer::rectify::RectifiedDocument;
use scanwerk_core::config::AnalyzerConfig;
use scanwerk_core::error::{Result, ScanwerkError};
use scanwerk_core::types::CaptureReceipt;
use sha2::{Digest, Sha256};
use tokio::runtime::Handle;
use tracing::{info, instrument, warn};

use crate::listener::CaptureListener;

/// Writes captured documents into a directory on the local filesystem.
pub struct DiskExporter {
    dir: PathBuf,
    quality: u8,
    cooldown: Duration,
    listener: Option<Arc<dyn CaptureListener>>,
    runtime: Handle,
}

impl DiskExporter {
    /// Create an exporter writing into `dir`, creating it if needed.
    ///
    /// Must be called from within a tokio runtime; the exporter captures the
    /// runtime handle so it can spawn export tasks from the analysis thread.
    #[instrument(skip_all, fields(dir = %dir.as_ref().display()))]
    pub fn new(dir: impl AsRef<Path>, config: &AnalyzerConfig) -> Result<Self> {
        let dir = dir.as_ref().to_path_buf();
        std::fs::create_dir_all(&dir)?;
        let runtime = Handle::try_current()
            .map_err(|err| ScanwerkError::Export(format!("no tokio runtime: {err}")))?;

        info!("disk exporter ready");
        Ok(Self {
            dir,
            quality: config.jpeg_quality,
            cooldown: Duration::from_millis(config.cooldown_ms),
            listener: None,
            runtime,
        })
    }

    /// Register the capture listener. Call once, before analysis starts.
    pub fn with_listener(mut self, listener: Arc<dyn CaptureListener>) -> Self {
        self.listener = Some(listener);
        self
    }
}

impl CaptureSink for DiskExporter {
    fn dispatch(&self, document: RectifiedDocument, ticket: CaptureTicket) {
        let dir = self.dir.clone();
        let quality = self.quality;
        let cooldown = self.cooldown;
        let listener = self.listener.clone();

        self.runtime.spawn(async move {
            let written =
                tokio::task::spawn_blocking(move || write_document(&dir, quality, &document))
                    .await;

            match written {
                Ok(Ok(receipt)) => {
                    info!(
                        capture_id = %receipt.id,
                        path = %receipt.path.display(),
                        sha256 = %receipt.sha256,
                        "document exported"
                    );
                    if let Some(listener) = &listener {
                        listener.on_document_captured(&receipt);
                    }
                    // Debounce: hold the gate disarmed for the cooldown
                    // before releasing the ticket.
                    tokio::time::sleep(cooldown).await;
                    ticket.completed();
                }
                Ok(Err(err)) => {
                    warn!("export failed: {err}");
                    ticket.failed(&err.to_string());
                }
                Err(err) => {
                    warn!("export task failed: {err}");
                    ticket.failed("export task panicked");
                }
            }
        });
    }
}

/// Encode the document as a maximal-quality JPEG and persist it under a
/// millisecond-timestamp filename. Returns the receipt for the listener.
fn write_document(dir: &Path, quality: u8, document: &RectifiedDocument) -> Result<CaptureReceipt> {
    let (width, height) = (document.width(), document.height());

    let mut encoded = Vec::new();
    let rgb = DynamicImage::ImageRgba8(document.image.clone()).to_rgb8();
    let encoder = JpegEncoder::new_with_quality(&mut encoded, quality);
    rgb.write_with_encoder(encoder)
        .map_err(|err| ScanwerkError::Encoding(format!("JPEG encoding failed: {err}")))?;

    let created_at = Utc::now();
    let path = dir.join(format!("{}.jpg", created_at.timestamp_millis()));
    std::fs::write(&path, &encoded)?;

    Ok(CaptureReceipt {
        id: document.id,
        path,
        sha256: hash_bytes(&encoded),
        width,
        height,
        created_at,
    })
}

/// SHA-256 of `data` as a lowercase hex string, fingerprinting the exported
/// bytes for the receipt.
fn hash_bytes(data: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(data);
    hex::encode(hasher.finalize())
}

#[cfg(test)]
mod tests {
    use super::*;
    use scanwerk_analyzer::DocumentAnalyzer;
    use scanwerk_core::types::{CaptureId, Frame, PixelFormat, Plane};
    use std::sync::Mutex;

    #[derive(Default)]
    struct RecordingListener {
        receipts: Mutex<Vec<CaptureReceipt>>,
    }

    impl CaptureListener for RecordingListener {
        fn on_document_captured(&self, receipt: &CaptureReceipt) {
            self.receipts.lock().expect("receipts").push(receipt.clone());
        }
    }

    fn solid_document(width: u32, height: u32) -> RectifiedDocument {
        RectifiedDocument {
            id: CaptureId::new(),
            image: image::RgbaImage::from_pixel(width, height, image::Rgba([180, 40, 90, 255])),
        }
    }

    /// Planar YUV frame with a bright rectangle, large enough to qualify.
    fn document_frame() -> Frame {
        let (width, height) = (200u32, 160u32);
        let (w, h) = (width as usize, height as usize);
        let mut luma = vec![30u8; w * h];
        for y in 30..120 {
            for x in 40..160 {
                luma[y * w + x] = 200;
            }
        }
        let chroma = vec![128u8; (w / 2) * (h / 2)];
        Frame::new(
            width,
            height,
            PixelFormat::Yuv420,
            0,
            vec![
                Plane::packed(luma, w),
                Plane::packed(chroma.clone(), w / 2),
                Plane::packed(chroma, w / 2),
            ],
        )
    }

    #[test]
    fn write_document_round_trips_through_disk() {
        let dir = tempfile::tempdir().expect("tempdir");
        let document = solid_document(64, 48);

        let receipt = write_document(dir.path(), 100, &document).expect("write");
        assert_eq!(receipt.id, document.id);
        assert_eq!((receipt.width, receipt.height), (64, 48));

        let bytes = std::fs::read(&receipt.path).expect("read back");
        assert_eq!(hash_bytes(&bytes), receipt.sha256);

        let decoded = image::load_from_memory(&bytes).expect("decode");
        assert_eq!((decoded.width(), decoded.height()), (64, 48));
    }

    #[tokio::test]
    async fn full_capture_cycle_exports_once_and_rearms() {
        let _ = tracing_subscriber::fmt().with_test_writer().try_init();

        let dir = tempfile::tempdir().expect("tempdir");
        let config = AnalyzerConfig {
            cooldown_ms: 20,
            ..AnalyzerConfig::default()
        };
        let listener = Arc::new(RecordingListener::default());
        let exporter = DiskExporter::new(dir.path(), &config)
            .expect("exporter")
            .with_listener(listener.clone());

        let mut analyzer = DocumentAnalyzer::new(config, Box::new(exporter));

        for _ in 0..20 {
            analyzer.submit_frame(document_frame()).expect("analyze");
        }
        assert!(!analyzer.gate().armed);

        // The export runs off-thread; wait for the listener notification.
        let deadline = std::time::Instant::now() + Duration::from_secs(5);
        while listener.receipts.lock().expect("receipts").is_empty() {
            assert!(std::time::Instant::now() < deadline, "export never completed");
            tokio::time::sleep(Duration::from_millis(5)).await;
        }

        {
            let receipts = listener.receipts.lock().expect("receipts");
            assert_eq!(receipts.len(), 1);
            assert!(receipts[0].path.exists());
        }

        // After the cooldown the ticket resolves; the next frame re-arms.
        tokio::time::sleep(Duration::from_millis(60)).await;
        let analysis = analyzer.submit_frame(document_frame()).expect("analyze");
        assert!(analysis.gate.armed);
        assert_eq!(analysis.gate.count, 1);

        // A second stable sequence produces a second capture.
        for _ in 0..19 {
            analyzer.submit_frame(document_frame()).expect("analyze");
        }
        let deadline = std::time::Instant::now() + Duration::from_secs(5);
        while listener.receipts.lock().expect("receipts").len() < 2 {
            assert!(std::time::Instant::now() < deadline, "second export never completed");
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
    }

    #[tokio::test]
    async fn unwritable_directory_fails_the_cycle_without_cooldown() {
        let dir = tempfile::tempdir().expect("tempdir");
        let config = AnalyzerConfig {
            cooldown_ms: 10_000,
            ..AnalyzerConfig::default()
        };
        let exporter = DiskExporter::new(dir.path(), &config).expect("exporter");

        let mut analyzer = DocumentAnalyzer::new(config, Box::new(exporter));

        // Remove the directory out from under the exporter so the write fails.
        let path = dir.path().to_path_buf();
        drop(dir);
        assert!(!path.exists());

        for _ in 0..20 {
            analyzer.submit_frame(document_frame()).expect("analyze");
        }
        assert!(!analyzer.gate().armed);

        // Failure re-arms immediately — long before the 10 s cooldown could.
        let deadline = std::time::Instant::now() + Duration::from_secs(5);
        loop {
            tokio::time::sleep(Duration::from_millis(5)).await;
            let analysis = analyzer.submit_frame(document_frame()).expect("analyze");
            if analysis.gate.armed {
                break;
            }
            assert!(std::time::Instant::now() < deadline, "gate never re-armed");
        }
    }
}
