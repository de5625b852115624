// Upload pipeline Prometheus metrics
//
// Counters and histograms for the ingestion pipeline:
// - Upload outcomes per asset category
// - Validation rejections per error kind
// - Transcode latency
// - Bytes saved by recompression
// - Temp files that could not be removed

use prometheus::{
    register_histogram_vec, register_int_counter, register_int_counter_vec, Encoder, HistogramVec,
    IntCounter, IntCounterVec, TextEncoder,
};
use std::sync::OnceLock;

/// Global metrics registry for the upload pipeline
pub struct UploadMetrics {
    /// Completed uploads by category and outcome (success, rejected, failed)
    pub uploads: IntCounterVec,

    /// Validation rejections by error kind
    pub rejections: IntCounterVec,

    /// Transcode duration histogram (in seconds) by category
    pub transcode_duration: HistogramVec,

    /// Bytes saved by recompression, by category
    pub bytes_saved: IntCounterVec,

    /// Temp files whose deletion failed
    pub temp_cleanup_failures: IntCounter,
}

/// Global singleton instance of metrics
static METRICS: OnceLock<UploadMetrics> = OnceLock::new();

impl UploadMetrics {
    /// Initialize and return the global metrics instance
    ///
    /// Subsequent calls return the same instance.
    pub fn global() -> &'static Self {
        METRICS.get_or_init(|| {
            let uploads = register_int_counter_vec!(
                "platter_uploads_total",
                "Total number of processed uploads by category and outcome",
                &["category", "outcome"]
            )
            .expect("Failed to register uploads_total metric");

            let rejections = register_int_counter_vec!(
                "platter_upload_rejections_total",
                "Total number of uploads rejected by validation, by kind",
                &["kind"]
            )
            .expect("Failed to register upload_rejections_total metric");

            let transcode_duration = register_histogram_vec!(
                "platter_transcode_duration_seconds",
                "Duration of the transcode step in seconds",
                &["category"],
                vec![0.01, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0, 30.0] // 10ms to 30s
            )
            .expect("Failed to register transcode_duration_seconds metric");

            let bytes_saved = register_int_counter_vec!(
                "platter_bytes_saved_total",
                "Total bytes saved by recompression, by category",
                &["category"]
            )
            .expect("Failed to register bytes_saved_total metric");

            let temp_cleanup_failures = register_int_counter!(
                "platter_temp_cleanup_failures_total",
                "Total number of temp files that could not be deleted"
            )
            .expect("Failed to register temp_cleanup_failures_total metric");

            UploadMetrics {
                uploads,
                rejections,
                transcode_duration,
                bytes_saved,
                temp_cleanup_failures,
            }
        })
    }

    pub fn record_outcome(&self, category: &str, outcome: &str) {
        self.uploads.with_label_values(&[category, outcome]).inc();
    }

    pub fn record_rejection(&self, kind: &str) {
        self.rejections.with_label_values(&[kind]).inc();
    }

    pub fn observe_transcode(&self, category: &str, seconds: f64) {
        self.transcode_duration
            .with_label_values(&[category])
            .observe(seconds);
    }

    /// Only positive savings are counted; outputs larger than the source add nothing
    pub fn record_savings(&self, category: &str, original_size: u64, optimized_size: u64) {
        let saved = original_size.saturating_sub(optimized_size);
        if saved > 0 {
            self.bytes_saved.with_label_values(&[category]).inc_by(saved);
        }
    }

    /// Render the default registry in the Prometheus text exposition format
    pub fn render_text() -> Result<String, String> {
        let encoder = TextEncoder::new();
        let mut buffer = Vec::new();
        encoder
            .encode(&prometheus::gather(), &mut buffer)
            .map_err(|e| e.to_string())?;
        String::from_utf8(buffer).map_err(|e| e.to_string())
    }
}
