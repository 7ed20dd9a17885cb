//! Metrics collection and Prometheus export.

use metrics::{counter, describe_counter, describe_gauge, describe_histogram, gauge, histogram};
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};
use tts_core::{ModelVariant, TtsError, TtsResult};

/// Metrics recorder for TTS operations.
#[derive(Debug, Clone, Copy, Default)]
pub struct TtsMetrics;

impl TtsMetrics {
    /// Install the global Prometheus recorder and register descriptions.
    ///
    /// The returned handle renders the exposition text for `GET /metrics`.
    pub fn install() -> TtsResult<(Self, PrometheusHandle)> {
        let handle = PrometheusBuilder::new()
            .install_recorder()
            .map_err(|e| TtsError::internal(format!("metrics init failed: {e}")))?;

        Self::register_metrics();

        Ok((Self, handle))
    }

    /// Metrics without a recorder (for testing).
    pub fn init_noop() -> Self {
        Self
    }

    fn register_metrics() {
        describe_counter!(
            "tts_requests_total",
            "Total number of TTS requests received"
        );
        describe_counter!(
            "tts_requests_completed",
            "Total number of TTS requests completed successfully"
        );
        describe_counter!(
            "tts_requests_failed",
            "Total number of TTS requests that failed, by error kind"
        );
        describe_counter!(
            "tts_temp_cleanup_failures",
            "Staged reference audio files that could not be removed"
        );

        describe_histogram!(
            "tts_synthesis_latency_ms",
            "Model synthesis latency in milliseconds"
        );
        describe_histogram!(
            "tts_model_load_ms",
            "Model construction latency in milliseconds"
        );
        describe_histogram!(
            "tts_rtf",
            "Real-time factor (processing time / audio duration)"
        );

        describe_gauge!("tts_loaded_models", "Number of loaded model variants");
        describe_gauge!("tts_active_requests", "Number of requests being synthesized");
    }

    /// Record a new request received.
    pub fn request_received(&self) {
        counter!("tts_requests_total").increment(1);
    }

    /// Record a request completed successfully.
    pub fn request_completed(&self, variant: ModelVariant) {
        counter!("tts_requests_completed", "variant" => variant.as_str()).increment(1);
    }

    /// Record a request failed.
    pub fn request_failed(&self, kind: &'static str) {
        counter!("tts_requests_failed", "kind" => kind).increment(1);
    }

    /// Record a temp file that could not be deleted.
    pub fn cleanup_failed(&self) {
        counter!("tts_temp_cleanup_failures").increment(1);
    }

    /// Record synthesis latency.
    pub fn record_synthesis_latency(&self, variant: ModelVariant, ms: f64) {
        histogram!("tts_synthesis_latency_ms", "variant" => variant.as_str()).record(ms);
    }

    /// Record model load latency.
    pub fn record_model_load(&self, variant: ModelVariant, ms: f64) {
        histogram!("tts_model_load_ms", "variant" => variant.as_str()).record(ms);
    }

    /// Record real-time factor.
    pub fn record_rtf(&self, rtf: f64) {
        histogram!("tts_rtf").record(rtf);
    }

    /// Set the number of loaded variants.
    pub fn set_loaded_models(&self, count: usize) {
        gauge!("tts_loaded_models").set(count as f64);
    }

    /// Adjust the number of in-flight syntheses.
    pub fn active_requests_delta(&self, delta: f64) {
        gauge!("tts_active_requests").increment(delta);
    }

    /// Count one in-flight synthesis until the returned guard is dropped.
    pub fn track_active(&self) -> ActiveRequest {
        self.active_requests_delta(1.0);
        ActiveRequest(*self)
    }
}

/// Holds one slot of `tts_active_requests`.
#[derive(Debug)]
pub struct ActiveRequest(TtsMetrics);

impl Drop for ActiveRequest {
    fn drop(&mut self) {
        self.0.active_requests_delta(-1.0);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_metrics_noop() {
        let metrics = TtsMetrics::init_noop();

        // These should not panic even without a recorder
        metrics.request_received();
        metrics.request_completed(ModelVariant::Turbo);
        metrics.request_failed("validation");
        metrics.record_model_load(ModelVariant::Original, 12.5);
        metrics.set_loaded_models(2);
        metrics.active_requests_delta(1.0);
    }

    fn active_requests(handle: &PrometheusHandle) -> f64 {
        handle
            .render()
            .lines()
            .find_map(|line| line.strip_prefix("tts_active_requests "))
            .map(|value| value.trim().parse().unwrap())
            .unwrap_or(0.0)
    }

    #[test]
    fn test_active_request_guard_releases_on_drop() {
        let recorder = PrometheusBuilder::new().build_recorder();
        let handle = recorder.handle();

        metrics::with_local_recorder(&recorder, || {
            let metrics = TtsMetrics;
            let first = metrics.track_active();
            let second = metrics.track_active();
            assert_eq!(active_requests(&handle), 2.0);

            drop(first);
            assert_eq!(active_requests(&handle), 1.0);

            // Unwinding releases the slot too.
            let unwound = std::panic::catch_unwind(std::panic::AssertUnwindSafe(move || {
                let _second = second;
                panic!("engine crashed");
            }));
            assert!(unwound.is_err());
            assert_eq!(active_requests(&handle), 0.0);
        });
    }
}
