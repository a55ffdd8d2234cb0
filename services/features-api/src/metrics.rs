//! Request metrics.

use metrics::{counter, histogram};
use std::time::Instant;

use features_protocol::MediaType;

/// Timer for measuring operation duration.
pub struct Timer {
    start: Instant,
}

impl Timer {
    pub fn start() -> Self {
        Self {
            start: Instant::now(),
        }
    }

    pub fn elapsed_ms(&self) -> f64 {
        self.start.elapsed().as_micros() as f64 / 1000.0
    }
}

/// Record a served request.
pub fn record_request(resource: &'static str, profile: &'static str, media_type: MediaType) {
    counter!(
        "features_requests_total",
        "resource" => resource,
        "profile" => profile,
        "media_type" => media_type.as_str()
    )
    .increment(1);
}

/// Record a request that ended in an error response.
pub fn record_error(resource: &'static str, status: u16) {
    counter!(
        "features_request_errors_total",
        "resource" => resource,
        "status" => status.to_string()
    )
    .increment(1);
}

pub fn record_duration(resource: &'static str, timer: &Timer) {
    histogram!("features_request_duration_ms", "resource" => resource).record(timer.elapsed_ms());
}
