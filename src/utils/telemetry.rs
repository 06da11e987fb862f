// file: src/utils/telemetry.rs
// description: Service health checks and stage timing for the search pipeline
// reference: health reporting and timing helpers

use chrono::Utc;
use serde::Serialize;
use std::fmt::Display;
use std::time::{Duration, Instant};
use tracing::{debug, warn};

/// Ordered from best to worst so a report takes the maximum.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum HealthStatus {
    Healthy,
    Degraded,
    Unhealthy,
}

impl HealthStatus {
    fn symbol(self) -> &'static str {
        match self {
            HealthStatus::Healthy => "✓",
            HealthStatus::Degraded => "⚠",
            HealthStatus::Unhealthy => "✗",
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct HealthCheck {
    pub component: String,
    pub status: HealthStatus,
    pub detail: Option<String>,
    pub latency_ms: u64,
}

impl HealthCheck {
    pub fn new(
        component: &str,
        status: HealthStatus,
        detail: Option<String>,
        latency: Duration,
    ) -> Self {
        Self {
            component: component.to_string(),
            status,
            detail,
            latency_ms: latency.as_millis() as u64,
        }
    }

    pub fn healthy(component: &str, detail: Option<String>, latency: Duration) -> Self {
        Self::new(component, HealthStatus::Healthy, detail, latency)
    }

    /// `Ok` carries a description of the working service; `Err` is recorded
    /// with `on_failure` as its status.
    pub fn from_outcome<E: Display>(
        component: &str,
        outcome: std::result::Result<String, E>,
        on_failure: HealthStatus,
        latency: Duration,
    ) -> Self {
        match outcome {
            Ok(detail) => Self::healthy(component, Some(detail), latency),
            Err(e) => Self::new(component, on_failure, Some(e.to_string()), latency),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct HealthReport {
    pub overall_status: HealthStatus,
    pub checks: Vec<HealthCheck>,
    pub checked_at: String,
    pub version: String,
}

impl HealthReport {
    pub fn new(checks: Vec<HealthCheck>, version: impl Into<String>) -> Self {
        let overall_status = checks
            .iter()
            .map(|c| c.status)
            .max()
            .unwrap_or(HealthStatus::Healthy);

        Self {
            overall_status,
            checks,
            checked_at: Utc::now().format("%Y-%m-%d %H:%M:%S UTC").to_string(),
            version: version.into(),
        }
    }

    /// True when a required service is down. Degraded services do not count.
    pub fn has_failures(&self) -> bool {
        self.overall_status == HealthStatus::Unhealthy
    }

    pub fn format(&self) -> String {
        let width = self
            .checks
            .iter()
            .map(|c| c.component.len())
            .max()
            .unwrap_or(0);

        let mut lines = vec![
            format!(
                "{} Services: {:?} (v{}, {})",
                self.overall_status.symbol(),
                self.overall_status,
                self.version,
                self.checked_at
            ),
            String::new(),
        ];

        for check in &self.checks {
            let mut line = format!(
                "  {} {:<width$}  {:>6} ms",
                check.status.symbol(),
                check.component,
                check.latency_ms,
                width = width
            );
            if let Some(detail) = &check.detail {
                line.push_str("  ");
                line.push_str(detail);
            }
            lines.push(line);
        }

        lines.join("\n")
    }
}

/// Times a single pipeline stage or service call.
pub struct OperationTimer {
    operation: &'static str,
    start: Instant,
}

impl OperationTimer {
    pub fn new(operation: &'static str) -> Self {
        debug!("{} started", operation);
        Self {
            operation,
            start: Instant::now(),
        }
    }

    pub fn elapsed(&self) -> Duration {
        self.start.elapsed()
    }

    pub fn finish(self) -> Duration {
        let elapsed = self.elapsed();
        debug!("{} took {} ms", self.operation, elapsed.as_millis());
        elapsed
    }

    pub fn warn_if_slow(&self, threshold: Duration) {
        let elapsed = self.elapsed();
        if elapsed > threshold {
            warn!(
                "{} is slow: {:.1}s (threshold {:.1}s)",
                self.operation,
                elapsed.as_secs_f64(),
                threshold.as_secs_f64()
            );
        }
    }
}
