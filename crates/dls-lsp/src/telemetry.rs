//! Telemetry: opt-out via `DOCKER_LANGUAGE_SERVER_TELEMETRY=false`.
//! When enabled, appends one JSON line per request to a file sink,
//! event name and latency only, never document content.

use std::fs::OpenOptions;
use std::io::Write;
use std::path::PathBuf;
use std::time::Duration;

use parking_lot::Mutex;
use serde::Serialize;
use tracing::error;

#[derive(Debug, Clone, Serialize)]
pub struct TelemetryEvent {
    pub name: String,
    pub latency_ms: u128,
    pub outcome: &'static str,
}

impl TelemetryEvent {
    pub fn new(name: impl Into<String>, latency: Duration, outcome: &'static str) -> Self {
        TelemetryEvent { name: name.into(), latency_ms: latency.as_millis(), outcome }
    }
}

pub struct TelemetryCollector {
    sink: Mutex<Option<PathBuf>>,
    enabled: bool,
}

impl TelemetryCollector {
    pub fn new(sink: Option<PathBuf>) -> Self {
        let enabled = std::env::var("DOCKER_LANGUAGE_SERVER_TELEMETRY").map(|v| v != "false").unwrap_or(true);
        TelemetryCollector { sink: Mutex::new(sink), enabled }
    }

    pub fn record(&self, event: TelemetryEvent) {
        if !self.enabled {
            return;
        }
        let Some(path) = self.sink.lock().clone() else { return };
        let Ok(line) = serde_json::to_string(&event) else { return };
        let result = OpenOptions::new().create(true).append(true).open(&path).and_then(|mut file| writeln!(file, "{line}"));
        if let Err(err) = result {
            error!("failed to write telemetry event: {err}");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn disabled_collector_never_touches_the_sink() {
        std::env::set_var("DOCKER_LANGUAGE_SERVER_TELEMETRY", "false");
        let path = std::env::temp_dir().join("dls-telemetry-disabled-test.jsonl");
        let _ = std::fs::remove_file(&path);
        let collector = TelemetryCollector::new(Some(path.clone()));
        collector.record(TelemetryEvent::new("textDocument/hover", Duration::from_millis(5), "ok"));
        assert!(!path.exists());
        std::env::remove_var("DOCKER_LANGUAGE_SERVER_TELEMETRY");
    }
}
