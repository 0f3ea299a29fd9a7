use crate::models::{AssignmentEvent, EngagementEventType};
use parking_lot::Mutex;
use serde_json::Value;
use tracing::info;

pub const RANKER_ASSIGNMENT_EVENT: &str = "ranker_assignment";

/// Telemetry sink injected into the orchestrator.
pub trait Telemetry: Send + Sync {
    fn track(&self, event_name: &str, payload: Value);

    /// Engagement feedback for future online learning. Recorded only.
    fn track_event(&self, item_id: &str, event_type: EngagementEventType);
}

/// Emits telemetry as structured log records.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogTelemetry;

impl Telemetry for LogTelemetry {
    fn track(&self, event_name: &str, payload: Value) {
        info!(event = event_name, payload = %payload, "telemetry");
    }

    fn track_event(&self, item_id: &str, event_type: EngagementEventType) {
        info!(
            item_id = %item_id,
            event_type = event_type.as_str(),
            "engagement event"
        );
    }
}

/// Keeps every event in memory. Useful for tests and local inspection.
#[derive(Debug, Default)]
pub struct RecordingTelemetry {
    tracked: Mutex<Vec<(String, Value)>>,
    engagements: Mutex<Vec<(String, EngagementEventType)>>,
}

impl RecordingTelemetry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn tracked(&self) -> Vec<(String, Value)> {
        self.tracked.lock().clone()
    }

    pub fn engagements(&self) -> Vec<(String, EngagementEventType)> {
        self.engagements.lock().clone()
    }

    /// Decoded `ranker_assignment` payloads, in emission order.
    pub fn assignments(&self) -> Vec<AssignmentEvent> {
        self.tracked
            .lock()
            .iter()
            .filter(|(name, _)| name == RANKER_ASSIGNMENT_EVENT)
            .filter_map(|(_, payload)| serde_json::from_value(payload.clone()).ok())
            .collect()
    }
}

impl Telemetry for RecordingTelemetry {
    fn track(&self, event_name: &str, payload: Value) {
        self.tracked.lock().push((event_name.to_string(), payload));
    }

    fn track_event(&self, item_id: &str, event_type: EngagementEventType) {
        self.engagements.lock().push((item_id.to_string(), event_type));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::RankingSource;

    #[test]
    fn test_recording_telemetry_decodes_assignments() {
        let telemetry = RecordingTelemetry::new();
        let event = AssignmentEvent {
            user_id: "u1".into(),
            algorithm: "ucb1".into(),
            in_canary: true,
            source: RankingSource::Client,
            item_count: 4,
            timestamp: 1_700_000_000_000,
        };

        telemetry.track(RANKER_ASSIGNMENT_EVENT, serde_json::to_value(&event).unwrap());
        telemetry.track("other", serde_json::json!({}));
        telemetry.track_event("s1", EngagementEventType::Cta);

        assert_eq!(telemetry.tracked().len(), 2);
        assert_eq!(telemetry.assignments(), vec![event]);
        assert_eq!(
            telemetry.engagements(),
            vec![("s1".to_string(), EngagementEventType::Cta)]
        );
    }
}
