use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Verification state of a vehicle activation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActivationStatus {
    Pending,
    Verified,
    Rejected,
}

/// A user's vehicle activation with a brand.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ActivationRecord {
    pub vehicle_id: String,
    pub status: ActivationStatus,
    pub activated_at: DateTime<Utc>,
}

/// RSVP answer recorded against a brand event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RsvpStatus {
    Going,
    Interested,
    NotGoing,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EventRsvp {
    pub event_id: String,
    #[serde(default)]
    pub event_type: Option<String>,
    pub status: RsvpStatus,
}

/// Per-user, per-brand activity counters used as the single input of one evaluation.
///
/// `events_attended` is the total of `going` RSVPs; `events_by_type` buckets the typed subset
/// of that total. Every field defaults to zero so absent data never fails an evaluation.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ActivitySnapshot {
    pub activations_count: u32,
    pub events_attended: u32,
    pub events_by_type: BTreeMap<String, u32>,
    pub purchase_count: u32,
    pub total_spend: f64,
}

impl ActivitySnapshot {
    /// Fold raw activation and RSVP rows into counters.
    pub fn from_records(activations: &[ActivationRecord], rsvps: &[EventRsvp]) -> Self {
        let activations_count = activations
            .iter()
            .filter(|record| record.status == ActivationStatus::Verified)
            .count() as u32;

        let mut events_attended = 0;
        let mut events_by_type = BTreeMap::new();
        for rsvp in rsvps.iter().filter(|rsvp| rsvp.status == RsvpStatus::Going) {
            events_attended += 1;
            if let Some(event_type) = &rsvp.event_type {
                *events_by_type.entry(event_type.clone()).or_insert(0) += 1;
            }
        }

        Self {
            activations_count,
            events_attended,
            events_by_type,
            purchase_count: 0,
            total_spend: 0.0,
        }
    }

    pub fn with_activations(mut self, count: u32) -> Self {
        self.activations_count = count;
        self
    }

    /// Record `count` attended events of `event_type`, keeping the total in step.
    pub fn with_events(mut self, event_type: impl Into<String>, count: u32) -> Self {
        *self.events_by_type.entry(event_type.into()).or_insert(0) += count;
        self.events_attended += count;
        self
    }

    /// Attended events, optionally restricted to one event type.
    pub fn events_attended(&self, event_type: Option<&str>) -> u32 {
        match event_type {
            Some(event_type) => self.events_by_type.get(event_type).copied().unwrap_or(0),
            None => self.events_attended,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn activation(vehicle_id: &str, status: ActivationStatus) -> ActivationRecord {
        ActivationRecord {
            vehicle_id: vehicle_id.to_string(),
            status,
            activated_at: Utc
                .with_ymd_and_hms(2025, 3, 14, 9, 30, 0)
                .single()
                .expect("valid timestamp"),
        }
    }

    fn rsvp(event_id: &str, event_type: Option<&str>, status: RsvpStatus) -> EventRsvp {
        EventRsvp {
            event_id: event_id.to_string(),
            event_type: event_type.map(str::to_string),
            status,
        }
    }

    #[test]
    fn only_verified_activations_are_counted() {
        let snapshot = ActivitySnapshot::from_records(
            &[
                activation("VIN-1", ActivationStatus::Verified),
                activation("VIN-2", ActivationStatus::Pending),
                activation("VIN-3", ActivationStatus::Rejected),
                activation("VIN-4", ActivationStatus::Verified),
            ],
            &[],
        );

        assert_eq!(snapshot.activations_count, 2);
        assert_eq!(snapshot.events_attended(None), 0);
    }

    #[test]
    fn only_going_rsvps_are_counted_and_bucketed() {
        let snapshot = ActivitySnapshot::from_records(
            &[],
            &[
                rsvp("ev-1", Some("track_day"), RsvpStatus::Going),
                rsvp("ev-2", Some("track_day"), RsvpStatus::Interested),
                rsvp("ev-3", Some("meetup"), RsvpStatus::Going),
                rsvp("ev-4", None, RsvpStatus::Going),
                rsvp("ev-5", Some("meetup"), RsvpStatus::NotGoing),
            ],
        );

        assert_eq!(snapshot.events_attended(None), 3);
        assert_eq!(snapshot.events_attended(Some("track_day")), 1);
        assert_eq!(snapshot.events_attended(Some("meetup")), 1);
        assert_eq!(snapshot.events_attended(Some("launch")), 0);
    }

    #[test]
    fn missing_fields_deserialize_as_zero() {
        let snapshot: ActivitySnapshot =
            serde_json::from_str(r#"{ "activationsCount": 2 }"#).expect("snapshot parses");

        assert_eq!(snapshot.activations_count, 2);
        assert_eq!(snapshot.events_attended, 0);
        assert!(snapshot.events_by_type.is_empty());
        assert_eq!(snapshot.total_spend, 0.0);
    }

    #[test]
    fn builders_keep_total_in_step_with_buckets() {
        let snapshot = ActivitySnapshot::default()
            .with_activations(1)
            .with_events("meetup", 2)
            .with_events("track_day", 1);

        assert_eq!(snapshot.activations_count, 1);
        assert_eq!(snapshot.events_attended(None), 3);
        assert_eq!(snapshot.events_attended(Some("meetup")), 2);
    }
}
