//! Data models for Seawatch.
//!
//! Two families of types live here:
//!
//! - [`RawSnapshot`]: the five arrays exactly as the tracking backend returned
//!   them, untyped. Fields may be missing or ill-typed.
//! - Domain values ([`Vessel`], [`Port`], [`PositionSample`], [`Voyage`],
//!   [`HazardEvent`]) produced by the parser. Every coordinate in a domain
//!   value is a valid WGS-84 pair; no downstream code sees text coordinates.
//!
//! Domain values are immutable once built and live only as long as one
//! situation report.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::MsaeError;
use crate::geo::LatLon;

/// An opaque record identifier.
///
/// The backend uses integer primary keys, but other feeds use text ids. Numeric
/// ids order numerically and sort before text ids, which order lexically.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RecordId {
    Num(i64),
    Text(String),
}

impl RecordId {
    /// Read an id from a JSON value. Digit-only strings become numeric ids so
    /// that `1` and `"1"` refer to the same record.
    pub fn from_json(value: &Value) -> Option<Self> {
        match value {
            Value::Number(n) => n.as_i64().map(RecordId::Num),
            Value::String(s) => {
                let s = s.trim();
                if s.is_empty() {
                    return None;
                }
                match s.parse::<i64>() {
                    Ok(n) if n.to_string() == s => Some(RecordId::Num(n)),
                    _ => Some(RecordId::Text(s.to_string())),
                }
            }
            _ => None,
        }
    }
}

impl fmt::Display for RecordId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RecordId::Num(n) => write!(f, "{n}"),
            RecordId::Text(s) => f.write_str(s),
        }
    }
}

impl From<i64> for RecordId {
    fn from(n: i64) -> Self {
        RecordId::Num(n)
    }
}

impl From<&str> for RecordId {
    fn from(s: &str) -> Self {
        RecordId::Text(s.to_string())
    }
}

/// Operational status reported for a vessel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum VesselStatus {
    Active,
    Inactive,
    Unknown,
}

impl VesselStatus {
    /// Case-insensitive mapping from the backend's free-text status.
    pub fn from_wire(text: &str) -> Self {
        match text.trim().to_ascii_lowercase().as_str() {
            "active" => VesselStatus::Active,
            "inactive" => VesselStatus::Inactive,
            _ => VesselStatus::Unknown,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            VesselStatus::Active => "ACTIVE",
            VesselStatus::Inactive => "INACTIVE",
            VesselStatus::Unknown => "UNKNOWN",
        }
    }
}

/// A tracked vessel.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Vessel {
    pub id: RecordId,

    /// Display name, preserved verbatim. Never empty.
    pub name: String,

    /// The name with all whitespace removed and lowercased; used for matching.
    pub search_key: String,

    /// Maritime Mobile Service Identity when known. Always 9 ASCII digits;
    /// group and coast-station identities keep their leading zeros.
    pub mmsi: Option<String>,

    pub vessel_type: String,

    pub flag: String,

    pub status: VesselStatus,

    pub last_position: LatLon,
}

/// A port with a validated location.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Port {
    pub id: RecordId,
    pub name: String,
    pub country: String,
    pub location: LatLon,
}

/// One point of a vessel's position history.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PositionSample {
    /// Always resolves to a known vessel.
    pub vessel_id: RecordId,

    /// Denormalized display label.
    pub vessel_name: String,

    pub position: LatLon,

    pub timestamp: DateTime<Utc>,
}

/// Lifecycle of a voyage.
///
/// `Unknown` covers backend values outside the recognized set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum VoyageStatus {
    Planned,
    InProgress,
    Completed,
    Cancelled,
    Unknown,
}

impl VoyageStatus {
    /// Map free text such as `"In Progress"`, `"on-schedule"` or `"CANCELED"`.
    pub fn from_wire(text: &str) -> Self {
        let key: String = text
            .trim()
            .chars()
            .map(|c| match c {
                ' ' | '-' => '_',
                c => c.to_ascii_uppercase(),
            })
            .collect();

        match key.as_str() {
            "PLANNED" | "SCHEDULED" => VoyageStatus::Planned,
            "IN_PROGRESS" | "ON_SCHEDULE" | "UNDERWAY" | "DELAYED" => VoyageStatus::InProgress,
            "COMPLETED" | "ARRIVED" => VoyageStatus::Completed,
            "CANCELLED" | "CANCELED" => VoyageStatus::Cancelled,
            _ => VoyageStatus::Unknown,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            VoyageStatus::Planned => "PLANNED",
            VoyageStatus::InProgress => "IN_PROGRESS",
            VoyageStatus::Completed => "COMPLETED",
            VoyageStatus::Cancelled => "CANCELLED",
            VoyageStatus::Unknown => "UNKNOWN",
        }
    }
}

/// A voyage log entry between two ports.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Voyage {
    pub id: RecordId,
    pub vessel_id: RecordId,
    pub vessel_name: String,
    pub port_from_id: Option<RecordId>,
    pub port_from_name: String,
    pub port_to_id: Option<RecordId>,
    pub port_to_name: String,
    pub status: VoyageStatus,
    pub departure_time: Option<DateTime<Utc>>,
    pub arrival_time: Option<DateTime<Utc>>,
}

/// Kind of hazard.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum HazardKind {
    Storm,
    Piracy,
    Other,
}

impl HazardKind {
    /// Unknown kinds normalize to `Other`.
    pub fn from_wire(text: &str) -> Self {
        match text.trim().to_ascii_lowercase().as_str() {
            "storm" => HazardKind::Storm,
            "piracy" => HazardKind::Piracy,
            _ => HazardKind::Other,
        }
    }
}

/// A geolocated safety incident.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HazardEvent {
    pub id: RecordId,
    pub event_type: HazardKind,
    pub location: LatLon,
    pub details: String,

    /// Radius supplied by the backend. When absent the run's configured risk
    /// radius applies.
    pub severity_radius_km: Option<f64>,

    /// Vessel the event was reported against, if any.
    pub vessel_id: Option<RecordId>,

    pub reported_at: Option<DateTime<Utc>>,
}

impl HazardEvent {
    /// The radius inside which a vessel is at risk from this hazard.
    pub fn risk_radius_km(&self, default_radius_km: f64) -> f64 {
        self.severity_radius_km.unwrap_or(default_radius_km)
    }
}

/// Risk classification of a vessel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RiskState {
    Nominal,
    AtRisk,
}

/// The five backend arrays as fetched, before validation.
///
/// A field that is `None` (absent or JSON `null`) means the endpoint was
/// unavailable; the parser treats it as an empty array and records it.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RawSnapshot {
    #[serde(default)]
    pub vessels: Option<Value>,
    #[serde(default)]
    pub ports: Option<Value>,
    #[serde(default)]
    pub history: Option<Value>,
    #[serde(default)]
    pub events: Option<Value>,
    #[serde(default)]
    pub voyages: Option<Value>,
}

impl RawSnapshot {
    /// Read a snapshot document. Anything but a JSON object is malformed.
    pub fn from_json(document: Value) -> Result<Self, MsaeError> {
        if !document.is_object() {
            return Err(MsaeError::SnapshotMalformed(
                "snapshot document is not an object".to_string(),
            ));
        }
        serde_json::from_value(document).map_err(|e| MsaeError::SnapshotMalformed(e.to_string()))
    }
}

/// Per-kind counts of records the parser discarded.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Warnings {
    pub dropped_vessels: usize,
    pub dropped_ports: usize,
    pub dropped_samples: usize,
    pub dropped_events: usize,
    pub dropped_voyages: usize,

    /// Snapshot arrays that were absent, e.g. `"events"`.
    pub missing_endpoints: Vec<String>,
}

impl Warnings {
    pub fn total_dropped(&self) -> usize {
        self.dropped_vessels
            + self.dropped_ports
            + self.dropped_samples
            + self.dropped_events
            + self.dropped_voyages
    }

    pub fn is_clean(&self) -> bool {
        self.total_dropped() == 0 && self.missing_endpoints.is_empty()
    }
}

/// Typed, validated contents of one snapshot.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct NormalizedSnapshot {
    pub vessels: Vec<Vessel>,
    pub ports: Vec<Port>,
    pub samples: Vec<PositionSample>,
    pub events: Vec<HazardEvent>,
    pub voyages: Vec<Voyage>,
    pub warnings: Warnings,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_record_id_from_json() {
        assert_eq!(RecordId::from_json(&json!(7)), Some(RecordId::Num(7)));
        assert_eq!(RecordId::from_json(&json!("7")), Some(RecordId::Num(7)));
        assert_eq!(
            RecordId::from_json(&json!("007")),
            Some(RecordId::Text("007".to_string()))
        );
        assert_eq!(
            RecordId::from_json(&json!("V1")),
            Some(RecordId::Text("V1".to_string()))
        );
        assert_eq!(RecordId::from_json(&json!("  ")), None);
        assert_eq!(RecordId::from_json(&json!(null)), None);
        assert_eq!(RecordId::from_json(&json!(1.5)), None);
    }

    #[test]
    fn test_record_id_ordering() {
        assert!(RecordId::Num(9) < RecordId::Num(10));
        assert!(RecordId::Num(1000) < RecordId::from("A"));
        assert!(RecordId::from("V1") < RecordId::from("V2"));
    }

    #[test]
    fn test_vessel_status_from_wire() {
        assert_eq!(VesselStatus::from_wire("Active"), VesselStatus::Active);
        assert_eq!(VesselStatus::from_wire(" INACTIVE "), VesselStatus::Inactive);
        assert_eq!(VesselStatus::from_wire("Docked"), VesselStatus::Unknown);
    }

    #[test]
    fn test_voyage_status_from_wire() {
        assert_eq!(VoyageStatus::from_wire("Planned"), VoyageStatus::Planned);
        assert_eq!(
            VoyageStatus::from_wire("In Progress"),
            VoyageStatus::InProgress
        );
        assert_eq!(
            VoyageStatus::from_wire("On Schedule"),
            VoyageStatus::InProgress
        );
        assert_eq!(VoyageStatus::from_wire("canceled"), VoyageStatus::Cancelled);
        assert_eq!(VoyageStatus::from_wire("lost"), VoyageStatus::Unknown);
    }

    #[test]
    fn test_hazard_kind_from_wire() {
        assert_eq!(HazardKind::from_wire("Storm"), HazardKind::Storm);
        assert_eq!(HazardKind::from_wire("PIRACY"), HazardKind::Piracy);
        assert_eq!(HazardKind::from_wire("Risk"), HazardKind::Other);
    }

    #[test]
    fn test_raw_snapshot_null_is_missing() {
        let raw = RawSnapshot::from_json(json!({ "vessels": [], "ports": null })).unwrap();
        assert_eq!(raw.vessels, Some(json!([])));
        assert_eq!(raw.ports, None);
        assert_eq!(raw.events, None);
    }

    #[test]
    fn test_raw_snapshot_rejects_non_object() {
        let err = RawSnapshot::from_json(json!([1, 2, 3])).unwrap_err();
        assert!(matches!(err, MsaeError::SnapshotMalformed(_)));
    }

    #[test]
    fn test_serialized_enums_are_screaming_case() {
        assert_eq!(
            serde_json::to_value(RiskState::AtRisk).unwrap(),
            json!("AT_RISK")
        );
        assert_eq!(
            serde_json::to_value(VoyageStatus::InProgress).unwrap(),
            json!("IN_PROGRESS")
        );
    }
}
