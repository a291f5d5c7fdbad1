//! Validation and normalization of raw backend snapshots.
//!
//! The parser owns every string-to-value conversion: `"lat, lon"` text,
//! numeric strings, ISO-8601 timestamps, free-text enumerations. Records that
//! fail validation are discarded and counted in [`Warnings`]; only a snapshot
//! whose arrays are not arrays is rejected outright.

use std::collections::{HashMap, HashSet};

use chrono::{DateTime, NaiveDateTime, SubsecRound, Utc};
use serde_json::{Map, Value};

use crate::error::MsaeError;
use crate::filter::search_key;
use crate::geo::{LatLon, parse_lat_lon};
use crate::model::{
    HazardEvent, HazardKind, NormalizedSnapshot, Port, PositionSample, RawSnapshot, RecordId,
    Vessel, VesselStatus, Voyage, VoyageStatus, Warnings,
};

type Record = Map<String, Value>;

/// Convert a raw snapshot into typed domain values.
///
/// Fails with [`MsaeError::SnapshotMalformed`] only when one of the five
/// arrays is present but is not a JSON array.
pub fn normalize(raw: &RawSnapshot) -> Result<NormalizedSnapshot, MsaeError> {
    let mut warnings = Warnings::default();

    let vessel_records = records(raw.vessels.as_ref(), "vessels", &mut warnings)?;
    let port_records = records(raw.ports.as_ref(), "ports", &mut warnings)?;
    let sample_records = records(raw.history.as_ref(), "history", &mut warnings)?;
    let event_records = records(raw.events.as_ref(), "events", &mut warnings)?;
    let voyage_records = records(raw.voyages.as_ref(), "voyages", &mut warnings)?;

    let mut vessels = Vec::with_capacity(vessel_records.len());
    let mut seen = HashSet::new();
    for record in vessel_records {
        match record.as_object().and_then(parse_vessel) {
            Some(vessel) if seen.insert(vessel.id.clone()) => vessels.push(vessel),
            _ => warnings.dropped_vessels += 1,
        }
    }

    let mut ports = Vec::with_capacity(port_records.len());
    for record in port_records {
        match record.as_object().and_then(parse_port) {
            Some(port) => ports.push(port),
            None => warnings.dropped_ports += 1,
        }
    }

    let index = VesselIndex::new(&vessels);

    let mut samples = Vec::with_capacity(sample_records.len());
    for record in sample_records {
        match record
            .as_object()
            .and_then(|r| parse_sample(r, &index, &vessels))
        {
            Some(sample) => samples.push(sample),
            None => warnings.dropped_samples += 1,
        }
    }

    let mut events = Vec::with_capacity(event_records.len());
    for record in event_records {
        match record.as_object().and_then(parse_event) {
            Some(event) => events.push(event),
            None => warnings.dropped_events += 1,
        }
    }

    let port_names: HashMap<&RecordId, &str> =
        ports.iter().map(|p| (&p.id, p.name.as_str())).collect();

    let mut voyages = Vec::with_capacity(voyage_records.len());
    for record in voyage_records {
        match record
            .as_object()
            .and_then(|r| parse_voyage(r, &index, &vessels, &port_names))
        {
            Some(voyage) => voyages.push(voyage),
            None => warnings.dropped_voyages += 1,
        }
    }

    Ok(NormalizedSnapshot {
        vessels,
        ports,
        samples,
        events,
        voyages,
        warnings,
    })
}

/// Resolve one snapshot array. Absent arrays are empty and recorded as
/// missing endpoints.
fn records<'a>(
    value: Option<&'a Value>,
    endpoint: &str,
    warnings: &mut Warnings,
) -> Result<&'a [Value], MsaeError> {
    match value {
        None | Some(Value::Null) => {
            warnings.missing_endpoints.push(endpoint.to_string());
            Ok(&[])
        }
        Some(Value::Array(items)) => Ok(items.as_slice()),
        Some(_) => Err(MsaeError::SnapshotMalformed(format!(
            "{endpoint} is not an array"
        ))),
    }
}

/// Lookup tables for resolving a record's vessel reference.
struct VesselIndex<'a> {
    by_id: HashMap<&'a RecordId, usize>,
    by_name: HashMap<&'a str, usize>,
}

impl<'a> VesselIndex<'a> {
    fn new(vessels: &'a [Vessel]) -> Self {
        let mut by_id = HashMap::with_capacity(vessels.len());
        let mut by_name = HashMap::with_capacity(vessels.len());
        for (i, vessel) in vessels.iter().enumerate() {
            by_id.insert(&vessel.id, i);
            // First vessel with a given name wins.
            by_name.entry(vessel.name.as_str()).or_insert(i);
        }
        Self { by_id, by_name }
    }

    /// The `vessel` field may hold an id or a name. A numeric reference is
    /// only ever an id, so one that matches no vessel resolves to nothing.
    /// A text reference is tried as an id, then as a name. `vessel_name` is
    /// consulted only when `vessel` does not settle it.
    fn resolve(&self, record: &Record) -> Option<usize> {
        let Some(id) = record.get("vessel").and_then(RecordId::from_json) else {
            return self.by_vessel_name(record);
        };
        if let Some(&i) = self.by_id.get(&id) {
            return Some(i);
        }
        match id {
            RecordId::Num(_) => None,
            RecordId::Text(name) => self
                .by_name
                .get(name.as_str())
                .copied()
                .or_else(|| self.by_vessel_name(record)),
        }
    }

    fn by_vessel_name(&self, record: &Record) -> Option<usize> {
        text(record, "vessel_name").and_then(|n| self.by_name.get(n).copied())
    }
}

fn parse_vessel(record: &Record) -> Option<Vessel> {
    let id = record.get("id").and_then(RecordId::from_json)?;
    let name = record.get("name").and_then(Value::as_str)?;
    if name.trim().is_empty() {
        return None;
    }
    let lat = number(record, "last_position_lat")?;
    let lon = number(record, "last_position_lon")?;
    let last_position = LatLon::checked(lat, lon)?;

    Some(Vessel {
        id,
        name: name.to_string(),
        search_key: search_key(name),
        mmsi: record.get("mmsi").and_then(parse_mmsi),
        vessel_type: text(record, "vessel_type").unwrap_or_default().to_string(),
        flag: text(record, "flag").unwrap_or_default().to_string(),
        status: text(record, "status")
            .map(VesselStatus::from_wire)
            .unwrap_or(VesselStatus::Unknown),
        last_position,
    })
}

fn parse_port(record: &Record) -> Option<Port> {
    let id = record.get("id").and_then(RecordId::from_json)?;
    let name = text(record, "name")?;
    let location = match record.get("location") {
        Some(value) => parse_location(value)?,
        None => LatLon::checked(number(record, "latitude")?, number(record, "longitude")?)?,
    };

    Some(Port {
        id,
        name: name.to_string(),
        country: text(record, "country").unwrap_or_default().to_string(),
        location,
    })
}

fn parse_sample(record: &Record, index: &VesselIndex<'_>, vessels: &[Vessel]) -> Option<PositionSample> {
    let vessel = &vessels[index.resolve(record)?];
    let position = LatLon::checked(number(record, "latitude")?, number(record, "longitude")?)?;
    let timestamp = record.get("timestamp").and_then(parse_timestamp)?;

    Some(PositionSample {
        vessel_id: vessel.id.clone(),
        vessel_name: text(record, "vessel_name")
            .unwrap_or(vessel.name.as_str())
            .to_string(),
        position,
        timestamp,
    })
}

fn parse_event(record: &Record) -> Option<HazardEvent> {
    let id = record.get("id").and_then(RecordId::from_json)?;
    let event_type = record.get("event_type").and_then(Value::as_str)?;
    let location = record.get("location").and_then(parse_location)?;
    let severity_radius_km = number(record, "severity_radius_km").filter(|r| *r > 0.0);

    Some(HazardEvent {
        id,
        event_type: HazardKind::from_wire(event_type),
        location,
        details: text(record, "details").unwrap_or_default().to_string(),
        severity_radius_km,
        vessel_id: record.get("vessel").and_then(RecordId::from_json),
        reported_at: record.get("timestamp").and_then(parse_timestamp),
    })
}

fn parse_voyage(
    record: &Record,
    index: &VesselIndex<'_>,
    vessels: &[Vessel],
    port_names: &HashMap<&RecordId, &str>,
) -> Option<Voyage> {
    let id = record.get("id").and_then(RecordId::from_json)?;
    let vessel = &vessels[index.resolve(record)?];

    let port_from_id = record.get("port_from").and_then(RecordId::from_json);
    let port_to_id = record.get("port_to").and_then(RecordId::from_json);
    let port_name = |name_key: &str, id: &Option<RecordId>| -> String {
        text(record, name_key)
            .or_else(|| id.as_ref().and_then(|id| port_names.get(id).copied()))
            .unwrap_or_default()
            .to_string()
    };

    Some(Voyage {
        id,
        vessel_id: vessel.id.clone(),
        vessel_name: text(record, "vessel_name")
            .unwrap_or(vessel.name.as_str())
            .to_string(),
        port_from_name: port_name("port_from_name", &port_from_id),
        port_to_name: port_name("port_to_name", &port_to_id),
        port_from_id,
        port_to_id,
        status: text(record, "status")
            .map(VoyageStatus::from_wire)
            .unwrap_or(VoyageStatus::Unknown),
        departure_time: record.get("departure_time").and_then(parse_timestamp),
        arrival_time: record.get("arrival_time").and_then(parse_timestamp),
    })
}

/// A non-empty, trimmed text field.
fn text<'a>(record: &'a Record, key: &str) -> Option<&'a str> {
    record
        .get(key)
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|s| !s.is_empty())
}

/// A finite number, accepting JSON numbers and numeric strings.
fn number(record: &Record, key: &str) -> Option<f64> {
    let value = match record.get(key)? {
        Value::Number(n) => n.as_f64()?,
        Value::String(s) => s.trim().parse().ok()?,
        _ => return None,
    };
    value.is_finite().then_some(value)
}

/// A 9-digit MMSI. Anything else is treated as absent.
///
/// Text keeps leading zeros. A JSON number cannot carry them, so it must
/// already have nine digits.
fn parse_mmsi(value: &Value) -> Option<String> {
    let mmsi = match value {
        Value::Number(n) => n.as_u64()?.to_string(),
        Value::String(s) => s.trim().to_string(),
        _ => return None,
    };
    (mmsi.len() == 9 && mmsi.bytes().all(|b| b.is_ascii_digit())).then_some(mmsi)
}

/// A location given as `"lat, lon"` text, a `[lat, lon]` array, or an object
/// with `lat`/`lon` (or `latitude`/`longitude`) members.
fn parse_location(value: &Value) -> Option<LatLon> {
    match value {
        Value::String(s) => parse_lat_lon(s),
        Value::Array(pair) if pair.len() == 2 => {
            LatLon::checked(pair[0].as_f64()?, pair[1].as_f64()?)
        }
        Value::Object(obj) => {
            let lat = number(obj, "lat").or_else(|| number(obj, "latitude"))?;
            let lon = number(obj, "lon").or_else(|| number(obj, "longitude"))?;
            LatLon::checked(lat, lon)
        }
        _ => None,
    }
}

/// Parse a timestamp at millisecond resolution.
///
/// Accepts RFC 3339, `YYYY-MM-DD HH:MM:SS[.f]` (taken as UTC), and integer
/// epoch milliseconds.
pub(crate) fn parse_timestamp(value: &Value) -> Option<DateTime<Utc>> {
    let parsed = match value {
        Value::Number(n) => DateTime::from_timestamp_millis(n.as_i64()?)?,
        Value::String(s) => {
            let s = s.trim();
            match DateTime::parse_from_rfc3339(s) {
                Ok(dt) => dt.with_timezone(&Utc),
                Err(_) => NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S%.f")
                    .or_else(|_| NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S%.f"))
                    .ok()?
                    .and_utc(),
            }
        }
        _ => return None,
    };
    Some(parsed.trunc_subsecs(3))
}
