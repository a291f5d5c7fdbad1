//! End-to-end scenarios for report computation.
//!
//! Each test feeds a raw snapshot document through `compute_situation` and
//! checks the resulting report, the way the console would consume it.

use std::collections::BTreeSet;

use chrono::{TimeZone, Utc};
use serde_json::{Value, json};

use seawatch::config::EngineConfig;
use seawatch::geo::LatLon;
use seawatch::model::{RawSnapshot, RecordId, RiskState};
use seawatch::{SituationReport, compute_situation};

fn engine() -> EngineConfig {
    EngineConfig::default().fixed_clock(Utc.with_ymd_and_hms(2024, 3, 1, 0, 0, 0).unwrap())
}

fn run(document: Value, query: &str, config: &EngineConfig) -> SituationReport {
    let raw = RawSnapshot::from_json(document).unwrap();
    compute_situation(&raw, query, config).unwrap()
}

fn vessel(id: i64, name: &str, lat: f64, lon: f64) -> Value {
    json!({ "id": id, "name": name, "status": "Active",
            "last_position_lat": lat, "last_position_lon": lon })
}

fn sample(vessel: i64, lat: f64, lon: f64, timestamp: &str) -> Value {
    json!({ "vessel": vessel, "latitude": lat, "longitude": lon, "timestamp": timestamp })
}

fn snapshot(vessels: Vec<Value>, ports: Vec<Value>, history: Vec<Value>, events: Vec<Value>) -> Value {
    json!({
        "vessels": vessels,
        "ports": ports,
        "history": history,
        "events": events,
        "voyages": []
    })
}

fn at_risk_ids(report: &SituationReport) -> BTreeSet<RecordId> {
    report
        .active_vessels
        .iter()
        .filter(|a| a.risk_state == RiskState::AtRisk)
        .map(|a| a.vessel.id.clone())
        .collect()
}

/// A mixed fleet used by the property checks.
fn mixed_fleet() -> Value {
    snapshot(
        vec![
            vessel(1, "Alpha Star", 12.0, 45.0),
            vessel(2, "Beta Runner", 18.92, 72.83),
            vessel(3, "Gamma Ray", 5.0, 80.0),
            vessel(4, "Delta Dawn", 19.28, 72.86),
            json!({ "id": 5, "name": "No Position" }),
        ],
        vec![
            json!({ "id": 1, "name": "Mumbai", "location": "19.29,72.85" }),
            json!({ "id": 2, "name": "Colombo", "location": "6.94,79.84" }),
        ],
        vec![
            sample(1, 12.0, 45.0, "2024-02-29T00:00:00Z"),
            sample(1, 12.2, 45.1, "2024-02-29T02:00:00Z"),
            sample(1, 12.1, 45.0, "2024-02-29T01:00:00Z"),
            sample(3, 5.0, 80.0, "2024-02-29T05:00:00Z"),
            sample(3, 5.0, 80.0, "2024-02-29T05:00:00Z"),
        ],
        vec![
            json!({ "id": 1, "event_type": "Storm", "location": "12.5,45.0" }),
            json!({ "id": 2, "event_type": "Piracy", "location": "3.0,75.0" }),
            json!({ "id": 3, "event_type": "Storm", "location": "19.0,72.0",
                    "severity_radius_km": 10 }),
        ],
    )
}

#[test]
fn test_single_vessel_two_samples() {
    let document = snapshot(
        vec![vessel(1, "V1", 19.00, 72.85)],
        vec![],
        vec![
            sample(1, 19.00, 72.85, "2024-02-29T00:00:00Z"),
            sample(1, 19.09, 72.85, "2024-02-29T01:00:00Z"),
        ],
        vec![],
    );

    let report = run(document, "", &engine());

    assert_eq!(report.active_vessels.len(), 1);
    let active = &report.active_vessels[0];
    assert!((active.voyage.total_distance_km - 10.007).abs() < 0.01);
    assert_eq!(active.voyage.elapsed_hours, 1.0);
    assert!((active.voyage.average_speed_kmh - 10.007).abs() < 0.01);
    assert_eq!(active.risk_state, RiskState::Nominal);
    assert!(active.nearest_hazard.is_none());
    assert!(report.alerts.is_empty());
}

#[test]
fn test_alert_threshold() {
    let document = snapshot(
        vec![vessel(1, "V1", 18.92, 72.83)],
        vec![json!({ "id": 1, "name": "Mumbai", "location": "19.29, 72.85" })],
        vec![],
        vec![],
    );

    let config = engine().with_alert_radius_km(50.0).with_max_alerts(5);
    let report = run(document.clone(), "", &config);
    assert_eq!(report.alerts.len(), 1);
    assert_eq!(report.alerts[0].message, "⚠ V1 within 42km of Mumbai");
    assert!((report.alerts[0].distance_km - 41.2).abs() < 0.1);

    let report = run(document, "", &config.with_alert_radius_km(40.0));
    assert!(report.alerts.is_empty());
}

#[test]
fn test_risk_classification() {
    let document = snapshot(
        vec![vessel(1, "V1", 12.00, 45.00)],
        vec![],
        vec![],
        vec![json!({ "id": "H1", "event_type": "Storm", "location": "12.50,45.00" })],
    );

    let report = run(document.clone(), "", &engine());
    let active = &report.active_vessels[0];
    assert_eq!(active.risk_state, RiskState::AtRisk);
    let nearest = active.nearest_hazard.as_ref().unwrap();
    assert_eq!(nearest.hazard.id, RecordId::from("H1"));
    assert!((nearest.distance_km - 55.6).abs() < 0.1);

    let report = run(document, "", &engine().with_risk_radius_km(50.0));
    assert_eq!(report.active_vessels[0].risk_state, RiskState::Nominal);
}

#[test]
fn test_query_by_mmsi_digits() {
    let document = snapshot(
        vec![
            json!({ "id": 1, "name": "Alpha", "mmsi": 123456789,
                    "last_position_lat": 0.0, "last_position_lon": 0.0 }),
            json!({ "id": 2, "name": "Beta", "mmsi": "987654321",
                    "last_position_lat": 1.0, "last_position_lon": 1.0 }),
        ],
        vec![],
        vec![],
        vec![],
    );

    let names = |query: &str| -> Vec<String> {
        run(document.clone(), query, &engine())
            .active_vessels
            .into_iter()
            .map(|a| a.vessel.name)
            .collect()
    };

    assert_eq!(names("456"), vec!["Alpha"]);
    assert_eq!(names("alpha"), vec!["Alpha"]);
    assert_eq!(names("  ALPHA "), vec!["Alpha"]);
    assert_eq!(names("a"), vec!["Alpha", "Beta"]);
    assert!(names("zulu").is_empty());
}

#[test]
fn test_zero_elapsed_duplicate_timestamps() {
    let document = snapshot(
        vec![vessel(1, "V1", 19.00, 72.85)],
        vec![],
        vec![
            sample(1, 19.00, 72.85, "2024-02-29T06:00:00Z"),
            sample(1, 19.09, 72.85, "2024-02-29T06:00:00Z"),
        ],
        vec![],
    );

    let report = run(document, "", &engine());
    let voyage = &report.active_vessels[0].voyage;

    assert!((voyage.total_distance_km - 10.0).abs() < 0.05);
    assert_eq!(voyage.elapsed_hours, 0.0);
    assert_eq!(voyage.average_speed_kmh, 0.0);
    assert!(voyage.average_speed_kmh.is_finite());
}

#[test]
fn test_malformed_records_are_counted() {
    let document = snapshot(
        vec![
            vessel(1, "Keeper", 10.0, 60.0),
            json!({ "id": 2, "name": "Half Fix", "last_position_lon": 61.0 }),
            vessel(3, "Other Keeper", 11.0, 61.0),
        ],
        vec![
            json!({ "id": 1, "name": "Good", "location": "10.5,60.5" }),
            json!({ "id": 2, "name": "Bad", "location": "oops" }),
        ],
        vec![sample(1, 10.0, 60.0, "2024-02-29T00:00:00Z")],
        vec![],
    );

    let report = run(document, "", &engine());

    assert_eq!(report.active_vessels.len(), 2);
    assert_eq!(report.warnings.dropped_vessels, 1);
    assert_eq!(report.warnings.dropped_ports, 1);
    assert_eq!(report.warnings.dropped_samples, 0);
    assert_eq!(report.totals.port_count, 1);
}

#[test]
fn test_missing_endpoints_are_reported() {
    let document = json!({
        "vessels": [vessel(1, "Lone", 0.0, 0.0)],
        "ports": null
    });

    let report = run(document, "", &engine());

    assert_eq!(report.active_vessels.len(), 1);
    assert_eq!(
        report.warnings.missing_endpoints,
        vec!["ports", "history", "events", "voyages"]
    );
}

#[test]
fn test_active_vessels_are_subset_of_snapshot() {
    let raw = RawSnapshot::from_json(mixed_fleet()).unwrap();
    let all: BTreeSet<RecordId> = (1..=5).map(RecordId::Num).collect();

    for query in ["", "a", "alpha", "ray", "72", "zzz", " "] {
        let report = compute_situation(&raw, query, &engine()).unwrap();
        for active in &report.active_vessels {
            assert!(all.contains(&active.vessel.id), "query {query:?}");
        }
    }
}

#[test]
fn test_empty_query_selects_every_valid_vessel() {
    let report = run(mixed_fleet(), "", &engine());

    assert_eq!(report.active_vessels.len(), 4);
    assert_eq!(report.warnings.dropped_vessels, 1);
}

#[test]
fn test_voyage_stats_are_finite() {
    let report = run(mixed_fleet(), "", &engine());

    for active in &report.active_vessels {
        let voyage = &active.voyage;
        assert!(voyage.total_distance_km.is_finite() && voyage.total_distance_km >= 0.0);
        assert!(voyage.average_speed_kmh.is_finite() && voyage.average_speed_kmh >= 0.0);
        assert!(voyage.elapsed_hours.is_finite() && voyage.elapsed_hours >= 0.0);
    }
}

#[test]
fn test_reports_are_deterministic() {
    let raw = RawSnapshot::from_json(mixed_fleet()).unwrap();
    let config = engine().with_alert_radius_km(100.0);

    let first = compute_situation(&raw, "a", &config).unwrap();
    let second = compute_situation(&raw, "a", &config).unwrap();

    assert_eq!(first, second);
    assert_eq!(
        serde_json::to_string(&first).unwrap(),
        serde_json::to_string(&second).unwrap()
    );
}

#[test]
fn test_alerts_never_exceed_cap() {
    let raw = RawSnapshot::from_json(mixed_fleet()).unwrap();

    for max_alerts in 0..4 {
        let config = engine().with_alert_radius_km(5000.0).with_max_alerts(max_alerts);
        let report = compute_situation(&raw, "", &config).unwrap();
        assert_eq!(report.alerts.len(), max_alerts);
    }

    // Closest pair first: Delta Dawn sits ~1 km from Mumbai.
    let report = compute_situation(&raw, "", &engine().with_alert_radius_km(5000.0)).unwrap();
    assert_eq!(report.alerts[0].vessel_name, "Delta Dawn");
    assert!(
        report
            .alerts
            .windows(2)
            .all(|pair| pair[0].distance_km <= pair[1].distance_km)
    );
}

#[test]
fn test_risk_is_monotonic_in_radius() {
    let raw = RawSnapshot::from_json(mixed_fleet()).unwrap();

    let mut previous = BTreeSet::new();
    for radius in [1.0, 50.0, 60.0, 200.0, 600.0, 2000.0, 20000.0] {
        let report = compute_situation(&raw, "", &engine().with_risk_radius_km(radius)).unwrap();
        let current = at_risk_ids(&report);
        assert!(
            previous.is_subset(&current),
            "radius {radius} lost {:?}",
            previous.difference(&current).collect::<Vec<_>>()
        );
        previous = current;
    }
    assert_eq!(previous.len(), 4);
}

#[test]
fn test_equal_timestamps_keep_input_order() {
    let t = "2024-02-29T03:00:00Z";
    let forward = vec![
        sample(1, 0.0, 0.0, "2024-02-29T02:00:00Z"),
        sample(1, 1.0, 0.0, t),
        sample(1, -1.0, 0.0, t),
    ];
    let mut reversed = forward.clone();
    reversed.reverse();

    let voyage_for = |history: Vec<Value>| {
        let document = snapshot(vec![vessel(1, "V1", 0.0, 0.0)], vec![], history, vec![]);
        run(document, "", &engine()).active_vessels[0].voyage.clone()
    };
    let a = voyage_for(forward);
    let b = voyage_for(reversed);

    let origin = LatLon::new(0.0, 0.0);
    let north = LatLon::new(1.0, 0.0);
    let south = LatLon::new(-1.0, 0.0);
    assert_eq!(a.polyline, vec![origin, north, south]);
    assert_eq!(b.polyline, vec![origin, south, north]);
    assert!((a.total_distance_km - b.total_distance_km).abs() < 1e-9);
    assert_eq!(a.elapsed_hours, b.elapsed_hours);
}

#[test]
fn test_unknown_vessel_id_leaves_named_track_alone() {
    let document = snapshot(
        vec![vessel(1, "Sea Stallion", 10.0, 65.0)],
        vec![],
        vec![
            sample(1, 10.0, 65.0, "2024-02-29T00:00:00Z"),
            json!({ "vessel": 99, "vessel_name": "Sea Stallion", "latitude": 40.0,
                    "longitude": -30.0, "timestamp": "2024-02-29T01:00:00Z" }),
        ],
        vec![],
    );

    let report = run(document, "", &engine());
    let voyage = &report.active_vessels[0].voyage;

    assert_eq!(report.warnings.dropped_samples, 1);
    assert_eq!(voyage.polyline.len(), 1);
    assert_eq!(voyage.total_distance_km, 0.0);
}
