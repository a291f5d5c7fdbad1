//! Situation reports: the single output of one snapshot/query pair.
//!
//! [`compute_situation`] runs the whole pipeline:
//!
//! 1. normalize the raw snapshot ([`crate::parser`])
//! 2. select vessels matching the operator query ([`crate::filter`])
//! 3. derive each vessel's route and statistics ([`crate::voyage`])
//! 4. classify hazard risk and collect port proximity alerts ([`crate::risk`])
//!
//! The pipeline is pure. Apart from `generated_at`, which comes from the
//! configured clock, the same inputs always produce an identical report.

use std::collections::{BTreeMap, HashMap};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};

use crate::config::EngineConfig;
use crate::error::MsaeError;
use crate::filter::filter_vessels;
use crate::model::{NormalizedSnapshot, RawSnapshot, RecordId, RiskState, Vessel, Voyage, Warnings};
use crate::parser::normalize;
use crate::risk::{Alert, NearestHazard, PortActivity, classify_risk, port_activity, proximity_alerts};
use crate::voyage::{VoyageStats, analyze_track, group_tracks};

/// Label used for vessels without a recorded type.
const UNSPECIFIED_TYPE: &str = "Unspecified";

/// One vessel that survived filtering, with everything derived from it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActiveVessel {
    pub vessel: Vessel,

    /// Route and movement statistics from position history.
    pub voyage: VoyageStats,

    pub risk_state: RiskState,

    pub nearest_hazard: Option<NearestHazard>,

    /// Voyage log entries for this vessel, in input order.
    pub voyages: Vec<Voyage>,
}

/// Record counts for the report.
///
/// Vessel, sample and voyage counts cover active vessels only; port and event
/// counts cover the whole normalized snapshot.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Totals {
    pub vessel_count: usize,
    pub port_count: usize,
    pub sample_count: usize,
    pub event_count: usize,
    pub voyage_count: usize,

    /// Sum of `voyage.total_distance_km` over active vessels.
    pub aggregate_distance_km: f64,
}

/// Fleet statistics over active vessels.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FleetSummary {
    pub by_status: BTreeMap<String, usize>,
    pub by_type: BTreeMap<String, usize>,
    pub at_risk_count: usize,
    pub voyages_by_status: BTreeMap<String, usize>,
}

impl FleetSummary {
    /// Compute the summary from the active vessels of a report.
    pub fn from_active(active: &[ActiveVessel]) -> Self {
        let mut summary = Self::default();

        for entry in active {
            *summary
                .by_status
                .entry(entry.vessel.status.label().to_string())
                .or_insert(0) += 1;

            let vessel_type = if entry.vessel.vessel_type.is_empty() {
                UNSPECIFIED_TYPE
            } else {
                entry.vessel.vessel_type.as_str()
            };
            *summary.by_type.entry(vessel_type.to_string()).or_insert(0) += 1;

            if entry.risk_state == RiskState::AtRisk {
                summary.at_risk_count += 1;
            }

            for voyage in &entry.voyages {
                *summary
                    .voyages_by_status
                    .entry(voyage.status.label().to_string())
                    .or_insert(0) += 1;
            }
        }

        summary
    }
}

/// Everything the console needs to render one refresh.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SituationReport {
    /// When this report was generated.
    pub generated_at: DateTime<Utc>,

    /// The operator query, as given.
    pub query: String,

    /// Vessels matching the query, in snapshot order.
    pub active_vessels: Vec<ActiveVessel>,

    /// Port proximity alerts, already truncated to `max_alerts`.
    pub alerts: Vec<Alert>,

    /// Records dropped during normalization.
    pub warnings: Warnings,

    pub totals: Totals,

    pub fleet: FleetSummary,

    /// Every port with the number of active vessels nearby.
    pub port_activity: Vec<PortActivity>,
}

/// Normalize `raw` and build the report for `query`.
///
/// Fails only when the snapshot is malformed or `config` is out of range;
/// individual bad records are counted in `warnings`.
#[instrument(skip_all, fields(query = %query))]
pub fn compute_situation(
    raw: &RawSnapshot,
    query: &str,
    config: &EngineConfig,
) -> Result<SituationReport, MsaeError> {
    config.validate()?;
    let snapshot = normalize(raw)?;
    build_report(&snapshot, query, config)
}

/// Build the report from an already-normalized snapshot.
pub fn situation_from_snapshot(
    snapshot: &NormalizedSnapshot,
    query: &str,
    config: &EngineConfig,
) -> Result<SituationReport, MsaeError> {
    config.validate()?;
    build_report(snapshot, query, config)
}

fn build_report(
    snapshot: &NormalizedSnapshot,
    query: &str,
    config: &EngineConfig,
) -> Result<SituationReport, MsaeError> {
    let generated_at = config.now();

    let selected = filter_vessels(&snapshot.vessels, query);
    let tracks = group_tracks(&snapshot.samples);

    let mut voyages_by_vessel: HashMap<&RecordId, Vec<&Voyage>> = HashMap::new();
    for voyage in &snapshot.voyages {
        voyages_by_vessel
            .entry(&voyage.vessel_id)
            .or_default()
            .push(voyage);
    }

    let mut active_vessels = Vec::with_capacity(selected.len());
    let mut totals = Totals {
        port_count: snapshot.ports.len(),
        event_count: snapshot.events.len(),
        ..Totals::default()
    };

    for vessel in &selected {
        let track = tracks.get(&vessel.id).map(Vec::as_slice).unwrap_or_default();
        let voyage = analyze_track(track)?;
        let risk = classify_risk(vessel, &snapshot.events, config.risk_radius_km)?;
        let voyages: Vec<Voyage> = voyages_by_vessel
            .get(&vessel.id)
            .map(|v| v.iter().map(|&voyage| voyage.clone()).collect())
            .unwrap_or_default();

        totals.sample_count += track.len();
        totals.voyage_count += voyages.len();
        totals.aggregate_distance_km += voyage.total_distance_km;

        active_vessels.push(ActiveVessel {
            vessel: (*vessel).clone(),
            voyage,
            risk_state: risk.risk_state,
            nearest_hazard: risk.nearest_hazard,
            voyages,
        });
    }
    totals.vessel_count = active_vessels.len();

    let alerts = proximity_alerts(
        &selected,
        &snapshot.ports,
        config.alert_radius_km,
        config.max_alerts,
    )?;
    let port_activity = port_activity(&selected, &snapshot.ports, config.alert_radius_km)?;
    let fleet = FleetSummary::from_active(&active_vessels);

    debug!(
        active = totals.vessel_count,
        alerts = alerts.len(),
        at_risk = fleet.at_risk_count,
        dropped = snapshot.warnings.total_dropped(),
        "Situation computed"
    );

    Ok(SituationReport {
        generated_at,
        query: query.to_string(),
        active_vessels,
        alerts,
        warnings: snapshot.warnings.clone(),
        totals,
        fleet,
        port_activity,
    })
}
