//! Hazard risk classification and port proximity alerts.

use std::cmp::Ordering;

use serde::{Deserialize, Serialize};

use crate::error::MsaeError;
use crate::geo::distance_km;
use crate::model::{HazardEvent, Port, RecordId, RiskState, Vessel};

/// The closest hazard whose radius contains a vessel.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NearestHazard {
    pub hazard: HazardEvent,
    pub distance_km: f64,
}

/// Risk classification of one vessel.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RiskAssessment {
    pub risk_state: RiskState,
    pub nearest_hazard: Option<NearestHazard>,
}

/// A vessel within the alert radius of a port.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Alert {
    pub vessel_id: RecordId,
    pub vessel_name: String,
    pub port_id: RecordId,
    pub port_name: String,
    pub distance_km: f64,

    /// Render-ready sentence, e.g. `"⚠ Ocean Voyager within 42km of Mumbai"`.
    pub message: String,
}

/// Number of vessels near one port.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PortActivity {
    pub port_id: RecordId,
    pub port_name: String,
    pub vessels_nearby: usize,
}

/// Classify a vessel against all hazards.
///
/// A vessel is at risk when it lies strictly inside some hazard's radius. A
/// hazard's own `severity_radius_km` takes precedence over `default_radius_km`.
/// Among containing hazards the nearest is reported, ties going to the lowest
/// hazard id.
pub fn classify_risk(
    vessel: &Vessel,
    hazards: &[HazardEvent],
    default_radius_km: f64,
) -> Result<RiskAssessment, MsaeError> {
    let mut nearest: Option<(&HazardEvent, f64)> = None;

    for hazard in hazards {
        let distance = distance_km(vessel.last_position, hazard.location)?;
        if distance >= hazard.risk_radius_km(default_radius_km) {
            continue;
        }
        let closer = match nearest {
            None => true,
            Some((best, best_distance)) => match distance.total_cmp(&best_distance) {
                Ordering::Less => true,
                Ordering::Equal => hazard.id < best.id,
                Ordering::Greater => false,
            },
        };
        if closer {
            nearest = Some((hazard, distance));
        }
    }

    Ok(match nearest {
        Some((hazard, distance_km)) => RiskAssessment {
            risk_state: RiskState::AtRisk,
            nearest_hazard: Some(NearestHazard {
                hazard: hazard.clone(),
                distance_km,
            }),
        },
        None => RiskAssessment {
            risk_state: RiskState::Nominal,
            nearest_hazard: None,
        },
    })
}

/// Render the alert sentence. Distance is rounded up to whole kilometers.
pub fn alert_message(vessel_name: &str, distance_km: f64, port_name: &str) -> String {
    format!(
        "⚠ {} within {}km of {}",
        vessel_name,
        distance_km.ceil() as u64,
        port_name
    )
}

/// All vessel/port pairs closer than `alert_radius_km`, nearest first, ties
/// ordered by vessel id then port id, truncated to `max_alerts`.
pub fn proximity_alerts(
    vessels: &[&Vessel],
    ports: &[Port],
    alert_radius_km: f64,
    max_alerts: usize,
) -> Result<Vec<Alert>, MsaeError> {
    if max_alerts == 0 {
        return Ok(Vec::new());
    }

    let mut candidates: Vec<(f64, &Vessel, &Port)> = Vec::new();
    for vessel in vessels {
        for port in ports {
            let distance = distance_km(vessel.last_position, port.location)?;
            if distance < alert_radius_km {
                candidates.push((distance, *vessel, port));
            }
        }
    }

    candidates.sort_by(|a, b| {
        a.0.total_cmp(&b.0)
            .then_with(|| a.1.id.cmp(&b.1.id))
            .then_with(|| a.2.id.cmp(&b.2.id))
    });

    Ok(candidates
        .into_iter()
        .take(max_alerts)
        .map(|(distance, vessel, port)| Alert {
            vessel_id: vessel.id.clone(),
            vessel_name: vessel.name.clone(),
            port_id: port.id.clone(),
            port_name: port.name.clone(),
            distance_km: distance,
            message: alert_message(&vessel.name, distance, &port.name),
        })
        .collect())
}

/// For every port, in input order, count the vessels within `alert_radius_km`.
pub fn port_activity(
    vessels: &[&Vessel],
    ports: &[Port],
    alert_radius_km: f64,
) -> Result<Vec<PortActivity>, MsaeError> {
    ports
        .iter()
        .map(|port| -> Result<PortActivity, MsaeError> {
            let mut vessels_nearby = 0;
            for vessel in vessels {
                if distance_km(vessel.last_position, port.location)? < alert_radius_km {
                    vessels_nearby += 1;
                }
            }
            Ok(PortActivity {
                port_id: port.id.clone(),
                port_name: port.name.clone(),
                vessels_nearby,
            })
        })
        .collect()
}
