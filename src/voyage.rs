//! Route reconstruction and voyage statistics from position history.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::MsaeError;
use crate::geo::{LatLon, distance_km};
use crate::model::{PositionSample, RecordId};

const MILLIS_PER_HOUR: f64 = 3_600_000.0;

/// Route and movement statistics for one vessel.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct VoyageStats {
    /// Positions in time order.
    pub polyline: Vec<LatLon>,

    /// Sum of great-circle legs between consecutive positions.
    pub total_distance_km: f64,

    /// Hours between the first and last sample.
    pub elapsed_hours: f64,

    /// `total_distance_km / elapsed_hours`, or 0 when no time has elapsed.
    pub average_speed_kmh: f64,

    /// Timestamp of the final sample.
    pub last_seen: Option<DateTime<Utc>>,
}

/// Group samples by vessel, keeping input order within each group.
pub fn group_tracks(samples: &[PositionSample]) -> HashMap<&RecordId, Vec<&PositionSample>> {
    let mut tracks: HashMap<&RecordId, Vec<&PositionSample>> = HashMap::new();
    for sample in samples {
        tracks.entry(&sample.vessel_id).or_default().push(sample);
    }
    tracks
}

/// Compute statistics for one vessel's samples, given in input order.
///
/// Samples are stably sorted by timestamp, so samples sharing an instant keep
/// their input order.
pub fn analyze_track(samples: &[&PositionSample]) -> Result<VoyageStats, MsaeError> {
    let mut ordered = samples.to_vec();
    ordered.sort_by_key(|s| s.timestamp);

    let polyline: Vec<LatLon> = ordered.iter().map(|s| s.position).collect();

    let mut total_distance_km = 0.0;
    for leg in polyline.windows(2) {
        total_distance_km += distance_km(leg[0], leg[1])?;
    }

    let elapsed_hours = match (ordered.first(), ordered.last()) {
        (Some(first), Some(last)) => {
            (last.timestamp - first.timestamp).num_milliseconds().abs() as f64 / MILLIS_PER_HOUR
        }
        _ => 0.0,
    };

    let average_speed_kmh = if elapsed_hours > 0.0 {
        total_distance_km / elapsed_hours
    } else {
        0.0
    };

    Ok(VoyageStats {
        polyline,
        total_distance_km,
        elapsed_hours,
        average_speed_kmh,
        last_seen: ordered.last().map(|s| s.timestamp),
    })
}
