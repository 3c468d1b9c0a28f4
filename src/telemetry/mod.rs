pub mod backend;
pub mod geo;
pub mod poller;
pub mod trip;

use std::{
    fmt::Display,
    time::{SystemTime, UNIX_EPOCH},
};

use serde::{Deserialize, Serialize};

pub use backend::{HttpTelemetryBackend, MockTelemetryBackend, TelemetryBackend};
pub use geo::{GeoPosition, calculate_distance};
pub use poller::{TripCommand, TripPoller};
pub use trip::{PollTicket, TripState};

/// One reading of the live endpoint, exactly as the backend serves it.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct LiveSnapshot {
    /// Current speed in km/h
    pub speed: f64,
    /// 1 when the detector flagged a pothole, 0 otherwise
    pub pothole: u8,
    /// Latitude in decimal degrees
    pub lat: f64,
    /// Longitude in decimal degrees
    pub lng: f64,
}

impl LiveSnapshot {
    pub fn position(&self) -> GeoPosition {
        GeoPosition::new(self.lat, self.lng)
    }

    pub fn condition(&self) -> RoadCondition {
        if self.pothole == 1 {
            RoadCondition::Unsafe
        } else {
            RoadCondition::Safe
        }
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum RoadCondition {
    #[default]
    Safe,
    Unsafe,
}

impl Display for RoadCondition {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RoadCondition::Safe => write!(f, "SAFE"),
            RoadCondition::Unsafe => write!(f, "UNSAFE"),
        }
    }
}

/// A snapshot after it has been folded into the running trip.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct TripReading {
    pub trip_id: u64,
    pub seq: u64,
    pub timestamp_ms: u128,
    pub snapshot: LiveSnapshot,
    pub condition: RoadCondition,
    /// Distance covered since the previous reading, None on the first reading of a trip
    pub leg_km: Option<f64>,
    pub pothole_count: u32,
    pub distance_km: f64,
}

/// Everything the poller broadcasts to the dashboard and the recorder.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum TelemetryOutput {
    TripStarted { trip_id: u64, timestamp_ms: u128 },
    Reading(Box<TripReading>),
    TripEnded { trip_id: u64, timestamp_ms: u128 },
    Notice(String),
}

pub(crate) fn now_ms() -> u128 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_millis()
}
