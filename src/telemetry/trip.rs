use log::{debug, warn};
use uom::si::length::kilometer;

use super::{GeoPosition, LiveSnapshot, TripReading, now_ms};

/// Identifies one poll request. Results are only applied when their ticket still
/// belongs to the running trip and is newer than anything already applied.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PollTicket {
    pub trip_id: u64,
    pub seq: u64,
}

/// Accumulated state of the current trip.
///
/// `pothole_count` and `distance_km` only change while the trip is active.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct TripState {
    active: bool,
    trip_id: u64,
    pothole_count: u32,
    distance_km: f64,
    last_position: Option<GeoPosition>,
    last_issued_seq: u64,
    last_applied_seq: u64,
}

impl TripState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_active(&self) -> bool {
        self.active
    }

    pub fn trip_id(&self) -> u64 {
        self.trip_id
    }

    pub fn pothole_count(&self) -> u32 {
        self.pothole_count
    }

    pub fn distance_km(&self) -> f64 {
        self.distance_km
    }

    pub fn last_position(&self) -> Option<GeoPosition> {
        self.last_position
    }

    /// Arms a new trip and returns its id. Calling this on a running trip re-arms the
    /// counters.
    pub fn start(&mut self) -> u64 {
        if self.active {
            warn!(
                "Trip {} restarted while running, counters reset",
                self.trip_id
            );
        }
        self.trip_id += 1;
        self.active = true;
        self.pothole_count = 0;
        self.distance_km = 0.;
        self.last_position = None;
        self.last_issued_seq = 0;
        self.last_applied_seq = 0;
        self.trip_id
    }

    /// Returns the id of the trip that just ended, None if no trip was running.
    pub fn end(&mut self) -> Option<u64> {
        if !self.active {
            return None;
        }
        self.active = false;
        Some(self.trip_id)
    }

    /// Hands out the ticket for the next poll, None while inactive.
    pub fn issue_ticket(&mut self) -> Option<PollTicket> {
        if !self.active {
            return None;
        }
        self.last_issued_seq += 1;
        Some(PollTicket {
            trip_id: self.trip_id,
            seq: self.last_issued_seq,
        })
    }

    /// Folds a snapshot into the trip. Stale results are dropped and leave the state
    /// untouched.
    pub fn apply(&mut self, ticket: PollTicket, snapshot: LiveSnapshot) -> Option<TripReading> {
        if !self.active || ticket.trip_id != self.trip_id {
            debug!(
                "Dropping snapshot for trip {} (current trip {}, active: {})",
                ticket.trip_id, self.trip_id, self.active
            );
            return None;
        }
        if ticket.seq <= self.last_applied_seq {
            debug!(
                "Dropping out of order snapshot {} (last applied {})",
                ticket.seq, self.last_applied_seq
            );
            return None;
        }
        self.last_applied_seq = ticket.seq;

        let condition = snapshot.condition();
        if snapshot.pothole == 1 {
            self.pothole_count += 1;
        }

        let position = snapshot.position();
        let leg_km = self
            .last_position
            .map(|previous| previous.distance_to(&position).get::<kilometer>());
        if let Some(leg) = leg_km {
            self.distance_km += leg;
        }
        self.last_position = Some(position);

        Some(TripReading {
            trip_id: self.trip_id,
            seq: ticket.seq,
            timestamp_ms: now_ms(),
            snapshot,
            condition,
            leg_km,
            pothole_count: self.pothole_count,
            distance_km: self.distance_km,
        })
    }
}
