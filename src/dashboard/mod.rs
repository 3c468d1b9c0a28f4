pub mod rolling;

use simple_moving_average::{SMA, SumTreeSMA};

use crate::telemetry::{RoadCondition, TelemetryOutput};

pub use rolling::RollingSeries;

/// Number of speed samples kept for the chart
pub const SPEED_HISTORY_POINTS: usize = 15;

pub type SpeedSeries = RollingSeries<f64, SPEED_HISTORY_POINTS>;

/// What the dashboard shows, independent of how it is drawn.
///
/// The display layer reads the labels and iterates [`Dashboard::speed_series`] to draw the
/// chart; nothing here knows about rendering.
pub struct Dashboard {
    trip_active: bool,
    speed_label: String,
    status: Option<RoadCondition>,
    pothole_count: u32,
    distance_label: String,
    speed_series: SpeedSeries,
    average_speed: SumTreeSMA<f64, f64, SPEED_HISTORY_POINTS>,
    notice: Option<String>,
}

impl Default for Dashboard {
    fn default() -> Self {
        Self {
            trip_active: false,
            speed_label: format_speed(0.),
            status: None,
            pothole_count: 0,
            distance_label: format_distance(0.),
            speed_series: SpeedSeries::new(),
            average_speed: SumTreeSMA::new(),
            notice: None,
        }
    }
}

impl Dashboard {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn apply(&mut self, output: &TelemetryOutput) {
        match output {
            TelemetryOutput::TripStarted { .. } => {
                self.trip_active = true;
                self.pothole_count = 0;
                self.distance_label = format_distance(0.);
                self.notice = Some("Trip started".to_string());
            }
            TelemetryOutput::Reading(reading) => {
                let speed = reading.snapshot.speed;
                self.speed_label = format_speed(speed);
                self.status = Some(reading.condition);
                if reading.condition == RoadCondition::Unsafe {
                    self.pothole_count = reading.pothole_count;
                }
                // distance only moves once there is a previous position
                if reading.leg_km.is_some() {
                    self.distance_label = format_distance(reading.distance_km);
                }
                self.speed_series.push(speed);
                self.average_speed.add_sample(speed);
            }
            TelemetryOutput::TripEnded { .. } => {
                self.trip_active = false;
                self.notice = Some("Trip ended".to_string());
            }
            TelemetryOutput::Notice(message) => {
                self.notice = Some(message.clone());
            }
        }
    }

    pub fn is_trip_active(&self) -> bool {
        self.trip_active
    }

    pub fn speed_label(&self) -> &str {
        &self.speed_label
    }

    pub fn status(&self) -> Option<RoadCondition> {
        self.status
    }

    /// "SAFE" or "UNSAFE", "--" before the first reading
    pub fn status_label(&self) -> String {
        self.status
            .map(|status| status.to_string())
            .unwrap_or_else(|| "--".to_string())
    }

    pub fn potholes_label(&self) -> String {
        self.pothole_count.to_string()
    }

    pub fn distance_label(&self) -> &str {
        &self.distance_label
    }

    pub fn speed_series(&self) -> &SpeedSeries {
        &self.speed_series
    }

    /// Chart coordinates, x is the position in the rolling window.
    pub fn chart_points(&self) -> impl Iterator<Item = [f64; 2]> + '_ {
        self.speed_series
            .iter()
            .enumerate()
            .map(|(x, speed)| [x as f64, *speed])
    }

    /// Mean of the samples currently in the chart window
    pub fn average_speed(&self) -> Option<f64> {
        if self.speed_series.is_empty() {
            return None;
        }
        Some(self.average_speed.get_average())
    }

    pub fn notice(&self) -> Option<&str> {
        self.notice.as_deref()
    }

    pub fn dismiss_notice(&mut self) {
        self.notice = None;
    }
}

pub fn format_speed(speed: f64) -> String {
    format!("{} km/h", speed)
}

pub fn format_distance(distance_km: f64) -> String {
    format!("{:.2} km", distance_km)
}
