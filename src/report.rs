use std::{fmt::Display, path::Path, time::Duration};

use itertools::Itertools;
use log::info;
use serde::{Deserialize, Serialize};

use crate::{
    RoadGuardError,
    telemetry::{RoadCondition, TelemetryOutput, TripReading},
};

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct PotholeLocation {
    pub lat: f64,
    pub lng: f64,
    pub speed: f64,
}

/// Summary of one trip, built from the readings the poller produced for it.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct TripReport {
    pub trip_id: u64,
    pub started_at_ms: u128,
    pub ended_at_ms: Option<u128>,
    pub distance_km: f64,
    pub readings: usize,
    pub safe_readings: usize,
    pub unsafe_readings: usize,
    pub max_speed_kmh: f64,
    pub potholes: Vec<PotholeLocation>,
    speed_sum_kmh: f64,
}

impl TripReport {
    pub fn new(trip_id: u64, started_at_ms: u128) -> Self {
        Self {
            trip_id,
            started_at_ms,
            ..Default::default()
        }
    }

    pub fn record(&mut self, reading: &TripReading) {
        let speed = reading.snapshot.speed;
        self.readings += 1;
        self.speed_sum_kmh += speed;
        self.max_speed_kmh = self.max_speed_kmh.max(speed);
        self.distance_km = reading.distance_km;

        match reading.condition {
            RoadCondition::Safe => self.safe_readings += 1,
            RoadCondition::Unsafe => {
                self.unsafe_readings += 1;
                self.potholes.push(PotholeLocation {
                    lat: reading.snapshot.lat,
                    lng: reading.snapshot.lng,
                    speed,
                });
            }
        }
    }

    pub fn finish(&mut self, ended_at_ms: u128) {
        self.ended_at_ms = Some(ended_at_ms);
    }

    pub fn pothole_count(&self) -> usize {
        self.potholes.len()
    }

    pub fn average_speed_kmh(&self) -> f64 {
        if self.readings == 0 {
            return 0.;
        }
        self.speed_sum_kmh / self.readings as f64
    }

    pub fn duration(&self) -> Option<Duration> {
        let ended_at_ms = self.ended_at_ms?;
        let millis = ended_at_ms.saturating_sub(self.started_at_ms);
        Some(Duration::from_millis(u64::try_from(millis).unwrap_or(u64::MAX)))
    }
}

impl Display for TripReport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let duration = match self.duration() {
            Some(duration) => {
                let secs = duration.as_secs();
                format!("{:02}:{:02}:{:02}", secs / 3600, (secs / 60) % 60, secs % 60)
            }
            None => "in progress".to_string(),
        };

        writeln!(f, "RoadGuard trip report #{}", self.trip_id)?;
        writeln!(f, "  {:<22}{}", "Duration", duration)?;
        writeln!(f, "  {:<22}{:.2}", "Total distance (km)", self.distance_km)?;
        writeln!(
            f,
            "  {:<22}{:.2}",
            "Average speed (km/h)",
            self.average_speed_kmh()
        )?;
        writeln!(f, "  {:<22}{:.2}", "Max speed (km/h)", self.max_speed_kmh)?;
        writeln!(f, "  {:<22}{}", "Readings", self.readings)?;
        writeln!(f, "  {:<22}{}", "Safe", self.safe_readings)?;
        writeln!(f, "  {:<22}{}", "Unsafe", self.unsafe_readings)?;
        writeln!(f, "  {:<22}{}", "Total potholes", self.pothole_count())?;
        if !self.potholes.is_empty() {
            writeln!(f, "Pothole locations:")?;
            let locations = self
                .potholes
                .iter()
                .map(|p| {
                    format!(
                        "  Lat: {} | Lon: {} | Speed: {} km/h",
                        p.lat, p.lng, p.speed
                    )
                })
                .join("\n");
            writeln!(f, "{}", locations)?;
        }
        Ok(())
    }
}

/// Splits a telemetry stream into one report per trip.
///
/// A stream recorded while a trip was already running starts with readings and no
/// `TripStarted`: that trip's report begins at its first reading. Trips that never saw a
/// `TripEnded` are returned unfinished.
pub fn reports_from_outputs(outputs: impl IntoIterator<Item = TelemetryOutput>) -> Vec<TripReport> {
    let mut reports = Vec::new();
    let mut cur_report: Option<TripReport> = None;

    for output in outputs {
        match output {
            TelemetryOutput::TripStarted {
                trip_id,
                timestamp_ms,
            } => {
                if let Some(report) = cur_report.take() {
                    reports.push(report);
                }
                cur_report = Some(TripReport::new(trip_id, timestamp_ms));
            }
            TelemetryOutput::Reading(reading) => {
                if cur_report
                    .as_ref()
                    .is_some_and(|report| report.trip_id != reading.trip_id)
                {
                    reports.extend(cur_report.take());
                }
                cur_report
                    .get_or_insert_with(|| TripReport::new(reading.trip_id, reading.timestamp_ms))
                    .record(&reading);
            }
            TelemetryOutput::TripEnded {
                trip_id,
                timestamp_ms,
            } => {
                if let Some(mut report) = cur_report.take() {
                    if report.trip_id == trip_id {
                        report.finish(timestamp_ms);
                    }
                    reports.push(report);
                }
            }
            TelemetryOutput::Notice(_) => continue,
        }
    }
    reports.extend(cur_report);
    reports
}

pub fn load_trip_reports(source_file: &Path) -> Result<Vec<TripReport>, RoadGuardError> {
    if !source_file.is_file() {
        return Err(RoadGuardError::InvalidTelemetryFile {
            path: format!("{:?}", source_file),
        });
    }

    let telemetry_lines = serde_jsonlines::json_lines(source_file)
        .map_err(|e| RoadGuardError::TelemetryLoaderError { source: e })?
        .collect::<Result<Vec<TelemetryOutput>, std::io::Error>>()
        .map_err(|e| RoadGuardError::TelemetryLoaderError { source: e })?;

    let reports = reports_from_outputs(telemetry_lines);
    info!("Loaded {:?}, found {} trips", source_file, reports.len());
    Ok(reports)
}
