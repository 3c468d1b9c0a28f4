use std::{sync::mpsc::Sender, time::Duration};

use log::{debug, info, warn};
use tokio::{sync::mpsc::UnboundedReceiver, time::MissedTickBehavior};

use crate::{RoadGuardError, report::TripReport};

use super::{TelemetryBackend, TelemetryOutput, TripState, now_ms};

pub const POLL_INTERVAL_MS: u64 = 2000;

/// Requests coming from the dashboard.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TripCommand {
    StartTrip,
    EndTrip,
}

/// Drives the trip: owns the [`TripState`], polls the backend while a trip is running and
/// broadcasts every change as a [`TelemetryOutput`].
///
/// Polls are serialized: a fetch is awaited before the next tick is taken and late ticks
/// are skipped rather than bursted. Commands queued during a fetch are handled right after
/// it completes.
pub struct TripPoller<B: TelemetryBackend> {
    backend: B,
    trip: TripState,
    report: Option<TripReport>,
    poll_interval: Duration,
    commands: UnboundedReceiver<TripCommand>,
    telemetry_sender: Sender<TelemetryOutput>,
    telemetry_writer_sender: Option<Sender<TelemetryOutput>>,
}

impl<B: TelemetryBackend> TripPoller<B> {
    pub fn new(
        backend: B,
        poll_interval: Duration,
        commands: UnboundedReceiver<TripCommand>,
        telemetry_sender: Sender<TelemetryOutput>,
        telemetry_writer_sender: Option<Sender<TelemetryOutput>>,
    ) -> Self {
        Self {
            backend,
            trip: TripState::new(),
            report: None,
            poll_interval,
            commands,
            telemetry_sender,
            telemetry_writer_sender,
        }
    }

    pub fn trip(&self) -> &TripState {
        &self.trip
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    /// Runs until the command channel is closed or the dashboard stops listening.
    ///
    /// # Errors
    ///
    /// Returns `InvalidPollInterval` for a zero poll interval, and an error once the
    /// dashboard receiver is gone.
    pub async fn run(&mut self) -> Result<(), RoadGuardError> {
        if self.poll_interval.is_zero() {
            return Err(RoadGuardError::InvalidPollInterval);
        }
        let mut ticker = tokio::time::interval(self.poll_interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

        loop {
            tokio::select! {
                biased;

                command = self.commands.recv() => match command {
                    Some(command) => self.handle_command(command).await?,
                    None => {
                        info!("Command channel closed, stopping poller");
                        break;
                    }
                },
                _ = ticker.tick() => self.poll_once().await?,
            }
        }
        Ok(())
    }

    pub async fn handle_command(&mut self, command: TripCommand) -> Result<(), RoadGuardError> {
        debug!("Handling {:?}", command);
        match command {
            TripCommand::StartTrip => self.start_trip().await,
            TripCommand::EndTrip => self.end_trip().await,
        }
    }

    async fn start_trip(&mut self) -> Result<(), RoadGuardError> {
        if let Err(e) = self.backend.start_trip().await {
            warn!("Could not start trip: {}", e);
            return self.broadcast(TelemetryOutput::Notice(format!(
                "Could not start trip: {}",
                e
            )));
        }

        let trip_id = self.trip.start();
        let timestamp_ms = now_ms();
        info!("Trip {} started", trip_id);
        self.report = Some(TripReport::new(trip_id, timestamp_ms));
        self.broadcast(TelemetryOutput::TripStarted {
            trip_id,
            timestamp_ms,
        })
    }

    async fn end_trip(&mut self) -> Result<(), RoadGuardError> {
        let Some(trip_id) = self.trip.end() else {
            debug!("No trip running, ignoring end request");
            return Ok(());
        };

        let timestamp_ms = now_ms();
        if let Some(mut report) = self.report.take() {
            report.finish(timestamp_ms);
            info!("Trip {} ended\n{}", trip_id, report);
        }
        self.broadcast(TelemetryOutput::TripEnded {
            trip_id,
            timestamp_ms,
        })?;

        // the trip is over locally whatever the server answers
        if let Err(e) = self.backend.end_trip().await {
            warn!("Could not signal end of trip {}: {}", trip_id, e);
            self.broadcast(TelemetryOutput::Notice(format!(
                "Could not end trip on server: {}",
                e
            )))?;
        }
        Ok(())
    }

    /// Fetches and applies one snapshot. Does nothing while no trip is running; a failed
    /// fetch only skips the tick.
    pub async fn poll_once(&mut self) -> Result<(), RoadGuardError> {
        let Some(ticket) = self.trip.issue_ticket() else {
            return Ok(());
        };

        let snapshot = match self.backend.live().await {
            Ok(snapshot) => snapshot,
            Err(e) => {
                warn!("Skipping poll {}: {}", ticket.seq, e);
                return Ok(());
            }
        };

        match self.trip.apply(ticket, snapshot) {
            Some(reading) => {
                if let Some(report) = self.report.as_mut() {
                    report.record(&reading);
                }
                self.broadcast(TelemetryOutput::Reading(Box::new(reading)))
            }
            None => Ok(()),
        }
    }

    fn broadcast(&mut self, output: TelemetryOutput) -> Result<(), RoadGuardError> {
        let writer_stopped = self
            .telemetry_writer_sender
            .as_ref()
            .is_some_and(|writer| writer.send(output.clone()).is_err());
        if writer_stopped {
            warn!("Telemetry writer stopped, recording disabled");
            self.telemetry_writer_sender = None;
        }

        self.telemetry_sender.send(output)?;
        Ok(())
    }
}
