mod dashboard_view;

use std::{
    sync::mpsc::Receiver,
    time::{Duration, Instant},
};

use egui::{Color32, Pos2, Visuals, style::Widgets};
use log::error;
use roadguard::{
    AppConfig, Dashboard, RoadCondition, TelemetryOutput, TripCommand, config::WindowPosition,
};
use tokio::sync::mpsc::UnboundedSender;

const REFRESH_RATE_MS: u64 = 100;
const MAX_OUTPUTS_PER_REFRESH: usize = 10;
const MAX_TIME_PER_REFRESH_MS: u128 = 50;

pub(crate) const PALETTE_BLACK: Color32 = Color32::from_rgb(12, 12, 12);
pub(crate) const PALETTE_SLATE: Color32 = Color32::from_rgb(30, 41, 59);
pub(crate) const PALETTE_GREEN: Color32 = Color32::from_rgb(34, 197, 94);
pub(crate) const PALETTE_RED: Color32 = Color32::from_rgb(239, 68, 68);

const DEFAULT_BUTTON_CORNER_RADIUS: u8 = 4;
const DEFAULT_WINDOW_CORNER_RADIUS: u8 = 10;

pub(crate) fn condition_color(condition: Option<RoadCondition>) -> Color32 {
    match condition {
        Some(RoadCondition::Safe) => PALETTE_GREEN,
        Some(RoadCondition::Unsafe) => PALETTE_RED,
        None => Color32::GRAY,
    }
}

pub(crate) fn window_position(position: WindowPosition) -> Pos2 {
    Pos2::new(position.x, position.y)
}

/// `LiveDashboardApp` shows the running trip: live labels, road status and the rolling
/// speed chart, plus the buttons that start and end a trip.
///
/// Telemetry arrives from the poller thread on `telemetry_receiver`; button presses go
/// back to it on `command_sender`.
pub(crate) struct LiveDashboardApp {
    telemetry_receiver: Receiver<TelemetryOutput>,
    command_sender: Option<UnboundedSender<TripCommand>>,
    dashboard: Dashboard,
    app_config: AppConfig,
}

impl LiveDashboardApp {
    pub(crate) fn new(
        telemetry_receiver: Receiver<TelemetryOutput>,
        command_sender: UnboundedSender<TripCommand>,
        app_config: AppConfig,
        cc: &eframe::CreationContext<'_>,
    ) -> Self {
        let default_visuals = Visuals {
            dark_mode: true,
            faint_bg_color: PALETTE_BLACK,
            extreme_bg_color: PALETTE_SLATE,
            panel_fill: PALETTE_BLACK,
            button_frame: true,
            window_fill: PALETTE_BLACK,
            widgets: Widgets::dark(),
            striped: false,
            ..Default::default()
        };
        cc.egui_ctx.set_visuals(default_visuals);

        Self {
            telemetry_receiver,
            command_sender: Some(command_sender),
            dashboard: Dashboard::new(),
            app_config,
        }
    }

    fn send_command(&mut self, command: TripCommand) {
        let sent = self
            .command_sender
            .as_ref()
            .is_some_and(|sender| sender.send(command).is_ok());
        if !sent {
            error!("Could not send {:?} to the poller", command);
            self.dashboard.apply(&TelemetryOutput::Notice(
                "Telemetry poller is not running".to_string(),
            ));
        }
    }
}

impl eframe::App for LiveDashboardApp {
    fn on_exit(&mut self, _gl: Option<&eframe::glow::Context>) {
        // closing the command channel stops the poller
        self.command_sender = None;

        if let Err(e) = self.app_config.save() {
            error!("Error while saving config file: {}", e);
        }
    }

    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        // consume a few outputs and then exit the loop to avoid blocking the UI
        let start_refresh = Instant::now();
        let mut outputs_processed = 0;
        while let Ok(output) = self.telemetry_receiver.try_recv() {
            self.dashboard.apply(&output);
            outputs_processed += 1;
            if outputs_processed >= MAX_OUTPUTS_PER_REFRESH
                || start_refresh.elapsed().as_millis() >= MAX_TIME_PER_REFRESH_MS
            {
                break;
            }
        }

        if let Some(outer_rect) = ctx.input(|is| is.viewport().outer_rect) {
            self.app_config.window_position = WindowPosition {
                x: outer_rect.min.x,
                y: outer_rect.min.y,
            };
        }

        self.dashboard_view(ctx);
        ctx.request_repaint_after(Duration::from_millis(REFRESH_RATE_MS));
    }
}
