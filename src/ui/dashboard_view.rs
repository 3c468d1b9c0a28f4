use egui::{Align, Button, Color32, CornerRadius, Frame, Layout, Margin, RichText, Ui, Vec2b};
use egui_plot::{Line, PlotPoints};
use roadguard::{TripCommand, dashboard::SPEED_HISTORY_POINTS};

use super::{
    DEFAULT_BUTTON_CORNER_RADIUS, DEFAULT_WINDOW_CORNER_RADIUS, LiveDashboardApp, PALETTE_GREEN,
    condition_color,
};

const SPEED_AXIS_MIN_KMH: f64 = 60.;

fn stat_block(ui: &mut Ui, title: &str, value: &str, color: Color32) {
    ui.vertical_centered(|ui| {
        ui.label(RichText::new(title).color(Color32::GRAY));
        ui.label(RichText::new(value).color(color).size(22.).strong());
    });
}

impl LiveDashboardApp {
    pub(crate) fn dashboard_view(&mut self, ctx: &egui::Context) {
        egui::TopBottomPanel::top("trip_controls")
            .min_height(30.)
            .frame(
                Frame::new()
                    .inner_margin(Margin::same(5))
                    .corner_radius(CornerRadius {
                        nw: DEFAULT_WINDOW_CORNER_RADIUS,
                        ne: DEFAULT_WINDOW_CORNER_RADIUS,
                        ..Default::default()
                    }),
            )
            .show(ctx, |ui| {
                ui.with_layout(Layout::left_to_right(Align::Center), |ui| {
                    ui.heading(RichText::new("RoadGuard").color(Color32::WHITE));
                    ui.add_space(10.);
                    if ui
                        .add(
                            Button::new("Start trip")
                                .corner_radius(DEFAULT_BUTTON_CORNER_RADIUS),
                        )
                        .clicked()
                    {
                        self.send_command(TripCommand::StartTrip);
                    }
                    if ui
                        .add_enabled(
                            self.dashboard.is_trip_active(),
                            Button::new("End trip").corner_radius(DEFAULT_BUTTON_CORNER_RADIUS),
                        )
                        .clicked()
                    {
                        self.send_command(TripCommand::EndTrip);
                    }

                    ui.with_layout(Layout::right_to_left(Align::Center), |ui| {
                        if let Some(notice) = self.dashboard.notice().map(str::to_owned) {
                            if ui.small_button("x").clicked() {
                                self.dashboard.dismiss_notice();
                            }
                            ui.label(RichText::new(notice).color(Color32::LIGHT_GRAY));
                        }
                    });
                });
            });

        egui::TopBottomPanel::top("trip_stats")
            .frame(Frame::new().inner_margin(Margin::same(5)))
            .show(ctx, |ui| {
                ui.columns(4, |columns| {
                    stat_block(
                        &mut columns[0],
                        "Speed",
                        self.dashboard.speed_label(),
                        Color32::WHITE,
                    );
                    stat_block(
                        &mut columns[1],
                        "Road",
                        &self.dashboard.status_label(),
                        condition_color(self.dashboard.status()),
                    );
                    stat_block(
                        &mut columns[2],
                        "Potholes",
                        &self.dashboard.potholes_label(),
                        Color32::WHITE,
                    );
                    stat_block(
                        &mut columns[3],
                        "Distance",
                        self.dashboard.distance_label(),
                        Color32::WHITE,
                    );
                });
            });

        egui::CentralPanel::default()
            .frame(
                Frame::new()
                    .inner_margin(Margin::same(5))
                    .corner_radius(CornerRadius {
                        sw: DEFAULT_WINDOW_CORNER_RADIUS,
                        se: DEFAULT_WINDOW_CORNER_RADIUS,
                        ..Default::default()
                    }),
            )
            .show(ctx, |ui| {
                if let Some(average) = self.dashboard.average_speed() {
                    ui.label(
                        RichText::new(format!("Average {:.1} km/h", average))
                            .color(Color32::GRAY),
                    );
                }

                let plot = egui_plot::Plot::new("speedChart")
                    .allow_drag(false)
                    .allow_scroll(false)
                    .allow_zoom(false)
                    .include_x(0.)
                    .include_x((SPEED_HISTORY_POINTS - 1) as f64)
                    .include_y(0.)
                    .include_y(SPEED_AXIS_MIN_KMH)
                    .auto_bounds(Vec2b::new(false, true))
                    .show_grid(false);

                let speed_points = self.dashboard.chart_points().collect::<PlotPoints>();

                plot.show_background(false).show(ui, |plot_ui| {
                    plot_ui.line(
                        Line::new("Speed (km/h)", speed_points)
                            .color(PALETTE_GREEN)
                            .width(2.),
                    );
                });
            });
    }
}
