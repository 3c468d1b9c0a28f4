mod ui;

use std::{
    path::{Path, PathBuf},
    sync::mpsc,
    thread,
};

use clap::{Parser, Subcommand};
use egui::Vec2;
use log::{error, info, warn};
use roadguard::{
    AppConfig, RoadGuardError, TripPoller,
    report::load_trip_reports,
    telemetry::{HttpTelemetryBackend, TelemetryOutput},
    writer,
};
use ui::LiveDashboardApp;

#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
#[command(propagate_version = true)]
struct Args {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Open the live dashboard
    Live {
        /// Base URL of the RoadGuard server
        #[arg(short, long)]
        server: Option<String>,

        /// Poll interval in milliseconds
        #[arg(short, long, value_parser = clap::value_parser!(u64).range(1..))]
        interval: Option<u64>,

        /// Record the telemetry stream to this file as JSON lines
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Print the trip reports of a recorded telemetry file
    Report {
        /// JSON lines file recorded with `live --output`
        #[arg(short, long)]
        input: PathBuf,
    },
}

fn live(
    server: Option<String>,
    interval: Option<u64>,
    output: Option<PathBuf>,
) -> Result<(), RoadGuardError> {
    let mut app_config = AppConfig::from_local_file()
        .unwrap_or_else(|e| {
            warn!("Ignoring config file: {}", e);
            None
        })
        .unwrap_or_default();
    if let Some(server) = server {
        app_config.server_url = server;
    }
    if let Some(interval) = interval {
        app_config.poll_interval_ms = interval;
    }
    let app_config = app_config.with_valid_timings();
    info!(
        "Polling {} every {}ms",
        app_config.server_url, app_config.poll_interval_ms
    );

    let backend = HttpTelemetryBackend::new(&app_config.server_url, app_config.request_timeout())?;
    let (command_tx, command_rx) = tokio::sync::mpsc::unbounded_channel();
    let (telemetry_tx, telemetry_rx) = mpsc::channel::<TelemetryOutput>();

    // if we need to write an output file the poller sends to both the dashboard and the
    // writer channels
    let (telemetry_writer_tx, writer_handle) = match output {
        Some(output_file) => {
            let (telemetry_writer_tx, telemetry_writer_rx) = mpsc::channel::<TelemetryOutput>();
            let handle =
                thread::spawn(move || writer::write_telemetry(&output_file, telemetry_writer_rx));
            (Some(telemetry_writer_tx), Some(handle))
        }
        None => (None, None),
    };

    let poll_interval = app_config.poll_interval();
    let poller_handle = thread::spawn(move || -> Result<(), RoadGuardError> {
        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .map_err(|e| RoadGuardError::RuntimeError { source: e })?;
        let mut poller = TripPoller::new(
            backend,
            poll_interval,
            command_rx,
            telemetry_tx,
            telemetry_writer_tx,
        );
        runtime.block_on(poller.run())
    });

    let window_position = ui::window_position(app_config.window_position);
    let mut native_options = eframe::NativeOptions::default();
    native_options.viewport = native_options
        .viewport
        .with_title("RoadGuard")
        .with_inner_size(Vec2::new(560., 360.))
        .with_position(window_position);

    let dashboard_result = eframe::run_native(
        "RoadGuard",
        native_options,
        Box::new(|cc| {
            Ok(Box::new(LiveDashboardApp::new(
                telemetry_rx,
                command_tx,
                app_config,
                cc,
            )))
        }),
    );

    // the app dropped its command sender, which stops the poller and then the writer
    match poller_handle.join() {
        Ok(Err(e)) => warn!("Telemetry poller stopped with error: {}", e),
        Err(_) => error!("Telemetry poller thread panicked"),
        Ok(Ok(())) => {}
    }
    if let Some(handle) = writer_handle {
        match handle.join() {
            Ok(result) => result?,
            Err(_) => error!("Telemetry writer thread panicked"),
        }
    }

    dashboard_result.map_err(|e| RoadGuardError::DashboardError {
        description: e.to_string(),
    })
}

fn report(input: &Path) -> Result<(), RoadGuardError> {
    let reports = load_trip_reports(input)?;
    if reports.is_empty() {
        println!("No trips found in {:?}", input);
    }
    for report in reports {
        println!("{}", report);
    }
    Ok(())
}

fn main() {
    #[cfg(debug_assertions)]
    colog::init();

    let cli = Args::parse();
    if let Err(e) = ctrlc::set_handler(move || {
        println!("Exiting...");
        std::process::exit(0);
    }) {
        warn!("Could not set Ctrl-C handler: {}", e);
    }

    let result = match cli.command {
        Commands::Live {
            server,
            interval,
            output,
        } => live(server, interval, output),
        Commands::Report { input } => report(&input),
    };
    if let Err(e) = result {
        error!("{}", e);
        std::process::exit(1);
    }
}
