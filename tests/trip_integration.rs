// Integration tests driving a trip against a mocked road-monitoring server
//
// The poller talks HTTP to a wiremock server, its outputs are fed to the dashboard
// model and recorded through the telemetry writer.

use std::{
    sync::mpsc::{self, Receiver},
    thread,
    time::Duration,
};

use roadguard::{
    Dashboard, RoadCondition, TelemetryOutput, TripCommand, TripPoller,
    report::load_trip_reports,
    telemetry::{HttpTelemetryBackend, LiveSnapshot},
    writer,
};
use tokio::sync::mpsc::{UnboundedSender, unbounded_channel};
use wiremock::{
    Mock, MockServer, ResponseTemplate,
    matchers::{method, path},
};

fn snapshot(speed: f64, pothole: u8, lat: f64, lng: f64) -> LiveSnapshot {
    LiveSnapshot {
        speed,
        pothole,
        lat,
        lng,
    }
}

async fn mount_trip_endpoints(server: &MockServer) {
    Mock::given(method("GET"))
        .and(path("/start_trip"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "status": "started"
        })))
        .mount(server)
        .await;
    Mock::given(method("GET"))
        .and(path("/end_trip"))
        .respond_with(ResponseTemplate::new(200).set_body_string("ok"))
        .mount(server)
        .await;
}

/// Serves each snapshot exactly once, in order.
async fn mount_live_script(server: &MockServer, snapshots: &[LiveSnapshot]) {
    for snapshot in snapshots {
        Mock::given(method("GET"))
            .and(path("/api/live"))
            .respond_with(ResponseTemplate::new(200).set_body_json(snapshot))
            .up_to_n_times(1)
            .mount(server)
            .await;
    }
}

fn http_poller(
    server: &MockServer,
    poll_interval: Duration,
    writer_sender: Option<mpsc::Sender<TelemetryOutput>>,
) -> (
    TripPoller<HttpTelemetryBackend>,
    UnboundedSender<TripCommand>,
    Receiver<TelemetryOutput>,
) {
    let backend = HttpTelemetryBackend::new(&server.uri(), Duration::from_secs(2))
        .expect("valid server url");
    let (command_tx, command_rx) = unbounded_channel();
    let (telemetry_tx, telemetry_rx) = mpsc::channel();
    let poller = TripPoller::new(
        backend,
        poll_interval,
        command_rx,
        telemetry_tx,
        writer_sender,
    );
    (poller, command_tx, telemetry_rx)
}

fn apply_all(dashboard: &mut Dashboard, receiver: &Receiver<TelemetryOutput>) -> usize {
    let mut applied = 0;
    while let Ok(output) = receiver.try_recv() {
        dashboard.apply(&output);
        applied += 1;
    }
    applied
}

#[tokio::test]
async fn test_trip_updates_dashboard() {
    let server = MockServer::start().await;
    mount_trip_endpoints(&server).await;
    mount_live_script(
        &server,
        &[snapshot(40., 0, 0., 0.), snapshot(42., 1, 0., 1.)],
    )
    .await;

    let (mut poller, _commands, receiver) = http_poller(&server, Duration::from_secs(2), None);
    let mut dashboard = Dashboard::new();

    poller
        .handle_command(TripCommand::StartTrip)
        .await
        .expect("start trip");
    assert_eq!(apply_all(&mut dashboard, &receiver), 1);
    assert!(dashboard.is_trip_active());
    assert_eq!(dashboard.distance_label(), "0.00 km");

    poller.poll_once().await.expect("first poll");
    apply_all(&mut dashboard, &receiver);
    assert_eq!(dashboard.speed_label(), "40 km/h");
    assert_eq!(dashboard.status(), Some(RoadCondition::Safe));
    assert_eq!(dashboard.potholes_label(), "0");
    assert_eq!(dashboard.distance_label(), "0.00 km");

    poller.poll_once().await.expect("second poll");
    apply_all(&mut dashboard, &receiver);
    assert_eq!(dashboard.speed_label(), "42 km/h");
    assert_eq!(dashboard.status_label(), "UNSAFE");
    assert_eq!(dashboard.potholes_label(), "1");
    assert_eq!(dashboard.distance_label(), "111.19 km");
    assert_eq!(dashboard.speed_series().len(), 2);

    poller
        .handle_command(TripCommand::EndTrip)
        .await
        .expect("end trip");
    apply_all(&mut dashboard, &receiver);
    assert!(!dashboard.is_trip_active());
    assert_eq!(dashboard.notice(), Some("Trip ended"));

    let end_requests = server
        .received_requests()
        .await
        .unwrap_or_default()
        .into_iter()
        .filter(|request| request.url.path() == "/end_trip")
        .count();
    assert_eq!(end_requests, 1);
}

#[tokio::test]
async fn test_server_errors_skip_ticks() {
    let server = MockServer::start().await;
    mount_trip_endpoints(&server).await;
    Mock::given(method("GET"))
        .and(path("/api/live"))
        .respond_with(ResponseTemplate::new(500))
        .up_to_n_times(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/live"))
        .respond_with(ResponseTemplate::new(200).set_body_string("not json"))
        .up_to_n_times(1)
        .mount(&server)
        .await;
    mount_live_script(&server, &[snapshot(25., 0, 45.0, 9.0)]).await;

    let (mut poller, _commands, receiver) = http_poller(&server, Duration::from_secs(2), None);
    let mut dashboard = Dashboard::new();

    poller
        .handle_command(TripCommand::StartTrip)
        .await
        .expect("start trip");
    poller.poll_once().await.expect("failed poll is skipped");
    poller.poll_once().await.expect("malformed poll is skipped");
    assert_eq!(apply_all(&mut dashboard, &receiver), 1);
    assert_eq!(dashboard.speed_label(), "0 km/h");

    poller.poll_once().await.expect("third poll");
    assert_eq!(apply_all(&mut dashboard, &receiver), 1);
    assert_eq!(dashboard.speed_label(), "25 km/h");
    assert_eq!(dashboard.status_label(), "SAFE");
    assert_eq!(poller.trip().pothole_count(), 0);
}

#[tokio::test]
async fn test_unreachable_server_keeps_trip_idle() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/start_trip"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&server)
        .await;

    let (mut poller, _commands, receiver) = http_poller(&server, Duration::from_secs(2), None);
    let mut dashboard = Dashboard::new();

    poller
        .handle_command(TripCommand::StartTrip)
        .await
        .expect("failure is reported, not returned");
    apply_all(&mut dashboard, &receiver);
    assert!(!dashboard.is_trip_active());
    assert!(dashboard.notice().is_some());
    assert!(!poller.trip().is_active());

    // polls while idle never reach the server
    poller.poll_once().await.expect("idle poll");
    let live_requests = server
        .received_requests()
        .await
        .unwrap_or_default()
        .into_iter()
        .filter(|request| request.url.path() == "/api/live")
        .count();
    assert_eq!(live_requests, 0);
}

#[tokio::test]
async fn test_run_loop_until_commands_close() {
    let server = MockServer::start().await;
    mount_trip_endpoints(&server).await;
    Mock::given(method("GET"))
        .and(path("/api/live"))
        .respond_with(ResponseTemplate::new(200).set_body_json(snapshot(30., 0, 45.0, 9.0)))
        .mount(&server)
        .await;

    let (mut poller, commands, receiver) = http_poller(&server, Duration::from_millis(50), None);

    let driver = async move {
        commands.send(TripCommand::StartTrip).expect("poller running");
        tokio::time::sleep(Duration::from_millis(300)).await;
        commands.send(TripCommand::EndTrip).expect("poller running");
        tokio::time::sleep(Duration::from_millis(100)).await;
    };
    let (result, ()) = tokio::join!(poller.run(), driver);
    result.expect("poller stops cleanly");

    let outputs = receiver.try_iter().collect::<Vec<_>>();
    assert!(matches!(
        outputs.first(),
        Some(TelemetryOutput::TripStarted { trip_id: 1, .. })
    ));
    assert!(matches!(
        outputs.last(),
        Some(TelemetryOutput::TripEnded { trip_id: 1, .. })
    ));
    let readings = outputs
        .iter()
        .filter(|output| matches!(output, TelemetryOutput::Reading(_)))
        .count();
    assert!(readings >= 1);
}

#[tokio::test]
async fn test_recorded_trip_report() {
    let server = MockServer::start().await;
    mount_trip_endpoints(&server).await;
    mount_live_script(
        &server,
        &[
            snapshot(30., 0, 0., 0.),
            snapshot(50., 1, 1., 0.),
            snapshot(40., 1, 2., 0.),
        ],
    )
    .await;

    let temp_dir = tempfile::tempdir().expect("temp dir");
    let output_file = temp_dir.path().join("trip.jsonl");
    let (writer_tx, writer_rx) = mpsc::channel();
    let writer_file = output_file.clone();
    let writer_handle = thread::spawn(move || writer::write_telemetry(&writer_file, writer_rx));

    {
        let (mut poller, _commands, _receiver) =
            http_poller(&server, Duration::from_secs(2), Some(writer_tx));
        poller
            .handle_command(TripCommand::StartTrip)
            .await
            .expect("start trip");
        for _ in 0..3 {
            poller.poll_once().await.expect("poll");
        }
        poller
            .handle_command(TripCommand::EndTrip)
            .await
            .expect("end trip");
    }

    writer_handle
        .join()
        .expect("writer thread")
        .expect("telemetry written");

    let reports = load_trip_reports(&output_file).expect("load reports");
    assert_eq!(reports.len(), 1);
    let report = &reports[0];
    assert_eq!(report.trip_id, 1);
    assert_eq!(report.readings, 3);
    assert_eq!(report.safe_readings, 1);
    assert_eq!(report.unsafe_readings, 2);
    assert_eq!(report.pothole_count(), 2);
    assert_eq!(report.max_speed_kmh, 50.);
    assert!((report.distance_km - 222.39).abs() < 0.01);
    assert!(report.ended_at_ms.is_some());
}
