use std::time::Duration;

use log::debug;
use reqwest::{Client, Response, Url};

use crate::RoadGuardError;

use super::LiveSnapshot;

pub const START_TRIP_ENDPOINT: &str = "start_trip";
pub const END_TRIP_ENDPOINT: &str = "end_trip";
pub const LIVE_ENDPOINT: &str = "api/live";

/// Source of live telemetry and receiver of trip control requests.
///
/// The live dashboard talks to the road-monitoring server through
/// [`HttpTelemetryBackend`]; tests replay scripted snapshots through
/// [`MockTelemetryBackend`].
#[allow(async_fn_in_trait)]
pub trait TelemetryBackend {
    /// Ask the backend to open a new trip session.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or the acknowledgement is not valid JSON.
    async fn start_trip(&mut self) -> Result<(), RoadGuardError>;

    /// Tell the backend the current trip is over. The response body is ignored.
    async fn end_trip(&mut self) -> Result<(), RoadGuardError>;

    /// Fetch one snapshot of the vehicle state.
    async fn live(&mut self) -> Result<LiveSnapshot, RoadGuardError>;
}

pub struct HttpTelemetryBackend {
    client: Client,
    base_url: Url,
}

impl HttpTelemetryBackend {
    pub fn new(server_url: &str, request_timeout: Duration) -> Result<Self, RoadGuardError> {
        let mut base_url = Url::parse(server_url).map_err(|_| RoadGuardError::InvalidServerUrl {
            url: server_url.to_string(),
        })?;
        if base_url.cannot_be_a_base() {
            return Err(RoadGuardError::InvalidServerUrl {
                url: server_url.to_string(),
            });
        }
        // endpoints are joined relative to the server url, keep any path prefix
        if !base_url.path().ends_with('/') {
            let path = format!("{}/", base_url.path());
            base_url.set_path(&path);
        }

        let client = Client::builder()
            .timeout(request_timeout)
            .build()
            .map_err(|e| RoadGuardError::HttpClientError { source: e })?;

        Ok(Self { client, base_url })
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    async fn get(&self, endpoint: &str) -> Result<Response, RoadGuardError> {
        let url = self
            .base_url
            .join(endpoint)
            .map_err(|_| RoadGuardError::InvalidServerUrl {
                url: format!("{}{}", self.base_url, endpoint),
            })?;
        debug!("GET {}", url);

        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| RoadGuardError::HttpRequestError {
                endpoint: endpoint.to_string(),
                source: e,
            })?;

        if !response.status().is_success() {
            return Err(RoadGuardError::HttpStatusError {
                endpoint: endpoint.to_string(),
                status: response.status().as_u16(),
            });
        }
        Ok(response)
    }

    async fn get_body(&self, endpoint: &str) -> Result<String, RoadGuardError> {
        self.get(endpoint)
            .await?
            .text()
            .await
            .map_err(|e| RoadGuardError::HttpRequestError {
                endpoint: endpoint.to_string(),
                source: e,
            })
    }
}

impl TelemetryBackend for HttpTelemetryBackend {
    async fn start_trip(&mut self) -> Result<(), RoadGuardError> {
        let body = self.get_body(START_TRIP_ENDPOINT).await?;
        serde_json::from_str::<serde_json::Value>(&body).map_err(|e| {
            RoadGuardError::MalformedPayload {
                endpoint: START_TRIP_ENDPOINT.to_string(),
                source: e,
            }
        })?;
        Ok(())
    }

    async fn end_trip(&mut self) -> Result<(), RoadGuardError> {
        self.get(END_TRIP_ENDPOINT).await?;
        Ok(())
    }

    async fn live(&mut self) -> Result<LiveSnapshot, RoadGuardError> {
        let body = self.get_body(LIVE_ENDPOINT).await?;
        serde_json::from_str(&body).map_err(|e| RoadGuardError::MalformedPayload {
            endpoint: LIVE_ENDPOINT.to_string(),
            source: e,
        })
    }
}

/// Backend replaying a scripted list of live responses.
///
/// Each entry is served once per `live` call, `None` entries fail the request as if the
/// server were unavailable. Once the script runs out every request fails.
#[derive(Default)]
pub struct MockTelemetryBackend {
    cur_tick: usize,
    script: Vec<Option<LiveSnapshot>>,
    pub fail_start: bool,
    pub fail_end: bool,
    pub start_requests: usize,
    pub end_requests: usize,
    pub live_requests: usize,
}

impl MockTelemetryBackend {
    pub fn from_snapshots(snapshots: Vec<LiveSnapshot>) -> Self {
        Self::from_script(snapshots.into_iter().map(Some).collect())
    }

    pub fn from_script(script: Vec<Option<LiveSnapshot>>) -> Self {
        Self {
            script,
            ..Default::default()
        }
    }

    fn unavailable(endpoint: &str) -> RoadGuardError {
        RoadGuardError::HttpStatusError {
            endpoint: endpoint.to_string(),
            status: 503,
        }
    }
}

impl TelemetryBackend for MockTelemetryBackend {
    async fn start_trip(&mut self) -> Result<(), RoadGuardError> {
        self.start_requests += 1;
        if self.fail_start {
            return Err(Self::unavailable(START_TRIP_ENDPOINT));
        }
        Ok(())
    }

    async fn end_trip(&mut self) -> Result<(), RoadGuardError> {
        self.end_requests += 1;
        if self.fail_end {
            return Err(Self::unavailable(END_TRIP_ENDPOINT));
        }
        Ok(())
    }

    async fn live(&mut self) -> Result<LiveSnapshot, RoadGuardError> {
        self.live_requests += 1;
        let entry = self.script.get(self.cur_tick).copied().flatten();
        self.cur_tick += 1;
        entry.ok_or_else(|| Self::unavailable(LIVE_ENDPOINT))
    }
}
