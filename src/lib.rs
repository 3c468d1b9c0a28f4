// Library interface for roadguard
// This allows integration tests to access internal modules

pub mod config;
pub mod dashboard;
pub mod errors;
pub mod report;
pub mod telemetry;
pub mod writer;

// Re-export commonly used types
pub use config::AppConfig;
pub use dashboard::{Dashboard, RollingSeries};
pub use errors::RoadGuardError;
pub use report::TripReport;
pub use telemetry::{LiveSnapshot, RoadCondition, TelemetryOutput, TripCommand, TripPoller};
