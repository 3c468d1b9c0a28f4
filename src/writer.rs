use std::{
    fs::File,
    io::{BufWriter, Write},
    path::Path,
    sync::mpsc::Receiver,
};

use log::{error, info};

use crate::{RoadGuardError, telemetry::TelemetryOutput};

/// Appends every output received to `file` as JSON lines until the channel closes.
///
/// Each line is flushed as soon as it is written so a recording interrupted by Ctrl-C
/// keeps everything received so far.
pub fn write_telemetry(
    file: &Path,
    telemetry_receiver: Receiver<TelemetryOutput>,
) -> Result<(), RoadGuardError> {
    let telemetry_file = File::create(file).map_err(|e| RoadGuardError::WriterError { source: e })?;
    let mut telemetry_file_writer = BufWriter::new(telemetry_file);
    let mut lines = 0;
    for output in &telemetry_receiver {
        let line = match serde_json::to_string(&output) {
            Ok(line) => line,
            Err(e) => {
                error!("Error while serializing telemetry output: {}", e);
                continue;
            }
        };
        let written = writeln!(telemetry_file_writer, "{}", line)
            .and_then(|_| telemetry_file_writer.flush());
        match written {
            Ok(()) => lines += 1,
            Err(e) => error!("Error while writing telemetry output to file: {}", e),
        }
    }
    telemetry_file_writer
        .flush()
        .map_err(|e| RoadGuardError::WriterError { source: e })?;
    info!("Wrote {} telemetry lines to {:?}", lines, file);
    Ok(())
}
