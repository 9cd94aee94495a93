//! Actuator sinks: where dispatch commands are written.

use std::io::{Stdout, Write};
use std::path::Path;
use std::time::Duration;

use serialport::{DataBits, FlowControl, Parity, SerialPort, StopBits};

use stepsort_common::error::{StepsortError, StepsortResult};
use stepsort_model::DispatchCommand;

use crate::ActuatorSink;

/// Writes each command as an ASCII line to a byte stream and flushes it.
///
/// Fire-and-forget: nothing is read back from the device.
pub struct WriterSink<W: Write> {
    name: String,
    writer: W,
    commands_written: u64,
}

impl<W: Write> WriterSink<W> {
    pub fn new(name: impl Into<String>, writer: W) -> Self {
        Self {
            name: name.into(),
            writer,
            commands_written: 0,
        }
    }

    /// Number of commands written successfully.
    pub fn commands_written(&self) -> u64 {
        self.commands_written
    }

    pub fn get_ref(&self) -> &W {
        &self.writer
    }
}

impl<W: Write + Send> ActuatorSink for WriterSink<W> {
    fn send(&mut self, command: &DispatchCommand) -> StepsortResult<()> {
        self.writer
            .write_all(command.encode().as_bytes())
            .and_then(|()| self.writer.flush())
            .map_err(|e| {
                StepsortError::sink(format!(
                    "failed writing position {} to {}: {e}",
                    command.position, self.name
                ))
            })?;
        self.commands_written += 1;
        Ok(())
    }

    fn name(&self) -> &str {
        &self.name
    }
}

impl<W: Write> Drop for WriterSink<W> {
    fn drop(&mut self) {
        let _ = self.writer.flush();
    }
}

/// Longest a single command write may block on the serial line.
const WRITE_TIMEOUT: Duration = Duration::from_millis(500);

/// Open the actuator's serial port in raw 8N1 mode at `baud_rate`.
///
/// Waits `settle` after opening, since many boards reset when the port opens.
pub fn open_device(
    path: &Path,
    baud_rate: u32,
    settle: Duration,
) -> StepsortResult<WriterSink<Box<dyn SerialPort>>> {
    if !path.exists() {
        return Err(StepsortError::FileNotFound {
            path: path.to_path_buf(),
        });
    }

    let port = serialport::new(path.to_string_lossy(), baud_rate)
        .data_bits(DataBits::Eight)
        .parity(Parity::None)
        .stop_bits(StopBits::One)
        .flow_control(FlowControl::None)
        .timeout(WRITE_TIMEOUT)
        .open()
        .map_err(|e| StepsortError::sink(format!("failed to open {}: {e}", path.display())))?;

    tracing::info!(
        device = %path.display(),
        baud_rate,
        settle_ms = settle.as_millis() as u64,
        "Opened actuator port"
    );
    if !settle.is_zero() {
        std::thread::sleep(settle);
    }

    Ok(WriterSink::new(path.display().to_string(), port))
}

/// Write commands to standard output, for dry runs.
pub fn stdout_sink() -> WriterSink<Stdout> {
    WriterSink::new("stdout", std::io::stdout())
}
