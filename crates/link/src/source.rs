//! Classifier sources.
//!
//! A source hands the control loop at most one classification per cycle.
//! The classifier itself runs elsewhere; these sources only read what it
//! emits.

use std::collections::VecDeque;
use std::fs::File;
use std::io::{self, BufRead, BufReader, Read};
use std::path::Path;
use std::sync::mpsc::{self, Receiver, RecvTimeoutError};
use std::time::Duration;

use stepsort_common::error::{StepsortError, StepsortResult};
use stepsort_model::{parse_record, ClassificationEvent, PositionTable};

use crate::ClassifierSource;

/// Lines buffered between the reader thread and the control loop.
const LINE_BACKLOG: usize = 64;

/// Reads JSONL classifier records from any byte stream.
///
/// The stream is read on a dedicated thread that only forwards raw lines,
/// so [`poll`](ClassifierSource::poll) can give up after `timeout` instead
/// of blocking the loop indefinitely.
pub struct LineSource {
    name: String,
    lines: Receiver<io::Result<String>>,
    table: PositionTable,
    timeout: Duration,
    lines_read: u64,
}

impl LineSource {
    /// Start reading `reader` in the background.
    pub fn spawn<R>(
        name: impl Into<String>,
        reader: R,
        table: PositionTable,
        timeout: Duration,
    ) -> StepsortResult<Self>
    where
        R: Read + Send + 'static,
    {
        let name = name.into();
        let (tx, rx) = mpsc::sync_channel(LINE_BACKLOG);

        std::thread::Builder::new()
            .name(format!("stepsort-source-{name}"))
            .spawn(move || {
                let mut reader = BufReader::new(reader);
                let mut buf = Vec::new();
                loop {
                    match reader.read_until(b'\n', &mut buf) {
                        Ok(0) => break,
                        Ok(_) => {
                            // A line that is not UTF-8 only spoils itself.
                            let line = String::from_utf8(std::mem::take(&mut buf))
                                .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e));
                            if tx.send(line).is_err() {
                                break;
                            }
                        }
                        Err(e) => {
                            let _ = tx.send(Err(e));
                            break;
                        }
                    }
                }
            })?;

        Ok(Self {
            name,
            lines: rx,
            table,
            timeout,
            lines_read: 0,
        })
    }

    /// Read records from a file or FIFO.
    pub fn open(path: &Path, table: PositionTable, timeout: Duration) -> StepsortResult<Self> {
        let file = File::open(path).map_err(|e| match e.kind() {
            io::ErrorKind::NotFound => StepsortError::FileNotFound {
                path: path.to_path_buf(),
            },
            _ => StepsortError::Io(e),
        })?;
        Self::spawn(path.display().to_string(), file, table, timeout)
    }

    /// Read records from standard input.
    pub fn stdin(table: PositionTable, timeout: Duration) -> StepsortResult<Self> {
        Self::spawn("stdin", std::io::stdin(), table, timeout)
    }

    /// Number of non-empty lines consumed so far.
    pub fn lines_read(&self) -> u64 {
        self.lines_read
    }
}

impl ClassifierSource for LineSource {
    fn poll(&mut self) -> StepsortResult<Option<ClassificationEvent>> {
        loop {
            let line = match self.lines.recv_timeout(self.timeout) {
                Ok(Ok(line)) => line,
                Ok(Err(e)) => {
                    return Err(StepsortError::capture(format!(
                        "failed reading {}: {e}",
                        self.name
                    )))
                }
                Err(RecvTimeoutError::Timeout) => {
                    return Err(StepsortError::capture(format!(
                        "no classification within {} ms",
                        self.timeout.as_millis()
                    )))
                }
                Err(RecvTimeoutError::Disconnected) => return Ok(None),
            };

            let record = match parse_record(&line) {
                Ok(Some(record)) => record,
                Ok(None) => continue,
                Err(e) => {
                    self.lines_read += 1;
                    return Err(StepsortError::capture(format!("malformed record: {e}")));
                }
            };
            self.lines_read += 1;
            return self.table.decode(record).map(Some);
        }
    }

    fn name(&self) -> &str {
        &self.name
    }
}

/// Replays a fixed list of per-cycle results.
pub struct ScriptedSource {
    items: VecDeque<StepsortResult<ClassificationEvent>>,
}

impl ScriptedSource {
    pub fn new(items: impl IntoIterator<Item = StepsortResult<ClassificationEvent>>) -> Self {
        Self {
            items: items.into_iter().collect(),
        }
    }

    pub fn from_events(events: impl IntoIterator<Item = ClassificationEvent>) -> Self {
        Self::new(events.into_iter().map(Ok))
    }

    /// One cycle per record in `jsonl`. Lines that fail to parse or decode
    /// become per-cycle errors, just as they would from a live stream.
    pub fn from_jsonl(jsonl: &str, table: &PositionTable) -> Self {
        let items = jsonl.lines().filter_map(|line| match parse_record(line) {
            Ok(Some(record)) => Some(table.decode(record)),
            Ok(None) => None,
            Err(e) => Some(Err(StepsortError::capture(format!(
                "malformed record: {e}"
            )))),
        });
        Self::new(items)
    }

    pub fn remaining(&self) -> usize {
        self.items.len()
    }
}

impl ClassifierSource for ScriptedSource {
    fn poll(&mut self) -> StepsortResult<Option<ClassificationEvent>> {
        self.items.pop_front().transpose()
    }

    fn name(&self) -> &str {
        "scripted"
    }
}
