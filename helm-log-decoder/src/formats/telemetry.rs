//! Telemetry log parser (`time;variable;value` records)
//!
//! Each line of a helm telemetry log carries three `;`-separated fields.
//! The value is kept as a raw string; a `;` inside the value is preserved
//! by re-joining any extra fields.
//!
//! A line whose time does not parse as a real number is dropped. That is
//! not an error: the parser counts it and moves on.

use crate::formats::LogFileParser;
use crate::types::{parse_real, DecoderError, LogEvent, Result};
use std::fs::File;
use std::io::{self, BufReader};
use std::path::Path;

const FIELD_SEPARATOR: u8 = b';';

/// Decode a single log line
///
/// Returns `None` when the time field is missing or malformed, or when the
/// variable name is empty. Decoding the same line always yields the same
/// event.
pub fn decode_line(line: &str) -> Option<LogEvent> {
    let line = line.trim_end_matches(['\r', '\n']);
    let mut fields = line.splitn(3, ';');
    let time = fields.next()?;
    let name = fields.next()?;
    let value = fields.next().unwrap_or("");
    event_from_fields(time, name, value)
}

fn event_from_fields(time: &str, name: &str, value: &str) -> Option<LogEvent> {
    let time = parse_real(time)?;
    let name = name.trim();
    if name.is_empty() {
        return None;
    }
    Some(LogEvent::new(time, name, value))
}

/// Streaming parser over a `;`-separated telemetry log
pub struct TelemetryParser<R: io::Read> {
    records: csv::StringRecordsIntoIter<R>,
    dropped_lines: usize,
}

impl<R: io::Read> TelemetryParser<R> {
    /// Wrap any reader producing log text
    pub fn from_reader(reader: R) -> Self {
        let records = csv::ReaderBuilder::new()
            .delimiter(FIELD_SEPARATOR)
            .has_headers(false)
            .flexible(true)
            .quoting(false)
            .from_reader(reader)
            .into_records();

        Self {
            records,
            dropped_lines: 0,
        }
    }

    /// Number of lines dropped so far
    pub fn dropped_lines(&self) -> usize {
        self.dropped_lines
    }

    fn decode_record(record: &csv::StringRecord) -> Option<LogEvent> {
        let time = record.get(0)?;
        let name = record.get(1)?;
        let value = if record.len() > 3 {
            record.iter().skip(2).collect::<Vec<_>>().join(";")
        } else {
            record.get(2).unwrap_or("").to_string()
        };
        event_from_fields(time, name, &value)
    }
}

impl<R: io::Read> Iterator for TelemetryParser<R> {
    type Item = Result<LogEvent>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            let record = match self.records.next()? {
                Ok(record) => record,
                Err(e) if e.is_io_error() => return Some(Err(e.into())),
                Err(e) => {
                    if let csv::ErrorKind::Utf8 { .. } = e.kind() {
                        log::trace!("Dropping non-UTF-8 line: {}", e);
                        self.dropped_lines += 1;
                        continue;
                    }
                    return Some(Err(DecoderError::LogParseError(e.to_string())));
                }
            };

            match Self::decode_record(&record) {
                Some(event) => return Some(Ok(event)),
                None => {
                    log::trace!(
                        "Dropping line {}: malformed record",
                        record.position().map_or(0, |p| p.line())
                    );
                    self.dropped_lines += 1;
                }
            }
        }
    }
}

impl LogFileParser for TelemetryParser<BufReader<File>> {
    fn parse(path: &Path) -> Result<Self> {
        log::info!("Opening telemetry log: {:?}", path);
        let file = File::open(path)?;
        Ok(Self::from_reader(BufReader::new(file)))
    }
}
