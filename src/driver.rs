//! Line-oriented record driver
//!
//! Reads two-field delimited records (source, destination), feeds each pair to
//! a filter as a [`FlowKey`], and writes the record followed by its verdict
//! marker:
//!
//! ```text
//! 10.0.0.1<TAB>10.0.0.2<TAB>Sampled
//! 10.0.0.3<TAB>10.0.0.9<TAB>Not Sampled
//! ```
//!
//! Malformed lines are logged and skipped; they never reach the filter.
//!
//! # Example
//!
//! ```
//! use flowsample::driver::{run, DriverOptions};
//! use flowsample::sampling::AdaptiveSamplingFilter;
//!
//! let mut filter = AdaptiveSamplingFilter::new(100, 100, 1.0).unwrap();
//! let input = "a\tb\nbroken line\nc\td\n";
//! let mut output: Vec<u8> = Vec::new();
//!
//! let report = run(&mut filter, input.as_bytes(), &mut output, &DriverOptions::default()).unwrap();
//! assert_eq!(report.records, 2);
//! assert_eq!(report.malformed, 1);
//! ```

use std::io::{self, BufRead, Write};

use rand::RngCore;
use thiserror::Error;

use crate::sampling::{AdaptiveSamplingFilter, Decision, FlowKey};

/// Default number of processed records between progress log events
pub const DEFAULT_PROGRESS_INTERVAL: u64 = 1_000_000;

/// Failure to turn a line into a record
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RecordError {
    #[error("expected {expected} fields, found {found}")]
    FieldCount { expected: usize, found: usize },
    #[error("field {index} is empty")]
    EmptyField { index: usize },
    #[error("line is not valid UTF-8")]
    InvalidUtf8,
}

/// Failure of a driver run
#[derive(Debug, Error)]
pub enum DriverError {
    #[error("i/o error: {0}")]
    Io(#[from] io::Error),
}

/// Field layout of input and output records
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RecordFormat {
    pub delimiter: char,
}

impl Default for RecordFormat {
    fn default() -> Self {
        Self { delimiter: '\t' }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DriverOptions {
    pub format: RecordFormat,
    /// Log progress every this many processed records; 0 disables progress logging
    pub progress_interval: u64,
    /// Reset the filter after this many processed records
    pub reset_every: Option<u64>,
}

impl Default for DriverOptions {
    fn default() -> Self {
        Self {
            format: RecordFormat::default(),
            progress_interval: DEFAULT_PROGRESS_INTERVAL,
            reset_every: None,
        }
    }
}

impl DriverOptions {
    /// Whether a progress event is due after `records` processed records
    pub fn progress_due(&self, records: u64) -> bool {
        self.progress_interval > 0 && records > 0 && records % self.progress_interval == 0
    }
}

/// Totals for one driver run
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DriverReport {
    /// Lines read
    pub lines: u64,
    /// Well-formed records passed to the filter
    pub records: u64,
    /// Lines skipped as malformed
    pub malformed: u64,
    /// Records sampled
    pub sampled: u64,
    /// Filter resets performed
    pub resets: u64,
}

/// Split a line into a source/destination pair
///
/// Trailing delimiters are ignored, so `a<TAB>b<TAB>` is the record `a`, `b`.
/// The remaining line must hold exactly two fields, each non-empty once
/// surrounding whitespace is trimmed.
pub fn parse_record(line: &str, format: RecordFormat) -> Result<FlowKey<'_>, RecordError> {
    let line = line.trim_end_matches(format.delimiter);
    let mut fields = line.split(format.delimiter);
    match (fields.next(), fields.next(), fields.next()) {
        (Some(source), Some(destination), None) => {
            let (source, destination) = (source.trim(), destination.trim());
            if source.is_empty() {
                return Err(RecordError::EmptyField { index: 0 });
            }
            if destination.is_empty() {
                return Err(RecordError::EmptyField { index: 1 });
            }
            Ok(FlowKey::new(source, destination))
        }
        _ => Err(RecordError::FieldCount {
            expected: 2,
            found: line.split(format.delimiter).count(),
        }),
    }
}

/// Parse one raw input line, line terminator included
pub fn parse_line(raw: &[u8], format: RecordFormat) -> Result<FlowKey<'_>, RecordError> {
    let raw = raw.strip_suffix(b"\n").unwrap_or(raw);
    let raw = raw.strip_suffix(b"\r").unwrap_or(raw);
    let line = std::str::from_utf8(raw).map_err(|_| RecordError::InvalidUtf8)?;
    parse_record(line, format)
}

/// Write `record` and its verdict as one output line
pub fn write_record<W: Write>(
    writer: &mut W,
    record: &FlowKey<'_>,
    decision: Decision,
    format: RecordFormat,
) -> io::Result<()> {
    let d = format.delimiter;
    writeln!(
        writer,
        "{}{}{}{}{}",
        record.source, d, record.destination, d, decision
    )
}

/// Drive `filter` over every line of `reader`, writing verdicts to `writer`
pub fn run<R, I, W>(
    filter: &mut AdaptiveSamplingFilter<R>,
    mut reader: I,
    mut writer: W,
    options: &DriverOptions,
) -> Result<DriverReport, DriverError>
where
    R: RngCore,
    I: BufRead,
    W: Write,
{
    let mut report = DriverReport::default();
    let mut since_reset = 0u64;

    let mut buf = Vec::new();

    loop {
        buf.clear();
        if reader.read_until(b'\n', &mut buf)? == 0 {
            break;
        }
        report.lines += 1;

        let record = match parse_line(&buf, options.format) {
            Ok(record) => record,
            Err(err) => {
                report.malformed += 1;
                tracing::warn!(
                    line = report.lines,
                    %err,
                    "skipping invalid record: {:?}",
                    String::from_utf8_lossy(&buf).trim_end()
                );
                continue;
            }
        };

        let decision = filter.process(&record);
        write_record(&mut writer, &record, decision, options.format)?;

        report.records += 1;
        if decision.is_sampled() {
            report.sampled += 1;
        }

        since_reset += 1;
        if options.reset_every == Some(since_reset) {
            filter.reset();
            report.resets += 1;
            since_reset = 0;
        }

        if options.progress_due(report.records) {
            tracing::info!(
                records = report.records,
                sampled = report.sampled,
                "processed {} rows",
                report.records
            );
        }
    }

    writer.flush()?;

    tracing::info!(
        lines = report.lines,
        records = report.records,
        malformed = report.malformed,
        sampled = report.sampled,
        resets = report.resets,
        "processing completed"
    );

    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_record() {
        let fmt = RecordFormat::default();
        let record = parse_record(" 10.0.0.1 \t10.0.0.2\r", fmt).unwrap();
        assert_eq!(record, FlowKey::new("10.0.0.1", "10.0.0.2"));

        assert_eq!(
            parse_record("only-one", fmt),
            Err(RecordError::FieldCount {
                expected: 2,
                found: 1
            })
        );
        assert_eq!(
            parse_record("a\tb\tc", fmt),
            Err(RecordError::FieldCount {
                expected: 2,
                found: 3
            })
        );
    }

    #[test]
    fn test_trailing_delimiters_and_empty_fields() {
        let fmt = RecordFormat::default();
        assert_eq!(
            parse_record("a\tb\t", fmt).unwrap(),
            FlowKey::new("a", "b")
        );
        assert_eq!(
            parse_record("a\tb\t\t", fmt).unwrap(),
            FlowKey::new("a", "b")
        );
        assert_eq!(
            parse_record("a\t", fmt),
            Err(RecordError::FieldCount {
                expected: 2,
                found: 1
            })
        );
        assert_eq!(
            parse_record("a\t  ", fmt),
            Err(RecordError::EmptyField { index: 1 })
        );
        assert_eq!(
            parse_record(" \tb", fmt),
            Err(RecordError::EmptyField { index: 0 })
        );
    }

    #[test]
    fn test_parse_line_terminators() {
        let fmt = RecordFormat::default();
        assert_eq!(
            parse_line(b"a\tb\r\n", fmt).unwrap(),
            FlowKey::new("a", "b")
        );
        assert_eq!(parse_line(b"a\tb", fmt).unwrap(), FlowKey::new("a", "b"));
        assert_eq!(
            parse_line(b"\xff\xfe\tx\n", fmt),
            Err(RecordError::InvalidUtf8)
        );
    }

    #[test]
    fn test_run_skips_invalid_utf8() {
        let mut filter = AdaptiveSamplingFilter::new(1000, 1000, 1.0).unwrap();
        let input: &[u8] = b"a\tb\n\xff\xfe\tx\nc\td\n";
        let mut output = Vec::new();

        let report = run(&mut filter, input, &mut output, &DriverOptions::default()).unwrap();

        assert_eq!(report.lines, 3);
        assert_eq!(report.records, 2);
        assert_eq!(report.malformed, 1);

        let text = String::from_utf8(output).unwrap();
        let records: Vec<&str> = text
            .lines()
            .map(|l| l.rsplitn(2, '\t').nth(1).unwrap())
            .collect();
        assert_eq!(records, ["a\tb", "c\td"]);
    }

    #[test]
    fn test_progress_counts_records_only() {
        let mut filter = AdaptiveSamplingFilter::new(1000, 1000, 1.0).unwrap();
        let input = "a\tb\nbad\n\n\nc\td\n";
        let mut output = Vec::new();
        let report = run(&mut filter, input.as_bytes(), &mut output, &DriverOptions::default())
            .unwrap();
        assert_eq!(report.lines, 5);
        assert_eq!(report.records, 2);
        assert_eq!(report.malformed, 3);
        assert_eq!(report.records + report.malformed, report.lines);

        // Malformed lines never advance the progress counter
        let every_two = DriverOptions {
            progress_interval: 2,
            ..DriverOptions::default()
        };
        assert!(!every_two.progress_due(1));
        assert!(every_two.progress_due(report.records));
        assert!(!every_two.progress_due(0));
        assert!(!every_two.progress_due(3));

        let disabled = DriverOptions {
            progress_interval: 0,
            ..DriverOptions::default()
        };
        assert!(!disabled.progress_due(report.records));
    }

    #[test]
    fn test_custom_delimiter() {
        let fmt = RecordFormat { delimiter: ',' };
        let record = parse_record("a,b", fmt).unwrap();
        assert_eq!(record.source, "a");
        assert_eq!(record.destination, "b");
        assert!(parse_record("a\tb", fmt).is_err());
    }

    #[test]
    fn test_run_writes_every_record() {
        let mut filter = AdaptiveSamplingFilter::new(1000, 1000, 1.0).unwrap();
        let input = "s1\td1\ns2\td2\ns1\td1\n\ngarbage\n";
        let mut output = Vec::new();

        let report = run(&mut filter, input.as_bytes(), &mut output, &DriverOptions::default())
            .unwrap();

        assert_eq!(report.lines, 5);
        assert_eq!(report.records, 3);
        assert_eq!(report.malformed, 2);

        let text = String::from_utf8(output).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines.len(), 3);
        assert!(lines[0].starts_with("s1\td1\t"));
        // Repeat of the first flow is always rejected
        assert_eq!(lines[2], "s1\td1\tNot Sampled");
        assert_eq!(
            report.sampled as usize,
            lines.iter().filter(|l| l.ends_with("\tSampled")).count()
        );
    }

    #[test]
    fn test_run_resets_periodically() {
        let mut filter = AdaptiveSamplingFilter::new(1000, 1000, 1.0).unwrap();
        let input = "a\tb\na\tb\na\tb\na\tb\n";
        let mut output = Vec::new();
        let options = DriverOptions {
            reset_every: Some(2),
            ..DriverOptions::default()
        };

        let report = run(&mut filter, input.as_bytes(), &mut output, &options).unwrap();
        assert_eq!(report.resets, 2);

        // Each period sees the flow fresh once, then as a duplicate
        let text = String::from_utf8(output).unwrap();
        let markers: Vec<&str> = text.lines().map(|l| l.rsplit('\t').next().unwrap()).collect();
        assert_eq!(markers, ["Sampled", "Not Sampled", "Sampled", "Not Sampled"]);
    }
}
