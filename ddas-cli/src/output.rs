//! Output writers for decoded hits.
//!
//! Supports CSV (one hit per line, scalar fields only) and JSON lines (every
//! field, including sums and trace).

use ddas_core::HitRecord;
use std::io::{BufWriter, Write};
use thiserror::Error;

/// Errors that can occur during output writing.
#[derive(Error, Debug)]
pub enum OutputError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Invalid format: {0}")]
    InvalidFormat(String),
}

/// Output format, chosen on the command line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutputFormat {
    #[default]
    Csv,
    Json,
}

impl std::str::FromStr for OutputFormat {
    type Err = OutputError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "csv" => Ok(Self::Csv),
            "json" | "jsonl" => Ok(Self::Json),
            other => Err(OutputError::InvalidFormat(format!(
                "Unknown format: {}. Use csv or json",
                other
            ))),
        }
    }
}

const CSV_HEADER: &str = "crate,slot,channel,msps,coarse_time,time,cfd_trig_source,cfd_fail,\
energy,trace_length,finish_code,overflow,external_timestamp";

/// Streaming writer for hits.
pub struct HitWriter<W: Write> {
    writer: BufWriter<W>,
    format: OutputFormat,
}

impl<W: Write> HitWriter<W> {
    /// Creates a new writer.
    pub fn new(writer: W, format: OutputFormat) -> Self {
        Self {
            writer: BufWriter::new(writer),
            format,
        }
    }

    /// Writes the CSV column header. No-op for JSON.
    pub fn write_header(&mut self) -> Result<(), OutputError> {
        if self.format == OutputFormat::Csv {
            writeln!(self.writer, "{}", CSV_HEADER)?;
        }
        Ok(())
    }

    /// Writes a single hit.
    pub fn write_hit(&mut self, hit: &HitRecord) -> Result<(), OutputError> {
        match self.format {
            OutputFormat::Csv => {
                let external = hit
                    .external_timestamp()
                    .map(|ts| ts.to_string())
                    .unwrap_or_default();
                writeln!(
                    self.writer,
                    "{},{},{},{},{},{:.6},{},{},{},{},{},{},{}",
                    hit.crate_id(),
                    hit.slot_id(),
                    hit.channel_id(),
                    hit.adc_frequency(),
                    hit.coarse_time(),
                    hit.time(),
                    hit.cfd_trig_source(),
                    u8::from(hit.cfd_fail()),
                    hit.energy(),
                    hit.trace_length(),
                    u8::from(hit.finish_code()),
                    u8::from(hit.adc_overflow_underflow()),
                    external
                )?;
            }
            OutputFormat::Json => {
                serde_json::to_writer(&mut self.writer, hit)?;
                writeln!(self.writer)?;
            }
        }
        Ok(())
    }

    /// Flushes the writer.
    pub fn flush(&mut self) -> Result<(), OutputError> {
        self.writer.flush()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    fn sample_hit() -> HitRecord {
        let mut hit = HitRecord::new();
        hit.set_module_info((3, 2, 1), (100, 12, 12));
        hit.set_coarse_time(429_497_360_710);
        hit.set_time(429_497_360_711.601_257_324_218_75);
        hit.set_cfd_fail(true);
        hit.set_energy(2238);
        hit.append_trace_sample(7);
        hit.set_trace_length(1);
        hit
    }

    #[test]
    fn test_format_parsing() {
        assert_eq!(OutputFormat::from_str("csv").unwrap(), OutputFormat::Csv);
        assert_eq!(OutputFormat::from_str(" JSON ").unwrap(), OutputFormat::Json);
        assert!(OutputFormat::from_str("xml").is_err());
    }

    #[test]
    fn test_csv_writer() {
        let mut output = Vec::new();
        {
            let mut writer = HitWriter::new(&mut output, OutputFormat::Csv);
            writer.write_header().unwrap();
            writer.write_hit(&sample_hit()).unwrap();
            writer.flush().unwrap();
        }

        let output_str = String::from_utf8(output).unwrap();
        let mut lines = output_str.lines();
        assert_eq!(lines.next(), Some(CSV_HEADER));
        assert_eq!(
            lines.next(),
            Some("3,2,1,100,429497360710,429497360711.601257,0,1,2238,1,0,0,")
        );
    }

    #[test]
    fn test_json_writer() {
        let mut output = Vec::new();
        {
            let mut writer = HitWriter::new(&mut output, OutputFormat::Json);
            writer.write_header().unwrap();
            writer.write_hit(&sample_hit()).unwrap();
            writer.flush().unwrap();
        }

        let line = String::from_utf8(output).unwrap();
        let value: serde_json::Value = serde_json::from_str(line.trim_end()).unwrap();
        assert_eq!(value["crate_id"], 3);
        assert_eq!(value["trace"], serde_json::json!([7]));
        assert_eq!(value["external_timestamp"], serde_json::Value::Null);
    }
}
