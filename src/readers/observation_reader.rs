use crate::error::{ProcessingError, Result};
use crate::models::MetarObservation;
use crate::utils::constants::{DEFAULT_BUFFER_SIZE, REQUIRED_COLUMNS, REQUIRED_EITHER_COLUMNS};
use serde::Deserialize;
use serde_json::{Map, Value};
use std::collections::BTreeSet;
use std::fs::File;
use std::io::{BufRead, BufReader, Read};
use std::path::Path;
use tracing::{debug, warn};

/// Supported observation file layouts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputFormat {
    /// A single JSON array of records
    Json,
    /// One JSON record per line
    JsonLines,
    /// Tabular export with a header row
    Csv,
}

impl InputFormat {
    pub fn from_path(path: &Path) -> Result<Self> {
        let extension = path
            .extension()
            .and_then(|e| e.to_str())
            .map(str::to_lowercase)
            .unwrap_or_default();

        match extension.as_str() {
            "json" => Ok(Self::Json),
            "jsonl" | "ndjson" => Ok(Self::JsonLines),
            "csv" => Ok(Self::Csv),
            _ => Err(ProcessingError::UnsupportedFormat(format!(
                "'{}' (expected .json, .jsonl, .ndjson or .csv)",
                path.display()
            ))),
        }
    }
}

/// Decoded observations plus the count of records that could not be decoded.
#[derive(Debug, Clone, Default)]
pub struct ObservationBatch {
    pub observations: Vec<MetarObservation>,
    /// Input columns seen in the header or in any decoded record, with
    /// flattened spellings such as `time.dt` folded onto the field name.
    pub columns: BTreeSet<String>,
    pub skipped_records: usize,
}

impl ObservationBatch {
    fn record_columns<'a>(&mut self, names: impl IntoIterator<Item = &'a str>) {
        for name in names {
            let name = field_name(name);
            if !self.columns.contains(name) {
                self.columns.insert(name.to_string());
            }
        }
    }

    /// Fails with `MissingColumn` for the first required input column that
    /// never appeared. Decoded records only carry the unnormalized altimeter
    /// and visibility, so those are required under their source names.
    pub fn check_required_columns(&self) -> Result<()> {
        let sources = REQUIRED_EITHER_COLUMNS.map(|(source, _)| source);

        for column in REQUIRED_COLUMNS.into_iter().chain(sources) {
            if !self.columns.contains(column) {
                return Err(ProcessingError::MissingColumn(column.to_string()));
            }
        }
        Ok(())
    }
}

/// `temperature.value` → `temperature`, `time.dt` → `time`.
fn field_name(name: &str) -> &str {
    let name = name.trim();
    name.strip_suffix(".value")
        .or_else(|| name.strip_suffix(".dt"))
        .unwrap_or(name)
}

pub struct ObservationReader {
    buffer_size: usize,
}

impl ObservationReader {
    pub fn new() -> Self {
        Self {
            buffer_size: DEFAULT_BUFFER_SIZE,
        }
    }

    /// Read observations, choosing the layout from the file extension.
    pub fn read_file(&self, path: &Path) -> Result<ObservationBatch> {
        let format = InputFormat::from_path(path)?;
        let file = File::open(path)?;
        let reader = BufReader::with_capacity(self.buffer_size, file);

        let batch = self.read_from(reader, format)?;
        debug!(
            "Read {} observations from {} ({} skipped)",
            batch.observations.len(),
            path.display(),
            batch.skipped_records
        );
        Ok(batch)
    }

    pub fn read_from<R: BufRead>(&self, reader: R, format: InputFormat) -> Result<ObservationBatch> {
        let batch = match format {
            InputFormat::Json => self.read_json(reader)?,
            InputFormat::JsonLines => self.read_json_lines(reader)?,
            InputFormat::Csv => self.read_csv(reader)?,
        };

        if batch.observations.is_empty() {
            return Err(ProcessingError::EmptyInput);
        }
        batch.check_required_columns()?;
        Ok(batch)
    }

    fn read_json<R: Read>(&self, reader: R) -> Result<ObservationBatch> {
        let records: Vec<Value> = serde_json::from_reader(reader)?;
        let mut batch = ObservationBatch::default();
        for (index, record) in records.into_iter().enumerate() {
            decode_record(record, index + 1, &mut batch);
        }
        Ok(batch)
    }

    fn read_json_lines<R: BufRead>(&self, reader: R) -> Result<ObservationBatch> {
        let mut batch = ObservationBatch::default();
        for (index, line) in reader.lines().enumerate() {
            let line = line?;
            if line.trim().is_empty() {
                continue;
            }

            match serde_json::from_str::<Value>(&line) {
                Ok(record) => decode_record(record, index + 1, &mut batch),
                Err(e) => {
                    warn!("Skipping line {}: {}", index + 1, e);
                    batch.skipped_records += 1;
                }
            }
        }
        Ok(batch)
    }

    /// CSV cells are handed to the lenient decoders as strings; empty cells are null.
    fn read_csv<R: Read>(&self, reader: R) -> Result<ObservationBatch> {
        let mut csv_reader = csv::ReaderBuilder::new()
            .has_headers(true)
            .flexible(true)
            .from_reader(reader);

        let headers = csv_reader.headers()?.clone();
        let mut batch = ObservationBatch::default();
        batch.record_columns(headers.iter());
        batch.check_required_columns()?;
        for (index, row) in csv_reader.records().enumerate() {
            let row = row?;
            let record: Map<String, Value> = headers
                .iter()
                .zip(row.iter())
                .map(|(name, cell)| {
                    let value = if cell.is_empty() {
                        Value::Null
                    } else {
                        Value::String(cell.to_string())
                    };
                    (name.to_string(), value)
                })
                .collect();
            // Header line is line 1
            decode_record(Value::Object(record), index + 2, &mut batch);
        }
        Ok(batch)
    }
}

impl Default for ObservationReader {
    fn default() -> Self {
        Self::new()
    }
}

fn decode_record(record: Value, line: usize, batch: &mut ObservationBatch) {
    match MetarObservation::deserialize(&record) {
        Ok(observation) => {
            if let Value::Object(map) = &record {
                batch.record_columns(map.keys().map(String::as_str));
            }
            batch.observations.push(observation);
        }
        Err(e) => {
            warn!("Skipping record {}: {}", line, e);
            batch.skipped_records += 1;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::{Cursor, Write};
    use tempfile::Builder;

    #[test]
    fn test_format_from_extension() {
        assert_eq!(
            InputFormat::from_path(Path::new("obs.JSON")).unwrap(),
            InputFormat::Json
        );
        assert_eq!(
            InputFormat::from_path(Path::new("obs.ndjson")).unwrap(),
            InputFormat::JsonLines
        );
        assert!(matches!(
            InputFormat::from_path(Path::new("obs.xlsx")),
            Err(ProcessingError::UnsupportedFormat(_))
        ));
    }

    const HEADER: &str = "raw,station,time.dt,temperature.value,altimeter.value,visibility.value,\
                          flight_rules,density_altitude.value,pressure_altitude.value";

    fn json_record(raw: &str, temperature: f64) -> String {
        format!(
            r#"{{"raw": "{}", "station": "KJFK", "time": "2023-06-01T12:00:00Z", "temperature": {}, "altimeter": 30.01, "visibility": 10, "flight_rules": "VFR", "density_altitude": 500, "pressure_altitude": 100}}"#,
            raw, temperature
        )
    }

    #[test]
    fn test_read_json_lines_skips_bad_records() {
        let input = format!(
            "{}\n\nnot json\n{}\n",
            json_record("KJFK A", 20.0),
            r#"{"station": "KJFK"}"#
        );

        let batch = ObservationReader::new()
            .read_from(Cursor::new(input), InputFormat::JsonLines)
            .unwrap();

        assert_eq!(batch.observations.len(), 1);
        assert_eq!(batch.skipped_records, 2);
        assert_eq!(batch.observations[0].temperature, Some(20.0));
    }

    #[test]
    fn test_read_csv_with_flattened_headers() {
        let input = format!(
            "{},clouds\n\
             KJFK A,KJFK,2023-06-01 12:51:00,22,30.01,10,VFR,500,100,\"[{{'type': 'FEW', 'altitude': 50}}]\"\n\
             KJFK B,KJFK,,,,,,,,\n",
            HEADER
        );

        let batch = ObservationReader::new()
            .read_from(Cursor::new(input), InputFormat::Csv)
            .unwrap();

        assert_eq!(batch.observations.len(), 2);
        assert!(batch.columns.contains("time"));
        assert!(batch.columns.contains("temperature"));
        let first = &batch.observations[0];
        assert_eq!(first.temperature, Some(22.0));
        assert_eq!(first.clouds.len(), 1);
        assert_eq!(first.flight_rules.as_deref(), Some("VFR"));

        let second = &batch.observations[1];
        assert_eq!(second.time, None);
        assert_eq!(second.temperature, None);
    }

    #[test]
    fn test_read_csv_without_raw_column() {
        let input = "station,temperature\nKJFK,20\n";
        let result = ObservationReader::new().read_from(Cursor::new(input), InputFormat::Csv);
        assert!(matches!(result, Err(ProcessingError::MissingColumn(c)) if c == "raw"));
    }

    #[test]
    fn test_read_csv_with_identity_columns_only() {
        let input = "raw,station\nKJFK A,KJFK\nKJFK B,KJFK\n";
        let result = ObservationReader::new().read_from(Cursor::new(input), InputFormat::Csv);
        assert!(matches!(result, Err(ProcessingError::MissingColumn(c)) if c == "time"));
    }

    #[test]
    fn test_read_csv_header_only_missing_visibility() {
        let input = format!("{}\n", HEADER.replace(",visibility.value", ""));
        let result = ObservationReader::new().read_from(Cursor::new(input), InputFormat::Csv);
        assert!(matches!(result, Err(ProcessingError::MissingColumn(c)) if c == "visibility"));
    }

    #[test]
    fn test_json_records_without_temperature() {
        let input = concat!(
            r#"{"raw": "KJFK A", "station": "KJFK", "time": "2023-06-01T12:00:00Z", "#,
            r#""altimeter": 30.01, "visibility": 10, "flight_rules": "VFR", "#,
            r#""density_altitude": 500, "pressure_altitude": 100}"#,
            "\n",
        );
        let result = ObservationReader::new().read_from(Cursor::new(input), InputFormat::JsonLines);
        assert!(matches!(result, Err(ProcessingError::MissingColumn(c)) if c == "temperature"));
    }

    #[test]
    fn test_json_columns_are_the_union_of_record_keys() {
        let sparse = r#"{"raw": "KJFK B", "station": "KJFK", "temperature": 21}"#;
        let input = format!("[{}, {}]", json_record("KJFK A", 20.0), sparse);

        let batch = ObservationReader::new()
            .read_from(Cursor::new(input), InputFormat::Json)
            .unwrap();

        assert_eq!(batch.observations.len(), 2);
        assert_eq!(batch.observations[1].flight_rules, None);
        assert!(batch.columns.contains("pressure_altitude"));
    }

    #[test]
    fn test_read_empty_json_array() {
        let result = ObservationReader::new().read_from(Cursor::new("[]"), InputFormat::Json);
        assert!(matches!(result, Err(ProcessingError::EmptyInput)));
    }

    #[test]
    fn test_read_json_file() {
        let mut file = Builder::new().suffix(".json").tempfile().unwrap();
        write!(file, "[{}]", json_record("EGLL A", 15.0)).unwrap();

        let batch = ObservationReader::new().read_file(file.path()).unwrap();
        assert_eq!(batch.observations[0].altimeter, Some(30.01));
        assert_eq!(batch.observations[0].temperature, Some(15.0));
    }
}
