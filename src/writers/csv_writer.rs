use crate::error::{ProcessingError, Result};
use crate::models::{ColumnValues, FeatureFrame};
use chrono::SecondsFormat;
use csv::WriterBuilder;
use std::fs::File;
use std::io::Write;
use std::path::Path;

/// Writes a cleaned table as delimited text. Nulls become empty cells.
pub struct CsvWriter {
    delimiter: u8,
}

impl CsvWriter {
    pub fn new() -> Self {
        Self { delimiter: b',' }
    }

    pub fn with_delimiter(mut self, delimiter: u8) -> Self {
        self.delimiter = delimiter;
        self
    }

    pub fn write_frame(&self, frame: &FeatureFrame, path: &Path) -> Result<()> {
        let file = File::create(path)?;
        self.write_to(frame, file)
    }

    pub fn write_to<W: Write>(&self, frame: &FeatureFrame, output: W) -> Result<()> {
        if let Some(column) = frame.columns().iter().find(|c| c.values.is_nested()) {
            return Err(ProcessingError::InvalidFormat(format!(
                "Column '{}' still holds {} values and cannot be written",
                column.name,
                column.values.kind()
            )));
        }

        let mut writer = WriterBuilder::new()
            .delimiter(self.delimiter)
            .from_writer(output);

        writer.write_record(frame.column_names())?;

        let mut record = Vec::with_capacity(frame.column_count());
        for row in 0..frame.len() {
            record.clear();
            record.extend(frame.columns().iter().map(|c| cell(&c.values, row)));
            writer.write_record(&record)?;
        }

        writer.flush()?;
        Ok(())
    }
}

impl Default for CsvWriter {
    fn default() -> Self {
        Self::new()
    }
}

fn cell(values: &ColumnValues, row: usize) -> String {
    match values {
        ColumnValues::Text(v) => v[row].clone().unwrap_or_default(),
        ColumnValues::Timestamp(v) => v[row]
            .map(|t| t.to_rfc3339_opts(SecondsFormat::Secs, true))
            .unwrap_or_default(),
        ColumnValues::Float(v) => v[row].map(|f| f.to_string()).unwrap_or_default(),
        ColumnValues::Integer(v) => v[row].map(|i| i.to_string()).unwrap_or_default(),
        ColumnValues::FloatList(_) | ColumnValues::TextList(_) | ColumnValues::Clouds(_) => {
            String::new()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use pretty_assertions::assert_eq;

    #[test]
    fn test_write_csv() {
        let mut frame = FeatureFrame::new();
        frame
            .push_column(
                "raw",
                ColumnValues::Text(vec![Some("KJFK A".into()), Some("KJFK, B".into())]),
            )
            .unwrap();
        frame
            .push_column(
                "time",
                ColumnValues::Timestamp(vec![
                    Some(Utc.with_ymd_and_hms(2023, 6, 1, 12, 51, 0).unwrap()),
                    None,
                ]),
            )
            .unwrap();
        frame
            .push_column("visibility_meters", ColumnValues::Float(vec![Some(9999.0), None]))
            .unwrap();
        frame
            .push_column("flight_rules", ColumnValues::Integer(vec![Some(1), Some(2)]))
            .unwrap();

        let mut output = Vec::new();
        CsvWriter::new().write_to(&frame, &mut output).unwrap();

        assert_eq!(
            String::from_utf8(output).unwrap(),
            "raw,time,visibility_meters,flight_rules\n\
             KJFK A,2023-06-01T12:51:00Z,9999,1\n\
             \"KJFK, B\",,,2\n"
        );
    }

    #[test]
    fn test_nested_column_is_rejected() {
        let mut frame = FeatureFrame::new();
        frame
            .push_column("wx_codes", ColumnValues::TextList(vec![vec![]]))
            .unwrap();

        let result = CsvWriter::new().write_to(&frame, Vec::new());
        assert!(matches!(result, Err(ProcessingError::InvalidFormat(_))));
    }
}
