use crate::error::{ProcessingError, Result};
use crate::models::{ColumnValues, FeatureFrame};
use crate::utils::constants::{
    COMPRESSION_GZIP, COMPRESSION_LZ4, COMPRESSION_NONE, COMPRESSION_SNAPPY, COMPRESSION_ZSTD,
    DEFAULT_ROW_GROUP_SIZE,
};
use arrow::array::*;
use arrow::compute::cast;
use arrow::datatypes::{DataType, Field, Schema, TimeUnit};
use arrow::record_batch::RecordBatch;
use chrono::DateTime;
use parquet::arrow::arrow_reader::ParquetRecordBatchReaderBuilder;
use parquet::arrow::ArrowWriter;
use parquet::basic::{Compression, GzipLevel, ZstdLevel};
use parquet::file::properties::WriterProperties;
use std::fs::File;
use std::path::Path;
use std::sync::Arc;
use tracing::debug;

const UTC: &str = "UTC";

pub struct ParquetWriter {
    compression: Compression,
    row_group_size: usize,
}

impl ParquetWriter {
    pub fn new() -> Self {
        Self {
            compression: Compression::SNAPPY,
            row_group_size: DEFAULT_ROW_GROUP_SIZE,
        }
    }

    pub fn with_compression(mut self, compression: &str) -> Result<Self> {
        self.compression = match compression.to_lowercase().as_str() {
            COMPRESSION_SNAPPY => Compression::SNAPPY,
            COMPRESSION_GZIP => Compression::GZIP(GzipLevel::default()),
            COMPRESSION_LZ4 => Compression::LZ4,
            COMPRESSION_ZSTD => Compression::ZSTD(ZstdLevel::default()),
            COMPRESSION_NONE => Compression::UNCOMPRESSED,
            _ => {
                return Err(ProcessingError::Config(format!(
                    "Unsupported compression: {}",
                    compression
                )))
            }
        };
        Ok(self)
    }

    pub fn with_row_group_size(mut self, size: usize) -> Self {
        self.row_group_size = size.max(1);
        self
    }

    /// Write a cleaned table to a Parquet file
    pub fn write_frame(&self, frame: &FeatureFrame, path: &Path) -> Result<()> {
        self.write_frame_batched(frame, path, frame.len().max(1))
    }

    /// Write the table in record batches of `batch_size` rows
    pub fn write_frame_batched(
        &self,
        frame: &FeatureFrame,
        path: &Path,
        batch_size: usize,
    ) -> Result<()> {
        if frame.column_count() == 0 {
            return Ok(());
        }

        let schema = self.create_schema(frame)?;
        let batch = self.frame_to_batch(frame, schema.clone())?;

        let file = File::create(path)?;
        let props = WriterProperties::builder()
            .set_compression(self.compression)
            .set_max_row_group_size(self.row_group_size)
            .build();

        let mut writer = ArrowWriter::try_new(file, schema, Some(props))?;

        let batch_size = batch_size.max(1);
        let mut offset = 0;
        while offset < batch.num_rows() {
            let length = batch_size.min(batch.num_rows() - offset);
            writer.write(&batch.slice(offset, length))?;
            offset += length;
        }

        writer.close()?;
        debug!(
            "Wrote {} rows x {} columns to {}",
            frame.len(),
            frame.column_count(),
            path.display()
        );
        Ok(())
    }

    /// Arrow schema derived from the table's columns, all nullable
    fn create_schema(&self, frame: &FeatureFrame) -> Result<Arc<Schema>> {
        let fields = frame
            .columns()
            .iter()
            .map(|column| {
                let data_type = match &column.values {
                    ColumnValues::Text(_) => DataType::Utf8,
                    ColumnValues::Timestamp(_) => {
                        DataType::Timestamp(TimeUnit::Millisecond, Some(UTC.into()))
                    }
                    ColumnValues::Float(_) => DataType::Float64,
                    ColumnValues::Integer(_) => DataType::Int64,
                    nested => {
                        return Err(ProcessingError::InvalidFormat(format!(
                            "Column '{}' still holds {} values and cannot be written",
                            column.name,
                            nested.kind()
                        )))
                    }
                };
                Ok(Field::new(&column.name, data_type, true))
            })
            .collect::<Result<Vec<_>>>()?;

        Ok(Arc::new(Schema::new(fields)))
    }

    fn frame_to_batch(&self, frame: &FeatureFrame, schema: Arc<Schema>) -> Result<RecordBatch> {
        let arrays: Vec<ArrayRef> = frame
            .columns()
            .iter()
            .map(|column| -> Result<ArrayRef> {
                Ok(match &column.values {
                    ColumnValues::Text(v) => Arc::new(StringArray::from(v.clone())),
                    ColumnValues::Timestamp(v) => Arc::new(
                        TimestampMillisecondArray::from(
                            v.iter()
                                .map(|t| t.map(|t| t.timestamp_millis()))
                                .collect::<Vec<_>>(),
                        )
                        .with_timezone(UTC),
                    ),
                    ColumnValues::Float(v) => Arc::new(Float64Array::from(v.clone())),
                    ColumnValues::Integer(v) => Arc::new(Int64Array::from(v.clone())),
                    nested => {
                        return Err(ProcessingError::InvalidFormat(format!(
                            "Column '{}' holds {} values",
                            column.name,
                            nested.kind()
                        )))
                    }
                })
            })
            .collect::<Result<Vec<_>>>()?;

        let batch = RecordBatch::try_new(schema, arrays)?;
        Ok(batch)
    }

    /// Read a Parquet file back into a table
    pub fn read_frame(&self, path: &Path) -> Result<FeatureFrame> {
        self.read_frame_limited(path, None)
    }

    /// Read at most `limit` rows
    pub fn read_sample(&self, path: &Path, limit: usize) -> Result<FeatureFrame> {
        self.read_frame_limited(path, Some(limit))
    }

    fn read_frame_limited(&self, path: &Path, limit: Option<usize>) -> Result<FeatureFrame> {
        let file = File::open(path)?;
        let mut builder = ParquetRecordBatchReaderBuilder::try_new(file)?;
        if let Some(limit) = limit {
            builder = builder.with_batch_size(limit.clamp(1, 8192)).with_limit(limit);
        }
        let schema = builder.schema().clone();
        let parquet_reader = builder.build()?;

        let mut columns: Vec<Option<ColumnValues>> = vec![None; schema.fields().len()];
        for batch_result in parquet_reader {
            let batch = batch_result?;
            for (idx, field) in schema.fields().iter().enumerate() {
                let values = array_to_values(field.name(), batch.column(idx))?;
                if let Some(existing) = columns[idx].as_mut() {
                    existing.append(values)?;
                } else {
                    columns[idx] = Some(values);
                }
            }
        }

        let mut frame = FeatureFrame::new();
        for (field, values) in schema.fields().iter().zip(columns) {
            let values = match values {
                Some(values) => values,
                None => empty_values(field.data_type()),
            };
            frame.push_column(field.name(), values)?;
        }
        Ok(frame)
    }

    /// Get file statistics
    pub fn get_file_info(&self, path: &Path) -> Result<ParquetFileInfo> {
        use parquet::file::reader::{FileReader, SerializedFileReader};

        let file = File::open(path)?;
        let reader = SerializedFileReader::new(file)?;
        let metadata = reader.metadata();

        let file_metadata = metadata.file_metadata();
        let row_groups = metadata.num_row_groups();
        let total_rows = file_metadata.num_rows();
        let file_size = std::fs::metadata(path)?.len();

        let mut row_group_sizes = Vec::new();
        let mut compression = self.compression;
        for i in 0..row_groups {
            let rg_metadata = metadata.row_group(i);
            row_group_sizes.push(rg_metadata.num_rows());
            if rg_metadata.num_columns() > 0 {
                compression = rg_metadata.column(0).compression();
            }
        }

        Ok(ParquetFileInfo {
            total_rows,
            total_columns: file_metadata.schema_descr().num_columns(),
            row_groups: row_groups as i32,
            row_group_sizes,
            file_size,
            compression,
        })
    }
}

impl Default for ParquetWriter {
    fn default() -> Self {
        Self::new()
    }
}

fn array_to_values(name: &str, array: &ArrayRef) -> Result<ColumnValues> {
    let invalid = || ProcessingError::InvalidFormat(format!("Invalid {} column type", name));

    match array.data_type() {
        DataType::Utf8 | DataType::LargeUtf8 => {
            let array = cast(array, &DataType::Utf8)?;
            let strings = array
                .as_any()
                .downcast_ref::<StringArray>()
                .ok_or_else(invalid)?;
            Ok(ColumnValues::Text(
                strings.iter().map(|s| s.map(str::to_string)).collect(),
            ))
        }
        DataType::Timestamp(_, _) => {
            let array = cast(
                array,
                &DataType::Timestamp(TimeUnit::Millisecond, Some(UTC.into())),
            )?;
            let millis = array
                .as_any()
                .downcast_ref::<TimestampMillisecondArray>()
                .ok_or_else(invalid)?;
            Ok(ColumnValues::Timestamp(
                millis
                    .iter()
                    .map(|ms| ms.and_then(DateTime::from_timestamp_millis))
                    .collect(),
            ))
        }
        DataType::Float16 | DataType::Float32 | DataType::Float64 => {
            let array = cast(array, &DataType::Float64)?;
            let floats = array
                .as_any()
                .downcast_ref::<Float64Array>()
                .ok_or_else(invalid)?;
            Ok(ColumnValues::Float(floats.iter().collect()))
        }
        DataType::Boolean
        | DataType::Int8
        | DataType::Int16
        | DataType::Int32
        | DataType::Int64
        | DataType::UInt8
        | DataType::UInt16
        | DataType::UInt32 => {
            let array = cast(array, &DataType::Int64)?;
            let integers = array
                .as_any()
                .downcast_ref::<Int64Array>()
                .ok_or_else(invalid)?;
            Ok(ColumnValues::Integer(integers.iter().collect()))
        }
        other => Err(ProcessingError::UnsupportedFormat(format!(
            "column '{}' has type {}",
            name, other
        ))),
    }
}

fn empty_values(data_type: &DataType) -> ColumnValues {
    match data_type {
        DataType::Timestamp(_, _) => ColumnValues::Timestamp(Vec::new()),
        DataType::Float16 | DataType::Float32 | DataType::Float64 => {
            ColumnValues::Float(Vec::new())
        }
        DataType::Utf8 | DataType::LargeUtf8 => ColumnValues::Text(Vec::new()),
        _ => ColumnValues::Integer(Vec::new()),
    }
}

#[derive(Debug)]
pub struct ParquetFileInfo {
    pub total_rows: i64,
    pub total_columns: usize,
    pub row_groups: i32,
    pub row_group_sizes: Vec<i64>,
    pub file_size: u64,
    pub compression: Compression,
}

impl ParquetFileInfo {
    pub fn summary(&self) -> String {
        let avg_rows = if self.row_groups > 0 {
            self.total_rows as f64 / self.row_groups as f64
        } else {
            0.0
        };

        format!(
            "Parquet File Summary:\n\
            - Total rows: {}\n\
            - Columns: {}\n\
            - Row groups: {}\n\
            - File size: {:.2} MB\n\
            - Compression: {:?}\n\
            - Avg rows per group: {:.0}",
            self.total_rows,
            self.total_columns,
            self.row_groups,
            self.file_size as f64 / 1_048_576.0,
            self.compression,
            avg_rows
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use pretty_assertions::assert_eq;
    use tempfile::NamedTempFile;

    fn cleaned_frame() -> FeatureFrame {
        let mut frame = FeatureFrame::new();
        frame
            .push_column(
                "raw",
                ColumnValues::Text(vec![Some("KJFK A".into()), Some("KJFK B".into())]),
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
            .push_column("altimeter_hpa", ColumnValues::Float(vec![Some(1013.25), None]))
            .unwrap();
        frame
            .push_column("flight_rules", ColumnValues::Integer(vec![Some(1), Some(3)]))
            .unwrap();
        frame
    }

    #[test]
    fn test_write_empty_frame() {
        let writer = ParquetWriter::new();
        let temp_file = NamedTempFile::new().unwrap();

        let result = writer.write_frame(&FeatureFrame::new(), temp_file.path());
        assert!(result.is_ok());
    }

    #[test]
    fn test_write_and_read_back() -> Result<()> {
        let writer = ParquetWriter::new().with_row_group_size(1);
        let temp_file = NamedTempFile::new().unwrap();
        let frame = cleaned_frame();

        writer.write_frame_batched(&frame, temp_file.path(), 1)?;
        let read = writer.read_frame(temp_file.path())?;
        assert_eq!(read, frame);

        let info = writer.get_file_info(temp_file.path())?;
        assert_eq!(info.total_rows, 2);
        assert_eq!(info.total_columns, 4);
        assert_eq!(info.row_groups, 2);

        Ok(())
    }

    #[test]
    fn test_read_sample_limits_rows() -> Result<()> {
        let writer = ParquetWriter::new();
        let temp_file = NamedTempFile::new().unwrap();

        writer.write_frame(&cleaned_frame(), temp_file.path())?;
        let sample = writer.read_sample(temp_file.path(), 1)?;
        assert_eq!(sample.len(), 1);
        assert_eq!(sample.column_count(), 4);

        Ok(())
    }

    #[test]
    fn test_nested_column_is_rejected() {
        let writer = ParquetWriter::new();
        let temp_file = NamedTempFile::new().unwrap();
        let mut frame = cleaned_frame();
        frame
            .push_column("clouds", ColumnValues::Clouds(vec![vec![], vec![]]))
            .unwrap();

        let result = writer.write_frame(&frame, temp_file.path());
        assert!(matches!(result, Err(ProcessingError::InvalidFormat(_))));
    }

    #[test]
    fn test_different_compressions() -> Result<()> {
        let compressions = ["snappy", "gzip", "lz4", "zstd", "none"];

        for compression in &compressions {
            let writer = ParquetWriter::new().with_compression(compression)?;
            let temp_file = NamedTempFile::new().unwrap();

            let result = writer.write_frame(&cleaned_frame(), temp_file.path());
            assert!(result.is_ok(), "Failed with compression: {}", compression);
        }

        assert!(ParquetWriter::new().with_compression("brotli9").is_err());
        Ok(())
    }
}
