use crate::cli::args::{Cli, Commands, OutputFormat};
use crate::cli::logging::init_logging;
use crate::models::{ColumnValues, FeatureFrame};
use crate::processors::{MetarCleaner, QualityChecker};
use crate::readers::ObservationReader;
use crate::settings::AppConfig;
use crate::utils::constants::{
    COL_ALTIMETER_HPA, COL_FLIGHT_RULES, COL_RAW, COL_STATION, COL_TEMPERATURE, COL_TIME,
    COL_VISIBILITY_METERS,
};
use crate::utils::progress::ProgressReporter;
use crate::writers::{CsvWriter, ParquetWriter};
use anyhow::Context;
use std::path::{Path, PathBuf};
use tracing::info;

const SAMPLE_COLUMNS: [&str; 7] = [
    COL_TIME,
    COL_STATION,
    COL_TEMPERATURE,
    COL_ALTIMETER_HPA,
    COL_VISIBILITY_METERS,
    COL_FLIGHT_RULES,
    COL_RAW,
];

pub fn run(cli: Cli) -> anyhow::Result<()> {
    init_logging(cli.verbose, cli.log_file.as_deref())?;

    let settings = AppConfig::load(cli.config.as_deref()).context("Failed to load settings")?;

    match cli.command {
        Commands::Clean {
            input,
            output,
            format,
            compression,
            max_workers,
        } => {
            let settings = settings
                .with_compression(compression)
                .with_max_workers(max_workers);
            settings.check()?;

            let output = output.unwrap_or_else(|| default_output_path(&input, format));
            println!("Cleaning METAR observations...");
            println!("Input file: {}", input.display());
            println!("Output file: {}", output.display());
            println!("Workers: {}", settings.max_workers);

            let (frame, _) = clean_file(&input, settings.max_workers)?;

            if let Some(parent) = output.parent() {
                if !parent.as_os_str().is_empty() {
                    std::fs::create_dir_all(parent)?;
                }
            }

            match format {
                OutputFormat::Parquet => {
                    let writer = ParquetWriter::new()
                        .with_compression(&settings.compression)?
                        .with_row_group_size(settings.row_group_size);
                    writer
                        .write_frame_batched(&frame, &output, settings.batch_size)
                        .with_context(|| format!("Failed to write {}", output.display()))?;

                    let file_info = writer.get_file_info(&output)?;
                    println!("\n{}", file_info.summary());
                }
                OutputFormat::Csv => {
                    CsvWriter::new()
                        .write_frame(&frame, &output)
                        .with_context(|| format!("Failed to write {}", output.display()))?;
                }
            }

            info!(
                rows = frame.len(),
                columns = frame.column_count(),
                "Wrote {}",
                output.display()
            );
            println!("Cleaning complete!");
        }

        Commands::Validate {
            input,
            max_workers,
            max_violations,
        } => {
            let settings = settings.with_max_workers(max_workers);
            settings.check()?;

            println!("Validating METAR observations...");
            println!("Input file: {}", input.display());

            let (frame, skipped) = clean_file(&input, settings.max_workers)?;

            let checker = QualityChecker::new().with_max_listed_violations(max_violations);
            let report = checker.check(&frame)?;
            println!("\n{}", checker.generate_summary(&report));

            if report.range_violations.is_empty() && skipped == 0 {
                println!("✅ All data passed validation checks");
            } else {
                println!(
                    "⚠️  Found {} range violations, {} undecodable records",
                    report.range_violations.len(),
                    skipped
                );
            }
        }

        Commands::Info {
            file,
            sample,
            max_violations,
        } => {
            println!("Analyzing Parquet file: {}", file.display());

            let writer = ParquetWriter::new();
            let file_info = writer
                .get_file_info(&file)
                .with_context(|| format!("Failed to open {}", file.display()))?;
            let frame = writer.read_frame(&file)?;

            let checker = QualityChecker::new().with_max_listed_violations(max_violations);
            let report = checker.check(&frame)?;
            println!("\n{}", checker.generate_summary(&report));

            println!("\nFile Details:");
            println!("{}", file_info.summary());

            if sample > 0 {
                println!("\nSample Records (showing {} records):", sample.min(frame.len()));
                for line in sample_lines(&frame, sample) {
                    println!("{}", line);
                }
            }
        }
    }

    Ok(())
}

/// Read, clean and summarize one observation file; returns the table and the
/// number of records the reader had to skip.
fn clean_file(input: &Path, max_workers: usize) -> anyhow::Result<(FeatureFrame, usize)> {
    let progress = ProgressReporter::new_spinner("Reading observations...", false);

    let batch = ObservationReader::new()
        .read_file(input)
        .with_context(|| format!("Failed to read {}", input.display()))?;
    if batch.skipped_records > 0 {
        progress.println(&format!(
            "Skipped {} records that could not be decoded",
            batch.skipped_records
        ));
    }

    let cleaner = MetarCleaner::new().with_max_workers(max_workers);
    let (frame, report) = cleaner.clean_with_report(&batch.observations, Some(&progress))?;

    println!("\n{}", report.summary());
    Ok((frame, batch.skipped_records))
}

fn default_output_path(input: &Path, format: OutputFormat) -> PathBuf {
    let stem = input
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("metar");
    input.with_file_name(format!("{}-cleaned.{}", stem, format.extension()))
}

fn sample_lines(frame: &FeatureFrame, limit: usize) -> Vec<String> {
    let columns: Vec<(&str, &ColumnValues)> = SAMPLE_COLUMNS
        .iter()
        .filter_map(|name| frame.values(name).map(|values| (*name, values)))
        .collect();

    (0..frame.len().min(limit))
        .map(|row| {
            let fields: Vec<String> = columns
                .iter()
                .map(|(name, values)| format!("{}={}", name, display_value(values, row)))
                .collect();
            format!("{}. {}", row + 1, fields.join(", "))
        })
        .collect()
}

fn display_value(values: &ColumnValues, row: usize) -> String {
    const NULL: &str = "-";
    match values {
        ColumnValues::Text(v) => v[row].clone().unwrap_or_else(|| NULL.to_string()),
        ColumnValues::Timestamp(v) => v[row]
            .map(|t| t.format("%Y-%m-%d %H:%M").to_string())
            .unwrap_or_else(|| NULL.to_string()),
        ColumnValues::Float(v) => v[row]
            .map(|f| format!("{:.1}", f))
            .unwrap_or_else(|| NULL.to_string()),
        ColumnValues::Integer(v) => v[row]
            .map(|i| i.to_string())
            .unwrap_or_else(|| NULL.to_string()),
        other => other.kind().to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_output_path() {
        let path = default_output_path(Path::new("data/metars.jsonl"), OutputFormat::Parquet);
        assert_eq!(path, PathBuf::from("data/metars-cleaned.parquet"));

        let path = default_output_path(Path::new("metars.csv"), OutputFormat::Csv);
        assert_eq!(path, PathBuf::from("metars-cleaned.csv"));
    }

    #[test]
    fn test_sample_lines() {
        let mut frame = FeatureFrame::new();
        frame
            .push_column(
                COL_STATION,
                ColumnValues::Text(vec![Some("KJFK".into()), Some("KBOS".into())]),
            )
            .unwrap();
        frame
            .push_column(COL_TEMPERATURE, ColumnValues::Float(vec![Some(22.0), None]))
            .unwrap();

        let lines = sample_lines(&frame, 5);
        assert_eq!(
            lines,
            vec![
                "1. station=KJFK, temperature=22.0".to_string(),
                "2. station=KBOS, temperature=-".to_string(),
            ]
        );
    }
}
