use std::collections::HashSet;

use tracing::{debug, info};

use crate::error::{ProcessingError, Result};
use crate::models::{ColumnValues, FeatureFrame, MetarObservation};
use crate::processors::units::{normalize_altimeter, normalize_visibility};
use crate::processors::{CategoricalEncoder, CloudLayerEncoder, ImputationSummary, Imputer};
use crate::utils::constants::{
    COL_ALTIMETER, COL_ALTIMETER_HPA, COL_RAW, COL_SANITIZED, COL_TEMPERATURE, COL_VISIBILITY,
    COL_VISIBILITY_METERS, LEADING_COLUMNS, MAX_VALID_TEMP, PRECIP_PREFIX, REDUNDANT_COLUMNS,
    REQUIRED_COLUMNS, REQUIRED_EITHER_COLUMNS, UNUSED_COLUMNS,
};
use crate::utils::progress::ProgressReporter;

/// Row and column bookkeeping for one pipeline run.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CleaningReport {
    pub input_rows: usize,
    pub duplicate_rows: usize,
    pub sensor_fault_rows: usize,
    pub missing_temperature_rows: usize,
    pub unrecoverable_rows: usize,
    pub output_rows: usize,
    pub output_columns: usize,
    pub cloud_layers: usize,
    pub dropped_columns: Vec<String>,
    pub imputation: ImputationSummary,
}

impl CleaningReport {
    pub fn rows_removed(&self) -> usize {
        self.duplicate_rows
            + self.sensor_fault_rows
            + self.missing_temperature_rows
            + self.unrecoverable_rows
    }

    pub fn summary(&self) -> String {
        let mut summary = String::new();

        summary.push_str("=== Cleaning Report ===\n");
        summary.push_str(&format!("Input Rows: {}\n", self.input_rows));
        summary.push_str(&format!("Duplicates Removed: {}\n", self.duplicate_rows));
        summary.push_str(&format!(
            "Sensor Faults Removed (temperature > {}): {}\n",
            MAX_VALID_TEMP, self.sensor_fault_rows
        ));
        summary.push_str(&format!(
            "Missing Temperature Removed: {}\n",
            self.missing_temperature_rows
        ));
        summary.push_str(&format!(
            "Unrecoverable Rows Removed: {}\n",
            self.unrecoverable_rows
        ));
        summary.push_str(&format!(
            "Output: {} rows x {} columns ({} cloud layers)\n",
            self.output_rows, self.output_columns, self.cloud_layers
        ));

        let imputed = &self.imputation;
        summary.push_str("\nImputed Values:\n");
        summary.push_str(&format!("  Calm wind: {}\n", imputed.calm_wind));
        summary.push_str(&format!(
            "  Sea level pressure: {} by station, {} by global median\n",
            imputed.sea_level_pressure_by_station, imputed.sea_level_pressure_global
        ));
        summary.push_str(&format!(
            "  Visibility: {} by cloud signature, {} by flight rules\n",
            imputed.visibility_from_clouds, imputed.visibility_from_flight_rules
        ));

        summary
    }
}

/// Turns decoded METAR observations into the model-ready feature table.
///
/// Stages run in a fixed order; later stages read columns derived by earlier
/// ones. Row-local work runs on a rayon pool sized by `max_workers`.
pub struct MetarCleaner {
    max_workers: usize,
    categorical: CategoricalEncoder,
    clouds: CloudLayerEncoder,
    imputer: Imputer,
}

impl MetarCleaner {
    pub fn new() -> Self {
        Self {
            max_workers: num_cpus::get(),
            categorical: CategoricalEncoder::new(),
            clouds: CloudLayerEncoder::new(),
            imputer: Imputer::new(),
        }
    }

    pub fn with_max_workers(mut self, max_workers: usize) -> Self {
        self.max_workers = max_workers.max(1);
        self
    }

    /// Clean decoded observations.
    ///
    /// A typed observation carries every field, so the table built from it
    /// always has every required column. Whether the input actually supplied
    /// those columns is checked when it is read, by
    /// `ObservationBatch::check_required_columns`.
    pub fn clean(&self, observations: Vec<MetarObservation>) -> Result<FeatureFrame> {
        self.clean_with_report(&observations, None)
            .map(|(frame, _)| frame)
    }

    pub fn clean_with_report(
        &self,
        observations: &[MetarObservation],
        progress: Option<&ProgressReporter>,
    ) -> Result<(FeatureFrame, CleaningReport)> {
        if observations.is_empty() {
            return Err(ProcessingError::EmptyInput);
        }
        self.clean_frame(FeatureFrame::from_observations(observations), progress)
    }

    /// Run the pipeline over an existing table.
    ///
    /// Fails only when the table is structurally unusable: no rows, or a
    /// required column missing entirely.
    pub fn clean_frame(
        &self,
        frame: FeatureFrame,
        progress: Option<&ProgressReporter>,
    ) -> Result<(FeatureFrame, CleaningReport)> {
        self.validate_structure(&frame)?;

        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(self.max_workers)
            .build()
            .map_err(|e| ProcessingError::Config(e.to_string()))?;

        pool.install(|| self.run_stages(frame, progress))
    }

    fn run_stages(
        &self,
        mut frame: FeatureFrame,
        progress: Option<&ProgressReporter>,
    ) -> Result<(FeatureFrame, CleaningReport)> {
        let mut report = CleaningReport {
            input_rows: frame.len(),
            ..CleaningReport::default()
        };

        stage(progress, "Removing duplicate reports...");
        report.duplicate_rows = self.deduplicate(&mut frame)?;
        info!(
            rows = frame.len(),
            removed = report.duplicate_rows,
            "Deduplicated reports"
        );

        stage(progress, "Encoding weather and pressure tendency...");
        self.categorical.encode_wind_variability(&mut frame)?;
        self.categorical.encode_weather(&mut frame)?;
        self.categorical.encode_pressure_tendency(&mut frame)?;

        stage(progress, "Removing sensor faults...");
        report.sensor_fault_rows = self.drop_sensor_faults(&mut frame)?;
        info!(
            rows = frame.len(),
            removed = report.sensor_fault_rows,
            "Removed temperatures above {}",
            MAX_VALID_TEMP
        );

        stage(progress, "Normalizing units...");
        self.normalize_units(&mut frame)?;
        report
            .dropped_columns
            .extend(frame.drop_columns(&[COL_SANITIZED]));
        report
            .dropped_columns
            .extend(frame.drop_columns(&UNUSED_COLUMNS));

        stage(progress, "Encoding cloud layers...");
        report.cloud_layers = self.clouds.apply(&mut frame)?;

        report.missing_temperature_rows = self.drop_missing_temperature(&mut frame)?;
        info!(
            rows = frame.len(),
            removed = report.missing_temperature_rows,
            "Removed rows without temperature"
        );

        self.categorical.encode_flight_rules(&mut frame)?;

        report.dropped_columns.extend(frame.drop_prefixed(PRECIP_PREFIX));
        report
            .dropped_columns
            .extend(frame.drop_columns(&REDUNDANT_COLUMNS));
        debug!("Dropped columns: {:?}", report.dropped_columns);

        stage(progress, "Imputing missing values...");
        report.imputation = self.imputer.impute(&mut frame)?;
        debug!("Imputation summary: {:?}", report.imputation);

        report.unrecoverable_rows = self.imputer.drop_unrecoverable(&mut frame)?;
        info!(
            rows = frame.len(),
            removed = report.unrecoverable_rows,
            "Removed rows missing required fields"
        );

        self.reorder_columns(&mut frame)?;

        report.output_rows = frame.len();
        report.output_columns = frame.column_count();
        if let Some(p) = progress {
            p.finish_with_message(&format!(
                "Cleaned {} of {} reports",
                report.output_rows, report.input_rows
            ));
        }

        Ok((frame, report))
    }

    fn validate_structure(&self, frame: &FeatureFrame) -> Result<()> {
        if frame.is_empty() {
            return Err(ProcessingError::EmptyInput);
        }

        if let Some(missing) = REQUIRED_COLUMNS.iter().find(|c| !frame.has_column(c)) {
            return Err(ProcessingError::MissingColumn(missing.to_string()));
        }

        for (source, derived) in REQUIRED_EITHER_COLUMNS {
            if !frame.has_column(source) && !frame.has_column(derived) {
                return Err(ProcessingError::MissingColumn(source.to_string()));
            }
        }

        Ok(())
    }

    /// Keep the first report for each raw string. Rows without a raw string
    /// are never treated as duplicates of each other.
    fn deduplicate(&self, frame: &mut FeatureFrame) -> Result<usize> {
        let raw = frame
            .texts(COL_RAW)
            .ok_or_else(|| wrong_kind(frame, COL_RAW, "text"))?;

        let mut seen = HashSet::with_capacity(raw.len());
        let keep: Vec<bool> = raw
            .iter()
            .map(|r| r.as_deref().map_or(true, |r| seen.insert(r)))
            .collect();

        frame.retain_rows(&keep)
    }

    fn drop_sensor_faults(&self, frame: &mut FeatureFrame) -> Result<usize> {
        let keep: Vec<bool> = self
            .temperatures(frame)?
            .iter()
            .map(|t| t.map_or(true, |t| t <= MAX_VALID_TEMP))
            .collect();
        frame.retain_rows(&keep)
    }

    fn drop_missing_temperature(&self, frame: &mut FeatureFrame) -> Result<usize> {
        let keep: Vec<bool> = self
            .temperatures(frame)?
            .iter()
            .map(Option::is_some)
            .collect();
        frame.retain_rows(&keep)
    }

    fn temperatures<'a>(&self, frame: &'a FeatureFrame) -> Result<&'a [Option<f64>]> {
        frame
            .floats(COL_TEMPERATURE)
            .ok_or_else(|| wrong_kind(frame, COL_TEMPERATURE, "float"))
    }

    /// Replace `altimeter` and `visibility` with their canonical-unit columns.
    fn normalize_units(&self, frame: &mut FeatureFrame) -> Result<()> {
        if let Some(values) = frame.take_column(COL_ALTIMETER) {
            let hpa = float_values(values, COL_ALTIMETER)?
                .into_iter()
                .map(|v| v.and_then(normalize_altimeter))
                .collect();
            frame.push_column(COL_ALTIMETER_HPA, ColumnValues::Float(hpa))?;
        }

        if let Some(values) = frame.take_column(COL_VISIBILITY) {
            let meters = float_values(values, COL_VISIBILITY)?
                .into_iter()
                .map(|v| v.map(normalize_visibility))
                .collect();
            frame.push_column(COL_VISIBILITY_METERS, ColumnValues::Float(meters))?;
        }

        Ok(())
    }

    /// Identity columns first, then complete columns, then columns with gaps.
    fn reorder_columns(&self, frame: &mut FeatureFrame) -> Result<()> {
        let mut complete = Vec::new();
        let mut incomplete = Vec::new();
        for column in frame.columns() {
            if LEADING_COLUMNS.contains(&column.name.as_str()) {
                continue;
            }
            if column.values.null_count() == 0 {
                complete.push(column.name.clone());
            } else {
                incomplete.push(column.name.clone());
            }
        }

        let order: Vec<String> = LEADING_COLUMNS
            .iter()
            .filter(|name| frame.has_column(name))
            .map(|name| name.to_string())
            .chain(complete)
            .chain(incomplete)
            .collect();

        frame.reorder_columns(&order)
    }
}

impl Default for MetarCleaner {
    fn default() -> Self {
        Self::new()
    }
}

fn stage(progress: Option<&ProgressReporter>, message: &str) {
    debug!("{}", message);
    if let Some(p) = progress {
        p.set_message(message);
    }
}

fn float_values(values: ColumnValues, column: &str) -> Result<Vec<Option<f64>>> {
    match values {
        ColumnValues::Float(values) => Ok(values),
        ColumnValues::Integer(values) => Ok(values.into_iter().map(|v| v.map(|v| v as f64)).collect()),
        other => Err(ProcessingError::InvalidFormat(format!(
            "Column '{}' holds {} values, expected numbers",
            column,
            other.kind()
        ))),
    }
}

fn wrong_kind(frame: &FeatureFrame, column: &str, expected: &str) -> ProcessingError {
    let actual = frame.values(column).map_or("no", ColumnValues::kind);
    ProcessingError::InvalidFormat(format!(
        "Column '{}' holds {} values, expected {}",
        column, actual, expected
    ))
}
