use std::collections::BTreeMap;

use crate::error::Result;
use crate::models::FeatureFrame;
use crate::utils::constants::{
    ALTIMETER_HPA_MIN, COL_ALTIMETER_HPA, COL_FLIGHT_RULES, COL_RAW, COL_STATION,
    COL_VISIBILITY_METERS, VISIBILITY_MAX_METERS, VISIBILITY_MIN_METERS,
};

#[derive(Debug, Clone)]
pub struct QualityReport {
    pub total_rows: usize,
    pub total_columns: usize,
    pub complete_rows: usize,
    pub missing_by_column: BTreeMap<String, usize>,
    pub range_violations: Vec<RangeViolation>,
    pub station_rows: BTreeMap<String, usize>,
}

#[derive(Debug, Clone)]
pub struct RangeViolation {
    pub row: usize,
    pub raw: Option<String>,
    pub violation_type: ViolationType,
    pub details: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ViolationType {
    VisibilityOutOfRange,
    ImplausibleAltimeter,
    UnknownFlightRules,
}

/// Checks a cleaned table against the ranges the model expects.
pub struct QualityChecker {
    max_listed_violations: usize,
}

impl QualityChecker {
    pub fn new() -> Self {
        Self {
            max_listed_violations: 10,
        }
    }

    /// Cap on the violations spelled out by `generate_summary`.
    pub fn with_max_listed_violations(mut self, max_listed_violations: usize) -> Self {
        self.max_listed_violations = max_listed_violations;
        self
    }

    pub fn check(&self, frame: &FeatureFrame) -> Result<QualityReport> {
        let mut report = QualityReport {
            total_rows: frame.len(),
            total_columns: frame.column_count(),
            complete_rows: 0,
            missing_by_column: BTreeMap::new(),
            range_violations: Vec::new(),
            station_rows: BTreeMap::new(),
        };

        for column in frame.columns() {
            let missing = column.values.null_count();
            if missing > 0 {
                report.missing_by_column.insert(column.name.clone(), missing);
            }
        }

        report.complete_rows = (0..frame.len())
            .filter(|&row| frame.columns().iter().all(|c| !c.values.is_null(row)))
            .count();

        if let Some(stations) = frame.texts(COL_STATION) {
            for station in stations.iter().flatten() {
                *report.station_rows.entry(station.clone()).or_default() += 1;
            }
        }

        self.check_ranges(frame, &mut report);

        Ok(report)
    }

    fn check_ranges(&self, frame: &FeatureFrame, report: &mut QualityReport) {
        let raw = frame.texts(COL_RAW);
        let raw_at = |row: usize| raw.and_then(|r| r[row].clone());

        if let Some(visibility) = frame.floats(COL_VISIBILITY_METERS) {
            for (row, value) in visibility.iter().enumerate() {
                if let Some(v) = value {
                    if !(VISIBILITY_MIN_METERS..=VISIBILITY_MAX_METERS).contains(v) {
                        report.range_violations.push(RangeViolation {
                            row,
                            raw: raw_at(row),
                            violation_type: ViolationType::VisibilityOutOfRange,
                            details: format!(
                                "visibility {} m is outside [{}, {}]",
                                v, VISIBILITY_MIN_METERS, VISIBILITY_MAX_METERS
                            ),
                        });
                    }
                }
            }
        }

        if let Some(altimeter) = frame.floats(COL_ALTIMETER_HPA) {
            for (row, value) in altimeter.iter().enumerate() {
                if let Some(v) = value {
                    if *v < ALTIMETER_HPA_MIN {
                        report.range_violations.push(RangeViolation {
                            row,
                            raw: raw_at(row),
                            violation_type: ViolationType::ImplausibleAltimeter,
                            details: format!(
                                "altimeter {:.1} hPa is below {}",
                                v, ALTIMETER_HPA_MIN
                            ),
                        });
                    }
                }
            }
        }

        if let Some(rules) = frame.integers(COL_FLIGHT_RULES) {
            for (row, value) in rules.iter().enumerate() {
                if let Some(v) = value {
                    if !(1..=4).contains(v) {
                        report.range_violations.push(RangeViolation {
                            row,
                            raw: raw_at(row),
                            violation_type: ViolationType::UnknownFlightRules,
                            details: format!("flight rules severity {} is not 1-4", v),
                        });
                    }
                }
            }
        }
    }

    /// Generate a summary report
    pub fn generate_summary(&self, report: &QualityReport) -> String {
        let mut summary = String::new();
        let percent = |n: usize| {
            if report.total_rows == 0 {
                0.0
            } else {
                100.0 * n as f64 / report.total_rows as f64
            }
        };

        summary.push_str("=== Data Quality Report ===\n");
        summary.push_str(&format!(
            "Rows: {}, Columns: {}\n",
            report.total_rows, report.total_columns
        ));
        summary.push_str(&format!(
            "Complete Rows: {} ({:.1}%)\n",
            report.complete_rows,
            percent(report.complete_rows)
        ));
        summary.push_str(&format!("Stations: {}\n", report.station_rows.len()));

        if !report.missing_by_column.is_empty() {
            summary.push_str("\nMissing Values:\n");
            for (column, missing) in &report.missing_by_column {
                summary.push_str(&format!(
                    "  {}: {} ({:.1}%)\n",
                    column,
                    missing,
                    percent(*missing)
                ));
            }
        }

        summary.push_str(&format!(
            "\nRange Violations: {}\n",
            report.range_violations.len()
        ));

        if !report.range_violations.is_empty() {
            summary.push_str(&format!(
                "\nTop {} Violations:\n",
                self.max_listed_violations.min(report.range_violations.len())
            ));
            for (i, violation) in report
                .range_violations
                .iter()
                .take(self.max_listed_violations)
                .enumerate()
            {
                summary.push_str(&format!(
                    "  {}. Row {} ({}): {}\n",
                    i + 1,
                    violation.row,
                    violation.raw.as_deref().unwrap_or("?"),
                    violation.details
                ));
            }
        }

        summary
    }
}

impl Default for QualityChecker {
    fn default() -> Self {
        Self::new()
    }
}
