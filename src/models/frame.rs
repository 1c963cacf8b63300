use chrono::{DateTime, Utc};

use crate::error::{ProcessingError, Result};
use crate::models::{CloudLayer, MetarObservation};

/// Values of one column. Scalar variants are nullable; list variants hold the
/// nested fields of the input record until an encoder flattens them.
#[derive(Debug, Clone, PartialEq)]
pub enum ColumnValues {
    Text(Vec<Option<String>>),
    Timestamp(Vec<Option<DateTime<Utc>>>),
    Float(Vec<Option<f64>>),
    Integer(Vec<Option<i64>>),
    FloatList(Vec<Vec<Option<f64>>>),
    TextList(Vec<Vec<String>>),
    Clouds(Vec<Vec<CloudLayer>>),
}

impl ColumnValues {
    pub fn len(&self) -> usize {
        match self {
            ColumnValues::Text(v) => v.len(),
            ColumnValues::Timestamp(v) => v.len(),
            ColumnValues::Float(v) => v.len(),
            ColumnValues::Integer(v) => v.len(),
            ColumnValues::FloatList(v) => v.len(),
            ColumnValues::TextList(v) => v.len(),
            ColumnValues::Clouds(v) => v.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn is_null(&self, row: usize) -> bool {
        match self {
            ColumnValues::Text(v) => v[row].is_none(),
            ColumnValues::Timestamp(v) => v[row].is_none(),
            ColumnValues::Float(v) => v[row].is_none(),
            ColumnValues::Integer(v) => v[row].is_none(),
            ColumnValues::FloatList(_) | ColumnValues::TextList(_) | ColumnValues::Clouds(_) => {
                false
            }
        }
    }

    pub fn null_count(&self) -> usize {
        (0..self.len()).filter(|&row| self.is_null(row)).count()
    }

    /// True for columns that cannot be written to a flat table.
    pub fn is_nested(&self) -> bool {
        matches!(
            self,
            ColumnValues::FloatList(_) | ColumnValues::TextList(_) | ColumnValues::Clouds(_)
        )
    }

    pub fn kind(&self) -> &'static str {
        match self {
            ColumnValues::Text(_) => "text",
            ColumnValues::Timestamp(_) => "timestamp",
            ColumnValues::Float(_) => "float",
            ColumnValues::Integer(_) => "integer",
            ColumnValues::FloatList(_) => "float list",
            ColumnValues::TextList(_) => "text list",
            ColumnValues::Clouds(_) => "cloud layers",
        }
    }

    /// Append the rows of `other`, which must hold the same kind of values.
    pub fn append(&mut self, other: ColumnValues) -> Result<()> {
        match (self, other) {
            (ColumnValues::Text(a), ColumnValues::Text(b)) => a.extend(b),
            (ColumnValues::Timestamp(a), ColumnValues::Timestamp(b)) => a.extend(b),
            (ColumnValues::Float(a), ColumnValues::Float(b)) => a.extend(b),
            (ColumnValues::Integer(a), ColumnValues::Integer(b)) => a.extend(b),
            (ColumnValues::FloatList(a), ColumnValues::FloatList(b)) => a.extend(b),
            (ColumnValues::TextList(a), ColumnValues::TextList(b)) => a.extend(b),
            (ColumnValues::Clouds(a), ColumnValues::Clouds(b)) => a.extend(b),
            (a, b) => {
                return Err(ProcessingError::InvalidFormat(format!(
                    "Cannot append {} values to a {} column",
                    b.kind(),
                    a.kind()
                )))
            }
        }
        Ok(())
    }

    fn retain(&mut self, keep: &[bool]) {
        fn filter<T>(values: &mut Vec<T>, keep: &[bool]) {
            let mut mask = keep.iter();
            values.retain(|_| *mask.next().unwrap_or(&false));
        }

        match self {
            ColumnValues::Text(v) => filter(v, keep),
            ColumnValues::Timestamp(v) => filter(v, keep),
            ColumnValues::Float(v) => filter(v, keep),
            ColumnValues::Integer(v) => filter(v, keep),
            ColumnValues::FloatList(v) => filter(v, keep),
            ColumnValues::TextList(v) => filter(v, keep),
            ColumnValues::Clouds(v) => filter(v, keep),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Column {
    pub name: String,
    pub values: ColumnValues,
}

/// In-memory columnar table of observations.
///
/// All columns have the same length; column order is significant and is the
/// order of the written output.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FeatureFrame {
    columns: Vec<Column>,
    rows: usize,
}

impl FeatureFrame {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build the working table from decoded observations, one row each.
    pub fn from_observations(observations: &[MetarObservation]) -> Self {
        fn text<F>(obs: &[MetarObservation], f: F) -> ColumnValues
        where
            F: Fn(&MetarObservation) -> Option<String>,
        {
            ColumnValues::Text(obs.iter().map(f).collect())
        }

        fn float<F>(obs: &[MetarObservation], f: F) -> ColumnValues
        where
            F: Fn(&MetarObservation) -> Option<f64>,
        {
            ColumnValues::Float(obs.iter().map(f).collect())
        }

        let obs = observations;
        let columns = vec![
            ("raw", text(obs, |o| Some(o.raw.clone()))),
            ("sanitized", text(obs, |o| o.sanitized.clone())),
            ("station", text(obs, |o| Some(o.station.clone()))),
            ("time", ColumnValues::Timestamp(obs.iter().map(|o| o.time).collect())),
            ("temperature", float(obs, |o| o.temperature)),
            ("dewpoint", float(obs, |o| o.dewpoint)),
            ("altimeter", float(obs, |o| o.altimeter)),
            ("visibility", float(obs, |o| o.visibility)),
            ("visibility_normalized", float(obs, |o| o.visibility_normalized)),
            ("visibility_numerator", float(obs, |o| o.visibility_numerator)),
            ("visibility_denominator", float(obs, |o| o.visibility_denominator)),
            ("wind_speed", float(obs, |o| o.wind_speed)),
            ("wind_gust", float(obs, |o| o.wind_gust)),
            ("wind_direction", float(obs, |o| o.wind_direction)),
            (
                "wind_variable_direction",
                ColumnValues::FloatList(
                    obs.iter().map(|o| o.wind_variable_direction.clone()).collect(),
                ),
            ),
            (
                "wx_codes",
                ColumnValues::TextList(obs.iter().map(|o| o.wx_codes.clone()).collect()),
            ),
            (
                "clouds",
                ColumnValues::Clouds(obs.iter().map(|o| o.clouds.clone()).collect()),
            ),
            ("runway_visibility", text(obs, |o| o.runway_visibility.clone())),
            ("other", text(obs, |o| o.other.clone())),
            ("flight_rules", text(obs, |o| o.flight_rules.clone())),
            ("remarks", text(obs, |o| o.remarks.clone())),
            ("remarks_codes", text(obs, |o| o.remarks_codes.clone())),
            ("sea_level_pressure", float(obs, |o| o.sea_level_pressure)),
            ("pressure_tendency", text(obs, |o| o.pressure_tendency.clone())),
            ("pressure_change", float(obs, |o| o.pressure_change)),
            ("temperature_decimal", float(obs, |o| o.temperature_decimal)),
            ("dewpoint_decimal", float(obs, |o| o.dewpoint_decimal)),
            ("maximum_temperature_6", float(obs, |o| o.maximum_temperature_6)),
            ("minimum_temperature_6", float(obs, |o| o.minimum_temperature_6)),
            ("maximum_temperature_24", float(obs, |o| o.maximum_temperature_24)),
            ("minimum_temperature_24", float(obs, |o| o.minimum_temperature_24)),
            ("precip_hourly", float(obs, |o| o.precip_hourly)),
            ("precip_24_hours", float(obs, |o| o.precip_24_hours)),
            ("precip_36_hours", float(obs, |o| o.precip_36_hours)),
            ("snow_depth", float(obs, |o| o.snow_depth)),
            ("density_altitude", float(obs, |o| o.density_altitude)),
            ("pressure_altitude", float(obs, |o| o.pressure_altitude)),
        ];

        Self {
            columns: columns
                .into_iter()
                .map(|(name, values)| Column {
                    name: name.to_string(),
                    values,
                })
                .collect(),
            rows: observations.len(),
        }
    }

    /// Number of rows
    pub fn len(&self) -> usize {
        self.rows
    }

    pub fn is_empty(&self) -> bool {
        self.rows == 0
    }

    pub fn column_count(&self) -> usize {
        self.columns.len()
    }

    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    pub fn column_names(&self) -> Vec<&str> {
        self.columns.iter().map(|c| c.name.as_str()).collect()
    }

    pub fn has_column(&self, name: &str) -> bool {
        self.position(name).is_some()
    }

    pub fn column(&self, name: &str) -> Option<&Column> {
        self.columns.iter().find(|c| c.name == name)
    }

    pub fn values(&self, name: &str) -> Option<&ColumnValues> {
        self.column(name).map(|c| &c.values)
    }

    fn position(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c.name == name)
    }

    /// Append a column, or replace an existing column of the same name in place.
    pub fn push_column(&mut self, name: &str, values: ColumnValues) -> Result<()> {
        if self.columns.is_empty() {
            self.rows = values.len();
        } else if values.len() != self.rows {
            return Err(ProcessingError::ColumnLength {
                column: name.to_string(),
                expected: self.rows,
                actual: values.len(),
            });
        }

        match self.position(name) {
            Some(idx) => self.columns[idx].values = values,
            None => self.columns.push(Column {
                name: name.to_string(),
                values,
            }),
        }
        Ok(())
    }

    /// Remove a column and hand back its values.
    pub fn take_column(&mut self, name: &str) -> Option<ColumnValues> {
        let idx = self.position(name)?;
        Some(self.columns.remove(idx).values)
    }

    pub fn drop_column(&mut self, name: &str) -> bool {
        self.take_column(name).is_some()
    }

    /// Drop every listed column that exists; returns the names actually dropped.
    pub fn drop_columns(&mut self, names: &[&str]) -> Vec<String> {
        names
            .iter()
            .filter(|name| self.drop_column(name))
            .map(|name| name.to_string())
            .collect()
    }

    pub fn drop_prefixed(&mut self, prefix: &str) -> Vec<String> {
        let mut dropped = Vec::new();
        self.columns.retain(|c| {
            if c.name.starts_with(prefix) {
                dropped.push(c.name.clone());
                false
            } else {
                true
            }
        });
        dropped
    }

    pub fn texts(&self, name: &str) -> Option<&[Option<String>]> {
        match self.values(name)? {
            ColumnValues::Text(v) => Some(v),
            _ => None,
        }
    }

    pub fn timestamps(&self, name: &str) -> Option<&[Option<DateTime<Utc>>]> {
        match self.values(name)? {
            ColumnValues::Timestamp(v) => Some(v),
            _ => None,
        }
    }

    pub fn floats(&self, name: &str) -> Option<&[Option<f64>]> {
        match self.values(name)? {
            ColumnValues::Float(v) => Some(v),
            _ => None,
        }
    }

    pub fn floats_mut(&mut self, name: &str) -> Option<&mut Vec<Option<f64>>> {
        let idx = self.position(name)?;
        match &mut self.columns[idx].values {
            ColumnValues::Float(v) => Some(v),
            _ => None,
        }
    }

    pub fn integers(&self, name: &str) -> Option<&[Option<i64>]> {
        match self.values(name)? {
            ColumnValues::Integer(v) => Some(v),
            _ => None,
        }
    }

    pub fn null_count(&self, name: &str) -> Option<usize> {
        self.values(name).map(ColumnValues::null_count)
    }

    /// Keep the rows whose mask entry is true; returns how many were removed.
    pub fn retain_rows(&mut self, keep: &[bool]) -> Result<usize> {
        if keep.len() != self.rows {
            return Err(ProcessingError::ColumnLength {
                column: "row mask".to_string(),
                expected: self.rows,
                actual: keep.len(),
            });
        }

        for column in &mut self.columns {
            column.values.retain(keep);
        }

        let kept = keep.iter().filter(|k| **k).count();
        let removed = self.rows - kept;
        self.rows = kept;
        Ok(removed)
    }

    /// Rearrange columns into `order`, which must name every column exactly once.
    pub fn reorder_columns(&mut self, order: &[String]) -> Result<()> {
        if order.len() != self.columns.len() {
            return Err(ProcessingError::InvalidFormat(format!(
                "Column order names {} columns, table has {}",
                order.len(),
                self.columns.len()
            )));
        }

        let mut remaining = std::mem::take(&mut self.columns);
        for name in order {
            let idx = remaining
                .iter()
                .position(|c| &c.name == name)
                .ok_or_else(|| ProcessingError::MissingColumn(name.clone()))?;
            self.columns.push(remaining.remove(idx));
        }
        Ok(())
    }
}
