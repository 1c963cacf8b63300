use std::collections::BTreeSet;

use rayon::prelude::*;
use tracing::debug;

use crate::error::Result;
use crate::models::{ColumnValues, FeatureFrame, FlightRules};
use crate::processors::taxonomy;
use crate::utils::constants::{
    COL_FLIGHT_RULES, COL_PRESSURE_TENDENCY, COL_WIND_VARIABLE_CHANGE,
    COL_WIND_VARIABLE_DIRECTION, COL_WX_CODES, PRESSURE_TENDENCY_PREFIX,
};

/// One-hot and ordinal encodings of the categorical report fields.
///
/// Each encoder replaces its source column and is a no-op when the source
/// column is absent.
pub struct CategoricalEncoder;

impl CategoricalEncoder {
    pub fn new() -> Self {
        Self
    }

    /// `wind_variable_direction` → `wind_variable_change` (1 when bounds were reported,
    /// whether or not they carry a numeric value).
    pub fn encode_wind_variability(&self, frame: &mut FeatureFrame) -> Result<bool> {
        let bounds = match frame.take_column(COL_WIND_VARIABLE_DIRECTION) {
            Some(ColumnValues::FloatList(bounds)) => bounds,
            Some(_) | None => return Ok(false),
        };

        let flags = bounds
            .iter()
            .map(|b| Some(i64::from(!b.is_empty())))
            .collect();
        frame.push_column(COL_WIND_VARIABLE_CHANGE, ColumnValues::Integer(flags))?;
        Ok(true)
    }

    /// `wx_codes` → one `wx_code_<category>` indicator per taxonomy category.
    ///
    /// Every category gets a column, so rows without weather are all zeros.
    pub fn encode_weather(&self, frame: &mut FeatureFrame) -> Result<usize> {
        let phenomena = match frame.take_column(COL_WX_CODES) {
            Some(ColumnValues::TextList(phenomena)) => phenomena,
            Some(_) | None => return Ok(0),
        };

        let row_categories: Vec<BTreeSet<&'static str>> = phenomena
            .par_iter()
            .map(|row| taxonomy::map_phenomena(row))
            .collect();

        let mut added = 0;
        for category in taxonomy::categories() {
            let indicators = row_categories
                .iter()
                .map(|set| Some(i64::from(set.contains(category))))
                .collect();
            frame.push_column(&taxonomy::column_name(category), ColumnValues::Integer(indicators))?;
            added += 1;
        }

        debug!("Encoded weather phenomena into {} category columns", added);
        Ok(added)
    }

    /// Column name for a pressure tendency code.
    pub fn tendency_column(code: &str) -> String {
        format!(
            "{}{}",
            PRESSURE_TENDENCY_PREFIX,
            code.replace(' ', "_").replace(',', "").to_lowercase()
        )
    }

    /// `pressure_tendency` → one indicator column per observed code.
    ///
    /// Columns are sorted by name. A null tendency is an all-zero row.
    pub fn encode_pressure_tendency(&self, frame: &mut FeatureFrame) -> Result<usize> {
        let codes = match frame.take_column(COL_PRESSURE_TENDENCY) {
            Some(ColumnValues::Text(codes)) => codes,
            Some(_) | None => return Ok(0),
        };

        let names: Vec<Option<String>> = codes
            .iter()
            .map(|code| code.as_deref().map(Self::tendency_column))
            .collect();
        let distinct: BTreeSet<&str> = names.iter().flatten().map(String::as_str).collect();

        for column in &distinct {
            let indicators = names
                .iter()
                .map(|name| Some(i64::from(name.as_deref() == Some(*column))))
                .collect();
            frame.push_column(column, ColumnValues::Integer(indicators))?;
        }

        debug!("Encoded pressure tendency into {} columns", distinct.len());
        Ok(distinct.len())
    }

    /// Ordinal flight-rule severity; unknown codes become null.
    ///
    /// Already-encoded (integer) columns are left as they are.
    pub fn encode_flight_rules(&self, frame: &mut FeatureFrame) -> Result<bool> {
        let rules = match frame.texts(COL_FLIGHT_RULES) {
            Some(rules) => rules,
            None => return Ok(false),
        };

        let severities = rules
            .iter()
            .map(|rule| {
                rule.as_deref()
                    .and_then(FlightRules::parse)
                    .map(FlightRules::severity)
            })
            .collect();
        frame.push_column(COL_FLIGHT_RULES, ColumnValues::Integer(severities))?;
        Ok(true)
    }
}

impl Default for CategoricalEncoder {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn text(values: &[Option<&str>]) -> ColumnValues {
        ColumnValues::Text(values.iter().map(|v| v.map(str::to_string)).collect())
    }

    #[test]
    fn test_wind_variability() {
        let mut frame = FeatureFrame::new();
        frame
            .push_column(
                COL_WIND_VARIABLE_DIRECTION,
                ColumnValues::FloatList(vec![
                    vec![],
                    vec![Some(180.0), Some(240.0)],
                    vec![None, None],
                ]),
            )
            .unwrap();

        assert!(CategoricalEncoder::new()
            .encode_wind_variability(&mut frame)
            .unwrap());
        assert_eq!(
            frame.integers(COL_WIND_VARIABLE_CHANGE).unwrap(),
            &[Some(0), Some(1), Some(1)]
        );
        assert!(!frame.has_column(COL_WIND_VARIABLE_DIRECTION));
    }

    #[test]
    fn test_weather_columns_cover_every_category() {
        let mut frame = FeatureFrame::new();
        frame
            .push_column(
                COL_WX_CODES,
                ColumnValues::TextList(vec![
                    vec!["Light Rain".to_string(), "Mist".to_string()],
                    vec![],
                    vec!["Unknown Thing".to_string()],
                ]),
            )
            .unwrap();

        let added = CategoricalEncoder::new().encode_weather(&mut frame).unwrap();

        assert_eq!(added, taxonomy::WEATHER_TAXONOMY.len());
        assert_eq!(frame.column_count(), added);
        assert_eq!(
            frame.integers("wx_code_light_rain").unwrap(),
            &[Some(1), Some(0), Some(0)]
        );
        assert_eq!(
            frame.integers("wx_code_light_fog").unwrap(),
            &[Some(1), Some(0), Some(0)]
        );
        assert_eq!(frame.null_count("wx_code_smoke"), Some(0));
    }

    #[test]
    fn test_pressure_tendency_one_hot() {
        let mut frame = FeatureFrame::new();
        frame
            .push_column(
                COL_PRESSURE_TENDENCY,
                text(&[Some("Increasing, then decreasing"), None, Some("Steady")]),
            )
            .unwrap();

        let added = CategoricalEncoder::new()
            .encode_pressure_tendency(&mut frame)
            .unwrap();

        assert_eq!(added, 2);
        assert_eq!(
            frame.column_names(),
            vec![
                "pressure_tendency_increasing_then_decreasing",
                "pressure_tendency_steady"
            ]
        );
        assert_eq!(
            frame.integers("pressure_tendency_steady").unwrap(),
            &[Some(0), Some(0), Some(1)]
        );
        for row in 0..3 {
            let sum: i64 = frame
                .columns()
                .iter()
                .map(|c| match &c.values {
                    ColumnValues::Integer(v) => v[row].unwrap_or(0),
                    _ => 0,
                })
                .sum();
            assert!(sum <= 1);
        }
    }

    #[test]
    fn test_flight_rules_ordinal() {
        let mut frame = FeatureFrame::new();
        frame
            .push_column(
                COL_FLIGHT_RULES,
                text(&[Some("VFR"), Some("MVFR"), Some("IFR"), Some("LIFR"), Some("SVFR"), None]),
            )
            .unwrap();

        let encoder = CategoricalEncoder::new();
        assert!(encoder.encode_flight_rules(&mut frame).unwrap());
        assert_eq!(
            frame.integers(COL_FLIGHT_RULES).unwrap(),
            &[Some(1), Some(2), Some(3), Some(4), None, None]
        );

        // Second pass leaves the encoded column alone
        assert!(!encoder.encode_flight_rules(&mut frame).unwrap());
    }
}
