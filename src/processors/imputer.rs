use std::collections::HashMap;

use rayon::prelude::*;
use tracing::{debug, warn};

use crate::error::Result;
use crate::models::{ColumnValues, FeatureFrame};
use crate::utils::constants::{
    COL_FLIGHT_RULES, COL_LAYER_1_ALTITUDE_CATEGORY, COL_LAYER_1_TYPE, COL_SEA_LEVEL_PRESSURE,
    COL_STATION, COL_VISIBILITY_METERS, COL_WIND_GUST, COL_WIND_SPEED, FINAL_REQUIRED_COLUMNS,
};

/// Layer-1 cloud signature: (type code, altitude category code).
pub type CloudKey = (i64, i64);

/// Counts of values filled by each imputation step.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ImputationSummary {
    pub calm_wind: usize,
    pub sea_level_pressure_by_station: usize,
    pub sea_level_pressure_global: usize,
    pub visibility_from_clouds: usize,
    pub visibility_from_flight_rules: usize,
}

/// Median of the values; the mean of the middle pair for even counts.
pub fn median(values: &mut [f64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }

    values.sort_by(f64::total_cmp);
    let mid = values.len() / 2;
    if values.len() % 2 == 0 {
        Some((values[mid - 1] + values[mid]) / 2.0)
    } else {
        Some(values[mid])
    }
}

/// Multi-stage missing value imputation.
///
/// Every lookup is computed from the whole table before any value is
/// substituted, so results do not depend on row order.
pub struct Imputer;

impl Imputer {
    pub fn new() -> Self {
        Self
    }

    /// Run the fill steps in order; each only sees gaps left by the previous.
    pub fn impute(&self, frame: &mut FeatureFrame) -> Result<ImputationSummary> {
        let mut summary = ImputationSummary {
            calm_wind: self.fill_calm_wind(frame),
            ..ImputationSummary::default()
        };

        let (by_station, global) = self.impute_sea_level_pressure(frame);
        summary.sea_level_pressure_by_station = by_station;
        summary.sea_level_pressure_global = global;

        let cloud_map = self.build_cloud_visibility_map(frame);
        debug!("Cloud visibility lookup has {} keys", cloud_map.len());
        summary.visibility_from_clouds = self.impute_visibility_from_clouds(frame, &cloud_map);

        let rules_map = self.build_flight_rules_visibility_map(frame);
        debug!("Flight rules visibility lookup has {} keys", rules_map.len());
        summary.visibility_from_flight_rules =
            self.impute_visibility_from_flight_rules(frame, &rules_map);

        Ok(summary)
    }

    /// Missing gust and speed mean no wind was reported.
    pub fn fill_calm_wind(&self, frame: &mut FeatureFrame) -> usize {
        let mut filled = 0;
        for name in [COL_WIND_GUST, COL_WIND_SPEED] {
            if let Some(values) = frame.floats_mut(name) {
                for value in values.iter_mut().filter(|v| v.is_none()) {
                    *value = Some(0.0);
                    filled += 1;
                }
            }
        }
        filled
    }

    /// Fill sea-level pressure with the station mean, then the global median.
    ///
    /// Returns (filled from station means, filled from the global median).
    pub fn impute_sea_level_pressure(&self, frame: &mut FeatureFrame) -> (usize, usize) {
        let stations: Vec<Option<String>> = match frame.texts(COL_STATION) {
            Some(stations) => stations.to_vec(),
            None => vec![None; frame.len()],
        };
        let Some(pressure) = frame.floats_mut(COL_SEA_LEVEL_PRESSURE) else {
            return (0, 0);
        };

        let mut totals: HashMap<&str, (f64, usize)> = HashMap::new();
        for (station, value) in stations.iter().zip(pressure.iter()) {
            if let (Some(station), Some(value)) = (station, value) {
                let entry = totals.entry(station.as_str()).or_insert((0.0, 0));
                entry.0 += value;
                entry.1 += 1;
            }
        }

        let mut by_station = 0;
        for (station, value) in stations.iter().zip(pressure.iter_mut()) {
            if value.is_some() {
                continue;
            }
            let mean = station
                .as_deref()
                .and_then(|s| totals.get(s))
                .map(|(sum, count)| sum / *count as f64);
            if mean.is_some() {
                *value = mean;
                by_station += 1;
            }
        }

        let mut known: Vec<f64> = pressure.iter().flatten().copied().collect();
        let global = match median(&mut known) {
            Some(global) => global,
            None => {
                warn!("No sea level pressure reported anywhere in the batch");
                return (by_station, 0);
            }
        };

        let mut by_global = 0;
        for value in pressure.iter_mut().filter(|v| v.is_none()) {
            *value = Some(global);
            by_global += 1;
        }

        (by_station, by_global)
    }

    /// Layer-1 signature of every row; absent layer columns read as (0, 0).
    fn cloud_keys(&self, frame: &FeatureFrame) -> Vec<CloudKey> {
        let types = frame.integers(COL_LAYER_1_TYPE);
        let categories = frame.integers(COL_LAYER_1_ALTITUDE_CATEGORY);
        (0..frame.len())
            .map(|row| {
                let at = |column: Option<&[Option<i64>]>| {
                    column.and_then(|c| c[row]).unwrap_or(0)
                };
                (at(types), at(categories))
            })
            .collect()
    }

    /// Median visibility per layer-1 cloud signature among rows that report one.
    pub fn build_cloud_visibility_map(&self, frame: &FeatureFrame) -> HashMap<CloudKey, f64> {
        let Some(visibility) = frame.floats(COL_VISIBILITY_METERS) else {
            return HashMap::new();
        };

        let mut groups: HashMap<CloudKey, Vec<f64>> = HashMap::new();
        for (key, value) in self.cloud_keys(frame).into_iter().zip(visibility) {
            if let Some(value) = value {
                groups.entry(key).or_default().push(*value);
            }
        }

        groups
            .into_iter()
            .filter_map(|(key, mut values)| median(&mut values).map(|m| (key, m)))
            .collect()
    }

    /// Fill visibility from the cloud lookup.
    ///
    /// Rows with no layer-1 signature at all are skipped here and left for the
    /// flight-rule fallback.
    pub fn impute_visibility_from_clouds(
        &self,
        frame: &mut FeatureFrame,
        lookup: &HashMap<CloudKey, f64>,
    ) -> usize {
        let keys = self.cloud_keys(frame);
        let Some(visibility) = frame.floats_mut(COL_VISIBILITY_METERS) else {
            return 0;
        };

        visibility
            .par_iter_mut()
            .zip(keys.par_iter())
            .filter(|(value, key)| value.is_none() && **key != (0, 0))
            .map(|(value, key)| match lookup.get(key) {
                Some(median) => {
                    *value = Some(*median);
                    1
                }
                None => 0,
            })
            .sum()
    }

    /// Median visibility per flight-rule severity.
    pub fn build_flight_rules_visibility_map(&self, frame: &FeatureFrame) -> HashMap<i64, f64> {
        let (Some(rules), Some(visibility)) = (
            frame.integers(COL_FLIGHT_RULES),
            frame.floats(COL_VISIBILITY_METERS),
        ) else {
            return HashMap::new();
        };

        let mut groups: HashMap<i64, Vec<f64>> = HashMap::new();
        for (rule, value) in rules.iter().zip(visibility) {
            if let (Some(rule), Some(value)) = (rule, value) {
                groups.entry(*rule).or_default().push(*value);
            }
        }

        groups
            .into_iter()
            .filter_map(|(rule, mut values)| median(&mut values).map(|m| (rule, m)))
            .collect()
    }

    /// Fill whatever visibility is still missing from the flight-rule lookup.
    pub fn impute_visibility_from_flight_rules(
        &self,
        frame: &mut FeatureFrame,
        lookup: &HashMap<i64, f64>,
    ) -> usize {
        let rules: Vec<Option<i64>> = match frame.integers(COL_FLIGHT_RULES) {
            Some(rules) => rules.to_vec(),
            None => return 0,
        };
        let Some(visibility) = frame.floats_mut(COL_VISIBILITY_METERS) else {
            return 0;
        };

        visibility
            .par_iter_mut()
            .zip(rules.par_iter())
            .filter(|(value, _)| value.is_none())
            .map(|(value, rule)| match rule.and_then(|r| lookup.get(&r)) {
                Some(median) => {
                    *value = Some(*median);
                    1
                }
                None => 0,
            })
            .sum()
    }

    /// Drop rows that are still missing a field the model cannot do without.
    pub fn drop_unrecoverable(&self, frame: &mut FeatureFrame) -> Result<usize> {
        let columns: Vec<&ColumnValues> = FINAL_REQUIRED_COLUMNS
            .iter()
            .filter_map(|name| frame.values(name))
            .collect();

        let keep: Vec<bool> = (0..frame.len())
            .map(|row| columns.iter().all(|c| !c.is_null(row)))
            .collect();

        frame.retain_rows(&keep)
    }
}

impl Default for Imputer {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::utils::constants::COL_TIME;
    use chrono::{TimeZone, Utc};

    fn floats(values: &[Option<f64>]) -> ColumnValues {
        ColumnValues::Float(values.to_vec())
    }

    fn integers(values: &[i64]) -> ColumnValues {
        ColumnValues::Integer(values.iter().map(|v| Some(*v)).collect())
    }

    #[test]
    fn test_median() {
        assert_eq!(median(&mut []), None);
        assert_eq!(median(&mut [3.0, 1.0, 2.0]), Some(2.0));
        assert_eq!(median(&mut [4.0, 1.0, 2.0, 3.0]), Some(2.5));
    }

    #[test]
    fn test_fill_calm_wind() {
        let mut frame = FeatureFrame::new();
        frame
            .push_column(COL_WIND_SPEED, floats(&[None, Some(5.0)]))
            .unwrap();
        frame
            .push_column(COL_WIND_GUST, floats(&[None, None]))
            .unwrap();

        assert_eq!(Imputer::new().fill_calm_wind(&mut frame), 3);
        assert_eq!(frame.floats(COL_WIND_SPEED).unwrap(), &[Some(0.0), Some(5.0)]);
        assert_eq!(frame.floats(COL_WIND_GUST).unwrap(), &[Some(0.0), Some(0.0)]);
    }

    #[test]
    fn test_sea_level_pressure_station_then_global() {
        let mut frame = FeatureFrame::new();
        frame
            .push_column(
                COL_STATION,
                ColumnValues::Text(
                    ["KJFK", "KJFK", "KJFK", "KBOS", "KBOS", "KORD"]
                        .iter()
                        .map(|s| Some(s.to_string()))
                        .collect(),
                ),
            )
            .unwrap();
        frame
            .push_column(
                COL_SEA_LEVEL_PRESSURE,
                floats(&[
                    Some(1010.0),
                    Some(1020.0),
                    None,
                    Some(1000.0),
                    None,
                    None,
                ]),
            )
            .unwrap();

        let (by_station, global) = Imputer::new().impute_sea_level_pressure(&mut frame);

        assert_eq!((by_station, global), (2, 1));
        let values = frame.floats(COL_SEA_LEVEL_PRESSURE).unwrap();
        assert_eq!(values[2], Some(1015.0));
        assert_eq!(values[4], Some(1000.0));
        // median of 1010, 1020, 1015, 1000, 1000
        assert_eq!(values[5], Some(1010.0));
    }

    #[test]
    fn test_cloud_stage_precedes_flight_rules_stage() {
        let mut frame = FeatureFrame::new();
        frame
            .push_column(COL_LAYER_1_TYPE, integers(&[4, 4, 2, 0, 4]))
            .unwrap();
        frame
            .push_column(COL_LAYER_1_ALTITUDE_CATEGORY, integers(&[1, 1, 1, 0, 1]))
            .unwrap();
        frame
            .push_column(COL_FLIGHT_RULES, integers(&[2, 2, 2, 2, 2]))
            .unwrap();
        frame
            .push_column(
                COL_VISIBILITY_METERS,
                floats(&[Some(3000.0), None, None, Some(9000.0), Some(5000.0)]),
            )
            .unwrap();

        let summary = Imputer::new().impute(&mut frame).unwrap();
        let visibility = frame.floats(COL_VISIBILITY_METERS).unwrap();

        // (4, 1) is in the cloud lookup: median of 3000 and 5000
        assert_eq!(visibility[1], Some(4000.0));
        // (2, 1) misses the cloud lookup, falls back to flight rule 2
        // whose median after the cloud stage is over 3000, 4000, 9000, 5000
        assert_eq!(visibility[2], Some(4500.0));
        assert_eq!(summary.visibility_from_clouds, 1);
        assert_eq!(summary.visibility_from_flight_rules, 1);
    }

    #[test]
    fn test_rows_without_cloud_signature_skip_cloud_stage() {
        let mut frame = FeatureFrame::new();
        frame
            .push_column(COL_LAYER_1_TYPE, integers(&[0, 0]))
            .unwrap();
        frame
            .push_column(COL_LAYER_1_ALTITUDE_CATEGORY, integers(&[0, 0]))
            .unwrap();
        frame
            .push_column(COL_VISIBILITY_METERS, floats(&[Some(700.0), None]))
            .unwrap();

        let imputer = Imputer::new();
        let lookup = imputer.build_cloud_visibility_map(&frame);
        assert_eq!(lookup.get(&(0, 0)), Some(&700.0));
        assert_eq!(imputer.impute_visibility_from_clouds(&mut frame, &lookup), 0);
        assert_eq!(frame.floats(COL_VISIBILITY_METERS).unwrap()[1], None);
    }

    #[test]
    fn test_flight_rules_stage_leaves_unknown_rules_null() {
        let mut frame = FeatureFrame::new();
        frame
            .push_column(
                COL_FLIGHT_RULES,
                ColumnValues::Integer(vec![Some(1), None, Some(3)]),
            )
            .unwrap();
        frame
            .push_column(COL_VISIBILITY_METERS, floats(&[Some(9999.0), None, None]))
            .unwrap();

        let imputer = Imputer::new();
        let lookup = imputer.build_flight_rules_visibility_map(&frame);
        assert_eq!(imputer.impute_visibility_from_flight_rules(&mut frame, &lookup), 0);
        assert_eq!(
            frame.floats(COL_VISIBILITY_METERS).unwrap(),
            &[Some(9999.0), None, None]
        );
    }

    #[test]
    fn test_drop_unrecoverable() {
        let time = Utc.with_ymd_and_hms(2023, 1, 1, 0, 0, 0).unwrap();
        let mut frame = FeatureFrame::new();
        frame
            .push_column(COL_TIME, ColumnValues::Timestamp(vec![Some(time), None, Some(time)]))
            .unwrap();
        frame
            .push_column("density_altitude", floats(&[Some(100.0), Some(100.0), Some(1.0)]))
            .unwrap();
        frame
            .push_column("pressure_altitude", floats(&[Some(50.0), Some(50.0), Some(2.0)]))
            .unwrap();
        frame
            .push_column("altimeter_hpa", floats(&[Some(1013.0), Some(1013.0), None]))
            .unwrap();

        assert_eq!(Imputer::new().drop_unrecoverable(&mut frame).unwrap(), 2);
        assert_eq!(frame.len(), 1);
    }
}
