use chrono::{DateTime, NaiveDateTime, TimeZone, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

use crate::models::CloudLayer;
use crate::utils::literal::parse_literal;

/// One decoded METAR observation as handed over by the upstream decoder.
///
/// Field names follow the decoder output; the flattened `a.b.value` spellings
/// produced by tabular exports are accepted as aliases. Every field except
/// `raw` and `station` is optional and decodes leniently: an unparsable value
/// becomes `None` (or an empty list) instead of an error.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MetarObservation {
    pub raw: String,

    #[serde(default, deserialize_with = "lenient_text")]
    pub sanitized: Option<String>,

    pub station: String,

    #[serde(default, alias = "time.dt", deserialize_with = "lenient_timestamp")]
    pub time: Option<DateTime<Utc>>,

    // Temperatures (°C)
    #[serde(default, alias = "temperature.value", deserialize_with = "lenient_number")]
    pub temperature: Option<f64>,

    #[serde(default, alias = "dewpoint.value", deserialize_with = "lenient_number")]
    pub dewpoint: Option<f64>,

    // Ambiguous units, resolved by the unit normalizer
    #[serde(default, alias = "altimeter.value", deserialize_with = "lenient_number")]
    pub altimeter: Option<f64>,

    #[serde(default, alias = "visibility.value", deserialize_with = "lenient_number")]
    pub visibility: Option<f64>,

    #[serde(default, alias = "visibility.normalized", deserialize_with = "lenient_number")]
    pub visibility_normalized: Option<f64>,

    #[serde(default, alias = "visibility.numerator", deserialize_with = "lenient_number")]
    pub visibility_numerator: Option<f64>,

    #[serde(default, alias = "visibility.denominator", deserialize_with = "lenient_number")]
    pub visibility_denominator: Option<f64>,

    // Wind
    #[serde(default, alias = "wind_speed.value", deserialize_with = "lenient_number")]
    pub wind_speed: Option<f64>,

    #[serde(default, alias = "wind_gust.value", deserialize_with = "lenient_number")]
    pub wind_gust: Option<f64>,

    #[serde(default, alias = "wind_direction.value", deserialize_with = "lenient_number")]
    pub wind_direction: Option<f64>,

    /// One entry per reported bound; `None` where the bound has no numeric value.
    #[serde(default, deserialize_with = "lenient_bounds")]
    pub wind_variable_direction: Vec<Option<f64>>,

    // Weather phenomena and sky condition
    #[serde(default, deserialize_with = "lenient_phenomena")]
    pub wx_codes: Vec<String>,

    #[serde(default, deserialize_with = "lenient_clouds")]
    pub clouds: Vec<CloudLayer>,

    #[serde(default, deserialize_with = "lenient_text")]
    pub runway_visibility: Option<String>,

    #[serde(default, deserialize_with = "lenient_text")]
    pub other: Option<String>,

    #[serde(default, deserialize_with = "lenient_text")]
    pub flight_rules: Option<String>,

    // Remarks
    #[serde(default, deserialize_with = "lenient_text")]
    pub remarks: Option<String>,

    #[serde(default, alias = "remarks_info.codes", deserialize_with = "lenient_text")]
    pub remarks_codes: Option<String>,

    #[serde(
        default,
        alias = "remarks_info.sea_level_pressure.value",
        alias = "remarks_info.sea_level_pressure",
        deserialize_with = "lenient_number"
    )]
    pub sea_level_pressure: Option<f64>,

    #[serde(
        default,
        alias = "remarks_info.pressure_tendency.tendency",
        deserialize_with = "lenient_text"
    )]
    pub pressure_tendency: Option<String>,

    #[serde(
        default,
        alias = "remarks_info.pressure_tendency.change.value",
        alias = "remarks_info.pressure_tendency.change",
        deserialize_with = "lenient_number"
    )]
    pub pressure_change: Option<f64>,

    #[serde(
        default,
        alias = "remarks_info.temperature_decimal.value",
        deserialize_with = "lenient_number"
    )]
    pub temperature_decimal: Option<f64>,

    #[serde(
        default,
        alias = "remarks_info.dewpoint_decimal.value",
        deserialize_with = "lenient_number"
    )]
    pub dewpoint_decimal: Option<f64>,

    #[serde(
        default,
        alias = "remarks_info.maximum_temperature_6.value",
        deserialize_with = "lenient_number"
    )]
    pub maximum_temperature_6: Option<f64>,

    #[serde(
        default,
        alias = "remarks_info.minimum_temperature_6.value",
        deserialize_with = "lenient_number"
    )]
    pub minimum_temperature_6: Option<f64>,

    #[serde(
        default,
        alias = "remarks_info.maximum_temperature_24.value",
        deserialize_with = "lenient_number"
    )]
    pub maximum_temperature_24: Option<f64>,

    #[serde(
        default,
        alias = "remarks_info.minimum_temperature_24.value",
        deserialize_with = "lenient_number"
    )]
    pub minimum_temperature_24: Option<f64>,

    #[serde(
        default,
        alias = "remarks_info.precip_hourly.value",
        deserialize_with = "lenient_number"
    )]
    pub precip_hourly: Option<f64>,

    #[serde(
        default,
        alias = "remarks_info.precip_24_hours.value",
        deserialize_with = "lenient_number"
    )]
    pub precip_24_hours: Option<f64>,

    #[serde(
        default,
        alias = "remarks_info.precip_36_hours.value",
        deserialize_with = "lenient_number"
    )]
    pub precip_36_hours: Option<f64>,

    #[serde(
        default,
        alias = "remarks_info.snow_depth.value",
        deserialize_with = "lenient_number"
    )]
    pub snow_depth: Option<f64>,

    // Derived altitudes (feet)
    #[serde(default, alias = "density_altitude.value", deserialize_with = "lenient_number")]
    pub density_altitude: Option<f64>,

    #[serde(default, alias = "pressure_altitude.value", deserialize_with = "lenient_number")]
    pub pressure_altitude: Option<f64>,
}

impl MetarObservation {
    pub fn new(raw: &str, station: &str) -> Self {
        Self {
            raw: raw.to_string(),
            station: station.to_string(),
            ..Self::default()
        }
    }

    pub fn has_variable_wind(&self) -> bool {
        !self.wind_variable_direction.is_empty()
    }
}

/// Extract a number from a bare number, numeric string, or `{"value": n}` object.
pub fn number_from_value(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64().filter(|v| v.is_finite()),
        Value::String(s) => {
            let s = s.trim();
            if s.starts_with('{') {
                parse_literal(s).as_ref().and_then(number_from_value)
            } else {
                s.parse::<f64>().ok().filter(|v| v.is_finite())
            }
        }
        Value::Object(map) => map.get("value").and_then(number_from_value),
        _ => None,
    }
}

fn text_from_value(value: &Value) -> Option<String> {
    match value {
        Value::Null => None,
        Value::String(s) if s.trim().is_empty() => None,
        Value::String(s) => Some(s.trim().to_string()),
        Value::Array(items) if items.is_empty() => None,
        Value::Bool(_) | Value::Number(_) | Value::Array(_) | Value::Object(_) => {
            Some(value.to_string())
        }
    }
}

/// Interpret a value as a sequence; strings are parsed as literals.
fn sequence_from_value(value: Value) -> Vec<Value> {
    match value {
        Value::Array(items) => items,
        Value::String(s) => match parse_literal(&s) {
            Some(Value::Array(items)) => items,
            _ => Vec::new(),
        },
        _ => Vec::new(),
    }
}

fn timestamp_from_value(value: &Value) -> Option<DateTime<Utc>> {
    match value {
        Value::String(s) => parse_timestamp(s),
        Value::Object(map) => map.get("dt").and_then(timestamp_from_value),
        _ => None,
    }
}

/// Parse the timestamp spellings seen in decoder exports.
pub fn parse_timestamp(s: &str) -> Option<DateTime<Utc>> {
    let s = s.trim();
    if s.is_empty() {
        return None;
    }

    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.with_timezone(&Utc));
    }

    if let Ok(dt) = DateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S%:z") {
        return Some(dt.with_timezone(&Utc));
    }

    ["%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M:%S", "%Y-%m-%d %H:%M"]
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(s, fmt).ok())
        .map(|naive| Utc.from_utc_datetime(&naive))
}

fn lenient_number<'de, D>(deserializer: D) -> std::result::Result<Option<f64>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    Ok(number_from_value(&value))
}

fn lenient_text<'de, D>(deserializer: D) -> std::result::Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    Ok(text_from_value(&value))
}

fn lenient_timestamp<'de, D>(
    deserializer: D,
) -> std::result::Result<Option<DateTime<Utc>>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    Ok(timestamp_from_value(&value))
}

fn lenient_bounds<'de, D>(deserializer: D) -> std::result::Result<Vec<Option<f64>>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    Ok(sequence_from_value(value)
        .iter()
        .map(number_from_value)
        .collect())
}

fn lenient_phenomena<'de, D>(deserializer: D) -> std::result::Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    Ok(sequence_from_value(value)
        .into_iter()
        .filter_map(|item| match item {
            Value::Object(mut map) => match map.remove("value") {
                Some(Value::String(label)) => Some(label),
                _ => None,
            },
            Value::String(label) if !label.trim().is_empty() => Some(label),
            _ => None,
        })
        .collect())
}

fn lenient_clouds<'de, D>(deserializer: D) -> std::result::Result<Vec<CloudLayer>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    Ok(sequence_from_value(value)
        .into_iter()
        .filter_map(|item| match item {
            Value::Object(map) => Some(CloudLayer {
                cloud_type: map.get("type").and_then(text_from_value),
                altitude: map
                    .get("altitude")
                    .or_else(|| map.get("base"))
                    .and_then(number_from_value),
                modifier: map.get("modifier").and_then(text_from_value),
            }),
            _ => None,
        })
        .collect())
}
