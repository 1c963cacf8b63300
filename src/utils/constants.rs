/// Identity column names
pub const COL_RAW: &str = "raw";
pub const COL_TIME: &str = "time";
pub const COL_STATION: &str = "station";

/// Source column names
pub const COL_SANITIZED: &str = "sanitized";
pub const COL_TEMPERATURE: &str = "temperature";
pub const COL_DEWPOINT: &str = "dewpoint";
pub const COL_ALTIMETER: &str = "altimeter";
pub const COL_VISIBILITY: &str = "visibility";
pub const COL_WIND_SPEED: &str = "wind_speed";
pub const COL_WIND_GUST: &str = "wind_gust";
pub const COL_WIND_DIRECTION: &str = "wind_direction";
pub const COL_WIND_VARIABLE_DIRECTION: &str = "wind_variable_direction";
pub const COL_WX_CODES: &str = "wx_codes";
pub const COL_CLOUDS: &str = "clouds";
pub const COL_PRESSURE_TENDENCY: &str = "pressure_tendency";
pub const COL_PRESSURE_CHANGE: &str = "pressure_change";
pub const COL_FLIGHT_RULES: &str = "flight_rules";
pub const COL_SEA_LEVEL_PRESSURE: &str = "sea_level_pressure";
pub const COL_DENSITY_ALTITUDE: &str = "density_altitude";
pub const COL_PRESSURE_ALTITUDE: &str = "pressure_altitude";
pub const COL_REMARKS: &str = "remarks";
pub const COL_REMARKS_CODES: &str = "remarks_codes";

/// Derived column names
pub const COL_WIND_VARIABLE_CHANGE: &str = "wind_variable_change";
pub const COL_ALTIMETER_HPA: &str = "altimeter_hpa";
pub const COL_VISIBILITY_METERS: &str = "visibility_meters";
pub const COL_LAYER_1_TYPE: &str = "clouds_layer_1_type";
pub const COL_LAYER_1_ALTITUDE_CATEGORY: &str = "clouds_layer_1_altitude_category";

/// Derived column prefixes
pub const WX_CODE_PREFIX: &str = "wx_code_";
pub const PRESSURE_TENDENCY_PREFIX: &str = "pressure_tendency_";
pub const CLOUD_LAYER_PREFIX: &str = "clouds_layer_";
pub const PRECIP_PREFIX: &str = "precip_";

/// Columns that must exist in any table handed to the pipeline
pub const REQUIRED_COLUMNS: [&str; 7] = [
    COL_RAW,
    COL_STATION,
    COL_TIME,
    COL_TEMPERATURE,
    COL_FLIGHT_RULES,
    COL_DENSITY_ALTITUDE,
    COL_PRESSURE_ALTITUDE,
];

/// Each pair needs at least one member present (source or derived form)
pub const REQUIRED_EITHER_COLUMNS: [(&str, &str); 2] = [
    (COL_ALTIMETER, COL_ALTIMETER_HPA),
    (COL_VISIBILITY, COL_VISIBILITY_METERS),
];

/// Rows still null in any of these after imputation are dropped
pub const FINAL_REQUIRED_COLUMNS: [&str; 4] = [
    COL_TIME,
    COL_DENSITY_ALTITUDE,
    COL_PRESSURE_ALTITUDE,
    COL_ALTIMETER_HPA,
];

/// Columns placed first in the output schema
pub const LEADING_COLUMNS: [&str; 3] = [COL_RAW, COL_TIME, COL_STATION];

/// Columns dropped once the information they carry is retained elsewhere
pub const REDUNDANT_COLUMNS: [&str; 13] = [
    "temperature_decimal",
    COL_PRESSURE_CHANGE,
    "maximum_temperature_6",
    "dewpoint_decimal",
    "minimum_temperature_6",
    "minimum_temperature_24",
    "maximum_temperature_24",
    "snow_depth",
    "runway_visibility",
    "visibility_normalized",
    "visibility_numerator",
    "visibility_denominator",
    "other",
];

/// Columns with no use downstream of the unit normalization stage
pub const UNUSED_COLUMNS: [&str; 3] = [COL_WIND_DIRECTION, COL_REMARKS, COL_REMARKS_CODES];

/// Altimeter unit split (inHg below, hPa at or above the upper bound)
pub const ALTIMETER_INHG_MIN: f64 = 0.0;
pub const ALTIMETER_INHG_MAX: f64 = 100.0;
pub const ALTIMETER_HPA_MIN: f64 = 900.0;
pub const INHG_TO_HPA: f64 = 33.8639;

/// Visibility unit split and clip bounds
pub const VISIBILITY_MILES_MAX: f64 = 10.0;
pub const MILES_TO_METERS: f64 = 1609.34;
pub const VISIBILITY_MIN_METERS: f64 = 50.0;
pub const VISIBILITY_MAX_METERS: f64 = 9999.0;

/// Cloud altitude category thresholds (hundreds of feet)
pub const CLOUD_LOW_MAX: f64 = 65.0;
pub const CLOUD_MEDIUM_MAX: f64 = 200.0;

/// Temperatures above this are sensor faults
pub const MAX_VALID_TEMP: f64 = 80.0;

/// Processing defaults
pub const DEFAULT_BATCH_SIZE: usize = 1000;
pub const DEFAULT_ROW_GROUP_SIZE: usize = 10000;
pub const DEFAULT_BUFFER_SIZE: usize = 8192 * 16; // 128KB

/// Parquet compression options
pub const COMPRESSION_SNAPPY: &str = "snappy";
pub const COMPRESSION_GZIP: &str = "gzip";
pub const COMPRESSION_LZ4: &str = "lz4";
pub const COMPRESSION_ZSTD: &str = "zstd";
pub const COMPRESSION_NONE: &str = "none";
