use serde::{Deserialize, Serialize};

use crate::utils::constants::{CLOUD_LOW_MAX, CLOUD_MEDIUM_MAX};

/// A single reported cloud layer, in the order it appeared in the report.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct CloudLayer {
    #[serde(rename = "type", default)]
    pub cloud_type: Option<String>,

    /// Layer base in hundreds of feet
    #[serde(default, alias = "base")]
    pub altitude: Option<f64>,

    #[serde(default)]
    pub modifier: Option<String>,
}

impl CloudLayer {
    pub fn new(cloud_type: &str, altitude: Option<f64>, modifier: Option<&str>) -> Self {
        Self {
            cloud_type: Some(cloud_type.to_string()),
            altitude,
            modifier: modifier.map(str::to_string),
        }
    }

    pub fn coverage(&self) -> CloudCoverage {
        self.cloud_type
            .as_deref()
            .map(CloudCoverage::parse)
            .unwrap_or(CloudCoverage::Unknown)
    }

    pub fn is_vertical(&self) -> bool {
        matches!(self.modifier.as_deref(), Some("CB") | Some("TCU"))
    }

    /// Classify the layer height; convective modifiers override altitude.
    pub fn altitude_category(&self) -> AltitudeCategory {
        if self.is_vertical() {
            return AltitudeCategory::Vertical;
        }

        match self.altitude {
            Some(altitude) if altitude <= CLOUD_LOW_MAX => AltitudeCategory::Low,
            Some(altitude) if altitude <= CLOUD_MEDIUM_MAX => AltitudeCategory::Medium,
            Some(altitude) if altitude > CLOUD_MEDIUM_MAX => AltitudeCategory::High,
            _ => AltitudeCategory::Unknown,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CloudCoverage {
    Unknown,
    Clear,
    Few,
    Scattered,
    Broken,
    Overcast,
}

impl CloudCoverage {
    pub fn parse(s: &str) -> Self {
        match s {
            "CLR" => CloudCoverage::Clear,
            "FEW" => CloudCoverage::Few,
            "SCT" => CloudCoverage::Scattered,
            "BKN" => CloudCoverage::Broken,
            "OVC" => CloudCoverage::Overcast,
            _ => CloudCoverage::Unknown,
        }
    }

    pub fn code(self) -> i64 {
        match self {
            CloudCoverage::Unknown => 0,
            CloudCoverage::Clear => 1,
            CloudCoverage::Few => 2,
            CloudCoverage::Scattered => 3,
            CloudCoverage::Broken => 4,
            CloudCoverage::Overcast => 5,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AltitudeCategory {
    Unknown,
    Low,
    Medium,
    High,
    Vertical,
}

impl AltitudeCategory {
    pub fn code(self) -> i64 {
        match self {
            AltitudeCategory::Unknown => 0,
            AltitudeCategory::Low => 1,
            AltitudeCategory::Medium => 2,
            AltitudeCategory::High => 3,
            AltitudeCategory::Vertical => 4,
        }
    }
}

/// Flight rule severity, VFR best and LIFR worst.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FlightRules {
    Vfr,
    Mvfr,
    Ifr,
    Lifr,
}

impl FlightRules {
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "VFR" => Some(FlightRules::Vfr),
            "MVFR" => Some(FlightRules::Mvfr),
            "IFR" => Some(FlightRules::Ifr),
            "LIFR" => Some(FlightRules::Lifr),
            _ => None,
        }
    }

    pub fn severity(self) -> i64 {
        match self {
            FlightRules::Vfr => 1,
            FlightRules::Mvfr => 2,
            FlightRules::Ifr => 3,
            FlightRules::Lifr => 4,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_altitude_thresholds() {
        assert_eq!(
            CloudLayer::new("FEW", Some(50.0), None).altitude_category(),
            AltitudeCategory::Low
        );
        assert_eq!(
            CloudLayer::new("FEW", Some(65.0), None).altitude_category(),
            AltitudeCategory::Low
        );
        assert_eq!(
            CloudLayer::new("SCT", Some(150.0), None).altitude_category(),
            AltitudeCategory::Medium
        );
        assert_eq!(
            CloudLayer::new("SCT", Some(200.0), None).altitude_category(),
            AltitudeCategory::Medium
        );
        assert_eq!(
            CloudLayer::new("BKN", Some(250.0), None).altitude_category(),
            AltitudeCategory::High
        );
        assert_eq!(
            CloudLayer::new("OVC", None, None).altitude_category(),
            AltitudeCategory::Unknown
        );
    }

    #[test]
    fn test_convective_modifier_overrides_altitude() {
        assert_eq!(
            CloudLayer::new("BKN", Some(50.0), Some("CB")).altitude_category(),
            AltitudeCategory::Vertical
        );
        assert_eq!(
            CloudLayer::new("FEW", None, Some("TCU")).altitude_category(),
            AltitudeCategory::Vertical
        );
    }

    #[test]
    fn test_coverage_codes() {
        assert_eq!(CloudCoverage::parse("CLR").code(), 1);
        assert_eq!(CloudCoverage::parse("OVC").code(), 5);
        assert_eq!(CloudCoverage::parse("VV").code(), 0);
        assert_eq!(CloudLayer::default().coverage(), CloudCoverage::Unknown);
    }

    #[test]
    fn test_flight_rules() {
        assert_eq!(FlightRules::parse("LIFR").map(FlightRules::severity), Some(4));
        assert_eq!(FlightRules::parse("vfr"), None);
    }
}
