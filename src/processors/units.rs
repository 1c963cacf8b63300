use crate::utils::constants::{
    ALTIMETER_HPA_MIN, ALTIMETER_INHG_MAX, ALTIMETER_INHG_MIN, INHG_TO_HPA, MILES_TO_METERS,
    VISIBILITY_MAX_METERS, VISIBILITY_MILES_MAX, VISIBILITY_MIN_METERS,
};

/// Convert an altimeter setting to hectopascals.
///
/// Readings in `[0, 100)` are inches of mercury, readings of 900 and above are
/// already hectopascals. Anything between the two (or negative) is not a
/// plausible altimeter setting in either unit and yields `None`.
pub fn normalize_altimeter(value: f64) -> Option<f64> {
    if (ALTIMETER_INHG_MIN..ALTIMETER_INHG_MAX).contains(&value) {
        Some(value * INHG_TO_HPA)
    } else if value >= ALTIMETER_HPA_MIN {
        Some(value)
    } else {
        None
    }
}

/// Convert a visibility to meters, clipped to the reportable range.
///
/// Values above 10 are taken as meters, anything else as statute miles.
pub fn normalize_visibility(value: f64) -> f64 {
    let meters = if value > VISIBILITY_MILES_MAX {
        value
    } else {
        value * MILES_TO_METERS
    };
    meters.clamp(VISIBILITY_MIN_METERS, VISIBILITY_MAX_METERS)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_altimeter_inches_of_mercury() {
        let hpa = normalize_altimeter(29.92).unwrap();
        assert!((hpa - 1013.25).abs() < 0.01);
        assert_eq!(normalize_altimeter(0.0), Some(0.0));
    }

    #[test]
    fn test_altimeter_hectopascals_pass_through() {
        assert_eq!(normalize_altimeter(1013.0), Some(1013.0));
        assert_eq!(normalize_altimeter(900.0), Some(900.0));
    }

    #[test]
    fn test_altimeter_dead_zone() {
        assert_eq!(normalize_altimeter(100.0), None);
        assert_eq!(normalize_altimeter(500.0), None);
        assert_eq!(normalize_altimeter(899.99), None);
        assert_eq!(normalize_altimeter(-1.0), None);
        assert!(normalize_altimeter(99.99).is_some());
    }

    #[test]
    fn test_visibility_miles() {
        assert!((normalize_visibility(5.0) - 8046.7).abs() < 1e-6);
        assert!((normalize_visibility(10.0) - 9999.0).abs() < 1e-9);
    }

    #[test]
    fn test_visibility_clipping() {
        assert_eq!(normalize_visibility(0.02), 50.0);
        assert_eq!(normalize_visibility(15000.0), 9999.0);
        assert_eq!(normalize_visibility(800.0), 800.0);
        assert_eq!(normalize_visibility(11.0), 50.0);
    }
}
