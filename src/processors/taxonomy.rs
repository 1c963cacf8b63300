use std::collections::BTreeSet;

/// Coarse weather categories and the decoded phenomena that belong to each.
///
/// A phenomenon may appear under several categories (heavy thunderstorms with
/// hail count as both `hail` and `thunderstorm`).
pub const WEATHER_TAXONOMY: &[(&str, &[&str])] = &[
    ("blowing snow", &["Blowing Snow", "Low Drifting Snow"]),
    ("blowing dust", &["Blowing Wide Dust", "Sand", "Wide Dust"]),
    (
        "light rain",
        &[
            "Drizzle",
            "Drizzle Rain",
            "Light Drizzle",
            "Light Drizzle Rain",
            "Rain Drizzle",
            "Light Rain",
            "Light Rain Drizzle",
            "Light Showers",
            "Light Showers Rain",
        ],
    ),
    ("heavy rain", &["Heavy Rain", "Heavy Showers Rain", "Showers Rain"]),
    ("fog", &["Fog", "Patchy Fog", "Shallow Fog"]),
    ("light fog", &["Mist", "Partial Fog"]),
    ("light hail", &["Light Ice Pellets", "Light Showers Small Hail"]),
    (
        "hail",
        &[
            "Showers Small Hail",
            "Heavy Thunderstorm Rain Hail",
            "Heavy Thunderstorm Hail Rain",
        ],
    ),
    (
        "light snow",
        &[
            "Light Snow",
            "Light Drizzle Snow",
            "Light Drizzle Snow Grains",
            "Light Snow Grains",
            "Light Snow Grains Drizzle",
            "Light Showers Snow",
        ],
    ),
    ("heavy snow", &["Heavy Snow", "Showers Snow"]),
    ("rain", &["Rain", "Thunderstorm Rain", "Light Ice Pellets Rain"]),
    ("snow", &["Snow", "Snow Rain"]),
    (
        "thunderstorm",
        &[
            "Thunderstorm",
            "Heavy Thunderstorm Rain",
            "Heavy Thunderstorm Rain Hail",
            "Heavy Thunderstorm Hail Rain",
            "Thunderstorm Vicinity Showers",
            "Vicinity Thunderstorm",
            "Light Thunderstorm Rain",
        ],
    ),
    ("vicinity showers", &["Vicinity Showers"]),
    ("vicinity fog", &["Vicinity Fog"]),
    ("funnel cloud", &["Funnel Cloud"]),
    ("haze", &["Haze"]),
    ("smoke", &["Smoke"]),
    (
        "freezing",
        &[
            "Freezing Fog",
            "Freezing Drizzle",
            "Light Freezing Drizzle",
            "Light Freezing Drizzle Snow",
        ],
    ),
];

/// Category names in table order.
pub fn categories() -> impl Iterator<Item = &'static str> {
    WEATHER_TAXONOMY.iter().map(|(category, _)| *category)
}

/// Categories a single phenomenon belongs to; empty when unrecognized.
pub fn categories_for(phenomenon: &str) -> impl Iterator<Item = &'static str> + '_ {
    WEATHER_TAXONOMY
        .iter()
        .filter(move |(_, phenomena)| phenomena.contains(&phenomenon))
        .map(|(category, _)| *category)
}

/// Map a report's phenomena onto the set of categories they fall under.
pub fn map_phenomena<S: AsRef<str>>(phenomena: &[S]) -> BTreeSet<&'static str> {
    phenomena
        .iter()
        .flat_map(|p| categories_for(p.as_ref()))
        .collect()
}

/// Output column for a category (`wx_code_light_rain`).
pub fn column_name(category: &str) -> String {
    format!(
        "{}{}",
        crate::utils::constants::WX_CODE_PREFIX,
        category.replace(' ', "_")
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_small_hail_is_hail_only() {
        let categories = map_phenomena(&["Showers Small Hail"]);
        assert_eq!(categories.into_iter().collect::<Vec<_>>(), vec!["hail"]);
    }

    #[test]
    fn test_freezing_fog_is_not_fog() {
        let categories = map_phenomena(&["Freezing Fog"]);
        assert_eq!(categories.into_iter().collect::<Vec<_>>(), vec!["freezing"]);
    }

    #[test]
    fn test_multi_category_phenomenon() {
        let categories = map_phenomena(&["Heavy Thunderstorm Rain Hail", "Mist"]);
        assert!(categories.contains("hail"));
        assert!(categories.contains("thunderstorm"));
        assert!(categories.contains("light fog"));
        assert_eq!(categories.len(), 3);
    }

    #[test]
    fn test_unrecognized_is_ignored() {
        assert!(map_phenomena(&["Volcanic Ash", ""]).is_empty());
        assert!(map_phenomena::<&str>(&[]).is_empty());
    }

    #[test]
    fn test_column_names() {
        assert_eq!(column_name("light rain"), "wx_code_light_rain");
        assert_eq!(categories().count(), WEATHER_TAXONOMY.len());
        assert!(categories().all(|c| !column_name(c).contains(' ')));
    }
}
