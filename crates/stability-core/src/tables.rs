//! Presentation tables for the six study countries and the event categories.

/// Countries covered by the default analysis, as ISO-2 codes.
pub const DEFAULT_COUNTRIES: &[&str] = &["US", "FR", "ZA", "IR", "BR", "IN"];

/// Display metadata for one study country.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CountryInfo {
    pub code: &'static str,
    pub label: &'static str,
    pub population: u64,
    /// Chart color as a `#rrggbb` hex string.
    pub color: &'static str,
}

pub const COUNTRIES: &[CountryInfo] = &[
    CountryInfo {
        code: "US",
        label: "United States",
        population: 334_900_000,
        color: "#8ac3d5", // light blue
    },
    CountryInfo {
        code: "ZA",
        label: "South Africa",
        population: 60_410_000,
        color: "#f3ca83", // light peach
    },
    CountryInfo {
        code: "FR",
        label: "France",
        population: 68_170_000,
        color: "#cb96cb", // thistle
    },
    CountryInfo {
        code: "BR",
        label: "Brazil",
        population: 216_400_000,
        color: "#93ce93", // sage green
    },
    CountryInfo {
        code: "IN",
        label: "India",
        population: 1_429_000_000,
        color: "#e28f9b", // light pink
    },
    CountryInfo {
        code: "IR",
        label: "Iran",
        population: 89_170_000,
        color: "#9c86c7", // lavender
    },
];

/// Display metadata for `code`, if it is a study country.
pub fn country_info(code: &str) -> Option<&'static CountryInfo> {
    COUNTRIES.iter().find(|c| c.code == code)
}

pub fn country_label(code: &str) -> Option<&'static str> {
    country_info(code).map(|c| c.label)
}

pub fn country_population(code: &str) -> Option<u64> {
    country_info(code).map(|c| c.population)
}

pub fn country_color(code: &str) -> Option<&'static str> {
    country_info(code).map(|c| c.color)
}

/// Event count per million inhabitants, for comparing countries of very
/// different size. `None` for countries without a population entry.
pub fn per_million(code: &str, count: u64) -> Option<f64> {
    let population = country_population(code)?;
    Some(count as f64 * 1_000_000.0 / population as f64)
}

/// Category keys paired with their chart labels, `"Other"` excluded.
pub const CATEGORY_LABELS: &[(&str, &str)] = &[
    ("10", "Demands"),
    ("11", "Disapproval"),
    ("13", "Threat"),
    ("14", "Protest"),
    ("15", "Force"),
    ("18", "Assault"),
    ("20", "Mass Violence"),
];

/// Chart label for a category key such as `"14"`.
pub fn category_label(key: &str) -> Option<&'static str> {
    CATEGORY_LABELS
        .iter()
        .find(|(k, _)| *k == key)
        .map(|(_, label)| *label)
}
