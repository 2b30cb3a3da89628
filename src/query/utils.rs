//! Utility functions for common operations

use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use serde::{Deserialize, Deserializer};
use std::fmt::Display;
use std::str::FromStr;

/// Convert a nullable NUMERIC column to `f64`, substituting `default` for NULL
pub fn decimal_or(value: Option<Decimal>, default: f64) -> f64 {
    value.and_then(|d| d.to_f64()).unwrap_or(default)
}

/// Deserialize a query-string value, treating a missing or empty value as `None`
pub fn empty_as_none<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: FromStr,
    T::Err: Display,
{
    let raw = Option::<String>::deserialize(deserializer)?;
    match raw.as_deref().map(str::trim) {
        None | Some("") => Ok(None),
        Some(value) => value.parse::<T>().map(Some).map_err(serde::de::Error::custom),
    }
}

/// Soil acidity bands used by the pH histogram.
///
/// Bands are half-open: the lower edge is inclusive, the upper edge
/// exclusive. `StronglyAlkaline` has no upper edge.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PhBand {
    StronglyAcidic,
    Acidic,
    Neutral,
    WeaklyAlkaline,
    StronglyAlkaline,
}

impl PhBand {
    /// Ascending by lower bound
    pub const ALL: [PhBand; 5] = [
        PhBand::StronglyAcidic,
        PhBand::Acidic,
        PhBand::Neutral,
        PhBand::WeaklyAlkaline,
        PhBand::StronglyAlkaline,
    ];

    pub fn lower_bound(self) -> Option<f64> {
        match self {
            PhBand::StronglyAcidic => None,
            PhBand::Acidic => Some(5.5),
            PhBand::Neutral => Some(6.5),
            PhBand::WeaklyAlkaline => Some(7.5),
            PhBand::StronglyAlkaline => Some(8.5),
        }
    }

    pub fn upper_bound(self) -> Option<f64> {
        match self {
            PhBand::StronglyAcidic => Some(5.5),
            PhBand::Acidic => Some(6.5),
            PhBand::Neutral => Some(7.5),
            PhBand::WeaklyAlkaline => Some(8.5),
            PhBand::StronglyAlkaline => None,
        }
    }

    fn name(self) -> &'static str {
        match self {
            PhBand::StronglyAcidic => "强酸性",
            PhBand::Acidic => "酸性",
            PhBand::Neutral => "中性",
            PhBand::WeaklyAlkaline => "弱碱性",
            PhBand::StronglyAlkaline => "强碱性",
        }
    }

    /// Chart label, e.g. `中性(6.5-7.5)`
    pub fn label(self) -> String {
        match (self.lower_bound(), self.upper_bound()) {
            (None, Some(upper)) => format!("{}(<{upper})", self.name()),
            (Some(lower), Some(upper)) => format!("{}({lower}-{upper})", self.name()),
            (Some(lower), None) => format!("{}(>{lower})", self.name()),
            (None, None) => self.name().to_string(),
        }
    }

    pub fn index(self) -> i32 {
        self as i32
    }

    pub fn from_index(index: i32) -> Option<Self> {
        let index = usize::try_from(index).ok()?;
        Self::ALL.get(index).copied()
    }

    /// The band a reading falls in
    #[cfg(test)]
    fn classify(ph: f64) -> Self {
        Self::ALL
            .into_iter()
            .find(|band| band.upper_bound().map_or(true, |upper| ph < upper))
            .unwrap_or(PhBand::StronglyAlkaline)
    }

    /// SQL `CASE` mapping `column` to the band index, built from the same
    /// bounds as the labels
    pub fn case_expression(column: &str) -> String {
        let mut sql = String::from("CASE");
        for band in Self::ALL {
            match band.upper_bound() {
                Some(upper) => {
                    sql.push_str(&format!(" WHEN {column} < {upper} THEN {}", band.index()))
                }
                None => sql.push_str(&format!(" ELSE {} END", band.index())),
            }
        }
        sql
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decimal_or_default() {
        assert_eq!(decimal_or(None, 0.0), 0.0);
        assert_eq!(decimal_or(None, 7.0), 7.0);
        assert_eq!(decimal_or(Some(Decimal::new(625, 2)), 7.0), 6.25);
    }

    #[test]
    fn test_classify_one_reading_per_band() {
        let readings = [5.0, 6.0, 7.0, 8.0, 9.0];
        let bands: Vec<PhBand> = readings.iter().map(|&ph| PhBand::classify(ph)).collect();
        assert_eq!(bands, PhBand::ALL.to_vec());
    }

    #[test]
    fn test_boundaries_open_the_next_band() {
        assert_eq!(PhBand::classify(5.5), PhBand::Acidic);
        assert_eq!(PhBand::classify(6.5), PhBand::Neutral);
        assert_eq!(PhBand::classify(7.5), PhBand::WeaklyAlkaline);
        assert_eq!(PhBand::classify(8.5), PhBand::StronglyAlkaline);
        assert_eq!(PhBand::classify(5.499), PhBand::StronglyAcidic);
    }

    #[test]
    fn test_classify_respects_bounds() {
        let mut ph = 3.0;
        while ph < 11.0 {
            let band = PhBand::classify(ph);
            if let Some(lower) = band.lower_bound() {
                assert!(ph >= lower, "{} below lower bound of {:?}", ph, band);
            }
            if let Some(upper) = band.upper_bound() {
                assert!(ph < upper, "{} not below upper bound of {:?}", ph, band);
            }
            ph += 0.05;
        }
    }

    #[test]
    fn test_bands_are_contiguous() {
        for pair in PhBand::ALL.windows(2) {
            assert_eq!(pair[0].upper_bound(), pair[1].lower_bound());
        }
    }

    #[test]
    fn test_case_expression() {
        assert_eq!(
            PhBand::case_expression("t.ph_value"),
            "CASE WHEN t.ph_value < 5.5 THEN 0 WHEN t.ph_value < 6.5 THEN 1 \
             WHEN t.ph_value < 7.5 THEN 2 WHEN t.ph_value < 8.5 THEN 3 ELSE 4 END"
        );
    }

    #[test]
    fn test_index_round_trip_and_labels() {
        assert_eq!(PhBand::from_index(2), Some(PhBand::Neutral));
        assert_eq!(PhBand::from_index(5), None);
        assert_eq!(PhBand::from_index(-1), None);
        assert_eq!(PhBand::Neutral.label(), "中性(6.5-7.5)");
    }

    #[test]
    fn test_labels_follow_bounds() {
        let labels: Vec<String> = PhBand::ALL.iter().map(|band| band.label()).collect();
        assert_eq!(
            labels,
            vec![
                "强酸性(<5.5)",
                "酸性(5.5-6.5)",
                "中性(6.5-7.5)",
                "弱碱性(7.5-8.5)",
                "强碱性(>8.5)"
            ]
        );
    }
}
