use std::fmt;
use std::str::FromStr;
use std::sync::LazyLock;

use regex::Regex;
use serde::Serialize;

use crate::error::KplrError;

static PLANET_NAME: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"([0-9]+)[-\s]*([a-zA-Z])").expect("planet name pattern"));

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct KoiNumber(f64);

impl KoiNumber {
    pub fn new(value: f64) -> Result<Self, KplrError> {
        if !value.is_finite() || value <= 0.0 {
            return Err(KplrError::InvalidKoiNumber(value.to_string()));
        }
        Ok(Self(value))
    }

    pub fn value(&self) -> f64 {
        self.0
    }

    pub fn kepoi_name(&self) -> String {
        format!("K{:08.2}", self.0)
    }
}

impl fmt::Display for KoiNumber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.2}", self.0)
    }
}

impl FromStr for KoiNumber {
    type Err = KplrError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let trimmed = value.trim();
        let upper = trimmed.to_ascii_uppercase();
        let digits = upper
            .strip_prefix("KOI-")
            .or_else(|| upper.strip_prefix("KOI"))
            .or_else(|| upper.strip_prefix('K'))
            .unwrap_or(&upper);
        let number = digits
            .trim()
            .parse::<f64>()
            .map_err(|_| KplrError::InvalidKoiNumber(value.to_string()))?;
        Self::new(number).map_err(|_| KplrError::InvalidKoiNumber(value.to_string()))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct KeplerId(u64);

impl KeplerId {
    pub fn new(value: u64) -> Self {
        Self(value)
    }

    pub fn value(&self) -> u64 {
        self.0
    }

    pub fn padded(&self) -> String {
        format!("{:09}", self.0)
    }

    pub fn prefix(&self) -> String {
        self.padded().chars().take(4).collect()
    }
}

impl fmt::Display for KeplerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for KeplerId {
    type Err = KplrError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        value
            .trim()
            .parse::<u64>()
            .map(Self)
            .map_err(|_| KplrError::InvalidKeplerId(value.to_string()))
    }
}

impl TryFrom<i64> for KeplerId {
    type Error = KplrError;

    fn try_from(value: i64) -> Result<Self, Self::Error> {
        u64::try_from(value)
            .map(Self)
            .map_err(|_| KplrError::InvalidKeplerId(value.to_string()))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct PlanetName {
    system: String,
    letter: char,
}

impl PlanetName {
    pub fn kepler_name(&self) -> String {
        format!("Kepler-{} {}", self.system, self.letter)
    }
}

impl fmt::Display for PlanetName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.kepler_name())
    }
}

impl FromStr for PlanetName {
    type Err = KplrError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let mut captures = PLANET_NAME.captures_iter(value);
        let (Some(first), None) = (captures.next(), captures.next()) else {
            return Err(KplrError::InvalidPlanetName(value.to_string()));
        };
        let system = first[1].to_string();
        let letter = first[2]
            .chars()
            .next()
            .ok_or_else(|| KplrError::InvalidPlanetName(value.to_string()))?;
        Ok(Self { system, letter })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Cadence {
    Long,
    Short,
}

impl Cadence {
    pub fn from_target_type(target_type: &str) -> Self {
        if target_type == "LC" {
            Cadence::Long
        } else {
            Cadence::Short
        }
    }
}

impl fmt::Display for Cadence {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Cadence::Long => write!(f, "long"),
            Cadence::Short => write!(f, "short"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortOrder {
    #[default]
    Ascending,
    Descending,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Sort {
    pub column: String,
    pub order: SortOrder,
}

impl Sort {
    pub fn ascending(column: impl Into<String>) -> Self {
        Self {
            column: column.into(),
            order: SortOrder::Ascending,
        }
    }

    pub fn descending(column: impl Into<String>) -> Self {
        Self {
            column: column.into(),
            order: SortOrder::Descending,
        }
    }
}

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;

    use super::*;

    #[test]
    fn koi_number_variants() {
        for input in ["145.01", "K00145.01", "KOI-145.01", " koi145.01 "] {
            let koi: KoiNumber = input.parse().unwrap();
            assert_eq!(koi.kepoi_name(), "K00145.01");
        }
    }

    #[test]
    fn koi_number_invalid() {
        assert_matches!(
            "abc".parse::<KoiNumber>(),
            Err(KplrError::InvalidKoiNumber(_))
        );
        assert_matches!(
            "-1".parse::<KoiNumber>(),
            Err(KplrError::InvalidKoiNumber(_))
        );
    }

    #[test]
    fn kepler_id_padding() {
        let id = KeplerId::new(9787239);
        assert_eq!(id.padded(), "009787239");
        assert_eq!(id.prefix(), "0097");
    }

    #[test]
    fn planet_name_forms() {
        let short: PlanetName = "6b".parse().unwrap();
        assert_eq!(short.kepler_name(), "Kepler-6 b");
        let long: PlanetName = "Kepler-62f".parse().unwrap();
        assert_eq!(long.kepler_name(), "Kepler-62 f");
        let spaced: PlanetName = "Kepler-32 f".parse().unwrap();
        assert_eq!(spaced.kepler_name(), "Kepler-32 f");
    }

    #[test]
    fn planet_name_needs_exactly_one_match() {
        assert_matches!(
            "Kepler".parse::<PlanetName>(),
            Err(KplrError::InvalidPlanetName(_))
        );
        assert_matches!(
            "6b 7c".parse::<PlanetName>(),
            Err(KplrError::InvalidPlanetName(_))
        );
    }

    #[test]
    fn cadence_from_target_type() {
        assert_eq!(Cadence::from_target_type("LC"), Cadence::Long);
        assert_eq!(Cadence::from_target_type("SC"), Cadence::Short);
    }
}
