//! Generator configuration
//!
//! Values come from (lowest to highest precedence) built-in defaults, an
//! optional JSON file, `MARKET_*` environment variables and CLI flags.

use crate::error::{InsightsError, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::debug;

pub const DEFAULT_SEED: u64 = 42;
pub const DEFAULT_FIRST_YEAR: i32 = 2020;
pub const DEFAULT_YEAR_COUNT: u32 = 15;
pub const DEFAULT_RECORD_ID_START: u64 = 100_000;
pub const DEFAULT_WATERFALL_INCREMENT: f64 = 250_000.0;
/// Upper bound on generated years; every year multiplies the table size.
pub const MAX_YEAR_COUNT: u32 = 500;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct GeneratorConfig {
    pub seed: u64,
    pub first_year: i32,
    pub year_count: u32,
    pub record_id_start: u64,
    /// Increment used by the waterfall series when a year has no records.
    pub default_increment: f64,
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        Self {
            seed: DEFAULT_SEED,
            first_year: DEFAULT_FIRST_YEAR,
            year_count: DEFAULT_YEAR_COUNT,
            record_id_start: DEFAULT_RECORD_ID_START,
            default_increment: DEFAULT_WATERFALL_INCREMENT,
        }
    }
}

impl GeneratorConfig {
    /// Load configuration from a JSON file. Missing keys keep their defaults.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| {
            InsightsError::Config(format!("Failed to read {}: {}", path.display(), e))
        })?;
        let config: GeneratorConfig = serde_json::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    /// Defaults overlaid with `MARKET_*` environment variables (after `.env`).
    pub fn from_env() -> Result<Self> {
        dotenv::dotenv().ok();
        Self::default().with_env_overrides()
    }

    pub fn with_env_overrides(mut self) -> Result<Self> {
        if let Some(seed) = env_var::<u64>("MARKET_SEED")? {
            self.seed = seed;
        }
        if let Some(first_year) = env_var::<i32>("MARKET_FIRST_YEAR")? {
            self.first_year = first_year;
        }
        if let Some(year_count) = env_var::<u32>("MARKET_YEAR_COUNT")? {
            self.year_count = year_count;
        }
        if let Some(start) = env_var::<u64>("MARKET_RECORD_ID_START")? {
            self.record_id_start = start;
        }
        self.validate()?;
        Ok(self)
    }

    pub fn validate(&self) -> Result<()> {
        if self.year_count == 0 {
            return Err(InsightsError::Config("year_count must be at least 1".to_string()));
        }
        if self.year_count > MAX_YEAR_COUNT {
            return Err(InsightsError::Config(format!(
                "year_count {} exceeds the maximum of {}",
                self.year_count, MAX_YEAR_COUNT
            )));
        }
        if self.checked_span().is_none() {
            return Err(InsightsError::Config(format!(
                "year range starting at {} with {} years overflows",
                self.first_year, self.year_count
            )));
        }
        if !self.default_increment.is_finite() {
            return Err(InsightsError::Config("default_increment must be finite".to_string()));
        }
        Ok(())
    }

    /// Number of years and the last year, when both are representable.
    fn checked_span(&self) -> Option<(i32, i32)> {
        let span = i32::try_from(self.year_count).ok().filter(|&n| n > 0)?;
        let last = self.first_year.checked_add(span - 1)?;
        Some((span, last))
    }

    /// Generated years, ascending. Empty when the year range is out of range.
    pub fn years(&self) -> impl Iterator<Item = i32> + Clone {
        let first = self.first_year;
        let span = self.checked_span().map(|(span, _)| span).unwrap_or(0);
        (0..span).map(move |offset| first + offset)
    }

    pub fn last_year(&self) -> Option<i32> {
        self.checked_span().map(|(_, last)| last)
    }

    /// Records the generator will produce per dimension combination.
    pub fn year_len(&self) -> usize {
        self.checked_span().map(|(span, _)| span as usize).unwrap_or(0)
    }
}

fn env_var<T: std::str::FromStr>(name: &str) -> Result<Option<T>> {
    match std::env::var(name) {
        Ok(raw) => {
            debug!("Config override {}={}", name, raw);
            raw.trim()
                .parse::<T>()
                .map(Some)
                .map_err(|_| InsightsError::Config(format!("Invalid value for {}: {}", name, raw)))
        }
        Err(_) => Ok(None),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_years() {
        let config = GeneratorConfig::default();
        let years: Vec<i32> = config.years().collect();
        assert_eq!(years.len(), 15);
        assert_eq!(years[0], 2020);
        assert_eq!(config.last_year(), Some(2034));
    }

    #[test]
    fn test_partial_json_keeps_defaults() {
        let config: GeneratorConfig = serde_json::from_str(r#"{"seed": 7, "yearCount": 3}"#).unwrap();
        assert_eq!(config.seed, 7);
        assert_eq!(config.year_count, 3);
        assert_eq!(config.first_year, DEFAULT_FIRST_YEAR);
        assert_eq!(config.record_id_start, DEFAULT_RECORD_ID_START);
    }

    #[test]
    fn test_validate_rejects_zero_years() {
        let config = GeneratorConfig { year_count: 0, ..Default::default() };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_rejects_year_count_beyond_i32() {
        let config = GeneratorConfig { year_count: 2_147_483_648, ..Default::default() };
        assert!(matches!(config.validate(), Err(InsightsError::Config(_))));
        assert_eq!(config.years().count(), 0);
        assert_eq!(config.last_year(), None);

        let config = GeneratorConfig { year_count: 3_000_000_000, ..Default::default() };
        assert!(config.validate().is_err());
        assert_eq!(config.years().count(), 0);
        assert_eq!(config.year_len(), 0);

        let config = GeneratorConfig { year_count: MAX_YEAR_COUNT + 1, ..Default::default() };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_rejects_year_overflow() {
        let config = GeneratorConfig { first_year: i32::MAX - 1, year_count: 3, ..Default::default() };
        assert!(config.validate().is_err());
        assert_eq!(config.years().count(), 0);

        let config = GeneratorConfig { first_year: i32::MAX - 1, year_count: 2, ..Default::default() };
        assert!(config.validate().is_ok());
        assert_eq!(config.last_year(), Some(i32::MAX));
    }

    #[test]
    fn test_env_overrides() {
        // Only this test touches MARKET_* variables.
        std::env::set_var("MARKET_SEED", "1234");
        std::env::set_var("MARKET_YEAR_COUNT", " 4 ");
        let config = GeneratorConfig::default().with_env_overrides().unwrap();
        assert_eq!(config.seed, 1234);
        assert_eq!(config.year_count, 4);

        std::env::set_var("MARKET_SEED", "not-a-seed");
        let err = GeneratorConfig::default().with_env_overrides().unwrap_err();
        assert!(matches!(err, InsightsError::Config(ref msg) if msg.contains("MARKET_SEED")));

        std::env::set_var("MARKET_SEED", "7");
        std::env::set_var("MARKET_YEAR_COUNT", "3000000000");
        assert!(GeneratorConfig::default().with_env_overrides().is_err());

        std::env::remove_var("MARKET_SEED");
        std::env::remove_var("MARKET_YEAR_COUNT");
    }

    #[test]
    fn test_load_from_file() {
        let dir = std::env::temp_dir().join("market_insights_config_test");
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("generator.json");
        std::fs::write(&path, r#"{"seed": 99, "firstYear": 2010}"#).unwrap();

        let config = GeneratorConfig::load(&path).unwrap();
        assert_eq!(config.seed, 99);
        assert_eq!(config.first_year, 2010);
    }
}
