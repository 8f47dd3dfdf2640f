//! Fact Generator - deterministic synthetic market records
//!
//! Enumerates `year × (region, country) × (category, subcategory) × material
//! × handle length × application`. For every leaf combination the generator
//! samples the remaining dimensions and numeric bases from the seeded
//! generator and composes them with the dimension multipliers.
//!
//! Draw order per record (one value each, never skipped):
//!  1. end user
//!  2. distribution channel type
//!  3. distribution channel (within the channel type's group)
//!  4. brand (and with it company and tier)
//!  5. base price in [20, 220)
//!  6. base volume in [500, 5000)
//!  7. market value perturbation in [0.9, 1.1)
//!  8. market share base in [1, 25)
//!  9. CAGR base in [-2, 10)
//! 10. YoY growth in [-5, 15)
//! 11. quantity factor in [0.8, 1.2)

use crate::config::GeneratorConfig;
use crate::dimensions::{BrandTier, DimensionTables};
use crate::error::{InsightsError, Result};
use crate::rng::SeededRng;
use chrono::{DateTime, Utc};
use itertools::iproduct;
use serde::{Deserialize, Serialize};
use std::time::Instant;
use tracing::{debug, info};
use uuid::Uuid;

const BASE_PRICE_RANGE: (f64, f64) = (20.0, 220.0);
const BASE_VOLUME_RANGE: (f64, f64) = (500.0, 5000.0);
const MARKET_VALUE_PERTURBATION: (f64, f64) = (0.9, 1.1);
const MARKET_SHARE_RANGE: (f64, f64) = (1.0, 25.0);
const CAGR_RANGE: (f64, f64) = (-2.0, 10.0);
const YOY_RANGE: (f64, f64) = (-5.0, 15.0);
const QTY_FACTOR_RANGE: (f64, f64) = (0.8, 1.2);

/// Yearly price drift applied per year since the first year.
const PRICE_TREND_PER_YEAR: f64 = 0.03;
/// Yearly volume drift applied per year since the first year.
const VOLUME_TREND_PER_YEAR: f64 = 0.08;

const UNSPECIFIED: &str = "Unspecified";

/// One synthetic market observation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FactRecord {
    pub record_id: u64,
    pub year: i32,
    pub region: String,
    pub country: String,
    pub product_category: String,
    pub sub_product_category: String,
    /// Always `"{product_category} - {sub_product_category}"`.
    pub product_type: String,
    pub blade_material: String,
    pub handle_length: String,
    pub application: String,
    pub end_user: String,
    pub distribution_channel_type: String,
    pub distribution_channel: String,
    pub brand: String,
    pub company: String,
    pub price: f64,
    pub volume_units: i64,
    pub qty: i64,
    pub revenue: f64,
    pub market_value_usd: f64,
    /// Same as `market_value_usd`.
    pub value: f64,
    pub market_share_pct: f64,
    pub cagr: f64,
    pub yoy_growth: f64,
}

pub fn product_type_label(category: &str, subcategory: &str) -> String {
    format!("{} - {}", category, subcategory)
}

/// Summary of one generation run.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerationReport {
    pub run_id: Uuid,
    pub generated_at: DateTime<Utc>,
    pub seed: u64,
    pub record_count: usize,
    pub draws: u64,
    pub elapsed_ms: u64,
}

#[derive(Debug, Clone)]
pub struct FactGenerator {
    config: GeneratorConfig,
    tables: DimensionTables,
}

impl FactGenerator {
    pub fn new(config: GeneratorConfig, tables: DimensionTables) -> Self {
        Self { config, tables }
    }

    pub fn with_standard_tables(config: GeneratorConfig) -> Self {
        Self::new(config, DimensionTables::standard())
    }

    pub fn config(&self) -> &GeneratorConfig {
        &self.config
    }

    pub fn tables(&self) -> &DimensionTables {
        &self.tables
    }

    /// Generate the full table from a fresh generator seeded with the
    /// configured seed.
    pub fn generate(&self) -> Result<Vec<FactRecord>> {
        let mut rng = SeededRng::new(self.config.seed);
        self.generate_with(&mut rng)
    }

    pub fn generate_with_report(&self, rng: &mut SeededRng) -> Result<(Vec<FactRecord>, GenerationReport)> {
        let started = Instant::now();
        let draws_before = rng.draws();
        let records = self.generate_with(rng)?;

        let report = GenerationReport {
            run_id: Uuid::new_v4(),
            generated_at: Utc::now(),
            seed: rng.seed(),
            record_count: records.len(),
            draws: rng.draws() - draws_before,
            elapsed_ms: started.elapsed().as_millis() as u64,
        };
        info!(
            "Generated {} fact records (run {}, {} draws, {} ms)",
            report.record_count, report.run_id, report.draws, report.elapsed_ms
        );
        Ok((records, report))
    }

    /// Generate the table drawing from `rng`, continuing its current stream.
    pub fn generate_with(&self, rng: &mut SeededRng) -> Result<Vec<FactRecord>> {
        self.config.validate()?;

        let tables = &self.tables;
        let regions = tables.regions.leaves();
        let categories = tables.categories.leaves();
        let expected = tables.combinations_per_year().saturating_mul(self.config.year_len());
        debug!(
            "Generating {} combinations over {} years from seed {}",
            expected, self.config.year_count, self.config.seed
        );

        let mut records = Vec::with_capacity(expected);
        let mut next_id = self.config.record_id_start;

        for (year, (region, country), (category, subcategory), material, handle_length, application) in iproduct!(
            self.config.years(),
            regions.iter(),
            categories.iter(),
            tables.materials.iter(),
            tables.handle_lengths.iter(),
            tables.applications.iter()
        ) {
            let leaf = Leaf {
                year,
                region,
                country,
                category,
                subcategory,
                material,
                handle_length,
                application,
            };
            records.push(self.build_record(next_id, &leaf, rng));
            next_id = next_id.checked_add(1).ok_or_else(|| {
                InsightsError::Generation(format!("record id overflow after {} records", records.len()))
            })?;
        }

        Ok(records)
    }

    fn build_record(&self, record_id: u64, leaf: &Leaf<'_>, rng: &mut SeededRng) -> FactRecord {
        let tables = &self.tables;
        let years_elapsed = (leaf.year - self.config.first_year) as f64;

        let end_user = pick_or(rng, &tables.end_users, UNSPECIFIED);
        let channel_type = pick_or(rng, &tables.channel_types, UNSPECIFIED);
        let channel = pick_or(rng, &tables.channels_for(&channel_type), &channel_type);
        let brand_idx = draw_index(rng, tables.brands.len());
        let (brand, company, brand_multipliers) = match brand_idx.and_then(|i| tables.brands.get(i).map(|b| (i, b))) {
            Some((i, b)) => {
                let tier = BrandTier::for_index(i);
                (b.name.clone(), b.company.clone(), (tier.price_multiplier(), tier.share_multiplier()))
            }
            None => (UNSPECIFIED.to_string(), UNSPECIFIED.to_string(), (1.0, 1.0)),
        };
        let (brand_price, brand_share) = brand_multipliers;

        let region_f = tables.region_factors.get(leaf.region);
        let category_f = tables.category_factors.get(leaf.category);
        let material_f = tables.material_factors.get(leaf.material);
        let tier_f = tables.price_tier_factors.get(leaf.handle_length);
        let application_f = tables.application_factors.get(leaf.application);
        let channel_f = tables.channel_type_factors.get(&channel_type);

        let base_price = rng.range(BASE_PRICE_RANGE.0, BASE_PRICE_RANGE.1);
        let price = base_price
            * category_f.price
            * material_f.price
            * brand_price
            * tier_f.price
            * (1.0 + PRICE_TREND_PER_YEAR * years_elapsed);

        let base_volume = rng.range(BASE_VOLUME_RANGE.0, BASE_VOLUME_RANGE.1);
        let volume = base_volume
            * region_f.volume
            * category_f.volume
            * material_f.volume
            * application_f.volume
            * channel_f.volume
            * (1.0 + VOLUME_TREND_PER_YEAR * years_elapsed);

        let revenue = price * volume;
        let market_value = revenue * rng.range(MARKET_VALUE_PERTURBATION.0, MARKET_VALUE_PERTURBATION.1);
        let market_share =
            rng.range(MARKET_SHARE_RANGE.0, MARKET_SHARE_RANGE.1) * region_f.market_share * brand_share;
        let cagr = rng.range(CAGR_RANGE.0, CAGR_RANGE.1) * category_f.growth_rate;
        let yoy_growth = rng.range(YOY_RANGE.0, YOY_RANGE.1);
        let volume_units = volume.round();
        let qty = volume_units * rng.range(QTY_FACTOR_RANGE.0, QTY_FACTOR_RANGE.1);

        let market_value_usd = round2(market_value);
        FactRecord {
            record_id,
            year: leaf.year,
            region: leaf.region.to_string(),
            country: leaf.country.to_string(),
            product_category: leaf.category.to_string(),
            sub_product_category: leaf.subcategory.to_string(),
            product_type: product_type_label(leaf.category, leaf.subcategory),
            blade_material: leaf.material.to_string(),
            handle_length: leaf.handle_length.to_string(),
            application: leaf.application.to_string(),
            end_user,
            distribution_channel_type: channel_type,
            distribution_channel: channel,
            brand,
            company,
            price: round2(price),
            volume_units: volume_units as i64,
            qty: qty.round() as i64,
            revenue: round2(revenue),
            market_value_usd,
            value: market_value_usd,
            market_share_pct: round2(market_share),
            cagr: round2(cagr),
            yoy_growth: round2(yoy_growth),
        }
    }
}

struct Leaf<'a> {
    year: i32,
    region: &'a str,
    country: &'a str,
    category: &'a str,
    subcategory: &'a str,
    material: &'a str,
    handle_length: &'a str,
    application: &'a str,
}

/// Always consumes one draw, even when `values` is empty.
fn draw_index(rng: &mut SeededRng, len: usize) -> Option<usize> {
    let draw = rng.next_f64();
    if len == 0 {
        return None;
    }
    Some(((draw * len as f64) as usize).min(len - 1))
}

fn pick_or(rng: &mut SeededRng, values: &[String], fallback: &str) -> String {
    draw_index(rng, values.len())
        .and_then(|i| values.get(i))
        .cloned()
        .unwrap_or_else(|| fallback.to_string())
}

pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dimensions::Hierarchy;

    fn tiny_tables() -> DimensionTables {
        let mut tables = DimensionTables::empty();
        tables.regions = Hierarchy::new()
            .with_entry("North", vec!["Norland".to_string()])
            .with_entry("South", vec!["Southia".to_string()]);
        tables.categories = Hierarchy::new().with_entry("Knives", vec!["Chef".to_string()]);
        tables.materials = vec!["Steel".to_string()];
        tables.handle_lengths = vec!["Medium".to_string()];
        tables.applications = vec!["Home".to_string()];
        tables
    }

    fn one_year(seed: u64) -> GeneratorConfig {
        GeneratorConfig { seed, year_count: 1, ..Default::default() }
    }

    #[test]
    fn test_two_region_scenario() {
        let generator = FactGenerator::new(one_year(42), tiny_tables());
        let records = generator.generate().unwrap();

        assert_eq!(records.len(), 2);
        assert_eq!(records[0].record_id, 100_000);
        assert_eq!(records[1].record_id, 100_001);
        assert_eq!(records[0].region, "North");
        assert_eq!(records[1].country, "Southia");
    }

    #[test]
    fn test_eleven_draws_per_record() {
        let generator = FactGenerator::new(one_year(42), tiny_tables());
        let mut rng = SeededRng::new(42);
        let records = generator.generate_with(&mut rng).unwrap();
        assert_eq!(rng.draws(), 11 * records.len() as u64);
    }

    #[test]
    fn test_empty_sample_lists_use_fallback() {
        let generator = FactGenerator::new(one_year(1), tiny_tables());
        let records = generator.generate().unwrap();
        for record in &records {
            assert_eq!(record.end_user, UNSPECIFIED);
            assert_eq!(record.brand, UNSPECIFIED);
            assert_eq!(record.distribution_channel, record.distribution_channel_type);
        }
    }

    #[test]
    fn test_unknown_dimensions_use_neutral_factors() {
        // No multipliers registered at all: price stays within the base range.
        let generator = FactGenerator::new(one_year(9), tiny_tables());
        for record in generator.generate().unwrap() {
            assert!(record.price >= BASE_PRICE_RANGE.0 && record.price <= BASE_PRICE_RANGE.1);
            assert!(record.volume_units >= 500 && record.volume_units <= 5000);
        }
    }

    #[test]
    fn test_measures_relationships() {
        let generator = FactGenerator::with_standard_tables(GeneratorConfig { year_count: 2, ..Default::default() });
        for record in generator.generate().unwrap() {
            assert_eq!(record.value, record.market_value_usd);
            assert!(record.market_value_usd >= record.revenue * 0.9 - 0.01);
            assert!(record.market_value_usd <= record.revenue * 1.1 + 0.01);
            assert!(record.yoy_growth >= -5.0 && record.yoy_growth <= 15.0);
            let units = record.volume_units as f64;
            assert!(record.qty as f64 >= (units * 0.8).round());
            assert!(record.qty as f64 <= (units * 1.2).round());
        }
    }

    #[test]
    fn test_qty_scales_rounded_volume() {
        let generator = FactGenerator::new(one_year(42), tiny_tables());
        let records = generator.generate().unwrap();

        let mut rng = SeededRng::new(42);
        for record in &records {
            let draws: Vec<f64> = (0..11).map(|_| rng.next_f64()).collect();
            let factor = QTY_FACTOR_RANGE.0 + draws[10] * (QTY_FACTOR_RANGE.1 - QTY_FACTOR_RANGE.0);
            assert_eq!(record.qty, (record.volume_units as f64 * factor).round() as i64);
        }
    }

    #[test]
    fn test_report_serializes_to_json() {
        let generator = FactGenerator::new(one_year(42), tiny_tables());
        let mut rng = SeededRng::new(42);
        let (records, report) = generator.generate_with_report(&mut rng).unwrap();

        let json = serde_json::to_value(&report).unwrap();
        assert_eq!(json["recordCount"], records.len());
        assert_eq!(json["draws"], 22);
        assert_eq!(json["runId"].as_str(), Some(report.run_id.to_string().as_str()));

        let back: GenerationReport = serde_json::from_value(json).unwrap();
        assert_eq!(back.run_id, report.run_id);
    }

    #[test]
    fn test_out_of_range_year_count_is_an_error() {
        for year_count in [2_147_483_648, 3_000_000_000] {
            let generator = FactGenerator::new(GeneratorConfig { year_count, ..Default::default() }, tiny_tables());
            assert!(matches!(generator.generate(), Err(InsightsError::Config(_))));
        }
    }

    #[test]
    fn test_zero_years_is_an_error() {
        let generator = FactGenerator::new(GeneratorConfig { year_count: 0, ..Default::default() }, tiny_tables());
        assert!(generator.generate().is_err());
    }

    #[test]
    fn test_round2() {
        assert_eq!(round2(12.0), 12.0);
        assert_eq!(round2(2.3456), 2.35);
    }
}
