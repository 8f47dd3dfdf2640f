//! Dimension tables
//!
//! Categorical enumerations, parent/child maps and per-value multiplier
//! tables used by the fact generator. Lookups never fail: a missing
//! multiplier falls back to [`Factors::NEUTRAL`] and a parent without
//! children stands in as its own single leaf.

use lazy_static::lazy_static;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Multiplicative adjustment factors for one dimension value.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Factors {
    pub price: f64,
    pub volume: f64,
    pub growth_rate: f64,
    pub market_share: f64,
}

impl Factors {
    pub const NEUTRAL: Factors = Factors {
        price: 1.0,
        volume: 1.0,
        growth_rate: 1.0,
        market_share: 1.0,
    };

    pub const fn new(price: f64, volume: f64, growth_rate: f64, market_share: f64) -> Self {
        Self { price, volume, growth_rate, market_share }
    }
}

impl Default for Factors {
    fn default() -> Self {
        Self::NEUTRAL
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MultiplierTable {
    factors: HashMap<String, Factors>,
}

impl MultiplierTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_entries<'a>(entries: impl IntoIterator<Item = (&'a str, Factors)>) -> Self {
        Self {
            factors: entries
                .into_iter()
                .map(|(key, factors)| (key.to_string(), factors))
                .collect(),
        }
    }

    pub fn insert(&mut self, key: impl Into<String>, factors: Factors) {
        self.factors.insert(key.into(), factors);
    }

    /// Factors for `key`, or neutral factors when the key is unknown.
    pub fn get(&self, key: &str) -> Factors {
        self.factors.get(key).copied().unwrap_or(Factors::NEUTRAL)
    }

    pub fn len(&self) -> usize {
        self.factors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.factors.is_empty()
    }
}

/// Ordered parent → children map. An empty child list is legal and means
/// the parent is its own single leaf.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Hierarchy {
    entries: Vec<(String, Vec<String>)>,
}

impl Hierarchy {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_entries<'a>(entries: impl IntoIterator<Item = (&'a str, &'a [&'a str])>) -> Self {
        Self {
            entries: entries
                .into_iter()
                .map(|(parent, children)| {
                    (parent.to_string(), children.iter().map(|c| c.to_string()).collect())
                })
                .collect(),
        }
    }

    pub fn with_entry(mut self, parent: impl Into<String>, children: Vec<String>) -> Self {
        self.entries.push((parent.into(), children));
        self
    }

    pub fn parents(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(parent, _)| parent.as_str())
    }

    /// Leaf values under `parent`; the parent itself when it has no children
    /// or is not present.
    pub fn leaf_values(&self, parent: &str) -> Vec<String> {
        match self.entries.iter().find(|(p, _)| p == parent) {
            Some((_, children)) if !children.is_empty() => children.clone(),
            _ => vec![parent.to_string()],
        }
    }

    /// Every (parent, leaf) pair in declaration order.
    pub fn leaves(&self) -> Vec<(String, String)> {
        self.entries
            .iter()
            .flat_map(|(parent, children)| {
                if children.is_empty() {
                    vec![(parent.clone(), parent.clone())]
                } else {
                    children.iter().map(|c| (parent.clone(), c.clone())).collect()
                }
            })
            .collect()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BrandTier {
    Premium,
    Mainstream,
    Value,
}

impl BrandTier {
    /// Tier by position in the brand list: the first two brands are premium,
    /// the next three mainstream, the rest value.
    pub fn for_index(index: usize) -> Self {
        match index {
            0..=1 => BrandTier::Premium,
            2..=4 => BrandTier::Mainstream,
            _ => BrandTier::Value,
        }
    }

    pub fn price_multiplier(self) -> f64 {
        match self {
            BrandTier::Premium => 1.45,
            BrandTier::Mainstream => 1.1,
            BrandTier::Value => 0.8,
        }
    }

    pub fn share_multiplier(self) -> f64 {
        match self {
            BrandTier::Premium => 1.3,
            BrandTier::Mainstream => 1.0,
            BrandTier::Value => 0.75,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Brand {
    pub name: String,
    pub company: String,
}

impl Brand {
    pub fn new(name: impl Into<String>, company: impl Into<String>) -> Self {
        Self { name: name.into(), company: company.into() }
    }
}

/// Two-tier channel grouping: sales-channel labels are grouped by their
/// leading "Offline"/"Online" word.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum ChannelGroup {
    Offline,
    Online,
    Other,
}

impl ChannelGroup {
    pub fn as_str(self) -> &'static str {
        match self {
            ChannelGroup::Offline => "Offline",
            ChannelGroup::Online => "Online",
            ChannelGroup::Other => "Other",
        }
    }
}

pub fn channel_group(channel_type: &str) -> ChannelGroup {
    let trimmed = channel_type.trim_start();
    if trimmed.starts_with("Offline") {
        ChannelGroup::Offline
    } else if trimmed.starts_with("Online") {
        ChannelGroup::Online
    } else {
        ChannelGroup::Other
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DimensionTables {
    pub regions: Hierarchy,
    pub categories: Hierarchy,
    pub materials: Vec<String>,
    /// Handle lengths double as the price-tier dimension.
    pub handle_lengths: Vec<String>,
    pub applications: Vec<String>,
    pub end_users: Vec<String>,
    /// Sales-channel labels sampled as `distributionChannelType`.
    pub channel_types: Vec<String>,
    /// Channels per channel group ("Offline" / "Online").
    pub channels: Hierarchy,
    pub brands: Vec<Brand>,

    pub region_factors: MultiplierTable,
    pub category_factors: MultiplierTable,
    pub material_factors: MultiplierTable,
    pub price_tier_factors: MultiplierTable,
    pub application_factors: MultiplierTable,
    pub channel_type_factors: MultiplierTable,
}

impl Default for DimensionTables {
    fn default() -> Self {
        Self::standard()
    }
}

impl DimensionTables {
    /// The built-in knife-market dimension set.
    pub fn standard() -> Self {
        STANDARD_TABLES.clone()
    }

    /// Tables with no values and no multipliers; callers fill in what they need.
    pub fn empty() -> Self {
        Self {
            regions: Hierarchy::new(),
            categories: Hierarchy::new(),
            materials: Vec::new(),
            handle_lengths: Vec::new(),
            applications: Vec::new(),
            end_users: Vec::new(),
            channel_types: Vec::new(),
            channels: Hierarchy::new(),
            brands: Vec::new(),
            region_factors: MultiplierTable::new(),
            category_factors: MultiplierTable::new(),
            material_factors: MultiplierTable::new(),
            price_tier_factors: MultiplierTable::new(),
            application_factors: MultiplierTable::new(),
            channel_type_factors: MultiplierTable::new(),
        }
    }

    /// Channels a record with `channel_type` may be sold through. Labels
    /// outside the Offline/Online groups are their own channel.
    pub fn channels_for(&self, channel_type: &str) -> Vec<String> {
        match channel_group(channel_type) {
            ChannelGroup::Other => vec![channel_type.to_string()],
            group => self.channels.leaf_values(group.as_str()),
        }
    }

    /// Number of leaf combinations the generator enumerates per year.
    pub fn combinations_per_year(&self) -> usize {
        self.regions.leaves().len()
            * self.categories.leaves().len()
            * self.materials.len()
            * self.handle_lengths.len()
            * self.applications.len()
    }
}

fn strings(values: &[&str]) -> Vec<String> {
    values.iter().map(|v| v.to_string()).collect()
}

fn build_standard() -> DimensionTables {
    let regions = Hierarchy::from_entries([
        ("North America", &["United States", "Canada", "Mexico"][..]),
        ("Europe", &["Germany", "France", "United Kingdom", "Italy"][..]),
        ("Asia Pacific", &["China", "Japan", "India", "Australia"][..]),
        ("Latin America", &["Brazil", "Argentina"][..]),
        ("Middle East & Africa", &[][..]),
    ]);

    let categories = Hierarchy::from_entries([
        ("Kitchen Knives", &["Chef Knives", "Paring Knives", "Bread Knives", "Santoku Knives"][..]),
        ("Pocket Knives", &["Folding Knives", "Multi-tools"][..]),
        ("Outdoor Knives", &["Hunting Knives", "Survival Knives"][..]),
        ("Utility Knives", &[][..]),
    ]);

    let channels = Hierarchy::from_entries([
        ("Offline", &["Specialty Stores", "Department Stores", "Hypermarkets", "Wholesale Distributors"][..]),
        ("Online", &["Company Websites", "E-commerce Marketplaces", "Social Commerce"][..]),
    ]);

    let brands = vec![
        Brand::new("Wüsthof", "Wüsthof GmbH"),
        Brand::new("Shun", "Kai Corporation"),
        Brand::new("Victorinox", "Victorinox AG"),
        Brand::new("Zwilling", "Zwilling J.A. Henckels"),
        Brand::new("Global", "Yoshikin"),
        Brand::new("Mora", "Morakniv AB"),
        Brand::new("Opinel", "Opinel SAS"),
        Brand::new("Generic Label", "Private Label Co."),
    ];

    let region_factors = MultiplierTable::from_entries([
        ("North America", Factors::new(1.15, 1.2, 0.9, 1.2)),
        ("Europe", Factors::new(1.1, 1.05, 0.85, 1.1)),
        ("Asia Pacific", Factors::new(0.9, 1.4, 1.3, 1.0)),
        ("Latin America", Factors::new(0.85, 0.7, 1.15, 0.8)),
        ("Middle East & Africa", Factors::new(0.95, 0.5, 1.2, 0.6)),
    ]);

    let category_factors = MultiplierTable::from_entries([
        ("Kitchen Knives", Factors::new(1.0, 1.3, 1.0, 1.0)),
        ("Pocket Knives", Factors::new(0.8, 1.1, 1.1, 1.0)),
        ("Outdoor Knives", Factors::new(1.25, 0.7, 1.3, 1.0)),
        ("Utility Knives", Factors::new(0.6, 1.5, 0.7, 1.0)),
    ]);

    let material_factors = MultiplierTable::from_entries([
        ("Stainless Steel", Factors::new(1.0, 1.3, 1.0, 1.0)),
        ("Carbon Steel", Factors::new(1.2, 0.8, 1.0, 1.0)),
        ("Damascus Steel", Factors::new(2.4, 0.3, 1.0, 1.0)),
        ("Ceramic", Factors::new(1.4, 0.5, 1.0, 1.0)),
    ]);

    let price_tier_factors = MultiplierTable::from_entries([
        ("Short (< 4 in)", Factors::new(0.85, 1.0, 1.0, 1.0)),
        ("Medium (4-6 in)", Factors::new(1.0, 1.0, 1.0, 1.0)),
        ("Long (> 6 in)", Factors::new(1.3, 1.0, 1.0, 1.0)),
    ]);

    let application_factors = MultiplierTable::from_entries([
        ("Household", Factors::new(1.0, 1.5, 1.0, 1.0)),
        ("Commercial Foodservice", Factors::new(1.0, 1.1, 1.0, 1.0)),
        ("Outdoor & Recreation", Factors::new(1.0, 0.6, 1.0, 1.0)),
        ("Industrial", Factors::new(1.0, 0.8, 1.0, 1.0)),
    ]);

    let channel_type_factors = MultiplierTable::from_entries([
        ("Offline Retail", Factors::new(1.0, 1.2, 1.0, 1.0)),
        ("Offline Wholesale", Factors::new(1.0, 1.4, 1.0, 1.0)),
        ("Online Marketplaces", Factors::new(1.0, 0.9, 1.0, 1.0)),
        ("Online Direct-to-Consumer", Factors::new(1.0, 0.6, 1.0, 1.0)),
    ]);

    DimensionTables {
        regions,
        categories,
        materials: strings(&["Stainless Steel", "Carbon Steel", "Damascus Steel", "Ceramic"]),
        handle_lengths: strings(&["Short (< 4 in)", "Medium (4-6 in)", "Long (> 6 in)"]),
        applications: strings(&["Household", "Commercial Foodservice", "Outdoor & Recreation", "Industrial"]),
        end_users: strings(&[
            "Home Cooks",
            "Professional Chefs",
            "Butchers",
            "Outdoor Enthusiasts",
            "Tradespeople",
        ]),
        channel_types: strings(&[
            "Offline Retail",
            "Offline Wholesale",
            "Online Marketplaces",
            "Online Direct-to-Consumer",
        ]),
        channels,
        brands,
        region_factors,
        category_factors,
        material_factors,
        price_tier_factors,
        application_factors,
        channel_type_factors,
    }
}

lazy_static! {
    static ref STANDARD_TABLES: DimensionTables = build_standard();
}
