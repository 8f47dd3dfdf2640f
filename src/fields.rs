//! Typed field and measure accessors over [`FactRecord`].

use crate::generator::FactRecord;
use serde::{Deserialize, Serialize};
use std::borrow::Cow;
use std::fmt;

/// Categorical (filterable / groupable) fields.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Field {
    Year,
    Region,
    Country,
    ProductCategory,
    SubProductCategory,
    ProductType,
    BladeMaterial,
    HandleLength,
    Application,
    EndUser,
    DistributionChannelType,
    DistributionChannel,
    Brand,
    Company,
}

impl Field {
    pub const ALL: [Field; 14] = [
        Field::Year,
        Field::Region,
        Field::Country,
        Field::ProductCategory,
        Field::SubProductCategory,
        Field::ProductType,
        Field::BladeMaterial,
        Field::HandleLength,
        Field::Application,
        Field::EndUser,
        Field::DistributionChannelType,
        Field::DistributionChannel,
        Field::Brand,
        Field::Company,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Field::Year => "year",
            Field::Region => "region",
            Field::Country => "country",
            Field::ProductCategory => "productCategory",
            Field::SubProductCategory => "subProductCategory",
            Field::ProductType => "productType",
            Field::BladeMaterial => "bladeMaterial",
            Field::HandleLength => "handleLength",
            Field::Application => "application",
            Field::EndUser => "endUser",
            Field::DistributionChannelType => "distributionChannelType",
            Field::DistributionChannel => "distributionChannel",
            Field::Brand => "brand",
            Field::Company => "company",
        }
    }

    pub fn from_name(name: &str) -> Option<Field> {
        Field::ALL.iter().copied().find(|f| f.name() == name)
    }

    /// The field as text. Years compare by their decimal form.
    pub fn value(self, record: &FactRecord) -> Cow<'_, str> {
        let text = match self {
            Field::Year => return Cow::Owned(record.year.to_string()),
            Field::Region => &record.region,
            Field::Country => &record.country,
            Field::ProductCategory => &record.product_category,
            Field::SubProductCategory => &record.sub_product_category,
            Field::ProductType => &record.product_type,
            Field::BladeMaterial => &record.blade_material,
            Field::HandleLength => &record.handle_length,
            Field::Application => &record.application,
            Field::EndUser => &record.end_user,
            Field::DistributionChannelType => &record.distribution_channel_type,
            Field::DistributionChannel => &record.distribution_channel,
            Field::Brand => &record.brand,
            Field::Company => &record.company,
        };
        Cow::Borrowed(text.as_str())
    }

    /// (parent, child) fields for values that may arrive as `"Parent - Child"`.
    pub fn hierarchy(self) -> Option<(Field, Field)> {
        match self {
            Field::ProductType | Field::SubProductCategory | Field::ProductCategory => {
                Some((Field::ProductCategory, Field::SubProductCategory))
            }
            Field::Country | Field::Region => Some((Field::Region, Field::Country)),
            Field::DistributionChannel | Field::DistributionChannelType => {
                Some((Field::DistributionChannelType, Field::DistributionChannel))
            }
            _ => None,
        }
    }
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Numeric fields that can be summed into a series.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Measure {
    Price,
    VolumeUnits,
    Qty,
    Revenue,
    MarketValueUsd,
    Value,
    MarketSharePct,
    Cagr,
    YoyGrowth,
}

impl Measure {
    pub const ALL: [Measure; 9] = [
        Measure::Price,
        Measure::VolumeUnits,
        Measure::Qty,
        Measure::Revenue,
        Measure::MarketValueUsd,
        Measure::Value,
        Measure::MarketSharePct,
        Measure::Cagr,
        Measure::YoyGrowth,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Measure::Price => "price",
            Measure::VolumeUnits => "volumeUnits",
            Measure::Qty => "qty",
            Measure::Revenue => "revenue",
            Measure::MarketValueUsd => "marketValueUsd",
            Measure::Value => "value",
            Measure::MarketSharePct => "marketSharePct",
            Measure::Cagr => "cagr",
            Measure::YoyGrowth => "yoyGrowth",
        }
    }

    pub fn from_name(name: &str) -> Option<Measure> {
        Measure::ALL.iter().copied().find(|m| m.name() == name)
    }

    pub fn extract(self, record: &FactRecord) -> f64 {
        match self {
            Measure::Price => record.price,
            Measure::VolumeUnits => record.volume_units as f64,
            Measure::Qty => record.qty as f64,
            Measure::Revenue => record.revenue,
            Measure::MarketValueUsd => record.market_value_usd,
            Measure::Value => record.value,
            Measure::MarketSharePct => record.market_share_pct,
            Measure::Cagr => record.cagr,
            Measure::YoyGrowth => record.yoy_growth,
        }
    }
}

impl fmt::Display for Measure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
