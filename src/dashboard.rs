//! Dashboard - one filter selection in, every chart series out.

use crate::cache::FactCache;
use crate::dimensions::channel_group;
use crate::fields::{Field, Measure};
use crate::filter::{filter_options, filter_refs, FilterCriteria};
use crate::generator::FactRecord;
use crate::series::{
    bubble_series, by_field, measure_of, percentage_series, segment_year_series, stacked_share_series,
    waterfall_series, yoy_cagr_series, BubblePoint, GrowthPoint, PercentageSeries, SeriesResult,
    WaterfallOptions, WaterfallSeries,
};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::debug;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardQuery {
    #[serde(default)]
    pub criteria: FilterCriteria,
    pub segment: Field,
    pub measure: Measure,
    /// Explicit, ordered segment list; observed segments otherwise.
    #[serde(default)]
    pub segments: Option<Vec<String>>,
    #[serde(default)]
    pub waterfall: Option<WaterfallOptions>,
}

impl DashboardQuery {
    pub fn new(segment: Field, measure: Measure) -> Self {
        Self {
            criteria: FilterCriteria::new(),
            segment,
            measure,
            segments: None,
            waterfall: None,
        }
    }

    pub fn with_criteria(mut self, criteria: FilterCriteria) -> Self {
        self.criteria = criteria;
        self
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardView {
    pub record_count: usize,
    pub by_segment: SeriesResult,
    pub stacked: SeriesResult,
    pub percentage: PercentageSeries,
    pub waterfall: WaterfallSeries,
    pub growth: Vec<GrowthPoint>,
    pub bubbles: Vec<BubblePoint>,
    /// Offline / Online split of the selection.
    pub channel_groups: SeriesResult,
}

#[derive(Debug, Clone)]
pub struct Dashboard {
    cache: Arc<FactCache>,
}

impl Dashboard {
    pub fn new(cache: Arc<FactCache>) -> Self {
        Self { cache }
    }

    pub fn cache(&self) -> &Arc<FactCache> {
        &self.cache
    }

    pub fn view(&self, query: &DashboardQuery) -> DashboardView {
        let table = self.cache.get();
        self.build_view(&table, query)
    }

    /// Same as [`Dashboard::view`], generating the table off the async
    /// executor when it is not cached yet.
    pub async fn view_async(&self, query: &DashboardQuery) -> DashboardView {
        let table = self.cache.clone().get_async().await;
        self.build_view(&table, query)
    }

    /// Dropdown values for every filterable field.
    pub fn options(&self) -> BTreeMap<Field, Vec<String>> {
        filter_options(&self.cache.get())
    }

    fn build_view(&self, table: &[FactRecord], query: &DashboardQuery) -> DashboardView {
        let filtered = filter_refs(table, &query.criteria);
        debug!(
            "Building {} by {} view over {} records",
            query.measure,
            query.segment,
            filtered.len()
        );

        let field = query.segment;
        let measure = query.measure;
        let segment = |r: &&FactRecord| Some(field.value(r).into_owned());
        let value = |r: &&FactRecord| measure.extract(r);
        let explicit = query.segments.as_deref();
        let waterfall_options = query.waterfall.unwrap_or_else(|| WaterfallOptions {
            default_increment: self.cache.generator().config().default_increment,
            ..Default::default()
        });

        DashboardView {
            record_count: filtered.len(),
            by_segment: segment_year_series(&filtered, segment, value, explicit),
            stacked: stacked_share_series(&filtered, segment, value, explicit),
            percentage: percentage_series(&filtered, segment, value, explicit),
            waterfall: waterfall_series(&filtered, segment, value, explicit, waterfall_options),
            growth: yoy_cagr_series(&filtered, value),
            bubbles: bubble_series(&filtered, by_field(field), measure_of(measure)),
            channel_groups: segment_year_series(
                &filtered,
                |r: &&FactRecord| Some(channel_group(&r.distribution_channel_type).as_str().to_string()),
                value,
                None,
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::GeneratorConfig;
    use crate::generator::FactGenerator;

    fn dashboard() -> Dashboard {
        let generator = FactGenerator::with_standard_tables(GeneratorConfig { year_count: 3, ..Default::default() });
        Dashboard::new(Arc::new(FactCache::new(generator)))
    }

    #[test]
    fn test_view_filters_before_aggregating() {
        let dashboard = dashboard();
        let query = DashboardQuery::new(Field::Country, Measure::Value)
            .with_criteria(FilterCriteria::new().select(Field::Region, ["Europe"]));
        let view = dashboard.view(&query);

        assert!(view.record_count > 0);
        assert_eq!(
            view.by_segment.segments,
            vec!["France", "Germany", "Italy", "United Kingdom"]
        );
        assert_eq!(view.by_segment.rows.len(), 3);
        assert_eq!(view.channel_groups.segments, vec!["Offline", "Online"]);
        assert_eq!(view.bubbles.len(), 4);
    }

    #[test]
    fn test_empty_selection_renders_empty_view() {
        let dashboard = dashboard();
        let query = DashboardQuery::new(Field::Region, Measure::Revenue)
            .with_criteria(FilterCriteria::new().select(Field::Region, ["Atlantis"]));
        let view = dashboard.view(&query);

        assert_eq!(view.record_count, 0);
        assert!(view.by_segment.rows.is_empty());
        assert!(view.percentage.points.is_empty());
        assert!(view.waterfall.rows.is_empty());
        assert!(view.growth.is_empty());
    }

    #[test]
    fn test_query_from_json() {
        let query: DashboardQuery = serde_json::from_str(
            r#"{"segment": "productCategory", "measure": "revenue", "criteria": {"year": ["2020"]}}"#,
        )
        .unwrap();
        assert_eq!(query.segment, Field::ProductCategory);
        assert!(!query.criteria.is_empty());
    }

    #[tokio::test]
    async fn test_view_async_matches_sync() {
        let dashboard = dashboard();
        let query = DashboardQuery::new(Field::ProductCategory, Measure::Revenue);
        let async_view = dashboard.view_async(&query).await;
        let sync_view = dashboard.view(&query);
        assert_eq!(async_view, sync_view);
    }
}
