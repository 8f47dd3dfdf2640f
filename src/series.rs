//! Aggregation Engine - chart-ready series from filtered records
//!
//! Every function is pure and total: an empty input produces an empty (or
//! all-zero) series, and a zero yearly total yields zero percentages.
//! Years are always ascending. Segments are sorted lexicographically unless
//! the caller passes an explicit list, whose order is kept.

use crate::fields::{Field, Measure};
use crate::generator::FactRecord;
use serde::{Deserialize, Serialize};
use std::borrow::Borrow;
use std::collections::{BTreeMap, BTreeSet};

/// Anything that belongs to a year.
pub trait YearKeyed {
    fn year(&self) -> i32;
}

impl YearKeyed for FactRecord {
    fn year(&self) -> i32 {
        self.year
    }
}

impl<T: YearKeyed + ?Sized> YearKeyed for &T {
    fn year(&self) -> i32 {
        (**self).year()
    }
}

/// Segment extractor for a categorical field.
pub fn by_field(field: Field) -> impl Fn(&FactRecord) -> Option<String> {
    move |record: &FactRecord| Some(field.value(record).into_owned())
}

/// Measure extractor for a numeric field.
pub fn measure_of(measure: Measure) -> impl Fn(&FactRecord) -> f64 {
    move |record: &FactRecord| measure.extract(record)
}

/// One year of a per-segment series. Serializes flat:
/// `{"year": "2024", "Europe": 10.0, ...}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SeriesRow {
    pub year: String,
    #[serde(flatten)]
    pub values: BTreeMap<String, f64>,
}

impl SeriesRow {
    pub fn get(&self, segment: &str) -> f64 {
        self.values.get(segment).copied().unwrap_or(0.0)
    }

    pub fn total(&self) -> f64 {
        self.values.values().sum()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SeriesResult {
    pub rows: Vec<SeriesRow>,
    pub segments: Vec<String>,
}

impl SeriesResult {
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

type YearSegmentSums = BTreeMap<i32, BTreeMap<String, f64>>;

fn group_sums<T, S, M>(records: &[T], segment: &S, measure: &M) -> (YearSegmentSums, BTreeSet<String>)
where
    T: YearKeyed,
    S: Fn(&T) -> Option<String>,
    M: Fn(&T) -> f64,
{
    let mut sums: YearSegmentSums = BTreeMap::new();
    let mut observed = BTreeSet::new();
    for record in records {
        let year_entry = sums.entry(record.year()).or_default();
        let Some(key) = segment(record) else {
            continue;
        };
        *year_entry.entry(key.clone()).or_insert(0.0) += measure(record);
        observed.insert(key);
    }
    (sums, observed)
}

fn resolve_segments(observed: BTreeSet<String>, explicit: Option<&[String]>) -> Vec<String> {
    match explicit {
        Some(list) => {
            let mut seen = BTreeSet::new();
            list.iter().filter(|s| seen.insert(s.as_str())).cloned().collect()
        }
        None => observed.into_iter().collect(),
    }
}

/// One row per year, one column per segment, cell = sum of the measure.
pub fn segment_year_series<T, S, M>(records: &[T], segment: S, measure: M, explicit: Option<&[String]>) -> SeriesResult
where
    T: YearKeyed,
    S: Fn(&T) -> Option<String>,
    M: Fn(&T) -> f64,
{
    let (sums, observed) = group_sums(records, &segment, &measure);
    let segments = resolve_segments(observed, explicit);

    let rows = sums
        .into_iter()
        .map(|(year, by_segment)| SeriesRow {
            year: year.to_string(),
            values: segments
                .iter()
                .map(|s| (s.clone(), by_segment.get(s).copied().unwrap_or(0.0)))
                .collect(),
        })
        .collect();

    SeriesResult { rows, segments }
}

/// Like [`segment_year_series`], without segments that are zero in every year.
pub fn stacked_share_series<T, S, M>(records: &[T], segment: S, measure: M, explicit: Option<&[String]>) -> SeriesResult
where
    T: YearKeyed,
    S: Fn(&T) -> Option<String>,
    M: Fn(&T) -> f64,
{
    let mut series = segment_year_series(records, segment, measure, explicit);
    let active: Vec<String> = series
        .segments
        .iter()
        .filter(|s| series.rows.iter().any(|row| row.get(s) != 0.0))
        .cloned()
        .collect();

    for row in &mut series.rows {
        row.values.retain(|key, _| active.contains(key));
    }
    series.segments = active;
    series
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PercentagePoint {
    pub year: i32,
    pub segment: String,
    pub value: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PercentageSeries {
    pub points: Vec<PercentagePoint>,
    pub segments: Vec<String>,
}

/// Share of each segment in its year's total, in percent. A year whose total
/// is zero reports zero for every segment.
pub fn percentage_series<T, S, M>(records: &[T], segment: S, measure: M, explicit: Option<&[String]>) -> PercentageSeries
where
    T: YearKeyed,
    S: Fn(&T) -> Option<String>,
    M: Fn(&T) -> f64,
{
    let series = segment_year_series(records, segment, measure, explicit);
    let mut points = Vec::with_capacity(series.rows.len() * series.segments.len());

    for row in &series.rows {
        let year: i32 = row.year.parse().unwrap_or_default();
        let total = row.total();
        for segment in &series.segments {
            let value = if total == 0.0 { 0.0 } else { row.get(segment) / total * 100.0 };
            points.push(PercentagePoint {
                year,
                segment: segment.clone(),
                value,
            });
        }
    }

    PercentageSeries {
        points,
        segments: series.segments,
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WaterfallStep {
    Base,
    Increment,
    Total,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WaterfallRow {
    pub label: String,
    pub year: Option<i32>,
    pub step: WaterfallStep,
    /// Running total before this step (where the floating bar starts).
    pub start: f64,
    pub delta: f64,
    /// Running total after this step.
    pub total_value: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WaterfallSeries {
    pub rows: Vec<WaterfallRow>,
    pub base_value: f64,
    /// Sum of all yearly deltas (the incremental opportunity).
    pub total_increment: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WaterfallOptions {
    pub base_year: Option<i32>,
    pub end_year: Option<i32>,
    /// Delta used when a year or its predecessor has no records.
    pub default_increment: f64,
}

impl Default for WaterfallOptions {
    fn default() -> Self {
        Self {
            base_year: None,
            end_year: None,
            default_increment: crate::config::DEFAULT_WATERFALL_INCREMENT,
        }
    }
}

/// Base-year value followed by one increment per later year and a final
/// total row. Only records with a segment (and, if given, a segment in
/// `explicit`) count.
pub fn waterfall_series<T, S, M>(
    records: &[T],
    segment: S,
    measure: M,
    explicit: Option<&[String]>,
    options: WaterfallOptions,
) -> WaterfallSeries
where
    T: YearKeyed,
    S: Fn(&T) -> Option<String>,
    M: Fn(&T) -> f64,
{
    let mut totals: BTreeMap<i32, f64> = BTreeMap::new();
    for record in records {
        let Some(key) = segment(record) else {
            continue;
        };
        if explicit.map(|list| !list.contains(&key)).unwrap_or(false) {
            continue;
        }
        *totals.entry(record.year()).or_insert(0.0) += measure(record);
    }

    let (Some(&observed_first), Some(&observed_last)) = (totals.keys().next(), totals.keys().next_back()) else {
        return WaterfallSeries::default();
    };
    // Requested years are clamped to the observed range.
    let base_year = options.base_year.unwrap_or(observed_first).clamp(observed_first, observed_last);
    let end_year = options.end_year.unwrap_or(observed_last).clamp(observed_first, observed_last);

    let base_value = totals.get(&base_year).copied().unwrap_or(0.0);
    let mut rows = vec![WaterfallRow {
        label: base_year.to_string(),
        year: Some(base_year),
        step: WaterfallStep::Base,
        start: 0.0,
        delta: base_value,
        total_value: base_value,
    }];

    let mut running = base_value;
    let mut total_increment = 0.0;
    let increment_years = base_year.checked_add(1).map(|from| from..=end_year);
    for year in increment_years.into_iter().flatten() {
        let previous = year.checked_sub(1).and_then(|prev| totals.get(&prev));
        let delta = match (totals.get(&year), previous) {
            (Some(current), Some(previous)) => current - previous,
            _ => options.default_increment,
        };
        rows.push(WaterfallRow {
            label: year.to_string(),
            year: Some(year),
            step: WaterfallStep::Increment,
            start: running,
            delta,
            total_value: running + delta,
        });
        running += delta;
        total_increment += delta;
    }

    rows.push(WaterfallRow {
        label: "Total".to_string(),
        year: None,
        step: WaterfallStep::Total,
        start: 0.0,
        delta: total_increment,
        total_value: base_value + total_increment,
    });

    WaterfallSeries {
        rows,
        base_value,
        total_increment,
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GrowthPoint {
    pub year: i32,
    pub total: f64,
    /// Growth versus the previous year, percent; 0 without a usable base.
    pub yoy_pct: f64,
    /// Compound annual growth since the first year, percent.
    pub cagr_pct: f64,
}

/// Yearly totals with year-over-year growth and CAGR since the first year.
pub fn yoy_cagr_series<T, M>(records: &[T], measure: M) -> Vec<GrowthPoint>
where
    T: YearKeyed,
    M: Fn(&T) -> f64,
{
    let mut totals: BTreeMap<i32, f64> = BTreeMap::new();
    for record in records {
        *totals.entry(record.year()).or_insert(0.0) += measure(record);
    }

    let Some((&first_year, &first_total)) = totals.iter().next() else {
        return Vec::new();
    };

    let mut previous: Option<f64> = None;
    totals
        .iter()
        .map(|(&year, &total)| {
            let yoy_pct = match previous {
                Some(prev) if prev != 0.0 => (total - prev) / prev.abs() * 100.0,
                _ => 0.0,
            };
            let periods = (year - first_year) as f64;
            let cagr_pct = if periods > 0.0 && first_total > 0.0 && total > 0.0 {
                ((total / first_total).powf(1.0 / periods) - 1.0) * 100.0
            } else {
                0.0
            };
            previous = Some(total);
            GrowthPoint { year, total, yoy_pct, cagr_pct }
        })
        .collect()
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BubblePoint {
    pub segment: String,
    /// Summed measure, drawn as bubble size.
    pub size: f64,
    pub avg_market_share_pct: f64,
    pub avg_cagr: f64,
    pub record_count: usize,
}

/// One bubble per segment, sorted by segment.
pub fn bubble_series<R, S, M>(records: &[R], segment: S, measure: M) -> Vec<BubblePoint>
where
    R: Borrow<FactRecord>,
    S: Fn(&FactRecord) -> Option<String>,
    M: Fn(&FactRecord) -> f64,
{
    #[derive(Default)]
    struct Acc {
        size: f64,
        share: f64,
        cagr: f64,
        count: usize,
    }

    let mut groups: BTreeMap<String, Acc> = BTreeMap::new();
    for record in records {
        let record = record.borrow();
        let Some(key) = segment(record) else {
            continue;
        };
        let acc = groups.entry(key).or_default();
        acc.size += measure(record);
        acc.share += record.market_share_pct;
        acc.cagr += record.cagr;
        acc.count += 1;
    }

    groups
        .into_iter()
        .map(|(segment, acc)| {
            let n = acc.count.max(1) as f64;
            BubblePoint {
                segment,
                size: acc.size,
                avg_market_share_pct: acc.share / n,
                avg_cagr: acc.cagr / n,
                record_count: acc.count,
            }
        })
        .collect()
}
