//! Columnar view of the fact table (Polars) and file export.

use crate::error::{InsightsError, Result};
use crate::fields::{Field, Measure};
use crate::generator::FactRecord;
use polars::prelude::*;
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::path::Path;
use tracing::info;

/// Build a `DataFrame` with one column per record field, named by the
/// record's wire names (`recordId`, `year`, `productType`, ...).
pub fn facts_to_dataframe(records: &[FactRecord]) -> Result<DataFrame> {
    let mut columns = Vec::with_capacity(2 + Field::ALL.len() + Measure::ALL.len());
    columns.push(Series::new(
        "recordId",
        records.iter().map(|r| r.record_id).collect::<Vec<u64>>(),
    ));
    columns.push(Series::new("year", records.iter().map(|r| r.year).collect::<Vec<i32>>()));

    for field in Field::ALL.iter().filter(|f| **f != Field::Year) {
        let values: Vec<String> = records.iter().map(|r| field.value(r).into_owned()).collect();
        columns.push(Series::new(field.name(), values));
    }

    for measure in Measure::ALL {
        let series = match measure {
            Measure::VolumeUnits => Series::new(measure.name(), records.iter().map(|r| r.volume_units).collect::<Vec<i64>>()),
            Measure::Qty => Series::new(measure.name(), records.iter().map(|r| r.qty).collect::<Vec<i64>>()),
            other => Series::new(other.name(), records.iter().map(|r| other.extract(r)).collect::<Vec<f64>>()),
        };
        columns.push(series);
    }

    Ok(DataFrame::new(columns)?)
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct YearTotal {
    pub year: i32,
    pub segment: String,
    pub total: f64,
}

/// Sum of `measure` per (year, segment), sorted by year then segment.
pub fn yearly_totals(df: &DataFrame, segment: Field, measure: Measure) -> Result<Vec<YearTotal>> {
    if segment == Field::Year {
        return Err(InsightsError::Export("cannot group by year twice".to_string()));
    }
    let segment_col = segment.name();

    let grouped = df
        .clone()
        .lazy()
        .group_by([col("year"), col(segment_col)])
        .agg([col(measure.name()).cast(DataType::Float64).sum().alias("total")])
        .sort_by_exprs(
            vec![col("year"), col(segment_col)],
            SortMultipleOptions::default(),
        )
        .collect()?;

    let years = grouped.column("year")?.i32()?;
    let segments = grouped.column(segment_col)?.str()?;
    let totals = grouped.column("total")?.f64()?;

    let rows = years
        .into_iter()
        .zip(segments.into_iter())
        .zip(totals.into_iter())
        .filter_map(|((year, segment), total)| {
            Some(YearTotal {
                year: year?,
                segment: segment?.to_string(),
                total: total.unwrap_or(0.0),
            })
        })
        .collect();

    Ok(rows)
}

pub fn write_csv(df: &mut DataFrame, path: impl AsRef<Path>) -> Result<()> {
    let path = path.as_ref();
    let mut file = File::create(path)?;
    CsvWriter::new(&mut file).include_header(true).finish(df)?;
    info!("Wrote {} rows to {}", df.height(), path.display());
    Ok(())
}

pub fn write_parquet(df: &mut DataFrame, path: impl AsRef<Path>) -> Result<()> {
    let path = path.as_ref();
    let mut file = File::create(path)?;
    ParquetWriter::new(&mut file).finish(df)?;
    info!("Wrote {} rows to {}", df.height(), path.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::GeneratorConfig;
    use crate::generator::FactGenerator;

    fn records() -> Vec<FactRecord> {
        FactGenerator::with_standard_tables(GeneratorConfig { year_count: 2, ..Default::default() })
            .generate()
            .unwrap()
    }

    #[test]
    fn test_dataframe_shape() {
        let records = records();
        let df = facts_to_dataframe(&records).unwrap();
        assert_eq!(df.height(), records.len());
        // recordId + 14 fields + 9 measures
        assert_eq!(df.width(), 24);
        assert!(df.column("productType").is_ok());
    }

    #[test]
    fn test_yearly_totals_sorted() {
        let records = records();
        let df = facts_to_dataframe(&records).unwrap();
        let totals = yearly_totals(&df, Field::Region, Measure::Revenue).unwrap();
        assert_eq!(totals.len(), 2 * 5);
        assert_eq!(totals[0].year, 2020);
        assert!(totals.windows(2).all(|w| (w[0].year, &w[0].segment) <= (w[1].year, &w[1].segment)));
    }

    #[test]
    fn test_group_by_year_rejected() {
        let df = facts_to_dataframe(&records()).unwrap();
        assert!(yearly_totals(&df, Field::Year, Measure::Value).is_err());
    }

    #[test]
    fn test_write_csv_and_parquet_round_trip() {
        let records = records();
        let mut df = facts_to_dataframe(&records).unwrap();
        let dir = std::env::temp_dir().join("market_insights_frame_test");
        std::fs::create_dir_all(&dir).unwrap();

        let csv_path = dir.join("facts.csv");
        write_csv(&mut df, &csv_path).unwrap();
        let mut reader = csv::Reader::from_path(&csv_path).unwrap();
        let headers = reader.headers().unwrap().clone();
        assert_eq!(headers.get(0), Some("recordId"));
        assert!(headers.iter().any(|h| h == "productType"));
        assert_eq!(reader.records().count(), records.len());

        let parquet_path = dir.join("facts.parquet");
        write_parquet(&mut df, &parquet_path).unwrap();
        let read_back = ParquetReader::new(File::open(&parquet_path).unwrap()).finish().unwrap();
        assert_eq!(read_back.shape(), df.shape());
        assert_eq!(read_back.get_column_names(), df.get_column_names());
    }
}
