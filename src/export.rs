//! CSV export of chart series.

use crate::error::Result;
use crate::series::{PercentageSeries, SeriesResult};
use std::io::Write;

/// `year,<segment...>` header followed by one line per year.
pub fn write_series_csv<W: Write>(series: &SeriesResult, writer: W) -> Result<()> {
    let mut csv = csv::Writer::from_writer(writer);

    let mut header = Vec::with_capacity(series.segments.len() + 1);
    header.push("year".to_string());
    header.extend(series.segments.iter().cloned());
    csv.write_record(&header)?;

    for row in &series.rows {
        let mut record = Vec::with_capacity(header.len());
        record.push(row.year.clone());
        record.extend(series.segments.iter().map(|s| row.get(s).to_string()));
        csv.write_record(&record)?;
    }

    csv.flush()?;
    Ok(())
}

/// Long format: `year,segment,value`.
pub fn write_percentage_csv<W: Write>(series: &PercentageSeries, writer: W) -> Result<()> {
    let mut csv = csv::Writer::from_writer(writer);
    for point in &series.points {
        csv.serialize(point)?;
    }
    csv.flush()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::series::{PercentagePoint, SeriesRow};
    use std::collections::BTreeMap;

    #[test]
    fn test_series_csv_layout() {
        let series = SeriesResult {
            rows: vec![SeriesRow {
                year: "2024".to_string(),
                values: BTreeMap::from([("X".to_string(), 10.0), ("Y".to_string(), 30.5)]),
            }],
            segments: vec!["Y".to_string(), "X".to_string()],
        };
        let mut out = Vec::new();
        write_series_csv(&series, &mut out).unwrap();
        assert_eq!(String::from_utf8(out).unwrap(), "year,Y,X\n2024,30.5,10\n");
    }

    #[test]
    fn test_percentage_csv_has_header() {
        let series = PercentageSeries {
            points: vec![PercentagePoint { year: 2024, segment: "X".to_string(), value: 25.0 }],
            segments: vec!["X".to_string()],
        };
        let mut out = Vec::new();
        write_percentage_csv(&series, &mut out).unwrap();
        assert_eq!(String::from_utf8(out).unwrap(), "year,segment,value\n2024,X,25.0\n");
    }
}
