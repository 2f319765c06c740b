use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// One persisted batch result. The raw measure is stored alongside the
/// decision so the decision can be re-derived at any threshold without
/// re-running detection; an invalid item keeps a NaN measure.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Row {
    pub path: String,
    pub measure: f32,
    pub with_glasses: u8,
}

impl Row {
    pub fn new(path: String, measure: f32, with_glasses: bool) -> Self {
        Self {
            path,
            measure,
            with_glasses: with_glasses as u8,
        }
    }

    /// Sentinel row for an item that produced no valid measurement.
    pub fn invalid(path: String) -> Self {
        Self {
            path,
            measure: f32::NAN,
            with_glasses: 0,
        }
    }
}

pub fn write_rows(path: &Path, rows: &[Row]) -> Result<()> {
    let mut writer =
        csv::Writer::from_path(path).with_context(|| format!("creating {}", path.display()))?;
    for row in rows {
        writer.serialize(row)?;
    }
    writer.flush()?;
    Ok(())
}

pub fn read_rows(path: &Path) -> Result<Vec<Row>> {
    let mut reader =
        csv::Reader::from_path(path).with_context(|| format!("opening {}", path.display()))?;
    reader
        .deserialize()
        .collect::<std::result::Result<Vec<Row>, _>>()
        .with_context(|| format!("parsing {}", path.display()))
}

/// Re-derive every decision from the stored measure. Purely a function of
/// (measure, threshold): NaN rows stay negative, detection is never
/// re-invoked.
pub fn reclassify(rows: &mut [Row], threshold: f32) {
    for row in rows.iter_mut() {
        row.with_glasses = (row.measure > threshold) as u8;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rows() -> Vec<Row> {
        vec![
            Row::new("a.jpg".into(), 0.05, false),
            Row::new("b.jpg".into(), 0.20, true),
            Row::invalid("c.jpg".into()),
        ]
    }

    #[test]
    fn test_reclassify_is_pure_over_stored_measures() {
        let mut rows = rows();
        let measures: Vec<f32> = rows.iter().map(|r| r.measure).collect();

        reclassify(&mut rows, 0.01);
        assert_eq!(
            rows.iter().map(|r| r.with_glasses).collect::<Vec<_>>(),
            [1, 1, 0]
        );

        reclassify(&mut rows, 0.5);
        assert_eq!(
            rows.iter().map(|r| r.with_glasses).collect::<Vec<_>>(),
            [0, 0, 0]
        );

        // Measures are untouched across threshold changes
        for (row, m) in rows.iter().zip(measures) {
            assert_eq!(row.measure.is_nan(), m.is_nan());
            if !m.is_nan() {
                assert_eq!(row.measure, m);
            }
        }
    }

    #[test]
    fn test_nan_rows_never_classify_positive() {
        let mut rows = vec![Row::invalid("x.png".into())];
        reclassify(&mut rows, -1.0);
        assert_eq!(rows[0].with_glasses, 0);
    }

    #[test]
    fn test_csv_round_trip_preserves_nan() {
        let path = std::env::temp_dir().join("glint_report_round_trip.csv");
        write_rows(&path, &rows()).unwrap();

        let back = read_rows(&path).unwrap();
        assert_eq!(back.len(), 3);
        assert_eq!(back[1].measure, 0.20);
        assert_eq!(back[1].with_glasses, 1);
        assert!(back[2].measure.is_nan());
        assert_eq!(back[2].with_glasses, 0);
    }
}
