use std::fmt;

use super::model::{COL_HUNV, COL_INCOME, COL_LILA, COL_SNAP, Dataset, TractRecord};

/// Summary statistics of one numeric column, as `DataFrame.describe()` reports them.
#[derive(Debug, Clone, PartialEq)]
pub struct ColumnSummary {
    pub column: &'static str,
    pub count: usize,
    pub mean: f64,
    /// Sample standard deviation (ddof = 1); NaN below two values.
    pub std: f64,
    pub min: f64,
    pub q25: f64,
    pub median: f64,
    pub q75: f64,
    pub max: f64,
}

impl ColumnSummary {
    fn from_values(column: &'static str, mut values: Vec<f64>) -> Self {
        let count = values.len();
        if count == 0 {
            return ColumnSummary {
                column,
                count,
                mean: f64::NAN,
                std: f64::NAN,
                min: f64::NAN,
                q25: f64::NAN,
                median: f64::NAN,
                q75: f64::NAN,
                max: f64::NAN,
            };
        }

        values.sort_by(f64::total_cmp);
        let n = count as f64;
        let mean = values.iter().sum::<f64>() / n;
        let std = if count < 2 {
            f64::NAN
        } else {
            let ss: f64 = values.iter().map(|v| (v - mean).powi(2)).sum();
            (ss / (n - 1.0)).sqrt()
        };

        ColumnSummary {
            column,
            count,
            mean,
            std,
            min: values[0],
            q25: quantile(&values, 0.25),
            median: quantile(&values, 0.5),
            q75: quantile(&values, 0.75),
            max: values[count - 1],
        }
    }
}

/// Linear interpolation between closest ranks of sorted, non-empty `values`.
fn quantile(sorted: &[f64], q: f64) -> f64 {
    let pos = q * (sorted.len() - 1) as f64;
    let lo = pos.floor() as usize;
    let hi = pos.ceil() as usize;
    sorted[lo] + (sorted[hi] - sorted[lo]) * (pos - lo as f64)
}

/// Descriptive statistics of the numeric tract columns over a subset.
#[derive(Debug, Clone, PartialEq)]
pub struct Description {
    pub columns: Vec<ColumnSummary>,
}

type Extractor = fn(&TractRecord) -> f64;

const NUMERIC_COLUMNS: [(&str, Extractor); 4] = [
    (COL_INCOME, |t: &TractRecord| t.median_family_income as f64),
    (COL_LILA, |t: &TractRecord| f64::from(t.lila_tracts_1_and_10)),
    (COL_SNAP, |t: &TractRecord| t.tract_snap),
    (COL_HUNV, |t: &TractRecord| f64::from(t.tract_hunv_flag)),
];

/// Describe the tracts at `indices`.
pub fn describe(dataset: &Dataset, indices: &[usize]) -> Description {
    let columns = NUMERIC_COLUMNS
        .iter()
        .map(|&(name, extract)| {
            let values = indices.iter().map(|&i| extract(&dataset.tracts[i])).collect();
            ColumnSummary::from_values(name, values)
        })
        .collect();
    Description { columns }
}

impl fmt::Display for Description {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        const WIDTH: usize = 20;
        write!(f, "{:<6}", "")?;
        for c in &self.columns {
            write!(f, "{:>WIDTH$}", c.column)?;
        }
        writeln!(f)?;

        write!(f, "{:<6}", "count")?;
        for c in &self.columns {
            write!(f, "{:>WIDTH$.6}", c.count as f64)?;
        }

        let rows: [(&str, fn(&ColumnSummary) -> f64); 7] = [
            ("mean", |c| c.mean),
            ("std", |c| c.std),
            ("min", |c| c.min),
            ("25%", |c| c.q25),
            ("50%", |c| c.median),
            ("75%", |c| c.q75),
            ("max", |c| c.max),
        ];
        for (label, get) in rows {
            writeln!(f)?;
            write!(f, "{label:<6}")?;
            for c in &self.columns {
                let v = get(c);
                if v.is_nan() {
                    write!(f, "{:>WIDTH$}", "NaN")?;
                } else {
                    write!(f, "{v:>WIDTH$.6}")?;
                }
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::filter::scenario_dataset;
    use pretty_assertions::assert_eq;

    #[test]
    fn describes_two_tracts() {
        let ds = scenario_dataset();
        let desc = describe(&ds, &[0, 1]);

        let income = &desc.columns[0];
        assert_eq!(income.column, "MedianFamilyIncome");
        assert_eq!(income.count, 2);
        assert_eq!(income.mean, 42_500.0);
        assert_eq!(income.min, 40_000.0);
        assert_eq!(income.q25, 41_250.0);
        assert_eq!(income.median, 42_500.0);
        assert_eq!(income.max, 45_000.0);
        assert!((income.std - 3_535.533_905_932_737_6).abs() < 1e-6);

        let snap = &desc.columns[2];
        assert!((snap.mean - 0.15).abs() < 1e-12);
    }

    #[test]
    fn single_row_has_nan_std() {
        let desc = describe(&scenario_dataset(), &[1]);
        assert!(desc.columns.iter().all(|c| c.std.is_nan()));
        assert_eq!(desc.columns[1].max, 0.0);
    }

    #[test]
    fn empty_subset_reports_zero_count() {
        let desc = describe(&scenario_dataset(), &[]);
        assert!(desc.columns.iter().all(|c| c.count == 0 && c.mean.is_nan()));
    }

    #[test]
    fn table_lists_every_statistic() {
        let text = describe(&scenario_dataset(), &[0, 1]).to_string();
        let labels: Vec<&str> = text
            .lines()
            .skip(1)
            .filter_map(|l| l.split_whitespace().next())
            .collect();
        assert_eq!(labels, vec!["count", "mean", "std", "min", "25%", "50%", "75%", "max"]);
        assert!(text.lines().next().unwrap().contains("TractHUNVFlag"));
        assert!(text.contains("42500.000000"));
        let count_row = text.lines().nth(1).unwrap();
        assert_eq!(count_row.split_whitespace().nth(1), Some("2.000000"));
    }
}
