use std::cmp::Ordering;
use std::collections::BTreeSet;

use serde::Serialize;

use crate::data::model::{LabeledTable, TIME_COLUMN};
use crate::error::AnalysisError;

/// Pearson correlation of two equally long samples.
///
/// Only positions where both samples are present (not NaN) take part. NaN
/// when fewer than two such positions remain or either sample is constant
/// over them. Clamped to [-1, 1] against rounding.
pub fn pearson(x: &[f64], y: &[f64]) -> f64 {
    let pairs: Vec<(f64, f64)> = x
        .iter()
        .zip(y)
        .filter(|(xi, yi)| !xi.is_nan() && !yi.is_nan())
        .map(|(&xi, &yi)| (xi, yi))
        .collect();
    let n = pairs.len();
    if n < 2 {
        return f64::NAN;
    }
    let mean_x = pairs.iter().map(|p| p.0).sum::<f64>() / n as f64;
    let mean_y = pairs.iter().map(|p| p.1).sum::<f64>() / n as f64;

    let (cov, var_x, var_y) = pairs
        .iter()
        .fold((0.0, 0.0, 0.0), |(cov, vx, vy), &(xi, yi)| {
            let dx = xi - mean_x;
            let dy = yi - mean_y;
            (cov + dx * dy, vx + dx * dx, vy + dy * dy)
        });

    if var_x == 0.0 || var_y == 0.0 {
        return f64::NAN;
    }
    (cov / (var_x.sqrt() * var_y.sqrt())).clamp(-1.0, 1.0)
}

/// Correlation coefficient of one unordered pair of variables.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CorrelationEntry {
    pub first: String,
    pub second: String,
    pub coefficient: f64,
}

/// Pairwise correlations ranked by descending magnitude.
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct CorrelationTable {
    entries: Vec<CorrelationEntry>,
}

impl CorrelationTable {
    pub fn entries(&self) -> &[CorrelationEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Coefficient for a pair, in either order.
    pub fn get(&self, a: &str, b: &str) -> Option<f64> {
        self.entries
            .iter()
            .find(|e| (e.first == a && e.second == b) || (e.first == b && e.second == a))
            .map(|e| e.coefficient)
    }

    /// Copy without entries whose coefficient is NaN or infinite.
    pub fn finite(&self) -> Self {
        Self {
            entries: self
                .entries
                .iter()
                .filter(|e| e.coefficient.is_finite())
                .cloned()
                .collect(),
        }
    }
}

// Descending |coefficient|, non-finite entries last.
fn by_magnitude(a: &CorrelationEntry, b: &CorrelationEntry) -> Ordering {
    let key = |e: &CorrelationEntry| {
        if e.coefficient.is_nan() {
            f64::NEG_INFINITY
        } else {
            e.coefficient.abs()
        }
    };
    key(b).total_cmp(&key(a))
}

/// Rank the pairwise Pearson correlations of every variable except `time`.
///
/// One entry per unordered pair of distinct labels, in the order the pair is
/// first met when walking the correlation matrix row by row; the stable sort
/// by magnitude keeps that order among ties.
pub fn rank_correlations(table: &LabeledTable) -> Result<CorrelationTable, AnalysisError> {
    let data = table.without_column(TIME_COLUMN)?;
    let columns = data.columns();

    let mut seen: BTreeSet<(&str, &str)> = BTreeSet::new();
    let mut entries = Vec::new();
    for a in columns {
        for b in columns {
            if a.name == b.name {
                continue;
            }
            let key = if a.name < b.name {
                (a.name.as_str(), b.name.as_str())
            } else {
                (b.name.as_str(), a.name.as_str())
            };
            if !seen.insert(key) {
                continue;
            }
            entries.push(CorrelationEntry {
                first: a.name.clone(),
                second: b.name.clone(),
                coefficient: pearson(&a.values, &b.values),
            });
        }
    }

    entries.sort_by(by_magnitude);
    Ok(CorrelationTable { entries })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::model::Column;

    fn populations() -> LabeledTable {
        LabeledTable::new(vec![
            Column::new("time", vec![0.0, 1.0, 2.0, 3.0, 4.0]),
            Column::new("x", vec![1.0, 2.0, 3.0, 4.0, 5.0]),
            Column::new("y", vec![2.0, 1.0, 4.0, 3.0, 5.0]),
            Column::new("c", vec![1.0, 1.0, 1.0, 1.0, 1.0]),
            Column::new("z", vec![3.0, 5.0, 4.0, 1.0, 2.0]),
        ])
        .unwrap()
    }

    #[test]
    fn pearson_basics() {
        assert!((pearson(&[1.0, 2.0, 3.0], &[2.0, 4.0, 6.0]) - 1.0).abs() < 1e-12);
        assert!((pearson(&[1.0, 2.0, 3.0], &[3.0, 2.0, 1.0]) + 1.0).abs() < 1e-12);
        assert!(pearson(&[1.0, 1.0], &[1.0, 2.0]).is_nan());
        assert!(pearson(&[1.0], &[2.0]).is_nan());
    }

    #[test]
    fn pearson_uses_rows_where_both_are_present() {
        // The NaN row is dropped from both samples; the rest is perfectly anti-correlated.
        let r = pearson(&[1.0, 2.0, 100.0, 3.0], &[3.0, 2.0, f64::NAN, 1.0]);
        assert!((r + 1.0).abs() < 1e-12, "{r}");
        assert!(pearson(&[1.0, f64::NAN], &[f64::NAN, 2.0]).is_nan());
    }

    #[test]
    fn ties_keep_row_major_order() {
        // corr(a, b) = -0.5, corr(a, c) = 0.5, corr(b, c) = 0.5
        let table = LabeledTable::new(vec![
            Column::new("time", vec![0.0, 1.0, 2.0]),
            Column::new("a", vec![1.0, -1.0, 0.0]),
            Column::new("b", vec![0.0, 1.0, -1.0]),
            Column::new("c", vec![1.0, 0.0, -1.0]),
        ])
        .unwrap();
        let ranked = rank_correlations(&table).unwrap();
        let got: Vec<(&str, &str, f64)> = ranked
            .entries()
            .iter()
            .map(|e| (e.first.as_str(), e.second.as_str(), e.coefficient))
            .collect();
        let want = [("a", "b", -0.5), ("a", "c", 0.5), ("b", "c", 0.5)];
        assert_eq!(got.len(), want.len());
        for ((f, s, c), (wf, ws, wc)) in got.into_iter().zip(want) {
            assert_eq!((f, s), (wf, ws));
            assert!((c - wc).abs() < 1e-12, "{f},{s}: {c} vs {wc}");
        }
    }

    #[test]
    fn ranked_by_magnitude_with_sign() {
        let ranked = rank_correlations(&populations()).unwrap();
        // 4 variables → 6 unordered pairs, no self pairs.
        assert_eq!(ranked.len(), 6);
        assert!(ranked.entries().iter().all(|e| e.first != e.second));

        let finite = ranked.finite();
        let pairs: Vec<(&str, &str)> = finite
            .entries()
            .iter()
            .map(|e| (e.first.as_str(), e.second.as_str()))
            .collect();
        assert_eq!(pairs, vec![("x", "y"), ("x", "z"), ("y", "z")]);

        let coefficients: Vec<f64> = finite.entries().iter().map(|e| e.coefficient).collect();
        for (got, want) in coefficients.iter().zip([0.8, -0.6, -0.5]) {
            assert!((got - want).abs() < 1e-12, "{got} vs {want}");
        }
    }

    #[test]
    fn constant_variables_sort_last() {
        let ranked = rank_correlations(&populations()).unwrap();
        let tail: Vec<&CorrelationEntry> = ranked.entries()[3..].iter().collect();
        assert!(tail.iter().all(|e| e.coefficient.is_nan()));
        assert!(tail.iter().all(|e| e.first == "c" || e.second == "c"));
        assert!(ranked.get("z", "x").is_some());
    }

    #[test]
    fn time_column_is_required() {
        let table = LabeledTable::new(vec![Column::new("x", vec![1.0, 2.0])]).unwrap();
        assert_eq!(
            rank_correlations(&table),
            Err(AnalysisError::MissingColumn("time".to_string()))
        );
    }
}
