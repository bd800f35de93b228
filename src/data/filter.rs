use serde::Serialize;

use super::model::{DataContainer, LabeledTable, PositionalMatrix};

// ---------------------------------------------------------------------------
// Variables – what the significance filter needs from a container
// ---------------------------------------------------------------------------

/// A container of named or numbered variables, each sampled many times.
pub trait Variables: Sized {
    /// How a variable is identified to the caller.
    type Id: Clone + PartialEq;

    /// Variable identifiers in container order.
    fn identifiers(&self) -> Vec<Self::Id>;

    /// Sample variance of every variable, in container order.
    fn variances(&self) -> Vec<f64>;

    /// Copy of the container without the given variables.
    fn drop_variables(&self, dropped: &[Self::Id]) -> Self;
}

/// Unbiased sample variance (divisor `n - 1`) over the non-NaN samples.
///
/// Missing samples (NaN) are skipped. Fewer than two present samples gives
/// NaN, which never passes a threshold comparison.
pub fn sample_variance(values: &[f64]) -> f64 {
    let present = || values.iter().copied().filter(|v| !v.is_nan());
    let n = present().count();
    if n < 2 {
        return f64::NAN;
    }
    let mean = present().sum::<f64>() / n as f64;
    let sum_sq: f64 = present().map(|v| (v - mean) * (v - mean)).sum();
    sum_sq / (n - 1) as f64
}

impl Variables for LabeledTable {
    type Id = String;

    fn identifiers(&self) -> Vec<String> {
        self.labels()
    }

    fn variances(&self) -> Vec<f64> {
        self.columns()
            .iter()
            .map(|c| sample_variance(&c.values))
            .collect()
    }

    fn drop_variables(&self, dropped: &[String]) -> Self {
        self.filter_columns(|c| !dropped.contains(&c.name))
    }
}

impl Variables for PositionalMatrix {
    type Id = usize;

    fn identifiers(&self) -> Vec<usize> {
        self.positions().to_vec()
    }

    fn variances(&self) -> Vec<f64> {
        self.rows().iter().map(|r| sample_variance(r)).collect()
    }

    fn drop_variables(&self, dropped: &[usize]) -> Self {
        let (rows, positions) = self
            .rows()
            .iter()
            .zip(self.positions())
            .filter(|(_, p)| !dropped.contains(p))
            .map(|(r, &p)| (r.clone(), p))
            .unzip();
        PositionalMatrix::from_parts(rows, positions)
    }
}

/// Keep the variables whose sample variance is strictly greater than `threshold`.
///
/// Returns the reduced copy and the retained identifiers in original order.
/// The input is left untouched.
pub fn filter<V: Variables>(data: &V, threshold: f64) -> (V, Vec<V::Id>) {
    let mut retained = Vec::new();
    let mut dropped = Vec::new();
    for (id, var) in data.identifiers().into_iter().zip(data.variances()) {
        if var > threshold {
            retained.push(id);
        } else {
            dropped.push(id);
        }
    }
    (data.drop_variables(&dropped), retained)
}

// ---------------------------------------------------------------------------
// SignificanceMask – container-shaped view of the retained identifiers
// ---------------------------------------------------------------------------

/// Identifiers of the variables that survived the significance filter.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum SignificanceMask {
    /// Column labels, for table input.
    Labels(Vec<String>),
    /// Original row positions, for matrix input.
    Positions(Vec<usize>),
}

impl SignificanceMask {
    pub fn len(&self) -> usize {
        match self {
            SignificanceMask::Labels(l) => l.len(),
            SignificanceMask::Positions(p) => p.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Apply the significance filter to whichever shape was loaded.
pub fn check_significance(data: &DataContainer, threshold: f64) -> (DataContainer, SignificanceMask) {
    match data {
        DataContainer::Table(table) => {
            let (reduced, labels) = filter(table, threshold);
            (DataContainer::Table(reduced), SignificanceMask::Labels(labels))
        }
        DataContainer::Matrix(matrix) => {
            let (reduced, positions) = filter(matrix, threshold);
            (
                DataContainer::Matrix(reduced),
                SignificanceMask::Positions(positions),
            )
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::model::Column;

    fn expec_table() -> LabeledTable {
        LabeledTable::new(vec![
            Column::new("time", vec![0.0, 0.1, 0.2, 0.3]),
            Column::new("norm", vec![1.0, 1.0, 1.0, 1.0]),
            Column::new("<H>", vec![-1.0, -1.1, -0.9, -1.05]),
            Column::new("<x>", vec![0.0, 0.0, 0.0, 0.0]),
            Column::new("<z>", vec![0.1, 0.3, -0.2, 0.0]),
        ])
        .unwrap()
    }

    #[test]
    fn sample_variance_uses_n_minus_one() {
        assert!((sample_variance(&[1.0, 2.0, 3.0, 4.0]) - 5.0 / 3.0).abs() < 1e-12);
        assert!(sample_variance(&[1.0]).is_nan());
        assert!(sample_variance(&[1.0, f64::NAN]).is_nan());
        assert!(sample_variance(&[]).is_nan());
    }

    #[test]
    fn missing_samples_are_skipped() {
        assert_eq!(sample_variance(&[1.0, f64::NAN, 3.0]), 2.0);

        let table = LabeledTable::new(vec![
            Column::new("time", vec![0.0, 1.0, 2.0, 3.0]),
            Column::new("1", vec![2.0, 2.0, 2.0, 2.0]),
            Column::new("2", vec![0.5, f64::NAN, 0.1, 0.3]),
        ])
        .unwrap();
        let (_, labels) = filter(&table, 1e-5);
        assert_eq!(labels, vec!["time", "2"]);
        let (_, positions) = filter(&table.to_matrix(), 1e-5);
        assert_eq!(positions, vec![0, 2]);
    }

    #[test]
    fn table_drops_constant_columns() {
        let table = expec_table();
        let (reduced, labels) = filter(&table, 1e-5);
        assert_eq!(labels, vec!["time", "<H>", "<z>"]);
        assert_eq!(reduced.labels(), labels);
        assert_eq!(reduced.column("<z>").unwrap().values, vec![0.1, 0.3, -0.2, 0.0]);
        // Source table is untouched.
        assert_eq!(table.width(), 5);
    }

    #[test]
    fn matrix_reports_original_positions() {
        let matrix = expec_table().to_matrix();
        let (reduced, positions) = filter(&matrix, 1e-5);
        assert_eq!(positions, vec![0, 2, 4]);
        assert_eq!(reduced.positions(), &[0, 2, 4]);
        assert_eq!(reduced.row(1).unwrap(), &[-1.0, -1.1, -0.9, -1.05]);
    }

    #[test]
    fn threshold_equality_is_excluded_in_both_shapes() {
        // Sample variance of [0, 2] is exactly 2.
        let table = LabeledTable::new(vec![
            Column::new("a", vec![0.0, 2.0]),
            Column::new("b", vec![0.0, 4.0]),
        ])
        .unwrap();
        let (_, labels) = filter(&table, 2.0);
        assert_eq!(labels, vec!["b"]);
        let (_, positions) = filter(&table.to_matrix(), 2.0);
        assert_eq!(positions, vec![1]);
    }

    #[test]
    fn refiltering_is_a_no_op() {
        let matrix = expec_table().to_matrix();
        let once = filter(&matrix, 1e-5);
        let twice = filter(&once.0, 1e-5);
        assert_eq!(once, twice);
    }

    #[test]
    fn check_significance_dispatches_on_shape() {
        let (reduced, mask) = check_significance(&DataContainer::Table(expec_table()), 1e-5);
        assert!(matches!(reduced, DataContainer::Table(_)));
        assert_eq!(
            mask,
            SignificanceMask::Labels(vec!["time".into(), "<H>".into(), "<z>".into()])
        );

        let (reduced, mask) =
            check_significance(&DataContainer::Matrix(expec_table().to_matrix()), 1e-5);
        assert!(matches!(reduced, DataContainer::Matrix(_)));
        assert_eq!(mask, SignificanceMask::Positions(vec![0, 2, 4]));
        assert_eq!(mask.len(), 3);
    }
}
