use std::fmt;

use num_complex::Complex64;
use serde::{Deserialize, Serialize};

use crate::error::AnalysisError;

/// Name of the designated time column in labeled tables.
pub const TIME_COLUMN: &str = "time";

// ---------------------------------------------------------------------------
// Column / LabeledTable – named variables, column-major
// ---------------------------------------------------------------------------

/// One named variable of a [`LabeledTable`].
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Column {
    pub name: String,
    pub values: Vec<f64>,
}

impl Column {
    pub fn new(name: impl Into<String>, values: Vec<f64>) -> Self {
        Self {
            name: name.into(),
            values,
        }
    }
}

/// Named columns of equal length, one variable per column.
///
/// Mirrors a whitespace-delimited simulation output file such as `expec.t`:
/// the header provides the labels, every line below it is one sample.
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct LabeledTable {
    columns: Vec<Column>,
}

impl LabeledTable {
    /// Build a table, checking that every column has the same length.
    pub fn new(columns: Vec<Column>) -> Result<Self, AnalysisError> {
        if let Some(first) = columns.first() {
            let expected = first.values.len();
            if let Some(bad) = columns.iter().find(|c| c.values.len() != expected) {
                return Err(AnalysisError::ShapeMismatch(format!(
                    "column '{}' has {} samples but '{}' has {expected}",
                    bad.name,
                    bad.values.len(),
                    first.name
                )));
            }
        }
        Ok(Self { columns })
    }

    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    /// Column labels in table order.
    pub fn labels(&self) -> Vec<String> {
        self.columns.iter().map(|c| c.name.clone()).collect()
    }

    pub fn column(&self, name: &str) -> Option<&Column> {
        self.columns.iter().find(|c| c.name == name)
    }

    /// Number of variables (columns).
    pub fn width(&self) -> usize {
        self.columns.len()
    }

    /// Number of samples (rows).
    pub fn len(&self) -> usize {
        self.columns.first().map_or(0, |c| c.values.len())
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Copy of the table without the named column.
    pub fn without_column(&self, name: &str) -> Result<Self, AnalysisError> {
        if self.column(name).is_none() {
            return Err(AnalysisError::MissingColumn(name.to_string()));
        }
        Ok(self.filter_columns(|c| c.name != name))
    }

    /// Copy holding only the columns accepted by `keep`.
    pub(crate) fn filter_columns(&self, mut keep: impl FnMut(&Column) -> bool) -> Self {
        Self {
            columns: self.columns.iter().filter(|&c| keep(c)).cloned().collect(),
        }
    }

    /// Sample row `i` across all columns.
    pub fn row(&self, i: usize) -> Vec<f64> {
        self.columns.iter().map(|c| c.values[i]).collect()
    }

    /// Reinterpret the table as a positional matrix: one matrix row per column.
    ///
    /// For a file read row-by-row this is the transpose of the file layout,
    /// so row 0 of the matrix is the leading time column.
    pub fn to_matrix(&self) -> PositionalMatrix {
        PositionalMatrix {
            rows: self.columns.iter().map(|c| c.values.clone()).collect(),
            positions: (0..self.columns.len()).collect(),
        }
    }
}

impl fmt::Display for LabeledTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} columns x {} samples [", self.width(), self.len())?;
        for (i, c) in self.columns.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{}", c.name)?;
        }
        write!(f, "]")
    }
}

// ---------------------------------------------------------------------------
// PositionalMatrix – unnamed variables, row-major
// ---------------------------------------------------------------------------

/// Real matrix with one variable per row.
///
/// Used as the time-series layout: row 0 is the time axis, the remaining rows
/// hold signal values. Every row remembers the position it had in the matrix
/// the caller originally built, so reduced copies keep reporting the caller's
/// indices.
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct PositionalMatrix {
    rows: Vec<Vec<f64>>,
    positions: Vec<usize>,
}

impl PositionalMatrix {
    /// Build a matrix from equal-length rows; positions are `0..rows.len()`.
    pub fn from_rows(rows: Vec<Vec<f64>>) -> Result<Self, AnalysisError> {
        if let Some(first) = rows.first() {
            let expected = first.len();
            if let Some((i, bad)) = rows.iter().enumerate().find(|(_, r)| r.len() != expected) {
                return Err(AnalysisError::ShapeMismatch(format!(
                    "row {i} has {} columns, expected {expected}",
                    bad.len()
                )));
            }
        }
        let positions = (0..rows.len()).collect();
        Ok(Self { rows, positions })
    }

    pub(crate) fn from_parts(rows: Vec<Vec<f64>>, positions: Vec<usize>) -> Self {
        debug_assert_eq!(rows.len(), positions.len());
        Self { rows, positions }
    }

    pub fn rows(&self) -> &[Vec<f64>] {
        &self.rows
    }

    /// Original position of every row.
    pub fn positions(&self) -> &[usize] {
        &self.positions
    }

    pub fn row(&self, i: usize) -> Option<&[f64]> {
        self.rows.get(i).map(Vec::as_slice)
    }

    /// Number of rows (variables).
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Number of columns (samples per row).
    pub fn width(&self) -> usize {
        self.rows.first().map_or(0, Vec::len)
    }

    /// Copy without the first `n` rows.
    pub fn skip_rows(&self, n: usize) -> Self {
        let n = n.min(self.rows.len());
        Self {
            rows: self.rows[n..].to_vec(),
            positions: self.positions[n..].to_vec(),
        }
    }

    /// Copy with every NaN replaced by zero and infinities by the largest finite values.
    pub fn nan_to_num(&self) -> Self {
        let rows = self
            .rows
            .iter()
            .map(|r| {
                r.iter()
                    .map(|&v| {
                        if v.is_nan() {
                            0.0
                        } else if v == f64::INFINITY {
                            f64::MAX
                        } else if v == f64::NEG_INFINITY {
                            f64::MIN
                        } else {
                            v
                        }
                    })
                    .collect()
            })
            .collect();
        Self {
            rows,
            positions: self.positions.clone(),
        }
    }
}

// ---------------------------------------------------------------------------
// DataContainer – the two shapes a run can operate on
// ---------------------------------------------------------------------------

/// Shape of the data a run type works with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ContainerKind {
    Table,
    Matrix,
}

/// Loaded simulation output in one of the two supported shapes.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum DataContainer {
    Table(LabeledTable),
    Matrix(PositionalMatrix),
}

impl DataContainer {
    /// Convert a freshly loaded table into the requested shape.
    pub fn from_table(table: LabeledTable, kind: ContainerKind) -> Self {
        match kind {
            ContainerKind::Table => DataContainer::Table(table),
            ContainerKind::Matrix => DataContainer::Matrix(table.to_matrix()),
        }
    }

    pub fn kind(&self) -> ContainerKind {
        match self {
            DataContainer::Table(_) => ContainerKind::Table,
            DataContainer::Matrix(_) => ContainerKind::Matrix,
        }
    }
}

// ---------------------------------------------------------------------------
// StateVectors / SignalSeries – inputs of the numerical engine
// ---------------------------------------------------------------------------

/// State-vector matrix: rows are states, columns are time steps.
#[derive(Debug, Clone, PartialEq)]
pub enum StateVectors {
    /// Real-valued data that has not been recombined into complex amplitudes.
    Real(Vec<Vec<f64>>),
    Complex(Vec<Vec<Complex64>>),
}

impl StateVectors {
    /// Name of the element type, for diagnostics.
    pub fn element_type(&self) -> &'static str {
        match self {
            StateVectors::Real(_) => "f64",
            StateVectors::Complex(_) => "Complex64",
        }
    }
}

/// Time axis plus one or more signal rows sampled on it.
#[derive(Debug, Clone, PartialEq)]
pub struct SignalSeries<T> {
    pub time: Vec<f64>,
    pub signals: Vec<Vec<T>>,
}

impl<T> SignalSeries<T> {
    pub fn new(time: Vec<f64>, signals: Vec<Vec<T>>) -> Self {
        Self { time, signals }
    }

    /// Time axis with a single signal row.
    pub fn single(time: Vec<f64>, signal: Vec<T>) -> Self {
        Self {
            time,
            signals: vec![signal],
        }
    }
}

impl SignalSeries<f64> {
    /// Split a time-series matrix: row 0 is the time axis, the rest are signals.
    pub fn from_matrix(matrix: &PositionalMatrix) -> Result<Self, AnalysisError> {
        let (time, signals) = matrix.rows().split_first().ok_or_else(|| {
            AnalysisError::ShapeMismatch("time-series matrix has no time row".to_string())
        })?;
        Ok(Self {
            time: time.clone(),
            signals: signals.to_vec(),
        })
    }
}
