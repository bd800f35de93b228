//! Discrete Fourier transform of time series.
//!
//! Forward, unnormalised transform without windowing or zero-padding:
//! `X[k] = Σ_n x[n] · exp(-2πi·k·n / T)` with `T` the number of time samples.
//! Frequencies are in cycles per sample step.

use log::warn;
use num_complex::Complex64;
use rustfft::FftPlanner;
use serde::{Deserialize, Serialize};

use crate::data::model::SignalSeries;
use crate::error::AnalysisError;

/// Which part of the spectrum to compute.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum DftMode {
    /// Real-input transform: non-negative frequencies only, `⌊T/2⌋ + 1` bins.
    /// Imaginary parts of the input are ignored.
    #[default]
    Real,
    /// Full complex transform: all `T` bins in wrap-around order.
    Full,
}

/// A transformed signal row with its frequency grid.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Spectrum {
    pub frequencies: Vec<f64>,
    pub values: Vec<Complex64>,
    pub mode: DftMode,
    /// Index of the transformed row within the signal rows of the input.
    pub source_row: usize,
}

impl Spectrum {
    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

/// Frequency grid of a real-input transform of `n` samples (`k / n`, `k = 0..=n/2`).
pub fn rfft_frequencies(n: usize) -> Vec<f64> {
    if n == 0 {
        return Vec::new();
    }
    (0..=n / 2).map(|k| k as f64 / n as f64).collect()
}

/// Signed frequency grid of a full transform of `n` samples.
///
/// Ordered `0, 1/n, …, ⌊(n-1)/2⌋/n, -⌊n/2⌋/n, …, -1/n`.
pub fn fft_frequencies(n: usize) -> Vec<f64> {
    let positive = (n + 1) / 2;
    (0..n)
        .map(|k| {
            let signed = if k < positive {
                k as i64
            } else {
                k as i64 - n as i64
            };
            signed as f64 / n as f64
        })
        .collect()
}

fn check_shape<T>(series: &SignalSeries<T>) -> Result<(), AnalysisError> {
    if series.signals.is_empty() {
        return Err(AnalysisError::ShapeMismatch(
            "no signal rows to transform".to_string(),
        ));
    }
    let n = series.time.len();
    if let Some((i, bad)) = series
        .signals
        .iter()
        .enumerate()
        .find(|(_, s)| s.len() != n)
    {
        return Err(AnalysisError::ShapeMismatch(format!(
            "signal row {i} has {} samples but the time axis has {n}",
            bad.len()
        )));
    }
    Ok(())
}

fn transform_row<T>(planner: &mut FftPlanner<f64>, row: &[T], mode: DftMode, source_row: usize) -> Spectrum
where
    T: Copy + Into<Complex64>,
{
    let n = row.len();
    if n == 0 {
        return Spectrum {
            frequencies: Vec::new(),
            values: Vec::new(),
            mode,
            source_row,
        };
    }

    let mut buffer: Vec<Complex64> = match mode {
        DftMode::Real => row
            .iter()
            .map(|&v| Complex64::new(Into::<Complex64>::into(v).re, 0.0))
            .collect(),
        DftMode::Full => row.iter().map(|&v| v.into()).collect(),
    };
    planner.plan_fft_forward(n).process(&mut buffer);

    let frequencies = match mode {
        DftMode::Real => {
            // The upper half of a real-input spectrum mirrors the lower half.
            buffer.truncate(n / 2 + 1);
            rfft_frequencies(n)
        }
        DftMode::Full => fft_frequencies(n),
    };
    Spectrum {
        frequencies,
        values: buffer,
        mode,
        source_row,
    }
}

/// Transform the last signal row of `series`.
///
/// When more than one signal row is present, the earlier rows are not
/// transformed and a warning is logged; use [`transform_each`] to get one
/// spectrum per row.
pub fn transform<T>(series: &SignalSeries<T>, mode: DftMode) -> Result<Spectrum, AnalysisError>
where
    T: Copy + Into<Complex64>,
{
    check_shape(series)?;
    let last = series.signals.len() - 1;
    if last > 0 {
        warn!(
            "found {} signal rows to transform, only the last one is used",
            series.signals.len()
        );
    }
    let mut planner = FftPlanner::new();
    Ok(transform_row(&mut planner, &series.signals[last], mode, last))
}

/// Transform every signal row of `series`, in input order.
pub fn transform_each<T>(series: &SignalSeries<T>, mode: DftMode) -> Result<Vec<Spectrum>, AnalysisError>
where
    T: Copy + Into<Complex64>,
{
    check_shape(series)?;
    let mut planner = FftPlanner::new();
    Ok(series
        .signals
        .iter()
        .enumerate()
        .map(|(i, row)| transform_row(&mut planner, row, mode, i))
        .collect())
}
