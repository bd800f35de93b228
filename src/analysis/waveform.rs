//! Wavefunction decoding and the autocorrelation function.

use num_complex::Complex64;

use crate::data::model::{PositionalMatrix, StateVectors};
use crate::error::AnalysisError;

/// Split a raw wavefunction matrix into its time axis and complex state vectors.
///
/// Row 0 is the time axis. The remaining rows alternate real and imaginary
/// parts: rows `1, 3, 5, ...` are real parts, rows `2, 4, 6, ...` the matching
/// imaginary parts.
pub fn decode_waveform(raw: &PositionalMatrix) -> Result<(Vec<f64>, StateVectors), AnalysisError> {
    let (time, signal) = raw.rows().split_first().ok_or_else(|| {
        AnalysisError::ShapeMismatch("wavefunction matrix has no time row".to_string())
    })?;
    if signal.is_empty() {
        return Err(AnalysisError::ShapeMismatch(
            "wavefunction matrix has no signal rows".to_string(),
        ));
    }
    if signal.len() % 2 != 0 {
        return Err(AnalysisError::ShapeMismatch(format!(
            "expected interleaved real/imaginary rows, found an odd count of {}",
            signal.len()
        )));
    }

    let states = signal
        .chunks_exact(2)
        .map(|pair| {
            pair[0]
                .iter()
                .zip(&pair[1])
                .map(|(&re, &im)| Complex64::new(re, im))
                .collect()
        })
        .collect();

    Ok((time.clone(), StateVectors::Complex(states)))
}

/// Overlap of every time step with the first one, summed over states.
///
/// `result[t] = Σ_k conj(ψ_k(0)) · ψ_k(t)`
///
/// The type check is shallow: it looks at the element type of the container,
/// not at the individual values, and runs before any reduction.
pub fn calc_auto(states: &StateVectors) -> Result<Vec<Complex64>, AnalysisError> {
    let rows = match states {
        StateVectors::Complex(rows) => rows,
        other => {
            return Err(AnalysisError::TypeConsistency(format!(
                "autocorrelation needs complex state vectors, found {}",
                other.element_type()
            )))
        }
    };

    let steps = rows.first().map_or(0, Vec::len);
    if let Some((k, bad)) = rows.iter().enumerate().find(|(_, r)| r.len() != steps) {
        return Err(AnalysisError::ShapeMismatch(format!(
            "state {k} has {} time steps, expected {steps}",
            bad.len()
        )));
    }

    let auto = (0..steps)
        .map(|t| rows.iter().map(|psi| psi[0].conj() * psi[t]).sum())
        .collect();
    Ok(auto)
}

/// Autocorrelation function of a raw wavefunction matrix.
///
/// Returns the time axis together with the autocorrelation series.
pub fn aucofu(raw: &PositionalMatrix) -> Result<(Vec<f64>, Vec<Complex64>), AnalysisError> {
    let (time, states) = decode_waveform(raw)?;
    let auto = calc_auto(&states)?;
    Ok((time, auto))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn c(re: f64, im: f64) -> Complex64 {
        Complex64::new(re, im)
    }

    #[test]
    fn calc_auto_of_unit_matrix_sums_states() {
        let states = StateVectors::Complex(vec![vec![c(1.0, 0.0); 3]; 3]);
        let auto = calc_auto(&states).unwrap();
        assert_eq!(auto, vec![c(3.0, 0.0); 3]);
    }

    #[test]
    fn calc_auto_rejects_real_input() {
        let states = StateVectors::Real(vec![vec![1.0; 3]; 3]);
        let err = calc_auto(&states).unwrap_err();
        assert!(matches!(err, AnalysisError::TypeConsistency(_)), "{err}");
    }

    #[test]
    fn calc_auto_uses_conjugate_of_reference() {
        // ψ(0) = i, ψ(1) = 1  →  conj(i)·i = 1, conj(i)·1 = -i
        let states = StateVectors::Complex(vec![vec![c(0.0, 1.0), c(1.0, 0.0)]]);
        assert_eq!(calc_auto(&states).unwrap(), vec![c(1.0, 0.0), c(0.0, -1.0)]);
    }

    #[test]
    fn calc_auto_of_no_states_is_empty() {
        let states = StateVectors::Complex(Vec::new());
        assert_eq!(calc_auto(&states).unwrap(), Vec::<Complex64>::new());
    }

    #[test]
    fn calc_auto_rejects_ragged_states() {
        let states = StateVectors::Complex(vec![vec![c(1.0, 0.0); 3], vec![c(1.0, 0.0); 2]]);
        assert!(matches!(
            calc_auto(&states),
            Err(AnalysisError::ShapeMismatch(_))
        ));
    }

    #[test]
    fn decode_pairs_real_and_imaginary_rows() {
        let raw = PositionalMatrix::from_rows(vec![
            vec![0.0, 1.0],
            vec![1.0, 2.0],
            vec![3.0, 4.0],
            vec![5.0, 6.0],
            vec![7.0, 8.0],
        ])
        .unwrap();
        let (time, states) = decode_waveform(&raw).unwrap();
        assert_eq!(time, vec![0.0, 1.0]);
        assert_eq!(
            states,
            StateVectors::Complex(vec![
                vec![c(1.0, 3.0), c(2.0, 4.0)],
                vec![c(5.0, 7.0), c(6.0, 8.0)],
            ])
        );
    }

    #[test]
    fn decode_rejects_odd_interleaving() {
        let raw = PositionalMatrix::from_rows(vec![vec![0.0], vec![1.0], vec![2.0], vec![3.0]]).unwrap();
        assert!(matches!(
            decode_waveform(&raw),
            Err(AnalysisError::ShapeMismatch(_))
        ));
        let time_only = PositionalMatrix::from_rows(vec![vec![0.0]]).unwrap();
        assert!(decode_waveform(&time_only).is_err());
    }

    #[test]
    fn aucofu_of_constant_real_state() {
        let raw = PositionalMatrix::from_rows(vec![
            vec![0.0, 0.1, 0.2],
            vec![4.0, 4.0, 4.0],
            vec![0.0, 0.0, 0.0],
        ])
        .unwrap();
        let (time, auto) = aucofu(&raw).unwrap();
        assert_eq!(time, vec![0.0, 0.1, 0.2]);
        assert_eq!(auto, vec![c(16.0, 0.0); 3]);
        // The input stays usable.
        assert_eq!(raw.len(), 3);
    }
}
