//! Run types and the analysis pipeline behind each of them.

use std::fmt;
use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use log::{debug, info, warn};
use num_complex::Complex64;
use serde::{Deserialize, Serialize};

use crate::analysis::{
    aucofu, euclidean_distance, rank_correlations, transform, transform_each, CorrelationTable,
    DftMode, Spectrum,
};
use crate::config::AnalysisConfig;
use crate::data::filter::{check_significance, filter, SignificanceMask};
use crate::data::loader;
use crate::data::model::{ContainerKind, DataContainer, LabeledTable, PositionalMatrix, SignalSeries};
use crate::output;

/// Vector pairs compared in a transition dipole table: (reference, comparison).
const DIPOLE_REFERENCE: [usize; 3] = [0, 2, 4];
const DIPOLE_COMPARE: [usize; 3] = [1, 3, 5];
/// Cartesian labels shared by dipole distances and field components.
const AXIS_LABELS: [&str; 3] = ["x", "y", "z"];

/// Kind of simulation output, identified by its file name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RunType {
    /// `expec.t`: expectation values over time.
    Expectation,
    /// `npop.t`: molecular orbital populations over time.
    Populations,
    /// `table.dat`: transition dipole moment table.
    TransitionDipole,
    /// `efield.t`: electric field components over time.
    ElectricField,
    /// `nstate_i.t`: wavefunction coefficients over time.
    StateVectors,
}

/// Pipeline run for one loaded input at a given variance threshold.
pub type RunHandler = fn(&DataContainer, f64) -> Result<RunOutput>;

impl RunType {
    pub const ALL: [RunType; 5] = [
        RunType::Expectation,
        RunType::Populations,
        RunType::TransitionDipole,
        RunType::ElectricField,
        RunType::StateVectors,
    ];

    pub fn file_name(self) -> &'static str {
        match self {
            RunType::Expectation => "expec.t",
            RunType::Populations => "npop.t",
            RunType::TransitionDipole => "table.dat",
            RunType::ElectricField => "efield.t",
            RunType::StateVectors => "nstate_i.t",
        }
    }

    /// Select the run type from an input file name (directories are ignored).
    pub fn from_file_name(name: &str) -> Result<Self> {
        let base = Path::new(name)
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or(name);
        match RunType::ALL.into_iter().find(|rt| rt.file_name() == base) {
            Some(rt) => Ok(rt),
            None => {
                let known: Vec<&str> = RunType::ALL.iter().map(|rt| rt.file_name()).collect();
                bail!(
                    "analysis of '{base}' is not implemented, provide one of: {}",
                    known.join(", ")
                )
            }
        }
    }

    /// Container shape the pipeline expects.
    pub fn container_kind(self) -> ContainerKind {
        match self {
            RunType::Expectation | RunType::Populations => ContainerKind::Table,
            RunType::TransitionDipole | RunType::ElectricField | RunType::StateVectors => {
                ContainerKind::Matrix
            }
        }
    }

    pub fn handler(self) -> RunHandler {
        match self {
            RunType::Expectation => run_expectation,
            RunType::Populations => run_populations,
            RunType::TransitionDipole => run_transition_dipole,
            RunType::ElectricField => run_electric_field,
            RunType::StateVectors => run_state_vectors,
        }
    }

    /// Load `path` in the shape this run type works on.
    pub fn read(self, path: &Path) -> Result<DataContainer> {
        loader::load_container(path, self.container_kind())
    }
}

impl fmt::Display for RunType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.file_name())
    }
}

// ---------------------------------------------------------------------------
// Results
// ---------------------------------------------------------------------------

/// Spectrum of one electric field component.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FieldSpectrum {
    /// Component label (`x`, `y`, `z`).
    pub component: String,
    /// Row position of the component in the loaded matrix.
    pub position: usize,
    pub spectrum: Spectrum,
}

/// Result of one pipeline, ready for the result writer.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "run", rename_all = "snake_case")]
pub enum RunOutput {
    Expectation {
        table: LabeledTable,
        labels: Vec<String>,
    },
    Populations {
        table: LabeledTable,
        labels: Vec<String>,
        correlations: CorrelationTable,
    },
    TransitionDipole {
        components: Vec<String>,
        distances: Vec<f64>,
    },
    ElectricField {
        positions: Vec<usize>,
        spectra: Vec<FieldSpectrum>,
    },
    Autocorrelation {
        time: Vec<f64>,
        values: Vec<Complex64>,
        spectrum: Spectrum,
    },
}

// ---------------------------------------------------------------------------
// Pipelines
// ---------------------------------------------------------------------------

fn as_table(data: &DataContainer) -> Result<&LabeledTable> {
    match data {
        DataContainer::Table(t) => Ok(t),
        DataContainer::Matrix(_) => bail!("expected a labeled table, got a positional matrix"),
    }
}

fn as_matrix(data: &DataContainer) -> Result<&PositionalMatrix> {
    match data {
        DataContainer::Matrix(m) => Ok(m),
        DataContainer::Table(_) => bail!("expected a positional matrix, got a labeled table"),
    }
}

fn field_component(position: usize) -> String {
    match position {
        1..=3 => AXIS_LABELS[position - 1].to_string(),
        p => format!("c{p}"),
    }
}

/// Significance filter over a labeled table, keeping the retained labels.
fn significant_table(data: &DataContainer, threshold: f64) -> Result<(LabeledTable, Vec<String>)> {
    match check_significance(data, threshold) {
        (DataContainer::Table(table), SignificanceMask::Labels(labels)) => Ok((table, labels)),
        (reduced, _) => bail!("expected a labeled table, got {:?} data", reduced.kind()),
    }
}

fn run_expectation(data: &DataContainer, threshold: f64) -> Result<RunOutput> {
    let (table, labels) = significant_table(data, threshold)?;
    info!("{} of {} expectation values are significant", labels.len(), as_table(data)?.width());
    Ok(RunOutput::Expectation { table, labels })
}

fn run_populations(data: &DataContainer, threshold: f64) -> Result<RunOutput> {
    let (table, labels) = significant_table(data, threshold)?;
    debug!("significant populations: {labels:?}");
    let correlations = rank_correlations(&table).context("ranking population correlations")?;
    Ok(RunOutput::Populations {
        table,
        labels,
        correlations,
    })
}

fn run_transition_dipole(data: &DataContainer, _threshold: f64) -> Result<RunOutput> {
    // The two leading columns of table.dat are state labels.
    let vectors = as_matrix(data)?.skip_rows(2).nan_to_num();
    let distances = euclidean_distance(&DIPOLE_REFERENCE, &DIPOLE_COMPARE, vectors.rows())
        .context("computing transition dipole distances")?;
    Ok(RunOutput::TransitionDipole {
        components: AXIS_LABELS.iter().map(|c| c.to_string()).collect(),
        distances,
    })
}

fn run_electric_field(data: &DataContainer, threshold: f64) -> Result<RunOutput> {
    let (reduced, positions) = filter(as_matrix(data)?, threshold);
    if positions.first() != Some(&0) {
        bail!("the time axis of the electric field was filtered out");
    }
    let series = SignalSeries::from_matrix(&reduced)?;
    if series.signals.is_empty() {
        warn!("no significant electric field components");
        return Ok(RunOutput::ElectricField {
            positions,
            spectra: Vec::new(),
        });
    }

    let spectra = transform_each(&series, DftMode::Real)
        .context("transforming electric field")?
        .into_iter()
        .zip(&positions[1..])
        .map(|(spectrum, &position)| FieldSpectrum {
            component: field_component(position),
            position,
            spectrum,
        })
        .collect();
    Ok(RunOutput::ElectricField { positions, spectra })
}

fn run_state_vectors(data: &DataContainer, _threshold: f64) -> Result<RunOutput> {
    let (time, values) = aucofu(as_matrix(data)?).context("computing autocorrelation function")?;
    let series = SignalSeries::single(time.clone(), values.clone());
    let spectrum = transform(&series, DftMode::Full).context("transforming autocorrelation function")?;
    Ok(RunOutput::Autocorrelation {
        time,
        values,
        spectrum,
    })
}

// ---------------------------------------------------------------------------
// Entry point
// ---------------------------------------------------------------------------

/// What one call to [`analyze`] did.
#[derive(Debug, Clone)]
pub struct AnalysisReport {
    pub run_type: RunType,
    pub output: RunOutput,
    /// Files written to the output directory.
    pub written: Vec<PathBuf>,
}

/// Read the configured input, run its pipeline and write the results.
pub fn analyze(config: &AnalysisConfig) -> Result<AnalysisReport> {
    let run_type = RunType::from_file_name(&config.file_name)?;
    info!("Running {run_type} analysis (threshold {})", config.threshold);

    let data = run_type.read(&config.input_path())?;
    let output = (run_type.handler())(&data, config.threshold)
        .with_context(|| format!("{run_type} analysis failed"))?;
    let written = output::write_output(&output, &config.output_dir, config.write_json)?;

    Ok(AnalysisReport {
        run_type,
        output,
        written,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::model::Column;

    #[test]
    fn file_names_select_run_types() {
        for rt in RunType::ALL {
            assert_eq!(RunType::from_file_name(rt.file_name()).unwrap(), rt);
        }
        assert_eq!(
            RunType::from_file_name("runs/a/efield.t").unwrap(),
            RunType::ElectricField
        );
        let err = RunType::from_file_name("unknown.t").unwrap_err();
        assert!(err.to_string().contains("nstate_i.t"), "{err}");
    }

    #[test]
    fn container_shapes() {
        assert_eq!(RunType::Populations.container_kind(), ContainerKind::Table);
        assert_eq!(RunType::StateVectors.container_kind(), ContainerKind::Matrix);
    }

    #[test]
    fn handlers_reject_the_wrong_shape() {
        let table = DataContainer::Table(LabeledTable::default());
        assert!((RunType::StateVectors.handler())(&table, 1e-5).is_err());
        let matrix = DataContainer::Matrix(PositionalMatrix::default());
        assert!((RunType::Expectation.handler())(&matrix, 1e-5).is_err());
    }

    #[test]
    fn electric_field_labels_components() {
        let table = LabeledTable::new(vec![
            Column::new("time", vec![0.0, 1.0, 2.0, 3.0]),
            Column::new("x", vec![0.0, 0.0, 0.0, 0.0]),
            Column::new("y", vec![0.0, 1.0, 0.0, -1.0]),
            Column::new("z", vec![1.0, 0.0, -1.0, 0.0]),
        ])
        .unwrap();
        let data = DataContainer::from_table(table, ContainerKind::Matrix);
        let RunOutput::ElectricField { positions, spectra } =
            (RunType::ElectricField.handler())(&data, 1e-5).unwrap()
        else {
            panic!("wrong output variant");
        };
        assert_eq!(positions, vec![0, 2, 3]);
        let components: Vec<&str> = spectra.iter().map(|s| s.component.as_str()).collect();
        assert_eq!(components, vec!["y", "z"]);
        assert_eq!(spectra[0].spectrum.len(), 3);
    }

    #[test]
    fn transition_dipole_skips_label_columns() {
        let mut rows = vec![vec![1.0, 2.0], vec![2.0, 3.0]];
        rows.extend([
            vec![-0.2, -1.0],
            vec![-0.3, -0.9],
            vec![1.0, 1.1],
            vec![0.8, 0.9],
            vec![0.0, f64::NAN],
            vec![0.0, 0.2],
        ]);
        let data = DataContainer::Matrix(PositionalMatrix::from_rows(rows).unwrap());
        let RunOutput::TransitionDipole { distances, .. } =
            (RunType::TransitionDipole.handler())(&data, 1e-5).unwrap()
        else {
            panic!("wrong output variant");
        };
        let expected = [0.14142136, 0.28284271, 0.2];
        for (d, e) in distances.iter().zip(expected) {
            assert!((d - e).abs() < 1e-8, "{d} vs {e}");
        }
    }
}
