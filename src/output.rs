//! Result writer: whitespace-delimited data files plus an optional JSON summary.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use log::info;
use num_complex::Complex64;

use crate::analysis::{CorrelationTable, Spectrum};
use crate::data::model::LabeledTable;
use crate::run::RunOutput;

fn writer(path: &Path) -> Result<csv::Writer<std::fs::File>> {
    csv::WriterBuilder::new()
        .delimiter(b' ')
        .from_path(path)
        .with_context(|| format!("creating {}", path.display()))
}

fn complex_fields(v: Complex64) -> [String; 3] {
    [v.re.to_string(), v.im.to_string(), v.norm().to_string()]
}

fn write_table(path: &Path, table: &LabeledTable) -> Result<()> {
    let mut w = writer(path)?;
    w.write_record(table.labels())?;
    for i in 0..table.len() {
        w.write_record(table.row(i).iter().map(f64::to_string))?;
    }
    w.flush()?;
    Ok(())
}

fn write_correlations(path: &Path, correlations: &CorrelationTable) -> Result<()> {
    let mut w = writer(path)?;
    w.write_record(["first", "second", "coefficient"])?;
    for e in correlations.entries() {
        w.write_record([e.first.clone(), e.second.clone(), e.coefficient.to_string()])?;
    }
    w.flush()?;
    Ok(())
}

fn write_complex_series(path: &Path, axis: &str, grid: &[f64], values: &[Complex64]) -> Result<()> {
    let mut w = writer(path)?;
    w.write_record([axis, "re", "im", "abs"])?;
    for (x, &v) in grid.iter().zip(values) {
        let [re, im, abs] = complex_fields(v);
        w.write_record([x.to_string(), re, im, abs])?;
    }
    w.flush()?;
    Ok(())
}

fn write_spectrum(path: &Path, spectrum: &Spectrum) -> Result<()> {
    write_complex_series(path, "frequency", &spectrum.frequencies, &spectrum.values)
}

/// Write `output` into `out_dir`, creating the directory if needed.
///
/// Returns the paths of all files written.
pub fn write_output(output: &RunOutput, out_dir: &Path, write_json: bool) -> Result<Vec<PathBuf>> {
    std::fs::create_dir_all(out_dir)
        .with_context(|| format!("creating output directory {}", out_dir.display()))?;
    let mut written = Vec::new();

    match output {
        RunOutput::Expectation { table, .. } => {
            let path = out_dir.join("expec_significant.dat");
            info!("Writing significant expectation values");
            write_table(&path, table)?;
            written.push(path);
        }
        RunOutput::Populations {
            table, correlations, ..
        } => {
            let path = out_dir.join("npop_significant.dat");
            info!("Writing significant MO populations");
            write_table(&path, table)?;
            written.push(path);

            let path = out_dir.join("corrmat.dat");
            info!("Writing correlation matrix");
            write_correlations(&path, correlations)?;
            written.push(path);
        }
        RunOutput::TransitionDipole {
            components,
            distances,
        } => {
            let path = out_dir.join("l2norm.dat");
            info!("Writing L2 norm of transition dipole moments");
            let mut w = writer(&path)?;
            w.write_record(components)?;
            w.write_record(distances.iter().map(f64::to_string))?;
            w.flush()?;
            written.push(path);
        }
        RunOutput::ElectricField { spectra, .. } => {
            for field in spectra {
                let path = out_dir.join(format!("efield_FT_{}.dat", field.component));
                info!("Writing FT of electric field component {}", field.component);
                write_spectrum(&path, &field.spectrum)?;
                written.push(path);
            }
        }
        RunOutput::Autocorrelation {
            time,
            values,
            spectrum,
        } => {
            let path = out_dir.join("aucofu.t");
            info!("Writing autocorrelation function");
            write_complex_series(&path, "time", time, values)?;
            written.push(path);

            let path = out_dir.join("aucofu_FT.dat");
            info!("Writing FT of autocorrelation function");
            write_spectrum(&path, spectrum)?;
            written.push(path);
        }
    }

    if write_json {
        let path = out_dir.join("summary.json");
        let json = serde_json::to_string_pretty(output).context("serializing summary")?;
        std::fs::write(&path, json).with_context(|| format!("writing {}", path.display()))?;
        written.push(path);
    }

    for path in &written {
        info!("wrote {}", path.display());
    }
    Ok(written)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::loader;

    #[test]
    fn autocorrelation_files_round_trip_through_loader() {
        let dir = tempfile::tempdir().unwrap();
        let values = vec![Complex64::new(3.0, 4.0), Complex64::new(1.0, 0.0)];
        let output = RunOutput::Autocorrelation {
            time: vec![0.0, 0.5],
            values: values.clone(),
            spectrum: Spectrum {
                frequencies: vec![0.0, -0.5],
                values,
                mode: crate::analysis::DftMode::Full,
                source_row: 0,
            },
        };
        let written = write_output(&output, dir.path(), false).unwrap();
        assert_eq!(written.len(), 2);

        let table = loader::load_file(&dir.path().join("aucofu.t")).unwrap();
        assert_eq!(table.labels(), vec!["time", "re", "im", "abs"]);
        assert_eq!(table.column("abs").unwrap().values, vec![5.0, 1.0]);
    }

    #[test]
    fn summary_json_is_tagged_by_run() {
        let dir = tempfile::tempdir().unwrap();
        let output = RunOutput::TransitionDipole {
            components: vec!["x".into()],
            distances: vec![0.25],
        };
        write_output(&output, dir.path(), true).unwrap();
        let json = std::fs::read_to_string(dir.path().join("summary.json")).unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value["run"], "transition_dipole");
        assert_eq!(value["distances"][0], 0.25);
    }
}
