use std::path::PathBuf;

use anyhow::Result;
use clap::Parser;
use log::info;

use rusty_tdcia::{analyze, AnalysisConfig};

#[derive(Parser, Debug)]
#[command(
    name = "rusty-tdcia",
    about = "Analyse time-dependent CI output: expec.t, npop.t, table.dat, efield.t, nstate_i.t"
)]
struct Cli {
    /// Input file name; selects the analysis that is run.
    file: Option<String>,
    /// Directory containing the input file.
    #[arg(long)]
    input_dir: Option<PathBuf>,
    /// Output directory for the result files.
    #[arg(long)]
    out: Option<PathBuf>,
    /// Variance threshold below which data counts as constant.
    #[arg(long)]
    threshold: Option<f64>,
    /// JSON configuration; explicit flags override its values.
    #[arg(long)]
    config: Option<PathBuf>,
    /// Do not write summary.json.
    #[arg(long)]
    no_json: bool,
}

impl Cli {
    fn into_config(self) -> Result<AnalysisConfig> {
        let mut config = match &self.config {
            Some(path) => AnalysisConfig::from_json_file(path)?,
            None => AnalysisConfig::default(),
        };
        if let Some(file) = self.file {
            config.file_name = file;
        }
        if let Some(dir) = self.input_dir {
            config.input_dir = dir;
        }
        if let Some(dir) = self.out {
            config.output_dir = dir;
        }
        if let Some(threshold) = self.threshold {
            config.threshold = threshold;
        }
        if self.no_json {
            config.write_json = false;
        }
        if config.file_name.is_empty() {
            anyhow::bail!("no input file given (pass FILE or set file_name in the config)");
        }
        Ok(config)
    }
}

fn main() -> Result<()> {
    env_logger::init();

    let config = Cli::parse().into_config()?;
    let report = analyze(&config)?;
    info!(
        "{} analysis finished, {} files written to {}",
        report.run_type,
        report.written.len(),
        config.output_dir.display()
    );
    Ok(())
}
