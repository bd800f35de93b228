use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

fn default_input_dir() -> PathBuf {
    PathBuf::from("data")
}

fn default_output_dir() -> PathBuf {
    PathBuf::from("output")
}

fn default_threshold() -> f64 {
    1e-5
}

fn default_write_json() -> bool {
    true
}

/// Settings for one analysis run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisConfig {
    /// Directory containing the simulation output.
    #[serde(default = "default_input_dir")]
    pub input_dir: PathBuf,
    /// Directory the results are written to; created if missing.
    #[serde(default = "default_output_dir")]
    pub output_dir: PathBuf,
    /// Input file name; also selects the run type (`expec.t`, `npop.t`, …).
    #[serde(default)]
    pub file_name: String,
    /// Variance threshold below which a variable counts as constant.
    #[serde(default = "default_threshold")]
    pub threshold: f64,
    /// Whether to write `summary.json` next to the data files.
    #[serde(default = "default_write_json")]
    pub write_json: bool,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            input_dir: default_input_dir(),
            output_dir: default_output_dir(),
            file_name: String::new(),
            threshold: default_threshold(),
            write_json: default_write_json(),
        }
    }
}

impl AnalysisConfig {
    pub fn from_json_file(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("reading config {}", path.display()))?;
        serde_json::from_str(&text).with_context(|| format!("parsing config {}", path.display()))
    }

    /// Full path of the input file.
    pub fn input_path(&self) -> PathBuf {
        self.input_dir.join(&self.file_name)
    }
}
