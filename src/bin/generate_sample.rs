use std::f64::consts::PI;
use std::fmt::Write as _;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use arrow::array::{ArrayRef, Float64Array};
use arrow::datatypes::{DataType, Field, Schema};
use arrow::record_batch::RecordBatch;
use clap::Parser;
use parquet::arrow::ArrowWriter;

/// Minimal deterministic PRNG (xoshiro256**)
struct SimpleRng {
    state: [u64; 4],
}

impl SimpleRng {
    fn new(seed: u64) -> Self {
        let mut s = [0u64; 4];
        let mut x = seed;
        for slot in &mut s {
            x = x.wrapping_mul(6364136223846793005).wrapping_add(1);
            *slot = x;
        }
        SimpleRng { state: s }
    }

    fn next_u64(&mut self) -> u64 {
        let result = (self.state[1].wrapping_mul(5))
            .rotate_left(7)
            .wrapping_mul(9);
        let t = self.state[1] << 17;
        self.state[2] ^= self.state[0];
        self.state[3] ^= self.state[1];
        self.state[1] ^= self.state[2];
        self.state[0] ^= self.state[3];
        self.state[2] ^= t;
        self.state[3] = self.state[3].rotate_left(45);
        result
    }

    fn next_f64(&mut self) -> f64 {
        (self.next_u64() >> 11) as f64 / (1u64 << 53) as f64
    }

    /// Box-Muller transform for normal distribution
    fn gauss(&mut self, mean: f64, std_dev: f64) -> f64 {
        let u1 = self.next_f64().max(1e-15);
        let u2 = self.next_f64();
        let z = (-2.0 * u1.ln()).sqrt() * (2.0 * PI * u2).cos();
        mean + std_dev * z
    }
}

#[derive(Parser, Debug)]
#[command(name = "generate_sample", about = "Write synthetic TD-CI output files")]
struct Args {
    /// Directory the sample files are written to.
    #[arg(default_value = "data")]
    out: PathBuf,
    /// Number of time steps.
    #[arg(long, default_value_t = 512)]
    steps: usize,
    /// Time step in fs.
    #[arg(long, default_value_t = 0.05)]
    dt: f64,
}

/// Whitespace-delimited table: header line, then one line per sample.
///
/// Columns are right-aligned to a fixed width like the simulation writes them,
/// which a delimiter-based `csv::Writer` cannot pad.
fn write_columns(path: &Path, names: &[String], columns: &[Vec<f64>]) -> Result<()> {
    let mut text = String::new();
    for name in names {
        write!(text, "{name:>16}")?;
    }
    text.push('\n');
    let rows = columns.first().map_or(0, Vec::len);
    for i in 0..rows {
        for col in columns {
            write!(text, "{:>16.8e}", col[i])?;
        }
        text.push('\n');
    }
    std::fs::write(path, text).with_context(|| format!("writing {}", path.display()))
}

fn names(list: &[&str]) -> Vec<String> {
    list.iter().map(|s| s.to_string()).collect()
}

fn main() -> Result<()> {
    let args = Args::parse();
    std::fs::create_dir_all(&args.out)?;
    let mut rng = SimpleRng::new(42);

    let time: Vec<f64> = (0..args.steps).map(|i| i as f64 * args.dt).collect();

    // nstate_i.t: ψ_k(t) = c_k · exp(-i E_k t), real and imaginary parts interleaved
    let states = [(0.8, -75.30), (0.5, -75.05), (0.3, -74.90)];
    let mut columns = vec![time.clone()];
    let mut header = names(&["time"]);
    for (k, &(c, e)) in states.iter().enumerate() {
        columns.push(time.iter().map(|t| c * (e * t).cos()).collect());
        columns.push(time.iter().map(|t| -c * (e * t).sin()).collect());
        header.push(format!("re{k}"));
        header.push(format!("im{k}"));
    }
    write_columns(&args.out.join("nstate_i.t"), &header, &columns)?;

    // efield.t: pulse polarised along z
    let t0 = time.last().copied().unwrap_or(0.0) / 2.0;
    let omega = 2.0 * PI * 0.8;
    let ez: Vec<f64> = time
        .iter()
        .map(|t| 0.05 * (omega * t).sin() * (-(t - t0).powi(2) / (2.0 * 4.0)).exp())
        .collect();
    let zero = vec![0.0; time.len()];
    write_columns(
        &args.out.join("efield.t"),
        &names(&["time", "x", "y", "z"]),
        &[time.clone(), zero.clone(), zero.clone(), ez.clone()],
    )?;

    // expec.t: norm and <x>, <y> stay constant
    let energy: Vec<f64> = ez.iter().map(|f| -75.3 + 0.2 * f + rng.gauss(0.0, 1e-3)).collect();
    let dipole_z: Vec<f64> = ez.iter().map(|f| 0.4 * f + rng.gauss(0.0, 1e-3)).collect();
    write_columns(
        &args.out.join("expec.t"),
        &names(&["time", "norm", "<H>", "<x>", "<y>", "<z>"]),
        &[time.clone(), vec![1.0; time.len()], energy, zero.clone(), zero, dipole_z],
    )?;

    // npop.t: core orbitals doubly occupied, frontier orbitals exchange population
    let mut pop_names = names(&["time"]);
    let mut pops = vec![time.clone()];
    for mo in 1..=6 {
        pop_names.push(mo.to_string());
        let column = match mo {
            1..=3 => vec![2.0; time.len()],
            4 => time.iter().map(|t| 1.6 + 0.3 * (0.9 * t).cos()).collect(),
            5 => time.iter().map(|t| 0.4 - 0.3 * (0.9 * t).cos() + rng.gauss(0.0, 0.02)).collect(),
            _ => time.iter().map(|_| rng.gauss(0.01, 0.005)).collect(),
        };
        pops.push(column);
    }
    write_columns(&args.out.join("npop.t"), &pop_names, &pops)?;
    write_parquet(&args.out.join("npop.parquet"), &pop_names, &pops)?;

    // table.dat: state pair labels, then reference/comparison dipole components
    let transitions = 8;
    let mut table = vec![
        (0..transitions).map(|_| 0.0).collect::<Vec<f64>>(),
        (1..=transitions).map(|j| j as f64).collect(),
    ];
    for _ in 0..3 {
        let reference: Vec<f64> = (0..transitions).map(|_| rng.gauss(0.0, 1.0)).collect();
        let compare: Vec<f64> = reference.iter().map(|r| r + rng.gauss(0.0, 0.1)).collect();
        table.push(reference);
        table.push(compare);
    }
    table[7][transitions - 1] = f64::NAN;
    write_columns(
        &args.out.join("table.dat"),
        &names(&["i", "j", "x_ref", "x_cmp", "y_ref", "y_cmp", "z_ref", "z_cmp"]),
        &table,
    )?;

    println!(
        "Wrote sample files ({} time steps) to {}",
        args.steps,
        args.out.display()
    );
    Ok(())
}

fn write_parquet(path: &Path, names: &[String], columns: &[Vec<f64>]) -> Result<()> {
    let schema = Arc::new(Schema::new(
        names
            .iter()
            .map(|n| Field::new(n, DataType::Float64, false))
            .collect::<Vec<_>>(),
    ));
    let arrays: Vec<ArrayRef> = columns
        .iter()
        .map(|c| Arc::new(Float64Array::from(c.clone())) as ArrayRef)
        .collect();
    let batch = RecordBatch::try_new(schema.clone(), arrays).context("building record batch")?;

    let file = std::fs::File::create(path).with_context(|| format!("creating {}", path.display()))?;
    let mut writer = ArrowWriter::try_new(file, schema, None).context("creating parquet writer")?;
    writer.write(&batch).context("writing parquet batch")?;
    writer.close().context("closing parquet writer")?;
    Ok(())
}
