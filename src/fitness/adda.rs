//! Discrete-dipole simulator adapter
//!
//! Each evaluation runs through four stages inside the working directory:
//! write the dipole coordinate file, run the simulator, read the two
//! radiation-pressure cross-section files, and remove the work unit.

use std::f64::consts::PI;
use std::fs;
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};

use log::{debug, warn};
use serde::{Deserialize, Serialize};

use crate::error::OracleError;
use crate::evaluation::id::EvaluationId;
use crate::fitness::traits::FitnessOracle;
use crate::genome::grid::ShapeGrid;

/// Number of dipole layers stacked under every set cell
pub const DIPOLE_LAYERS: usize = 4;

/// Header lines preceding the force tuple in each cross-section file
pub const CROSS_SECTION_HEADER_LINES: usize = 8;

/// Output file for light polarized along x
pub const CROSS_SECTION_X: &str = "CrossSec-X";

/// Output file for light polarized along y
pub const CROSS_SECTION_Y: &str = "CrossSec-Y";

/// Simulator invocation settings
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimulatorConfig {
    /// Simulator executable
    pub executable: PathBuf,
    /// Arguments placed before the simulator's own (e.g. an MPI launcher's)
    pub leading_args: Vec<String>,
    /// Directory the simulator runs in; work units are created here
    pub working_dir: PathBuf,
    /// Incident wavelength
    pub wavelength: f64,
    /// Real part of the refractive index
    pub refractive_index_real: f64,
    /// Imaginary part of the refractive index
    pub refractive_index_imag: f64,
    /// Dipoles per wavelength per grid row
    pub density_factor: f64,
    /// Leave work units on disk after evaluation
    pub keep_files: bool,
}

impl Default for SimulatorConfig {
    fn default() -> Self {
        Self {
            executable: PathBuf::from("adda"),
            leading_args: Vec::new(),
            working_dir: PathBuf::from("."),
            wavelength: 350.0,
            refractive_index_real: 5.0,
            refractive_index_imag: 3.0,
            density_factor: 1.0,
            keep_files: false,
        }
    }
}

impl SimulatorConfig {
    /// Default settings for the given executable
    pub fn new(executable: impl Into<PathBuf>) -> Self {
        Self {
            executable: executable.into(),
            ..Self::default()
        }
    }

    /// Set the working directory
    pub fn with_working_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.working_dir = dir.into();
        self
    }

    /// Set the dipole density factor
    pub fn with_density_factor(mut self, factor: f64) -> Self {
        self.density_factor = factor;
        self
    }

    /// Set launcher arguments placed before the simulator arguments
    pub fn with_leading_args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.leading_args = args.into_iter().map(Into::into).collect();
        self
    }

    /// Keep or remove work units after evaluation
    pub fn with_keep_files(mut self, keep: bool) -> Self {
        self.keep_files = keep;
        self
    }

    /// Dipoles per wavelength for a grid with `rows` rows
    pub fn dipoles_per_lambda(&self, rows: usize) -> f64 {
        self.density_factor * rows as f64
    }

    /// Simulator arguments for one work unit
    pub fn simulator_args(&self, unit: &WorkUnit, rows: usize) -> Vec<String> {
        vec![
            "-Cpr".to_string(),
            "-lambda".to_string(),
            self.wavelength.to_string(),
            "-dpl".to_string(),
            self.dipoles_per_lambda(rows).to_string(),
            "-m".to_string(),
            self.refractive_index_real.to_string(),
            self.refractive_index_imag.to_string(),
            "-shape".to_string(),
            "read".to_string(),
            unit.shape_file_name.clone(),
            "-dir".to_string(),
            unit.output_dir_name.clone(),
        ]
    }
}

/// Files belonging to one evaluation
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct WorkUnit {
    /// Coordinate file name, relative to the working directory
    pub shape_file_name: String,
    /// Output directory name, relative to the working directory
    pub output_dir_name: String,
    /// Full path of the coordinate file
    pub shape_path: PathBuf,
    /// Full path of the output directory
    pub output_dir: PathBuf,
}

impl WorkUnit {
    /// Lay out the work unit for `id` inside `working_dir`
    pub fn new(working_dir: &Path, id: &EvaluationId) -> Self {
        let shape_file_name = id.shape_file_name();
        let output_dir_name = id.output_dir_name();
        Self {
            shape_path: working_dir.join(&shape_file_name),
            output_dir: working_dir.join(&output_dir_name),
            shape_file_name,
            output_dir_name,
        }
    }

    /// Write the coordinate file for `grid`
    pub fn write_shape(&self, grid: &ShapeGrid) -> io::Result<()> {
        let mut writer = BufWriter::new(fs::File::create(&self.shape_path)?);
        write_shape_file(grid, &mut writer)?;
        writer.flush()
    }

    /// Remove the coordinate file and output directory
    ///
    /// Both removals are attempted; the first failure is returned. Files the
    /// simulator never created are not an error.
    pub fn cleanup(&self) -> io::Result<()> {
        let file = ignore_missing(fs::remove_file(&self.shape_path));
        let dir = ignore_missing(fs::remove_dir_all(&self.output_dir));
        file.and(dir)
    }
}

fn ignore_missing(result: io::Result<()>) -> io::Result<()> {
    match result {
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
        other => other,
    }
}

/// Write the dipole coordinates of `grid`
///
/// Every set cell at (row, col) becomes [`DIPOLE_LAYERS`] lines
/// `row col layer`, in row-major order.
pub fn write_shape_file<W: Write>(grid: &ShapeGrid, writer: &mut W) -> io::Result<()> {
    for (row, col) in grid.active_cells() {
        for layer in 0..DIPOLE_LAYERS {
            writeln!(writer, "{row} {col} {layer}")?;
        }
    }
    Ok(())
}

/// Parse the labeled force tuple from a cross-section file
///
/// The tuple sits on the line after the fixed header and looks like
/// `Cpr = (x,y,z)`.
pub fn parse_cross_section(path: &Path) -> Result<[f64; 3], OracleError> {
    let parse_err = |reason: String| OracleError::Parse {
        path: path.to_path_buf(),
        reason,
    };
    let text = fs::read_to_string(path).map_err(|e| parse_err(e.to_string()))?;
    let line = text
        .lines()
        .nth(CROSS_SECTION_HEADER_LINES)
        .ok_or_else(|| parse_err("file ends before the force line".to_string()))?;
    parse_force_line(line).map_err(parse_err)
}

fn parse_force_line(line: &str) -> Result<[f64; 3], String> {
    let value = line
        .split('=')
        .nth(1)
        .ok_or_else(|| format!("no '=' in {line:?}"))?
        .trim();
    let inner = value
        .strip_prefix('(')
        .and_then(|v| v.strip_suffix(')'))
        .ok_or_else(|| format!("expected a bracketed tuple, got {value:?}"))?;

    let parts: Vec<&str> = inner.split(',').collect();
    if parts.len() != 3 {
        return Err(format!("expected 3 components, got {}", parts.len()));
    }
    let mut out = [0.0; 3];
    for (slot, part) in out.iter_mut().zip(parts) {
        *slot = part
            .trim()
            .parse()
            .map_err(|e| format!("bad component {part:?}: {e}"))?;
    }
    Ok(out)
}

/// Radiation force magnitude from a simulator output directory
///
/// Each component is `(Cx + Cy) / (8π)` over the two polarizations; the
/// result is the Euclidean norm of the three components.
pub fn read_force(output_dir: &Path) -> Result<f64, OracleError> {
    let x = parse_cross_section(&output_dir.join(CROSS_SECTION_X))?;
    let y = parse_cross_section(&output_dir.join(CROSS_SECTION_Y))?;
    let norm_sq: f64 = x
        .iter()
        .zip(y.iter())
        .map(|(a, b)| ((a + b) / (8.0 * PI)).powi(2))
        .sum();
    Ok(norm_sq.sqrt())
}

/// Fitness oracle backed by the external simulator
#[derive(Clone, Debug)]
pub struct AddaOracle {
    config: SimulatorConfig,
}

impl AddaOracle {
    /// Create an oracle with the given settings
    pub fn new(config: SimulatorConfig) -> Self {
        Self { config }
    }

    /// Simulator settings
    pub fn config(&self) -> &SimulatorConfig {
        &self.config
    }

    fn invoke(&self, unit: &WorkUnit, rows: usize) -> Result<(), OracleError> {
        let output = Command::new(&self.config.executable)
            .args(&self.config.leading_args)
            .args(self.config.simulator_args(unit, rows))
            .current_dir(&self.config.working_dir)
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .output()
            .map_err(|source| OracleError::Launch {
                program: self.config.executable.display().to_string(),
                source,
            })?;

        if !output.stderr.is_empty() {
            return Err(OracleError::Invocation(
                String::from_utf8_lossy(&output.stderr).into_owned(),
            ));
        }
        debug!("simulator exited with {} for {}", output.status, unit.output_dir_name);
        Ok(())
    }

    fn run_unit(&self, unit: &WorkUnit, grid: &ShapeGrid) -> Result<f64, OracleError> {
        unit.write_shape(grid)?;
        self.invoke(unit, grid.rows())?;
        read_force(&unit.output_dir)
    }
}

impl FitnessOracle for AddaOracle {
    fn evaluate(&self, grid: &ShapeGrid, id: &EvaluationId) -> Result<f64, OracleError> {
        let unit = WorkUnit::new(&self.config.working_dir, id);
        debug!(
            "evaluating work unit {} ({} active cells, dpl {})",
            id,
            grid.count_ones(),
            self.config.dipoles_per_lambda(grid.rows())
        );

        let result = self.run_unit(&unit, grid);
        if self.config.keep_files {
            return result;
        }

        match (result, unit.cleanup()) {
            (Ok(force), Ok(())) => Ok(force),
            (Ok(_), Err(e)) => Err(OracleError::Io(e)),
            (Err(e), Ok(())) => Err(e),
            (Err(e), Err(cleanup)) => {
                warn!("cleanup of work unit {} failed: {}", id, cleanup);
                Err(e)
            }
        }
    }
}
