//! Directory-backed experiment recorder

use std::fs::{self, File, OpenOptions};
use std::io::{BufReader, BufWriter, ErrorKind, Write};
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use log::{debug, info};
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::diagnostics::{EvolutionResult, StatisticsLog};
use crate::error::RecordError;
use crate::genome::grid::ShapeGrid;
use crate::genome::traits::EvolutionaryGenome;

/// Name of the run-history table inside the records directory
pub const HISTORY_FILE: &str = "ExperimentData.csv";

/// Attempts at finding an unused artifact name before giving up
const MAX_NAME_ATTEMPTS: usize = 64;

/// Operator settings and labels describing a run
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct RunMetadata {
    /// Force direction label
    pub direction: String,
    /// Number of generations
    pub generations: usize,
    /// Population size
    pub population_size: usize,
    /// Crossover probability
    pub crossover_probability: f64,
    /// Crossover method name
    pub crossover_method: String,
    /// Crossover parameter
    pub crossover_parameter: String,
    /// Mutation probability
    pub mutation_probability: f64,
    /// Mutation method name
    pub mutation_method: String,
    /// Mutation parameter
    pub mutation_parameter: String,
    /// Selection method name
    pub selection_method: String,
    /// Selection parameter
    pub selection_parameter: String,
}

/// One row of the run-history table
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct HistoryRow {
    #[serde(rename = "Date")]
    pub date: DateTime<Utc>,
    #[serde(rename = "Grid Size")]
    pub grid_size: usize,
    #[serde(rename = "Force")]
    pub force: f64,
    #[serde(rename = "Direction")]
    pub direction: String,
    #[serde(rename = "Number of Generations")]
    pub generations: usize,
    #[serde(rename = "Population")]
    pub population: usize,
    #[serde(rename = "Cross Over Prob")]
    pub crossover_probability: f64,
    #[serde(rename = "Cross Over Method")]
    pub crossover_method: String,
    #[serde(rename = "Cross Over Parameter")]
    pub crossover_parameter: String,
    #[serde(rename = "Mutation Probability")]
    pub mutation_probability: f64,
    #[serde(rename = "Mutation Method")]
    pub mutation_method: String,
    #[serde(rename = "Mutation Parameter")]
    pub mutation_parameter: String,
    #[serde(rename = "Selection Method")]
    pub selection_method: String,
    #[serde(rename = "Selection Parameter")]
    pub selection_parameter: String,
    #[serde(rename = "Grid File Name")]
    pub grid_file: String,
    #[serde(rename = "Log File name")]
    pub log_file: String,
}

/// Paths written for one recorded run
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RecordedRun {
    pub grid_path: PathBuf,
    pub log_path: PathBuf,
}

/// Records runs into a directory
#[derive(Clone, Debug)]
pub struct ExperimentRecorder {
    dir: PathBuf,
}

impl ExperimentRecorder {
    /// Use `dir` for records, creating it if needed
    pub fn new(dir: impl Into<PathBuf>) -> Result<Self, RecordError> {
        let dir = dir.into();
        fs::create_dir_all(&dir)?;
        Ok(Self { dir })
    }

    /// Records directory
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Path of the run-history table
    pub fn history_path(&self) -> PathBuf {
        self.dir.join(HISTORY_FILE)
    }

    /// Record the best grid of a result
    pub fn record_result<G, R>(
        &self,
        result: &EvolutionResult<G>,
        metadata: &RunMetadata,
        rng: &mut R,
    ) -> Result<RecordedRun, RecordError>
    where
        G: EvolutionaryGenome,
        R: Rng,
    {
        self.record(
            result.best_genome.grid(),
            &result.stats,
            result.best_fitness,
            metadata,
            rng,
        )
    }

    /// Write the grid and log artifacts and append a history row
    pub fn record<R: Rng>(
        &self,
        grid: &ShapeGrid,
        stats: &StatisticsLog,
        force: f64,
        metadata: &RunMetadata,
        rng: &mut R,
    ) -> Result<RecordedRun, RecordError> {
        let date = Utc::now();
        let artifacts = self.claim_artifacts(grid.rows(), &metadata.direction, &date, rng)?;
        write_bincode(artifacts.grid, grid)?;
        write_bincode(artifacts.log, stats)?;
        let grid_path = self.dir.join(&artifacts.grid_file);
        let log_path = self.dir.join(&artifacts.log_file);

        let row = HistoryRow {
            date,
            grid_size: grid.rows(),
            force,
            direction: metadata.direction.clone(),
            generations: metadata.generations,
            population: metadata.population_size,
            crossover_probability: metadata.crossover_probability,
            crossover_method: metadata.crossover_method.clone(),
            crossover_parameter: metadata.crossover_parameter.clone(),
            mutation_probability: metadata.mutation_probability,
            mutation_method: metadata.mutation_method.clone(),
            mutation_parameter: metadata.mutation_parameter.clone(),
            selection_method: metadata.selection_method.clone(),
            selection_parameter: metadata.selection_parameter.clone(),
            grid_file: artifacts.grid_file,
            log_file: artifacts.log_file,
        };
        self.append_row(&row)?;
        info!("recorded run as {}", grid_path.display());

        Ok(RecordedRun {
            grid_path,
            log_path,
        })
    }

    /// Create a fresh grid/log file pair, redrawing the suffix on collision
    ///
    /// Files are created exclusively, so an existing artifact is never
    /// truncated.
    fn claim_artifacts<R: Rng>(
        &self,
        grid_size: usize,
        direction: &str,
        date: &DateTime<Utc>,
        rng: &mut R,
    ) -> Result<Artifacts, RecordError> {
        for _ in 0..MAX_NAME_ATTEMPTS {
            let stem = artifact_stem(grid_size, direction, date, rng);
            let grid_file = format!("grid{}.bin", stem);
            let log_file = format!("log{}.bin", stem);

            let grid = match create_new(&self.dir.join(&grid_file))? {
                Some(file) => file,
                None => {
                    debug!("artifact name {} taken, redrawing", grid_file);
                    continue;
                }
            };
            match create_new(&self.dir.join(&log_file))? {
                Some(log) => {
                    return Ok(Artifacts {
                        grid_file,
                        log_file,
                        grid,
                        log,
                    })
                }
                None => {
                    debug!("artifact name {} taken, redrawing", log_file);
                    drop(grid);
                    fs::remove_file(self.dir.join(&grid_file))?;
                }
            }
        }
        Err(RecordError::Io(std::io::Error::new(
            ErrorKind::AlreadyExists,
            format!("no free artifact name after {} attempts", MAX_NAME_ATTEMPTS),
        )))
    }

    fn append_row(&self, row: &HistoryRow) -> Result<(), RecordError> {
        let path = self.history_path();
        let needs_header = fs::metadata(&path).map(|m| m.len() == 0).unwrap_or(true);
        let file = OpenOptions::new().create(true).append(true).open(&path)?;
        let mut writer = csv::WriterBuilder::new()
            .has_headers(needs_header)
            .from_writer(file);
        writer
            .serialize(row)
            .map_err(|e| RecordError::Table(e.to_string()))?;
        writer.flush()?;
        Ok(())
    }

    /// Read every row of the run-history table
    pub fn history(&self) -> Result<Vec<HistoryRow>, RecordError> {
        let path = self.history_path();
        if !path.exists() {
            return Ok(Vec::new());
        }
        let mut reader = csv::Reader::from_path(&path).map_err(|e| RecordError::Table(e.to_string()))?;
        reader
            .deserialize()
            .map(|row| row.map_err(|e| RecordError::Table(e.to_string())))
            .collect()
    }
}

/// Freshly created artifact files and their names
struct Artifacts {
    grid_file: String,
    log_file: String,
    grid: File,
    log: File,
}

/// `{size}-{direction}-{dd-mm-HHMMSS}-{pid}-{random}`
fn artifact_stem<R: Rng>(
    grid_size: usize,
    direction: &str,
    date: &DateTime<Utc>,
    rng: &mut R,
) -> String {
    format!(
        "{}-{}-{}-{}-{:04}",
        grid_size,
        direction,
        date.format("%d-%m-%H%M%S"),
        std::process::id(),
        rng.gen_range(0..10_000)
    )
}

/// Create `path` exclusively; `None` if it already exists
fn create_new(path: &Path) -> Result<Option<File>, RecordError> {
    match OpenOptions::new().write(true).create_new(true).open(path) {
        Ok(file) => Ok(Some(file)),
        Err(e) if e.kind() == ErrorKind::AlreadyExists => Ok(None),
        Err(e) => Err(e.into()),
    }
}

fn write_bincode<T: Serialize>(file: File, value: &T) -> Result<(), RecordError> {
    let mut writer = BufWriter::new(file);
    bincode::serialize_into(&mut writer, value)
        .map_err(|e| RecordError::Serialization(e.to_string()))?;
    writer.flush()?;
    Ok(())
}

/// Load a grid artifact
pub fn load_grid(path: &Path) -> Result<ShapeGrid, RecordError> {
    let reader = BufReader::new(File::open(path)?);
    bincode::deserialize_from(reader).map_err(|e| RecordError::Serialization(e.to_string()))
}

/// Load a statistics log artifact
pub fn load_log(path: &Path) -> Result<StatisticsLog, RecordError> {
    let reader = BufReader::new(File::open(path)?);
    bincode::deserialize_from(reader).map_err(|e| RecordError::Serialization(e.to_string()))
}
