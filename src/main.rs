//! dipole-evo CLI - evolve a sail shape against the dipole simulator.

use std::path::PathBuf;
use std::time::Instant;

use log::info;
use rand::rngs::StdRng;
use rand::SeedableRng;

use dipole_evo::prelude::*;

/// Command-line flags preceding the nine run parameters
#[derive(Debug, Default)]
struct Flags {
    adaptive: bool,
    symmetric: bool,
    sequential: bool,
    workers: Option<usize>,
    seed: Option<u64>,
    records: Option<PathBuf>,
    config: Option<PathBuf>,
    positional: Vec<String>,
}

fn usage(program: &str) {
    eprintln!("Usage: {} [flags] <density> <tile> <grid> <pop> <gens> <tourn> <cx_p> <mut_p> <indpb>", program);
    eprintln!();
    eprintln!("Evolve a light-sail shape grid, scoring each grid with the dipole simulator.");
    eprintln!();
    eprintln!("Flags:");
    eprintln!("  --adaptive      Self-adaptive GA (SUS selection, evolving rates)");
    eprintln!("  --symmetric     Evolve the left half; the simulator sees the mirrored grid");
    eprintln!("  --sequential    Evaluate one grid at a time");
    eprintln!("  --workers N     Number of concurrent evaluations (default: one per core)");
    eprintln!("  --seed N        Seed the random number generator");
    eprintln!("  --records DIR   Record the run into DIR");
    eprintln!("  --config FILE   Read the run parameters from a JSON file");
    eprintln!();
    eprintln!("Environment:");
    eprintln!("  DIPOLE_EVO_SIMULATOR   Simulator executable (default: adda)");
    eprintln!("  DIPOLE_EVO_WORKDIR     Directory for work units (default: .)");
    eprintln!("  DIPOLE_EVO_KEEP_FILES  Keep work units after evaluation (1/true)");
}

fn parse_flags(args: &[String]) -> Result<Flags, String> {
    let mut flags = Flags::default();
    let mut iter = args.iter().skip(1);
    while let Some(arg) = iter.next() {
        match arg.as_str() {
            "--adaptive" => flags.adaptive = true,
            "--symmetric" => flags.symmetric = true,
            "--sequential" => flags.sequential = true,
            "--workers" => {
                let value = iter.next().ok_or("--workers needs a value")?;
                flags.workers = Some(value.parse().map_err(|_| format!("invalid worker count {:?}", value))?);
            }
            "--seed" => {
                let value = iter.next().ok_or("--seed needs a value")?;
                flags.seed = Some(value.parse().map_err(|_| format!("invalid seed {:?}", value))?);
            }
            "--records" => {
                let value = iter.next().ok_or("--records needs a value")?;
                flags.records = Some(PathBuf::from(value));
            }
            "--config" => {
                let value = iter.next().ok_or("--config needs a value")?;
                flags.config = Some(PathBuf::from(value));
            }
            "-h" | "--help" => return Err(String::new()),
            _ => flags.positional.push(arg.clone()),
        }
    }
    Ok(flags)
}

fn simulator_config(params: &RunParameters) -> SimulatorConfig {
    let executable = std::env::var("DIPOLE_EVO_SIMULATOR").unwrap_or_else(|_| "adda".to_string());
    let working_dir = std::env::var("DIPOLE_EVO_WORKDIR").unwrap_or_else(|_| ".".to_string());
    let keep_files = std::env::var("DIPOLE_EVO_KEEP_FILES")
        .map(|v| v == "1" || v.eq_ignore_ascii_case("true"))
        .unwrap_or(false);
    SimulatorConfig::new(executable)
        .with_working_dir(working_dir)
        .with_density_factor(params.density_factor)
        .with_keep_files(keep_files)
}

fn build_oracle(params: &RunParameters, symmetric: bool) -> Box<dyn FitnessOracle> {
    let tiled = TiledOracle::new(AddaOracle::new(simulator_config(params)), params.tile_factor);
    if symmetric {
        Box::new(MirroredOracle::new(tiled))
    } else {
        Box::new(tiled)
    }
}

fn run_metadata(params: &RunParameters, adaptive: bool) -> RunMetadata {
    let (selection_method, selection_parameter) = if adaptive {
        ("Stochastic Universal", "None".to_string())
    } else {
        ("Tournament", params.tournament_size.to_string())
    };
    RunMetadata {
        direction: "x".to_string(),
        generations: params.generations,
        population_size: params.population_size,
        crossover_probability: params.crossover_probability,
        crossover_method: if adaptive { "Adaptive Two Point" } else { "Two Point" }.to_string(),
        crossover_parameter: "None".to_string(),
        mutation_probability: params.mutation_probability,
        mutation_method: if adaptive { "Adaptive Flip Bit" } else { "Flip Bit" }.to_string(),
        mutation_parameter: params.indpb.to_string(),
        selection_method: selection_method.to_string(),
        selection_parameter,
    }
}

fn run(flags: &Flags) -> EvoResult<()> {
    let params = match &flags.config {
        Some(path) => RunParameters::from_json_file(path)?,
        None => RunParameters::from_args(&flags.positional)?,
    };

    let dispatch = if flags.sequential {
        DispatchMode::Sequential
    } else {
        DispatchMode::Parallel {
            workers: flags.workers.unwrap_or(0),
        }
    };
    let mut rng = match flags.seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_entropy(),
    };

    println!("dipole-evo");
    println!("==========");
    println!("Density factor:  {}", params.density_factor);
    println!("Tile factor:     {}", params.tile_factor);
    println!("Grid size:       {}", params.grid_size);
    println!("Population:      {}", params.population_size);
    println!("Generations:     {}", params.generations);
    println!("Tournament size: {}", params.tournament_size);
    println!("Crossover prob:  {}", params.crossover_probability);
    println!("Mutation prob:   {}", params.mutation_probability);
    println!("Cell flip prob:  {}", params.indpb);
    println!(
        "Mode:            {}{}",
        if flags.adaptive { "adaptive" } else { "simple" },
        if flags.symmetric { ", symmetric" } else { "" }
    );
    println!();

    let start = Instant::now();
    let oracle = build_oracle(&params, flags.symmetric);
    let layout = params.layout(flags.symmetric);

    let (grid, stats, best_fitness) = if flags.adaptive {
        let result = AdaptiveGABuilder::new()
            .population_size(params.population_size)
            .generations(params.generations)
            .initial_params(params.initial_params())
            .layout(layout)
            .dispatch(dispatch)
            .oracle(oracle)
            .build()?
            .run(&mut rng)?;
        info!("final strategy parameters: {:?}", result.best_genome.params);
        (result.best_genome.grid, result.stats, result.best_fitness)
    } else {
        let result = SimpleGABuilder::<ShapeGrid, _, _, _, _>::new()
            .population_size(params.population_size)
            .generations(params.generations)
            .crossover_probability(params.crossover_probability)
            .mutation_probability(params.mutation_probability)
            .layout(layout)
            .dispatch(dispatch)
            .selection(
                TournamentSelection::new(params.tournament_size)
                    .with_sampling(ContestantSampling::WithReplacement),
            )
            .crossover(TwoPointCrossover::new())
            .mutation(BitFlipMutation::new(params.indpb))
            .oracle(oracle)
            .build()?
            .run(&mut rng)?;
        (result.best_genome, result.stats, result.best_fitness)
    };
    let grid = if flags.symmetric {
        mirror_columns(&grid)
    } else {
        grid
    };

    println!("{}", stats.table());
    println!("{}", stats.summary());
    println!();
    println!("Best force: {:.6}", best_fitness);
    println!("{}", grid);

    if let Some(dir) = &flags.records {
        let recorder = ExperimentRecorder::new(dir)?;
        let recorded = recorder.record(
            &grid,
            &stats,
            best_fitness,
            &run_metadata(&params, flags.adaptive),
            &mut rng,
        )?;
        println!("Recorded: {}", recorded.grid_path.display());
    }

    let elapsed = start.elapsed().as_secs_f64();
    println!(
        "Time taken: {:.1}s, which is {:.2} mins, and {:.3} hours.",
        elapsed,
        elapsed / 60.0,
        elapsed / 3600.0
    );
    Ok(())
}

fn main() {
    env_logger::init();

    let args: Vec<String> = std::env::args().collect();
    let program = args.first().map(String::as_str).unwrap_or("dipole-evo");

    let flags = parse_flags(&args).unwrap_or_else(|e| {
        if !e.is_empty() {
            eprintln!("Error: {}", e);
        }
        usage(program);
        std::process::exit(1);
    });

    if flags.config.is_none() && flags.positional.len() < RUN_PARAMETER_COUNT {
        usage(program);
        std::process::exit(1);
    }

    if let Err(e) = run(&flags) {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}
