//! Bin packing instance generator, solver and benchmark CLI

use binpack_benchmark::{
    load_instances, results_path, save_collection, save_instances, BenchmarkConfig,
    BenchmarkRunner, GeneratorConfig, InstanceGenerator, Variability,
};
use binpack_core::{
    lower_bound, total_size, Algorithm, BinPacker, Config, CspConfig, CspEncoding, PackingSummary,
    VariableSelection,
};
use clap::{Parser, Subcommand, ValueEnum};
use std::path::{Path, PathBuf};
use std::time::Instant;

#[derive(Parser)]
#[command(name = "binpack")]
#[command(about = "One-dimensional bin packing heuristics and constraint search")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List available algorithms
    List,

    /// Generate random packing lists
    Generate {
        /// Number of items per instance
        #[arg(short = 'n', long, default_value = "100")]
        count: usize,

        /// Bin capacity
        #[arg(short, long, default_value = "100")]
        max: u64,

        /// Center of the size distribution (default: half the capacity)
        #[arg(short, long)]
        center: Option<u64>,

        /// Spread of the size distribution
        #[arg(short, long, value_enum, default_value = "low")]
        variability: VariabilityArg,

        /// Algorithms to record in the generated lists
        #[arg(short, long, value_enum, default_values_t = vec![AlgorithmArg::Ffd])]
        algorithms: Vec<AlgorithmArg>,

        /// Instances per configuration
        #[arg(short, long, default_value = "1")]
        dups: usize,

        /// Generate the full center/count/variability grid instead
        #[arg(long)]
        grid: bool,

        /// Random seed for reproducibility
        #[arg(short, long)]
        seed: Option<u64>,

        /// Output directory
        #[arg(short, long, default_value = "data")]
        output: PathBuf,
    },

    /// Pack a packing list file, or every list in a directory
    Solve {
        /// Packing list file or directory
        path: PathBuf,

        /// Override the algorithm recorded in the lists
        #[arg(short, long, value_enum)]
        algorithm: Option<AlgorithmArg>,

        #[command(flatten)]
        csp: CspArgs,

        /// Do not write `*_results.json` files
        #[arg(long)]
        dry_run: bool,
    },

    /// Run benchmarks over a packing list file or directory
    Bench {
        /// Packing list file or directory
        path: PathBuf,

        /// Preset configuration
        #[arg(short, long, value_enum, default_value = "quick")]
        preset: Preset,

        /// Algorithms to benchmark (overrides the preset)
        #[arg(short, long, value_enum)]
        algorithms: Vec<AlgorithmArg>,

        /// Number of runs per instance and algorithm (overrides the preset)
        #[arg(short, long)]
        repeats: Option<usize>,

        #[command(flatten)]
        csp: CspArgs,

        /// Process instances one at a time
        #[arg(long)]
        sequential: bool,

        /// Output file for results (JSON)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Output file for CSV results
        #[arg(long)]
        csv: Option<PathBuf>,
    },

    /// Print the lower bound of a packing list file or directory
    LowerBound {
        /// Packing list file or directory
        path: PathBuf,
    },
}

#[derive(clap::Args)]
struct CspArgs {
    /// Constraint search time limit in milliseconds (0 = unlimited)
    #[arg(short, long)]
    time_limit: Option<u64>,

    /// Constraint model variable layout
    #[arg(long, value_enum, default_value = "placement")]
    encoding: EncodingArg,

    /// Multiplier applied to the lower bound to size the bin set
    #[arg(long, default_value = "1.0")]
    bin_slack: f64,

    /// Branch on the variable with the smallest domain first
    #[arg(long)]
    mrv: bool,
}

impl CspArgs {
    fn to_config(&self) -> CspConfig {
        let selection = if self.mrv {
            VariableSelection::MinimumRemainingValues
        } else {
            VariableSelection::InputOrder
        };
        CspConfig::new()
            .with_encoding(self.encoding.into())
            .with_bin_slack(self.bin_slack)
            .with_variable_selection(selection)
            .with_time_limit_ms(self.time_limit.unwrap_or(0))
    }
}

#[derive(Clone, Copy, ValueEnum)]
enum AlgorithmArg {
    /// Next-Fit
    Nf,
    /// First-Fit
    Ff,
    /// First-Fit-Decreasing
    Ffd,
    /// Best-Fit
    Bf,
    /// Best-Fit-Decreasing
    Bfd,
    /// Modified First-Fit-Decreasing
    Mffd,
    /// Constraint programming
    Cp,
}

impl From<AlgorithmArg> for Algorithm {
    fn from(arg: AlgorithmArg) -> Self {
        match arg {
            AlgorithmArg::Nf => Algorithm::NextFit,
            AlgorithmArg::Ff => Algorithm::FirstFit,
            AlgorithmArg::Ffd => Algorithm::FirstFitDecreasing,
            AlgorithmArg::Bf => Algorithm::BestFit,
            AlgorithmArg::Bfd => Algorithm::BestFitDecreasing,
            AlgorithmArg::Mffd => Algorithm::ModifiedFirstFitDecreasing,
            AlgorithmArg::Cp => Algorithm::ConstraintProgramming,
        }
    }
}

#[derive(Clone, Copy, ValueEnum)]
enum VariabilityArg {
    High,
    Medium,
    Low,
}

impl From<VariabilityArg> for Variability {
    fn from(arg: VariabilityArg) -> Self {
        match arg {
            VariabilityArg::High => Variability::High,
            VariabilityArg::Medium => Variability::Medium,
            VariabilityArg::Low => Variability::Low,
        }
    }
}

#[derive(Clone, Copy, ValueEnum)]
enum EncodingArg {
    /// One bin index per item
    Placement,
    /// One 0/1 variable per item and bin
    Indicator,
}

impl From<EncodingArg> for CspEncoding {
    fn from(arg: EncodingArg) -> Self {
        match arg {
            EncodingArg::Placement => CspEncoding::Placement,
            EncodingArg::Indicator => CspEncoding::Indicator,
        }
    }
}

#[derive(Clone, Copy, ValueEnum)]
enum Preset {
    /// Heuristics only, one run
    Quick,
    /// Every algorithm, three runs
    Standard,
}

fn init_tracing() {
    use tracing_subscriber::{fmt, prelude::*, EnvFilter};

    // Only initialize if RUST_LOG is set
    if std::env::var("RUST_LOG").is_ok() {
        tracing_subscriber::registry()
            .with(fmt::layer().with_target(true).with_level(true))
            .with(EnvFilter::from_default_env())
            .init();
    }
}

fn main() -> anyhow::Result<()> {
    init_tracing();
    let cli = Cli::parse();

    match cli.command {
        Commands::List => {
            println!("Available algorithms:");
            println!("=====================");
            for algorithm in Algorithm::ALL {
                let kind = if algorithm.is_online_rule() {
                    "item by item"
                } else {
                    "whole list"
                };
                let order = if algorithm.is_decreasing() {
                    "decreasing"
                } else {
                    "input order"
                };
                println!(
                    "  {:<5} {:<28} {:<12} {}",
                    algorithm.short_name(),
                    algorithm.name(),
                    order,
                    kind
                );
            }
            println!("\nUse 'binpack solve -a <ALGORITHM> <FILE>' to pack a list");
        }

        Commands::Generate {
            count,
            max,
            center,
            variability,
            algorithms,
            dups,
            grid,
            seed,
            output,
        } => {
            let configs = if grid {
                GeneratorConfig::grid(max)
            } else {
                vec![GeneratorConfig::new()
                    .with_count(count)
                    .with_max(max)
                    .with_center(center.unwrap_or(max / 2))
                    .with_variability(variability.into())]
            };

            let mut generator = match seed {
                Some(seed) => InstanceGenerator::with_seed(seed),
                None => InstanceGenerator::new(),
            };

            let mut lists = Vec::with_capacity(configs.len() * algorithms.len() * dups);
            for config in &configs {
                for _ in 0..dups {
                    for &algorithm in &algorithms {
                        lists.push(generator.generate(config, algorithm.into())?);
                    }
                }
            }

            let written = save_instances(&lists, &output)?;
            println!(
                "Generated {} packing lists in {}",
                written.len(),
                output.display()
            );
        }

        Commands::Solve {
            path,
            algorithm,
            csp,
            dry_run,
        } => {
            let packer = BinPacker::new(Config::new().with_csp(csp.to_config()));

            for (name, mut list) in load_instances(&path)? {
                if let Some(algorithm) = algorithm {
                    list = list.with_algorithm(algorithm.into());
                }
                if list.lower_bound.is_none() {
                    list = list.with_computed_lower_bound()?;
                }

                let start = Instant::now();
                let mut collection = match packer.solve(&list) {
                    Ok(collection) => collection,
                    Err(e) => {
                        eprintln!("{}: {} failed: {}", name, list.algorithm, e);
                        continue;
                    }
                };
                collection.set_solution_time(start.elapsed().as_nanos() as u64);

                let summary = PackingSummary::new(&collection, list.lower_bound);
                println!(
                    "{}: {} ({:.3}ms)",
                    name,
                    summary,
                    summary.solution_time_ms().unwrap_or(0.0)
                );

                if !dry_run {
                    let target = results_file(&path, &name);
                    save_collection(&collection, &target)?;
                    println!("  saved to {}", target.display());
                }
            }
        }

        Commands::Bench {
            path,
            preset,
            algorithms,
            repeats,
            csp,
            sequential,
            output,
            csv,
        } => {
            let mut config = match preset {
                Preset::Quick => BenchmarkConfig::quick(),
                Preset::Standard => BenchmarkConfig::standard(),
            };
            if let Some(ms) = csp.time_limit {
                config = config.with_time_limit(ms);
            }
            config = config
                .with_csp(csp.to_config())
                .with_parallel(!sequential);
            if !algorithms.is_empty() {
                config = config.with_algorithms(algorithms.into_iter().map(Into::into).collect());
            }
            if let Some(repeats) = repeats {
                config = config.with_repeats(repeats);
            }

            let instances = load_instances(&path)?;
            if instances.is_empty() {
                anyhow::bail!("no packing lists found in {}", path.display());
            }

            let runner = BenchmarkRunner::new(config);
            let results = runner.run_all(&instances);
            results.print_summary();

            if let Some(path) = output {
                results.save_json(&path)?;
                println!("Results saved to: {}", path.display());
            }

            if let Some(path) = csv {
                results.save_csv(&path)?;
                println!("CSV saved to: {}", path.display());
            }
        }

        Commands::LowerBound { path } => {
            for (name, list) in load_instances(&path)? {
                let bound = lower_bound(&list.items, list.capacity)?;
                println!(
                    "{}: lower bound {} ({} items, total size {}, capacity {})",
                    name,
                    bound,
                    list.items.len(),
                    total_size(&list.items),
                    list.capacity
                );
            }
        }
    }

    Ok(())
}

/// Result file for instance `name` loaded from `source`.
fn results_file(source: &Path, name: &str) -> PathBuf {
    if source.is_file() {
        results_path(source)
    } else {
        source.join(format!("{name}_results.json"))
    }
}
