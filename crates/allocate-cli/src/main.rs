use std::path::{Path, PathBuf};

use allocate_model::{ModelBuilder, Pipeline, Product, Report, Table};
use allocate_solver::{SolutionStatus, Solver};
use clap::{Parser, Subcommand, ValueEnum};
use log::LevelFilter;

#[derive(Parser)]
#[command(name = "allocate")]
#[command(about = "Allocate resource capacity to products for maximum profit", long_about = None)]
struct Cli {
    /// Increase log verbosity (-v, -vv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Solve the allocation problem for a production table
    Solve {
        /// CSV file with Resource, Product 1..3 and Resource Limit columns
        file: PathBuf,
        /// Output format
        #[arg(short, long, value_enum, default_value_t = Format::Pretty)]
        format: Format,
        /// Show shadow prices and reduced costs
        #[arg(short, long)]
        analysis: bool,
        /// Reject negative capacities instead of reporting infeasibility
        #[arg(long)]
        strict: bool,
        /// Simplex iteration limit per phase
        #[arg(long, default_value_t = 10000)]
        max_iterations: usize,
        /// Numerical tolerance (finite, greater than zero)
        #[arg(long, default_value_t = 1e-9, value_parser = parse_tolerance)]
        tolerance: f64,
    },
    /// Check a production table and preview its first rows
    Check {
        /// The file to check
        file: PathBuf,
        /// Number of rows to preview
        #[arg(short = 'n', long, default_value_t = 5)]
        rows: usize,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum Format {
    Pretty,
    Json,
}

fn parse_tolerance(s: &str) -> Result<f64, String> {
    let value: f64 = s.parse().map_err(|e| format!("{}", e))?;
    if value.is_finite() && value > 0.0 {
        Ok(value)
    } else {
        Err(format!("tolerance must be finite and greater than zero, got {}", s))
    }
}

fn init_logging(verbose: u8) {
    let level = match verbose {
        0 => LevelFilter::Warn,
        1 => LevelFilter::Info,
        2 => LevelFilter::Debug,
        _ => LevelFilter::Trace,
    };
    env_logger::Builder::new()
        .filter_level(level)
        .parse_default_env()
        .init();
}

fn read_table(file: &Path) -> Table {
    let source = match std::fs::read_to_string(file) {
        Ok(s) => s,
        Err(e) => {
            eprintln!("Error reading file: {}", e);
            std::process::exit(1);
        }
    };

    match Table::parse(&source) {
        Ok(t) => t,
        Err(e) => {
            eprintln!("Table error: {}", e);
            std::process::exit(1);
        }
    }
}

fn print_report(report: &Report, analysis: bool) {
    println!("Optimization Status: {}", report.status);

    match report.status {
        SolutionStatus::Optimal => {
            if let Some(profit) = report.objective {
                println!("Total profit: {:.2}", profit);
            }
            println!();
            println!("Selected Production Tasks:");
            if report.allocations.is_empty() {
                println!("  (none)");
            }
            for allocation in &report.allocations {
                println!("  {:30} {:8.4}", allocation.to_string(), allocation.value);
            }

            if analysis {
                println!();
                println!("Shadow prices (profit per extra unit of capacity):");
                for s in &report.sensitivity {
                    let marker = if s.binding { "binding" } else { "slack" };
                    println!("  {:20} {:10.4}  {}", s.resource, s.shadow_price, marker);
                }

                let idle: Vec<_> = report
                    .reduced_costs
                    .iter()
                    .filter(|rc| !rc.is_basic && rc.reduced_cost.abs() > 0.001)
                    .collect();
                if !idle.is_empty() {
                    println!();
                    println!("Reduced costs (products not in solution):");
                    for rc in idle {
                        println!("  {:30} {:10.4}", rc.to_string(), rc.reduced_cost);
                    }
                }
            }
        }
        SolutionStatus::Infeasible => {
            println!("No allocation satisfies every capacity limit.");
        }
        SolutionStatus::Unbounded => {
            println!("The problem has no finite optimal solution.");
        }
        SolutionStatus::NotSolved => {
            println!("The solver stopped before reaching a verdict.");
        }
        SolutionStatus::Undefined => {
            println!("The solver could not interpret the problem.");
        }
    }
}

fn main() {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match cli.command {
        Commands::Solve {
            file,
            format,
            analysis,
            strict,
            max_iterations,
            tolerance,
        } => {
            let table = read_table(&file);
            let data = match table.to_production_data() {
                Ok(d) => d,
                Err(e) => {
                    eprintln!("Input error: {}", e);
                    std::process::exit(1);
                }
            };

            let builder = ModelBuilder::new().strict(strict);
            let built = match Pipeline::new(data).build(&builder) {
                Ok(b) => b,
                Err(e) => {
                    eprintln!("{}", e);
                    std::process::exit(1);
                }
            };

            let solver = Solver::new()
                .with_max_iterations(max_iterations)
                .with_tolerance(tolerance);
            let solved = match built.solve(&solver) {
                Ok(s) => s,
                Err(e) => {
                    eprintln!("{}", e);
                    std::process::exit(1);
                }
            };

            let report = solved.report();
            match format {
                Format::Json => match serde_json::to_string_pretty(&report) {
                    Ok(json) => println!("{}", json),
                    Err(e) => {
                        eprintln!("Error serializing report: {}", e);
                        std::process::exit(1);
                    }
                },
                Format::Pretty => print_report(&report, analysis),
            }

            if !report.is_optimal() {
                std::process::exit(1);
            }
        }
        Commands::Check { file, rows } => {
            let table = read_table(&file);

            println!("Dataset head:");
            println!("  {}", table.headers().join(" | "));
            for fields in table.head(rows) {
                println!("  {}", fields.join(" | "));
            }
            println!();

            match table.to_production_data() {
                Ok(data) => {
                    let negative = data.negative_capacities();
                    println!("✓ {} is valid", file.display());
                    println!("  {} resources", data.len());
                    println!("  {} variables", data.len() * Product::ALL.len());
                    if !negative.is_empty() {
                        println!("  {} negative capacities (model will be infeasible):", negative.len());
                        for r in negative {
                            println!("    {} {}", r.name, r.capacity);
                        }
                    }
                }
                Err(e) => {
                    eprintln!("✗ {} has errors:", file.display());
                    eprintln!("  {}", e);
                    std::process::exit(1);
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tolerance_must_be_finite_and_positive() {
        assert_eq!(parse_tolerance("1e-6"), Ok(1e-6));
        for bad in ["NaN", "-1", "0", "inf", "abc"] {
            assert!(parse_tolerance(bad).is_err(), "{} accepted", bad);
        }
    }

    #[test]
    fn test_cli_rejects_nan_tolerance() {
        let result = Cli::try_parse_from(["allocate", "solve", "data.csv", "--tolerance", "NaN"]);
        assert!(result.is_err());

        let cli = Cli::try_parse_from(["allocate", "solve", "data.csv", "--tolerance", "1e-7"]).unwrap();
        match cli.command {
            Commands::Solve { tolerance, .. } => assert_eq!(tolerance, 1e-7),
            _ => panic!("expected solve"),
        }
    }
}
