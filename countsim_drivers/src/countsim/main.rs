mod play;

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use countsim::{CountingKind, SimulationRunner, TableRules};
use countsim_drivers::{
    format_rows, load_default_config, parse_config_from_file, run_grid, Config, ConfigFileError,
};
use log::error;

const DEFAULT_CONFIG_PATH: &str = "~/.countsim.yml";

#[derive(Debug, Parser)]
#[command(author, about, long_about = None)]
struct CommandLineArgs {
    /// The path of the config file
    #[arg(short, long, default_value_t = String::from(DEFAULT_CONFIG_PATH))]
    config: String,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Compares the configured strategies over deck counts and seat positions
    Grid {
        /// Print the rows as YAML instead of a table
        #[arg(long)]
        yaml: bool,
    },
    /// Runs one simulation and prints the balance after every round
    Trajectory {
        /// Number of rounds, defaults to the experiment's
        #[arg(short, long)]
        rounds: Option<u64>,
    },
    /// Plays the tracked seat from the terminal
    Play {
        /// Counting strategy code: 1 None, 2 HiLow, 3 KO, 4 Five Count
        #[arg(long)]
        strategy: Option<u8>,
        /// Show the basic-strategy advice before every decision
        #[arg(long)]
        advice: bool,
    },
}

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args = CommandLineArgs::parse();
    if let Err(err) = run(args) {
        error!("{}", err);
        std::process::exit(1);
    }
}

fn run(args: CommandLineArgs) -> Result<(), Box<dyn std::error::Error>> {
    let config = if args.config == DEFAULT_CONFIG_PATH {
        load_default_config()?
    } else {
        parse_config_from_file(&PathBuf::from(&args.config))?
    };

    match args.command {
        Command::Grid { yaml } => grid(&config, yaml),
        Command::Trajectory { rounds } => Ok(trajectory(&config, rounds)?),
        Command::Play { strategy, advice } => {
            let counting = match strategy {
                Some(code) => CountingKind::from_code(code)?,
                None => config.table.counting_kind()?,
            };
            let rules: TableRules = (&config.table).try_into()?;
            play::play(&rules, counting, advice)?;
            Ok(())
        }
    }
}

fn grid(config: &Config, yaml: bool) -> Result<(), Box<dyn std::error::Error>> {
    let rows = run_grid(config)?;
    if yaml {
        print!("{}", serde_yaml::to_string(&rows)?);
    } else {
        print!("{}", format_rows(&rows));
    }
    Ok(())
}

fn trajectory(config: &Config, rounds: Option<u64>) -> Result<(), ConfigFileError> {
    let rules: TableRules = (&config.table).try_into()?;
    let counting = config.table.counting_kind()?;
    let runner = SimulationRunner::new(&rules)?;
    let result = runner.run_simulation(
        counting,
        rounds.unwrap_or(config.experiment.num_rounds),
        config.table.use_basic_strategy,
    )?;

    println!("{:>6}  {:>10}", "Round", "Balance");
    for (round, balance) in result.trajectory.iter().enumerate() {
        println!("{:>6}  {:>10.2}", round, balance);
    }
    println!(
        "{} rounds played, final balance {:.2}",
        result.rounds_played, result.final_balance
    );
    Ok(())
}
