use countsim::{CountingKind, GameError, SimulationRunner, TableRules};
use serde::{Deserialize, Serialize};
use std::{
    fmt::Write as _,
    fs,
    path::{Path, PathBuf},
};
use thiserror::Error;

pub const DEFAULT_CONFIG_FILE_NAME: &str = ".countsim.yml";

#[derive(Error, Debug)]
pub enum ConfigFileError {
    #[error("cannot read config file {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("cannot parse config file {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },
    #[error("unknown counting strategy: {0}")]
    Counting(#[from] serde::de::value::Error),
    #[error(transparent)]
    Game(#[from] GameError),
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub table: ConfigTable,
    pub experiment: ConfigExperiment,
}

/// The table used by `trajectory` and `play`, and the base of every grid
/// cell.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ConfigTable {
    pub number_of_decks: u8,
    pub number_of_seats: usize,
    pub tracked_seat: usize,
    pub base_bet: u32,
    pub initial_balance: f64,
    pub payout_blackjack: f64,
    pub reshuffle_min: f64,
    pub reshuffle_max: f64,
    pub ko_middle_threshold: i32,
    pub bots_use_basic_strategy: bool,
    pub seed: u64,

    pub counting: String,
    pub use_basic_strategy: bool,
}

impl Default for ConfigTable {
    fn default() -> Self {
        let rules = TableRules::default();
        ConfigTable {
            number_of_decks: rules.number_of_decks,
            number_of_seats: rules.number_of_seats,
            tracked_seat: rules.tracked_seat,
            base_bet: rules.base_bet,
            initial_balance: rules.initial_balance,
            payout_blackjack: rules.payout_blackjack,
            reshuffle_min: rules.reshuffle_min,
            reshuffle_max: rules.reshuffle_max,
            ko_middle_threshold: rules.ko_middle_threshold,
            bots_use_basic_strategy: rules.bots_use_basic_strategy,
            seed: rules.seed,
            counting: String::from("HiLow"),
            use_basic_strategy: true,
        }
    }
}

impl ConfigTable {
    pub fn counting_kind(&self) -> Result<CountingKind, ConfigFileError> {
        Ok(self.counting.parse()?)
    }
}

impl TryFrom<&ConfigTable> for TableRules {
    type Error = GameError;

    fn try_from(table: &ConfigTable) -> Result<TableRules, Self::Error> {
        let rules = TableRules {
            number_of_decks: table.number_of_decks,
            number_of_seats: table.number_of_seats,
            tracked_seat: table.tracked_seat,
            base_bet: table.base_bet,
            initial_balance: table.initial_balance,
            payout_blackjack: table.payout_blackjack,
            reshuffle_min: table.reshuffle_min,
            reshuffle_max: table.reshuffle_max,
            ko_middle_threshold: table.ko_middle_threshold,
            bots_use_basic_strategy: table.bots_use_basic_strategy,
            seed: table.seed,
        };
        rules.validate()?;
        Ok(rules)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StrategyProfile {
    pub name: String,
    pub counting: String,
    pub use_basic_strategy: bool,
}

impl StrategyProfile {
    fn new(name: &str, counting: &str, use_basic_strategy: bool) -> StrategyProfile {
        StrategyProfile {
            name: String::from(name),
            counting: String::from(counting),
            use_basic_strategy,
        }
    }

    /// The five strategies compared in every grid cell by default.
    pub fn standard_lineup() -> Vec<StrategyProfile> {
        vec![
            StrategyProfile::new("Play like dealer, same bet", "None", false),
            StrategyProfile::new("Basic Strategy, same bet", "None", true),
            StrategyProfile::new("HiLow + Basic Strategy", "HiLow", true),
            StrategyProfile::new("KO + Basic Strategy", "KO", true),
            StrategyProfile::new("Five Count + Basic Strategy", "FiveCount", true),
        ]
    }

    pub fn counting_kind(&self) -> Result<CountingKind, ConfigFileError> {
        Ok(self.counting.parse()?)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ConfigExperiment {
    pub deck_counts: Vec<u8>,
    /// Zero-based seat positions tracked at the multi-seat table.
    pub seat_positions: Vec<usize>,
    pub number_of_seats: usize,
    pub num_simulations: usize,
    pub num_rounds: u64,
    pub seed: u64,
    pub strategies: Vec<StrategyProfile>,
}

impl Default for ConfigExperiment {
    fn default() -> Self {
        ConfigExperiment {
            deck_counts: vec![1, 3, 5, 8],
            seat_positions: vec![0, 2, 4, 6],
            number_of_seats: 7,
            num_simulations: 1000,
            num_rounds: 1000,
            seed: 42,
            strategies: StrategyProfile::standard_lineup(),
        }
    }
}

/// One line of the reporting table.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ExperimentRow {
    pub decks: u8,
    pub position: String,
    pub strategy: String,
    pub average_final_balance: f64,
}

/// Reads the content of a given config file and parses it to a Config.
pub fn parse_config_from_file(path: &Path) -> Result<Config, ConfigFileError> {
    let file_content = fs::read_to_string(path).map_err(|source| ConfigFileError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    serde_yaml::from_str(&file_content).map_err(|source| ConfigFileError::Parse {
        path: path.to_path_buf(),
        source,
    })
}

/// Loads `~/.countsim.yml`, or the built-in defaults when it does not exist.
pub fn load_default_config() -> Result<Config, ConfigFileError> {
    match home::home_dir().map(|home_dir| home_dir.join(DEFAULT_CONFIG_FILE_NAME)) {
        Some(path) if path.is_file() => parse_config_from_file(&path),
        _ => {
            log::info!("no {} found, using built-in defaults", DEFAULT_CONFIG_FILE_NAME);
            Ok(Config::default())
        }
    }
}

/// Runs every strategy for every deck count, first at a single-seat table and
/// then at each tracked position of the multi-seat table.
pub fn run_grid(config: &Config) -> Result<Vec<ExperimentRow>, ConfigFileError> {
    let experiment = &config.experiment;
    let mut base: TableRules = (&config.table).try_into()?;
    base.seed = experiment.seed;

    let mut tables = Vec::new();
    for &decks in &experiment.deck_counts {
        let mut single = base;
        single.number_of_decks = decks;
        single.number_of_seats = 1;
        single.tracked_seat = 0;
        tables.push((String::from("Single Player"), single));

        for &position in &experiment.seat_positions {
            let mut multi = base;
            multi.number_of_decks = decks;
            multi.number_of_seats = experiment.number_of_seats;
            multi.tracked_seat = position;
            tables.push((format!("Position {}", position + 1), multi));
        }
    }

    let mut rows = Vec::new();
    for (position, rules) in tables {
        let runner = SimulationRunner::new(&rules)?;
        for profile in &experiment.strategies {
            let summary = runner.run_multiple_simulations(
                profile.counting_kind()?,
                experiment.num_simulations,
                experiment.num_rounds,
                profile.use_basic_strategy,
            )?;
            rows.push(ExperimentRow {
                decks: rules.number_of_decks,
                position: position.clone(),
                strategy: profile.name.clone(),
                average_final_balance: summary.average_final_balance,
            });
        }
    }
    Ok(rows)
}

/// Lays the rows out as an aligned text table.
pub fn format_rows(rows: &[ExperimentRow]) -> String {
    let position_width = rows
        .iter()
        .map(|row| row.position.len())
        .chain(std::iter::once("Position".len()))
        .max()
        .unwrap_or_default();
    let strategy_width = rows
        .iter()
        .map(|row| row.strategy.len())
        .chain(std::iter::once("Strategy".len()))
        .max()
        .unwrap_or_default();

    let mut out = String::new();
    let _ = writeln!(
        out,
        "{:>5}  {:<pw$}  {:<sw$}  {:>15}",
        "Decks",
        "Position",
        "Strategy",
        "Average Balance",
        pw = position_width,
        sw = strategy_width
    );
    for row in rows {
        let _ = writeln!(
            out,
            "{:>5}  {:<pw$}  {:<sw$}  {:>15.2}",
            row.decks,
            row.position,
            row.strategy,
            row.average_final_balance,
            pw = position_width,
            sw = strategy_width
        );
    }
    out
}
