//! Monte-Carlo driver: many rounds per simulation, many simulations per batch.

use log::{debug, info};
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use rayon::prelude::*;
use serde::Serialize;

use crate::{
    simulation::{NoopHandler, RoundEngine},
    strategy::{BasicStrategy, DealerMimic, SeatPolicy},
    CountingKind, GameError, TableRules,
};

/// The tracked seat stops playing once it cannot place a whole unit.
const MIN_PLAYABLE_BALANCE: f64 = 1.0;

#[derive(Debug, Clone, PartialEq)]
pub struct SimulationResult {
    /// Tracked balance after every round, starting with the initial balance.
    pub trajectory: Vec<f64>,
    pub final_balance: f64,
    pub rounds_played: u64,
}

/// Aggregate of one batch. Final balances are floored at zero before
/// aggregation.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BatchSummary {
    pub label: String,
    pub simulations: usize,
    pub average_final_balance: f64,
    pub min_final_balance: f64,
    pub max_final_balance: f64,
    /// Simulations that ended before their last round for lack of money.
    pub ruined: usize,
}

impl BatchSummary {
    fn from_results(label: String, num_rounds: u64, results: &[SimulationResult]) -> BatchSummary {
        let finals: Vec<f64> = results
            .iter()
            .map(|result| result.final_balance.max(0.0))
            .collect();
        let simulations = finals.len();
        BatchSummary {
            label,
            simulations,
            average_final_balance: finals.iter().sum::<f64>() / simulations as f64,
            min_final_balance: finals.iter().copied().fold(f64::INFINITY, f64::min),
            max_final_balance: finals.iter().copied().fold(f64::NEG_INFINITY, f64::max),
            ruined: results
                .iter()
                .filter(|result| result.rounds_played < num_rounds)
                .count(),
        }
    }
}

pub struct SimulationRunner {
    rules: TableRules,
}

impl SimulationRunner {
    pub fn new(rules: &TableRules) -> Result<SimulationRunner, GameError> {
        rules.validate()?;
        Ok(SimulationRunner { rules: *rules })
    }

    pub fn rules(&self) -> &TableRules {
        &self.rules
    }

    /// Runs one simulation from the configured seed.
    pub fn run_simulation(
        &self,
        counting: CountingKind,
        num_rounds: u64,
        use_basic_strategy: bool,
    ) -> Result<SimulationResult, GameError> {
        let rng = ChaCha8Rng::seed_from_u64(self.rules.seed);
        self.run_simulation_with_rng(counting, num_rounds, use_basic_strategy, rng)
    }

    /// Plays up to `num_rounds` rounds at a fresh table, stopping early when
    /// the tracked balance drops below one unit. Each round's wager is the
    /// counter's recommendation capped at the whole balance.
    pub fn run_simulation_with_rng(
        &self,
        counting: CountingKind,
        num_rounds: u64,
        use_basic_strategy: bool,
        rng: ChaCha8Rng,
    ) -> Result<SimulationResult, GameError> {
        let mut engine = RoundEngine::new(&self.rules, counting, rng)?;
        if use_basic_strategy {
            play_rounds(&mut engine, num_rounds, &mut BasicStrategy::new())?;
        } else {
            play_rounds(&mut engine, num_rounds, &mut DealerMimic)?;
        }
        Ok(SimulationResult {
            trajectory: engine.wealth_trajectory().to_vec(),
            final_balance: engine.tracked_balance(),
            rounds_played: engine.rounds_played(),
        })
    }

    /// Runs `num_simulations` independent simulations in parallel. Simulation
    /// `i` draws from stream `i` of the configured seed, so the result does
    /// not depend on scheduling.
    pub fn run_multiple_simulations(
        &self,
        counting: CountingKind,
        num_simulations: usize,
        num_rounds: u64,
        use_basic_strategy: bool,
    ) -> Result<BatchSummary, GameError> {
        if num_simulations == 0 {
            return Err(GameError::Config(
                "num_simulations must be positive".to_string(),
            ));
        }
        let results = (0..num_simulations)
            .into_par_iter()
            .map(|index| {
                let mut rng = ChaCha8Rng::seed_from_u64(self.rules.seed);
                rng.set_stream(index as u64);
                self.run_simulation_with_rng(counting, num_rounds, use_basic_strategy, rng)
            })
            .collect::<Result<Vec<_>, _>>()?;

        let label = format!(
            "{} + {}",
            counting.label(),
            if use_basic_strategy {
                "Basic Strategy"
            } else {
                "Dealer Mimic"
            }
        );
        let summary = BatchSummary::from_results(label, num_rounds, &results);
        info!(
            "{}: {} simulations x {} rounds, average final balance {:.2}",
            summary.label, summary.simulations, num_rounds, summary.average_final_balance
        );
        Ok(summary)
    }
}

fn play_rounds<P: SeatPolicy>(
    engine: &mut RoundEngine,
    num_rounds: u64,
    policy: &mut P,
) -> Result<(), GameError> {
    for _ in 0..num_rounds {
        let balance = engine.tracked_balance();
        if balance < MIN_PLAYABLE_BALANCE {
            debug!("stopping after {} rounds: balance {}", engine.rounds_played(), balance);
            break;
        }
        let wager = engine.recommended_bet().min(balance.floor() as u32).max(1);
        engine.play_round(wager, policy, &mut NoopHandler)?;
    }
    Ok(())
}
