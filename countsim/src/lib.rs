pub mod counting;
mod error;
pub mod runner;
pub mod simulation;
pub mod strategy;

pub use counting::{Counter, CountingKind};
pub use error::GameError;
pub use runner::{BatchSummary, SimulationResult, SimulationRunner};

pub const MAX_DECKS: u8 = 8;
pub const MAX_SEATS: usize = 7;

/// Everything a table needs to know before the first card is dealt. All
/// configuration is passed explicitly; there is no global state.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TableRules {
    pub number_of_decks: u8,
    pub number_of_seats: usize,
    /// Zero-based index of the seat whose balance is tracked and reported.
    pub tracked_seat: usize,
    pub base_bet: u32,
    pub initial_balance: f64,
    pub payout_blackjack: f64,
    /// The reshuffle threshold is drawn from
    /// `[reshuffle_min * N, reshuffle_max * N)` where N is the shoe size.
    pub reshuffle_min: f64,
    pub reshuffle_max: f64,
    /// Running count below which KO recommends a double bet.
    pub ko_middle_threshold: i32,
    pub bots_use_basic_strategy: bool,
    pub seed: u64,
}

impl Default for TableRules {
    fn default() -> Self {
        TableRules {
            number_of_decks: 1,
            number_of_seats: 1,
            tracked_seat: 0,
            base_bet: 8,
            initial_balance: 1000.0,
            payout_blackjack: 1.5,
            reshuffle_min: 0.6,
            reshuffle_max: 0.9,
            ko_middle_threshold: 3,
            bots_use_basic_strategy: false,
            seed: 42,
        }
    }
}

impl TableRules {
    /// Rejects any out-of-range setting with a descriptive error.
    pub fn validate(&self) -> Result<(), GameError> {
        if self.number_of_decks == 0 || self.number_of_decks > MAX_DECKS {
            return Err(GameError::Config(format!(
                "number_of_decks must be in [1, {}], got {}",
                MAX_DECKS, self.number_of_decks
            )));
        }
        if self.number_of_seats == 0 || self.number_of_seats > MAX_SEATS {
            return Err(GameError::Config(format!(
                "number_of_seats must be in [1, {}], got {}",
                MAX_SEATS, self.number_of_seats
            )));
        }
        if self.tracked_seat >= self.number_of_seats {
            return Err(GameError::Config(format!(
                "tracked_seat should be less than number_of_seats ({}), got {}",
                self.number_of_seats, self.tracked_seat
            )));
        }
        // FiveCount halves the base bet, which must stay a positive wager.
        if self.base_bet < 2 {
            return Err(GameError::Config(format!(
                "base_bet must be at least 2, got {}",
                self.base_bet
            )));
        }
        if !(self.initial_balance >= self.base_bet as f64) {
            return Err(GameError::Config(format!(
                "initial_balance ({}) must cover the base bet ({})",
                self.initial_balance, self.base_bet
            )));
        }
        if !(self.payout_blackjack > 0.0) {
            return Err(GameError::Config(format!(
                "payout_blackjack must be positive, got {}",
                self.payout_blackjack
            )));
        }
        if !(self.reshuffle_min > 0.0
            && self.reshuffle_min < self.reshuffle_max
            && self.reshuffle_max <= 1.0)
        {
            return Err(GameError::Config(format!(
                "reshuffle proportions must satisfy 0 < min < max <= 1, got [{}, {})",
                self.reshuffle_min, self.reshuffle_max
            )));
        }
        if self.ko_middle_threshold <= 1 {
            return Err(GameError::Config(format!(
                "ko_middle_threshold must exceed 1, got {}",
                self.ko_middle_threshold
            )));
        }
        Ok(())
    }

    pub fn total_cards(&self) -> usize {
        self.number_of_decks as usize * 52
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Action {
    Hit,
    Stand,
    Double,
    Split,
}

impl std::fmt::Display for Action {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Action::Hit => "hit",
            Action::Stand => "stand",
            Action::Double => "double",
            Action::Split => "split",
        };
        write!(f, "{}", name)
    }
}
