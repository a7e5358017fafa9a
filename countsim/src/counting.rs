//! Card-counting signals and the bet sizes they recommend.

use serde_enum_str::{Deserialize_enum_str, Serialize_enum_str};

use crate::{simulation::Rank, GameError, TableRules};

/// Smallest number of decks the HiLow true count divides by.
const MIN_DECKS_REMAINING: f64 = 1e-6;

/// Selects a counting system. Mapped once into a [`Counter`] when a table is built.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize_enum_str, Deserialize_enum_str)]
pub enum CountingKind {
    None,
    HiLow,
    #[serde(rename = "KO")]
    Ko,
    FiveCount,
}

impl CountingKind {
    /// Maps the integer menu codes used by interactive front ends
    /// (1: None, 2: HiLow, 3: KO, 4: Five Count).
    pub fn from_code(code: u8) -> Result<CountingKind, GameError> {
        match code {
            1 => Ok(CountingKind::None),
            2 => Ok(CountingKind::HiLow),
            3 => Ok(CountingKind::Ko),
            4 => Ok(CountingKind::FiveCount),
            _ => Err(GameError::Config(format!(
                "counting strategy code must be in [1, 4], got {}",
                code
            ))),
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            CountingKind::None => "None",
            CountingKind::HiLow => "HiLow",
            CountingKind::Ko => "KO",
            CountingKind::FiveCount => "Five Count",
        }
    }
}

/// The running state of a counting system.
///
/// Every observed card goes through [`Counter::update_count`], and the state is
/// zeroed by [`Counter::reset_count`] whenever the shoe is reshuffled.
#[derive(Debug, Clone, PartialEq)]
pub enum Counter {
    None,
    HiLow {
        running_count: i32,
    },
    Ko {
        running_count: i32,
        middle_threshold: i32,
    },
    FiveCount {
        seen_fives: u32,
        cards_seen: u32,
        total_fives: u32,
        total_cards: u32,
    },
}

impl Counter {
    pub fn new(kind: CountingKind, rules: &TableRules) -> Counter {
        match kind {
            CountingKind::None => Counter::None,
            CountingKind::HiLow => Counter::HiLow { running_count: 0 },
            CountingKind::Ko => Counter::Ko {
                running_count: 0,
                middle_threshold: rules.ko_middle_threshold,
            },
            CountingKind::FiveCount => Counter::FiveCount {
                seen_fives: 0,
                cards_seen: 0,
                total_fives: rules.number_of_decks as u32 * 4,
                total_cards: rules.number_of_decks as u32 * 52,
            },
        }
    }

    pub fn kind(&self) -> CountingKind {
        match self {
            Counter::None => CountingKind::None,
            Counter::HiLow { .. } => CountingKind::HiLow,
            Counter::Ko { .. } => CountingKind::Ko,
            Counter::FiveCount { .. } => CountingKind::FiveCount,
        }
    }

    /// Folds every observed rank into the count.
    pub fn update_count(&mut self, ranks: &[Rank]) {
        match self {
            Counter::None => {}
            Counter::HiLow { running_count } => {
                for rank in ranks {
                    *running_count += hi_low_tag(*rank);
                }
            }
            Counter::Ko { running_count, .. } => {
                for rank in ranks {
                    *running_count += ko_tag(*rank);
                }
            }
            Counter::FiveCount {
                seen_fives,
                cards_seen,
                ..
            } => {
                for rank in ranks {
                    if *rank == Rank::Five {
                        *seen_fives += 1;
                    }
                    *cards_seen += 1;
                }
            }
        }
    }

    /// Recommends a wager from the current state. Never mutates the counter.
    ///
    /// `cards_dealt` is the number of cards dealt since the last shuffle; only
    /// HiLow uses it, to turn the running count into a true count.
    pub fn recommend_bet(&self, base_bet: u32, number_of_decks: u8, cards_dealt: usize) -> u32 {
        let base = base_bet as f64;
        let bet = match self {
            Counter::None => base,
            Counter::HiLow { running_count } => {
                let cards_left = number_of_decks as f64 * 52.0 - cards_dealt as f64;
                let decks_remaining = (cards_left / 52.0).max(MIN_DECKS_REMAINING);
                let true_count = *running_count as f64 / decks_remaining;
                if true_count <= 1.0 {
                    base
                } else if true_count < 3.0 {
                    base * 2.0
                } else {
                    base * 4.0
                }
            }
            Counter::Ko {
                running_count,
                middle_threshold,
            } => {
                if *running_count <= 1 {
                    base
                } else if running_count < middle_threshold {
                    base * 2.0
                } else {
                    base * 4.0
                }
            }
            Counter::FiveCount {
                seen_fives,
                cards_seen,
                total_fives,
                total_cards,
            } => {
                let unseen_fives = total_fives.saturating_sub(*seen_fives);
                let unseen_cards = total_cards.saturating_sub(*cards_seen);
                if unseen_fives == 0 {
                    base
                } else {
                    let ratio = unseen_cards as f64 / unseen_fives as f64;
                    if ratio > 14.0 {
                        base * 4.0
                    } else if ratio < 12.0 {
                        base * 0.5
                    } else {
                        base
                    }
                }
            }
        };
        bet as u32
    }

    pub fn reset_count(&mut self) {
        match self {
            Counter::None => {}
            Counter::HiLow { running_count } | Counter::Ko { running_count, .. } => {
                *running_count = 0
            }
            Counter::FiveCount {
                seen_fives,
                cards_seen,
                ..
            } => {
                *seen_fives = 0;
                *cards_seen = 0;
            }
        }
    }

    /// The signed running count for HiLow and KO.
    pub fn running_count(&self) -> Option<i32> {
        match self {
            Counter::HiLow { running_count } | Counter::Ko { running_count, .. } => {
                Some(*running_count)
            }
            _ => None,
        }
    }

    /// True when the count is back at its starting value.
    pub fn is_reset(&self) -> bool {
        match self {
            Counter::None => true,
            Counter::HiLow { running_count } | Counter::Ko { running_count, .. } => {
                *running_count == 0
            }
            Counter::FiveCount {
                seen_fives,
                cards_seen,
                ..
            } => *seen_fives == 0 && *cards_seen == 0,
        }
    }
}

fn hi_low_tag(rank: Rank) -> i32 {
    match rank {
        Rank::Two | Rank::Three | Rank::Four | Rank::Five | Rank::Six => 1,
        Rank::Seven | Rank::Eight | Rank::Nine => 0,
        _ => -1,
    }
}

fn ko_tag(rank: Rank) -> i32 {
    match rank {
        Rank::Two | Rank::Three | Rank::Four | Rank::Five | Rank::Six | Rank::Seven => 1,
        Rank::Eight | Rank::Nine => 0,
        _ => -1,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn counter(kind: CountingKind) -> Counter {
        Counter::new(kind, &TableRules::default())
    }

    #[test]
    fn hi_low_running_count() {
        let mut hi_low = counter(CountingKind::HiLow);
        hi_low.update_count(&[Rank::Two, Rank::Three, Rank::Four, Rank::Five, Rank::Six]);
        assert_eq!(hi_low.running_count(), Some(5));

        hi_low.reset_count();
        hi_low.update_count(&[Rank::Ten, Rank::Ace, Rank::King]);
        assert_eq!(hi_low.running_count(), Some(-3));

        hi_low.reset_count();
        hi_low.update_count(&[Rank::Seven, Rank::Eight, Rank::Nine]);
        assert_eq!(hi_low.running_count(), Some(0));
    }

    #[test]
    fn ko_counts_sevens_as_low() {
        let mut ko = counter(CountingKind::Ko);
        ko.update_count(&[Rank::Seven, Rank::Two, Rank::Eight, Rank::Queen]);
        assert_eq!(ko.running_count(), Some(1));
    }

    #[test]
    fn hi_low_bet_uses_true_count() {
        let mut hi_low = counter(CountingKind::HiLow);
        hi_low.update_count(&[Rank::Two; 4]);
        // 4 running over 2 decks remaining is a true count of 2.
        assert_eq!(hi_low.recommend_bet(10, 3, 52), 20);
        // The same running count with one deck remaining is a true count of 4.
        assert_eq!(hi_low.recommend_bet(10, 3, 104), 40);
        // Fresh six-deck shoe: true count below 1.
        assert_eq!(hi_low.recommend_bet(10, 6, 0), 10);
    }

    #[test]
    fn hi_low_bet_survives_an_empty_shoe() {
        let mut hi_low = counter(CountingKind::HiLow);
        hi_low.update_count(&[Rank::Three]);
        assert_eq!(hi_low.recommend_bet(10, 1, 52), 40);

        let mut hi_low = counter(CountingKind::HiLow);
        hi_low.update_count(&[Rank::Ace]);
        assert_eq!(hi_low.recommend_bet(10, 1, 60), 10);
    }

    #[test]
    fn ko_middle_threshold_is_configurable() {
        let mut rules = TableRules::default();
        let mut ko = Counter::new(CountingKind::Ko, &rules);
        ko.update_count(&[Rank::Two, Rank::Three, Rank::Four]);
        assert_eq!(ko.recommend_bet(8, 1, 0), 32);

        rules.ko_middle_threshold = 4;
        let mut ko = Counter::new(CountingKind::Ko, &rules);
        ko.update_count(&[Rank::Two, Rank::Three, Rank::Four]);
        assert_eq!(ko.recommend_bet(8, 1, 0), 16);

        ko.reset_count();
        ko.update_count(&[Rank::Two]);
        assert_eq!(ko.recommend_bet(8, 1, 0), 8);
    }

    fn five_count_with(seen_fives: u32, cards_seen: u32) -> Counter {
        Counter::FiveCount {
            seen_fives,
            cards_seen,
            total_fives: 4,
            total_cards: 52,
        }
    }

    #[test]
    fn five_count_bet_follows_ratio() {
        // 40 unseen cards over 2 unseen fives.
        assert_eq!(five_count_with(2, 12).recommend_bet(8, 1, 12), 32);
        // 40 unseen cards over 4 unseen fives.
        assert_eq!(five_count_with(0, 12).recommend_bet(8, 1, 12), 4);
        // A fresh deck: 52 over 4.
        assert_eq!(five_count_with(0, 0).recommend_bet(8, 1, 0), 8);
        // Every five is gone.
        assert_eq!(five_count_with(4, 30).recommend_bet(8, 1, 30), 8);
    }

    #[test]
    fn five_count_tracks_observed_cards() {
        let mut five_count = counter(CountingKind::FiveCount);
        five_count.update_count(&[Rank::Five, Rank::Five, Rank::King]);
        assert_eq!(five_count, five_count_with(2, 3));
        five_count.reset_count();
        assert!(five_count.is_reset());
    }

    #[test]
    fn none_always_bets_base() {
        let mut none = counter(CountingKind::None);
        none.update_count(&[Rank::Two; 20]);
        assert_eq!(none.recommend_bet(8, 1, 20), 8);
        assert!(none.is_reset());
        assert_eq!(none.running_count(), None);
    }

    #[test]
    fn counting_kind_from_code_and_name() {
        assert_eq!(CountingKind::from_code(3), Ok(CountingKind::Ko));
        assert!(CountingKind::from_code(0).is_err());
        assert!(CountingKind::from_code(5).is_err());
        assert_eq!("KO".parse::<CountingKind>().ok(), Some(CountingKind::Ko));
        assert_eq!(
            "FiveCount".parse::<CountingKind>().ok(),
            Some(CountingKind::FiveCount)
        );
    }
}
