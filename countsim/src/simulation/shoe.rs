use log::debug;
use rand::seq::SliceRandom;
use rand::Rng;
use rand_chacha::ChaCha8Rng;
use strum::IntoEnumIterator;

use super::{Card, Rank, Suit};
use crate::GameError;

/// A card drawn from the shoe, and whether the shoe was replaced just before
/// drawing it.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Dealt {
    pub card: Card,
    pub reshuffled: bool,
}

/// Represents a shoe in the real world. Cards are dealt from the top (the end
/// of `cards`).
#[derive(Debug, Clone)]
pub struct Shoe {
    number_of_decks: u8,
    reshuffle_min: f64,
    reshuffle_max: f64,
    cards: Vec<Card>,
    cards_dealt: usize,
    reshuffle_threshold: usize,
    generation: u64,
    rng: ChaCha8Rng,
}

impl Shoe {
    /// Creates a new shoe with ordered cards. Call `shuffle` before dealing;
    /// an unshuffled shoe reshuffles itself on the first draw.
    pub fn new(number_of_decks: u8, reshuffle_min: f64, reshuffle_max: f64, rng: ChaCha8Rng) -> Shoe {
        Shoe {
            number_of_decks,
            reshuffle_min,
            reshuffle_max,
            cards: ordered_cards(number_of_decks),
            cards_dealt: 0,
            reshuffle_threshold: 0,
            generation: 0,
            rng,
        }
    }

    /// Creates a stacked shoe that deals `cards` in the given order. It only
    /// reshuffles once every stacked card has been dealt, and then behaves
    /// like a regular shoe of `number_of_decks` decks.
    pub fn from_cards(cards: &[Card], number_of_decks: u8, rng: ChaCha8Rng) -> Shoe {
        let mut stacked = cards.to_vec();
        stacked.reverse();
        Shoe {
            number_of_decks,
            reshuffle_min: 0.6,
            reshuffle_max: 0.9,
            reshuffle_threshold: stacked.len(),
            cards: stacked,
            cards_dealt: 0,
            generation: 1,
            rng,
        }
    }

    /// Replaces the whole shoe with freshly shuffled decks and draws a new
    /// reshuffle threshold from `[min * N, max * N)`.
    pub fn shuffle(&mut self) {
        self.cards = ordered_cards(self.number_of_decks);
        self.cards.shuffle(&mut self.rng);
        self.cards_dealt = 0;

        let total = self.cards.len() as f64;
        let lo = (self.reshuffle_min * total).ceil() as usize;
        let hi = (self.reshuffle_max * total).ceil() as usize;
        self.reshuffle_threshold = if lo < hi {
            self.rng.gen_range(lo..hi)
        } else {
            lo
        };
        self.generation += 1;
        debug!(
            "shuffled {} cards, reshuffle after {} (shoe #{})",
            self.cards.len(),
            self.reshuffle_threshold,
            self.generation
        );
    }

    /// Deals a card, reshuffling first if the threshold has been reached or
    /// the shoe is empty. Only a zero-deck shoe can run out.
    pub fn draw(&mut self) -> Result<Dealt, GameError> {
        let reshuffled = self.needs_reshuffle();
        if reshuffled {
            self.shuffle();
        }
        let card = self.cards.pop().ok_or(GameError::ShoeExhausted)?;
        self.cards_dealt += 1;
        Ok(Dealt { card, reshuffled })
    }

    pub fn needs_reshuffle(&self) -> bool {
        self.cards_dealt >= self.reshuffle_threshold || self.cards.is_empty()
    }

    pub fn len(&self) -> usize {
        self.cards.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cards.is_empty()
    }

    /// Cards dealt since the last shuffle.
    pub fn cards_dealt(&self) -> usize {
        self.cards_dealt
    }

    pub fn reshuffle_threshold(&self) -> usize {
        self.reshuffle_threshold
    }

    /// Increases by one on every shuffle.
    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn number_of_decks(&self) -> u8 {
        self.number_of_decks
    }

    pub fn total_cards(&self) -> usize {
        self.number_of_decks as usize * 52
    }
}

fn ordered_cards(number_of_decks: u8) -> Vec<Card> {
    let mut cards = Vec::with_capacity(number_of_decks as usize * 52);
    for _ in 0..number_of_decks {
        for suit in Suit::iter() {
            for rank in Rank::iter() {
                cards.push(Card { rank, suit });
            }
        }
    }
    cards
}
