use crate::{
    simulation::{hand::Hand, Card, Turn},
    Action,
};

/// Total at which the dealer, and anyone copying the dealer, stops drawing.
pub const DEALER_STAND_TOTAL: u8 = 17;

/// Decides one action for the hand whose turn it is. Interactive front ends
/// implement this as a blocking call that returns the player's choice.
pub trait SeatPolicy {
    fn decide(&mut self, turn: &Turn<'_>) -> Action;
}

/// Hits under 17 and stands otherwise, like the dealer.
#[derive(Debug, Clone, Copy, Default)]
pub struct DealerMimic;

impl SeatPolicy for DealerMimic {
    fn decide(&mut self, turn: &Turn<'_>) -> Action {
        if turn.hand.total() < DEALER_STAND_TOTAL {
            Action::Hit
        } else {
            Action::Stand
        }
    }
}

type Entry = (Action, Action);

/// Chart-driven basic strategy. Each entry is a pair of the preferred action
/// and the action to take when doubling is not available.
#[derive(Debug, Clone)]
pub struct BasicStrategy {
    hard_charts: [[Entry; 10]; 9],
    soft_charts: [[Entry; 10]; 8],
    pair_charts: [[Entry; 10]; 10],
}

impl Default for BasicStrategy {
    fn default() -> Self {
        BasicStrategy::new()
    }
}

impl BasicStrategy {
    /// Columns are dealer up-cards 2, 3, ..., 10, A.
    pub fn new() -> BasicStrategy {
        const H: Entry = (Action::Hit, Action::Hit);
        const S: Entry = (Action::Stand, Action::Stand);
        const P: Entry = (Action::Split, Action::Split);
        const DH: Entry = (Action::Double, Action::Hit);
        const DS: Entry = (Action::Double, Action::Stand);

        BasicStrategy {
            hard_charts: [
                [H, H, H, DH, DH, H, H, H, H, H], // 8
                [DH, DH, DH, DH, DH, H, H, H, H, H],
                [DH, DH, DH, DH, DH, DH, DH, DH, H, H],
                [DH, DH, DH, DH, DH, DH, DH, DH, DH, DH],
                [H, H, S, S, S, H, H, H, H, H],
                [S, S, S, S, S, H, H, H, H, H],
                [S, S, S, S, S, H, H, H, H, H],
                [S, S, S, S, S, H, H, H, H, H],
                [S, S, S, S, S, H, H, H, H, H], // 16
            ],
            soft_charts: [
                [H, H, DH, DH, DH, H, H, H, H, H], // soft 13
                [H, H, DH, DH, DH, H, H, H, H, H],
                [H, H, DH, DH, DH, H, H, H, H, H],
                [H, H, DH, DH, DH, H, H, H, H, H],
                [DH, DH, DH, DH, DH, H, H, H, H, H],
                [S, DH, DH, DH, DH, S, S, H, H, S],
                [S, S, S, S, DS, S, S, S, S, S],
                [S, S, S, S, S, S, S, S, S, S], // soft 20
            ],
            pair_charts: [
                [H, P, P, P, P, P, H, H, H, H], // Double 2
                [H, H, P, P, P, P, H, H, H, H],
                [H, H, H, DH, DH, H, H, H, H, H],
                [DH, DH, DH, DH, DH, DH, DH, DH, H, H],
                [P, P, P, P, P, H, H, H, H, H],
                [P, P, P, P, P, P, H, H, S, H],
                [P, P, P, P, P, P, P, P, P, P],
                [P, P, P, P, P, S, P, P, S, S],
                [S, S, S, S, S, S, S, S, S, S], // Double 10, J, Q or K
                // Two aces split against everything. Unsplit, they play as a
                // hard 12.
                [P, P, P, P, P, P, P, P, P, P],
            ],
        }
    }

    /// The table's advice for a hand against the dealer's up-card. Doubling is
    /// advised only on two-card hands; splitting only on pairs.
    pub fn advise(&self, hand: &Hand, dealer_up_card: Card) -> Action {
        self.advise_with(hand, dealer_up_card, hand.len() == 2, hand.is_pair())
    }

    /// Like `advise`, but only returns `Double` when `can_double` is set and
    /// `Split` when `can_split` is set.
    pub fn advise_with(
        &self,
        hand: &Hand,
        dealer_up_card: Card,
        can_double: bool,
        can_split: bool,
    ) -> Action {
        let col = (dealer_up_card.rank.value() - 2) as usize;
        let total = hand.total();

        if can_split && hand.is_pair() {
            let row = (hand.cards()[0].rank.value() - 2) as usize;
            let entry = self.pair_charts[row][col];
            if entry.0 != Action::Split {
                return resolve(entry, can_double);
            }
            return Action::Split;
        }

        if hand.is_soft() && (13..=20).contains(&total) {
            let row = (total - 13) as usize;
            return resolve(self.soft_charts[row][col], can_double);
        }

        if total < 8 {
            Action::Hit
        } else if total >= DEALER_STAND_TOTAL {
            Action::Stand
        } else {
            let row = (total - 8) as usize;
            resolve(self.hard_charts[row][col], can_double)
        }
    }

    /// Replaces an action the table does not permit with the advice for the
    /// actions that remain.
    pub fn fallback(&self, turn: &Turn<'_>, action: Action) -> Action {
        match action {
            Action::Double if !turn.can_double => self.advise_with(
                turn.hand,
                turn.dealer_up_card,
                false,
                turn.can_split,
            ),
            Action::Split if !turn.can_split => self.advise_with(
                turn.hand,
                turn.dealer_up_card,
                turn.can_double,
                false,
            ),
            other => other,
        }
    }
}

fn resolve(entry: Entry, can_double: bool) -> Action {
    if entry.0 == Action::Double && !can_double {
        entry.1
    } else {
        entry.0
    }
}

impl SeatPolicy for BasicStrategy {
    fn decide(&mut self, turn: &Turn<'_>) -> Action {
        self.advise_with(
            turn.hand,
            turn.dealer_up_card,
            turn.can_double,
            turn.can_split,
        )
    }
}
