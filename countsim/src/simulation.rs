pub mod hand;
pub mod seat;
pub mod shoe;

use countsim_macros::allowed_phase;
use log::{debug, trace};
use rand_chacha::ChaCha8Rng;
use strum_macros::EnumIter;

use crate::{
    strategy::{BasicStrategy, DealerMimic, SeatPolicy, DEALER_STAND_TOTAL},
    Action, Counter, CountingKind, GameError, TableRules,
};

use self::{
    hand::Hand,
    seat::{Seat, SeatHand, SeatKind},
    shoe::Shoe,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, EnumIter)]
pub enum Suit {
    Clubs,
    Diamonds,
    Hearts,
    Spades,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, EnumIter)]
pub enum Rank {
    Two = 2,
    Three,
    Four,
    Five,
    Six,
    Seven,
    Eight,
    Nine,
    Ten,
    Jack,
    Queen,
    King,
    Ace,
}

impl Rank {
    /// Blackjack value with the ace counted as 11.
    pub fn value(&self) -> u8 {
        match self {
            Rank::Jack | Rank::Queen | Rank::King => 10,
            Rank::Ace => 11,
            other => *other as u8,
        }
    }
}

/// Represents a card in the real world with a rank and a suit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Card {
    pub rank: Rank,
    pub suit: Suit,
}

impl std::fmt::Display for Card {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let suit = match self.suit {
            Suit::Clubs => 'C',
            Suit::Diamonds => 'D',
            Suit::Hearts => 'H',
            Suit::Spades => 'S',
        };
        let rank = match self.rank {
            Rank::Ace => 'A',
            Rank::Ten => 'T',
            Rank::Jack => 'J',
            Rank::Queen => 'Q',
            Rank::King => 'K',
            other => (b'0' + other as u8) as char,
        };
        write!(f, "{}{}", rank, suit)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GamePhase {
    Betting,
    InitialDeal,
    SeatActions,
    DealerPlay,
    Settlement,
    Done,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Win,
    Loss,
    Push,
    BlackjackWin,
    BustLoss,
}

/// How one seat-hand was settled.
#[derive(Debug, Clone, PartialEq)]
pub struct HandResult {
    pub seat: usize,
    pub hand_index: usize,
    pub outcome: Outcome,
    pub wager: u32,
    pub delta: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct RoundReport {
    /// One-based index of the settled round.
    pub round: u64,
    pub results: Vec<HandResult>,
    pub dealer_total: u8,
    pub tracked_balance: f64,
    /// The shoe was replaced at least once while this round was dealt.
    pub reshuffled: bool,
}

impl RoundReport {
    /// Net balance change of one seat over all of its hands.
    pub fn seat_delta(&self, seat: usize) -> f64 {
        self.results
            .iter()
            .filter(|result| result.seat == seat)
            .map(|result| result.delta)
            .sum()
    }
}

/// Read-only view of the hand waiting for an action.
#[derive(Debug, Clone, Copy)]
pub struct Turn<'a> {
    pub seat: usize,
    pub hand_index: usize,
    pub hand: &'a Hand,
    pub dealer_up_card: Card,
    pub can_double: bool,
    pub can_split: bool,
    pub balance: f64,
    pub wager: u32,
}

/// Observes a round as `RoundEngine::play_round` drives it.
pub trait RoundEventHandler {
    fn on_reshuffle(&mut self, _generation: u64) {}
    fn on_initial_deal(&mut self, _seats: &[Seat], _dealer_up_card: Card) {}
    fn on_action(&mut self, _seat: usize, _hand_index: usize, _action: Action, _hand: &Hand) {}
    fn on_dealer_reveal(&mut self, _dealer_hand: &Hand) {}
    fn on_round_settled(&mut self, _report: &RoundReport) {}
}

#[derive(Debug, Clone, Copy, Default)]
pub struct NoopHandler;

impl RoundEventHandler for NoopHandler {}

/// Settles one seat-hand against the dealer. Returns the outcome and the
/// balance delta; the wager already includes any double down.
pub fn settle_hand(seat_hand: &SeatHand, dealer_hand: &Hand, payout_blackjack: f64) -> (Outcome, f64) {
    let wager = seat_hand.wager() as f64;
    let hand = seat_hand.hand();
    if hand.is_bust() {
        return (Outcome::BustLoss, -wager);
    }
    if seat_hand.is_natural() {
        return if dealer_hand.is_blackjack() {
            (Outcome::Push, 0.0)
        } else {
            (Outcome::BlackjackWin, payout_blackjack * wager)
        };
    }
    let player = hand.total();
    let dealer = dealer_hand.total();
    if dealer_hand.is_bust() || player > dealer {
        (Outcome::Win, wager)
    } else if player < dealer {
        (Outcome::Loss, -wager)
    } else {
        (Outcome::Push, 0.0)
    }
}

/// Plays blackjack rounds at one table. A round goes through
/// `Betting -> InitialDeal -> SeatActions -> DealerPlay -> Settlement -> Done`
/// and every public step checks that it is called in its own phase.
///
/// The counter sees every face-up card as it is dealt. The hole card is
/// counted when the dealer reveals it, unless the shoe was replaced since.
pub struct RoundEngine {
    rules: TableRules,
    phase: GamePhase,
    shoe: Shoe,
    counter: Counter,
    seats: Vec<Seat>,
    dealer_hand: Hand,
    hole_generation: u64,
    cursor: Option<(usize, usize)>,
    rounds_played: u64,
    reshuffled_this_round: bool,
    reshuffle_pending: bool,
    wealth_trajectory: Vec<f64>,
    advisor: BasicStrategy,
}

impl RoundEngine {
    pub fn new(rules: &TableRules, counting: CountingKind, rng: ChaCha8Rng) -> Result<Self, GameError> {
        rules.validate()?;
        let mut shoe = Shoe::new(rules.number_of_decks, rules.reshuffle_min, rules.reshuffle_max, rng);
        shoe.shuffle();
        RoundEngine::with_shoe(rules, counting, shoe)
    }

    /// Builds a table around an existing shoe, stacked or already shuffled.
    pub fn with_shoe(rules: &TableRules, counting: CountingKind, shoe: Shoe) -> Result<Self, GameError> {
        rules.validate()?;
        let seats = (0..rules.number_of_seats)
            .map(|index| {
                let kind = if index == rules.tracked_seat {
                    SeatKind::Tracked
                } else {
                    SeatKind::Bot
                };
                Seat::new(kind, rules.initial_balance)
            })
            .collect();
        Ok(RoundEngine {
            rules: *rules,
            phase: GamePhase::Betting,
            shoe,
            counter: Counter::new(counting, rules),
            seats,
            dealer_hand: Hand::new(),
            hole_generation: 0,
            cursor: None,
            rounds_played: 0,
            reshuffled_this_round: false,
            reshuffle_pending: false,
            wealth_trajectory: vec![rules.initial_balance],
            advisor: BasicStrategy::new(),
        })
    }

    /// Runs a whole round. The tracked seat wagers `wager` and takes its
    /// actions from `policy`; bot seats wager the base bet.
    #[allowed_phase(Betting)]
    pub fn play_round<P: SeatPolicy, H: RoundEventHandler>(
        &mut self,
        wager: u32,
        policy: &mut P,
        handler: &mut H,
    ) -> Result<RoundReport, GameError> {
        let base_bet = self.rules.base_bet;
        let tracked_seat = self.rules.tracked_seat;
        // The tracked wager goes first so a rejected bet leaves the bots alone.
        self.place_bet(tracked_seat, wager)?;
        for index in 0..self.seats.len() {
            if index == tracked_seat {
                continue;
            }
            if (base_bet as f64) > self.seats[index].balance() {
                debug!("bot seat {} is broke, a new player takes it", index);
                self.seats[index].restake(self.rules.initial_balance);
            }
            self.place_bet(index, base_bet)?;
        }

        self.deal_initial_cards()?;
        self.notify_reshuffle(handler);
        if let Some(up_card) = self.dealer_hand.up_card() {
            handler.on_initial_deal(&self.seats, up_card);
        }

        if self.phase == GamePhase::SeatActions {
            self.play_turns(policy, handler)?;
        }

        self.dealer_play()?;
        self.notify_reshuffle(handler);
        handler.on_dealer_reveal(&self.dealer_hand);

        let report = self.settle()?;
        handler.on_round_settled(&report);
        self.finish_round()?;
        Ok(report)
    }

    /// Fixes the wager of one seat. Once every seat holds a wager the round
    /// moves on to the initial deal.
    #[allowed_phase(Betting)]
    pub fn place_bet(&mut self, seat: usize, wager: u32) -> Result<(), GameError> {
        let balance = self.seats.get(seat).ok_or(GameError::NoSeat(seat))?.balance();
        if wager == 0 || wager as f64 > balance {
            return Err(GameError::InvalidBet {
                seat,
                wager,
                balance,
            });
        }
        self.seats[seat].place_wager(wager);
        if self.seats.iter().all(Seat::has_wager) {
            self.phase = GamePhase::InitialDeal;
        }
        Ok(())
    }

    /// Deals two cards to every seat in order, and an up-card and a hole card
    /// to the dealer. Naturals stand right away.
    #[allowed_phase(InitialDeal)]
    pub fn deal_initial_cards(&mut self) -> Result<(), GameError> {
        for round in 0..2 {
            for seat in 0..self.seats.len() {
                let card = self.deal_card(true)?;
                self.seats[seat].receive_card(0, card);
            }
            if round == 0 {
                let card = self.deal_card(true)?;
                self.dealer_hand.receive_card(card);
            } else {
                let card = self.deal_card(false)?;
                self.dealer_hand.receive_face_down(card);
                self.hole_generation = self.shoe.generation();
            }
        }

        for seat in self.seats.iter_mut() {
            if seat.hands().first().map_or(false, |hand| hand.is_natural()) {
                seat.finish(0);
            }
        }

        self.phase = GamePhase::SeatActions;
        self.advance_cursor();
        Ok(())
    }

    /// The hand waiting for an action, if any.
    pub fn current_turn(&self) -> Option<Turn<'_>> {
        if self.phase != GamePhase::SeatActions {
            return None;
        }
        let (seat_index, hand_index) = self.cursor?;
        let seat = self.seats.get(seat_index)?;
        let seat_hand = seat.hands().get(hand_index)?;
        Some(Turn {
            seat: seat_index,
            hand_index,
            hand: seat_hand.hand(),
            dealer_up_card: self.dealer_hand.up_card()?,
            can_double: seat.can_double_down(hand_index),
            can_split: seat.can_split(hand_index),
            balance: seat.balance(),
            wager: seat_hand.wager(),
        })
    }

    /// Applies one action to the current hand. Returns whether that hand is
    /// finished. An illegal action changes nothing.
    #[allowed_phase(SeatActions)]
    pub fn apply_action(&mut self, action: Action) -> Result<bool, GameError> {
        let (seat_index, hand_index) = self.cursor.ok_or(GameError::IllegalAction {
            action,
            reason: "no hand is waiting for an action",
        })?;
        let illegal = |reason| GameError::IllegalAction { action, reason };

        match action {
            Action::Hit => {
                let card = self.deal_card(true)?;
                let seat = &mut self.seats[seat_index];
                seat.receive_card(hand_index, card);
                seat.record_action(hand_index);
                if seat.hands()[hand_index].hand().total() >= 21 {
                    seat.finish(hand_index);
                }
            }
            Action::Stand => {
                let seat = &mut self.seats[seat_index];
                seat.record_action(hand_index);
                seat.finish(hand_index);
            }
            Action::Double => {
                self.seats[seat_index]
                    .check_double_down(hand_index)
                    .map_err(illegal)?;
                let card = self.deal_card(true)?;
                let seat = &mut self.seats[seat_index];
                seat.double_down(hand_index);
                seat.receive_card(hand_index, card);
                seat.record_action(hand_index);
                seat.finish(hand_index);
            }
            Action::Split => {
                self.seats[seat_index].check_split(hand_index).map_err(illegal)?;
                self.seats[seat_index].split(hand_index);
                for index in [hand_index, hand_index + 1] {
                    let card = self.deal_card(true)?;
                    let seat = &mut self.seats[seat_index];
                    seat.receive_card(index, card);
                    if seat.hands()[index].hand().total() == 21 {
                        seat.finish(index);
                    }
                }
            }
        }

        let hand = self.seats[seat_index].hands()[hand_index].hand();
        trace!(
            "seat {} hand {} {}s, total {}",
            seat_index,
            hand_index,
            action,
            hand.total()
        );
        let finished = self.seats[seat_index].hands()[hand_index].is_finished();
        if finished || self.seats[seat_index].hands().iter().all(SeatHand::is_finished) {
            self.advance_cursor();
        }
        Ok(finished)
    }

    /// Asks a policy for every pending hand until all seats are done. The
    /// tracked seat uses `tracked`; bots hit under 17 or follow basic
    /// strategy, as the rules say. Actions the table does not permit are
    /// replaced by the basic-strategy advice for what remains.
    #[allowed_phase(SeatActions)]
    pub fn play_turns<P: SeatPolicy, H: RoundEventHandler>(
        &mut self,
        tracked: &mut P,
        handler: &mut H,
    ) -> Result<(), GameError> {
        let mut mimic = DealerMimic;
        loop {
            let (seat, hand_index, action) = {
                let turn = match self.current_turn() {
                    Some(turn) => turn,
                    None => break,
                };
                let proposed = if self.seats[turn.seat].kind() == SeatKind::Tracked {
                    tracked.decide(&turn)
                } else if self.rules.bots_use_basic_strategy {
                    self.advisor.advise_with(
                        turn.hand,
                        turn.dealer_up_card,
                        turn.can_double,
                        turn.can_split,
                    )
                } else {
                    mimic.decide(&turn)
                };
                (turn.seat, turn.hand_index, self.advisor.fallback(&turn, proposed))
            };
            self.apply_action(action)?;
            handler.on_action(
                seat,
                hand_index,
                action,
                self.seats[seat].hands()[hand_index].hand(),
            );
            self.notify_reshuffle(handler);
        }
        Ok(())
    }

    /// Reveals the hole card and draws until the dealer reaches 17.
    #[allowed_phase(DealerPlay)]
    pub fn dealer_play(&mut self) -> Result<(), GameError> {
        if let Some(hole) = self.dealer_hand.reveal() {
            if self.shoe.generation() == self.hole_generation {
                self.counter.update_count(&[hole.rank]);
            }
        }
        while self.dealer_hand.total() < DEALER_STAND_TOTAL {
            let card = self.deal_card(true)?;
            self.dealer_hand.receive_card(card);
        }
        self.phase = GamePhase::Settlement;
        Ok(())
    }

    /// Settles every seat-hand against the dealer and records the tracked
    /// seat's balance in the wealth trajectory.
    #[allowed_phase(Settlement)]
    pub fn settle(&mut self) -> Result<RoundReport, GameError> {
        let mut results = Vec::new();
        for (seat_index, seat) in self.seats.iter_mut().enumerate() {
            let mut seat_delta = 0.0;
            for (hand_index, seat_hand) in seat.hands().iter().enumerate() {
                let (outcome, delta) =
                    settle_hand(seat_hand, &self.dealer_hand, self.rules.payout_blackjack);
                seat_delta += delta;
                results.push(HandResult {
                    seat: seat_index,
                    hand_index,
                    outcome,
                    wager: seat_hand.wager(),
                    delta,
                });
            }
            seat.settle(seat_delta);
        }

        let tracked_balance = self.tracked_balance();
        self.wealth_trajectory.push(tracked_balance);
        self.rounds_played += 1;
        self.phase = GamePhase::Done;
        debug!(
            "round {} settled: dealer {}, tracked balance {}",
            self.rounds_played,
            self.dealer_hand.total(),
            tracked_balance
        );

        Ok(RoundReport {
            round: self.rounds_played,
            results,
            dealer_total: self.dealer_hand.total(),
            tracked_balance,
            reshuffled: self.reshuffled_this_round,
        })
    }

    /// Clears the table for the next round.
    #[allowed_phase(Done)]
    pub fn finish_round(&mut self) -> Result<(), GameError> {
        for seat in self.seats.iter_mut() {
            seat.clear();
        }
        self.dealer_hand.clear();
        self.cursor = None;
        self.reshuffled_this_round = false;
        self.phase = GamePhase::Betting;
        Ok(())
    }

    /// The counter's wager for the next round, before any balance cap.
    pub fn recommended_bet(&self) -> u32 {
        self.counter.recommend_bet(
            self.rules.base_bet,
            self.rules.number_of_decks,
            self.shoe.cards_dealt(),
        )
    }

    pub fn tracked_balance(&self) -> f64 {
        self.seats[self.rules.tracked_seat].balance()
    }

    /// Tracked balance after every settled round, starting with the initial
    /// balance.
    pub fn wealth_trajectory(&self) -> &[f64] {
        &self.wealth_trajectory
    }

    pub fn seats(&self) -> &[Seat] {
        &self.seats
    }

    pub fn dealer_hand(&self) -> &Hand {
        &self.dealer_hand
    }

    pub fn counter(&self) -> &Counter {
        &self.counter
    }

    pub fn shoe(&self) -> &Shoe {
        &self.shoe
    }

    pub fn phase(&self) -> GamePhase {
        self.phase
    }

    pub fn rules(&self) -> &TableRules {
        &self.rules
    }

    pub fn rounds_played(&self) -> u64 {
        self.rounds_played
    }

    /// Draws a card. A reshuffle resets the counter before the new card is
    /// observed; face-down cards are not observed here.
    fn deal_card(&mut self, face_up: bool) -> Result<Card, GameError> {
        let dealt = self.shoe.draw()?;
        if dealt.reshuffled {
            self.counter.reset_count();
            self.reshuffled_this_round = true;
            self.reshuffle_pending = true;
        }
        if face_up {
            self.counter.update_count(&[dealt.card.rank]);
        }
        Ok(dealt.card)
    }

    fn advance_cursor(&mut self) {
        self.cursor = self.seats.iter().enumerate().find_map(|(seat_index, seat)| {
            seat.hands()
                .iter()
                .position(|hand| !hand.is_finished())
                .map(|hand_index| (seat_index, hand_index))
        });
        if self.cursor.is_none() {
            self.phase = GamePhase::DealerPlay;
        }
    }

    fn notify_reshuffle<H: RoundEventHandler>(&mut self, handler: &mut H) {
        if self.reshuffle_pending {
            self.reshuffle_pending = false;
            handler.on_reshuffle(self.shoe.generation());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;

    fn cards(ranks: &[Rank]) -> Vec<Card> {
        ranks
            .iter()
            .map(|rank| Card {
                rank: *rank,
                suit: Suit::Hearts,
            })
            .collect()
    }

    /// One seat; cards go player, dealer up, player, dealer hole, then draws.
    fn scripted(ranks: &[Rank]) -> RoundEngine {
        scripted_with(&TableRules::default(), CountingKind::HiLow, ranks)
    }

    fn scripted_with(rules: &TableRules, counting: CountingKind, ranks: &[Rank]) -> RoundEngine {
        let shoe = Shoe::from_cards(&cards(ranks), rules.number_of_decks, ChaCha8Rng::seed_from_u64(0));
        RoundEngine::with_shoe(rules, counting, shoe).unwrap()
    }

    struct Script(Vec<Action>);

    impl SeatPolicy for Script {
        fn decide(&mut self, _turn: &Turn<'_>) -> Action {
            if self.0.is_empty() {
                Action::Stand
            } else {
                self.0.remove(0)
            }
        }
    }

    #[test]
    fn test_allowed_phase() {
        let mut engine = scripted(&[Rank::Ten; 8]);
        assert_eq!(engine.phase(), GamePhase::Betting);
        assert_eq!(
            engine.dealer_play(),
            Err(GameError::WrongPhase {
                operation: "dealer_play",
                expected: GamePhase::DealerPlay,
                actual: GamePhase::Betting,
            })
        );
        assert!(engine.deal_initial_cards().is_err());
        assert!(engine.apply_action(Action::Hit).is_err());
        assert!(engine.place_bet(0, 8).is_ok());
        assert_eq!(engine.phase(), GamePhase::InitialDeal);
        assert!(engine.place_bet(0, 8).is_err());
    }

    #[test]
    fn should_reject_invalid_bets() {
        let mut engine = scripted(&[Rank::Ten; 8]);
        assert!(matches!(
            engine.place_bet(0, 0),
            Err(GameError::InvalidBet { wager: 0, .. })
        ));
        assert!(matches!(
            engine.place_bet(0, 1001),
            Err(GameError::InvalidBet { .. })
        ));
        assert_eq!(engine.place_bet(3, 8), Err(GameError::NoSeat(3)));
        assert_eq!(engine.phase(), GamePhase::Betting);
    }

    #[test]
    fn blackjack_pays_three_to_two() {
        let mut engine = scripted(&[Rank::Ace, Rank::Ten, Rank::King, Rank::Seven]);
        engine.place_bet(0, 8).unwrap();
        engine.deal_initial_cards().unwrap();
        // The natural skips its action phase.
        assert_eq!(engine.phase(), GamePhase::DealerPlay);
        assert!(engine.current_turn().is_none());
        engine.dealer_play().unwrap();
        let report = engine.settle().unwrap();
        assert_eq!(report.results[0].outcome, Outcome::BlackjackWin);
        assert_eq!(report.results[0].delta, 12.0);
        assert_eq!(report.dealer_total, 17);
        assert_eq!(engine.tracked_balance(), 1012.0);
        engine.finish_round().unwrap();
        assert_eq!(engine.phase(), GamePhase::Betting);
        assert_eq!(engine.wealth_trajectory(), &[1000.0, 1012.0]);
    }

    #[test]
    fn natural_pushes_against_dealer_blackjack() {
        let mut engine = scripted(&[Rank::Ace, Rank::Ace, Rank::King, Rank::Queen]);
        let report = engine
            .play_round(8, &mut Script(vec![]), &mut NoopHandler)
            .unwrap();
        assert_eq!(report.results[0].outcome, Outcome::Push);
        assert_eq!(report.tracked_balance, 1000.0);
    }

    #[test]
    fn bust_loses_the_bet() {
        let mut engine = scripted(&[Rank::Ten, Rank::Ten, Rank::Nine, Rank::Seven, Rank::Five]);
        engine.place_bet(0, 8).unwrap();
        engine.deal_initial_cards().unwrap();
        let turn = engine.current_turn().unwrap();
        assert_eq!(turn.hand.total(), 19);
        assert_eq!(turn.dealer_up_card.rank, Rank::Ten);
        assert_eq!(engine.apply_action(Action::Hit), Ok(true));
        assert_eq!(engine.phase(), GamePhase::DealerPlay);
        engine.dealer_play().unwrap();
        let report = engine.settle().unwrap();
        assert_eq!(report.results[0].outcome, Outcome::BustLoss);
        assert_eq!(report.results[0].delta, -8.0);
    }

    #[test]
    fn equal_totals_push() {
        let mut engine = scripted(&[Rank::Ten, Rank::Ten, Rank::Queen, Rank::King]);
        let report = engine
            .play_round(8, &mut Script(vec![Action::Stand]), &mut NoopHandler)
            .unwrap();
        assert_eq!(report.results[0].outcome, Outcome::Push);
        assert_eq!(report.results[0].delta, 0.0);
        assert_eq!(report.dealer_total, 20);
    }

    #[test]
    fn dealer_draws_to_seventeen() {
        let mut engine = scripted(&[
            Rank::Ten,
            Rank::Six,
            Rank::Eight,
            Rank::Two,
            Rank::Three,
            Rank::Four,
        ]);
        let report = engine
            .play_round(8, &mut Script(vec![Action::Stand]), &mut NoopHandler)
            .unwrap();
        // 6 + 2 + 3 + 4 = 15 is not enough, so the dealer keeps drawing.
        assert!(report.dealer_total >= 17);
        assert_eq!(engine.dealer_hand().len(), 0);
    }

    #[test]
    fn split_hands_settle_independently() {
        let mut engine = scripted(&[
            Rank::Eight,
            Rank::Ten,
            Rank::Eight,
            Rank::Seven,
            Rank::Three,
            Rank::Ten,
            Rank::Ten,
        ]);
        let mut policy = Script(vec![Action::Split, Action::Double, Action::Stand]);
        let report = engine.play_round(8, &mut policy, &mut NoopHandler).unwrap();
        assert_eq!(report.results.len(), 2);
        // 8 + 3 doubled to 21 on 16, 8 + 10 stands on 8.
        assert_eq!(report.results[0].wager, 16);
        assert_eq!(report.results[0].outcome, Outcome::Win);
        assert_eq!(report.results[1].wager, 8);
        assert_eq!(report.results[1].outcome, Outcome::Win);
        let total: f64 = report.results.iter().map(|result| result.delta).sum();
        assert_eq!(total, 24.0);
        assert_eq!(report.tracked_balance - 1000.0, total);
        assert_eq!(report.seat_delta(0), total);
    }

    #[test]
    fn split_aces_to_twenty_one_are_not_blackjack() {
        let mut engine = scripted(&[
            Rank::Ace,
            Rank::Ten,
            Rank::Ace,
            Rank::Nine,
            Rank::King,
            Rank::Five,
        ]);
        engine.place_bet(0, 10).unwrap();
        engine.deal_initial_cards().unwrap();
        assert_eq!(engine.apply_action(Action::Split), Ok(true));
        // The second hand is still waiting.
        let turn = engine.current_turn().unwrap();
        assert_eq!(turn.hand_index, 1);
        assert_eq!(turn.hand.total(), 16);
        assert!(!turn.can_split);
        assert!(turn.can_double);
        engine.apply_action(Action::Stand).unwrap();
        engine.dealer_play().unwrap();
        let report = engine.settle().unwrap();
        assert_eq!(report.results[0].outcome, Outcome::Win);
        assert_eq!(report.results[0].delta, 10.0);
        assert_eq!(report.results[1].outcome, Outcome::Loss);
    }

    #[test]
    fn illegal_actions_change_nothing() {
        let mut engine = scripted(&[Rank::Ten, Rank::Two, Rank::Two, Rank::Seven, Rank::Two]);
        engine.place_bet(0, 8).unwrap();
        engine.deal_initial_cards().unwrap();
        assert!(matches!(
            engine.apply_action(Action::Split),
            Err(GameError::IllegalAction {
                action: Action::Split,
                ..
            })
        ));
        assert_eq!(engine.seats()[0].hands().len(), 1);
        assert_eq!(engine.phase(), GamePhase::SeatActions);

        assert_eq!(engine.apply_action(Action::Hit), Ok(false));
        assert!(matches!(
            engine.apply_action(Action::Double),
            Err(GameError::IllegalAction { .. })
        ));
        assert_eq!(engine.seats()[0].hands()[0].wager(), 8);
        assert_eq!(engine.current_turn().map(|turn| turn.hand.total()), Some(14));
    }

    #[test]
    fn double_needs_balance() {
        let mut rules = TableRules::default();
        rules.initial_balance = 12.0;
        let mut engine = scripted_with(
            &rules,
            CountingKind::None,
            &[Rank::Five, Rank::Ten, Rank::Six, Rank::Seven],
        );
        engine.place_bet(0, 8).unwrap();
        engine.deal_initial_cards().unwrap();
        assert!(!engine.current_turn().unwrap().can_double);
        assert!(engine.apply_action(Action::Double).is_err());
    }

    #[test]
    fn reshuffle_resets_the_counter_mid_round() {
        let rules = TableRules::default();
        let mut engine = scripted(&[Rank::Two, Rank::Three, Rank::Four, Rank::Five]);
        engine.place_bet(0, 8).unwrap();
        engine.deal_initial_cards().unwrap();
        // 2, 3 and 4 are visible; the hole card is not counted yet.
        assert_eq!(engine.counter().running_count(), Some(3));

        // The stacked cards are gone, so this hit replaces the shoe.
        engine.apply_action(Action::Hit).unwrap();
        let drawn = engine.seats()[0].hands()[0].hand().cards()[2];
        let mut expected = Counter::new(CountingKind::HiLow, &rules);
        expected.update_count(&[drawn.rank]);
        assert_eq!(engine.counter(), &expected);

        if engine.phase() == GamePhase::SeatActions {
            engine.apply_action(Action::Stand).unwrap();
        }
        engine.dealer_play().unwrap();
        // The hole card belongs to the old shoe and is never counted.
        let ranks: Vec<Rank> = engine.dealer_hand().cards()[2..]
            .iter()
            .map(|card| card.rank)
            .collect();
        expected.update_count(&ranks);
        assert_eq!(engine.counter(), &expected);
        assert!(engine.settle().unwrap().reshuffled);
    }

    #[test]
    fn bots_play_and_get_restaked() {
        let mut rules = TableRules::default();
        rules.number_of_seats = 3;
        rules.tracked_seat = 1;
        let mut engine = RoundEngine::new(&rules, CountingKind::Ko, ChaCha8Rng::seed_from_u64(3)).unwrap();
        engine.seats[0].restake(3.0);

        let report = engine
            .play_round(8, &mut DealerMimic, &mut NoopHandler)
            .unwrap();
        assert!(report.results.iter().any(|result| result.seat == 0));
        assert!(report.results.iter().any(|result| result.seat == 2));
        assert_eq!(engine.seats()[0].balance(), 1000.0 + report.seat_delta(0));
        assert_eq!(engine.tracked_balance(), report.tracked_balance);
        assert_eq!(engine.rounds_played(), 1);
    }

    #[test]
    fn rejected_tracked_bet_leaves_bots_untouched() {
        let mut rules = TableRules::default();
        rules.number_of_seats = 2;
        rules.tracked_seat = 1;
        let mut engine = RoundEngine::new(&rules, CountingKind::None, ChaCha8Rng::seed_from_u64(5)).unwrap();
        engine.seats[0].restake(3.0);

        let result = engine.play_round(2000, &mut DealerMimic, &mut NoopHandler);
        assert!(matches!(
            result,
            Err(GameError::InvalidBet {
                seat: 1,
                wager: 2000,
                ..
            })
        ));
        assert_eq!(engine.seats()[0].balance(), 3.0);
        assert!(!engine.seats()[0].has_wager());
        assert!(!engine.seats()[1].has_wager());
        assert_eq!(engine.phase(), GamePhase::Betting);
    }

    #[test]
    fn forbidden_proposals_are_replaced_by_advice() {
        let mut engine = scripted(&[
            Rank::Ten,
            Rank::Seven,
            Rank::Two,
            Rank::Ten,
            Rank::Two,
            Rank::Four,
        ]);
        // Split on 10-2, then double on three-card 14 and 18.
        let mut policy = Script(vec![Action::Split, Action::Double, Action::Double]);
        let mut recorder = Recorder::default();
        let report = engine.play_round(8, &mut policy, &mut recorder).unwrap();

        // Hard 12 and hard 14 against 7 hit; hard 18 stands.
        assert_eq!(
            recorder.actions,
            vec![Action::Hit, Action::Hit, Action::Stand]
        );
        assert_eq!(report.results.len(), 1);
        assert_eq!(report.results[0].wager, 8);
        assert_eq!(report.results[0].outcome, Outcome::Win);
        assert_eq!(report.tracked_balance, 1008.0);
        assert_eq!(recorder.settled, vec![1]);
    }

    #[derive(Default)]
    struct Recorder {
        deals: usize,
        actions: Vec<Action>,
        reveals: usize,
        settled: Vec<u64>,
    }

    impl RoundEventHandler for Recorder {
        fn on_initial_deal(&mut self, seats: &[Seat], _dealer_up_card: Card) {
            assert!(seats.iter().all(|seat| seat.hands()[0].hand().len() == 2));
            self.deals += 1;
        }

        fn on_action(&mut self, _seat: usize, _hand_index: usize, action: Action, _hand: &Hand) {
            self.actions.push(action);
        }

        fn on_dealer_reveal(&mut self, dealer_hand: &Hand) {
            assert!(!dealer_hand.has_face_down());
            self.reveals += 1;
        }

        fn on_round_settled(&mut self, report: &RoundReport) {
            self.settled.push(report.round);
        }
    }

    #[test]
    fn handler_sees_every_step() {
        let mut engine = RoundEngine::new(
            &TableRules::default(),
            CountingKind::HiLow,
            ChaCha8Rng::seed_from_u64(11),
        )
        .unwrap();
        let mut recorder = Recorder::default();
        let mut policy = BasicStrategy::new();
        for _ in 0..5 {
            engine.play_round(8, &mut policy, &mut recorder).unwrap();
        }
        assert_eq!(recorder.deals, 5);
        assert_eq!(recorder.reveals, 5);
        assert_eq!(recorder.settled, vec![1, 2, 3, 4, 5]);
        assert_eq!(engine.wealth_trajectory().len(), 6);
    }

    #[test]
    fn card_display() {
        let card = Card {
            rank: Rank::Ten,
            suit: Suit::Spades,
        };
        assert_eq!(card.to_string(), "TS");
        let card = Card {
            rank: Rank::Seven,
            suit: Suit::Diamonds,
        };
        assert_eq!(card.to_string(), "7D");
    }
}
