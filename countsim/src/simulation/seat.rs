use super::hand::Hand;
use super::Card;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SeatKind {
    /// The seat whose decisions come from the caller and whose balance is reported.
    Tracked,
    /// A background player following a fixed policy.
    Bot,
}

/// One hand played from a seat together with its wager.
#[derive(Debug, Clone)]
pub struct SeatHand {
    hand: Hand,
    wager: u32,
    doubled: bool,
    from_split: bool,
    actions_taken: u8,
    finished: bool,
}

impl SeatHand {
    fn new(wager: u32) -> SeatHand {
        SeatHand {
            hand: Hand::new(),
            wager,
            doubled: false,
            from_split: false,
            actions_taken: 0,
            finished: false,
        }
    }

    pub fn hand(&self) -> &Hand {
        &self.hand
    }

    /// Current wager, already doubled if the hand doubled down.
    pub fn wager(&self) -> u32 {
        self.wager
    }

    pub fn has_doubled_down(&self) -> bool {
        self.doubled
    }

    pub fn is_from_split(&self) -> bool {
        self.from_split
    }

    pub fn is_finished(&self) -> bool {
        self.finished
    }

    /// A two-card 21 that was dealt, not built after a split.
    pub fn is_natural(&self) -> bool {
        !self.from_split && self.hand.is_blackjack()
    }

    fn is_first_action(&self) -> bool {
        self.actions_taken == 0 && self.hand.len() == 2
    }
}

/// A player position: a balance and the hands played this round. It holds
/// more than one hand only after a split.
#[derive(Debug, Clone)]
pub struct Seat {
    kind: SeatKind,
    balance: f64,
    hands: Vec<SeatHand>,
}

impl Seat {
    pub fn new(kind: SeatKind, balance: f64) -> Seat {
        Seat {
            kind,
            balance,
            hands: Vec::with_capacity(2),
        }
    }

    pub fn kind(&self) -> SeatKind {
        self.kind
    }

    pub fn balance(&self) -> f64 {
        self.balance
    }

    pub fn hands(&self) -> &[SeatHand] {
        &self.hands
    }

    pub fn has_wager(&self) -> bool {
        !self.hands.is_empty()
    }

    pub fn is_split(&self) -> bool {
        self.hands.len() > 1
    }

    /// Sum of the wagers on the table for this seat.
    pub fn committed(&self) -> u64 {
        self.hands.iter().map(|hand| hand.wager as u64).sum()
    }

    /// Whether the balance covers `extra` on top of what is already wagered.
    pub fn can_cover(&self, extra: u32) -> bool {
        (self.committed() + extra as u64) as f64 <= self.balance
    }

    pub fn can_double_down(&self, hand_index: usize) -> bool {
        self.check_double_down(hand_index).is_ok()
    }

    pub fn can_split(&self, hand_index: usize) -> bool {
        self.check_split(hand_index).is_ok()
    }

    pub(crate) fn check_double_down(&self, hand_index: usize) -> Result<(), &'static str> {
        let seat_hand = self.hands.get(hand_index).ok_or("no such hand")?;
        if !seat_hand.is_first_action() {
            return Err("double down is only allowed as the first action on a two-card hand");
        }
        if !self.can_cover(seat_hand.wager) {
            return Err("balance does not cover the additional wager");
        }
        Ok(())
    }

    pub(crate) fn check_split(&self, hand_index: usize) -> Result<(), &'static str> {
        let seat_hand = self.hands.get(hand_index).ok_or("no such hand")?;
        if self.is_split() {
            return Err("a split hand cannot be split again");
        }
        if !seat_hand.is_first_action() {
            return Err("split is only allowed as the first action on a two-card hand");
        }
        if !seat_hand.hand.is_pair() {
            return Err("split needs two cards of the same rank");
        }
        if !self.can_cover(seat_hand.wager) {
            return Err("balance does not cover the additional wager");
        }
        Ok(())
    }

    pub(crate) fn place_wager(&mut self, wager: u32) {
        self.hands.clear();
        self.hands.push(SeatHand::new(wager));
    }

    pub(crate) fn receive_card(&mut self, hand_index: usize, card: Card) {
        self.hands[hand_index].hand.receive_card(card);
    }

    pub(crate) fn record_action(&mut self, hand_index: usize) {
        self.hands[hand_index].actions_taken += 1;
    }

    pub(crate) fn finish(&mut self, hand_index: usize) {
        self.hands[hand_index].finished = true;
    }

    pub(crate) fn double_down(&mut self, hand_index: usize) {
        let seat_hand = &mut self.hands[hand_index];
        seat_hand.wager *= 2;
        seat_hand.doubled = true;
    }

    /// Splits the given hand into two one-card hands with the same wager.
    /// The new hand is placed right after the original one.
    pub(crate) fn split(&mut self, hand_index: usize) {
        let wager = self.hands[hand_index].wager;
        let card = match self.hands[hand_index].hand.split_off() {
            Some(card) => card,
            None => return,
        };
        self.hands[hand_index].from_split = true;
        let mut new_hand = SeatHand::new(wager);
        new_hand.from_split = true;
        new_hand.hand.receive_card(card);
        self.hands.insert(hand_index + 1, new_hand);
    }

    pub(crate) fn settle(&mut self, delta: f64) {
        self.balance += delta;
    }

    pub(crate) fn restake(&mut self, balance: f64) {
        self.balance = balance;
    }

    /// Removes all the hands, leaving the seat ready for the next bet.
    pub(crate) fn clear(&mut self) {
        self.hands.clear();
    }
}
