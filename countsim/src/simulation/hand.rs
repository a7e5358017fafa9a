use super::{Card, Rank};

/// Best total of the given cards. Aces count 11 and drop to 1 one at a time
/// while the total is over 21.
pub fn total(cards: &[Card]) -> u8 {
    best_total(cards).0
}

/// Exactly two cards worth 21.
pub fn is_blackjack(cards: &[Card]) -> bool {
    cards.len() == 2 && total(cards) == 21
}

/// At least one ace is still counted as 11 without busting.
pub fn is_soft(cards: &[Card]) -> bool {
    let (total, soft_aces) = best_total(cards);
    soft_aces > 0 && total <= 21
}

/// Exactly two cards of identical rank.
pub fn is_pair(cards: &[Card]) -> bool {
    cards.len() == 2 && cards[0].rank == cards[1].rank
}

/// Returns the best total and the number of aces still counted as 11.
fn best_total(cards: &[Card]) -> (u8, u8) {
    let mut sum: u16 = 0;
    let mut aces: u8 = 0;
    for card in cards {
        if card.rank == Rank::Ace {
            aces += 1;
        }
        sum += card.rank.value() as u16;
    }
    while sum > 21 && aces > 0 {
        sum -= 10;
        aces -= 1;
    }
    (sum.min(u8::MAX as u16) as u8, aces)
}

/// The cards in front of one seat or the dealer.
///
/// The dealer's hole card is held face down and takes no part in any total
/// until it is revealed.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Hand {
    cards: Vec<Card>,
    face_down: Option<Card>,
}

impl Hand {
    pub fn new() -> Hand {
        Hand {
            cards: Vec::with_capacity(4),
            face_down: None,
        }
    }

    pub fn with_cards(cards: &[Card]) -> Hand {
        Hand {
            cards: cards.to_vec(),
            face_down: None,
        }
    }

    pub fn receive_card(&mut self, card: Card) {
        self.cards.push(card);
    }

    pub fn receive_face_down(&mut self, card: Card) {
        self.face_down = Some(card);
    }

    /// Turns the hole card face up. Returns it if there was one.
    pub fn reveal(&mut self) -> Option<Card> {
        let card = self.face_down.take()?;
        self.cards.push(card);
        Some(card)
    }

    /// Removes the second card, leaving a one-card hand. Used when splitting.
    pub(crate) fn split_off(&mut self) -> Option<Card> {
        if self.cards.len() != 2 {
            return None;
        }
        self.cards.pop()
    }

    /// Face-up cards, in the order they were dealt.
    pub fn cards(&self) -> &[Card] {
        &self.cards
    }

    pub fn has_face_down(&self) -> bool {
        self.face_down.is_some()
    }

    pub fn len(&self) -> usize {
        self.cards.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cards.is_empty() && self.face_down.is_none()
    }

    pub fn total(&self) -> u8 {
        total(&self.cards)
    }

    pub fn is_blackjack(&self) -> bool {
        self.face_down.is_none() && is_blackjack(&self.cards)
    }

    pub fn is_soft(&self) -> bool {
        is_soft(&self.cards)
    }

    pub fn is_pair(&self) -> bool {
        is_pair(&self.cards)
    }

    pub fn is_bust(&self) -> bool {
        self.total() > 21
    }

    pub fn up_card(&self) -> Option<Card> {
        self.cards.first().copied()
    }

    pub fn clear(&mut self) {
        self.cards.clear();
        self.face_down = None;
    }
}
