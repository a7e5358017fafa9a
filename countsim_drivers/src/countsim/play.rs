use std::io::{self, BufRead, Write};

use countsim::{
    simulation::{hand::Hand, seat::Seat, Card, RoundEngine, RoundEventHandler, RoundReport, Turn},
    strategy::{BasicStrategy, SeatPolicy},
    Action, CountingKind, GameError, TableRules,
};
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

fn show_hand(hand: &Hand) -> String {
    let cards: Vec<String> = hand.cards().iter().map(Card::to_string).collect();
    let hidden = if hand.has_face_down() { " ??" } else { "" };
    format!("{}{} ({})", cards.join(" "), hidden, hand.total())
}

fn read_line() -> Option<String> {
    let _ = io::stdout().flush();
    let mut line = String::new();
    match io::stdin().lock().read_line(&mut line) {
        Ok(0) | Err(_) => None,
        Ok(_) => Some(line.trim().to_lowercase()),
    }
}

/// Takes the tracked seat's decisions from stdin.
struct TerminalPlayer {
    advisor: Option<BasicStrategy>,
}

impl SeatPolicy for TerminalPlayer {
    fn decide(&mut self, turn: &Turn<'_>) -> Action {
        println!(
            "Hand {}: {} against {}",
            turn.hand_index + 1,
            show_hand(turn.hand),
            turn.dealer_up_card
        );
        if let Some(advisor) = &self.advisor {
            let advice = advisor.advise_with(
                turn.hand,
                turn.dealer_up_card,
                turn.can_double,
                turn.can_split,
            );
            println!("Basic strategy says: {}", advice);
        }

        let mut choices = vec!["[h]it", "[s]tand"];
        if turn.can_double {
            choices.push("[d]ouble");
        }
        if turn.can_split {
            choices.push("s[p]lit");
        }
        loop {
            print!("{}? ", choices.join(", "));
            let action = match read_line().as_deref() {
                None => return Action::Stand,
                Some("h") | Some("hit") => Action::Hit,
                Some("s") | Some("stand") => Action::Stand,
                Some("d") | Some("double") if turn.can_double => Action::Double,
                Some("p") | Some("split") if turn.can_split => Action::Split,
                Some(_) => {
                    println!("Not allowed here.");
                    continue;
                }
            };
            return action;
        }
    }
}

/// Prints the table as the round goes.
struct TablePrinter {
    tracked_seat: usize,
}

impl RoundEventHandler for TablePrinter {
    fn on_reshuffle(&mut self, generation: u64) {
        println!("-- the shoe is reshuffled (shoe #{}), counts start over --", generation);
    }

    fn on_initial_deal(&mut self, seats: &[Seat], dealer_up_card: Card) {
        println!("Dealer shows {}", dealer_up_card);
        for (index, seat) in seats.iter().enumerate() {
            let marker = if index == self.tracked_seat { " (you)" } else { "" };
            if let Some(seat_hand) = seat.hands().first() {
                println!("Seat {}{}: {}", index + 1, marker, show_hand(seat_hand.hand()));
            }
        }
    }

    fn on_action(&mut self, seat: usize, _hand_index: usize, action: Action, hand: &Hand) {
        if seat != self.tracked_seat {
            println!("Seat {} {}s: {}", seat + 1, action, show_hand(hand));
        }
    }

    fn on_dealer_reveal(&mut self, dealer_hand: &Hand) {
        println!("Dealer has {}", show_hand(dealer_hand));
    }

    fn on_round_settled(&mut self, report: &RoundReport) {
        for result in report.results.iter().filter(|result| result.seat == self.tracked_seat) {
            println!(
                "Hand {}: {:?} ({:+.1})",
                result.hand_index + 1,
                result.outcome,
                result.delta
            );
        }
        println!("Balance: {:.1}", report.tracked_balance);
    }
}

/// Plays rounds until the player quits or can no longer bet.
pub fn play(rules: &TableRules, counting: CountingKind, advice: bool) -> Result<(), GameError> {
    let rng = ChaCha8Rng::seed_from_u64(rules.seed);
    let mut engine = RoundEngine::new(rules, counting, rng)?;
    let mut player = TerminalPlayer {
        advisor: if advice {
            Some(BasicStrategy::new())
        } else {
            None
        },
    };
    let mut printer = TablePrinter {
        tracked_seat: rules.tracked_seat,
    };
    println!(
        "{} deck(s), {} seat(s), you sit at seat {}, counting: {}",
        rules.number_of_decks,
        rules.number_of_seats,
        rules.tracked_seat + 1,
        counting.label()
    );

    loop {
        let balance = engine.tracked_balance();
        if balance < 1.0 {
            println!("You are out of money.");
            return Ok(());
        }
        let suggested = engine.recommended_bet().min(balance.floor() as u32).max(1);
        print!(
            "\nBalance {:.1}. Bet (enter for {}, q to quit): ",
            balance, suggested
        );
        let wager = match read_line().as_deref() {
            None | Some("q") => return Ok(()),
            Some("") => suggested,
            Some(text) => match text.parse::<u32>() {
                Ok(wager) => wager,
                Err(_) => {
                    println!("Please enter a whole number.");
                    continue;
                }
            },
        };
        match engine.play_round(wager, &mut player, &mut printer) {
            Ok(_) => {}
            Err(GameError::InvalidBet { .. }) => {
                println!("The bet must be between 1 and your balance.");
            }
            Err(err) => return Err(err),
        }
    }
}
