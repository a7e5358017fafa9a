use thiserror::Error;

use crate::{simulation::GamePhase, Action};

#[derive(Error, Debug, Clone, PartialEq)]
pub enum GameError {
    #[error("invalid bet {wager} for seat {seat} with balance {balance}")]
    InvalidBet { seat: usize, wager: u32, balance: f64 },
    #[error("cannot {action} now: {reason}")]
    IllegalAction { action: Action, reason: &'static str },
    #[error("shoe exhausted: the shoe holds no cards")]
    ShoeExhausted,
    #[error("{operation} is only allowed in {expected:?} phase, current phase is {actual:?}")]
    WrongPhase {
        operation: &'static str,
        expected: GamePhase,
        actual: GamePhase,
    },
    #[error("no seat at index {0}")]
    NoSeat(usize),
    #[error("configuration error: {0}")]
    Config(String),
}
