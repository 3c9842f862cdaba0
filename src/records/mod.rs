pub mod cash;
pub mod wager;

pub use cash::{CashMovement, MovementKind};
pub use wager::{CandidateMatch, Side, Wager, WagerStatus};
