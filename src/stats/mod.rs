pub mod aggregate;
pub mod bankroll;
pub mod segments;
pub mod settlement;
