pub mod board;
pub mod card;
pub mod error;
pub mod status;

pub use board::{default_columns, Board, Column};
pub use card::{Card, TaskItem};
pub use error::TaskdeckError;
pub use status::{CardStatus, Priority};
