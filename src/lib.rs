//! Rules engine for the hotel-chain acquisition board game.
//!
//! The engine is a pure reducer: every operation borrows a [`GameState`]
//! snapshot and returns either a new snapshot or a [`GameError`] explaining
//! the rejection. Callers are expected to serialize actions per game.

pub mod action;
pub mod agent;
pub mod board;
pub mod chain;
pub mod config;
pub mod error;
pub mod lifecycle;
pub mod market;
pub mod placement;
pub mod state;
pub mod turn;
pub mod vote;

pub use action::Action;
pub use board::Tile;
pub use chain::{Chain, Tier};
pub use config::GameConfig;
pub use error::{GameError, InvalidTileId};
pub use lifecycle::StockChoice;
pub use market::Purchase;
pub use state::{GameState, Phase};
