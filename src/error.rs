use crate::board::Tile;
use crate::chain::Chain;
use thiserror::Error;

/// A tile id that does not match `[1-9][A-L]`.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("invalid tile id {0:?}: expected a row 1-9 followed by a column A-L")]
pub struct InvalidTileId(pub String);

/// Why an action was rejected. The snapshot the action was applied to is
/// left untouched whenever one of these is returned.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum GameError {
    #[error("wrong phase: expected {expected}, game is in {actual}")]
    WrongPhase {
        expected: &'static str,
        actual: &'static str,
    },

    #[error("not your turn: player {player} acted, waiting on player {expected}")]
    NotYourTurn { player: usize, expected: usize },

    #[error("unknown player {0}")]
    UnknownPlayer(usize),

    #[error("expected {expected} players, got {actual}")]
    WrongPlayerCount { expected: usize, actual: usize },

    #[error("invalid config: {0}")]
    InvalidConfig(String),

    #[error("tile {0} is not in hand")]
    TileNotInHand(Tile),

    #[error("tile {0} may still become playable and cannot be discarded")]
    TileNotDead(Tile),

    #[error("no tile has been placed this turn")]
    NoTilePlaced,

    #[error("a playable tile is still in hand")]
    PlayableTileInHand,

    #[error("cannot found an eighth chain: all 7 chains are already active")]
    ChainLimitReached,

    #[error("cannot merge two or more safe chains: {0:?}")]
    SafeChainMerger(Vec<Chain>),

    #[error("chain {0} is already active")]
    ChainAlreadyActive(Chain),

    #[error("chain {0} is not active")]
    ChainInactive(Chain),

    #[error("chain {0} is not a candidate to survive this merger")]
    NotSurvivorCandidate(Chain),

    #[error("not enough cash: need ${needed}, have ${available}")]
    InsufficientCash { needed: u32, available: u32 },

    #[error("purchase limit: {already} bought this turn, {requested} requested, limit is {limit}")]
    PurchaseLimit {
        already: u32,
        requested: u32,
        limit: u32,
    },

    #[error("bank has {available} shares of {chain}, {requested} requested")]
    BankExhausted {
        chain: Chain,
        requested: u32,
        available: u32,
    },

    #[error("cannot dispose of {requested} shares of {chain}, only {held} held")]
    InsufficientShares {
        chain: Chain,
        requested: u32,
        held: u32,
    },

    #[error("trades are 2-for-1, {0} is not an even quantity")]
    OddTradeQuantity(u32),
}

impl GameError {
    /// Stable machine-readable reason, suitable for the wire.
    pub fn code(&self) -> &'static str {
        match self {
            GameError::WrongPhase { .. } => "wrong_phase",
            GameError::NotYourTurn { .. } => "not_your_turn",
            GameError::UnknownPlayer(_) => "unknown_player",
            GameError::WrongPlayerCount { .. } => "wrong_player_count",
            GameError::InvalidConfig(_) => "invalid_config",
            GameError::TileNotInHand(_) => "tile_not_in_hand",
            GameError::TileNotDead(_) => "tile_not_dead",
            GameError::NoTilePlaced => "no_tile_placed",
            GameError::PlayableTileInHand => "playable_tile_in_hand",
            GameError::ChainLimitReached => "chain_limit_reached",
            GameError::SafeChainMerger(_) => "safe_chain_merger",
            GameError::ChainAlreadyActive(_) => "chain_already_active",
            GameError::ChainInactive(_) => "chain_inactive",
            GameError::NotSurvivorCandidate(_) => "not_survivor_candidate",
            GameError::InsufficientCash { .. } => "insufficient_cash",
            GameError::PurchaseLimit { .. } => "purchase_limit",
            GameError::BankExhausted { .. } => "bank_exhausted",
            GameError::InsufficientShares { .. } => "insufficient_shares",
            GameError::OddTradeQuantity(_) => "odd_trade_quantity",
        }
    }
}
