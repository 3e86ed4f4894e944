//! Rule parameters. Carried inside every snapshot so all clients reduce with
//! the same numbers.

use crate::board::NUM_TILES;
use crate::error::GameError;
use serde::{Deserialize, Serialize};

/// Order in which defunct chains are resolved during a multi-way merger.
#[derive(Clone, Copy, PartialEq, Eq, Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DefunctOrder {
    /// Largest pre-merger chain first, declaration order among equals.
    #[default]
    LargestFirst,
    /// Declaration order regardless of size.
    DeclarationOrder,
}

/// How a bonus pool is split among tied holders.
#[derive(Clone, Copy, PartialEq, Eq, Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BonusRounding {
    /// Each holder gets the even share rounded up to the next $100.
    #[default]
    RoundUpHundred,
    /// Each holder gets the floored share; the remainder goes to the first
    /// holder in player order.
    FloorRemainderFirst,
}

#[derive(Clone, PartialEq, Eq, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct GameConfig {
    pub player_count: usize,
    pub starting_cash: u32,
    pub hand_size: usize,
    pub shares_per_chain: u32,
    pub buy_limit: u32,
    pub safe_size: usize,
    pub end_size: usize,
    pub initial_board_tiles: usize,
    pub defunct_order: DefunctOrder,
    pub bonus_rounding: BonusRounding,
    /// End the game once every active chain is safe.
    pub end_when_all_safe: bool,
}

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            player_count: 4,
            starting_cash: 6000,
            hand_size: 6,
            shares_per_chain: 25,
            buy_limit: 3,
            safe_size: 11,
            end_size: 41,
            initial_board_tiles: 1,
            defunct_order: DefunctOrder::default(),
            bonus_rounding: BonusRounding::default(),
            end_when_all_safe: false,
        }
    }
}

impl GameConfig {
    pub fn from_toml_str(source: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(source)
    }

    /// Rejects rule sets the game cannot be dealt or played under.
    pub fn validate(&self) -> Result<(), GameError> {
        let invalid = |reason: String| Err(GameError::InvalidConfig(reason));
        if self.player_count < 2 {
            return invalid(format!("player_count is {}, need at least 2", self.player_count));
        }
        if self.hand_size == 0 {
            return invalid("hand_size must be at least 1".to_owned());
        }
        if self.buy_limit == 0 {
            return invalid("buy_limit must be at least 1".to_owned());
        }
        if self.safe_size > self.end_size {
            return invalid(format!(
                "safe_size {} exceeds end_size {}",
                self.safe_size, self.end_size
            ));
        }
        let dealt = self.player_count * self.hand_size + self.initial_board_tiles;
        if dealt > NUM_TILES {
            return invalid(format!("dealing {} tiles, only {} exist", dealt, NUM_TILES));
        }
        Ok(())
    }

    /// Votes needed to end the game early: half the table, rounded up.
    pub fn vote_threshold(&self) -> usize {
        self.player_count.div_ceil(2)
    }
}
