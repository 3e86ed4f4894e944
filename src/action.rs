//! The action surface exposed to the transport layer, and the dispatcher
//! that checks turn ownership before handing off to the rules.

use crate::board::Tile;
use crate::chain::Chain;
use crate::error::GameError;
use crate::lifecycle::StockChoice;
use crate::market::Purchase;
use crate::state::GameState;
use serde::{Deserialize, Serialize};
use tracing::{instrument, warn};

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Action {
    PlaceTile { tile: Tile },
    FoundChain { chain: Chain },
    ChooseMergerSurvivor { chain: Chain },
    PayMergerBonuses,
    MergerStockChoice { choice: StockChoice },
    BuyStocks { purchases: Vec<Purchase> },
    // Also how a player skips buying.
    EndTurn,
    DiscardTile { tile: Tile },
    EndGameVote { in_favor: bool },
    NewGame { names: Vec<String>, seed: u64 },
}

impl Action {
    pub fn name(&self) -> &'static str {
        match self {
            Action::PlaceTile { .. } => "place_tile",
            Action::FoundChain { .. } => "found_chain",
            Action::ChooseMergerSurvivor { .. } => "choose_merger_survivor",
            Action::PayMergerBonuses => "pay_merger_bonuses",
            Action::MergerStockChoice { .. } => "merger_stock_choice",
            Action::BuyStocks { .. } => "buy_stocks",
            Action::EndTurn => "end_turn",
            Action::DiscardTile { .. } => "discard_tile",
            Action::EndGameVote { .. } => "end_game_vote",
            Action::NewGame { .. } => "new_game",
        }
    }
}

impl GameState {
    /// Applies `action` on behalf of `actor`. The actor is checked against
    /// this snapshot, never against anything the caller claims.
    #[instrument(skip(self, action), fields(action = action.name()))]
    pub fn apply(&self, actor: usize, action: &Action) -> Result<GameState, GameError> {
        let result = self.dispatch(actor, action);
        if let Err(e) = &result {
            warn!(actor, code = e.code(), error = %e, "rejected");
        }
        result
    }

    fn dispatch(&self, actor: usize, action: &Action) -> Result<GameState, GameError> {
        // Votes and resets may come from any seat.
        let turn_bound = !matches!(action, Action::NewGame { .. } | Action::EndGameVote { .. });
        if turn_bound {
            if actor >= self.players.len() {
                return Err(GameError::UnknownPlayer(actor));
            }
            let expected = self.acting_player();
            if actor != expected {
                return Err(GameError::NotYourTurn {
                    player: actor,
                    expected,
                });
            }
        }
        match action {
            Action::PlaceTile { tile } => self.place_tile(*tile),
            Action::FoundChain { chain } => self.found_chain(*chain),
            Action::ChooseMergerSurvivor { chain } => self.choose_merger_survivor(*chain),
            Action::PayMergerBonuses => self.pay_merger_bonuses(),
            Action::MergerStockChoice { choice } => self.merger_stock_choice(*choice),
            Action::BuyStocks { purchases } => self.buy_stocks(purchases),
            Action::EndTurn => self.end_turn(),
            Action::DiscardTile { tile } => self.discard_tile(*tile),
            Action::EndGameVote { in_favor } => self.cast_end_game_vote(actor, *in_favor),
            Action::NewGame { names, seed } => {
                GameState::new_game(names, *seed, self.config.clone())
            }
        }
    }
}
