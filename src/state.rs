//! The game snapshot. Every reducer operation takes a `&GameState` and hands
//! back a fresh one; earlier snapshots stay valid for audit and replay.

use crate::board::{Board, Tile};
use crate::chain::{Chain, ChainRegistry, NUM_CHAINS};
use crate::config::GameConfig;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use tracing::debug;

#[derive(Serialize, Deserialize, Clone, PartialEq, Eq, Debug)]
pub struct Player {
    pub id: usize,
    pub name: String,
    pub cash: u32,
    pub hand: Vec<Tile>,
    pub stocks: [u32; NUM_CHAINS],
}
impl Player {
    pub fn new(id: usize, name: impl Into<String>, cash: u32, hand: Vec<Tile>) -> Self {
        Self {
            id,
            name: name.into(),
            cash,
            hand,
            stocks: [0; NUM_CHAINS],
        }
    }
    pub fn shares(&self, chain: Chain) -> u32 {
        self.stocks[chain.index()]
    }
    pub fn total_shares(&self) -> u32 {
        self.stocks.iter().sum()
    }
    pub fn holds(&self, tile: Tile) -> bool {
        self.hand.contains(&tile)
    }
    fn display(&self) -> String {
        format!(
            "{}: Cash: ${}, Stocks: [{}], Tiles: [{}]",
            self.name,
            self.cash,
            Chain::ALL
                .iter()
                .filter(|c| self.shares(**c) > 0)
                .map(|c| format!("{}: {}", c, self.shares(*c)))
                .collect::<Vec<String>>()
                .join(", "),
            self.hand
                .iter()
                .map(|t| t.to_string())
                .collect::<Vec<String>>()
                .join(", ")
        )
    }
}

/// The merger currently being resolved.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct Merger {
    pub survivor: Chain,
    pub defunct: Chain,
    // Size of the defunct chain before any of its tiles moved.
    pub defunct_size: usize,
    // Defunct chains still waiting their turn, in processing order.
    pub queue: Vec<Chain>,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub enum MergerPhase {
    // Two or more of the merging chains tie for largest.
    // Payload: (tied candidates, all merging chains).
    ChooseSurvivor {
        candidates: Vec<Chain>,
        merging: Vec<Chain>,
    },
    // Majority/minority bonuses are due on `merger.defunct`.
    PayBonuses(Merger),
    // Each holder of the defunct chain disposes of their shares in turn.
    HandleStock {
        merger: Merger,
        holders: Vec<usize>,
        next: usize,
    },
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub enum Phase {
    PlaceTile,
    // The placed tile connected unincorporated hotels; a name is pending.
    FoundChain { tiles: Vec<Tile> },
    Merger(MergerPhase),
    BuyStock,
    GameOver,
}
impl Phase {
    pub fn name(&self) -> &'static str {
        match self {
            Phase::PlaceTile => "place_tile",
            Phase::FoundChain { .. } => "found_chain",
            Phase::Merger(MergerPhase::ChooseSurvivor { .. }) => "merger_choose_survivor",
            Phase::Merger(MergerPhase::PayBonuses(_)) => "merger_pay_bonuses",
            Phase::Merger(MergerPhase::HandleStock { .. }) => "merger_handle_stock",
            Phase::BuyStock => "buy_stock",
            Phase::GameOver => "game_over",
        }
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct LogEntry {
    pub player: Option<usize>,
    pub message: String,
}

#[derive(Serialize, Deserialize, Clone, PartialEq, Eq, Debug)]
pub struct GameState {
    pub config: GameConfig,
    pub board: Board,
    pub chains: ChainRegistry,
    pub players: Vec<Player>,
    pub stock_bank: [u32; NUM_CHAINS],
    pub tile_bag: Vec<Tile>,
    pub current_player: usize,
    pub phase: Phase,
    pub last_placed_tile: Option<Tile>,
    pub stocks_purchased_this_turn: u32,
    pub game_log: im::Vector<LogEntry>,
    pub winner: Option<usize>,
    pub end_game_votes: BTreeSet<usize>,
}
impl std::fmt::Display for GameState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        for (i, p) in self.players.iter().enumerate() {
            writeln!(f, "Player {}: value = ${}", i, self.player_value(i))?;
            writeln!(f, "  {}", p.display())?;
        }
        write!(f, "{}", self.board)?;
        writeln!(
            f,
            "Chain sizes: {:?}",
            Chain::ALL.map(|c| self.chains.size(c))
        )?;
        writeln!(f, "Stock bank: {:?}", self.stock_bank)?;
        writeln!(
            f,
            "Player {} to act, phase {}",
            self.current_player,
            self.phase.name()
        )
    }
}
impl GameState {
    pub fn current(&self) -> &Player {
        &self.players[self.current_player]
    }
    pub fn bank(&self, chain: Chain) -> u32 {
        self.stock_bank[chain.index()]
    }
    pub fn stock_price(&self, chain: Chain) -> u32 {
        self.chains.price(chain)
    }
    pub fn player_value(&self, player: usize) -> u32 {
        let p = &self.players[player];
        p.cash
            + Chain::ALL
                .iter()
                .map(|&c| p.shares(c) * self.stock_price(c))
                .sum::<u32>()
    }
    pub fn is_over(&self) -> bool {
        self.phase == Phase::GameOver
    }
    /// The player whose input the game is waiting on.
    pub fn acting_player(&self) -> usize {
        match &self.phase {
            Phase::Merger(MergerPhase::HandleStock { holders, next, .. }) => holders[*next],
            _ => self.current_player,
        }
    }
    pub(crate) fn log(&mut self, player: Option<usize>, message: String) {
        debug!(?player, %message, "game log");
        self.game_log.push_back(LogEntry { player, message });
    }
    // Callers validate bank and holdings first.
    pub(crate) fn issue_shares(&mut self, player: usize, chain: Chain, count: u32) {
        self.stock_bank[chain.index()] -= count;
        self.players[player].stocks[chain.index()] += count;
    }
    pub(crate) fn redeem_shares(&mut self, player: usize, chain: Chain, count: u32) {
        self.players[player].stocks[chain.index()] -= count;
        self.stock_bank[chain.index()] += count;
    }
}
