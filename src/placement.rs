use crate::board::{Board, Cell, Tile};
use crate::chain::Chain;
use crate::error::GameError;
use crate::state::GameState;
use std::collections::{BTreeSet, VecDeque};

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum PlacementAction {
    PlaceOnly,
    FormChain,
    GrowChain,
    MergeChains,
}

#[derive(Clone, PartialEq, Eq, Debug)]
pub struct Placement {
    pub tile: Tile,
    pub action: PlacementAction,
    /// Distinct active chains touching the tile, in declaration order.
    pub adjacent_chains: Vec<Chain>,
    /// Placed neighbors that belong to no chain.
    pub adjacent_unincorporated: Vec<Tile>,
    /// The tile plus every unincorporated hotel reachable from it.
    pub connected: Vec<Tile>,
    pub reason: Option<GameError>,
}
impl Placement {
    pub fn is_valid(&self) -> bool {
        self.reason.is_none()
    }
}

/// Breadth-first search from `start` through placed tiles that belong to no
/// chain. `start` itself is always included, placed or not.
pub fn connected_unincorporated(board: &Board, start: Tile) -> Vec<Tile> {
    let mut seen = BTreeSet::from([start]);
    let mut frontier = VecDeque::from([start]);
    while let Some(tile) = frontier.pop_front() {
        for (next, cell) in board.neighbors(tile) {
            if cell == Cell::Hotel && seen.insert(next) {
                frontier.push_back(next);
            }
        }
    }
    seen.into_iter().collect()
}

pub fn classify(state: &GameState, tile: Tile) -> Placement {
    let neighbors = state.board.neighbors(tile);
    let mut adjacent_chains = neighbors
        .iter()
        .filter_map(|(_, cell)| cell.chain())
        .collect::<Vec<Chain>>();
    adjacent_chains.sort_unstable();
    adjacent_chains.dedup();
    let adjacent_unincorporated = neighbors
        .iter()
        .filter(|(_, cell)| *cell == Cell::Hotel)
        .map(|(t, _)| *t)
        .collect::<Vec<Tile>>();

    let (action, reason) = match (adjacent_chains.len(), adjacent_unincorporated.len()) {
        (0, 0) => (PlacementAction::PlaceOnly, None),
        (0, _) => {
            let reason = state
                .chains
                .all_active()
                .then_some(GameError::ChainLimitReached);
            (PlacementAction::FormChain, reason)
        }
        (1, _) => (PlacementAction::GrowChain, None),
        _ => {
            let safe = adjacent_chains
                .iter()
                .copied()
                .filter(|&c| state.chains.is_safe(c))
                .collect::<Vec<Chain>>();
            let reason = (safe.len() >= 2).then_some(GameError::SafeChainMerger(safe));
            (PlacementAction::MergeChains, reason)
        }
    };
    Placement {
        tile,
        action,
        adjacent_chains,
        adjacent_unincorporated,
        connected: connected_unincorporated(&state.board, tile),
        reason,
    }
}

pub fn is_playable(state: &GameState, tile: Tile) -> bool {
    !state.board.is_placed(tile) && classify(state, tile).is_valid()
}

/// A dead tile would merge two safe chains. Safety never reverts, so it can
/// never become playable again.
pub fn is_dead(state: &GameState, tile: Tile) -> bool {
    matches!(
        classify(state, tile).reason,
        Some(GameError::SafeChainMerger(_))
    )
}
