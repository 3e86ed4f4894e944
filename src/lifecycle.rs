use crate::board::{Cell, Tile};
use crate::chain::Chain;
use crate::config::DefunctOrder;
use crate::error::GameError;
use crate::market::{pay_bonuses, stock_price};
use crate::placement::connected_unincorporated;
use crate::state::{GameState, Merger, MergerPhase, Phase};
use serde::{Deserialize, Serialize};
use std::cmp::Reverse;
use tracing::{debug, info, instrument};

/// What a holder does with their shares of the defunct chain.
#[derive(Clone, Copy, PartialEq, Eq, Debug, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum StockChoice {
    // Sell to the bank at the pre-merger price.
    Sell { quantity: u32 },
    // Two defunct shares for one survivor share.
    Trade { quantity: u32 },
    Keep,
}

#[derive(Clone, PartialEq, Eq, Debug)]
pub enum MergerPlan {
    Survivor { survivor: Chain, defunct: Vec<Chain> },
    // The acting player must pick among chains tied for largest.
    Tie { candidates: Vec<Chain> },
}

impl GameState {
    pub fn analyze_merger(&self, merging: &[Chain]) -> MergerPlan {
        let largest = merging
            .iter()
            .map(|&c| self.chains.size(c))
            .max()
            .unwrap_or(0);
        let mut candidates = merging
            .iter()
            .copied()
            .filter(|&c| self.chains.size(c) == largest)
            .collect::<Vec<Chain>>();
        candidates.sort_unstable();
        if let [survivor] = candidates[..] {
            MergerPlan::Survivor {
                survivor,
                defunct: self.defunct_queue(survivor, merging),
            }
        } else {
            MergerPlan::Tie { candidates }
        }
    }

    fn defunct_queue(&self, survivor: Chain, merging: &[Chain]) -> Vec<Chain> {
        let mut defunct = merging
            .iter()
            .copied()
            .filter(|&c| c != survivor)
            .collect::<Vec<Chain>>();
        match self.config.defunct_order {
            DefunctOrder::LargestFirst => {
                defunct.sort_unstable_by_key(|&c| (Reverse(self.chains.size(c)), c))
            }
            DefunctOrder::DeclarationOrder => defunct.sort_unstable(),
        }
        defunct
    }

    fn next_defunct(&self, survivor: Chain, mut queue: Vec<Chain>) -> Merger {
        let defunct = queue.remove(0);
        Merger {
            survivor,
            defunct,
            defunct_size: self.chains.size(defunct),
            queue,
        }
    }

    pub(crate) fn begin_merger(&mut self, merging: &[Chain]) {
        self.phase = match self.analyze_merger(merging) {
            MergerPlan::Survivor { survivor, defunct } => {
                info!(%survivor, ?defunct, "merger");
                Phase::Merger(MergerPhase::PayBonuses(
                    self.next_defunct(survivor, defunct),
                ))
            }
            MergerPlan::Tie { candidates } => {
                info!(?candidates, "merger needs a survivor");
                Phase::Merger(MergerPhase::ChooseSurvivor {
                    candidates,
                    merging: merging.to_vec(),
                })
            }
        };
    }

    fn incorporate(&mut self, chain: Chain, tiles: impl IntoIterator<Item = Tile> + Clone) {
        for t in tiles.clone() {
            self.board.set(t, Cell::Chain(chain));
        }
        self.chains.absorb(chain, tiles);
    }

    /// Names the chain formed by the last placement. The founder receives one
    /// free share while the bank has any.
    #[instrument(skip(self))]
    pub fn found_chain(&self, chain: Chain) -> Result<GameState, GameError> {
        let Phase::FoundChain { tiles } = &self.phase else {
            return Err(GameError::WrongPhase {
                expected: "found_chain",
                actual: self.phase.name(),
            });
        };
        if self.chains.is_active(chain) {
            return Err(GameError::ChainAlreadyActive(chain));
        }
        let mut next = self.clone();
        next.incorporate(chain, tiles.clone());
        let founder = next.current_player;
        let bonus = u32::from(next.bank(chain) > 0);
        next.issue_shares(founder, chain, bonus);
        next.phase = Phase::BuyStock;
        next.log(
            Some(founder),
            format!(
                "{} founded {} with {} tiles",
                next.players[founder].name,
                chain,
                tiles.len()
            ),
        );
        Ok(next)
    }

    /// Extends `chain` with the last placed tile and any unincorporated
    /// hotels it connects.
    #[instrument(skip(self))]
    pub fn grow_chain(&self, chain: Chain) -> Result<GameState, GameError> {
        if self.phase != Phase::PlaceTile {
            return Err(GameError::WrongPhase {
                expected: "place_tile",
                actual: self.phase.name(),
            });
        }
        let tile = self.last_placed_tile.ok_or(GameError::NoTilePlaced)?;
        if !self.chains.is_active(chain) {
            return Err(GameError::ChainInactive(chain));
        }
        let mut next = self.clone();
        let growth = connected_unincorporated(&next.board, tile);
        let was_safe = next.chains.is_safe(chain);
        next.incorporate(chain, growth.clone());
        if !was_safe && next.chains.is_safe(chain) {
            info!(%chain, "chain is now safe");
        }
        next.phase = Phase::BuyStock;
        next.log(
            Some(next.current_player),
            format!(
                "{} grew by {} to {} tiles",
                chain,
                growth.len(),
                next.chains.size(chain)
            ),
        );
        Ok(next)
    }

    #[instrument(skip(self))]
    pub fn choose_merger_survivor(&self, survivor: Chain) -> Result<GameState, GameError> {
        let Phase::Merger(MergerPhase::ChooseSurvivor {
            candidates,
            merging,
        }) = &self.phase
        else {
            return Err(GameError::WrongPhase {
                expected: "merger_choose_survivor",
                actual: self.phase.name(),
            });
        };
        if !candidates.contains(&survivor) {
            return Err(GameError::NotSurvivorCandidate(survivor));
        }
        let mut next = self.clone();
        let queue = next.defunct_queue(survivor, merging);
        next.phase = Phase::Merger(MergerPhase::PayBonuses(
            next.next_defunct(survivor, queue),
        ));
        next.log(
            Some(next.current_player),
            format!("{} chose {} to survive", next.current().name, survivor),
        );
        Ok(next)
    }

    /// Pays the majority and minority bonuses on the current defunct chain,
    /// then opens share disposition to its holders.
    #[instrument(skip(self))]
    pub fn pay_merger_bonuses(&self) -> Result<GameState, GameError> {
        let Phase::Merger(MergerPhase::PayBonuses(merger)) = &self.phase else {
            return Err(GameError::WrongPhase {
                expected: "merger_pay_bonuses",
                actual: self.phase.name(),
            });
        };
        let merger = merger.clone();
        let mut next = self.clone();
        let rounding = next.config.bonus_rounding;
        let payouts = pay_bonuses(
            &mut next.players,
            merger.defunct,
            merger.defunct_size,
            rounding,
        );
        for p in &payouts {
            let name = next.players[p.player].name.clone();
            next.log(
                Some(p.player),
                format!("{} received ${} bonus on {}", name, p.amount, merger.defunct),
            );
        }

        // Holders decide in seat order, starting with the merging player.
        let n = next.players.len();
        let holders = (0..n)
            .map(|i| (next.current_player + i) % n)
            .filter(|&p| next.players[p].shares(merger.defunct) > 0)
            .collect::<Vec<usize>>();
        if holders.is_empty() {
            next.finish_defunct(merger);
        } else {
            next.phase = Phase::Merger(MergerPhase::HandleStock {
                merger,
                holders,
                next: 0,
            });
        }
        Ok(next)
    }

    /// Applies one holder's disposition of their defunct shares.
    #[instrument(skip(self))]
    pub fn merger_stock_choice(&self, choice: StockChoice) -> Result<GameState, GameError> {
        let Phase::Merger(MergerPhase::HandleStock {
            merger,
            holders,
            next: idx,
        }) = &self.phase
        else {
            return Err(GameError::WrongPhase {
                expected: "merger_handle_stock",
                actual: self.phase.name(),
            });
        };
        let player = holders[*idx];
        let defunct = merger.defunct;
        let held = self.players[player].shares(defunct);
        let check_held = |quantity: u32| {
            if quantity > held {
                Err(GameError::InsufficientShares {
                    chain: defunct,
                    requested: quantity,
                    held,
                })
            } else {
                Ok(())
            }
        };

        let mut next = self.clone();
        let name = next.players[player].name.clone();
        match choice {
            StockChoice::Sell { quantity } => {
                check_held(quantity)?;
                let proceeds = quantity * stock_price(defunct, merger.defunct_size);
                next.redeem_shares(player, defunct, quantity);
                next.players[player].cash += proceeds;
                next.log(
                    Some(player),
                    format!("{} sold {} {} for ${}", name, quantity, defunct, proceeds),
                );
            }
            StockChoice::Trade { quantity } => {
                if quantity % 2 != 0 {
                    return Err(GameError::OddTradeQuantity(quantity));
                }
                check_held(quantity)?;
                let received = quantity / 2;
                let available = next.bank(merger.survivor);
                if received > available {
                    return Err(GameError::BankExhausted {
                        chain: merger.survivor,
                        requested: received,
                        available,
                    });
                }
                next.redeem_shares(player, defunct, quantity);
                next.issue_shares(player, merger.survivor, received);
                next.log(
                    Some(player),
                    format!(
                        "{} traded {} {} for {} {}",
                        name, quantity, defunct, received, merger.survivor
                    ),
                );
            }
            StockChoice::Keep => {
                next.log(Some(player), format!("{} kept {} {}", name, held, defunct));
            }
        }

        if idx + 1 == holders.len() {
            next.finish_defunct(merger.clone());
        } else {
            next.phase = Phase::Merger(MergerPhase::HandleStock {
                merger: merger.clone(),
                holders: holders.clone(),
                next: idx + 1,
            });
        }
        Ok(next)
    }

    // Folds the defunct chain into the survivor, then moves on to the next
    // defunct chain or, once the queue is empty, to the buy phase.
    fn finish_defunct(&mut self, merger: Merger) {
        let Merger {
            survivor,
            defunct,
            queue,
            ..
        } = merger;
        let tiles = self.chains.deactivate(defunct);
        self.incorporate(survivor, tiles);
        self.log(
            Some(self.current_player),
            format!(
                "{} absorbed {}, now {} tiles",
                survivor,
                defunct,
                self.chains.size(survivor)
            ),
        );
        if !queue.is_empty() {
            self.phase = Phase::Merger(MergerPhase::PayBonuses(
                self.next_defunct(survivor, queue),
            ));
            return;
        }
        if let Some(tile) = self.last_placed_tile {
            let joined = connected_unincorporated(&self.board, tile);
            self.incorporate(survivor, joined);
        }
        debug!(%survivor, size = self.chains.size(survivor), "merger complete");
        self.phase = Phase::BuyStock;
    }
}
