use crate::chain::Chain;
use crate::config::BonusRounding;
use crate::error::GameError;
use crate::state::{GameState, Phase, Player};
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};

pub fn stock_price(chain: Chain, size: usize) -> u32 {
    chain.tier().price(size)
}

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub struct Bonuses {
    pub majority: u32,
    pub minority: u32,
}

pub fn bonuses(chain: Chain, size: usize) -> Bonuses {
    let price = stock_price(chain, size);
    Bonuses {
        majority: price * 10,
        minority: price * 5,
    }
}

#[derive(Clone, PartialEq, Eq, Debug, Default)]
pub struct Rankings {
    pub majority: Vec<usize>,
    pub minority: Vec<usize>,
}

pub fn stockholder_rankings(players: &[Player], chain: Chain) -> Rankings {
    let mut counts = players
        .iter()
        .map(|p| p.shares(chain))
        .filter(|&n| n > 0)
        .collect::<Vec<u32>>();
    counts.sort_unstable_by(|a, b| b.cmp(a));
    counts.dedup();
    let holders_of = |count: Option<&u32>| -> Vec<usize> {
        count.map_or_else(Vec::new, |&n| {
            players
                .iter()
                .enumerate()
                .filter(|(_, p)| p.shares(chain) == n)
                .map(|(i, _)| i)
                .collect()
        })
    };
    Rankings {
        majority: holders_of(counts.first()),
        minority: holders_of(counts.get(1)),
    }
}

/// Splits `pool` among `count` holders, in player order.
pub fn split_pool(pool: u32, count: usize, rounding: BonusRounding) -> Vec<u32> {
    if count == 0 {
        return vec![];
    }
    let n = count as u32;
    match rounding {
        BonusRounding::RoundUpHundred => {
            let mut amount = pool / n;
            // Round up to the nearest 100.
            if amount % 100 != 0 {
                amount += 100 - (amount % 100);
            }
            vec![amount; count]
        }
        BonusRounding::FloorRemainderFirst => {
            let mut shares = vec![pool / n; count];
            shares[0] += pool % n;
            shares
        }
    }
}

#[derive(Clone, Copy, PartialEq, Eq, Debug, Serialize, Deserialize)]
pub struct Payout {
    pub player: usize,
    pub amount: u32,
}

/// Pays majority and minority bonuses for `chain` at `size`. Without a
/// distinct minority group the minority pool also goes to the majority.
pub fn pay_bonuses(
    players: &mut [Player],
    chain: Chain,
    size: usize,
    rounding: BonusRounding,
) -> Vec<Payout> {
    let rankings = stockholder_rankings(players, chain);
    let Bonuses { majority, minority } = bonuses(chain, size);
    let mut awards = vec![0; players.len()];
    for (&p, amount) in rankings
        .majority
        .iter()
        .zip(split_pool(majority, rankings.majority.len(), rounding))
    {
        awards[p] += amount;
    }
    let minority_group = if rankings.minority.is_empty() {
        &rankings.majority
    } else {
        &rankings.minority
    };
    for (&p, amount) in minority_group
        .iter()
        .zip(split_pool(minority, minority_group.len(), rounding))
    {
        awards[p] += amount;
    }
    awards
        .into_iter()
        .enumerate()
        .filter(|(_, amount)| *amount > 0)
        .map(|(player, amount)| {
            players[player].cash += amount;
            Payout { player, amount }
        })
        .collect()
}

#[derive(Clone, Copy, PartialEq, Eq, Debug, Serialize, Deserialize)]
pub struct Purchase {
    pub chain: Chain,
    pub quantity: u32,
}

impl GameState {
    /// Buys shares for the current player. The whole order is validated
    /// before anything changes hands.
    #[instrument(skip(self), fields(player = self.current_player))]
    pub fn buy_stocks(&self, purchases: &[Purchase]) -> Result<GameState, GameError> {
        if self.phase != Phase::BuyStock {
            return Err(GameError::WrongPhase {
                expected: "buy_stock",
                actual: self.phase.name(),
            });
        }
        if purchases.is_empty() {
            return Ok(self.clone());
        }
        // Quantities come off the wire; saturate so a huge line trips the cap.
        let requested = purchases
            .iter()
            .fold(0u32, |total, p| total.saturating_add(p.quantity));
        let limit = self.config.buy_limit;
        if self.stocks_purchased_this_turn.saturating_add(requested) > limit {
            return Err(GameError::PurchaseLimit {
                already: self.stocks_purchased_this_turn,
                requested,
                limit,
            });
        }
        let mut ordered = [0u32; crate::chain::NUM_CHAINS];
        let mut cost = 0u32;
        for p in purchases {
            if !self.chains.is_active(p.chain) {
                return Err(GameError::ChainInactive(p.chain));
            }
            ordered[p.chain.index()] = ordered[p.chain.index()].saturating_add(p.quantity);
            let wanted = ordered[p.chain.index()];
            if wanted > self.bank(p.chain) {
                return Err(GameError::BankExhausted {
                    chain: p.chain,
                    requested: wanted,
                    available: self.bank(p.chain),
                });
            }
            cost = self
                .stock_price(p.chain)
                .checked_mul(p.quantity)
                .and_then(|line| cost.checked_add(line))
                .unwrap_or(u32::MAX);
        }
        let cash = self.current().cash;
        if cost > cash {
            return Err(GameError::InsufficientCash {
                needed: cost,
                available: cash,
            });
        }

        let mut next = self.clone();
        let player = next.current_player;
        next.players[player].cash -= cost;
        for p in purchases {
            next.issue_shares(player, p.chain, p.quantity);
        }
        next.stocks_purchased_this_turn += requested;
        let summary = purchases
            .iter()
            .filter(|p| p.quantity > 0)
            .map(|p| format!("{} {}", p.quantity, p.chain))
            .collect::<Vec<String>>()
            .join(", ");
        debug!(cost, %summary, "bought shares");
        next.log(
            Some(player),
            format!("{} bought {} for ${}", next.players[player].name, summary, cost),
        );
        Ok(next)
    }
}
