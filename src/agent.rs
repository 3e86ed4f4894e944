use crate::action::Action;
use crate::chain::Chain;
use crate::lifecycle::StockChoice;
use crate::market::Purchase;
use crate::placement::{is_dead, is_playable};
use crate::state::{GameState, MergerPhase, Phase};
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

pub trait Agent {
    /// A legal action for whoever the game is waiting on, or `None` once the
    /// game is over.
    fn choose_action(&mut self, game: &GameState) -> Option<Action>;
}

pub fn create_agent(seed: u64) -> Box<dyn Agent + Send> {
    Box::new(RandomAgent::new(seed))
}

pub struct RandomAgent {
    rng: ChaCha8Rng,
}
impl RandomAgent {
    pub fn new(seed: u64) -> Self {
        Self {
            rng: ChaCha8Rng::seed_from_u64(seed),
        }
    }

    fn buy_order(&mut self, game: &GameState) -> Option<Vec<Purchase>> {
        if game.stocks_purchased_this_turn > 0 {
            return None;
        }
        let cash = game.current().cash;
        let buyable = game
            .chains
            .active()
            .filter(|&c| game.bank(c) > 0 && game.stock_price(c) <= cash)
            .collect::<Vec<Chain>>();
        let &chain = buyable.choose(&mut self.rng)?;
        let most = game
            .config
            .buy_limit
            .min(game.bank(chain))
            .min(cash / game.stock_price(chain));
        let quantity = self.rng.gen_range(1..=most);
        Some(vec![Purchase { chain, quantity }])
    }
}
impl Agent for RandomAgent {
    fn choose_action(&mut self, game: &GameState) -> Option<Action> {
        let action = match &game.phase {
            Phase::PlaceTile => {
                let hand = &game.current().hand;
                if let Some(&tile) = hand.iter().find(|&&t| is_dead(game, t)) {
                    Action::DiscardTile { tile }
                } else {
                    let playable = hand
                        .iter()
                        .copied()
                        .filter(|&t| is_playable(game, t))
                        .collect::<Vec<_>>();
                    match playable.choose(&mut self.rng) {
                        Some(&tile) => Action::PlaceTile { tile },
                        None => Action::EndTurn,
                    }
                }
            }
            Phase::FoundChain { .. } => {
                let inactive = game.chains.inactive().collect::<Vec<_>>();
                Action::FoundChain {
                    chain: *inactive.choose(&mut self.rng)?,
                }
            }
            Phase::Merger(MergerPhase::ChooseSurvivor { candidates, .. }) => {
                Action::ChooseMergerSurvivor {
                    chain: *candidates.choose(&mut self.rng)?,
                }
            }
            Phase::Merger(MergerPhase::PayBonuses(_)) => Action::PayMergerBonuses,
            Phase::Merger(MergerPhase::HandleStock { merger, .. }) => {
                let held = game.players[game.acting_player()].shares(merger.defunct);
                let tradeable = (held - held % 2).min(game.bank(merger.survivor) * 2);
                let choice = match self.rng.gen_range(0..3) {
                    0 => StockChoice::Sell { quantity: held },
                    1 => StockChoice::Trade {
                        quantity: tradeable,
                    },
                    _ => StockChoice::Keep,
                };
                Action::MergerStockChoice { choice }
            }
            Phase::BuyStock => match self.buy_order(game) {
                Some(purchases) => Action::BuyStocks { purchases },
                None => Action::EndTurn,
            },
            Phase::GameOver => return None,
        };
        Some(action)
    }
}
