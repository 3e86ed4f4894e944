use crate::board::{generate_all_tiles, shuffle, Board, Cell, Tile};
use crate::chain::{Chain, ChainRegistry, NUM_CHAINS};
use crate::config::GameConfig;
use crate::error::GameError;
use crate::market::pay_bonuses;
use crate::placement::{classify, is_dead, is_playable, PlacementAction};
use crate::state::{GameState, Phase, Player};
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use std::collections::BTreeSet;
use tracing::{info, instrument};

impl GameState {
    /// Deals a fresh game. The seed fixes the tile bag, which is the only
    /// randomness in the game.
    #[instrument(skip(config))]
    pub fn new_game(
        names: &[String],
        seed: u64,
        config: GameConfig,
    ) -> Result<GameState, GameError> {
        config.validate()?;
        if names.len() != config.player_count {
            return Err(GameError::WrongPlayerCount {
                expected: config.player_count,
                actual: names.len(),
            });
        }
        let mut rng = ChaCha8Rng::seed_from_u64(seed);
        let mut tile_bag = shuffle(&generate_all_tiles(), &mut rng);
        let players = names
            .iter()
            .enumerate()
            .map(|(id, name)| {
                let hand = tile_bag.split_off(tile_bag.len().saturating_sub(config.hand_size));
                Player::new(id, name.clone(), config.starting_cash, hand)
            })
            .collect::<Vec<Player>>();
        let mut board = Board::default();
        let preplaced = config.initial_board_tiles.min(tile_bag.len());
        for t in tile_bag.drain(tile_bag.len() - preplaced..) {
            board.set(t, Cell::Hotel);
        }
        let mut game = GameState {
            board,
            chains: ChainRegistry::new(config.safe_size),
            players,
            stock_bank: [config.shares_per_chain; NUM_CHAINS],
            tile_bag,
            current_player: 0,
            phase: Phase::PlaceTile,
            last_placed_tile: None,
            stocks_purchased_this_turn: 0,
            game_log: im::Vector::new(),
            winner: None,
            end_game_votes: BTreeSet::new(),
            config,
        };
        info!(seed, players = names.len(), "new game");
        game.log(None, format!("New game: {}", names.join(", ")));
        Ok(game)
    }

    /// Places a tile from the current player's hand and moves to whichever
    /// phase the placement calls for.
    #[instrument(skip(self), fields(player = self.current_player))]
    pub fn place_tile(&self, tile: Tile) -> Result<GameState, GameError> {
        if self.phase != Phase::PlaceTile {
            return Err(GameError::WrongPhase {
                expected: "place_tile",
                actual: self.phase.name(),
            });
        }
        if !self.current().holds(tile) {
            return Err(GameError::TileNotInHand(tile));
        }
        let placement = classify(self, tile);
        if let Some(reason) = placement.reason {
            return Err(reason);
        }

        let mut next = self.clone();
        let player = next.current_player;
        next.players[player].hand.retain(|&t| t != tile);
        next.board.set(tile, Cell::Hotel);
        next.last_placed_tile = Some(tile);
        next.log(
            Some(player),
            format!("{} placed {}", next.players[player].name, tile),
        );
        match placement.action {
            PlacementAction::PlaceOnly => next.phase = Phase::BuyStock,
            PlacementAction::FormChain => {
                next.phase = Phase::FoundChain {
                    tiles: placement.connected,
                }
            }
            PlacementAction::GrowChain => next = next.grow_chain(placement.adjacent_chains[0])?,
            PlacementAction::MergeChains => next.begin_merger(&placement.adjacent_chains),
        }
        Ok(next)
    }

    /// Passes play to the next seat. The new current player draws back up
    /// toward a full hand, one tile per turn.
    #[instrument(skip(self), fields(player = self.current_player))]
    pub fn end_turn(&self) -> Result<GameState, GameError> {
        match self.phase {
            Phase::BuyStock => {}
            Phase::PlaceTile => {
                if self
                    .current()
                    .hand
                    .iter()
                    .any(|&t| is_playable(self, t))
                {
                    return Err(GameError::PlayableTileInHand);
                }
            }
            _ => {
                return Err(GameError::WrongPhase {
                    expected: "buy_stock",
                    actual: self.phase.name(),
                })
            }
        }
        let mut next = self.clone();
        next.log(
            Some(next.current_player),
            format!("{} ended their turn", next.current().name),
        );
        if let Some(reason) = next.end_reason() {
            return Ok(next.finish_game(reason));
        }
        next.current_player = (next.current_player + 1) % next.players.len();
        next.phase = Phase::PlaceTile;
        next.stocks_purchased_this_turn = 0;
        next.last_placed_tile = None;
        if next.current().hand.len() < next.config.hand_size {
            next = next.draw_tile(next.current_player);
        }
        Ok(next)
    }

    // No-op on an empty bag.
    pub fn draw_tile(&self, player: usize) -> GameState {
        let mut next = self.clone();
        if let Some(tile) = next.tile_bag.pop() {
            next.players[player].hand.push(tile);
        }
        next
    }

    /// Trades a dead tile in the current player's hand for a fresh draw.
    #[instrument(skip(self), fields(player = self.current_player))]
    pub fn discard_tile(&self, tile: Tile) -> Result<GameState, GameError> {
        if self.phase != Phase::PlaceTile {
            return Err(GameError::WrongPhase {
                expected: "place_tile",
                actual: self.phase.name(),
            });
        }
        if !self.current().holds(tile) {
            return Err(GameError::TileNotInHand(tile));
        }
        if !is_dead(self, tile) {
            return Err(GameError::TileNotDead(tile));
        }
        let mut next = self.clone();
        let player = next.current_player;
        next.players[player].hand.retain(|&t| t != tile);
        next.log(
            Some(player),
            format!("{} discarded {}", next.players[player].name, tile),
        );
        Ok(next.draw_tile(player))
    }

    pub fn check_game_end(&self) -> bool {
        self.end_reason().is_some()
    }

    pub(crate) fn end_reason(&self) -> Option<&'static str> {
        let active = self.chains.active().collect::<Vec<Chain>>();
        if active
            .iter()
            .any(|&c| self.chains.size(c) >= self.config.end_size)
        {
            return Some("a chain reached the end size");
        }
        if self.end_game_votes.len() >= self.config.vote_threshold() {
            return Some("players voted to end the game");
        }
        if self.config.end_when_all_safe
            && !active.is_empty()
            && active.iter().all(|&c| self.chains.is_safe(c))
        {
            return Some("every chain is safe");
        }
        let can_refill = !self.tile_bag.is_empty()
            && self
                .players
                .iter()
                .any(|p| p.hand.len() < self.config.hand_size);
        let anyone_can_play = self
            .players
            .iter()
            .any(|p| p.hand.iter().any(|&t| is_playable(self, t)));
        if !can_refill && !anyone_can_play {
            return Some("no tile can be played");
        }
        None
    }

    /// Pays out every active chain as if it were defunct, sells all shares
    /// back at the current price and ranks players by cash. Shares in
    /// inactive chains are worthless and simply returned to the bank.
    pub fn calculate_final_scores(&self) -> (GameState, Vec<Player>) {
        let mut next = self.clone();
        let rounding = next.config.bonus_rounding;
        for chain in Chain::ALL {
            let size = next.chains.size(chain);
            let price = next.stock_price(chain);
            if next.chains.is_active(chain) {
                for p in pay_bonuses(&mut next.players, chain, size, rounding) {
                    let name = next.players[p.player].name.clone();
                    next.log(
                        Some(p.player),
                        format!("{} received ${} final bonus on {}", name, p.amount, chain),
                    );
                }
            }
            for player in 0..next.players.len() {
                let held = next.players[player].shares(chain);
                if held > 0 {
                    next.players[player].cash += held * price;
                    next.redeem_shares(player, chain, held);
                }
            }
        }
        let mut standings = next.players.clone();
        // Stable, so ties keep seat order.
        standings.sort_by(|a, b| b.cash.cmp(&a.cash));
        (next, standings)
    }

    pub(crate) fn finish_game(&self, reason: &str) -> GameState {
        let (mut next, standings) = self.calculate_final_scores();
        next.winner = standings.first().map(|p| p.id);
        next.phase = Phase::GameOver;
        info!(reason, winner = ?next.winner, "game over");
        next.log(None, format!("Game over: {}", reason));
        next
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    /// Four players, empty board and hands, every tile in the bag.
    pub(crate) fn empty_game() -> GameState {
        let config = GameConfig::default();
        GameState {
            board: Board::default(),
            chains: ChainRegistry::new(config.safe_size),
            players: (0..4)
                .map(|i| Player::new(i, format!("P{}", i), 6000, vec![]))
                .collect(),
            stock_bank: [25; NUM_CHAINS],
            tile_bag: generate_all_tiles(),
            current_player: 0,
            phase: Phase::PlaceTile,
            last_placed_tile: None,
            stocks_purchased_this_turn: 0,
            game_log: im::Vector::new(),
            winner: None,
            end_game_votes: BTreeSet::new(),
            config,
        }
    }

    fn tile(id: &str) -> Tile {
        id.parse().unwrap()
    }

    fn take_from_bag(game: &mut GameState, t: Tile) {
        game.tile_bag.retain(|&b| b != t);
    }

    pub(crate) fn place(game: &mut GameState, ids: &[&str]) {
        for id in ids {
            let t = tile(id);
            take_from_bag(game, t);
            game.board.set(t, Cell::Hotel);
        }
    }

    pub(crate) fn place_chain(game: &mut GameState, chain: Chain, ids: &[&str]) {
        let tiles = ids.iter().map(|id| tile(id)).collect::<Vec<Tile>>();
        for &t in &tiles {
            take_from_bag(game, t);
            game.board.set(t, Cell::Chain(chain));
        }
        game.chains.absorb(chain, tiles);
    }

    pub(crate) fn give(game: &mut GameState, player: usize, id: &str) {
        let t = tile(id);
        take_from_bag(game, t);
        game.players[player].hand.push(t);
    }

    pub(crate) fn buy_phase(mut game: GameState) -> GameState {
        game.phase = Phase::BuyStock;
        game
    }

    fn names() -> Vec<String> {
        ["Ann", "Bo", "Cy", "Di"].map(String::from).to_vec()
    }

    #[test]
    fn new_game_deals_hands() {
        let game = GameState::new_game(&names(), 42, GameConfig::default()).unwrap();
        assert_eq!(game.players.len(), 4);
        for p in &game.players {
            assert_eq!(p.cash, 6000);
            assert_eq!(p.hand.len(), 6);
            assert_eq!(p.total_shares(), 0);
        }
        assert_eq!(game.board.placed_tiles().count(), 1);
        assert_eq!(game.tile_bag.len(), 83);
        assert_eq!(game.phase, Phase::PlaceTile);
        assert_eq!(game.current_player, 0);
        assert_eq!(game.stock_bank, [25; NUM_CHAINS]);
        assert!(game.to_string().contains("Player 0: value = $6000"));

        // Every tile is accounted for exactly once.
        let mut all = game.tile_bag.clone();
        all.extend(game.players.iter().flat_map(|p| p.hand.iter().copied()));
        all.extend(game.board.placed_tiles().map(|(t, _)| t));
        all.sort();
        assert_eq!(all, generate_all_tiles());
    }

    #[test]
    fn new_game_is_seeded() {
        let a = GameState::new_game(&names(), 7, GameConfig::default()).unwrap();
        let b = GameState::new_game(&names(), 7, GameConfig::default()).unwrap();
        let c = GameState::new_game(&names(), 8, GameConfig::default()).unwrap();
        assert_eq!(a, b);
        assert_ne!(a.tile_bag, c.tile_bag);
    }

    #[test]
    fn new_game_requires_four_players() {
        let three = names()[..3].to_vec();
        assert_eq!(
            GameState::new_game(&three, 1, GameConfig::default()),
            Err(GameError::WrongPlayerCount {
                expected: 4,
                actual: 3
            })
        );
    }

    #[test]
    fn new_game_rejects_unplayable_configs() {
        let config = GameConfig::from_toml_str("player_count = 0").unwrap();
        assert!(matches!(
            GameState::new_game(&[], 1, config),
            Err(GameError::InvalidConfig(_))
        ));
        let config = GameConfig::from_toml_str("buy_limit = 0").unwrap();
        assert!(matches!(
            GameState::new_game(&names(), 1, config),
            Err(GameError::InvalidConfig(_))
        ));
    }

    #[test]
    fn place_tile_requires_tile_in_hand() {
        let mut game = empty_game();
        give(&mut game, 1, "5E");
        assert_eq!(
            game.place_tile(tile("5E")),
            Err(GameError::TileNotInHand(tile("5E")))
        );
        give(&mut game, 0, "5F");
        let next = game.place_tile(tile("5F")).unwrap();
        assert_eq!(next.phase, Phase::BuyStock);
        assert_eq!(next.last_placed_tile, Some(tile("5F")));
        assert!(next.players[0].hand.is_empty());
        assert_eq!(next.board.cell(tile("5F")), Cell::Hotel);
        assert_eq!(next.game_log.len(), 1);
        // The input snapshot is untouched.
        assert_eq!(game.board.cell(tile("5F")), Cell::Empty);
        assert_eq!(
            next.place_tile(tile("5E")),
            Err(GameError::WrongPhase {
                expected: "place_tile",
                actual: "buy_stock"
            })
        );
    }

    #[test]
    fn end_turn_advances_and_refills() {
        let mut game = empty_game();
        for id in ["1A", "1C", "1E", "1G", "1I", "1K"] {
            give(&mut game, 1, id);
        }
        give(&mut game, 0, "5F");
        give(&mut game, 2, "9L");
        let game = game.place_tile(tile("5F")).unwrap();
        let bag = game.tile_bag.len();

        let game = game.end_turn().unwrap();
        assert_eq!(game.current_player, 1);
        assert_eq!(game.phase, Phase::PlaceTile);
        assert_eq!(game.last_placed_tile, None);
        assert_eq!(game.stocks_purchased_this_turn, 0);
        // Player 1 already has a full hand.
        assert_eq!(game.players[1].hand.len(), 6);
        assert_eq!(game.tile_bag.len(), bag);

        let mut game = game.place_tile(tile("1A")).unwrap().end_turn().unwrap();
        assert_eq!(game.current_player, 2);
        assert_eq!(game.players[2].hand.len(), 2);
        assert_eq!(game.tile_bag.len(), bag - 1);

        // Drawing from an empty bag changes nothing.
        game.tile_bag.clear();
        let game = game.place_tile(tile("9L")).unwrap();
        let hand = game.players[3].hand.len();
        let game = game.end_turn().unwrap();
        assert_eq!(game.players[3].hand.len(), hand);
    }

    #[test]
    fn end_turn_during_placement_needs_a_stuck_hand() {
        let mut game = empty_game();
        give(&mut game, 0, "5F");
        assert_eq!(game.end_turn(), Err(GameError::PlayableTileInHand));

        let mut game = empty_game();
        // Two safe chains with a gap at 2C between them.
        let row = |r: char| (b'A'..=b'K').map(move |c| format!("{}{}", r, c as char));
        let north = row('1').collect::<Vec<_>>();
        let south = row('3').collect::<Vec<_>>();
        place_chain(
            &mut game,
            Chain::Tower,
            &north.iter().map(String::as_str).collect::<Vec<_>>(),
        );
        place_chain(
            &mut game,
            Chain::Luxor,
            &south.iter().map(String::as_str).collect::<Vec<_>>(),
        );
        give(&mut game, 0, "2C");
        assert!(is_dead(&game, tile("2C")));
        let game = game.end_turn().unwrap();
        assert_eq!(game.current_player, 1);
    }

    #[test]
    fn discard_draws_replacement() {
        let mut game = empty_game();
        let row = |r: char| (b'A'..=b'K').map(move |c| format!("{}{}", r, c as char));
        let north = row('1').collect::<Vec<_>>();
        let south = row('3').collect::<Vec<_>>();
        place_chain(
            &mut game,
            Chain::Tower,
            &north.iter().map(String::as_str).collect::<Vec<_>>(),
        );
        place_chain(
            &mut game,
            Chain::Luxor,
            &south.iter().map(String::as_str).collect::<Vec<_>>(),
        );
        give(&mut game, 0, "2C");
        give(&mut game, 0, "5F");
        let bag = game.tile_bag.len();

        // Only tiles that can never be played may be thrown back.
        assert_eq!(
            game.discard_tile(tile("5F")),
            Err(GameError::TileNotDead(tile("5F")))
        );
        let next = game.discard_tile(tile("2C")).unwrap();
        assert!(!next.players[0].holds(tile("2C")));
        assert_eq!(next.players[0].hand.len(), 2);
        assert_eq!(next.tile_bag.len(), bag - 1);
        assert_eq!(next.phase, Phase::PlaceTile);
        assert_eq!(
            next.discard_tile(tile("2C")),
            Err(GameError::TileNotInHand(tile("2C")))
        );
    }

    #[test]
    fn game_ends_when_a_chain_reaches_41() {
        let mut game = empty_game();
        let tiles = generate_all_tiles()
            .into_iter()
            .take(41)
            .map(|t| t.to_string())
            .collect::<Vec<_>>();
        place_chain(
            &mut game,
            Chain::Imperial,
            &tiles.iter().map(String::as_str).collect::<Vec<_>>(),
        );
        for p in 0..4 {
            give(&mut game, p, &format!("9{}", (b'A' + p as u8) as char));
        }
        assert!(game.check_game_end());
        game.players[1].stocks[Chain::Imperial.index()] = 5;
        game.stock_bank[Chain::Imperial.index()] = 20;

        let over = buy_phase(game).end_turn().unwrap();
        assert_eq!(over.phase, Phase::GameOver);
        // Imperial at 41 tiles trades at 1100: 11000 + 5500 bonus, 5500 sale.
        assert_eq!(over.players[1].cash, 6000 + 16500 + 5500);
        assert_eq!(over.winner, Some(1));
        assert_eq!(over.players[1].total_shares(), 0);
        assert_eq!(over.bank(Chain::Imperial), 25);
    }

    #[test]
    fn stalemate_ends_the_game() {
        let mut game = empty_game();
        game.tile_bag.clear();
        assert!(game.check_game_end());
        give(&mut game, 2, "5F");
        game.tile_bag.clear();
        assert!(!game.check_game_end());
    }

    #[test]
    fn all_safe_end_is_optional() {
        let mut game = empty_game();
        let row = (b'A'..=b'K').map(|c| format!("1{}", c as char)).collect::<Vec<_>>();
        place_chain(
            &mut game,
            Chain::Festival,
            &row.iter().map(String::as_str).collect::<Vec<_>>(),
        );
        give(&mut game, 0, "9L");
        assert!(!game.check_game_end());
        game.config.end_when_all_safe = true;
        assert!(game.check_game_end());
    }

    #[test]
    fn final_scores_rank_by_cash() {
        let mut game = empty_game();
        place_chain(&mut game, Chain::Tower, &["1A", "1B"]);
        place_chain(&mut game, Chain::Continental, &["5A", "5B", "5C"]);
        game.players[0].stocks[Chain::Tower.index()] = 2;
        game.players[3].stocks[Chain::Continental.index()] = 3;
        game.players[2].stocks[Chain::Continental.index()] = 1;
        // A leftover share of a chain that is no longer on the board.
        game.players[2].stocks[Chain::Festival.index()] = 4;
        game.stock_bank[Chain::Tower.index()] = 23;
        game.stock_bank[Chain::Continental.index()] = 21;
        game.stock_bank[Chain::Festival.index()] = 21;

        let (after, standings) = game.calculate_final_scores();
        for p in &after.players {
            assert_eq!(p.total_shares(), 0);
        }
        assert_eq!(after.stock_bank, [25; NUM_CHAINS]);
        // Continental at 3 tiles trades at 500; Tower at 2 at 200.
        assert_eq!(after.players[3].cash, 6000 + 5000 + 1500);
        assert_eq!(after.players[2].cash, 6000 + 2500 + 500);
        assert_eq!(after.players[0].cash, 6000 + 2000 + 1000 + 400);
        assert_eq!(after.players[1].cash, 6000);
        assert_eq!(
            standings.iter().map(|p| p.id).collect::<Vec<_>>(),
            vec![3, 0, 2, 1]
        );
        assert!(standings.windows(2).all(|w| w[0].cash >= w[1].cash));
        // The input snapshot still holds its shares.
        assert_eq!(game.players[3].shares(Chain::Continental), 3);
    }
}
