use crate::error::GameError;
use crate::state::{GameState, Phase};
use tracing::instrument;

impl GameState {
    /// Records `player`'s vote, replacing any earlier one. Once half the
    /// table (rounded up) is in favour the game is scored and ends.
    #[instrument(skip(self))]
    pub fn cast_end_game_vote(
        &self,
        player: usize,
        in_favor: bool,
    ) -> Result<GameState, GameError> {
        if !matches!(self.phase, Phase::PlaceTile | Phase::BuyStock) {
            return Err(GameError::WrongPhase {
                expected: "place_tile or buy_stock",
                actual: self.phase.name(),
            });
        }
        if player >= self.players.len() {
            return Err(GameError::UnknownPlayer(player));
        }
        let mut next = self.clone();
        if in_favor {
            next.end_game_votes.insert(player);
        } else {
            next.end_game_votes.remove(&player);
        }
        let name = next.players[player].name.clone();
        next.log(
            Some(player),
            format!(
                "{} voted {} ending the game ({}/{})",
                name,
                if in_favor { "for" } else { "against" },
                next.end_game_votes.len(),
                next.config.vote_threshold()
            ),
        );
        if next.end_game_votes.len() >= next.config.vote_threshold() {
            return Ok(next.finish_game("players voted to end the game"));
        }
        Ok(next)
    }
}
