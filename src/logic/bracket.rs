//! Bracket seeding: 8 verified players into 4 randomized quarterfinals.

use crate::logic::registry::TOURNAMENT_SIZE;
use crate::models::{BracketMatch, Player, Round, Tournament, TournamentError};
use rand::seq::SliceRandom;

/// Seed a tournament from exactly 8 distinct players.
///
/// The entrant order is shuffled uniformly, then adjacent pairs become the
/// quarterfinals: positions (0,1), (2,3), (4,5), (6,7) with match index
/// 0..=3. Every player appears in exactly one pairing.
pub fn build_bracket(players: Vec<Player>) -> Result<Tournament, TournamentError> {
    if players.len() != TOURNAMENT_SIZE {
        log::error!(
            "bracket seeding needs {} players, got {}",
            TOURNAMENT_SIZE,
            players.len()
        );
        return Err(TournamentError::WrongPlayerCount {
            expected: TOURNAMENT_SIZE,
            got: players.len(),
        });
    }
    for (i, p) in players.iter().enumerate() {
        if players[..i].iter().any(|q| q.id == p.id) {
            log::error!("entrant id {} appears twice in bracket seeding", p.id);
            return Err(TournamentError::DuplicatePlayer(p.id));
        }
    }

    let mut players = players;
    players.shuffle(&mut rand::thread_rng());

    let matches = players
        .chunks_exact(2)
        .enumerate()
        .map(|(i, pair)| BracketMatch::new(pair[0].clone(), pair[1].clone(), Round::QuarterFinal, i))
        .collect();

    Ok(Tournament::new(players, matches))
}
