//! Bracket progression: recording match outcomes and advancing rounds.
//!
//! Recording and advancing are separate commands. The event loop records a
//! result, then immediately asks the round to advance if it is complete;
//! `Tournament::current_match` stays a pure read in between.

use crate::models::{BracketMatch, MatchRecord, Phase, Player, Side, Tournament, TournamentError};
use chrono::Utc;

/// Decide the match at the cursor.
///
/// Sets the match winner, appends a history record, counts the win and the
/// loss in the ledger, and moves the cursor to the next match of the round.
/// Does not seed the next round; see [`advance_round_if_complete`].
pub fn record_match_result(t: &mut Tournament, winner_side: Side) -> Result<(), TournamentError> {
    if t.winner.is_some() {
        return Err(TournamentError::NoCurrentMatch);
    }
    let pos = t
        .matches
        .iter()
        .enumerate()
        .filter(|(_, m)| m.round == t.current_round)
        .nth(t.current_match_index)
        .map(|(i, _)| i)
        .ok_or(TournamentError::NoCurrentMatch)?;
    if t.matches[pos].winner.is_some() {
        return Err(TournamentError::MatchFinished);
    }

    t.matches[pos].winner = Some(winner_side);

    let m = &t.matches[pos];
    let winner_id = m.player_on(winner_side).id;
    let loser_id = m.player_on(winner_side.other()).id;
    t.history.push(MatchRecord {
        match_id: m.id,
        round: m.round,
        player1_id: m.player1.id,
        player2_id: m.player2.id,
        winner_id,
        finished_at: Utc::now(),
    });

    t.ledger.record(winner_id, true);
    t.ledger.record(loser_id, false);
    t.current_match_index += 1;
    Ok(())
}

/// Advance to the next round if every match of the current one is decided.
///
/// No-op while the round still has undecided matches. When the round is
/// complete, winners are paired strictly in match-index order: winner of
/// match 0 vs winner of match 1, and so on. A round that resolves to a
/// single winner crowns the champion instead of seeding anything.
pub fn advance_round_if_complete(t: &mut Tournament) -> Result<Phase, TournamentError> {
    if t.winner.is_some() {
        return Err(TournamentError::NoCurrentMatch);
    }
    if t.round_matches(t.current_round).any(|m| m.winner.is_none()) {
        return Ok(t.phase());
    }

    let mut winners: Vec<Player> = t
        .round_matches(t.current_round)
        .filter_map(|m| m.winner_player().cloned())
        .collect();

    if winners.len() == 1 {
        log::info!("tournament {} decided", t.id);
        t.winner = winners.pop();
        return Ok(Phase::Champion);
    }

    let next_round = t
        .current_round
        .next()
        .ok_or(TournamentError::InvalidState)?;
    let seeded: Vec<BracketMatch> = winners
        .chunks_exact(2)
        .enumerate()
        .map(|(i, pair)| BracketMatch::new(pair[0].clone(), pair[1].clone(), next_round, i))
        .collect();
    t.matches.extend(seeded);
    t.current_round = next_round;
    t.current_match_index = 0;
    Ok(Phase::AwaitingMatch)
}
