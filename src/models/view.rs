//! Read-only projections of tournament state for the rendering side.
//!
//! Recomputed from scratch after every transition; nothing here feeds back
//! into the state machine.

use crate::models::game::{MatchId, Round};
use crate::models::player::{Player, PlayerId};
use crate::models::tournament::{Phase, Tournament, TournamentId};
use serde::Serialize;

/// One remote entrant slot as the setup screen sees it.
#[derive(Clone, Debug, Serialize)]
pub struct SlotView {
    /// 1-based slot number (2..=8; slot 1 is the local user).
    pub slot: usize,
    /// Username as typed, if a verification has been attempted.
    pub entered: Option<String>,
    /// The resolved player once the slot is verified.
    pub player: Option<Player>,
}

/// Setup screen: local user plus the 7 remote slots.
#[derive(Clone, Debug, Serialize)]
pub struct SetupView {
    pub local: Player,
    pub slots: Vec<SlotView>,
    pub all_verified: bool,
}

/// One match in the bracket columns.
#[derive(Clone, Debug, Serialize)]
pub struct MatchView {
    pub id: MatchId,
    pub player1: Player,
    pub player2: Player,
    pub winner: Option<Player>,
    /// True for the match the cursor points at.
    pub current: bool,
}

/// One bracket column (quarterfinals, semifinals, final).
#[derive(Clone, Debug, Serialize)]
pub struct RoundView {
    pub round: Round,
    pub label: &'static str,
    /// Empty until the round is seeded.
    pub matches: Vec<MatchView>,
}

/// Banner for the match about to be played.
#[derive(Clone, Debug, Serialize)]
pub struct CurrentMatchView {
    pub round_label: &'static str,
    /// 1-based position within the round.
    pub match_number: usize,
    pub player1: Player,
    pub player2: Player,
}

/// Row of the results table.
#[derive(Clone, Debug, Serialize)]
pub struct StandingView {
    pub player_id: PlayerId,
    pub display_name: String,
    pub matches_played: u32,
    pub wins: u32,
    pub losses: u32,
}

/// Everything the bracket screen renders.
#[derive(Clone, Debug, Serialize)]
pub struct TournamentView {
    pub id: TournamentId,
    pub phase: Phase,
    pub rounds: Vec<RoundView>,
    pub current: Option<CurrentMatchView>,
    pub champion: Option<Player>,
    pub standings: Vec<StandingView>,
}

impl TournamentView {
    pub fn project(t: &Tournament) -> Self {
        let rounds = [Round::QuarterFinal, Round::SemiFinal, Round::Final]
            .into_iter()
            .map(|round| RoundView {
                round,
                label: round.label(),
                matches: t
                    .round_matches(round)
                    .enumerate()
                    .map(|(index, m)| MatchView {
                        id: m.id,
                        player1: m.player1.clone(),
                        player2: m.player2.clone(),
                        winner: m.winner_player().cloned(),
                        current: t.winner.is_none()
                            && round == t.current_round
                            && index == t.current_match_index,
                    })
                    .collect(),
            })
            .collect();

        let current = t.current_match().ok().map(|m| CurrentMatchView {
            round_label: m.round.label(),
            match_number: m.match_index + 1,
            player1: m.player1.clone(),
            player2: m.player2.clone(),
        });

        // Entries whose id no longer maps to an entrant are skipped, same as
        // the results table always did.
        let standings = t
            .ledger
            .snapshot()
            .iter()
            .filter_map(|e| {
                t.player_by_id(e.player_id).map(|p| StandingView {
                    player_id: e.player_id,
                    display_name: p.display_name.clone(),
                    matches_played: e.matches_played,
                    wins: e.wins,
                    losses: e.losses,
                })
            })
            .collect();

        TournamentView {
            id: t.id,
            phase: t.phase(),
            rounds,
            current,
            champion: t.winner.clone(),
            standings,
        }
    }
}
