//! Bracket matches and the score session for a single game of Pong.

use crate::models::player::{Player, PlayerId};
use crate::models::tournament::TournamentError;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Unique identifier for a match.
pub type MatchId = Uuid;

/// Points needed to win one match.
pub const WINNING_SCORE: u32 = 10;

/// Which side of a match won.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Side {
    Player1,
    Player2,
}

impl Side {
    /// The opposite side.
    pub fn other(self) -> Side {
        match self {
            Side::Player1 => Side::Player2,
            Side::Player2 => Side::Player1,
        }
    }
}

/// Elimination stage a match belongs to.
#[derive(Clone, Copy, Debug, Eq, Ord, PartialEq, PartialOrd, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Round {
    QuarterFinal,
    SemiFinal,
    Final,
}

impl Round {
    /// 1-based round number (quarterfinal = 1).
    pub fn number(self) -> u32 {
        match self {
            Round::QuarterFinal => 1,
            Round::SemiFinal => 2,
            Round::Final => 3,
        }
    }

    /// Human-readable stage name for banners and match headers.
    pub fn label(self) -> &'static str {
        match self {
            Round::QuarterFinal => "Quarterfinals",
            Round::SemiFinal => "Semifinals",
            Round::Final => "Final",
        }
    }

    /// The stage the winners of this round advance to.
    pub fn next(self) -> Option<Round> {
        match self {
            Round::QuarterFinal => Some(Round::SemiFinal),
            Round::SemiFinal => Some(Round::Final),
            Round::Final => None,
        }
    }
}

/// A single bracket match: two players, a stage, and (eventually) a winner.
///
/// The winner is set exactly once and never cleared.
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct BracketMatch {
    pub id: MatchId,
    pub player1: Player,
    pub player2: Player,
    pub round: Round,
    /// 0-based position within the round.
    pub match_index: usize,
    /// None until the match is decided.
    pub winner: Option<Side>,
}

impl BracketMatch {
    pub fn new(player1: Player, player2: Player, round: Round, match_index: usize) -> Self {
        Self {
            id: Uuid::new_v4(),
            player1,
            player2,
            round,
            match_index,
            winner: None,
        }
    }

    /// The player on the given side.
    pub fn player_on(&self, side: Side) -> &Player {
        match side {
            Side::Player1 => &self.player1,
            Side::Player2 => &self.player2,
        }
    }

    /// The winning player, once decided.
    pub fn winner_player(&self) -> Option<&Player> {
        self.winner.map(|side| self.player_on(side))
    }
}

/// Session-scoped record of a decided match, kept for the stats table.
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct MatchRecord {
    pub match_id: MatchId,
    pub round: Round,
    pub player1_id: PlayerId,
    pub player2_id: PlayerId,
    pub winner_id: PlayerId,
    pub finished_at: DateTime<Utc>,
}

/// Scorekeeping for the match currently being played.
///
/// Owns only the running score and the win threshold; paddle and ball physics
/// live with whoever renders the game.
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct MatchSession {
    pub player1: Player,
    pub player2: Player,
    pub round: Round,
    pub score1: u32,
    pub score2: u32,
    /// Set when one side reaches [`WINNING_SCORE`].
    pub winner: Option<Side>,
}

impl MatchSession {
    /// Open a session for a bracket pairing with zeroed scores.
    pub fn new(player1: Player, player2: Player, round: Round) -> Self {
        Self {
            player1,
            player2,
            round,
            score1: 0,
            score2: 0,
            winner: None,
        }
    }

    /// Start a session for a bracket match.
    pub fn for_match(m: &BracketMatch) -> Self {
        Self::new(m.player1.clone(), m.player2.clone(), m.round)
    }

    /// Score one point. Returns the winning side exactly when the threshold
    /// is reached; scoring a finished match is an error.
    pub fn score_point(&mut self, side: Side) -> Result<Option<Side>, TournamentError> {
        if self.winner.is_some() {
            return Err(TournamentError::MatchFinished);
        }
        let score = match side {
            Side::Player1 => {
                self.score1 += 1;
                self.score1
            }
            Side::Player2 => {
                self.score2 += 1;
                self.score2
            }
        };
        if score >= WINNING_SCORE {
            self.winner = Some(side);
        }
        Ok(self.winner)
    }
}
