//! Integration tests for bracket progression: recording results, advancing
//! rounds, crowning the champion.

use pong_tournament_web::{
    advance_round_if_complete, build_bracket, record_match_result, Phase, Player, PlayerId, Round,
    Side, Tournament, TournamentError, TournamentView,
};

fn players(n: usize) -> Vec<Player> {
    (0..n)
        .map(|i| Player::new(i as i64 + 1, format!("p{}", i + 1), format!("Player {}", i + 1)))
        .collect()
}

fn tournament() -> Tournament {
    build_bracket(players(8)).unwrap()
}

/// Ids of (player1, player2) for each match of a round, in match order.
fn pairings(t: &Tournament, round: Round) -> Vec<(PlayerId, PlayerId)> {
    t.round_matches(round)
        .map(|m| (m.player1.id, m.player2.id))
        .collect()
}

#[test]
fn advance_is_a_noop_while_the_round_is_open() {
    let mut t = tournament();
    record_match_result(&mut t, Side::Player1).unwrap();
    assert_eq!(advance_round_if_complete(&mut t).unwrap(), Phase::AwaitingMatch);
    assert_eq!(t.matches.len(), 4);
    assert_eq!(t.current_round, Round::QuarterFinal);
    assert_eq!(t.current_match_index, 1);
}

#[test]
fn completed_quarterfinals_seed_semifinals_in_match_order() {
    let mut t = tournament();
    let quarter = pairings(&t, Round::QuarterFinal);

    for _ in 0..4 {
        record_match_result(&mut t, Side::Player1).unwrap();
    }

    // Round complete, not yet advanced: the cursor has run off the round and
    // the state says so.
    assert_eq!(t.phase(), Phase::RoundComplete);
    assert!(matches!(
        t.current_match(),
        Err(TournamentError::NoCurrentMatch)
    ));

    assert_eq!(advance_round_if_complete(&mut t).unwrap(), Phase::AwaitingMatch);
    assert_eq!(t.current_round, Round::SemiFinal);
    assert_eq!(t.current_match_index, 0);

    let semi = pairings(&t, Round::SemiFinal);
    assert_eq!(semi.len(), 2);
    // Winner of match 0 vs winner of match 1, winner of 2 vs winner of 3.
    assert_eq!(semi[0], (quarter[0].0, quarter[1].0));
    assert_eq!(semi[1], (quarter[2].0, quarter[3].0));
}

#[test]
fn full_run_crowns_the_first_seed_chain_champion() {
    let mut t = tournament();
    let quarter = pairings(&t, Round::QuarterFinal);
    let champion_id = quarter[0].0;
    let runner_up_id = quarter[2].0;
    let first_out_id = quarter[0].1;

    for round_size in [4usize, 2, 1] {
        for _ in 0..round_size {
            record_match_result(&mut t, Side::Player1).unwrap();
        }
        advance_round_if_complete(&mut t).unwrap();
    }

    assert_eq!(t.phase(), Phase::Champion);
    assert_eq!(t.winner.as_ref().unwrap().id, champion_id);
    assert_eq!(t.matches.len(), 7);
    assert_eq!(t.round_matches(Round::Final).count(), 1);

    // Champion: 3 played, 3 won. Losing finalist: 3 played, 1 lost.
    // First player eliminated: 1 played, 1 lost.
    let champ = t.ledger.get(champion_id).unwrap();
    assert_eq!(
        (champ.matches_played, champ.wins, champ.losses),
        (3, 3, 0)
    );
    let runner_up = t.ledger.get(runner_up_id).unwrap();
    assert_eq!(
        (runner_up.matches_played, runner_up.wins, runner_up.losses),
        (3, 2, 1)
    );
    let first_out = t.ledger.get(first_out_id).unwrap();
    assert_eq!(
        (first_out.matches_played, first_out.wins, first_out.losses),
        (1, 0, 1)
    );

    // History holds all seven decided matches, final last.
    assert_eq!(t.history.len(), 7);
    assert_eq!(t.history[6].round, Round::Final);
    assert_eq!(t.history[6].winner_id, champion_id);
}

#[test]
fn terminal_tournament_rejects_every_operation() {
    let mut t = tournament();
    for round_size in [4usize, 2, 1] {
        for _ in 0..round_size {
            record_match_result(&mut t, Side::Player2).unwrap();
        }
        advance_round_if_complete(&mut t).unwrap();
    }
    assert!(t.winner.is_some());

    assert!(matches!(
        t.current_match(),
        Err(TournamentError::NoCurrentMatch)
    ));
    assert!(matches!(
        record_match_result(&mut t, Side::Player1),
        Err(TournamentError::NoCurrentMatch)
    ));
    assert!(matches!(
        advance_round_if_complete(&mut t),
        Err(TournamentError::NoCurrentMatch)
    ));
}

#[test]
fn round_never_decreases_and_cursor_stays_in_bounds() {
    let mut t = tournament();
    let mut last_round = t.current_round.number();
    loop {
        if t.phase() == Phase::AwaitingMatch {
            let in_round = t.round_matches(t.current_round).count();
            assert!(t.current_match_index < in_round);
        }
        assert!(t.current_round.number() >= last_round);
        last_round = t.current_round.number();

        if t.winner.is_some() {
            break;
        }
        if t.current_match().is_ok() {
            record_match_result(&mut t, Side::Player1).unwrap();
        }
        advance_round_if_complete(&mut t).ok();
    }
    assert_eq!(last_round, Round::Final.number());
}

#[test]
fn record_when_round_is_complete_is_rejected() {
    let mut t = tournament();
    for _ in 0..4 {
        record_match_result(&mut t, Side::Player1).unwrap();
    }
    // Cursor has exhausted the quarterfinals; recording needs an advance first.
    assert!(matches!(
        record_match_result(&mut t, Side::Player1),
        Err(TournamentError::NoCurrentMatch)
    ));
    advance_round_if_complete(&mut t).unwrap();
    record_match_result(&mut t, Side::Player1).unwrap();
}

#[test]
fn view_tracks_cursor_champion_and_standings() {
    let mut t = tournament();
    record_match_result(&mut t, Side::Player1).unwrap();

    let view = TournamentView::project(&t);
    assert_eq!(view.phase, Phase::AwaitingMatch);
    assert_eq!(view.rounds[0].matches.len(), 4);
    assert!(view.rounds[1].matches.is_empty());
    assert!(!view.rounds[0].matches[0].current);
    assert!(view.rounds[0].matches[1].current);
    assert!(view.rounds[0].matches[0].winner.is_some());
    assert_eq!(view.standings.len(), 8);
    let current = view.current.unwrap();
    assert_eq!(current.match_number, 2);
    assert_eq!(current.round_label, "Quarterfinals");
    assert!(view.champion.is_none());

    for _ in 0..3 {
        record_match_result(&mut t, Side::Player1).unwrap();
    }
    advance_round_if_complete(&mut t).unwrap();
    for round_size in [2usize, 1] {
        for _ in 0..round_size {
            record_match_result(&mut t, Side::Player1).unwrap();
        }
        advance_round_if_complete(&mut t).unwrap();
    }

    let view = TournamentView::project(&t);
    assert_eq!(view.phase, Phase::Champion);
    assert!(view.current.is_none());
    assert_eq!(view.rounds[2].matches.len(), 1);
    assert!(view.rounds.iter().all(|r| r.matches.iter().all(|m| !m.current)));
    assert_eq!(
        view.champion.unwrap().id,
        t.winner.as_ref().unwrap().id
    );
}
