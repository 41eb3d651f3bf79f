use super::test_support::{config, pid, template, Table};
use super::{GameCommand, PlayerAction, TimerKind};
use crate::config::game::GameConfig;
use crate::domain::cards::CardKind;
use crate::domain::state::Phase;
use crate::errors::domain::{ConflictKind, DomainError, NotFoundKind};
use crate::protocol::messages::{Invitee, JoinFailure, ServerMsg, StopReason};

fn invitee(id: &str) -> Invitee {
    Invitee {
        id: id.into(),
        name: format!("Friend {id}"),
    }
}

fn small_table(players: usize, max_players: usize) -> Table {
    let cfg = GameConfig {
        max_players,
        ..config()
    };
    Table::with(players, cfg, template(20, 60))
}

#[test]
fn joiner_gets_ack_then_roster_then_state() {
    let mut t = Table::new(2);
    t.join("3").unwrap();

    let msgs = t.drain("3");
    assert!(matches!(msgs.first(), Some(ServerMsg::Joined { game }) if game.id.as_deref() == Some("g1")));
    let joins: Vec<_> = msgs
        .iter()
        .filter_map(|m| match m {
            ServerMsg::Join { seat } => Some(seat.id.as_str().to_string()),
            _ => None,
        })
        .collect();
    assert_eq!(joins, vec!["1", "2", "3"]);
    assert!(matches!(msgs.last(), Some(ServerMsg::State { state }) if !state.running));

    assert!(t
        .drain("1")
        .iter()
        .any(|m| matches!(m, ServerMsg::Join { seat } if seat.id == pid("3"))));
}

#[test]
fn first_joiner_gets_created() {
    let mut t = Table::new(0);
    t.join("1").unwrap();
    assert!(matches!(t.drain("1").first(), Some(ServerMsg::Created { .. })));
}

#[test]
fn full_table_turns_away_newcomers_but_not_returning_seats() {
    let mut t = small_table(3, 3);

    let err = t.join("4").unwrap_err();
    assert!(matches!(err, DomainError::Conflict(ConflictKind::GameFull, _)));
    assert_eq!(
        t.drain("4"),
        vec![ServerMsg::JoinFailed {
            reason: JoinFailure::Full
        }]
    );

    t.disconnect("2");
    t.join("2").unwrap();
    assert!(t.game.seat(&pid("2")).unwrap().is_connected());
    assert_eq!(t.game.roster().len(), 3);
}

#[test]
fn reconnect_restores_hand_and_round_state() {
    let mut t = Table::new(3);
    t.start_and_pick();
    let hand = t.hand("2");
    t.disconnect("2");
    t.drain_all();

    t.join("2").unwrap();

    let msgs = t.drain("2");
    assert!(msgs.iter().any(|m| matches!(
        m,
        ServerMsg::Cards { clear: true, add, .. } if *add == hand
    )));
    assert!(msgs.iter().any(|m| matches!(
        m,
        ServerMsg::State { state } if state.running && state.prompt.is_some()
    )));
    assert!(t.drain("1").iter().any(|m| matches!(
        m,
        ServerMsg::Update { seat } if seat.id == pid("2") && seat.connected
    )));
    assert!(t.game.round().is_pending(&pid("2")));
}

#[test]
fn disconnect_from_a_replaced_connection_is_ignored() {
    let mut t = Table::new(3);
    let old = t.inboxes["2"].conn_id;
    t.join("2").unwrap();
    t.drain_all();

    t.game.disconnect(&pid("2"), old).unwrap();
    assert!(t.game.seat(&pid("2")).unwrap().is_connected());

    t.game.handle(GameCommand::Action {
        player: pid("2"),
        connection_id: old,
        action: PlayerAction::Chat("from the past".into()),
    });
    assert!(t.drain("1").is_empty());
}

#[test]
fn actions_through_the_live_connection_are_applied() {
    let mut t = Table::new(2);
    let conn = t.inboxes["2"].conn_id;

    t.game.handle(GameCommand::Action {
        player: pid("2"),
        connection_id: conn,
        action: PlayerAction::Chat("hi".into()),
    });

    assert!(t
        .drain("1")
        .iter()
        .any(|m| matches!(m, ServerMsg::Chat { message, .. } if message == "hi")));
}

#[test]
fn host_role_passes_to_the_next_connected_seat() {
    let mut t = Table::new(3);

    t.disconnect("1");
    assert_eq!(t.game.host(), &pid("2"));
    assert!(t
        .drain("3")
        .iter()
        .any(|m| matches!(m, ServerMsg::NewHost { seat } if seat.id == pid("2"))));

    t.disconnect("2");
    assert_eq!(t.game.host(), &pid("3"));
    assert!(!t.game.is_closed());

    // The old host coming back does not take the role back.
    t.join("1").unwrap();
    assert_eq!(t.game.host(), &pid("3"));
}

#[test]
fn running_game_stops_when_understaffed() {
    let mut t = Table::new(2);
    t.game.start(&pid("1")).unwrap();
    t.drain_all();

    t.disconnect("2");

    assert_eq!(t.game.phase(), Phase::Stopped);
    assert_eq!(t.game.timers().armed_count(), 0);
    assert!(t.drain("1").iter().any(|m| matches!(
        m,
        ServerMsg::Stopped {
            reason: Some(StopReason::Understaffed)
        }
    )));
}

#[test]
fn last_disconnect_closes_the_game() {
    let mut t = Table::new(2);
    t.disconnect("1");
    assert!(!t.game.is_closed());
    t.disconnect("2");
    assert!(t.game.is_closed());
    assert_eq!(t.game.shared_summary().read().players, 0);
}

#[test]
fn kick_is_reserved_to_the_host() {
    let mut t = Table::new(3);

    assert!(matches!(
        t.game.kick(&pid("2"), &pid("3")),
        Err(DomainError::Forbidden(_))
    ));
    assert!(matches!(
        t.game.kick(&pid("1"), &pid("1")),
        Err(DomainError::Forbidden(_))
    ));
    assert!(matches!(
        t.game.kick(&pid("1"), &pid("9")),
        Err(DomainError::NotFound(NotFoundKind::Seat, _))
    ));

    t.game.kick(&pid("1"), &pid("3")).unwrap();

    assert_eq!(t.game.roster().len(), 2);
    assert!(t.drain("3").contains(&ServerMsg::MeLeft));
    assert!(t
        .drain("2")
        .iter()
        .any(|m| matches!(m, ServerMsg::Left { seat } if seat.id == pid("3"))));
}

#[test]
fn running_judge_cannot_be_kicked() {
    let mut t = Table::new(3);
    t.start_and_pick();
    t.game.select(&pid("2"), vec![]).unwrap();
    t.game.select(&pid("3"), vec![]).unwrap();
    t.game.choose_winner(&pid("1"), Some(0)).unwrap();
    t.fire(TimerKind::NextRound);
    assert_eq!(t.game.judge(), Some(&pid("2")));

    let err = t.game.kick(&pid("1"), &pid("2")).unwrap_err();

    assert!(matches!(err, DomainError::Forbidden(_)));
    assert_eq!(t.game.roster().len(), 3);
}

#[test]
fn kicking_the_last_pending_seat_moves_to_judgment() {
    let mut t = Table::new(4);
    t.start_and_pick();
    t.game.select(&pid("2"), vec![]).unwrap();
    t.game.select(&pid("3"), vec![]).unwrap();

    let hand = t.hand("4");

    t.game.kick(&pid("1"), &pid("4")).unwrap();

    assert_eq!(t.game.phase(), Phase::AwaitingJudgment);
    let submissions = &t.game.round().submissions;
    assert_eq!(submissions.len(), 3);
    let kicked = submissions
        .iter()
        .find(|s| s.seat.id == pid("4"))
        .expect("kicked seat still answers");
    assert_eq!(kicked.cards.len(), 1);
    assert!(hand.contains(&kicked.cards[0]));
    assert!(t.game.armed_timer(&TimerKind::Select(pid("4"))).is_none());
}

#[test]
fn leaving_mid_answers_still_counts_toward_judgment() {
    let mut t = Table::new(4);
    t.start_and_pick();
    let answers_left = t.game.deck_remaining(CardKind::Answer);

    t.game.leave(&pid("4")).unwrap();

    assert_eq!(t.game.phase(), Phase::AwaitingAnswers);
    assert!(t.game.seat(&pid("4")).is_none());
    assert_eq!(t.game.round().pending, vec![pid("2"), pid("3")]);
    assert_eq!(t.game.round().submissions.len(), 1);
    // A departing seat is not refilled.
    assert_eq!(t.game.deck_remaining(CardKind::Answer), answers_left);

    t.game.select(&pid("2"), vec![]).unwrap();
    t.game.select(&pid("3"), vec![]).unwrap();

    assert_eq!(t.game.phase(), Phase::AwaitingJudgment);
    assert_eq!(t.game.round().submissions.len(), 3);
}

#[test]
fn departed_seat_can_still_win_the_round() {
    let mut t = Table::new(3);
    t.start_and_pick();
    t.game.leave(&pid("3")).unwrap();
    t.game.select(&pid("2"), vec![]).unwrap();
    t.drain_all();

    let index = t
        .game
        .round()
        .submissions
        .iter()
        .position(|s| s.seat.id == pid("3"))
        .expect("departed seat answered");
    t.game.choose_winner(&pid("1"), Some(index as i64)).unwrap();

    let winner = t.drain("2").into_iter().find_map(|m| match m {
        ServerMsg::Winner { seat, .. } => Some(seat),
        _ => None,
    });
    assert_eq!(winner.map(|s| s.id), Some(pid("3")));
    assert_eq!(t.score("2"), 0);
}

#[test]
fn leaving_judge_keeps_the_seat_until_the_round_resolves() {
    let mut t = Table::new(3);
    t.game.start(&pid("1")).unwrap();
    t.drain_all();

    t.game.leave(&pid("1")).unwrap();

    assert!(t.drain("1").contains(&ServerMsg::MeLeft));
    assert_eq!(t.game.roster().len(), 3);
    assert!(!t.game.seat(&pid("1")).unwrap().is_connected());
    assert_eq!(t.game.judge(), Some(&pid("1")));
    assert_eq!(t.game.host(), &pid("2"));

    t.fire(TimerKind::Pick);
    assert_eq!(t.game.phase(), Phase::AwaitingAnswers);
    assert_eq!(t.game.round().pending, vec![pid("2"), pid("3")]);
}

#[test]
fn leaving_player_is_removed() {
    let mut t = Table::new(3);
    t.game.leave(&pid("3")).unwrap();

    assert!(t.game.seat(&pid("3")).is_none());
    assert!(t.drain("3").contains(&ServerMsg::MeLeft));
    assert!(t
        .drain("1")
        .iter()
        .any(|m| matches!(m, ServerMsg::Left { seat } if seat.id == pid("3"))));
}

#[test]
fn invite_adds_placeholders_up_to_capacity() {
    let mut t = small_table(2, 4);
    let friends = vec![
        invitee("3"),
        invitee("3"),
        Invitee {
            id: "  ".into(),
            name: "Nobody".into(),
        },
        invitee("1"),
        invitee("4"),
        invitee("5"),
    ];

    let added = t.game.invite(&pid("2"), friends).unwrap();

    assert_eq!(added, 2);
    assert_eq!(t.game.roster().len(), 4);
    assert!(!t.game.seat(&pid("3")).unwrap().is_connected());
    assert!(t.game.seat(&pid("5")).is_none());
    assert_eq!(t.game.summary().players, 2);

    // An invited friend arriving takes the reserved seat.
    t.join("3").unwrap();
    assert!(t.game.seat(&pid("3")).unwrap().is_connected());
    assert_eq!(t.game.roster().len(), 4);
}

#[test]
fn outsiders_cannot_invite() {
    let mut t = Table::new(2);
    let err = t.game.invite(&pid("9"), vec![invitee("3")]).unwrap_err();
    assert!(matches!(err, DomainError::Forbidden(_)));
    assert_eq!(t.game.roster().len(), 2);
}

#[test]
fn host_toggles_visibility_and_publishes_it() {
    let mut t = Table::new(2);
    assert!(t.game.is_private());

    assert!(t.game.toggle_private(&pid("2")).is_err());
    t.game.toggle_private(&pid("1")).unwrap();

    assert!(!t.game.is_private());
    assert!(!t.game.shared_summary().read().private);
    assert!(t
        .drain("2")
        .iter()
        .any(|m| matches!(m, ServerMsg::GameUpdate { game } if !game.private)));
}

#[test]
fn chat_is_relayed_to_everyone() {
    let mut t = Table::new(3);

    t.game.chat(&pid("2"), "hello there".into()).unwrap();

    for id in ["1", "2", "3"] {
        assert!(t.drain(id).iter().any(|m| matches!(
            m,
            ServerMsg::Chat { seat, message } if seat.id == pid("2") && message == "hello there"
        )));
    }
}

#[test]
fn chat_rejects_empty_oversized_and_outsider_messages() {
    let mut t = Table::new(2);
    assert!(matches!(
        t.game.chat(&pid("2"), String::new()),
        Err(DomainError::Validation(_))
    ));
    assert!(matches!(
        t.game.chat(&pid("2"), "x".repeat(1001)),
        Err(DomainError::Validation(_))
    ));
    assert!(matches!(
        t.game.chat(&pid("9"), "hi".into()),
        Err(DomainError::Forbidden(_))
    ));
    assert!(t.drain("1").is_empty());
}
