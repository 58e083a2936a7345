//! Session subsystem behaviour against an in-memory messenger

mod common;

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::Barrier;
use tokio_test::{assert_err, assert_ok};

use cb_core::session::new_session_id;
use cb_core::{
    ActorId, Error, TransportError, ErrorKind, RaffleOutcome, RaffleSession, RaffleSpec, RandomDraw,
    SessionConfig, SessionCoordinator, SessionState, View,
};
use common::{BOT_ID, CHANNEL, Call, RecordingMessenger};

const OWNER: ActorId = ActorId(1);

fn coordinator(messenger: &Arc<RecordingMessenger>) -> Arc<SessionCoordinator> {
    SessionCoordinator::new(messenger.clone(), SessionConfig::default())
}

fn movie_night(window_secs: u64) -> RaffleSpec {
    RaffleSpec {
        label: "Movie Night".to_string(),
        marker: "🎉".to_string(),
        window_secs,
        owner: OWNER,
    }
}

// ---------------------------------------------------------------------------
// Rolls
// ---------------------------------------------------------------------------

#[tokio::test]
async fn test_invalid_roll_creates_nothing() {
    let messenger = Arc::new(RecordingMessenger::new());
    let coordinator = coordinator(&messenger);

    for notation in ["0d6", "4d1", "101d6", "4d1001", "abc"] {
        let err = coordinator
            .start_roll(CHANNEL, notation, "alice")
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Validation, "{notation}");
    }

    assert_eq!(messenger.posts(), 0);
    assert_eq!(coordinator.active_count(), 0);
}

#[tokio::test]
async fn test_roll_posts_result_with_reroll_control() {
    let messenger = Arc::new(RecordingMessenger::new());
    let coordinator = coordinator(&messenger);

    let (id, result) = coordinator.start_roll(CHANNEL, "4d6", "alice").await.unwrap();
    assert_eq!(result.values.len(), 4);
    assert_eq!(coordinator.state(id), Some(SessionState::Active));

    match &messenger.calls()[0] {
        Call::Post(channel, View::Roll { session, spec, rolled_by, reroll, .. }) => {
            assert_eq!(*channel, CHANNEL);
            assert_eq!(*session, id);
            assert_eq!(spec.to_string(), "4d6");
            assert_eq!(rolled_by, "alice");
            assert!(*reroll);
        }
        other => panic!("unexpected call: {other:?}"),
    }
}

#[tokio::test]
async fn test_anyone_can_reroll() {
    let messenger = Arc::new(RecordingMessenger::new());
    let coordinator = coordinator(&messenger);
    let (id, _) = coordinator.start_roll(CHANNEL, "3d20", "alice").await.unwrap();

    for name in ["bob", "carol"] {
        let result = coordinator.reroll(id, name).await.unwrap();
        assert_eq!(result.values.len(), 3);
        assert!(result.values.iter().all(|v| (1..=20).contains(v)));
    }

    let edits: Vec<_> = messenger
        .calls()
        .into_iter()
        .filter_map(|call| match call {
            Call::Edit(_, View::Roll { rolled_by, reroll, .. }) => Some((rolled_by, reroll)),
            _ => None,
        })
        .collect();
    assert_eq!(edits, vec![("bob".to_string(), true), ("carol".to_string(), true)]);
    assert_eq!(coordinator.state(id), Some(SessionState::Active));
}

#[tokio::test(start_paused = true)]
async fn test_roll_expires_and_rejects_late_rerolls() {
    let messenger = Arc::new(RecordingMessenger::new());
    let coordinator = coordinator(&messenger);
    let (id, _) = coordinator.start_roll(CHANNEL, "1d6", "alice").await.unwrap();

    tokio::time::sleep(Duration::from_secs(16)).await;
    assert_eq!(coordinator.state(id), Some(SessionState::Expired));
    assert!(messenger.calls().iter().any(|c| matches!(c, Call::RemoveControls(_))));

    let before = messenger.call_count();
    let err = coordinator.reroll(id, "bob").await.unwrap_err();
    assert!(matches!(err, Error::SessionAlreadyFinished));
    assert_eq!(messenger.call_count(), before);

    // A second expiry is a no-op
    assert!(matches!(
        coordinator.expire(id).await,
        Err(Error::SessionAlreadyFinished)
    ));
    assert_eq!(messenger.call_count(), before);
}

#[tokio::test]
async fn test_reroll_on_deleted_message_still_rolls() {
    let messenger = Arc::new(RecordingMessenger::new());
    let coordinator = coordinator(&messenger);
    let (id, _) = coordinator.start_roll(CHANNEL, "2d6", "alice").await.unwrap();

    messenger.forget(100);
    assert_ok!(coordinator.reroll(id, "bob").await);
}

// ---------------------------------------------------------------------------
// Raffles
// ---------------------------------------------------------------------------

#[tokio::test]
async fn test_raffle_window_out_of_range() {
    let messenger = Arc::new(RecordingMessenger::new());
    let coordinator = coordinator(&messenger);

    for window in [0, 4, 301] {
        let err = coordinator
            .start_raffle(CHANNEL, movie_night(window))
            .await
            .unwrap_err();
        assert!(matches!(err, Error::WindowOutOfRange(w) if w == window));
    }
    assert_eq!(messenger.posts(), 0);
}

#[tokio::test]
async fn test_rejected_marker_never_activates() {
    let messenger = Arc::new(RecordingMessenger::rejecting_markers());
    let coordinator = coordinator(&messenger);

    let err = coordinator
        .start_raffle(CHANNEL, movie_night(30))
        .await
        .unwrap_err();
    assert!(matches!(err, Error::MarkerRejected(ref m) if m == "🎉"));
    assert_eq!(coordinator.active_count(), 0);

    // The open message never gets its controls
    assert!(
        !messenger
            .calls()
            .iter()
            .any(|c| matches!(c, Call::Edit(_, view) if view.has_controls()))
    );
}

#[tokio::test]
async fn test_raffle_opens_with_marker_and_controls() {
    let messenger = Arc::new(RecordingMessenger::new());
    let coordinator = coordinator(&messenger);

    let id = coordinator
        .start_raffle(CHANNEL, movie_night(30))
        .await
        .unwrap();

    let calls = messenger.calls();
    assert!(matches!(&calls[0], Call::Post(_, View::RaffleOpen { controls: false, .. })));
    assert!(matches!(&calls[1], Call::AddReaction(_, marker) if marker == "🎉"));
    assert!(matches!(
        &calls[2],
        Call::Edit(_, View::RaffleOpen { session, controls: true, .. }) if *session == id
    ));
    assert_eq!(coordinator.state(id), Some(SessionState::Active));
}

#[tokio::test]
async fn test_non_owner_cannot_draw_or_cancel() {
    let messenger = Arc::new(RecordingMessenger::new());
    let coordinator = coordinator(&messenger);
    let id = coordinator
        .start_raffle(CHANNEL, movie_night(30))
        .await
        .unwrap();
    messenger.react(ActorId(2), false);

    let before = messenger.call_count();
    for result in [
        coordinator.draw(id, ActorId(2)).await,
        coordinator.cancel(id, ActorId(3)).await,
    ] {
        let err = result.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Authorization);
        assert!(err.user_notice().contains(&OWNER.mention()));
    }

    assert_eq!(coordinator.state(id), Some(SessionState::Active));
    assert_eq!(messenger.call_count(), before);
}

#[tokio::test]
async fn test_only_bot_decoration_means_no_participants() {
    let messenger = Arc::new(RecordingMessenger::new());
    let coordinator = coordinator(&messenger);
    let id = coordinator
        .start_raffle(CHANNEL, movie_night(30))
        .await
        .unwrap();

    let outcome = coordinator.draw(id, OWNER).await.unwrap();
    assert_eq!(outcome, RaffleOutcome::NoParticipants);
    assert_eq!(coordinator.state(id), Some(SessionState::Resolved));
    assert_eq!(messenger.list_reactor_calls(), 0);
    assert_eq!(
        messenger.announcements(),
        vec![View::RaffleNoParticipants {
            label: "Movie Night".to_string()
        }]
    );
}

#[tokio::test]
async fn test_only_bots_reacting_means_no_participants() {
    let messenger = Arc::new(RecordingMessenger::new());
    let coordinator = coordinator(&messenger);
    let id = coordinator
        .start_raffle(CHANNEL, movie_night(30))
        .await
        .unwrap();
    messenger.react(ActorId(50), true);

    let outcome = coordinator.draw(id, OWNER).await.unwrap();
    assert_eq!(outcome, RaffleOutcome::NoParticipants);
}

#[tokio::test]
async fn test_winner_is_a_human_reactor() {
    for _ in 0..10 {
        let messenger = Arc::new(RecordingMessenger::new());
        let coordinator = coordinator(&messenger);
        let id = coordinator
            .start_raffle(CHANNEL, movie_night(30))
            .await
            .unwrap();
        messenger.react(ActorId(10), false);
        messenger.react(ActorId(51), true);
        messenger.react(ActorId(11), false);

        let outcome = coordinator.draw(id, OWNER).await.unwrap();
        match outcome {
            RaffleOutcome::Winner(winner) => {
                assert!([ActorId(10), ActorId(11)].contains(&winner));
                assert_ne!(winner, BOT_ID);
            }
            other => panic!("expected a winner, got {other:?}"),
        }
    }
}

#[tokio::test]
async fn test_cancel_consumes_no_reactions() {
    let messenger = Arc::new(RecordingMessenger::new());
    let coordinator = coordinator(&messenger);
    let id = coordinator
        .start_raffle(CHANNEL, movie_night(30))
        .await
        .unwrap();
    messenger.react(ActorId(10), false);

    let outcome = coordinator.cancel(id, OWNER).await.unwrap();
    assert_eq!(outcome, RaffleOutcome::Cancelled);
    assert_eq!(coordinator.state(id), Some(SessionState::Cancelled));
    assert!(
        !messenger
            .calls()
            .iter()
            .any(|c| matches!(c, Call::ReactionCount(_) | Call::ListReactors(_)))
    );
    assert_eq!(
        messenger.announcements(),
        vec![View::RaffleCancelled {
            label: "Movie Night".to_string()
        }]
    );
}

#[tokio::test(start_paused = true)]
async fn test_terminal_state_is_absorbing() {
    let messenger = Arc::new(RecordingMessenger::new());
    let coordinator = coordinator(&messenger);
    let id = coordinator
        .start_raffle(CHANNEL, movie_night(30))
        .await
        .unwrap();
    messenger.react(ActorId(10), false);
    assert_ok!(coordinator.cancel(id, OWNER).await);

    let before = messenger.call_count();
    assert_err!(coordinator.draw(id, OWNER).await);
    assert_err!(coordinator.cancel(id, OWNER).await);
    assert!(matches!(
        coordinator.draw(id, ActorId(2)).await,
        Err(Error::SessionAlreadyFinished)
    ));
    assert!(matches!(
        coordinator.expire(id).await,
        Err(Error::SessionAlreadyFinished)
    ));

    // The cancelled clock must not announce anything later either
    tokio::time::sleep(Duration::from_secs(60)).await;

    assert_eq!(messenger.call_count(), before);
    assert_eq!(coordinator.state(id), Some(SessionState::Cancelled));
    assert_eq!(messenger.announcements().len(), 1);
}

#[tokio::test(start_paused = true)]
async fn test_raffle_resolves_on_expiry_with_follow_up() {
    let messenger = Arc::new(RecordingMessenger::new());
    let coordinator = coordinator(&messenger);
    let id = coordinator
        .start_raffle(CHANNEL, movie_night(10))
        .await
        .unwrap();
    messenger.react(ActorId(10), false);

    tokio::time::sleep(Duration::from_secs(11)).await;

    assert_eq!(coordinator.state(id), Some(SessionState::Expired));
    let calls = messenger.calls();
    assert!(calls.iter().any(|c| matches!(c, Call::RemoveControls(_))));
    assert!(calls.iter().any(|c| matches!(
        c,
        Call::FollowUp(_, View::RaffleWinner { winner, .. }) if *winner == ActorId(10)
    )));
    assert_eq!(messenger.announcements().len(), 1);

    assert!(matches!(
        coordinator.draw(id, OWNER).await,
        Err(Error::SessionAlreadyFinished)
    ));
}

#[tokio::test(start_paused = true)]
async fn test_finished_sessions_are_swept_after_retention() {
    let messenger = Arc::new(RecordingMessenger::new());
    let coordinator = coordinator(&messenger);
    let id = coordinator
        .start_raffle(CHANNEL, movie_night(30))
        .await
        .unwrap();
    assert_ok!(coordinator.cancel(id, OWNER).await);

    tokio::time::sleep(Duration::from_secs(601)).await;
    coordinator.start_roll(CHANNEL, "1d6", "alice").await.unwrap();

    assert_eq!(coordinator.state(id), None);
    assert!(matches!(
        coordinator.draw(id, OWNER).await,
        Err(Error::SessionNotFound(_))
    ));
}

#[tokio::test]
async fn test_unknown_session() {
    let messenger = Arc::new(RecordingMessenger::new());
    let coordinator = coordinator(&messenger);

    let err = coordinator.draw(new_session_id(), OWNER).await.unwrap_err();
    assert!(matches!(err, Error::SessionNotFound(_)));
    assert_eq!(err.kind(), ErrorKind::Lifecycle);
}

// ---------------------------------------------------------------------------
// Races
// ---------------------------------------------------------------------------

#[tokio::test]
async fn test_draw_and_expiry_race_resolves_once() {
    let gate = Arc::new(Barrier::new(2));
    let messenger = RecordingMessenger::gated(gate);
    let draw = RandomDraw::new();

    let session = RaffleSession::create(new_session_id(), movie_night(30), CHANNEL, &messenger)
        .await
        .unwrap();
    messenger.react(ActorId(10), false);
    messenger.react(ActorId(11), false);

    // Both pass the active check and suspend on the reaction count together
    let (drawn, expired) = tokio::join!(
        session.draw(OWNER, &messenger, &draw),
        session.on_expiry(&messenger, &draw),
    );

    let finished = [drawn.is_ok(), expired.is_ok()];
    assert_eq!(finished.iter().filter(|ok| **ok).count(), 1);
    for result in [&drawn, &expired] {
        if let Err(e) = result {
            assert!(matches!(e, Error::SessionAlreadyFinished));
        }
    }

    assert_eq!(messenger.announcements().len(), 1);
    let expected = if drawn.is_ok() {
        SessionState::Resolved
    } else {
        SessionState::Expired
    };
    assert_eq!(session.state(), expected);
    assert!(matches!(session.outcome(), Some(RaffleOutcome::Winner(_))));
}

#[tokio::test]
async fn test_cancel_wins_over_suspended_expiry() {
    let gate = Arc::new(Barrier::new(2));
    let messenger = RecordingMessenger::gated(gate.clone());
    let draw = RandomDraw::new();

    let session = RaffleSession::create(new_session_id(), movie_night(30), CHANNEL, &messenger)
        .await
        .unwrap();
    messenger.react(ActorId(10), false);

    // Expiry suspends on the count while the owner cancels, then resumes
    let (expired, cancelled) = tokio::join!(session.on_expiry(&messenger, &draw), async {
        let cancelled = session.cancel(OWNER, &messenger).await;
        gate.wait().await;
        cancelled
    });

    assert_eq!(cancelled.unwrap(), RaffleOutcome::Cancelled);
    assert!(matches!(expired, Err(Error::SessionAlreadyFinished)));
    assert_eq!(session.state(), SessionState::Cancelled);
    assert_eq!(
        messenger.announcements(),
        vec![View::RaffleCancelled {
            label: "Movie Night".to_string()
        }]
    );
    assert!(
        !messenger
            .calls()
            .iter()
            .any(|c| matches!(c, Call::FollowUp(..) | Call::RemoveControls(_)))
    );
}

#[tokio::test]
async fn test_raffle_is_registered_before_controls_appear() {
    let gate = Arc::new(Barrier::new(2));
    let messenger = Arc::new(RecordingMessenger::gated_edits(gate.clone()));
    let coordinator = coordinator(&messenger);

    let opening = tokio::spawn({
        let coordinator = Arc::clone(&coordinator);
        async move { coordinator.start_raffle(CHANNEL, movie_night(30)).await }
    });

    // The controls edit is in flight: a click arriving now must find the session
    gate.wait().await;
    let session = messenger
        .calls()
        .iter()
        .find_map(|call| match call {
            Call::Edit(_, View::RaffleOpen { session, controls: true, .. }) => Some(*session),
            _ => None,
        })
        .unwrap();
    assert_eq!(coordinator.state(session), Some(SessionState::Active));
    gate.wait().await;

    let id = opening.await.unwrap().unwrap();
    assert_eq!(id, session);
}

#[tokio::test]
async fn test_raffle_outage_is_not_reported_as_bad_marker() {
    let messenger = Arc::new(RecordingMessenger::failing_reactions(TransportError::Other(
        "503 Service Unavailable".to_string(),
    )));
    let coordinator = coordinator(&messenger);

    let err = coordinator
        .start_raffle(CHANNEL, movie_night(30))
        .await
        .unwrap_err();
    assert!(matches!(err, Error::Transport(TransportError::Other(_))));
    assert_eq!(err.kind(), ErrorKind::Transport);
    assert_eq!(coordinator.active_count(), 0);

    let messenger = Arc::new(RecordingMessenger::failing_reactions(TransportError::Forbidden));
    let forbidden = SessionCoordinator::new(messenger.clone(), SessionConfig::default());
    let err = forbidden
        .start_raffle(CHANNEL, movie_night(30))
        .await
        .unwrap_err();
    assert!(matches!(err, Error::MarkerRejected(ref m) if m == "🎉"));
}

#[tokio::test]
async fn test_deleted_raffle_message_still_resolves() {
    // Owner draw
    let messenger = Arc::new(RecordingMessenger::new());
    let coordinator = coordinator(&messenger);
    let id = coordinator
        .start_raffle(CHANNEL, movie_night(30))
        .await
        .unwrap();
    messenger.react(ActorId(5), false);
    messenger.forget(100);

    let outcome = assert_ok!(coordinator.draw(id, OWNER).await);
    assert_eq!(outcome, RaffleOutcome::Winner(ActorId(5)));
    assert_eq!(coordinator.state(id), Some(SessionState::Resolved));

    // Owner cancel
    let messenger = Arc::new(RecordingMessenger::new());
    let cancelling = SessionCoordinator::new(messenger.clone(), SessionConfig::default());
    let id = cancelling
        .start_raffle(CHANNEL, movie_night(30))
        .await
        .unwrap();
    messenger.forget(100);

    let outcome = assert_ok!(cancelling.cancel(id, OWNER).await);
    assert_eq!(outcome, RaffleOutcome::Cancelled);
    assert_eq!(cancelling.state(id), Some(SessionState::Cancelled));

    // Expiry
    let messenger = RecordingMessenger::new();
    let draw = RandomDraw::new();
    let session = RaffleSession::create(new_session_id(), movie_night(30), CHANNEL, &messenger)
        .await
        .unwrap();
    messenger.react(ActorId(5), false);
    messenger.forget(session.anchor().message_id);

    let outcome = assert_ok!(session.on_expiry(&messenger, &draw).await);
    assert_eq!(outcome, RaffleOutcome::Winner(ActorId(5)));
    assert_eq!(session.state(), SessionState::Expired);
    assert_eq!(session.outcome(), Some(RaffleOutcome::Winner(ActorId(5))));
}

#[tokio::test]
async fn test_expiry_with_unreadable_reactions_still_expires() {
    let messenger = RecordingMessenger::failing_counts(TransportError::Other(
        "gateway timeout".to_string(),
    ));
    let draw = RandomDraw::new();
    let session = RaffleSession::create(new_session_id(), movie_night(30), CHANNEL, &messenger)
        .await
        .unwrap();

    let err = assert_err!(session.on_expiry(&messenger, &draw).await);
    assert!(matches!(err, Error::Transport(TransportError::Other(_))));

    assert_eq!(session.state(), SessionState::Expired);
    assert_eq!(session.outcome(), None);
    let calls = messenger.calls();
    assert!(calls.iter().any(|c| matches!(c, Call::RemoveControls(_))));
    assert!(!calls.iter().any(|c| matches!(c, Call::FollowUp(..))));
    assert!(messenger.announcements().is_empty());

    // Later clicks see a finished raffle
    assert!(matches!(
        session.draw(OWNER, &messenger, &draw).await,
        Err(Error::SessionAlreadyFinished)
    ));
}

// ---------------------------------------------------------------------------
// End to end
// ---------------------------------------------------------------------------

#[tokio::test]
async fn test_movie_night() {
    let messenger = Arc::new(RecordingMessenger::new());
    let coordinator = coordinator(&messenger);
    let id = coordinator
        .start_raffle(CHANNEL, movie_night(30))
        .await
        .unwrap();

    let reactors = [ActorId(21), ActorId(22), ActorId(23)];
    for reactor in reactors {
        messenger.react(reactor, false);
    }

    let outcome = coordinator.draw(id, OWNER).await.unwrap();
    let RaffleOutcome::Winner(winner) = outcome else {
        panic!("expected a winner, got {outcome:?}");
    };
    assert!(reactors.contains(&winner));
    assert_eq!(coordinator.state(id), Some(SessionState::Resolved));
    assert_eq!(
        messenger.announcements(),
        vec![View::RaffleWinner {
            label: "Movie Night".to_string(),
            winner,
        }]
    );

    assert!(coordinator.draw(id, OWNER).await.is_err());
    assert!(coordinator.cancel(id, OWNER).await.is_err());
    assert_eq!(coordinator.state(id), Some(SessionState::Resolved));
    assert_eq!(messenger.announcements().len(), 1);
}
