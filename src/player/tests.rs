use std::time::Duration;

use tokio::time::sleep;

use super::{
    control::{PlayOutcome, Toggled},
    session::SessionStatus,
    testing::{GUILD, Harness, actor, settle, track, url},
};
use crate::{
    common::{
        errors::{CommandError, ResolutionError, ValidationError},
        types::{Actor, ChannelId, GuildId},
    },
    protocol::tracks::SearchCandidate,
    voice::VoiceTransport,
};

async fn play(h: &Harness, name: &str) {
    h.control.play(&actor(), &url(name)).await.unwrap();
}

async fn status(h: &Harness) -> SessionStatus {
    h.slot().lock().await.status()
}

#[tokio::test(start_paused = true)]
async fn tracks_start_in_enqueue_order() {
    let h = Harness::new();
    for name in ["a", "b", "c"] {
        h.resolver.add(track(name, 120));
        play(&h, name).await;
    }
    settle().await;
    assert_eq!(h.transport.started(), ["a"]);

    h.transport.finish();
    settle().await;
    h.transport.finish();
    settle().await;
    assert_eq!(h.transport.started(), ["a", "b", "c"]);

    h.transport.finish();
    settle().await;
    assert_eq!(status(&h).await, SessionStatus::Idle);
    assert_eq!(h.slot().live_reporters(), 0);
    assert_eq!(h.gateway.connects(), 1);
}

#[tokio::test(start_paused = true)]
async fn skip_moves_to_next_track_and_restarts_reporter() {
    let h = Harness::new();
    h.resolver.add(track("a", 180));
    h.resolver.add(track("b", 200));
    play(&h, "a").await;
    play(&h, "b").await;
    settle().await;

    sleep(Duration::from_secs(3)).await;
    let a_message = h.slot().lock().await.last_message().unwrap();
    assert!(h.notifier.updates().iter().any(|(id, _)| *id == a_message));

    let skipped = h.control.skip(&actor()).await.unwrap();
    assert_eq!(skipped.title, "a");
    settle().await;

    assert_eq!(h.transport.started(), ["a", "b"]);
    assert_eq!(h.current_title().await.as_deref(), Some("b"));
    let sent: Vec<_> = h.notifier.sent().into_iter().map(|(_, t)| t).collect();
    assert_eq!(sent, ["a", "b"]);

    let slot = h.slot();
    let (b_message, view) = {
        let session = slot.lock().await;
        assert!(session.current().unwrap().clock.elapsed() < Duration::from_secs(1));
        (session.last_message().unwrap(), session.queue_view())
    };
    assert_ne!(a_message, b_message);
    assert!(view.upcoming.is_empty());

    let seen = h.notifier.updates().len();
    sleep(Duration::from_secs(2)).await;
    let fresh = &h.notifier.updates()[seen..];
    assert!(!fresh.is_empty());
    assert!(fresh.iter().all(|(id, card)| *id == b_message && card.title == "b"));
    assert_eq!(slot.live_reporters(), 1);
}

#[tokio::test(start_paused = true)]
async fn late_completion_after_stop_does_not_advance() {
    let h = Harness::new();
    h.transport.set_complete_on_stop(false);
    h.resolver.add(track("a", 180));
    h.resolver.add(track("b", 180));
    play(&h, "a").await;
    play(&h, "b").await;
    settle().await;

    h.control.stop(&actor()).await.unwrap();
    h.transport.release_held();
    settle().await;

    assert_eq!(h.transport.started(), ["a"]);
    assert_eq!(status(&h).await, SessionStatus::Idle);
    assert_eq!(h.slot().lock().await.queued().count(), 0);
    assert_eq!(h.slot().live_reporters(), 0);
}

#[tokio::test(start_paused = true)]
async fn late_completion_does_not_skip_a_newer_track() {
    let h = Harness::new();
    h.transport.set_complete_on_stop(false);
    h.resolver.add(track("a", 180));
    h.resolver.add(track("c", 180));
    play(&h, "a").await;
    settle().await;

    h.control.stop(&actor()).await.unwrap();
    play(&h, "c").await;
    h.transport.release_held();
    settle().await;

    assert_eq!(h.transport.started(), ["a", "c"]);
    assert_eq!(h.current_title().await.as_deref(), Some("c"));
}

#[tokio::test(start_paused = true)]
async fn refused_track_is_skipped() {
    let h = Harness::new();
    h.transport.fail_on(&url("bad"));
    h.resolver
        .add_playlist("https://cdn.example.com/mix.m3u", vec![Ok(track("bad", 60)), Ok(track("good", 60))]);

    let outcome = h
        .control
        .play(&actor(), "https://cdn.example.com/mix.m3u")
        .await
        .unwrap();
    let PlayOutcome::Enqueued(report) = outcome else {
        panic!("expected an enqueue");
    };
    assert_eq!(report.added, 2);
    settle().await;

    assert_eq!(h.transport.started(), ["good"]);
    assert_eq!(h.current_title().await.as_deref(), Some("good"));
}

#[tokio::test(start_paused = true)]
async fn playlist_drops_only_failing_entries() {
    let h = Harness::new();
    let broken = ResolutionError::Unreachable {
        locator: url("gone"),
        reason: "HTTP 404".to_string(),
    };
    h.resolver.add_playlist(
        "https://cdn.example.com/mix.m3u",
        vec![Ok(track("a", 60)), Err(broken), Ok(track("b", 60))],
    );

    let outcome = h
        .control
        .play(&actor(), "https://cdn.example.com/mix.m3u")
        .await
        .unwrap();
    let PlayOutcome::Enqueued(report) = outcome else {
        panic!("expected an enqueue");
    };

    assert_eq!((report.added, report.dropped), (2, 1));
    assert_eq!(report.queue.now_playing.unwrap().title, "a");
    let upcoming: Vec<_> = report.queue.upcoming.iter().map(|e| e.title.as_str()).collect();
    assert_eq!(upcoming, ["b"]);
}

#[tokio::test(start_paused = true)]
async fn unplayable_locator_leaves_no_session_behind() {
    let h = Harness::new();
    h.resolver.add_playlist(
        "https://cdn.example.com/dead.m3u",
        vec![Err(ResolutionError::Unsupported("text/html".into()))],
    );

    let err = h
        .control
        .play(&actor(), "https://cdn.example.com/dead.m3u")
        .await
        .unwrap_err();
    assert!(matches!(err, CommandError::Resolution(ResolutionError::Unsupported(_))));

    let err = h.control.play(&actor(), &url("unknown")).await.unwrap_err();
    assert!(matches!(err, CommandError::Resolution(ResolutionError::Unreachable { .. })));

    assert!(h.control.registry().is_empty());
    assert_eq!(h.gateway.connects(), 0);
}

#[tokio::test(start_paused = true)]
async fn search_offers_bounded_candidates_and_enqueues_nothing() {
    let h = Harness::new();
    let hits: Vec<_> = (0..8)
        .map(|i| {
            h.resolver.add(track(&format!("hit{i}"), 90));
            SearchCandidate {
                title: format!("hit{i}"),
                locator: url(&format!("hit{i}")),
            }
        })
        .collect();
    h.resolver.set_hits(hits);

    let outcome = h.control.play(&actor(), "lofi beats").await.unwrap();
    let PlayOutcome::Selection(prompt) = outcome else {
        panic!("expected a selection prompt");
    };
    assert_eq!(prompt.candidates.len(), 5);
    assert_eq!(prompt.query, "lofi beats");
    assert!(h.control.registry().is_empty());
    assert!(h.transport.started().is_empty());

    let report = h
        .control
        .select(&actor(), prompt.prompt_id, &prompt.candidates[2].locator)
        .await
        .unwrap();
    assert_eq!(report.added, 1);
    assert_eq!(h.transport.started(), ["hit2"]);

    let again = h
        .control
        .select(&actor(), prompt.prompt_id, &prompt.candidates[0].locator)
        .await;
    assert_eq!(again, Err(CommandError::Validation(ValidationError::NoPendingSelection)));
}

#[tokio::test(start_paused = true)]
async fn expired_selection_is_rejected() {
    let h = Harness::new();
    h.resolver.add(track("hit", 90));
    h.resolver.set_hits(vec![SearchCandidate {
        title: "hit".into(),
        locator: url("hit"),
    }]);

    let PlayOutcome::Selection(prompt) = h.control.play(&actor(), "hit").await.unwrap() else {
        panic!("expected a selection prompt");
    };
    sleep(Duration::from_secs(61)).await;

    let err = h.control.select(&actor(), prompt.prompt_id, &url("hit")).await;
    assert_eq!(err, Err(CommandError::Validation(ValidationError::SelectionExpired)));
    assert!(h.transport.started().is_empty());
}

#[tokio::test(start_paused = true)]
async fn search_without_hits_is_a_resolution_error() {
    let h = Harness::new();
    let err = h.control.play(&actor(), "nothing like this").await.unwrap_err();
    assert!(matches!(err, CommandError::Resolution(ResolutionError::NoMatches(_))));
}

#[tokio::test(start_paused = true)]
async fn commands_require_voice_presence() {
    let h = Harness::new();
    h.resolver.add(track("a", 60));
    let outsider = Actor {
        voice_channel_id: None,
        ..actor()
    };

    let err = h.control.play(&outsider, &url("a")).await.unwrap_err();
    assert_eq!(err, CommandError::Validation(ValidationError::NotInVoice));
    let err = h.control.play(&outsider, "some search").await.unwrap_err();
    assert_eq!(err, CommandError::Validation(ValidationError::NotInVoice));
    assert!(h.control.registry().is_empty());

    assert_eq!(h.control.skip(&actor()).await.unwrap_err(), CommandError::Validation(ValidationError::NothingPlaying));
    assert_eq!(h.control.disconnect(&actor()).await.unwrap_err(), CommandError::Validation(ValidationError::NotConnected));
}

#[tokio::test(start_paused = true)]
async fn pause_and_resume_keep_transport_and_clock_in_step() {
    let h = Harness::new();
    h.resolver.add(track("a", 180));
    play(&h, "a").await;
    settle().await;
    sleep(Duration::from_secs(5)).await;

    h.control.pause(&actor()).await.unwrap();
    settle().await;
    assert!(h.transport.is_paused());
    assert_eq!(status(&h).await, SessionStatus::Paused);
    assert_eq!(h.slot().live_reporters(), 0);
    assert_eq!(h.control.pause(&actor()).await.unwrap_err(), CommandError::Validation(ValidationError::AlreadyPaused));

    let seen = h.notifier.updates().len();
    sleep(Duration::from_secs(42)).await;
    assert_eq!(h.notifier.updates().len(), seen);

    h.control.resume(&actor()).await.unwrap();
    settle().await;
    assert!(h.transport.is_playing());
    assert_eq!(h.slot().live_reporters(), 1);
    assert_eq!(h.control.resume(&actor()).await.unwrap_err(), CommandError::Validation(ValidationError::NotPaused));

    sleep(Duration::from_secs(3)).await;
    let slot = h.slot();
    let session = slot.lock().await;
    assert_eq!(session.current().unwrap().clock.elapsed().as_secs(), 8);

    let message = session.last_message().unwrap();
    assert_eq!(h.notifier.sent().len(), 1);
    let (last_id, last_card) = h.notifier.updates().pop().unwrap();
    assert_eq!(last_id, message);
    assert!(!last_card.paused);
}

#[tokio::test(start_paused = true)]
async fn pause_before_the_first_card_still_posts_one_on_resume() {
    let h = Harness::new();
    h.resolver.add(track("a", 180));
    play(&h, "a").await;
    h.control.pause(&actor()).await.unwrap();
    h.control.resume(&actor()).await.unwrap();
    sleep(Duration::from_secs(5)).await;

    let sent = h.notifier.sent();
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0].1, "a");
    assert_eq!(h.slot().live_reporters(), 1);

    let message = h.slot().lock().await.last_message().unwrap();
    assert_eq!(message, sent[0].0);
    let updates = h.notifier.updates();
    assert!(updates.len() >= 4);
    assert!(updates.iter().all(|(id, card)| *id == message && card.title == "a"));
}

#[tokio::test(start_paused = true)]
async fn toggle_flips_between_pause_and_resume() {
    let h = Harness::new();
    h.resolver.add(track("a", 180));
    play(&h, "a").await;
    settle().await;

    let Toggled::Paused(info) = h.control.toggle(&actor()).await.unwrap() else {
        panic!("expected the track to pause");
    };
    assert_eq!(info.title, "a");
    assert_eq!(status(&h).await, SessionStatus::Paused);
    assert!(h.transport.is_paused());

    let Toggled::Resumed(_) = h.control.toggle(&actor()).await.unwrap() else {
        panic!("expected the track to resume");
    };
    settle().await;
    assert_eq!(status(&h).await, SessionStatus::Playing);
    assert!(h.transport.is_playing());
    assert_eq!(h.slot().live_reporters(), 1);

    h.control.stop(&actor()).await.unwrap();
    assert_eq!(
        h.control.toggle(&actor()).await.unwrap_err(),
        CommandError::Validation(ValidationError::NothingPlaying)
    );
}

#[tokio::test(start_paused = true)]
async fn queue_card_follows_enqueue_idle_and_stop() {
    let h = Harness::new();
    h.resolver.add(track("a", 60));
    h.resolver.add(track("b", 60));
    h.resolver.add(track("c", 60));
    play(&h, "a").await;
    play(&h, "b").await;
    settle().await;

    let queues = h.notifier.queues();
    assert_eq!(queues.len(), 2);
    let (channel, view) = &queues[1];
    assert_eq!(*channel, ChannelId(20));
    assert_eq!(view.now_playing.as_ref().unwrap().title, "a");
    assert_eq!(view.upcoming.len(), 1);

    h.transport.finish();
    settle().await;
    h.transport.finish();
    settle().await;
    let queues = h.notifier.queues();
    assert_eq!(queues.len(), 3);
    assert!(queues[2].1.now_playing.is_none());
    assert_eq!(queues[2].1.lines(), ["The queue is empty."]);

    play(&h, "c").await;
    h.control.stop(&actor()).await.unwrap();
    settle().await;
    let queues = h.notifier.queues();
    assert_eq!(queues.len(), 5);
    assert!(queues[4].1.now_playing.is_none());
    assert!(queues[4].1.upcoming.is_empty());
}

#[tokio::test(start_paused = true)]
async fn pause_resume_churn_never_runs_two_reporters() {
    let h = Harness::new();
    h.resolver.add(track("a", 600));
    play(&h, "a").await;
    settle().await;

    for _ in 0..5 {
        h.control.pause(&actor()).await.unwrap();
        h.control.resume(&actor()).await.unwrap();
    }

    let slot = h.slot();
    for _ in 0..5 {
        sleep(Duration::from_millis(500)).await;
        assert!(slot.live_reporters() <= 1);
    }
    assert_eq!(slot.live_reporters(), 1);
    assert!(h.notifier.max_in_flight() <= 1);
    assert_eq!(h.notifier.sent().len(), 1);
}

#[tokio::test(start_paused = true)]
async fn elapsed_is_clamped_to_track_length() {
    let h = Harness::new();
    h.resolver.add(track("short", 3));
    play(&h, "short").await;
    settle().await;

    sleep(Duration::from_secs(10)).await;
    let (_, card) = h.notifier.updates().pop().unwrap();
    assert_eq!(card.elapsed_secs, 3);
    assert!(card.progress.starts_with("00:03 "));
    assert!(card.progress.ends_with("● 00:03"));
}

#[tokio::test(start_paused = true)]
async fn deleted_message_ends_reporting_but_not_playback() {
    let h = Harness::new();
    h.resolver.add(track("a", 180));
    play(&h, "a").await;
    settle().await;

    let message = h.slot().lock().await.last_message().unwrap();
    h.notifier.delete(message);
    sleep(Duration::from_secs(2)).await;

    assert_eq!(h.slot().live_reporters(), 0);
    assert_eq!(status(&h).await, SessionStatus::Playing);
}

#[tokio::test(start_paused = true)]
async fn disconnect_clears_session_and_next_play_reconnects() {
    let h = Harness::new();
    for name in ["a", "b", "c"] {
        h.resolver.add(track(name, 60));
    }
    play(&h, "a").await;
    play(&h, "b").await;
    settle().await;

    h.control.disconnect(&actor()).await.unwrap();
    settle().await;
    assert!(h.transport.is_disconnected());
    assert_eq!(status(&h).await, SessionStatus::Idle);
    assert!(h.control.queue(GUILD).await.upcoming.is_empty());
    assert_eq!(h.slot().live_reporters(), 0);
    assert_eq!(h.control.disconnect(&actor()).await.unwrap_err(), CommandError::Validation(ValidationError::NotConnected));

    play(&h, "c").await;
    settle().await;
    assert_eq!(h.gateway.connects(), 2);
    assert_eq!(h.transport.started(), ["a", "c"]);
}

#[tokio::test(start_paused = true)]
async fn external_voice_teardown_zeroes_session() {
    let h = Harness::new();
    h.resolver.add(track("a", 60));
    h.resolver.add(track("b", 60));
    play(&h, "a").await;
    play(&h, "b").await;
    settle().await;

    assert!(h.control.voice_closed(GUILD).await);
    settle().await;

    let slot = h.slot();
    let session = slot.lock().await;
    assert_eq!(session.status(), SessionStatus::Idle);
    assert!(!session.is_connected());
    assert!(session.last_message().is_none());
    drop(session);
    assert!(!h.control.voice_closed(GUILD).await);
    assert!(!h.control.voice_closed(GuildId(99)).await);
}

#[tokio::test(start_paused = true)]
async fn queue_view_is_read_only() {
    let h = Harness::new();
    for name in ["a", "b", "c"] {
        h.resolver.add(track(name, 60));
        play(&h, name).await;
    }

    let first = h.control.queue(GUILD).await;
    let second = h.control.queue(GUILD).await;
    assert_eq!(first, second);
    assert_eq!(first.now_playing.unwrap().title, "a");
    assert_eq!(first.upcoming.len(), 2);
    assert_eq!(h.transport.started(), ["a"]);
}

#[tokio::test(start_paused = true)]
async fn sessions_of_different_guilds_do_not_block_each_other() {
    let h = Harness::new();
    h.resolver.add(track("a", 60));
    play(&h, "a").await;
    h.control.registry().get_or_create(GuildId(2));

    let slot = h.slot();
    let _held = slot.lock().await;
    let view = tokio::time::timeout(Duration::from_secs(1), h.control.queue(GuildId(2)))
        .await
        .expect("guild 2 is not blocked by guild 1");
    assert!(view.now_playing.is_none());
}
