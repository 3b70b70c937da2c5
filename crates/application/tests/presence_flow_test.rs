//! 在线状态与消息路由的集成测试

mod support;

use std::time::Duration;

use application::{
    ApplicationError, Clock, SendMessageRequest, TickOutcome, ENTERED_ROOM_TEXT, LEFT_ROOM_TEXT,
};
use domain::{DomainError, MessageKind, ParticipantName, BROADCAST_TARGET};
use support::Harness;

const TTL: Duration = Duration::from_secs(10);

fn public(from: &str, text: &str) -> SendMessageRequest {
    SendMessageRequest {
        from: from.into(),
        to: BROADCAST_TARGET.into(),
        text: text.into(),
        kind: MessageKind::Message,
    }
}

#[tokio::test]
async fn join_send_heartbeat_and_evict_scenario() {
    let harness = Harness::new();

    harness.chat.join("Alice").await.expect("first join");
    let duplicate = harness.chat.join("Alice").await.expect_err("second join");
    assert!(matches!(duplicate, ApplicationError::Conflict(name) if name == "Alice"));

    harness
        .chat
        .send_message(public("Alice", "hi"))
        .await
        .expect("send");
    let public_count = harness
        .chat
        .messages("Alice", 100)
        .await
        .expect("query")
        .iter()
        .filter(|m| m.kind == MessageKind::Message)
        .count();
    assert_eq!(public_count, 1);

    let missing = harness.chat.heartbeat("Bob").await.expect_err("bob");
    assert!(matches!(missing, ApplicationError::NotFound(_)));

    harness.clock.advance(TTL + Duration::from_millis(1));
    let outcome = harness.reaper.tick().await;
    assert_eq!(outcome, TickOutcome::Evicted(ParticipantName::parse("Alice").unwrap()));

    assert!(harness.chat.participants().await.expect("list").is_empty());
    let latest = harness.chat.messages("Carol", 1).await.expect("query");
    assert_eq!(latest.len(), 1);
    assert_eq!(latest[0].kind, MessageKind::Status);
    assert_eq!(latest[0].from, "Alice");
    assert_eq!(latest[0].to, BROADCAST_TARGET);
    assert_eq!(latest[0].text.as_str(), LEFT_ROOM_TEXT);
}

#[tokio::test]
async fn join_emits_entered_notice() {
    let harness = Harness::new();
    harness.chat.join("  <i>Alice</i> ").await.expect("join");

    let messages = harness.chat.messages("Bob", 10).await.expect("query");
    assert_eq!(messages.len(), 1);
    assert_eq!(messages[0].from, "Alice");
    assert_eq!(messages[0].kind, MessageKind::Status);
    assert_eq!(messages[0].text.as_str(), ENTERED_ROOM_TEXT);
    assert_eq!(messages[0].time, "00:00:00");
}

#[tokio::test]
async fn register_alone_does_not_emit_messages() {
    let harness = Harness::new();
    let participant = harness.presence.register("Alice").await.expect("register");
    assert_eq!(participant.last_seen, 0);
    assert_eq!(harness.store.message_count().await, 0);
}

#[tokio::test]
async fn blank_names_are_invalid_arguments() {
    let harness = Harness::new();
    let err = harness.presence.register("   ").await.expect_err("blank");
    assert!(matches!(
        err,
        ApplicationError::Domain(DomainError::InvalidArgument { ref field, .. }) if field == "name"
    ));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_registrations_yield_exactly_one_success() {
    let harness = Harness::new();

    let tasks: Vec<_> = (0..24)
        .map(|_| {
            let presence = harness.presence.clone();
            tokio::spawn(async move { presence.register("Alice").await })
        })
        .collect();

    let results: Vec<_> = futures::future::join_all(tasks)
        .await
        .into_iter()
        .map(|joined| joined.expect("task"))
        .collect();

    assert_eq!(results.iter().filter(|r| r.is_ok()).count(), 1);
    assert_eq!(
        results
            .iter()
            .filter(|r| matches!(r, Err(ApplicationError::Conflict(_))))
            .count(),
        23
    );
}

#[tokio::test]
async fn sweep_respects_ttl_boundary() {
    let harness = Harness::new();
    harness.clock.set(1_000);
    harness.presence.register("Alice").await.expect("register");

    let at_ttl = 1_000 + TTL.as_millis() as i64;
    assert!(harness
        .presence
        .sweep_once(TTL, at_ttl)
        .await
        .expect("sweep")
        .is_none());

    let victim = harness
        .presence
        .sweep_once(TTL, at_ttl + 1)
        .await
        .expect("sweep")
        .expect("victim");
    assert_eq!(victim.name.as_str(), "Alice");

    assert!(harness
        .presence
        .sweep_once(TTL, at_ttl + 1)
        .await
        .expect("sweep")
        .is_none());
}

#[tokio::test]
async fn heartbeat_keeps_participant_alive() {
    let harness = Harness::new();
    harness.presence.register("Alice").await.expect("register");

    harness.clock.advance(Duration::from_secs(8));
    harness.presence.heartbeat("Alice").await.expect("heartbeat");
    harness.clock.advance(Duration::from_secs(8));

    assert_eq!(harness.reaper.tick().await, TickOutcome::NothingStale);
    assert!(harness.presence.is_alive("Alice").await.expect("alive"));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_sweeps_evict_exactly_once() {
    let harness = Harness::new();
    harness.presence.register("Alice").await.expect("alice");
    harness.clock.advance(Duration::from_secs(20));
    harness.presence.register("Bob").await.expect("bob");

    let now = harness.clock.now();
    let tasks: Vec<_> = (0..12)
        .map(|_| {
            let presence = harness.presence.clone();
            tokio::spawn(async move { presence.sweep_once(TTL, now).await })
        })
        .collect();

    let evicted: Vec<_> = futures::future::join_all(tasks)
        .await
        .into_iter()
        .filter_map(|joined| joined.expect("task").expect("sweep"))
        .collect();

    assert_eq!(evicted.len(), 1);
    assert_eq!(evicted[0].name.as_str(), "Alice");
    assert!(harness.presence.is_alive("Bob").await.expect("alive"));
}

#[tokio::test]
async fn send_rejects_unknown_sender() {
    let harness = Harness::new();
    let err = harness
        .chat
        .send_message(public("ghost", "boo"))
        .await
        .expect_err("ghost");
    assert!(matches!(err, ApplicationError::UnknownSender(name) if name == "ghost"));
}

#[tokio::test]
async fn send_rejects_status_kind() {
    let harness = Harness::new();
    harness.presence.register("Alice").await.expect("register");

    let mut request = public("Alice", "sneaky");
    request.kind = MessageKind::Status;
    let err = harness.chat.send_message(request).await.expect_err("status");
    assert!(matches!(
        err,
        ApplicationError::Domain(DomainError::InvalidArgument { ref field, .. }) if field == "type"
    ));
}

#[tokio::test]
async fn private_message_to_unregistered_recipient_is_accepted() {
    let harness = Harness::new();
    harness.presence.register("Alice").await.expect("register");

    let message = harness
        .chat
        .send_message(SendMessageRequest {
            from: "Alice".into(),
            to: "Nobody".into(),
            text: "psst".into(),
            kind: MessageKind::Private,
        })
        .await
        .expect("private");
    assert_eq!(message.to, "Nobody");

    assert_eq!(harness.chat.messages("Nobody", 10).await.expect("q").len(), 1);
    assert!(harness.chat.messages("Carol", 10).await.expect("q").is_empty());
}

#[tokio::test]
async fn query_enforces_limit_and_order() {
    let harness = Harness::new();
    harness.presence.register("Alice").await.expect("register");
    for i in 0..5 {
        harness
            .chat
            .send_message(public("Alice", &format!("msg-{i}")))
            .await
            .expect("send");
    }

    let err = harness.chat.messages("Alice", 0).await.expect_err("zero");
    assert!(matches!(
        err,
        ApplicationError::Domain(DomainError::InvalidArgument { ref field, .. }) if field == "limit"
    ));

    let latest = harness.chat.messages("Alice", 3).await.expect("query");
    let texts: Vec<_> = latest.iter().map(|m| m.text.as_str()).collect();
    assert_eq!(texts, vec!["msg-4", "msg-3", "msg-2"]);
}

#[tokio::test]
async fn large_limit_returns_every_visible_message() {
    let harness = Harness::new();
    harness.chat.join("Alice").await.expect("join");
    for i in 0..1_005 {
        harness
            .chat
            .send_message(public("Alice", &format!("msg-{i}")))
            .await
            .expect("send");
    }

    let all = harness.chat.messages("Alice", 1_500).await.expect("query");
    assert_eq!(all.len(), 1_006);
    assert_eq!(all[0].text.as_str(), "msg-1004");
    assert_eq!(all[1_005].text.as_str(), ENTERED_ROOM_TEXT);
}

#[tokio::test]
async fn reaper_evicts_one_participant_per_tick() {
    let harness = Harness::new();
    for name in ["Alice", "Bob", "Carol"] {
        harness.presence.register(name).await.expect("register");
    }
    harness.clock.advance(Duration::from_secs(60));

    for _ in 0..3 {
        assert!(matches!(
            harness.reaper.tick().await,
            TickOutcome::Evicted(_)
        ));
    }
    assert_eq!(harness.reaper.tick().await, TickOutcome::NothingStale);

    let notices = harness.chat.messages("Dave", 10).await.expect("query");
    assert_eq!(notices.len(), 3);
    assert!(notices.iter().all(|m| m.text.as_str() == LEFT_ROOM_TEXT));
}

#[tokio::test]
async fn messages_survive_sender_eviction() {
    let harness = Harness::new();
    harness.presence.register("Alice").await.expect("register");
    harness
        .chat
        .send_message(public("Alice", "still here"))
        .await
        .expect("send");

    harness.clock.advance(Duration::from_secs(11));
    harness.reaper.tick().await;

    let texts: Vec<_> = harness
        .chat
        .messages("Bob", 10)
        .await
        .expect("query")
        .into_iter()
        .map(|m| m.text.as_str().to_owned())
        .collect();
    assert_eq!(texts, vec![LEFT_ROOM_TEXT.to_owned(), "still here".to_owned()]);
}
