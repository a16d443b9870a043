//! Project chat and direct-thread tests

use std::collections::HashSet;

use assert_matches::assert_matches;
use crate::common::TestApp;
use pretty_assertions::assert_eq;
use teamspace::backend::error::BackendError;
use teamspace::backend::projects::service::ProjectUpdate;
use teamspace::backend::store::DocumentStore;
use teamspace::shared::messaging::{MessageBody, MessageKind, PageQuery};
use teamspace::shared::project::MemberRole;
use teamspace::shared::LiveEvent;

struct Team {
    app: TestApp,
    alice: teamspace::shared::Caller,
    bob: teamspace::shared::Caller,
    carol: teamspace::shared::Caller,
    project: teamspace::shared::Project,
}

async fn team() -> Team {
    let app = TestApp::new();
    let alice = app.user("Alice").await;
    let bob = app.user("Bob").await;
    let carol = app.user("Carol").await;
    let project = app.project(&alice, "Apollo").await;
    app.add_member(&project, &alice, &bob, MemberRole::Write).await;
    app.add_member(&project, &alice, &carol, MemberRole::Read).await;
    Team {
        app,
        alice,
        bob,
        carol,
        project,
    }
}

#[tokio::test]
async fn test_resolve_thread_is_idempotent_and_order_independent() {
    let t = team().await;
    let chat = &t.app.state.chat;

    let first = chat
        .resolve_or_create_thread(t.project.id, &t.alice, vec![t.bob.id, t.carol.id])
        .await
        .unwrap();
    assert!(first.created);

    let again = chat
        .resolve_or_create_thread(t.project.id, &t.alice, vec![t.carol.id, t.bob.id, t.bob.id])
        .await
        .unwrap();
    assert!(!again.created);
    assert_eq!(again.thread.id, first.thread.id);

    let from_carol = chat
        .resolve_or_create_thread(t.project.id, &t.carol, vec![t.alice.id, t.bob.id])
        .await
        .unwrap();
    assert_eq!(from_carol.thread.id, first.thread.id);

    // a different member set is a different thread
    let pair = chat
        .resolve_or_create_thread(t.project.id, &t.alice, vec![t.bob.id])
        .await
        .unwrap();
    assert!(pair.created);
    assert_ne!(pair.thread.id, first.thread.id);
    assert_eq!(t.app.store.thread_count(), 2);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_resolve_creates_one_thread() {
    let t = team().await;

    let mut handles = Vec::new();
    for i in 0..16 {
        let chat = t.app.state.chat.clone();
        let project = t.project.id;
        let (sender, receiver) = if i % 2 == 0 {
            (t.alice.clone(), t.bob.id)
        } else {
            (t.bob.clone(), t.alice.id)
        };
        handles.push(tokio::spawn(async move {
            chat.resolve_or_create_thread(project, &sender, vec![receiver]).await
        }));
    }

    let mut ids = HashSet::new();
    let mut created = 0;
    for handle in handles {
        let resolved = handle.await.unwrap().unwrap();
        ids.insert(resolved.thread.id);
        if resolved.created {
            created += 1;
        }
    }
    assert_eq!(ids.len(), 1);
    assert_eq!(created, 1);
    assert_eq!(t.app.store.thread_count(), 1);
}

#[tokio::test]
async fn test_resolve_thread_rejections() {
    let t = team().await;
    let outsider = t.app.user("Dave").await;
    let chat = &t.app.state.chat;

    assert_matches!(
        chat.resolve_or_create_thread(t.project.id, &t.alice, vec![]).await,
        Err(BackendError::Validation(_))
    );
    assert_matches!(
        chat.resolve_or_create_thread(t.project.id, &t.alice, vec![t.alice.id]).await,
        Err(BackendError::Validation(_))
    );
    assert_matches!(
        chat.resolve_or_create_thread(t.project.id, &t.alice, vec![outsider.id]).await,
        Err(BackendError::Validation(_))
    );
    assert_matches!(
        chat.resolve_or_create_thread(t.project.id, &outsider, vec![t.alice.id]).await,
        Err(BackendError::Forbidden { .. })
    );
}

#[tokio::test]
async fn test_post_message_pushes_to_receivers_only() {
    let t = team().await;
    let chat = &t.app.state.chat;
    let thread = chat
        .resolve_or_create_thread(t.project.id, &t.alice, vec![t.bob.id])
        .await
        .unwrap()
        .thread;
    let mut alice_client = t.app.connect(&t.alice, &[]);
    let mut bob_phone = t.app.connect(&t.bob, &[]);
    let mut bob_laptop = t.app.connect(&t.bob, &[]);
    let mut carol_client = t.app.connect(&t.carol, &[]);

    let message = chat
        .post_message(t.project.id, thread.id, &t.alice, None, MessageBody::text("hi bob").unwrap())
        .await
        .unwrap();
    assert_eq!(message.receiver, vec![t.bob.id]);
    assert_eq!(message.chat_id, Some(thread.id));

    for client in [&mut bob_phone, &mut bob_laptop] {
        let events = client.drain();
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].event, LiveEvent::PersonalChat);
        assert_eq!(events[0].payload["message"]["message"], "hi bob");
        assert_eq!(events[0].payload["sender"]["display_name"], "Alice");
        assert_eq!(events[0].payload["project"]["key"], t.project.key.as_str());
    }
    assert!(alice_client.drain().is_empty());
    assert!(carol_client.drain().is_empty());

    let stored = t.app.store.get_thread(thread.id).await.unwrap().unwrap();
    assert_eq!(stored.last_message, Some(message.id));
    // nothing from a live-only push lands in notification history
    assert!(t.app.state.router.list_for_user(t.bob.id, 10).await.unwrap().iter().all(|n| {
        !n.payload.message.contains("hi bob")
    }));
}

#[tokio::test]
async fn test_post_message_rejections() {
    let t = team().await;
    let chat = &t.app.state.chat;
    let thread = chat
        .resolve_or_create_thread(t.project.id, &t.alice, vec![t.bob.id])
        .await
        .unwrap()
        .thread;

    assert_matches!(
        chat.post_message(t.project.id, thread.id, &t.carol, None, MessageBody::text("hey").unwrap())
            .await,
        Err(BackendError::Forbidden { .. })
    );
    assert_matches!(
        chat.post_message(
            t.project.id,
            thread.id,
            &t.alice,
            Some(vec![t.carol.id]),
            MessageBody::text("hey").unwrap()
        )
        .await,
        Err(BackendError::Validation(_))
    );
    assert_matches!(
        chat.post_message(t.project.id, uuid::Uuid::new_v4(), &t.alice, None, MessageBody::text("hey").unwrap())
            .await,
        Err(BackendError::NotFound { .. })
    );

    assert!(MessageBody::text("   ").is_err());
    assert!(MessageBody::new(MessageKind::Image, None, vec![]).is_err());
}

#[tokio::test]
async fn test_thread_history_and_read_receipts() {
    let t = team().await;
    let chat = &t.app.state.chat;
    let thread = chat
        .resolve_or_create_thread(t.project.id, &t.alice, vec![t.bob.id])
        .await
        .unwrap()
        .thread;

    for text in ["one", "two", "three"] {
        chat.post_message(t.project.id, thread.id, &t.alice, None, MessageBody::text(text).unwrap())
            .await
            .unwrap();
    }
    let history = chat
        .list_thread_messages(t.project.id, thread.id, &t.bob)
        .await
        .unwrap();
    let texts: Vec<_> = history.iter().filter_map(|m| m.message.clone()).collect();
    assert_eq!(texts, vec!["one", "two", "three"]);

    assert_matches!(
        chat.list_thread_messages(t.project.id, thread.id, &t.carol).await,
        Err(BackendError::Forbidden { .. })
    );

    let read = chat.mark_read(history[0].id, &t.bob).await.unwrap();
    assert!(read.read_by.contains(&t.bob.id));
    assert_matches!(
        chat.mark_read(history[0].id, &t.carol).await,
        Err(BackendError::Forbidden { .. })
    );

    let threads = chat.list_threads(t.project.id, &t.bob).await.unwrap();
    assert_eq!(threads.len(), 1);
    assert!(chat.list_threads(t.project.id, &t.carol).await.unwrap().is_empty());
}

#[tokio::test]
async fn test_project_messages_newest_first_with_paging() {
    let t = team().await;
    let chat = &t.app.state.chat;

    for i in 0..5 {
        chat.post_project_message(t.project.id, &t.bob, MessageBody::text(format!("m{}", i)).unwrap())
            .await
            .unwrap();
    }

    let page = |limit, skip| PageQuery {
        limit: Some(limit),
        skip: Some(skip),
    };
    let first = chat
        .list_project_messages(t.project.id, &t.carol, page(2, 0))
        .await
        .unwrap();
    let second = chat
        .list_project_messages(t.project.id, &t.carol, page(2, 2))
        .await
        .unwrap();
    let texts = |list: &[teamspace::shared::messaging::ChatMessage]| -> Vec<String> {
        list.iter().filter_map(|m| m.message.clone()).collect()
    };
    assert_eq!(texts(&first), vec!["m4", "m3"]);
    assert_eq!(texts(&second), vec!["m2", "m1"]);

    let all = chat
        .list_project_messages(t.project.id, &t.carol, PageQuery::default())
        .await
        .unwrap();
    assert_eq!(all.len(), 5);
}

#[tokio::test]
async fn test_project_page_size_is_clamped() {
    let config = teamspace::shared::AppConfig::builder()
        .jwt_secret(crate::common::JWT_SECRET)
        .chat_page_max(3)
        .build()
        .unwrap();
    let app = TestApp::with_config(config);
    let alice = app.user("Alice").await;
    let project = app.project(&alice, "Apollo").await;

    for i in 0..5 {
        app.state
            .chat
            .post_project_message(project.id, &alice, MessageBody::text(format!("m{}", i)).unwrap())
            .await
            .unwrap();
    }
    let list = app
        .state
        .chat
        .list_project_messages(
            project.id,
            &alice,
            PageQuery {
                limit: Some(1000),
                skip: None,
            },
        )
        .await
        .unwrap();
    assert_eq!(list.len(), 3);
}

#[tokio::test]
async fn test_project_message_broadcast_skips_sender() {
    let t = team().await;
    let mut alice_client = t.app.connect(&t.alice, &[t.project.id]);
    let mut bob_client = t.app.connect(&t.bob, &[t.project.id]);

    t.app
        .state
        .chat
        .post_project_message(t.project.id, &t.alice, MessageBody::text("standup in 5").unwrap())
        .await
        .unwrap();

    assert!(alice_client.drain().is_empty());
    let events = bob_client.drain();
    assert_eq!(events.len(), 1);
    assert_eq!(events[0].event, LiveEvent::ChatMessage);
    assert_eq!(events[0].payload["message"]["message"], "standup in 5");
}

#[tokio::test]
async fn test_chat_disabled_project() {
    let t = team().await;
    t.app
        .state
        .projects
        .update(
            t.project.id,
            &t.alice,
            ProjectUpdate {
                chat_enabled: Some(false),
                ..Default::default()
            },
        )
        .await
        .unwrap();

    assert_matches!(
        t.app
            .state
            .chat
            .post_project_message(t.project.id, &t.bob, MessageBody::text("hello?").unwrap())
            .await,
        Err(BackendError::Forbidden { .. })
    );
    assert_matches!(
        t.app
            .state
            .chat
            .resolve_or_create_thread(t.project.id, &t.bob, vec![t.alice.id])
            .await,
        Err(BackendError::Forbidden { .. })
    );
}
