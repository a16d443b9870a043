//! Notification router tests against a full app state

use crate::common::TestApp;
use pretty_assertions::assert_eq;
use teamspace::shared::notification::{NotificationPayload, NotificationScope};
use teamspace::shared::project::MemberRole;
use teamspace::shared::LiveEvent;
use uuid::Uuid;

#[tokio::test]
async fn test_history_covers_joined_projects_only() {
    let app = TestApp::new();
    let alice = app.user("Alice").await;
    let bob = app.user("Bob").await;
    let carol = app.user("Carol").await;
    let project = app.project(&alice, "Apollo").await;
    app.add_member(&project, &alice, &bob, MemberRole::Write).await;
    app.state
        .membership
        .invite(project.id, &alice, &carol.email, None)
        .await
        .unwrap();

    // bob's join produced a PROJECT notification; alice as a joined member sees it
    let alice_history = app.state.router.list_for_user(alice.id, 50).await.unwrap();
    assert!(alice_history
        .iter()
        .any(|n| n.scope == NotificationScope::Project(project.id) && n.payload.message == "Bob has now joined"));

    // carol is still pending: only her own invitation
    let carol_history = app.state.router.list_for_user(carol.id, 50).await.unwrap();
    assert_eq!(carol_history.len(), 1);
    assert_eq!(carol_history[0].scope, NotificationScope::User(carol.id));
}

#[tokio::test]
async fn test_history_is_newest_first_and_limited() {
    let app = TestApp::new();
    let alice = app.user("Alice").await;
    for i in 0..5 {
        app.state
            .router
            .notify_user(
                alice.id,
                LiveEvent::NewNotification,
                NotificationPayload::informational(format!("n{}", i)),
            )
            .await
            .unwrap();
    }

    let history = app.state.router.list_for_user(alice.id, 3).await.unwrap();
    let messages: Vec<_> = history.iter().map(|n| n.payload.message.as_str()).collect();
    assert_eq!(messages, vec!["n4", "n3", "n2"]);
}

#[tokio::test]
async fn test_fan_out_reports_every_recipient() {
    let app = TestApp::new();
    let alice = app.user("Alice").await;
    let mut online = app.connect(&alice, &[]);
    let offline = Uuid::new_v4();

    let outcomes = app
        .state
        .router
        .notify_users(&[alice.id, offline], LiveEvent::NewNotification, |user| {
            NotificationPayload::informational(format!("hello {}", user))
        })
        .await;

    assert_eq!(outcomes.len(), 2);
    assert!(outcomes.iter().all(|o| o.delivered));
    let events = online.drain();
    assert_eq!(events.len(), 1);
    assert_eq!(events[0].event, LiveEvent::NewNotification);
}

#[tokio::test]
async fn test_closed_connection_does_not_fail_delivery() {
    let app = TestApp::new();
    let alice = app.user("Alice").await;
    let client = app.connect(&alice, &[]);
    drop(client.rx);

    let notification = app
        .state
        .router
        .notify_user(alice.id, LiveEvent::NewNotification, NotificationPayload::informational("still here"))
        .await
        .unwrap();
    assert_eq!(notification.scope, NotificationScope::User(alice.id));
    assert_eq!(app.state.directory.prune_closed(), 1);
    assert!(!app.state.directory.is_online(alice.id));
}
