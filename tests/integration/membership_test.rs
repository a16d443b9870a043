//! Membership and invitation workflow tests

use assert_matches::assert_matches;
use crate::common::TestApp;
use pretty_assertions::assert_eq;
use teamspace::backend::error::BackendError;
use teamspace::backend::membership::InvitationAction;
use teamspace::shared::notification::{Notification, NotificationScope};
use teamspace::shared::project::{MemberRole, MemberStatus};
use teamspace::shared::LiveEvent;

#[tokio::test]
async fn test_invite_creates_pending_entry_and_notifies() {
    let app = TestApp::new();
    let alice = app.user("Alice").await;
    let bob = app.user("Bob").await;
    let project = app.project(&alice, "Apollo").await;
    let mut bob_client = app.connect(&bob, &[]);

    let member = app
        .state
        .membership
        .invite(project.id, &alice, "BOB@example.com", Some(MemberRole::Write))
        .await
        .unwrap();
    assert_eq!(member.status, MemberStatus::Pending);
    assert_eq!(member.role, MemberRole::Write);

    let stored = app.reload(project.id).await;
    assert_eq!(stored.member(bob.id).map(|m| m.status), Some(MemberStatus::Pending));

    let emails = app.mailer.sent();
    assert_eq!(emails.len(), 1);
    assert_eq!(emails[0].to, "bob@example.com");
    assert_eq!(emails[0].subject, "Alice invited you to Apollo");

    let events = bob_client.drain();
    assert_eq!(events.len(), 1);
    assert_eq!(events[0].event, LiveEvent::NewNotification);
    let notification: Notification = serde_json::from_value(events[0].payload.clone()).unwrap();
    assert_eq!(notification.scope, NotificationScope::User(bob.id));
    assert!(notification.payload.is_actionable);
    assert_eq!(
        notification.payload.redirect_url.as_deref(),
        Some(format!("/Alice/{}/invitations", project.id).as_str())
    );
    assert_eq!(notification.payload.action_title.as_deref(), Some("Apollo - WRITE"));

    let history = app.state.router.list_for_user(bob.id, 10).await.unwrap();
    assert_eq!(history.len(), 1);
    assert_eq!(history[0].id, notification.id);
}

#[tokio::test]
async fn test_invitation_link_encodes_inviter_name() {
    let app = TestApp::new();
    let inviter = app.user("Mary Ann/Ops").await;
    let bob = app.user("Bob").await;
    let project = app.project(&inviter, "Apollo").await;

    app.state
        .membership
        .invite(project.id, &inviter, &bob.email, None)
        .await
        .unwrap();

    let expected = format!("/Mary%20Ann%2FOps/{}/invitations", project.id);
    let history = app.state.router.list_for_user(bob.id, 10).await.unwrap();
    assert_eq!(history[0].payload.redirect_url.as_deref(), Some(expected.as_str()));
    assert!(app.mailer.sent()[0].html.contains(&expected));
}

#[tokio::test]
async fn test_invite_offline_user_still_records_notification() {
    let app = TestApp::new();
    let alice = app.user("Alice").await;
    let bob = app.user("Bob").await;
    let project = app.project(&alice, "Apollo").await;

    app.state
        .membership
        .invite(project.id, &alice, &bob.email, None)
        .await
        .unwrap();

    let history = app.state.router.list_for_user(bob.id, 10).await.unwrap();
    assert_eq!(history.len(), 1);
    assert_eq!(app.reload(project.id).await.member(bob.id).map(|m| m.role), Some(MemberRole::Read));
}

#[tokio::test]
async fn test_invite_rejections() {
    let app = TestApp::new();
    let alice = app.user("Alice").await;
    let bob = app.user("Bob").await;
    let carol = app.user("Carol").await;
    let project = app.project(&alice, "Apollo").await;
    let membership = &app.state.membership;

    assert_matches!(
        membership.invite(project.id, &alice, "nobody@example.com", None).await,
        Err(BackendError::NotFound { .. })
    );
    assert_matches!(
        membership.invite(project.id, &alice, "   ", None).await,
        Err(BackendError::Validation(_))
    );
    assert_matches!(
        membership.invite(uuid::Uuid::new_v4(), &alice, &bob.email, None).await,
        Err(BackendError::NotFound { .. })
    );

    membership.invite(project.id, &alice, &bob.email, None).await.unwrap();
    assert_matches!(
        membership.invite(project.id, &alice, &bob.email, None).await,
        Err(BackendError::Conflict { .. })
    );

    // a pending invitee cannot invite anyone
    assert_matches!(
        membership.invite(project.id, &bob, &carol.email, None).await,
        Err(BackendError::Forbidden { .. })
    );
}

#[tokio::test]
async fn test_write_member_cannot_invite() {
    let app = TestApp::new();
    let alice = app.user("Alice").await;
    let bob = app.user("Bob").await;
    let carol = app.user("Carol").await;
    let project = app.project(&alice, "Apollo").await;
    app.add_member(&project, &alice, &bob, MemberRole::Write).await;

    assert_matches!(
        app.state.membership.invite(project.id, &bob, &carol.email, None).await,
        Err(BackendError::Forbidden { .. })
    );
}

#[tokio::test]
async fn test_email_failure_surfaces_after_write() {
    let app = TestApp::with_failing_mailer();
    let alice = app.user("Alice").await;
    let bob = app.user("Bob").await;
    let project = app.project(&alice, "Apollo").await;

    let result = app
        .state
        .membership
        .invite(project.id, &alice, &bob.email, None)
        .await;
    assert_matches!(result, Err(BackendError::Transport { .. }));

    // the durable write already happened, the notification did not
    let stored = app.reload(project.id).await;
    assert_eq!(stored.member(bob.id).map(|m| m.status), Some(MemberStatus::Pending));
    assert!(app.state.router.list_for_user(bob.id, 10).await.unwrap().is_empty());
}

#[tokio::test]
async fn test_respond_joined_notifies_room_except_joiner() {
    let app = TestApp::new();
    let alice = app.user("Alice").await;
    let bob = app.user("Bob").await;
    let project = app.project(&alice, "Apollo").await;
    let mut alice_client = app.connect(&alice, &[project.id]);

    app.state
        .membership
        .invite(project.id, &alice, &bob.email, None)
        .await
        .unwrap();
    let mut bob_client = app.connect(&bob, &[]);

    let member = app
        .state
        .membership
        .respond(project.id, &bob, InvitationAction::Joined)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(member.status, MemberStatus::Joined);

    let alice_events = alice_client.drain();
    assert_eq!(alice_events.len(), 1);
    let notification: Notification = serde_json::from_value(alice_events[0].payload.clone()).unwrap();
    assert_eq!(notification.scope, NotificationScope::Project(project.id));
    assert_eq!(notification.payload.message, "Bob has now joined");

    assert!(bob_client.drain().is_empty());

    // the joiner's open connection now sits in the project room
    let room: Vec<_> = app
        .state
        .directory
        .room_connections(project.id)
        .into_iter()
        .map(|h| h.id)
        .collect();
    assert!(room.contains(&bob_client.handle.id));
}

#[tokio::test]
async fn test_respond_exactly_once() {
    let app = TestApp::new();
    let alice = app.user("Alice").await;
    let bob = app.user("Bob").await;
    let project = app.project(&alice, "Apollo").await;
    let membership = &app.state.membership;

    assert_matches!(
        membership.respond(project.id, &bob, InvitationAction::Joined).await,
        Err(BackendError::Forbidden { .. })
    );

    membership.invite(project.id, &alice, &bob.email, None).await.unwrap();
    membership
        .respond(project.id, &bob, InvitationAction::Joined)
        .await
        .unwrap();
    assert_matches!(
        membership.respond(project.id, &bob, InvitationAction::Joined).await,
        Err(BackendError::Conflict { .. })
    );
    assert_matches!(
        membership.respond(project.id, &bob, InvitationAction::Declined).await,
        Err(BackendError::Conflict { .. })
    );
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_responses_one_winner() {
    let app = TestApp::new();
    let alice = app.user("Alice").await;
    let bob = app.user("Bob").await;
    let project = app.project(&alice, "Apollo").await;
    app.state
        .membership
        .invite(project.id, &alice, &bob.email, None)
        .await
        .unwrap();

    let mut handles = Vec::new();
    for i in 0..16 {
        let membership = app.state.membership.clone();
        let bob = bob.clone();
        let action = if i % 2 == 0 {
            InvitationAction::Joined
        } else {
            InvitationAction::Declined
        };
        handles.push(tokio::spawn(async move {
            membership.respond(project.id, &bob, action).await
        }));
    }

    let mut wins = 0;
    for handle in handles {
        match handle.await.unwrap() {
            Ok(_) => wins += 1,
            Err(BackendError::Conflict { .. }) | Err(BackendError::Forbidden { .. }) => {}
            Err(other) => panic!("unexpected error: {:?}", other),
        }
    }
    assert_eq!(wins, 1);
}

#[tokio::test]
async fn test_decline_removes_entry_and_allows_reinvite() {
    let app = TestApp::new();
    let alice = app.user("Alice").await;
    let bob = app.user("Bob").await;
    let project = app.project(&alice, "Apollo").await;
    let membership = &app.state.membership;

    membership.invite(project.id, &alice, &bob.email, None).await.unwrap();
    let outcome = membership
        .respond(project.id, &bob, InvitationAction::Declined)
        .await
        .unwrap();
    assert!(outcome.is_none());
    assert!(app.reload(project.id).await.member(bob.id).is_none());

    membership.invite(project.id, &alice, &bob.email, None).await.unwrap();
    assert_eq!(
        app.reload(project.id).await.member(bob.id).map(|m| m.status),
        Some(MemberStatus::Pending)
    );
}

#[tokio::test]
async fn test_change_role_announces_to_room() {
    let app = TestApp::new();
    let alice = app.user("Alice").await;
    let bob = app.user("Bob").await;
    let project = app.project(&alice, "Apollo").await;
    app.add_member(&project, &alice, &bob, MemberRole::Read).await;
    let mut alice_client = app.connect(&alice, &[project.id]);
    let mut bob_client = app.connect(&bob, &[project.id]);

    let member = app
        .state
        .membership
        .change_role(project.id, &alice, bob.id, MemberRole::Admin)
        .await
        .unwrap();
    assert_eq!(member.role, MemberRole::Admin);

    assert!(alice_client.drain().is_empty());
    let events = bob_client.drain();
    assert_eq!(events.len(), 1);
    let notification: Notification = serde_json::from_value(events[0].payload.clone()).unwrap();
    assert_eq!(notification.payload.message, "Bob now has ADMIN access.");
}

#[tokio::test]
async fn test_ownerless_transitions_rejected() {
    let app = TestApp::new();
    let alice = app.user("Alice").await;
    let bob = app.user("Bob").await;
    let project = app.project(&alice, "Apollo").await;
    app.add_member(&project, &alice, &bob, MemberRole::Admin).await;
    let membership = &app.state.membership;

    assert_matches!(
        membership.change_role(project.id, &alice, alice.id, MemberRole::Admin).await,
        Err(BackendError::Conflict { .. })
    );
    assert_matches!(
        membership.remove(project.id, &alice, alice.id).await,
        Err(BackendError::Conflict { .. })
    );
    assert_matches!(
        membership.remove(project.id, &bob, alice.id).await,
        Err(BackendError::Conflict { .. })
    );

    // the rejected mutations left the document untouched
    let stored = app.reload(project.id).await;
    assert_eq!(stored.member(alice.id).map(|m| m.role), Some(MemberRole::Owner));

    // handing ownership over first makes the same change legal
    membership
        .change_role(project.id, &alice, bob.id, MemberRole::Owner)
        .await
        .unwrap();
    membership
        .change_role(project.id, &alice, alice.id, MemberRole::Write)
        .await
        .unwrap();
}

#[tokio::test]
async fn test_remove_and_leave() {
    let app = TestApp::new();
    let alice = app.user("Alice").await;
    let bob = app.user("Bob").await;
    let carol = app.user("Carol").await;
    let project = app.project(&alice, "Apollo").await;
    app.add_member(&project, &alice, &bob, MemberRole::Write).await;
    app.add_member(&project, &alice, &carol, MemberRole::Write).await;
    let bob_client = app.connect(&bob, &[project.id]);
    let membership = &app.state.membership;

    assert_matches!(
        membership.remove(project.id, &bob, carol.id).await,
        Err(BackendError::Forbidden { .. })
    );
    assert_matches!(
        membership.remove(project.id, &alice, uuid::Uuid::new_v4()).await,
        Err(BackendError::NotFound { .. })
    );

    // carol leaves on her own
    membership.remove(project.id, &carol, carol.id).await.unwrap();
    let removed = membership.remove(project.id, &alice, bob.id).await.unwrap();
    assert_eq!(removed.user, bob.id);

    let stored = app.reload(project.id).await;
    assert_eq!(stored.members.len(), 1);
    assert!(app
        .state
        .directory
        .room_connections(project.id)
        .iter()
        .all(|h| h.id != bob_client.handle.id));
}

#[tokio::test]
async fn test_invitation_preview_and_member_list() {
    let app = TestApp::new();
    let alice = app.user("Alice").await;
    let bob = app.user("Bob").await;
    let carol = app.user("Carol").await;
    let project = app.project(&alice, "Apollo").await;
    app.add_member(&project, &alice, &bob, MemberRole::Write).await;
    let membership = &app.state.membership;

    membership
        .invite(project.id, &alice, &carol.email, Some(MemberRole::Admin))
        .await
        .unwrap();
    let preview = membership.invitation_details(project.id, &carol).await.unwrap();
    assert_eq!(preview.role, MemberRole::Admin);
    assert_eq!(preview.project.name, "Apollo");
    let mut names: Vec<_> = preview.members.iter().map(|p| p.display_name.clone()).collect();
    names.sort();
    assert_eq!(names, vec!["Alice".to_string(), "Bob".to_string()]);

    assert_matches!(
        membership.invitation_details(project.id, &bob).await,
        Err(BackendError::NotFound { .. })
    );

    let all = membership.list_members(project.id, &bob, None).await.unwrap();
    assert_eq!(all.len(), 3);
    let hits = membership.list_members(project.id, &bob, Some("car")).await.unwrap();
    assert_eq!(hits.len(), 1);
    assert_eq!(hits[0].status, MemberStatus::Pending);
    assert_matches!(
        membership.list_members(project.id, &carol, None).await,
        Err(BackendError::Forbidden { .. })
    );
}
