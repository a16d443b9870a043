//! Common test utilities
//!
//! - `TestApp` - an `AppState` over a fresh `MemoryStore`, with a recording mailer
//! - user, project and membership fixtures
//! - live connection helpers

#![allow(dead_code)]

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use teamspace::backend::auth::create_token;
use teamspace::backend::error::{BackendError, BackendResult};
use teamspace::backend::mail::{Mailer, OutboundEmail};
use teamspace::backend::membership::InvitationAction;
use teamspace::backend::projects::service::NewProject;
use teamspace::backend::realtime::ConnectionHandle;
use teamspace::backend::server::state::AppState;
use teamspace::backend::store::{DocumentStore, MemoryStore};
use teamspace::shared::project::{MemberRole, Project, ProjectType};
use teamspace::shared::{AppConfig, Caller, RealtimeEvent, User};
use tokio::sync::mpsc;
use uuid::Uuid;

pub const JWT_SECRET: &str = "test-secret";

/// Keeps every email it is asked to send
#[derive(Default)]
pub struct RecordingMailer {
    sent: Mutex<Vec<OutboundEmail>>,
}

impl RecordingMailer {
    pub fn sent(&self) -> Vec<OutboundEmail> {
        self.sent.lock().unwrap().clone()
    }
}

#[async_trait]
impl Mailer for RecordingMailer {
    async fn send(&self, email: OutboundEmail) -> BackendResult<()> {
        self.sent.lock().unwrap().push(email);
        Ok(())
    }
}

/// Always fails like an unreachable SMTP relay
pub struct FailingMailer;

#[async_trait]
impl Mailer for FailingMailer {
    async fn send(&self, _email: OutboundEmail) -> BackendResult<()> {
        Err(BackendError::transport("SMTP relay unreachable"))
    }
}

pub fn test_config() -> AppConfig {
    AppConfig::builder()
        .jwt_secret(JWT_SECRET)
        .build()
        .expect("test config is valid")
}

pub struct TestApp {
    pub state: AppState,
    pub store: Arc<MemoryStore>,
    pub mailer: Arc<RecordingMailer>,
}

impl TestApp {
    pub fn new() -> Self {
        Self::with_config(test_config())
    }

    pub fn with_config(config: AppConfig) -> Self {
        let store = Arc::new(MemoryStore::new());
        let mailer = Arc::new(RecordingMailer::default());
        let state = AppState::new(config, store.clone(), mailer.clone());
        Self { state, store, mailer }
    }

    /// Same wiring, but every invitation email fails
    pub fn with_failing_mailer() -> Self {
        let store = Arc::new(MemoryStore::new());
        let state = AppState::new(test_config(), store.clone(), Arc::new(FailingMailer));
        Self {
            state,
            store,
            mailer: Arc::new(RecordingMailer::default()),
        }
    }

    /// Insert a user whose email is `{name}@example.com`
    pub async fn user(&self, name: &str) -> Caller {
        let user = User::new(format!("{}@example.com", name.to_lowercase()), name);
        let user = self.store.insert_user(user).await.expect("insert user");
        Caller::from(&user)
    }

    pub async fn project(&self, owner: &Caller, name: &str) -> Project {
        self.state
            .projects
            .create(
                owner,
                NewProject {
                    name: name.to_string(),
                    description: None,
                    project_type: ProjectType::Shared,
                },
            )
            .await
            .expect("create project")
    }

    /// Invite `member` and accept on their behalf
    pub async fn add_member(&self, project: &Project, owner: &Caller, member: &Caller, role: MemberRole) {
        self.state
            .membership
            .invite(project.id, owner, &member.email, Some(role))
            .await
            .expect("invite");
        self.state
            .membership
            .respond(project.id, member, InvitationAction::Joined)
            .await
            .expect("respond");
    }

    pub async fn reload(&self, project_id: Uuid) -> Project {
        self.store
            .get_project(project_id)
            .await
            .expect("get project")
            .expect("project exists")
    }

    /// Open a live connection for `user` and join the given project rooms
    pub fn connect(&self, user: &Caller, rooms: &[Uuid]) -> TestClient {
        let (handle, rx) = self.state.directory.connect(user.id);
        for room in rooms {
            self.state.directory.join_room(*room, &handle);
        }
        TestClient { handle, rx }
    }

    pub fn token(&self, user: &Caller) -> String {
        let user = User {
            id: user.id,
            email: user.email.clone(),
            display_name: user.display_name.clone(),
            first_name: None,
            last_name: None,
            profile_picture: user.profile_picture.clone(),
        };
        create_token(JWT_SECRET, &user).expect("token")
    }
}

/// Receiving side of one live connection
pub struct TestClient {
    pub handle: ConnectionHandle,
    pub rx: mpsc::UnboundedReceiver<RealtimeEvent>,
}

impl TestClient {
    /// Everything delivered so far
    pub fn drain(&mut self) -> Vec<RealtimeEvent> {
        let mut events = Vec::new();
        while let Ok(event) = self.rx.try_recv() {
            events.push(event);
        }
        events
    }
}
