/**
 * Application State Management
 *
 * `AppState` is the central state container shared by every handler. It is
 * assembled once at startup from the config, the document store and the
 * mailer; everything else (directory, router, registry, services) is derived
 * from those three.
 *
 * # Thread Safety
 *
 * Every field is either an `Arc` or a service that only holds `Arc`s, so
 * cloning the state per request is cheap and all clones share one directory,
 * one session registry and one project cache.
 *
 * The `FromRef` implementations let handlers extract just the service they
 * need with `State(service)`.
 */

use std::sync::Arc;

use axum::extract::FromRef;

use crate::backend::chat::ChatService;
use crate::backend::collab::SessionRegistry;
use crate::backend::mail::Mailer;
use crate::backend::membership::MembershipService;
use crate::backend::projects::{ProjectCache, ProjectService};
use crate::backend::realtime::{ConnectionDirectory, NotificationRouter};
use crate::backend::store::DocumentStore;
use crate::backend::tasks::{TaskKeyAllocator, TaskService};
use crate::shared::AppConfig;

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    /// Durable documents (users, projects, notifications, chat, tasks, counters)
    pub store: Arc<dyn DocumentStore>,
    /// Live connections and project rooms, one per process
    pub directory: Arc<ConnectionDirectory>,
    pub router: NotificationRouter,
    /// In-memory collab rosters
    pub sessions: Arc<SessionRegistry>,
    pub projects: ProjectService,
    pub membership: MembershipService,
    pub chat: ChatService,
    pub tasks: TaskService,
}

impl AppState {
    pub fn new(config: AppConfig, store: Arc<dyn DocumentStore>, mailer: Arc<dyn Mailer>) -> Self {
        let config = Arc::new(config);
        let directory = Arc::new(ConnectionDirectory::new());
        let router = NotificationRouter::new(directory.clone(), store.clone());
        let cache = ProjectCache::new(store.clone());

        let projects = ProjectService::new(store.clone(), cache.clone(), directory.clone());
        let membership = MembershipService::new(store.clone(), router.clone(), mailer, config.clone());
        let chat = ChatService::new(store.clone(), router.clone(), cache, config.clone());
        let allocator = TaskKeyAllocator::new(store.clone(), config.clone());
        let tasks = TaskService::new(store.clone(), allocator);
        let sessions = Arc::new(SessionRegistry::new(router.clone()));

        Self {
            config,
            store,
            directory,
            router,
            sessions,
            projects,
            membership,
            chat,
            tasks,
        }
    }
}

impl FromRef<AppState> for ProjectService {
    fn from_ref(app_state: &AppState) -> Self {
        app_state.projects.clone()
    }
}

impl FromRef<AppState> for MembershipService {
    fn from_ref(app_state: &AppState) -> Self {
        app_state.membership.clone()
    }
}

impl FromRef<AppState> for ChatService {
    fn from_ref(app_state: &AppState) -> Self {
        app_state.chat.clone()
    }
}

impl FromRef<AppState> for TaskService {
    fn from_ref(app_state: &AppState) -> Self {
        app_state.tasks.clone()
    }
}

impl FromRef<AppState> for NotificationRouter {
    fn from_ref(app_state: &AppState) -> Self {
        app_state.router.clone()
    }
}

impl FromRef<AppState> for Arc<ConnectionDirectory> {
    fn from_ref(app_state: &AppState) -> Self {
        app_state.directory.clone()
    }
}
