//! Task key allocation and task CRUD tests

use std::collections::HashSet;

use assert_matches::assert_matches;
use crate::common::TestApp;
use pretty_assertions::assert_eq;
use teamspace::backend::error::BackendError;
use teamspace::shared::project::MemberRole;
use teamspace::shared::task::{NewTask, TaskStatus, TaskType, TaskUpdate};

fn main_task(title: &str) -> NewTask {
    NewTask {
        title: title.to_string(),
        ..Default::default()
    }
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_main_tasks_get_distinct_gapless_keys() {
    let app = TestApp::new();
    let alice = app.user("Alice").await;
    let project = app.project(&alice, "Apollo").await;

    let mut handles = Vec::new();
    for i in 0..32 {
        let tasks = app.state.tasks.clone();
        let alice = alice.clone();
        handles.push(tokio::spawn(async move {
            tasks.add_task(project.id, &alice, main_task(&format!("task {}", i))).await
        }));
    }

    let mut keys = HashSet::new();
    for handle in handles {
        let task = handle.await.unwrap().unwrap();
        keys.insert(task.task_key.unwrap());
    }
    let expected: HashSet<String> = (1..=32).map(|n| format!("{}-{}", project.key, n)).collect();
    assert_eq!(keys, expected);
}

#[tokio::test]
async fn test_sub_tasks_consume_no_key() {
    let app = TestApp::new();
    let alice = app.user("Alice").await;
    let project = app.project(&alice, "Apollo").await;
    let tasks = &app.state.tasks;

    let parent = tasks.add_task(project.id, &alice, main_task("parent")).await.unwrap();
    let sub = tasks
        .add_task(
            project.id,
            &alice,
            NewTask {
                title: "child".to_string(),
                task_type: TaskType::SubTask,
                parent: Some(parent.id),
                ..Default::default()
            },
        )
        .await
        .unwrap();
    let next = tasks.add_task(project.id, &alice, main_task("next")).await.unwrap();

    assert_eq!(parent.task_key, Some(format!("{}-1", project.key)));
    assert_eq!(sub.task_key, None);
    assert_eq!(sub.parent, Some(parent.id));
    assert_eq!(next.task_key, Some(format!("{}-2", project.key)));
}

#[tokio::test]
async fn test_sub_task_parent_rules() {
    let app = TestApp::new();
    let alice = app.user("Alice").await;
    let project = app.project(&alice, "Apollo").await;
    let other = app.project(&alice, "Zephyr").await;
    let tasks = &app.state.tasks;

    let parent = tasks.add_task(project.id, &alice, main_task("parent")).await.unwrap();
    let sub = |parent| NewTask {
        title: "child".to_string(),
        task_type: TaskType::SubTask,
        parent,
        ..Default::default()
    };

    assert_matches!(
        tasks.add_task(project.id, &alice, sub(None)).await,
        Err(BackendError::Validation(_))
    );
    assert_matches!(
        tasks.add_task(project.id, &alice, sub(Some(uuid::Uuid::new_v4()))).await,
        Err(BackendError::NotFound { .. })
    );
    // parents never cross projects
    assert_matches!(
        tasks.add_task(other.id, &alice, sub(Some(parent.id))).await,
        Err(BackendError::NotFound { .. })
    );

    let child = tasks.add_task(project.id, &alice, sub(Some(parent.id))).await.unwrap();
    assert_matches!(
        tasks.add_task(project.id, &alice, sub(Some(child.id))).await,
        Err(BackendError::Validation(_))
    );
}

#[tokio::test]
async fn test_per_project_counters_are_independent() {
    let app = TestApp::new();
    let alice = app.user("Alice").await;
    let first = app.project(&alice, "Apollo").await;
    let second = app.project(&alice, "Zephyr").await;
    let tasks = &app.state.tasks;

    tasks.add_task(first.id, &alice, main_task("a")).await.unwrap();
    tasks.add_task(first.id, &alice, main_task("b")).await.unwrap();
    let task = tasks.add_task(second.id, &alice, main_task("c")).await.unwrap();
    assert_eq!(task.task_key, Some(format!("{}-1", second.key)));
}

#[tokio::test]
async fn test_task_permissions() {
    let app = TestApp::new();
    let alice = app.user("Alice").await;
    let reader = app.user("Rita").await;
    let outsider = app.user("Oscar").await;
    let project = app.project(&alice, "Apollo").await;
    app.add_member(&project, &alice, &reader, MemberRole::Read).await;
    let tasks = &app.state.tasks;

    let task = tasks.add_task(project.id, &alice, main_task("a")).await.unwrap();
    let key = task.task_key.clone().unwrap();

    assert_matches!(
        tasks.add_task(project.id, &reader, main_task("b")).await,
        Err(BackendError::Forbidden { .. })
    );
    assert_matches!(
        tasks.update_task(project.id, &reader, &key, TaskUpdate::default()).await,
        Err(BackendError::Forbidden { .. })
    );
    assert_eq!(tasks.get_task(project.id, &reader, &key).await.unwrap().id, task.id);
    assert_matches!(
        tasks.list_tasks(project.id, &outsider).await,
        Err(BackendError::Forbidden { .. })
    );
}

#[tokio::test]
async fn test_get_and_update_by_key_or_id() {
    let app = TestApp::new();
    let alice = app.user("Alice").await;
    let project = app.project(&alice, "Apollo").await;
    let tasks = &app.state.tasks;

    let task = tasks.add_task(project.id, &alice, main_task("write docs")).await.unwrap();
    let key = task.task_key.clone().unwrap();

    let by_key = tasks.get_task(project.id, &alice, &key.to_lowercase()).await.unwrap();
    let by_id = tasks.get_task(project.id, &alice, &task.id.to_string()).await.unwrap();
    assert_eq!(by_key.id, task.id);
    assert_eq!(by_id.id, task.id);

    let updated = tasks
        .update_task(
            project.id,
            &alice,
            &key,
            TaskUpdate {
                status: Some(TaskStatus::Done),
                ..Default::default()
            },
        )
        .await
        .unwrap();
    assert_eq!(updated.status, TaskStatus::Done);
    assert_eq!(updated.title, "write docs");
    assert_eq!(updated.task_key, task.task_key);

    assert_matches!(
        tasks.get_task(project.id, &alice, "NOPE-99").await,
        Err(BackendError::NotFound { .. })
    );
    assert_eq!(tasks.list_tasks(project.id, &alice).await.unwrap().len(), 1);
}

#[tokio::test]
async fn test_assignee_must_be_member() {
    let app = TestApp::new();
    let alice = app.user("Alice").await;
    let outsider = app.user("Oscar").await;
    let project = app.project(&alice, "Apollo").await;

    let result = app
        .state
        .tasks
        .add_task(
            project.id,
            &alice,
            NewTask {
                title: "a".to_string(),
                assignee: Some(outsider.id),
                ..Default::default()
            },
        )
        .await;
    assert_matches!(result, Err(BackendError::Validation(_)));
}
