//! Domain service driving the store and the git collaborator.
//!
//! Every operation is one load -> validate -> mutate -> save unit; the
//! in-memory collection is never held across invocations.

use thiserror::Error;
use tracing::debug;
use ulid::Ulid;

use crate::branch::derive_branch_name;
use crate::git::{GitError, VersionControl};
use crate::store::{StoreError, TaskStore};
use crate::task::{now_rfc3339, Priority, Task, TaskStatus};

/// Title limit in Unicode code points, measured after trimming.
pub const MAX_TITLE_CHARS: usize = 200;

#[derive(Debug, Error)]
pub enum TaskError {
    #[error("invalid {field}: {reason}")]
    Validation { field: &'static str, reason: String },
    #[error("no task found with id {0}")]
    NotFound(String),
    #[error("cannot change task status from {from} to {to}")]
    InvalidTransition { from: TaskStatus, to: TaskStatus },
    #[error(transparent)]
    Store(#[from] StoreError),
    #[error("branch operation failed for task {task_id}: {source}")]
    Collaborator {
        task_id: String,
        #[source]
        source: GitError,
    },
}

#[derive(Debug, Clone, Default)]
pub struct NewTask {
    pub title: String,
    pub description: Option<String>,
    pub priority: Option<String>,
    pub due_date: Option<String>,
}

#[derive(Debug, Clone, Default)]
pub struct TaskPatch {
    pub title: Option<String>,
    pub description: Option<String>,
    pub priority: Option<String>,
    pub due_date: Option<String>,
    pub status: Option<String>,
}

impl TaskPatch {
    pub fn is_empty(&self) -> bool {
        self.title.is_none()
            && self.description.is_none()
            && self.priority.is_none()
            && self.due_date.is_none()
            && self.status.is_none()
    }
}

#[derive(Debug, Clone, Default)]
pub struct TaskFilter {
    pub status: Option<String>,
    pub priority: Option<String>,
}

/// Result of `start`. `NeedsConfirmation` is returned instead of touching
/// anything when the worktree is dirty and the caller has not confirmed;
/// the caller prompts and retries with the confirmation flag set.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StartOutcome {
    Started {
        task: Task,
        /// Branch HEAD pointed at before the switch, when one existed.
        previous_branch: Option<String>,
    },
    NeedsConfirmation,
}

pub struct LifecycleManager<S, V> {
    store: S,
    vcs: V,
}

impl<S: TaskStore, V: VersionControl> LifecycleManager<S, V> {
    pub fn new(store: S, vcs: V) -> Self {
        Self { store, vcs }
    }

    pub fn create(&self, input: NewTask) -> Result<Task, TaskError> {
        let title = validate_title(&input.title)?;
        let priority = parse_priority(input.priority.as_deref())?;
        let due_date = validate_due_date(input.due_date.as_deref())?;

        let mut collection = self.store.load()?;
        let mut id = Ulid::new().to_string();
        while collection.contains_id(&id) {
            id = Ulid::new().to_string();
        }
        let now = now_rfc3339();
        let task = Task {
            id,
            title,
            description: input.description,
            status: TaskStatus::Open,
            priority,
            due_date,
            branch: None,
            created_at: now.clone(),
            updated_at: now,
        };
        collection.tasks.push(task.clone());
        self.store.save(&collection)?;
        debug!(id = %task.id, "created task");
        Ok(task)
    }

    /// Lists tasks in creation order. Archived tasks only appear when the
    /// filter asks for them explicitly.
    pub fn list(&self, filter: &TaskFilter) -> Result<Vec<Task>, TaskError> {
        let status = match filter.status.as_deref() {
            Some(raw) => Some(parse_status(raw)?),
            None => None,
        };
        let priority = parse_priority(filter.priority.as_deref())?;

        let collection = self.store.load()?;
        let tasks = collection
            .tasks
            .into_iter()
            .filter(|task| match status {
                Some(wanted) => task.status == wanted,
                None => task.status != TaskStatus::Archived,
            })
            .filter(|task| priority.map_or(true, |wanted| task.priority == Some(wanted)))
            .collect();
        Ok(tasks)
    }

    pub fn get(&self, id: &str) -> Result<Task, TaskError> {
        let collection = self.store.load()?;
        collection
            .find(id)
            .cloned()
            .ok_or_else(|| TaskError::NotFound(id.to_string()))
    }

    pub fn update(&self, id: &str, patch: TaskPatch) -> Result<Task, TaskError> {
        let title = match patch.title.as_deref() {
            Some(raw) => Some(validate_title(raw)?),
            None => None,
        };
        let priority = parse_priority(patch.priority.as_deref())?;
        let due_date = validate_due_date(patch.due_date.as_deref())?;
        let status = match patch.status.as_deref() {
            Some(raw) => Some(parse_status(raw)?),
            None => None,
        };

        let mut collection = self.store.load()?;
        let task = collection
            .find_mut(id)
            .ok_or_else(|| TaskError::NotFound(id.to_string()))?;
        if let Some(next) = status {
            ensure_transition(task.status, next)?;
            task.status = next;
        }
        if let Some(title) = title {
            task.title = title;
        }
        if let Some(description) = patch.description {
            task.description = Some(description);
        }
        if let Some(priority) = priority {
            task.priority = Some(priority);
        }
        if let Some(due_date) = due_date {
            task.due_date = Some(due_date);
        }
        task.updated_at = now_rfc3339();
        let updated = task.clone();
        self.store.save(&collection)?;
        debug!(id = %updated.id, "updated task");
        Ok(updated)
    }

    pub fn delete(&self, id: &str) -> Result<Task, TaskError> {
        let mut collection = self.store.load()?;
        let removed = collection
            .remove(id)
            .ok_or_else(|| TaskError::NotFound(id.to_string()))?;
        self.store.save(&collection)?;
        debug!(id = %removed.id, "deleted task");
        Ok(removed)
    }

    /// Starts an open task: derives and creates the feature branch when a
    /// repository is available, then transitions to `in_progress`. A
    /// collaborator failure aborts the whole operation before anything is
    /// persisted.
    pub fn start(&self, id: &str, confirm_dirty: bool) -> Result<StartOutcome, TaskError> {
        let mut collection = self.store.load()?;
        let task = collection
            .find(id)
            .ok_or_else(|| TaskError::NotFound(id.to_string()))?;
        ensure_transition(task.status, TaskStatus::InProgress)?;

        let mut branch = None;
        let mut previous_branch = None;
        if self.vcs.is_repository() {
            let dirty = self
                .vcs
                .has_uncommitted_changes()
                .map_err(|source| TaskError::Collaborator {
                    task_id: id.to_string(),
                    source,
                })?;
            if dirty && !confirm_dirty {
                return Ok(StartOutcome::NeedsConfirmation);
            }
            previous_branch = self.vcs.current_branch();
            let name = derive_branch_name(&task.id, &task.title);
            self.vcs
                .create_and_switch_branch(&name)
                .map_err(|source| TaskError::Collaborator {
                    task_id: id.to_string(),
                    source,
                })?;
            branch = Some(name);
        }

        let task = collection
            .find_mut(id)
            .ok_or_else(|| TaskError::NotFound(id.to_string()))?;
        if branch.is_some() {
            task.branch = branch;
        }
        task.status = TaskStatus::InProgress;
        task.updated_at = now_rfc3339();
        let updated = task.clone();
        self.store.save(&collection)?;
        debug!(id = %updated.id, branch = ?updated.branch, "started task");
        Ok(StartOutcome::Started {
            task: updated,
            previous_branch,
        })
    }

    pub fn complete(&self, id: &str) -> Result<Task, TaskError> {
        self.transition(id, TaskStatus::Completed)
    }

    pub fn archive(&self, id: &str) -> Result<Task, TaskError> {
        self.transition(id, TaskStatus::Archived)
    }

    fn transition(&self, id: &str, next: TaskStatus) -> Result<Task, TaskError> {
        let mut collection = self.store.load()?;
        let task = collection
            .find_mut(id)
            .ok_or_else(|| TaskError::NotFound(id.to_string()))?;
        ensure_transition(task.status, next)?;
        task.status = next;
        task.updated_at = now_rfc3339();
        let updated = task.clone();
        self.store.save(&collection)?;
        debug!(id = %updated.id, status = %updated.status, "task transitioned");
        Ok(updated)
    }
}

fn ensure_transition(from: TaskStatus, to: TaskStatus) -> Result<(), TaskError> {
    if from.can_transition_to(to) {
        Ok(())
    } else {
        Err(TaskError::InvalidTransition { from, to })
    }
}

fn validate_title(raw: &str) -> Result<String, TaskError> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(TaskError::Validation {
            field: "title",
            reason: "must not be empty".to_string(),
        });
    }
    let length = trimmed.chars().count();
    if length > MAX_TITLE_CHARS {
        return Err(TaskError::Validation {
            field: "title",
            reason: format!("is {length} characters, the limit is {MAX_TITLE_CHARS}"),
        });
    }
    Ok(trimmed.to_string())
}

fn parse_status(raw: &str) -> Result<TaskStatus, TaskError> {
    TaskStatus::parse(raw).ok_or_else(|| TaskError::Validation {
        field: "status",
        reason: format!("unknown status {raw:?}, expected open, in_progress, completed or archived"),
    })
}

fn parse_priority(raw: Option<&str>) -> Result<Option<Priority>, TaskError> {
    match raw {
        None => Ok(None),
        Some(raw) => match Priority::parse(raw) {
            Some(priority) => Ok(Some(priority)),
            None => Err(TaskError::Validation {
                field: "priority",
                reason: format!("unknown priority {raw:?}, expected high, medium or low"),
            }),
        },
    }
}

fn validate_due_date(raw: Option<&str>) -> Result<Option<String>, TaskError> {
    match raw {
        None => Ok(None),
        Some(raw) => {
            let trimmed = raw.trim();
            match chrono::NaiveDate::parse_from_str(trimmed, "%Y-%m-%d") {
                Ok(_) => Ok(Some(trimmed.to_string())),
                Err(_) => Err(TaskError::Validation {
                    field: "due_date",
                    reason: format!("{trimmed:?} is not a valid YYYY-MM-DD date"),
                }),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::task::TaskCollection;
    use pretty_assertions::assert_eq;
    use std::cell::{Cell, RefCell};
    use std::io;
    use std::time::Duration;

    #[derive(Default)]
    struct MemoryStore {
        collection: RefCell<TaskCollection>,
        saves: Cell<usize>,
    }

    impl MemoryStore {
        fn snapshot(&self) -> TaskCollection {
            self.collection.borrow().clone()
        }
    }

    impl TaskStore for &MemoryStore {
        fn load(&self) -> Result<TaskCollection, StoreError> {
            Ok(self.collection.borrow().clone())
        }

        fn save(&self, collection: &TaskCollection) -> Result<(), StoreError> {
            self.saves.set(self.saves.get() + 1);
            *self.collection.borrow_mut() = collection.clone();
            Ok(())
        }

        fn exists(&self) -> bool {
            true
        }
    }

    #[derive(Default)]
    struct FakeGit {
        repository: bool,
        dirty: bool,
        fail_branch: bool,
        branches: RefCell<Vec<String>>,
    }

    impl VersionControl for &FakeGit {
        fn is_repository(&self) -> bool {
            self.repository
        }

        fn has_uncommitted_changes(&self) -> Result<bool, GitError> {
            Ok(self.dirty)
        }

        fn create_and_switch_branch(&self, name: &str) -> Result<(), GitError> {
            if self.fail_branch {
                return Err(GitError::Command {
                    command: format!("checkout -b {name}"),
                    stderr: "fatal: branch creation refused".to_string(),
                });
            }
            self.branches.borrow_mut().push(name.to_string());
            Ok(())
        }

        fn current_branch(&self) -> Option<String> {
            Some("main".to_string())
        }
    }

    fn manager<'a>(
        store: &'a MemoryStore,
        git: &'a FakeGit,
    ) -> LifecycleManager<&'a MemoryStore, &'a FakeGit> {
        LifecycleManager::new(store, git)
    }

    fn new_task(title: &str) -> NewTask {
        NewTask {
            title: title.to_string(),
            ..NewTask::default()
        }
    }

    #[test]
    fn create_assigns_id_and_defaults() {
        let store = MemoryStore::default();
        let git = FakeGit::default();
        let manager = manager(&store, &git);

        let task = manager
            .create(NewTask {
                title: "  Write release notes  ".to_string(),
                description: Some("for 0.2".to_string()),
                priority: Some("high".to_string()),
                due_date: Some("2026-09-01".to_string()),
            })
            .expect("create");

        assert!(!task.id.is_empty());
        assert_eq!(task.title, "Write release notes");
        assert_eq!(task.status, TaskStatus::Open);
        assert_eq!(task.priority, Some(Priority::High));
        assert_eq!(task.due_date.as_deref(), Some("2026-09-01"));
        assert_eq!(task.branch, None);
        assert_eq!(task.created_at, task.updated_at);
        assert_eq!(store.snapshot().tasks.len(), 1);
    }

    #[test]
    fn create_rejects_blank_title() {
        let store = MemoryStore::default();
        let git = FakeGit::default();
        let manager = manager(&store, &git);

        let err = manager.create(new_task("   ")).expect_err("blank title");
        assert!(matches!(err, TaskError::Validation { field: "title", .. }));
        assert_eq!(store.saves.get(), 0);
    }

    #[test]
    fn create_enforces_title_length_in_code_points() {
        let store = MemoryStore::default();
        let git = FakeGit::default();
        let manager = manager(&store, &git);

        manager
            .create(new_task(&"あ".repeat(200)))
            .expect("200 code points is legal");
        let err = manager
            .create(new_task(&"あ".repeat(201)))
            .expect_err("201 code points");
        assert!(matches!(err, TaskError::Validation { field: "title", .. }));
    }

    #[test]
    fn create_rejects_unknown_priority_and_bad_due_date() {
        let store = MemoryStore::default();
        let git = FakeGit::default();
        let manager = manager(&store, &git);

        let err = manager
            .create(NewTask {
                title: "ok".to_string(),
                priority: Some("urgent".to_string()),
                ..NewTask::default()
            })
            .expect_err("bad priority");
        assert!(matches!(err, TaskError::Validation { field: "priority", .. }));

        for bad in ["soon", "2026-13-40", "01-09-2026"] {
            let err = manager
                .create(NewTask {
                    title: "ok".to_string(),
                    due_date: Some(bad.to_string()),
                    ..NewTask::default()
                })
                .expect_err("bad due date");
            assert!(matches!(err, TaskError::Validation { field: "due_date", .. }));
        }
    }

    #[test]
    fn list_excludes_archived_unless_requested() {
        let store = MemoryStore::default();
        let git = FakeGit::default();
        let manager = manager(&store, &git);

        let keep_a = manager.create(new_task("Keep A")).expect("create");
        let _keep_b = manager.create(new_task("Keep B")).expect("create");
        let gone = manager.create(new_task("Archive me")).expect("create");

        manager.start(&gone.id, false).expect("start");
        manager.complete(&gone.id).expect("complete");
        manager.archive(&gone.id).expect("archive");

        let visible = manager.list(&TaskFilter::default()).expect("list");
        assert_eq!(visible.len(), 2);
        assert_eq!(visible[0].id, keep_a.id);

        let archived = manager
            .list(&TaskFilter {
                status: Some("archived".to_string()),
                ..TaskFilter::default()
            })
            .expect("list archived");
        assert_eq!(archived.len(), 1);
        assert_eq!(archived[0].id, gone.id);
    }

    #[test]
    fn list_filters_by_status_and_priority() {
        let store = MemoryStore::default();
        let git = FakeGit::default();
        let manager = manager(&store, &git);

        let high = manager
            .create(NewTask {
                title: "High".to_string(),
                priority: Some("high".to_string()),
                ..NewTask::default()
            })
            .expect("create");
        let low = manager
            .create(NewTask {
                title: "Low".to_string(),
                priority: Some("low".to_string()),
                ..NewTask::default()
            })
            .expect("create");
        manager.start(&low.id, false).expect("start");

        let high_only = manager
            .list(&TaskFilter {
                priority: Some("high".to_string()),
                ..TaskFilter::default()
            })
            .expect("list");
        assert_eq!(high_only.len(), 1);
        assert_eq!(high_only[0].id, high.id);

        let in_progress = manager
            .list(&TaskFilter {
                status: Some("in_progress".to_string()),
                ..TaskFilter::default()
            })
            .expect("list");
        assert_eq!(in_progress.len(), 1);
        assert_eq!(in_progress[0].id, low.id);
    }

    #[test]
    fn list_rejects_unknown_filter_values() {
        let store = MemoryStore::default();
        let git = FakeGit::default();
        let manager = manager(&store, &git);

        let err = manager
            .list(&TaskFilter {
                status: Some("done".to_string()),
                ..TaskFilter::default()
            })
            .expect_err("bad status");
        assert!(matches!(err, TaskError::Validation { field: "status", .. }));
    }

    #[test]
    fn get_distinguishes_missing_ids() {
        let store = MemoryStore::default();
        let git = FakeGit::default();
        let manager = manager(&store, &git);

        let task = manager.create(new_task("Find me")).expect("create");
        assert_eq!(manager.get(&task.id).expect("get").id, task.id);

        let err = manager.get("01MISSING").expect_err("missing");
        assert!(matches!(err, TaskError::NotFound(_)));
    }

    #[test]
    fn update_applies_fields_and_touches_updated_at() {
        let store = MemoryStore::default();
        let git = FakeGit::default();
        let manager = manager(&store, &git);

        let task = manager.create(new_task("Before")).expect("create");
        std::thread::sleep(Duration::from_millis(10));
        let updated = manager
            .update(
                &task.id,
                TaskPatch {
                    title: Some("After".to_string()),
                    priority: Some("low".to_string()),
                    due_date: Some("2026-10-01".to_string()),
                    ..TaskPatch::default()
                },
            )
            .expect("update");

        assert_eq!(updated.title, "After");
        assert_eq!(updated.priority, Some(Priority::Low));
        assert_eq!(updated.due_date.as_deref(), Some("2026-10-01"));
        assert_ne!(updated.updated_at, task.updated_at);
        assert_eq!(updated.created_at, task.created_at);
    }

    #[test]
    fn update_walks_the_state_machine_one_step_at_a_time() {
        let store = MemoryStore::default();
        let git = FakeGit::default();
        let manager = manager(&store, &git);

        let task = manager.create(new_task("Stepwise")).expect("create");
        let err = manager
            .update(
                &task.id,
                TaskPatch {
                    status: Some("completed".to_string()),
                    ..TaskPatch::default()
                },
            )
            .expect_err("open -> completed is illegal");
        assert!(matches!(
            err,
            TaskError::InvalidTransition {
                from: TaskStatus::Open,
                to: TaskStatus::Completed
            }
        ));

        let updated = manager
            .update(
                &task.id,
                TaskPatch {
                    status: Some("in_progress".to_string()),
                    ..TaskPatch::default()
                },
            )
            .expect("open -> in_progress");
        assert_eq!(updated.status, TaskStatus::InProgress);
    }

    #[test]
    fn every_off_table_transition_is_rejected() {
        let legal = [
            (TaskStatus::Open, TaskStatus::InProgress),
            (TaskStatus::InProgress, TaskStatus::Completed),
            (TaskStatus::InProgress, TaskStatus::Open),
            (TaskStatus::Completed, TaskStatus::Archived),
        ];
        let all = [
            TaskStatus::Open,
            TaskStatus::InProgress,
            TaskStatus::Completed,
            TaskStatus::Archived,
        ];
        for from in all {
            for to in all {
                let result = ensure_transition(from, to);
                if legal.contains(&(from, to)) {
                    assert!(result.is_ok(), "{from} -> {to} should be legal");
                } else {
                    assert!(
                        matches!(result, Err(TaskError::InvalidTransition { .. })),
                        "{from} -> {to} should be rejected"
                    );
                }
            }
        }
    }

    #[test]
    fn delete_removes_and_reports_missing_ids() {
        let store = MemoryStore::default();
        let git = FakeGit::default();
        let manager = manager(&store, &git);

        let task = manager.create(new_task("Ephemeral")).expect("create");
        let removed = manager.delete(&task.id).expect("delete");
        assert_eq!(removed.id, task.id);
        assert!(store.snapshot().tasks.is_empty());

        let err = manager.delete(&task.id).expect_err("second delete");
        assert!(matches!(err, TaskError::NotFound(_)));
    }

    #[test]
    fn start_without_repository_sets_no_branch() {
        let store = MemoryStore::default();
        let git = FakeGit::default();
        let manager = manager(&store, &git);

        let task = manager.create(new_task("No repo")).expect("create");
        let outcome = manager.start(&task.id, false).expect("start");
        match outcome {
            StartOutcome::Started {
                task,
                previous_branch,
            } => {
                assert_eq!(task.status, TaskStatus::InProgress);
                assert_eq!(task.branch, None);
                assert_eq!(previous_branch, None);
            }
            StartOutcome::NeedsConfirmation => panic!("unexpected confirmation request"),
        }
        assert!(git.branches.borrow().is_empty());
    }

    #[test]
    fn start_with_clean_repository_creates_branch() {
        let store = MemoryStore::default();
        let git = FakeGit {
            repository: true,
            ..FakeGit::default()
        };
        let manager = manager(&store, &git);

        let task = manager.create(new_task("User Auth Feature!!")).expect("create");
        let outcome = manager.start(&task.id, false).expect("start");
        let expected = derive_branch_name(&task.id, &task.title);
        match outcome {
            StartOutcome::Started {
                task,
                previous_branch,
            } => {
                assert_eq!(task.status, TaskStatus::InProgress);
                assert_eq!(task.branch.as_deref(), Some(expected.as_str()));
                assert_eq!(previous_branch.as_deref(), Some("main"));
            }
            StartOutcome::NeedsConfirmation => panic!("unexpected confirmation request"),
        }
        assert_eq!(*git.branches.borrow(), vec![expected]);
    }

    #[test]
    fn start_defers_to_caller_on_uncommitted_changes() {
        let store = MemoryStore::default();
        let git = FakeGit {
            repository: true,
            dirty: true,
            ..FakeGit::default()
        };
        let manager = manager(&store, &git);

        let task = manager.create(new_task("Dirty tree")).expect("create");
        let saves_before = store.saves.get();

        let outcome = manager.start(&task.id, false).expect("start");
        assert_eq!(outcome, StartOutcome::NeedsConfirmation);
        assert_eq!(store.saves.get(), saves_before);
        assert_eq!(
            store.snapshot().find(&task.id).expect("task").status,
            TaskStatus::Open
        );
        assert!(git.branches.borrow().is_empty());

        let outcome = manager.start(&task.id, true).expect("confirmed start");
        assert!(matches!(outcome, StartOutcome::Started { .. }));
        assert_eq!(git.branches.borrow().len(), 1);
    }

    #[test]
    fn start_aborts_cleanly_when_branch_creation_fails() {
        let store = MemoryStore::default();
        let git = FakeGit {
            repository: true,
            fail_branch: true,
            ..FakeGit::default()
        };
        let manager = manager(&store, &git);

        let task = manager.create(new_task("Doomed")).expect("create");
        let saves_before = store.saves.get();

        let err = manager.start(&task.id, false).expect_err("branch failure");
        assert!(matches!(err, TaskError::Collaborator { .. }));
        assert_eq!(store.saves.get(), saves_before);
        let stored = store.snapshot().find(&task.id).cloned().expect("task");
        assert_eq!(stored.status, TaskStatus::Open);
        assert_eq!(stored.branch, None);
    }

    #[test]
    fn start_requires_an_open_task() {
        let store = MemoryStore::default();
        let git = FakeGit::default();
        let manager = manager(&store, &git);

        let task = manager.create(new_task("Twice")).expect("create");
        manager.start(&task.id, false).expect("first start");
        let err = manager.start(&task.id, false).expect_err("second start");
        assert!(matches!(
            err,
            TaskError::InvalidTransition {
                from: TaskStatus::InProgress,
                to: TaskStatus::InProgress
            }
        ));
    }

    #[test]
    fn complete_and_archive_follow_the_state_machine() {
        let store = MemoryStore::default();
        let git = FakeGit::default();
        let manager = manager(&store, &git);

        let task = manager.create(new_task("Full ride")).expect("create");
        let err = manager.complete(&task.id).expect_err("open -> completed");
        assert!(matches!(err, TaskError::InvalidTransition { .. }));

        manager.start(&task.id, false).expect("start");
        let completed = manager.complete(&task.id).expect("complete");
        assert_eq!(completed.status, TaskStatus::Completed);

        let archived = manager.archive(&task.id).expect("archive");
        assert_eq!(archived.status, TaskStatus::Archived);

        let err = manager.start(&task.id, false).expect_err("archived is terminal");
        assert!(matches!(err, TaskError::InvalidTransition { .. }));
    }

    #[test]
    fn interrupt_returns_a_task_to_open_and_keeps_the_branch() {
        let store = MemoryStore::default();
        let git = FakeGit {
            repository: true,
            ..FakeGit::default()
        };
        let manager = manager(&store, &git);

        let task = manager.create(new_task("Interrupted")).expect("create");
        manager.start(&task.id, false).expect("start");
        let interrupted = manager
            .update(
                &task.id,
                TaskPatch {
                    status: Some("open".to_string()),
                    ..TaskPatch::default()
                },
            )
            .expect("in_progress -> open");
        assert_eq!(interrupted.status, TaskStatus::Open);
        assert!(interrupted.branch.is_some());
    }

    #[test]
    fn store_errors_propagate_unmodified() {
        struct BrokenStore;
        impl TaskStore for BrokenStore {
            fn load(&self) -> Result<TaskCollection, StoreError> {
                Err(StoreError::Read {
                    path: "tasks.json".into(),
                    source: io::Error::new(io::ErrorKind::PermissionDenied, "denied"),
                })
            }
            fn save(&self, _collection: &TaskCollection) -> Result<(), StoreError> {
                unreachable!("load already fails")
            }
            fn exists(&self) -> bool {
                false
            }
        }

        let git = FakeGit::default();
        let manager = LifecycleManager::new(BrokenStore, &git);
        let err = manager.get("01ABC").expect_err("read failure");
        assert!(matches!(err, TaskError::Store(StoreError::Read { .. })));
    }
}
