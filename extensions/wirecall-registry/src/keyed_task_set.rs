use dashmap::DashMap;
use dashmap::mapref::entry::Entry;
use std::future::Future;
use tokio::task::JoinHandle;

/// Background tasks addressed by a string key.
///
/// At most one live task exists per key. Every task still running is aborted
/// when the set is dropped.
#[derive(Default)]
pub struct KeyedTaskSet {
    tasks: DashMap<String, JoinHandle<()>>,
}

impl KeyedTaskSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Spawns `future` under `key` unless a task for `key` is still running.
    ///
    /// Returns whether a new task was started. A finished task under the same
    /// key is replaced, and finished tasks under other keys are dropped.
    pub fn spawn_if_absent<F>(&self, key: impl Into<String>, future: F) -> bool
    where
        F: Future<Output = ()> + Send + 'static,
    {
        self.prune_finished();
        match self.tasks.entry(key.into()) {
            Entry::Occupied(mut entry) => {
                if !entry.get().is_finished() {
                    return false;
                }
                entry.insert(tokio::spawn(future));
                true
            }
            Entry::Vacant(entry) => {
                entry.insert(tokio::spawn(future));
                true
            }
        }
    }

    pub fn is_running(&self, key: &str) -> bool {
        self.tasks
            .get(key)
            .map(|handle| !handle.is_finished())
            .unwrap_or(false)
    }

    /// Aborts the task under `key`, returning whether one was present.
    pub fn abort(&self, key: &str) -> bool {
        match self.tasks.remove(key) {
            Some((_, handle)) => {
                handle.abort();
                true
            }
            None => false,
        }
    }

    pub fn abort_all(&self) {
        let keys: Vec<String> = self.tasks.iter().map(|e| e.key().clone()).collect();
        for key in keys {
            self.abort(&key);
        }
    }

    /// Forgets every task that has already completed. Returns how many.
    pub fn prune_finished(&self) -> usize {
        let before = self.tasks.len();
        self.tasks.retain(|_, handle| !handle.is_finished());
        before.saturating_sub(self.tasks.len())
    }

    /// Tasks that have not completed yet.
    pub fn running(&self) -> usize {
        self.tasks
            .iter()
            .filter(|entry| !entry.value().is_finished())
            .count()
    }

    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }
}

impl Drop for KeyedTaskSet {
    fn drop(&mut self) {
        for entry in self.tasks.iter() {
            entry.value().abort();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    #[tokio::test]
    async fn second_spawn_under_same_key_is_ignored() {
        let tasks = KeyedTaskSet::new();
        let runs = Arc::new(AtomicUsize::new(0));

        for _ in 0..3 {
            let runs = runs.clone();
            tasks.spawn_if_absent("watch:a", async move {
                runs.fetch_add(1, Ordering::SeqCst);
                tokio::time::sleep(Duration::from_secs(60)).await;
            });
        }

        tokio::task::yield_now().await;
        assert_eq!(tasks.len(), 1);
        assert_eq!(runs.load(Ordering::SeqCst), 1);
        assert!(tasks.is_running("watch:a"));

        assert!(tasks.abort("watch:a"));
        assert!(!tasks.abort("watch:a"));
        assert!(tasks.is_empty());
    }

    #[tokio::test]
    async fn finished_task_can_be_replaced() {
        let tasks = KeyedTaskSet::new();
        assert!(tasks.spawn_if_absent("k", async {}));

        for _ in 0..100 {
            if !tasks.is_running("k") {
                break;
            }
            tokio::task::yield_now().await;
        }

        assert!(tasks.spawn_if_absent("k", async {}));
    }

    #[tokio::test]
    async fn finished_tasks_are_pruned_on_spawn() {
        let tasks = KeyedTaskSet::new();
        for i in 0..10 {
            tasks.spawn_if_absent(format!("done:{i}"), async {});
        }

        for _ in 0..100 {
            if tasks.running() == 0 {
                break;
            }
            tokio::task::yield_now().await;
        }
        assert_eq!(tasks.running(), 0);

        tasks.spawn_if_absent("live", async {
            tokio::time::sleep(Duration::from_secs(60)).await;
        });
        assert_eq!(tasks.len(), 1);
        assert_eq!(tasks.prune_finished(), 0);
    }
}
