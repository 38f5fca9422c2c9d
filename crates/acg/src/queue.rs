//! A queue of words that are looked up one at a time in the background.
//!
//! Entries move from queued to in progress to done or error. A single worker task processes
//! them in the order they were queued. Every status change is posted as a [`QueueEvent`] on the
//! channel returned by [`DownloadQueue::new`], so the presentation layer never has to share the
//! queue's state with the worker.

use crate::{
    import::{ImportError, ImportSource},
    pipeline::Lookup,
};
use acg_core::{LanguagePair, WordKey};
use std::{
    collections::VecDeque,
    sync::{Arc, Mutex, MutexGuard, PoisonError},
};
use tokio::sync::{mpsc, watch};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EntryStatus {
    Queued,
    InProgress,
    Done,
    Error(String),
    /// The entry was taken off the queue without being looked up.
    Removed,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum WorkerMode {
    Running,
    #[default]
    Paused,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueueEvent {
    pub key: WordKey,
    pub status: EntryStatus,
}

/// A read-only copy of the queue's state.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct QueueSnapshot {
    pub mode: WorkerMode,
    pub queued: Vec<WordKey>,
    pub in_progress: Option<WordKey>,
    pub done: Vec<WordKey>,
    pub errors: Vec<(WordKey, String)>,
}

#[derive(Debug, Default)]
struct State {
    mode: WorkerMode,
    queued: VecDeque<WordKey>,
    in_progress: Option<WordKey>,
    done: Vec<WordKey>,
    errors: Vec<(WordKey, String)>,
}

#[derive(Clone)]
pub struct DownloadQueue {
    lookup: Arc<dyn Lookup>,
    state: Arc<Mutex<State>>,
    events: mpsc::UnboundedSender<QueueEvent>,
    // true while a worker task is alive
    busy: Arc<watch::Sender<bool>>,
}

impl DownloadQueue {
    pub fn new(lookup: Arc<dyn Lookup>) -> (Self, mpsc::UnboundedReceiver<QueueEvent>) {
        let (events, receiver) = mpsc::unbounded_channel();
        let (busy, _) = watch::channel(false);
        let queue = Self {
            lookup,
            state: Arc::new(Mutex::new(State::default())),
            events,
            busy: Arc::new(busy),
        };
        (queue, receiver)
    }

    fn state(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn emit(&self, key: &WordKey, status: EntryStatus) {
        let event = QueueEvent {
            key: key.clone(),
            status,
        };
        if self.events.send(event).is_err() {
            tracing::trace!("No receiver for queue events");
        }
    }

    /// Whether the key is already queued, being looked up, done or failed.
    pub fn is_duplicate(&self, key: &WordKey) -> bool {
        Self::contains(&self.state(), key)
    }

    fn contains(state: &State, key: &WordKey) -> bool {
        state.queued.contains(key)
            || state.in_progress.as_ref() == Some(key)
            || state.done.contains(key)
            || state.errors.iter().any(|(k, _)| k == key)
    }

    /// Adds the key to the end of the queue unless it is a duplicate.
    pub fn enqueue(&self, key: WordKey) -> bool {
        let mut state = self.state();
        if Self::contains(&state, &key) {
            tracing::debug!("{key} is already in the queue");
            return false;
        }
        tracing::debug!("Queued {key}");
        state.queued.push_back(key.clone());
        self.emit(&key, EntryStatus::Queued);
        self.spawn_worker(&state);
        true
    }

    /// Queues every key that is not a duplicate and returns how many were queued.
    pub fn enqueue_all(&self, keys: impl IntoIterator<Item = WordKey>) -> usize {
        keys.into_iter().filter(|key| self.enqueue(key.clone())).count()
    }

    /// Queues the terms read from the source for the language pair.
    pub fn import_from(
        &self,
        source: &ImportSource,
        pair: LanguagePair,
    ) -> Result<usize, ImportError> {
        let terms = source.terms()?;
        let total = terms.len();
        let accepted = self.enqueue_all(terms.iter().map(|term| WordKey::new(term, pair)));
        tracing::info!("Imported {accepted} of {total} terms");
        Ok(accepted)
    }

    /// Removes a queued entry. Entries that are already being looked up are not affected.
    pub fn dequeue(&self, key: &WordKey) -> bool {
        let mut state = self.state();
        let Some(position) = state.queued.iter().position(|k| k == key) else {
            return false;
        };
        state.queued.remove(position);
        self.emit(key, EntryStatus::Removed);
        true
    }

    /// Moves a failed entry back to the end of the queue.
    pub fn retry(&self, key: &WordKey) -> bool {
        let mut state = self.state();
        let Some(position) = state.errors.iter().position(|(k, _)| k == key) else {
            return false;
        };
        state.errors.remove(position);
        state.queued.push_back(key.clone());
        self.emit(key, EntryStatus::Queued);
        self.spawn_worker(&state);
        true
    }

    /// Replaces a failed entry with a suggested spelling of its term.
    ///
    /// Returns `false` and keeps the failed entry if the suggestion is a duplicate.
    pub fn accept_suggestion(&self, key: &WordKey, suggestion: &str) -> bool {
        let replacement = WordKey::new(suggestion, key.pair);
        let mut state = self.state();
        let Some(position) = state.errors.iter().position(|(k, _)| k == key) else {
            return false;
        };
        if Self::contains(&state, &replacement) {
            return false;
        }
        state.errors.remove(position);
        self.emit(key, EntryStatus::Removed);
        state.queued.push_back(replacement.clone());
        self.emit(&replacement, EntryStatus::Queued);
        self.spawn_worker(&state);
        true
    }

    pub fn snapshot(&self) -> QueueSnapshot {
        let state = self.state();
        QueueSnapshot {
            mode: state.mode,
            queued: state.queued.iter().cloned().collect(),
            in_progress: state.in_progress.clone(),
            done: state.done.clone(),
            errors: state.errors.clone(),
        }
    }

    /// Lets the worker process the queue, spawning it if necessary.
    pub fn start_downloading(&self) {
        let mut state = self.state();
        state.mode = WorkerMode::Running;
        self.spawn_worker(&state);
    }

    /// The entry being looked up is finished, then the worker stops until started again.
    pub fn pause_downloading(&self) {
        self.state().mode = WorkerMode::Paused;
        tracing::debug!("Paused downloading");
    }

    /// Waits until the worker has stopped, because the queue is empty or downloading is paused.
    pub async fn wait_idle(&self) {
        let mut busy = self.busy.subscribe();
        while *busy.borrow_and_update() {
            if busy.changed().await.is_err() {
                return;
            }
        }
    }

    // Called with the state locked, so there is never more than one worker.
    fn spawn_worker(&self, state: &State) {
        if state.mode != WorkerMode::Running || state.queued.is_empty() || *self.busy.borrow() {
            return;
        }
        self.busy.send_replace(true);
        let queue = self.clone();
        tokio::spawn(async move { queue.run().await });
    }

    async fn run(self) {
        tracing::debug!("Worker started");
        loop {
            let next = {
                let mut state = self.state();
                let next = match state.mode {
                    WorkerMode::Running => state.queued.pop_front(),
                    WorkerMode::Paused => None,
                };
                match &next {
                    // marked before the lock is released so the entry is never untracked
                    Some(key) => state.in_progress = Some(key.clone()),
                    None => {
                        self.busy.send_replace(false);
                    }
                }
                next
            };
            let Some(key) = next else {
                tracing::debug!("Worker stopped");
                return;
            };
            self.worker_single_word(key).await;
        }
    }

    /// Looks up a single entry and records the outcome.
    pub async fn worker_single_word(&self, key: WordKey) -> EntryStatus {
        self.state().in_progress = Some(key.clone());
        self.emit(&key, EntryStatus::InProgress);

        let status = match self.lookup.lookup(&key).await {
            Ok(word) => {
                tracing::info!("Downloaded {key}");
                if word.has_warnings() {
                    tracing::warn!("Some sources failed for {key}");
                }
                EntryStatus::Done
            }
            Err(err) => {
                tracing::warn!("Failed to download {key}: {err}");
                EntryStatus::Error(err.to_string())
            }
        };

        {
            let mut state = self.state();
            state.in_progress = None;
            match &status {
                EntryStatus::Error(detail) => state.errors.push((key.clone(), detail.clone())),
                _ => state.done.push(key.clone()),
            }
        }
        self.emit(&key, status.clone());
        status
    }
}
