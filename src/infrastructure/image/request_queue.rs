//! Pending load requests ordered by a selectable discipline.

use std::collections::VecDeque;

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use tokio::sync::Notify;

use crate::domain::entities::LoadRequest;

/// Order in which queued requests are admitted to workers.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum QueueDiscipline {
    /// Oldest request first.
    Fifo,
    /// Most recent request first.
    #[default]
    Lifo,
}

impl std::fmt::Display for QueueDiscipline {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Fifo => write!(f, "fifo"),
            Self::Lifo => write!(f, "lifo"),
        }
    }
}

/// Queue of requests waiting for a worker.
///
/// Requests are never dropped, only reordered. Waiting on an empty queue
/// parks the caller until the next push.
#[derive(Debug)]
pub struct RequestQueue {
    discipline: QueueDiscipline,
    pending: Mutex<VecDeque<LoadRequest>>,
    ready: Notify,
}

impl RequestQueue {
    /// Creates an empty queue.
    #[must_use]
    pub fn new(discipline: QueueDiscipline) -> Self {
        Self {
            discipline,
            pending: Mutex::new(VecDeque::new()),
            ready: Notify::new(),
        }
    }

    /// Returns the admission discipline.
    #[must_use]
    pub const fn discipline(&self) -> QueueDiscipline {
        self.discipline
    }

    /// Appends a request and wakes the consumer.
    pub fn push(&self, request: LoadRequest) {
        self.pending.lock().push_back(request);
        self.ready.notify_one();
    }

    /// Removes the next request per the discipline, if any.
    pub fn try_pop_next(&self) -> Option<LoadRequest> {
        let mut pending = self.pending.lock();
        match self.discipline {
            QueueDiscipline::Fifo => pending.pop_front(),
            QueueDiscipline::Lifo => pending.pop_back(),
        }
    }

    /// Removes the next request, waiting while the queue is empty.
    pub async fn pop_next(&self) -> LoadRequest {
        loop {
            if let Some(request) = self.try_pop_next() {
                return request;
            }
            self.ready.notified().await;
        }
    }

    /// Waits until at least one request is queued.
    pub async fn wait_non_empty(&self) {
        while self.is_empty() {
            self.ready.notified().await;
        }
    }

    /// Number of queued requests.
    pub fn len(&self) -> usize {
        self.pending.lock().len()
    }

    /// Returns true if nothing is queued.
    pub fn is_empty(&self) -> bool {
        self.pending.lock().is_empty()
    }
}
