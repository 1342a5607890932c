//! Per-activity ordering of remote mutations.
//!
//! Each submitted operation waits for the previous operation on the same id
//! before it starts, so the remote store sees mutations for one activity in
//! submission order. Operations on different ids run concurrently.

use crate::models::ActivityId;
use std::collections::HashMap;
use std::future::Future;
use tokio::sync::oneshot;
use tokio::task::JoinSet;

/// Completion signal of the most recently submitted operation for an id.
struct Tail {
    seq: u64,
    done: oneshot::Receiver<()>,
}

/// Chains operations per id. Owned by the sync engine's single context.
#[derive(Default)]
pub struct OperationQueue {
    next_seq: u64,
    tails: HashMap<ActivityId, Tail>,
}

impl OperationQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Spawn the operation built by `make_op` onto `tasks`, ordered after
    /// earlier operations for `id`.
    ///
    /// `make_op` receives the operation's sequence number, which is also
    /// returned.
    pub fn submit<T, F, M>(&mut self, tasks: &mut JoinSet<T>, id: &ActivityId, make_op: M) -> u64
    where
        T: Send + 'static,
        F: Future<Output = T> + Send + 'static,
        M: FnOnce(u64) -> F,
    {
        self.next_seq += 1;
        let seq = self.next_seq;
        let op = make_op(seq);

        let (done_tx, done_rx) = oneshot::channel();
        let previous = self.tails.insert(id.clone(), Tail { seq, done: done_rx });

        tasks.spawn(async move {
            if let Some(previous) = previous {
                // An error only means the previous task is gone; either way it is over.
                let _ = previous.done.await;
            }
            let output = op.await;
            let _ = done_tx.send(());
            output
        });

        seq
    }

    /// Whether `seq` is the most recent operation submitted for `id`.
    pub fn is_latest(&self, id: &ActivityId, seq: u64) -> bool {
        self.tails.get(id).is_some_and(|tail| tail.seq == seq)
    }

    /// Forget the chain for `id` once its latest operation has finished.
    pub fn finish(&mut self, id: &ActivityId, seq: u64) {
        if self.is_latest(id, seq) {
            self.tails.remove(id);
        }
    }

    /// Number of ids with an operation still in flight.
    pub fn pending_ids(&self) -> usize {
        self.tails.len()
    }
}
