// Copyright (c) The spectree Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Debounced batching of file change notifications.
//!
//! Each notification adds a path to a pending set and restarts a single timer. Once the timer
//! fires without further notifications, the whole set is sent out as one [`ChangeBatch`].

use camino::Utf8PathBuf;
use std::{
    collections::BTreeSet,
    sync::{
        Arc,
        atomic::{AtomicBool, Ordering},
    },
    time::Duration,
};
use tokio::{
    sync::mpsc::{self, UnboundedReceiver, UnboundedSender},
    time::Instant,
};
use tracing::debug;

/// A set of paths that changed during one quiet period.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct ChangeBatch {
    /// The changed paths, sorted and deduplicated.
    pub paths: BTreeSet<Utf8PathBuf>,
}

#[derive(Debug)]
enum Command {
    Notify(Utf8PathBuf),
    Cancel,
}

/// A handle to the batching task.
///
/// Dropping every handle flushes any pending paths as a final batch and ends the task.
#[derive(Clone, Debug)]
pub struct ChangeBatcher {
    commands: UnboundedSender<Command>,
    cancelled: Arc<AtomicBool>,
}

impl ChangeBatcher {
    /// Spawns the batching task on the current tokio runtime.
    ///
    /// Batches are sent on the returned receiver, which yields `None` once the task ends.
    pub fn spawn(debounce: Duration) -> (Self, UnboundedReceiver<ChangeBatch>) {
        let (commands, commands_rx) = mpsc::unbounded_channel();
        let (batches, batches_rx) = mpsc::unbounded_channel();
        tokio::spawn(run(debounce, commands_rx, batches));
        (
            Self {
                commands,
                cancelled: Arc::new(AtomicBool::new(false)),
            },
            batches_rx,
        )
    }

    /// Records that `path` changed, restarting the quiet period.
    ///
    /// Returns false if the batcher has been cancelled or its task has ended.
    pub fn notify(&self, path: impl Into<Utf8PathBuf>) -> bool {
        if self.cancelled.load(Ordering::Acquire) {
            return false;
        }
        self.commands.send(Command::Notify(path.into())).is_ok()
    }

    /// Discards pending paths and stops accepting notifications.
    ///
    /// Batches that were already sent stay in the receiver.
    pub fn cancel(&self) {
        if !self.cancelled.swap(true, Ordering::AcqRel) {
            // The task may already be gone, in which case there is nothing to cancel.
            _ = self.commands.send(Command::Cancel);
        }
    }

    /// Returns true if [`cancel`](Self::cancel) has been called.
    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::Acquire)
    }
}

async fn run(
    debounce: Duration,
    mut commands: UnboundedReceiver<Command>,
    batches: UnboundedSender<ChangeBatch>,
) {
    let mut pending = BTreeSet::new();
    let mut deadline: Option<Instant> = None;

    loop {
        let command = match deadline {
            Some(at) => {
                tokio::select! {
                    command = commands.recv() => command,
                    () = tokio::time::sleep_until(at) => {
                        deadline = None;
                        if !dispatch(&mut pending, &batches) {
                            return;
                        }
                        continue;
                    }
                }
            }
            None => commands.recv().await,
        };

        match command {
            Some(Command::Notify(path)) => {
                pending.insert(path);
                deadline = Some(Instant::now() + debounce);
            }
            Some(Command::Cancel) => {
                debug!("change batcher cancelled, dropping {} pending paths", pending.len());
                return;
            }
            None => {
                if !pending.is_empty() {
                    dispatch(&mut pending, &batches);
                }
                return;
            }
        }
    }
}

/// Sends the pending set as a batch. Returns false if nobody is listening anymore.
fn dispatch(pending: &mut BTreeSet<Utf8PathBuf>, batches: &UnboundedSender<ChangeBatch>) -> bool {
    let batch = ChangeBatch {
        paths: std::mem::take(pending),
    };
    debug!("dispatching batch of {} changed paths", batch.paths.len());
    if batches.send(batch).is_err() {
        debug!("batch receiver dropped, stopping change batcher");
        return false;
    }
    true
}

#[cfg(test)]
mod tests {
    use super::*;
    use maplit::btreeset;
    use pretty_assertions::assert_eq;
    use tokio::sync::mpsc::error::TryRecvError;

    const DEBOUNCE: Duration = Duration::from_millis(200);

    fn batch(paths: BTreeSet<&str>) -> ChangeBatch {
        ChangeBatch {
            paths: paths.into_iter().map(Utf8PathBuf::from).collect(),
        }
    }

    #[tokio::test(start_paused = true)]
    async fn bursts_are_coalesced() {
        let (batcher, mut batches) = ChangeBatcher::spawn(DEBOUNCE);
        let start = Instant::now();

        assert!(batcher.notify("a.test.js"));
        assert!(batcher.notify("b.test.js"));
        assert!(batcher.notify("a.test.js"));
        tokio::time::sleep(Duration::from_millis(150)).await;
        assert_eq!(batches.try_recv(), Err(TryRecvError::Empty));

        // This restarts the quiet period.
        assert!(batcher.notify("c.test.js"));
        let received = batches.recv().await.expect("batch sent");
        assert_eq!(received, batch(btreeset! {"a.test.js", "b.test.js", "c.test.js"}));

        let elapsed = start.elapsed();
        assert!(
            elapsed >= Duration::from_millis(350) && elapsed < Duration::from_millis(400),
            "batch dispatched after the last quiet period: {elapsed:?}"
        );
    }

    #[tokio::test(start_paused = true)]
    async fn separate_quiet_periods_make_separate_batches() {
        let (batcher, mut batches) = ChangeBatcher::spawn(DEBOUNCE);

        batcher.notify("a.test.js");
        assert_eq!(batches.recv().await, Some(batch(btreeset! {"a.test.js"})));
        batcher.notify("b.test.js");
        assert_eq!(batches.recv().await, Some(batch(btreeset! {"b.test.js"})));
    }

    #[tokio::test(start_paused = true)]
    async fn cancel_drops_pending() {
        let (batcher, mut batches) = ChangeBatcher::spawn(DEBOUNCE);

        assert!(batcher.notify("a.test.js"));
        batcher.cancel();
        assert!(batcher.is_cancelled());
        assert!(!batcher.notify("b.test.js"), "notifications are refused");
        assert_eq!(batches.recv().await, None, "task ended without a batch");
    }

    #[tokio::test(start_paused = true)]
    async fn cancel_does_not_recall_sent_batches() {
        let (batcher, mut batches) = ChangeBatcher::spawn(DEBOUNCE);

        batcher.notify("a.test.js");
        tokio::time::sleep(DEBOUNCE * 2).await;
        batcher.notify("b.test.js");
        batcher.cancel();

        assert_eq!(batches.recv().await, Some(batch(btreeset! {"a.test.js"})));
        assert_eq!(batches.recv().await, None);
    }

    #[tokio::test(start_paused = true)]
    async fn dropping_the_handle_flushes() {
        let (batcher, mut batches) = ChangeBatcher::spawn(DEBOUNCE);
        let start = Instant::now();

        batcher.notify("a.test.js");
        drop(batcher);
        assert_eq!(batches.recv().await, Some(batch(btreeset! {"a.test.js"})));
        assert!(start.elapsed() < DEBOUNCE, "flushed without waiting");
        assert_eq!(batches.recv().await, None);
    }
}
