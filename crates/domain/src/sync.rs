use std::collections::VecDeque;

use log::{debug, warn};

use crate::{PersistenceError, RemoteRepository, StorageError, UserRecord, Username};

/// Snapshot of a record that still has to be delivered to the remote store.
#[derive(Debug, Clone, PartialEq)]
pub struct SyncQueueEntry {
    pub username: Username,
    pub record: UserRecord,
}

pub trait SyncQueueRepository {
    fn read_sync_queue(&self) -> Result<VecDeque<SyncQueueEntry>, PersistenceError>;
    fn write_sync_queue(&self, queue: &VecDeque<SyncQueueEntry>) -> Result<(), PersistenceError>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncOutcome {
    Delivered,
    Queued { pending: usize },
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct DrainOutcome {
    pub delivered: usize,
    pub pending: usize,
}

/// Durable FIFO of outbound record pushes.
///
/// Remote failures never surface as errors. They leave the snapshot in the queue until a
/// later drain delivers it. Only failures of the local queue storage are returned.
pub struct SyncQueue<'a, R> {
    repository: &'a R,
}

impl<'a, R> SyncQueue<'a, R>
where
    R: SyncQueueRepository + RemoteRepository,
{
    pub fn new(repository: &'a R) -> Self {
        Self { repository }
    }

    pub fn pending(&self) -> Result<usize, PersistenceError> {
        Ok(self.repository.read_sync_queue()?.len())
    }

    /// Delivers a snapshot or queues it for a later attempt.
    ///
    /// With an empty queue one immediate delivery is attempted. Otherwise the snapshot is
    /// queued behind the existing entries, so that it cannot overtake older snapshots, and
    /// the queue is drained.
    pub async fn push(
        &self,
        username: Username,
        record: UserRecord,
    ) -> Result<SyncOutcome, PersistenceError> {
        let mut queue = self.repository.read_sync_queue()?;

        if queue.is_empty() {
            match self.repository.write_record(&username, &record).await {
                Ok(()) => return Ok(SyncOutcome::Delivered),
                Err(err) => log_failed_delivery(&username, &err),
            }
            enqueue(&mut queue, SyncQueueEntry { username, record });
            self.repository.write_sync_queue(&queue)?;
            return Ok(SyncOutcome::Queued {
                pending: queue.len(),
            });
        }

        enqueue(&mut queue, SyncQueueEntry { username, record });
        self.repository.write_sync_queue(&queue)?;

        let outcome = self.drain_queue(queue).await?;
        if outcome.pending == 0 {
            Ok(SyncOutcome::Delivered)
        } else {
            Ok(SyncOutcome::Queued {
                pending: outcome.pending,
            })
        }
    }

    /// Removes all queued snapshots of a user and returns their number.
    pub fn discard(&self, username: &Username) -> Result<usize, PersistenceError> {
        let mut queue = self.repository.read_sync_queue()?;
        let len = queue.len();
        queue.retain(|e| &e.username != username);
        let discarded = len - queue.len();
        if discarded > 0 {
            self.repository.write_sync_queue(&queue)?;
        }
        Ok(discarded)
    }

    /// Delivers queued snapshots in order until the first failure.
    pub async fn drain(&self) -> Result<DrainOutcome, PersistenceError> {
        let queue = self.repository.read_sync_queue()?;
        self.drain_queue(queue).await
    }

    async fn drain_queue(
        &self,
        mut queue: VecDeque<SyncQueueEntry>,
    ) -> Result<DrainOutcome, PersistenceError> {
        let mut delivered = 0;

        while let Some(entry) = queue.front() {
            if let Err(err) = self
                .repository
                .write_record(&entry.username, &entry.record)
                .await
            {
                log_failed_delivery(&entry.username, &err);
                break;
            }
            queue.pop_front();
            self.repository.write_sync_queue(&queue)?;
            delivered += 1;
        }

        if delivered > 0 {
            debug!("delivered {delivered} queued records, {} pending", queue.len());
        }

        Ok(DrainOutcome {
            delivered,
            pending: queue.len(),
        })
    }
}

/// Appends an entry, dropping older snapshots of the same user.
fn enqueue(queue: &mut VecDeque<SyncQueueEntry>, entry: SyncQueueEntry) {
    queue.retain(|e| e.username != entry.username);
    queue.push_back(entry);
}

fn log_failed_delivery(username: &Username, err: &StorageError) {
    if err.is_transient() {
        debug!("failed to deliver record of {username}: {err}");
    } else {
        warn!("failed to deliver record of {username}: {err}");
    }
}
