//! Background persistence of the base fee.
//!
//! The block-processing path hands every new fee to [BaseFeePersister::dispatch], which
//! overwrites a single pending slot and returns immediately. One writer task drains the
//! slot into the [FeeStore]. Snapshots that get overwritten before the writer reaches them
//! are skipped, never written late, so the store only ever moves forward.
use primitives::Dec;
use std::{io, sync::Arc};
use store::{FeeStore, KeyValueStore};
use tokio::{
    runtime::{Builder, Handle, Runtime, RuntimeFlavor},
    sync::watch,
};
use tracing::{debug, error, trace, warn};

/// A fee waiting to be written.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
struct PendingWrite {
    seq: u64,
    fee: Dec,
}

/// How far the writer has come, in dispatch sequence numbers.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct WriteProgress {
    /// Latest sequence number the writer tried to store.
    pub attempted: u64,
    /// Latest sequence number that was stored successfully.
    pub persisted: u64,
}

/// Hands base fee snapshots to a dedicated writer task.
#[derive(Debug)]
pub struct BaseFeePersister {
    pending: watch::Sender<Option<PendingWrite>>,
    progress: watch::Receiver<WriteProgress>,
    dispatched: u64,
    /// Set when there was no ambient runtime to spawn the writer on.
    runtime: Option<Runtime>,
}

impl BaseFeePersister {
    /// Starts the writer on the current multi-thread tokio runtime, or on an owned
    /// single-worker runtime otherwise.
    ///
    /// A current-thread runtime only runs the writer when the block-processing thread
    /// yields, which a synchronous driver never does, so it gets an owned runtime too.
    pub fn spawn<KV>(store: Arc<FeeStore<KV>>) -> io::Result<Self>
    where
        KV: KeyValueStore + Send + Sync + 'static,
    {
        if let Ok(handle) = Handle::try_current() {
            if handle.runtime_flavor() != RuntimeFlavor::CurrentThread {
                return Ok(Self::spawn_on(store, &handle));
            }
        }

        let runtime = Builder::new_multi_thread()
            .worker_threads(1)
            .thread_name("base-fee-writer")
            .enable_all()
            .build()?;
        let mut persister = Self::spawn_on(store, runtime.handle());
        persister.runtime = Some(runtime);
        Ok(persister)
    }

    /// Starts the writer on the runtime behind `handle`.
    pub fn spawn_on<KV>(store: Arc<FeeStore<KV>>, handle: &Handle) -> Self
    where
        KV: KeyValueStore + Send + Sync + 'static,
    {
        let (pending, pending_rx) = watch::channel(None);
        let (progress_tx, progress) = watch::channel(WriteProgress::default());
        handle.spawn(run_writer(store, pending_rx, progress_tx));
        Self {
            pending,
            progress,
            dispatched: 0,
            runtime: None,
        }
    }

    /// Queues `fee` for writing, replacing any snapshot the writer has not picked up yet.
    ///
    /// Never blocks. Returns the sequence number of this snapshot.
    pub fn dispatch(&mut self, fee: Dec) -> u64 {
        self.dispatched += 1;
        let seq = self.dispatched;
        self.pending.send_replace(Some(PendingWrite { seq, fee }));
        seq
    }

    /// Sequence number of the most recent dispatch. Zero if nothing was dispatched.
    pub fn dispatched(&self) -> u64 {
        self.dispatched
    }

    /// Current writer progress.
    pub fn progress(&self) -> WriteProgress {
        *self.progress.borrow()
    }

    /// Waits until the writer has attempted the most recent dispatch.
    ///
    /// Check [WriteProgress::persisted] on the result to learn whether it succeeded. Returns
    /// right away if the writer is gone.
    pub async fn flushed(&self) -> WriteProgress {
        let target = self.dispatched;
        let mut progress = self.progress.clone();
        let reached = progress
            .wait_for(|p| p.attempted >= target)
            .await
            .map(|p| *p);
        reached.unwrap_or_else(|_| *self.progress.borrow())
    }
}

impl Drop for BaseFeePersister {
    fn drop(&mut self) {
        // An owned runtime may be dropped from inside another runtime's task, where a
        // blocking shutdown would panic.
        if let Some(runtime) = self.runtime.take() {
            runtime.shutdown_background();
        }
    }
}

async fn run_writer<KV>(
    store: Arc<FeeStore<KV>>,
    mut pending: watch::Receiver<Option<PendingWrite>>,
    progress: watch::Sender<WriteProgress>,
) where
    KV: KeyValueStore + Send + Sync + 'static,
{
    while pending.changed().await.is_ok() {
        let Some(write) = *pending.borrow_and_update() else {
            continue;
        };

        let writer_store = Arc::clone(&store);
        let outcome = tokio::task::spawn_blocking(move || writer_store.save(write.fee)).await;
        let persisted = match outcome {
            Ok(Ok(())) => {
                trace!(seq = write.seq, base_fee = %write.fee, "persisted base fee");
                true
            }
            Ok(Err(err)) => {
                warn!(seq = write.seq, base_fee = %write.fee, %err, "failed to persist base fee");
                false
            }
            Err(err) => {
                error!(seq = write.seq, %err, "base fee write task died");
                false
            }
        };

        progress.send_modify(|p| {
            p.attempted = write.seq;
            if persisted {
                p.persisted = write.seq;
            }
        });
    }
    debug!("base fee writer stopped");
}
