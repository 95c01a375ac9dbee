//! Bounded fan-out / fan-in shared by discovery, refresh passes and power actions.
//!
//! Every item becomes one task. A semaphore caps how many run at once, results are
//! collected in completion order, a panicking task only loses its own slot, and an
//! overall deadline abandons whatever has not finished.

use std::collections::HashSet;
use std::future::Future;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tokio::time::Instant;
use tracing::{error, warn};

/// What came back from a batch.
#[derive(Debug)]
pub struct BatchOutcome<T> {
    /// Task results in completion order.
    pub completed: Vec<T>,
    /// Input positions of tasks that panicked.
    pub panicked: Vec<usize>,
    /// Input positions of tasks cut off by the deadline.
    pub abandoned: Vec<usize>,
    pub elapsed: Duration,
}

impl<T> BatchOutcome<T> {
    pub fn timed_out(&self) -> bool {
        !self.abandoned.is_empty()
    }

    pub fn incomplete(&self) -> usize {
        self.panicked.len() + self.abandoned.len()
    }
}

/// Overall deadline for `items` tasks of at most `per_item` each, run `concurrency`
/// at a time: `(ceil(items / concurrency) + safety_margin) * per_item`.
pub fn pass_deadline(
    items: usize,
    concurrency: usize,
    safety_margin: u32,
    per_item: Duration,
) -> Duration {
    let waves = items.div_ceil(concurrency.max(1));
    let waves = u32::try_from(waves).unwrap_or(u32::MAX);
    per_item.saturating_mul(waves.saturating_add(safety_margin))
}

/// Records the input position of a task whose future is dropped mid-panic.
struct PanicSlot {
    position: usize,
    panicked: Arc<Mutex<Vec<usize>>>,
}

impl Drop for PanicSlot {
    fn drop(&mut self) {
        if std::thread::panicking() {
            self.panicked
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .push(self.position);
        }
    }
}

/// Runs `task` for every item with at most `concurrency` in flight.
///
/// Returns once every task finished or `deadline` expired. Tasks still queued or
/// running at the deadline are aborted.
pub async fn run_bounded<I, F, Fut, T>(
    items: I,
    concurrency: usize,
    deadline: Duration,
    mut task: F,
) -> BatchOutcome<T>
where
    I: IntoIterator,
    F: FnMut(I::Item) -> Fut,
    Fut: Future<Output = T> + Send + 'static,
    T: Send + 'static,
{
    let started = Instant::now();
    let gate = Arc::new(Semaphore::new(concurrency.max(1)));
    let panic_log: Arc<Mutex<Vec<usize>>> = Arc::new(Mutex::new(Vec::new()));
    let mut set: JoinSet<(usize, T)> = JoinSet::new();
    let mut pending: HashSet<usize> = HashSet::new();

    for (position, item) in items.into_iter().enumerate() {
        let gate = gate.clone();
        let slot = PanicSlot {
            position,
            panicked: panic_log.clone(),
        };
        let work = task(item);
        set.spawn(async move {
            let _slot = slot;
            let _permit = gate.acquire().await.ok();
            (position, work.await)
        });
        pending.insert(position);
    }

    let mut completed: Vec<T> = Vec::with_capacity(pending.len());

    let expiry = tokio::time::sleep(deadline);
    tokio::pin!(expiry);

    loop {
        tokio::select! {
            biased;

            joined = set.join_next() => match joined {
                Some(Ok((position, value))) => {
                    pending.remove(&position);
                    completed.push(value);
                }
                Some(Err(err)) => {
                    if err.is_panic() {
                        error!("batch task panicked: {err}");
                    }
                }
                None => break,
            },

            _ = &mut expiry => {
                warn!(
                    remaining = set.len(),
                    deadline_ms = deadline.as_millis() as u64,
                    "batch deadline expired, abandoning unfinished tasks"
                );
                set.abort_all();
                break;
            }
        }
    }

    let mut panicked: Vec<usize> = panic_log
        .lock()
        .unwrap_or_else(PoisonError::into_inner)
        .drain(..)
        .collect();
    panicked.sort_unstable();
    for position in &panicked {
        pending.remove(position);
    }
    let mut abandoned: Vec<usize> = pending.into_iter().collect();
    abandoned.sort_unstable();

    BatchOutcome {
        completed,
        panicked,
        abandoned,
        elapsed: started.elapsed(),
    }
}

// ╔════════════════════════════════════════════╗
// ║ ████████╗███████╗███████╗████████╗███████╗ ║
// ║ ╚══██╔══╝██╔════╝██╔════╝╚══██╔══╝██╔════╝ ║
// ║    ██║   █████╗  ███████╗   ██║   ███████╗ ║
// ║    ██║   ██╔══╝  ╚════██║   ██║   ╚════██║ ║
// ║    ██║   ███████╗███████║   ██║   ███████║ ║
// ║    ╚═╝   ╚══════╝╚══════╝   ╚═╝   ╚══════╝ ║
// ╚════════════════════════════════════════════╝
